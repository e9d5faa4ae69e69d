use actix_cors::Cors;
use actix_web::{web, App, HttpServer};

use crate::config::SgaConfig;
use crate::server_handlers::*;
use crate::sga::SgaClient;

/// Registra las rutas bajo `/api/sga`. Se usa tanto en `run_server` como en los tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/sga")
            .route("/test", web::get().to(test_handler))
            .route("/check-connection", web::get().to(check_connection_handler))
            .route("/authenticate", web::post().to(authenticate_handler))
            .route("/estudiantes", web::get().to(estudiantes_handler))
            .route("/estudiantes/{cod_ceta}", web::get().to(estudiante_por_codigo_handler))
            .route("/buscar-estudiantes", web::post().to(buscar_estudiantes_handler))
            .route("/listar-grupo", web::post().to(listar_grupo_handler))
            .route("/carreras", web::get().to(carreras_handler))
            .route("/gestiones", web::get().to(gestiones_handler))
            .route("/inscripciones/{cod_ceta}", web::get().to(inscripciones_handler)),
    );
}

pub async fn run_server(config: SgaConfig) -> std::io::Result<()> {
    let bind = config.bind.clone();
    let cors_origin = config.cors_origin.clone();
    let client = SgaClient::new(config).map_err(|e| std::io::Error::other(e.to_string()))?;
    let data = web::Data::new(client);

    for ep in data.resolver().endpoints() {
        tracing::info!(carrera = %ep.program_key, url = %ep.base_url, default = ep.is_default, "endpoint SGA");
    }
    tracing::info!(bind = %bind, "iniciando servidor");

    HttpServer::new(move || {
        let cors = match &cors_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header(),
            None => Cors::permissive(),
        };
        App::new()
            .wrap(cors)
            .app_data(data.clone())
            .configure(configure)
    })
    .bind(bind.as_str())?
    .run()
    .await
}
