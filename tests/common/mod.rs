// Servidor SGA simulado para los tests de integración.
#![allow(dead_code)]

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;

use sga_bridge::carreras::EndpointResolver;
use sga_bridge::models::ProgramEndpoint;
use sga_bridge::{SgaClient, SgaConfig};

pub const API_KEY: &str = "clave-test";
pub const TOKEN: &str = "tok-123";

type Form = web::Form<HashMap<String, String>>;

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(body)
}

fn tabla_por_codigo(cod: &str) -> String {
    format!(
        r#"<html><body><table class="table" id="dataTables-alumnos"><thead><tr class="info">
        <th>Nº</th><th>Cod. CETA</th><th>Ap. Paterno</th><th>Ap. Materno</th><th>Nombres</th>
        <th>Cédula de Identidad</th><th>Procedencia</th><th></th><th></th></tr></thead><tbody>
        <tr  class="small" ><td>1</td><td>{cod}</td><td>Mamani</td><td>Quispe</td><td>Juan</td><td>654321</td><td>La Paz</td></tr>
        </tbody></table></body></html>"#
    )
}

const SIN_DATOS: &str = r#"<table><thead><tr><th>Nº</th><th>Cod. CETA</th></tr></thead><tbody>
    <tr class="small"><td>No existen datos para mostrar</td></tr></tbody></table>"#;

async fn por_codigo(form: Form) -> HttpResponse {
    let cod = form.get("cod_ceta").cloned().unwrap_or_default();
    // Los cuatro nombres del parámetro deben llegar con el mismo valor
    for campo in ["codigo", "cod_estudiante", "estudiante"] {
        if form.get(campo) != Some(&cod) {
            return HttpResponse::BadRequest().body(format!("falta {campo}"));
        }
    }
    match cod.as_str() {
        "fatal" => html("<br />\n<b>Fatal error</b>: Call to a member function result() on null <table><tr><th>Cod. CETA</th></tr><tr><td>1</td></tr></table>".into()),
        "php" => html("<div>A PHP Error was encountered</div>".into()),
        "500" => HttpResponse::InternalServerError().body("error"),
        "redir" => HttpResponse::Found().insert_header(("Location", "por_cod_v2")).finish(),
        "loop" => HttpResponse::MovedPermanently()
            .insert_header(("Location", "/sga/index.php/main/buscar_estudiantes_por_cod"))
            .finish(),
        "0" => html(SIN_DATOS.into()),
        "vacio" => html(String::new()),
        "lento" => {
            actix_web::rt::time::sleep(Duration::from_secs(3)).await;
            html(tabla_por_codigo("lento"))
        }
        otro => html(tabla_por_codigo(otro)),
    }
}

// Destino de la redirección: sólo responde si el formulario llegó intacto.
async fn por_codigo_v2(form: Form) -> HttpResponse {
    match (form.get("cod_ceta"), form.get("estudiante")) {
        (Some(c), Some(e)) if c == "redir" && e == "redir" => html(tabla_por_codigo("9090")),
        _ => HttpResponse::BadRequest().finish(),
    }
}

async fn por_nombre(form: Form) -> HttpResponse {
    if form.get("criterio").map(String::as_str) != Some("nombre") {
        return HttpResponse::BadRequest().body("criterio");
    }
    let ap = form.get("ap_paterno").cloned().unwrap_or_default();
    if form.get("ap_pat") != Some(&ap) {
        return HttpResponse::BadRequest().body("ap_pat");
    }
    let mut body = String::from(r#"<table id="dataTables-alumnos"><thead><tr>"#);
    for _ in 0..7 {
        body.push_str(r#"<th width="15%"></th>"#);
    }
    body.push_str("</tr></thead><tbody>");
    for i in 1..=5 {
        body.push_str(&format!(
            r#"<tr class="clickable-row" id="fila{i}" onclick="click_fila(this);"><td>{i}</td><td>{}</td><td>{ap}</td><td>Luna</td><td>Nombre{i}</td><td>{}</td><td>El Alto</td></tr>"#,
            1000 + i,
            700 + i
        ));
    }
    body.push_str("</tbody></table>");
    html(body)
}

async fn por_grupo(form: Form) -> HttpResponse {
    if form.get("criterio").map(String::as_str) != Some("grupo") || form.get("cod_grupo").is_none() {
        return HttpResponse::BadRequest().finish();
    }
    html(tabla_por_codigo("3030"))
}

async fn authenticate(body: web::Json<serde_json::Value>) -> HttpResponse {
    match (body["username"].as_str(), body["password"].as_str()) {
        (Some("admin"), Some("secreto")) => HttpResponse::Ok().json(json!({"success": true, "token": TOKEN})),
        (Some("roto"), _) => HttpResponse::Ok().body("<html>no es json</html>"),
        (Some("sin-token"), _) => HttpResponse::Ok().json(json!({"success": true})),
        _ => HttpResponse::Unauthorized().json(json!({"success": false})),
    }
}

fn api_key_ok(req: &HttpRequest) -> bool {
    req.headers().get("X-API-Key").and_then(|v| v.to_str().ok()) == Some(API_KEY)
}

async fn carreras(req: HttpRequest) -> HttpResponse {
    if !api_key_ok(&req) {
        return HttpResponse::Forbidden().json(json!({"success": false}));
    }
    HttpResponse::Ok().json(json!({"success": true, "data": [{"codigo": "MEC", "nombre": "Mecánica Automotriz"}]}))
}

async fn inscripciones(req: HttpRequest, query: web::Query<HashMap<String, String>>) -> HttpResponse {
    let esperado = format!("Bearer {TOKEN}");
    let bearer = req.headers().get("Authorization").and_then(|v| v.to_str().ok());
    if !api_key_ok(&req) || bearer != Some(esperado.as_str()) {
        return HttpResponse::Unauthorized().finish();
    }
    HttpResponse::Ok().json(json!({"cod_ceta": query.get("cod_ceta"), "inscripciones": [{"gestion": "1/2025"}]}))
}

fn rutas(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/sga")
            // Como el SGA real: la página principal redirige al login
            .route("/index.php/main", web::get().to(|| async {
                HttpResponse::Found().insert_header(("Location", "/sga/index.php/login")).finish()
            }))
            .route("/index.php/main/buscar_estudiantes_por_cod", web::post().to(por_codigo))
            .route("/index.php/main/por_cod_v2", web::post().to(por_codigo_v2))
            .route("/index.php/main/buscar_estudiantes/nombre", web::post().to(por_nombre))
            .route("/index.php/main/buscar_estudiantes/grupo", web::post().to(por_grupo))
            .route("/api/socrates/authenticate", web::post().to(authenticate))
            .route("/api/socrates/carreras", web::get().to(carreras))
            .route("/api/socrates/gestiones", web::get().to(|| async { HttpResponse::Ok().body("no es json") }))
            .route("/api/socrates/inscripciones", web::get().to(inscripciones)),
    )
    .service(
        web::scope("/caido")
            .route("/index.php/main", web::get().to(|| async { HttpResponse::ServiceUnavailable().finish() })),
    );
}

/// Levanta el SGA simulado en un puerto efímero y devuelve `http://127.0.0.1:PORT`.
pub fn spawn_mock_sga() -> String {
    let server = HttpServer::new(|| App::new().configure(rutas))
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("bind mock SGA");
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{addr}")
}

/// URL a la que nadie escucha (el puerto se libera al soltar el listener).
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

pub fn config_for(host: &str) -> SgaConfig {
    let resolver = EndpointResolver::new(vec![
        ProgramEndpoint::new("general", &format!("{host}/sga"), true),
        ProgramEndpoint::new("mecanica", &format!("{host}/sga/"), false).with_aliases(["Mecánica Automotriz"]),
        ProgramEndpoint::new("caido", &format!("{host}/caido"), false),
    ])
    .expect("endpoints válidos");
    let mut config = SgaConfig::new(resolver);
    config.api_key = Some(API_KEY.to_string());
    config.lookup_timeout = Duration::from_secs(1);
    config.health_timeout = Duration::from_secs(1);
    config.connect_timeout = Duration::from_millis(500);
    config
}

pub fn client_for(host: &str) -> SgaClient {
    SgaClient::new(config_for(host)).expect("cliente HTTP")
}
