use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::error::{ErrorKind, SgaFailure};
use crate::models::{GroupQuery, NameQuery, Pagination};
use crate::sga::{SgaClient, StudentSearch};

/// Cabecera con el token devuelto por `/authenticate` (opcional en la API JSON).
pub const TOKEN_HEADER: &str = "X-Sga-Token";

pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CarreraQuery {
    pub carrera: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EstudiantesQuery {
    pub cod_ceta: Option<String>,
    pub nombre: Option<String>,
    pub ap_pat: Option<String>,
    pub ap_mat: Option<String>,
    pub carrera: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
    pub carrera: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BuscarRequest {
    #[serde(alias = "nombre")]
    pub nombres: Option<String>,
    #[serde(alias = "ap_paterno")]
    pub ap_pat: Option<String>,
    #[serde(alias = "ap_materno")]
    pub ap_mat: Option<String>,
    pub carrera: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GrupoRequest {
    pub cod_pensum: String,
    pub gestion: String,
    pub cod_grupo: String,
    pub carrera: Option<String>,
}

/// `limit` por defecto 100 y debe estar en 1..=100; `offset` por defecto 0.
pub fn pagination(limit: Option<usize>, offset: Option<usize>) -> Result<Pagination, SgaFailure> {
    let limit = limit.unwrap_or(MAX_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(SgaFailure::invalid_argument(format!("limit debe estar entre 1 y {MAX_LIMIT}")));
    }
    Ok(Pagination { limit, offset: offset.unwrap_or(0) })
}

/// Traduce un fallo del adaptador a la respuesta HTTP correspondiente.
pub fn failure_response(f: &SgaFailure) -> HttpResponse {
    let mut builder = match f.kind {
        ErrorKind::InvalidArgument => HttpResponse::UnprocessableEntity(),
        ErrorKind::Unauthorized => HttpResponse::Unauthorized(),
        ErrorKind::ConnectionError => HttpResponse::GatewayTimeout(),
        ErrorKind::RemoteError => HttpResponse::BadGateway(),
        ErrorKind::NotFound => HttpResponse::NotFound(),
    };
    builder.json(json!({"success": false, "error": f.kind, "message": f.user_message()}))
}

fn carrera(c: &Option<String>) -> &str {
    c.as_deref().unwrap_or("")
}

fn token_header(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// GET /api/sga/test
pub async fn test_handler() -> impl Responder {
    HttpResponse::Ok().json(json!({"status": "OK", "message": "SGA routes working"}))
}

/// GET /api/sga/check-connection?carrera=
pub async fn check_connection_handler(client: web::Data<SgaClient>, query: web::Query<CarreraQuery>) -> impl Responder {
    let ctx = client.context(carrera(&query.carrera));
    let status = client.check_connection(&ctx).await;
    HttpResponse::Ok().json(status)
}

/// POST /api/sga/authenticate
pub async fn authenticate_handler(client: web::Data<SgaClient>, body: web::Json<AuthRequest>) -> impl Responder {
    let body = body.into_inner();
    let ctx = client.context(carrera(&body.carrera));
    match client.authenticate(&ctx, &body.username, &body.password).await {
        Ok(ctx) => HttpResponse::Ok().json(json!({
            "success": true,
            "token": ctx.token,
            "carrera": ctx.endpoint.program_key,
        })),
        Err(f) => failure_response(&f),
    }
}

/// GET /api/sga/estudiantes?cod_ceta=... | ?nombre=&ap_pat=&ap_mat=
pub async fn estudiantes_handler(client: web::Data<SgaClient>, query: web::Query<EstudiantesQuery>) -> impl Responder {
    let q = query.into_inner();
    let nombre = if q.nombre.is_some() || q.ap_pat.is_some() || q.ap_mat.is_some() {
        Some(NameQuery::new(
            q.nombre.as_deref().unwrap_or(""),
            q.ap_pat.as_deref().unwrap_or(""),
            q.ap_mat.as_deref().unwrap_or(""),
        ))
    } else {
        None
    };
    let page = match pagination(q.limit, q.offset) {
        Ok(page) => page,
        Err(f) => return failure_response(&f),
    };
    let search = StudentSearch { cod_ceta: q.cod_ceta.clone(), nombre, page };
    let ctx = client.context(carrera(&q.carrera));

    match client.find_students(&ctx, &search).await {
        Ok(lookup) => HttpResponse::Ok().json(json!({"success": true, "data": lookup.records, "total": lookup.total})),
        Err(f) => failure_response(&f),
    }
}

/// GET /api/sga/estudiantes/{cod_ceta}
pub async fn estudiante_por_codigo_handler(
    client: web::Data<SgaClient>,
    path: web::Path<String>,
    query: web::Query<CarreraQuery>,
) -> impl Responder {
    let ctx = client.context(carrera(&query.carrera));
    match client.find_one_by_code(&ctx, &path.into_inner()).await {
        Ok(record) => HttpResponse::Ok().json(json!({"success": true, "data": record})),
        Err(f) => failure_response(&f),
    }
}

/// POST /api/sga/buscar-estudiantes
pub async fn buscar_estudiantes_handler(client: web::Data<SgaClient>, body: web::Json<BuscarRequest>) -> impl Responder {
    let b = body.into_inner();
    let query = NameQuery::new(
        b.nombres.as_deref().unwrap_or(""),
        b.ap_pat.as_deref().unwrap_or(""),
        b.ap_mat.as_deref().unwrap_or(""),
    );
    let page = match pagination(b.limit, b.offset) {
        Ok(page) => page,
        Err(f) => return failure_response(&f),
    };
    let ctx = client.context(carrera(&b.carrera));

    match client.find_by_name(&ctx, &query, page).await {
        Ok(lookup) => HttpResponse::Ok().json(json!({"success": true, "data": lookup.records, "total": lookup.total})),
        Err(f) => failure_response(&f),
    }
}

/// POST /api/sga/listar-grupo
pub async fn listar_grupo_handler(client: web::Data<SgaClient>, body: web::Json<GrupoRequest>) -> impl Responder {
    let b = body.into_inner();
    let ctx = client.context(carrera(&b.carrera));
    let query = GroupQuery { cod_pensum: b.cod_pensum, gestion: b.gestion, cod_grupo: b.cod_grupo };

    match client.find_by_group(&ctx, &query).await {
        Ok(lookup) => HttpResponse::Ok().json(json!({"success": true, "data": lookup.records, "total": lookup.total})),
        Err(f) => failure_response(&f),
    }
}

fn contexto_api(client: &SgaClient, req: &HttpRequest, query: &CarreraQuery) -> crate::models::SgaContext {
    let ctx = client.context(carrera(&query.carrera));
    match token_header(req) {
        Some(token) => ctx.with_token(token),
        None => ctx,
    }
}

/// GET /api/sga/carreras
pub async fn carreras_handler(client: web::Data<SgaClient>, req: HttpRequest, query: web::Query<CarreraQuery>) -> impl Responder {
    let ctx = contexto_api(&client, &req, &query);
    match client.get_carreras(&ctx).await {
        Ok(data) => HttpResponse::Ok().json(json!({"success": true, "data": data})),
        Err(f) => failure_response(&f),
    }
}

/// GET /api/sga/gestiones
pub async fn gestiones_handler(client: web::Data<SgaClient>, req: HttpRequest, query: web::Query<CarreraQuery>) -> impl Responder {
    let ctx = contexto_api(&client, &req, &query);
    match client.get_gestiones(&ctx).await {
        Ok(data) => HttpResponse::Ok().json(json!({"success": true, "data": data})),
        Err(f) => failure_response(&f),
    }
}

/// GET /api/sga/inscripciones/{cod_ceta}
pub async fn inscripciones_handler(
    client: web::Data<SgaClient>,
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<CarreraQuery>,
) -> impl Responder {
    let ctx = contexto_api(&client, &req, &query);
    match client.get_inscripciones(&ctx, &path.into_inner()).await {
        Ok(data) => HttpResponse::Ok().json(json!({"success": true, "data": data})),
        Err(f) => failure_response(&f),
    }
}
