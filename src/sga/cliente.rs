//! Cliente HTTP contra las instancias del SGA.
//!
//! El SGA sólo expone páginas PHP que devuelven fragmentos HTML (búsquedas) y una
//! pequeña API JSON (`/api/socrates/*`). Toda operación resuelve primero la carrera
//! a un endpoint y devuelve un `SgaFailure` clasificado en vez de errores de
//! transporte.

use reqwest::header::LOCATION;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::carreras::EndpointResolver;
use crate::config::SgaConfig;
use crate::error::{ConfigError, SgaFailure};
use crate::models::{
    ConnectionStatus, GroupQuery, Lookup, LookupOutcome, NameQuery, Pagination, SgaContext, StudentRecord,
};
use crate::sga::campos::FieldMap;
use crate::sga::parser::parse_students;

pub const HEALTH_PATH: &str = "index.php/main";
pub const BY_CODE_PATH: &str = "index.php/main/buscar_estudiantes_por_cod";
pub const BY_NAME_PATH: &str = "index.php/main/buscar_estudiantes/nombre";
pub const BY_GROUP_PATH: &str = "index.php/main/buscar_estudiantes/grupo";
pub const AUTH_PATH: &str = "api/socrates/authenticate";

/// Textos que delatan una página de error de PHP en lugar de resultados.
pub const FATAL_MARKERS: &[&str] = &["Fatal error", "PHP Error"];

const PREVIEW_CHARS: usize = 500;

/// Parámetros de `find_students`: código o nombre, como en `GET /estudiantes`.
#[derive(Debug, Clone, Default)]
pub struct StudentSearch {
    pub cod_ceta: Option<String>,
    pub nombre: Option<NameQuery>,
    pub page: Pagination,
}

#[derive(Serialize)]
struct Credenciales<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    #[serde(default)]
    success: bool,
    token: Option<String>,
}

/// Adaptador sin estado mutable: se comparte entre workers detrás de `web::Data`.
#[derive(Debug, Clone)]
pub struct SgaClient {
    http: Client,
    resolver: EndpointResolver,
    campos: FieldMap,
    api_key: Option<String>,
    health_timeout: Duration,
    lookup_timeout: Duration,
}

impl SgaClient {
    pub fn new(config: SgaConfig) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(config.connect_timeout)
            // Las instancias del SGA están en la red interna
            .no_proxy()
            .build()
            .map_err(ConfigError::HttpClient)?;
        Ok(SgaClient {
            http,
            resolver: config.resolver,
            campos: config.field_map,
            api_key: config.api_key,
            health_timeout: config.health_timeout,
            lookup_timeout: config.lookup_timeout,
        })
    }

    pub fn resolver(&self) -> &EndpointResolver {
        &self.resolver
    }

    /// Contexto para una llamada: resuelve la carrera (o cae al endpoint por defecto).
    pub fn context(&self, program_identifier: &str) -> SgaContext {
        SgaContext::new(program_identifier, self.resolver.resolve(program_identifier).clone())
    }

    /// Comprueba que la página principal del SGA responda. Nunca falla: un error de
    /// red se reporta como `success = false`.
    pub async fn check_connection(&self, ctx: &SgaContext) -> ConnectionStatus {
        let url = ctx.endpoint.url(HEALTH_PATH);
        let checked_at = chrono::Utc::now().to_rfc3339();

        match self.http.get(&url).timeout(self.health_timeout).send().await {
            Ok(resp) => {
                let status = resp.status();
                // 302 es la redirección al login: el servidor está vivo
                let ok = status == StatusCode::OK || status == StatusCode::FOUND;
                tracing::info!(url = %url, status = status.as_u16(), ok, "check_connection");
                ConnectionStatus {
                    success: ok,
                    message: if ok { "Conexión exitosa al SGA".into() } else { format!("El SGA respondió HTTP {}", status.as_u16()) },
                    status: Some(status.as_u16()),
                    checked_at,
                }
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "SGA inaccesible");
                ConnectionStatus {
                    success: false,
                    message: "Error de conexión al SGA".into(),
                    status: None,
                    checked_at,
                }
            }
        }
    }

    /// Obtiene un token de la API `socrates` y devuelve un contexto nuevo que lo lleva.
    pub async fn authenticate(&self, ctx: &SgaContext, username: &str, password: &str) -> Result<SgaContext, SgaFailure> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(SgaFailure::invalid_argument("usuario y contraseña son requeridos"));
        }

        let url = ctx.endpoint.url(AUTH_PATH);
        let resp = self
            .http
            .post(&url)
            .json(&Credenciales { username, password })
            .timeout(self.lookup_timeout)
            .send()
            .await
            .map_err(transporte)?;

        let status = resp.status();
        let body = resp.text().await.map_err(transporte)?;
        if status != StatusCode::OK {
            tracing::warn!(url = %url, status = status.as_u16(), body = %preview(&body), "autenticación SGA rechazada");
            return Err(SgaFailure::unauthorized(format!("HTTP {}", status.as_u16())));
        }

        match serde_json::from_str::<AuthResponse>(&body) {
            Ok(AuthResponse { success: true, token: Some(token) }) if !token.is_empty() => {
                tracing::info!(carrera = %ctx.endpoint.program_key, "autenticado en el SGA");
                Ok(ctx.with_token(token))
            }
            Ok(_) => Err(SgaFailure::unauthorized("el SGA no devolvió un token")),
            Err(e) => {
                tracing::warn!(error = %e, body = %preview(&body), "respuesta de autenticación inválida");
                Err(SgaFailure::unauthorized("respuesta de autenticación inválida"))
            }
        }
    }

    /// Busca por código CETA. El SGA ha usado distintos nombres para el parámetro,
    /// así que se envían todos a la vez.
    pub async fn find_by_code(&self, ctx: &SgaContext, code: &str) -> LookupOutcome {
        let code = code.trim();
        if code.is_empty() {
            return Err(SgaFailure::invalid_argument("el código CETA es requerido"));
        }
        let form = [
            ("cod_ceta", code),
            ("codigo", code),
            ("cod_estudiante", code),
            ("estudiante", code),
        ];
        let html = self.post_form(ctx, BY_CODE_PATH, &form).await?;
        Ok(Lookup::all(parse_students(&html, &self.campos)))
    }

    /// Como `find_by_code` pero devuelve sólo el primer registro; sin resultados es `NotFound`.
    pub async fn find_one_by_code(&self, ctx: &SgaContext, code: &str) -> Result<StudentRecord, SgaFailure> {
        let lookup = self.find_by_code(ctx, code).await?;
        lookup
            .records
            .into_iter()
            .next()
            .ok_or_else(|| SgaFailure::not_found(format!("código {}", code.trim())))
    }

    pub async fn find_by_name(&self, ctx: &SgaContext, query: &NameQuery, page: Pagination) -> LookupOutcome {
        if ctx.program_identifier.is_empty() {
            return Err(SgaFailure::invalid_argument("la carrera es requerida"));
        }
        let q = NameQuery::new(&query.given_names, &query.paternal_surname, &query.maternal_surname);
        if q.is_empty() {
            return Err(SgaFailure::invalid_argument("se requiere al menos nombres o un apellido"));
        }

        // ap_pat/ap_mat y ap_paterno/ap_materno: ambas revisiones del formulario
        let form = [
            ("criterio", "nombre"),
            ("nombres", q.given_names.as_str()),
            ("ap_pat", q.paternal_surname.as_str()),
            ("ap_paterno", q.paternal_surname.as_str()),
            ("ap_mat", q.maternal_surname.as_str()),
            ("ap_materno", q.maternal_surname.as_str()),
        ];
        let html = self.post_form(ctx, BY_NAME_PATH, &form).await?;
        Ok(Lookup::paginate(parse_students(&html, &self.campos), page))
    }

    /// Listado de un grupo (pensum + gestión + curso).
    pub async fn find_by_group(&self, ctx: &SgaContext, query: &GroupQuery) -> LookupOutcome {
        let (pensum, gestion, grupo) = (query.cod_pensum.trim(), query.gestion.trim(), query.cod_grupo.trim());
        if pensum.is_empty() || gestion.is_empty() || grupo.is_empty() {
            return Err(SgaFailure::invalid_argument("cod_pensum, gestion y cod_grupo son requeridos"));
        }
        let form = [
            ("criterio", "grupo"),
            ("cod_pensum", pensum),
            ("gestion", gestion),
            ("cod_grupo", grupo),
        ];
        let html = self.post_form(ctx, BY_GROUP_PATH, &form).await?;
        Ok(Lookup::all(parse_students(&html, &self.campos)))
    }

    /// `cod_ceta` tiene prioridad sobre el nombre; sin ninguno es un error del llamador.
    pub async fn find_students(&self, ctx: &SgaContext, search: &StudentSearch) -> LookupOutcome {
        if let Some(code) = search.cod_ceta.as_deref().filter(|c| !c.trim().is_empty()) {
            let lookup = self.find_by_code(ctx, code).await?;
            return Ok(Lookup::paginate(lookup.records, search.page));
        }
        match &search.nombre {
            Some(q) if !q.is_empty() => self.find_by_name(ctx, q, search.page).await,
            _ => Err(SgaFailure::invalid_argument("parámetro cod_ceta o nombre requerido")),
        }
    }

    pub async fn get_carreras(&self, ctx: &SgaContext) -> Result<serde_json::Value, SgaFailure> {
        self.api_get(ctx, "api/socrates/carreras", &[]).await
    }

    pub async fn get_gestiones(&self, ctx: &SgaContext) -> Result<serde_json::Value, SgaFailure> {
        self.api_get(ctx, "api/socrates/gestiones", &[]).await
    }

    pub async fn get_inscripciones(&self, ctx: &SgaContext, cod_ceta: &str) -> Result<serde_json::Value, SgaFailure> {
        if cod_ceta.trim().is_empty() {
            return Err(SgaFailure::invalid_argument("el código CETA es requerido"));
        }
        self.api_get(ctx, "api/socrates/inscripciones", &[("cod_ceta", cod_ceta.trim())]).await
    }

    async fn api_get(&self, ctx: &SgaContext, path: &str, query: &[(&str, &str)]) -> Result<serde_json::Value, SgaFailure> {
        let url = ctx.endpoint.url(path);
        let mut req = self
            .http
            .get(&url)
            .query(query)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.lookup_timeout);
        if let Some(key) = &self.api_key {
            req = req.header("X-API-Key", key);
        }
        if let Some(token) = &ctx.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(transporte)?;
        let status = resp.status();
        let body = resp.text().await.map_err(transporte)?;
        if !status.is_success() {
            tracing::warn!(url = %url, status = status.as_u16(), body = %preview(&body), "error en petición API SGA");
            return Err(SgaFailure::remote(format!("HTTP {}", status.as_u16())));
        }
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(url = %url, error = %e, body = %preview(&body), "la API SGA no devolvió JSON");
            SgaFailure::remote("respuesta JSON inválida")
        })
    }

    /// POST de formulario con seguimiento manual de una sola redirección (el SGA
    /// redirige a veces a la misma ruta con otra barra final, y hay que repetir el
    /// POST, no convertirlo en GET).
    async fn post_form(&self, ctx: &SgaContext, path: &str, form: &[(&str, &str)]) -> Result<String, SgaFailure> {
        let url = ctx.endpoint.url(path);
        tracing::info!(url = %url, carrera = %ctx.endpoint.program_key, "enviando request al SGA");

        let mut resp = self.send_form(&url, form).await?;
        if let Some(destino) = redireccion(&url, &resp) {
            tracing::info!(desde = %url, hacia = %destino, status = resp.status().as_u16(), "el SGA redirigió, repitiendo POST");
            resp = self.send_form(destino.as_str(), form).await?;
        }

        let status = resp.status();
        let body = resp.text().await.map_err(transporte)?;
        tracing::debug!(status = status.as_u16(), body_preview = %preview(&body), "respuesta del SGA");

        if status != StatusCode::OK {
            tracing::warn!(url = %url, status = status.as_u16(), body = %preview(&body), "consulta SGA no exitosa");
            return Err(SgaFailure::remote(format!("HTTP {}", status.as_u16())));
        }
        if FATAL_MARKERS.iter().any(|m| body.contains(m)) {
            tracing::warn!(url = %url, errors = %preview(&body), "el SGA devolvió errores PHP");
            return Err(SgaFailure::remote("error interno del SGA"));
        }
        Ok(body)
    }

    async fn send_form(&self, url: &str, form: &[(&str, &str)]) -> Result<reqwest::Response, SgaFailure> {
        self.http
            .post(url)
            .form(form)
            .timeout(self.lookup_timeout)
            .send()
            .await
            .map_err(transporte)
    }
}

fn es_redireccion(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// Destino absoluto de una redirección, si la respuesta lo es y trae `Location`.
fn redireccion(origen: &str, resp: &reqwest::Response) -> Option<Url> {
    if !es_redireccion(resp.status()) {
        return None;
    }
    let location = resp.headers().get(LOCATION)?.to_str().ok()?;
    resolve_location(origen, location)
}

pub fn resolve_location(origen: &str, location: &str) -> Option<Url> {
    Url::parse(origen).ok()?.join(location.trim()).ok()
}

fn transporte(e: reqwest::Error) -> SgaFailure {
    if e.is_timeout() {
        SgaFailure::connection("tiempo de espera agotado")
    } else if e.is_connect() {
        SgaFailure::connection("no se pudo conectar con el SGA")
    } else {
        SgaFailure::connection(e.without_url().to_string())
    }
}

/// Primeros caracteres del cuerpo para los logs (cortando en límite de carácter).
fn preview(body: &str) -> &str {
    match body.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
