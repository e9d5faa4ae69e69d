mod common;

use common::{client_for, spawn_mock_sga, unreachable_url, TOKEN};
use sga_bridge::models::{GroupQuery, NameQuery, Pagination};
use sga_bridge::sga::StudentSearch;
use sga_bridge::ErrorKind;

#[actix_web::test]
async fn test_find_by_code_envia_los_cuatro_campos() {
    let client = client_for(&spawn_mock_sga());
    let ctx = client.context("general");

    let lookup = client.find_by_code(&ctx, " 5521 ").await.expect("búsqueda exitosa");
    assert_eq!(lookup.total, 1);
    let e = &lookup.records[0];
    assert_eq!(e.student_code.as_deref(), Some("5521"));
    assert_eq!(e.last_name_paternal.as_deref(), Some("Mamani"));
    assert_eq!(e.first_names.as_deref(), Some("Juan"));
    assert_eq!(e.national_id.as_deref(), Some("654321"));
}

#[actix_web::test]
async fn test_alias_de_carrera_resuelve_endpoint() {
    let client = client_for(&spawn_mock_sga());
    let ctx = client.context("MECÁNICA automotriz");
    assert_eq!(ctx.endpoint.program_key, "mecanica");
    let lookup = client.find_by_code(&ctx, "77").await.expect("búsqueda exitosa");
    assert_eq!(lookup.records[0].student_code.as_deref(), Some("77"));
}

#[actix_web::test]
async fn test_sin_resultados_es_exito_vacio() {
    let client = client_for(&spawn_mock_sga());
    let ctx = client.context("general");

    let lookup = client.find_by_code(&ctx, "0").await.expect("cero resultados no es error");
    assert!(lookup.records.is_empty());
    assert_eq!(lookup.total, 0);

    let vacio = client.find_by_code(&ctx, "vacio").await.expect("cuerpo vacío");
    assert!(vacio.records.is_empty());
}

#[actix_web::test]
async fn test_pagina_de_error_php_es_remote_error() {
    let client = client_for(&spawn_mock_sga());
    let ctx = client.context("general");

    for code in ["fatal", "php"] {
        let err = client.find_by_code(&ctx, code).await.expect_err("error PHP");
        assert_eq!(err.kind, ErrorKind::RemoteError, "{code}");
    }
}

#[actix_web::test]
async fn test_status_no_200_es_remote_error() {
    let client = client_for(&spawn_mock_sga());
    let err = client.find_by_code(&client.context("general"), "500").await.expect_err("HTTP 500");
    assert_eq!(err.kind, ErrorKind::RemoteError);
    assert_eq!(err.detail, "HTTP 500");
}

#[actix_web::test]
async fn test_redireccion_repite_el_post() {
    let client = client_for(&spawn_mock_sga());
    let lookup = client.find_by_code(&client.context("general"), "redir").await.expect("redirección seguida");
    assert_eq!(lookup.records.len(), 1);
    assert_eq!(lookup.records[0].student_code.as_deref(), Some("9090"));
}

#[actix_web::test]
async fn test_segunda_redireccion_no_se_sigue() {
    let client = client_for(&spawn_mock_sga());
    let err = client.find_by_code(&client.context("general"), "loop").await.expect_err("redirección en bucle");
    assert_eq!(err.kind, ErrorKind::RemoteError);
    assert_eq!(err.detail, "HTTP 301");
}

#[actix_web::test]
async fn test_servidor_caido_es_connection_error() {
    let client = client_for(&unreachable_url());
    let err = client.find_by_code(&client.context("general"), "1234").await.expect_err("sin servidor");
    assert_eq!(err.kind, ErrorKind::ConnectionError);
}

#[actix_web::test]
async fn test_timeout_es_connection_error() {
    let client = client_for(&spawn_mock_sga());
    let err = client.find_by_code(&client.context("general"), "lento").await.expect_err("timeout");
    assert_eq!(err.kind, ErrorKind::ConnectionError);
}

#[actix_web::test]
async fn test_find_one_by_code() {
    let client = client_for(&spawn_mock_sga());
    let ctx = client.context("general");

    let record = client.find_one_by_code(&ctx, "4455").await.expect("encontrado");
    assert_eq!(record.student_code.as_deref(), Some("4455"));

    let err = client.find_one_by_code(&ctx, "0").await.expect_err("no encontrado");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[actix_web::test]
async fn test_find_by_name_precondiciones() {
    let client = client_for(&spawn_mock_sga());

    let sin_carrera = client
        .find_by_name(&client.context(""), &NameQuery::new("Ana", "", ""), Pagination::default())
        .await
        .expect_err("carrera vacía");
    assert_eq!(sin_carrera.kind, ErrorKind::InvalidArgument);

    let sin_nombres = client
        .find_by_name(&client.context("general"), &NameQuery::new("  ", "", "\t"), Pagination::default())
        .await
        .expect_err("sin criterios");
    assert_eq!(sin_nombres.kind, ErrorKind::InvalidArgument);
}

#[actix_web::test]
async fn test_find_by_name_pagina_y_conserva_total() {
    let client = client_for(&spawn_mock_sga());
    let ctx = client.context("general");
    let query = NameQuery::new("", "Choque", "");

    let todo = client.find_by_name(&ctx, &query, Pagination::default()).await.expect("búsqueda");
    assert_eq!(todo.total, 5);
    assert_eq!(todo.records.len(), 5);
    assert!(todo.records.iter().all(|r| r.last_name_paternal.as_deref() == Some("Choque")));

    let pagina = client.find_by_name(&ctx, &query, Pagination { limit: 2, offset: 1 }).await.expect("búsqueda");
    assert_eq!(pagina.total, 5);
    assert_eq!(pagina.records, todo.records[1..3].to_vec());
    assert_eq!(pagina.records[0].student_code.as_deref(), Some("1002"));
}

#[actix_web::test]
async fn test_find_by_group() {
    let client = client_for(&spawn_mock_sga());
    let ctx = client.context("general");

    let query = GroupQuery { cod_pensum: "MEA".into(), gestion: "1/2025".into(), cod_grupo: "A".into() };
    let lookup = client.find_by_group(&ctx, &query).await.expect("listado de grupo");
    assert_eq!(lookup.records[0].student_code.as_deref(), Some("3030"));

    let incompleto = GroupQuery { cod_pensum: "MEA".into(), ..Default::default() };
    let err = client.find_by_group(&ctx, &incompleto).await.expect_err("faltan datos");
    assert_eq!(err.kind, ErrorKind::InvalidArgument);
}

#[actix_web::test]
async fn test_find_students_despacha() {
    let client = client_for(&spawn_mock_sga());
    let ctx = client.context("general");

    let por_codigo = StudentSearch { cod_ceta: Some("123".into()), ..Default::default() };
    let lookup = client.find_students(&ctx, &por_codigo).await.expect("por código");
    assert_eq!(lookup.records[0].student_code.as_deref(), Some("123"));

    let por_nombre = StudentSearch { nombre: Some(NameQuery::new("", "Flores", "")), ..Default::default() };
    assert_eq!(client.find_students(&ctx, &por_nombre).await.expect("por nombre").total, 5);

    let err = client.find_students(&ctx, &StudentSearch::default()).await.expect_err("sin criterios");
    assert_eq!(err.kind, ErrorKind::InvalidArgument);
}

#[actix_web::test]
async fn test_check_connection() {
    let host = spawn_mock_sga();
    let client = client_for(&host);

    // La página principal responde 302 (login): cuenta como disponible
    let ok = client.check_connection(&client.context("general")).await;
    assert!(ok.success);
    assert_eq!(ok.status, Some(302));
    assert!(!ok.checked_at.is_empty());

    let caido = client.check_connection(&client.context("caido")).await;
    assert!(!caido.success);
    assert_eq!(caido.status, Some(503));

    let sin_red = client_for(&unreachable_url());
    let status = sin_red.check_connection(&sin_red.context("general")).await;
    assert!(!status.success);
    assert_eq!(status.status, None);
}

#[actix_web::test]
async fn test_authenticate() {
    let client = client_for(&spawn_mock_sga());
    let ctx = client.context("general");

    let autenticado = client.authenticate(&ctx, "admin", "secreto").await.expect("credenciales válidas");
    assert_eq!(autenticado.token.as_deref(), Some(TOKEN));
    assert_eq!(autenticado.endpoint, ctx.endpoint);
    // El contexto original no cambia
    assert_eq!(ctx.token, None);

    for user in ["admin-malo", "roto", "sin-token"] {
        let err = client.authenticate(&ctx, user, "x").await.expect_err(user);
        assert_eq!(err.kind, ErrorKind::Unauthorized, "{user}");
    }

    let sin_red = client_for(&unreachable_url());
    let err = sin_red.authenticate(&sin_red.context("general"), "admin", "secreto").await.expect_err("sin red");
    assert_eq!(err.kind, ErrorKind::ConnectionError);
}

#[actix_web::test]
async fn test_api_json() {
    let client = client_for(&spawn_mock_sga());
    let ctx = client.context("general");

    let carreras = client.get_carreras(&ctx).await.expect("carreras");
    assert_eq!(carreras["data"][0]["codigo"], "MEC");

    let gestiones = client.get_gestiones(&ctx).await.expect_err("respuesta no JSON");
    assert_eq!(gestiones.kind, ErrorKind::RemoteError);

    // Sin token la API rechaza la consulta
    let sin_token = client.get_inscripciones(&ctx, "5521").await.expect_err("requiere token");
    assert_eq!(sin_token.kind, ErrorKind::RemoteError);
    assert_eq!(sin_token.detail, "HTTP 401");

    let autenticado = client.authenticate(&ctx, "admin", "secreto").await.expect("token");
    let inscripciones = client.get_inscripciones(&autenticado, "5521").await.expect("inscripciones");
    assert_eq!(inscripciones["cod_ceta"], "5521");
}
