//! HTTP router.
//!
//! Returns a composable `Router` with every route nested under `/api/`.
//! Record endpoints are open; `/api/auth/me` sits behind bearer auth.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderName, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the clinic API router.
pub fn clinic_api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn build_router(ctx: ApiContext) -> Router {
    let protected = Router::new()
        .route("/auth/me", get(endpoints::auth::me))
        .route_layer(axum::middleware::from_fn_with_state(
            ctx.clone(),
            middleware::auth::require_auth,
        ));

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let open = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/login", post(endpoints::auth::login))
        .route(
            "/paciente",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route(
            "/paciente/:id",
            get(endpoints::patients::detail)
                .put(endpoints::patients::update)
                .delete(endpoints::patients::remove),
        )
        .route("/paciente/cpf/:cpf", get(endpoints::patients::by_cpf))
        .route(
            "/profissionais",
            get(endpoints::professionals::list).post(endpoints::professionals::create),
        )
        .route(
            "/profissionais/:id",
            get(endpoints::professionals::detail)
                .put(endpoints::professionals::update)
                .delete(endpoints::professionals::remove),
        )
        .route(
            "/profissionais/crm/:crm",
            get(endpoints::professionals::by_license),
        )
        .route(
            "/consultas",
            get(endpoints::consultations::list).post(endpoints::consultations::create),
        )
        .route(
            "/consultas/:id",
            get(endpoints::consultations::detail)
                .put(endpoints::consultations::update)
                .delete(endpoints::consultations::remove),
        );

    Router::new()
        .nest("/api", open.merge(protected))
        .with_state(ctx)
        .layer(cors_layer())
}

/// Browser clients: any origin is echoed back, credentials allowed.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::HEAD,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ORIGIN,
            header::ACCEPT,
            HeaderName::from_static("x-requested-with"),
        ])
        .max_age(Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderMap, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::core_state::test_settings;

    struct TestApp {
        router: Router,
        _dir: tempfile::TempDir,
    }

    fn test_app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let core = CoreState::new(test_settings(dir.path())).unwrap();
        TestApp {
            router: clinic_api_router(Arc::new(core)),
            _dir: dir,
        }
    }

    impl TestApp {
        async fn send(
            &self,
            method: &str,
            uri: &str,
            body: Option<Value>,
            token: Option<&str>,
        ) -> (StatusCode, HeaderMap, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header("Authorization", format!("Bearer {token}"));
            }
            let request = match body {
                Some(json) => builder
                    .header("Content-Type", "application/json")
                    .body(Body::from(json.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let headers = response.headers().clone();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, headers, json)
        }

        async fn create_professional(&self, name: &str, crm: i64) -> i64 {
            let (status, _, body) = self
                .send(
                    "POST",
                    "/api/profissionais",
                    Some(json!({
                        "nome_profissional": name,
                        "especialidade_profissional": "Clínica Geral",
                        "tipo_atend": "presencial",
                        "crm_profissional": crm
                    })),
                    None,
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body["id_profissional"].as_i64().unwrap()
        }

        async fn register_patient(&self) -> Value {
            let (status, _, body) = self
                .send("POST", "/api/paciente", Some(patient_json()), None)
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body
        }
    }

    fn patient_json() -> Value {
        json!({
            "nome_paciente": "Maria Souza",
            "idade_paciente": 67,
            "nivel_tecnico": 3,
            "tipo_atendimento": "online",
            "cpf_paciente": "123.456.789-01",
            "senha_paciente": "abc123"
        })
    }

    fn ids_of(consultation: &Value) -> Vec<i64> {
        consultation["profissionais"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id_profissional"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn health_reports_database() {
        let app = test_app();
        let (status, _, body) = app.send("GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["tables"], 5);
    }

    #[tokio::test]
    async fn patient_lifecycle() {
        let app = test_app();
        let (status, headers, created) = app
            .send("POST", "/api/paciente", Some(patient_json()), None)
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(headers.get("Location").unwrap(), "/api/paciente/1");
        assert_eq!(created["id_paciente"], 1);
        assert_eq!(created["cpf_paciente"], "12345678901");
        assert!(created.get("senha_paciente").is_none());

        let (status, _, by_cpf) = app
            .send("GET", "/api/paciente/cpf/123.456.789-01", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(by_cpf["nome_paciente"], "Maria Souza");

        let (status, _, updated) = app
            .send(
                "PUT",
                "/api/paciente/1",
                Some(json!({ "idade_paciente": 68 })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["idade_paciente"], 68);
        assert_eq!(updated["nome_paciente"], "Maria Souza");

        let (status, _, _) = app.send("DELETE", "/api/paciente/1", None, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _, _) = app.send("GET", "/api/paciente/1", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn patient_errors_map_to_status_codes() {
        let app = test_app();
        app.register_patient().await;

        let (status, _, body) = app
            .send("POST", "/api/paciente", Some(patient_json()), None)
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");

        let (status, _, body) = app
            .send(
                "POST",
                "/api/paciente",
                Some(json!({ "nome_paciente": "M", "cpf_paciente": "123" })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
        assert!(body["error"]["problems"].as_array().unwrap().len() >= 2);

        let (status, _, _) = app.send("GET", "/api/paciente/0", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _, _) = app.send("GET", "/api/paciente/99", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = app.send("GET", "/api/paciente/cpf/123", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _, _) = app.send("DELETE", "/api/paciente/42", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let app = test_app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/consultas")
            .header("Content-Type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn login_and_me() {
        let app = test_app();
        app.register_patient().await;

        let (status, _, body) = app
            .send(
                "POST",
                "/api/auth/login",
                Some(json!({ "cpf_paciente": "12345678901", "senha_paciente": "abc123" })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, headers, me) = app.send("GET", "/api/auth/me", None, Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["cpf_paciente"], "12345678901");
        assert_eq!(headers.get("Cache-Control").unwrap(), "no-store");

        let (status, _, body) = app.send("GET", "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "AUTH_REQUIRED");

        let (status, _, body) = app
            .send("GET", "/api/auth/me", None, Some("not-a-token"))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn login_rejections() {
        let app = test_app();
        app.register_patient().await;

        let (status, _, _) = app
            .send(
                "POST",
                "/api/auth/login",
                Some(json!({ "cpf_paciente": "12345678901", "senha_paciente": "wrong1" })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, _) = app
            .send(
                "POST",
                "/api/auth/login",
                Some(json!({ "cpf_paciente": "98765432100", "senha_paciente": "abc123" })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // The stand-in digest for unknown CPFs never lets anyone in.
        let (status, _, _) = app
            .send(
                "POST",
                "/api/auth/login",
                Some(json!({ "cpf_paciente": "98765432100", "senha_paciente": "unknown-patient" })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, _) = app
            .send(
                "POST",
                "/api/auth/login",
                Some(json!({ "cpf_paciente": "12345678901" })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn professional_lookup_and_duplicates() {
        let app = test_app();
        let id = app.create_professional("Dra. Ana Lima", 12345).await;

        let (status, _, body) = app
            .send("GET", "/api/profissionais/crm/12345", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id_profissional"], id);
        assert_eq!(body["tipo_atend"], "presencial");

        let (status, _, _) = app
            .send(
                "POST",
                "/api/profissionais",
                Some(json!({
                    "nome_profissional": "Dr. Outro",
                    "especialidade_profissional": "Pediatria",
                    "tipo_atend": "online",
                    "crm_profissional": 12345
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _, _) = app.send("GET", "/api/profissionais/crm/0", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _, _) = app
            .send("GET", "/api/profissionais/crm/54321", None, None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn consultation_links_follow_updates() {
        let app = test_app();
        let p1 = app.create_professional("Dr. Um", 1001).await;
        let p2 = app.create_professional("Dr. Dois", 1002).await;
        let p3 = app.create_professional("Dr. Tres", 1003).await;

        let (status, headers, created) = app
            .send(
                "POST",
                "/api/consultas",
                Some(json!({
                    "tipo_consulta": "Consulta Geral",
                    "data_consulta": "2024-03-01",
                    "motivo_consulta": "checkup",
                    "ids_profissionais": [p1, p2, p2]
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{created}");
        assert_eq!(headers.get("Location").unwrap(), "/api/consultas/1");
        assert_eq!(ids_of(&created), vec![p1, p2]);

        // Absent list keeps the links.
        let (status, _, kept) = app
            .send(
                "PUT",
                "/api/consultas/1",
                Some(json!({ "motivo_consulta": "retorno" })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(kept["motivo_consulta"], "retorno");
        assert_eq!(ids_of(&kept), vec![p1, p2]);

        let (_, _, replaced) = app
            .send(
                "PUT",
                "/api/consultas/1",
                Some(json!({ "ids_profissionais": [p2, p3] })),
                None,
            )
            .await;
        let mut ids = ids_of(&replaced);
        ids.sort_unstable();
        let mut expected = vec![p2, p3];
        expected.sort_unstable();
        assert_eq!(ids, expected);

        // Linked professional cannot be deleted; p1 no longer is.
        let (status, _, _) = app
            .send("DELETE", &format!("/api/profissionais/{p3}"), None, None)
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _, _) = app
            .send("DELETE", &format!("/api/profissionais/{p1}"), None, None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, _, cleared) = app
            .send(
                "PUT",
                "/api/consultas/1",
                Some(json!({ "ids_profissionais": [] })),
                None,
            )
            .await;
        assert!(ids_of(&cleared).is_empty());

        let (status, _, _) = app.send("DELETE", "/api/consultas/1", None, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _, _) = app.send("DELETE", "/api/consultas/1", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn consultation_with_unknown_professional_is_not_created() {
        let app = test_app();
        let (status, _, body) = app
            .send(
                "POST",
                "/api/consultas",
                Some(json!({
                    "tipo_consulta": "Retorno",
                    "data_consulta": "2024-05-10",
                    "motivo_consulta": "dor",
                    "ids_profissionais": [777]
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

        let (_, _, list) = app.send("GET", "/api/consultas", None, None).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn consultation_update_of_missing_row() {
        let app = test_app();
        let (status, _, _) = app
            .send(
                "PUT",
                "/api/consultas/5",
                Some(json!({ "motivo_consulta": "x" })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = app.send("GET", "/api/consultas/-1", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cors_preflight_echoes_origin() {
        let app = test_app();
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/consultas")
            .header("Origin", "http://localhost:5173")
            .header("Access-Control-Request-Method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers.get("access-control-allow-origin").unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(headers.get("access-control-allow-credentials").unwrap(), "true");
    }
}
