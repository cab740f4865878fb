use std::net::SocketAddr;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::auth;
use crate::state::AppState;

pub fn build_app(state: AppState) -> Router {
    // Credentialed CORS pinned to the configured frontend origin; wildcard
    // origins cannot carry cookies.
    let cors = match state.config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true),
        Err(_) => {
            warn!(origin = %state.config.cors_origin, "invalid CORS origin; falling back to permissive");
            CorsLayer::permissive()
        }
    };

    auth::router()
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     _span: &tracing::Span| {
                        let status = res.status();
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::debug!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "4000".into())
    )
    .parse()?;

    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    async fn body_json(res: axum::response::Response) -> Value {
        let bytes = res.into_body().collect().await.expect("body").to_bytes();
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn register_body(email: &str) -> Value {
        json!({
            "name": "Flow Tester",
            "email": email,
            "password": "a-long-enough-password"
        })
    }

    /// First `name=value` pair of the Set-Cookie header.
    fn session_cookie_pair(res: &axum::response::Response) -> String {
        res.headers()
            .get(header::SET_COOKIE)
            .expect("set-cookie present")
            .to_str()
            .expect("ascii")
            .split(';')
            .next()
            .expect("cookie pair")
            .to_string()
    }

    #[tokio::test]
    async fn health_answers_with_envelope() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["success"], json!(true));
    }

    #[tokio::test]
    async fn register_sets_cookie_and_cookie_grants_access() {
        let state = AppState::fake();
        let app = build_app(state);

        let res = app
            .clone()
            .oneshot(post_json("/api/auth/register", register_body("web@example.com")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let cookie = session_cookie_pair(&res);
        assert!(cookie.starts_with("token="));
        let body = body_json(res).await;
        assert_eq!(body["success"], json!(true));

        let res = app
            .oneshot(
                Request::builder()
                    .uri("/api/user/data")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["userData"]["email"], json!("web@example.com"));
        assert_eq!(body["userData"]["isAccountVerified"], json!(false));
    }

    #[tokio::test]
    async fn bearer_token_from_body_grants_access() {
        let state = AppState::fake();
        let app = build_app(state);

        let res = app
            .clone()
            .oneshot(post_json("/api/auth/register", register_body("api@example.com")))
            .await
            .unwrap();
        let token = body_json(res).await["token"]
            .as_str()
            .expect("token in body")
            .to_string();

        let res = app
            .oneshot(
                Request::builder()
                    .uri("/api/auth/is-auth")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(res).await;
        assert_eq!(body["success"], json!(true));
    }

    #[tokio::test]
    async fn protected_route_without_session_fails_in_envelope() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(Request::builder().uri("/api/user/data").body(Body::empty()).unwrap())
            .await
            .unwrap();
        // Domain failures keep the 200 + envelope shape.
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn logout_expires_the_cookie() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(post_json("/api/auth/logout", json!({})))
            .await
            .unwrap();
        let header = res
            .headers()
            .get(header::SET_COOKIE)
            .expect("set-cookie present")
            .to_str()
            .expect("ascii")
            .to_string();
        assert!(header.starts_with("token="));
        assert!(header.contains("Max-Age=0"));
        let body = body_json(res).await;
        assert_eq!(body["success"], json!(true));
    }

    #[tokio::test]
    async fn malformed_json_is_reported_in_envelope() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn password_reset_flow_over_http() {
        let state = AppState::fake();
        let app = build_app(state.clone());

        app.clone()
            .oneshot(post_json("/api/auth/register", register_body("cycle@example.com")))
            .await
            .unwrap();

        let res = app
            .clone()
            .oneshot(post_json(
                "/api/auth/forgot-password",
                json!({"email": "cycle@example.com"}),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(res).await["success"], json!(true));

        let code = state
            .store
            .find_by_email("cycle@example.com")
            .await
            .expect("lookup")
            .expect("present")
            .reset_otp
            .expect("reset code stored");

        let res = app
            .clone()
            .oneshot(post_json(
                "/api/auth/reset-password",
                json!({
                    "email": "cycle@example.com",
                    "otp": code,
                    "newPassword": "an-entirely-new-password"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(res).await["success"], json!(true));

        let res = app
            .oneshot(post_json(
                "/api/auth/login",
                json!({"email": "cycle@example.com", "password": "an-entirely-new-password"}),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(res).await["success"], json!(true));
    }
}
