// web-server/src/middleware/auth_gate.rs
use actix::Addr;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpResponse,
};
use common::config::{AuthMode, Config};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::auth::{
    hosted_auth_enabled, HOSTED_SESSION_COOKIE_NAME, SESSION_COOKIE_NAME,
};
use crate::session_registry::{HasLocalToken, SessionRegistryActor};

/// Where unauthenticated navigations are sent
pub const SIGN_IN_PATH: &str = "/sign-in";

/// Routes reachable without a session. Home and the sign-in/sign-up pages
/// must stay public to avoid redirect loops.
fn is_public_route(path: &str) -> bool {
    path == "/" || path.starts_with("/sign-in") || path.starts_with("/sign-up")
}

/// Paths the hosted provider hits for its internal auth/session refresh flows
fn is_provider_internal_path(path: &str) -> bool {
    path.starts_with("/_clerk") || path.starts_with("/v1/")
}

/// API routes carry their own auth handling (the backend authorizes proxied
/// calls; the local auth endpoints must be reachable while signed out).
fn is_api_path(path: &str) -> bool {
    path.starts_with("/api/")
}

/// Static assets are served to everyone; gating them would redirect script
/// and stylesheet loads to the sign-in page.
fn is_asset_path(path: &str) -> bool {
    path.rsplit('/').next().is_some_and(|segment| segment.contains('.'))
}

fn bypasses_gate(path: &str) -> bool {
    is_public_route(path)
        || is_provider_internal_path(path)
        || is_api_path(path)
        || is_asset_path(path)
}

/// Build the sign-in redirect target, carrying the original destination as a
/// URL-encoded `redirect_url` query parameter.
fn sign_in_redirect_target(destination: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("redirect_url", destination)
        .finish();
    format!("{}?{}", SIGN_IN_PATH, query)
}

/// Middleware gating page navigations behind the configured auth mode.
///
/// Local mode checks the gateway session for a stored token; hosted mode
/// checks for the provider's own session cookie, and disengages entirely
/// when the publishable key fails its format check.
#[derive(Clone)]
pub struct AuthGate {
    mode: AuthMode,
    hosted_enabled: bool,
    registry: Addr<SessionRegistryActor>,
}

impl AuthGate {
    pub fn new(config: &Config, registry: Addr<SessionRegistryActor>) -> Self {
        Self {
            mode: config.auth.mode,
            hosted_enabled: hosted_auth_enabled(config),
            registry,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthGateMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateMiddleware {
            service: Rc::new(service),
            gate: self.clone(),
        }))
    }
}

pub struct AuthGateMiddleware<S> {
    service: Rc<S>,
    gate: AuthGate,
}

impl<S, B> Service<ServiceRequest> for AuthGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let gate = self.gate.clone();

        Box::pin(async move {
            let path = req.path().to_string();

            if bypasses_gate(&path) {
                return service.call(req).await.map(|res| res.map_into_left_body());
            }

            let signed_in = match gate.mode {
                AuthMode::Hosted => {
                    // Malformed/absent key disengages hosted auth (fail open)
                    !gate.hosted_enabled || req.cookie(HOSTED_SESSION_COOKIE_NAME).is_some()
                }
                AuthMode::Local => match req.cookie(SESSION_COOKIE_NAME) {
                    Some(cookie) => {
                        let lookup = gate
                            .registry
                            .send(HasLocalToken {
                                cookie_token: cookie.value().to_string(),
                            })
                            .await;
                        match lookup {
                            Ok(has_token) => has_token,
                            Err(e) => {
                                tracing::error!("Error checking session token: {}", e);
                                false
                            }
                        }
                    }
                    None => false,
                },
            };

            if signed_in {
                return service.call(req).await.map(|res| res.map_into_left_body());
            }

            let destination = match req.query_string() {
                "" => path.clone(),
                query => format!("{}?{}", path, query),
            };
            let target = sign_in_redirect_target(&destination);

            tracing::debug!("Redirecting unauthenticated request for {} to {}", path, target);

            let response = HttpResponse::Found()
                .insert_header((header::LOCATION, target))
                .finish()
                .map_into_right_body();

            Ok(req.into_response(response))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::{test, web, App};
    use common::config::AuthConfig;

    #[actix_web::test]
    async fn test_route_classification() {
        assert!(is_public_route("/"));
        assert!(is_public_route("/sign-in"));
        assert!(is_public_route("/sign-in/sso-callback"));
        assert!(is_public_route("/sign-up"));
        assert!(!is_public_route("/boards"));

        assert!(is_provider_internal_path("/_clerk/handshake"));
        assert!(is_provider_internal_path("/v1/client"));
        assert!(!is_provider_internal_path("/boards/v1"));

        assert!(is_api_path("/api/v1/boards"));
        assert!(is_api_path("/api/auth/login"));
        assert!(!is_api_path("/apiary"));

        assert!(is_asset_path("/assets/app.js"));
        assert!(is_asset_path("/favicon.ico"));
        assert!(!is_asset_path("/boards/new"));
    }

    #[actix_web::test]
    async fn test_sign_in_redirect_target_encodes_destination() {
        assert_eq!(
            sign_in_redirect_target("/boards?filter=mine"),
            "/sign-in?redirect_url=%2Fboards%3Ffilter%3Dmine"
        );
    }

    fn local_config() -> Config {
        Config {
            auth: AuthConfig {
                mode: AuthMode::Local,
                publishable_key: String::new(),
                after_sign_out_url: "/".to_string(),
                sign_in_fallback_redirect_url: "/onboarding".to_string(),
            },
            ..Config::default()
        }
    }

    fn hosted_config(key: &str) -> Config {
        let mut config = local_config();
        config.auth.mode = AuthMode::Hosted;
        config.auth.publishable_key = key.to_string();
        config
    }

    async fn protected_page() -> HttpResponse {
        HttpResponse::Ok().body("protected")
    }

    #[actix_web::test]
    async fn test_local_mode_redirects_without_session() {
        use actix::Actor;
        let registry = SessionRegistryActor::new(AuthMode::Local).start();
        let config = local_config();

        let app = test::init_service(
            App::new()
                .wrap(AuthGate::new(&config, registry))
                .route("/boards", web::get().to(protected_page)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/boards?filter=mine")
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), actix_web::http::StatusCode::FOUND);
        let location = res.headers().get(header::LOCATION).unwrap();
        assert_eq!(
            location.to_str().unwrap(),
            "/sign-in?redirect_url=%2Fboards%3Ffilter%3Dmine"
        );
    }

    #[actix_web::test]
    async fn test_local_mode_passes_with_token() {
        use actix::Actor;
        use crate::session_registry::{EnsureSession, SetLocalToken};

        let registry = SessionRegistryActor::new(AuthMode::Local).start();
        let ensured = registry
            .send(EnsureSession { cookie_token: None })
            .await
            .unwrap();
        registry
            .send(SetLocalToken {
                cookie_token: ensured.cookie_token.clone(),
                token: "tok".to_string(),
            })
            .await
            .unwrap();

        let config = local_config();
        let app = test::init_service(
            App::new()
                .wrap(AuthGate::new(&config, registry))
                .route("/boards", web::get().to(protected_page)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/boards")
            .cookie(Cookie::new(SESSION_COOKIE_NAME, ensured.cookie_token))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert!(res.status().is_success());
    }

    #[actix_web::test]
    async fn test_hosted_mode_redirects_without_provider_cookie() {
        use actix::Actor;
        let registry = SessionRegistryActor::new(AuthMode::Hosted).start();
        let config = hosted_config("pk_test_abc123");

        let app = test::init_service(
            App::new()
                .wrap(AuthGate::new(&config, registry))
                .route("/boards", web::get().to(protected_page)),
        )
        .await;

        let req = test::TestRequest::get().uri("/boards").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), actix_web::http::StatusCode::FOUND);
    }

    #[actix_web::test]
    async fn test_hosted_mode_passes_with_provider_cookie() {
        use actix::Actor;
        let registry = SessionRegistryActor::new(AuthMode::Hosted).start();
        let config = hosted_config("pk_test_abc123");

        let app = test::init_service(
            App::new()
                .wrap(AuthGate::new(&config, registry))
                .route("/boards", web::get().to(protected_page)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/boards")
            .cookie(Cookie::new(HOSTED_SESSION_COOKIE_NAME, "provider-session"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert!(res.status().is_success());
    }

    #[actix_web::test]
    async fn test_hosted_mode_with_bad_key_fails_open() {
        use actix::Actor;
        let registry = SessionRegistryActor::new(AuthMode::Hosted).start();
        let config = hosted_config("not-a-key");

        let app = test::init_service(
            App::new()
                .wrap(AuthGate::new(&config, registry))
                .route("/boards", web::get().to(protected_page)),
        )
        .await;

        let req = test::TestRequest::get().uri("/boards").to_request();
        let res = test::call_service(&app, req).await;
        assert!(res.status().is_success());
    }

    #[actix_web::test]
    async fn test_public_routes_bypass_gate() {
        use actix::Actor;
        let registry = SessionRegistryActor::new(AuthMode::Local).start();
        let config = local_config();

        let app = test::init_service(
            App::new()
                .wrap(AuthGate::new(&config, registry))
                .route("/", web::get().to(protected_page))
                .route("/sign-in", web::get().to(protected_page)),
        )
        .await;

        for uri in ["/", "/sign-in"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let res = test::call_service(&app, req).await;
            assert!(res.status().is_success(), "expected {uri} to be public");
        }
    }
}
