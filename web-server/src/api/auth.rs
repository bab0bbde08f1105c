// web-server/src/api/auth.rs
use actix::Addr;
use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{delete, get, post, web, HttpRequest, HttpResponse, Responder};
use common::config::{AuthMode, Config};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::auth::redirects::resolve_sign_in_redirect;
use crate::auth::{hosted_auth_enabled, HOSTED_SESSION_COOKIE_NAME, SESSION_COOKIE_NAME};
use crate::session_registry::{
    ClearLocalToken, EnsureSession, HasLocalToken, InvalidateSession, SessionRegistryActor,
    SetLocalToken,
};
use crate::utils::token::mint_opaque_token;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Candidate post-login destination, carried from the sign-in flow's
    /// query parameter. Untrusted; sanitized before it is echoed back.
    pub redirect_url: Option<String>,
}

fn session_cookie(value: String, max_age_seconds: i64) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE_NAME, value)
        .path("/")
        .secure(true)
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(CookieDuration::seconds(max_age_seconds))
        .finish()
}

fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE_NAME, "")
        .path("/")
        .max_age(CookieDuration::seconds(0))
        .finish()
}

/// Runtime configuration the UI shell needs before it can mount auth
#[get("/runtime-config")]
pub async fn runtime_config(config: web::Data<Config>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "auth_mode": config.auth.mode,
        "publishable_key": config.auth.publishable_key,
        "after_sign_out_url": config.auth.after_sign_out_url,
        "sign_in_fallback_redirect_url": config.auth.sign_in_fallback_redirect_url,
    }))
}

// Local-mode sign-in: mint an opaque bearer token into the session and
// answer the sanitized post-login destination
#[post("/auth/login")]
pub async fn login(
    req: HttpRequest,
    body: Option<web::Json<LoginRequest>>,
    config: web::Data<Config>,
    registry: web::Data<Addr<SessionRegistryActor>>,
) -> impl Responder {
    if config.auth.mode != AuthMode::Local {
        return HttpResponse::NotFound().json(json!({
            "error": "local auth is not enabled"
        }));
    }

    let cookie_token = req
        .cookie(SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string());

    let ensured = match registry.send(EnsureSession { cookie_token }).await {
        Ok(ensured) => ensured,
        Err(e) => {
            tracing::error!("Error ensuring session: {}", e);
            return HttpResponse::InternalServerError().json(json!({
                "error": "Internal server error"
            }));
        }
    };

    let stored = registry
        .send(SetLocalToken {
            cookie_token: ensured.cookie_token.clone(),
            token: mint_opaque_token(),
        })
        .await;
    match stored {
        Ok(true) => {}
        Ok(false) => {
            tracing::error!("Freshly ensured session rejected the token");
            return HttpResponse::InternalServerError().json(json!({
                "error": "Internal server error"
            }));
        }
        Err(e) => {
            tracing::error!("Error storing local auth token: {}", e);
            return HttpResponse::InternalServerError().json(json!({
                "error": "Internal server error"
            }));
        }
    }

    let raw_redirect = body.and_then(|body| body.into_inner().redirect_url);
    let origin = Url::parse(&config.public_origin).ok();
    if origin.is_none() {
        tracing::warn!("Configured public_origin is not a valid URL");
    }
    let redirect_to = resolve_sign_in_redirect(
        raw_redirect.as_deref(),
        Some(&config.auth.sign_in_fallback_redirect_url),
        origin.as_ref(),
    );

    tracing::info!("Local auth sign-in completed");

    HttpResponse::Ok()
        .cookie(session_cookie(
            ensured.cookie_token,
            config.session_ttl_seconds,
        ))
        .json(json!({
            "signed_in": true,
            "redirect_to": redirect_to,
            "new_session": ensured.new_session,
        }))
}

// Sign out: destroy the local auth token. The session itself survives;
// invalidation has its own endpoint.
#[post("/auth/logout")]
pub async fn logout(
    req: HttpRequest,
    config: web::Data<Config>,
    registry: web::Data<Addr<SessionRegistryActor>>,
) -> impl Responder {
    if let Some(cookie) = req.cookie(SESSION_COOKIE_NAME) {
        match registry
            .send(ClearLocalToken {
                cookie_token: cookie.value().to_string(),
            })
            .await
        {
            Ok(cleared) => {
                if cleared {
                    tracing::info!("Local auth token cleared");
                }
            }
            Err(e) => {
                tracing::error!("Error clearing local auth token: {}", e);
                return HttpResponse::InternalServerError().json(json!({
                    "error": "Internal server error"
                }));
            }
        }
    }

    HttpResponse::Ok().json(json!({
        "signed_in": false,
        "redirect_to": config.auth.after_sign_out_url,
    }))
}

/// Current auth state as the gate middleware would see it
#[get("/auth/session")]
pub async fn session_state(
    req: HttpRequest,
    config: web::Data<Config>,
    registry: web::Data<Addr<SessionRegistryActor>>,
) -> impl Responder {
    let signed_in = match config.auth.mode {
        AuthMode::Local => match req.cookie(SESSION_COOKIE_NAME) {
            Some(cookie) => {
                match registry
                    .send(HasLocalToken {
                        cookie_token: cookie.value().to_string(),
                    })
                    .await
                {
                    Ok(has_token) => has_token,
                    Err(e) => {
                        tracing::error!("Error checking session token: {}", e);
                        return HttpResponse::InternalServerError().json(json!({
                            "error": "Internal server error"
                        }));
                    }
                }
            }
            None => false,
        },
        AuthMode::Hosted => {
            hosted_auth_enabled(&config) && req.cookie(HOSTED_SESSION_COOKIE_NAME).is_some()
        }
    };

    HttpResponse::Ok().json(json!({
        "mode": config.auth.mode,
        "signed_in": signed_in,
    }))
}

// Invalidate the gateway session entirely and clear its cookie
#[delete("/auth/session")]
pub async fn invalidate_session(
    req: HttpRequest,
    registry: web::Data<Addr<SessionRegistryActor>>,
) -> impl Responder {
    if let Some(cookie) = req.cookie(SESSION_COOKIE_NAME) {
        match registry
            .send(InvalidateSession {
                cookie_token: cookie.value().to_string(),
            })
            .await
        {
            Ok(true) => {
                tracing::info!("Session invalidated");
                HttpResponse::Ok()
                    .cookie(expired_session_cookie())
                    .json(json!({
                        "status": "success",
                        "message": "Session invalidated"
                    }))
            }
            Ok(false) => {
                tracing::info!("Attempt to invalidate non-existent session");
                HttpResponse::NotFound().json(json!({
                    "error": "Session not found"
                }))
            }
            Err(e) => {
                tracing::error!("Error invalidating session: {}", e);
                HttpResponse::InternalServerError().json(json!({
                    "error": "Internal server error"
                }))
            }
        }
    } else {
        HttpResponse::BadRequest().json(json!({
            "error": "No session cookie found"
        }))
    }
}
