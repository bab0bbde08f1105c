// web-server/src/proxy.rs
use actix_web::http::header;
use actix_web::{web, Error, HttpRequest, HttpResponse, ResponseError};
use common::Config;
use thiserror::Error as ThisError;

/// Fixed API prefix rewritten to the backend origin
pub const API_PREFIX: &str = "/api/v1";

#[derive(Debug, ThisError)]
pub enum ProxyError {
    #[error("backend unreachable: {0}")]
    Upstream(String),
}

impl ResponseError for ProxyError {
    fn error_response(&self) -> HttpResponse {
        tracing::error!("API proxy error: {}", self);
        HttpResponse::BadGateway().json(serde_json::json!({
            "error": "backend unavailable"
        }))
    }
}

/// Configure the API proxy routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource(format!("{}/{{tail:.*}}", API_PREFIX)).to(forward));
}

/// Rewrite `/api/v1/*` to the configured backend origin, preserving the path
/// suffix and query string, and stream the response back.
async fn forward(
    req: HttpRequest,
    payload: web::Payload,
    config: web::Data<Config>,
    client: web::Data<awc::Client>,
) -> Result<HttpResponse, Error> {
    let backend = config.backend_url.trim_end_matches('/');

    let mut target = format!("{}{}", backend, req.uri().path());
    if let Some(query) = req.uri().query() {
        target.push('?');
        target.push_str(query);
    }

    tracing::debug!("Proxying {} {} to {}", req.method(), req.path(), target);

    let upstream = client
        .request_from(target.as_str(), req.head())
        .no_decompress()
        .send_stream(payload)
        .await
        .map_err(|e| ProxyError::Upstream(e.to_string()))?;

    let mut response = HttpResponse::build(upstream.status());
    // Connection is a hop-by-hop header; everything else passes through
    for (name, value) in upstream
        .headers()
        .iter()
        .filter(|(name, _)| *name != header::CONNECTION)
    {
        response.insert_header((name.clone(), value.clone()));
    }

    Ok(response.streaming(upstream))
}
