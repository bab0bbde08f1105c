// web-server/src/static_files.rs
use actix_files::{Files, NamedFile};
use actix_web::{web, Error, HttpRequest, HttpResponse, Result};
use common::config::StaticFilesConfig;
use std::path::PathBuf;

// Async handler function for SPA fallback
async fn spa_index(
    req: HttpRequest,
    config: web::Data<StaticFilesConfig>,
) -> Result<HttpResponse, Error> {
    // Never shadow API routes with the SPA shell
    let path = req.path();
    if path.starts_with("/api/") {
        return Ok(HttpResponse::NotFound().finish());
    }

    // For all other unmatched routes, serve the index file (SPA support)
    let index_path = PathBuf::from(&config.path).join(&config.index);
    let file = NamedFile::open(index_path)?;
    Ok(file.into_response(&req))
}

// Configure static file serving with SPA support
pub fn configure(cfg: &mut web::ServiceConfig, config: &StaticFilesConfig) {
    let config_data = web::Data::new(config.clone());

    cfg.app_data(config_data)
        .service(
            Files::new("/", &config.path)
                .index_file(&config.index)
                .prefer_utf8(true)
                .use_etag(true)
                .use_last_modified(true),
        )
        // Catch-all route for SPA support with the lowest priority
        .default_service(web::route().to(spa_index));
}
