// web-server/src/main.rs
use actix::Actor;
use actix_web::{web, App, HttpServer};
use common::{setup_tracing, Config};
use std::path::Path;

use web_server::middleware::auth_gate::AuthGate;
use web_server::session_registry::SessionRegistryActor;
use web_server::{api, proxy, static_files};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Setup tracing
    setup_tracing();

    // Load configuration
    let config = Config::from_env();

    // Save address before moving config into web::Data
    let server_addr = config.web_server_addr.clone();

    tracing::info!(
        "Starting Mission Control gateway on {} (auth mode: {})",
        server_addr,
        config.auth.mode
    );

    // Start the session registry
    let registry = SessionRegistryActor::new(config.auth.mode)
        .with_ttl(config.session_ttl_seconds)
        .start();

    let serve_static = Path::new(&config.static_files.path).exists();
    if !serve_static {
        tracing::warn!(
            "Static assets path {} does not exist; not serving the UI shell",
            config.static_files.path
        );
    }

    // Create data references
    let config_data = web::Data::new(config);
    let registry_data = web::Data::new(registry);

    // Start HTTP server
    HttpServer::new(move || {
        let gate = AuthGate::new(config_data.get_ref(), registry_data.get_ref().clone());
        let static_config = config_data.static_files.clone();

        let mut app = App::new()
            .app_data(config_data.clone())
            .app_data(registry_data.clone())
            // Per-worker HTTP client for the API proxy
            .app_data(web::Data::new(awc::Client::default()))
            .wrap(gate)
            .configure(proxy::configure)
            .configure(api::configure);

        if serve_static {
            app = app.configure(|cfg| static_files::configure(cfg, &static_config));
        }

        app
    })
    .bind(&server_addr)?
    .run()
    .await
}
