// web-server/src/api/mod.rs
pub mod auth;

pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(
        actix_web::web::scope("/api")
            .service(auth::runtime_config)
            .service(auth::login)
            .service(auth::logout)
            .service(auth::session_state)
            .service(auth::invalidate_session),
    );
}
