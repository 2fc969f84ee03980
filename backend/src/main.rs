use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use backend::analysis::CropDoctor;
use backend::cache::cache_service::CacheService;
use backend::detectors::DetectorRegistry;
use backend::forecast::RuleBasedYieldPredictor;
use backend::knowledge::StaticKnowledgeBase;
use backend::overlay::OverlayRenderer;
use backend::routes::configure_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let overlay_dir = env::var("OVERLAY_DIR").unwrap_or_else(|_| "temp".to_string());
    let overlay_font = env::var("OVERLAY_FONT").ok().map(PathBuf::from);

    let registry = DetectorRegistry::with_default_heuristics();
    let health = registry.health();
    log::info!(
        "detector registry ready: {} crop generators, {} disease generators, severity model loaded: {}",
        health.crop_generators,
        health.disease_generators,
        health.severity_model_loaded
    );

    let overlay = OverlayRenderer::new(&overlay_dir, overlay_font.as_deref());
    let doctor = web::Data::new(CropDoctor::new(
        registry,
        Arc::new(StaticKnowledgeBase),
        Arc::new(RuleBasedYieldPredictor),
        overlay,
        CacheService::new(),
    ));

    let port = env::var("PORT").unwrap_or_else(|_| "8081".to_string());
    let bind_address = format!("0.0.0.0:{}", port);

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(doctor.clone())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
