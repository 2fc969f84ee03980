use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use futures::{StreamExt, TryStreamExt};
use log::{error, info};
use serde::Serialize;
use serde_json::json;
use shared::AnalysisContext;
use std::io::Write;

use crate::analysis::CropDoctor;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/analyze").route(web::post().to(handle_analyze)))
        .service(web::resource("/api/health").route(web::get().to(handle_health)))
        .service(web::resource("/api/cache/{image_hash}").route(web::get().to(get_cached_report)));
}

/// Accepts a multipart form with one image part plus an optional JSON part
/// carrying the analysis context. Unknown parts are ignored.
async fn handle_analyze(
    doctor: web::Data<CropDoctor>,
    mut payload: Multipart,
) -> Result<HttpResponse, Error> {
    let mut image_data: Vec<u8> = Vec::new();
    let mut context = AnalysisContext::default();

    while let Ok(Some(mut field)) = payload.try_next().await {
        let is_json = field
            .content_type()
            .map(|mime| mime.essence_str() == "application/json")
            .unwrap_or(false)
            || field.name() == Some("context");

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let bytes = chunk?;
            data.write_all(&bytes)?;
        }

        if is_json {
            match serde_json::from_slice::<AnalysisContext>(&data) {
                Ok(parsed) => context = parsed,
                Err(e) => {
                    error!("malformed context field: {}", e);
                    return Ok(HttpResponse::BadRequest().json(ErrorResponse {
                        error: format!("Invalid context JSON: {}", e),
                    }));
                }
            }
        } else if image_data.is_empty() {
            image_data = data;
        }
    }

    if image_data.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse {
            error: "No image provided".to_string(),
        }));
    }

    info!("received analysis request ({} bytes)", image_data.len());

    match doctor.analyze(&image_data, context).await {
        Ok(report) => Ok(HttpResponse::Ok().json(report)),
        Err(e) => {
            error!("analysis rejected: {}", e);
            Ok(HttpResponse::UnprocessableEntity().json(ErrorResponse {
                error: format!("Image analysis error: {}", e),
            }))
        }
    }
}

async fn handle_health(doctor: web::Data<CropDoctor>) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(doctor.health()))
}

async fn get_cached_report(
    doctor: web::Data<CropDoctor>,
    image_hash: web::Path<String>,
) -> Result<HttpResponse, Error> {
    match doctor.cache().lookup(&image_hash).await {
        Ok(entry) => Ok(HttpResponse::Ok().json(entry)),
        Err(_) => Ok(HttpResponse::NotFound().json(json!({
            "error": "No cached report for this image hash"
        }))),
    }
}
