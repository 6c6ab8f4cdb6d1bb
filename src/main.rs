// src/main.rs
use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use log::info;
use std::sync::Arc;

use restyle::AppState;
use restyle::config::BriaConfig;
use restyle::handlers::{
    create_batch, extract_style_profile, generate_image, get_batch_status, preview_preset,
};
use restyle::services::{BriaClient, ImageProcessor};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting restyle service...");

    let config = BriaConfig::from_env().expect("BRIA_API_TOKEN must be set");
    let bria_client =
        Arc::new(BriaClient::new(config).expect("failed to construct the Bria client"));
    let image_processor = Arc::new(ImageProcessor::new());

    let app_state = AppState {
        bria_client,
        image_processor,
    };

    info!("Starting HTTP server on 0.0.0.0:8080");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .service(
                web::scope("/api/v1")
                    .route("/extract-style", web::post().to(extract_style_profile))
                    .route("/generate", web::post().to(generate_image))
                    .route("/batch", web::post().to(create_batch))
                    .route("/batch/{job_id}", web::get().to(get_batch_status))
                    .route("/preview", web::post().to(preview_preset)),
            )
            .route("/health", web::get().to(health_check))
    })
    .bind("0.0.0.0:8080")?
    .run()
    .await
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "restyle",
        "version": "0.1.0"
    }))
}
