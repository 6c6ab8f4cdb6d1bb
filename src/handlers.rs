// src/handlers.rs
use crate::{AppState, errors::RestyleError, models::*};
use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use chrono::Utc;
use futures_util::TryStreamExt;
use log::{info, warn};

use crate::services::image_processor::MAX_IMAGE_BYTES;
use crate::services::profile_namer::generate_profile_name;
use crate::services::style_dna;

/// Authoritative bound for reference images per profile, applied in this one
/// place only.
pub const MAX_IMAGES: usize = 20;

struct UploadedImage {
    filename: String,
    data: Vec<u8>,
}

pub async fn extract_style_profile(
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let mut images: Vec<UploadedImage> = Vec::new();
    let mut custom_name: Option<String> = None;

    while let Some(mut field) = payload.try_next().await? {
        let content_disposition = field.content_disposition();
        let field_name = content_disposition.get_name().unwrap_or_default().to_string();
        let filename = content_disposition.get_filename().map(|f| f.to_string());

        // The only non-file field is the optional custom profile name.
        if filename.is_none() && field_name == "name" {
            let mut buf = Vec::new();
            while let Some(chunk) = field.try_next().await? {
                buf.extend_from_slice(&chunk);
            }
            custom_name = Some(String::from_utf8_lossy(&buf).to_string());
            continue;
        }

        let mut image_data = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            image_data.extend_from_slice(&chunk);
            if image_data.len() > MAX_IMAGE_BYTES {
                return Err(RestyleError::Validation(format!(
                    "image '{}' exceeds the {} byte limit",
                    filename.as_deref().unwrap_or("unnamed"),
                    MAX_IMAGE_BYTES
                ))
                .into());
            }
        }

        data.image_processor.validate_image(&image_data)?;

        images.push(UploadedImage {
            filename: filename.unwrap_or_else(|| "image".to_string()),
            data: image_data,
        });
    }

    if images.is_empty() {
        return Err(
            RestyleError::Validation("at least 1 image is required".to_string()).into(),
        );
    }
    if images.len() > MAX_IMAGES {
        return Err(RestyleError::Validation(format!(
            "at most {} images are allowed, got {}",
            MAX_IMAGES,
            images.len()
        ))
        .into());
    }

    info!("Extracting style profile from {} image(s)", images.len());

    // Bria takes one image per call, so the set is processed strictly
    // sequentially; a failed image is recorded and the rest continue.
    let mut structured_prompts: Vec<StructuredPrompt> = Vec::new();
    let mut errors: Vec<ImageExtractionError> = Vec::new();

    for (index, image) in images.iter().enumerate() {
        match data
            .bria_client
            .extract_style(std::slice::from_ref(&image.data))
            .await
        {
            Ok(mut prompt) => {
                prompt.image_index = Some(index);
                structured_prompts.push(prompt);
            }
            Err(err) => {
                warn!(
                    "style extraction failed for image {} ('{}'): {}",
                    index, image.filename, err
                );
                errors.push(ImageExtractionError {
                    image_index: index,
                    error: err.to_string(),
                });
            }
        }
    }

    // Name precedence: explicit user name, then derived name when anything
    // succeeded, then a timestamp fallback.
    let name = custom_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            if structured_prompts.is_empty() {
                format!("Style Profile {}", Utc::now().format("%Y-%m-%d %H:%M"))
            } else {
                generate_profile_name(&structured_prompts)
            }
        });

    let profile = StyleProfile {
        name,
        created_at: Utc::now(),
        images: structured_prompts,
        processed_images: images.len(),
        errors: if errors.is_empty() { None } else { Some(errors) },
    };

    Ok(HttpResponse::Ok().json(profile))
}

pub async fn generate_image(
    body: web::Json<GenerateImageRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let request = body.into_inner();

    if request.structured_prompt.is_none() && request.prompt.is_none() {
        return Err(RestyleError::Validation(
            "either structured_prompt or prompt is required".to_string(),
        )
        .into());
    }

    let mut style_dna = None;
    let outbound = if request.use_style_dna_parser && request.structured_prompt.is_some() {
        let structured = request.structured_prompt.as_deref().unwrap_or_default();
        let dna = style_dna::parse(structured);
        let subject = request.prompt.as_deref().unwrap_or_default();
        let composed = style_dna::compose_prompt(subject, &dna);
        info!("Generating with style DNA, composed prompt: {}", composed);
        style_dna = Some(dna);

        // Bria takes scene-description fields all-or-none, so a filtered
        // structured prompt cannot be sent; the DNA rides in as text and
        // structured_prompt stays out of the outbound request.
        GenerateRequest {
            structured_prompt: None,
            prompt: Some(composed),
            seed: request.seed,
            sync: true,
        }
    } else {
        GenerateRequest {
            structured_prompt: request.structured_prompt.clone(),
            prompt: request.prompt.clone(),
            seed: request.seed,
            sync: true,
        }
    };

    let result = data.bria_client.generate_image(&outbound).await?;

    Ok(HttpResponse::Ok().json(GenerateImageResponse {
        image_url: result.image_url,
        seed: result.seed,
        request_id: result.request_id,
        style_dna,
    }))
}

pub async fn create_batch(
    body: web::Json<CreateBatchRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let request = body.into_inner();

    if request.items.is_empty() {
        return Err(
            RestyleError::Validation("batch needs at least one item".to_string()).into(),
        );
    }

    let job = data.bria_client.create_batch(&request.items).await?;

    Ok(HttpResponse::Ok().json(job))
}

pub async fn get_batch_status(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let job_id = path.into_inner();

    if job_id.trim().is_empty() {
        return Err(RestyleError::Validation("job id is required".to_string()).into());
    }

    let job = data.bria_client.get_batch_status(&job_id).await?;

    Ok(HttpResponse::Ok().json(job))
}

pub async fn preview_preset(
    body: web::Json<PreviewRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let result = data.bria_client.preview(&body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(result))
}
