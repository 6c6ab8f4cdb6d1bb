// src/services/bria_client.rs
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::{BriaConfig, PollOptions};
use crate::errors::RestyleError;
use crate::models::{BatchItem, BatchJob, GenerateRequest, GenerationResult, PreviewRequest, PreviewResult, StructuredPrompt};
use crate::services::retry::retry;

// Bria authenticates with a bare token header, not a bearer scheme.
const API_TOKEN_HEADER: &str = "api_token";

/// Status vocabulary for style-extraction and generation jobs. Upper-case on
/// the wire. The preview service spells its statuses in lower-case (see
/// [`PreviewStatus`]); the two vocabularies are kept separate because the
/// remote service itself is inconsistent here. Matching is exact and
/// case-sensitive on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Error,
    Unknown,
}

impl JobStatus {
    fn from_wire(status: &str) -> Self {
        match status {
            "PENDING" => JobStatus::Pending,
            "IN_PROGRESS" => JobStatus::InProgress,
            "COMPLETED" => JobStatus::Completed,
            "ERROR" => JobStatus::Error,
            _ => JobStatus::Unknown,
        }
    }
}

/// Lower-case status vocabulary used by the preview endpoint family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PreviewStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Unknown,
}

impl PreviewStatus {
    fn from_wire(status: &str) -> Self {
        match status {
            "pending" => PreviewStatus::Pending,
            "processing" => PreviewStatus::Processing,
            "completed" => PreviewStatus::Completed,
            "failed" => PreviewStatus::Failed,
            _ => PreviewStatus::Unknown,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AsyncSubmission {
    request_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    status: String,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PreviewEnvelope {
    status: String,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Single point of contact with the Bria API. Owns the auth header, base
/// URL, retry policy and per-endpoint-family polling budgets.
pub struct BriaClient {
    client: Client,
    config: BriaConfig,
}

impl BriaClient {
    pub fn new(config: BriaConfig) -> Result<Self, RestyleError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(180))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                RestyleError::Configuration(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    /// Derives a structured prompt from one reference image.
    ///
    /// Bria accepts exactly one image per call; multi-image profiles are
    /// built by the handler calling this once per image. The image is sent
    /// base64-encoded without a data-URI prefix.
    pub async fn extract_style(
        &self,
        images: &[Vec<u8>],
    ) -> Result<StructuredPrompt, RestyleError> {
        if images.len() != 1 {
            return Err(RestyleError::Validation(format!(
                "style extraction takes exactly 1 image per call, got {}",
                images.len()
            )));
        }

        let encoded = general_purpose::STANDARD.encode(&images[0]);
        retry(&self.config.retry, || self.extract_style_once(&encoded)).await
    }

    async fn extract_style_once(&self, encoded: &str) -> Result<StructuredPrompt, RestyleError> {
        info!("Submitting style extraction to Bria");
        let url = format!("{}/structured_prompt", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .header(API_TOKEN_HEADER, &self.config.api_token)
            .json(&json!({ "file": encoded, "sync": false }))
            .send()
            .await
            .map_err(transport_error)?;

        let result = if response.status() == StatusCode::ACCEPTED {
            let submission: AsyncSubmission = decode_envelope(check_response(response).await?)?;
            self.poll_job(
                &submission.request_id,
                &self.config.extraction_poll,
                "style extraction",
            )
            .await?
        } else {
            check_response(response).await?
        };

        parse_structured_prompt(&result)
    }

    /// Generates an image from a prompt and/or structured prompt.
    ///
    /// Leaving `structured_prompt` unset puts Bria in style-transfer-only
    /// mode (prompt + seed, no recreated scene).
    pub async fn generate_image(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerationResult, RestyleError> {
        if request.structured_prompt.is_none() && request.prompt.is_none() {
            return Err(RestyleError::Validation(
                "either structured_prompt or prompt is required".to_string(),
            ));
        }

        retry(&self.config.retry, || self.generate_once(request)).await
    }

    async fn generate_once(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerationResult, RestyleError> {
        info!("Submitting image generation to Bria (sync={})", request.sync);
        let url = format!("{}/text-to-image/base", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .header(API_TOKEN_HEADER, &self.config.api_token)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::ACCEPTED {
            let submission: AsyncSubmission = decode_envelope(check_response(response).await?)?;
            let result = self
                .poll_job(
                    &submission.request_id,
                    &self.config.generation_poll,
                    "image generation",
                )
                .await?;
            parse_generation_result(&result, Some(submission.request_id))
        } else {
            let result = check_response(response).await?;
            parse_generation_result(&result, None)
        }
    }

    /// Submits a batch generation job and returns its handle.
    pub async fn create_batch(&self, items: &[BatchItem]) -> Result<BatchJob, RestyleError> {
        if items.is_empty() {
            return Err(RestyleError::Validation(
                "batch needs at least one item".to_string(),
            ));
        }

        retry(&self.config.retry, || self.create_batch_once(items)).await
    }

    async fn create_batch_once(&self, items: &[BatchItem]) -> Result<BatchJob, RestyleError> {
        info!("Submitting batch of {} items to Bria", items.len());
        let payload = json!({
            "items": items.iter().map(batch_item_to_remote).collect::<Vec<_>>()
        });
        let url = format!("{}/batch/jobs", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .header(API_TOKEN_HEADER, &self.config.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let body = check_response(response).await?;
        Ok(parse_batch_job(&body))
    }

    /// One-shot status lookup; the caller does its own re-polling.
    pub async fn get_batch_status(&self, job_id: &str) -> Result<BatchJob, RestyleError> {
        let url = format!("{}/batch/jobs/{}", self.config.base_url, job_id);
        let response = self
            .client
            .get(&url)
            .header(API_TOKEN_HEADER, &self.config.api_token)
            .send()
            .await
            .map_err(transport_error)?;

        let body = check_response(response).await?;
        Ok(parse_batch_job(&body))
    }

    /// Renders a single preset preview, polling until the remote side
    /// reports `completed` or `failed` (lower-case vocabulary).
    pub async fn preview(&self, request: &PreviewRequest) -> Result<PreviewResult, RestyleError> {
        info!("Submitting preset preview '{}' to Bria", request.preset.name);
        let mut payload = batch_item_to_remote(&BatchItem {
            preset: request.preset.clone(),
            prompt: request.prompt.clone(),
            negative_prompt: request.negative_prompt.clone(),
        });
        payload["sync"] = Value::Bool(false);

        let url = format!("{}/preview", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .header(API_TOKEN_HEADER, &self.config.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let body = check_response(response).await?;

        // A few presets come back synchronously; otherwise poll the handle.
        if let Some(image_url) = body.get("image_url").and_then(Value::as_str) {
            let preview_id = body
                .get("preview_id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Ok(PreviewResult {
                preview_id,
                image_url: image_url.to_string(),
            });
        }

        let preview_id = body
            .get("preview_id")
            .and_then(Value::as_str)
            .ok_or_else(|| RestyleError::BriaApi {
                status: 502,
                message: "preview response carried neither image_url nor preview_id".to_string(),
                payload: Some(body.clone()),
            })?
            .to_string();

        self.poll_preview(&preview_id).await
    }

    /// Polls the upper-case status endpoint until a terminal state or the
    /// attempt budget runs out. Strictly sequential, one check per interval.
    async fn poll_job(
        &self,
        request_id: &str,
        poll: &PollOptions,
        operation: &'static str,
    ) -> Result<Value, RestyleError> {
        let url = format!("{}/status/{}", self.config.base_url, request_id);

        for attempt in 1..=poll.max_attempts {
            tokio::time::sleep(poll.interval).await;
            debug!(
                "{} poll {}/{} for request {}",
                operation, attempt, poll.max_attempts, request_id
            );

            let response = self
                .client
                .get(&url)
                .header(API_TOKEN_HEADER, &self.config.api_token)
                .send()
                .await
                .map_err(transport_error)?;

            let body = check_response(response).await?;
            let envelope: StatusEnvelope = decode_envelope(body.clone())?;

            match JobStatus::from_wire(&envelope.status) {
                JobStatus::Completed => {
                    return envelope.result.ok_or_else(|| RestyleError::BriaApi {
                        status: 502,
                        message: format!("{} completed without a result payload", operation),
                        payload: Some(body),
                    });
                }
                JobStatus::Error => {
                    let message = envelope
                        .error
                        .unwrap_or_else(|| format!("{} failed", operation));
                    warn!("{} request {} failed: {}", operation, request_id, message);
                    return Err(RestyleError::BriaApi {
                        status: 502,
                        message,
                        payload: Some(body),
                    });
                }
                JobStatus::Pending | JobStatus::InProgress | JobStatus::Unknown => {}
            }
        }

        Err(RestyleError::PollTimeout {
            operation,
            attempts: poll.max_attempts,
        })
    }

    /// Lower-case twin of [`Self::poll_job`] for the preview family.
    async fn poll_preview(&self, preview_id: &str) -> Result<PreviewResult, RestyleError> {
        let poll = &self.config.preview_poll;
        let url = format!("{}/preview/{}", self.config.base_url, preview_id);

        for attempt in 1..=poll.max_attempts {
            tokio::time::sleep(poll.interval).await;
            debug!("preview poll {}/{} for {}", attempt, poll.max_attempts, preview_id);

            let response = self
                .client
                .get(&url)
                .header(API_TOKEN_HEADER, &self.config.api_token)
                .send()
                .await
                .map_err(transport_error)?;

            let body = check_response(response).await?;
            let envelope: PreviewEnvelope = decode_envelope(body.clone())?;

            match PreviewStatus::from_wire(&envelope.status) {
                PreviewStatus::Completed => {
                    let image_url =
                        envelope.image_url.ok_or_else(|| RestyleError::BriaApi {
                            status: 502,
                            message: "preview completed without an image_url".to_string(),
                            payload: Some(body),
                        })?;
                    return Ok(PreviewResult {
                        preview_id: preview_id.to_string(),
                        image_url,
                    });
                }
                PreviewStatus::Failed => {
                    let message = envelope
                        .error
                        .unwrap_or_else(|| "preview failed".to_string());
                    warn!("preview {} failed: {}", preview_id, message);
                    return Err(RestyleError::BriaApi {
                        status: 502,
                        message,
                        payload: Some(body),
                    });
                }
                PreviewStatus::Pending | PreviewStatus::Processing | PreviewStatus::Unknown => {}
            }
        }

        Err(RestyleError::PollTimeout {
            operation: "preview",
            attempts: poll.max_attempts,
        })
    }
}

/// Maps the UI's preset representation onto the field names the remote
/// batch/preview service expects.
fn batch_item_to_remote(item: &BatchItem) -> Value {
    let mut body = json!({
        "prompt": item.prompt,
        "preset": item.preset.name,
    });
    if let Some(negative) = &item.negative_prompt {
        body["negative_prompt"] = Value::String(negative.clone());
    }
    if let Some(aspect_ratio) = &item.preset.aspect_ratio {
        body["aspect_ratio"] = Value::String(aspect_ratio.clone());
    }
    if let Some(steps) = item.preset.steps {
        body["num_inference_steps"] = Value::from(steps);
    }
    if let Some(guidance) = item.preset.guidance_scale {
        body["guidance"] = Value::from(guidance);
    }
    body
}

/// Transport failures (DNS, refused connection, timeout) get a distinguished
/// error so callers can tell "Bria is unreachable" from "Bria said no".
fn transport_error(err: reqwest::Error) -> RestyleError {
    RestyleError::CannotConnect(err.to_string())
}

/// Unwraps an HTTP response: 2xx bodies decode to JSON, everything else
/// surfaces the remote service's embedded message when present, else the raw
/// body, else the generic HTTP status text.
async fn check_response(response: reqwest::Response) -> Result<Value, RestyleError> {
    let status = response.status();
    if status.is_success() {
        return response.json::<Value>().await.map_err(|e| RestyleError::BriaApi {
            status: status.as_u16(),
            message: format!("failed to decode Bria response: {}", e),
            payload: None,
        });
    }

    let body = response.text().await.unwrap_or_default();
    let payload: Option<Value> = serde_json::from_str(&body).ok();
    let message = payload
        .as_ref()
        .and_then(|p| p.get("message").or_else(|| p.get("error")))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("HTTP error")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });

    Err(RestyleError::BriaApi {
        status: status.as_u16(),
        message,
        payload,
    })
}

fn decode_envelope<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, RestyleError> {
    serde_json::from_value(body.clone()).map_err(|e| RestyleError::BriaApi {
        status: 502,
        message: format!("unexpected Bria response shape: {}", e),
        payload: Some(body),
    })
}

/// Accepts both the bare result shape and an `{"result": {...}}` wrapper.
/// Bria returns `structured_prompt` either as a JSON string or as an inline
/// object; the object form is re-serialized to text.
fn parse_structured_prompt(value: &Value) -> Result<StructuredPrompt, RestyleError> {
    let node = value.get("result").unwrap_or(value);
    let structured_prompt = node
        .get("structured_prompt")
        .ok_or_else(|| RestyleError::BriaApi {
            status: 502,
            message: "extraction result is missing structured_prompt".to_string(),
            payload: Some(value.clone()),
        })?;

    let text = match structured_prompt {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    };

    Ok(StructuredPrompt {
        seed: node.get("seed").and_then(Value::as_i64).unwrap_or_default(),
        structured_prompt: text,
        image_index: None,
    })
}

fn parse_generation_result(
    value: &Value,
    request_id: Option<String>,
) -> Result<GenerationResult, RestyleError> {
    let node = value.get("result").unwrap_or(value);
    let image_url = node
        .get("image_url")
        .and_then(Value::as_str)
        .ok_or_else(|| RestyleError::BriaApi {
            status: 502,
            message: "generation result is missing image_url".to_string(),
            payload: Some(value.clone()),
        })?
        .to_string();

    Ok(GenerationResult {
        image_url,
        seed: node.get("seed").and_then(Value::as_i64).unwrap_or_default(),
        request_id: request_id.or_else(|| {
            node.get("request_id")
                .and_then(Value::as_str)
                .map(str::to_string)
        }),
    })
}

fn parse_batch_job(value: &Value) -> BatchJob {
    let node = value.get("result").unwrap_or(value);
    BatchJob {
        job_id: node
            .get("job_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        status: node
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        total_items: node
            .get("total_items")
            .and_then(Value::as_u64)
            .unwrap_or_default() as u32,
        completed_items: node
            .get("completed_items")
            .and_then(Value::as_u64)
            .unwrap_or_default() as u32,
        failed_items: node
            .get("failed_items")
            .and_then(Value::as_u64)
            .unwrap_or_default() as u32,
        download_url: node
            .get("download_url")
            .and_then(Value::as_str)
            .map(str::to_string),
        manifest_url: node
            .get("manifest_url")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}
