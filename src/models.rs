// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One structured scene/style description produced by Bria for a single
/// source image. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredPrompt {
    pub seed: i64,
    /// JSON-encoded object describing the scene and its style.
    pub structured_prompt: String,
    #[serde(rename = "imageIndex", skip_serializing_if = "Option::is_none")]
    pub image_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageExtractionError {
    #[serde(rename = "imageIndex")]
    pub image_index: usize,
    pub error: String,
}

/// A named collection of structured prompts derived from reference images.
/// The backend never stores these; the caller persists them client-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleProfile {
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    pub images: Vec<StructuredPrompt>,
    /// Counts every attempted image, successes and failures alike, so
    /// `images.len() == processed_images - errors.len()` always holds.
    #[serde(rename = "processedImages")]
    pub processed_images: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ImageExtractionError>>,
}

/// Inbound body for the generation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateImageRequest {
    pub structured_prompt: Option<String>,
    pub prompt: Option<String>,
    pub seed: Option<i64>,
    #[serde(default)]
    pub use_style_dna_parser: bool,
}

/// Outbound body for Bria's generation endpoint. Omitting
/// `structured_prompt` tells Bria to run in style-transfer-only mode
/// (pure prompt + seed, no recreated scene).
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    pub sync: bool,
}

impl Default for GenerateRequest {
    fn default() -> Self {
        Self {
            structured_prompt: None,
            prompt: None,
            seed: None,
            sync: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub image_url: String,
    pub seed: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Response body for the generation endpoint; `style_dna` is attached when
/// the caller asked for DNA-based style transfer.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateImageResponse {
    pub image_url: String,
    pub seed: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_dna: Option<StyleDna>,
}

/// Generation preset as the UI stores it. The client maps this to the
/// field names the remote batch/preview service expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub preset: Preset,
    pub prompt: String,
    #[serde(rename = "negativePrompt", skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBatchRequest {
    pub items: Vec<BatchItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJob {
    #[serde(rename = "jobId")]
    pub job_id: String,
    pub status: String,
    #[serde(rename = "totalItems")]
    pub total_items: u32,
    #[serde(rename = "completedItems")]
    pub completed_items: u32,
    #[serde(rename = "failedItems")]
    pub failed_items: u32,
    #[serde(rename = "downloadUrl", skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(rename = "manifestUrl", skip_serializing_if = "Option::is_none")]
    pub manifest_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewRequest {
    pub preset: Preset,
    pub prompt: String,
    #[serde(rename = "negativePrompt")]
    pub negative_prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResult {
    pub preview_id: String,
    pub image_url: String,
}

/// Style-only view of a structured prompt: the attributes that describe how
/// an image looks rather than what is in it. Recomputed on demand, never
/// persisted. `original` keeps the full decoded object (or the raw text when
/// decoding failed) for reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleDna {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lighting: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_palette: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atmosphere: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artistic_style: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photographic_style: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendering_style: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<Value>,
}

/// Per-category keyword matches pulled out of one or more structured
/// prompts. Ephemeral; lives only for the duration of a naming request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleAttributes {
    pub lighting: Vec<String>,
    pub colors: Vec<String>,
    pub mood: Vec<String>,
    pub atmosphere: Vec<String>,
    pub time: Vec<String>,
    pub weather: Vec<String>,
    pub location: Vec<String>,
    pub technical: Vec<String>,
}

impl StyleAttributes {
    pub fn is_empty(&self) -> bool {
        self.lighting.is_empty()
            && self.colors.is_empty()
            && self.mood.is_empty()
            && self.atmosphere.is_empty()
            && self.time.is_empty()
            && self.weather.is_empty()
            && self.location.is_empty()
            && self.technical.is_empty()
    }
}
