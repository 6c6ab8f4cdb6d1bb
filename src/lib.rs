// src/lib.rs
use std::sync::Arc;

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;

use crate::services::{BriaClient, ImageProcessor};

#[derive(Clone)]
pub struct AppState {
    pub bria_client: Arc<BriaClient>,
    pub image_processor: Arc<ImageProcessor>,
}
