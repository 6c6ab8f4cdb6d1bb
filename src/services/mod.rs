// src/services/mod.rs
pub mod bria_client;
pub mod image_processor;
pub mod profile_namer;
pub mod retry;
pub mod style_dna;
pub mod style_extractor;

pub use bria_client::BriaClient;
pub use image_processor::ImageProcessor;
