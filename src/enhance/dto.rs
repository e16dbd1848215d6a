use serde::{Deserialize, Serialize};

/// One registry entry as reported by `GET /api/models`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    pub scale: u32,
    pub description: String,
    pub loaded: bool,
    pub current: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelEntry>,
    pub accelerator_available: bool,
    pub current_model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SwitchModelRequest {
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SwitchModelResponse {
    pub success: bool,
    pub current_model: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnhanceResponse {
    pub success: bool,
    /// Base64-encoded PNG.
    pub enhanced_image: String,
    pub model_used: String,
    pub scale: f32,
    pub original_size: usize,
    pub enhanced_size: usize,
    pub device: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub current_model: Option<String>,
    pub accelerator_available: bool,
    pub timestamp: String,
}
