use std::io::Cursor;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{info, instrument};

use crate::{
    enhance::{
        dto::{
            EnhanceResponse, HealthResponse, ModelsResponse, SwitchModelRequest,
            SwitchModelResponse,
        },
        MAX_IMAGE_SIZE_BYTES,
    },
    error::ApiError,
    state::EnhanceState,
};

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Ceiling on the requested output scale; bounds the memory an upscale can
/// ask for.
const MAX_OUTPUT_SCALE: f32 = 16.0;

pub fn enhance_routes() -> Router<EnhanceState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/models", get(models))
        .route("/api/switch-model", post(switch_model))
        .route("/api/enhance", post(enhance))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE_BYTES + 2 * 1024 * 1024))
}

fn allowed_file(filename: &str) -> bool {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| ALLOWED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

pub async fn health(State(state): State<EnhanceState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        model_loaded: state.engines.any_loaded().await,
        current_model: state.engines.current_model().await,
        accelerator_available: state.engines.device().is_accelerator(),
        timestamp: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default(),
    })
}

pub async fn models(State(state): State<EnhanceState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.engines.list().await,
        accelerator_available: state.engines.device().is_accelerator(),
        current_model: state.engines.current_model().await,
    })
}

#[instrument(skip(state))]
pub async fn switch_model(
    State(state): State<EnhanceState>,
    Json(payload): Json<SwitchModelRequest>,
) -> Result<Json<SwitchModelResponse>, ApiError> {
    let engine = state.engines.select(&payload.model).await?;
    Ok(Json(SwitchModelResponse {
        success: true,
        current_model: engine.name().to_string(),
        message: format!("Switched to {}", payload.model),
    }))
}

#[instrument(skip(state, multipart))]
pub async fn enhance(
    State(state): State<EnhanceState>,
    mut multipart: Multipart,
) -> Result<Json<EnhanceResponse>, ApiError> {
    let mut image: Option<(String, Bytes)> = None;
    let mut model: Option<String> = None;
    let mut scale: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart request: {e}")))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("image") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Failed to read upload: {e}")))?;
                image = Some((filename, data));
            }
            Some("model") => {
                model = Some(field.text().await.map_err(|e| {
                    ApiError::Validation(format!("Failed to read model field: {e}"))
                })?);
            }
            Some("scale") => {
                scale = Some(field.text().await.map_err(|e| {
                    ApiError::Validation(format!("Failed to read scale field: {e}"))
                })?);
            }
            _ => {}
        }
    }

    // Upload validation happens in full before any model work.
    let (filename, data) =
        image.ok_or_else(|| ApiError::Validation("No image file provided".into()))?;
    if filename.is_empty() {
        return Err(ApiError::Validation("No file selected".into()));
    }
    if !allowed_file(&filename) {
        return Err(ApiError::Validation("Invalid file type".into()));
    }
    if data.is_empty() {
        return Err(ApiError::Validation("Uploaded file is empty".into()));
    }
    if data.len() > MAX_IMAGE_SIZE_BYTES {
        return Err(ApiError::Validation(
            "Image exceeds the 10MB size limit".into(),
        ));
    }
    let requested_scale = scale
        .map(|s| {
            s.trim()
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite() && *v > 0.0 && *v <= MAX_OUTPUT_SCALE)
                .ok_or_else(|| ApiError::Validation("Invalid scale value".into()))
        })
        .transpose()?;

    let engine = state.engines.engine_for(model.as_deref()).await?;
    let outscale = requested_scale.unwrap_or(engine.scale() as f32);
    let original_size = data.len();

    // Decode, upscale and re-encode off the async runtime; the engine
    // snapshot keeps a concurrent model switch from affecting this request.
    let worker = engine.clone();
    let png = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ApiError> {
        let img = image::load_from_memory(&data)
            .map_err(|_| ApiError::Validation("Could not read image file".into()))?;
        let out = worker
            .upscale(&img, outscale)
            .map_err(|e| ApiError::Enhancement(format!("Enhancement failed: {e}")))?;
        let mut buf = Cursor::new(Vec::new());
        out.write_to(&mut buf, image::ImageFormat::Png)
            .map_err(|e| ApiError::Enhancement(format!("PNG encoding failed: {e}")))?;
        Ok(buf.into_inner())
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("enhancement task failed: {e}")))??;

    info!(
        model = engine.name(),
        scale = outscale,
        original_size,
        enhanced_size = png.len(),
        "image enhanced"
    );

    Ok(Json(EnhanceResponse {
        success: true,
        enhanced_image: BASE64.encode(&png),
        model_used: engine.name().to_string(),
        scale: outscale,
        original_size,
        enhanced_size: png.len(),
        device: engine.device().label().to_string(),
    }))
}
