use std::path::Path;

use anyhow::Context;
use image::{imageops::FilterType, DynamicImage};
use tracing::info;

use crate::enhance::registry::ModelSpec;

/// Inference device, decided once when the engine manager is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Accelerator,
    Cpu,
}

impl Device {
    /// Honors an explicit override ("cpu" / "gpu"), otherwise probes for an
    /// NVIDIA device node.
    pub fn detect(override_name: Option<&str>) -> Self {
        match override_name.map(|s| s.to_ascii_lowercase()).as_deref() {
            Some("cpu") => Device::Cpu,
            Some("gpu") | Some("cuda") => Device::Accelerator,
            _ => {
                if Path::new("/dev/nvidia0").exists() {
                    Device::Accelerator
                } else {
                    Device::Cpu
                }
            }
        }
    }

    pub fn is_accelerator(self) -> bool {
        matches!(self, Device::Accelerator)
    }

    /// Wire label, matching the original API responses.
    pub fn label(self) -> &'static str {
        match self {
            Device::Accelerator => "GPU",
            Device::Cpu => "CPU",
        }
    }
}

/// Backend tuning derived from the device: larger tiles and half precision
/// when accelerated hardware is available.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub tile: u32,
    pub half_precision: bool,
}

impl EngineOptions {
    pub fn for_device(device: Device) -> Self {
        match device {
            Device::Accelerator => Self {
                tile: 512,
                half_precision: true,
            },
            Device::Cpu => Self {
                tile: 256,
                half_precision: false,
            },
        }
    }
}

/// Opaque super-resolution transform. The server owns validation, the model
/// lifecycle and encoding; everything behind this seam is a black box.
pub trait InferenceBackend: Send + Sync {
    fn upscale(
        &self,
        image: &DynamicImage,
        outscale: f32,
        options: EngineOptions,
    ) -> anyhow::Result<DynamicImage>;
}

/// Filter-based stand-in used when no native Real-ESRGAN runtime is linked.
/// It honors the scaling contract so the whole request path stays exercisable.
pub struct ResampleBackend {
    filter: FilterType,
}

impl ResampleBackend {
    pub fn new() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }
}

impl Default for ResampleBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceBackend for ResampleBackend {
    fn upscale(
        &self,
        image: &DynamicImage,
        outscale: f32,
        _options: EngineOptions,
    ) -> anyhow::Result<DynamicImage> {
        anyhow::ensure!(
            outscale.is_finite() && outscale > 0.0,
            "invalid output scale {outscale}"
        );
        let width = ((image.width() as f32) * outscale).round().max(1.0) as u32;
        let height = ((image.height() as f32) * outscale).round().max(1.0) as u32;
        Ok(image.resize_exact(width, height, self.filter))
    }
}

/// A loaded model: registry metadata, device tuning, and the backend that does
/// the actual work. Engines are immutable once built and shared via `Arc`.
pub struct Engine {
    name: String,
    scale: u32,
    device: Device,
    options: EngineOptions,
    backend: Box<dyn InferenceBackend>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("name", &self.name)
            .field("scale", &self.scale)
            .field("device", &self.device)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn load(spec: &ModelSpec, weights: &Path, device: Device) -> anyhow::Result<Self> {
        let meta = std::fs::metadata(weights)
            .with_context(|| format!("read weight file {}", weights.display()))?;
        anyhow::ensure!(
            meta.len() > 0,
            "weight file {} is empty",
            weights.display()
        );

        let options = EngineOptions::for_device(device);
        info!(
            model = spec.name,
            device = device.label(),
            tile = options.tile,
            half = options.half_precision,
            "model initialized"
        );

        Ok(Self {
            name: spec.name.to_string(),
            scale: spec.scale,
            device,
            options,
            backend: Box::new(ResampleBackend::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn upscale(&self, image: &DynamicImage, outscale: f32) -> anyhow::Result<DynamicImage> {
        self.backend.upscale(image, outscale, self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhance::registry;

    #[test]
    fn device_override_beats_probing() {
        assert_eq!(Device::detect(Some("cpu")), Device::Cpu);
        assert_eq!(Device::detect(Some("gpu")), Device::Accelerator);
        assert_eq!(Device::detect(Some("CUDA")), Device::Accelerator);
    }

    #[test]
    fn options_follow_device() {
        let cpu = EngineOptions::for_device(Device::Cpu);
        assert_eq!(cpu.tile, 256);
        assert!(!cpu.half_precision);

        let gpu = EngineOptions::for_device(Device::Accelerator);
        assert_eq!(gpu.tile, 512);
        assert!(gpu.half_precision);
    }

    #[test]
    fn resample_backend_scales_dimensions() {
        let backend = ResampleBackend::new();
        let options = EngineOptions::for_device(Device::Cpu);
        let img = DynamicImage::new_rgb8(4, 3);
        let out = backend.upscale(&img, 2.0, options).expect("upscale");
        assert_eq!((out.width(), out.height()), (8, 6));
    }

    #[test]
    fn resample_backend_rejects_bad_scale() {
        let backend = ResampleBackend::new();
        let options = EngineOptions::for_device(Device::Cpu);
        let img = DynamicImage::new_rgb8(4, 4);
        assert!(backend.upscale(&img, 0.0, options).is_err());
        assert!(backend.upscale(&img, f32::NAN, options).is_err());
    }

    #[test]
    fn engine_load_rejects_empty_weights() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.pth");
        std::fs::write(&path, b"").expect("write");

        let spec = registry::find("RealESRGAN_x2plus").expect("spec");
        assert!(Engine::load(spec, &path, Device::Cpu).is_err());
    }

    #[test]
    fn engine_load_reads_metadata_from_spec() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("weights.pth");
        std::fs::write(&path, b"fake-weights").expect("write");

        let spec = registry::find("RealESRGAN_x2plus").expect("spec");
        let engine = Engine::load(spec, &path, Device::Cpu).expect("load");
        assert_eq!(engine.name(), "RealESRGAN_x2plus");
        assert_eq!(engine.scale(), 2);
        assert_eq!(engine.device(), Device::Cpu);
    }
}
