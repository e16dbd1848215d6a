/// Static registry mapping a model name to its native upscale factor, remote
/// weight source, and description.
#[derive(Debug, Clone, Copy)]
pub struct ModelSpec {
    pub name: &'static str,
    pub scale: u32,
    pub url: &'static str,
    pub description: &'static str,
}

pub const MODELS: &[ModelSpec] = &[
    ModelSpec {
        name: "RealESRGAN_x4plus",
        scale: 4,
        url: "https://github.com/xinntao/Real-ESRGAN/releases/download/v0.1.0/RealESRGAN_x4plus.pth",
        description: "General purpose 4x upscaling model",
    },
    ModelSpec {
        name: "RealESRGAN_x4plus_anime_6B",
        scale: 4,
        url: "https://github.com/xinntao/Real-ESRGAN/releases/download/v0.2.2.4/RealESRGAN_x4plus_anime_6B.pth",
        description: "Optimized for anime/illustrations (faster)",
    },
    ModelSpec {
        name: "RealESRNet_x4plus",
        scale: 4,
        url: "https://github.com/xinntao/Real-ESRGAN/releases/download/v0.1.1/RealESRNet_x4plus.pth",
        description: "Clean upscaling without artifacts",
    },
    ModelSpec {
        name: "realesr-general-x4v3",
        scale: 4,
        url: "https://github.com/xinntao/Real-ESRGAN/releases/download/v0.2.5.0/realesr-general-x4v3.pth",
        description: "Latest model with denoise control (RECOMMENDED)",
    },
    ModelSpec {
        name: "RealESRGAN_x2plus",
        scale: 2,
        url: "https://github.com/xinntao/Real-ESRGAN/releases/download/v0.2.1/RealESRGAN_x2plus.pth",
        description: "2x upscaling model",
    },
];

pub fn find(name: &str) -> Option<&'static ModelSpec> {
    MODELS.iter().find(|m| m.name == name)
}
