use std::path::{Path, PathBuf};

use crate::tracer::random::Seed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const PRESETS: [Resolution; 4] = [
        Resolution::preset("360p", 640, 360),
        Resolution::preset("720p", 1280, 720),
        Resolution::preset("1080p", 1920, 1080),
        Resolution::preset("4k", 3840, 2160),
    ];

    const fn preset(name: &'static str, width: u32, height: u32) -> Self {
        Self { name, width, height }
    }

    pub fn custom(width: u32, height: u32) -> Self {
        Self {
            name: "custom",
            width,
            height,
        }
    }

    pub fn find(name: &str) -> Option<Resolution> {
        Self::PRESETS
            .into_iter()
            .find(|preset| preset.name.eq_ignore_ascii_case(name))
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl Default for Resolution {
    // 16:9, 가로 800
    fn default() -> Self {
        Self::custom(800, 450)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Png,
    Ppm,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Option<OutputFormat> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "png" => Some(OutputFormat::Png),
            "ppm" => Some(OutputFormat::Ppm),
            _ => None,
        }
    }
}

/// 파일로 렌더링할 때 쓰는 설정
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub resolution: Resolution,
    pub output_path: PathBuf,
    pub format: OutputFormat,
    // 누적할 패스 수
    pub frames: u32,
    pub seed: Seed,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            output_path: PathBuf::from("output.png"),
            format: OutputFormat::Png,
            frames: 1,
            seed: Seed::Entropy,
        }
    }
}
