use log::LevelFilter;

pub mod camera;
pub mod error;
pub mod manager;
pub mod math;
pub mod output;
pub mod settings;
pub mod tracer;

pub use camera::{Camera, CameraController};
pub use error::{RenderJobError, TraceError, WriteError};
pub use manager::{FileRenderJob, RenderManager, RenderProgress, RenderTarget};
pub use output::platform::{ChannelShifts, PlatformImage, PlatformImageWriter};
pub use settings::{OutputFormat, RenderSettings, Resolution};
pub use tracer::random::Seed;
pub use tracer::scene::{Material, Scene, Sphere};
pub use tracer::Renderer;

/// RUST_LOG 설정 위에 주어진 레벨을 덮어씀
pub fn init_logger(level: LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}
