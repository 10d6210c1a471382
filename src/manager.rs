use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};

use log::{debug, info};

use crate::camera::Camera;
use crate::error::{RenderJobError, Result, WriteError};
use crate::output::file::{FileImage, PngImageWriter};
use crate::output::ppm::PpmImageWriter;
use crate::output::{Accumulate, Allocate, Image, ImageWriter};
use crate::settings::{OutputFormat, RenderSettings};
use crate::tracer::scene::Scene;
use crate::tracer::Renderer;

/// 카메라가 움직이는 동안 그리는 미리보기 이미지의 가로 비율
pub const PREVIEW_SCALE: f32 = 0.25;

/// 미리보기 크기. 세로는 원래 화면 비율을 유지함
pub fn preview_size(width: u32, height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let preview_width = ((width as f32 * PREVIEW_SCALE) as u32).max(1);
    let preview_height = (preview_width as u64 * height as u64 / width as u64) as u32;
    (preview_width, preview_height.max(1))
}

pub struct Settings {
    pub should_accumulate: bool,
    // 카메라가 움직이거나 장면이 바뀐 프레임은 작은 이미지로 빠르게 그림
    pub preview_while_moving: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            should_accumulate: true,
            preview_while_moving: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderTarget {
    Preview,
    #[default]
    Full,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderStatistics {
    pub render_duration: Duration,
    pub last_render_time: Option<SystemTime>,
    pub frame_count: u32,
    pub target: RenderTarget,
    pub render_width: u32,
    pub render_height: u32,
}

/// 카메라나 장면이 그대로면 프레임을 계속 누적해서 노이즈를 줄임
pub struct RenderManager<W: ImageWriter>
where
    W::Image: Accumulate + Allocate,
{
    renderer: Renderer<W>,
    image: W::Image,
    preview: W::Image,
    pub settings: Settings,
    frame_count: u32,
    previous_camera: Option<Camera>,
    last_target: Option<RenderTarget>,
    statistics: RenderStatistics,
}

impl<W: ImageWriter> RenderManager<W>
where
    W::Image: Accumulate + Allocate,
{
    pub fn new(renderer: Renderer<W>, width: u32, height: u32) -> Result<Self> {
        let image = W::Image::allocate(width, height)?;
        let preview = Self::allocate_preview(&image)?;

        Ok(Self {
            renderer,
            image,
            preview,
            settings: Default::default(),
            frame_count: 0,
            previous_camera: None,
            last_target: None,
            statistics: Default::default(),
        })
    }

    fn allocate_preview(image: &W::Image) -> Result<W::Image> {
        let (width, height) = preview_size(image.width(), image.height());
        W::Image::allocate(width, height)
    }

    pub fn image(&self) -> &W::Image {
        &self.image
    }

    pub fn preview(&self) -> &W::Image {
        &self.preview
    }

    /// 마지막으로 그린 이미지. 아직 그린 적이 없으면 전체 해상도 이미지
    pub fn current_image(&self) -> &W::Image {
        match self.last_target {
            Some(RenderTarget::Preview) => &self.preview,
            _ => &self.image,
        }
    }

    pub fn last_target(&self) -> Option<RenderTarget> {
        self.last_target
    }

    pub fn renderer(&self) -> &Renderer<W> {
        &self.renderer
    }

    pub fn statistics(&self) -> &RenderStatistics {
        &self.statistics
    }

    /// 전체 해상도 이미지에 누적된 프레임 수. 미리보기를 그린 뒤에는 0
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    // 다음 프레임부터 다시 1번째 프레임으로 시작
    pub fn reset_accumulation(&mut self) {
        self.frame_count = 0;
    }

    /// 화면 크기가 바뀌었을 때 새 이미지로 교체. 미리보기도 다시 만듦
    pub fn set_image(&mut self, image: W::Image) -> Result<()> {
        self.preview = Self::allocate_preview(&image)?;
        self.image = image;
        self.last_target = None;
        self.reset_accumulation();
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.set_image(W::Image::allocate(width, height)?)
    }

    pub fn render_frame(&mut self, scene: &mut Scene, camera: &Camera) -> Result<()> {
        let moved = scene.has_changed || self.previous_camera.as_ref() != Some(camera);
        let started = Instant::now();

        let (target, frame_count) = if moved && self.settings.preview_while_moving {
            debug!("camera moving, rendering preview");
            self.preview.set_frame_count(1);
            self.renderer.render(&self.preview, scene, camera)?;
            (RenderTarget::Preview, 0)
        } else {
            let restart = moved || !self.settings.should_accumulate || self.frame_count == 0;
            let frame_count = if restart {
                debug!("restarting accumulation");
                1
            } else {
                self.frame_count + 1
            };

            self.image.set_frame_count(frame_count);
            self.renderer.render(&self.image, scene, camera)?;
            (RenderTarget::Full, frame_count)
        };

        self.frame_count = frame_count;
        self.previous_camera = Some(*camera);
        self.last_target = Some(target);
        scene.has_changed = false;

        let rendered = self.current_image();
        self.statistics = RenderStatistics {
            render_duration: started.elapsed(),
            last_render_time: Some(SystemTime::now()),
            frame_count,
            target,
            render_width: rendered.width(),
            render_height: rendered.height(),
        };

        Ok(())
    }

    /// 마지막으로 그린 이미지를 내보냄
    pub fn commit(&self, parameter: W::Parameter<'_>) -> std::result::Result<(), WriteError> {
        self.renderer.commit_image(self.current_image(), parameter)
    }
}

/// 프레임 사이 시간과 초당 프레임 수
#[derive(Debug)]
pub struct FrameTimer {
    frame_started: Instant,
    window_started: Instant,
    window_frames: u32,
    frames_per_second: u32,
    delta_time: f32,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            frame_started: now,
            window_started: now,
            window_frames: 0,
            frames_per_second: 0,
            delta_time: 0.0,
        }
    }

    pub fn update(&mut self) {
        self.tick(Instant::now());
    }

    fn tick(&mut self, now: Instant) {
        self.window_frames += 1;
        self.delta_time = now.duration_since(self.frame_started).as_secs_f32();
        self.frame_started = now;

        if now.duration_since(self.window_started) >= Duration::from_secs(1) {
            self.frames_per_second = self.window_frames;
            self.window_frames = 0;
            self.window_started = now;
        }
    }

    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    pub fn frames_per_second(&self) -> u32 {
        self.frames_per_second
    }
}

/// 파일 렌더링 진행 상황. 다른 스레드에서 읽어도 됨
#[derive(Debug, Default)]
pub struct RenderProgress {
    completed_rows: AtomicU64,
    total_rows: AtomicU64,
}

impl RenderProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn start(&self, total_rows: u64) {
        self.completed_rows.store(0, Ordering::Relaxed);
        self.total_rows.store(total_rows, Ordering::Relaxed);
    }

    fn row_done(&self) {
        self.completed_rows.fetch_add(1, Ordering::Relaxed);
    }

    /// 0 ~ 100. 시작 전이면 0
    pub fn percent(&self) -> u32 {
        let total = self.total_rows.load(Ordering::Relaxed);
        if total == 0 {
            return 0;
        }

        let completed = self.completed_rows.load(Ordering::Relaxed).min(total);
        (completed * 100 / total) as u32
    }
}

/// 파일 렌더링은 화면 렌더링을 막지 않도록 별도 스레드에서 돌림
pub struct FileRenderJob {
    output_path: PathBuf,
    progress: Arc<RenderProgress>,
    handle: JoinHandle<std::result::Result<PathBuf, RenderJobError>>,
}

impl FileRenderJob {
    pub fn spawn(settings: RenderSettings, scene: Scene, camera: Camera) -> Self {
        let output_path = settings.output_path.clone();
        let progress = Arc::new(RenderProgress::new());

        let handle = {
            let progress = Arc::clone(&progress);
            thread::spawn(move || render_to_file(&settings, &scene, &camera, &progress))
        };

        Self {
            output_path,
            progress,
            handle,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn progress(&self) -> u32 {
        self.progress.percent()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn join(self) -> std::result::Result<PathBuf, RenderJobError> {
        self.handle.join().map_err(|_| RenderJobError::Panicked)?
    }
}

/// 설정대로 이미지를 그리고 파일로 저장. 카메라 비율은 출력 해상도에 맞춤
pub fn render_to_file(
    settings: &RenderSettings,
    scene: &Scene,
    camera: &Camera,
    progress: &RenderProgress,
) -> std::result::Result<PathBuf, RenderJobError> {
    let resolution = settings.resolution;
    let camera = camera.with_aspect_ratio(resolution.aspect_ratio());
    let mut image = FileImage::new(resolution.width, resolution.height)?;

    info!(
        "rendering {}x{} ({} frames) to {}",
        resolution.width,
        resolution.height,
        settings.frames,
        settings.output_path.display()
    );

    let started = Instant::now();
    let committed = match settings.format {
        OutputFormat::Png => {
            let renderer = Renderer::new(PngImageWriter).with_seed(settings.seed);
            let frames = settings.frames.max(1);
            progress.start(frames as u64 * resolution.height as u64);

            for frame in 1..=frames {
                image.set_frame_count(frame);
                renderer.render_with_progress(&image, scene, &camera, |_| progress.row_done())?;
                debug!("frame {}/{}", frame, frames);
            }

            renderer.commit_image(&image, settings.output_path.as_path())
        }
        OutputFormat::Ppm => {
            // PPM은 누적하지 않으니 한 번만 그림
            let renderer = Renderer::new(PpmImageWriter).with_seed(settings.seed);
            progress.start(resolution.height as u64);
            renderer.render_with_progress(&image, scene, &camera, |_| progress.row_done())?;
            renderer.commit_image(&image, settings.output_path.as_path())
        }
    };

    committed.map_err(|source| RenderJobError::Write {
        path: settings.output_path.clone(),
        source,
    })?;

    info!("render done in {:.3}s", started.elapsed().as_secs_f32());
    Ok(settings.output_path.clone())
}
