use bytemuck::cast_slice;
use nalgebra::Vector4;
use wgpu::{
    Device, Extent3d, FilterMode, ImageCopyTexture, ImageDataLayout, Origin3d, Queue, Sampler,
    SamplerDescriptor, Texture, TextureAspect, TextureDescriptor, TextureDimension, TextureFormat,
    TextureUsages, TextureView, TextureViewDescriptor,
};
use winit::dpi::PhysicalSize;

use crate::error::{self, WriteError};
use crate::output::{
    accumulate, flipped_index, gamma_correct, pack_rgba, pixel_count, Accumulate, Allocate,
    ColorBuffer, Image, ImageWriter, PackedBuffer,
};

pub const TEXTURE_FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;

fn extent(size: PhysicalSize<u32>) -> Extent3d {
    Extent3d {
        width: size.width,
        height: size.height,
        depth_or_array_layers: 1,
    }
}

// 쉐이더에서 샘플링하고 CPU에서 매 프레임 덮어씀
fn texture_descriptor(label: &str, size: PhysicalSize<u32>) -> TextureDescriptor<'_> {
    TextureDescriptor {
        label: Some(label),
        size: extent(size),
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    }
}

fn upload_layout(size: PhysicalSize<u32>) -> ImageDataLayout {
    ImageDataLayout {
        offset: 0,
        bytes_per_row: Some(4 * size.width),
        rows_per_image: Some(size.height),
    }
}

fn check_upload(size: PhysicalSize<u32>, pixels: &[u32]) -> Result<(), WriteError> {
    let expected = size.width as usize * size.height as usize;
    if pixels.len() != expected {
        return Err(WriteError::SizeMismatch {
            expected,
            actual: pixels.len(),
        });
    }

    Ok(())
}

/// 렌더링 결과를 화면에 띄울 GPU 텍스쳐
pub struct GpuTexture {
    texture: Texture,
    view: TextureView,
    sampler: Sampler,
    label: String,
}

impl GpuTexture {
    pub fn new(device: &Device, size: PhysicalSize<u32>, label: &str) -> Self {
        let texture = device.create_texture(&texture_descriptor(label, size));
        let view = texture.create_view(&TextureViewDescriptor {
            label: Some(&format!("{} view", label)),
            ..Default::default()
        });
        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some(&format!("{} sampler", label)),
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            label: label.to_string(),
        }
    }

    /// 패킹된 RGBA 픽셀을 큐에 올림. 픽셀 수가 텍스쳐와 다르면 에러
    pub fn upload(&self, queue: &Queue, pixels: &[u32]) -> Result<(), WriteError> {
        let size = self.size();
        check_upload(size, pixels)?;

        queue.write_texture(
            ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: Origin3d::ZERO,
                aspect: TextureAspect::All,
            },
            cast_slice(pixels),
            upload_layout(size),
            extent(size),
        );

        Ok(())
    }

    /// 크기가 바뀌었으면 새로 만들고 true
    pub fn resize(&mut self, device: &Device, size: PhysicalSize<u32>) -> bool {
        if self.size() == size {
            return false;
        }

        let label = std::mem::take(&mut self.label);
        *self = Self::new(device, size, &label);
        true
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.texture.width(), self.texture.height())
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }
}

/// CPU 쪽 RGBA8 버퍼. 커밋할 때 GPU 텍스쳐로 올라감
#[derive(Debug)]
pub struct TextureImage {
    width: u32,
    height: u32,
    frame_count: u32,
    pixels: PackedBuffer,
    accumulation: ColorBuffer,
}

impl TextureImage {
    pub fn new(width: u32, height: u32) -> error::Result<Self> {
        let len = pixel_count(width, height)?;

        Ok(Self {
            width,
            height,
            frame_count: 1,
            pixels: PackedBuffer::new(len),
            accumulation: ColorBuffer::new(len),
        })
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.width, self.height)
    }

    pub fn pixels(&self) -> &PackedBuffer {
        &self.pixels
    }
}

impl Image for TextureImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

impl Allocate for TextureImage {
    fn allocate(width: u32, height: u32) -> error::Result<Self> {
        Self::new(width, height)
    }
}

impl Accumulate for TextureImage {
    fn frame_count(&self) -> u32 {
        self.frame_count
    }

    fn set_frame_count(&mut self, frame_count: u32) {
        self.frame_count = frame_count.max(1);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TextureImageWriter;

pub struct TextureTarget<'a> {
    pub queue: &'a Queue,
    pub texture: &'a GpuTexture,
}

impl ImageWriter for TextureImageWriter {
    type Image = TextureImage;
    type Parameter<'a> = TextureTarget<'a>;

    fn store_pixel(&self, image: &TextureImage, x: u32, y: u32, color: Vector4<f32>) {
        let index = flipped_index(image.width, image.height, x, y);
        let average = accumulate(&image.accumulation, index, image.frame_count, color);

        // 텍스쳐 포맷이 sRGB라서 감마 보정을 먼저 함
        image.pixels.store(index, pack_rgba(&gamma_correct(average)));
    }

    fn commit_image(
        &self,
        image: &TextureImage,
        target: Self::Parameter<'_>,
    ) -> Result<(), WriteError> {
        target.texture.upload(target.queue, &image.pixels.to_vec())
    }
}
