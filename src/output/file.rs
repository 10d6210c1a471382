use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use nalgebra::Vector4;

use crate::error::{Result, WriteError};
use crate::output::{
    accumulate, flipped_index, pixel_count, Accumulate, Allocate, ColorBuffer, Image, ImageWriter,
};

/// 파일로 내보낼 float 이미지. 행은 위에서부터 저장됨
#[derive(Debug)]
pub struct FileImage {
    width: u32,
    height: u32,
    frame_count: u32,
    pixels: ColorBuffer,
    accumulation: ColorBuffer,
}

impl FileImage {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let len = pixel_count(width, height)?;

        Ok(Self {
            width,
            height,
            frame_count: 1,
            pixels: ColorBuffer::new(len),
            accumulation: ColorBuffer::new(len),
        })
    }

    pub fn pixels(&self) -> &ColorBuffer {
        &self.pixels
    }

    /// 위에서부터 세는 좌표로 최종 픽셀 읽기
    pub fn pixel(&self, column: u32, row: u32) -> Vector4<f32> {
        self.pixels.load(row as usize * self.width as usize + column as usize)
    }

    pub(crate) fn accumulation(&self) -> &ColorBuffer {
        &self.accumulation
    }

    pub fn to_rgb8(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |column, row| {
            let color = self.pixel(column, row).map(|channel| channel.clamp(0.0, 1.0) * 255.0);
            Rgb([color.x as u8, color.y as u8, color.z as u8])
        })
    }
}

impl Image for FileImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

impl Allocate for FileImage {
    fn allocate(width: u32, height: u32) -> Result<Self> {
        Self::new(width, height)
    }
}

impl Accumulate for FileImage {
    fn frame_count(&self) -> u32 {
        self.frame_count
    }

    fn set_frame_count(&mut self, frame_count: u32) {
        self.frame_count = frame_count.max(1);
    }
}

/// 누적된 평균 색을 PNG로 저장
#[derive(Debug, Default, Clone, Copy)]
pub struct PngImageWriter;

impl ImageWriter for PngImageWriter {
    type Image = FileImage;
    type Parameter<'a> = &'a Path;

    fn store_pixel(&self, image: &FileImage, x: u32, y: u32, color: Vector4<f32>) {
        let index = flipped_index(image.width, image.height, x, y);
        let average = accumulate(image.accumulation(), index, image.frame_count, color);
        image.pixels.store(index, average);
    }

    fn commit_image(
        &self,
        image: &FileImage,
        output_path: Self::Parameter<'_>,
    ) -> std::result::Result<(), WriteError> {
        image.to_rgb8().save_with_format(output_path, ImageFormat::Png)?;
        Ok(())
    }
}
