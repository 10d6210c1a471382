use std::sync::atomic::{AtomicU32, Ordering};

use nalgebra::Vector4;

use crate::error::{Result, TraceError, WriteError};
use crate::output::platform::ChannelShifts;

pub mod file;
pub mod platform;
pub mod ppm;
pub mod texture;

/// 한 변의 최대 픽셀 수 (wgpu 텍스쳐 한계와 같음)
pub const MAX_IMAGE_DIMENSION: u32 = 16384;

/// 렌더러가 그릴 수 있는 모든 이미지
pub trait Image {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

/// 픽셀을 실제 저장소(파일, 텍스쳐...)에 맞게 변환해서 저장하는 쪽.
///
/// `store_pixel`은 여러 rayon 워커에서 동시에 불리지만 같은 `(x, y)`가 두 번 오지는 않음.
/// `Parameter`는 마지막에 `commit_image`할 때만 필요한 값 (파일 경로, GPU 큐 등).
pub trait ImageWriter: Sync {
    type Image: Image + Sync;
    type Parameter<'a>;

    fn store_pixel(&self, image: &Self::Image, x: u32, y: u32, color: Vector4<f32>);

    fn commit_image(
        &self,
        image: &Self::Image,
        parameter: Self::Parameter<'_>,
    ) -> std::result::Result<(), WriteError>;
}

/// 누적 렌더링을 지원하는 이미지. 1번째 프레임이면 누적값을 지우고 새로 시작함
pub trait Accumulate: Image {
    fn frame_count(&self) -> u32;
    fn set_frame_count(&mut self, frame_count: u32);
}

/// 크기만 정해서 새로 만들 수 있는 이미지. 미리보기나 창 크기 변경에 씀
pub trait Allocate: Image + Sized {
    fn allocate(width: u32, height: u32) -> Result<Self>;
}

/// 버퍼 길이. 너무 크면 할당하기 전에 에러
pub fn pixel_count(width: u32, height: u32) -> Result<usize> {
    if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        return Err(TraceError::OutOfRange(format!(
            "image size {}x{} exceeds {} pixels per side",
            width, height, MAX_IMAGE_DIMENSION
        )));
    }

    (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| {
            TraceError::OutOfRange(format!("image size {}x{} overflows", width, height))
        })
}

/// 렌더러의 y는 위에서 아래로 0..height 인데 저장소는 아래 행부터 채우므로 뒤집음
pub fn flipped_index(width: u32, height: u32, x: u32, y: u32) -> usize {
    (height - 1 - y) as usize * width as usize + x as usize
}

pub fn gamma_correct(color: Vector4<f32>) -> Vector4<f32> {
    const GAMMA: f32 = 1.0 / 2.2;
    Vector4::new(color.x.powf(GAMMA), color.y.powf(GAMMA), color.z.powf(GAMMA), color.w)
}

/// RGBA8 (리틀 엔디안에서 바이트 순서가 R, G, B, A)
pub fn pack_rgba(color: &Vector4<f32>) -> u32 {
    ChannelShifts::RGBA.pack(color)
}

/// 워커들이 락 없이 각자 맡은 칸에 쓸 수 있는 float 색상 버퍼
#[derive(Debug)]
pub struct ColorBuffer {
    data: Vec<[AtomicU32; 4]>,
}

impl ColorBuffer {
    pub fn new(len: usize) -> Self {
        Self {
            data: (0..len).map(|_| Default::default()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn load(&self, index: usize) -> Vector4<f32> {
        let [x, y, z, w] = &self.data[index];
        Vector4::new(
            f32::from_bits(x.load(Ordering::Relaxed)),
            f32::from_bits(y.load(Ordering::Relaxed)),
            f32::from_bits(z.load(Ordering::Relaxed)),
            f32::from_bits(w.load(Ordering::Relaxed)),
        )
    }

    pub fn store(&self, index: usize, color: Vector4<f32>) {
        for (slot, channel) in self.data[index].iter().zip(color.iter()) {
            slot.store(channel.to_bits(), Ordering::Relaxed);
        }
    }

    pub fn to_vec(&self) -> Vec<Vector4<f32>> {
        (0..self.len()).map(|index| self.load(index)).collect()
    }
}

#[derive(Debug)]
pub struct PackedBuffer {
    data: Vec<AtomicU32>,
}

impl PackedBuffer {
    pub fn new(len: usize) -> Self {
        Self {
            data: (0..len).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn load(&self, index: usize) -> u32 {
        self.data[index].load(Ordering::Relaxed)
    }

    pub fn store(&self, index: usize, value: u32) {
        self.data[index].store(value, Ordering::Relaxed);
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.data.iter().map(|value| value.load(Ordering::Relaxed)).collect()
    }
}

/// 누적 버퍼에 색을 더하고 지금까지의 평균을 돌려줌
pub fn accumulate(
    buffer: &ColorBuffer,
    index: usize,
    frame_count: u32,
    color: Vector4<f32>,
) -> Vector4<f32> {
    let previous = if frame_count <= 1 {
        Vector4::zeros()
    } else {
        buffer.load(index)
    };

    let accumulated = previous + color;
    buffer.store(index, accumulated);

    accumulated / frame_count.max(1) as f32
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn flipped_index_starts_from_bottom_row() {
        assert_eq!(flipped_index(4, 3, 0, 0), 8);
        assert_eq!(flipped_index(4, 3, 3, 2), 3);
        assert_eq!(flipped_index(4, 3, 1, 1), 5);
    }

    #[test]
    fn flipped_index_does_not_wrap_on_large_images() {
        let side = MAX_IMAGE_DIMENSION;

        assert_eq!(flipped_index(side, side, side - 1, 0), side as usize * side as usize - 1);
    }

    #[test]
    fn pixel_count_rejects_oversized_images() {
        assert_eq!(pixel_count(1920, 1080), Ok(1920 * 1080));
        assert_eq!(pixel_count(0, 5), Ok(0));
        assert!(matches!(pixel_count(65536, 65536), Err(TraceError::OutOfRange(_))));
        assert!(matches!(pixel_count(MAX_IMAGE_DIMENSION + 1, 1), Err(TraceError::OutOfRange(_))));
    }

    #[test]
    fn pack_rgba_clamps_and_orders_channels() {
        assert_eq!(pack_rgba(&Vector4::new(1.0, 0.0, 0.0, 1.0)), 0xFF0000FF);
        assert_eq!(pack_rgba(&Vector4::new(0.0, 0.0, 2.0, 0.0)), 0x00FF0000);
        assert_eq!(pack_rgba(&Vector4::new(-1.0, 1.0, 0.0, 1.0)), 0xFF00FF00);
    }

    #[test]
    fn gamma_correction_leaves_alpha() {
        let corrected = gamma_correct(Vector4::new(0.25, 1.0, 0.0, 0.5));

        assert_relative_eq!(corrected.x, 0.25f32.powf(1.0 / 2.2));
        assert_eq!(corrected.y, 1.0);
        assert_eq!(corrected.z, 0.0);
        assert_eq!(corrected.w, 0.5);
    }

    #[test]
    fn color_buffer_round_trips_values() {
        let buffer = ColorBuffer::new(2);
        let color = Vector4::new(0.1, 0.2, 0.3, 1.0);

        buffer.store(1, color);

        assert_eq!(buffer.load(0), Vector4::zeros());
        assert_eq!(buffer.load(1), color);
        assert_eq!(buffer.to_vec(), vec![Vector4::zeros(), color]);
    }

    #[test]
    fn accumulate_averages_frames() {
        let buffer = ColorBuffer::new(1);
        buffer.store(0, Vector4::new(9.0, 9.0, 9.0, 9.0));

        // 1번째 프레임은 이전 값을 버림
        let first = accumulate(&buffer, 0, 1, Vector4::new(1.0, 0.0, 0.0, 1.0));
        let second = accumulate(&buffer, 0, 2, Vector4::new(0.0, 1.0, 0.0, 1.0));

        assert_eq!(first, Vector4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(second, Vector4::new(0.5, 0.5, 0.0, 1.0));
    }
}
