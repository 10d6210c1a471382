use bytemuck::cast_slice;
use nalgebra::Vector4;

use crate::error::{Result, TraceError, WriteError};
use crate::output::{flipped_index, pixel_count, Image, ImageWriter, PackedBuffer};

/// 네이티브 화면 표면의 채널별 비트 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelShifts {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
    pub alpha: u32,
}

impl ChannelShifts {
    pub const RGBA: ChannelShifts = ChannelShifts {
        red: 0,
        green: 8,
        blue: 16,
        alpha: 24,
    };

    // Windows DIB, macOS CGImage 등
    pub const BGRA: ChannelShifts = ChannelShifts {
        red: 16,
        green: 8,
        blue: 0,
        alpha: 24,
    };

    fn validate(&self) -> Result<()> {
        let shifts = [self.red, self.green, self.blue, self.alpha];
        if shifts.iter().any(|shift| *shift > 24) {
            return Err(TraceError::InvalidArgument("channel shift must be at most 24 bits"));
        }

        Ok(())
    }

    /// [0, 1] 범위로 자른 뒤 8비트씩 각 위치에 넣음
    pub fn pack(&self, color: &Vector4<f32>) -> u32 {
        let bytes = color.map(|channel| (channel * 255.0).clamp(0.0, 255.0) as u32);
        bytes.x << self.red | bytes.y << self.green | bytes.z << self.blue | bytes.w << self.alpha
    }
}

impl Default for ChannelShifts {
    fn default() -> Self {
        Self::RGBA
    }
}

/// 창에 바로 복사할 수 있는 패킹된 픽셀 버퍼
#[derive(Debug)]
pub struct PlatformImage {
    width: u32,
    height: u32,
    shifts: ChannelShifts,
    pixels: PackedBuffer,
}

impl PlatformImage {
    pub fn new(width: u32, height: u32, shifts: ChannelShifts) -> Result<Self> {
        shifts.validate()?;
        let len = pixel_count(width, height)?;

        Ok(Self {
            width,
            height,
            shifts,
            pixels: PackedBuffer::new(len),
        })
    }

    pub fn shifts(&self) -> ChannelShifts {
        self.shifts
    }

    pub fn pixels(&self) -> &PackedBuffer {
        &self.pixels
    }
}

impl Image for PlatformImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

/// 누적이나 감마 보정 없이 마지막 패스를 그대로 표면에 씀
#[derive(Debug, Default, Clone, Copy)]
pub struct PlatformImageWriter;

impl ImageWriter for PlatformImageWriter {
    type Image = PlatformImage;
    // 표면의 바이트 버퍼. 픽셀당 4바이트
    type Parameter<'a> = &'a mut [u8];

    fn store_pixel(&self, image: &PlatformImage, x: u32, y: u32, color: Vector4<f32>) {
        let index = flipped_index(image.width, image.height, x, y);
        image.pixels.store(index, image.shifts.pack(&color));
    }

    fn commit_image(
        &self,
        image: &PlatformImage,
        surface: Self::Parameter<'_>,
    ) -> std::result::Result<(), WriteError> {
        let expected = image.pixels.len();
        if surface.len() != expected * 4 {
            return Err(WriteError::SizeMismatch {
                expected,
                actual: surface.len() / 4,
            });
        }

        let data = image.pixels.to_vec();
        surface.copy_from_slice(cast_slice(&data));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgra_surface_swaps_red_and_blue() {
        let image = PlatformImage::new(1, 1, ChannelShifts::BGRA).unwrap();

        PlatformImageWriter.store_pixel(&image, 0, 0, Vector4::new(1.0, 0.5, 0.0, 1.0));

        assert_eq!(image.pixels().load(0), 0xFF_FF_7F_00);
    }

    #[test]
    fn alpha_first_order() {
        let argb = ChannelShifts {
            red: 8,
            green: 16,
            blue: 24,
            alpha: 0,
        };

        assert_eq!(argb.pack(&Vector4::new(1.0, 0.0, 0.0, 0.5)), 0x00_00_FF_7F);
    }

    #[test]
    fn rgba_matches_texture_packing() {
        let color = Vector4::new(0.2, 0.4, 0.6, 1.0);

        assert_eq!(ChannelShifts::default().pack(&color), crate::output::pack_rgba(&color));
    }

    #[test]
    fn invalid_shift_is_rejected() {
        let shifts = ChannelShifts {
            alpha: 32,
            ..ChannelShifts::RGBA
        };

        assert!(matches!(
            PlatformImage::new(2, 2, shifts),
            Err(TraceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn commit_copies_flipped_rows_into_surface() {
        let image = PlatformImage::new(2, 2, ChannelShifts::BGRA).unwrap();
        PlatformImageWriter.store_pixel(&image, 0, 0, Vector4::new(1.0, 0.0, 0.0, 1.0));
        PlatformImageWriter.store_pixel(&image, 1, 1, Vector4::new(0.0, 0.0, 1.0, 1.0));

        let mut surface = vec![0u8; 2 * 2 * 4];
        PlatformImageWriter.commit_image(&image, surface.as_mut_slice()).unwrap();

        // y = 0 은 표면의 마지막 행. 바이트 순서는 B, G, R, A
        assert_eq!(&surface[8..12], &[0x00, 0x00, 0xFF, 0xFF]);
        assert_eq!(&surface[4..8], &[0xFF, 0x00, 0x00, 0xFF]);
        assert_eq!(&surface[0..4], &[0, 0, 0, 0]);
    }

    #[test]
    fn commit_rejects_wrong_surface_size() {
        let image = PlatformImage::new(2, 2, ChannelShifts::RGBA).unwrap();
        let mut surface = vec![0u8; 12];

        let result = PlatformImageWriter.commit_image(&image, surface.as_mut_slice());

        assert!(matches!(
            result,
            Err(WriteError::SizeMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }
}
