use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::Vector4;

use crate::error::WriteError;
use crate::output::file::FileImage;
use crate::output::{flipped_index, Image, ImageWriter};

/// ASCII PPM (P3). 누적 없이 마지막 패스만 저장함
#[derive(Debug, Default, Clone, Copy)]
pub struct PpmImageWriter;

impl PpmImageWriter {
    pub fn encode(&self, image: &FileImage, mut writer: impl Write) -> std::io::Result<()> {
        writeln!(writer, "P3")?;
        writeln!(writer, "{} {}", image.width(), image.height())?;
        writeln!(writer, "255")?;

        for color in image.pixels().to_vec() {
            let color = color.map(|channel| channel.clamp(0.0, 1.0) * 255.0);
            writeln!(writer, "{} {} {}", color.x as u8, color.y as u8, color.z as u8)?;
        }

        writer.flush()
    }
}

impl ImageWriter for PpmImageWriter {
    type Image = FileImage;
    type Parameter<'a> = &'a Path;

    fn store_pixel(&self, image: &FileImage, x: u32, y: u32, color: Vector4<f32>) {
        let index = flipped_index(image.width(), image.height(), x, y);
        image.pixels().store(index, color);
    }

    fn commit_image(
        &self,
        image: &FileImage,
        output_path: Self::Parameter<'_>,
    ) -> Result<(), WriteError> {
        let file = File::create(output_path)?;
        self.encode(image, BufWriter::new(file))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_to_string(image: &FileImage) -> String {
        let mut buffer = Vec::new();
        PpmImageWriter.encode(image, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn header_describes_image() {
        let image = FileImage::new(120, 62).unwrap();
        let encoded = encode_to_string(&image);
        let mut lines = encoded.lines();

        assert_eq!(lines.next(), Some("P3"));
        assert_eq!(lines.next(), Some("120 62"));
        assert_eq!(lines.next(), Some("255"));
        assert_eq!(lines.count(), 120 * 62);
    }

    #[test]
    fn pixels_are_written_top_row_first() {
        let image = FileImage::new(3, 2).unwrap();
        let colors = [
            Vector4::new(0.0, 0.0, 0.0, 1.0),
            Vector4::new(0.0, 1.0, 0.0, 1.0),
            Vector4::new(1.0, 1.0, 0.0, 1.0),
            Vector4::new(0.0, 0.0, 1.0, 1.0),
            Vector4::new(0.0, 1.0, 1.0, 1.0),
            Vector4::new(1.0, 1.0, 1.0, 1.0),
        ];

        // y = 0 이 출력 파일의 마지막 행이 됨
        for (index, color) in colors.iter().enumerate() {
            let x = index as u32 % 3;
            let y = index as u32 / 3;
            PpmImageWriter.store_pixel(&image, x, y, *color);
        }

        let encoded = encode_to_string(&image);
        let body: Vec<&str> = encoded.lines().skip(3).collect();

        assert_eq!(
            body,
            vec!["0 0 255", "0 255 255", "255 255 255", "0 0 0", "0 255 0", "255 255 0"]
        );
    }

    #[test]
    fn does_not_accumulate() {
        let image = FileImage::new(1, 1).unwrap();
        PpmImageWriter.store_pixel(&image, 0, 0, Vector4::new(1.0, 1.0, 1.0, 1.0));
        PpmImageWriter.store_pixel(&image, 0, 0, Vector4::new(0.0, 0.0, 0.0, 1.0));

        assert_eq!(encode_to_string(&image).lines().last(), Some("0 0 0"));
    }
}
