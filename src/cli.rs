use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use nalgebra::Point3;

use pathtracer::OutputFormat;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
    Png,
    Ppm,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Png => OutputFormat::Png,
            Format::Ppm => OutputFormat::Ppm,
        }
    }
}

/// 구 장면을 파일로 렌더링함
#[derive(Debug, Parser)]
#[command(name = "pathtracer")]
#[command(about = "CPU path tracer for sphere scenes")]
pub struct Args {
    /// Image width in pixels
    #[arg(long, requires = "height", conflicts_with = "preset")]
    pub width: Option<u32>,

    /// Image height in pixels
    #[arg(long, requires = "width", conflicts_with = "preset")]
    pub height: Option<u32>,

    /// Resolution preset (360p, 720p, 1080p, 4k)
    #[arg(long)]
    pub preset: Option<String>,

    /// Output file path
    #[arg(short, long, default_value = "output.png")]
    pub output: PathBuf,

    /// Output format, inferred from the output extension when omitted
    #[arg(long, value_enum)]
    pub format: Option<Format>,

    /// Number of accumulated passes
    #[arg(short, long, default_value_t = 1)]
    pub frames: u32,

    /// Fixed random seed for reproducible renders
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Camera position as x,y,z
    #[arg(long, value_parser = parse_point)]
    pub position: Option<Point3<f32>>,

    /// Camera target as x,y,z
    #[arg(long, value_parser = parse_point)]
    pub target: Option<Point3<f32>>,

    /// Vertical field of view in degrees
    #[arg(long)]
    pub fov: Option<f32>,
}

pub fn parse_point(value: &str) -> Result<Point3<f32>, String> {
    let coords = value
        .split(',')
        .map(|coord| coord.trim().parse::<f32>().map_err(|err| format!("{}: {}", coord, err)))
        .collect::<Result<Vec<_>, _>>()?;

    match coords.as_slice() {
        [x, y, z] => Ok(Point3::new(*x, *y, *z)),
        _ => Err(format!("expected x,y,z but got {} values", coords.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_is_parsed_from_comma_list() {
        assert_eq!(parse_point("0, -1.5,3"), Ok(Point3::new(0.0, -1.5, 3.0)));
        assert!(parse_point("1,2").is_err());
        assert!(parse_point("1,a,2").is_err());
    }

    #[test]
    fn width_and_height_go_together() {
        assert!(Args::try_parse_from(["pathtracer", "--width", "10"]).is_err());
        assert!(Args::try_parse_from(["pathtracer", "--width", "10", "--height", "5"]).is_ok());
        let both = ["pathtracer", "--width", "10", "--height", "5", "--preset", "4k"];
        assert!(Args::try_parse_from(both).is_err());
    }

    #[test]
    fn camera_flags_are_optional() {
        let args =
            Args::try_parse_from(["pathtracer", "--position", "1,2,3", "--fov", "60"]).unwrap();

        assert_eq!(args.position, Some(Point3::new(1.0, 2.0, 3.0)));
        assert_eq!(args.target, None);
        assert_eq!(args.fov, Some(60.0));
        assert_eq!(args.frames, 1);
    }
}
