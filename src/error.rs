use std::path::PathBuf;

use thiserror::Error;

/// 레이 트레이싱 코어에서 발생할 수 있는 에러들
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TraceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("out of range: {0}")]
    OutOfRange(String),

    // 카메라 설정이 잘못되어 행렬의 역행렬이 존재하지 않는 경우
    #[error("cannot invert the {0} matrix")]
    SingularMatrix(&'static str),

    #[error("sphere {sphere} uses material {index}, but the scene only has {count} materials")]
    MissingMaterial {
        sphere: usize,
        index: usize,
        count: usize,
    },
}

pub type Result<T> = std::result::Result<T, TraceError>;

/// 이미지를 최종 목적지(파일, 텍스쳐)로 보낼 때 발생하는 에러들
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("pixel buffer holds {actual} pixels, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// 백그라운드 파일 렌더링 작업의 결과
#[derive(Debug, Error)]
pub enum RenderJobError {
    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: WriteError,
    },

    #[error("render thread panicked")]
    Panicked,
}
