use std::path::{Path, PathBuf};

use image::ImageFormat;
use thiserror::Error;

/// Smallest file that can possibly hold a GIF, JPEG or PNG header.
pub const MIN_IMAGE_BYTES: usize = 12;

#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("{0}")]
    Config(&'static str),

    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("{source}: {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("Couldn't detect colors from image: {}", path.display())]
    EmptyResult { path: PathBuf },
}

impl PaletteError {
    pub(crate) fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        PaletteError::Io {
            message: message.into(),
            source: Some(source),
        }
    }

    pub(crate) fn io_gate(message: impl Into<String>) -> Self {
        PaletteError::Io {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn decode(path: &Path, source: DecodeError) -> Self {
        PaletteError::Decode {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("File size smaller than 12 bytes ({size})")]
    TooSmall { size: usize },

    #[error("Unknown image type")]
    UnknownFormat,

    #[error("Unsupported image type: {0:?}")]
    Unsupported(ImageFormat),

    #[error("Unable to decode image: {0}")]
    Decoder(#[from] image::ImageError),

    #[error("Pixel out of range: ({x}, {y})")]
    PixelOutOfRange { x: u32, y: u32 },
}
