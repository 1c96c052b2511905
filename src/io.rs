use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tga::TgaEncoder;
use image::{DynamicImage, ImageError, RgbaImage};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(test)]
#[path = "io_test.rs"]
mod io_test;

/// Quality used for JPEG exports.
pub const JPEG_QUALITY: u8 = 90;

// ============================================================================
// Formats
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    #[default]
    Png,
    #[serde(rename = "jpg", alias = "jpeg")]
    Jpeg,
    Bmp,
    Tga,
}

impl SaveFormat {
    pub const ALL: [SaveFormat; 4] = [SaveFormat::Png, SaveFormat::Jpeg, SaveFormat::Bmp, SaveFormat::Tga];

    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Bmp => "bmp",
            SaveFormat::Tga => "tga",
        }
    }
}

impl fmt::Display for SaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for SaveFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(SaveFormat::Png),
            "jpg" | "jpeg" => Ok(SaveFormat::Jpeg),
            "bmp" => Ok(SaveFormat::Bmp),
            "tga" => Ok(SaveFormat::Tga),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Saving failed. '{0}' is not a valid filename.")]
    InvalidFilename(String),

    #[error("Unknown file type '{0}'. Expected one of png, jpg, bmp, tga.")]
    UnknownFormat(String),

    #[error("Saving as '{0}' is not allowed.")]
    FormatNotAllowed(SaveFormat),

    #[error("Saving failed. '{filename}' is likely not a valid filename. Error: {source}")]
    Encode {
        filename: String,
        #[source]
        source: ImageError,
    },
}

// ============================================================================
// Export
// ============================================================================

/// Resolve `<dir>/<filename>.<ext>`. The caller never supplies the extension.
pub fn export_path(filename: &str, format: SaveFormat, dir: Option<&Path>) -> Result<PathBuf, ExportError> {
    let trimmed = filename.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains('\0')
        || trimmed.ends_with('/')
        || trimmed.ends_with('\\')
    {
        return Err(ExportError::InvalidFilename(filename.to_string()));
    }

    let file = format!("{trimmed}.{}", format.extension());
    Ok(match dir {
        Some(dir) => dir.join(file),
        None => PathBuf::from(file),
    })
}

/// Encode `image` as `format` and write it to `path`.
pub fn encode_and_write(image: &RgbaImage, path: &Path, format: SaveFormat, quality: u8) -> Result<(), ImageError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    match format {
        SaveFormat::Png => {
            let encoder = PngEncoder::new(&mut writer);
            #[allow(deprecated)]
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality);
            encoder.encode(
                rgb_image.as_raw(),
                rgb_image.width(),
                rgb_image.height(),
                image::ColorType::Rgb8,
            )?;
        }
        SaveFormat::Bmp => {
            let mut encoder = BmpEncoder::new(&mut writer);
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Tga => {
            let encoder = TgaEncoder::new(&mut writer);
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Write `image` to `<dir>/<filename>.<ext>` and return the written path.
pub fn export_image(
    image: &RgbaImage,
    filename: &str,
    format: SaveFormat,
    dir: Option<&Path>,
) -> Result<PathBuf, ExportError> {
    let path = export_path(filename, format, dir)?;
    encode_and_write(image, &path, format, JPEG_QUALITY).map_err(|source| ExportError::Encode {
        filename: filename.to_string(),
        source,
    })?;
    Ok(path)
}
