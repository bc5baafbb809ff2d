//! Loading and atomically saving RGBA images.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::buffer::ConvertBuffer;
use image::{ImageFormat, ImageReader, RgbImage, RgbaImage};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::error::IoError;

/// Decode an image file into an RGBA8 buffer.
///
/// The format is sniffed from the file contents, so a misnamed file
/// still decodes.
///
/// # Errors
///
/// Returns [`IoError::Open`] if the file cannot be read and
/// [`IoError::Decode`] if it is not a supported image.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_rgba(path: &Path) -> Result<RgbaImage, IoError> {
    let open = |source| IoError::Open {
        path: path.to_path_buf(),
        source,
    };
    let reader = ImageReader::open(path)
        .map_err(open)?
        .with_guessed_format()
        .map_err(open)?;
    let image = reader
        .decode()
        .map_err(|source| IoError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .into_rgba8();
    debug!(width = image.width(), height = image.height(), "decoded");
    Ok(image)
}

/// Output format chosen from the destination extension.
///
/// # Errors
///
/// Returns [`IoError::UnsupportedFormat`] for anything other than PNG
/// or JPEG.
pub fn format_for(path: &Path) -> Result<ImageFormat, IoError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Ok(ImageFormat::Png),
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        _ => Err(IoError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Save `image` to `path` without ever exposing a partial file.
///
/// The image is encoded into a temporary file in the destination
/// directory (created if missing), synced, and renamed over `path`.
/// JPEG output drops the alpha channel.
///
/// # Errors
///
/// Returns [`IoError::UnsupportedFormat`] for an unknown extension,
/// [`IoError::Encode`] if encoding fails and [`IoError::Persist`] for
/// any filesystem failure. On error `path` is left as it was.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn save_atomic(image: &RgbaImage, path: &Path) -> Result<(), IoError> {
    let format = format_for(path)?;
    let persist = |source| IoError::Persist {
        path: path.to_path_buf(),
        source,
    };

    let dir = parent_dir(path);
    std::fs::create_dir_all(&dir).map_err(persist)?;
    let mut tmp = NamedTempFile::new_in(&dir).map_err(persist)?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        let encoded = match format {
            ImageFormat::Jpeg => {
                let rgb: RgbImage = image.convert();
                rgb.write_to(&mut writer, format)
            }
            _ => image.write_to(&mut writer, format),
        };
        encoded.map_err(|source| IoError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
        writer.flush().map_err(persist)?;
    }
    tmp.as_file().sync_all().map_err(persist)?;
    tmp.persist(path).map_err(|e| persist(e.error))?;

    debug!(?format, "saved");
    Ok(())
}

/// Directory a file lives in; a bare file name lives in `.`.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert!(matches!(
            format_for(Path::new("a/b.png")),
            Ok(ImageFormat::Png)
        ));
        assert!(matches!(
            format_for(Path::new("b.JPG")),
            Ok(ImageFormat::Jpeg)
        ));
        assert!(matches!(
            format_for(Path::new("b.jpeg")),
            Ok(ImageFormat::Jpeg)
        ));
        assert!(matches!(
            format_for(Path::new("b.tiff")),
            Err(IoError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            format_for(Path::new("noext")),
            Err(IoError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn bare_file_name_lives_in_current_dir() {
        assert_eq!(parent_dir(Path::new("out.png")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new("a/out.png")), PathBuf::from("a"));
    }
}
