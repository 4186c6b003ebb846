use crate::canvas::ImageResource;
use crate::error::NoticeError;
use crate::notice::LogoSource;
use base64::Engine;
use image::GenericImageView;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

/// Decoded logo ready for placement.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedLogo {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub data: Arc<[u8]>,
}

impl LoadedLogo {
    pub fn into_resource(self) -> ImageResource {
        ImageResource {
            pixel_width: self.pixel_width,
            pixel_height: self.pixel_height,
            data: self.data,
        }
    }
}

/// Fetches and decodes a logo. Implementations may block; callers bound
/// them with [`load_with_timeout`].
pub trait LogoLoader: Send + Sync {
    fn load(&self, source: &LogoSource) -> Result<LoadedLogo, NoticeError>;
}

/// Reads inline bytes, `data:` URIs or local files and decodes PNG/JPEG.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodingLogoLoader;

impl LogoLoader for DecodingLogoLoader {
    fn load(&self, source: &LogoSource) -> Result<LoadedLogo, NoticeError> {
        let bytes = read_source(source)?;
        decode_logo(bytes)
    }
}

fn read_source(source: &LogoSource) -> Result<Vec<u8>, NoticeError> {
    match source {
        LogoSource::Bytes(bytes) => Ok(bytes.clone()),
        LogoSource::DataUri(uri) => parse_data_uri(uri),
        LogoSource::Path(path) => Ok(std::fs::read(path)?),
    }
}

fn parse_data_uri(uri: &str) -> Result<Vec<u8>, NoticeError> {
    let Some((header, data_part)) = uri.split_once(',') else {
        return Err(NoticeError::Asset("data uri has no payload".to_string()));
    };
    if !header.starts_with("data:") {
        return Err(NoticeError::Asset("not a data uri".to_string()));
    }
    if header.contains("base64") {
        return base64::engine::general_purpose::STANDARD
            .decode(data_part.trim())
            .map_err(|err| NoticeError::Asset(format!("invalid base64 logo payload: {err}")));
    }
    Ok(data_part.as_bytes().to_vec())
}

pub fn decode_logo(bytes: Vec<u8>) -> Result<LoadedLogo, NoticeError> {
    let decoded = image::load_from_memory(&bytes)
        .map_err(|err| NoticeError::Asset(format!("cannot decode logo: {err}")))?;
    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return Err(NoticeError::Asset("logo has zero size".to_string()));
    }
    Ok(LoadedLogo {
        pixel_width: width,
        pixel_height: height,
        data: Arc::from(bytes),
    })
}

/// Run `loader` on a helper thread and give up after `timeout`.
///
/// A loader that outlives the deadline is abandoned; its result is dropped.
pub fn load_with_timeout(
    loader: Arc<dyn LogoLoader>,
    source: LogoSource,
    timeout: Duration,
) -> Result<LoadedLogo, NoticeError> {
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("noticepress-logo".to_string())
        .spawn(move || {
            let _ = tx.send(loader.load(&source));
        })?;
    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(NoticeError::Asset(format!(
            "logo load timed out after {} ms",
            timeout.as_millis()
        ))),
        Err(RecvTimeoutError::Disconnected) => Err(NoticeError::Asset(
            "logo loader exited without a result".to_string(),
        )),
    }
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverReturns;

    impl LogoLoader for NeverReturns {
        fn load(&self, _source: &LogoSource) -> Result<LoadedLogo, NoticeError> {
            std::thread::sleep(Duration::from_secs(30));
            Err(NoticeError::Asset("unreachable".to_string()))
        }
    }

    #[test]
    fn decodes_inline_png_dimensions() {
        let logo = DecodingLogoLoader
            .load(&LogoSource::Bytes(png_bytes(40, 10)))
            .unwrap();
        assert_eq!((logo.pixel_width, logo.pixel_height), (40, 10));
    }

    #[test]
    fn decodes_base64_data_uri() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(3, 3));
        let uri = format!("data:image/png;base64,{encoded}");
        let logo = DecodingLogoLoader.load(&LogoSource::DataUri(uri)).unwrap();
        assert_eq!(logo.pixel_width, 3);
    }

    #[test]
    fn garbage_bytes_are_an_asset_error() {
        let err = DecodingLogoLoader
            .load(&LogoSource::Bytes(b"GIF-ish nonsense".to_vec()))
            .unwrap_err();
        assert!(matches!(err, NoticeError::Asset(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("noticepress_no_such_logo.png");
        let err = DecodingLogoLoader
            .load(&LogoSource::Path(path))
            .unwrap_err();
        assert!(matches!(err, NoticeError::Io(_)));
    }

    #[test]
    fn slow_loader_is_abandoned_after_timeout() {
        let started = std::time::Instant::now();
        let err = load_with_timeout(
            Arc::new(NeverReturns),
            LogoSource::Bytes(Vec::new()),
            Duration::from_millis(50),
        )
        .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(err.to_string().contains("timed out"));
    }
}
