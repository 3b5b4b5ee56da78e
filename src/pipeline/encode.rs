//! Image encoding: file bytes → base64 wrapped for the multimodal API.
//!
//! The bytes are sent as-is. No decoding, resizing or re-compression happens
//! here, so the encoding is lossless with respect to the file on disk.
//!
//! ## Compatibility note: the MIME label is always `image/jpeg`
//!
//! Every image is labelled `image/jpeg` in its data URI, PNG inputs included.
//! Providers seen so far sniff the payload rather than trusting the label,
//! but this has not been confirmed for every backend. The real format is
//! sniffed into [`EncodedImage::detected_format`] and logged when it differs,
//! without changing the label sent to the provider.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::ImageFormat;
use std::path::Path;
use tracing::debug;

/// MIME type written into every data URI.
pub const DATA_URI_MIME: &str = "image/jpeg";

/// A base64-encoded image ready to be attached to a chat request.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// Standard (padded) base64 of the raw file bytes.
    pub base64: String,
    /// Format sniffed from the magic bytes, if recognisable.
    pub detected_format: Option<ImageFormat>,
}

impl EncodedImage {
    /// Encode raw image bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            base64: STANDARD.encode(bytes),
            detected_format: image::guess_format(bytes).ok(),
        }
    }

    /// `data:image/jpeg;base64,<payload>`
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", DATA_URI_MIME, self.base64)
    }

    /// Convert to the provider-facing attachment, keeping the JPEG label.
    pub fn to_image_data(&self) -> ImageData {
        ImageData::new(self.base64.clone(), DATA_URI_MIME)
    }

    /// True when the sniffed format is known and is not JPEG.
    pub fn label_mismatch(&self) -> bool {
        matches!(self.detected_format, Some(f) if f != ImageFormat::Jpeg)
    }
}

/// Read an image file and base64-encode its bytes.
///
/// # Errors
/// Propagates the I/O error if the file cannot be opened or read.
pub async fn encode_image(path: &Path) -> std::io::Result<EncodedImage> {
    let bytes = tokio::fs::read(path).await?;
    let encoded = EncodedImage::from_bytes(&bytes);

    if encoded.label_mismatch() {
        debug!(
            "{}: detected {:?}, sending as {}",
            path.display(),
            encoded.detected_format,
            DATA_URI_MIME
        );
    }
    debug!(
        "Encoded {} → {} bytes base64",
        path.display(),
        encoded.base64.len()
    );

    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([0, 128, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("png encode");
        buf
    }

    #[test]
    fn base64_is_lossless() {
        let bytes = png_bytes();
        let enc = EncodedImage::from_bytes(&bytes);
        assert_eq!(STANDARD.decode(&enc.base64).expect("valid base64"), bytes);
    }

    #[test]
    fn png_is_labelled_jpeg() {
        let enc = EncodedImage::from_bytes(&png_bytes());
        assert_eq!(enc.detected_format, Some(ImageFormat::Png));
        assert!(enc.label_mismatch());
        assert!(enc.data_uri().starts_with("data:image/jpeg;base64,iVBOR"));

        let data = enc.to_image_data();
        assert_eq!(data.mime_type, "image/jpeg");
        assert_eq!(data.data, enc.base64);
    }

    #[test]
    fn unknown_bytes_have_no_detected_format() {
        let enc = EncodedImage::from_bytes(b"hello");
        assert_eq!(enc.detected_format, None);
        assert!(!enc.label_mismatch());
        assert_eq!(enc.data_uri(), "data:image/jpeg;base64,aGVsbG8=");
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = encode_image(Path::new("/definitely/not/here.jpg"))
            .await
            .expect_err("should fail");
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn encodes_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.png");
        std::fs::write(&path, png_bytes()).unwrap();

        let enc = encode_image(&path).await.expect("encode");
        assert_eq!(enc.detected_format, Some(ImageFormat::Png));
    }
}
