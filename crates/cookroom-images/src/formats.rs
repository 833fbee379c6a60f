//! Image format detection for selected files.

use crate::error::{ImageError, ImageResult};

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// PNG format
    Png,
    /// JPEG format
    Jpeg,
    /// GIF format
    Gif,
    /// WebP format
    WebP,
}

impl ImageFormat {
    /// Detect image format from bytes (magic bytes).
    pub fn detect_from_bytes(bytes: &[u8]) -> ImageResult<Self> {
        if bytes.len() < 4 {
            return Err(ImageError::InvalidFile(
                "File too small to be a valid image".to_string(),
            ));
        }

        // PNG: 89 50 4E 47
        if bytes.starts_with(&[0x89, 0x50, 0x4e, 0x47]) {
            return Ok(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
            return Ok(ImageFormat::Jpeg);
        }

        if bytes.starts_with(b"GIF") {
            return Ok(ImageFormat::Gif);
        }

        // WebP: RIFF ... WEBP
        if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && bytes[8..12] == *b"WEBP" {
            return Ok(ImageFormat::WebP);
        }

        Err(ImageError::InvalidFile(
            "Unable to detect image format from file header".to_string(),
        ))
    }

    /// Format for an `image/*` MIME type, ignoring parameters.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ImageFormat::Jpeg),
            "image/gif" => Some(ImageFormat::Gif),
            "image/webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// MIME type guessed from a file name's extension.
    pub fn guess_mime(file_name: &str) -> Option<String> {
        mime_guess::from_path(file_name)
            .first()
            .map(|mime| mime.essence_str().to_string())
    }

    /// Classify a selected file.
    ///
    /// A declared MIME wins, then the file extension, then the header bytes.
    /// Files declared or named as something other than an image are rejected
    /// without sniffing.
    pub fn classify(file_name: &str, declared_mime: Option<&str>, bytes: &[u8]) -> ImageResult<Self> {
        let mime = declared_mime
            .map(str::to_string)
            .filter(|m| !m.trim().is_empty())
            .or_else(|| Self::guess_mime(file_name));

        match mime {
            Some(mime) if !is_image_mime(&mime) => Err(ImageError::FormatNotSupported(mime)),
            Some(mime) => match Self::from_mime(&mime) {
                Some(format) => Ok(format),
                None => Self::detect_from_bytes(bytes)
                    .map_err(|_| ImageError::FormatNotSupported(mime)),
            },
            None => Self::detect_from_bytes(bytes),
        }
    }

    /// Get the format as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Gif => "gif",
            ImageFormat::WebP => "webp",
        }
    }

    /// Canonical MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
        }
    }
}

/// Whether a MIME string names an image type
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn test_detect_png_format() {
        assert_eq!(ImageFormat::detect_from_bytes(PNG).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_detect_jpeg_format() {
        let jpeg_bytes = vec![0xff, 0xd8, 0xff, 0xe0];
        assert_eq!(
            ImageFormat::detect_from_bytes(&jpeg_bytes).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_detect_webp_format() {
        let mut webp_bytes = b"RIFF".to_vec();
        webp_bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        webp_bytes.extend_from_slice(b"WEBP");
        assert_eq!(
            ImageFormat::detect_from_bytes(&webp_bytes).unwrap(),
            ImageFormat::WebP
        );
    }

    #[test]
    fn test_invalid_format() {
        assert!(ImageFormat::detect_from_bytes(&[0, 0, 0, 0]).is_err());
        assert!(ImageFormat::detect_from_bytes(&[0x89]).is_err());
    }

    #[test]
    fn test_from_mime_ignores_parameters_and_case() {
        assert_eq!(ImageFormat::from_mime("IMAGE/PNG"), Some(ImageFormat::Png));
        assert_eq!(
            ImageFormat::from_mime("image/jpeg; q=0.9"),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::from_mime("image/bmp"), None);
    }

    #[test]
    fn test_classify_prefers_declared_mime() {
        let format = ImageFormat::classify("photo.bin", Some("image/gif"), b"junk").unwrap();
        assert_eq!(format, ImageFormat::Gif);
    }

    #[test]
    fn test_classify_falls_back_to_extension() {
        let format = ImageFormat::classify("carrots.JPG", None, b"junk").unwrap();
        assert_eq!(format, ImageFormat::Jpeg);
    }

    #[test]
    fn test_classify_sniffs_unknown_names() {
        let format = ImageFormat::classify("camera-upload", None, PNG).unwrap();
        assert_eq!(format, ImageFormat::Png);
    }

    #[test]
    fn test_classify_rejects_non_images() {
        assert!(matches!(
            ImageFormat::classify("notes.txt", None, PNG),
            Err(ImageError::FormatNotSupported(_))
        ));
        assert!(matches!(
            ImageFormat::classify("a.png", Some("application/pdf"), PNG),
            Err(ImageError::FormatNotSupported(_))
        ));
    }

    #[test]
    fn test_classify_unknown_image_subtype_uses_header() {
        assert_eq!(
            ImageFormat::classify("scan.heic", Some("image/heic"), PNG).unwrap(),
            ImageFormat::Png
        );
        assert!(matches!(
            ImageFormat::classify("scan.heic", Some("image/heic"), b"ftypheic"),
            Err(ImageError::FormatNotSupported(_))
        ));
    }

    #[test]
    fn test_format_mime_type() {
        assert_eq!(ImageFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(ImageFormat::WebP.as_str(), "webp");
    }
}
