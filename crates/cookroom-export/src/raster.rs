//! Rasterization of region snapshots and fetching of their images.

use std::{io::Cursor, sync::Arc};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use cookroom_api::{HttpClient, HttpConfig};
use image::RgbaImage;
use tracing::debug;
use usvg::{fontdb, TreeParsing, TreeTextToPath};

use crate::{
    error::{ExportError, ExportResult},
    layout::{layout, Block, InlineImage, LayoutOptions},
};

/// Turns laid-out blocks into pixels.
pub trait Rasterizer: Send + Sync {
    /// Render `blocks` at `scale` device pixels per layout pixel.
    fn rasterize(&self, blocks: &[Block], options: &LayoutOptions, scale: f32) -> ExportResult<RgbaImage>;
}

/// Rasterizer backed by usvg/resvg on a tiny-skia pixmap
#[derive(Clone)]
pub struct SvgRasterizer {
    fonts: Arc<fontdb::Database>,
}

impl std::fmt::Debug for SvgRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgRasterizer")
            .field("faces", &self.fonts.len())
            .finish()
    }
}

impl SvgRasterizer {
    /// Rasterizer using the fonts installed on this system
    pub fn new() -> Self {
        let mut fonts = fontdb::Database::new();
        fonts.load_system_fonts();
        debug!(faces = fonts.len(), "loaded system fonts");
        Self::with_fonts(fonts)
    }

    pub fn with_fonts(fonts: fontdb::Database) -> Self {
        Self {
            fonts: Arc::new(fonts),
        }
    }
}

impl Default for SvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for SvgRasterizer {
    fn rasterize(&self, blocks: &[Block], options: &LayoutOptions, scale: f32) -> ExportResult<RgbaImage> {
        let laid_out = layout(blocks, options);

        let mut tree = usvg::Tree::from_str(&laid_out.svg, &usvg::Options::default())
            .map_err(|e| ExportError::ExportFailed(format!("Failed to parse layout: {e}")))?;
        tree.convert_text(&self.fonts);

        let width = (laid_out.width * scale).ceil() as u32;
        let height = (laid_out.height * scale).ceil() as u32;
        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
            ExportError::ExportFailed(format!("Failed to create {width}x{height} pixmap"))
        })?;

        let transform = tiny_skia::Transform::from_scale(scale, scale);
        resvg::Tree::from_usvg(&tree).render(transform, &mut pixmap.as_mut());

        debug!(width, height, "rasterized region");

        // Opaque white background means premultiplied and straight RGBA coincide
        RgbaImage::from_raw(width, height, pixmap.take())
            .ok_or_else(|| ExportError::ExportFailed("pixmap size mismatch".to_string()))
    }
}

/// Anonymous retrieval of images referenced by a region
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> ExportResult<Vec<u8>>;
}

/// Fetches images over HTTP without credentials
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: HttpClient,
}

impl HttpImageFetcher {
    pub fn new(config: HttpConfig) -> ExportResult<Self> {
        let client = HttpClient::new(config).map_err(|e| ExportError::Config(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> ExportResult<Vec<u8>> {
        self.client
            .get_bytes(url)
            .await
            .map_err(|e| ExportError::ImageUnavailable(format!("{url}: {e}")))
    }
}

/// Bytes of an inline `data:` URI, if `url` is one
pub fn decode_data_uri(url: &str) -> Option<ExportResult<Vec<u8>>> {
    let rest = url.strip_prefix("data:")?;
    Some(match rest.split_once(";base64,") {
        Some((_, payload)) => STANDARD
            .decode(payload.trim())
            .map_err(|e| ExportError::ImageUnavailable(format!("bad data URI: {e}"))),
        None => Err(ExportError::ImageUnavailable(
            "only base64 data URIs are supported".to_string(),
        )),
    })
}

/// Decode any supported image and re-encode it as PNG for inlining.
pub fn inline_image(bytes: &[u8]) -> ExportResult<InlineImage> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| ExportError::ImageUnavailable(format!("undecodable image: {e}")))?;

    let mut png = Cursor::new(Vec::new());
    decoded.write_to(&mut png, image::ImageFormat::Png)?;

    Ok(InlineImage {
        data_uri: format!("data:image/png;base64,{}", STANDARD.encode(png.into_inner())),
        width: decoded.width(),
        height: decoded.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn rasterizer() -> SvgRasterizer {
        SvgRasterizer::with_fonts(fontdb::Database::new())
    }

    #[test]
    fn test_rasterize_scales_layout() {
        let options = LayoutOptions::default();
        let raster = rasterizer()
            .rasterize(&[Block::Heading("Soup".into())], &options, 2.0)
            .unwrap();

        assert_eq!(raster.width(), 1280);
        assert!(raster.height() > 0);
        // Background is opaque white
        assert_eq!(raster.get_pixel(1, 1).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_rasterize_draws_inline_image() {
        let image = inline_image(&png_bytes(40, 20)).unwrap();
        let options = LayoutOptions::default();
        let raster = rasterizer()
            .rasterize(&[Block::Image(image)], &options, 1.0)
            .unwrap();

        // Image is centered horizontally, starting below the top padding
        let pixel = raster.get_pixel(320, 24 + 10).0;
        let expected = [200u8, 40, 40, 255];
        for (got, want) in pixel.iter().zip(expected) {
            assert!(got.abs_diff(want) <= 3, "pixel {pixel:?}");
        }
    }

    #[test]
    fn test_inline_image_reports_size() {
        let image = inline_image(&png_bytes(8, 4)).unwrap();
        assert_eq!((image.width, image.height), (8, 4));
        assert!(image.data_uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_inline_image_rejects_garbage() {
        assert!(matches!(
            inline_image(b"not an image"),
            Err(ExportError::ImageUnavailable(_))
        ));
    }

    #[test]
    fn test_decode_data_uri() {
        assert!(decode_data_uri("http://x/y.png").is_none());
        let bytes = decode_data_uri("data:image/gif;base64,R0lG").unwrap().unwrap();
        assert_eq!(bytes, b"GIF");
        assert!(decode_data_uri("data:text/plain,hello").unwrap().is_err());
    }
}
