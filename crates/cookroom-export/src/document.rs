//! PDF assembly from a region raster.

use std::io::Cursor;

use image::{codecs::jpeg::JpegEncoder, imageops, DynamicImage, RgbaImage};
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, TextStr};
use tracing::debug;

use crate::{
    config::{ExportConfig, PageMode},
    error::{ExportError, ExportResult},
};

const IMAGE_NAME: Name<'static> = Name(b"Im1");

/// A composed document
#[derive(Debug, Clone)]
pub struct ComposedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// A horizontal band of the raster and where it lands on its page
struct PageSlice {
    top_px: u32,
    height_px: u32,
    page_height_pt: f32,
}

/// Lay the raster onto pages at the configured page width.
pub fn compose(raster: &RgbaImage, title: &str, config: &ExportConfig) -> ExportResult<ComposedDocument> {
    let (width_px, height_px) = raster.dimensions();
    if width_px == 0 || height_px == 0 {
        return Err(ExportError::ExportFailed("empty raster".to_string()));
    }

    let page_width = config.page_width_pt;
    let pt_per_px = page_width / width_px as f32;
    let slices = plan_pages(height_px, pt_per_px, config);

    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let info_id = Ref::new(3);
    let mut next_id = 4;
    let mut alloc = || {
        let id = Ref::new(next_id);
        next_id += 1;
        id
    };

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.document_info(info_id)
        .title(TextStr(title))
        .creator(TextStr("Cooking Room"));

    let mut page_ids = Vec::with_capacity(slices.len());
    for slice in &slices {
        let page_id = alloc();
        let image_id = alloc();
        let content_id = alloc();
        page_ids.push(page_id);

        let jpeg = encode_slice(raster, slice, config.jpeg_quality)?;
        let mut image = pdf.image_xobject(image_id, &jpeg);
        image.filter(Filter::DctDecode);
        image.width(width_px as i32);
        image.height(slice.height_px as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
        image.finish();

        // Slices hang from the top edge of their page
        let drawn_height = slice.height_px as f32 * pt_per_px;
        let y = slice.page_height_pt - drawn_height;
        let mut content = Content::new();
        content.save_state();
        content.transform([page_width, 0.0, 0.0, drawn_height, 0.0, y]);
        content.x_object(IMAGE_NAME);
        content.restore_state();
        pdf.stream(content_id, &content.finish());

        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, page_width, slice.page_height_pt));
        page.parent(page_tree_id);
        page.contents(content_id);
        page.resources().x_objects().pair(IMAGE_NAME, image_id);
        page.finish();
    }

    let page_count = page_ids.len();
    pdf.pages(page_tree_id)
        .kids(page_ids)
        .count(page_count as i32);

    debug!(page_count, page_mode = ?config.page_mode, "composed document");
    Ok(ComposedDocument {
        bytes: pdf.finish(),
        page_count,
    })
}

fn plan_pages(height_px: u32, pt_per_px: f32, config: &ExportConfig) -> Vec<PageSlice> {
    match config.page_mode {
        PageMode::Continuous => vec![PageSlice {
            top_px: 0,
            height_px,
            page_height_pt: height_px as f32 * pt_per_px,
        }],
        PageMode::Paginated => {
            let page_px = ((config.page_height_pt / pt_per_px).floor() as u32).max(1);
            (0..height_px)
                .step_by(page_px as usize)
                .map(|top_px| PageSlice {
                    top_px,
                    height_px: page_px.min(height_px - top_px),
                    page_height_pt: config.page_height_pt,
                })
                .collect()
        }
    }
}

fn encode_slice(raster: &RgbaImage, slice: &PageSlice, quality: u8) -> ExportResult<Vec<u8>> {
    let band = imageops::crop_imm(raster, 0, slice.top_px, raster.width(), slice.height_px).to_image();
    let rgb = DynamicImage::ImageRgba8(band).to_rgb8();

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    rgb.write_with_encoder(encoder)?;
    Ok(buffer.into_inner())
}
