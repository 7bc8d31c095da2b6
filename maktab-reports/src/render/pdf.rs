//! PDF rendering with printpdf
//!
//! A4 pages, Helvetica text, and per-class sections: a heading, a few
//! summary lines, then the class's images in a two-column grid. The
//! cursor walks down the page and opens a new page whenever the next
//! element would cross the bottom margin.

use std::io::Cursor;

use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference,
};
use tracing::debug;

use super::{encode_png, ClassSection, RenderError, ReportOptions};
use crate::fetch::PreparedImage;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;

const COLUMN_GAP_MM: f32 = 10.0;
const COLUMN_WIDTH_MM: f32 = (PAGE_WIDTH_MM - 2.0 * MARGIN_MM - COLUMN_GAP_MM) / 2.0;
const MAX_IMAGE_HEIGHT_MM: f32 = 70.0;
const IMAGE_DPI: f32 = 150.0;
const MM_PER_INCH: f32 = 25.4;
const MM_PER_PT: f32 = 0.3528;

/// Renders the report as PDF bytes
pub fn render(sections: &[ClassSection], options: &ReportOptions) -> Result<Vec<u8>, RenderError> {
    let (doc, page, layer) = PdfDocument::new(
        &options.title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "content",
    );
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let mut cursor = PageCursor {
        doc: &doc,
        layer: doc.get_page(page).get_layer(layer),
        y: PAGE_HEIGHT_MM - MARGIN_MM,
    };

    cursor.text_line(&options.title, options.fonts.title, &bold);
    cursor.text_line(
        &format!("Supervisor: {}", options.supervisor_name),
        options.fonts.body,
        &regular,
    );
    cursor.text_line(
        &format!("Generated: {}", options.generated_on.format("%Y-%m-%d")),
        options.fonts.body,
        &regular,
    );
    cursor.space(6.0);

    for section in sections {
        debug!(class = %section.report.class.name, images = section.images.len(), "Rendering class section");

        // Keep the heading attached to at least one body line.
        cursor.ensure_space(line_height(options.fonts.heading) + line_height(options.fonts.body));
        cursor.text_line(&section.report.class.name, options.fonts.heading, &bold);

        for line in section.summary_lines() {
            cursor.text_line(&line, options.fonts.body, &regular);
        }
        cursor.space(3.0);

        cursor.image_grid(&section.images)?;
        cursor.space(6.0);
    }

    Ok(doc.save_to_bytes()?)
}

fn line_height(font_size_pt: f32) -> f32 {
    font_size_pt * MM_PER_PT * 1.4
}

/// Drawn size of an image in millimetres, bounded to the grid cell
fn drawn_size(image: &PreparedImage) -> (f32, f32, f32) {
    let natural_w = image.width() as f32 * MM_PER_INCH / IMAGE_DPI;
    let natural_h = image.height() as f32 * MM_PER_INCH / IMAGE_DPI;

    let scale = (COLUMN_WIDTH_MM / natural_w)
        .min(MAX_IMAGE_HEIGHT_MM / natural_h)
        .min(1.0);

    (natural_w * scale, natural_h * scale, scale)
}

/// Write position on the current page; `y` is the next free baseline,
/// measured from the page bottom
struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl PageCursor<'_> {
    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT_MM - MARGIN_MM;
    }

    /// Opens a new page if `needed` millimetres do not fit above the margin
    fn ensure_space(&mut self, needed: f32) {
        if self.y - needed < MARGIN_MM {
            self.new_page();
        }
    }

    fn space(&mut self, mm: f32) {
        self.y -= mm;
    }

    fn text_line(&mut self, text: &str, font_size: f32, font: &IndirectFontRef) {
        let height = line_height(font_size);
        self.ensure_space(height);
        self.y -= height;
        self.layer
            .use_text(text, font_size, Mm(MARGIN_MM), Mm(self.y), font);
    }

    /// Lays images out two to a row, left to right
    fn image_grid(&mut self, images: &[PreparedImage]) -> Result<(), RenderError> {
        let mut column = 0usize;
        let mut row_height = 0.0f32;

        for image in images {
            let (_, height, scale) = drawn_size(image);

            if column == 0 {
                self.ensure_space(height + 2.0);
                row_height = height;
            } else if self.y - height < MARGIN_MM {
                // Second image is taller than the remaining space; wrap it
                // onto a fresh row.
                self.y -= row_height + 2.0;
                column = 0;
                self.ensure_space(height + 2.0);
                row_height = height;
            } else {
                row_height = row_height.max(height);
            }

            let x = MARGIN_MM + column as f32 * (COLUMN_WIDTH_MM + COLUMN_GAP_MM);
            self.place_image(image, x, self.y - height, scale)?;

            column += 1;
            if column == 2 {
                self.y -= row_height + 2.0;
                column = 0;
            }
        }

        if column == 1 {
            self.y -= row_height + 2.0;
        }

        Ok(())
    }

    /// Embeds one image with its bottom-left corner at (x, y)
    fn place_image(
        &mut self,
        image: &PreparedImage,
        x: f32,
        y: f32,
        scale: f32,
    ) -> Result<(), RenderError> {
        // Round-trip through PNG so the PDF library's own decoder builds
        // the XObject.
        let png = encode_png(&image.image)?;
        let decoder = PngDecoder::new(Cursor::new(png))
            .map_err(|e| RenderError::ImageEmbed(e.to_string()))?;
        let pdf_image =
            Image::try_from(decoder).map_err(|e| RenderError::ImageEmbed(e.to_string()))?;

        pdf_image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(x)),
                translate_y: Some(Mm(y)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use image::{DynamicImage, ImageBuffer, Rgb};
    use uuid::Uuid;

    use crate::aggregate::ClassReport;
    use crate::render::FontPresets;
    use maktab_shared::models::class::Class;

    fn options() -> ReportOptions {
        ReportOptions {
            title: "Attendance Report".to_string(),
            supervisor_name: "Umm Kulthum".to_string(),
            generated_on: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            fonts: FontPresets::default(),
        }
    }

    fn section(image_count: usize) -> ClassSection {
        let class = Class {
            id: Uuid::new_v4(),
            name: "Tajweed Basics".to_string(),
            description: String::new(),
            duration_minutes: 60,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let images = (0..image_count)
            .map(|i| PreparedImage {
                name: format!("photo-{i}.png"),
                image: DynamicImage::ImageRgb8(ImageBuffer::from_pixel(
                    120,
                    80,
                    Rgb([10u8, 20, 30]),
                )),
            })
            .collect();

        ClassSection {
            report: ClassReport {
                class,
                record_count: 2,
                total_students: 16,
                students_present: 13,
                students_absent: 2,
                students_on_leave: 1,
                teacher_names: vec!["ustadha_a".to_string()],
            },
            images,
        }
    }

    #[test]
    fn test_render_produces_pdf_bytes() {
        let bytes = render(&[section(2)], &options()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_many_images_paginate_without_error() {
        // Enough image rows to force several page breaks.
        let bytes = render(&[section(25)], &options()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_empty_report_still_renders_header() {
        let bytes = render(&[], &options()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_drawn_size_respects_column_bounds() {
        let wide = PreparedImage {
            name: "wide.png".to_string(),
            image: DynamicImage::ImageRgb8(ImageBuffer::from_pixel(800, 200, Rgb([0u8, 0, 0]))),
        };
        let (w, h, _) = drawn_size(&wide);
        assert!(w <= COLUMN_WIDTH_MM + 0.01);
        assert!(h <= MAX_IMAGE_HEIGHT_MM + 0.01);
    }
}
