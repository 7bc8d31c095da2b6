//! DOCX rendering with docx-rs
//!
//! Same content as the PDF renderer in flowing-document form: a title
//! block, then one heading + summary + images sequence per class. Word
//! reflows text itself, so there is no page-break handling here; images
//! are sized in EMUs from their prepared pixel dimensions.

use std::io::Cursor;

use docx_rs::{AlignmentType, Docx, Paragraph, Pic, Run};
use tracing::debug;

use super::{encode_png, ClassSection, RenderError, ReportOptions};
use crate::fetch::PreparedImage;

/// English Metric Units per pixel at 96 DPI
const EMU_PER_PIXEL: u32 = 9525;

/// Renders the report as DOCX bytes
pub fn render(sections: &[ClassSection], options: &ReportOptions) -> Result<Vec<u8>, RenderError> {
    // docx-rs sizes runs in half-points.
    let title_size = (options.fonts.title * 2.0) as usize;
    let heading_size = (options.fonts.heading * 2.0) as usize;
    let body_size = (options.fonts.body * 2.0) as usize;

    let mut docx = Docx::new()
        .add_paragraph(
            Paragraph::new()
                .align(AlignmentType::Center)
                .add_run(Run::new().add_text(&options.title).size(title_size).bold()),
        )
        .add_paragraph(
            Paragraph::new().align(AlignmentType::Center).add_run(
                Run::new()
                    .add_text(format!("Supervisor: {}", options.supervisor_name))
                    .size(body_size),
            ),
        )
        .add_paragraph(
            Paragraph::new().align(AlignmentType::Center).add_run(
                Run::new()
                    .add_text(format!(
                        "Generated: {}",
                        options.generated_on.format("%Y-%m-%d")
                    ))
                    .size(body_size),
            ),
        )
        .add_paragraph(Paragraph::new());

    for section in sections {
        debug!(class = %section.report.class.name, images = section.images.len(), "Rendering class section");

        docx = docx.add_paragraph(
            Paragraph::new().add_run(
                Run::new()
                    .add_text(&section.report.class.name)
                    .size(heading_size)
                    .bold(),
            ),
        );

        for line in section.summary_lines() {
            docx = docx
                .add_paragraph(Paragraph::new().add_run(Run::new().add_text(line).size(body_size)));
        }

        for image in &section.images {
            docx = docx.add_paragraph(image_paragraph(image)?);
        }

        docx = docx.add_paragraph(Paragraph::new());
    }

    let mut cursor = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut cursor)
        .map_err(|e| RenderError::Docx(e.to_string()))?;

    Ok(cursor.into_inner())
}

fn image_paragraph(image: &PreparedImage) -> Result<Paragraph, RenderError> {
    let png = encode_png(&image.image)?;
    let pic = Pic::new(&png).size(
        image.width() * EMU_PER_PIXEL,
        image.height() * EMU_PER_PIXEL,
    );

    Ok(Paragraph::new().add_run(Run::new().add_image(pic)))
}
