//! Document rendering
//!
//! Turns aggregated class sections into a downloadable PDF or DOCX. Byte
//! layout belongs entirely to the document libraries; this layer only
//! decides content, column layout, image scaling bounds, and font-size
//! presets.

use std::io::Cursor;

use chrono::NaiveDate;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::aggregate::ClassReport;
use crate::fetch::PreparedImage;

pub mod docx;
pub mod pdf;

/// Error type for document rendering
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// PDF library error
    #[error("PDF generation failed: {0}")]
    Pdf(#[from] printpdf::Error),

    /// Image could not be embedded into the PDF
    #[error("Image embedding failed: {0}")]
    ImageEmbed(String),

    /// Image could not be re-encoded for embedding
    #[error("Image encoding failed: {0}")]
    ImageEncode(#[from] image::ImageError),

    /// DOCX library error
    #[error("DOCX generation failed: {0}")]
    Docx(String),
}

/// Output document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Pdf,
    Docx,
}

impl ReportFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Docx => "docx",
        }
    }

    /// MIME type for the download response
    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Pdf => "application/pdf",
            ReportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// Font size presets, in points
#[derive(Debug, Clone, Copy)]
pub struct FontPresets {
    /// Document title
    pub title: f32,

    /// Class section headings
    pub heading: f32,

    /// Summary body lines
    pub body: f32,
}

impl Default for FontPresets {
    fn default() -> Self {
        Self {
            title: 18.0,
            heading: 14.0,
            body: 10.0,
        }
    }
}

/// Document-level settings shared by both renderers
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Document title, from the `form_title` setting
    pub title: String,

    /// Supervisor name printed under the title
    pub supervisor_name: String,

    /// Date printed on the document and stamped into the filename
    pub generated_on: NaiveDate,

    /// Font sizes
    pub fonts: FontPresets,
}

/// One class's content: the aggregated summary plus its prepared images
#[derive(Debug)]
pub struct ClassSection {
    pub report: ClassReport,
    pub images: Vec<PreparedImage>,
}

impl ClassSection {
    /// Summary lines shared by both output formats
    pub(crate) fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(5);
        if !self.report.teacher_names.is_empty() {
            lines.push(format!("Teachers: {}", self.report.teacher_names.join(", ")));
        }
        lines.push(format!("Attendance records: {}", self.report.record_count));
        lines.push(format!("Total students: {}", self.report.total_students));
        lines.push(format!(
            "Present: {}   Absent: {}   On leave: {}",
            self.report.students_present,
            self.report.students_absent,
            self.report.students_on_leave,
        ));
        lines
    }
}

/// Builds the download filename: `{base}-{YYYY-MM-DD}.{ext}`
pub fn report_filename(base: &str, date: NaiveDate, format: ReportFormat) -> String {
    format!(
        "{}-{}.{}",
        base,
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Re-encodes prepared pixels as PNG for embedding
pub(crate) fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}
