//! Lazy attachment fetching and image preparation
//!
//! List queries deliberately skip attachment payloads; this module pulls
//! them per class through the bounded worker pool once a report actually
//! needs them, then decodes and resizes each image for embedding. Images
//! are decoded fully into pixels before any resize so a truncated or
//! partially-decoded payload fails loudly instead of producing a blank
//! canvas.

use image::imageops::FilterType;
use image::DynamicImage;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use maktab_shared::models::attendance::{Attachment, AttendanceRecord};

use crate::pool::{run_with_limit, RetryPolicy};

/// How many attachment fetches run at once
pub const DEFAULT_FETCH_CONCURRENCY: usize = 3;

/// Longest edge of an embedded image, in pixels
pub const MAX_IMAGE_DIMENSION: u32 = 800;

/// Error type for attachment fetching and decoding
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Database query failed after retries
    #[error("Attachment query failed: {0}")]
    Database(#[from] sqlx::Error),

    /// Attachment payload is not valid base64
    #[error("Attachment '{name}' is not valid base64")]
    InvalidBase64 { name: String },

    /// Attachment bytes are not a decodable image
    #[error("Attachment '{name}' could not be decoded as an image: {source}")]
    InvalidImage {
        name: String,
        source: image::ImageError,
    },

    /// Image preparation task was cancelled
    #[error("Image preparation task failed to complete")]
    TaskFailed,
}

/// An attachment decoded to pixels and bounded to the embedding size
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Original file name
    pub name: String,

    /// Decoded (and possibly downscaled) pixels
    pub image: DynamicImage,
}

impl PreparedImage {
    /// Width in pixels after preparation
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels after preparation
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Fetches attachment payloads for each class through the worker pool
///
/// Results are keyed by class and come back in the order of `class_ids`.
/// Each fetch gets one retry with a short backoff.
#[instrument(skip(pool, class_ids), fields(classes = class_ids.len()))]
pub async fn fetch_class_attachments(
    pool: &PgPool,
    class_ids: &[Uuid],
    limit: usize,
) -> Result<Vec<(Uuid, Vec<Attachment>)>, FetchError> {
    let tasks: Vec<_> = class_ids
        .iter()
        .map(|&class_id| {
            let pool = pool.clone();
            move || {
                let pool = pool.clone();
                async move { AttendanceRecord::attachments_by_class(&pool, class_id).await }
            }
        })
        .collect();

    let results = run_with_limit(tasks, limit, RetryPolicy::default()).await;

    let mut fetched = Vec::with_capacity(class_ids.len());
    for (&class_id, result) in class_ids.iter().zip(results) {
        let attachments = result?;
        debug!(%class_id, count = attachments.len(), "Fetched attachments");
        fetched.push((class_id, attachments));
    }

    Ok(fetched)
}

/// Decodes one attachment fully and downscales it to the embedding bound
///
/// Aspect ratio is preserved; images already within the bound pass through
/// unscaled.
pub fn prepare_image(
    attachment: &Attachment,
    max_dimension: u32,
) -> Result<PreparedImage, FetchError> {
    let bytes = attachment
        .decode()
        .map_err(|_| FetchError::InvalidBase64 {
            name: attachment.name.clone(),
        })?;

    // load_from_memory decodes the full image up front.
    let decoded =
        image::load_from_memory(&bytes).map_err(|source| FetchError::InvalidImage {
            name: attachment.name.clone(),
            source,
        })?;

    let image = if decoded.width() > max_dimension || decoded.height() > max_dimension {
        decoded.resize(max_dimension, max_dimension, FilterType::Triangle)
    } else {
        decoded
    };

    Ok(PreparedImage {
        name: attachment.name.clone(),
        image,
    })
}

/// Prepares a batch of attachments through the worker pool
///
/// Decoding is CPU work, so each task runs on the blocking thread pool;
/// the concurrency limit caps how many decodes are queued at once. Output
/// order matches input order. Decode failures are skipped rather than
/// failing the report; a record's remaining images still render.
pub async fn prepare_images(attachments: Vec<Attachment>, limit: usize) -> Vec<PreparedImage> {
    let tasks: Vec<_> = attachments
        .into_iter()
        .map(|attachment| {
            move || {
                let attachment = attachment.clone();
                async move {
                    tokio::task::spawn_blocking(move || {
                        prepare_image(&attachment, MAX_IMAGE_DIMENSION)
                    })
                    .await
                    .map_err(|_| FetchError::TaskFailed)?
                }
            }
        })
        .collect();

    let results = run_with_limit(tasks, limit, RetryPolicy::none()).await;

    let mut prepared = Vec::new();
    for result in results {
        match result {
            Ok(image) => prepared.push(image),
            Err(error) => debug!(%error, "Skipping undecodable attachment"),
        }
    }

    prepared
}
