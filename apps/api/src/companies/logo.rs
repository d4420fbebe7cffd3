//! Logo pipeline: validate → decode → resize → re-encode PNG → derive theme → upload.

use std::io::Cursor;

use aws_sdk_s3::primitives::ByteStream;
use image::{DynamicImage, ImageFormat};
use tracing::{info, warn};
use uuid::Uuid;

use crate::companies::theme::extract_theme;
use crate::errors::AppError;
use crate::models::company::Theme;

pub const MAX_LOGO_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_LOGO_DIMENSION: u32 = 256;

#[derive(Debug)]
pub struct ProcessedLogo {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub theme: Theme,
}

/// Decodes an uploaded PNG/JPEG, shrinks it to fit the logo box and re-encodes as PNG.
/// Images already inside the box are re-encoded at their original size.
pub fn process_logo(bytes: &[u8]) -> Result<ProcessedLogo, AppError> {
    if bytes.is_empty() {
        return Err(AppError::Validation("Logo upload is empty".to_string()));
    }
    if bytes.len() > MAX_LOGO_BYTES {
        return Err(AppError::PayloadTooLarge(format!(
            "Logo must be at most {} bytes",
            MAX_LOGO_BYTES
        )));
    }

    let format = image::guess_format(bytes)
        .map_err(|_| AppError::Image("Unrecognised image format".to_string()))?;
    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
        return Err(AppError::Image(
            "Only PNG and JPEG logos are supported".to_string(),
        ));
    }

    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| AppError::Image(format!("Failed to decode logo: {e}")))?;

    let resized = if decoded.width() > MAX_LOGO_DIMENSION || decoded.height() > MAX_LOGO_DIMENSION {
        decoded.thumbnail(MAX_LOGO_DIMENSION, MAX_LOGO_DIMENSION)
    } else {
        decoded
    };

    let rgba = resized.to_rgba8();
    let theme = extract_theme(&rgba);
    let (width, height) = rgba.dimensions();

    let mut png = Vec::new();
    DynamicImage::ImageRgba8(rgba)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| AppError::Image(format!("Failed to encode logo: {e}")))?;

    Ok(ProcessedLogo {
        png,
        width,
        height,
        theme,
    })
}

pub fn logo_key(company_id: Uuid) -> String {
    format!("logos/{}/{}.png", company_id, Uuid::new_v4())
}

pub async fn upload_logo(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    png: Vec<u8>,
) -> Result<(), AppError> {
    let size = png.len();
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(png))
        .content_type("image/png")
        .cache_control("public, max-age=31536000, immutable")
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Logo upload failed: {e}")))?;

    info!("Uploaded logo to s3://{bucket}/{key} ({size} bytes)");
    Ok(())
}

/// Removes a replaced logo. Failures only leave an orphaned object behind.
pub async fn delete_logo(s3: &aws_sdk_s3::Client, bucket: &str, key: &str) {
    if let Err(e) = s3.delete_object().bucket(bucket).key(key).send().await {
        warn!("Failed to delete logo s3://{bucket}/{key}: {e}");
    }
}
