//! Image upload for image blocks and canvas images.
//!
//! Uploaded files are checked by decoding them and handed back as a
//! `data:` URI, which both editors accept as an image source.

use axum::{Json, extract::Multipart, http::StatusCode};
use serde::Serialize;
use serde_json::json;

use crate::canvas::assets::encode_data_uri;

use super::ApiError;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

fn bad_request(message: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"success": false, "error": message})),
    )
}

/// POST /api/uploads - Upload an image file (multipart field `image`).
pub async fn upload(mut multipart: Multipart) -> Result<Json<UploadResponse>, ApiError> {
    let mut image_data: Option<Vec<u8>> = None;
    let mut filename = String::from("unknown");

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("image") {
            filename = field.file_name().unwrap_or("unknown").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request(format!("Failed to read image: {}", e)))?;
            image_data = Some(bytes.to_vec());
            break;
        }
    }

    let bytes = image_data.ok_or_else(|| bad_request("No image field found".to_string()))?;
    let format = image::guess_format(&bytes)
        .map_err(|e| bad_request(format!("Unrecognized image format: {}", e)))?;
    let img = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| bad_request(format!("Failed to decode image: {}", e)))?;

    Ok(Json(UploadResponse {
        url: encode_data_uri(format.to_mime_type(), &bytes),
        filename,
        width: img.width(),
        height: img.height(),
    }))
}
