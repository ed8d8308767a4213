use axum::extract::Multipart;
use bytes::Bytes;
use tracing::{error, warn};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Fields of the blog create/update multipart form. Text fields are optional
/// here; create enforces presence, update treats absence as "keep".
#[derive(Debug, Default)]
pub struct BlogForm {
    pub title: Option<String>,
    pub content: Option<String>,
    pub genre: Option<String>,
    pub image: Option<UploadedImage>,
}

#[derive(Debug)]
pub struct UploadedImage {
    pub bytes: Bytes,
    pub content_type: String,
}

/// jpeg/png/gif only; returns the stored-object extension.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

pub async fn read_blog_form(mut multipart: Multipart) -> Result<BlogForm, ApiError> {
    let mut form = BlogForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("title") => {
                form.title = Some(text_field(field).await?);
            }
            Some("content") => {
                form.content = Some(text_field(field).await?);
            }
            Some("genre") => {
                form.genre = Some(text_field(field).await?);
            }
            Some("image") => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_default();
                if image_extension(&content_type).is_none() {
                    warn!(%content_type, "rejected upload content type");
                    return Err(ApiError::Validation(
                        "Only images are allowed (jpg, png, gif)".into(),
                    ));
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Failed to read image: {e}")))?;
                if bytes.len() > MAX_IMAGE_BYTES {
                    return Err(ApiError::Validation("Image exceeds the 5MB limit".into()));
                }
                form.image = Some(UploadedImage {
                    bytes,
                    content_type,
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart field: {e}")))
}

/// Pushes the image to the object store and returns its public URL.
pub async fn store_image(state: &AppState, image: UploadedImage) -> Result<String, ApiError> {
    let ext = image_extension(&image.content_type).ok_or_else(|| {
        ApiError::Validation("Only images are allowed (jpg, png, gif)".into())
    })?;
    let key = format!("blog-uploads/{}.{ext}", Uuid::new_v4());

    state
        .images
        .store(&key, image.bytes, &image.content_type)
        .await
        .map_err(|e| {
            error!(error = %e, %key, "image upload failed");
            ApiError::Upstream("Failed to upload image. Please try again.".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_jpeg_png_gif_are_accepted() {
        assert_eq!(image_extension("image/jpeg"), Some("jpg"));
        assert_eq!(image_extension("image/png"), Some("png"));
        assert_eq!(image_extension("image/gif"), Some("gif"));
        assert_eq!(image_extension("image/svg+xml"), None);
        assert_eq!(image_extension("application/octet-stream"), None);
        assert_eq!(image_extension(""), None);
    }
}
