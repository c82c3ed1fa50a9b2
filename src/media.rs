//! Uploaded images: post pictures and profile avatars.
//!
//! Stored paths are relative to `media_dir` (`posts/<uuid>.<ext>`,
//! `avatars/<uuid>.png`) and served back under `/media/`.

use actix_multipart::{Field, Multipart};
use futures_util::TryStreamExt as _;
use image::ImageFormat;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use crate::{config::Config, errors::ApiError};

pub const AVATAR_SIZE: u32 = 256;

const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Text fields and file parts of a multipart form body.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, Vec<u8>>,
}

impl MultipartForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// A file part, ignoring the empty part browsers send when nothing was chosen.
    pub fn file(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice).filter(|b| !b.is_empty())
    }
}

async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>, ApiError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|_| ApiError::BadRequest("upload read error".into()))?
    {
        buf.extend_from_slice(&chunk);
        if buf.len() > limit {
            return Err(ApiError::BadRequest("file too large".into()));
        }
    }
    Ok(buf)
}

pub async fn read_multipart(cfg: &Config, mut payload: Multipart) -> Result<MultipartForm, ApiError> {
    let mut form = MultipartForm::default();
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|_| ApiError::BadRequest("invalid multipart".into()))?
    {
        let name = field.name().unwrap_or("").to_string();
        let is_file = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .is_some();
        let data = read_field(&mut field, cfg.max_upload_size).await?;
        if is_file {
            form.files.insert(name, data);
        } else {
            let value = String::from_utf8(data)
                .map_err(|_| ApiError::BadRequest(format!("invalid value for {name}")))?;
            form.fields.insert(name, value);
        }
    }
    Ok(form)
}

/// Rejection of an upload that does not decode as an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidImage;

impl InvalidImage {
    pub fn message(&self) -> &'static str {
        INVALID_IMAGE
    }
}

pub fn check_image(data: &[u8]) -> Result<ImageFormat, InvalidImage> {
    let format = image::guess_format(data).map_err(|_| InvalidImage)?;
    image::load_from_memory_with_format(data, format).map_err(|_| InvalidImage)?;
    Ok(format)
}

fn write_media(cfg: &Config, sub: &str, file_name: &str, data: &[u8]) -> Result<String, ApiError> {
    let dir = Path::new(&cfg.media_dir).join(sub);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    std::fs::write(dir.join(file_name), data)?;
    Ok(format!("{sub}/{file_name}"))
}

/// Saves an already checked post image as-is and returns its media path.
pub fn store_post_image(cfg: &Config, data: &[u8]) -> Result<String, ApiError> {
    let ext = infer::get(data).map(|t| t.extension()).unwrap_or("bin");
    let file_name = format!("{}.{}", uuid::Uuid::new_v4(), ext);
    write_media(cfg, "posts", &file_name, data)
}

/// Shrinks an avatar to fit `AVATAR_SIZE` and stores it as PNG.
pub fn store_avatar(cfg: &Config, data: &[u8]) -> Result<String, ApiError> {
    let img = image::load_from_memory(data).map_err(|_| ApiError::BadRequest("invalid image file".into()))?;
    let resized = img.thumbnail(AVATAR_SIZE, AVATAR_SIZE);

    let mut png_data = Cursor::new(Vec::new());
    resized
        .write_to(&mut png_data, ImageFormat::Png)
        .map_err(|_| ApiError::Internal)?;

    let file_name = format!("{}.png", uuid::Uuid::new_v4());
    write_media(cfg, "avatars", &file_name, &png_data.into_inner())
}

/// Removes a stored file whose database row never made it.
pub fn discard(cfg: &Config, rel: &str) {
    let Some(path) = resolve(cfg, rel) else { return };
    if let Err(e) = std::fs::remove_file(&path) {
        log::warn!("could not remove orphaned media {}: {e}", path.display());
    }
}

/// Resolves a `/media/` request path inside `media_dir`, refusing anything
/// that could climb out of it.
pub fn resolve(cfg: &Config, rel: &str) -> Option<std::path::PathBuf> {
    if rel.is_empty() || rel.starts_with('/') {
        return None;
    }
    if rel.split('/').any(|seg| seg.is_empty() || seg == "." || seg == ".." || seg.contains('\\')) {
        return None;
    }
    Some(Path::new(&cfg.media_dir).join(rel))
}

#[cfg(test)]
pub(crate) fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(w, h));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}
