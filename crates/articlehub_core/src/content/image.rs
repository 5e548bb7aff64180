//! Image acquisition for the editor's insert-image flow.
//!
//! # Responsibility
//! - Accept a direct URL as-is, or validate a locally picked file.
//! - Convert accepted files to an embeddable `data:` URL.
//!
//! # Invariants
//! - Files must declare an `image/*` MIME type and be at most 5 MiB.
//! - Drag-and-drop and click-to-browse share the same validation path.
//! - URLs are not checked for reachability.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Upper bound for embedded image files.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// File handed over by a picker or a drop target.
#[derive(Clone, PartialEq, Eq)]
pub struct PickedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for PickedFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickedFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// How files reached the editor. Both origins are validated identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOrigin {
    Browse,
    Drop,
}

/// Image source chosen in the insert-image dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    Url(String),
    File(PickedFile),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    EmptyUrl,
    NoFile,
    NotAnImage(String),
    TooLarge { size: usize, limit: usize },
}

impl Display for ImageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "image URL must not be blank"),
            Self::NoFile => write!(f, "no file was selected"),
            Self::NotAnImage(mime) => {
                write!(f, "please select an image file (got `{mime}`)")
            }
            Self::TooLarge { size, limit } => write!(
                f,
                "image size should be less than 5MB ({size} bytes exceeds {limit})"
            ),
        }
    }
}

impl Error for ImageError {}

/// Resolves an image input into a resource reference for insertion.
pub fn acquire_image(input: ImageInput) -> Result<String, ImageError> {
    match input {
        ImageInput::Url(url) => accept_url(&url),
        ImageInput::File(file) => accept_file(&file),
    }
}

/// Trims and returns the URL unchanged otherwise.
pub fn accept_url(url: &str) -> Result<String, ImageError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ImageError::EmptyUrl);
    }
    Ok(trimmed.to_string())
}

/// Takes the first of the picked files; extra files are ignored.
pub fn accept_picked(files: Vec<PickedFile>, origin: PickOrigin) -> Result<String, ImageError> {
    let file = files.into_iter().next().ok_or(ImageError::NoFile)?;
    log::debug!(
        "event=image_pick module=content origin={:?} mime={} size={}",
        origin,
        file.mime_type,
        file.bytes.len()
    );
    accept_file(&file)
}

/// Validates one file and encodes it as a data URL.
pub fn accept_file(file: &PickedFile) -> Result<String, ImageError> {
    let mime = file.mime_type.trim().to_ascii_lowercase();
    if !mime.starts_with("image/") {
        return Err(ImageError::NotAnImage(file.mime_type.clone()));
    }
    if file.bytes.len() > MAX_IMAGE_BYTES {
        return Err(ImageError::TooLarge {
            size: file.bytes.len(),
            limit: MAX_IMAGE_BYTES,
        });
    }
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(&file.bytes)))
}

/// Best-effort MIME type from a file extension.
pub fn mime_from_extension(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::{accept_file, accept_url, mime_from_extension, ImageError, PickedFile};

    #[test]
    fn url_is_trimmed_and_kept() {
        assert_eq!(
            accept_url("  https://img.example/x.png ").unwrap(),
            "https://img.example/x.png"
        );
        assert_eq!(accept_url("   "), Err(ImageError::EmptyUrl));
    }

    #[test]
    fn small_png_becomes_data_url() {
        let file = PickedFile {
            name: "dot.png".to_string(),
            mime_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        };
        assert_eq!(accept_file(&file).unwrap(), "data:image/png;base64,AQID");
    }

    #[test]
    fn mime_lookup_falls_back_to_octet_stream() {
        assert_eq!(mime_from_extension("a.JPG"), "image/jpeg");
        assert_eq!(mime_from_extension("notes.txt"), "application/octet-stream");
        assert_eq!(mime_from_extension("noext"), "application/octet-stream");
    }
}
