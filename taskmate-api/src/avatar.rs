/// Avatar image pipeline
///
/// Uploads are screened at the transport boundary (file-extension
/// allow-list, size cap) and then normalized: decoded, resized to the
/// canonical 250x250, and re-encoded as PNG. Only the canonical form is
/// ever stored, so the fetch endpoint can promise a single content type.
use image::{imageops::FilterType, ImageFormat};
use std::io::Cursor;

/// Canonical avatar edge length in pixels
pub const AVATAR_DIMENSION: u32 = 250;

/// Maximum accepted upload size in bytes (1 MB)
pub const MAX_AVATAR_BYTES: usize = 1_000_000;

/// Extensions accepted at the transport boundary
const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Error type for avatar processing
///
/// Everything except `Encode` is the uploader's fault and maps to a 400.
#[derive(Debug, thiserror::Error)]
pub enum AvatarError {
    /// Filename missing or its extension outside the allow-list
    #[error("Please upload a .jpg, .jpeg or .png image")]
    UnsupportedExtension,

    /// Upload larger than [`MAX_AVATAR_BYTES`]
    #[error("Image must be smaller than {MAX_AVATAR_BYTES} bytes")]
    TooLarge(usize),

    /// Bytes did not decode as an image
    #[error("Could not decode image: {0}")]
    Decode(image::ImageError),

    /// Re-encoding to PNG failed
    #[error("Could not encode image: {0}")]
    Encode(image::ImageError),
}

/// Checks an uploaded filename against the extension allow-list
///
/// Case-insensitive; a missing extension fails.
pub fn allowed_extension(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Normalizes an uploaded image to the canonical stored form
///
/// Decodes, resizes to 250x250, and re-encodes as PNG. The size cap is
/// enforced here as well so callers cannot forget it.
///
/// # Errors
///
/// [`AvatarError::TooLarge`] or [`AvatarError::Decode`] for bad uploads,
/// [`AvatarError::Encode`] if PNG encoding fails.
pub fn normalize(bytes: &[u8]) -> Result<Vec<u8>, AvatarError> {
    if bytes.len() > MAX_AVATAR_BYTES {
        return Err(AvatarError::TooLarge(bytes.len()));
    }

    let decoded = image::load_from_memory(bytes).map_err(AvatarError::Decode)?;

    let resized = decoded.resize_exact(AVATAR_DIMENSION, AVATAR_DIMENSION, FilterType::Lanczos3);

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, ImageFormat::Png)
        .map_err(AvatarError::Encode)?;

    Ok(out.into_inner())
}
