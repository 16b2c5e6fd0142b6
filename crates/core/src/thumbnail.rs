//! Object-key and content-type rules for idiom thumbnails.

use chrono::Datelike;

use crate::types::Timestamp;

/// Extension used when neither filename nor content type identifies the image.
pub const DEFAULT_EXTENSION: &str = "png";

const KNOWN_EXTENSIONS: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
];

/// Storage key for an idiom's published thumbnail: `YYYY/M/D/{idiom_id}.{ext}`.
///
/// Month and day are not zero-padded.
pub fn thumbnail_key(idiom_id: &str, extension: &str, now: Timestamp) -> String {
    format!(
        "{}/{}/{}/{}.{}",
        now.year(),
        now.month(),
        now.day(),
        idiom_id,
        extension
    )
}

/// Storage key for the single draft slot overwritten by every draft request.
pub fn draft_key(extension: &str) -> String {
    format!("drafts/output.{extension}")
}

/// Lowercased extension of `filename` when it is a known image type.
pub fn extension_from_filename(filename: &str) -> Option<&'static str> {
    let (_, ext) = filename.rsplit_once('.')?;
    KNOWN_EXTENSIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(known, _)| *known)
}

/// Extension for a `Content-Type` header value, ignoring parameters.
pub fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    KNOWN_EXTENSIONS
        .iter()
        .find(|(_, known)| known.eq_ignore_ascii_case(mime))
        .map(|(ext, _)| *ext)
}

pub fn content_type_for_extension(extension: &str) -> &'static str {
    KNOWN_EXTENSIONS
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, mime)| *mime)
        .unwrap_or("application/octet-stream")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn key_uses_unpadded_date_parts() {
        let now = Utc.with_ymd_and_hms(2024, 3, 7, 23, 59, 0).unwrap();
        assert_eq!(thumbnail_key("hit-the-hay", "png", now), "2024/3/7/hit-the-hay.png");
    }

    #[test]
    fn draft_key_is_fixed_per_extension() {
        assert_eq!(draft_key("png"), "drafts/output.png");
    }

    #[test]
    fn extension_from_filename_is_case_insensitive() {
        assert_eq!(extension_from_filename("cover.JPG"), Some("jpg"));
        assert_eq!(extension_from_filename("archive.tar.gz"), None);
        assert_eq!(extension_from_filename("no-extension"), None);
    }

    #[test]
    fn extension_from_content_type_ignores_parameters() {
        assert_eq!(extension_from_content_type("image/png"), Some("png"));
        assert_eq!(extension_from_content_type("image/jpeg; charset=binary"), Some("jpg"));
        assert_eq!(extension_from_content_type("text/html"), None);
    }

    #[test]
    fn content_type_lookup_falls_back_to_octet_stream() {
        assert_eq!(content_type_for_extension("webp"), "image/webp");
        assert_eq!(content_type_for_extension("bmp"), "application/octet-stream");
    }
}
