use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upload size cap (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDto {
    pub id: i64,
    pub path: String,
    pub ext: String,
    pub post_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl MediaDto {
    /// Path under the API base where the file is served.
    pub fn url_path(&self) -> String {
        format!("/api/images/{}.{}", self.id, self.ext)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Png,
    Gif,
    Jpeg,
    Webp,
    Svg,
}

impl MediaKind {
    pub const ALL: [MediaKind; 5] = [
        MediaKind::Png,
        MediaKind::Gif,
        MediaKind::Jpeg,
        MediaKind::Webp,
        MediaKind::Svg,
    ];

    pub fn ext(&self) -> &'static str {
        match self {
            MediaKind::Png => "png",
            MediaKind::Gif => "gif",
            MediaKind::Jpeg => "jpeg",
            MediaKind::Webp => "webp",
            MediaKind::Svg => "svg",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            MediaKind::Png => "image/png",
            MediaKind::Gif => "image/gif",
            MediaKind::Jpeg => "image/jpeg",
            MediaKind::Webp => "image/webp",
            MediaKind::Svg => "image/svg+xml",
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.mime() == mime)
    }

    /// Accepts `jpg` as an alias of `jpeg`.
    pub fn from_ext(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        if ext == "jpg" {
            return Some(MediaKind::Jpeg);
        }
        Self::ALL.into_iter().find(|k| k.ext() == ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_through_ext_and_mime() {
        for kind in MediaKind::ALL {
            assert_eq!(MediaKind::from_ext(kind.ext()), Some(kind));
            assert_eq!(MediaKind::from_mime(kind.mime()), Some(kind));
        }
        assert_eq!(MediaKind::from_ext("JPG"), Some(MediaKind::Jpeg));
        assert_eq!(MediaKind::from_ext("bmp"), None);
    }
}
