use super::page_bounds;
use crate::data::{MediaRepository, PostRepository};
use crate::domain::media::NewMedia;
use crate::domain::{Actor, DomainError};
use crate::infrastructure::media_store::MediaStore;
use quill_contract::{MediaDto, MediaKind, Page, PageCursor, Role, MAX_UPLOAD_BYTES};
use std::sync::Arc;

pub struct MediaService {
    media_repo: Arc<dyn MediaRepository + Send + Sync>,
    post_repo: Arc<dyn PostRepository + Send + Sync>,
    store: Arc<dyn MediaStore>,
}

/// Stored bytes with the content type they are served as.
pub struct MediaFile {
    pub bytes: Vec<u8>,
    pub kind: MediaKind,
}

impl MediaService {
    pub fn new(
        media_repo: Arc<dyn MediaRepository + Send + Sync>,
        post_repo: Arc<dyn PostRepository + Send + Sync>,
        store: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            media_repo,
            post_repo,
            store,
        }
    }

    pub async fn upload(
        &self,
        actor: &Actor,
        bytes: Vec<u8>,
        post_id: Option<i64>,
    ) -> Result<MediaDto, DomainError> {
        actor.require(Role::Admin)?;
        if bytes.is_empty() {
            return Err(DomainError::ValidationError("file is empty".to_string()));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(DomainError::PayloadTooLarge(MAX_UPLOAD_BYTES));
        }
        let kind = detect_kind(&bytes)?;
        if let Some(post_id) = post_id {
            self.post_repo.find_by_id(post_id).await?;
        }

        let name = format!("{}.{}", uuid::Uuid::new_v4(), kind.ext());
        self.store.save(&name, &bytes).await?;

        let created = self
            .media_repo
            .create(NewMedia {
                path: name.clone(),
                ext: kind.ext().to_string(),
                post_id,
            })
            .await;
        let media = match created {
            Ok(media) => media,
            Err(e) => {
                // the row is the only reference to the file
                if let Err(cleanup) = self.store.delete(&name).await {
                    tracing::error!("Orphaned upload {}: {}", name, cleanup);
                }
                return Err(e);
            }
        };

        tracing::info!(
            "Media uploaded: id={}, kind={}, size={}, by user_id={}",
            media.id,
            kind.ext(),
            bytes.len(),
            actor.id
        );

        Ok(MediaDto::from(media))
    }

    pub async fn list(&self, cursor: PageCursor) -> Result<Page<MediaDto>, DomainError> {
        let (limit, offset) = page_bounds(cursor)?;
        let (media, total) = self.media_repo.list(limit, offset).await?;
        Ok(Page::new(media.into_iter().map(MediaDto::from).collect(), total))
    }

    pub async fn get(&self, id: i64) -> Result<MediaDto, DomainError> {
        let media = self.media_repo.find_by_id(id).await?;
        Ok(MediaDto::from(media))
    }

    /// Looks up `{id}.{ext}`; an extension that does not match the stored
    /// kind is treated as a missing file.
    pub async fn open(&self, id: i64, ext: &str) -> Result<MediaFile, DomainError> {
        let media = self.media_repo.find_by_id(id).await?;
        let kind = MediaKind::from_ext(&media.ext).ok_or_else(|| {
            DomainError::InternalError(format!("stored media {} has unknown ext", id))
        })?;
        if MediaKind::from_ext(ext) != Some(kind) {
            return Err(DomainError::MediaNotFound);
        }

        let bytes = self.store.load(&media.path).await?;
        Ok(MediaFile { bytes, kind })
    }
}

/// Sniffs the upload. Raster formats come from magic bytes, SVG from its
/// opening tag since it is plain text.
pub(crate) fn detect_kind(bytes: &[u8]) -> Result<MediaKind, DomainError> {
    if let Some(kind) = infer::get(bytes).and_then(|t| MediaKind::from_mime(t.mime_type())) {
        return Ok(kind);
    }
    if looks_like_svg(bytes) {
        return Ok(MediaKind::Svg);
    }

    let detected = infer::get(bytes)
        .map(|t| t.mime_type().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());
    tracing::warn!("Rejected upload of type {}", detected);
    Err(DomainError::UnsupportedMedia(detected))
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    let Ok(text) = std::str::from_utf8(head) else {
        // a multi-byte char may straddle the cut
        return std::str::from_utf8(&head[..head.len().saturating_sub(3)])
            .map(svg_prologue)
            .unwrap_or(false);
    };
    svg_prologue(text)
}

fn svg_prologue(text: &str) -> bool {
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryStore;
    use crate::domain::media::Media;
    use crate::infrastructure::media_store::FsMediaStore;
    use async_trait::async_trait;

    const PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, 0x49, 0x48, 0x44, 0x52,
    ];
    const ADMIN: Actor = Actor {
        id: 1,
        role: Role::Admin,
    };

    async fn service(dir: &tempfile::TempDir) -> MediaService {
        let store = Arc::new(InMemoryStore::new());
        let files = Arc::new(FsMediaStore::new(dir.path()).await.unwrap());
        MediaService::new(store.clone(), store, files)
    }

    #[test]
    fn detects_allowed_kinds() {
        assert_eq!(detect_kind(PNG).unwrap(), MediaKind::Png);
        assert_eq!(
            detect_kind(b"<?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\"/>")
                .unwrap(),
            MediaKind::Svg
        );
        assert_eq!(detect_kind(b"  <svg></svg>").unwrap(), MediaKind::Svg);
        assert!(matches!(
            detect_kind(b"%PDF-1.4 not an image"),
            Err(DomainError::UnsupportedMedia(_))
        ));
    }

    #[tokio::test]
    async fn upload_then_open_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir).await;

        let media = svc.upload(&ADMIN, PNG.to_vec(), None).await.unwrap();
        assert_eq!(media.ext, "png");
        assert!(media.path.ends_with(".png"));

        let file = svc.open(media.id, "png").await.unwrap();
        assert_eq!(file.bytes, PNG);
        assert_eq!(file.kind.mime(), "image/png");
        assert!(matches!(
            svc.open(media.id, "gif").await,
            Err(DomainError::MediaNotFound)
        ));
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir).await;

        let mut big = PNG.to_vec();
        big.resize(MAX_UPLOAD_BYTES + 1, 0);
        let err = svc.upload(&ADMIN, big, None).await.unwrap_err();
        assert_eq!(err.to_status_code(), 413);
    }

    /// Media table that refuses every insert.
    struct BrokenMediaRepo;

    #[async_trait]
    impl MediaRepository for BrokenMediaRepo {
        async fn create(&self, _media: NewMedia) -> Result<Media, DomainError> {
            Err(DomainError::InternalError("insert failed".to_string()))
        }

        async fn find_by_id(&self, _id: i64) -> Result<Media, DomainError> {
            Err(DomainError::MediaNotFound)
        }

        async fn list(&self, _limit: i64, _offset: i64) -> Result<(Vec<Media>, i64), DomainError> {
            Ok((Vec::new(), 0))
        }
    }

    #[tokio::test]
    async fn failed_insert_leaves_no_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let posts = Arc::new(InMemoryStore::new());
        let files = Arc::new(FsMediaStore::new(dir.path()).await.unwrap());
        let svc = MediaService::new(Arc::new(BrokenMediaRepo), posts, files);

        let err = svc.upload(&ADMIN, PNG.to_vec(), None).await.unwrap_err();
        assert_eq!(err.to_status_code(), 500);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
