//! The set of images attached to an analysis request.

use std::{path::Path, sync::Arc};

use cookroom_api::ImageUpload;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::ImageConfig,
    error::{ImageError, ImageResult},
    formats::{is_image_mime, ImageFormat},
    preview::{PreviewHandle, PreviewRegistry},
};

/// Identifier of a live attachment
pub type AttachmentId = Uuid;

/// A file the user picked or dropped.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Arc<[u8]>,
    pub declared_mime: Option<String>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            declared_mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.declared_mime = Some(mime.into());
        self
    }

    /// Read a file from disk, naming it after its last path component.
    pub fn from_path(path: &Path) -> ImageResult<Self> {
        if !path.is_file() {
            return Err(ImageError::InvalidFile(format!(
                "Not a file: {}",
                path.display()
            )));
        }

        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }
}

/// An image attached to the pending request.
#[derive(Debug)]
pub struct Attachment {
    id: AttachmentId,
    file_name: String,
    mime: String,
    format: ImageFormat,
    bytes: Arc<[u8]>,
    preview: PreviewHandle,
}

impl Attachment {
    pub fn id(&self) -> AttachmentId {
        self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }

    /// Request part for this attachment
    pub fn to_upload(&self) -> ImageUpload {
        ImageUpload::new(self.file_name.clone(), self.mime.clone(), self.bytes.clone())
    }
}

/// A file left out of a batch and why
#[derive(Debug)]
pub struct SkippedFile {
    pub name: String,
    pub reason: ImageError,
}

/// Result of an accepted `add` batch
#[derive(Debug, Default)]
pub struct AddOutcome {
    pub admitted: Vec<AttachmentId>,
    pub skipped: Vec<SkippedFile>,
}

/// Owns the attachment list and the preview of every attachment in it.
///
/// Mutation takes `&mut self`, so adds and removes apply in call order.
/// Every preview is released exactly once: on removal, on `clear`, or on
/// teardown/drop, whichever comes first.
#[derive(Debug)]
pub struct AttachmentManager {
    config: ImageConfig,
    registry: PreviewRegistry,
    attachments: Vec<Attachment>,
}

impl AttachmentManager {
    pub fn new(config: ImageConfig, registry: PreviewRegistry) -> Self {
        Self {
            config,
            registry,
            attachments: Vec::new(),
        }
    }

    /// Manager with default limits and a private registry
    pub fn with_defaults() -> Self {
        Self::new(ImageConfig::default(), PreviewRegistry::new())
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    pub fn registry(&self) -> &PreviewRegistry {
        &self.registry
    }

    /// Attach a batch of files.
    ///
    /// Non-image, unsupported and oversized files are skipped and reported.
    /// If the remaining files would exceed the limit the whole batch is
    /// rejected with [`ImageError::LimitExceeded`] and nothing changes.
    pub fn add(&mut self, files: impl IntoIterator<Item = SelectedFile>) -> ImageResult<AddOutcome> {
        let mut outcome = AddOutcome::default();
        let mut accepted = Vec::new();

        for file in files {
            match self.validate(&file) {
                Ok((format, mime)) => accepted.push((file, format, mime)),
                Err(reason) => {
                    debug!(name = %file.name, %reason, "skipping selected file");
                    outcome.skipped.push(SkippedFile {
                        name: file.name,
                        reason,
                    });
                }
            }
        }

        let current = self.attachments.len();
        let max = self.config.max_attachments;
        if current + accepted.len() > max {
            warn!(current, incoming = accepted.len(), max, "attachment limit exceeded");
            return Err(ImageError::LimitExceeded {
                current,
                incoming: accepted.len(),
                max,
            });
        }

        for (file, format, mime) in accepted {
            let preview = self.registry.register(file.bytes.clone(), mime.clone());
            let attachment = Attachment {
                id: Uuid::new_v4(),
                file_name: file.name,
                mime,
                format,
                bytes: file.bytes,
                preview,
            };
            outcome.admitted.push(attachment.id);
            self.attachments.push(attachment);
        }

        if !outcome.admitted.is_empty() {
            info!(
                admitted = outcome.admitted.len(),
                total = self.attachments.len(),
                "attached images"
            );
        }
        Ok(outcome)
    }

    fn validate(&self, file: &SelectedFile) -> ImageResult<(ImageFormat, String)> {
        let format = ImageFormat::classify(&file.name, file.declared_mime.as_deref(), &file.bytes)?;
        if !self.config.is_format_supported(format.as_str()) {
            return Err(ImageError::FormatNotSupported(format.as_str().to_string()));
        }

        let size = file.bytes.len() as u64;
        if size > self.config.max_file_size_bytes() {
            return Err(ImageError::FileTooLarge {
                size_mb: size as f64 / (1024.0 * 1024.0),
                max_mb: self.config.max_file_size_mb,
            });
        }

        let mime = file
            .declared_mime
            .as_deref()
            .filter(|m| is_image_mime(m))
            .map(str::to_string)
            .unwrap_or_else(|| format.mime_type().to_string());
        Ok((format, mime))
    }

    /// Remove one attachment, releasing its preview. Unknown ids are a no-op.
    pub fn remove(&mut self, id: AttachmentId) -> bool {
        let Some(index) = self.attachments.iter().position(|a| a.id == id) else {
            return false;
        };
        let attachment = self.attachments.remove(index);
        self.registry.release(&attachment.preview);
        debug!(%id, "removed attachment");
        true
    }

    /// Remove everything, releasing every preview. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.attachments.len();
        for attachment in self.attachments.drain(..) {
            self.registry.release(&attachment.preview);
        }
        if removed > 0 {
            debug!(removed, "cleared attachments");
        }
        removed
    }

    /// Release all remaining previews when the owning view goes away.
    pub fn teardown(&mut self) {
        self.clear();
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn get(&self, id: AttachmentId) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    /// Slots left before the limit
    pub fn remaining(&self) -> usize {
        self.config.max_attachments.saturating_sub(self.attachments.len())
    }

    /// Request parts in attachment order
    pub fn uploads(&self) -> Vec<ImageUpload> {
        self.attachments.iter().map(Attachment::to_upload).collect()
    }
}

impl Drop for AttachmentManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];

    fn png(name: &str) -> SelectedFile {
        SelectedFile::new(name, PNG.to_vec())
    }

    #[test]
    fn test_add_filters_non_images() {
        let mut manager = AttachmentManager::with_defaults();
        let outcome = manager
            .add(vec![
                png("a.png"),
                SelectedFile::new("notes.txt", b"hello".to_vec()),
                SelectedFile::new("blob", PNG.to_vec()).with_mime("application/octet-stream"),
            ])
            .unwrap();

        assert_eq!(outcome.admitted.len(), 1);
        assert_eq!(outcome.skipped.len(), 2);
        assert_eq!(outcome.skipped[0].name, "notes.txt");
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.registry().live_count(), 1);
    }

    #[test]
    fn test_over_cap_batch_admits_none() {
        let mut manager = AttachmentManager::with_defaults();
        manager.add(vec![png("a.png"), png("b.png")]).unwrap();

        let err = manager.add(vec![png("c.png"), png("d.png")]).unwrap_err();
        assert!(matches!(
            err,
            ImageError::LimitExceeded {
                current: 2,
                incoming: 2,
                max: 3
            }
        ));
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.registry().registered_count(), 2);
    }

    #[test]
    fn test_skipped_files_do_not_count_toward_limit() {
        let mut manager = AttachmentManager::with_defaults();
        manager.add(vec![png("a.png"), png("b.png")]).unwrap();
        let outcome = manager
            .add(vec![png("c.png"), SelectedFile::new("x.pdf", b"%PDF-1.7".to_vec())])
            .unwrap();
        assert_eq!(outcome.admitted.len(), 1);
        assert_eq!(manager.remaining(), 0);
    }

    #[test]
    fn test_oversized_file_is_skipped() {
        let mut manager =
            AttachmentManager::new(ImageConfig::default().with_max_file_size_mb(1), PreviewRegistry::new());
        let mut big = PNG.to_vec();
        big.resize(1024 * 1024 + 1, 0);

        let outcome = manager.add(vec![SelectedFile::new("big.png", big)]).unwrap();
        assert!(outcome.admitted.is_empty());
        assert!(matches!(
            outcome.skipped[0].reason,
            ImageError::FileTooLarge { max_mb: 1, .. }
        ));
    }

    #[test]
    fn test_remove_releases_preview_once() {
        let registry = PreviewRegistry::new();
        let mut manager = AttachmentManager::new(ImageConfig::default(), registry.clone());
        let outcome = manager.add(vec![png("a.png")]).unwrap();
        let id = outcome.admitted[0];
        let preview_id = manager.get(id).unwrap().preview().id();

        assert!(manager.remove(id));
        assert!(!manager.remove(id));
        assert!(!manager.remove(Uuid::new_v4()));
        assert_eq!(registry.release_count_of(preview_id), 1);
    }

    #[test]
    fn test_drop_releases_remaining_previews() {
        let registry = PreviewRegistry::new();
        {
            let mut manager = AttachmentManager::new(ImageConfig::default(), registry.clone());
            manager.add(vec![png("a.png"), png("b.png")]).unwrap();
            assert_eq!(registry.live_count(), 2);
        }
        assert_eq!(registry.live_count(), 0);
        assert!(registry.release_counts().values().all(|&count| count == 1));
    }

    #[test]
    fn test_teardown_then_drop_does_not_double_release() {
        let registry = PreviewRegistry::new();
        let mut manager = AttachmentManager::new(ImageConfig::default(), registry.clone());
        manager.add(vec![png("a.png")]).unwrap();
        manager.teardown();
        drop(manager);
        assert!(registry.release_counts().values().all(|&count| count == 1));
        assert_eq!(registry.extra_release_count(), 0);
    }

    #[test]
    fn test_uploads_keep_order_and_mime() {
        let mut manager = AttachmentManager::with_defaults();
        manager
            .add(vec![
                png("first.png"),
                SelectedFile::new("second", vec![0xff, 0xd8, 0xff, 0xe0]).with_mime("image/jpeg"),
            ])
            .unwrap();

        let uploads = manager.uploads();
        assert_eq!(uploads[0].file_name, "first.png");
        assert_eq!(uploads[0].mime, "image/png");
        assert_eq!(uploads[1].mime, "image/jpeg");
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tomato.png");
        std::fs::write(&path, PNG).unwrap();

        let file = SelectedFile::from_path(&path).unwrap();
        assert_eq!(file.name, "tomato.png");
        assert!(SelectedFile::from_path(dir.path()).is_err());
    }
}
