//! Transient preview resources for attached images.
//!
//! Each attachment gets a `preview://<uuid>` handle the UI can resolve to the
//! image bytes without re-reading the file. Handles are released explicitly;
//! the registry keeps release counts for the most recent releases plus running
//! totals, so leaks and double releases can be audited in long sessions.

use std::{
    collections::{HashMap, VecDeque},
    fmt,
    sync::Arc,
};

use base64::{engine::general_purpose::STANDARD, Engine};
use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// URI scheme used for preview handles
pub const PREVIEW_SCHEME: &str = "preview://";

/// Released handles whose individual counts are retained
pub const RELEASE_AUDIT_CAPACITY: usize = 1024;

/// Opaque reference to a registered preview.
///
/// Not `Clone`: the attachment that created it is its only owner.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct PreviewHandle {
    id: Uuid,
}

impl PreviewHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// `preview://<uuid>`
    pub fn uri(&self) -> String {
        format!("{PREVIEW_SCHEME}{}", self.id)
    }
}

impl fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREVIEW_SCHEME}{}", self.id)
    }
}

/// Displayable preview content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewData {
    pub mime: String,
    pub bytes: Arc<[u8]>,
}

impl PreviewData {
    /// Inline `data:` URI for rendering
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

#[derive(Default)]
struct RegistryState {
    live: HashMap<Uuid, PreviewData>,
    /// Release counts of recently released handles, oldest first in `order`
    releases: HashMap<Uuid, u32>,
    order: VecDeque<Uuid>,
    registered: usize,
    extra_releases: usize,
}

impl RegistryState {
    fn record_release(&mut self, id: Uuid) -> u32 {
        let count = match self.releases.get_mut(&id) {
            Some(count) => {
                *count += 1;
                *count
            }
            None => {
                // Evicted handles were released before, so a repeat counts as the second
                let count = if self.live.contains_key(&id) { 1 } else { 2 };
                self.releases.insert(id, count);
                self.order.push_back(id);
                count
            }
        };
        while self.order.len() > RELEASE_AUDIT_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.releases.remove(&oldest);
            }
        }
        count
    }
}

/// Shared registry of live previews.
///
/// Cloning yields another view of the same registry.
#[derive(Clone, Default)]
pub struct PreviewRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl fmt::Debug for PreviewRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("PreviewRegistry")
            .field("live", &state.live.len())
            .field("registered", &state.registered)
            .field("extra_releases", &state.extra_releases)
            .finish()
    }
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register image bytes and hand back the owning handle
    pub fn register(&self, bytes: Arc<[u8]>, mime: impl Into<String>) -> PreviewHandle {
        let id = Uuid::new_v4();
        let mut state = self.state.lock();
        state.live.insert(
            id,
            PreviewData {
                mime: mime.into(),
                bytes,
            },
        );
        state.registered += 1;
        debug!(%id, "registered preview");
        PreviewHandle { id }
    }

    /// Content for a live handle; `None` once released
    pub fn resolve(&self, handle: &PreviewHandle) -> Option<PreviewData> {
        self.state.lock().live.get(&handle.id).cloned()
    }

    /// Content for a `preview://` URI
    pub fn resolve_uri(&self, uri: &str) -> Option<PreviewData> {
        let id = uri
            .strip_prefix(PREVIEW_SCHEME)
            .and_then(|raw| Uuid::parse_str(raw).ok())?;
        self.state.lock().live.get(&id).cloned()
    }

    /// Release a preview. Returns `true` only the first time.
    pub fn release(&self, handle: &PreviewHandle) -> bool {
        let mut state = self.state.lock();
        let count = state.record_release(handle.id);
        let released = state.live.remove(&handle.id).is_some();
        if released {
            debug!(id = %handle.id, "released preview");
        } else {
            state.extra_releases += 1;
            warn!(id = %handle.id, count, "preview released more than once");
        }
        released
    }

    /// How many times the handle has been released
    pub fn release_count(&self, handle: &PreviewHandle) -> u32 {
        self.release_count_of(handle.id)
    }

    /// Release count of a live or recently released handle; `0` once it
    /// has aged out of the audit window
    pub fn release_count_of(&self, id: Uuid) -> u32 {
        self.state.lock().releases.get(&id).copied().unwrap_or(0)
    }

    /// Release counts of live handles (zero) and of the most recent releases
    pub fn release_counts(&self) -> HashMap<Uuid, u32> {
        let state = self.state.lock();
        let mut counts = state.releases.clone();
        for id in state.live.keys() {
            counts.entry(*id).or_insert(0);
        }
        counts
    }

    /// Releases beyond the first, over the registry's whole life
    pub fn extra_release_count(&self) -> usize {
        self.state.lock().extra_releases
    }

    /// Number of previews still held
    pub fn live_count(&self) -> usize {
        self.state.lock().live.len()
    }

    /// Number of previews ever registered
    pub fn registered_count(&self) -> usize {
        self.state.lock().registered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes() -> Arc<[u8]> {
        Arc::from(&b"\x89PNG-data"[..])
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = PreviewRegistry::new();
        let handle = registry.register(bytes(), "image/png");

        assert!(handle.uri().starts_with("preview://"));
        assert_eq!(handle.to_string(), handle.uri());

        let data = registry.resolve(&handle).unwrap();
        assert_eq!(data.mime, "image/png");
        assert_eq!(registry.resolve_uri(&handle.uri()), Some(data));
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_release_is_idempotent_and_counted() {
        let registry = PreviewRegistry::new();
        let handle = registry.register(bytes(), "image/png");

        assert!(registry.release(&handle));
        assert!(!registry.release(&handle));
        assert_eq!(registry.release_count(&handle), 2);
        assert_eq!(registry.extra_release_count(), 1);
        assert!(registry.resolve(&handle).is_none());
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.registered_count(), 1);
    }

    #[test]
    fn test_release_audit_is_bounded() {
        let registry = PreviewRegistry::new();
        let total = RELEASE_AUDIT_CAPACITY + 10;
        let handles: Vec<PreviewHandle> = (0..total)
            .map(|_| registry.register(bytes(), "image/png"))
            .collect();
        for handle in &handles {
            assert!(registry.release(handle));
        }

        assert_eq!(registry.registered_count(), total);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.release_counts().len(), RELEASE_AUDIT_CAPACITY);
        assert_eq!(registry.release_count(&handles[0]), 0);
        assert_eq!(registry.release_count(&handles[total - 1]), 1);
        assert_eq!(registry.extra_release_count(), 0);

        // A repeat on an aged-out handle is still caught
        assert!(!registry.release(&handles[0]));
        assert_eq!(registry.release_count(&handles[0]), 2);
        assert_eq!(registry.extra_release_count(), 1);
        assert_eq!(registry.release_counts().len(), RELEASE_AUDIT_CAPACITY);
    }

    #[test]
    fn test_resolve_uri_rejects_garbage() {
        let registry = PreviewRegistry::new();
        assert!(registry.resolve_uri("preview://not-a-uuid").is_none());
        assert!(registry.resolve_uri("blob:abc").is_none());
    }

    #[test]
    fn test_data_uri() {
        let data = PreviewData {
            mime: "image/gif".to_string(),
            bytes: Arc::from(&b"GIF"[..]),
        };
        assert_eq!(data.data_uri(), "data:image/gif;base64,R0lG");
    }

    #[test]
    fn test_clones_share_state() {
        let registry = PreviewRegistry::new();
        let view = registry.clone();
        let handle = registry.register(bytes(), "image/png");
        assert!(view.release(&handle));
        assert_eq!(registry.live_count(), 0);
    }
}
