use std::sync::{Arc, PoisonError, RwLock};

use crate::{element::Element, error::MpdResult, patch::Patch, tree::Manifest};

/// The current manifest of a live session.
///
/// Readers take a [`snapshot`](Self::snapshot) and work on it for as long as they like.
/// A refresh builds a complete new manifest first and only then swaps it in, so a reader
/// never sees a half-updated tree.
#[derive(Debug)]
pub struct ManifestHandle {
    current: RwLock<Arc<Manifest>>,
}

impl ManifestHandle {
    pub fn new(manifest: Manifest) -> Self {
        Self {
            current: RwLock::new(Arc::new(manifest)),
        }
    }

    pub fn snapshot(&self) -> Arc<Manifest> {
        // the lock only guards a pointer swap, which can not leave it half-written
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swaps in `manifest` and returns the one it replaces.
    pub fn replace(&self, manifest: Manifest) -> Arc<Manifest> {
        let manifest = Arc::new(manifest);
        let previous = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *current, manifest.clone())
        };
        log_installed(&manifest);
        previous
    }

    /// Builds a manifest from a freshly fetched document and swaps it in. On error the
    /// current manifest stays.
    ///
    /// Returns the manifest this call installed, even if another writer has replaced it
    /// since.
    pub fn refresh(&self, element: &Element) -> MpdResult<Arc<Manifest>> {
        let manifest = Arc::new(Manifest::build(element)?);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = manifest.clone();
        log_installed(&manifest);
        Ok(manifest)
    }

    /// Applies `patch` to a copy of the current manifest and swaps the result in.
    ///
    /// The write lock is held from reading the current manifest to installing the
    /// patched one, so concurrent patches apply one after the other and none is lost.
    /// Snapshot readers wait for the swap meanwhile.
    pub fn apply_patch(&self, patch: &Patch) -> MpdResult<Arc<Manifest>> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut manifest = Manifest::clone(&current);
        patch.apply(&mut manifest)?;
        let manifest = Arc::new(manifest);
        *current = manifest.clone();
        drop(current);

        log_installed(&manifest);
        Ok(manifest)
    }
}

fn log_installed(manifest: &Manifest) {
    tracing::info!(
        id = ?manifest.id,
        publish_time = ?manifest.publish_time.as_ref().map(ToString::to_string),
        periods = manifest.periods.len(),
        "Manifest refreshed"
    );
}

impl From<Manifest> for ManifestHandle {
    fn from(manifest: Manifest) -> Self {
        Self::new(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(id: &str) -> Element {
        Element::new("MPD")
            .with_attribute("id", id)
            .with_attribute("profiles", "urn:mpeg:dash:profile:isoff-live:2011")
            .with_attribute("minBufferTime", "PT2S")
            .with_child(Element::new("Period").with_attribute("id", "p0"))
    }

    #[test]
    fn test_snapshot_survives_refresh() {
        let handle = ManifestHandle::new(Manifest::build(&element("first")).unwrap());
        let before = handle.snapshot();

        let installed = handle.refresh(&element("second")).unwrap();
        assert!(Arc::ptr_eq(&installed, &handle.snapshot()));
        assert_eq!(before.id.as_deref(), Some("first"));
        assert_eq!(handle.snapshot().id.as_deref(), Some("second"));

        // a refresh that fails to build keeps the current manifest
        assert!(handle.refresh(&Element::new("MPD")).is_err());
        assert_eq!(handle.snapshot().id.as_deref(), Some("second"));
    }
}
