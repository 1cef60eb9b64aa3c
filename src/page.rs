//! Page regions and the application mount point.
//!
//! The page exposes named regions addressed by a CSS-style selector. The
//! shell takes the mount point out of the page at bootstrap, so the
//! application instance owns it exclusively for its lifetime.

use std::collections::HashMap;

/// Selector for the region the application mounts into.
pub const MOUNT_SELECTOR: &str = "main#app";

/// A single region the application renders into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
    selector: String,
}

impl MountPoint {
    pub fn selector(&self) -> &str {
        &self.selector
    }
}

/// The set of mountable regions present on the current page.
#[derive(Debug, Default)]
pub struct Page {
    regions: HashMap<String, MountPoint>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// A page with one region already present.
    pub fn with_mount(selector: &str) -> Self {
        let mut page = Self::new();
        page.add_region(selector);
        page
    }

    pub fn add_region(&mut self, selector: &str) {
        self.regions.insert(
            selector.to_string(),
            MountPoint {
                selector: selector.to_string(),
            },
        );
    }

    /// Remove and return the region matching `selector`, transferring
    /// ownership to the caller.
    pub fn take_mount(&mut self, selector: &str) -> Option<MountPoint> {
        self.regions.remove(selector)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_mount_found() {
        let mut page = Page::with_mount(MOUNT_SELECTOR);
        let mount = page.take_mount(MOUNT_SELECTOR).unwrap();
        assert_eq!(mount.selector(), MOUNT_SELECTOR);
    }

    #[test]
    fn test_take_mount_is_exclusive() {
        let mut page = Page::with_mount(MOUNT_SELECTOR);
        assert!(page.take_mount(MOUNT_SELECTOR).is_some());
        assert!(page.take_mount(MOUNT_SELECTOR).is_none());
    }

    #[test]
    fn test_take_mount_missing_selector() {
        let mut page = Page::new();
        assert!(page.take_mount(MOUNT_SELECTOR).is_none());
    }
}
