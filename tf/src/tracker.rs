//! Template change tracking

use std::path::Path;
use tracing::debug;

const TEMPLATE_EXTENSION: &str = "tt";

/// Remembers whether any template source changed since the last fix pass
#[derive(Debug, Clone, Default)]
pub struct ChangeTracker {
    dirty: bool,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark dirty if any of `paths` is a template; returns whether it did
    pub fn mark_changed<P: AsRef<Path>>(&mut self, paths: &[P]) -> bool {
        let templates = paths.iter().filter(|p| is_template(p.as_ref())).count();
        debug!(total = paths.len(), templates, "ChangeTracker::mark_changed: called");
        if templates > 0 {
            self.dirty = true;
        }
        templates > 0
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read and clear the flag
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

/// Whether `path` names a template source
pub fn is_template(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == TEMPLATE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_clean() {
        assert!(!ChangeTracker::new().is_dirty());
    }

    #[test]
    fn test_template_marks_dirty() {
        let mut tracker = ChangeTracker::new();
        assert!(tracker.mark_changed(&["Assets/Scripts/Player.cs", "Assets/Gen/Enums.tt"]));
        assert!(tracker.is_dirty());
    }

    #[test]
    fn test_other_files_leave_clean() {
        let mut tracker = ChangeTracker::new();
        assert!(!tracker.mark_changed(&["Assets/Player.cs", "Assets/notes.ttx", "Assets/TT"]));
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn test_take_clears() {
        let mut tracker = ChangeTracker::new();
        tracker.mark_changed(&["Foo.tt"]);

        assert!(tracker.take());
        assert!(!tracker.take());
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn test_non_template_does_not_clear() {
        let mut tracker = ChangeTracker::new();
        tracker.mark_changed(&["Foo.tt"]);
        tracker.mark_changed(&["Foo.cs"]);
        assert!(tracker.is_dirty());
    }
}
