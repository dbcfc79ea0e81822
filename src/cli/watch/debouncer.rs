use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashSet;
use tola_pack::debug;
use tola_pack::utils::path::normalize_path;

pub(super) const DEBOUNCE_MS: u64 = 300;

/// Pure debouncer: collects changed paths until events stop arriving.
pub(super) struct Debouncer {
    /// Changes under these dirs are ignored (our own output).
    ignored: Vec<PathBuf>,
    pub(super) changes: FxHashSet<PathBuf>,
    pub(super) last_event: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new(ignored: Vec<PathBuf>) -> Self {
        Self {
            ignored,
            changes: FxHashSet::default(),
            last_event: None,
        }
    }

    pub(super) fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;

        match event.kind {
            EventKind::Create(_) | EventKind::Remove(_) => {}
            // Metadata-only changes (mtime/chmod) would loop on our own reads
            EventKind::Modify(notify::event::ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => {}
            _ => return,
        }

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            let path = normalize_path(path);
            if self.ignored.iter().any(|dir| path.starts_with(dir)) {
                continue;
            }
            debug!("watch"; "{:?}: {}", event.kind, path.display());
            self.changes.insert(path);
            self.last_event = Some(Instant::now());
        }
    }

    /// Take the collected paths once the debounce window has passed.
    pub(super) fn take_if_ready(&mut self) -> Option<Vec<PathBuf>> {
        let last_event = self.last_event?;
        if last_event.elapsed() < Duration::from_millis(DEBOUNCE_MS) {
            return None;
        }
        self.last_event = None;

        let mut changes: Vec<_> = self.changes.drain().collect();
        if changes.is_empty() {
            return None;
        }
        changes.sort();
        Some(changes)
    }

    /// Time until the pending batch becomes ready.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };
        Duration::from_millis(DEBOUNCE_MS)
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, EventKind, MetadataKind, ModifyKind};

    fn event(kind: EventKind, path: &str) -> notify::Event {
        notify::Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_collects_and_filters() {
        let mut debouncer = Debouncer::new(vec![PathBuf::from("/app/dist")]);
        debouncer.add_event(&event(EventKind::Create(CreateKind::File), "/app/src/a.js"));
        debouncer.add_event(&event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            "/app/src/a.js",
        ));
        debouncer.add_event(&event(EventKind::Create(CreateKind::File), "/app/dist/main.js"));
        debouncer.add_event(&event(EventKind::Create(CreateKind::File), "/app/src/.a.js.swp"));
        debouncer.add_event(&event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)),
            "/app/src/b.js",
        ));

        assert_eq!(debouncer.changes.len(), 1);
        assert!(debouncer.changes.contains(Path::new("/app/src/a.js")));
    }

    #[test]
    fn test_not_ready_within_window() {
        let mut debouncer = Debouncer::new(Vec::new());
        debouncer.add_event(&event(EventKind::Create(CreateKind::File), "/app/src/a.js"));
        assert!(debouncer.take_if_ready().is_none());
        assert!(debouncer.sleep_duration() <= Duration::from_millis(DEBOUNCE_MS));

        debouncer.last_event = Some(Instant::now() - Duration::from_millis(DEBOUNCE_MS + 1));
        assert_eq!(debouncer.take_if_ready().unwrap(), vec![PathBuf::from("/app/src/a.js")]);
        assert!(debouncer.take_if_ready().is_none());
    }

    #[test]
    fn test_temp_files() {
        assert!(is_temp_file(Path::new("/a/b.swp")));
        assert!(is_temp_file(Path::new("/a/b.js~")));
        assert!(!is_temp_file(Path::new("/a/b.js")));
    }
}
