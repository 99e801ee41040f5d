use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::Result;

/// Whole-document storage: load everything, save everything.
///
/// Keeping the unit of persistence at the full document makes the
/// read-modify-write discipline of the callers enforceable and lets tests
/// swap in [`MemoryStore`].
pub trait DocumentStore: Send {
    /// `None` means the document has never been created.
    fn load(&self) -> Result<Option<String>>;

    fn save(&self, contents: &str) -> Result<()>;
}

/// File-backed store. Saves write a sibling temp file and rename it over
/// the target, so readers never observe a partially written document.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DocumentStore for JsonFileStore {
    fn load(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, contents: &str) -> Result<()> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-process store for tests and dry wiring.
#[derive(Default)]
pub struct MemoryStore {
    doc: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: &str) -> Self {
        Self {
            doc: Mutex::new(Some(contents.to_string())),
        }
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.doc.lock().unwrap().clone())
    }

    fn save(&self, contents: &str) -> Result<()> {
        *self.doc.lock().unwrap() = Some(contents.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("channels.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load_round_trips_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channels.json");
        let store = JsonFileStore::new(&path);

        store.save("{\"1\": {\"server_name\": \"Café Pépito\"}}").unwrap();

        assert_eq!(
            store.load().unwrap().as_deref(),
            Some("{\"1\": {\"server_name\": \"Café Pépito\"}}")
        );
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("channels.json")]);
    }

    #[test]
    fn save_replaces_previous_contents() {
        let store = MemoryStore::new();
        store.save("first").unwrap();
        store.save("second").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("second"));
    }
}
