use crate::error::Result;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Candidate email -> calendar event id. Optionally mirrored to a JSON file so
/// that a meeting created in one run can be cancelled from the next.
#[derive(Debug, Default)]
pub struct EventStore {
    path: Option<PathBuf>,
    events: HashMap<String, String>,
}

impl EventStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the map from `path`; a missing file starts empty.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let events = match fs::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => HashMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(path = %path.display(), events = events.len(), "Loaded scheduled events");
        Ok(Self {
            path: Some(path),
            events,
        })
    }

    pub async fn from_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::open(p).await,
            None => Ok(Self::in_memory()),
        }
    }

    pub fn get(&self, candidate_email: &str) -> Option<&str> {
        self.events.get(candidate_email).map(String::as_str)
    }

    pub async fn record(&mut self, candidate_email: &str, event_id: &str) -> Result<()> {
        self.events
            .insert(candidate_email.to_string(), event_id.to_string());
        self.persist().await
    }

    pub async fn remove(&mut self, candidate_email: &str) -> Result<Option<String>> {
        let removed = self.events.remove(candidate_email);
        if removed.is_some() {
            self.persist().await?;
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    async fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let sorted: BTreeMap<&String, &String> = self.events.iter().collect();
        fs::write(path, serde_json::to_string_pretty(&sorted)?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_round_trips_without_files() {
        let mut store = EventStore::in_memory();
        store.record("a@x.com", "evt-1").await.unwrap();
        assert_eq!(store.get("a@x.com"), Some("evt-1"));
        assert_eq!(store.remove("a@x.com").await.unwrap().as_deref(), Some("evt-1"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn persisted_store_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("events.json");

        let mut store = EventStore::open(&path).await.unwrap();
        store.record("a@x.com", "evt-1").await.unwrap();
        store.record("b@x.com", "evt-2").await.unwrap();
        store.remove("a@x.com").await.unwrap();

        let reloaded = EventStore::open(&path).await.unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get("b@x.com"), Some("evt-2"));
        assert_eq!(reloaded.get("a@x.com"), None);
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        tokio::fs::write(&path, "not json").await.unwrap();
        assert!(EventStore::open(&path).await.is_err());
    }
}
