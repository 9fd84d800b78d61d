use crate::error::Result;
use crate::models::chat_turn::ChatTurn;
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;
use tokio::fs;

const FILE_PREFIX: &str = "all_chat_history_sr_";
const SEPARATOR_WIDTH: usize = 40;

fn digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid regex"))
}

/// Writes session transcripts as numbered flat files.
#[derive(Clone, Debug)]
pub struct HistoryService {
    dir: PathBuf,
}

impl HistoryService {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// One more than the largest trailing number among existing `.txt` logs.
    pub async fn next_serial(&self) -> Result<u64> {
        let mut max_seen = 0u64;
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(1),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.ends_with(".txt") {
                continue;
            }
            if let Some(n) = digits_re()
                .find_iter(name)
                .last()
                .and_then(|m| m.as_str().parse::<u64>().ok())
            {
                max_seen = max_seen.max(n);
            }
        }

        Ok(max_seen + 1)
    }

    pub fn render(serial: u64, history: &[ChatTurn]) -> String {
        let mut out = format!("Serial Number: {}\n\n", serial);
        let separator = "-".repeat(SEPARATOR_WIDTH);
        for turn in history {
            out.push_str(&format!(
                "User: {}\nBot: {}\n\n{}\n\n",
                turn.user, turn.bot, separator
            ));
        }
        out
    }

    pub async fn save(&self, history: &[ChatTurn]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;
        let serial = self.next_serial().await?;
        let path = self.dir.join(format!("{}{}.txt", FILE_PREFIX, serial));
        fs::write(&path, Self::render(serial, history)).await?;
        tracing::info!(path = %path.display(), turns = history.len(), "Chat history saved");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_matches_log_layout() {
        let text = HistoryService::render(3, &[ChatTurn::new("hi", "hello")]);
        assert_eq!(
            text,
            format!("Serial Number: 3\n\nUser: hi\nBot: hello\n\n{}\n\n", "-".repeat(40))
        );
    }

    #[tokio::test]
    async fn serial_starts_at_one_for_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let service = HistoryService::new(dir.path().join("nope"));
        assert_eq!(service.next_serial().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn serial_follows_largest_existing_number() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "all_chat_history_sr_2.txt",
            "all_chat_history_sr_11.txt",
            "notes_99.md",
            "readme.txt",
        ] {
            tokio::fs::write(dir.path().join(name), "").await.unwrap();
        }
        let service = HistoryService::new(dir.path());
        assert_eq!(service.next_serial().await.unwrap(), 12);

        let path = service.save(&[ChatTurn::new("a", "b")]).await.unwrap();
        assert!(path.ends_with("all_chat_history_sr_12.txt"));
        let saved = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(saved.starts_with("Serial Number: 12\n\nUser: a\nBot: b\n"));
    }
}
