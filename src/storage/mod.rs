//! Project-level storage for kickoff logs
//!
//! Layout:
//! ```text
//! .product-design/
//! └── kickoffs/
//!     ├── <run_id>.json
//!     └── latest.json
//! ```

use crate::crew::{CrewError, CrewOutput};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const KICKOFFS_DIR: &str = "kickoffs";
const LATEST_FILE: &str = "latest.json";

pub struct CrewStorage {
    root: PathBuf,
}

impl CrewStorage {
    /// Open (and create if needed) the storage directory
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join(KICKOFFS_DIR))
            .with_context(|| format!("Failed to create {}", root.display()))?;
        Ok(Self { root })
    }

    fn kickoffs_dir(&self) -> PathBuf {
        self.root.join(KICKOFFS_DIR)
    }

    /// Save a kickoff log and mark it as the latest one
    pub fn save_kickoff(&self, output: &CrewOutput) -> Result<PathBuf> {
        let content = serde_json::to_string_pretty(output)?;
        let path = self.kickoffs_dir().join(format!("{}.json", output.run_id));
        std::fs::write(&path, &content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        std::fs::write(self.kickoffs_dir().join(LATEST_FILE), &content)?;
        tracing::debug!("Saved kickoff log to {}", path.display());
        Ok(path)
    }

    /// Load the most recent kickoff log, if any run was saved
    pub fn load_latest_kickoff(&self) -> Result<Option<CrewOutput>> {
        let path = self.kickoffs_dir().join(LATEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        let output = serde_json::from_str(&content).context("Failed to parse kickoff log")?;
        Ok(Some(output))
    }

    /// Locate a task in the latest kickoff, returning the run and the task position
    pub fn find_task(&self, task_id: &str) -> Result<(CrewOutput, usize)> {
        let latest = self
            .load_latest_kickoff()?
            .ok_or_else(|| CrewError::UnknownTask(task_id.to_string()))?;
        let index = latest
            .position(task_id)
            .ok_or_else(|| CrewError::UnknownTask(task_id.to_string()))?;
        Ok((latest, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crew::{TaskKind, TaskOutput};
    use crate::llm::TokenUsage;
    use chrono::Utc;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn sample_output() -> CrewOutput {
        CrewOutput {
            run_id: Uuid::new_v4(),
            topic: "Smart Modular Storage System".to_string(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            tasks_output: TaskKind::ALL
                .iter()
                .map(|kind| TaskOutput {
                    task_id: Uuid::new_v4(),
                    task: *kind,
                    agent: kind.role().title().to_string(),
                    raw: format!("- {}", kind.heading()),
                    usage: TokenUsage::default(),
                })
                .collect(),
            usage: TokenUsage::default(),
        }
    }

    #[test]
    fn latest_is_none_before_any_run() {
        let tmp = TempDir::new().unwrap();
        let storage = CrewStorage::new(tmp.path().join(".product-design")).unwrap();
        assert!(storage.load_latest_kickoff().unwrap().is_none());
        assert!(tmp.path().join(".product-design").join("kickoffs").is_dir());
    }

    #[test]
    fn saved_kickoff_becomes_latest() {
        let tmp = TempDir::new().unwrap();
        let storage = CrewStorage::new(tmp.path()).unwrap();
        let first = sample_output();
        let second = sample_output();

        let path = storage.save_kickoff(&first).unwrap();
        assert!(path.exists());
        storage.save_kickoff(&second).unwrap();

        let latest = storage.load_latest_kickoff().unwrap().unwrap();
        assert_eq!(latest.run_id, second.run_id);
        assert_eq!(latest.tasks_output.len(), 3);
    }

    #[test]
    fn find_task_returns_position() {
        let tmp = TempDir::new().unwrap();
        let storage = CrewStorage::new(tmp.path()).unwrap();
        let output = sample_output();
        storage.save_kickoff(&output).unwrap();

        let wanted = output.tasks_output[1].task_id.to_string();
        let (run, index) = storage.find_task(&wanted).unwrap();
        assert_eq!(index, 1);
        assert_eq!(run.run_id, output.run_id);
    }

    #[test]
    fn unknown_task_is_reported() {
        let tmp = TempDir::new().unwrap();
        let storage = CrewStorage::new(tmp.path()).unwrap();
        storage.save_kickoff(&sample_output()).unwrap();

        let err = storage.find_task("not-a-task").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CrewError>(),
            Some(CrewError::UnknownTask(id)) if id == "not-a-task"
        ));
    }
}
