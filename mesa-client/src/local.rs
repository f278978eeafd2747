//! Local session persistence
//!
//! A small JSON key file holding the active staff record, the active
//! café id and the per-café "this device has seen a manager login"
//! flags. Rehydrated at process start so a reload resumes the same
//! café/staff pair without a fresh login.

use crate::error::ClientResult;
use serde::{Deserialize, Serialize};
use shared::models::Staff;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionFile {
    staff: Option<Staff>,
    cafe_id: Option<String>,
    /// Visibility hint for the manager-login entry point only,
    /// not a security control.
    #[serde(default)]
    manager_seen: HashMap<String, bool>,
}

/// Durable local key-value session store
#[derive(Debug)]
pub struct LocalStore {
    file_path: PathBuf,
    data: SessionFile,
}

impl LocalStore {
    /// Load the session file from `dir`, starting empty when absent.
    pub fn load(dir: &Path) -> ClientResult<Self> {
        let file_path = dir.join("session.json");
        let data = if file_path.exists() {
            let content = std::fs::read_to_string(&file_path)?;
            serde_json::from_str(&content)?
        } else {
            SessionFile::default()
        };
        Ok(Self { file_path, data })
    }

    fn save(&self) -> ClientResult<()> {
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(&self.file_path, content)?;
        Ok(())
    }

    pub fn staff(&self) -> Option<&Staff> {
        self.data.staff.as_ref()
    }

    pub fn cafe_id(&self) -> Option<&str> {
        self.data.cafe_id.as_deref()
    }

    pub fn set_staff(&mut self, staff: Option<Staff>) -> ClientResult<()> {
        self.data.staff = staff;
        self.save()
    }

    pub fn set_cafe_id(&mut self, cafe_id: Option<String>) -> ClientResult<()> {
        self.data.cafe_id = cafe_id;
        self.save()
    }

    /// Full logout: both session keys cleared. Manager-seen flags stay;
    /// they only gate an entry point's visibility.
    pub fn clear_session(&mut self) -> ClientResult<()> {
        self.data.staff = None;
        self.data.cafe_id = None;
        self.save()
    }

    pub fn manager_seen(&self, cafe_id: &str) -> bool {
        self.data.manager_seen.get(cafe_id).copied().unwrap_or(false)
    }

    pub fn mark_manager_seen(&mut self, cafe_id: &str) -> ClientResult<()> {
        self.data.manager_seen.insert(cafe_id.to_string(), true);
        self.save()
    }
}
