//! Flat-file log of contact-form submissions (messages.json).

use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::core::error::AppResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactEntry {
    pub id: u64,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub product: String,
    pub message: String,
    pub date: String,
    pub read: bool,
}

#[derive(Clone)]
pub struct ContactLog {
    path: String,
}

impl ContactLog {
    pub fn new(path: &str) -> Self {
        Self { path: path.to_string() }
    }

    /// Load all entries. Missing or broken file reads as empty.
    pub fn load(&self) -> Vec<ContactEntry> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::warn!("Failed to parse {}: {}", self.path, e);
            Vec::new()
        })
    }

    fn save(&self, entries: &[ContactEntry]) -> AppResult<()> {
        if let Some(parent) = Path::new(&self.path).parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, data)?;
        Ok(())
    }

    /// Append a submission; id is the running count + 1.
    pub fn append(&self, name: &str, phone: &str, email: &str, product: &str, message: &str) -> AppResult<ContactEntry> {
        let mut entries = self.load();
        let entry = ContactEntry {
            id: entries.len() as u64 + 1,
            name: name.to_string(),
            phone: phone.to_string(),
            email: email.to_string(),
            product: product.to_string(),
            message: message.to_string(),
            date: Utc::now().to_rfc3339(),
            read: false,
        };
        entries.push(entry.clone());
        self.save(&entries)?;
        Ok(entry)
    }

    /// Number of entries not yet marked read.
    pub fn unread_count(&self) -> usize {
        self.load().iter().filter(|e| !e.read).count()
    }
}
