//! Attachment staging for lead forms
//!
//! Each file slot of a form owns an [`AttachmentStager`]. Admission checks the
//! slot's [`AttachmentPolicy`] (type, then size, then count) before anything is
//! staged. Image files get a preview handle from the [`PreviewHost`]; every
//! handle is revoked exactly once, when its file is removed or cleared or when
//! the stager goes out of scope.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::types::{RawFile, StagedFile};

/// Per-file upper bound used by every form on the site
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Images, PDF and Word documents
pub const DEFAULT_ALLOWED_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

// ==================== Policy ====================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPolicy {
    allowed_types: Vec<String>,
    max_file_bytes: u64,
    max_files: usize,
}

impl AttachmentPolicy {
    /// Default allow-list and size limit, `max_files` per slot
    pub fn new(max_files: usize) -> Self {
        Self {
            allowed_types: DEFAULT_ALLOWED_TYPES.iter().map(|t| t.to_string()).collect(),
            max_file_bytes: MAX_FILE_BYTES,
            max_files,
        }
    }

    pub fn images_only(max_files: usize) -> Self {
        Self::new(max_files).allow_types(["image/*"])
    }

    /// Replace the allow-list. Entries are exact MIME types or `type/*`,
    /// matched without regard to case.
    pub fn allow_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_types = types
            .into_iter()
            .map(|t| Into::<String>::into(t).trim().to_ascii_lowercase())
            .collect();
        self
    }

    pub fn max_file_bytes(mut self, limit: u64) -> Self {
        self.max_file_bytes = limit;
        self
    }

    pub fn permits_type(&self, mime_type: &str) -> bool {
        let mime_type = mime_type.trim().to_ascii_lowercase();
        self.allowed_types.iter().any(|allowed| match allowed.strip_suffix("/*") {
            Some(prefix) => mime_type
                .split_once('/')
                .is_some_and(|(top, sub)| top == prefix && !sub.is_empty()),
            None => *allowed == mime_type,
        })
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    pub fn file_limit_bytes(&self) -> u64 {
        self.max_file_bytes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("{name} is not a supported file type")]
    InvalidType { name: String, mime_type: String },

    #[error("{name} is larger than {} MB", .limit / (1024 * 1024))]
    TooLarge { name: String, size_bytes: u64, limit: u64 },

    #[error("You can attach at most {limit} file(s)")]
    TooMany { limit: usize },

    #[error("This form has no attachment field named {0}")]
    UnknownSlot(String),
}

// ==================== Previews ====================

/// Hands out and takes back preview handles for image files
pub trait PreviewHost: Send + Sync {
    fn create(&self, file: &RawFile) -> String;
    fn revoke(&self, url: &str);
}

/// In-process object-URL table; tracks which handles are still live
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    live: Mutex<HashSet<String>>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }

    pub fn is_live(&self, url: &str) -> bool {
        self.live.lock().contains(url)
    }
}

impl PreviewHost for ObjectUrlRegistry {
    fn create(&self, file: &RawFile) -> String {
        let url = format!("blob:preview/{}", Uuid::new_v4());
        debug!("Created preview {} for {}", url, file.name);
        self.live.lock().insert(url.clone());
        url
    }

    fn revoke(&self, url: &str) {
        if !self.live.lock().remove(url) {
            warn!("Preview {} revoked twice or never issued", url);
        }
    }
}

// ==================== Stager ====================

/// Staged files of a single slot
pub struct AttachmentStager {
    policy: AttachmentPolicy,
    files: Vec<StagedFile>,
    previews: Arc<dyn PreviewHost>,
}

impl std::fmt::Debug for AttachmentStager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentStager")
            .field("policy", &self.policy)
            .field("files", &self.files)
            .finish_non_exhaustive()
    }
}

impl AttachmentStager {
    pub fn new(policy: AttachmentPolicy, previews: Arc<dyn PreviewHost>) -> Self {
        Self {
            policy,
            files: Vec::new(),
            previews,
        }
    }

    /// Stage `raw` if the policy allows it
    pub fn admit(&mut self, raw: RawFile) -> Result<&StagedFile, AdmissionError> {
        if !self.policy.permits_type(&raw.mime_type) {
            debug!("Rejected {}: type {} not allowed", raw.name, raw.mime_type);
            return Err(AdmissionError::InvalidType {
                name: raw.name,
                mime_type: raw.mime_type,
            });
        }
        if raw.size_bytes() > self.policy.max_file_bytes {
            debug!("Rejected {}: {} bytes", raw.name, raw.size_bytes());
            return Err(AdmissionError::TooLarge {
                size_bytes: raw.size_bytes(),
                name: raw.name,
                limit: self.policy.max_file_bytes,
            });
        }
        if self.files.len() >= self.policy.max_files {
            debug!("Rejected {}: slot already holds {} file(s)", raw.name, self.files.len());
            return Err(AdmissionError::TooMany {
                limit: self.policy.max_files,
            });
        }

        let preview_url = raw.is_image().then(|| self.previews.create(&raw));
        self.files.push(StagedFile::new(raw, preview_url));
        Ok(&self.files[self.files.len() - 1])
    }

    /// Out-of-range indices are ignored and return `None`
    pub fn remove(&mut self, index: usize) -> Option<RawFile> {
        if index >= self.files.len() {
            debug!("Ignoring removal of attachment {} (have {})", index, self.files.len());
            return None;
        }
        let (raw, preview_url) = self.files.remove(index).into_parts();
        if let Some(url) = preview_url {
            self.previews.revoke(&url);
        }
        Some(raw)
    }

    pub fn clear(&mut self) {
        for staged in self.files.drain(..) {
            if let Some(url) = staged.preview_url() {
                self.previews.revoke(url);
            }
        }
    }

    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn policy(&self) -> &AttachmentPolicy {
        &self.policy
    }
}

impl Drop for AttachmentStager {
    fn drop(&mut self) {
        self.clear();
    }
}

// ==================== Slots ====================

/// All attachment slots of one form, sharing a preview host
#[derive(Debug, Default)]
pub struct Attachments {
    slots: BTreeMap<String, AttachmentStager>,
}

impl Attachments {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_slot(&mut self, name: impl Into<String>, stager: AttachmentStager) {
        self.slots.insert(name.into(), stager);
    }

    pub fn admit(&mut self, slot: &str, raw: RawFile) -> Result<&StagedFile, AdmissionError> {
        self.slots
            .get_mut(slot)
            .ok_or_else(|| AdmissionError::UnknownSlot(slot.to_string()))?
            .admit(raw)
    }

    pub fn remove(&mut self, slot: &str, index: usize) -> Option<RawFile> {
        self.slots.get_mut(slot)?.remove(index)
    }

    pub fn clear(&mut self) {
        self.slots.values_mut().for_each(AttachmentStager::clear);
    }

    /// Zero for unknown slots
    pub fn count(&self, slot: &str) -> usize {
        self.slots.get(slot).map_or(0, AttachmentStager::len)
    }

    pub fn slot(&self, name: &str) -> Option<&AttachmentStager> {
        self.slots.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttachmentStager)> {
        self.slots.iter().map(|(name, stager)| (name.as_str(), stager))
    }

    pub fn total(&self) -> usize {
        self.slots.values().map(AttachmentStager::len).sum()
    }
}
