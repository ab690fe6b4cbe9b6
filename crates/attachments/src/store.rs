// SPDX-License-Identifier: MIT

use crate::error::AttachmentError;
use crate::sanitize::sanitize;
use crate::sniff::sniff;
use quorum_core::{Attachment, AttachmentId, Clock, NotFound, OwnerType, SystemClock, TooLarge};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const MAX_ATTACHMENT_SIZE_BYTES: u64 = 50 * 1024 * 1024;
const SNIFF_HEAD_BYTES: usize = 512;
const META_FILE: &str = "meta.json";

#[derive(Debug, Clone)]
pub struct AttachmentConfig {
    /// Root directory; attachments live under `<root>/.quorum/attachments/`.
    pub root: PathBuf,
}

/// Filesystem-backed attachment store, keyed by `(OwnerType, ownerID, AttachmentID)`.
pub struct AttachmentStore<C: Clock = SystemClock> {
    base: PathBuf,
    clock: C,
}

impl AttachmentStore<SystemClock> {
    pub fn new(config: AttachmentConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> AttachmentStore<C> {
    pub fn with_clock(config: AttachmentConfig, clock: C) -> Self {
        Self { base: config.root.join(".quorum").join("attachments"), clock }
    }

    fn owner_dir(&self, owner: OwnerType, owner_id: &str) -> Result<PathBuf, AttachmentError> {
        reject_breakout(owner_id)?;
        Ok(self.base.join(owner.to_string()).join(owner_id))
    }

    fn attachment_dir(&self, owner: OwnerType, owner_id: &str, id: &str) -> Result<PathBuf, AttachmentError> {
        reject_breakout(id)?;
        Ok(self.owner_dir(owner, owner_id)?.join(id))
    }

    pub fn save(&self, owner: OwnerType, owner_id: &str, mut data: impl Read, filename: &str) -> Result<Attachment, AttachmentError> {
        let name = sanitize(filename);
        let id = AttachmentId::new();
        let dir = self.attachment_dir(owner, owner_id, id.as_str())?;
        assert_rooted(&self.base, &dir);
        std::fs::create_dir_all(&dir)?;

        let data_path = dir.join(&name);
        let bytes = read_capped(&mut data, MAX_ATTACHMENT_SIZE_BYTES)?;
        std::fs::write(&data_path, &bytes)?;

        let head = &bytes[..bytes.len().min(SNIFF_HEAD_BYTES)];
        let content_type = sniff(head);
        let attachment = Attachment {
            id,
            name: name.clone(),
            path: relative_path(&self.base, &data_path),
            size: bytes.len() as u64,
            content_type,
            created_at_epoch_ms: self.clock.epoch_ms(),
        };
        write_meta_atomically(&dir.join(META_FILE), &attachment)?;
        debug!(owner = %owner, owner_id, attachment_id = %attachment.id, size = attachment.size, "saved attachment");
        Ok(attachment)
    }

    pub fn list(&self, owner: OwnerType, owner_id: &str) -> Result<Vec<Attachment>, AttachmentError> {
        let dir = self.owner_dir(owner, owner_id)?;
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        for entry in entries {
            let Ok(entry) = entry else { continue };
            if !entry.path().is_dir() {
                continue;
            }
            match read_meta(&entry.path().join(META_FILE)) {
                Ok(attachment) => out.push(attachment),
                Err(e) => warn!(path = %entry.path().display(), error = %e, "skipping corrupt attachment entry"),
            }
        }
        Ok(out)
    }

    pub fn resolve(&self, owner: OwnerType, owner_id: &str, id: &str) -> Result<(Attachment, PathBuf), AttachmentError> {
        let dir = self.attachment_dir(owner, owner_id, id)?;
        let meta_path = dir.join(META_FILE);
        let attachment = read_meta(&meta_path).map_err(|_| AttachmentError::NotFound(NotFound::new("attachment", id)))?;
        let data_path = dir.join(&attachment.name);
        Ok((attachment, data_path))
    }

    /// Best-effort: deleting a nonexistent attachment is a no-op, not an error.
    pub fn delete(&self, owner: OwnerType, owner_id: &str, id: &str) -> Result<(), AttachmentError> {
        let dir = self.attachment_dir(owner, owner_id, id)?;
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort: deleting a nonexistent owner is a no-op.
    pub fn delete_all(&self, owner: OwnerType, owner_id: &str) -> Result<(), AttachmentError> {
        let dir = self.owner_dir(owner, owner_id)?;
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Rejects owner/attachment path segments that could escape the store root.
/// These ids are normally system-generated opaque tokens; this guards the
/// case where a caller passes something else through.
fn reject_breakout(segment: &str) -> Result<(), AttachmentError> {
    if segment.is_empty() || segment.contains(['/', '\\', '\0']) || segment == ".." || segment == "." {
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, "invalid path segment").into());
    }
    Ok(())
}

fn assert_rooted(root: &Path, candidate: &Path) {
    debug_assert!(candidate.starts_with(root), "attachment path escaped store root");
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).to_string_lossy().replace('\\', "/")
}

/// Reads up to `limit` bytes; if a further byte is available beyond that,
/// the stream exceeded the cap.
fn read_capped(data: &mut impl Read, limit: u64) -> Result<Vec<u8>, AttachmentError> {
    let mut buf = Vec::with_capacity(limit.min(1 << 20) as usize);
    let mut limited = data.take(limit + 1);
    limited.read_to_end(&mut buf)?;
    if buf.len() as u64 > limit {
        return Err(TooLarge { what: "attachment", limit_bytes: limit }.into());
    }
    Ok(buf)
}

fn write_meta_atomically(path: &Path, attachment: &Attachment) -> Result<(), AttachmentError> {
    let tmp = path.with_extension("json.tmp");
    let body = serde_json::to_vec_pretty(attachment)?;
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn read_meta(path: &Path) -> Result<Attachment, AttachmentError> {
    let body = std::fs::read(path)?;
    Ok(serde_json::from_slice(&body)?)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
