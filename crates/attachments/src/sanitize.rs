// SPDX-License-Identifier: MIT

//! Filename sanitation, applied exactly as specified so the same input
//! always maps to the same on-disk name across platforms.

const MAX_NAME_BYTES: usize = 200;

/// Reduces an untrusted filename to a safe, single path segment.
///
/// Order matters: trim, neutralize backslashes, strip any path prefix,
/// drop NULs, substitute a sentinel for empty/dot names, then truncate.
pub fn sanitize(raw: &str) -> String {
    let trimmed = raw.trim();
    let no_backslashes = trimmed.replace('\\', "_");
    let base = no_backslashes.rsplit('/').next().unwrap_or(&no_backslashes);
    let no_nul: String = base.chars().filter(|c| *c != '\0').collect();
    let name = match no_nul.as_str() {
        "" | "." | ".." => "attachment".to_string(),
        _ => no_nul,
    };
    truncate_bytes(&name, MAX_NAME_BYTES)
}

fn truncate_bytes(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}
