// SPDX-License-Identifier: MIT

//! Minimal content-type sniffing from a file's leading bytes. Covers the
//! signatures attachments are actually expected to carry; anything
//! unrecognized falls back to `application/octet-stream`.

const FALLBACK: &str = "application/octet-stream";

pub fn sniff(head: &[u8]) -> String {
    let sig: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"%PDF-", "application/pdf"),
        (b"PK\x03\x04", "application/zip"),
        (b"\x1f\x8b", "application/gzip"),
        (b"RIFF", "image/webp"), // refined below when "WEBP" follows
    ];
    for (magic, mime) in sig {
        if head.starts_with(magic) {
            if *mime == "image/webp" && !(head.len() >= 12 && &head[8..12] == b"WEBP") {
                continue;
            }
            return (*mime).to_string();
        }
    }
    if head.starts_with(b"<?xml") {
        return "application/xml".to_string();
    }
    if looks_like_text(head) {
        return "text/plain".to_string();
    }
    FALLBACK.to_string()
}

fn looks_like_text(head: &[u8]) -> bool {
    if head.is_empty() {
        return true;
    }
    head.iter().all(|b| matches!(b, 0x09 | 0x0a | 0x0d | 0x20..=0x7e))
}
