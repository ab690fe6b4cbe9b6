// SPDX-License-Identifier: MIT

//! Prompt assembly for `SendMessage`: bounded conversation history plus an
//! optional attached-files block built from explicit attachments and
//! `@file.ext` references scraped out of the user's own message.

use quorum_core::{ChatMessage, ChatRole};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant embedded in a project chat. Answer concisely and reference the attached files when relevant.";

// Allow expect here as the regex is compile-time verified to be valid.
static FILE_REF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([^\s@]+\.[a-zA-Z0-9]+)").expect("constant regex pattern is valid"));

/// Scrapes `@path/to/file.ext` references out of user-authored content,
/// deduped in first-seen order.
pub fn extract_file_references(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut refs = Vec::new();
    for caps in FILE_REF_PATTERN.captures_iter(content) {
        let path = caps[1].to_string();
        if seen.insert(path.clone()) {
            refs.push(path);
        }
    }
    refs
}

/// Unions explicit attachments with inline `@file` references, preserving
/// first-seen order and dropping duplicates across both sources.
pub fn union_attachments(explicit: &[String], inline: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for path in explicit.iter().chain(inline.iter()) {
        if seen.insert(path.clone()) {
            out.push(path.clone());
        }
    }
    out
}

fn role_label(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Agent => "assistant",
        ChatRole::System => "system",
    }
}

fn history_block(messages: &[ChatMessage], window: usize) -> String {
    let start = messages.len().saturating_sub(window);
    messages[start..].iter().map(|m| format!("[{}]: {}", role_label(m.role), m.content)).collect::<Vec<_>>().join("\n")
}

/// `files` is `(reference, content)` pairs for references that loaded
/// successfully; references that failed to load are simply omitted by the
/// caller, not represented here.
pub fn build_prompt(history: &[ChatMessage], window: usize, files: &[(String, String)]) -> String {
    let mut prompt = history_block(history, window);
    if !files.is_empty() {
        let block = files.iter().map(|(name, content)| format!("### {name}\n{content}")).collect::<Vec<_>>().join("\n\n");
        prompt.push_str("\n\n## Attached Files\n\n");
        prompt.push_str(&block);
    }
    prompt
}
