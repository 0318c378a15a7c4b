// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot mention detection.

use regex::Regex;

/// Whether `text` mentions the bot by display name or platform user ID.
///
/// Matches `@name` and `@id` case-insensitively on a word boundary, plus the
/// `<@id>` / `<@!id>` markup Discord uses.
pub(crate) fn detect_mention(user_name: &str, bot_user_id: Option<&str>, text: &str) -> bool {
    let mut patterns = vec![format!(r"(?i)@{}\b", regex::escape(user_name))];
    if let Some(id) = bot_user_id {
        let id = regex::escape(id);
        patterns.push(format!(r"(?i)@{id}\b"));
        patterns.push(format!(r"<@!?{id}>"));
    }

    patterns.iter().any(|pattern| match Regex::new(pattern) {
        Ok(re) => re.is_match(text),
        Err(_) => false,
    })
}
