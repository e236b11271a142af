// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::session::Message;

/// Messages a user may rewind to: their own non-blank turns, oldest first.
pub fn rewind_candidates(messages: &[Message]) -> Vec<&Message> {
    messages.iter().filter(|m| m.is_rewind_candidate()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn test_only_non_blank_user_messages() {
        let messages = vec![
            Message::new("s", Role::System, "rules"),
            Message::user("s", "first"),
            Message::assistant("s", "reply"),
            Message::user("s", "  \t "),
            Message::user("s", "second"),
        ];

        let contents: Vec<&str> = rewind_candidates(&messages)
            .into_iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[test]
    fn test_empty_history() {
        assert!(rewind_candidates(&[]).is_empty());
    }
}
