// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Microagent file parser.
//!
//! A microagent file is markdown with an optional leading metadata block
//! delimited by lines consisting solely of `---`:
//!
//! ```text
//! ---
//! triggers:
//!   contains: deploy
//! ---
//! Body injected as context.
//! ```

use std::path::Path;

use crate::error::LoadError;

use super::types::{Frontmatter, Microagent};

const DELIMITER: &str = "---";

/// Split content into `(metadata, body)` on the first two delimiter lines.
///
/// Returns `None` when there are fewer than two delimiter lines, or when text
/// other than whitespace precedes the first one (the block must lead the file).
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut delimiters = Vec::with_capacity(2);
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        if line.trim_end() == DELIMITER {
            delimiters.push((start, offset));
            if delimiters.len() == 2 {
                break;
            }
        }
    }

    let &[(open_start, open_end), (close_start, close_end)] = delimiters.as_slice() else {
        return None;
    };

    if !content[..open_start].trim().is_empty() {
        return None;
    }

    Some((&content[open_end..close_start], &content[close_end..]))
}

/// Parse a microagent from file content.
///
/// Files without a metadata block keep their whole content as body and never
/// match. A metadata block that is not valid YAML for [`Frontmatter`] is an error.
pub fn parse_microagent(path: &Path, content: &str) -> Result<Microagent, LoadError> {
    let Some((metadata, body)) = split_frontmatter(content) else {
        tracing::debug!(path = %path.display(), "microagent has no metadata block");
        return Ok(Microagent::new(Frontmatter::default(), content, path));
    };

    let frontmatter = if metadata.trim().is_empty() {
        Frontmatter::default()
    } else {
        serde_yaml::from_str::<Frontmatter>(metadata).map_err(|e| LoadError::Metadata {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    };

    if frontmatter.triggers.is_never() {
        tracing::debug!(path = %path.display(), "microagent declares no usable triggers");
    }

    Ok(Microagent::new(frontmatter, body, path))
}
