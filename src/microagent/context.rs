// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Rendering matched microagents into the prompt sent to the agent.

use super::types::Microagent;

/// Append each matched microagent's body to the prompt as a tagged block.
///
/// Returns the prompt unchanged when nothing matched.
pub fn compose_prompt(prompt: &str, matched: &[&Microagent]) -> String {
    if matched.is_empty() {
        return prompt.to_string();
    }

    let mut composed = String::with_capacity(
        prompt.len() + matched.iter().map(|a| a.content.len() + 64).sum::<usize>(),
    );
    composed.push_str(prompt);

    for agent in matched {
        composed.push_str("\n\n");
        composed.push_str(&format!(
            "<microagent name=\"{}\" source=\"{}\">\n",
            agent.name(),
            agent.source_path.display()
        ));
        composed.push_str(agent.content.trim());
        composed.push_str("\n</microagent>");
    }

    composed
}
