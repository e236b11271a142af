// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Trigger expressions that decide whether a microagent applies to a prompt.
//!
//! On disk a trigger is a node with four optional keys:
//!
//! ```yaml
//! triggers:
//!   and:
//!     - contains: deploy
//!     - not:
//!         contains: staging
//! ```
//!
//! or, in the older form, a plain list of substrings where any one matching is
//! enough (`triggers: [deploy, release]`).
//!
//! Raw nodes are normalized into [`TriggerExpression`] as soon as they are
//! parsed, so every expression has exactly one shape. When a node populates
//! several keys the first non-empty one wins, in this order:
//!
//! 1. `contains` (non-empty string)
//! 2. `and` (non-empty list)
//! 3. `or` (non-empty list)
//! 4. `not`
//!
//! and a node with none of them becomes [`TriggerExpression::Never`].

use std::fmt;

use serde::{Deserialize, Deserializer};

/// A boolean condition tree evaluated against prompt text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TriggerExpression {
    /// True iff the text is a case-sensitive substring of the prompt.
    Contains(String),
    /// True iff every child is true. An empty list is false.
    And(Vec<TriggerExpression>),
    /// True iff any child is true. An empty list is false.
    Or(Vec<TriggerExpression>),
    /// True iff the child is false.
    Not(Box<TriggerExpression>),
    /// Empty or malformed node; never matches.
    #[default]
    Never,
}

impl TriggerExpression {
    /// Convenience constructor for a substring leaf.
    pub fn contains(text: impl Into<String>) -> Self {
        Self::Contains(text.into())
    }

    /// Convenience constructor for negation.
    pub fn negate(child: TriggerExpression) -> Self {
        Self::Not(Box::new(child))
    }

    /// Evaluate this expression against a prompt.
    pub fn matches(&self, prompt: &str) -> bool {
        evaluate(prompt, self)
    }

    /// Whether this expression can never match anything.
    pub fn is_never(&self) -> bool {
        matches!(self, Self::Never)
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        match self {
            Self::Contains(_) | Self::Never => 1,
            Self::And(children) | Self::Or(children) => {
                1 + children.iter().map(Self::node_count).sum::<usize>()
            }
            Self::Not(child) => 1 + child.node_count(),
        }
    }
}

/// Evaluate a trigger expression against prompt text.
///
/// Total and side-effect free; linear in the size of the tree.
pub fn evaluate(prompt: &str, expr: &TriggerExpression) -> bool {
    match expr {
        TriggerExpression::Contains(text) => prompt.contains(text.as_str()),
        TriggerExpression::And(children) => {
            !children.is_empty() && children.iter().all(|child| evaluate(prompt, child))
        }
        TriggerExpression::Or(children) => children.iter().any(|child| evaluate(prompt, child)),
        TriggerExpression::Not(child) => !evaluate(prompt, child),
        TriggerExpression::Never => false,
    }
}

impl fmt::Display for TriggerExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contains(text) => write!(f, "contains({:?})", text),
            Self::And(children) => write_joined(f, "and", children),
            Self::Or(children) => write_joined(f, "or", children),
            Self::Not(child) => write!(f, "not({})", child),
            Self::Never => f.write_str("never"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, op: &str, children: &[TriggerExpression]) -> fmt::Result {
    if children.is_empty() {
        return write!(f, "{}()", op);
    }
    f.write_str("(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", op)?;
        }
        write!(f, "{}", child)?;
    }
    f.write_str(")")
}

/// A trigger node exactly as written in microagent metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TriggerNode {
    #[serde(default)]
    pub contains: Option<String>,
    #[serde(default)]
    pub and: Option<Vec<TriggerNode>>,
    #[serde(default)]
    pub or: Option<Vec<TriggerNode>>,
    #[serde(default)]
    pub not: Option<Box<TriggerNode>>,
}

impl TriggerNode {
    /// Number of keys populated with a usable value.
    fn populated_shapes(&self) -> usize {
        [
            self.contains.as_deref().is_some_and(|s| !s.is_empty()),
            self.and.as_ref().is_some_and(|c| !c.is_empty()),
            self.or.as_ref().is_some_and(|c| !c.is_empty()),
            self.not.is_some(),
        ]
        .iter()
        .filter(|&&populated| populated)
        .count()
    }

    /// Normalize into a single-shape expression using contains > and > or > not.
    pub fn into_expression(self) -> TriggerExpression {
        if self.populated_shapes() > 1 {
            tracing::warn!(
                node = ?self,
                "trigger node declares more than one of contains/and/or/not; using the first by precedence"
            );
        }

        if let Some(text) = self.contains.filter(|s| !s.is_empty()) {
            return TriggerExpression::Contains(text);
        }
        if let Some(children) = self.and.filter(|c| !c.is_empty()) {
            return TriggerExpression::And(children.into_iter().map(Self::into_expression).collect());
        }
        if let Some(children) = self.or.filter(|c| !c.is_empty()) {
            return TriggerExpression::Or(children.into_iter().map(Self::into_expression).collect());
        }
        if let Some(child) = self.not {
            return TriggerExpression::Not(Box::new(child.into_expression()));
        }
        TriggerExpression::Never
    }
}

/// Accepted spellings of the `triggers` key.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TriggerField {
    /// Older form: any listed substring triggers.
    Keywords(Vec<String>),
    Node(TriggerNode),
}

impl From<TriggerField> for TriggerExpression {
    fn from(field: TriggerField) -> Self {
        match field {
            TriggerField::Keywords(words) => {
                let leaves: Vec<TriggerExpression> = words
                    .into_iter()
                    .filter(|w| !w.is_empty())
                    .map(TriggerExpression::Contains)
                    .collect();
                if leaves.is_empty() {
                    TriggerExpression::Never
                } else {
                    TriggerExpression::Or(leaves)
                }
            }
            TriggerField::Node(node) => node.into_expression(),
        }
    }
}

impl<'de> Deserialize<'de> for TriggerExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let field = Option::<TriggerField>::deserialize(deserializer)?;
        Ok(field.map(TriggerExpression::from).unwrap_or_default())
    }
}
