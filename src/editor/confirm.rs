use serde::Serialize;

use crate::style::{GlobalStyle, StyleSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    GlobalStyle,
    Preset,
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PendingAction {
    GlobalStyle(GlobalStyle),
    Preset(StyleSettings),
    Reset,
}

/// A previewed destructive change awaiting confirmation.
///
/// `token` is the workspace revision the preview was computed against; confirming after any
/// other mutation is refused.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChange {
    pub kind: ChangeKind,
    /// Ids of the creatives or slides the change rewrites.
    pub affected: Vec<String>,
    /// Style fields whose values would change, in declaration order.
    pub changed_fields: Vec<&'static str>,
    pub token: u64,
    #[serde(skip)]
    pub(crate) action: PendingAction,
}

impl PendingChange {
    pub(crate) fn new(
        kind: ChangeKind,
        affected: Vec<String>,
        changed_fields: Vec<&'static str>,
        token: u64,
        action: PendingAction,
    ) -> Self {
        Self {
            kind,
            affected,
            changed_fields,
            token,
            action,
        }
    }

    /// True when confirming would not change anything.
    pub fn is_noop(&self) -> bool {
        match self.kind {
            ChangeKind::Reset => self.affected.is_empty(),
            _ => self.changed_fields.is_empty(),
        }
    }

    pub fn summary(&self) -> String {
        match self.kind {
            ChangeKind::GlobalStyle => format!(
                "Apply {} style field(s) to {} slide(s); per-slide adjustments to those fields will be lost.",
                self.changed_fields.len(),
                self.affected.len()
            ),
            ChangeKind::Preset => format!(
                "Replace the style of {} item(s) with the preset.",
                self.affected.len()
            ),
            ChangeKind::Reset => format!(
                "Discard {} unsaved item(s) from the workspace; history is kept.",
                self.affected.len()
            ),
        }
    }
}

/// Accumulates changed field names without duplicates, keeping first-seen order.
pub(crate) fn merge_fields(into: &mut Vec<&'static str>, fields: Vec<&'static str>) {
    for field in fields {
        if !into.contains(&field) {
            into.push(field);
        }
    }
}
