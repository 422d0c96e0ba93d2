//! Cohort selection
//!
//! A [`CohortSelection`] is an immutable value describing which students a
//! batch operation targets. It changes only through [`SelectionCommand`]s and
//! is resolved against the list of students available at call time.
//!
//! The three modes are mutually exclusive by construction:
//! - `Explicit(ids)`: hand-picked students
//! - `GradeFilter(grade)`: every available student in one grade; the resolved
//!   set follows the filter
//! - `All`: every available student
//!
//! The view filter only narrows which candidates are *shown* for picking. It
//! never removes students that were picked while a different filter was active.

use crate::error::{Result, ValidationError};
use crate::types::{EntityRef, StudentId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

/// Selection mode
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum SelectionMode {
    /// Hand-picked students, in pick order
    Explicit(Vec<StudentId>),
    /// Every available student whose grade matches
    GradeFilter(String),
    /// Every available student
    All,
}

impl Default for SelectionMode {
    fn default() -> Self {
        SelectionMode::Explicit(Vec::new())
    }
}

/// Command applied to a selection
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "command", content = "value", rename_all = "snake_case")]
pub enum SelectionCommand {
    /// Replace the mode
    SetMode(SelectionMode),
    /// Pick one student
    ///
    /// Outside explicit mode this starts a fresh explicit selection.
    Select(StudentId),
    /// Pick several students (e.g. every visible candidate)
    SelectMany(Vec<StudentId>),
    /// Remove exactly one explicit pick
    Deselect(StudentId),
    /// Narrow (or widen with None) the candidates shown for picking
    SetViewFilter(Option<String>),
    /// Drop every explicit pick and return to an empty explicit selection
    Clear,
}

/// Immutable selection value
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CohortSelection {
    /// Current mode
    #[serde(default)]
    pub mode: SelectionMode,
    /// Grade used to narrow the visible candidates
    #[serde(default)]
    pub view_filter: Option<String>,
}

impl CohortSelection {
    /// Selection starting in the given mode
    pub fn with_mode(mode: SelectionMode) -> Self {
        Self {
            mode,
            view_filter: None,
        }
    }

    /// Apply one command, returning the new selection
    pub fn apply(&self, command: SelectionCommand) -> Self {
        let mut next = self.clone();
        match command {
            SelectionCommand::SetMode(mode) => {
                next.mode = match mode {
                    SelectionMode::Explicit(ids) => SelectionMode::Explicit(dedup(ids)),
                    other => other,
                };
            }
            SelectionCommand::Select(id) => next.pick(std::iter::once(id)),
            SelectionCommand::SelectMany(ids) => next.pick(ids),
            SelectionCommand::Deselect(id) => {
                if let SelectionMode::Explicit(ids) = &mut next.mode {
                    ids.retain(|picked| picked != &id);
                }
            }
            SelectionCommand::SetViewFilter(filter) => {
                next.view_filter = filter;
            }
            SelectionCommand::Clear => {
                next.mode = SelectionMode::Explicit(Vec::new());
            }
        }
        next
    }

    /// Apply a sequence of commands in order
    pub fn apply_all(&self, commands: impl IntoIterator<Item = SelectionCommand>) -> Self {
        commands
            .into_iter()
            .fold(self.clone(), |selection, command| selection.apply(command))
    }

    fn pick(&mut self, ids: impl IntoIterator<Item = StudentId>) {
        if !matches!(self.mode, SelectionMode::Explicit(_)) {
            self.mode = SelectionMode::Explicit(Vec::new());
        }
        if let SelectionMode::Explicit(picked) = &mut self.mode {
            for id in ids {
                if !picked.contains(&id) {
                    picked.push(id);
                }
            }
        }
    }

    /// Students shown for picking under the current view filter
    pub fn candidates<'a>(&self, available: &'a [EntityRef]) -> Vec<&'a EntityRef> {
        available
            .iter()
            .filter(|entity| match &self.view_filter {
                Some(grade) => entity.grade.as_deref() == Some(grade.as_str()),
                None => true,
            })
            .collect()
    }

    /// Pick every candidate visible under the current view filter
    pub fn select_visible(&self, available: &[EntityRef]) -> Self {
        let visible = self
            .candidates(available)
            .into_iter()
            .map(|e| e.id.clone())
            .collect();
        self.apply(SelectionCommand::SelectMany(visible))
    }

    /// Whether a student is currently part of the explicit picks
    pub fn is_picked(&self, id: &StudentId) -> bool {
        matches!(&self.mode, SelectionMode::Explicit(ids) if ids.contains(id))
    }

    /// Resolve into a deduplicated id list drawn only from `available`
    ///
    /// Explicit picks keep their pick order; the other modes follow the
    /// order of `available`.
    pub fn resolve(&self, available: &[EntityRef]) -> Vec<StudentId> {
        match &self.mode {
            SelectionMode::Explicit(ids) => {
                let known: HashSet<&StudentId> = available.iter().map(|e| &e.id).collect();
                dedup(ids.iter().filter(|id| known.contains(id)).cloned())
            }
            SelectionMode::GradeFilter(grade) => dedup(
                available
                    .iter()
                    .filter(|e| e.grade.as_deref() == Some(grade.as_str()))
                    .map(|e| e.id.clone()),
            ),
            SelectionMode::All => dedup(available.iter().map(|e| e.id.clone())),
        }
    }

    /// Resolve for a batch submission, rejecting an empty result
    pub fn resolve_for_submission(&self, available: &[EntityRef]) -> Result<Vec<StudentId>> {
        let ids = self.resolve(available);
        if ids.is_empty() {
            return Err(ValidationError::NoEntitiesSelected.into());
        }
        Ok(ids)
    }
}

/// Order-preserving deduplication
pub(crate) fn dedup(ids: impl IntoIterator<Item = StudentId>) -> Vec<StudentId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
