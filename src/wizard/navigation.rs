//! Which wizard steps may be jumped to.
//!
//! Everything here is derived from the step list and the current index on each
//! render; nothing is stored.

use serde::{Deserialize, Serialize};

/// One page of the wizard. Order is fixed for a wizard instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub name: String,
    /// Set by the wizard controller once the step's required fields validate
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Step {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            completed: false,
            summary: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// Request to move the wizard to another step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationIntent {
    GoTo(usize),
}

/// Per-step view data for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView {
    pub index: usize,
    pub id: String,
    pub name: String,
    pub summary: Option<String>,
    pub completed: bool,
    pub is_current: bool,
    pub navigable: bool,
}

/// A step is navigable when it is completed or lies before the current step.
/// The current step is not navigable by this rule unless completed; clicking
/// it does nothing either way.
pub fn is_navigable(steps: &[Step], index: usize, current_index: usize) -> bool {
    steps
        .get(index)
        .map(|step| step.completed || index < current_index)
        .unwrap_or(false)
}

/// Turn a click on `index` into an intent. Clicking the current step or a
/// non-navigable step yields nothing.
pub fn click(steps: &[Step], index: usize, current_index: usize) -> Option<NavigationIntent> {
    if index == current_index || !is_navigable(steps, index, current_index) {
        return None;
    }
    Some(NavigationIntent::GoTo(index))
}

/// Derive the view of every step
pub fn step_views(steps: &[Step], current_index: usize) -> Vec<StepView> {
    steps
        .iter()
        .enumerate()
        .map(|(index, step)| StepView {
            index,
            id: step.id.clone(),
            name: step.name.clone(),
            summary: step.summary.clone(),
            completed: step.completed,
            is_current: index == current_index,
            navigable: is_navigable(steps, index, current_index),
        })
        .collect()
}

pub fn completed_count(steps: &[Step]) -> usize {
    steps.iter().filter(|s| s.completed).count()
}

/// Share of wizard steps marked completed, `round(100 * completed / total)`.
///
/// This tracks clicking through the wizard and is deliberately separate from
/// the content-weighted profile score.
pub fn progress_percentage(steps: &[Step]) -> u8 {
    if steps.is_empty() {
        return 0;
    }
    let ratio = completed_count(steps) as f64 / steps.len() as f64;
    (ratio * 100.0).round() as u8
}
