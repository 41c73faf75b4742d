//! Waypoint - resumable onboarding for the retirement planner
//!
//! Persists in-progress wizard state with debounced auto-save, restores it
//! with a staleness check, scores profile completeness and decides which
//! wizard steps are reachable.

pub mod app;
pub mod completion;
pub mod config;
pub mod logging;
pub mod progress;
pub mod store;
pub mod ui;
pub mod wizard;
