//! Onboarding wizard: step navigation rules, the sidebar that renders them and
//! the controller that drives a user through the steps.

pub mod controller;
pub mod navigation;
pub mod sidebar;

pub use controller::{default_steps, OnboardingWizard, WIZARD_STEPS};
pub use navigation::{NavigationIntent, Step, StepView};
pub use sidebar::ProgressSidebar;
