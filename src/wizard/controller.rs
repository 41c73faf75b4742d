//! Wizard controller tying the profile, the step list and persistence together.

use tracing::{debug, info};

use super::navigation::{self, NavigationIntent, Step};
use crate::completion::{
    calculate_completion, category, CategoryKey, CompletionResult, ProfileSnapshot,
};
use crate::progress::{AutoSaveScheduler, ProgressRestorer};

/// Wizard pages in order, with the completion category each one fills in
pub const WIZARD_STEPS: &[(&str, &str, Option<CategoryKey>)] = &[
    ("personal", "Personal Information", Some(CategoryKey::PersonalInfo)),
    ("income", "Income", Some(CategoryKey::IncomeSources)),
    ("assets", "Assets", Some(CategoryKey::Assets)),
    ("expenses", "Expenses", Some(CategoryKey::Expenses)),
    ("retirement", "Retirement Goals", Some(CategoryKey::RetirementPlanning)),
    ("benefits", "Benefits", Some(CategoryKey::GovernmentBenefits)),
    ("review", "Review", None),
];

/// Build a fresh, uncompleted step list
pub fn default_steps() -> Vec<Step> {
    WIZARD_STEPS
        .iter()
        .map(|(id, name, _)| Step::new(*id, *name))
        .collect()
}

/// Owns one user's pass through the onboarding wizard.
///
/// Every change schedules a debounced save; dropping the wizard cancels a save
/// still inside its debounce window.
pub struct OnboardingWizard {
    identity: Option<String>,
    steps: Vec<Step>,
    current_index: usize,
    profile: ProfileSnapshot,
    autosave: AutoSaveScheduler,
    /// `savedAtEpochMs` of the snapshot this wizard resumed from
    restored_at: Option<i64>,
    submitted: bool,
}

impl OnboardingWizard {
    /// Start the wizard, resuming from a stored snapshot when a fresh one
    /// exists for `identity`.
    pub fn mount(
        identity: Option<String>,
        autosave: AutoSaveScheduler,
        restorer: &ProgressRestorer,
    ) -> Self {
        let mut wizard = Self {
            identity,
            steps: default_steps(),
            current_index: 0,
            profile: ProfileSnapshot::default(),
            autosave,
            restored_at: None,
            submitted: false,
        };

        if let Some(snapshot) = restorer.restore::<ProfileSnapshot>(wizard.identity.as_deref(), None)
        {
            info!(
                step_index = snapshot.step_index,
                saved_at = snapshot.saved_at_epoch_ms,
                "Resuming onboarding from saved progress"
            );
            wizard.profile = snapshot.payload;
            wizard.current_index = snapshot.step_index.min(wizard.steps.len() - 1);
            wizard.restored_at = Some(snapshot.saved_at_epoch_ms);
        }

        wizard.refresh_steps();
        wizard
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_step(&self) -> &Step {
        &self.steps[self.current_index]
    }

    pub fn profile(&self) -> &ProfileSnapshot {
        &self.profile
    }

    pub fn restored_at(&self) -> Option<i64> {
        self.restored_at
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Content-weighted completeness of the current profile
    pub fn completion(&self) -> CompletionResult {
        calculate_completion(&self.profile)
    }

    /// Apply an edit to the profile and schedule a save
    pub fn update_profile(&mut self, edit: impl FnOnce(&mut ProfileSnapshot)) {
        edit(&mut self.profile);
        self.refresh_steps();
        self.schedule_save();
    }

    /// Replace the whole profile, e.g. after reloading it from a file
    pub fn replace_profile(&mut self, profile: ProfileSnapshot) {
        self.update_profile(|p| *p = profile);
    }

    /// Record that the benefits projection has been run for this household
    pub fn mark_benefits_calculated(&mut self) {
        self.update_profile(|p| p.benefits_calculator_used = true);
    }

    /// "Continue": advance past the current step if its fields validate.
    /// Returns false and stays put otherwise.
    pub fn complete_current_step(&mut self) -> bool {
        if !self.step_validates(self.current_index) {
            debug!(step = %self.current_step().id, "Current step does not validate yet");
            return false;
        }
        self.steps[self.current_index].completed = true;
        if self.current_index + 1 < self.steps.len() {
            self.current_index += 1;
        }
        self.schedule_save();
        true
    }

    /// Apply a navigation intent if the target step is still navigable
    pub fn navigate(&mut self, intent: NavigationIntent) -> bool {
        let NavigationIntent::GoTo(target) = intent;
        if navigation::click(&self.steps, target, self.current_index).is_none() {
            return false;
        }
        self.current_index = target;
        self.schedule_save();
        true
    }

    /// Finish onboarding. On success the stored snapshot is deleted; otherwise
    /// returns the index of the first step that still needs input.
    pub fn submit(&mut self) -> Result<(), usize> {
        if let Some(index) = (0..self.steps.len()).find(|&i| {
            WIZARD_STEPS
                .get(i)
                .and_then(|(_, _, key)| *key)
                .is_some()
                && !self.step_validates(i)
        }) {
            return Err(index);
        }

        for step in &mut self.steps {
            step.completed = true;
        }
        self.current_index = self.steps.len() - 1;
        self.submitted = true;
        let key = self.autosave.clear(self.identity.as_deref(), None);
        info!(key = %key, "Onboarding submitted; saved progress cleared");
        Ok(())
    }

    /// A content step validates when its completion category is satisfied.
    /// The review step only validates through `submit`.
    fn step_validates(&self, index: usize) -> bool {
        match WIZARD_STEPS.get(index).and_then(|(_, _, key)| *key) {
            Some(key) => category(key).is_satisfied(&self.profile),
            None => self.submitted,
        }
    }

    fn refresh_steps(&mut self) {
        for (index, (_, _, key)) in WIZARD_STEPS.iter().enumerate() {
            let Some(key) = key else { continue };
            let completed = category(*key).is_satisfied(&self.profile);
            let summary = step_summary(*key, &self.profile);
            if let Some(step) = self.steps.get_mut(index) {
                step.completed = completed;
                step.summary = summary;
            }
        }
    }

    fn schedule_save(&mut self) {
        if self.submitted {
            return;
        }
        self.autosave.save(
            self.profile.clone(),
            self.current_index,
            self.identity.as_deref(),
            None,
        );
    }
}

/// Short description of what has been entered for a step
fn step_summary(key: CategoryKey, profile: &ProfileSnapshot) -> Option<String> {
    let count = |n: usize, one: &str, many: &str| match n {
        0 => None,
        1 => Some(format!("1 {}", one)),
        n => Some(format!("{} {}", n, many)),
    };
    match key {
        CategoryKey::PersonalInfo => {
            let first = profile.personal.first_name.trim();
            (!first.is_empty()).then(|| first.to_string())
        }
        CategoryKey::IncomeSources => count(profile.income_sources.len(), "source", "sources"),
        CategoryKey::Assets => count(profile.assets.len(), "account", "accounts"),
        CategoryKey::Expenses => count(profile.expenses.len(), "item", "items"),
        CategoryKey::RetirementPlanning => profile
            .retirement_age
            .map(|age| format!("retire at {}", age)),
        CategoryKey::GovernmentBenefits => profile
            .benefits_calculator_used
            .then(|| "estimated".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{Asset, Expense, IncomeSource, PersonalInfo};
    use crate::progress::{Snapshot, DEFAULT_DEBOUNCE};
    use crate::store::{MemoryStore, PersistenceStore};
    use std::sync::Arc;
    use std::time::Duration;

    fn mount(store: &MemoryStore, identity: &str) -> OnboardingWizard {
        let shared: Arc<dyn PersistenceStore> = Arc::new(store.clone());
        let autosave = AutoSaveScheduler::new(Arc::clone(&shared), DEFAULT_DEBOUNCE);
        let restorer = ProgressRestorer::new(shared);
        OnboardingWizard::mount(Some(identity.to_string()), autosave, &restorer)
    }

    async fn flush() {
        tokio::time::sleep(DEFAULT_DEBOUNCE + Duration::from_millis(100)).await;
    }

    fn fill_personal(p: &mut ProfileSnapshot) {
        p.personal = PersonalInfo {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            birth_date: "1961-04-12".to_string(),
            region: "CA".to_string(),
            marital_status: "single".to_string(),
        };
    }

    fn fill_everything(p: &mut ProfileSnapshot) {
        fill_personal(p);
        p.income_sources.push(IncomeSource {
            source: "salary".to_string(),
            annual_amount: 95_000.0,
        });
        p.assets.push(Asset {
            kind: "401k".to_string(),
            balance: 410_000.0,
        });
        p.expenses.push(Expense {
            category: "housing".to_string(),
            monthly_amount: 2_100.0,
        });
        p.retirement_age = Some(65);
        p.life_expectancy = Some(92);
        p.benefits_calculator_used = true;
    }

    #[test]
    fn test_fresh_mount_starts_at_first_step() {
        let store = MemoryStore::new();
        let wizard = mount(&store, "u1");

        assert_eq!(wizard.current_index(), 0);
        assert_eq!(wizard.steps().len(), WIZARD_STEPS.len());
        assert!(wizard.steps().iter().all(|s| !s.completed));
        assert!(wizard.restored_at().is_none());
        assert_eq!(wizard.completion().percentage, 0);
    }

    #[test]
    fn test_continue_requires_valid_step() {
        let store = MemoryStore::new();
        let mut wizard = mount(&store, "u1");

        assert!(!wizard.complete_current_step());
        assert_eq!(wizard.current_index(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_are_saved_and_resumed() {
        let store = MemoryStore::new();
        {
            let mut wizard = mount(&store, "u1");
            wizard.update_profile(fill_personal);
            assert!(wizard.complete_current_step());
            assert_eq!(wizard.current_index(), 1);
            flush().await;
        }
        assert_eq!(store.write_count(), 1);

        let resumed = mount(&store, "u1");
        assert_eq!(resumed.current_index(), 1);
        assert_eq!(resumed.profile().personal.first_name, "Ada");
        assert!(resumed.steps()[0].completed);
        assert_eq!(resumed.steps()[0].summary.as_deref(), Some("Ada"));
        assert!(resumed.restored_at().is_some());
        assert_eq!(resumed.completion().percentage, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_before_window_loses_only_that_edit() {
        let store = MemoryStore::new();
        {
            let mut wizard = mount(&store, "u1");
            wizard.update_profile(fill_personal);
        }
        flush().await;

        assert!(store.is_empty());
    }

    #[test]
    fn test_navigation_respects_rules() {
        let store = MemoryStore::new();
        let mut wizard = mount(&store, "u1");
        wizard.update_profile(fill_personal);
        wizard.update_profile(|p| p.expenses.push(Expense::default()));
        assert!(wizard.complete_current_step());

        // Expenses completed out of order is reachable, Assets is not
        assert!(wizard.navigate(NavigationIntent::GoTo(3)));
        assert_eq!(wizard.current_index(), 3);
        assert!(!wizard.navigate(NavigationIntent::GoTo(5)));
        assert!(wizard.navigate(NavigationIntent::GoTo(0)));
        assert!(!wizard.navigate(NavigationIntent::GoTo(0)));
    }

    #[test]
    fn test_restored_step_index_is_clamped() {
        let store = MemoryStore::new();
        let snapshot = Snapshot::now(ProfileSnapshot::default(), 42);
        store
            .set(
                "onboarding_progress_u1",
                &serde_json::to_string(&snapshot).unwrap(),
            )
            .unwrap();

        let wizard = mount(&store, "u1");
        assert_eq!(wizard.current_index(), WIZARD_STEPS.len() - 1);
    }

    #[test]
    fn test_submit_reports_first_incomplete_step() {
        let store = MemoryStore::new();
        let mut wizard = mount(&store, "u1");
        wizard.update_profile(fill_personal);

        assert_eq!(wizard.submit(), Err(1));
        assert!(!wizard.is_submitted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_clears_saved_progress() {
        let store = MemoryStore::new();
        let mut wizard = mount(&store, "u1");
        wizard.update_profile(fill_everything);
        flush().await;
        assert_eq!(store.len(), 1);

        wizard.update_profile(|p| p.retirement_age = Some(67));
        assert_eq!(wizard.submit(), Ok(()));
        flush().await;

        assert!(wizard.is_submitted());
        assert!(store.is_empty());
        assert!(wizard.steps().iter().all(|s| s.completed));
        assert_eq!(wizard.completion().percentage, 100);
    }

    #[test]
    fn test_benefits_flag_completes_benefits_step() {
        let store = MemoryStore::new();
        let mut wizard = mount(&store, "u1");
        wizard.mark_benefits_calculated();

        assert!(wizard.steps()[5].completed);
        assert_eq!(wizard.steps()[5].summary.as_deref(), Some("estimated"));
        assert_eq!(wizard.completion().percentage, 15);
    }

    #[test]
    fn test_step_summaries_count_rows() {
        let mut profile = ProfileSnapshot::default();
        assert_eq!(step_summary(CategoryKey::Assets, &profile), None);

        profile.assets.push(Asset::default());
        assert_eq!(
            step_summary(CategoryKey::Assets, &profile).as_deref(),
            Some("1 account")
        );

        profile.income_sources = vec![IncomeSource::default(); 3];
        assert_eq!(
            step_summary(CategoryKey::IncomeSources, &profile).as_deref(),
            Some("3 sources")
        );
    }
}
