//! Weighted profile completeness scoring.
//!
//! The score measures how much of the household profile has been filled in,
//! independent of which wizard steps have been clicked through. Six fixed
//! categories each carry a weight; the percentage is the sum of the weights
//! whose predicate holds.

use serde::Serialize;
use std::fmt;

pub mod profile;

pub use profile::{Asset, Expense, IncomeSource, PersonalInfo, ProfileSnapshot};

/// Identifies one of the fixed completion categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKey {
    PersonalInfo,
    IncomeSources,
    Assets,
    Expenses,
    RetirementPlanning,
    GovernmentBenefits,
}

/// A weighted section of the profile and the rule deciding whether it is done
#[derive(Clone, Copy)]
pub struct CompletionCategory {
    pub key: CategoryKey,
    pub label: &'static str,
    pub weight: u32,
    pub description: &'static str,
    pub suggested_action: Option<&'static str>,
    pub link: Option<&'static str>,
    pub predicate: fn(&ProfileSnapshot) -> bool,
}

impl fmt::Debug for CompletionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionCategory")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

impl CompletionCategory {
    pub fn is_satisfied(&self, profile: &ProfileSnapshot) -> bool {
        (self.predicate)(profile)
    }
}

fn has_personal_info(profile: &ProfileSnapshot) -> bool {
    profile.personal.is_complete()
}

fn has_income_sources(profile: &ProfileSnapshot) -> bool {
    !profile.income_sources.is_empty()
}

fn has_assets(profile: &ProfileSnapshot) -> bool {
    !profile.assets.is_empty()
}

fn has_expenses(profile: &ProfileSnapshot) -> bool {
    !profile.expenses.is_empty()
}

fn has_retirement_details(profile: &ProfileSnapshot) -> bool {
    profile.retirement_age.is_some() && profile.life_expectancy.is_some()
}

fn has_benefits_estimate(profile: &ProfileSnapshot) -> bool {
    profile.benefits_calculator_used
}

/// Categories in declaration order. Missing sections are reported in this
/// order, not by weight.
pub const COMPLETION_CATEGORIES: [CompletionCategory; 6] = [
    CompletionCategory {
        key: CategoryKey::PersonalInfo,
        label: "Personal Information",
        weight: 20,
        description: "Name, birth date, state and marital status",
        suggested_action: Some("Add your personal details"),
        link: Some("/onboarding/personal"),
        predicate: has_personal_info,
    },
    CompletionCategory {
        key: CategoryKey::IncomeSources,
        label: "Income Sources",
        weight: 15,
        description: "Salary, pensions and other recurring income",
        suggested_action: Some("Add an income source"),
        link: Some("/onboarding/income"),
        predicate: has_income_sources,
    },
    CompletionCategory {
        key: CategoryKey::Assets,
        label: "Assets",
        weight: 20,
        description: "Retirement accounts, savings and property",
        suggested_action: Some("Add your accounts and savings"),
        link: Some("/onboarding/assets"),
        predicate: has_assets,
    },
    CompletionCategory {
        key: CategoryKey::Expenses,
        label: "Expenses",
        weight: 15,
        description: "Expected monthly spending in retirement",
        suggested_action: Some("Estimate your monthly expenses"),
        link: Some("/onboarding/expenses"),
        predicate: has_expenses,
    },
    CompletionCategory {
        key: CategoryKey::RetirementPlanning,
        label: "Retirement Planning Details",
        weight: 15,
        description: "Target retirement age and life expectancy",
        suggested_action: Some("Set your retirement goals"),
        link: Some("/onboarding/retirement"),
        predicate: has_retirement_details,
    },
    CompletionCategory {
        key: CategoryKey::GovernmentBenefits,
        label: "Government Benefits",
        weight: 15,
        description: "Estimated Social Security and pension benefits",
        suggested_action: Some("Run the benefits calculator"),
        link: Some("/tools/benefits-calculator"),
        predicate: has_benefits_estimate,
    },
];

/// Sum of all category weights
pub const TOTAL_WEIGHT: u32 = total_weight(&COMPLETION_CATEGORIES);

const fn total_weight(categories: &[CompletionCategory]) -> u32 {
    let mut sum = 0;
    let mut i = 0;
    while i < categories.len() {
        sum += categories[i].weight;
        i += 1;
    }
    sum
}

const _: () = assert!(TOTAL_WEIGHT == 100, "completion weights must sum to 100");

/// Look up a category by key
pub fn category(key: CategoryKey) -> CompletionCategory {
    COMPLETION_CATEGORIES
        .into_iter()
        .find(|c| c.key == key)
        .unwrap_or(COMPLETION_CATEGORIES[0])
}

/// A category that still needs work, with a hint on how to finish it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingSection {
    pub key: CategoryKey,
    pub title: String,
    pub description: String,
    pub weight: u32,
    pub suggested_action: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    pub key: CategoryKey,
    pub label: String,
    pub weight: u32,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResult {
    /// 0..=100
    pub percentage: u8,
    pub completed_sections: Vec<String>,
    pub missing_sections: Vec<MissingSection>,
    pub breakdown: Vec<CategoryBreakdown>,
}

impl CompletionResult {
    pub fn level(&self) -> CompletionLevel {
        get_completion_level(self.percentage)
    }

    pub fn next_action(&self) -> Option<&MissingSection> {
        get_next_action(&self.missing_sections)
    }
}

/// Score a profile. Pure; recompute on every render rather than caching.
pub fn calculate_completion(profile: &ProfileSnapshot) -> CompletionResult {
    let breakdown: Vec<CategoryBreakdown> = COMPLETION_CATEGORIES
        .iter()
        .map(|c| CategoryBreakdown {
            key: c.key,
            label: c.label.to_string(),
            weight: c.weight,
            completed: c.is_satisfied(profile),
        })
        .collect();

    let completed_sections = breakdown
        .iter()
        .filter(|b| b.completed)
        .map(|b| b.label.clone())
        .collect();

    let missing_sections = COMPLETION_CATEGORIES
        .iter()
        .zip(&breakdown)
        .filter(|(_, b)| !b.completed)
        .map(|(c, _)| MissingSection {
            key: c.key,
            title: c.label.to_string(),
            description: c.description.to_string(),
            weight: c.weight,
            suggested_action: c.suggested_action.map(str::to_string),
            link: c.link.map(str::to_string),
        })
        .collect();

    let earned: u32 = breakdown
        .iter()
        .filter(|b| b.completed)
        .map(|b| b.weight)
        .sum();
    // Weights are integers summing to 100, so this rounding never changes the value
    let percentage = (f64::from(earned) * 100.0 / f64::from(TOTAL_WEIGHT)).round();

    CompletionResult {
        percentage: percentage.clamp(0.0, 100.0) as u8,
        completed_sections,
        missing_sections,
        breakdown,
    }
}

/// Coarse label for a completion percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompletionLevel {
    GettingStarted,
    InProgress,
    AlmostThere,
    Complete,
}

impl CompletionLevel {
    pub fn label(&self) -> &'static str {
        match self {
            CompletionLevel::GettingStarted => "Getting Started",
            CompletionLevel::InProgress => "In Progress",
            CompletionLevel::AlmostThere => "Almost There",
            CompletionLevel::Complete => "Complete",
        }
    }
}

impl fmt::Display for CompletionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `[0,25)` getting started, `[25,60)` in progress, `[60,100)` almost there,
/// `100` complete
pub fn get_completion_level(percentage: u8) -> CompletionLevel {
    match percentage {
        0..=24 => CompletionLevel::GettingStarted,
        25..=59 => CompletionLevel::InProgress,
        60..=99 => CompletionLevel::AlmostThere,
        _ => CompletionLevel::Complete,
    }
}

/// The heaviest missing section; the first one wins a tie
pub fn get_next_action(missing: &[MissingSection]) -> Option<&MissingSection> {
    missing.iter().fold(None, |best, section| match best {
        Some(current) if current.weight >= section.weight => Some(current),
        _ => Some(section),
    })
}
