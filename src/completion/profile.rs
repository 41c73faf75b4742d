//! Household profile collected by the onboarding wizard.
//!
//! Every field defaults so a partially-filled profile (or one saved by an
//! older wizard) still deserializes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileSnapshot {
    pub personal: PersonalInfo,
    pub income_sources: Vec<IncomeSource>,
    pub assets: Vec<Asset>,
    pub expenses: Vec<Expense>,
    /// Target retirement age
    pub retirement_age: Option<u32>,
    /// Planning horizon in years of age
    pub life_expectancy: Option<u32>,
    /// Set by the host once the benefits projection service has been run
    pub benefits_calculator_used: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    /// ISO-8601 date, e.g. "1961-04-12"
    pub birth_date: String,
    /// State or province used for tax rules
    pub region: String,
    pub marital_status: String,
}

impl PersonalInfo {
    /// All required personal fields are filled in (whitespace does not count)
    pub fn is_complete(&self) -> bool {
        [
            &self.first_name,
            &self.last_name,
            &self.birth_date,
            &self.region,
            &self.marital_status,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncomeSource {
    /// e.g. "salary", "pension", "rental"
    pub source: String,
    pub annual_amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Asset {
    /// e.g. "401k", "ira", "brokerage", "home"
    pub kind: String,
    pub balance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Expense {
    pub category: String,
    pub monthly_amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_deserializes_with_defaults() {
        let profile: ProfileSnapshot =
            serde_json::from_str(r#"{"personal": {"firstName": "Ada"}, "retirementAge": 65}"#)
                .unwrap();

        assert_eq!(profile.personal.first_name, "Ada");
        assert_eq!(profile.personal.last_name, "");
        assert_eq!(profile.retirement_age, Some(65));
        assert!(profile.income_sources.is_empty());
        assert!(!profile.benefits_calculator_used);
    }

    #[test]
    fn test_personal_info_requires_every_field() {
        let mut personal = PersonalInfo {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            birth_date: "1961-04-12".to_string(),
            region: "CA".to_string(),
            marital_status: "married".to_string(),
        };
        assert!(personal.is_complete());

        personal.region = "   ".to_string();
        assert!(!personal.is_complete());
    }
}
