//! CSV-backed scenario and behavior stores.
//! Loaded once at startup, read-only afterwards.

use rand::seq::SliceRandom;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no prompt found for scenario '{0}'")]
    ScenarioNotFound(String),

    #[error("no behavior pattern defined for '{0}'")]
    BehaviorNotFound(BehaviorType),

    #[error("no more unused scenarios available")]
    ScenariosExhausted,

    #[error("failed to read store file: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Scenario")]
    pub scenario: String,
    #[serde(rename = "Example Conversation")]
    pub example_conversation: String,
    #[serde(rename = "Keywords")]
    pub keywords: String,
}

impl PromptRecord {
    /// Renders the static context block handed to the prompt template.
    pub fn render_context(&self) -> String {
        format!(
            "Title: {}\nScenario: {}\nExample Conversation: {}\nKeywords: {}",
            self.title, self.scenario, self.example_conversation, self.keywords
        )
        .trim()
        .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum BehaviorType {
    #[serde(rename = "Polite Customer")]
    Polite,
    #[serde(rename = "Rude Customer")]
    Rude,
}

impl BehaviorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorType::Polite => "Polite Customer",
            BehaviorType::Rude => "Rude Customer",
        }
    }
}

impl fmt::Display for BehaviorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BehaviorRecord {
    #[serde(rename = "Type")]
    pub behavior_type: BehaviorType,
    #[serde(rename = "Behavior")]
    pub behavior: String,
}

pub struct PromptStore {
    records: Vec<PromptRecord>,
}

impl PromptStore {
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let mut reader = csv::Reader::from_path(path)?;
        let records = reader
            .deserialize()
            .collect::<Result<Vec<PromptRecord>, _>>()?;
        Ok(Self { records })
    }

    pub fn from_records(records: Vec<PromptRecord>) -> Self {
        Self { records }
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    /// Case-insensitive substring match against titles. First match in store
    /// order wins; store order is significant when titles overlap.
    pub fn lookup(&self, fragment: &str) -> Option<&PromptRecord> {
        let needle = fragment.to_lowercase();
        self.records
            .iter()
            .find(|r| r.title.to_lowercase().contains(&needle))
    }

    /// Picks a scenario title uniformly at random among those not yet used.
    pub fn select_scenario(&self, used: &[String]) -> Result<&str, StoreError> {
        let available: Vec<&PromptRecord> = self
            .records
            .iter()
            .filter(|r| !used.iter().any(|u| u == &r.title))
            .collect();

        let mut rng = rand::thread_rng();
        available
            .choose(&mut rng)
            .map(|r| r.title.as_str())
            .ok_or(StoreError::ScenariosExhausted)
    }

    /// Resolves a scenario fragment to a record. A blank fragment picks a
    /// random title first, then falls through the same lookup path.
    pub fn resolve(&self, fragment: &str) -> Result<&PromptRecord, StoreError> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            let title = self.select_scenario(&[])?.to_string();
            return self
                .lookup(&title)
                .ok_or(StoreError::ScenarioNotFound(title));
        }
        self.lookup(fragment)
            .ok_or_else(|| StoreError::ScenarioNotFound(fragment.to_string()))
    }
}

pub struct BehaviorStore {
    records: Vec<BehaviorRecord>,
}

impl BehaviorStore {
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let mut reader = csv::Reader::from_path(path)?;
        let records = reader
            .deserialize()
            .collect::<Result<Vec<BehaviorRecord>, _>>()?;
        Ok(Self { records })
    }

    pub fn from_records(records: Vec<BehaviorRecord>) -> Self {
        Self { records }
    }

    /// Behavior follows a step function over the call index: the first
    /// `polite_limit` calls are polite, everything after is rude.
    pub fn for_call(
        &self,
        call_index: usize,
        polite_limit: usize,
    ) -> Result<&BehaviorRecord, StoreError> {
        let wanted = if call_index < polite_limit {
            BehaviorType::Polite
        } else {
            BehaviorType::Rude
        };
        self.records
            .iter()
            .find(|r| r.behavior_type == wanted)
            .ok_or(StoreError::BehaviorNotFound(wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(title: &str) -> PromptRecord {
        PromptRecord {
            title: title.to_string(),
            scenario: format!("Scenario text for {}", title),
            example_conversation: "Agent: hi\nCustomer: hello".to_string(),
            keywords: "billing, refund".to_string(),
        }
    }

    fn sample_prompts() -> PromptStore {
        PromptStore::from_records(vec![
            prompt("busy_customer"),
            prompt("angry_customer"),
            prompt("confused_customer"),
        ])
    }

    fn sample_behaviors() -> BehaviorStore {
        BehaviorStore::from_records(vec![
            BehaviorRecord {
                behavior_type: BehaviorType::Polite,
                behavior: "Patient and friendly.".to_string(),
            },
            BehaviorRecord {
                behavior_type: BehaviorType::Rude,
                behavior: "Impatient and dismissive.".to_string(),
            },
        ])
    }

    #[test]
    fn behavior_is_polite_below_limit_and_rude_at_it() {
        let store = sample_behaviors();
        for i in 0..5 {
            let rec = store.for_call(i, 5).unwrap();
            assert_eq!(rec.behavior_type, BehaviorType::Polite);
        }
        for i in 5..10 {
            let rec = store.for_call(i, 5).unwrap();
            assert_eq!(rec.behavior_type, BehaviorType::Rude);
        }
    }

    #[test]
    fn missing_behavior_type_is_a_lookup_failure() {
        let store = BehaviorStore::from_records(vec![BehaviorRecord {
            behavior_type: BehaviorType::Polite,
            behavior: "Friendly.".to_string(),
        }]);
        let err = store.for_call(7, 5).unwrap_err();
        assert!(matches!(err, StoreError::BehaviorNotFound(BehaviorType::Rude)));
    }

    #[test]
    fn select_scenario_never_repeats_and_exhausts_exactly_once() {
        let store = sample_prompts();
        let mut used: Vec<String> = Vec::new();
        for _ in 0..store.total() {
            let title = store.select_scenario(&used).unwrap().to_string();
            assert!(!used.contains(&title));
            used.push(title);
        }
        let err = store.select_scenario(&used).unwrap_err();
        assert!(matches!(err, StoreError::ScenariosExhausted));
    }

    #[test]
    fn lookup_is_case_insensitive_and_idempotent() {
        let store = sample_prompts();
        let upper = store.lookup("BUSY").unwrap();
        let lower = store.lookup("busy").unwrap();
        assert_eq!(upper.title, lower.title);
        assert_eq!(upper.title, "busy_customer");

        let again = store.lookup("busy").unwrap();
        assert_eq!(again.title, lower.title);
        assert_eq!(again.scenario, lower.scenario);
    }

    #[test]
    fn lookup_returns_first_match_in_store_order() {
        let store = PromptStore::from_records(vec![
            prompt("customer_one"),
            prompt("customer_two"),
        ]);
        let rec = store.lookup("customer").unwrap();
        assert_eq!(rec.title, "customer_one");
    }

    #[test]
    fn resolve_blank_fragment_picks_from_the_full_set() {
        let store = sample_prompts();
        let rec = store.resolve("  ").unwrap();
        let titles = ["busy_customer", "angry_customer", "confused_customer"];
        assert!(titles.contains(&rec.title.as_str()));
    }

    #[test]
    fn resolve_unknown_fragment_is_not_found() {
        let store = sample_prompts();
        let err = store.resolve("no_such_scenario").unwrap_err();
        assert!(matches!(err, StoreError::ScenarioNotFound(_)));
    }

    #[test]
    fn context_block_lists_all_fields_in_order() {
        let rec = prompt("busy_customer");
        let ctx = rec.render_context();
        assert!(ctx.starts_with("Title: busy_customer"));
        let scenario_at = ctx.find("Scenario:").unwrap();
        let example_at = ctx.find("Example Conversation:").unwrap();
        let keywords_at = ctx.find("Keywords:").unwrap();
        assert!(scenario_at < example_at && example_at < keywords_at);
    }
}
