//! First-run onboarding wizard
//!
//! The wizard walks a new owner through five fixed steps. Progress is kept in
//! a [`KeyValueStore`] and written on every mutation, so a restart resumes
//! exactly where the owner left off.

use crate::error::{ChargeDeckError, Result};
use crate::logging::get_logger;
use crate::persistence::KeyValueStore;
use serde::Serialize;
use std::collections::HashSet;

/// Storage key of the "wizard running" flag
pub const KEY_ACTIVE: &str = "onboarding.active";
/// Storage key of the current step index
pub const KEY_STEP: &str = "onboarding.step";
/// Storage key of the JSON array of completed step ids
pub const KEY_COMPLETED: &str = "onboarding.completed";
/// Storage key of the charger being set up
pub const KEY_CHARGER_ID: &str = "onboarding.charger_id";

const ALL_KEYS: [&str; 4] = [KEY_ACTIVE, KEY_STEP, KEY_COMPLETED, KEY_CHARGER_ID];

/// Placeholder replaced by the stored charger id in step paths
const CHARGER_PLACEHOLDER: &str = ":id";

/// One wizard step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OnboardingStep {
    pub id: &'static str,
    pub title: &'static str,
    pub path: &'static str,
}

/// The wizard, in order
pub const STEPS: [OnboardingStep; 5] = [
    OnboardingStep {
        id: "add-charger",
        title: "Add your charger",
        path: "/chargers/add",
    },
    OnboardingStep {
        id: "pricing",
        title: "Set your pricing",
        path: "/chargers/:id/pricing",
    },
    OnboardingStep {
        id: "availability",
        title: "Choose availability",
        path: "/chargers/:id/availability",
    },
    OnboardingStep {
        id: "access",
        title: "Control access",
        path: "/chargers/:id/access",
    },
    OnboardingStep {
        id: "go-live",
        title: "Go live",
        path: "/chargers/:id",
    },
];

/// Look up a step by id
pub fn step_by_id(id: &str) -> Option<&'static OnboardingStep> {
    STEPS.iter().find(|s| s.id == id)
}

/// Decode the persisted completed list; unknown ids are malformed, repeats collapse
fn parse_completed(raw: &str) -> Result<Vec<String>> {
    let ids = serde_json::from_str::<Vec<String>>(raw).map_err(|e| {
        ChargeDeckError::validation(KEY_COMPLETED, format!("not a list of ids: {}", e))
    })?;
    let mut seen = HashSet::with_capacity(ids.len());
    let mut completed = Vec::with_capacity(ids.len());
    for id in ids {
        if step_by_id(&id).is_none() {
            return Err(ChargeDeckError::validation(
                KEY_COMPLETED,
                format!("unknown step id '{}'", id),
            ));
        }
        if seen.insert(id.clone()) {
            completed.push(id);
        }
    }
    Ok(completed)
}

/// Position in the wizard, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub percentage: f64,
}

/// Serializable view of the whole store
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingView {
    pub is_onboarding: bool,
    pub current_step: usize,
    pub step: OnboardingStep,
    pub completed_steps: Vec<String>,
    pub charger_id: Option<String>,
    pub progress: Progress,
    pub route: Option<String>,
}

/// Onboarding progress backed by key/value storage
pub struct OnboardingStore {
    storage: Box<dyn KeyValueStore>,
    is_onboarding: bool,
    current_step: usize,
    completed_steps: Vec<String>,
    charger_id: Option<String>,
    logger: crate::logging::StructuredLogger,
}

impl OnboardingStore {
    /// Rehydrate from storage
    ///
    /// Absent keys mean "not onboarding". Malformed values are dropped, the
    /// stale keys are cleared and the store starts from its initial state.
    pub fn open(storage: Box<dyn KeyValueStore>) -> Self {
        let mut store = Self {
            storage,
            is_onboarding: false,
            current_step: 0,
            completed_steps: Vec::new(),
            charger_id: None,
            logger: get_logger("onboarding"),
        };

        match store.read_persisted() {
            Ok(()) => {
                if store.is_onboarding {
                    store.logger.info(&format!(
                        "Resuming onboarding at step {} ({})",
                        store.current_step + 1,
                        STEPS[store.current_step].id
                    ));
                }
            }
            Err(e) => {
                store
                    .logger
                    .warn(&format!("Resetting malformed onboarding state: {}", e));
                store.reset_memory();
                if let Err(e) = store.clear_storage() {
                    store
                        .logger
                        .error(&format!("Failed to clear onboarding state: {}", e));
                }
            }
        }
        store
    }

    fn read_persisted(&mut self) -> Result<()> {
        self.is_onboarding = match self.storage.get(KEY_ACTIVE).as_deref() {
            None | Some("false") => false,
            Some("true") => true,
            Some(other) => {
                return Err(ChargeDeckError::validation(
                    KEY_ACTIVE,
                    format!("expected true/false, got '{}'", other),
                ));
            }
        };

        self.current_step = match self.storage.get(KEY_STEP) {
            None => 0,
            Some(raw) => {
                let step: usize = raw.trim().parse().map_err(|_| {
                    ChargeDeckError::validation(KEY_STEP, format!("not an index: '{}'", raw))
                })?;
                if step >= STEPS.len() {
                    return Err(ChargeDeckError::validation(
                        KEY_STEP,
                        format!("index {} out of range", step),
                    ));
                }
                step
            }
        };

        self.completed_steps = match self.storage.get(KEY_COMPLETED) {
            None => Vec::new(),
            Some(raw) => parse_completed(&raw)?,
        };

        self.charger_id = self.storage.get(KEY_CHARGER_ID).filter(|s| !s.is_empty());
        Ok(())
    }

    fn reset_memory(&mut self) {
        self.is_onboarding = false;
        self.current_step = 0;
        self.completed_steps.clear();
        self.charger_id = None;
    }

    fn clear_storage(&mut self) -> Result<()> {
        for key in ALL_KEYS {
            self.storage.remove(key)?;
        }
        Ok(())
    }

    fn persist_step(&mut self) -> Result<()> {
        self.storage.set(KEY_STEP, &self.current_step.to_string())
    }

    fn persist_completed(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.completed_steps)?;
        self.storage.set(KEY_COMPLETED, &json)
    }

    /// Begin (or restart) the wizard at the first step
    pub fn start(&mut self) -> Result<()> {
        self.is_onboarding = true;
        self.current_step = 0;
        self.completed_steps.clear();
        self.storage.set(KEY_ACTIVE, "true")?;
        self.persist_step()?;
        self.persist_completed()?;
        self.logger.info("Onboarding started");
        Ok(())
    }

    /// Mark a step complete; completing it again changes nothing
    pub fn complete_step(&mut self, id: &str) -> Result<()> {
        if step_by_id(id).is_none() {
            return Err(ChargeDeckError::validation(
                "step",
                format!("Unknown onboarding step '{}'", id),
            ));
        }
        if self.completed_steps.iter().any(|s| s == id) {
            return Ok(());
        }
        self.completed_steps.push(id.to_string());
        self.persist_completed()?;
        self.logger.debug(&format!("Completed onboarding step {}", id));
        Ok(())
    }

    /// Move to the next step; advancing past the last step finishes the wizard
    pub fn advance(&mut self) -> Result<()> {
        if self.current_step + 1 >= STEPS.len() {
            return self.finish();
        }
        self.current_step += 1;
        self.persist_step()
    }

    /// Clear all onboarding state, in memory and in storage
    pub fn finish(&mut self) -> Result<()> {
        self.reset_memory();
        self.clear_storage()?;
        self.logger.info("Onboarding finished");
        Ok(())
    }

    /// Remember the charger being configured
    pub fn set_charger_id(&mut self, charger_id: &str) -> Result<()> {
        let charger_id = charger_id.trim();
        if charger_id.is_empty() {
            return Err(ChargeDeckError::validation(
                "charger_id",
                "Charger id cannot be empty",
            ));
        }
        self.storage.set(KEY_CHARGER_ID, charger_id)?;
        self.charger_id = Some(charger_id.to_string());
        Ok(())
    }

    pub fn progress(&self) -> Progress {
        let total = STEPS.len();
        let current = self.current_step + 1;
        Progress {
            current,
            total,
            percentage: (current * 100) as f64 / total as f64,
        }
    }

    /// Path of a step with `:id` replaced by the stored charger id
    pub fn route_for_step(&self, index: usize) -> Option<String> {
        let step = STEPS.get(index)?;
        Some(match &self.charger_id {
            Some(id) => step.path.replace(CHARGER_PLACEHOLDER, id),
            None => step.path.to_string(),
        })
    }

    pub fn is_onboarding(&self) -> bool {
        self.is_onboarding
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn completed_steps(&self) -> &[String] {
        &self.completed_steps
    }

    pub fn charger_id(&self) -> Option<&str> {
        self.charger_id.as_deref()
    }

    pub fn view(&self) -> OnboardingView {
        OnboardingView {
            is_onboarding: self.is_onboarding,
            current_step: self.current_step,
            step: STEPS[self.current_step],
            completed_steps: self.completed_steps.clone(),
            charger_id: self.charger_id.clone(),
            progress: self.progress(),
            route: self.route_for_step(self.current_step),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn store_with(entries: &[(&str, &str)]) -> OnboardingStore {
        let mut mem = MemoryStore::new();
        for (k, v) in entries {
            mem.set(k, v).unwrap();
        }
        OnboardingStore::open(Box::new(mem))
    }

    #[test]
    fn empty_storage_is_not_onboarding() {
        let store = store_with(&[]);
        assert!(!store.is_onboarding());
        assert_eq!(store.current_step(), 0);
    }

    #[test]
    fn progress_percentages_per_step() {
        let mut store = store_with(&[]);
        store.start().unwrap();
        for i in 0..STEPS.len() {
            let p = store.progress();
            assert_eq!(p.current, i + 1);
            assert_eq!(p.total, 5);
            assert!((p.percentage - (i + 1) as f64 / 5.0 * 100.0).abs() < 1e-9);
            if i + 1 < STEPS.len() {
                store.advance().unwrap();
            }
        }
    }

    #[test]
    fn complete_step_is_idempotent() {
        let mut store = store_with(&[]);
        store.start().unwrap();
        store.complete_step("pricing").unwrap();
        store.complete_step("pricing").unwrap();
        assert_eq!(store.completed_steps(), ["pricing"]);
    }

    #[test]
    fn unknown_step_is_rejected() {
        let mut store = store_with(&[]);
        assert!(matches!(
            store.complete_step("teleport"),
            Err(ChargeDeckError::Validation { .. })
        ));
        assert!(store.completed_steps().is_empty());
    }

    #[test]
    fn advance_past_last_step_finishes() {
        let mut store = store_with(&[(KEY_ACTIVE, "true"), (KEY_STEP, "4")]);
        assert!(store.is_onboarding());
        store.advance().unwrap();
        assert!(!store.is_onboarding());
        assert_eq!(store.current_step(), 0);
    }

    #[test]
    fn route_substitutes_charger_id() {
        let mut store = store_with(&[]);
        assert_eq!(store.route_for_step(1).as_deref(), Some("/chargers/:id/pricing"));
        store.set_charger_id("CHG-001").unwrap();
        assert_eq!(
            store.route_for_step(1).as_deref(),
            Some("/chargers/CHG-001/pricing")
        );
        assert_eq!(store.route_for_step(0).as_deref(), Some("/chargers/add"));
        assert!(store.route_for_step(5).is_none());
    }

    #[test]
    fn malformed_completed_list_resets() {
        let store = store_with(&[
            (KEY_ACTIVE, "true"),
            (KEY_STEP, "2"),
            (KEY_COMPLETED, "{not json"),
        ]);
        assert!(!store.is_onboarding());
        assert_eq!(store.current_step(), 0);
        assert!(store.completed_steps().is_empty());
    }

    #[test]
    fn repeated_completed_ids_collapse_on_load() {
        let store = store_with(&[
            (KEY_ACTIVE, "true"),
            (KEY_STEP, "2"),
            (KEY_COMPLETED, r#"["add-charger","pricing","add-charger"]"#),
        ]);
        assert!(store.is_onboarding());
        assert_eq!(store.completed_steps(), ["add-charger", "pricing"]);
    }

    #[test]
    fn unknown_completed_id_resets() {
        let store = store_with(&[
            (KEY_ACTIVE, "true"),
            (KEY_STEP, "2"),
            (KEY_COMPLETED, r#"["add-charger","pricing","add-charger","bogus"]"#),
        ]);
        assert!(!store.is_onboarding());
        assert_eq!(store.current_step(), 0);
        assert!(store.completed_steps().is_empty());
    }

    #[test]
    fn out_of_range_step_resets() {
        let store = store_with(&[(KEY_ACTIVE, "true"), (KEY_STEP, "9")]);
        assert!(!store.is_onboarding());
        assert_eq!(store.current_step(), 0);
    }

    #[test]
    fn view_reflects_state() {
        let mut store = store_with(&[]);
        store.start().unwrap();
        store.set_charger_id("CHG-003").unwrap();
        store.advance().unwrap();
        let view = store.view();
        assert!(view.is_onboarding);
        assert_eq!(view.step.id, "pricing");
        assert_eq!(view.route.as_deref(), Some("/chargers/CHG-003/pricing"));
        assert_eq!(view.progress.current, 2);
    }
}
