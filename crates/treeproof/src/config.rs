//! Prover configuration types.

use crate::logic::AccessibilityProperty;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the proof search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProverConfig {
    pub max_steps: usize,
    pub timeout: Duration,
    /// Tree priority an alternative may reach before the search looks elsewhere
    pub initial_depth_limit: usize,
    pub depth_limit_increment: usize,
    pub max_alternatives: usize,
    /// Distinct closing substitutions kept per literal check
    pub max_closure_options: usize,
    /// Problems the equality reasoner may expand per call
    pub equality_max_problems: usize,
    /// Run the model finder in lock-step with the tableau
    pub model_finder: bool,
    pub model_steps_per_step: usize,
    pub max_individuals: usize,
    pub max_worlds: usize,
    pub max_ground_constraints: usize,
    /// Steps between status callbacks
    pub status_interval: usize,
    pub accessibility: Vec<AccessibilityProperty>,
}

impl Default for ProverConfig {
    fn default() -> Self {
        ProverConfig {
            max_steps: 20_000, // 0 means no limit
            timeout: Duration::from_secs(60),
            initial_depth_limit: 4,
            depth_limit_increment: 2,
            max_alternatives: 64,
            max_closure_options: 8,
            equality_max_problems: 200,
            model_finder: true,
            model_steps_per_step: 4,
            max_individuals: 8,
            max_worlds: 8,
            max_ground_constraints: 50_000,
            status_interval: 100,
            accessibility: Vec::new(),
        }
    }
}

impl ProverConfig {
    pub fn with_accessibility(mut self, properties: &[AccessibilityProperty]) -> Self {
        for property in properties {
            if !self.accessibility.contains(property) {
                self.accessibility.push(*property);
            }
        }
        self
    }

    /// Whether the accessibility relation is universal (S5 without guards)
    pub fn universal_accessibility(&self) -> bool {
        self.accessibility.contains(&AccessibilityProperty::Universality)
    }

    pub fn has_property(&self, property: AccessibilityProperty) -> bool {
        self.accessibility.contains(&property)
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
