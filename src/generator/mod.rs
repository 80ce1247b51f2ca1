//! Spark suggestion generation
//!
//! A generator turns a goal plus the sparks already suggested for it into one
//! new tiny next step. Generation never fails from the caller's point of view:
//! any upstream problem degrades to a fixed fallback suggestion, and the
//! returned [`Suggestion`] says which of the two it is.

mod chat;
mod prompt;

pub use chat::ChatCompletionsGenerator;
pub use prompt::build_prompt;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::store::Spark;

/// Minutes assumed when the effort string carries no number
pub const DEFAULT_EFFORT_MINUTES: i64 = 3;

/// Input to a single generation call
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub goal_title: &'a str,
    pub goal_description: Option<&'a str>,
    /// Sparks already generated for the goal, in sequence order
    pub previous_sparks: &'a [Spark],
}

/// The four-field object the model is asked to produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparkSuggestion {
    pub title: String,
    pub description: String,
    pub effort: String,
    #[serde(default)]
    pub resource_link: Option<String>,
}

impl SparkSuggestion {
    pub fn fallback() -> Self {
        Self {
            title: "Search for beginner guides".to_string(),
            description: "Spend 2 minutes finding one helpful resource".to_string(),
            effort: "2-3 min".to_string(),
            resource_link: None,
        }
    }

    pub fn effort_minutes(&self) -> i64 {
        effort_minutes(&self.effort)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionOrigin {
    Model,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub spark: SparkSuggestion,
    pub origin: SuggestionOrigin,
}

impl Suggestion {
    pub fn from_model(spark: SparkSuggestion) -> Self {
        Self {
            spark,
            origin: SuggestionOrigin::Model,
        }
    }

    pub fn fallback() -> Self {
        Self {
            spark: SparkSuggestion::fallback(),
            origin: SuggestionOrigin::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.origin == SuggestionOrigin::Fallback
    }
}

#[async_trait]
pub trait SparkGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Suggestion;
}

/// First integer in the effort string, e.g. "2-5 min" -> 2
pub fn effort_minutes(effort: &str) -> i64 {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    let digits = DIGITS.get_or_init(|| Regex::new(r"\d+").expect("valid digits regex"));

    // Digit runs too long for an i64 saturate
    digits
        .find(effort)
        .map(|m| m.as_str().parse().unwrap_or(i64::MAX))
        .unwrap_or(DEFAULT_EFFORT_MINUTES)
}

/// Strip markdown code fences the model sometimes wraps JSON in
pub fn strip_code_fences(text: &str) -> String {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| Regex::new(r"```(?:json)?\n?").expect("valid fence regex"));

    fence.replace_all(text.trim(), "").trim().to_string()
}

/// Parse model output into a suggestion
pub fn parse_suggestion(text: &str) -> Result<SparkSuggestion, serde_json::Error> {
    let mut spark: SparkSuggestion = serde_json::from_str(&strip_code_fences(text))?;
    spark.resource_link = spark
        .resource_link
        .filter(|link| !link.trim().is_empty() && link.trim() != "null");
    Ok(spark)
}
