//! Goal and spark operations shared by the HTTP API and the CLI
//!
//! Every operation is scoped to the calling user: rows owned by someone else
//! are reported as not found.

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::generator::{GenerationRequest, SparkGenerator};
use crate::store::{
    CompletedSpark, CompletionOutcome, Goal, GoalStatus, GoalUpdate, NewCompletion, NewSpark,
    Spark, SparkCompletion, SparkStore,
};

/// Requested edits to a goal, before validation
#[derive(Debug, Clone, Default)]
pub struct GoalPatch {
    pub title: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub status: Option<String>,
}

#[derive(Clone)]
pub struct SparkService {
    store: Arc<SparkStore>,
    generator: Arc<dyn SparkGenerator>,
}

impl SparkService {
    pub fn new(store: Arc<SparkStore>, generator: Arc<dyn SparkGenerator>) -> Self {
        Self { store, generator }
    }

    pub fn ensure_profile(&self, user_id: &str) -> ApiResult<()> {
        self.store.ensure_profile(user_id)?;
        Ok(())
    }

    // ============================================
    // GOALS
    // ============================================

    pub fn list_goals(&self, user_id: &str) -> ApiResult<Vec<Goal>> {
        Ok(self.store.list_goals(user_id)?)
    }

    pub fn create_goal(
        &self,
        user_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> ApiResult<Goal> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ApiError::Validation("Title is required".to_string()));
        }

        let goal = self
            .store
            .create_goal(user_id, title, normalize_text(description).as_deref())?;
        info!(user = user_id, goal = %goal.id, "goal created");
        Ok(goal)
    }

    pub fn get_goal(&self, user_id: &str, goal_id: &str) -> ApiResult<Goal> {
        self.store
            .get_goal(user_id, goal_id)?
            .ok_or_else(goal_not_found)
    }

    pub fn update_goal(&self, user_id: &str, goal_id: &str, patch: GoalPatch) -> ApiResult<Goal> {
        self.get_goal(user_id, goal_id)?;

        let title = match patch.title {
            Some(title) => {
                let title = title.trim().to_string();
                if title.is_empty() {
                    return Err(ApiError::Validation("Title cannot be empty".to_string()));
                }
                Some(title)
            }
            None => None,
        };

        let status = patch
            .status
            .map(|s| s.parse::<GoalStatus>())
            .transpose()
            .map_err(|e| ApiError::Validation(e.to_string()))?;

        let update = GoalUpdate {
            title,
            description: patch.description.map(|d| normalize_text(d.as_deref())),
            status,
        };

        let goal = self
            .store
            .update_goal(user_id, goal_id, &update)?
            .ok_or_else(goal_not_found)?;
        info!(user = user_id, goal = %goal.id, status = %goal.status, "goal updated");
        Ok(goal)
    }

    pub fn delete_goal(&self, user_id: &str, goal_id: &str) -> ApiResult<()> {
        if !self.store.delete_goal(user_id, goal_id)? {
            return Err(goal_not_found());
        }
        info!(user = user_id, goal = goal_id, "goal deleted");
        Ok(())
    }

    /// Goal plus its completion history, newest first
    pub fn completed_sparks(
        &self,
        user_id: &str,
        goal_id: &str,
    ) -> ApiResult<(Goal, Vec<CompletedSpark>)> {
        let goal = self.get_goal(user_id, goal_id)?;
        let completed = self.store.completed_sparks(user_id, goal_id)?;
        Ok((goal, completed))
    }

    // ============================================
    // SPARKS
    // ============================================

    pub fn list_sparks(&self, user_id: &str, goal_id: &str) -> ApiResult<Vec<Spark>> {
        self.get_goal(user_id, goal_id)?;
        Ok(self.store.list_sparks(goal_id)?)
    }

    /// Ask the generator for the next spark and persist it at the end of
    /// the goal's sequence
    pub async fn generate_spark(
        &self,
        user_id: &str,
        goal_id: &str,
        goal_title: &str,
        goal_description: Option<&str>,
    ) -> ApiResult<Spark> {
        if goal_id.trim().is_empty() || goal_title.trim().is_empty() {
            return Err(ApiError::Validation(
                "Goal ID and title are required".to_string(),
            ));
        }
        self.get_goal(user_id, goal_id)?;

        let previous_sparks = self.store.list_sparks(goal_id)?;
        let suggestion = self
            .generator
            .generate(&GenerationRequest {
                goal_title: goal_title.trim(),
                goal_description,
                previous_sparks: &previous_sparks,
            })
            .await;

        let ai_generated = !suggestion.is_fallback();
        if !ai_generated {
            warn!(goal = goal_id, "storing fallback spark");
        }

        let new_spark = NewSpark {
            effort_minutes: suggestion.spark.effort_minutes(),
            title: suggestion.spark.title,
            description: normalize_text(Some(&suggestion.spark.description)),
            resource_link: suggestion.spark.resource_link,
            ai_generated,
        };

        let spark = self.store.insert_spark(goal_id, &new_spark)?;
        info!(
            user = user_id,
            goal = goal_id,
            spark = %spark.id,
            sequence = spark.sequence_number,
            ai_generated = spark.ai_generated,
            "spark generated"
        );
        Ok(spark)
    }

    /// Mark a spark done for the caller; a second completion is a conflict
    pub fn complete_spark(
        &self,
        user_id: &str,
        spark_id: &str,
        goal_id: &str,
        session_id: &str,
        notes: Option<&str>,
    ) -> ApiResult<SparkCompletion> {
        if spark_id.trim().is_empty() || goal_id.trim().is_empty() || session_id.trim().is_empty()
        {
            return Err(ApiError::Validation(
                "Spark ID, goal ID, and session ID are required".to_string(),
            ));
        }
        self.get_goal(user_id, goal_id)?;

        let spark = self
            .store
            .get_spark(spark_id)?
            .filter(|spark| spark.goal_id == goal_id)
            .ok_or_else(|| ApiError::NotFound("Spark not found".to_string()))?;

        let outcome = self.store.complete_spark(
            user_id,
            &NewCompletion {
                spark_id: spark.id,
                goal_id: goal_id.to_string(),
                session_id: Some(session_id.to_string()),
                notes: normalize_text(notes),
            },
        )?;

        match outcome {
            CompletionOutcome::Created(completion) => {
                info!(user = user_id, goal = goal_id, spark = spark_id, "spark completed");
                Ok(completion)
            }
            CompletionOutcome::AlreadyCompleted => {
                Err(ApiError::Conflict("Spark already completed".to_string()))
            }
        }
    }
}

fn goal_not_found() -> ApiError {
    ApiError::NotFound("Goal not found".to_string())
}

/// Trimmed text, with blank input treated as absent
fn normalize_text(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
