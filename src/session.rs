//! Client-side work session state
//!
//! A session tracks the chain of sparks completed in one sitting. It lives only
//! in memory and is owned by a single caller.

use uuid::Uuid;

use crate::store::{Goal, Spark, SparkCompletion};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    AwaitingSpark,
    SparkPresented,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    session_id: Option<String>,
    goal_id: Option<String>,
    current_spark: Option<Spark>,
    completed: Vec<SparkCompletion>,
    chain_length: usize,
    active: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a fresh session for a goal
    pub fn start(&mut self, goal_id: &str) {
        self.session_id = Some(Uuid::new_v4().to_string());
        self.goal_id = Some(goal_id.to_string());
        self.current_spark = None;
        self.completed.clear();
        self.chain_length = 0;
        self.active = true;
    }

    /// Stop the session but keep its history for a summary
    pub fn end(&mut self) {
        self.active = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn present(&mut self, spark: Spark) {
        self.current_spark = Some(spark);
    }

    pub fn clear_spark(&mut self) {
        self.current_spark = None;
    }

    pub fn record_completion(&mut self, completion: SparkCompletion) {
        self.completed.push(completion);
        self.chain_length += 1;
        self.current_spark = None;
    }

    pub fn phase(&self) -> SessionPhase {
        match (self.active, &self.current_spark) {
            (false, _) => SessionPhase::Idle,
            (true, None) => SessionPhase::AwaitingSpark,
            (true, Some(_)) => SessionPhase::SparkPresented,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn goal_id(&self) -> Option<&str> {
        self.goal_id.as_deref()
    }

    pub fn current_spark(&self) -> Option<&Spark> {
        self.current_spark.as_ref()
    }

    pub fn completed(&self) -> &[SparkCompletion] {
        &self.completed
    }

    pub fn chain_length(&self) -> usize {
        self.chain_length
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// What the dashboard is currently showing
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DashboardView {
    #[default]
    Idle,
    Creating,
    GoalSelected {
        goal: Goal,
    },
    SparkPresented {
        goal: Goal,
        spark: Spark,
    },
    Completed {
        goal: Goal,
        completion: SparkCompletion,
    },
    Progress {
        goal: Goal,
    },
}

#[derive(Debug, Clone)]
pub enum DashboardEvent {
    NewGoal,
    GoalCreated(Goal),
    CancelCreate,
    SelectGoal(Goal),
    SparkGenerated(Spark),
    SparkCompleted(SparkCompletion),
    ShowProgress,
    Back,
}

impl DashboardView {
    /// Next view for an event; events that make no sense in the current view
    /// leave it unchanged
    pub fn apply(self, event: DashboardEvent) -> Self {
        use DashboardEvent as E;
        use DashboardView as V;

        match (self, event) {
            (V::Idle, E::NewGoal) => V::Creating,
            (V::Creating, E::GoalCreated(goal)) => V::GoalSelected { goal },
            (V::Creating, E::CancelCreate) => V::Idle,
            (V::Creating, _) => V::Creating,

            (_, E::SelectGoal(goal)) => V::GoalSelected { goal },

            (V::GoalSelected { goal }, E::SparkGenerated(spark))
            | (V::SparkPresented { goal, .. }, E::SparkGenerated(spark))
            | (V::Completed { goal, .. }, E::SparkGenerated(spark)) => {
                V::SparkPresented { goal, spark }
            }
            (V::SparkPresented { goal, .. }, E::SparkCompleted(completion)) => {
                V::Completed { goal, completion }
            }

            (V::GoalSelected { goal }, E::ShowProgress)
            | (V::Completed { goal, .. }, E::ShowProgress)
            | (V::SparkPresented { goal, .. }, E::ShowProgress) => V::Progress { goal },
            (V::Progress { goal }, E::Back) => V::GoalSelected { goal },
            (V::GoalSelected { .. }, E::Back) => V::Idle,

            (view, _) => view,
        }
    }

    pub fn goal(&self) -> Option<&Goal> {
        match self {
            DashboardView::Idle | DashboardView::Creating => None,
            DashboardView::GoalSelected { goal }
            | DashboardView::SparkPresented { goal, .. }
            | DashboardView::Completed { goal, .. }
            | DashboardView::Progress { goal } => Some(goal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::GoalStatus;

    fn goal() -> Goal {
        Goal {
            id: "goal-1".to_string(),
            user_id: "alice".to_string(),
            title: "Run a 5k".to_string(),
            description: None,
            status: GoalStatus::Active,
            total_sparks_completed: 0,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn spark(n: i64) -> Spark {
        Spark {
            id: format!("spark-{n}"),
            goal_id: "goal-1".to_string(),
            title: "Lace up your shoes".to_string(),
            description: None,
            effort_minutes: 2,
            resource_link: None,
            ai_generated: true,
            sequence_number: n,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn completion(n: i64) -> SparkCompletion {
        SparkCompletion {
            id: format!("completion-{n}"),
            user_id: "alice".to_string(),
            spark_id: format!("spark-{n}"),
            goal_id: "goal-1".to_string(),
            completed_at: "2026-01-01T00:05:00Z".to_string(),
            session_id: None,
            notes: None,
        }
    }

    #[test]
    fn test_session_lifecycle() {
        let mut session = SessionState::new();
        assert_eq!(session.phase(), SessionPhase::Idle);

        session.start("goal-1");
        assert!(session.is_active());
        assert!(session.session_id().is_some());
        assert_eq!(session.goal_id(), Some("goal-1"));
        assert_eq!(session.phase(), SessionPhase::AwaitingSpark);

        for n in 1..=3 {
            session.present(spark(n));
            assert_eq!(session.phase(), SessionPhase::SparkPresented);
            session.record_completion(completion(n));
            assert_eq!(session.phase(), SessionPhase::AwaitingSpark);
        }
        assert_eq!(session.chain_length(), 3);
        assert_eq!(session.completed().len(), 3);

        session.end();
        assert!(!session.is_active());
        assert_eq!(session.chain_length(), 3);
        assert_eq!(session.goal_id(), Some("goal-1"));

        session.reset();
        assert_eq!(session.chain_length(), 0);
        assert!(session.session_id().is_none());
        assert!(session.goal_id().is_none());
    }

    #[test]
    fn test_start_clears_previous_chain() {
        let mut session = SessionState::new();
        session.start("goal-1");
        let first_id = session.session_id().map(str::to_string);
        session.present(spark(1));
        session.record_completion(completion(1));
        session.present(spark(2));

        session.start("goal-2");
        assert_ne!(session.session_id().map(str::to_string), first_id);
        assert_eq!(session.chain_length(), 0);
        assert!(session.completed().is_empty());
        assert!(session.current_spark().is_none());
    }

    #[test]
    fn test_dashboard_flow() {
        let view = DashboardView::default()
            .apply(DashboardEvent::NewGoal)
            .apply(DashboardEvent::GoalCreated(goal()));
        assert!(matches!(view, DashboardView::GoalSelected { .. }));

        let view = view.apply(DashboardEvent::SparkGenerated(spark(1)));
        assert!(matches!(view, DashboardView::SparkPresented { .. }));

        let view = view.apply(DashboardEvent::SparkCompleted(completion(1)));
        assert!(matches!(view, DashboardView::Completed { .. }));

        let view = view.apply(DashboardEvent::SparkGenerated(spark(2)));
        match &view {
            DashboardView::SparkPresented { spark, .. } => assert_eq!(spark.sequence_number, 2),
            other => panic!("unexpected view {other:?}"),
        }

        let view = view.apply(DashboardEvent::ShowProgress);
        assert!(matches!(view, DashboardView::Progress { .. }));
        let view = view.apply(DashboardEvent::Back);
        assert!(matches!(view, DashboardView::GoalSelected { .. }));
        assert_eq!(view.goal().map(|g| g.id.as_str()), Some("goal-1"));
    }

    #[test]
    fn test_dashboard_replaces_presented_spark() {
        let view = DashboardView::Idle
            .apply(DashboardEvent::SelectGoal(goal()))
            .apply(DashboardEvent::SparkGenerated(spark(1)))
            .apply(DashboardEvent::SparkGenerated(spark(2)));
        match view {
            DashboardView::SparkPresented { spark, .. } => assert_eq!(spark.id, "spark-2"),
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn test_dashboard_ignores_invalid_events() {
        let idle = DashboardView::Idle.apply(DashboardEvent::SparkCompleted(completion(1)));
        assert_eq!(idle, DashboardView::Idle);

        let creating = DashboardView::Creating.apply(DashboardEvent::SelectGoal(goal()));
        assert_eq!(creating, DashboardView::Creating);

        let cancelled = DashboardView::Creating.apply(DashboardEvent::CancelCreate);
        assert_eq!(cancelled, DashboardView::Idle);
    }
}
