//! SQLite schema definition
//!
//! Mirrors the hosted tables the web client talks to:
//! - profiles: one row per authenticated user, provisioned on first request
//! - goals: owned by a profile, carry the completed-spark counter
//! - sparks: ordered by a per-goal sequence number
//! - spark_completions: at most one per (user, spark)

pub const SCHEMA: &str = r#"
-- ============================================
-- PROFILES
-- ============================================

CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,                   -- Identity provider user id
    display_name TEXT,
    avatar_url TEXT,
    premium_tier TEXT NOT NULL DEFAULT 'free', -- 'free', 'premium'
    subscription_ends_at DATETIME,
    created_at DATETIME NOT NULL,
    updated_at DATETIME NOT NULL
);

-- ============================================
-- GOALS
-- ============================================

CREATE TABLE IF NOT EXISTS goals (
    id TEXT PRIMARY KEY,                   -- UUID
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'active'
        CHECK (status IN ('active', 'paused', 'completed', 'archived')),
    total_sparks_completed INTEGER NOT NULL DEFAULT 0,
    created_at DATETIME NOT NULL,
    updated_at DATETIME NOT NULL,
    FOREIGN KEY(user_id) REFERENCES profiles(id) ON DELETE CASCADE
);

-- ============================================
-- SPARKS
-- ============================================

CREATE TABLE IF NOT EXISTS sparks (
    id TEXT PRIMARY KEY,                   -- UUID
    goal_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    effort_minutes INTEGER NOT NULL,
    resource_link TEXT,
    ai_generated BOOLEAN NOT NULL DEFAULT TRUE,
    sequence_number INTEGER NOT NULL,      -- 1-based, allocated per goal
    created_at DATETIME NOT NULL,
    UNIQUE(goal_id, sequence_number),
    FOREIGN KEY(goal_id) REFERENCES goals(id) ON DELETE CASCADE
);

-- ============================================
-- SPARK COMPLETIONS
-- ============================================

CREATE TABLE IF NOT EXISTS spark_completions (
    id TEXT PRIMARY KEY,                   -- UUID
    user_id TEXT NOT NULL,
    spark_id TEXT NOT NULL,
    goal_id TEXT NOT NULL,
    completed_at DATETIME NOT NULL,
    session_id TEXT,                       -- Client session that produced it
    notes TEXT,
    UNIQUE(user_id, spark_id),
    FOREIGN KEY(spark_id) REFERENCES sparks(id) ON DELETE CASCADE,
    FOREIGN KEY(goal_id) REFERENCES goals(id) ON DELETE CASCADE
);

-- ============================================
-- INDEXES
-- ============================================

CREATE INDEX IF NOT EXISTS idx_goals_user ON goals(user_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_sparks_goal ON sparks(goal_id, sequence_number);
CREATE INDEX IF NOT EXISTS idx_completions_goal ON spark_completions(goal_id, completed_at DESC);
CREATE INDEX IF NOT EXISTS idx_completions_session ON spark_completions(session_id);
"#;
