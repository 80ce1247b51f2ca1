//! Command implementations for the `spark` binary

pub mod goal;
pub mod serve;
pub mod spark;
pub mod work;

use anyhow::Result;

use crate::service::SparkService;
use crate::store::Goal;

/// Find one of the user's goals by id prefix or exact title
pub fn resolve_goal(service: &SparkService, user: &str, query: &str) -> Result<Goal> {
    let goals = service.list_goals(user)?;
    goals
        .into_iter()
        .find(|g| g.id.starts_with(query) || g.title == query)
        .ok_or_else(|| anyhow::anyhow!("Goal not found: {}", query))
}

/// First 8 characters of an id, for tables
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Clip text to `max` characters, adding an ellipsis when cut
pub fn truncate(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or(text);
    if line.chars().count() > max {
        let head: String = line.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        line.to_string()
    }
}

/// `MM-DD HH:MM` from an RFC 3339 timestamp
pub fn short_timestamp(ts: &str) -> String {
    match (ts.get(5..10), ts.get(11..16)) {
        (Some(date), Some(time)) => format!("{} {}", date, time),
        _ => ts.to_string(),
    }
}
