use anyhow::Result;

use super::{resolve_goal, short_id, short_timestamp, truncate};
use crate::service::{GoalPatch, SparkService};

pub fn create(
    service: &SparkService,
    user: &str,
    title: String,
    description: Option<String>,
) -> Result<()> {
    let goal = service.create_goal(user, &title, description.as_deref())?;
    println!("Goal '{}' created with ID: {}", goal.title, goal.id);
    Ok(())
}

pub fn list(service: &SparkService, user: &str) -> Result<()> {
    let goals = service.list_goals(user)?;
    if goals.is_empty() {
        println!("No goals found. Create one with 'spark goal create <title>'.");
        return Ok(());
    }

    println!(
        "{:<10} {:<10} {:<7} {:<12} {}",
        "ID", "Status", "Sparks", "Created", "Title"
    );
    println!("{}", "-".repeat(80));
    for g in goals {
        println!(
            "{:<10} {:<10} {:<7} {:<12} {}",
            short_id(&g.id),
            g.status,
            g.total_sparks_completed,
            short_timestamp(&g.created_at),
            truncate(&g.title, 40),
        );
    }
    Ok(())
}

/// Goal details plus the sparks completed so far
pub fn show(service: &SparkService, user: &str, query: &str) -> Result<()> {
    let goal = resolve_goal(service, user, query)?;
    let (goal, completed) = service.completed_sparks(user, &goal.id)?;

    println!("\n{}", "=".repeat(80));
    println!("Goal: {} ({})", goal.title, goal.id);
    println!(
        "Status: {} | Sparks completed: {}",
        goal.status, goal.total_sparks_completed
    );
    if let Some(description) = &goal.description {
        println!("Details: {}", description);
    }
    println!("{}", "=".repeat(80));

    if completed.is_empty() {
        println!("\nNo sparks completed yet. Try 'spark work {}'.", short_id(&goal.id));
        return Ok(());
    }

    println!();
    for c in completed {
        println!(
            "[{}] {} ({} min)",
            short_timestamp(&c.completed_at),
            c.spark.title,
            c.spark.effort_minutes
        );
        if let Some(notes) = &c.notes {
            println!("    {}", notes);
        }
    }
    Ok(())
}

pub fn status(service: &SparkService, user: &str, query: &str, status: String) -> Result<()> {
    let goal = resolve_goal(service, user, query)?;
    let goal = service.update_goal(
        user,
        &goal.id,
        GoalPatch {
            status: Some(status),
            ..Default::default()
        },
    )?;
    println!("Goal '{}' is now {}", goal.title, goal.status);
    Ok(())
}

pub fn delete(service: &SparkService, user: &str, query: &str) -> Result<()> {
    let goal = resolve_goal(service, user, query)?;
    service.delete_goal(user, &goal.id)?;
    println!("Deleted goal '{}'", goal.title);
    Ok(())
}
