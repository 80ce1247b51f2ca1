use anyhow::Result;

use super::{resolve_goal, truncate};
use crate::service::SparkService;
use crate::store::Spark;

pub fn list(service: &SparkService, user: &str, query: &str) -> Result<()> {
    let goal = resolve_goal(service, user, query)?;
    let sparks = service.list_sparks(user, &goal.id)?;

    if sparks.is_empty() {
        println!("No sparks for '{}' yet.", goal.title);
        return Ok(());
    }

    println!("{:<4} {:<6} {:<4} {}", "#", "Effort", "AI", "Title");
    println!("{}", "-".repeat(70));
    for s in sparks {
        println!(
            "{:<4} {:<6} {:<4} {}",
            s.sequence_number,
            format!("{}m", s.effort_minutes),
            if s.ai_generated { "yes" } else { "no" },
            truncate(&s.title, 50),
        );
    }
    Ok(())
}

pub async fn generate(service: &SparkService, user: &str, query: &str) -> Result<()> {
    let goal = resolve_goal(service, user, query)?;
    let spark = service
        .generate_spark(user, &goal.id, &goal.title, goal.description.as_deref())
        .await?;
    print_spark(&spark);
    Ok(())
}

pub(crate) fn print_spark(spark: &Spark) {
    println!("\nSpark #{}: {}", spark.sequence_number, spark.title);
    if let Some(description) = &spark.description {
        println!("  {}", description);
    }
    println!("  ~{} min", spark.effort_minutes);
    if let Some(link) = &spark.resource_link {
        println!("  {}", link);
    }
    if !spark.ai_generated {
        println!("  (suggestion service unavailable, showing a default spark)");
    }
}
