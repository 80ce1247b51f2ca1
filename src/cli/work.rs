//! Interactive work session
//!
//! Presents one spark at a time and keeps a running chain of completions
//! until the user quits.

use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::spark::print_spark;
use super::{resolve_goal, short_timestamp};
use crate::error::ApiError;
use crate::service::SparkService;
use crate::session::{DashboardEvent, DashboardView, SessionPhase, SessionState};

const PROMPT: &str = "[Enter] done  [n] another  [p] progress  [q] quit > ";

pub async fn run(service: &SparkService, user: &str, query: &str) -> Result<()> {
    let goal = resolve_goal(service, user, query)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut session = SessionState::new();
    let mut view = DashboardView::default().apply(DashboardEvent::SelectGoal(goal.clone()));
    let mut titles: Vec<String> = Vec::new();

    session.start(&goal.id);
    println!("Working on '{}'. One tiny step at a time.", goal.title);

    while session.is_active() {
        if session.phase() == SessionPhase::AwaitingSpark {
            let spark = service
                .generate_spark(user, &goal.id, &goal.title, goal.description.as_deref())
                .await?;
            session.present(spark.clone());
            view = view.apply(DashboardEvent::SparkGenerated(spark));
        }
        render(&view, session.chain_length());

        print!("{}", PROMPT);
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            session.end();
            break;
        };

        match line.trim() {
            "" => {
                let Some(spark) = session.current_spark().cloned() else {
                    continue;
                };
                let session_id = session.session_id().unwrap_or_default().to_string();
                match service.complete_spark(user, &spark.id, &goal.id, &session_id, None) {
                    Ok(completion) => {
                        titles.push(spark.title);
                        session.record_completion(completion.clone());
                        view = view.apply(DashboardEvent::SparkCompleted(completion));
                        render(&view, session.chain_length());
                    }
                    Err(ApiError::Conflict(message)) => {
                        println!("{}", message);
                        session.clear_spark();
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            "n" => session.clear_spark(),
            "p" => {
                view = view.apply(DashboardEvent::ShowProgress);
                show_progress(service, user, &view)?;
                view = view.apply(DashboardEvent::Back);
                if let Some(spark) = session.current_spark() {
                    view = view.apply(DashboardEvent::SparkGenerated(spark.clone()));
                }
            }
            "q" => session.end(),
            other => println!("Unknown command '{}'", other),
        }
    }

    println!("\nSession over. Chain length: {}", session.chain_length());
    for (i, title) in titles.iter().enumerate() {
        println!("  {}. {}", i + 1, title);
    }
    Ok(())
}

fn render(view: &DashboardView, chain_length: usize) {
    match view {
        DashboardView::SparkPresented { spark, .. } => print_spark(spark),
        DashboardView::Completed { goal, .. } => {
            println!("\nNice! {} in a row for '{}'.", chain_length, goal.title);
        }
        DashboardView::Idle
        | DashboardView::Creating
        | DashboardView::GoalSelected { .. }
        | DashboardView::Progress { .. } => {}
    }
}

fn show_progress(service: &SparkService, user: &str, view: &DashboardView) -> Result<()> {
    let DashboardView::Progress { goal } = view else {
        return Ok(());
    };
    let (goal, completed) = service.completed_sparks(user, &goal.id)?;

    println!(
        "\n{}: {} spark(s) completed",
        goal.title, goal.total_sparks_completed
    );
    for c in completed {
        println!("  [{}] {}", short_timestamp(&c.completed_at), c.spark.title);
    }
    Ok(())
}
