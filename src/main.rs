use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use spark::cli::{goal, serve, spark as sparks, work};
use spark::config::Config;
use spark::generator::ChatCompletionsGenerator;
use spark::service::SparkService;
use spark::store::SparkStore;

#[derive(Parser)]
#[command(name = "spark")]
#[command(version, about = "Tiny AI-suggested next actions toward your goals")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "spark.yaml")]
    config: String,
}

#[derive(Args)]
struct UserArgs {
    /// User id to act as
    #[arg(short, long, env = "SPARK_USER")]
    user: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Goal management
    Goal {
        #[command(subcommand)]
        command: GoalCommands,
    },

    /// Spark management
    Spark {
        #[command(subcommand)]
        command: SparkCommands,
    },

    /// Start an interactive work session on a goal
    Work {
        /// Goal ID prefix or title
        goal: String,
        #[command(flatten)]
        user: UserArgs,
    },
}

#[derive(Subcommand)]
enum GoalCommands {
    /// Create a new goal
    Create {
        /// Goal title
        title: String,
        /// Optional details
        #[arg(short, long)]
        description: Option<String>,
        #[command(flatten)]
        user: UserArgs,
    },
    /// List goals, newest first
    List {
        #[command(flatten)]
        user: UserArgs,
    },
    /// Show a goal and its completed sparks
    Show {
        /// Goal ID prefix or title
        goal: String,
        #[command(flatten)]
        user: UserArgs,
    },
    /// Change a goal's status (active, paused, completed, archived)
    Status {
        /// Goal ID prefix or title
        goal: String,
        status: String,
        #[command(flatten)]
        user: UserArgs,
    },
    /// Delete a goal with its sparks and completions
    Delete {
        /// Goal ID prefix or title
        goal: String,
        #[command(flatten)]
        user: UserArgs,
    },
}

#[derive(Subcommand)]
enum SparkCommands {
    /// List sparks generated for a goal
    List {
        /// Goal ID prefix or title
        goal: String,
        #[command(flatten)]
        user: UserArgs,
    },
    /// Generate the next spark for a goal
    Generate {
        /// Goal ID prefix or title
        goal: String,
        #[command(flatten)]
        user: UserArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load config
    let config = Config::load(&cli.config)?.with_env_overrides();

    // Initialize store and generator
    let store = Arc::new(SparkStore::open(&config.database_path())?);
    let generator = Arc::new(ChatCompletionsGenerator::new(&config.generator)?);
    let service = SparkService::new(store, generator);

    match cli.command {
        Commands::Serve { bind } => {
            serve::run(&config, service, bind).await?;
        }
        Commands::Goal { command } => match command {
            GoalCommands::Create {
                title,
                description,
                user,
            } => {
                service.ensure_profile(&user.user)?;
                goal::create(&service, &user.user, title, description)?;
            }
            GoalCommands::List { user } => {
                service.ensure_profile(&user.user)?;
                goal::list(&service, &user.user)?;
            }
            GoalCommands::Show { goal, user } => {
                goal::show(&service, &user.user, &goal)?;
            }
            GoalCommands::Status { goal, status, user } => {
                goal::status(&service, &user.user, &goal, status)?;
            }
            GoalCommands::Delete { goal, user } => {
                goal::delete(&service, &user.user, &goal)?;
            }
        },
        Commands::Spark { command } => match command {
            SparkCommands::List { goal, user } => {
                sparks::list(&service, &user.user, &goal)?;
            }
            SparkCommands::Generate { goal, user } => {
                sparks::generate(&service, &user.user, &goal).await?;
            }
        },
        Commands::Work { goal, user } => {
            work::run(&service, &user.user, &goal).await?;
        }
    }

    Ok(())
}
