use std::sync::Arc;

use academy_telemetry_lib::{
    activity::VISIT,
    config::PipelineConfig,
    error::RawError,
    identity::{Anonymous, Identity, IdentityProvider, SessionIdentity},
    logging,
    pipeline::Pipeline,
};
use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::eyre};

#[derive(Parser)]
#[command(name = "academy-telemetry")]
#[command(about = "Send a single activity entry through the error and activity pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a page visit for a signed-in user
    Visit {
        /// Destination path, e.g. /courses
        path: String,

        #[arg(long)]
        user_id: String,

        #[arg(long)]
        email: String,
    },

    /// Record an error entry
    Error {
        /// Page or feature where the error happened
        context: String,

        /// Raw error message
        message: String,

        /// Email of the acting user, defaults to the anonymous label
        #[arg(long)]
        email: Option<String>,
    },

    /// Normalize a message and print the notice the UI would receive
    NotifyTest {
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::init();

    let cli = Cli::parse();
    let config = PipelineConfig::from_env()?;

    let identity: Arc<dyn IdentityProvider> = match &cli.command {
        Commands::Visit { user_id, email, .. } => {
            Arc::new(SessionIdentity::signed_in(Identity::new(user_id.as_str(), email.as_str())))
        }
        Commands::Error { .. } | Commands::NotifyTest { .. } => Arc::new(Anonymous),
    };
    let pipeline = Pipeline::from_config(config, identity).await?;

    match cli.command {
        Commands::Visit { path, .. } => {
            pipeline.activity().log_activity(VISIT, format!("Visited {path}"));
        }
        Commands::Error {
            context,
            message,
            email,
        } => {
            pipeline
                .activity()
                .log_error(RawError::from(message), &context, email.as_deref());
        }
        Commands::NotifyTest { message } => {
            let mut notices = pipeline.subscribe_notices();
            pipeline.handler("cli").handle_error(message);
            let notice = notices
                .recv()
                .await
                .map_err(|e| eyre!("notice was not delivered: {e}"))?;
            println!("{}", serde_json::to_string_pretty(&notice.error)?);
        }
    }

    pipeline.queue().flush().await;
    let stats = pipeline.queue().stats();
    println!("{}", serde_json::to_string(&stats)?);
    if stats.failed > 0 {
        return Err(eyre!("{} activity entries failed to persist, see the trace output", stats.failed));
    }
    Ok(())
}
