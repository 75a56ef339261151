mod commands;

use clap::{Parser, Subcommand};
use spectrum_pipeline::{EnvSnapshot, OptionInputs, Target};

#[derive(Parser)]
#[command(
    name = "spectrum",
    about = "Deploy containerized apps to AWS Fargate with CloudFormation"
)]
#[command(version)]
struct Cli {
    /// Non-interactive mode: read ENVIRONMENT and AWS credentials from the environment only
    #[arg(long, short = 'C', global = true)]
    ci: bool,

    /// Prune dangling local docker images when the command finishes
    #[arg(long, global = true)]
    prune_docker_images: bool,

    /// Environment-variable group from spectrum.config.json to deploy with
    #[arg(long, global = true, value_name = "NAME")]
    environment: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write or update spectrum.config.json in the current directory
    Init(commands::InitArgs),
    /// List applications deployed by spectrum
    Apps,
    /// Show the CloudFormation description of a deployed application
    Describe {
        /// Stack name as printed by `spectrum apps`
        app: String,
    },
    /// Build and deploy the primary application
    DeployApp,
    /// Build and deploy a branch of the application
    DeployBranch {
        /// Branch to deploy (default: current git branch)
        branch: Option<String>,
    },
    /// Tear down the primary application
    DestroyApp,
    /// Tear down a branch deployment
    DestroyBranch {
        /// Branch to destroy (default: current git branch)
        branch: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => tracing::debug!("no .env file"),
        Err(e) => tracing::warn!(error = %e, "failed to load .env"),
    }

    let cli = Cli::parse();
    let env = EnvSnapshot::from_process();
    let options = OptionInputs {
        ci: cli.ci,
        environment: cli.environment,
    };

    let result = match cli.command {
        Commands::Init(args) => commands::init_project(args, &env).await,
        Commands::Apps => commands::apps(&options, env).await,
        Commands::Describe { app } => commands::describe(&options, env, &app).await,
        Commands::DeployApp => commands::deploy(Target::Primary, &options, env).await,
        Commands::DeployBranch { branch } => {
            commands::deploy(Target::Branch(branch), &options, env).await
        }
        Commands::DestroyApp => commands::destroy(Target::Primary, &options, env).await,
        Commands::DestroyBranch { branch } => {
            commands::destroy(Target::Branch(branch), &options, env).await
        }
    };

    if cli.prune_docker_images {
        commands::prune_docker_images().await;
    }

    result
}
