use clap::{Parser, Subcommand};
use recipe_api::{
    configuration::get_configuration,
    startup,
    telemetry::{self, get_subscriber, init_subscriber},
};

/// Recipe, tag and ingredient API.
#[derive(Parser)]
#[command(name = "recipe_api", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve,

    /// Create a staff superuser account.
    CreateSuperuser {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        /// Read from RECIPE_API_SUPERUSER_PASSWORD when omitted
        #[arg(long, env = "RECIPE_API_SUPERUSER_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = get_configuration()?;

    let subscriber = get_subscriber(
        "recipe_api".into(),
        settings.telemetry.log_level.clone(),
        settings.telemetry.otlp_endpoint.as_deref(),
        std::io::stdout,
    )?;
    init_subscriber(subscriber)?;

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => startup::run(settings).await,
        Command::CreateSuperuser {
            email,
            name,
            password,
        } => startup::create_superuser(&settings.database, &email, name, &password)
            .await
            .map(|user| tracing::info!(user_id = user.id, email = %user.email, "Superuser created")),
    };

    telemetry::shutdown();
    result
}
