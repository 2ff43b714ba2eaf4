//! QueryBuddy - chat with your SQL database.

use querybuddy::cli::Cli;
use querybuddy::config::Config;
use querybuddy::error::Result;
use querybuddy::tui::{self, app::SetupForm};
use querybuddy::logging;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Load .env before argument parsing so GROQ_API_KEY can come from it
    let _ = dotenvy::dotenv();

    logging::init_file_logging();

    if let Err(e) = run().await {
        error!("{}: {}", e.category(), e);
        eprintln!("{}: {e}", e.category());
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;

    if let Some(model) = &cli.model {
        config.llm.model = model.clone();
    }

    let connection = cli.to_connection_config();
    if let Some(conn) = &connection {
        info!("Pre-filling setup form: {}", conn.display_string());
    }

    let setup = SetupForm::with_prefill(connection.as_ref(), cli.api_key.as_deref());
    tui::run(setup, &config.llm, cli.mock_llm).await
}
