use anyhow::Result;
use clap::Parser;

use invoice_dashboard::actions::InvoiceActions;
use invoice_dashboard::auth;
use invoice_dashboard::cli::{self, Cli, Commands, DEMO_BCRYPT_COST};
use invoice_dashboard::config::{self, Config};
use invoice_dashboard::data::DashboardData;
use invoice_dashboard::db::{self, MemoryStore, Store};
use invoice_dashboard::{logging, seed, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::init()?;
    let command = cli.command.unwrap_or(Commands::Dashboard);

    // The dashboard owns the terminal, so its logs go to a file
    let _guard = match command {
        Commands::Dashboard => Some(logging::init_file(&config.log_dir)?),
        _ => {
            logging::init_stderr()?;
            None
        }
    };

    if cli.in_memory {
        let store = MemoryStore::new();
        seed::run(&store, DEMO_BCRYPT_COST).await?;
        return dispatch(store, &config, command).await;
    }

    // Initialize database connection
    let db = db::init(&config).await?;

    match command {
        Commands::Migrate => {
            db.run_migrations().await?;
            tracing::info!("migrations applied");
            Ok(())
        }
        Commands::Seed => {
            db.run_migrations().await?;
            seed::run(&db, auth::DEFAULT_COST).await?;
            Ok(())
        }
        command => dispatch(db, &config, command).await,
    }
}

async fn dispatch<S: Store>(store: S, config: &Config, command: Commands) -> Result<()> {
    match command {
        Commands::Dashboard => {
            let data = DashboardData::with_config(store.clone(), config);
            ui::run(data, InvoiceActions::new(store)).await
        }
        command => cli::execute(store, config, command).await,
    }
}
