//! Handler for the `run` command.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::cli::output;
use crate::adapter::inbound::http::{serve, AppState};
use crate::error::Result;
use crate::infrastructure::bootstrap::Services;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::shutdown;

/// Serve the API until Ctrl+C or SIGTERM, then stop the scheduler.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let path = args.config.resolve();
    let mut config = Config::load(&path)?;
    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
    }
    let addr = config.bind_addr()?;
    if output::is_json() {
        config.logging.format = "json".to_string();
    }
    config.init_logging();

    let autostart = config.scheduler.autostart && !args.no_scheduler;
    print_startup(&config, autostart);

    let services = Arc::new(Services::open(config)?);
    if autostart {
        services.scheduler.start();
    }

    let listener = TcpListener::bind(addr).await?;
    info!(config = %path.display(), "solbot starting");
    serve(listener, AppState::new(Arc::clone(&services)), shutdown::signal()).await?;

    services.scheduler.stop().await;
    info!("solbot stopped");
    Ok(())
}

fn print_startup(config: &Config, autostart: bool) {
    if output::is_quiet() {
        return;
    }
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Bind", &config.server.bind);
    output::field("Symbols", config.market.symbols.join(", "));
    output::field("Database", config.storage.database_path().display());
    if output::verbosity() > 0 {
        output::field("Log dir", config.logging.directory.display());
        output::field("Tick", format!("{}s", config.scheduler.tick_seconds));
    }
    if !autostart {
        output::warning("Scheduler not started; use POST /scheduler/start");
    }
}
