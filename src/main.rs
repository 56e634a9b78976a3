use coinboard::api::client::{ApiClient, MarketApi};
use coinboard::config::Config;
use coinboard::ui::core::scheduler::RefreshScheduler;
use coinboard::ui::core::state::{Command, DashboardState};
use coinboard::ui::core::storage::FileStorage;
use coinboard::ui::dashboard::Dashboard;
use coinboard::ui::notify::TerminalNotifier;
use env_logger::Builder;
use log::{info, LevelFilter};
use std::error::Error;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;

fn init_logger(config: &Config) -> io::Result<()> {
    let target = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            env_logger::Target::Pipe(Box::new(file))
        }
        // Keep logs separate from TUI
        None => env_logger::Target::Stderr,
    };

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("coinboard", config.log_level)
        .filter_module("reqwest", LevelFilter::Warn)
        .filter_module("hyper", LevelFilter::Warn)
        .format(|buf, record| {
            let ts = chrono::Local::now().format("%H:%M:%S%.3f");
            writeln!(
                buf,
                "[{} {:<5} {}] {}",
                ts,
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(target)
        .write_style(env_logger::WriteStyle::Never)
        .init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    init_logger(&config)?;

    info!("Starting coinboard against {}", config.api_url);

    let storage = FileStorage::open(&config.state_file);
    info!("State file: {}", storage.path().display());
    let mut state = DashboardState::new(
        Box::new(storage),
        config.alert_retention,
        config.indicators,
    );
    state.handle(Command::SelectCoin(config.default_coin.clone()))?;
    let state = state.shared();

    let api: Arc<dyn MarketApi> = Arc::new(ApiClient::new(&config.api_url, config.request_timeout));

    // Create channels
    let (command_tx, command_rx) = unbounded_channel();
    let (event_tx, event_rx) = unbounded_channel();

    let scheduler = RefreshScheduler::new(
        api,
        Arc::clone(&state),
        config.refresh_interval,
        event_tx.clone(),
        command_rx,
        Box::new(TerminalNotifier::new(event_tx)),
    );
    let scheduler_handle = tokio::spawn(scheduler.run());

    let dashboard = Dashboard::new(state, command_tx, event_rx);
    if let Err(e) = dashboard.run().await {
        log::error!("Dashboard error: {}", e);
    }

    // The dashboard sends Shutdown (or drops its sender) on exit
    if let Err(e) = scheduler_handle.await {
        log::error!("Scheduler task failed: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}
