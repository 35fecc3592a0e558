mod app;
mod favourites;
mod player;

use anyhow::Context;
use bandscan_core::cache::DirectoryCache;
use bandscan_core::config::Config;
use bandscan_core::model::DirectoryModel;
use bandscan_core::platform;
use bandscan_core::resolver::PlaylistResolver;
use bandscan_core::source::{build_client, SourceSet};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("bandscan.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // The TUI owns the terminal, so logs go to a file. RUST_LOG overrides;
    // HTTP client internals are noisy at debug.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,hyper_util=warn,hyper=warn,reqwest=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    let config = Config::load().context("loading config")?;
    info!("config loaded from {:?}", Config::config_path());

    let cache = DirectoryCache::open(&platform::cache_dir(), config.stale_windows());

    // The navigation session is deliberately sequential: the loop blocks on
    // the fetch for the currently requested node with a visible loading
    // status. The runtime therefore lives outside the loop and individual
    // futures are driven with block_on.
    let rt = tokio::runtime::Runtime::new()?;

    if std::env::args().any(|arg| arg == "--clear-cache") {
        rt.block_on(cache.clear())?;
        println!("directory cache cleared");
        return Ok(());
    }

    let client = build_client(&config).context("building HTTP client")?;
    let sources = SourceSet::from_config(&config, client.clone());
    if sources.is_empty() {
        anyhow::bail!(
            "no directory sources enabled, check {}",
            Config::config_path().display()
        );
    }

    let model = DirectoryModel::new(sources, cache);
    let resolver = PlaylistResolver::new(client);
    let favourites = favourites::Favourites::load(data_dir.join("favourites.json"));
    let player = player::Player::new(config.playback.command.clone());

    info!("bandscan starting, log file {:?}", log_path);

    let terminal = ratatui::init();
    let result = app::App::new(model, resolver, player, favourites, rt.handle().clone())
        .run(terminal);
    ratatui::restore();
    result
}
