//! courtwatch -- court-assignment alerts for a tracked pickleball player.
//!
//! This crate provides page discovery, the match lifecycle store and tracker,
//! and the adapters for the results API, the live-stream search and the chat
//! webhook.

pub mod config;
pub mod discovery;
pub mod notify;
pub mod source;
pub mod storage;
pub mod stream;
pub mod tracker;

use anyhow::{Context, Result};

use config::AppConfig;
use discovery::PlayerPage;
use notify::groupme::GroupMeBot;
use source::http::PickleballApi;
use storage::MatchStore;
use stream::youtube::YoutubeLookup;
use tracker::{Adapters, CycleReport, TrackedPlayer, Tracker, TrackerSettings};

/// Open the state file named in the config.
pub fn open_store(config: &AppConfig) -> Result<MatchStore> {
    let path = &config.storage.state_path;
    MatchStore::load(path, config.storage.history_limit)
        .with_context(|| format!("failed to load state from {}", path.display()))
}

/// Wire the production adapters around `store`.
pub fn build_tracker(config: &AppConfig, store: MatchStore) -> Result<Tracker> {
    let source = PickleballApi::new(&config.source.base_url, config.source.timeout())
        .context("failed to build results API client")?;
    let stream = YoutubeLookup::new(&config.stream.search_url, config.stream.timeout())
        .context("failed to build stream search client")?;
    let sink = GroupMeBot::new(&config.notify.endpoint, &config.notify.bot_id, config.notify.timeout())
        .context("failed to build chat client")?;

    let adapters = Adapters {
        source: Box::new(source),
        stream: Box::new(stream),
        sink: Box::new(sink),
    };
    let player = TrackedPlayer {
        display_name: config.player.display_name(),
        first_name: config.player.first_name(),
    };
    let settings = TrackerSettings {
        source_delay: config.source.request_delay(),
        stream_delay: config.stream.request_delay(),
        free_court: config.stream.free_court.clone(),
    };

    Ok(Tracker::new(store, adapters, player, settings))
}

/// One poll: load state, scan the player page, run a tracker cycle.
pub async fn run_once(config: &AppConfig) -> Result<(CycleReport, MatchStore)> {
    // 1. Load state before touching the network so a bad file fails fast
    let store = open_store(config)?;
    tracing::info!(
        path = %store.path().display(),
        matches = store.len(),
        "state loaded"
    );

    // 2. Discover the currently listed matches
    let page = PlayerPage::new(&config.source.base_url, config.source.timeout())
        .context("failed to build player page client")?;
    let observed = page
        .observed_matches(&config.player.slug)
        .await
        .with_context(|| format!("failed to scan player page for {}", config.player.slug))?;
    tracing::info!(count = observed.len(), "matches listed on player page");

    // 3. Run the cycle
    let mut tracker = build_tracker(config, store)?;
    let report = tracker.run_cycle(&observed).await?;

    Ok((report, tracker.into_store()))
}
