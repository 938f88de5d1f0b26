use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use courtwatch::config::AppConfig;
use courtwatch::source::http::PickleballApi;
use courtwatch::source::ResultSource;
use courtwatch::storage::{MatchStatus, MatchStore};
use courtwatch::stream::youtube::YoutubeLookup;
use courtwatch::stream::StreamLookup;

#[derive(Parser)]
#[command(
    name = "courtwatch",
    about = "Court-assignment alerts for a tracked pickleball player",
    version,
    long_about = None
)]
struct Cli {
    /// Config file (defaults to $COURTWATCH_CONFIG, then ./courtwatch.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one poll cycle: scan the player page, check courts, notify
    Run {
        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Show tracked matches and recent activity
    Status {
        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,

        /// Activity window in hours
        #[arg(long, default_value = "24")]
        hours: u64,
    },

    /// Query the results API for a single match
    CheckMatch {
        /// Match id (UUID)
        id: String,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Look up the live stream for a court
    CheckStream {
        /// Court label, e.g. CC or SC1
        court: String,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing. Logs go to stderr so `--json` output stays parseable.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Run { json } => {
            let config = AppConfig::resolve(cli.config.as_deref())?;
            tracing::info!(player = %config.player.slug, "Starting courtwatch cycle");
            let (report, store) = courtwatch::run_once(&config).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("\nMatches listed for {}", config.player.display_name());
                if report.observed_urls.is_empty() {
                    println!("  (none)");
                }
                for url in &report.observed_urls {
                    println!("  {}", url);
                }
                println!();
                println!("{:<28} : {}", "New matches", report.new_matches);
                println!("{:<28} : {}", "Stale matches removed", report.stale_removed);
                println!(
                    "{:<28} : {} ({} ok, {} failed)",
                    "Court checks", report.court_checks, report.court_checks_succeeded, report.court_checks_failed
                );
                println!("{:<28} : {}", "Courts found", report.courts_found);
                println!(
                    "{:<28} : {} ({} failed)",
                    "Notifications sent", report.notifications_sent, report.notifications_failed
                );
                print_summary(&store);
            }
        }
        Commands::Status { json, hours } => {
            let config = AppConfig::resolve_lenient(cli.config.as_deref())?;
            let store = courtwatch::open_store(&config)?;
            let summary = store.summary();
            let activity = store.recent_activity(hours);

            if json {
                let out = serde_json::json!({
                    "state_path": store.path().display().to_string(),
                    "summary": summary,
                    "recent_activity": activity,
                    "matches": store.records().collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print_summary(&store);
                print_matches(&store);

                println!("\n=== Activity (last {} hours) ===", activity.hours);
                println!("{:<28} : {}", "Executions", activity.total_executions);
                println!("{:<28} : {}", "Executions with activity", activity.active_executions);
                println!("{:<28} : {}", "Courts found", activity.court_assignments_found);
                println!("{:<28} : {}", "Notifications sent", activity.notifications_sent);
                println!("{:<28} : {}", "Stale matches removed", activity.stale_removed);
                println!();
            }
        }
        Commands::CheckMatch { id, json } => {
            let config = AppConfig::resolve_lenient(cli.config.as_deref())?;
            let api = PickleballApi::new(&config.source.base_url, config.source.timeout())
                .context("failed to build results API client")?;
            tracing::info!(match_id = %id, "Checking match");
            let check = api
                .fetch(&id)
                .await
                .with_context(|| format!("court check for {} failed", id))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&check)?);
            } else {
                println!("\nMatch {}", id);
                println!("{:<16} : {}", "Court", check.court_label.as_deref().unwrap_or("not assigned"));
                println!("{:<16} : {}", "Completed", check.completed_marker.as_deref().unwrap_or("no"));
                println!("{:<16} : {}", "Team one", check.roster.team_one().join(" / "));
                println!("{:<16} : {}", "Team two", check.roster.team_two().join(" / "));
                println!();
            }
        }
        Commands::CheckStream { court, json } => {
            let config = AppConfig::resolve_lenient(cli.config.as_deref())?;
            let lookup = YoutubeLookup::new(&config.stream.search_url, config.stream.timeout())
                .context("failed to build stream search client")?;
            let status = lookup.lookup(&court).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("\nCourt {}", court);
                println!("{:<16} : {}", "Live", if status.is_live { "yes" } else { "no" });
                println!("{:<16} : {}", "Stream", status.stream_url.as_deref().unwrap_or("-"));
                if let Some(err) = &status.error {
                    println!("{:<16} : {}", "Error", err);
                }
                println!();
            }
        }
    }

    Ok(())
}

fn print_summary(store: &MatchStore) {
    let summary = store.summary();
    println!("\n=== Tracked Matches ({}) ===", store.path().display());
    println!("{:<28} : {}", "Total", summary.total);
    println!("{:<28} : {}", "Future", summary.future);
    println!("{:<28} : {}", "Assigned", summary.assigned);
    println!("{:<28} : {}", "Notified", summary.notified);
    println!("{:<28} : {}", "Pending notifications", summary.pending_notifications);
    println!("{:<28} : {}", "Execution records", summary.history_records);
}

fn print_matches(store: &MatchStore) {
    let assigned: Vec<_> = store.records().filter(|m| m.status == MatchStatus::Assigned).collect();
    if !assigned.is_empty() {
        println!("\n{:<8} | {:<10} | {:<10} | Match", "Court", "Notified", "Completed");
        println!("{:-<8}-|-{:-<10}-|-{:-<10}-|-{:-<40}", "", "", "", "");
        for m in assigned {
            println!(
                "{:<8} | {:<10} | {:<10} | {}",
                m.court_label.as_deref().unwrap_or("-"),
                if m.notified { "yes" } else { "no" },
                if m.is_completed() { "yes" } else { "no" },
                m.source_url
            );
        }
    }

    let future: Vec<_> = store.records().filter(|m| m.status == MatchStatus::Future).collect();
    if !future.is_empty() {
        println!("\nWaiting for a court:");
        for m in future {
            let checked = m
                .last_checked_at
                .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "never".to_string());
            println!("  {} (last checked {})", m.source_url, checked);
        }
    }
}
