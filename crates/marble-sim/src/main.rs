//! Marble headless match simulator.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod runner;
mod settings;

use settings::SimSettings;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = SimSettings::from_env()?;
    info!(
        games = settings.games,
        seed = settings.seed,
        max_turns = settings.max_turns,
        snapshots = settings.snapshots,
        cells = settings.board.cells.len(),
        "Starting Marble simulation..."
    );

    // JSON lines on stdout: turn snapshots, then one summary per match
    let mut out = std::io::BufWriter::new(std::io::stdout().lock());
    let tally = runner::run_batch(&settings, &mut out)?;

    info!(
        wins_first = tally.wins[0],
        wins_second = tally.wins[1],
        unfinished = tally.unfinished,
        average_turns = tally.average_turns(),
        "Simulation complete"
    );
    Ok(())
}
