//! Headless bot-vs-bot matches.
//!
//! Output is JSON lines: every finished turn as a `snapshot` record (unless
//! disabled), then one `summary` record per match.

use anyhow::Context;
use marble_core::{EventCategory, Game, Money, PartyId, TurnObserver, TurnSnapshot};
use serde::Serialize;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use tracing::{debug, info, trace};

use crate::settings::SimSettings;

/// Forwards narration to the log and keeps every snapshot of a match
#[derive(Debug, Default)]
pub struct SnapshotRecorder {
    snapshots: Vec<TurnSnapshot>,
}

impl SnapshotRecorder {
    pub fn snapshots(&self) -> &[TurnSnapshot] {
        &self.snapshots
    }
}

impl TurnObserver for SnapshotRecorder {
    fn on_turn_event(&mut self, message: &str, category: EventCategory) {
        trace!(?category, "{}", message);
    }

    fn on_snapshot(&mut self, snapshot: &TurnSnapshot) {
        debug!(turn = snapshot.turn, party = snapshot.acting_party, "turn recorded");
        self.snapshots.push(snapshot.clone());
    }
}

/// Result of one match
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    pub seed: u64,
    pub turns: usize,
    /// `None` if the turn cap was hit first
    pub winner: Option<PartyId>,
    pub cash: [Money; 2],
    pub net_worth: [Money; 2],
    pub cells_owned: [usize; 2],
}

/// One line of simulator output
#[derive(Debug, Serialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum OutputLine<'a> {
    Snapshot {
        seed: u64,
        #[serde(flatten)]
        snapshot: &'a TurnSnapshot,
    },
    Summary(&'a MatchSummary),
}

fn write_line<W: Write>(out: &mut W, line: &OutputLine<'_>) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, line)?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Play one bot-vs-bot match to bankruptcy or the turn cap
pub fn play_match(
    settings: &SimSettings,
    seed: u64,
    recorder: Rc<RefCell<SnapshotRecorder>>,
) -> anyhow::Result<MatchSummary> {
    let mut game = Game::bot_vs_bot(settings.board.clone(), seed)?;
    game.add_observer(Box::new(recorder));
    game.run_to_completion(settings.max_turns)
        .with_context(|| format!("match with seed {} failed", seed))?;

    let state = game.state();
    let summary = MatchSummary {
        seed,
        turns: game.history().len(),
        winner: game.winner(),
        cash: [state.parties[0].cash, state.parties[1].cash],
        net_worth: [state.net_worth(0)?, state.net_worth(1)?],
        cells_owned: [state.parties[0].owned.len(), state.parties[1].owned.len()],
    };

    match summary.winner {
        Some(winner) => info!(seed, turns = summary.turns, winner, "match finished"),
        None => info!(seed, turns = summary.turns, "turn limit reached"),
    }
    Ok(summary)
}

/// Win counts across a batch of matches
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tally {
    pub games: u32,
    pub wins: [u32; 2],
    pub unfinished: u32,
    pub total_turns: usize,
}

impl Tally {
    pub fn record(&mut self, summary: &MatchSummary) {
        self.games += 1;
        self.total_turns += summary.turns;
        match summary.winner {
            Some(winner) => self.wins[usize::from(winner & 1)] += 1,
            None => self.unfinished += 1,
        }
    }

    pub fn average_turns(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.total_turns as f64 / f64::from(self.games)
        }
    }
}

/// Play every configured match in order, writing JSON lines to `out`
pub fn run_batch<W: Write>(settings: &SimSettings, out: &mut W) -> anyhow::Result<Tally> {
    let mut tally = Tally::default();

    for i in 0..settings.games {
        let seed = settings.seed.wrapping_add(u64::from(i));
        let recorder = Rc::new(RefCell::new(SnapshotRecorder::default()));
        let summary = play_match(settings, seed, Rc::clone(&recorder))?;

        if settings.snapshots {
            for snapshot in recorder.borrow().snapshots() {
                write_line(out, &OutputLine::Snapshot { seed, snapshot })?;
            }
        }
        write_line(out, &OutputLine::Summary(&summary))?;

        tally.record(&summary);
    }

    out.flush()?;
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn settings(games: u32, max_turns: u32, snapshots: bool) -> SimSettings {
        SimSettings {
            games,
            max_turns,
            snapshots,
            ..SimSettings::default()
        }
    }

    fn records(output: &[u8]) -> Vec<Value> {
        String::from_utf8(output.to_vec())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_turn_cap_respected() {
        let recorder = Rc::new(RefCell::new(SnapshotRecorder::default()));
        let summary = play_match(&settings(1, 10, true), 3, Rc::clone(&recorder)).unwrap();
        assert!(summary.turns <= 10);
        assert_eq!(recorder.borrow().snapshots().len(), summary.turns);
    }

    #[test]
    fn test_batch_writes_snapshots_then_summary() {
        let mut output = Vec::new();
        let tally = run_batch(&settings(2, 20, true), &mut output).unwrap();
        let lines = records(&output);

        let summaries: Vec<&Value> = lines.iter().filter(|l| l["record"] == "summary").collect();
        assert_eq!(summaries.len(), 2);
        let snapshot_count = lines.iter().filter(|l| l["record"] == "snapshot").count();
        assert_eq!(snapshot_count, tally.total_turns);

        // Each match's snapshots come before its summary, turns in order
        let first_summary = lines.iter().position(|l| l["record"] == "summary").unwrap();
        for (i, line) in lines[..first_summary].iter().enumerate() {
            assert_eq!(line["seed"], 1);
            let snapshot: TurnSnapshot = serde_json::from_value(line.clone()).unwrap();
            assert_eq!(snapshot.turn as usize, i + 1);
            assert!((1..=6).contains(&snapshot.roll));
        }
        assert_eq!(lines[first_summary]["seed"], 1);
        assert_eq!(lines[first_summary]["turns"], first_summary as u64);
    }

    #[test]
    fn test_snapshots_can_be_disabled() {
        let mut output = Vec::new();
        run_batch(&settings(3, 20, false), &mut output).unwrap();
        let lines = records(&output);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l["record"] == "summary"));
    }

    #[test]
    fn test_batch_is_deterministic() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        let tally_a = run_batch(&settings(4, 300, true), &mut a).unwrap();
        let tally_b = run_batch(&settings(4, 300, true), &mut b).unwrap();
        assert_eq!(a, b);
        assert_eq!(tally_a, tally_b);
        assert_eq!(tally_a.games, 4);
        assert_eq!(
            tally_a.wins[0] + tally_a.wins[1] + tally_a.unfinished,
            tally_a.games
        );
    }

    #[test]
    fn test_tally_average() {
        let mut tally = Tally::default();
        assert_eq!(tally.average_turns(), 0.0);
        for (turns, winner) in [(10, Some(0)), (30, None)] {
            tally.record(&MatchSummary {
                seed: 0,
                turns,
                winner,
                cash: [0, 0],
                net_worth: [0, 0],
                cells_owned: [0, 0],
            });
        }
        assert_eq!(tally.average_turns(), 20.0);
        assert_eq!(tally.wins, [1, 0]);
        assert_eq!(tally.unfinished, 1);
    }
}
