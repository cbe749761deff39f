//! WebAssembly bindings for the Marble game engine.
//!
//! This module exposes a human-vs-bot match to JavaScript through
//! wasm-bindgen. Everything crosses the boundary as JSON.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::actions::Answer;
use crate::board::CellId;
use crate::config::BoardConfig;
use crate::game::Game;
use crate::observer::EventLog;
use crate::player::Controller;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// WASM-exposed match wrapper
#[wasm_bindgen]
pub struct WasmMatch {
    game: Game,
    log: Rc<RefCell<EventLog>>,
}

#[wasm_bindgen]
impl WasmMatch {
    /// Create a human-vs-bot match on the classic board, or on a board given
    /// as JSON
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64, board_json: Option<String>) -> Result<WasmMatch, JsValue> {
        let config = match board_json {
            Some(json) => BoardConfig::from_json(&json).map_err(to_js)?,
            None => BoardConfig::classic(),
        };
        let mut game = Game::new(
            config,
            [
                ("Player".to_string(), Controller::Deferred),
                ("AI".to_string(), Controller::Automated),
            ],
            seed,
        )
        .map_err(to_js)?;

        let log = Rc::new(RefCell::new(EventLog::default()));
        game.add_observer(Box::new(Rc::clone(&log)));
        Ok(WasmMatch { game, log })
    }

    /// Get the full match state as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        serde_json::to_string(self.game.state()).unwrap_or_else(|_| "{}".to_string())
    }

    #[wasm_bindgen(js_name = getCurrentParty)]
    pub fn get_current_party(&self) -> u8 {
        self.game.current_party()
    }

    /// Roll for whoever is up. Returns events JSON.
    pub fn roll(&mut self) -> Result<String, JsValue> {
        let events = self.game.roll().map_err(to_js)?;
        Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string()))
    }

    /// Let the bot play until the human must act
    #[wasm_bindgen(js_name = playBot)]
    pub fn play_bot(&mut self, max_turns: u32) -> Result<String, JsValue> {
        let events = self.game.run_to_completion(max_turns).map_err(to_js)?;
        Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string()))
    }

    /// Answer a pending purchase or upgrade offer
    pub fn decide(&mut self, yes: bool) -> Result<String, JsValue> {
        let events = self.game.resume(Answer::YesNo(yes)).map_err(to_js)?;
        Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string()))
    }

    /// Sell the cells in a JSON array of cell ids. `[]` abandons.
    pub fn liquidate(&mut self, cells_json: &str) -> Result<String, JsValue> {
        let cells: Vec<CellId> = serde_json::from_str(cells_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid cell list: {}", e)))?;
        let events = self.game.resume(Answer::Liquidate(cells)).map_err(to_js)?;
        Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string()))
    }

    /// The pending decision as JSON, or `null`
    #[wasm_bindgen(js_name = pendingDecision)]
    pub fn pending_decision(&self) -> String {
        serde_json::to_string(&self.game.pending_decision()).unwrap_or_else(|_| "null".to_string())
    }

    /// Recent narration, newest first, as a JSON array of `[message, category]`
    #[wasm_bindgen(js_name = getLog)]
    pub fn get_log(&self) -> String {
        let log = self.log.borrow();
        let entries: Vec<_> = log.entries().collect();
        serde_json::to_string(&entries).unwrap_or_else(|_| "[]".to_string())
    }

    /// Per-turn snapshots as JSON
    #[wasm_bindgen(js_name = getHistory)]
    pub fn get_history(&self) -> String {
        serde_json::to_string(self.game.history()).unwrap_or_else(|_| "[]".to_string())
    }

    #[wasm_bindgen(js_name = isFinished)]
    pub fn is_finished(&self) -> bool {
        self.game.is_finished()
    }

    #[wasm_bindgen(js_name = getWinner)]
    pub fn get_winner(&self) -> Option<u8> {
        self.game.winner()
    }
}
