// ==================== Modules ====================
#[macro_use]
mod browser;
mod engine;
mod entity;
mod game;

// ==================== Imports ====================
use anyhow::{anyhow, Result};
use engine::{Command, Direction, GameLoop};
use futures::channel::mpsc::{unbounded, UnboundedSender};
use game::BugCrossing;
use once_cell::sync::OnceCell;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::KeyboardEvent;

/// Command sender shared with the exported settings-panel functions.
/// Set once in main_js; everything runs on the single browser thread.
static COMMANDS: OnceCell<UnboundedSender<Command>> = OnceCell::new();

fn dispatch(command: Command) {
    if let Some(sender) = COMMANDS.get() {
        let _ = sender.unbounded_send(command);
    }
}

fn attach_keyboard(sender: UnboundedSender<Command>) -> Result<()> {
    let callback = browser::closure_wrap(Box::new(move |event: KeyboardEvent| {
        let direction = match event.key().as_str() {
            "ArrowLeft" => Direction::Left,
            "ArrowRight" => Direction::Right,
            "ArrowUp" => Direction::Up,
            "ArrowDown" => Direction::Down,
            // anything else is not ours to handle
            _ => return,
        };
        let _ = sender.unbounded_send(Command::Move(direction));
    }) as Box<dyn FnMut(KeyboardEvent)>);

    browser::document()?
        .add_event_listener_with_callback("keyup", callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Could not attach keyup listener : {:#?}", err))?;

    // listener lives for the lifetime of the page
    callback.forget();
    Ok(())
}

// ==================== Main Functions ====================
/// Main entry for the Webassembly module
/// - wires the keyboard to the command channel
/// - kicks off sprite loading and the game loop
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    let (sender, receiver) = unbounded();
    COMMANDS
        .set(sender.clone())
        .map_err(|_| JsValue::from_str("main_js called more than once"))?;
    attach_keyboard(sender).map_err(|err| JsValue::from_str(&format!("{:#?}", err)))?;

    // spawns a new asynchronous task in local thread, for web assembly
    // environment, using wasm_bindgen_futures
    browser::spawn_local(async move {
        GameLoop::start(BugCrossing::new(), receiver)
            .await
            .expect("Could not start game loop");
    });

    Ok(())
}

// ==================== Settings UI Commands ====================
// The host page calls these from its settings panel; the core only sees
// the resulting commands on the next tick.

#[wasm_bindgen]
pub fn restart_game() {
    dispatch(Command::Reset);
}

#[wasm_bindgen]
pub fn select_difficulty(level: u8) {
    dispatch(Command::SetDifficulty(level));
}

#[wasm_bindgen]
pub fn select_character(sprite: String) {
    dispatch(Command::SetCharacter(sprite));
}
