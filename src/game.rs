use crate::browser;
use crate::engine::{Assets, Command, Game, Rect, Renderer};
use crate::entity::enemy::Enemy;
use crate::entity::player::Player;
use crate::entity::{column_to_x, row_to_y, COLUMNS, ROWS};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub const CANVAS_WIDTH: f64 = 505.0;
pub const CANVAS_HEIGHT: f64 = 606.0;

// enemies survive this far past the right edge before being dropped
const PRUNE_MARGIN: f64 = 300.0;

// background tiles carry a transparent strip at the top; shifting the
// grid down by this much lines the artwork up with the entity rows
const ROW_PIXEL_OFFSET: f64 = 15.0;

const WIN_MODAL_ID: &str = "win-modal";
const WIN_PANEL_DELAY_MS: i32 = 1000;

// top row water (goal), three stone road rows, two grass rows
const ROW_SPRITES: [&str; ROWS as usize] = [
    "images/water-block.png",
    "images/stone-block.png",
    "images/stone-block.png",
    "images/stone-block.png",
    "images/grass-block.png",
    "images/grass-block.png",
];

const SPRITES: [&str; 9] = [
    "images/stone-block.png",
    "images/water-block.png",
    "images/grass-block.png",
    "images/enemy-bug.png",
    "images/char-boy.png",
    "images/char-cat-girl.png",
    "images/char-horn-girl.png",
    "images/char-pink-girl.png",
    "images/char-princess-girl.png",
];

/// Current level and the enemy-spawn-gap range it implies. Gaps tighten
/// as the level climbs; an unrecognized level leaves everything alone.
#[derive(Debug, Clone, PartialEq)]
pub struct Difficulty {
    pub level: u8,
    pub min_gap: f64,
    pub max_gap: f64,
}

impl Difficulty {
    pub fn new() -> Self {
        Difficulty {
            level: 1,
            min_gap: 100.0,
            max_gap: 300.0,
        }
    }

    pub fn change(&mut self, new_level: u8) {
        let (min_gap, max_gap) = match new_level {
            1 => (100.0, 300.0),
            2 => (80.0, 220.0),
            3 => (50.0, 150.0),
            _ => return,
        };
        self.level = new_level;
        self.min_gap = min_gap;
        self.max_gap = max_gap;
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::new()
    }
}

/// Deferred win-panel notification. The browser-backed implementation
/// lives behind this seam so the game state stays testable off-wasm.
pub trait WinAnnouncer {
    /// Fire the notification hook after the fixed delay.
    fn schedule(&mut self);
    /// Drop a pending notification, so a reset before the delay elapses
    /// never surfaces a stale win panel.
    fn cancel(&mut self);
}

struct ModalAnnouncer {
    pending: Option<i32>,
}

impl ModalAnnouncer {
    fn new() -> Self {
        ModalAnnouncer { pending: None }
    }
}

impl WinAnnouncer for ModalAnnouncer {
    fn schedule(&mut self) {
        self.cancel();
        let callback = browser::closure_once(|| {
            if let Err(err) = browser::set_element_display(WIN_MODAL_ID, "block") {
                log!("Could not show win panel : {:#?}", err);
            }
        });
        match browser::set_timeout(&callback, WIN_PANEL_DELAY_MS) {
            Ok(handle) => self.pending = Some(handle),
            Err(err) => log!("Could not schedule win panel : {:#?}", err),
        }
        callback.forget();
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            let _ = browser::clear_timeout(handle);
        }
    }
}

/// Everything the loop mutates each tick: the live enemies (insertion
/// order, oldest first), the player, difficulty and the RNG feeding
/// spawn gaps and enemy construction.
pub struct GameState {
    enemies: Vec<Enemy>,
    player: Player,
    difficulty: Difficulty,
    rng: SmallRng,
    announcer: Box<dyn WinAnnouncer>,
}

impl GameState {
    pub fn new(announcer: Box<dyn WinAnnouncer>, rng: SmallRng) -> Self {
        GameState {
            enemies: Vec::new(),
            player: Player::new(),
            difficulty: Difficulty::new(),
            rng,
            announcer,
        }
    }

    pub fn handle_command(&mut self, command: Command) {
        match command {
            Command::Move(direction) => {
                if self.player.handle_input(direction) {
                    self.announcer.schedule();
                }
            }
            Command::Reset => self.reset(),
            Command::SetDifficulty(level) => self.difficulty.change(level),
            Command::SetCharacter(sprite) => self.player.set_character(sprite),
        }
    }

    /// Per-tick entity pass: spawn, then move-or-prune in one sweep.
    /// Suspended entirely while the session is in the won state; the
    /// final frame stays up underneath the win panel.
    pub fn update(&mut self, dt: f64) {
        if self.player.won {
            return;
        }

        let should_spawn = match self.enemies.last() {
            None => true,
            // gap is sampled fresh on every decision, so the spacing
            // between consecutive enemies varies within the range
            Some(newest) => {
                newest.entity.x > self.rng.gen_range(self.difficulty.min_gap..self.difficulty.max_gap)
            }
        };
        if should_spawn {
            self.enemies
                .push(Enemy::new(self.difficulty.level, &mut self.rng));
        }

        // an enemy past the prune line is removed instead of updated;
        // the two branches are mutually exclusive within a tick
        self.enemies.retain_mut(|enemy| {
            if enemy.entity.x > CANVAS_WIDTH + PRUNE_MARGIN {
                false
            } else {
                enemy.update(dt);
                true
            }
        });
    }

    /// Collision resolution runs once per rendered frame, against the
    /// pixel positions established by that frame, not per input event.
    pub fn resolve_frame(&mut self) {
        self.player.resolve_collisions(&self.enemies);
    }

    pub fn reset(&mut self) {
        self.enemies.clear();
        self.player.reset();
        self.announcer.cancel();
    }
}

pub enum BugCrossing {
    /// Initialize state while sprites are being loaded
    Loading,
    /// Active game session with loaded assets
    Loaded(Session),
}

pub struct Session {
    state: GameState,
    assets: Assets,
}

impl Session {
    fn draw_frame(&self, renderer: &Renderer) -> Result<()> {
        renderer.clear(&Rect {
            x: 0.0,
            y: 0.0,
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
        });

        for (row, sprite) in ROW_SPRITES.iter().enumerate() {
            for column in 0..COLUMNS {
                renderer.draw_image(
                    self.assets.get(sprite)?,
                    column_to_x(column),
                    row_to_y(row as i32) + ROW_PIXEL_OFFSET,
                );
            }
        }

        // draw order matters : road first, then bugs, player on top
        for enemy in &self.state.enemies {
            renderer.draw_image(
                self.assets.get(&enemy.entity.sprite)?,
                enemy.entity.x,
                enemy.entity.y,
            );
        }
        let player = &self.state.player;
        renderer.draw_image(
            self.assets.get(&player.entity.sprite)?,
            player.entity.x,
            player.entity.y,
        );

        Ok(())
    }
}

impl BugCrossing {
    pub fn new() -> Self {
        BugCrossing::Loading
    }
}

impl Default for BugCrossing {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Game for BugCrossing {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            BugCrossing::Loading => {
                let assets = Assets::load(&SPRITES).await?;
                log!("Loaded {} sprites", SPRITES.len());
                let state =
                    GameState::new(Box::new(ModalAnnouncer::new()), SmallRng::from_entropy());
                Ok(Box::new(BugCrossing::Loaded(Session { state, assets })))
            }
            BugCrossing::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn handle_command(&mut self, command: Command) {
        if let BugCrossing::Loaded(session) = self {
            session.state.handle_command(command);
        }
    }

    fn update(&mut self, dt: f64) {
        if let BugCrossing::Loaded(session) = self {
            session.state.update(dt);
        }
    }

    fn draw(&mut self, renderer: &Renderer) {
        if let BugCrossing::Loaded(session) = self {
            if let Err(err) = session.draw_frame(renderer) {
                log!("Skipping frame, draw failed : {:#?}", err);
            }
            session.state.resolve_frame();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Direction;
    use std::cell::Cell;
    use std::rc::Rc;

    struct NullAnnouncer;

    impl WinAnnouncer for NullAnnouncer {
        fn schedule(&mut self) {}
        fn cancel(&mut self) {}
    }

    #[derive(Clone, Default)]
    struct RecordingAnnouncer {
        scheduled: Rc<Cell<usize>>,
        cancelled: Rc<Cell<usize>>,
    }

    impl WinAnnouncer for RecordingAnnouncer {
        fn schedule(&mut self) {
            self.scheduled.set(self.scheduled.get() + 1);
        }
        fn cancel(&mut self) {
            self.cancelled.set(self.cancelled.get() + 1);
        }
    }

    fn seeded_state(seed: u64) -> GameState {
        GameState::new(Box::new(NullAnnouncer), SmallRng::seed_from_u64(seed))
    }

    fn enemy_at(x: f64) -> Enemy {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut enemy = Enemy::new(1, &mut rng);
        enemy.entity.x = x;
        enemy
    }

    #[test]
    fn difficulty_table() {
        let mut difficulty = Difficulty::new();
        assert_eq!(difficulty, Difficulty { level: 1, min_gap: 100.0, max_gap: 300.0 });

        difficulty.change(2);
        assert_eq!(difficulty, Difficulty { level: 2, min_gap: 80.0, max_gap: 220.0 });

        difficulty.change(3);
        assert_eq!(difficulty, Difficulty { level: 3, min_gap: 50.0, max_gap: 150.0 });

        // unrecognized level is a silent no-op
        difficulty.change(9);
        assert_eq!(difficulty, Difficulty { level: 3, min_gap: 50.0, max_gap: 150.0 });
    }

    #[test]
    fn first_update_spawns_into_empty_collection() {
        let mut state = seeded_state(1);
        state.update(0.016);
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.enemies[0].level, 1);
    }

    #[test]
    fn no_spawn_while_newest_enemy_is_short_of_the_gap() {
        // replicate the gap draw the spawn decision will make
        let sampled_gap = SmallRng::seed_from_u64(7).gen_range(100.0..300.0);

        let mut state = seeded_state(7);
        state.enemies.push(enemy_at(sampled_gap - 1.0));
        state.update(0.016);
        assert_eq!(state.enemies.len(), 1);
    }

    #[test]
    fn spawn_once_newest_enemy_clears_the_gap() {
        let sampled_gap = SmallRng::seed_from_u64(7).gen_range(100.0..300.0);

        let mut state = seeded_state(7);
        state.enemies.push(enemy_at(sampled_gap + 1.0));
        state.update(0.016);
        assert_eq!(state.enemies.len(), 2);
        // newest enemy spawned off the left edge and took one step
        let newest = state.enemies.last().unwrap();
        assert!(newest.entity.x < 0.0);
    }

    #[test]
    fn spawned_enemy_uses_current_difficulty_level() {
        let mut state = seeded_state(3);
        state.handle_command(Command::SetDifficulty(3));
        state.update(0.016);
        let enemy = &state.enemies[0];
        assert_eq!(enemy.level, 3);
        assert!(enemy.speed >= 6.0 && enemy.speed <= 8.0);
    }

    #[test]
    fn enemy_past_prune_line_is_removed_without_moving() {
        let mut state = seeded_state(4);
        state.enemies.push(enemy_at(CANVAS_WIDTH + 301.0));
        state.update(0.016);
        // the stale enemy is gone; only the freshly spawned one remains
        assert_eq!(state.enemies.len(), 1);
        assert!(state.enemies.iter().all(|enemy| enemy.entity.x < 0.0));
    }

    #[test]
    fn enemy_short_of_prune_line_is_retained() {
        let mut state = seeded_state(4);
        state.enemies.push(enemy_at(CANVAS_WIDTH + 299.0));
        state.update(0.016);
        assert_eq!(state.enemies.len(), 2);
        assert!(state
            .enemies
            .iter()
            .any(|enemy| enemy.entity.x >= CANVAS_WIDTH + 299.0));
    }

    #[test]
    fn update_is_suspended_while_won() {
        let mut state = seeded_state(5);
        state.enemies.push(enemy_at(50.0));
        state.player.won = true;

        state.update(0.016);
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.enemies[0].entity.x, 50.0);
    }

    #[test]
    fn resolve_frame_respawns_player_on_collision() {
        let mut state = seeded_state(6);
        for _ in 0..2 {
            state.handle_command(Command::Move(Direction::Up));
        }
        let mut enemy = enemy_at(250.0);
        enemy.entity.row = 3;
        state.enemies.push(enemy);

        state.resolve_frame();
        assert_eq!(state.player.column, 2);
        assert_eq!(state.player.entity.row, 4);
    }

    #[test]
    fn winning_move_schedules_the_announcement_once() {
        let announcer = RecordingAnnouncer::default();
        let mut state = GameState::new(Box::new(announcer.clone()), SmallRng::seed_from_u64(8));

        for _ in 0..5 {
            state.handle_command(Command::Move(Direction::Up));
        }
        assert_eq!(announcer.scheduled.get(), 1);

        // further input on the goal row never re-announces
        state.handle_command(Command::Move(Direction::Up));
        assert_eq!(announcer.scheduled.get(), 1);
    }

    #[test]
    fn reset_clears_session_and_cancels_pending_announcement() {
        let announcer = RecordingAnnouncer::default();
        let mut state = GameState::new(Box::new(announcer.clone()), SmallRng::seed_from_u64(9));

        state.update(0.016);
        for _ in 0..5 {
            state.handle_command(Command::Move(Direction::Up));
        }
        assert!(state.player.won);
        assert!(!state.enemies.is_empty());

        state.handle_command(Command::Reset);
        assert!(state.enemies.is_empty());
        assert!(!state.player.won);
        assert_eq!(state.player.column, 2);
        assert_eq!(state.player.entity.row, 5);
        assert_eq!(announcer.cancelled.get(), 1);
    }

    #[test]
    fn set_character_command_swaps_the_player_sprite() {
        let mut state = seeded_state(10);
        state.handle_command(Command::SetCharacter("images/char-princess-girl.png".to_string()));
        assert_eq!(state.player.entity.sprite, "images/char-princess-girl.png");
    }
}
