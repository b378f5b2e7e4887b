use crate::engine::Direction;
use crate::entity::enemy::{Enemy, SPRITE_WIDTH};
use crate::entity::{column_to_x, row_to_y, Entity, COLUMNS, ROWS};

pub const DEFAULT_SPRITE: &str = "images/char-boy.png";

const START_COLUMN: i32 = 2;
const START_ROW: i32 = 5;
// respawn one row short of the start after getting hit
const COLLISION_ROW: i32 = 4;

// hitbox is narrower than the sprite image: inset 20px from the left
// edge, 70px wide
const HITBOX_INSET: f64 = 20.0;
const HITBOX_WIDTH: f64 = 70.0;

/// The controllable entity. Owns collision detection, input handling and
/// win/reset logic; column and row stay clamped to the grid at all times.
#[derive(Debug, Clone)]
pub struct Player {
    pub entity: Entity,
    pub column: i32,
    pub won: bool,
}

impl Player {
    pub fn new() -> Self {
        Player {
            entity: Entity::new(
                DEFAULT_SPRITE.to_string(),
                START_ROW,
                column_to_x(START_COLUMN),
            ),
            column: START_COLUMN,
            won: false,
        }
    }

    fn set_pixel_position(&mut self) {
        self.entity.x = column_to_x(self.column);
        self.entity.y = row_to_y(self.entity.row);
    }

    /// Apply one directional action. Movement clamps at the grid edges
    /// (a blocked move is a silent no-op, not an error) and the whole
    /// switch is disabled once the player stands on the goal row.
    /// Returns true on the move that reaches the goal row.
    pub fn handle_input(&mut self, direction: Direction) -> bool {
        let mut just_won = false;
        if self.entity.row > 0 {
            match direction {
                Direction::Left => {
                    if self.column > 0 {
                        self.column -= 1;
                    }
                }
                Direction::Right => {
                    if self.column < COLUMNS - 1 {
                        self.column += 1;
                    }
                }
                Direction::Up => {
                    self.entity.row -= 1;
                    if self.entity.row == 0 {
                        self.won = true;
                        just_won = true;
                    }
                }
                Direction::Down => {
                    if self.entity.row < ROWS - 1 {
                        self.entity.row += 1;
                    }
                }
            }
        }
        self.set_pixel_position();
        just_won
    }

    /// Same row, and either hitbox edge falls inside the enemy's
    /// footprint. Deliberately NOT a full interval-intersection test:
    /// the containment-only check matches the original hitbox/sprite
    /// size ratios and is preserved as-is.
    pub fn check_collision(&self, enemy: &Enemy) -> bool {
        if self.entity.row != enemy.entity.row {
            return false;
        }
        let player_left = self.entity.x + HITBOX_INSET;
        let player_right = player_left + HITBOX_WIDTH;
        let enemy_left = enemy.entity.x;
        let enemy_right = enemy_left + SPRITE_WIDTH;

        (player_left >= enemy_left && player_left <= enemy_right)
            || (player_right >= enemy_left && player_right <= enemy_right)
    }

    /// Called once per rendered frame, not per input event. The first
    /// collision found sends the player back to the respawn tile.
    pub fn resolve_collisions(&mut self, enemies: &[Enemy]) {
        if enemies.iter().any(|enemy| self.check_collision(enemy)) {
            self.column = START_COLUMN;
            self.entity.row = COLLISION_ROW;
            self.set_pixel_position();
        }
    }

    pub fn set_character(&mut self, sprite: String) {
        self.entity.sprite = sprite;
    }

    pub fn reset(&mut self) {
        self.column = START_COLUMN;
        self.entity.row = START_ROW;
        self.set_pixel_position();
        self.won = false;
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}
