use crate::engine::FRAME_THRESHOLD;
use crate::entity::Entity;
use rand::Rng;

pub const ENEMY_SPRITE: &str = "images/enemy-bug.png";
/// Full sprite width, also the enemy's collision footprint.
pub const SPRITE_WIDTH: f64 = 101.0;

// spawn just off the left edge of the canvas
const SPAWN_X: f64 = -101.0;

/// A moving obstacle on one of the three road rows. Speed is fixed at
/// construction and lands in a level-dependent band: {2l, 2l+1, 2l+2}
/// for level l, so levels map to disjoint ascending bands.
#[derive(Debug, Clone)]
pub struct Enemy {
    pub entity: Entity,
    pub level: u8,
    pub speed: f64,
}

impl Enemy {
    pub fn new(level: u8, rng: &mut impl Rng) -> Self {
        let row = rng.gen_range(1..4);
        let speed = f64::from(rng.gen_range(0..3) + i32::from(level) * 2);
        Enemy {
            entity: Entity::new(ENEMY_SPRITE.to_string(), row, SPAWN_X),
            level,
            speed,
        }
    }

    /// Advance by `speed` once at least a full ~100 fps frame has elapsed.
    /// No clamping; x grows unbounded until the game loop prunes it.
    pub fn update(&mut self, dt: f64) {
        if dt >= FRAME_THRESHOLD {
            self.entity.x += self.speed;
        }
    }
}
