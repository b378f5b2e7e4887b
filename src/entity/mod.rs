pub mod enemy;
pub mod player;

// fixed 6x5 tile layout, 101x83 px per tile
pub const COLUMNS: i32 = 5;
pub const ROWS: i32 = 6;
pub const TILE_WIDTH: f64 = 101.0;
pub const TILE_HEIGHT: f64 = 83.0;

pub fn column_to_x(column: i32) -> f64 {
    f64::from(column) * TILE_WIDTH
}

pub fn row_to_y(row: i32) -> f64 {
    f64::from(row) * TILE_HEIGHT
}

/// Shared positional record for anything rendered on the grid. Player and
/// Enemy compose this rather than extending a base class; `y` is always
/// derived from `row`, never mutated independently.
#[derive(Debug, Clone)]
pub struct Entity {
    pub sprite: String,
    pub row: i32,
    pub x: f64,
    pub y: f64,
}

impl Entity {
    pub fn new(sprite: String, row: i32, x: f64) -> Self {
        Entity {
            sprite,
            row,
            x,
            y: row_to_y(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_to_pixel_conversion() {
        assert_eq!(column_to_x(0), 0.0);
        assert_eq!(column_to_x(2), 202.0);
        assert_eq!(column_to_x(4), 404.0);
        assert_eq!(row_to_y(0), 0.0);
        assert_eq!(row_to_y(5), 415.0);
    }

    #[test]
    fn entity_derives_y_from_row() {
        let entity = Entity::new("images/enemy-bug.png".to_string(), 3, -101.0);
        assert_eq!(entity.y, 249.0);
        assert_eq!(entity.x, -101.0);
    }
}
