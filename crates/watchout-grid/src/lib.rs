//! WatchOut Board Geometry
//!
//! The game is played on a 10×10 grid of cells. Every player is placed on the
//! perimeter when it registers, and the home base sits in the 2×2 block of
//! cells in the middle of the board.
//!
//! # Distances
//!
//! All distances are Euclidean and measured in cells. One cell is
//! [`METERS_PER_CELL`] meters, and players move at [`WALKING_SPEED_M_PER_MS`],
//! so a distance in cells converts directly into simulated travel time
//! (see [`travel_time`]).
//!
//! ```text
//!   0 1 2 3 4 5 6 7 8 9
//! 0 . . . . . . . . . .
//! 1 .                 .
//! 2 .                 .
//! 3 .                 .
//! 4 .       H H       .
//! 5 .       H H       .
//! 6 .                 .
//! 7 .                 .
//! 8 .                 .
//! 9 . . . . . . . . . .
//! ```

mod error;
mod motion;
mod pos;

pub use error::{GridError, Result};
pub use motion::{nearest, travel_time, METERS_PER_CELL, WALKING_SPEED_M_PER_MS};
pub use pos::{Axis, Edge, GridPos, CENTER_CELLS};

/// Number of cells along each side of the board.
pub const GRID_SIZE: u8 = 10;

/// Largest valid coordinate on either axis.
pub const MAX_COORD: u8 = GRID_SIZE - 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_block_is_in_the_middle() {
        for cell in CENTER_CELLS {
            assert_eq!(cell.x.min(MAX_COORD - cell.x), 4);
            assert_eq!(cell.y.min(MAX_COORD - cell.y), 4);
        }
    }
}
