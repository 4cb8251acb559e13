//! Movement across the board.
//!
//! Players do not teleport: reaching another cell takes time proportional to
//! the Euclidean distance. The conversion is
//!
//! ```text
//! travel_ms = ceil(distance_cells * METERS_PER_CELL / WALKING_SPEED_M_PER_MS)
//! ```

use std::time::Duration;

use crate::pos::GridPos;

/// Side length of one cell, in meters.
pub const METERS_PER_CELL: f64 = 10.0;

/// Walking speed, 2 m/s expressed in meters per millisecond.
pub const WALKING_SPEED_M_PER_MS: f64 = 0.002;

/// Time needed to walk `distance` cells.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use watchout_grid::travel_time;
///
/// assert_eq!(travel_time(1.0), Duration::from_secs(5));
/// assert_eq!(travel_time(0.0), Duration::ZERO);
/// ```
pub fn travel_time(distance: f64) -> Duration {
    let meters = distance.max(0.0) * METERS_PER_CELL;
    Duration::from_millis((meters / WALKING_SPEED_M_PER_MS).ceil() as u64)
}

/// Find the candidate closest to `from`.
///
/// Returns the winning candidate together with its distance. On equal
/// distances the earliest candidate in iteration order wins.
pub fn nearest<'a, T, I, F>(from: GridPos, candidates: I, position: F) -> Option<(&'a T, f64)>
where
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> GridPos,
{
    let mut best: Option<(&'a T, f64)> = None;
    for candidate in candidates {
        let d = from.distance(&position(candidate));
        match best {
            Some((_, closest)) if d >= closest => {}
            _ => best = Some((candidate, d)),
        }
    }
    best
}
