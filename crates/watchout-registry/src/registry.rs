//! Registered players and their heart-rate reports.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rand::Rng;
use tracing::{debug, info};
use watchout_grid::{Axis, Edge, GridPos, GRID_SIZE};
use watchout_protocols::{AddPlayerResponse, HeartRateReport, PeerInfo, RegisterRequest};

use crate::error::{RegistryError, Result};

/// Pick a random cell on the perimeter.
///
/// A uniform cell is drawn first. If it is interior, one axis chosen at
/// random is forced onto one of its two edges.
pub fn random_perimeter_cell(rng: &mut impl Rng) -> GridPos {
    let cell = GridPos::new(rng.gen_range(0..GRID_SIZE), rng.gen_range(0..GRID_SIZE));
    let axis = if rng.gen_bool(0.5) { Axis::X } else { Axis::Y };
    let edge = if rng.gen_bool(0.5) { Edge::Low } else { Edge::High };
    cell.snapped(axis, edge)
}

/// The registry's state. Owned by whoever serves it.
#[derive(Debug, Default)]
pub struct Registry {
    players: Mutex<BTreeMap<u32, PeerInfo>>,
    reports: Mutex<BTreeMap<u32, Vec<HeartRateReport>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a player at a random perimeter cell.
    pub fn add_player(&self, request: RegisterRequest) -> Result<AddPlayerResponse> {
        let cell = random_perimeter_cell(&mut rand::thread_rng());
        self.add_player_at(request, cell)
    }

    /// Register a player at `position`.
    ///
    /// The reply lists the players registered before this one. A duplicate
    /// id is rejected and leaves the registry untouched.
    pub fn add_player_at(&self, request: RegisterRequest, position: GridPos) -> Result<AddPlayerResponse> {
        let mut players = self.lock_players();
        if players.contains_key(&request.id) {
            return Err(RegistryError::Conflict(request.id));
        }

        let others: Vec<PeerInfo> = players.values().cloned().collect();
        let player = PeerInfo {
            id: request.id,
            address: request.address,
            port: request.port,
            position,
        };
        info!("Registered {}", player);
        players.insert(player.id, player);

        Ok(AddPlayerResponse {
            x: position.x,
            y: position.y,
            players: others,
        })
    }

    /// Every registered player, in id order.
    pub fn players(&self) -> Vec<PeerInfo> {
        self.lock_players().values().cloned().collect()
    }

    /// Store a heart-rate report.
    pub fn add_heart_rate(&self, report: HeartRateReport) {
        debug!(
            "Heart-rate report from player {}: {} averages",
            report.id,
            report.averages.len()
        );
        self.lock_reports().entry(report.id).or_default().push(report);
    }

    /// Mean of the last `n` averages sent by `player`.
    pub fn average_last_n(&self, n: usize, player: u32) -> Result<f64> {
        if n == 0 {
            return Err(RegistryError::InvalidArgument("n must be positive".into()));
        }
        let reports = self.lock_reports();
        let values: Vec<f64> = reports
            .get(&player)
            .into_iter()
            .flatten()
            .flat_map(|r| r.averages.iter().copied())
            .collect();
        if values.is_empty() {
            return Err(RegistryError::NotFound(format!(
                "no measurements for player {player}"
            )));
        }
        if n > values.len() {
            return Err(RegistryError::InvalidArgument(format!(
                "n is {n} but player {player} sent {} values",
                values.len()
            )));
        }
        Ok(mean(&values[values.len() - n..]))
    }

    /// Mean of every average in reports timestamped within `[t1, t2]`.
    ///
    /// Reversed bounds are swapped.
    pub fn average_between(&self, t1: u64, t2: u64) -> Result<f64> {
        let (from, to) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
        let reports = self.lock_reports();
        if reports.values().all(Vec::is_empty) {
            return Err(RegistryError::NoMeasurements);
        }
        let values: Vec<f64> = reports
            .values()
            .flatten()
            .filter(|r| (from..=to).contains(&r.timestamp))
            .flat_map(|r| r.averages.iter().copied())
            .collect();
        if values.is_empty() {
            return Err(RegistryError::NotFound(format!(
                "no measurements between {from} and {to}"
            )));
        }
        Ok(mean(&values))
    }

    fn lock_players(&self) -> MutexGuard<'_, BTreeMap<u32, PeerInfo>> {
        self.players.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_reports(&self) -> MutexGuard<'_, BTreeMap<u32, Vec<HeartRateReport>>> {
        self.reports.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
