//! Simulated heart-rate telemetry.
//!
//! A sensor produces one reading per [`SAMPLE_PERIOD`]. Readings go through a
//! sliding window of [`WINDOW_SIZE`] with [`WINDOW_OVERLAP`] readings of
//! overlap, each full window yielding one average. Averages are pushed to
//! the registry in batches. The round state machine never looks at any of
//! this.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::warn;
use watchout_protocols::HeartRateReport;

use crate::registration::RegistryClient;

/// Readings per window.
pub const WINDOW_SIZE: usize = 8;

/// Readings shared by two consecutive windows.
pub const WINDOW_OVERLAP: usize = 4;

/// Time between two sensor readings.
pub const SAMPLE_PERIOD: Duration = Duration::from_millis(250);

/// Fixed-size window with 50% overlap.
#[derive(Debug, Default)]
pub struct SlidingWindow {
    readings: Vec<f64>,
}

impl SlidingWindow {
    pub fn new() -> Self {
        Self {
            readings: Vec::with_capacity(WINDOW_SIZE),
        }
    }

    /// Add a reading. Returns the window average when the window fills up,
    /// after which the oldest readings outside the overlap are dropped.
    pub fn push(&mut self, reading: f64) -> Option<f64> {
        self.readings.push(reading);
        if self.readings.len() < WINDOW_SIZE {
            return None;
        }
        let average = self.readings.iter().sum::<f64>() / WINDOW_SIZE as f64;
        self.readings.drain(..WINDOW_SIZE - WINDOW_OVERLAP);
        Some(average)
    }
}

/// Random walk around a resting heart rate.
#[derive(Debug)]
pub struct HeartRateSensor {
    current: f64,
}

impl Default for HeartRateSensor {
    fn default() -> Self {
        Self { current: 70.0 }
    }
}

impl HeartRateSensor {
    pub fn read(&mut self, rng: &mut impl Rng) -> f64 {
        self.current = (self.current + rng.gen_range(-3.0..=3.0)).clamp(50.0, 180.0);
        self.current
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Sample the sensor and upload averages every `report_interval` until the
/// task is aborted. Failed uploads are logged and the batch is dropped.
pub fn spawn(id: u32, registry: RegistryClient, report_interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut sensor = HeartRateSensor::default();
        let mut window = SlidingWindow::new();
        let mut averages = Vec::new();

        let mut sample = interval(SAMPLE_PERIOD);
        let mut report = interval(report_interval);
        report.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick fires immediately
        report.tick().await;

        loop {
            tokio::select! {
                _ = sample.tick() => {
                    let reading = sensor.read(&mut rand::thread_rng());
                    if let Some(average) = window.push(reading) {
                        averages.push(average);
                    }
                }
                _ = report.tick() => {
                    let batch = HeartRateReport {
                        id,
                        timestamp: now_millis(),
                        averages: std::mem::take(&mut averages),
                    };
                    if let Err(e) = registry.report_heart_rate(&batch).await {
                        warn!("Dropping {} heart-rate averages: {}", batch.averages.len(), e);
                    }
                }
            }
        }
    })
}
