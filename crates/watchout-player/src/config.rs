//! Player configuration.
//!
//! Everything comes from `WATCHOUT_*` environment variables. The id and port
//! may also be given as the first two command line arguments, which take
//! precedence.

use std::time::Duration;

use watchout_grid::travel_time;

use crate::error::{Error, Result};

/// Default port of the peer RPC server.
pub const DEFAULT_PORT: u16 = 50051;

/// Time a hider has to stay at the home base before it is safe.
pub const HOME_BASE_DWELL: Duration = Duration::from_secs(10);

/// How long simulated movement takes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameTiming {
    /// Multiplier applied to every simulated delay. `1.0` is real time.
    pub time_scale: f64,
    /// Unscaled stay at the home base.
    pub dwell: Duration,
}

impl Default for GameTiming {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            dwell: HOME_BASE_DWELL,
        }
    }
}

impl GameTiming {
    /// Real-time timing scaled by `time_scale`.
    pub fn scaled(time_scale: f64) -> Self {
        Self {
            time_scale,
            ..Self::default()
        }
    }

    /// Time to walk `distance` cells.
    pub fn travel(&self, distance: f64) -> Duration {
        travel_time(distance).mul_f64(self.time_scale)
    }

    /// Time to wait at the home base.
    pub fn dwell(&self) -> Duration {
        self.dwell.mul_f64(self.time_scale)
    }
}

/// Configuration for one player process.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Id to register with
    pub id: u32,
    /// Port the peer RPC server listens on (0 picks a free one)
    pub port: u16,
    /// Address other peers use to reach this one
    pub advertise_addr: String,
    /// Base URL of the registry HTTP API
    pub registry_url: String,
    /// `host:port` of the registry's broadcast hub
    pub broadcast_addr: String,
    /// Simulated time
    pub timing: GameTiming,
    /// How often heart-rate averages are pushed to the registry
    pub report_interval: Duration,
}

impl PlayerConfig {
    /// Build the config from the process arguments and environment.
    pub fn from_env() -> Result<Self> {
        Self::from_sources(std::env::args().skip(1), |key| std::env::var(key).ok())
    }

    /// Build the config from explicit arguments and a variable lookup.
    pub fn from_sources<A, F>(args: A, var: F) -> Result<Self>
    where
        A: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let mut args = args.into_iter();

        let id = args
            .next()
            .or_else(|| var("WATCHOUT_ID"))
            .ok_or_else(|| Error::Config("player id missing (argument or WATCHOUT_ID)".into()))?;
        let id = parse("id", &id)?;

        let port = match args.next().or_else(|| var("WATCHOUT_PORT")) {
            Some(port) => parse("port", &port)?,
            None => DEFAULT_PORT,
        };

        let time_scale: f64 = match var("WATCHOUT_TIME_SCALE") {
            Some(scale) => parse("WATCHOUT_TIME_SCALE", &scale)?,
            None => 1.0,
        };
        if !time_scale.is_finite() || time_scale < 0.0 {
            return Err(Error::Config(format!("invalid WATCHOUT_TIME_SCALE: {time_scale}")));
        }

        let report_interval = match var("WATCHOUT_REPORT_INTERVAL_SECS") {
            Some(secs) => Duration::from_secs(parse("WATCHOUT_REPORT_INTERVAL_SECS", &secs)?),
            None => Duration::from_secs(10),
        };
        if report_interval.is_zero() {
            return Err(Error::Config("WATCHOUT_REPORT_INTERVAL_SECS must be positive".into()));
        }

        Ok(Self {
            id,
            port,
            advertise_addr: var("WATCHOUT_ADVERTISE_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            registry_url: var("WATCHOUT_REGISTRY_URL")
                .unwrap_or_else(|| "http://127.0.0.1:1337".to_string()),
            broadcast_addr: var("WATCHOUT_BROADCAST_ADDR")
                .unwrap_or_else(|| "127.0.0.1:1338".to_string()),
            timing: GameTiming::scaled(time_scale),
            report_interval,
        })
    }
}

fn parse<T: std::str::FromStr>(what: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("invalid {what} {value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults() {
        let config = PlayerConfig::from_sources(args(&["3"]), env(&[])).unwrap();
        assert_eq!(config.id, 3);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.advertise_addr, "127.0.0.1");
        assert_eq!(config.registry_url, "http://127.0.0.1:1337");
        assert_eq!(config.broadcast_addr, "127.0.0.1:1338");
        assert_eq!(config.timing, GameTiming::default());
        assert_eq!(config.report_interval, Duration::from_secs(10));
    }

    #[test]
    fn arguments_override_environment() {
        let vars = env(&[("WATCHOUT_ID", "1"), ("WATCHOUT_PORT", "4000")]);
        let config = PlayerConfig::from_sources(args(&["9", "5000"]), &vars).unwrap();
        assert_eq!((config.id, config.port), (9, 5000));

        let config = PlayerConfig::from_sources(args(&[]), &vars).unwrap();
        assert_eq!((config.id, config.port), (1, 4000));
    }

    #[test]
    fn invalid_values_are_config_errors() {
        assert!(matches!(
            PlayerConfig::from_sources(args(&[]), env(&[])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            PlayerConfig::from_sources(args(&["x"]), env(&[])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            PlayerConfig::from_sources(args(&["1", "70000"]), env(&[])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            PlayerConfig::from_sources(args(&["1"]), env(&[("WATCHOUT_TIME_SCALE", "-2")])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn timing_scales_every_delay() {
        let real = GameTiming::default();
        assert_eq!(real.travel(1.0), Duration::from_secs(5));
        assert_eq!(real.dwell(), Duration::from_secs(10));

        let fast = GameTiming::scaled(0.5);
        assert_eq!(fast.travel(1.0), Duration::from_millis(2_500));
        assert_eq!(fast.dwell(), Duration::from_secs(5));
    }
}
