//! Game phases.

use serde::{Deserialize, Serialize};

/// Phase of a round as seen by one peer.
///
/// The declaration order is the order of progress, which is what peers use to
/// pick the most advanced phase when they join a game already underway:
///
/// ```text
/// UNKNOWN → PREPARATION → ELECTION → GAME → END → PREPARATION → …
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Bootstrap value, resolved while joining.
    #[default]
    Unknown,
    /// Waiting for the next round to start.
    Preparation,
    /// A seeker is being elected.
    Election,
    /// The round is being played.
    Game,
    /// The seeker has declared the round over.
    End,
}

impl Phase {
    /// The most advanced phase among `phases`, or `Unknown` if empty.
    pub fn most_advanced<I: IntoIterator<Item = Phase>>(phases: I) -> Phase {
        phases.into_iter().max().unwrap_or_default()
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::Preparation => write!(f, "PREPARATION"),
            Self::Election => write!(f, "ELECTION"),
            Self::Game => write!(f, "GAME"),
            Self::End => write!(f, "END"),
        }
    }
}
