//! Entrypoint phases

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::metadata::Side;

/// A named point in the boot sequence where mod code runs
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Before the game's own initialization
    PreLaunch,
    /// Common initialization on both sides
    Main,
    Client,
    Server,
    /// A phase a host or another mod defines
    Custom(String),
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::PreLaunch => "preLaunch",
            Phase::Main => "main",
            Phase::Client => "client",
            Phase::Server => "server",
            Phase::Custom(name) => name,
        }
    }

    /// Phases run during boot, in order, for one side
    pub fn boot_sequence(side: Side) -> [Phase; 3] {
        let side_phase = match side {
            Side::Client => Phase::Client,
            Side::Server => Phase::Server,
        };
        [Phase::PreLaunch, Phase::Main, side_phase]
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "preLaunch" => Phase::PreLaunch,
            "main" => Phase::Main,
            "client" => Phase::Client,
            "server" => Phase::Server,
            other => Phase::Custom(other.to_string()),
        })
    }
}

impl From<&str> for Phase {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(phase) => phase,
            Err(never) => match never {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_names_round_trip() {
        for name in ["preLaunch", "main", "client", "server", "worldgen"] {
            assert_eq!(Phase::from(name).as_str(), name);
        }
        assert_eq!(Phase::from("worldgen"), Phase::Custom("worldgen".to_string()));
    }

    #[test]
    fn test_boot_sequence() {
        assert_eq!(
            Phase::boot_sequence(Side::Server),
            [Phase::PreLaunch, Phase::Main, Phase::Server]
        );
    }
}
