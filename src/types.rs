// src/types.rs

use std::fmt;
use std::str::FromStr;

/// Part of a run that an event or error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Configure,
    Stage,
    Reconcile,
    Activate,
    Provision,
    Cleanup,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Configure => "configure",
            Phase::Stage => "stage",
            Phase::Reconcile => "reconcile",
            Phase::Activate => "activate",
            Phase::Provision => "provision",
            Phase::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a release directory.
///
/// - `Staged`: cloned and being prepared, not serving traffic yet.
/// - `Active`: the target of the `current` alias.
/// - `Retired`: superseded, still on disk until a cleanup pass removes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReleaseState {
    #[default]
    Staged,
    Active,
    Retired,
}

impl fmt::Display for ReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReleaseState::Staged => "staged",
            ReleaseState::Active => "active",
            ReleaseState::Retired => "retired",
        };
        f.write_str(s)
    }
}

impl FromStr for ReleaseState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "staged" => Ok(ReleaseState::Staged),
            "active" => Ok(ReleaseState::Active),
            "retired" => Ok(ReleaseState::Retired),
            other => Err(format!(
                "invalid release state: {other} (expected \"staged\", \"active\" or \"retired\")"
            )),
        }
    }
}
