//! Onboarding walkthrough as an explicit transition table.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::INITIAL_DRIVING_STEPS;

/// Tutorial stages, in the only order they may be visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TutorialPhase {
    #[default]
    None,
    KeysPlacement,
    InitialDriving,
    Countdown,
    Interrupt,
    Normal,
}

/// Result of one `advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: TutorialPhase,
    pub to: TutorialPhase,
    pub step: u32,
}

impl Transition {
    #[must_use]
    pub fn changed_phase(&self) -> bool {
        self.from != self.to
    }

    #[must_use]
    pub fn entered(&self, phase: TutorialPhase) -> bool {
        self.changed_phase() && self.to == phase
    }
}

impl TutorialPhase {
    pub const ORDER: [Self; 6] = [
        Self::None,
        Self::KeysPlacement,
        Self::InitialDriving,
        Self::Countdown,
        Self::Interrupt,
        Self::Normal,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::KeysPlacement => "keys_placement",
            Self::InitialDriving => "initial_driving",
            Self::Countdown => "countdown",
            Self::Interrupt => "interrupt",
            Self::Normal => "normal",
        }
    }

    /// True while the walkthrough gates input.
    #[must_use]
    pub const fn is_in_tutorial(self) -> bool {
        !matches!(self, Self::None | Self::Normal)
    }

    /// Compute the next phase and step from the current step and ignition flag.
    #[must_use]
    pub const fn next(self, step: u32, keys_in_ignition: bool) -> Transition {
        let (to, step) = match self {
            Self::KeysPlacement if keys_in_ignition => (Self::InitialDriving, 0),
            Self::KeysPlacement => (Self::KeysPlacement, step),
            Self::InitialDriving => {
                let step = step.saturating_add(1);
                if step >= INITIAL_DRIVING_STEPS {
                    (Self::Countdown, 0)
                } else {
                    (Self::InitialDriving, step)
                }
            }
            Self::Countdown => (Self::Interrupt, 0),
            Self::Interrupt | Self::Normal | Self::None => (Self::Normal, 0),
        };
        Transition {
            from: self,
            to,
            step,
        }
    }
}

impl fmt::Display for TutorialPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TutorialPhase {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ORDER
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or(())
    }
}
