use std::fmt;
use std::str::FromStr;

use kitpuzzle_core::StepNumber;
use serde::Serialize;

/// User action on the step list.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    /// Place the pieces of the open step and move on to the next one.
    Finalize,
    /// Take back the pieces of the last placed step.
    GoBack,
    /// Open a specific step, placing or taking back pieces as needed.
    JumpTo(StepNumber),
    /// Take back every piece.
    Reset,
    /// Place every remaining piece.
    FinishAll,
    /// Undo the most recent backward action.
    Redo,
}
impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepAction::Finalize => write!(f, "next"),
            StepAction::GoBack => write!(f, "back"),
            StepAction::JumpTo(n) => write!(f, "jump:{n}"),
            StepAction::Reset => write!(f, "reset"),
            StepAction::FinishAll => write!(f, "all"),
            StepAction::Redo => write!(f, "redo"),
        }
    }
}

/// Error parsing a [`StepAction`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown step action {0:?}; expected next, back, reset, all, redo, or jump:N")]
pub struct ParseStepActionError(String);

impl FromStr for StepAction {
    type Err = ParseStepActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseStepActionError(s.to_owned());
        match s.trim().to_ascii_lowercase().as_str() {
            "next" | "finalize" => Ok(StepAction::Finalize),
            "back" => Ok(StepAction::GoBack),
            "reset" => Ok(StepAction::Reset),
            "all" | "finish" => Ok(StepAction::FinishAll),
            "redo" => Ok(StepAction::Redo),
            other => {
                let n = other.strip_prefix("jump:").ok_or_else(err)?;
                n.parse().map(StepAction::JumpTo).map_err(|_| err())
            }
        }
    }
}

/// Result of a [`StepAction`].
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum StepOutcome {
    /// Nothing changed.
    Unchanged,
    /// The open step moved forward.
    Advanced {
        /// New open step.
        step: StepNumber,
    },
    /// Every piece has been placed.
    Completed,
    /// The open step moved backward.
    MovedBack {
        /// New open step.
        step: StepNumber,
    },
    /// Every piece was taken back.
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_step_action() {
        assert_eq!("next".parse(), Ok(StepAction::Finalize));
        assert_eq!(" Back ".parse(), Ok(StepAction::GoBack));
        assert_eq!("jump:12".parse(), Ok(StepAction::JumpTo(12)));
        assert!("jump:".parse::<StepAction>().is_err());
        assert!("jump:-1".parse::<StepAction>().is_err());
        assert!("sideways".parse::<StepAction>().is_err());

        for action in [
            StepAction::Finalize,
            StepAction::GoBack,
            StepAction::JumpTo(3),
            StepAction::Reset,
            StepAction::FinishAll,
            StepAction::Redo,
        ] {
            assert_eq!(action.to_string().parse(), Ok(action));
        }
    }
}
