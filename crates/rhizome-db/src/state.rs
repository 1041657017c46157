use std::fmt;
use std::str::FromStr;

use crate::error::DbError;

/// Processing state of an analysis or one of its tasks.
///
/// The set of states is closed; parsing any other string fails with
/// [`DbError::InvalidState`]. No transition order is enforced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum State {
    /// Declared but not yet started. The state of every fresh record.
    #[default]
    Defined,
    Running,
    Finished,
    Error,
}

impl State {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Defined => "Defined",
            Self::Running => "Running",
            Self::Finished => "Finished",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for State {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Defined" => Ok(Self::Defined),
            "Running" => Ok(Self::Running),
            "Finished" => Ok(Self::Finished),
            "Error" => Ok(Self::Error),
            other => Err(DbError::InvalidState(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_every_state() {
        for state in [State::Defined, State::Running, State::Finished, State::Error] {
            assert_eq!(state.as_str().parse::<State>().unwrap(), state);
        }
    }

    #[test]
    fn rejects_unknown_strings() {
        assert!(matches!(
            "Pending".parse::<State>(),
            Err(DbError::InvalidState(s)) if s == "Pending"
        ));
        // case matters
        assert!("defined".parse::<State>().is_err());
    }

    #[test]
    fn fresh_records_start_defined() {
        assert_eq!(State::default(), State::Defined);
    }
}
