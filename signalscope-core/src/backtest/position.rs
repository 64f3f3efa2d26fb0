//! Per-bar position state.

use serde::{Deserialize, Serialize};

use crate::domain::Signal;

/// Holding during a bar. Long iff the previous bar's signal was Buy.
///
/// Sell exposure is not a holding: it shows up only in the strategy return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Position {
    #[default]
    Flat,
    Long,
}

impl Position {
    /// Position held during a bar given the signal emitted on the bar before it.
    pub fn after(prior: Option<Signal>) -> Self {
        match prior {
            Some(Signal::Buy) => Position::Long,
            _ => Position::Flat,
        }
    }

    pub fn is_long(self) -> bool {
        self == Position::Long
    }
}
