//! Signal: the {-1, 0, +1} action attached to a bar.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading action for a bar.
///
/// Produced by ground-truth labelling during training (see [`Label`]) or by
/// a classifier at inference time. The integer value is the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Signal {
    /// Exit / stay flat.
    Sell,
    /// No action.
    Hold,
    /// Enter / stay long.
    Buy,
}

/// Ground-truth training label. Same value space as [`Signal`].
pub type Label = Signal;

impl Signal {
    pub const ALL: [Signal; 3] = [Signal::Sell, Signal::Hold, Signal::Buy];

    pub fn value(self) -> i8 {
        match self {
            Signal::Sell => -1,
            Signal::Hold => 0,
            Signal::Buy => 1,
        }
    }

    /// Map a raw classifier output to a signal. `None` for anything outside {-1, 0, 1}.
    pub fn from_class(class: i64) -> Option<Self> {
        match class {
            -1 => Some(Signal::Sell),
            0 => Some(Signal::Hold),
            1 => Some(Signal::Buy),
            _ => None,
        }
    }

    /// Sign of a price change.
    pub fn from_change(diff: f64) -> Self {
        if diff > 0.0 {
            Signal::Buy
        } else if diff < 0.0 {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }

    /// Dense index 0..3, used by classifiers for vote/count arrays.
    pub fn index(self) -> usize {
        (self.value() + 1) as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Human-readable reason shown next to a prediction.
    pub fn reason(self) -> &'static str {
        match self {
            Signal::Buy => "Buy",
            Signal::Sell => "Sell",
            Signal::Hold => "Hold",
        }
    }
}

impl From<Signal> for i8 {
    fn from(signal: Signal) -> i8 {
        signal.value()
    }
}

impl TryFrom<i8> for Signal {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        Signal::from_class(value as i64).ok_or_else(|| format!("invalid signal value {value}"))
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_class_rejects_out_of_range() {
        assert_eq!(Signal::from_class(1), Some(Signal::Buy));
        assert_eq!(Signal::from_class(-1), Some(Signal::Sell));
        assert_eq!(Signal::from_class(0), Some(Signal::Hold));
        assert_eq!(Signal::from_class(2), None);
        assert_eq!(Signal::from_class(-2), None);
    }

    #[test]
    fn from_change_uses_sign() {
        assert_eq!(Signal::from_change(0.5), Signal::Buy);
        assert_eq!(Signal::from_change(-0.5), Signal::Sell);
        assert_eq!(Signal::from_change(0.0), Signal::Hold);
    }

    #[test]
    fn index_roundtrip() {
        for s in Signal::ALL {
            assert_eq!(Signal::from_index(s.index()), Some(s));
        }
    }

    #[test]
    fn serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Signal::Sell).unwrap(), "-1");
        let parsed: Signal = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, Signal::Buy);
        assert!(serde_json::from_str::<Signal>("3").is_err());
    }
}
