//! Entry/exit markers for chart overlays.

use serde::Serialize;

use crate::domain::Signal;
use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarkerKind {
    Entry,
    Exit,
}

/// A position change at bar `index`, priced at that bar's close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Marker {
    pub index: usize,
    pub kind: MarkerKind,
    pub price: f64,
}

/// Walk the signals holding a single long/flat flag.
///
/// A Buy while flat is an entry, a Sell while long is an exit. Repeated
/// signals in the same direction and Holds produce no marker.
pub fn entry_exit_markers(
    closes: &[f64],
    signals: &[Signal],
) -> Result<Vec<Marker>, PipelineError> {
    if closes.len() != signals.len() {
        return Err(PipelineError::SchemaMismatch(format!(
            "close and signal lengths differ ({} vs {})",
            closes.len(),
            signals.len()
        )));
    }

    let mut long = false;
    let mut markers = Vec::new();
    for (index, (&price, &signal)) in closes.iter().zip(signals).enumerate() {
        let kind = match (signal, long) {
            (Signal::Buy, false) => MarkerKind::Entry,
            (Signal::Sell, true) => MarkerKind::Exit,
            _ => continue,
        };
        long = kind == MarkerKind::Entry;
        markers.push(Marker { index, kind, price });
    }
    Ok(markers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use Signal::*;

    #[test]
    fn markers_alternate_entry_exit() {
        let closes = [10.0, 11.0, 12.0, 11.0, 10.0, 9.0];
        let signals = [Sell, Buy, Buy, Hold, Sell, Sell];
        let markers = entry_exit_markers(&closes, &signals).unwrap();
        assert_eq!(
            markers,
            vec![
                Marker {
                    index: 1,
                    kind: MarkerKind::Entry,
                    price: 11.0
                },
                Marker {
                    index: 4,
                    kind: MarkerKind::Exit,
                    price: 10.0
                },
            ]
        );
    }

    #[test]
    fn length_mismatch_is_schema_mismatch() {
        assert!(matches!(
            entry_exit_markers(&[1.0], &[]),
            Err(PipelineError::SchemaMismatch(_))
        ));
    }
}
