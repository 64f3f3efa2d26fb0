//! Domain types: bars, series, signals.

pub mod bar;
pub mod series;
pub mod signal;

pub use bar::PriceBar;
pub use series::PriceSeries;
pub use signal::{Label, Signal};
