//! # Domain Models
//!
//! Canonical domain types shared by the fetcher and the metrics engine.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated ticker (`AAPL`, `^GSPC`, `BRK-B`) |
//! | [`Period`] | Lookback window (`1mo` .. `max`) |
//! | [`Interval`] | Bar granularity (`1m` .. `3mo`) |
//! | [`PriceSeries`] | Ordered adjusted prices for one request |
//! | [`ReturnSeries`] | Simple returns derived from a price series |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! All types validate their invariants at construction time, so a
//! [`PriceSeries`] that exists is always strictly ordered and positive.

mod interval;
mod period;
mod series;
mod symbol;
mod timestamp;

pub use interval::Interval;
pub use period::Period;
pub use series::{PricePoint, PriceSeries, ReturnSeries, SeriesSummary};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
