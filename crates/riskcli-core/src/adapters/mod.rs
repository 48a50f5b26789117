mod synthetic;
mod yahoo;

pub use synthetic::SyntheticProvider;
pub use yahoo::YahooChartProvider;
