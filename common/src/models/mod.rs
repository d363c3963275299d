mod coin;
mod market;

pub use coin::Coin;
pub use market::{HistoryRange, OhlcCandle};
