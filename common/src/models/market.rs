use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single OHLC candle in USD
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OhlcCandle {
    /// Candle open time
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl OhlcCandle {
    /// A degenerate candle where all four fields carry the same spot price
    pub fn flat(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self {
            timestamp,
            open: price,
            high: price,
            low: price,
            close: price,
        }
    }
}

/// Supported time ranges for price history
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HistoryRange {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "1Y")]
    OneYear,
}

impl HistoryRange {
    /// Range duration in seconds
    pub fn as_secs(&self) -> i64 {
        match self {
            HistoryRange::OneHour => 3600,
            HistoryRange::OneDay => 86400,
            HistoryRange::SevenDays => 7 * 86400,
            HistoryRange::OneMonth => 30 * 86400,
            HistoryRange::ThreeMonths => 90 * 86400,
            HistoryRange::OneYear => 365 * 86400,
        }
    }
}

impl std::fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryRange::OneHour => write!(f, "1h"),
            HistoryRange::OneDay => write!(f, "1d"),
            HistoryRange::SevenDays => write!(f, "7d"),
            HistoryRange::OneMonth => write!(f, "1M"),
            HistoryRange::ThreeMonths => write!(f, "3M"),
            HistoryRange::OneYear => write!(f, "1Y"),
        }
    }
}

impl std::str::FromStr for HistoryRange {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(HistoryRange::OneHour),
            "1d" => Ok(HistoryRange::OneDay),
            "7d" => Ok(HistoryRange::SevenDays),
            "1M" => Ok(HistoryRange::OneMonth),
            "3M" => Ok(HistoryRange::ThreeMonths),
            "1Y" => Ok(HistoryRange::OneYear),
            unknown => Err(crate::Error::ParseError(format!(
                "Unknown range: {}. Supported ranges: 1h, 1d, 7d, 1M, 3M, 1Y",
                unknown
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_range_round_trip() {
        for s in ["1h", "1d", "7d", "1M", "3M", "1Y"] {
            let range: HistoryRange = s.parse().unwrap();
            assert_eq!(range.to_string(), s);
        }
    }

    #[test]
    fn test_range_rejects_unknown() {
        assert!("2d".parse::<HistoryRange>().is_err());
        assert!("1m".parse::<HistoryRange>().is_err());
        assert!("".parse::<HistoryRange>().is_err());
    }

    #[test]
    fn test_flat_candle() {
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let candle = OhlcCandle::flat(ts, 42.5);
        assert_eq!(candle.open, 42.5);
        assert_eq!(candle.high, 42.5);
        assert_eq!(candle.low, 42.5);
        assert_eq!(candle.close, 42.5);
        assert_eq!(candle.timestamp, ts);
    }
}
