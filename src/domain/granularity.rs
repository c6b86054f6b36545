//! Candle granularity labels and annualization factors.

use std::fmt;
use std::str::FromStr;

/// Candle granularity, named after the data API's labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    S5,
    S10,
    S15,
    S30,
    M1,
    M2,
    M5,
    M10,
    M15,
    M30,
    H1,
    H2,
    H4,
    H8,
    H12,
    D,
    W,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown granularity: {0}")]
pub struct GranularityParseError(pub String);

impl Granularity {
    /// Candles per 24h trading day. FX trades around the clock, so the
    /// intraday labels divide a full day.
    pub fn bars_per_day(&self) -> f64 {
        match self {
            Granularity::S5 => 17_280.0,
            Granularity::S10 => 8_640.0,
            Granularity::S15 => 5_760.0,
            Granularity::S30 => 2_880.0,
            Granularity::M1 => 1_440.0,
            Granularity::M2 => 720.0,
            Granularity::M5 => 288.0,
            Granularity::M10 => 144.0,
            Granularity::M15 => 96.0,
            Granularity::M30 => 48.0,
            Granularity::H1 => 24.0,
            Granularity::H2 => 12.0,
            Granularity::H4 => 6.0,
            Granularity::H8 => 3.0,
            Granularity::H12 => 2.0,
            Granularity::D => 1.0,
            Granularity::W => 1.0 / 7.0,
        }
    }

    /// Bars per year for metric annualization (252 trading days,
    /// 52 weeks for weekly candles).
    pub fn bars_per_year(&self) -> f64 {
        match self {
            Granularity::W => 52.0,
            other => 252.0 * other.bars_per_day(),
        }
    }
}

impl FromStr for Granularity {
    type Err = GranularityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "S5" => Ok(Granularity::S5),
            "S10" => Ok(Granularity::S10),
            "S15" => Ok(Granularity::S15),
            "S30" => Ok(Granularity::S30),
            "M1" => Ok(Granularity::M1),
            "M2" => Ok(Granularity::M2),
            "M5" => Ok(Granularity::M5),
            "M10" => Ok(Granularity::M10),
            "M15" => Ok(Granularity::M15),
            "M30" => Ok(Granularity::M30),
            "H1" => Ok(Granularity::H1),
            "H2" => Ok(Granularity::H2),
            "H4" => Ok(Granularity::H4),
            "H8" => Ok(Granularity::H8),
            "H12" => Ok(Granularity::H12),
            "D" => Ok(Granularity::D),
            "W" => Ok(Granularity::W),
            other => Err(GranularityParseError(other.to_string())),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Granularity::S5 => "S5",
            Granularity::S10 => "S10",
            Granularity::S15 => "S15",
            Granularity::S30 => "S30",
            Granularity::M1 => "M1",
            Granularity::M2 => "M2",
            Granularity::M5 => "M5",
            Granularity::M10 => "M10",
            Granularity::M15 => "M15",
            Granularity::M30 => "M30",
            Granularity::H1 => "H1",
            Granularity::H2 => "H2",
            Granularity::H4 => "H4",
            Granularity::H8 => "H8",
            Granularity::H12 => "H12",
            Granularity::D => "D",
            Granularity::W => "W",
        };
        write!(f, "{}", label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_common_labels() {
        assert_eq!("D".parse::<Granularity>().unwrap(), Granularity::D);
        assert_eq!("H1".parse::<Granularity>().unwrap(), Granularity::H1);
        assert_eq!("M15".parse::<Granularity>().unwrap(), Granularity::M15);
        assert_eq!("S5".parse::<Granularity>().unwrap(), Granularity::S5);
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(" h4 ".parse::<Granularity>().unwrap(), Granularity::H4);
        assert_eq!("d".parse::<Granularity>().unwrap(), Granularity::D);
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "M3".parse::<Granularity>().unwrap_err();
        assert_eq!(err.0, "M3");
    }

    #[test]
    fn display_round_trips() {
        for label in ["S5", "M1", "M30", "H1", "H12", "D", "W"] {
            let g: Granularity = label.parse().unwrap();
            assert_eq!(g.to_string(), label);
        }
    }

    #[test]
    fn bars_per_year_daily() {
        assert!((Granularity::D.bars_per_year() - 252.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bars_per_year_hourly() {
        assert!((Granularity::H1.bars_per_year() - 252.0 * 24.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bars_per_year_weekly() {
        assert!((Granularity::W.bars_per_year() - 52.0).abs() < f64::EPSILON);
    }
}
