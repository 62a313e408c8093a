use chrono::{DateTime, Duration, Months, Utc};

/// Symbolic display-period tokens accepted on the query string. Anything
/// outside this set is treated as `All` (no lower bound).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeToken {
    H6,
    H12,
    D1,
    W1,
    M1,
    M3,
    M6,
    Y1,
    All,
}

pub const RANGE_TOKENS: [RangeToken; 9] = [
    RangeToken::H6,
    RangeToken::H12,
    RangeToken::D1,
    RangeToken::W1,
    RangeToken::M1,
    RangeToken::M3,
    RangeToken::M6,
    RangeToken::Y1,
    RangeToken::All,
];

impl RangeToken {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "6H" => Self::H6,
            "12H" => Self::H12,
            "1D" => Self::D1,
            "1W" => Self::W1,
            "1M" => Self::M1,
            "3M" => Self::M3,
            "6M" => Self::M6,
            "1Y" => Self::Y1,
            _ => Self::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::H6 => "6H",
            Self::H12 => "12H",
            Self::D1 => "1D",
            Self::W1 => "1W",
            Self::M1 => "1M",
            Self::M3 => "3M",
            Self::M6 => "6M",
            Self::Y1 => "1Y",
            Self::All => "All",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::H6 => "Past 6 Hours",
            Self::H12 => "Past 12 Hours",
            Self::D1 => "Past 1 Day",
            Self::W1 => "Past 1 Week",
            Self::M1 => "Past 1 Month",
            Self::M3 => "Past 3 Months",
            Self::M6 => "Past 6 Months",
            Self::Y1 => "Past 1 Year",
            Self::All => "All Time",
        }
    }

    /// Lower query bound for this range relative to `now`. Month and year
    /// tokens use calendar arithmetic, not fixed-day counts. `None` means
    /// no lower bound.
    pub fn cutoff(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::H6 => Some(now - Duration::hours(6)),
            Self::H12 => Some(now - Duration::hours(12)),
            Self::D1 => Some(now - Duration::days(1)),
            Self::W1 => Some(now - Duration::weeks(1)),
            Self::M1 => now.checked_sub_months(Months::new(1)),
            Self::M3 => now.checked_sub_months(Months::new(3)),
            Self::M6 => now.checked_sub_months(Months::new(6)),
            Self::Y1 => now.checked_sub_months(Months::new(12)),
            Self::All => None,
        }
    }

    /// Bucket width applied when the caller does not pick an explicit
    /// aggregation unit. Short ranges render raw samples.
    pub fn auto_bucket_hours(self) -> Option<i64> {
        match self {
            Self::H6 | Self::H12 | Self::D1 => None,
            Self::W1 => Some(1),
            Self::M1 => Some(3),
            Self::M3 => Some(6),
            Self::M6 => Some(12),
            Self::Y1 => Some(24),
            Self::All => Some(48),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Bucket width derived from the range token.
    Auto,
    /// Explicit unit token (H/D/W/M), as a width in hours.
    Fixed(i64),
    /// Raw passthrough; no bucketing.
    Raw,
}

pub const AGG_UNIT_TOKENS: [&str; 4] = ["H", "D", "W", "M"];

/// Absent token means "derive from range"; an explicit but unrecognized
/// token falls back to raw passthrough, the most permissive reading.
pub fn parse_aggregation(raw: Option<&str>) -> Aggregation {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Aggregation::Auto;
    };
    match raw {
        "H" => Aggregation::Fixed(1),
        "D" => Aggregation::Fixed(24),
        "W" => Aggregation::Fixed(168),
        "M" => Aggregation::Fixed(720),
        _ => Aggregation::Raw,
    }
}

pub fn effective_bucket_hours(range: RangeToken, agg: Aggregation) -> Option<i64> {
    match agg {
        Aggregation::Auto => range.auto_bucket_hours(),
        Aggregation::Fixed(hours) => Some(hours.max(1)),
        Aggregation::Raw => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn unknown_token_falls_back_to_all() {
        assert_eq!(RangeToken::parse("bogus"), RangeToken::All);
        assert_eq!(RangeToken::parse(""), RangeToken::All);
        assert_eq!(RangeToken::parse(" 1M "), RangeToken::M1);
    }

    #[test]
    fn one_month_cutoff_uses_calendar_arithmetic() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        let cutoff = RangeToken::M1.cutoff(now).unwrap();
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2024, 2, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn one_year_cutoff_handles_leap_day() {
        let now = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
        let cutoff = RangeToken::Y1.cutoff(now).unwrap();
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2023, 2, 28, 12, 0, 0).unwrap());
    }

    #[test]
    fn all_range_has_no_cutoff() {
        assert!(RangeToken::All.cutoff(Utc::now()).is_none());
    }

    #[test]
    fn short_ranges_render_raw() {
        assert_eq!(RangeToken::H6.auto_bucket_hours(), None);
        assert_eq!(RangeToken::D1.auto_bucket_hours(), None);
        assert_eq!(RangeToken::M1.auto_bucket_hours(), Some(3));
        assert_eq!(RangeToken::Y1.auto_bucket_hours(), Some(24));
    }

    #[test]
    fn unit_tokens_map_to_hours() {
        assert_eq!(parse_aggregation(Some("H")), Aggregation::Fixed(1));
        assert_eq!(parse_aggregation(Some("W")), Aggregation::Fixed(168));
        assert_eq!(parse_aggregation(None), Aggregation::Auto);
        assert_eq!(parse_aggregation(Some("None")), Aggregation::Raw);
        assert_eq!(parse_aggregation(Some("fortnight")), Aggregation::Raw);
    }

    #[test]
    fn explicit_unit_overrides_range_table() {
        assert_eq!(
            effective_bucket_hours(RangeToken::H6, Aggregation::Fixed(24)),
            Some(24)
        );
        assert_eq!(
            effective_bucket_hours(RangeToken::Y1, Aggregation::Raw),
            None
        );
        assert_eq!(
            effective_bucket_hours(RangeToken::Y1, Aggregation::Auto),
            Some(24)
        );
    }
}
