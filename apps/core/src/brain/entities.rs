//! Light entity extraction: city names and the current time of day.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Placeholder used when no known city is mentioned
pub const UNKNOWN_CITY: &str = "ваш город";

/// A city mentioned in the question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum City {
    Known(&'static str),
    Unknown,
}

impl City {
    pub fn display(&self) -> &'static str {
        match self {
            City::Known(name) => name,
            City::Unknown => UNKNOWN_CITY,
        }
    }
}

/// Stem pattern over lowercased text, mapped to the canonical display name.
/// Order matters: the first stem found wins.
static CITY_TABLE: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"москв|москов|\bмск\b", "Москва"),
        (r"петербург|питер|\bспб\b", "Санкт-Петербург"),
        (r"\bуф(а|е|у|ы|ой)\b|\bufa\b", "Уфа"),
        (r"стерлитамак", "Стерлитамак"),
        (r"казан", "Казань"),
        (r"екатеринбург|\bекб\b", "Екатеринбург"),
        (r"новосибирск", "Новосибирск"),
        (r"тюмен", "Тюмень"),
        (r"сургут", "Сургут"),
        (r"нижневартовск", "Нижневартовск"),
        (r"оренбург", "Оренбург"),
        (r"\bперм(ь|и)\b", "Пермь"),
        (r"самар", "Самара"),
    ]
    .into_iter()
    .map(|(src, name)| (Regex::new(src).expect("Invalid regex: city stem"), name))
    .collect()
});

/// Keyword lookup against the fixed city list
#[derive(Debug, Default, Clone, Copy)]
pub struct CityExtractor;

impl CityExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> City {
        let normalized = text.to_lowercase();
        CITY_TABLE
            .iter()
            .find(|(pattern, _)| pattern.is_match(&normalized))
            .map(|(_, name)| City::Known(*name))
            .unwrap_or(City::Unknown)
    }
}

/// Formats a wall-clock time as `HH:MM`.
pub fn format_clock(now: &DateTime<FixedOffset>) -> String {
    now.format("%H:%M").to_string()
}

/// Source of the current time, injectable for tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Real clock shifted to a fixed UTC offset
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Clock for the given whole-hour UTC offset. Out-of-range offsets fall back to UTC.
    pub fn with_offset_hours(hours: i32) -> Self {
        let offset = FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix());
        Self { offset }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::with_offset_hours(5)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moscow_variants_normalize() {
        let extractor = CityExtractor::new();
        assert_eq!(extractor.extract("Погода в Москве"), City::Known("Москва"));
        assert_eq!(extractor.extract("москва сегодня"), City::Known("Москва"));
        assert_eq!(extractor.extract("из Московской области"), City::Known("Москва"));
    }

    #[test]
    fn test_ufa_inflections() {
        let extractor = CityExtractor::new();
        assert_eq!(extractor.extract("работа в Уфе"), City::Known("Уфа"));
        assert_eq!(extractor.extract("еду в Уфу"), City::Known("Уфа"));
        assert_eq!(extractor.extract("уфимский"), City::Unknown);
    }

    #[test]
    fn test_petersburg_aliases() {
        let extractor = CityExtractor::new();
        assert_eq!(extractor.extract("Питер"), City::Known("Санкт-Петербург"));
        assert_eq!(extractor.extract("в спб"), City::Known("Санкт-Петербург"));
    }

    #[test]
    fn test_unknown_city_placeholder() {
        let city = CityExtractor::new().extract("какая погода?");
        assert_eq!(city, City::Unknown);
        assert_eq!(city.display(), UNKNOWN_CITY);
    }

    #[test]
    fn test_format_clock_is_zero_padded() {
        let at = DateTime::parse_from_rfc3339("2024-03-01T07:05:00+05:00").unwrap();
        assert_eq!(format_clock(&at), "07:05");
    }

    #[test]
    fn test_system_clock_uses_offset() {
        let clock = SystemClock::with_offset_hours(5);
        assert_eq!(clock.now().offset().local_minus_utc(), 5 * 3600);
    }
}
