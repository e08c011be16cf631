use regex::Regex;
use std::sync::OnceLock;

fn iso_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^P(?:(\d+)D)?T?(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$")
            .expect("ISO-8601 duration pattern is valid")
    })
}

/// Reconciles the two duration forms the upstream sends into seconds
///
/// The ISO-8601 form (`PT1H2M3S`) wins when it yields a positive value,
/// otherwise the display form (`1:02:03`, `4:05`, `90`) is used. Anything
/// unparseable (live streams, "SHORTS" badges, empty strings) is 0.
pub fn parse_duration(iso: &str, display: &str) -> u64 {
    let from_iso = parse_iso_duration(iso);
    if from_iso > 0 {
        return from_iso;
    }
    parse_display_duration(display)
}

fn parse_iso_duration(iso: &str) -> u64 {
    let iso = iso.trim();
    if iso.is_empty() {
        return 0;
    }

    let Some(caps) = iso_pattern().captures(iso) else {
        return 0;
    };

    let part = |idx: usize, unit: u64| -> Option<u64> {
        match caps.get(idx) {
            Some(m) => m.as_str().parse::<u64>().ok()?.checked_mul(unit),
            None => Some(0),
        }
    };

    // Out-of-range components are schema drift, not a very long video
    [(1, 86_400), (2, 3_600), (3, 60), (4, 1)]
        .into_iter()
        .try_fold(0u64, |total, (idx, unit)| total.checked_add(part(idx, unit)?))
        .unwrap_or(0)
}

fn parse_display_duration(display: &str) -> u64 {
    let display = display.trim();
    if display.is_empty() {
        return 0;
    }

    let mut total: u64 = 0;
    for part in display.split(':') {
        match part.trim().parse::<u64>() {
            Ok(value) => match total.checked_mul(60).and_then(|t| t.checked_add(value)) {
                Some(next) => total = next,
                None => return 0,
            },
            Err(_) => return 0,
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_duration_full() {
        assert_eq!(parse_duration("PT1H2M3S", ""), 3723);
    }

    #[test]
    fn test_display_duration_hours() {
        assert_eq!(parse_duration("", "1:02:03"), 3723);
    }

    #[test]
    fn test_display_duration_single_part() {
        assert_eq!(parse_duration("", "90"), 90);
    }

    #[test]
    fn test_display_duration_minutes() {
        assert_eq!(parse_duration("", "4:05"), 245);
    }

    #[test]
    fn test_iso_preferred_over_display() {
        assert_eq!(parse_duration("PT45S", "10:00"), 45);
    }

    #[test]
    fn test_zero_iso_falls_back_to_display() {
        assert_eq!(parse_duration("PT0S", "0:59"), 59);
        assert_eq!(parse_duration("PT", "0:30"), 30);
    }

    #[test]
    fn test_iso_partial_components() {
        assert_eq!(parse_duration("PT15M", ""), 900);
        assert_eq!(parse_duration("PT2H", ""), 7200);
        assert_eq!(parse_duration("P1DT1S", ""), 86_401);
    }

    #[test]
    fn test_unparseable_is_zero() {
        assert_eq!(parse_duration("", ""), 0);
        assert_eq!(parse_duration("garbage", "LIVE"), 0);
        assert_eq!(parse_duration("", "1:xx"), 0);
    }

    #[test]
    fn test_overflowing_durations_are_zero() {
        assert_eq!(parse_duration("", "999999999999999999:59"), 0);
        assert_eq!(parse_duration("P999999999999999999D", ""), 0);
        assert_eq!(parse_duration("PT18446744073709551615H", ""), 0);
        assert_eq!(parse_duration("", "18446744073709551616"), 0);
    }

    #[test]
    fn test_overflowing_iso_falls_back_to_display() {
        assert_eq!(parse_duration("P999999999999999999D", "0:45"), 45);
    }
}
