//! Fixed-width running clock text (`" M:SS.T "`) as integer tenths.
//!
//! Layout by character position: 0–1 minutes, 2 colon, 3–4 seconds, 5 dot,
//! 6 tenths, 7 trailing space. Blank minute or second columns read as zero.

/// Tenths of a second per clock tick.
pub const TICKS_PER_SECOND: u32 = 10;
pub const TICKS_PER_MINUTE: u32 = 60 * TICKS_PER_SECOND;

/// Parse clock text into ticks. Returns `None` for anything that does not
/// follow the fixed layout.
pub fn parse_ticks(text: &str) -> Option<u32> {
    if text.len() < 7 {
        return None;
    }
    let minutes = column(text.get(0..2)?)?;
    let seconds = column(text.get(3..5)?)?;
    let tenths = text.get(6..7)?.chars().next()?.to_digit(10)?;
    Some(minutes * TICKS_PER_MINUTE + seconds * TICKS_PER_SECOND + tenths)
}

fn column(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Some(0)
    } else {
        trimmed.parse().ok()
    }
}

/// Render ticks in the scoreboard's canonical layout.
///
/// Minutes are blank below one minute, space padded below ten, and printed
/// in full otherwise. Seconds are zero padded when minutes are shown and
/// space padded when they are not.
pub fn format_ticks(ticks: u32) -> String {
    let minutes = ticks / TICKS_PER_MINUTE;
    let rest = ticks % TICKS_PER_MINUTE;
    let seconds = rest / TICKS_PER_SECOND;
    let tenths = rest % TICKS_PER_SECOND;
    let (min_part, sec_part) = match minutes {
        0 => ("  ".to_string(), format!("{seconds:>2}")),
        1..=9 => (format!(" {minutes}"), format!("{seconds:02}")),
        _ => (minutes.to_string(), format!("{seconds:02}")),
    };
    format!("{min_part}:{sec_part}.{tenths} ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_layouts() {
        assert_eq!(parse_ticks("  : 1.0 "), Some(10));
        assert_eq!(parse_ticks("  :59.9 "), Some(599));
        assert_eq!(parse_ticks(" 1:05.3 "), Some(653));
        assert_eq!(parse_ticks("12:00.0 "), Some(7200));
        assert_eq!(parse_ticks("  :  .5 "), Some(5));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_ticks(""), None);
        assert_eq!(parse_ticks(" 1:05"), None);
        assert_eq!(parse_ticks("ab:cd.e "), None);
        assert_eq!(parse_ticks("  : 1.x "), None);
    }

    #[test]
    fn formats_canonically() {
        assert_eq!(format_ticks(0), "  : 0.0 ");
        assert_eq!(format_ticks(11), "  : 1.1 ");
        assert_eq!(format_ticks(599), "  :59.9 ");
        assert_eq!(format_ticks(600), " 1:00.0 ");
        assert_eq!(format_ticks(653), " 1:05.3 ");
        assert_eq!(format_ticks(7200), "12:00.0 ");
    }

    #[test]
    fn blank_seconds_canonicalize_to_zero() {
        assert_eq!(format_ticks(parse_ticks("  :  .5 ").unwrap()), "  : 0.5 ");
    }

    quickcheck::quickcheck! {
        fn format_then_parse(ticks: u16) -> bool {
            let ticks = u32::from(ticks) % (100 * TICKS_PER_MINUTE);
            parse_ticks(&format_ticks(ticks)) == Some(ticks)
        }
    }
}
