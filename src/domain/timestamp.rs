use thiserror::Error;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3600;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TimestampError {
    #[error("invalid timestamp: {0} (use HH:MM:SS with minutes and seconds below 60)")]
    Invalid(String),

    #[error("timestamp too large: {0}")]
    Overflow(String),
}

/// Renders elapsed seconds as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_timestamp(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / SECONDS_PER_HOUR;
    let minutes = (seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let secs = seconds % SECONDS_PER_MINUTE;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

pub fn parse_timestamp(raw: &str) -> Result<i64, TimestampError> {
    let invalid = || TimestampError::Invalid(raw.to_string());
    let overflow = || TimestampError::Overflow(raw.to_string());

    let mut fields = raw.split(':');
    let (Some(hours), Some(minutes), Some(secs), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(invalid());
    };
    if ![hours, minutes, secs].iter().all(|field| is_digits(field)) {
        return Err(invalid());
    }

    let minutes: i64 = minutes.parse().map_err(|_| invalid())?;
    let secs: i64 = secs.parse().map_err(|_| invalid())?;
    if minutes > 59 || secs > 59 {
        return Err(invalid());
    }

    // An all-digit hours field only fails to parse when it does not fit.
    let hours: i64 = hours.parse().map_err(|_| overflow())?;
    hours
        .checked_mul(SECONDS_PER_HOUR)
        .and_then(|total| total.checked_add(minutes * SECONDS_PER_MINUTE + secs))
        .ok_or_else(overflow)
}

/// True when `token` has the three-field `H:M:S` shape, signs allowed.
///
/// Used to tell a malformed timestamp apart from a line that is not a tag.
pub fn looks_like_timestamp(token: &str) -> bool {
    let fields = token.split(':').collect::<Vec<_>>();
    fields.len() == 3
        && fields.iter().all(|field| {
            let unsigned = field.strip_prefix(['+', '-']).unwrap_or(field);
            is_digits(unsigned)
        })
}

fn is_digits(field: &str) -> bool {
    !field.is_empty() && field.bytes().all(|byte| byte.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_unbounded_hours() {
        assert_eq!(format_timestamp(0), "00:00:00");
        assert_eq!(format_timestamp(59), "00:00:59");
        assert_eq!(format_timestamp(3661), "01:01:01");
        assert_eq!(format_timestamp(100 * 3600 + 5), "100:00:05");
    }

    #[test]
    fn format_clamps_negative_to_zero() {
        assert_eq!(format_timestamp(-42), "00:00:00");
    }

    #[test]
    fn parse_inverts_format() {
        for seconds in [0, 1, 59, 60, 3599, 3600, 86_399, 86_400, 360_000 + 17] {
            let text = format_timestamp(seconds);
            assert_eq!(parse_timestamp(&text), Ok(seconds), "{text}");
        }
    }

    #[test]
    fn parse_accepts_short_fields() {
        assert_eq!(parse_timestamp("1:2:3"), Ok(3723));
    }

    #[test]
    fn parse_rejects_out_of_range_and_malformed() {
        for raw in ["00:60:00", "00:00:60", "-1:00:00", "00:00", "a:b:c", "1:2:3:4", "", "1::3"] {
            assert!(
                matches!(parse_timestamp(raw), Err(TimestampError::Invalid(_))),
                "{raw}"
            );
        }
    }

    #[test]
    fn parse_reports_overflow() {
        let huge = format!("{}:00:00", i64::MAX);
        assert!(matches!(
            parse_timestamp(&huge),
            Err(TimestampError::Overflow(_))
        ));
        assert!(matches!(
            parse_timestamp("99999999999999999999999:00:00"),
            Err(TimestampError::Overflow(_))
        ));
    }

    #[test]
    fn recognizes_timestamp_shape() {
        assert!(looks_like_timestamp("00:01:02"));
        assert!(looks_like_timestamp("-1:00:99"));
        assert!(!looks_like_timestamp("hello"));
        assert!(!looks_like_timestamp("1."));
        assert!(!looks_like_timestamp("12:30"));
    }
}
