//! `M:SS` timeline offsets as they appear in the experience descriptor.

use thiserror::Error;

/// A component of an offset was not a number.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid timeline offset {input:?}: {reason}")]
pub struct OffsetParseError {
    pub input: String,
    pub reason: String,
}

/// Convert an `M:SS` offset into seconds (`minutes * 60 + seconds`).
///
/// Anything that does not split into exactly two components yields `0.0`
/// rather than an error; descriptors in the field rely on this. Two
/// components that are not numbers are an error so the overlay can be
/// skipped instead of scheduled at a bogus time.
pub fn parse_clock_offset(input: &str) -> Result<f64, OffsetParseError> {
    let parts: Vec<&str> = input.split(':').collect();
    if parts.len() != 2 {
        return Ok(0.0);
    }

    let component = |part: &str| -> Result<f64, OffsetParseError> {
        let value = part.trim().parse::<f64>().map_err(|e| OffsetParseError {
            input: input.to_string(),
            reason: e.to_string(),
        })?;
        if !value.is_finite() {
            return Err(OffsetParseError {
                input: input.to_string(),
                reason: "not a finite number".to_string(),
            });
        }
        Ok(value)
    };

    let minutes = component(parts[0])?;
    let seconds = component(parts[1])?;
    Ok(minutes * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_and_seconds() {
        assert_eq!(parse_clock_offset("1:30").unwrap(), 90.0);
        assert_eq!(parse_clock_offset("0:30").unwrap(), 30.0);
        assert_eq!(parse_clock_offset("12:05").unwrap(), 725.0);
        assert_eq!(parse_clock_offset("0:00").unwrap(), 0.0);
    }

    #[test]
    fn test_fractional_seconds() {
        assert_eq!(parse_clock_offset("2:07.5").unwrap(), 127.5);
    }

    #[test]
    fn test_wrong_component_count_falls_back_to_zero() {
        assert_eq!(parse_clock_offset("90").unwrap(), 0.0);
        assert_eq!(parse_clock_offset("").unwrap(), 0.0);
        assert_eq!(parse_clock_offset("1:02:03").unwrap(), 0.0);
        assert_eq!(parse_clock_offset("::").unwrap(), 0.0);
    }

    #[test]
    fn test_non_numeric_components_are_errors() {
        let err = parse_clock_offset("a:30").unwrap_err();
        assert_eq!(err.input, "a:30");
        assert!(parse_clock_offset("1:").is_err());
    }

    #[test]
    fn test_non_finite_components_are_errors() {
        assert!(parse_clock_offset("NaN:00").is_err());
        assert!(parse_clock_offset("0:inf").is_err());
        assert!(parse_clock_offset("-infinity:10").is_err());
    }
}
