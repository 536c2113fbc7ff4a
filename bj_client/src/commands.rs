use blackjack::messages::Decision;
use std::fmt;

/// Errors that can occur while parsing player input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Round count that isn't a number in 1..=255.
    InvalidRounds(String),
    /// Anything other than hit or stand at the decision prompt.
    InvalidChoice(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRounds(value) => write!(
                f,
                "Invalid number '{value}'. Enter a whole number from 1 to 255"
            ),
            Self::InvalidChoice(value) => {
                write!(f, "Invalid input '{value}', please type 'h' or 's'")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse how many rounds to request.
///
/// # Examples
///
/// ```
/// use bj_client::commands::parse_rounds;
///
/// assert_eq!(parse_rounds(" 3 "), Ok(3));
/// assert!(parse_rounds("0").is_err());
/// assert!(parse_rounds("256").is_err());
/// ```
pub fn parse_rounds(input: &str) -> Result<u8, ParseError> {
    let trimmed = input.trim();
    match trimmed.parse::<u8>() {
        Ok(rounds) if rounds > 0 => Ok(rounds),
        _ => Err(ParseError::InvalidRounds(trimmed.to_string())),
    }
}

/// Parse a hit/stand choice. Accepts `h`, `s`, `hit` and `stand` in any case.
pub fn parse_choice(input: &str) -> Result<Decision, ParseError> {
    let trimmed = input.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "h" | "hit" => Ok(Decision::Hit),
        "s" | "stand" => Ok(Decision::Stand),
        _ => Err(ParseError::InvalidChoice(trimmed.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounds_in_range() {
        assert_eq!(parse_rounds("1"), Ok(1));
        assert_eq!(parse_rounds("255"), Ok(255));
        assert_eq!(parse_rounds("  42\n"), Ok(42));
    }

    #[test]
    fn test_rounds_out_of_range() {
        assert_eq!(
            parse_rounds("0"),
            Err(ParseError::InvalidRounds("0".to_string()))
        );
        assert!(parse_rounds("256").is_err());
        assert!(parse_rounds("-1").is_err());
        assert!(parse_rounds("three").is_err());
        assert!(parse_rounds("").is_err());
    }

    #[test]
    fn test_choices() {
        assert_eq!(parse_choice("h"), Ok(Decision::Hit));
        assert_eq!(parse_choice("S\n"), Ok(Decision::Stand));
        assert_eq!(parse_choice("Hit"), Ok(Decision::Hit));
        assert_eq!(parse_choice("stand"), Ok(Decision::Stand));
    }

    #[test]
    fn test_unknown_choice() {
        let err = parse_choice(" split ").unwrap_err();
        assert_eq!(err, ParseError::InvalidChoice("split".to_string()));
        assert!(err.to_string().contains("'h' or 's'"));
    }
}
