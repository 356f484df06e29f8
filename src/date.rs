//! Defines [`DateFormat`], which translates the moment-style date patterns
//! used in project files (e.g., `MM-DD-YYYY`) into [`chrono`] format strings
//! and parses post dates with them.

use chrono::{NaiveDate, ParseResult};
use std::fmt;

/// The date pattern used when the project file doesn't specify one.
pub const DEFAULT_DATE_FORMAT: &str = "MM-DD-YYYY";

/// A validated date pattern. Construct with [`DateFormat::new`]; the pattern
/// is translated once and reused for every post.
///
/// Supported tokens:
///
/// * `YYYY`, `YY`: year (four or two digits)
/// * `M`, `MM`: month number; `MMM`, `MMMM`: month name
/// * `D`, `DD`: day of month; `DDD`, `DDDD`: day of year
/// * `ddd`, `dddd`: weekday name
///
/// Text between `[` and `]` is copied literally, as is any character that
/// isn't an ASCII letter.
#[derive(Clone, Debug, PartialEq)]
pub struct DateFormat {
    pattern: String,
    chrono: String,
}

impl DateFormat {
    /// Translates `pattern` into a [`DateFormat`]. Fails if the pattern
    /// contains an unknown token, an unterminated `[` literal, or doesn't
    /// identify a single calendar day.
    pub fn new(pattern: &str) -> Result<DateFormat> {
        let mut chrono = String::with_capacity(pattern.len() * 2);
        let mut fields = Fields::default();
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '[' => {
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == ']' {
                            closed = true;
                            break;
                        }
                        push_literal(&mut chrono, c);
                    }
                    if !closed {
                        return Err(Error::UnterminatedLiteral(
                            pattern.to_owned(),
                        ));
                    }
                }
                c if c.is_ascii_alphabetic() => {
                    let mut len = 1;
                    while chars.peek() == Some(&c) {
                        chars.next();
                        len += 1;
                    }
                    let spec = fields.token(c, len).ok_or_else(|| {
                        Error::UnsupportedToken(c.to_string().repeat(len))
                    })?;
                    chrono.push_str(spec);
                }
                c => push_literal(&mut chrono, c),
            }
        }

        if !fields.is_complete() {
            return Err(Error::Incomplete(pattern.to_owned()));
        }

        Ok(DateFormat {
            pattern: pattern.to_owned(),
            chrono,
        })
    }

    /// Parses a date string (surrounding whitespace is ignored).
    pub fn parse(&self, input: &str) -> ParseResult<NaiveDate> {
        NaiveDate::parse_from_str(input.trim(), &self.chrono)
    }

    /// The pattern as it was written in the configuration.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        DateFormat {
            pattern: DEFAULT_DATE_FORMAT.to_owned(),
            chrono: String::from("%m-%d-%Y"),
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

fn push_literal(chrono: &mut String, c: char) {
    if c == '%' {
        chrono.push_str("%%");
    } else {
        chrono.push(c);
    }
}

/// Tracks which date components a pattern has specified.
#[derive(Default)]
struct Fields {
    year: bool,
    month: bool,
    day: bool,
    ordinal: bool,
}

impl Fields {
    fn token(&mut self, c: char, len: usize) -> Option<&'static str> {
        Some(match (c, len) {
            ('Y', 4) => {
                self.year = true;
                "%Y"
            }
            ('Y', 2) => {
                self.year = true;
                "%y"
            }
            ('M', 1) | ('M', 2) => {
                self.month = true;
                "%m"
            }
            ('M', 3) => {
                self.month = true;
                "%b"
            }
            ('M', 4) => {
                self.month = true;
                "%B"
            }
            ('D', 1) | ('D', 2) => {
                self.day = true;
                "%d"
            }
            ('D', 3) | ('D', 4) => {
                self.ordinal = true;
                "%j"
            }
            ('d', 3) => "%a",
            ('d', 4) => "%A",
            _ => return None,
        })
    }

    fn is_complete(&self) -> bool {
        self.year && ((self.month && self.day) || self.ordinal)
    }
}

/// The result of a fallible [`DateFormat`] operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an invalid date pattern.
#[derive(Debug, PartialEq)]
pub enum Error {
    /// Returned when the pattern contains a letter run that isn't a known
    /// token (e.g., `HH`).
    UnsupportedToken(String),

    /// Returned when a `[` literal is never closed.
    UnterminatedLiteral(String),

    /// Returned when the pattern can't identify a calendar day (e.g., it has
    /// no year).
    Incomplete(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnsupportedToken(token) => {
                write!(f, "unsupported date format token `{}`", token)
            }
            Error::UnterminatedLiteral(pattern) => {
                write!(f, "unterminated `[` in date format `{}`", pattern)
            }
            Error::Incomplete(pattern) => write!(
                f,
                "date format `{}` must specify a year and either a month and \
                 day or a day of the year",
                pattern
            ),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_format() {
        let format = DateFormat::default();
        assert_eq!(Ok(ymd(2021, 4, 16)), format.parse("04-16-2021"));
        assert_eq!(Ok(ymd(2021, 4, 6)), format.parse(" 4-6-2021 "));
        assert!(format.parse("2021-04-16").is_err());
        assert!(format.parse("02-30-2021").is_err());
        assert_eq!(Ok(format), DateFormat::new(DEFAULT_DATE_FORMAT));
    }

    #[test]
    fn test_iso_format() -> Result<()> {
        let format = DateFormat::new("YYYY-MM-DD")?;
        assert_eq!(Ok(ymd(1999, 12, 31)), format.parse("1999-12-31"));
        assert!(format.parse("12-31-1999").is_err());
        Ok(())
    }

    #[test]
    fn test_literals_and_names() -> Result<()> {
        let format = DateFormat::new("[Posted] MMMM D, YYYY")?;
        assert_eq!(Ok(ymd(2021, 4, 6)), format.parse("Posted April 6, 2021"));

        let format = DateFormat::new("YYYY%MM%DD")?;
        assert_eq!(Ok(ymd(2021, 4, 16)), format.parse("2021%04%16"));

        let format = DateFormat::new("YYYY/DDDD")?;
        assert_eq!(Ok(ymd(2020, 2, 1)), format.parse("2020/032"));
        Ok(())
    }

    #[test]
    fn test_invalid_patterns() {
        assert_eq!(
            Err(Error::UnsupportedToken(String::from("HH"))),
            DateFormat::new("DD/MM/YYYY HH")
        );
        assert_eq!(
            Err(Error::UnterminatedLiteral(String::from("[on YYYY-MM-DD"))),
            DateFormat::new("[on YYYY-MM-DD")
        );
        assert_eq!(
            Err(Error::Incomplete(String::from("YYYY-MM"))),
            DateFormat::new("YYYY-MM")
        );
        assert!(DateFormat::new("MM-DD").is_err());
    }
}
