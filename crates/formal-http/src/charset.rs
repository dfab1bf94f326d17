//! Character set handling for submitted keys and values.
//!
//! Browsers encode form data in the charset of the page and report it in a
//! hidden `_charset_` field. The handful of charsets a form page is served
//! in are supported; anything else is rejected rather than guessed.

use std::fmt;

use formal_core::{FormalError, FormalResult};

/// A supported submission charset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// UTF-8. Invalid sequences decode to U+FFFD.
    Utf8,
    /// ISO-8859-1 / Latin-1. Every byte maps to the code point of the same value.
    Latin1,
    /// US-ASCII. Bytes above 0x7F decode to U+FFFD.
    Ascii,
}

impl Charset {
    /// Resolves a charset label (case-insensitive, common aliases accepted).
    ///
    /// # Examples
    ///
    /// ```
    /// use formal_http::Charset;
    ///
    /// assert_eq!(Charset::from_label("UTF-8").unwrap(), Charset::Utf8);
    /// assert_eq!(Charset::from_label("latin1").unwrap(), Charset::Latin1);
    /// assert!(Charset::from_label("koi8-r").is_err());
    /// ```
    pub fn from_label(label: &str) -> FormalResult<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin-1" | "latin1" | "l1" => Ok(Self::Latin1),
            "us-ascii" | "ascii" => Ok(Self::Ascii),
            other => Err(FormalError::UnsupportedCharset(other.to_string())),
        }
    }

    /// Decodes bytes into a string.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Self::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { char::from(b) } else { '\u{FFFD}' })
                .collect(),
        }
    }

    /// Returns the canonical label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "iso-8859-1",
            Self::Ascii => "us-ascii",
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
