//! Text encodings for reading and writing file contents.

use crate::error::{Error, ErrorKind};
use derive_more::Display;
use std::borrow::Cow;
use std::str::FromStr;

/// Text encoding used when files are read as text or written from text.
///
/// Decoding is tolerant: malformed byte sequences are replaced with
/// `U+FFFD` rather than failing the read. Content search relies on that, a
/// single binary file in the tree must not abort a whole query.
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
pub enum Encoding {
    #[default]
    #[display("utf-8")]
    Utf8,
}
impl Encoding {
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes),
        }
    }

    pub fn encode<'a>(&self, text: &'a str) -> Cow<'a, [u8]> {
        match self {
            Self::Utf8 => Cow::Borrowed(text.as_bytes()),
        }
    }
}
impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            _ => exn::bail!(ErrorKind::UnsupportedEncoding(s.to_string())),
        }
    }
}
