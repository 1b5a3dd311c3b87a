//! Request token parsing and formatting.
//!
//! A view asks for `"<identity>[|<escaped-locator>]/<size>"`. The locator is
//! percent-escaped so it can carry arbitrary paths; a missing locator means
//! a cache- or disk-only lookup, and a missing or unknown size is left
//! unset so the service can substitute its configured default tier.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::fmt;
use std::path::PathBuf;

use crate::error::ThumbnailError;
use crate::size::SizeClass;

/// Characters that must be escaped inside the locator segment: the token's
/// own separators, the escape character, and anything non-printable.
const TOKEN_ESCAPE: &AsciiSet = &CONTROLS.add(b' ').add(b'%').add(b'|').add(b'/');

/// Parsed form of a caller-supplied request token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken {
    pub identity: String,
    pub locator: Option<PathBuf>,
    /// `None` when the token left the size unspecified or unrecognized.
    pub size: Option<SizeClass>,
}

impl RequestToken {
    /// Parse `"<identity>[|<escaped-locator>]/<size>"`.
    pub fn parse(token: &str) -> Result<Self, ThumbnailError> {
        let (hash_part, size_part) = match token.split_once('/') {
            Some((hash, size)) => (hash, Some(size)),
            None => (token, None),
        };

        let size = size_part.and_then(SizeClass::parse);

        let (identity, locator) = match hash_part.split_once('|') {
            Some((identity, escaped)) => {
                let decoded = percent_decode_str(escaped)
                    .decode_utf8()
                    .map_err(|e| ThumbnailError::InvalidToken(e.to_string()))?;
                (identity, Some(PathBuf::from(decoded.into_owned())))
            }
            None => (hash_part, None),
        };

        if identity.is_empty() {
            return Err(ThumbnailError::InvalidToken(
                "empty content identity".to_string(),
            ));
        }

        Ok(Self {
            identity: identity.to_string(),
            locator,
            size,
        })
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity)?;
        if let Some(locator) = &self.locator {
            let locator = locator.to_string_lossy();
            let escaped = utf8_percent_encode(&locator, TOKEN_ESCAPE);
            write!(f, "|{}", escaped)?;
        }
        if let Some(size) = self.size {
            write!(f, "/{}", size)?;
        }
        Ok(())
    }
}
