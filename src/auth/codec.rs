//! Canonical base64-url codec for token segments
//!
//! Segments use the URL-safe alphabet (`-` and `_` instead of `+` and `/`)
//! with the trailing `=` padding stripped.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use thiserror::Error;

/// A segment that is not canonical unpadded base64-url.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedEncoding {
    #[error("invalid character at offset {offset}")]
    InvalidCharacter { offset: usize },

    #[error("invalid length {0}")]
    InvalidLength(usize),

    #[error("non-canonical trailing bits")]
    NonCanonical,
}

/// Encode bytes as unpadded base64-url.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode an unpadded base64-url string.
pub fn decode(input: &str) -> Result<Vec<u8>, MalformedEncoding> {
    if let Some(offset) = input.bytes().position(|b| !is_url_safe(b)) {
        return Err(MalformedEncoding::InvalidCharacter { offset });
    }

    // A single dangling sextet can never be completed into a byte.
    if input.len() % 4 == 1 {
        return Err(MalformedEncoding::InvalidLength(input.len()));
    }

    URL_SAFE_NO_PAD
        .decode(input)
        .map_err(|_| MalformedEncoding::NonCanonical)
}

fn is_url_safe(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_without_padding_using_url_alphabet() {
        assert_eq!(encode(b""), "");
        assert_eq!(encode(b"f"), "Zg");
        assert_eq!(encode(b"fo"), "Zm8");
        assert_eq!(encode(b"foo"), "Zm9v");
        assert_eq!(encode([0xfb, 0xff]), "-_8");
    }

    #[test]
    fn encodes_fixed_header() {
        assert_eq!(
            encode(br#"{"alg":"HS256","typ":"JWT"}"#),
            "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"
        );
    }

    #[test]
    fn decodes_every_valid_remainder() {
        assert_eq!(decode("").unwrap(), b"");
        assert_eq!(decode("Zg").unwrap(), b"f");
        assert_eq!(decode("Zm8").unwrap(), b"fo");
        assert_eq!(decode("Zm9v").unwrap(), b"foo");
        assert_eq!(decode("-_8").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn rejects_standard_alphabet_and_padding() {
        assert_eq!(
            decode("+/8"),
            Err(MalformedEncoding::InvalidCharacter { offset: 0 })
        );
        assert_eq!(
            decode("Zg=="),
            Err(MalformedEncoding::InvalidCharacter { offset: 2 })
        );
        assert_eq!(
            decode("Zm 9v"),
            Err(MalformedEncoding::InvalidCharacter { offset: 2 })
        );
    }

    #[test]
    fn rejects_length_with_remainder_one() {
        assert_eq!(decode("Zm9vY"), Err(MalformedEncoding::InvalidLength(5)));
    }

    #[test]
    fn rejects_non_canonical_trailing_bits() {
        assert_eq!(decode("Zh"), Err(MalformedEncoding::NonCanonical));
    }
}
