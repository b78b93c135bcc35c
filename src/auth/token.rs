//! Token value type and wire grammar
//!
//! `<header>.<payload>.<signature>`, each segment unpadded base64-url.

use std::fmt;

use serde_json::Value;

use super::codec;
use super::error::VerifyError;

/// The only accepted header.
pub const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// A signed token string.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub(crate) fn from_parts(header: &str, payload: &str, signature: &str) -> Self {
        Self(format!("{}.{}.{}", header, payload, signature))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(..)")
    }
}

/// Borrowed view of the three segments of a presented token.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TokenParts<'a> {
    pub header: &'a str,
    pub payload: &'a str,
    pub signature: &'a str,
    /// `header.payload` exactly as presented
    pub signing_input: &'a str,
}

impl<'a> TokenParts<'a> {
    pub fn split(token: &'a str) -> Result<Self, VerifyError> {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(VerifyError::Malformed);
        };

        Ok(Self {
            header,
            payload,
            signature,
            signing_input: &token[..header.len() + 1 + payload.len()],
        })
    }
}

/// Encoded form of [`HEADER_JSON`].
pub(crate) fn encoded_header() -> String {
    codec::encode(HEADER_JSON)
}

/// Check a header segment against the fixed header.
///
/// Comparison is on the JSON value, so member order does not matter.
pub(crate) fn check_header(segment: &str) -> Result<(), VerifyError> {
    let bytes = codec::decode(segment).map_err(|_| VerifyError::Malformed)?;
    let presented: Value =
        serde_json::from_slice(&bytes).map_err(|_| VerifyError::Malformed)?;
    let expected: Value =
        serde_json::from_str(HEADER_JSON).map_err(|_| VerifyError::UnsupportedAlgorithm)?;

    if presented == expected {
        Ok(())
    } else {
        Err(VerifyError::UnsupportedAlgorithm)
    }
}
