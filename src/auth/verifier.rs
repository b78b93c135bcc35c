//! Token verification
//!
//! Order of checks, first failure wins:
//! 1. three segments
//! 2. signature over the presented `header.payload` (constant time)
//! 3. header equals the fixed HS256 header
//! 4. payload decodes to a claim object
//! 5. `exp` present and in the future
//! 6. `sub`, `role`, `userId`, `iat` present

use serde::Deserialize;
use subtle::ConstantTimeEq;

use super::claims::ClaimSet;
use super::codec;
use super::error::VerifyError;
use super::issuer::sign_input;
use super::secret::SecretKey;
use super::token::{check_header, TokenParts};

/// Payload as presented. Every claim is optional here so that an absent
/// claim is reported as missing rather than as a parse failure.
#[derive(Debug, Deserialize)]
struct PresentedClaims {
    sub: Option<String>,
    role: Option<String>,
    #[serde(rename = "userId")]
    user_id: Option<String>,
    iat: Option<i64>,
    exp: Option<i64>,
    jti: Option<String>,
}

/// Verify `token` against `secret` at Unix time `now`.
pub fn verify(token: &str, secret: &SecretKey, now: i64) -> Result<ClaimSet, VerifyError> {
    let parts = TokenParts::split(token)?;

    let expected = sign_input(secret, parts.signing_input);
    if !bool::from(expected.as_bytes().ct_eq(parts.signature.as_bytes())) {
        return Err(VerifyError::SignatureMismatch);
    }

    check_header(parts.header)?;

    let payload = codec::decode(parts.payload).map_err(|_| VerifyError::MalformedPayload)?;
    let presented: PresentedClaims =
        serde_json::from_slice(&payload).map_err(|_| VerifyError::MalformedPayload)?;

    let expires_at = presented.exp.ok_or(VerifyError::MissingClaim("exp"))?;
    if now >= expires_at {
        return Err(VerifyError::Expired);
    }

    Ok(ClaimSet {
        subject: required(presented.sub, "sub")?,
        role: required(presented.role, "role")?,
        user_id: required(presented.user_id, "userId")?,
        issued_at: presented.iat.ok_or(VerifyError::MissingClaim("iat"))?,
        expires_at,
        token_id: presented.jti,
    })
}

fn required(value: Option<String>, claim: &'static str) -> Result<String, VerifyError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(VerifyError::MissingClaim(claim))
}

/// Verifier bound to the process-wide secret.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    secret: SecretKey,
}

impl TokenVerifier {
    pub fn new(secret: SecretKey) -> Self {
        Self { secret }
    }

    pub fn verify(&self, token: &str, now: i64) -> Result<ClaimSet, VerifyError> {
        verify(token, &self.secret, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::issuer::issue;
    use crate::auth::token::encoded_header;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";
    const USER_ID: &str = "11111111-1111-1111-1111-111111111111";

    fn secret() -> SecretKey {
        SecretKey::new(SECRET).unwrap()
    }

    fn alice() -> ClaimSet {
        ClaimSet::new("alice", "Member", USER_ID, 1_700_000_000, 1_700_001_800)
    }

    /// Correctly signed token over arbitrary header and payload JSON.
    fn signed(header_json: &str, payload_json: &str) -> String {
        let header = codec::encode(header_json);
        let payload = codec::encode(payload_json);
        let signature = sign_input(&secret(), &format!("{}.{}", header, payload));
        format!("{}.{}.{}", header, payload, signature)
    }

    fn signed_payload(payload_json: &str) -> String {
        signed(r#"{"alg":"HS256","typ":"JWT"}"#, payload_json)
    }

    fn flip(c: char) -> char {
        if c == 'A' {
            'B'
        } else {
            'A'
        }
    }

    #[test]
    fn verifies_issued_token_before_expiry() {
        let token = issue(&alice(), &secret()).unwrap();
        assert_eq!(verify(token.as_str(), &secret(), 1_700_000_500), Ok(alice()));
    }

    #[test]
    fn rejects_issued_token_after_expiry() {
        let token = issue(&alice(), &secret()).unwrap();
        assert_eq!(
            verify(token.as_str(), &secret(), 1_700_002_000),
            Err(VerifyError::Expired)
        );
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let now = 1_700_000_900;
        let at_now = ClaimSet::new("alice", "Member", USER_ID, now - 60, now);
        let after_now = ClaimSet::new("alice", "Member", USER_ID, now - 60, now + 1);

        let token = issue(&at_now, &secret()).unwrap();
        assert_eq!(verify(token.as_str(), &secret(), now), Err(VerifyError::Expired));

        let token = issue(&after_now, &secret()).unwrap();
        assert_eq!(verify(token.as_str(), &secret(), now), Ok(after_now));
    }

    #[test]
    fn round_trips_token_id() {
        let claims = alice().with_token_id("9b2c7d1e");
        let token = issue(&claims, &secret()).unwrap();
        assert_eq!(verify(token.as_str(), &secret(), 1_700_000_000), Ok(claims));
    }

    #[test]
    fn wrong_secret_is_signature_mismatch() {
        let other = SecretKey::new("fedcba9876543210fedcba9876543210").unwrap();
        let token = issue(&alice(), &other).unwrap();
        assert_eq!(
            verify(token.as_str(), &secret(), 1_700_000_500),
            Err(VerifyError::SignatureMismatch)
        );
    }

    #[test]
    fn any_single_character_change_in_header_or_payload_is_detected() {
        let token = issue(&alice(), &secret()).unwrap().into_string();
        let signed_len = token.rfind('.').unwrap();

        for (i, c) in token.char_indices().take(signed_len) {
            if c == '.' {
                continue;
            }
            let mut tampered = token.clone();
            tampered.replace_range(i..i + 1, &flip(c).to_string());

            assert_eq!(
                verify(&tampered, &secret(), 1_700_000_500),
                Err(VerifyError::SignatureMismatch),
                "position {i}"
            );
        }
    }

    #[test]
    fn tampered_signature_is_detected() {
        let token = issue(&alice(), &secret()).unwrap().into_string();
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(flip(last));

        assert_eq!(
            verify(&tampered, &secret(), 1_700_000_500),
            Err(VerifyError::SignatureMismatch)
        );
        let truncated = &token[..token.len() - 1];
        assert_eq!(
            verify(truncated, &secret(), 1_700_000_500),
            Err(VerifyError::SignatureMismatch)
        );
    }

    #[test]
    fn wrong_segment_count_is_malformed() {
        let token = issue(&alice(), &secret()).unwrap().into_string();
        let mut segments = token.split('.');
        let header = segments.next().unwrap();
        let payload = segments.next().unwrap();
        let signature = segments.next().unwrap();

        for candidate in [
            String::new(),
            header.to_string(),
            format!("{}.{}", header, payload),
            format!("{}.{}.{}.{}", header, payload, signature, signature),
        ] {
            assert_eq!(
                verify(&candidate, &secret(), 1_700_000_500),
                Err(VerifyError::Malformed)
            );
        }
    }

    #[test]
    fn signed_token_with_other_algorithm_is_unsupported() {
        let token = signed(
            r#"{"alg":"none","typ":"JWT"}"#,
            r#"{"sub":"alice","role":"Member","userId":"u","iat":1,"exp":9999999999}"#,
        );
        assert_eq!(
            verify(&token, &secret(), 1_700_000_500),
            Err(VerifyError::UnsupportedAlgorithm)
        );
    }

    #[test]
    fn unsigned_none_token_is_rejected() {
        let header = codec::encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = codec::encode(alice().to_canonical_json().unwrap());
        let token = format!("{}.{}.", header, payload);
        assert_eq!(
            verify(&token, &secret(), 1_700_000_500),
            Err(VerifyError::SignatureMismatch)
        );
    }

    #[test]
    fn signed_garbage_payload_is_malformed_payload() {
        for payload in ["not json", "[1,2,3]", r#"{"sub":"alice","exp":"soon"}"#, r#"{"exp":1.7e9}"#] {
            assert_eq!(
                verify(&signed_payload(payload), &secret(), 1_700_000_500),
                Err(VerifyError::MalformedPayload),
                "{payload}"
            );
        }
    }

    #[test]
    fn missing_exp_is_reported() {
        let token = signed_payload(r#"{"sub":"alice","role":"Member","userId":"u","iat":1}"#);
        assert_eq!(
            verify(&token, &secret(), 1_700_000_500),
            Err(VerifyError::MissingClaim("exp"))
        );
    }

    #[test]
    fn missing_or_empty_identity_claims_are_reported() {
        let cases = [
            (r#"{"role":"Member","userId":"u","iat":1,"exp":9999999999}"#, "sub"),
            (r#"{"sub":"","role":"Member","userId":"u","iat":1,"exp":9999999999}"#, "sub"),
            (r#"{"sub":"alice","userId":"u","iat":1,"exp":9999999999}"#, "role"),
            (r#"{"sub":"alice","role":"Member","iat":1,"exp":9999999999}"#, "userId"),
            (r#"{"sub":"alice","role":"Member","userId":"","iat":1,"exp":9999999999}"#, "userId"),
            (r#"{"sub":"alice","role":"Member","userId":"u","exp":9999999999}"#, "iat"),
        ];

        for (payload, claim) in cases {
            assert_eq!(
                verify(&signed_payload(payload), &secret(), 1_700_000_500),
                Err(VerifyError::MissingClaim(claim)),
                "{payload}"
            );
        }
    }

    #[test]
    fn expiry_is_checked_before_identity_claims() {
        let token = signed_payload(r#"{"exp":1700000000}"#);
        assert_eq!(
            verify(&token, &secret(), 1_700_000_500),
            Err(VerifyError::Expired)
        );
    }

    #[test]
    fn unknown_claims_are_ignored() {
        let token = signed_payload(
            r#"{"sub":"alice","role":"Member","userId":"u","iss":"me","aud":"you","iat":1,"exp":9999999999}"#,
        );
        let claims = verify(&token, &secret(), 1_700_000_500).unwrap();
        assert_eq!(claims.subject, "alice");
        assert_eq!(claims.token_id, None);
    }

    #[test]
    fn undecodable_header_with_valid_signature_is_malformed() {
        let payload = codec::encode(alice().to_canonical_json().unwrap());
        let header = codec::encode("garbage");
        let signature = sign_input(&secret(), &format!("{}.{}", header, payload));
        let token = format!("{}.{}.{}", header, payload, signature);
        assert_eq!(
            verify(&token, &secret(), 1_700_000_500),
            Err(VerifyError::Malformed)
        );
        assert_eq!(encoded_header(), "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9");
    }

    #[test]
    fn interoperates_with_standard_jwt_library() {
        use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};

        let ours = issue(&alice(), &secret()).unwrap();
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = false;
        let decoded = jsonwebtoken::decode::<ClaimSet>(
            ours.as_str(),
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &validation,
        )
        .unwrap();
        assert_eq!(decoded.claims, alice());

        let theirs = jsonwebtoken::encode(
            &Header::default(),
            &alice(),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(verify(&theirs, &secret(), 1_700_000_500), Ok(alice()));
    }

    #[test]
    fn verifier_uses_bound_secret() {
        let verifier = TokenVerifier::new(secret());
        let token = issue(&alice(), &secret()).unwrap();
        assert_eq!(verifier.verify(token.as_str(), 1_700_000_500), Ok(alice()));
    }
}
