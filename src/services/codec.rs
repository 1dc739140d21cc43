//! Identifier codec: generation and parsing of the two visitor-facing
//! identifiers. Every invitation carries a long opaque QR token (embedded
//! in the QR payload under a fixed namespace prefix) and a 6-character
//! short code a guard can type by hand.

use rand::Rng;
use uuid::Uuid;

/// Namespace prefix of QR payloads. Scanned text carrying this prefix
/// belongs to this system; anything else is treated as a typed short code.
pub const QR_PREFIX: &str = "GATEPASS:";

/// Short code alphabet: uppercase alphanumerics minus the visually
/// confusable I, O, 0 and 1.
const SHORT_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const SHORT_CODE_LEN: usize = 6;

/// Generate an opaque, collision-resistant QR token.
///
/// No retry-on-collision here: the token space is large enough that the
/// unique index on the store is the only backstop needed.
pub fn generate_qr_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// The literal text encoded into the QR image for a token
pub fn qr_payload(token: &str) -> String {
    format!("{}{}", QR_PREFIX, token)
}

/// Generate a 6-character short code matching `^[A-Z0-9]{6}$`
pub fn generate_short_code() -> String {
    let mut rng = rand::thread_rng();
    (0..SHORT_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..SHORT_CODE_ALPHABET.len());
            SHORT_CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// A lookup key resolved from arbitrary scanned or typed text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    /// QR payload carrying the namespace prefix; holds the bare token
    Qr(String),
    /// Anything else, normalized for the case-insensitive short code lookup
    ShortCode(String),
}

impl LookupKey {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.strip_prefix(QR_PREFIX) {
            Some(token) => LookupKey::Qr(token.to_string()),
            None => LookupKey::ShortCode(trimmed.to_uppercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_token_is_opaque_and_unique() {
        let a = generate_qr_token();
        let b = generate_qr_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_qr_payload_carries_prefix() {
        let token = generate_qr_token();
        let payload = qr_payload(&token);
        assert!(payload.starts_with(QR_PREFIX));
        assert!(payload.ends_with(&token));
    }

    #[test]
    fn test_short_code_contract() {
        // Regex contract: ^[A-Z0-9]{6}$
        for _ in 0..200 {
            let code = generate_short_code();
            assert_eq!(code.len(), SHORT_CODE_LEN);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_short_code_avoids_confusable_characters() {
        for _ in 0..200 {
            let code = generate_short_code();
            assert!(!code.contains(['I', 'O', '0', '1']));
        }
    }

    #[test]
    fn test_parse_qr_payload() {
        let key = LookupKey::parse("GATEPASS:abc123def456");
        assert_eq!(key, LookupKey::Qr("abc123def456".to_string()));
    }

    #[test]
    fn test_parse_qr_payload_round_trip() {
        let token = generate_qr_token();
        let key = LookupKey::parse(&qr_payload(&token));
        assert_eq!(key, LookupKey::Qr(token));
    }

    #[test]
    fn test_parse_short_code_uppercases_and_trims() {
        let key = LookupKey::parse("  abc234 ");
        assert_eq!(key, LookupKey::ShortCode("ABC234".to_string()));
    }

    #[test]
    fn test_parse_foreign_qr_text_falls_back_to_short_code() {
        // A scan of some unrelated QR code must not be mistaken for ours
        let key = LookupKey::parse("https://example.com/menu");
        assert_eq!(
            key,
            LookupKey::ShortCode("HTTPS://EXAMPLE.COM/MENU".to_string())
        );
    }
}
