//! Booking codes: QR payloads and 6-digit manual check-in codes
//!
//! A QR payload looks like `WP-<ts>-<random>-<hash>`:
//! - `ts`: last 6 digits of the creation time in unix milliseconds
//! - `random`: 8 random bytes, upper-case hex
//! - `hash`: first 8 hex chars of SHA-256 over `WP-<ts>-<random>-<secret>`
//!
//! The hash makes payloads tamper-evident; it does not hide anything.

use chrono::Utc;
use rand::Rng;
use sha2::{Digest, Sha256};

const QR_PREFIX: &str = "WP";
const HASH_LEN: usize = 8;

/// Decomposed, validated QR payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrCodeData {
    /// `WP-<ts>-<random>`, the payload without its hash
    pub reference: String,
    pub timestamp: String,
    pub hash: String,
}

pub struct CodeGenerator {
    secret: String,
}

impl CodeGenerator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn generate_qr_code(&self) -> String {
        let millis = Utc::now().timestamp_millis().to_string();
        let timestamp = &millis[millis.len().saturating_sub(6)..];

        let random_bytes: [u8; 8] = rand::thread_rng().gen();
        let random = hex::encode_upper(random_bytes);

        let hash = self.digest(timestamp, &random);
        format!("{QR_PREFIX}-{timestamp}-{random}-{hash}")
    }

    /// Uniform in [100000, 999999]
    pub fn generate_check_in_code(&self) -> String {
        rand::thread_rng().gen_range(100_000..=999_999).to_string()
    }

    pub fn validate_qr_code(&self, code: &str) -> bool {
        self.parse_qr_code(code).is_some()
    }

    pub fn parse_qr_code(&self, code: &str) -> Option<QrCodeData> {
        let parts: Vec<&str> = code.split('-').collect();
        let [prefix, timestamp, random, hash] = parts.as_slice() else {
            return None;
        };
        if *prefix != QR_PREFIX || hash.len() != HASH_LEN {
            return None;
        }
        if self.digest(timestamp, random) != *hash {
            return None;
        }

        Some(QrCodeData {
            reference: format!("{prefix}-{timestamp}-{random}"),
            timestamp: timestamp.to_string(),
            hash: hash.to_string(),
        })
    }

    fn digest(&self, timestamp: &str, random: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{QR_PREFIX}-{timestamp}-{random}-{}", self.secret).as_bytes());
        let full = format!("{:x}", hasher.finalize());
        full[..HASH_LEN].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> CodeGenerator {
        CodeGenerator::new("test-secret")
    }

    #[test]
    fn generated_code_has_four_segments_and_validates() {
        let codes = generator();
        let code = codes.generate_qr_code();

        let parts: Vec<&str> = code.split('-').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "WP");
        assert_eq!(parts[1].len(), 6);
        assert_eq!(parts[2].len(), 16);
        assert_eq!(parts[3].len(), 8);
        assert!(codes.validate_qr_code(&code));
    }

    #[test]
    fn generated_codes_differ() {
        let codes = generator();
        assert_ne!(codes.generate_qr_code(), codes.generate_qr_code());
    }

    #[test]
    fn tampered_hash_is_rejected() {
        let codes = generator();
        let code = codes.generate_qr_code();
        let (body, hash) = code.rsplit_once('-').unwrap();
        let flipped = if hash.starts_with('0') { "1" } else { "0" };
        let tampered = format!("{body}-{flipped}{}", &hash[1..]);
        assert!(!codes.validate_qr_code(&tampered));
    }

    #[test]
    fn tampered_random_part_is_rejected() {
        let codes = generator();
        let code = codes.generate_qr_code();
        let parts: Vec<&str> = code.split('-').collect();
        let tampered = format!("{}-{}-{}-{}", parts[0], parts[1], "0000000000000000", parts[3]);
        assert!(!codes.validate_qr_code(&tampered));
    }

    #[test]
    fn wrong_prefix_is_rejected() {
        let codes = generator();
        let code = codes.generate_qr_code();
        assert!(!codes.validate_qr_code(&code.replacen("WP", "XP", 1)));
    }

    #[test]
    fn wrong_segment_count_is_rejected() {
        let codes = generator();
        let code = codes.generate_qr_code();
        assert!(!codes.validate_qr_code(&format!("{code}-extra")));
        let (three, _) = code.rsplit_once('-').unwrap();
        assert!(!codes.validate_qr_code(three));
        assert!(!codes.validate_qr_code(""));
    }

    #[test]
    fn code_from_other_secret_is_rejected() {
        let code = CodeGenerator::new("other").generate_qr_code();
        assert!(!generator().validate_qr_code(&code));
    }

    #[test]
    fn parse_splits_reference_and_hash() {
        let codes = generator();
        let code = codes.generate_qr_code();
        let data = codes.parse_qr_code(&code).unwrap();
        assert_eq!(format!("{}-{}", data.reference, data.hash), code);
        assert!(data.reference.starts_with("WP-"));
    }

    #[test]
    fn check_in_codes_are_six_digits() {
        let codes = generator();
        for _ in 0..1000 {
            let code: u32 = codes.generate_check_in_code().parse().unwrap();
            assert!((100_000..=999_999).contains(&code));
        }
    }
}
