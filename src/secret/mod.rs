use sha2::{Digest, Sha256};

/// Deterministic salted digest for gate passcodes. The salt is process-wide
/// configuration, so equal secrets always hash to equal digests and stored
/// hashes survive restarts.
///
/// Passcodes are low-entropy shared secrets printed next to the gate they
/// protect; the hash exists to keep plaintext out of the database, not to
/// resist offline cracking.
#[derive(Debug, Clone)]
pub struct SecretHasher {
    salt: String,
}

impl SecretHasher {
    #[must_use]
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }

    #[must_use]
    pub fn hash(&self, secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}:{}", self.salt, secret).as_bytes());
        hex::encode(hasher.finalize())
    }

    #[must_use]
    pub fn verify(&self, secret: &str, expected_digest: &str) -> bool {
        self.hash(secret) == expected_digest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let hasher = SecretHasher::new("salt");
        assert_eq!(hasher.hash("1234"), hasher.hash("1234"));
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let hasher = SecretHasher::new("salt");
        let digest = hasher.hash("1234");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_salt_changes_digest() {
        let a = SecretHasher::new("salt-a").hash("1234");
        let b = SecretHasher::new("salt-b").hash("1234");
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_round_trip() {
        let hasher = SecretHasher::new("salt");
        let digest = hasher.hash("open sesame");
        assert!(hasher.verify("open sesame", &digest));
        assert!(!hasher.verify("open sesamee", &digest));
    }
}
