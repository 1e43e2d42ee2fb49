//! Opaque unique id generator.

use datagen_core::Value;
use rand::Rng;
use uuid::Uuid;

/// Length of every generated id.
pub const UID_LENGTH: usize = 32;

/// Generate a random UUID v4 using the provided RNG, rendered as 32 hex digits.
pub fn generate_uid<R: Rng>(rng: &mut R) -> Value {
    // Generate 16 random bytes
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);

    // Set version (4) and variant (RFC 4122) bits
    bytes[6] = (bytes[6] & 0x0f) | 0x40; // Version 4
    bytes[8] = (bytes[8] & 0x3f) | 0x80; // Variant RFC 4122

    Value::Str(Uuid::from_bytes(bytes).simple().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_uid() {
        let mut rng = StdRng::seed_from_u64(42);
        let value = generate_uid(&mut rng);
        assert_eq!(value.as_str().unwrap().len(), UID_LENGTH);

        // Ensure uniqueness
        let value2 = generate_uid(&mut rng);
        assert_ne!(value, value2);
    }

    #[test]
    fn test_uid_deterministic() {
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);

        assert_eq!(generate_uid(&mut rng1), generate_uid(&mut rng2));
    }

    #[test]
    fn test_uid_version() {
        let mut rng = StdRng::seed_from_u64(42);
        let value = generate_uid(&mut rng);

        let uuid = Uuid::parse_str(value.as_str().unwrap()).unwrap();
        assert_eq!(uuid.get_version_num(), 4);
    }
}
