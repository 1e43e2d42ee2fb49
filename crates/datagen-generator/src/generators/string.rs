//! Fixed-length random string generator.

use datagen_core::Value;
use rand::Rng;

const ALLOWED_CHARACTERS: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@";

/// Generate a string of exactly `length` characters.
pub fn generate_string<R: Rng>(rng: &mut R, length: usize) -> Value {
    let s: String = (0..length)
        .map(|_| ALLOWED_CHARACTERS[rng.random_range(0..ALLOWED_CHARACTERS.len())] as char)
        .collect();
    Value::Str(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_string_length() {
        let mut rng = StdRng::seed_from_u64(42);

        for length in [0, 1, 5, 64] {
            let value = generate_string(&mut rng, length);
            assert_eq!(value.as_str().unwrap().len(), length);
        }
    }

    #[test]
    fn test_generate_string_charset() {
        let mut rng = StdRng::seed_from_u64(42);
        let value = generate_string(&mut rng, 200);

        assert!(value
            .as_str()
            .unwrap()
            .bytes()
            .all(|b| ALLOWED_CHARACTERS.contains(&b)));
    }
}
