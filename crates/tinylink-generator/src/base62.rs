use crate::Generator;
use tinylink_core::{SessionToken, ShortCode, ALPHABET, CODE_LENGTH};

/// How many leading characters of the owner's token are mixed into a code.
const OWNER_PART_LEN: usize = 4;

/// Derives a short code from a random value and the owner's token.
///
/// The random value is masked to 63 bits and written in base 62, least
/// significant digit first. The first four characters of the owner's token,
/// uppercased, are appended and the result is cut to [`CODE_LENGTH`].
///
/// Random values of 10 or more base-62 digits leave no room for the owner
/// part, so most codes are fully random. Returns `None` for values below 62,
/// whose single digit plus the owner part is too short.
pub fn derive_code(random: u64, owner: &SessionToken) -> Option<ShortCode> {
    let mut n = random & (i64::MAX as u64);
    let mut code = String::with_capacity(16);

    loop {
        code.push(char::from(ALPHABET[(n % 62) as usize]));
        n /= 62;
        if n == 0 {
            break;
        }
    }

    let owner_part: String = owner.to_string().chars().take(OWNER_PART_LEN).collect();
    code.push_str(&owner_part.to_uppercase());

    if code.len() < CODE_LENGTH {
        return None;
    }
    code.truncate(CODE_LENGTH);
    Some(ShortCode::new_unchecked(code))
}

/// Random short code generator backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base62Generator;

impl Base62Generator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for Base62Generator {
    fn generate(&self, owner: &SessionToken) -> ShortCode {
        loop {
            if let Some(code) = derive_code(rand::random::<u64>(), owner) {
                return code;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn owner() -> SessionToken {
        SessionToken::from_uuid(Uuid::parse_str("abcd1234-0000-4000-8000-000000000000").unwrap())
    }

    #[test]
    fn two_digit_values_keep_owner_prefix() {
        // 62 -> digits [0, 1], least significant first
        assert_eq!(derive_code(62, &owner()).unwrap().as_str(), "01ABCD");
        // 3843 = 61 * 62 + 61
        assert_eq!(derive_code(3843, &owner()).unwrap().as_str(), "zzABCD");
    }

    #[test]
    fn single_digit_values_are_too_short() {
        assert!(derive_code(0, &owner()).is_none());
        assert!(derive_code(61, &owner()).is_none());
    }

    #[test]
    fn long_values_truncate_away_owner_part() {
        // 62^5 has six digits: five zeros then a one
        let code = derive_code(62u64.pow(5), &owner()).unwrap();
        assert_eq!(code.as_str(), "000001");
    }

    #[test]
    fn sign_bit_is_ignored() {
        assert_eq!(
            derive_code(u64::MAX, &owner()),
            derive_code(i64::MAX as u64, &owner())
        );
    }

    #[test]
    fn generated_codes_are_valid() {
        let generator = Base62Generator::new();
        let owner = SessionToken::generate();

        for _ in 0..1_000 {
            let code = generator.generate(&owner);
            assert_eq!(code.as_str().len(), CODE_LENGTH);
            assert!(code.as_str().bytes().all(|b| ALPHABET.contains(&b)));
            assert!(ShortCode::new(code.as_str()).is_ok());
        }
    }
}
