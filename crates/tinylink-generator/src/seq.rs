use crate::Generator;
use std::sync::atomic::{AtomicU64, Ordering};
use tinylink_core::{SessionToken, ShortCode, ALPHABET, CODE_LENGTH};

/// Number of distinct six-character base-62 codes.
const CODE_SPACE: u64 = 62u64.pow(CODE_LENGTH as u32);

/// A deterministic short code generator using a sequential counter.
///
/// This generator produces "000000", "000001", ..., "00000z", "000010", etc.
/// Codes are unique within a single instance until the counter wraps around
/// the 62^6 code space. The owner is ignored.
#[derive(Debug)]
pub struct SequenceGenerator {
    counter: AtomicU64,
}

impl Clone for SequenceGenerator {
    fn clone(&self) -> Self {
        Self {
            counter: AtomicU64::new(self.counter.load(Ordering::SeqCst)),
        }
    }
}

impl SequenceGenerator {
    pub fn new() -> Self {
        Self::with_offset(0)
    }

    /// Creates a new generator starting from a specific counter value.
    ///
    /// Useful for resuming from a known state.
    pub fn with_offset(offset: u64) -> Self {
        Self {
            counter: AtomicU64::new(offset),
        }
    }
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for SequenceGenerator {
    fn generate(&self, _owner: &SessionToken) -> ShortCode {
        let mut n = self.counter.fetch_add(1, Ordering::SeqCst) % CODE_SPACE;
        let mut digits = [b'0'; CODE_LENGTH];
        for slot in digits.iter_mut().rev() {
            *slot = ALPHABET[(n % 62) as usize];
            n /= 62;
        }
        ShortCode::new_unchecked(String::from_utf8_lossy(&digits).into_owned())
    }
}
