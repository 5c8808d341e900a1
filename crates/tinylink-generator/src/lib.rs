pub mod base62;
pub mod seq;

pub use base62::{derive_code, Base62Generator};
pub use seq::SequenceGenerator;

use tinylink_core::{SessionToken, ShortCode};

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage.
/// Uniqueness is not guaranteed here: the link store rejects a code that is
/// already taken and the caller asks for another one.
pub trait Generator: Send + Sync + 'static {
    /// Generates a candidate short code for a link owned by `owner`.
    fn generate(&self, owner: &SessionToken) -> ShortCode;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generators_are_send_sync() {
        fn assert_generator<T: Generator>() {}
        assert_generator::<Base62Generator>();
        assert_generator::<SequenceGenerator>();
    }
}
