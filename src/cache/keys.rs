//! Type-safe cache key builders

use std::fmt;

pub const VERSION: &str = "v1";

pub mod recharge {
    use super::*;

    pub const NAMESPACE: &str = "recharge";

    /// Recorded transaction by idempotency reference.
    #[derive(Debug, Clone)]
    pub struct TransactionKey {
        pub reference: String,
    }

    impl TransactionKey {
        pub fn new(reference: impl Into<String>) -> Self {
            Self {
                reference: reference.into(),
            }
        }
    }

    impl fmt::Display for TransactionKey {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}:{}:tx:{}", VERSION, NAMESPACE, self.reference)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_key_format() {
        let key = recharge::TransactionKey::new("AIRTIME_MTN_1_ABC123");
        assert_eq!(key.to_string(), "v1:recharge:tx:AIRTIME_MTN_1_ABC123");
    }
}
