use std::fmt;

use zeroize::Zeroizing;

/// A secret value read from the store.
///
/// Wrapped so an empty secret is still a distinct, successful result.
/// The buffer is wiped on drop and `Debug` never prints the contents.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(Zeroizing<String>);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(**redacted**)")
    }
}

/// A connection string with a secret embedded in it. Same handling as
/// [`SecretValue`].
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionString(Zeroizing<String>);

impl ConnectionString {
    pub(crate) fn new(value: String) -> Self {
        Self(Zeroizing::new(value))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConnectionString(**redacted**)")
    }
}
