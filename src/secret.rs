use std::fmt;

/// A wrapper that keeps credentials out of logs and error output.
///
/// Holds the NLU provider's API key from the moment configuration is parsed
/// until the key is written into an `Authorization` header. The value can
/// only be read through [`expose_secret`](Self::expose_secret).
///
/// # Security Properties
///
/// - Does NOT implement `Deref`, `AsRef`, `Borrow`, `Clone`, or `Copy`
/// - Debug and Display output is always `[REDACTED]`
/// - No type information is leaked in formatted output
///
/// # Examples
///
/// ```
/// use campus_gate::Secret;
///
/// let api_key = Secret::new("sk-1234567890".to_string());
///
/// assert_eq!(format!("{:?}", api_key), "[REDACTED]");
/// assert_eq!(format!("{}", api_key), "[REDACTED]");
///
/// assert_eq!(api_key.expose_secret(), "sk-1234567890");
/// ```
// Do NOT add Clone, Copy, or Default derives.
pub struct Secret<T> {
    // Must stay private: a public field skips redaction.
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value in a `Secret`.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the secret value.
    ///
    /// The verbose name is deliberate. Never log or display the result.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for Secret<T> {
    // MUST unconditionally print "[REDACTED]", in every build profile.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
