use std::fmt;

/// A wrapper for untrusted text that must pass a sanitizer before use.
///
/// Every reply from the NLU capability is wrapped in `Tainted<T>` the moment
/// it arrives. The reply may contain prose, invented field names, paths from
/// another role's area, or text an attacker smuggled in through the query.
/// Nothing outside this crate can read the inner value; the only way out is a
/// [`Sanitizer`](crate::Sanitizer), which yields a [`Verified<T>`](crate::Verified).
///
/// # Security Properties
///
/// - Does NOT implement `Deref` or any implicit conversion traits
/// - Inner value is inaccessible outside the crate
/// - Debug output is truncated so oversized replies do not flood logs
///
/// # Examples
///
/// ```
/// use campus_gate::Tainted;
///
/// let reply = Tainted::new(r#"[{"field":"password","operator":"equals","value":"x"}]"#.to_string());
///
/// // Debug output shows it's tainted
/// println!("{:?}", reply);
///
/// // But the text cannot be used directly:
/// // let conditions: String = reply; // Won't compile!
/// ```
#[derive(Clone)]
pub struct Tainted<T> {
    // Must stay private: a public field bypasses every sanitizer.
    inner: T,
}

impl<T> Tainted<T> {
    /// Wraps an untrusted value in `Tainted`.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Extracts the inner value for sanitization.
    ///
    /// Only sanitizers in this crate call this, and only to validate the value
    /// before wrapping the result in `Verified<T>`.
    pub(crate) fn into_inner(self) -> T {
        self.inner
    }
}

/// Longest prefix of a tainted string shown by `Debug`.
const DEBUG_PREVIEW_CHARS: usize = 120;

impl fmt::Debug for Tainted<String> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.inner.chars().take(DEBUG_PREVIEW_CHARS).collect();
        let truncated = self.inner.chars().count() > DEBUG_PREVIEW_CHARS;
        f.debug_struct("Tainted")
            .field("inner", &preview)
            .field("truncated", &truncated)
            .finish()
    }
}
