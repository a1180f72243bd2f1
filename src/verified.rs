/// A value that has passed a sanitizer and is safe to act on.
///
/// `Verified<T>` is what a [`Sanitizer`](crate::Sanitizer) hands back after
/// validating a [`Tainted`](crate::Tainted) NLU reply: a list of filter
/// conditions whose fields all exist in the caller's schema, or a navigation
/// result whose path lies inside the caller's role partition.
///
/// # Construction Invariants
///
/// There is no public constructor and no `From<T>` impl. Only sanitizers in
/// this crate create `Verified<T>`, and only after validation succeeds.
///
/// ```compile_fail
/// use campus_gate::Verified;
///
/// let forged = Verified::new(vec![1, 2, 3]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<T> {
    inner: T,
}

impl<T> Verified<T> {
    /// Wraps an already-validated value.
    ///
    /// Callers must have validated `value` first. Nothing here checks it.
    pub(crate) fn new_unchecked(value: T) -> Self {
        Self { inner: value }
    }

    /// Consumes the `Verified<T>` and returns the inner value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> AsRef<T> for Verified<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verified_as_ref_does_not_consume() {
        let verified = Verified::new_unchecked(vec!["lastname", "guardian"]);

        let ref1 = verified.as_ref();
        let ref2 = verified.as_ref();
        assert_eq!(ref1, ref2);

        let value = verified.into_inner();
        assert_eq!(value, vec!["lastname", "guardian"]);
    }

    #[test]
    fn verified_derives_work() {
        let v1 = Verified::new_unchecked("/teacher/classes".to_string());
        let v2 = v1.clone();
        assert_eq!(v1, v2);

        let debug_output = format!("{:?}", v1);
        assert!(debug_output.contains("Verified"));
        assert!(debug_output.contains("/teacher/classes"));
    }
}
