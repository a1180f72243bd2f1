//! Type-state markers for a single gate evaluation.
//!
//! An evaluation moves `Start → TokenDecoded → RoleDerived`; every
//! transition may instead end early in a decision. Encoding the steps as
//! types means the area check cannot run on an evaluation whose role was
//! never derived.

/// Marker for an evaluation that has only the requested path.
#[derive(Debug, Clone, Copy)]
pub struct Start {
    _private: (),
}

impl Start {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// Marker for an evaluation holding a decoded identity.
#[derive(Debug, Clone, Copy)]
pub struct TokenDecoded {
    _private: (),
}

impl TokenDecoded {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// Marker for an evaluation whose primary role is a known role.
#[derive(Debug, Clone, Copy)]
pub struct RoleDerived {
    _private: (),
}

impl RoleDerived {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}
