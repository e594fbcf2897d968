// Keytouch Identity Types
// Opaque handles for logical keys and physical touch contacts

use std::fmt;

/// Identifies one logical key of a keyboard layout instance.
///
/// Ids are assigned in layout order when a [`crate::Keyboard`] is built
/// and stay stable until the layout is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct KeyId(pub u32);

impl KeyId {
    /// Get the raw numeric value
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for KeyId {
    fn from(raw: u32) -> Self {
        KeyId(raw)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key#{}", self.0)
    }
}

/// Identifies one physical contact from its down until its up or cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct PointerId(pub i32);

impl From<i32> for PointerId {
    fn from(raw: i32) -> Self {
        PointerId(raw)
    }
}

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pointer#{}", self.0)
    }
}
