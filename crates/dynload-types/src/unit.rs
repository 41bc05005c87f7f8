//! Opaque handles to host-defined units.

use std::fmt;
use std::sync::Arc;

/// Handle to a successfully defined executable unit.
///
/// Immutable once produced and cheap to clone; the host's unit registry is
/// the sole producer and caches handles for the lifetime of the process.
/// The defining bytes are retained for introspection and diagnostics.
#[derive(Clone)]
pub struct UnitHandle {
    inner: Arc<DefinedUnit>,
}

struct DefinedUnit {
    name: String,
    bytes: Box<[u8]>,
}

impl UnitHandle {
    pub fn new(name: impl Into<String>, bytes: impl Into<Box<[u8]>>) -> Self {
        Self {
            inner: Arc::new(DefinedUnit {
                name: name.into(),
                bytes: bytes.into(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The bytes this unit was defined from.
    pub fn bytes(&self) -> &[u8] {
        &self.inner.bytes
    }

    pub fn len(&self) -> usize {
        self.inner.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.bytes.is_empty()
    }

    /// Whether two handles refer to the same defined unit (not merely equal
    /// bytes). Used by tests asserting the host returned a cached handle.
    pub fn same_unit(&self, other: &UnitHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for UnitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitHandle")
            .field("name", &self.inner.name)
            .field("len", &self.inner.bytes.len())
            .finish()
    }
}
