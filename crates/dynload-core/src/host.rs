//! Seam to the host's unit registry.
//!
//! Defining bytes into the running process is the one inherently
//! host-specific operation in this subsystem. The resolution logic is
//! portable; a target platform supplies this capability.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use dynload_types::{LoadError, UnitHandle, UnitName};

/// The host's registry of defined units.
///
/// The registry is the single authority for the at-most-once definition
/// guarantee: `define` for a name that is already defined must return the
/// existing handle, never a fresh one, and callers must not race past an
/// `already_defined` answer.
pub trait HostRegistry: Send + Sync {
    /// Define `name` from `bytes`, or return the existing handle if the
    /// name is already defined. Fails with [`LoadError::MalformedArtifact`]
    /// when the bytes are not valid for the host's execution format.
    fn define(&self, name: &UnitName, bytes: &[u8]) -> Result<UnitHandle, LoadError>;

    /// The existing handle for `name`, if the host has already defined it.
    fn already_defined(&self, name: &UnitName) -> Option<UnitHandle>;
}

/// In-process host registry.
///
/// Backs tests and the CLI: it records the order of successful definitions
/// so ordering invariants can be asserted, and accepts an optional
/// validation hook standing in for the host's format check. The built-in
/// check rejects empty buffers, which no execution format accepts.
#[derive(Default)]
pub struct InMemoryHost {
    units: RwLock<HashMap<String, UnitHandle>>,
    define_log: Mutex<Vec<String>>,
    validator: Option<Box<dyn Fn(&[u8]) -> Result<(), String> + Send + Sync>>,
}

impl std::fmt::Debug for InMemoryHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryHost")
            .field("units", &self.units)
            .field("define_log", &self.define_log)
            .field("validator", &self.validator.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host whose format check is `validate`, on top of the built-in
    /// empty-buffer rejection.
    pub fn with_validator<F>(validate: F) -> Self
    where
        F: Fn(&[u8]) -> Result<(), String> + Send + Sync + 'static,
    {
        Self {
            validator: Some(Box::new(validate)),
            ..Self::default()
        }
    }

    /// Names in the order they were first defined.
    pub fn define_log(&self) -> Vec<String> {
        self.define_log.lock().clone()
    }

    /// How many times `name` was defined. The at-most-once guarantee means
    /// this is 0 or 1 for a correct caller population.
    pub fn define_count(&self, name: &str) -> usize {
        self.define_log
            .lock()
            .iter()
            .filter(|n| n.as_str() == name)
            .count()
    }

    pub fn defined_len(&self) -> usize {
        self.units.read().len()
    }

    fn check(&self, name: &UnitName, bytes: &[u8]) -> Result<(), LoadError> {
        if bytes.is_empty() {
            return Err(LoadError::MalformedArtifact {
                name: name.as_str().to_string(),
                detail: "empty buffer".to_string(),
            });
        }
        if let Some(validate) = &self.validator {
            validate(bytes).map_err(|detail| LoadError::MalformedArtifact {
                name: name.as_str().to_string(),
                detail,
            })?;
        }
        Ok(())
    }
}

impl HostRegistry for InMemoryHost {
    fn define(&self, name: &UnitName, bytes: &[u8]) -> Result<UnitHandle, LoadError> {
        if let Some(existing) = self.already_defined(name) {
            return Ok(existing);
        }
        self.check(name, bytes)?;
        let unit = UnitHandle::new(name.as_str(), bytes);
        match self.units.write().entry(name.as_str().to_string()) {
            // Lost a define race after the check: the first definition wins.
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                entry.insert(unit.clone());
                self.define_log.lock().push(name.as_str().to_string());
                debug!(unit = %name, len = bytes.len(), "defined");
                Ok(unit)
            }
        }
    }

    fn already_defined(&self, name: &UnitName) -> Option<UnitHandle> {
        self.units.read().get(name.as_str()).cloned()
    }
}
