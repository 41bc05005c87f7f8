//! Unit naming conventions.
//!
//! Every loadable unit is identified by a dotted name. Names under the
//! reserved `dyn.` namespace belong to this subsystem and decompose as
//! `dyn.<module>.<member>`; everything else is delegated to the fallback
//! search path.

use std::fmt;

/// Reserved namespace prefix for units owned by this subsystem.
pub const NAMESPACE_PREFIX: &str = "dyn.";

/// Conventional member name of a module's shared constant/metadata artifact.
pub const METADATA_MEMBER: &str = "$Module";

/// Suffix conventions denoting companion units that cannot be loaded on
/// their own: their materialization is a side effect of materializing the
/// primary member they are named after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanionKind {
    /// Behavior-body companion (`Foo$`): must not be defined before the
    /// interface-like primary `Foo`.
    BehaviorBody,
    /// Error-value companion (`Foo$Val`), same ordering requirement.
    ErrorValue,
}

impl CompanionKind {
    pub fn marker(&self) -> &'static str {
        match self {
            CompanionKind::BehaviorBody => "$",
            CompanionKind::ErrorValue => "$Val",
        }
    }
}

/// A dotted name identifying one loadable unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitName(String);

impl UnitName {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self(name.into())
    }

    /// Build the namespaced name of a module member: `dyn.<module>.<member>`.
    pub fn for_member(module: &str, member: &str) -> Self {
        Self(format!("{}{}.{}", NAMESPACE_PREFIX, module, member))
    }

    /// Build the namespaced name of a module's metadata artifact.
    pub fn module_metadata(module: &str) -> Self {
        Self::for_member(module, METADATA_MEMBER)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this name falls under the reserved `dyn.` namespace.
    pub fn is_namespaced(&self) -> bool {
        self.0.starts_with(NAMESPACE_PREFIX)
    }

    /// Decompose a namespaced name into `(module, member)`.
    ///
    /// The module is everything up to the first dot after the prefix; the
    /// member is the rest. Returns `None` for non-namespaced names and for
    /// degenerate names with an empty module or member.
    pub fn split(&self) -> Option<NamespacedName<'_>> {
        let rest = self.0.strip_prefix(NAMESPACE_PREFIX)?;
        let dot = rest.find('.')?;
        let (module, member) = (&rest[..dot], &rest[dot + 1..]);
        if module.is_empty() || member.is_empty() {
            return None;
        }
        Some(NamespacedName { module, member })
    }
}

impl fmt::Display for UnitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UnitName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The `(module, member)` view of a name under the reserved namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespacedName<'a> {
    pub module: &'a str,
    pub member: &'a str,
}

impl NamespacedName<'_> {
    /// Whether the member denotes the module's metadata artifact.
    pub fn is_metadata(&self) -> bool {
        self.member == METADATA_MEMBER
    }

    /// If the member carries a companion marker, the primary member name it
    /// strips down to and the companion kind. The longer `$Val` marker is
    /// tested first so `Foo$Val` is an error-value companion, not a
    /// behavior body named `Foo$Va`.
    pub fn companion(&self) -> Option<(&str, CompanionKind)> {
        if self.is_metadata() {
            return None;
        }
        if let Some(primary) = self.member.strip_suffix("$Val") {
            if !primary.is_empty() {
                return Some((primary, CompanionKind::ErrorValue));
            }
        }
        if let Some(primary) = self.member.strip_suffix('$') {
            if !primary.is_empty() {
                return Some((primary, CompanionKind::BehaviorBody));
            }
        }
        None
    }
}
