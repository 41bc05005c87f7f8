//! Typed load errors.
//!
//! Precompiled and cached paths are optimizations: I/O-level failures in the
//! store or the fallback search path are downgraded to "absent" by their
//! components and never surface here. What does surface is terminal for one
//! `resolve` call.

/// Why a `resolve` call failed.
#[derive(Debug, Clone)]
pub enum LoadError {
    /// No resolution path produced a unit.
    NotFound {
        /// The unit name as originally requested.
        name: String,
        /// Human-readable diagnostic attached when the name matches a known
        /// needs-a-native-library pattern.
        hint: Option<String>,
    },

    /// The host rejected a buffer as malformed for its execution format.
    /// Store-path callers treat this as "absent" and fall through to live
    /// emission; it is never silently swallowed into a defined unit.
    MalformedArtifact {
        name: String,
        detail: String,
    },

    /// The Emitter failed to translate IR. Propagated unchanged, not retried.
    EmissionFailure {
        name: String,
        detail: String,
    },
}

impl LoadError {
    pub fn not_found(name: impl Into<String>) -> Self {
        LoadError::NotFound {
            name: name.into(),
            hint: None,
        }
    }

    /// The unit name the failure is about.
    pub fn unit_name(&self) -> &str {
        match self {
            LoadError::NotFound { name, .. }
            | LoadError::MalformedArtifact { name, .. }
            | LoadError::EmissionFailure { name, .. } => name,
        }
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::NotFound { name, hint } => {
                write!(f, "unit not found: {}", name)?;
                if let Some(hint) = hint {
                    write!(f, " ({})", hint)?;
                }
                Ok(())
            }
            LoadError::MalformedArtifact { name, detail } => {
                write!(f, "malformed artifact for {}: {}", name, detail)
            }
            LoadError::EmissionFailure { name, detail } => {
                write!(f, "emission failed for {}: {}", name, detail)
            }
        }
    }
}

impl std::error::Error for LoadError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_hint() {
        let err = LoadError::NotFound {
            name: "gfx.native.Canvas".to_string(),
            hint: Some("install the platform toolkit".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("gfx.native.Canvas"));
        assert!(msg.contains("install the platform toolkit"));
    }

    #[test]
    fn unit_name_accessor() {
        assert_eq!(LoadError::not_found("dyn.a.B").unit_name(), "dyn.a.B");
        let err = LoadError::EmissionFailure {
            name: "dyn.a.B".to_string(),
            detail: "bad ir".to_string(),
        };
        assert_eq!(err.unit_name(), "dyn.a.B");
    }
}
