//! Generation failures. All three are fatal: the run aborts and no partial
//! document is emitted, since a schema missing a definition is worse than no
//! schema.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The resolver cannot structurally decompose a type that resolution
    /// needs to descend into.
    #[error("cannot decompose type `{type_name}`: {reason}")]
    UnsupportedKind { type_name: String, reason: String },

    /// A reachable module has no package mapping and is not provided.
    #[error("no package mapping for module `{module}` (required by type `{type_name}`)")]
    UnmappedPackage { module: String, type_name: String },

    /// Ambiguous or contradictory configuration, detected by the upfront
    /// validation pass.
    #[error("configuration conflict: {reason}")]
    ConfigurationConflict { reason: String },
}

impl Error {
    pub(crate) fn conflict(reason: impl Into<String>) -> Self {
        Error::ConfigurationConflict {
            reason: reason.into(),
        }
    }
}
