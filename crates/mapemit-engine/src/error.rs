//! Errors raised while synthesizing types and descriptors
//!
//! These are configuration errors: they surface synchronously from
//! [`MapRegistry::descriptor`](crate::MapRegistry::descriptor) and name the
//! offending type and member. Failures while *creating instances* are not
//! errors of this kind; they are reported through the exception handler.

use mapemit_sdk::ModelError;

/// Synthesis and configuration errors
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// `MapType` overrides exist but none has a usable value member
    #[error(
        "The '{field_type}' type does not have appropriate setter or getter member. \
         See '{property}' member of '{owner}' type."
    )]
    MissingValueMember {
        /// Last override tried
        field_type: String,
        /// Property carrying the overrides
        property: String,
        /// Type being synthesized
        owner: String,
    },

    /// A field needs default construction but its type has no public default constructor
    #[error("The '{0}' type has to have public default constructor.")]
    MissingDefaultConstructor(String),

    /// The property declares a setter but the wrapper's value member cannot be written
    #[error(
        "The '{member}' member of '{wrapper}' type is read-only. \
         See '{property}' member of '{owner}' type."
    )]
    ReadOnlyValueMember {
        /// Wrapper type
        wrapper: String,
        /// Resolved value member
        member: String,
        /// Property declaring the setter
        property: String,
        /// Type being synthesized
        owner: String,
    },

    /// A constructor required by a member mapper is missing
    #[error("The '{ty}' type has to have a ({signature}) constructor.")]
    MissingConstructor {
        /// Type lacking the constructor
        ty: String,
        /// Rendered parameter list
        signature: String,
    },

    /// Named member does not exist
    #[error("The '{ty}' type does not have '{member}' member.")]
    MissingMember {
        /// Type name
        ty: String,
        /// Member name
        member: String,
    },

    /// Descriptors exist only for classes
    #[error("The '{0}' type is not a class.")]
    NotAClass(String),

    /// The metadata provider does not map this type
    #[error("The '{0}' type is not mapped.")]
    NotMapped(String),

    /// A type needed itself while it was being synthesized
    #[error("The '{0}' type requires its own descriptor while being synthesized.")]
    CyclicSynthesis(String),

    /// Type model error
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Invalid options
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML options
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Debug dump serialization failed
    #[error("Failed to serialize dump: {0}")]
    Json(#[from] serde_json::Error),
}
