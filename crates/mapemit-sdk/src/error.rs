//! Error types for the MapEmit object model

/// Result type for runtime operations on objects
pub type FaultResult<T> = Result<T, Fault>;

/// Runtime failure raised by constructors, accessors and conversions
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Fault {
    /// Value has the wrong type for the target
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// Member access through a null reference
    #[error("Null reference: {0}")]
    NullReference(String),

    /// Value could not be converted
    #[error("Cannot convert {value} to {target}")]
    Conversion {
        /// Rendered source value
        value: String,
        /// Target type name
        target: String,
    },

    /// Field, property, constructor or static not found
    #[error("Type '{ty}' has no member '{member}'")]
    MissingMember {
        /// Type name
        ty: String,
        /// Member name
        member: String,
    },

    /// Accessor is declared but has no body
    #[error("Member '{member}' of type '{ty}' is abstract")]
    AbstractMember {
        /// Type name
        ty: String,
        /// Member name
        member: String,
    },

    /// Attempt to instantiate an abstract or non-class type
    #[error("Cannot create an instance of '{0}'")]
    AbstractInstantiation(String),

    /// Field slot out of range
    #[error("Field index {index} out of range for type '{ty}'")]
    FieldIndex {
        /// Type name
        ty: String,
        /// Requested slot
        index: usize,
    },

    /// Reading the value of a wrapper holding its null sentinel
    #[error("Data is Null: {0}")]
    NullValue(String),

    /// Failure raised by user code
    #[error("{0}")]
    Thrown(String),

    /// User code panicked
    #[error("Panicked: {0}")]
    Panic(String),
}

impl From<String> for Fault {
    fn from(s: String) -> Self {
        Fault::Thrown(s)
    }
}

impl From<&str> for Fault {
    fn from(s: &str) -> Self {
        Fault::Thrown(s.to_string())
    }
}

/// Definition-time errors raised while building type descriptors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Two fields share a name within one layout
    #[error("Duplicate field '{field}' in type '{ty}'")]
    DuplicateField {
        /// Type name
        ty: String,
        /// Field name
        field: String,
    },

    /// Two properties share a name on one class
    #[error("Duplicate property '{property}' in type '{ty}'")]
    DuplicateProperty {
        /// Type name
        ty: String,
        /// Property name
        property: String,
    },

    /// Two constructors share a parameter list
    #[error("Duplicate constructor ({signature}) in type '{ty}'")]
    DuplicateConstructor {
        /// Type name
        ty: String,
        /// Rendered parameter list
        signature: String,
    },

    /// Base type is not an inheritable class
    #[error("Type '{ty}' cannot extend '{base}'")]
    InvalidBase {
        /// Type name
        ty: String,
        /// Base type name
        base: String,
    },

    /// Malformed definition
    #[error("Invalid definition of '{ty}': {reason}")]
    Invalid {
        /// Type name
        ty: String,
        /// Reason
        reason: String,
    },
}
