/// Marshalling error returned by every encode/decode operation.
///
/// Nothing is retried or recovered internally: an entity or row either
/// converts fully or the call fails with one of these.
#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
    /// Neither a declared type nor a value was supplied.
    #[error("type and value are both missing")]
    MissingType,

    /// A value was supplied without a declared type.
    #[error("inconsistent input: {0}")]
    InconsistentInput(String),

    /// Decimal and Variant are recognized but not implemented.
    #[error("{0} type is not implemented")]
    UnsupportedType(&'static str),

    #[error("unknown primitive type id {0:#06x}")]
    UnknownPrimitiveKind(u16),

    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// Decoder got a value without a primitive slot.
    #[error("value has no primitive slot")]
    NotAPrimitiveValue,

    #[error("arity mismatch: expected {expected} elements, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("cannot derive a collection type from zero entities")]
    EmptyCollection,

    /// Native value shape does not fit the declared type.
    #[error("value mismatch: expected {expected}, got {actual}")]
    ValueMismatch { expected: &'static str, actual: String },

    #[error("invalid type syntax at offset {offset}: {message}")]
    TypeSyntax { offset: usize, message: String },

    /// Conversion between a native field and its JSON form failed.
    #[error("native conversion error: {0}")]
    Native(#[from] serde_json::Error),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<MarshalError>,
    },
}

impl MarshalError {
    pub fn value_mismatch(expected: &'static str, actual: &serde_json::Value) -> Self {
        let actual = match actual {
            serde_json::Value::Null => "null".to_string(),
            serde_json::Value::Bool(b) => format!("bool {b}"),
            serde_json::Value::Number(n) => format!("number {n}"),
            serde_json::Value::String(_) => "string".to_string(),
            serde_json::Value::Array(items) => format!("array of {}", items.len()),
            serde_json::Value::Object(map) => format!("object with {} keys", map.len()),
        };
        Self::ValueMismatch { expected, actual }
    }

    /// Add context to the error.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        Self::Context {
            context: ctx.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all context layers stripped.
    pub fn root(&self) -> &MarshalError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }
}
