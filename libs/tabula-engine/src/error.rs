use tabula_api::error::MarshalError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("marshal error: {0}")]
    Marshal(#[from] MarshalError),

    #[error("entity not registered: {0}")]
    EntityNotFound(String),

    #[error("entity registered twice: {0}")]
    DuplicateEntity(String),
}

impl EngineError {
    /// Add context to the error.
    ///
    /// For `Marshal` variant, context is added to the inner `MarshalError`.
    /// For other variants, context is prepended to the message.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Marshal(e) => EngineError::Marshal(e.with_context(ctx)),
            EngineError::Config(msg) => EngineError::Config(format!("{ctx}: {msg}")),
            EngineError::EntityNotFound(msg) => EngineError::EntityNotFound(format!("{ctx}: {msg}")),
            other => other,
        }
    }
}
