use reify_types::TypeError;

pub type Result<T> = std::result::Result<T, SignatureError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid signature `{signature}` at offset {offset}: {message}")]
    Invalid {
        signature: String,
        offset: usize,
        message: &'static str,
    },

    #[error("unknown type variable `{name}`")]
    UnknownTypeVariable { name: String },

    #[error("unknown {what}")]
    UnknownDeclaration { what: String },

    #[error(transparent)]
    Type(#[from] TypeError),
}
