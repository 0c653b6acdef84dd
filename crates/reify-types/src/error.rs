pub type Result<T> = std::result::Result<T, TypeError>;

/// Contract violations detected by the type engine.
///
/// None of these are transient: they all mean the caller handed over a malformed descriptor.
/// Failing to fully resolve a type variable is *not* an error; the resolver returns the variable
/// unchanged instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("primitive type `{name}` cannot be used as a type argument or wildcard bound")]
    InvalidTypeArguments { name: String },

    #[error("cannot compute a raw type for `{expr}`: {reason}")]
    InvalidTypeExpression { expr: String, reason: &'static str },

    #[error("expected an array type, found `{expr}`")]
    NotAnArrayType { expr: String },

    #[error("type expression refers to an unregistered {what}")]
    UnsupportedTypeExpression { what: String },

    #[error("`{class}` is a non-static nested class and requires an owner type")]
    MissingOwnerType { class: String },

    #[error("`{supertype}` is not a supertype of `{subtype}`")]
    NotASupertype { supertype: String, subtype: String },
}
