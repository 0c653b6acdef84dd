//! JVM generic `Signature` attribute parsing (JVMS §4.7.9.1) and a loader that turns class,
//! method and field signatures into [`reify_types`] declarations.

#![forbid(unsafe_code)]

mod error;
mod loader;
mod parse;

pub use crate::error::{Result, SignatureError};
pub use crate::loader::{ClassDecl, SignatureLoader};
pub use crate::parse::{
    parse_class_signature, parse_field_signature, parse_method_signature, BaseType,
    ClassSignature, ClassTypeSignature, MethodSignature, SimpleClassTypeSignature, TypeArgument,
    TypeParameter, TypeSignature,
};
