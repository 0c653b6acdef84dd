//! Runtime descriptors for Java-style generic types.
//!
//! A [`TypeExpr`] is one of five variants (raw, parameterized, generic array, wildcard and
//! type variable). Class metadata lives in a separately owned registry ([`TypeStore`], viewed
//! through [`TypeEnv`]); type expressions only hold ids into it.
//!
//! The interesting entry points are [`resolve`] and [`generic_supertype`], which answer
//! questions like "what is `T` when viewed from `StringBox extends Box<String>`", and the
//! derived [`collection_element_type`] / [`map_key_value_types`] helpers used by reflective
//! object mappers.

#![forbid(unsafe_code)]

mod canonical;
mod collections;
mod error;
mod expr;
mod format;
mod ids;
mod resolve;
mod store;

pub use crate::canonical::{array_component_type, canonicalize, raw_type_of, RawType};
pub use crate::collections::{collection_element_type, map_key_value_types};
pub use crate::error::{Result, TypeError};
pub use crate::expr::{
    hash_of, types_equal, GenericArrayType, ParameterizedType, TypeExpr, TypeVariable,
    WildcardType,
};
pub use crate::format::{type_to_string, TypeDisplay};
pub use crate::ids::{ClassId, GenericDeclId, MethodId};
pub use crate::resolve::{generic_supertype, resolve, supertype, ResolveOptions, Resolver};
pub use crate::store::{
    is_assignable_from, ClassDef, ClassKind, MethodDef, TypeEnv, TypeParamDef, TypeStore,
    WellKnownTypes,
};
