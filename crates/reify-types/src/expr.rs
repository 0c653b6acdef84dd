use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::{canonicalize, ClassId, ClassKind, GenericDeclId, Result, TypeEnv, TypeError};

/// A type expression.
///
/// The algebra is closed: consumers are expected to match all five variants. Derived equality and
/// hashing are structural (see [`types_equal`] and [`hash_of`]).
///
/// Values can be built directly from their public parts (this is how class metadata describes
/// declared supertypes, which may still contain raw array classes), or through the checked
/// constructors on this type, which validate their inputs and canonicalize sub-expressions.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// A concrete, non-generic class, or a generic class used without arguments.
    Raw(ClassId),
    Parameterized(ParameterizedType),
    GenericArray(GenericArrayType),
    Wildcard(WildcardType),
    Var(TypeVariable),
}

/// `Owner.Raw<Args...>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParameterizedType {
    /// Only present for nested generic classes.
    pub owner: Option<Box<TypeExpr>>,
    pub raw: ClassId,
    pub args: Vec<TypeExpr>,
}

/// `Component[]` where the component is generic or unresolved.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenericArrayType {
    pub component: Box<TypeExpr>,
}

/// `?`, `? extends Upper` or `? super Lower`.
///
/// Well-formed wildcards have exactly one upper bound and at most one lower bound; when a lower
/// bound is present the upper bound is the top type. The bounds are kept as lists so equality
/// compares them as ordered sequences.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WildcardType {
    pub upper_bounds: Vec<TypeExpr>,
    pub lower_bounds: Vec<TypeExpr>,
}

/// A named type parameter, identified by its name and declaring entity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeVariable {
    pub name: String,
    pub declared_by: GenericDeclId,
}

impl TypeExpr {
    pub fn raw(id: ClassId) -> Self {
        TypeExpr::Raw(id)
    }

    pub fn var(name: impl Into<String>, declared_by: GenericDeclId) -> Self {
        TypeExpr::Var(TypeVariable {
            name: name.into(),
            declared_by,
        })
    }

    /// `raw<args>` for a top-level or static nested class.
    pub fn parameterized(env: &dyn TypeEnv, raw: ClassId, args: Vec<TypeExpr>) -> Result<Self> {
        Self::parameterized_with_owner(env, None, raw, args)
    }

    /// `owner.raw<args>`.
    ///
    /// Fails if any argument is a primitive, if `raw` is not registered, or if `raw` is a
    /// non-static nested class and no owner was supplied.
    pub fn parameterized_with_owner(
        env: &dyn TypeEnv,
        owner: Option<TypeExpr>,
        raw: ClassId,
        args: Vec<TypeExpr>,
    ) -> Result<Self> {
        let Some(def) = env.class(raw) else {
            return Err(TypeError::UnsupportedTypeExpression {
                what: format!("class id {}", raw.index()),
            });
        };
        if owner.is_none() && def.outer.is_some() && !def.is_static {
            return Err(TypeError::MissingOwnerType {
                class: def.name.clone(),
            });
        }
        for arg in &args {
            check_not_primitive(env, arg)?;
        }

        Ok(TypeExpr::Parameterized(ParameterizedType {
            owner: owner.map(|owner| Box::new(canonicalize(env, &owner))),
            raw,
            args: args.iter().map(|arg| canonicalize(env, arg)).collect(),
        }))
    }

    /// An array whose elements are `component`.
    ///
    /// A raw component with a registered array class collapses to that raw array class;
    /// everything else becomes a [`GenericArrayType`].
    pub fn array_of(env: &dyn TypeEnv, component: TypeExpr) -> Self {
        if let TypeExpr::Raw(id) = component {
            if let Some(array) = env.array_class(id) {
                return TypeExpr::Raw(array);
            }
        }
        TypeExpr::GenericArray(GenericArrayType {
            component: Box::new(canonicalize(env, &component)),
        })
    }

    /// `? extends bound`. With the top type as bound this is the unbounded wildcard `?`.
    pub fn subtype_of(env: &dyn TypeEnv, bound: TypeExpr) -> Result<Self> {
        check_not_primitive(env, &bound)?;
        Ok(subtype_of_unchecked(env, &bound))
    }

    /// `? super bound`.
    pub fn supertype_of(env: &dyn TypeEnv, bound: TypeExpr) -> Result<Self> {
        check_not_primitive(env, &bound)?;
        Ok(supertype_of_unchecked(env, &bound))
    }

    /// `?`
    pub fn unbounded_wildcard(env: &dyn TypeEnv) -> Self {
        subtype_of_unchecked(env, &TypeExpr::Raw(env.well_known().object))
    }

    pub fn as_raw(&self) -> Option<ClassId> {
        match self {
            TypeExpr::Raw(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_parameterized(&self) -> Option<&ParameterizedType> {
        match self {
            TypeExpr::Parameterized(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_var(&self) -> Option<&TypeVariable> {
        match self {
            TypeExpr::Var(v) => Some(v),
            _ => None,
        }
    }
}

impl WildcardType {
    pub fn upper_bound(&self) -> Option<&TypeExpr> {
        self.upper_bounds.first()
    }

    pub fn lower_bound(&self) -> Option<&TypeExpr> {
        self.lower_bounds.first()
    }
}

pub(crate) fn subtype_of_unchecked(env: &dyn TypeEnv, bound: &TypeExpr) -> TypeExpr {
    TypeExpr::Wildcard(WildcardType {
        upper_bounds: vec![canonicalize(env, bound)],
        lower_bounds: Vec::new(),
    })
}

pub(crate) fn supertype_of_unchecked(env: &dyn TypeEnv, bound: &TypeExpr) -> TypeExpr {
    TypeExpr::Wildcard(WildcardType {
        upper_bounds: vec![TypeExpr::Raw(env.well_known().object)],
        lower_bounds: vec![canonicalize(env, bound)],
    })
}

fn check_not_primitive(env: &dyn TypeEnv, ty: &TypeExpr) -> Result<()> {
    let TypeExpr::Raw(id) = ty else {
        return Ok(());
    };
    match env.class(*id) {
        Some(def) if def.kind == ClassKind::Primitive => Err(TypeError::InvalidTypeArguments {
            name: def.name.clone(),
        }),
        _ => Ok(()),
    }
}

/// Structural equality of two type expressions.
///
/// Raw types compare by class identity, variables by declaring entity and name, and composite
/// variants component-wise. Expressions of different variants are never equal, so callers that
/// want `String[]` (a raw array class) to equal `GenericArray(String)` must canonicalize first.
pub fn types_equal(a: &TypeExpr, b: &TypeExpr) -> bool {
    a == b
}

/// Hash consistent with [`types_equal`].
///
/// Computed compositionally from the variant tag and the children's hashes; stable across runs
/// for the same ids.
pub fn hash_of(ty: &TypeExpr) -> u64 {
    let mut hasher = FxHasher::default();
    ty.hash(&mut hasher);
    hasher.finish()
}
