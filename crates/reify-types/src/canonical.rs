use crate::{
    type_to_string, ClassId, ClassKind, GenericArrayType, GenericDeclId, ParameterizedType,
    Result, TypeEnv, TypeError, TypeExpr, WildcardType,
};

/// Rewrite `ty` into canonical form.
///
/// Raw array classes (`String[]`, `int[]`) become [`GenericArrayType`]s over their canonical
/// component; composite variants are rebuilt from canonical children. Variables and non-array
/// raw classes are returned as-is. Canonicalizing twice yields the same expression.
pub fn canonicalize(env: &dyn TypeEnv, ty: &TypeExpr) -> TypeExpr {
    match ty {
        TypeExpr::Raw(id) => match env.class(*id).map(|def| def.kind) {
            Some(ClassKind::Array { component }) => TypeExpr::GenericArray(GenericArrayType {
                component: Box::new(canonicalize(env, &TypeExpr::Raw(component))),
            }),
            _ => ty.clone(),
        },
        TypeExpr::Parameterized(p) => TypeExpr::Parameterized(ParameterizedType {
            owner: p
                .owner
                .as_deref()
                .map(|owner| Box::new(canonicalize(env, owner))),
            raw: p.raw,
            args: p.args.iter().map(|arg| canonicalize(env, arg)).collect(),
        }),
        TypeExpr::GenericArray(g) => TypeExpr::GenericArray(GenericArrayType {
            component: Box::new(canonicalize(env, &g.component)),
        }),
        TypeExpr::Wildcard(w) => TypeExpr::Wildcard(WildcardType {
            upper_bounds: w.upper_bounds.iter().map(|b| canonicalize(env, b)).collect(),
            lower_bounds: w.lower_bounds.iter().map(|b| canonicalize(env, b)).collect(),
        }),
        TypeExpr::Var(_) => ty.clone(),
    }
}

/// The erasure of a type expression: a class plus an array dimension count.
///
/// Array classes are described by their element class and dimensions rather than by id, so
/// erasing `T[][]` never needs to register a new array class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RawType {
    pub element: ClassId,
    pub dimensions: usize,
}

impl RawType {
    pub fn class(id: ClassId) -> Self {
        Self {
            element: id,
            dimensions: 0,
        }
    }

    pub fn is_array(&self) -> bool {
        self.dimensions > 0
    }

    /// The registered class id for this raw type, if every array level is registered.
    pub fn class_id(&self, env: &dyn TypeEnv) -> Option<ClassId> {
        let mut id = self.element;
        for _ in 0..self.dimensions {
            id = env.array_class(id)?;
        }
        Some(id)
    }

    fn of_class(env: &dyn TypeEnv, id: ClassId) -> Self {
        let mut raw = RawType::class(id);
        while let Some(ClassKind::Array { component }) =
            env.class(raw.element).map(|def| def.kind)
        {
            raw.element = component;
            raw.dimensions += 1;
        }
        raw
    }
}

/// Erase `ty` to its raw type.
///
/// Class-declared type variables erase to the top type (more general than necessary, but
/// always sound). Fails for variables declared by methods and for wildcards without an upper
/// bound.
pub fn raw_type_of(env: &dyn TypeEnv, ty: &TypeExpr) -> Result<RawType> {
    match ty {
        TypeExpr::Raw(id) => {
            ensure_registered(env, *id)?;
            Ok(RawType::of_class(env, *id))
        }
        TypeExpr::Parameterized(p) => {
            ensure_registered(env, p.raw)?;
            Ok(RawType::of_class(env, p.raw))
        }
        TypeExpr::GenericArray(g) => {
            let mut raw = raw_type_of(env, &g.component)?;
            raw.dimensions += 1;
            Ok(raw)
        }
        TypeExpr::Var(v) => match v.declared_by {
            GenericDeclId::Class(_) => Ok(RawType::class(env.well_known().object)),
            GenericDeclId::Method(_) => Err(TypeError::InvalidTypeExpression {
                expr: type_to_string(env, ty),
                reason: "type variable is not declared by a class",
            }),
        },
        TypeExpr::Wildcard(w) => match w.upper_bound() {
            Some(upper) => raw_type_of(env, upper),
            None => Err(TypeError::InvalidTypeExpression {
                expr: type_to_string(env, ty),
                reason: "wildcard has no upper bound",
            }),
        },
    }
}

/// The component type of a generic array or raw array class.
pub fn array_component_type(env: &dyn TypeEnv, ty: &TypeExpr) -> Result<TypeExpr> {
    match ty {
        TypeExpr::GenericArray(g) => Ok((*g.component).clone()),
        TypeExpr::Raw(id) => {
            let Some(def) = env.class(*id) else {
                return Err(unregistered(*id));
            };
            match def.kind {
                ClassKind::Array { component } => Ok(TypeExpr::Raw(component)),
                _ => Err(TypeError::NotAnArrayType {
                    expr: def.name.clone(),
                }),
            }
        }
        TypeExpr::Parameterized(_) | TypeExpr::Wildcard(_) | TypeExpr::Var(_) => {
            Err(TypeError::NotAnArrayType {
                expr: type_to_string(env, ty),
            })
        }
    }
}

fn ensure_registered(env: &dyn TypeEnv, id: ClassId) -> Result<()> {
    match env.class(id) {
        Some(_) => Ok(()),
        None => Err(unregistered(id)),
    }
}

fn unregistered(id: ClassId) -> TypeError {
    TypeError::UnsupportedTypeExpression {
        what: format!("class id {}", id.index()),
    }
}
