use std::collections::HashSet;

use crate::expr::{subtype_of_unchecked, supertype_of_unchecked};
use crate::store::declared_raw;
use crate::{
    canonicalize, is_assignable_from, ClassDef, ClassId, ClassKind, GenericArrayType,
    ParameterizedType, Result, TypeDisplay, TypeEnv, TypeError, TypeExpr, TypeVariable,
};

/// Tuning knobs for [`Resolver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Maximum recursion depth for supertype searches and nested substitution. Hitting the
    /// limit degrades to "could not resolve further" instead of overflowing the stack.
    pub max_depth: usize,
}

impl ResolveOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 256;
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}

/// Finds generic supertypes and substitutes type variables relative to a context class.
///
/// Resolution never fails on an unresolvable variable: the variable (or the raw target class,
/// for supertype searches) is returned unchanged, and callers should treat it as "unknown".
#[derive(Clone, Copy)]
pub struct Resolver<'env> {
    env: &'env dyn TypeEnv,
    options: ResolveOptions,
}

impl<'env> Resolver<'env> {
    pub fn new(env: &'env dyn TypeEnv) -> Self {
        Self::with_options(env, ResolveOptions::default())
    }

    pub fn with_options(env: &'env dyn TypeEnv, options: ResolveOptions) -> Self {
        Self { env, options }
    }

    pub fn env(&self) -> &'env dyn TypeEnv {
        self.env
    }

    pub fn options(&self) -> ResolveOptions {
        self.options
    }

    /// The generic form in which `target` appears among the supertypes of `context_raw`.
    ///
    /// `context` is the type expression known for `context_raw` (often just `Raw(context_raw)`).
    /// Directly implemented interfaces are searched before the superclass chain, and an exact
    /// match wins over descending into an assignable ancestor. The result is expressed in the
    /// type variables of whichever class declared that supertype; pass it to
    /// [`Resolver::resolve`] to substitute them.
    ///
    /// Returns `Raw(target)` when `target` is not an ancestor.
    pub fn generic_supertype(
        &self,
        context: &TypeExpr,
        context_raw: ClassId,
        target: ClassId,
    ) -> TypeExpr {
        let mut visited = HashSet::new();
        self.generic_supertype_inner(context, context_raw, target, &mut visited, 0)
    }

    fn generic_supertype_inner(
        &self,
        context: &TypeExpr,
        raw: ClassId,
        target: ClassId,
        visited: &mut HashSet<ClassId>,
        depth: usize,
    ) -> TypeExpr {
        if raw == target {
            return context.clone();
        }
        if depth >= self.options.max_depth {
            tracing::warn!(
                target: "reify.resolve",
                max_depth = self.options.max_depth,
                "supertype search exceeded depth limit"
            );
            return TypeExpr::Raw(target);
        }

        let env = self.env;
        let Some(raw_def) = env.class(raw) else {
            return TypeExpr::Raw(target);
        };
        visited.insert(raw);

        if env.class(target).is_some_and(ClassDef::is_interface) {
            for iface in &raw_def.interfaces {
                let Some(iface_raw) = declared_raw(iface) else {
                    continue;
                };
                if iface_raw == target {
                    return iface.clone();
                }
                if !is_assignable_from(env, target, iface_raw) {
                    continue;
                }
                if visited.contains(&iface_raw) {
                    tracing::warn!(
                        target: "reify.resolve",
                        class = %TypeDisplay::new(env, &TypeExpr::Raw(iface_raw)),
                        "cyclic interface inheritance"
                    );
                    continue;
                }
                tracing::trace!(
                    target: "reify.resolve",
                    via = %TypeDisplay::new(env, iface),
                    "descending into interface"
                );
                return self.generic_supertype_inner(iface, iface_raw, target, visited, depth + 1);
            }
        }

        if !raw_def.is_interface() {
            let object = env.well_known().object;
            let mut current = raw;
            while current != object {
                let Some(super_ty) = env.class(current).and_then(|def| def.super_class.as_ref())
                else {
                    break;
                };
                let Some(super_raw) = declared_raw(super_ty) else {
                    break;
                };
                if super_raw == target {
                    return super_ty.clone();
                }
                if is_assignable_from(env, target, super_raw) {
                    if visited.contains(&super_raw) {
                        break;
                    }
                    tracing::trace!(
                        target: "reify.resolve",
                        via = %TypeDisplay::new(env, super_ty),
                        "descending into superclass"
                    );
                    return self.generic_supertype_inner(
                        super_ty,
                        super_raw,
                        target,
                        visited,
                        depth + 1,
                    );
                }
                if !visited.insert(super_raw) {
                    tracing::warn!(
                        target: "reify.resolve",
                        class = %TypeDisplay::new(env, super_ty),
                        "cyclic superclass chain"
                    );
                    break;
                }
                current = super_raw;
            }
        }

        TypeExpr::Raw(target)
    }

    /// `generic_supertype` followed by [`Resolver::resolve`], after checking that `supertype`
    /// really is an ancestor of `context_raw`.
    pub fn supertype(
        &self,
        context: &TypeExpr,
        context_raw: ClassId,
        supertype: ClassId,
    ) -> Result<TypeExpr> {
        if !is_assignable_from(self.env, supertype, context_raw) {
            return Err(TypeError::NotASupertype {
                supertype: TypeDisplay::new(self.env, &TypeExpr::Raw(supertype)).to_string(),
                subtype: TypeDisplay::new(self.env, &TypeExpr::Raw(context_raw)).to_string(),
            });
        }
        Ok(self.resolved_supertype(context, context_raw, supertype))
    }

    /// Like [`Resolver::supertype`] without the ancestry check; a non-ancestor yields
    /// `Raw(supertype)`.
    pub(crate) fn resolved_supertype(
        &self,
        context: &TypeExpr,
        context_raw: ClassId,
        supertype: ClassId,
    ) -> TypeExpr {
        let generic = self.generic_supertype(context, context_raw, supertype);
        self.resolve(context, context_raw, &generic)
    }

    /// Substitute the type variables in `ty` using the generic ancestry of `context_raw`.
    ///
    /// Sub-expressions are only rebuilt when something inside them changed. Variables declared
    /// by methods, and variables whose declaring class is reached only through raw supertypes,
    /// are left as they are.
    pub fn resolve(&self, context: &TypeExpr, context_raw: ClassId, ty: &TypeExpr) -> TypeExpr {
        self.resolve_inner(context, context_raw, ty, 0)
            .unwrap_or_else(|| ty.clone())
    }

    /// `None` means `ty` is unchanged.
    fn resolve_inner(
        &self,
        context: &TypeExpr,
        raw: ClassId,
        ty: &TypeExpr,
        depth: usize,
    ) -> Option<TypeExpr> {
        if depth >= self.options.max_depth {
            tracing::warn!(
                target: "reify.resolve",
                max_depth = self.options.max_depth,
                "type resolution exceeded depth limit"
            );
            return None;
        }

        let env = self.env;
        match ty {
            TypeExpr::Var(var) => self.resolve_var(context, raw, var, depth),
            TypeExpr::Raw(id) => {
                let ClassKind::Array { component } = env.class(*id)?.kind else {
                    return None;
                };
                let resolved =
                    self.resolve_inner(context, raw, &TypeExpr::Raw(component), depth + 1)?;
                Some(self.generic_array(&resolved))
            }
            TypeExpr::GenericArray(g) => {
                let resolved = self.resolve_inner(context, raw, &g.component, depth + 1)?;
                Some(self.generic_array(&resolved))
            }
            TypeExpr::Parameterized(p) => {
                let owner = p
                    .owner
                    .as_deref()
                    .and_then(|owner| self.resolve_inner(context, raw, owner, depth + 1));
                let args: Vec<Option<TypeExpr>> = p
                    .args
                    .iter()
                    .map(|arg| self.resolve_inner(context, raw, arg, depth + 1))
                    .collect();
                if owner.is_none() && args.iter().all(Option::is_none) {
                    return None;
                }

                let owner = owner.or_else(|| p.owner.as_deref().cloned());
                Some(TypeExpr::Parameterized(ParameterizedType {
                    owner: owner.map(|owner| Box::new(canonicalize(env, &owner))),
                    raw: p.raw,
                    args: args
                        .iter()
                        .zip(&p.args)
                        .map(|(new, old)| canonicalize(env, new.as_ref().unwrap_or(old)))
                        .collect(),
                }))
            }
            TypeExpr::Wildcard(w) => {
                // Only one side of a wildcard is ever bounded; never touch both.
                if let [lower] = w.lower_bounds.as_slice() {
                    let resolved = self.resolve_inner(context, raw, lower, depth + 1)?;
                    return Some(supertype_of_unchecked(env, &resolved));
                }
                if let [upper] = w.upper_bounds.as_slice() {
                    let resolved = self.resolve_inner(context, raw, upper, depth + 1)?;
                    return Some(subtype_of_unchecked(env, &resolved));
                }
                None
            }
        }
    }

    /// Substitute `var` repeatedly until it stops reducing.
    ///
    /// A variable can resolve to another variable declared further down the hierarchy
    /// (`class B<U> extends A<U>`), which is then resolved in turn. A non-variable result is
    /// resolved recursively so variables nested inside it are substituted too.
    fn resolve_var(
        &self,
        context: &TypeExpr,
        raw: ClassId,
        var: &TypeVariable,
        depth: usize,
    ) -> Option<TypeExpr> {
        let mut current = var.clone();
        let mut seen: HashSet<TypeVariable> = HashSet::new();
        loop {
            seen.insert(current.clone());
            let Some(resolved) = self.resolve_type_variable(context, raw, &current) else {
                break;
            };
            match resolved {
                TypeExpr::Var(next) => {
                    if seen.contains(&next) {
                        tracing::warn!(
                            target: "reify.resolve",
                            variable = %next.name,
                            "type variable substitution cycle"
                        );
                        break;
                    }
                    current = next;
                }
                other => {
                    let nested = self.resolve_inner(context, raw, &other, depth + 1);
                    return Some(nested.unwrap_or(other));
                }
            }
        }

        (current != *var).then_some(TypeExpr::Var(current))
    }

    /// One substitution step: the type argument bound to `var` in the generic supertype of
    /// `context_raw` that corresponds to `var`'s declaring class.
    fn resolve_type_variable(
        &self,
        context: &TypeExpr,
        raw: ClassId,
        var: &TypeVariable,
    ) -> Option<TypeExpr> {
        let env = self.env;
        let Some(declaring) = var.declared_by.as_class() else {
            tracing::debug!(
                target: "reify.resolve",
                variable = %var.name,
                "type variable is not declared by a class; leaving it unresolved"
            );
            return None;
        };

        let declared_by = self.generic_supertype(context, raw, declaring);
        let TypeExpr::Parameterized(p) = &declared_by else {
            tracing::debug!(
                target: "reify.resolve",
                variable = %var.name,
                declared_by = %TypeDisplay::new(env, &declared_by),
                "declaring class is not parameterized in this context"
            );
            return None;
        };
        let Some(index) = env
            .class(declaring)
            .and_then(|def| def.type_param_index(&var.name))
        else {
            tracing::debug!(
                target: "reify.resolve",
                variable = %var.name,
                "type variable is not declared by its declaring class"
            );
            return None;
        };
        let arg = p.args.get(index)?;
        if matches!(arg, TypeExpr::Var(v) if v == var) {
            return None;
        }

        tracing::trace!(
            target: "reify.resolve",
            variable = %var.name,
            resolved = %TypeDisplay::new(env, arg),
            "substituted type variable"
        );
        Some(arg.clone())
    }

    fn generic_array(&self, component: &TypeExpr) -> TypeExpr {
        TypeExpr::GenericArray(GenericArrayType {
            component: Box::new(canonicalize(self.env, component)),
        })
    }
}

/// [`Resolver::generic_supertype`] with default options.
pub fn generic_supertype(
    env: &dyn TypeEnv,
    context: &TypeExpr,
    context_raw: ClassId,
    target: ClassId,
) -> TypeExpr {
    Resolver::new(env).generic_supertype(context, context_raw, target)
}

/// [`Resolver::supertype`] with default options.
pub fn supertype(
    env: &dyn TypeEnv,
    context: &TypeExpr,
    context_raw: ClassId,
    supertype: ClassId,
) -> Result<TypeExpr> {
    Resolver::new(env).supertype(context, context_raw, supertype)
}

/// [`Resolver::resolve`] with default options.
pub fn resolve(
    env: &dyn TypeEnv,
    context: &TypeExpr,
    context_raw: ClassId,
    ty: &TypeExpr,
) -> TypeExpr {
    Resolver::new(env).resolve(context, context_raw, ty)
}
