use crate::{is_assignable_from, ClassId, Resolver, TypeEnv, TypeExpr};

/// Element type of a collection type, viewed through `java.util.Collection<E>`.
///
/// Returns the top type when the element type cannot be determined (raw usage, or a context
/// that is not a collection at all).
pub fn collection_element_type(
    env: &dyn TypeEnv,
    context: &TypeExpr,
    context_raw: ClassId,
) -> TypeExpr {
    Resolver::new(env).collection_element_type(context, context_raw)
}

/// Key and value types of a map type, viewed through `java.util.Map<K, V>`.
///
/// `java.util.Properties` (and its subclasses) always report `(String, String)`: the class is
/// declared as `Hashtable<Object, Object>` but only ever holds strings.
pub fn map_key_value_types(
    env: &dyn TypeEnv,
    context: &TypeExpr,
    context_raw: ClassId,
) -> (TypeExpr, TypeExpr) {
    Resolver::new(env).map_key_value_types(context, context_raw)
}

impl Resolver<'_> {
    pub fn collection_element_type(&self, context: &TypeExpr, context_raw: ClassId) -> TypeExpr {
        let wk = self.env().well_known();
        let mut collection = self.resolved_supertype(context, context_raw, wk.collection);

        if let TypeExpr::Wildcard(w) = &collection {
            if let Some(upper) = w.upper_bound() {
                collection = upper.clone();
            }
        }
        match collection {
            TypeExpr::Parameterized(mut p) if p.args.len() == 1 => p.args.swap_remove(0),
            _ => TypeExpr::Raw(wk.object),
        }
    }

    pub fn map_key_value_types(
        &self,
        context: &TypeExpr,
        context_raw: ClassId,
    ) -> (TypeExpr, TypeExpr) {
        let env = self.env();
        let wk = env.well_known();
        if is_assignable_from(env, wk.properties, context_raw) {
            let string = TypeExpr::Raw(wk.string);
            return (string.clone(), string);
        }

        match self.resolved_supertype(context, context_raw, wk.map) {
            TypeExpr::Parameterized(p) if p.args.len() == 2 => {
                let mut args = p.args.into_iter();
                match (args.next(), args.next()) {
                    (Some(key), Some(value)) => (key, value),
                    _ => (TypeExpr::Raw(wk.object), TypeExpr::Raw(wk.object)),
                }
            }
            _ => (TypeExpr::Raw(wk.object), TypeExpr::Raw(wk.object)),
        }
    }
}
