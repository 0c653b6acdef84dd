//! Java-like rendering of type expressions for diagnostics and logs.

use std::fmt;

use crate::{TypeEnv, TypeExpr};

/// Renders a [`TypeExpr`] using class names from `env`.
///
/// Unregistered class ids render as `<class#N>` rather than failing.
pub struct TypeDisplay<'a> {
    env: &'a dyn TypeEnv,
    ty: &'a TypeExpr,
}

impl<'a> TypeDisplay<'a> {
    pub fn new(env: &'a dyn TypeEnv, ty: &'a TypeExpr) -> Self {
        Self { env, ty }
    }

    fn nested<'b>(&'b self, ty: &'b TypeExpr) -> TypeDisplay<'b> {
        TypeDisplay { env: self.env, ty }
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty {
            TypeExpr::Raw(id) => match self.env.class(*id) {
                Some(def) => f.write_str(&def.name),
                None => write!(f, "<class#{}>", id.index()),
            },
            TypeExpr::Parameterized(p) => {
                write!(f, "{}", self.nested(&TypeExpr::Raw(p.raw)))?;
                if p.args.is_empty() {
                    return Ok(());
                }
                f.write_str("<")?;
                for (idx, arg) in p.args.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", self.nested(arg))?;
                }
                f.write_str(">")
            }
            TypeExpr::GenericArray(g) => write!(f, "{}[]", self.nested(&g.component)),
            TypeExpr::Wildcard(w) => {
                if let Some(lower) = w.lower_bound() {
                    return write!(f, "? super {}", self.nested(lower));
                }
                match w.upper_bound() {
                    Some(TypeExpr::Raw(id)) if *id == self.env.well_known().object => {
                        f.write_str("?")
                    }
                    Some(upper) => write!(f, "? extends {}", self.nested(upper)),
                    None => f.write_str("?"),
                }
            }
            TypeExpr::Var(v) => f.write_str(&v.name),
        }
    }
}

pub fn type_to_string(env: &dyn TypeEnv, ty: &TypeExpr) -> String {
    TypeDisplay::new(env, ty).to_string()
}
