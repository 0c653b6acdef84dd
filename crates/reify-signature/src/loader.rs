use reify_types::{
    ClassDef, ClassId, ClassKind, GenericDeclId, MethodDef, MethodId, TypeEnv, TypeExpr,
    TypeParamDef, TypeStore,
};

use crate::error::{Result, SignatureError};
use crate::parse::{
    parse_class_signature, parse_field_signature, parse_method_signature, ClassSignature,
    ClassTypeSignature, TypeArgument, TypeParameter, TypeSignature,
};

/// What the loader needs to know about a class besides its `Signature` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassDecl<'a> {
    /// Binary name, `java.util.Map$Entry`.
    pub name: &'a str,
    pub kind: ClassKind,
    /// A class signature. For non-generic classes this is just the superclass and interface
    /// descriptors, e.g. `Ljava/lang/Object;Ljava/io/Serializable;`.
    pub signature: &'a str,
    pub outer: Option<ClassId>,
    pub is_static: bool,
}

impl<'a> ClassDecl<'a> {
    pub fn new(name: &'a str, kind: ClassKind, signature: &'a str) -> Self {
        Self {
            name,
            kind,
            signature,
            outer: None,
            is_static: false,
        }
    }

    pub fn nested_in(mut self, outer: ClassId, is_static: bool) -> Self {
        self.outer = Some(outer);
        self.is_static = is_static;
        self
    }
}

/// Generic declarations visible while converting one signature, innermost first.
#[derive(Clone, Copy)]
struct Scope {
    method: Option<MethodId>,
    class: Option<ClassId>,
}

/// Populates a [`TypeStore`] from JVM generic signatures.
///
/// Classes referenced before they are loaded get placeholder ids; loading them later fills the
/// placeholder in.
pub struct SignatureLoader<'a> {
    store: &'a mut TypeStore,
}

impl<'a> SignatureLoader<'a> {
    pub fn new(store: &'a mut TypeStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &TypeStore {
        self.store
    }

    /// Defines `decl` from its signature.
    ///
    /// On error the class keeps whatever definition it had before the call.
    pub fn load_class(&mut self, decl: ClassDecl<'_>) -> Result<ClassId> {
        let sig = parse_class_signature(decl.signature)?;
        let id = self.store.intern_class_id(decl.name);
        let previous = self.store.class(id).cloned();

        match self.define_from_signature(id, &decl, &sig) {
            Ok(def) => {
                tracing::debug!(
                    target: "reify.signature",
                    class = decl.name,
                    type_params = def.type_params.len(),
                    "loaded class"
                );
                self.store.define_class(id, def);
                Ok(id)
            }
            Err(err) => {
                if let Some(previous) = previous {
                    self.store.define_class(id, previous);
                }
                Err(err)
            }
        }
    }

    fn define_from_signature(
        &mut self,
        id: ClassId,
        decl: &ClassDecl<'_>,
        sig: &ClassSignature,
    ) -> Result<ClassDef> {
        // The parameters must be visible before any bound is converted so that bounds such as
        // `T extends Comparable<T>` can refer back to them.
        let mut def = ClassDef::new(decl.name, decl.kind);
        def.outer = decl.outer;
        def.is_static = decl.is_static;
        def.type_params = self.placeholder_params(&sig.type_parameters);
        self.store.define_class(id, def.clone());

        let scope = Scope {
            method: None,
            class: Some(id),
        };
        def.type_params = self.type_params(&sig.type_parameters, scope)?;
        self.store.define_class(id, def.clone());

        if decl.kind != ClassKind::Interface {
            def.super_class = Some(self.class_type(&sig.super_class, scope)?);
        }
        def.interfaces = sig
            .interfaces
            .iter()
            .map(|iface| self.class_type(iface, scope))
            .collect::<Result<_>>()?;
        Ok(def)
    }

    /// Registers a generic method so its type variables can be referenced.
    pub fn load_method(&mut self, owner: ClassId, name: &str, signature: &str) -> Result<MethodId> {
        self.class_def(owner)?;
        let sig = parse_method_signature(signature)?;
        let mut def = MethodDef {
            name: name.to_string(),
            owner,
            type_params: self.placeholder_params(&sig.type_parameters),
        };
        let id = self.store.add_method(def.clone());

        let scope = Scope {
            method: Some(id),
            class: Some(owner),
        };
        def.type_params = self.type_params(&sig.type_parameters, scope)?;
        self.store.define_method(id, def);
        Ok(id)
    }

    /// The declared type of a field of `owner`.
    pub fn field_type(&mut self, owner: ClassId, signature: &str) -> Result<TypeExpr> {
        self.class_def(owner)?;
        let sig = parse_field_signature(signature)?;
        self.type_signature(
            &sig,
            Scope {
                method: None,
                class: Some(owner),
            },
        )
    }

    /// Parameter types and return type (`None` for `void`) of a method loaded with
    /// [`SignatureLoader::load_method`].
    pub fn method_type(
        &mut self,
        method: MethodId,
        signature: &str,
    ) -> Result<(Vec<TypeExpr>, Option<TypeExpr>)> {
        let owner = match self.store.method(method) {
            Some(def) => def.owner,
            None => {
                return Err(SignatureError::UnknownDeclaration {
                    what: format!("method {method:?}"),
                })
            }
        };
        let sig = parse_method_signature(signature)?;
        let scope = Scope {
            method: Some(method),
            class: Some(owner),
        };
        let params = sig
            .parameters
            .iter()
            .map(|param| self.type_signature(param, scope))
            .collect::<Result<Vec<_>>>()?;
        let ret = sig
            .return_type
            .as_ref()
            .map(|ret| self.type_signature(ret, scope))
            .transpose()?;
        Ok((params, ret))
    }

    fn class_def(&self, id: ClassId) -> Result<&ClassDef> {
        self.store
            .class(id)
            .ok_or_else(|| SignatureError::UnknownDeclaration {
                what: format!("class {id:?}"),
            })
    }

    fn placeholder_params(&self, params: &[TypeParameter]) -> Vec<TypeParamDef> {
        let object = TypeExpr::Raw(self.store.well_known().object);
        params
            .iter()
            .map(|param| TypeParamDef {
                name: param.name.clone(),
                upper_bounds: vec![object.clone()],
            })
            .collect()
    }

    fn type_params(&mut self, params: &[TypeParameter], scope: Scope) -> Result<Vec<TypeParamDef>> {
        let object = TypeExpr::Raw(self.store.well_known().object);
        let mut out = Vec::with_capacity(params.len());
        for param in params {
            let mut upper_bounds = param
                .bounds()
                .map(|bound| self.type_signature(bound, scope))
                .collect::<Result<Vec<_>>>()?;
            if upper_bounds.is_empty() {
                upper_bounds.push(object.clone());
            }
            out.push(TypeParamDef {
                name: param.name.clone(),
                upper_bounds,
            });
        }
        Ok(out)
    }

    fn type_signature(&mut self, sig: &TypeSignature, scope: Scope) -> Result<TypeExpr> {
        match sig {
            TypeSignature::Base(base) => Ok(TypeExpr::Raw(self.class_ref(base.java_name()))),
            TypeSignature::Class(class) => self.class_type(class, scope),
            TypeSignature::TypeVariable(name) => self.type_variable(name, scope),
            TypeSignature::Array(component) => {
                let component = self.type_signature(component, scope)?;
                Ok(match component {
                    TypeExpr::Raw(id) => TypeExpr::Raw(self.store.intern_array_class(id)),
                    other => TypeExpr::array_of(&*self.store, other),
                })
            }
        }
    }

    fn class_type(&mut self, sig: &ClassTypeSignature, scope: Scope) -> Result<TypeExpr> {
        let mut current: Option<TypeExpr> = None;
        for (idx, segment) in sig.segments.iter().enumerate() {
            let id = self.class_ref(&sig.binary_name_upto(idx));
            let args = segment
                .type_arguments
                .iter()
                .map(|arg| self.type_argument(arg, scope))
                .collect::<Result<Vec<_>>>()?;

            let owner_is_generic = matches!(current, Some(TypeExpr::Parameterized(_)));
            current = Some(if args.is_empty() && !owner_is_generic {
                TypeExpr::Raw(id)
            } else {
                // `Outer$Inner<T>` written as a single segment still has `Outer` as its owner.
                let owner = current.take().or_else(|| {
                    let def = self.store.class(id)?;
                    def.outer.map(TypeExpr::Raw)
                });
                TypeExpr::parameterized_with_owner(&*self.store, owner, id, args)?
            });
        }
        current.ok_or_else(|| SignatureError::UnknownDeclaration {
            what: "empty class type signature".to_string(),
        })
    }

    fn type_argument(&mut self, arg: &TypeArgument, scope: Scope) -> Result<TypeExpr> {
        Ok(match arg {
            TypeArgument::Any => TypeExpr::unbounded_wildcard(&*self.store),
            TypeArgument::Exact(ty) => self.type_signature(ty, scope)?,
            TypeArgument::Extends(bound) => {
                let bound = self.type_signature(bound, scope)?;
                TypeExpr::subtype_of(&*self.store, bound)?
            }
            TypeArgument::Super(bound) => {
                let bound = self.type_signature(bound, scope)?;
                TypeExpr::supertype_of(&*self.store, bound)?
            }
        })
    }

    /// Finds the declaration of `name`: the method first, then the class and, for inner
    /// classes, the enclosing classes.
    fn type_variable(&self, name: &str, scope: Scope) -> Result<TypeExpr> {
        if let Some(method) = scope.method {
            if let Some(var) = self.store.type_var(GenericDeclId::Method(method), name) {
                return Ok(var);
            }
        }
        let mut class = scope.class;
        while let Some(id) = class {
            if let Some(var) = self.store.type_var(GenericDeclId::Class(id), name) {
                return Ok(var);
            }
            class = match self.store.class(id) {
                Some(def) if !def.is_static => def.outer,
                _ => None,
            };
        }
        Err(SignatureError::UnknownTypeVariable {
            name: name.to_string(),
        })
    }

    fn class_ref(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.store.class_id(name) {
            return id;
        }
        tracing::debug!(
            target: "reify.signature",
            class = name,
            "interning placeholder for unloaded class"
        );
        self.store.intern_class_id(name)
    }
}
