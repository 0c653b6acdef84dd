use std::collections::{HashMap, HashSet};

use crate::{ClassId, GenericDeclId, MethodId, ParameterizedType, TypeExpr};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    Primitive,
    /// An array class such as `String[]` or `int[]`.
    Array { component: ClassId },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParamDef {
    pub name: String,
    pub upper_bounds: Vec<TypeExpr>,
}

/// Declared shape of a class.
///
/// `super_class` and `interfaces` hold the *generic* declared supertypes (`AbstractList<E>`, not
/// just `AbstractList`), in declaration order. Interfaces, primitives and the root class have no
/// superclass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    pub type_params: Vec<TypeParamDef>,
    pub super_class: Option<TypeExpr>,
    pub interfaces: Vec<TypeExpr>,
    /// Enclosing class for nested classes.
    pub outer: Option<ClassId>,
    pub is_static: bool,
}

impl ClassDef {
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            type_params: Vec::new(),
            super_class: None,
            interfaces: Vec::new(),
            outer: None,
            is_static: false,
        }
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn type_param_index(&self, name: &str) -> Option<usize> {
        self.type_params.iter().position(|tp| tp.name == name)
    }
}

/// A generic method or constructor. Only its type parameters matter to the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodDef {
    pub name: String,
    pub owner: ClassId,
    pub type_params: Vec<TypeParamDef>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WellKnownTypes {
    /// The universal top type.
    pub object: ClassId,
    pub string: ClassId,
    pub integer: ClassId,
    pub int: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
    pub collection: ClassId,
    pub map: ClassId,
    /// Legacy string-keyed map whose declared signature says `Hashtable<Object, Object>`.
    pub properties: ClassId,
}

/// Read-only view of class metadata used by every engine operation.
pub trait TypeEnv {
    fn class(&self, id: ClassId) -> Option<&ClassDef>;
    fn method(&self, id: MethodId) -> Option<&MethodDef>;
    fn lookup_class(&self, name: &str) -> Option<ClassId>;
    /// The registered array class whose component is `component`, if any.
    fn array_class(&self, component: ClassId) -> Option<ClassId>;
    fn well_known(&self) -> &WellKnownTypes;

    fn type_params(&self, decl: GenericDeclId) -> Option<&[TypeParamDef]> {
        match decl {
            GenericDeclId::Class(id) => self.class(id).map(|def| def.type_params.as_slice()),
            GenericDeclId::Method(id) => self.method(id).map(|def| def.type_params.as_slice()),
        }
    }
}

/// Owning class registry.
#[derive(Clone, Debug)]
pub struct TypeStore {
    classes: Vec<ClassDef>,
    methods: Vec<MethodDef>,
    by_name: HashMap<String, ClassId>,
    arrays: HashMap<ClassId, ClassId>,
    well_known: WellKnownTypes,
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::with_minimal_jdk()
    }
}

impl TypeStore {
    /// Reserve an id for `name`, defining a placeholder class if it isn't known yet.
    ///
    /// Idempotent. Reserving ids up front lets callers describe self-referential declarations
    /// such as `class Node<T extends Node<T>>`.
    pub fn intern_class_id(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = ClassId::from_index(self.classes.len());
        self.classes.push(ClassDef::new(name, ClassKind::Class));
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Replace the definition stored under `id`.
    pub fn define_class(&mut self, id: ClassId, def: ClassDef) {
        let Some(slot) = self.classes.get_mut(id.index()) else {
            return;
        };
        if slot.name != def.name {
            self.by_name.remove(&slot.name);
        }
        self.by_name.insert(def.name.clone(), id);
        if let ClassKind::Array { component } = def.kind {
            self.arrays.insert(component, id);
        }
        *slot = def;
    }

    /// Define (or redefine) a class by name and return its id.
    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = self.intern_class_id(&def.name);
        self.define_class(id, def);
        id
    }

    pub fn add_method(&mut self, def: MethodDef) -> MethodId {
        let id = MethodId::from_index(self.methods.len());
        self.methods.push(def);
        id
    }

    /// Replace the definition stored under `id`.
    pub fn define_method(&mut self, id: MethodId, def: MethodDef) {
        if let Some(slot) = self.methods.get_mut(id.index()) {
            *slot = def;
        }
    }

    /// The array class `component[]`, registering it on first use.
    pub fn intern_array_class(&mut self, component: ClassId) -> ClassId {
        if let Some(id) = self.arrays.get(&component) {
            return *id;
        }
        let component_name = self
            .classes
            .get(component.index())
            .map(|def| def.name.as_str())
            .unwrap_or("<unknown>");
        let mut def = ClassDef::new(
            format!("{component_name}[]"),
            ClassKind::Array { component },
        );
        def.super_class = Some(TypeExpr::Raw(self.well_known.object));
        def.interfaces = vec![
            TypeExpr::Raw(self.well_known.cloneable),
            TypeExpr::Raw(self.well_known.serializable),
        ];
        def.is_static = true;
        self.add_class(def)
    }

    /// Exact lookup by binary name (`java.util.Map$Entry`).
    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// The type variable `name` declared by `decl`, if `decl` declares it.
    pub fn type_var(&self, decl: GenericDeclId, name: &str) -> Option<TypeExpr> {
        self.type_params(decl)?
            .iter()
            .any(|tp| tp.name == name)
            .then(|| TypeExpr::var(name, decl))
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// A store pre-populated with the core language and collection types the engine relies on.
    pub fn with_minimal_jdk() -> Self {
        let root = ClassId::from_index(0);
        let mut store = TypeStore {
            classes: Vec::new(),
            methods: Vec::new(),
            by_name: HashMap::new(),
            arrays: HashMap::new(),
            well_known: WellKnownTypes {
                object: root,
                string: root,
                integer: root,
                int: root,
                cloneable: root,
                serializable: root,
                collection: root,
                map: root,
                properties: root,
            },
        };

        let object = store.add_class(ClassDef::new("java.lang.Object", ClassKind::Class));
        store.well_known.object = object;
        let object_ty = TypeExpr::Raw(object);

        let cloneable =
            store.bootstrap("java.lang.Cloneable", ClassKind::Interface, &[], None, vec![]);
        let serializable =
            store.bootstrap("java.io.Serializable", ClassKind::Interface, &[], None, vec![]);
        store.well_known.cloneable = cloneable;
        store.well_known.serializable = serializable;

        let mut int = object;
        for name in ["boolean", "byte", "char", "short", "int", "long", "float", "double"] {
            let mut def = ClassDef::new(name, ClassKind::Primitive);
            def.is_static = true;
            let id = store.add_class(def);
            store.intern_array_class(id);
            if name == "int" {
                int = id;
            }
        }
        store.well_known.int = int;

        let comparable = store.intern_class_id("java.lang.Comparable");
        store.bootstrap_generic(comparable, ClassKind::Interface, &["T"], None, vec![]);
        let char_sequence =
            store.bootstrap("java.lang.CharSequence", ClassKind::Interface, &[], None, vec![]);

        let string = store.intern_class_id("java.lang.String");
        store.bootstrap_generic(
            string,
            ClassKind::Class,
            &[],
            Some(object_ty.clone()),
            vec![
                TypeExpr::Raw(serializable),
                generic(comparable, vec![TypeExpr::Raw(string)]),
                TypeExpr::Raw(char_sequence),
            ],
        );
        store.intern_array_class(string);
        store.intern_array_class(object);

        let number = store.bootstrap(
            "java.lang.Number",
            ClassKind::Class,
            &[],
            Some(object_ty.clone()),
            vec![TypeExpr::Raw(serializable)],
        );
        let integer = store.intern_class_id("java.lang.Integer");
        store.bootstrap_generic(
            integer,
            ClassKind::Class,
            &[],
            Some(TypeExpr::Raw(number)),
            vec![generic(comparable, vec![TypeExpr::Raw(integer)])],
        );

        let iterable = store.intern_class_id("java.lang.Iterable");
        store.bootstrap_generic(iterable, ClassKind::Interface, &["T"], None, vec![]);

        let collection = store.intern_class_id("java.util.Collection");
        store.bootstrap_generic(
            collection,
            ClassKind::Interface,
            &["E"],
            None,
            vec![generic(iterable, vec![class_var(collection, "E")])],
        );
        let list = store.intern_class_id("java.util.List");
        store.bootstrap_generic(
            list,
            ClassKind::Interface,
            &["E"],
            None,
            vec![generic(collection, vec![class_var(list, "E")])],
        );
        let set = store.intern_class_id("java.util.Set");
        store.bootstrap_generic(
            set,
            ClassKind::Interface,
            &["E"],
            None,
            vec![generic(collection, vec![class_var(set, "E")])],
        );
        let abstract_collection = store.intern_class_id("java.util.AbstractCollection");
        store.bootstrap_generic(
            abstract_collection,
            ClassKind::Class,
            &["E"],
            Some(object_ty.clone()),
            vec![generic(collection, vec![class_var(abstract_collection, "E")])],
        );
        let abstract_list = store.intern_class_id("java.util.AbstractList");
        store.bootstrap_generic(
            abstract_list,
            ClassKind::Class,
            &["E"],
            Some(generic(
                abstract_collection,
                vec![class_var(abstract_list, "E")],
            )),
            vec![generic(list, vec![class_var(abstract_list, "E")])],
        );
        let array_list = store.intern_class_id("java.util.ArrayList");
        store.bootstrap_generic(
            array_list,
            ClassKind::Class,
            &["E"],
            Some(generic(abstract_list, vec![class_var(array_list, "E")])),
            vec![
                generic(list, vec![class_var(array_list, "E")]),
                TypeExpr::Raw(cloneable),
                TypeExpr::Raw(serializable),
            ],
        );

        let map = store.intern_class_id("java.util.Map");
        store.bootstrap_generic(map, ClassKind::Interface, &["K", "V"], None, vec![]);
        let entry = store.intern_class_id("java.util.Map$Entry");
        store.bootstrap_generic(entry, ClassKind::Interface, &["K", "V"], None, vec![]);
        if let Some(def) = store.classes.get_mut(entry.index()) {
            def.outer = Some(map);
            def.is_static = true;
        }

        let abstract_map = store.intern_class_id("java.util.AbstractMap");
        store.bootstrap_generic(
            abstract_map,
            ClassKind::Class,
            &["K", "V"],
            Some(object_ty.clone()),
            vec![generic(
                map,
                vec![class_var(abstract_map, "K"), class_var(abstract_map, "V")],
            )],
        );
        let hash_map = store.intern_class_id("java.util.HashMap");
        store.bootstrap_generic(
            hash_map,
            ClassKind::Class,
            &["K", "V"],
            Some(generic(
                abstract_map,
                vec![class_var(hash_map, "K"), class_var(hash_map, "V")],
            )),
            vec![
                generic(map, vec![class_var(hash_map, "K"), class_var(hash_map, "V")]),
                TypeExpr::Raw(cloneable),
                TypeExpr::Raw(serializable),
            ],
        );
        let dictionary = store.intern_class_id("java.util.Dictionary");
        store.bootstrap_generic(
            dictionary,
            ClassKind::Class,
            &["K", "V"],
            Some(object_ty.clone()),
            vec![],
        );
        let hashtable = store.intern_class_id("java.util.Hashtable");
        store.bootstrap_generic(
            hashtable,
            ClassKind::Class,
            &["K", "V"],
            Some(generic(
                dictionary,
                vec![class_var(hashtable, "K"), class_var(hashtable, "V")],
            )),
            vec![
                generic(map, vec![class_var(hashtable, "K"), class_var(hashtable, "V")]),
                TypeExpr::Raw(cloneable),
                TypeExpr::Raw(serializable),
            ],
        );
        let properties = store.bootstrap(
            "java.util.Properties",
            ClassKind::Class,
            &[],
            Some(generic(hashtable, vec![object_ty.clone(), object_ty])),
            vec![],
        );

        store.well_known.string = string;
        store.well_known.integer = integer;
        store.well_known.collection = collection;
        store.well_known.map = map;
        store.well_known.properties = properties;
        store
    }

    fn bootstrap(
        &mut self,
        name: &str,
        kind: ClassKind,
        params: &[&str],
        super_class: Option<TypeExpr>,
        interfaces: Vec<TypeExpr>,
    ) -> ClassId {
        let id = self.intern_class_id(name);
        self.bootstrap_generic(id, kind, params, super_class, interfaces);
        id
    }

    fn bootstrap_generic(
        &mut self,
        id: ClassId,
        kind: ClassKind,
        params: &[&str],
        super_class: Option<TypeExpr>,
        interfaces: Vec<TypeExpr>,
    ) {
        let Some(name) = self.classes.get(id.index()).map(|def| def.name.clone()) else {
            return;
        };
        let object = TypeExpr::Raw(self.well_known.object);
        let mut def = ClassDef::new(name, kind);
        def.type_params = params
            .iter()
            .map(|name| TypeParamDef {
                name: (*name).to_string(),
                upper_bounds: vec![object.clone()],
            })
            .collect();
        def.super_class = super_class;
        def.interfaces = interfaces;
        self.define_class(id, def);
    }
}

fn generic(raw: ClassId, args: Vec<TypeExpr>) -> TypeExpr {
    TypeExpr::Parameterized(ParameterizedType {
        owner: None,
        raw,
        args,
    })
}

fn class_var(id: ClassId, name: &str) -> TypeExpr {
    TypeExpr::var(name, GenericDeclId::Class(id))
}

impl TypeEnv for TypeStore {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.index())
    }

    fn method(&self, id: MethodId) -> Option<&MethodDef> {
        self.methods.get(id.index())
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        if let Some(id) = self.class_id(name) {
            return Some(id);
        }
        // Simple names resolve against the implicitly imported `java.lang` package.
        if !name.contains('.') {
            return self.class_id(&format!("java.lang.{name}"));
        }
        None
    }

    fn array_class(&self, component: ClassId) -> Option<ClassId> {
        self.arrays.get(&component).copied()
    }

    fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }
}

/// The raw class named by a declared supertype expression.
pub(crate) fn declared_raw(ty: &TypeExpr) -> Option<ClassId> {
    match ty {
        TypeExpr::Raw(id) => Some(*id),
        TypeExpr::Parameterized(p) => Some(p.raw),
        TypeExpr::GenericArray(_) | TypeExpr::Wildcard(_) | TypeExpr::Var(_) => None,
    }
}

/// Whether a value of raw class `from` can be assigned to raw class `to`.
///
/// Walks the raw superclass and interface graph. Arrays are assignable to the root class,
/// `Cloneable` and `Serializable`, and covariantly to arrays of reference supertypes.
pub fn is_assignable_from(env: &dyn TypeEnv, to: ClassId, from: ClassId) -> bool {
    if to == from {
        return true;
    }
    let (Some(to_def), Some(from_def)) = (env.class(to), env.class(from)) else {
        return false;
    };
    if to_def.kind == ClassKind::Primitive || from_def.kind == ClassKind::Primitive {
        return false;
    }
    let wk = env.well_known();
    if to == wk.object {
        return true;
    }
    if let ClassKind::Array { component: from_component } = from_def.kind {
        return match to_def.kind {
            ClassKind::Array { component: to_component } => {
                is_assignable_from(env, to_component, from_component)
            }
            _ => to == wk.cloneable || to == wk.serializable,
        };
    }

    let mut stack = vec![from];
    let mut seen = HashSet::new();
    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        if current == to {
            return true;
        }
        let Some(def) = env.class(current) else {
            continue;
        };
        stack.extend(def.super_class.iter().filter_map(declared_raw));
        stack.extend(def.interfaces.iter().filter_map(declared_raw));
    }
    false
}
