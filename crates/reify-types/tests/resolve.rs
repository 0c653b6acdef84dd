use reify_types::{
    collection_element_type, generic_supertype, map_key_value_types, resolve, supertype, ClassDef,
    ClassId, ClassKind, GenericArrayType, GenericDeclId, MethodDef, ParameterizedType,
    ResolveOptions, Resolver, TypeEnv, TypeError, TypeExpr, TypeParamDef, TypeStore,
    WildcardType,
};

use pretty_assertions::assert_eq;

fn param(name: &str, object: ClassId) -> TypeParamDef {
    TypeParamDef {
        name: name.to_string(),
        upper_bounds: vec![TypeExpr::Raw(object)],
    }
}

fn generic(raw: ClassId, args: Vec<TypeExpr>) -> TypeExpr {
    TypeExpr::Parameterized(ParameterizedType {
        owner: None,
        raw,
        args,
    })
}

fn class(
    store: &mut TypeStore,
    id: ClassId,
    kind: ClassKind,
    type_params: &[&str],
    super_class: Option<TypeExpr>,
    interfaces: Vec<TypeExpr>,
) {
    let object = store.well_known().object;
    let name = store.class(id).unwrap().name.clone();
    store.define_class(
        id,
        ClassDef {
            name,
            kind,
            type_params: type_params.iter().map(|tp| param(tp, object)).collect(),
            super_class,
            interfaces,
            outer: None,
            is_static: false,
        },
    );
}

/// `class Box<T>` and `class StringBox extends Box<String>`.
fn box_fixture() -> (TypeStore, ClassId, ClassId, TypeExpr) {
    let mut store = TypeStore::with_minimal_jdk();
    let object = store.well_known().object;
    let string = store.well_known().string;

    let box_id = store.intern_class_id("com.example.Box");
    class(
        &mut store,
        box_id,
        ClassKind::Class,
        &["T"],
        Some(TypeExpr::Raw(object)),
        vec![],
    );
    let string_box = store.intern_class_id("com.example.StringBox");
    class(
        &mut store,
        string_box,
        ClassKind::Class,
        &[],
        Some(generic(box_id, vec![TypeExpr::Raw(string)])),
        vec![],
    );

    let t = store.type_var(GenericDeclId::Class(box_id), "T").unwrap();
    (store, box_id, string_box, t)
}

#[test]
fn field_variable_resolves_through_concrete_subclass() {
    let (store, _, string_box, t) = box_fixture();
    let string = store.well_known().string;

    let resolved = resolve(&store, &TypeExpr::Raw(string_box), string_box, &t);
    assert_eq!(resolved, TypeExpr::Raw(string));
}

#[test]
fn variable_resolves_through_intermediate_generic_class() {
    let (mut store, box_id, _, t) = box_fixture();
    let string = store.well_known().string;

    // class MidBox<U> extends Box<U>
    let mid = store.intern_class_id("com.example.MidBox");
    let u = TypeExpr::var("U", GenericDeclId::Class(mid));
    class(
        &mut store,
        mid,
        ClassKind::Class,
        &["U"],
        Some(generic(box_id, vec![u])),
        vec![],
    );
    // class Leaf extends MidBox<String>
    let leaf = store.intern_class_id("com.example.Leaf");
    class(
        &mut store,
        leaf,
        ClassKind::Class,
        &[],
        Some(generic(mid, vec![TypeExpr::Raw(string)])),
        vec![],
    );

    let resolved = resolve(&store, &TypeExpr::Raw(leaf), leaf, &t);
    assert_eq!(resolved, TypeExpr::Raw(string));
}

#[test]
fn method_declared_variable_is_left_unchanged() {
    let (mut store, _, string_box, _) = box_fixture();
    let object = store.well_known().object;

    // <R> R convert()
    let method = store.add_method(MethodDef {
        name: "convert".to_string(),
        owner: string_box,
        type_params: vec![param("R", object)],
    });
    let r = store.type_var(GenericDeclId::Method(method), "R").unwrap();

    let resolved = resolve(&store, &TypeExpr::Raw(string_box), string_box, &r);
    assert_eq!(resolved, r);
}

#[test]
fn variable_stays_unresolved_through_raw_supertype() {
    let (mut store, box_id, _, t) = box_fixture();

    // class RawBox extends Box
    let raw_box = store.intern_class_id("com.example.RawBox");
    class(
        &mut store,
        raw_box,
        ClassKind::Class,
        &[],
        Some(TypeExpr::Raw(box_id)),
        vec![],
    );

    let resolved = resolve(&store, &TypeExpr::Raw(raw_box), raw_box, &t);
    assert_eq!(resolved, t);
}

#[test]
fn parameterized_context_supplies_arguments() {
    let (store, box_id, _, t) = box_fixture();
    let integer = store.well_known().integer;

    let context = generic(box_id, vec![TypeExpr::Raw(integer)]);
    assert_eq!(
        resolve(&store, &context, box_id, &t),
        TypeExpr::Raw(integer)
    );
}

#[test]
fn resolution_rebuilds_nested_structures() {
    let (store, _, string_box, t) = box_fixture();
    let string = store.well_known().string;
    let list = store.class_id("java.util.List").unwrap();
    let context = TypeExpr::Raw(string_box);

    // List<T[]> -> List<String[]>
    let list_of_array = generic(
        list,
        vec![TypeExpr::GenericArray(GenericArrayType {
            component: Box::new(t.clone()),
        })],
    );
    assert_eq!(
        resolve(&store, &context, string_box, &list_of_array),
        generic(
            list,
            vec![TypeExpr::GenericArray(GenericArrayType {
                component: Box::new(TypeExpr::Raw(string)),
            })]
        )
    );

    // List<? extends T> -> List<? extends String>
    let extends_t = generic(list, vec![TypeExpr::subtype_of(&store, t.clone()).unwrap()]);
    assert_eq!(
        resolve(&store, &context, string_box, &extends_t),
        generic(
            list,
            vec![TypeExpr::subtype_of(&store, TypeExpr::Raw(string)).unwrap()]
        )
    );

    // List<? super T> -> List<? super String>
    let super_t = generic(list, vec![TypeExpr::supertype_of(&store, t).unwrap()]);
    assert_eq!(
        resolve(&store, &context, string_box, &super_t),
        generic(
            list,
            vec![TypeExpr::supertype_of(&store, TypeExpr::Raw(string)).unwrap()]
        )
    );
}

#[test]
fn wildcard_resolution_only_touches_the_lower_bound_when_present() {
    let (store, _, string_box, t) = box_fixture();
    let integer = store.well_known().integer;

    // Malformed on purpose: a variable upper bound alongside a concrete lower bound. Only the
    // lower bound is considered, and it doesn't change.
    let both = TypeExpr::Wildcard(WildcardType {
        upper_bounds: vec![t],
        lower_bounds: vec![TypeExpr::Raw(integer)],
    });
    assert_eq!(
        resolve(&store, &TypeExpr::Raw(string_box), string_box, &both),
        both
    );
}

#[test]
fn expressions_without_variables_are_returned_unchanged() {
    let (mut store, _, string_box, _) = box_fixture();
    let string = store.well_known().string;
    let string_array = store.intern_array_class(string);
    let map = store.well_known().map;

    let ty = generic(
        map,
        vec![TypeExpr::Raw(string), TypeExpr::Raw(string_array)],
    );
    assert_eq!(
        resolve(&store, &TypeExpr::Raw(string_box), string_box, &ty),
        ty
    );
    assert_eq!(
        resolve(
            &store,
            &TypeExpr::Raw(string_box),
            string_box,
            &TypeExpr::Raw(string_array)
        ),
        TypeExpr::Raw(string_array)
    );
}

#[test]
fn owner_types_are_resolved() {
    let mut store = TypeStore::with_minimal_jdk();
    let object = store.well_known().object;
    let string = store.well_known().string;
    let integer = store.well_known().integer;

    // class Outer<T> { class Inner<U> {} }
    let outer = store.intern_class_id("com.example.Outer");
    class(
        &mut store,
        outer,
        ClassKind::Class,
        &["T"],
        Some(TypeExpr::Raw(object)),
        vec![],
    );
    let inner = store.add_class(ClassDef {
        name: "com.example.Outer$Inner".to_string(),
        kind: ClassKind::Class,
        type_params: vec![param("U", object)],
        super_class: Some(TypeExpr::Raw(object)),
        interfaces: vec![],
        outer: Some(outer),
        is_static: false,
    });
    // class StringOuter extends Outer<String>
    let string_outer = store.intern_class_id("com.example.StringOuter");
    class(
        &mut store,
        string_outer,
        ClassKind::Class,
        &[],
        Some(generic(outer, vec![TypeExpr::Raw(string)])),
        vec![],
    );

    let t = store.type_var(GenericDeclId::Class(outer), "T").unwrap();
    let missing_owner = TypeExpr::parameterized(&store, inner, vec![TypeExpr::Raw(integer)]);
    assert!(matches!(
        missing_owner,
        Err(TypeError::MissingOwnerType { .. })
    ));

    let owner = generic(outer, vec![t]);
    let ty = TypeExpr::parameterized_with_owner(
        &store,
        Some(owner),
        inner,
        vec![TypeExpr::Raw(integer)],
    )
    .unwrap();
    let expected = TypeExpr::parameterized_with_owner(
        &store,
        Some(generic(outer, vec![TypeExpr::Raw(string)])),
        inner,
        vec![TypeExpr::Raw(integer)],
    )
    .unwrap();
    assert_eq!(
        resolve(&store, &TypeExpr::Raw(string_outer), string_outer, &ty),
        expected
    );
}

#[test]
fn generic_supertype_base_case_returns_context() {
    let (store, box_id, _, t) = box_fixture();
    let context = generic(box_id, vec![t]);
    assert_eq!(generic_supertype(&store, &context, box_id, box_id), context);
}

#[test]
fn generic_supertype_walks_interfaces_and_superclasses() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let array_list = store.class_id("java.util.ArrayList").unwrap();
    let abstract_collection = store.class_id("java.util.AbstractCollection").unwrap();
    let list = store.class_id("java.util.List").unwrap();
    let context = TypeExpr::Raw(array_list);

    // Interfaces first: ArrayList -> List<E> -> Collection<E of List>.
    assert_eq!(
        generic_supertype(&store, &context, array_list, wk.collection),
        generic(
            wk.collection,
            vec![TypeExpr::var("E", GenericDeclId::Class(list))]
        )
    );

    // Superclass chain: ArrayList -> AbstractList<E> -> AbstractCollection<E of AbstractList>.
    let abstract_list = store.class_id("java.util.AbstractList").unwrap();
    assert_eq!(
        generic_supertype(&store, &context, array_list, abstract_collection),
        generic(
            abstract_collection,
            vec![TypeExpr::var("E", GenericDeclId::Class(abstract_list))]
        )
    );

    // Not an ancestor.
    assert_eq!(
        generic_supertype(&store, &context, array_list, wk.map),
        TypeExpr::Raw(wk.map)
    );
}

#[test]
fn interfaces_are_preferred_over_the_superclass_chain() {
    let mut store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();

    // abstract class Base<T> implements Collection<T>
    let base = store.intern_class_id("com.example.Base");
    let t = TypeExpr::var("T", GenericDeclId::Class(base));
    class(
        &mut store,
        base,
        ClassKind::Class,
        &["T"],
        Some(TypeExpr::Raw(wk.object)),
        vec![generic(wk.collection, vec![t])],
    );
    // class Mixed extends Base<Integer> implements Collection<String>
    let mixed = store.intern_class_id("com.example.Mixed");
    class(
        &mut store,
        mixed,
        ClassKind::Class,
        &[],
        Some(generic(base, vec![TypeExpr::Raw(wk.integer)])),
        vec![generic(wk.collection, vec![TypeExpr::Raw(wk.string)])],
    );

    assert_eq!(
        collection_element_type(&store, &TypeExpr::Raw(mixed), mixed),
        TypeExpr::Raw(wk.string)
    );
}

#[test]
fn cyclic_interface_declarations_terminate() {
    let mut store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();

    let i1 = store.intern_class_id("com.example.I1");
    let i2 = store.intern_class_id("com.example.I2");
    class(
        &mut store,
        i1,
        ClassKind::Interface,
        &[],
        None,
        vec![TypeExpr::Raw(i2)],
    );
    class(
        &mut store,
        i2,
        ClassKind::Interface,
        &[],
        None,
        vec![
            TypeExpr::Raw(i1),
            generic(wk.collection, vec![TypeExpr::Raw(wk.string)]),
        ],
    );

    assert_eq!(
        generic_supertype(&store, &TypeExpr::Raw(i1), i1, wk.collection),
        generic(wk.collection, vec![TypeExpr::Raw(wk.string)])
    );
}

#[test]
fn substitution_cycles_terminate_with_a_variable() {
    let (mut store, box_id, _, t) = box_fixture();

    // class Swap<U> extends Box<U>, viewed as Swap<T of Box>.
    let swap = store.intern_class_id("com.example.Swap");
    let u = TypeExpr::var("U", GenericDeclId::Class(swap));
    class(
        &mut store,
        swap,
        ClassKind::Class,
        &["U"],
        Some(generic(box_id, vec![u.clone()])),
        vec![],
    );

    let context = generic(swap, vec![t.clone()]);
    let resolved = resolve(&store, &context, swap, &t);
    assert!(matches!(resolved, TypeExpr::Var(_)), "got {resolved:?}");
}

#[test]
fn depth_limit_degrades_to_raw_target() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let array_list = store.class_id("java.util.ArrayList").unwrap();

    let shallow = Resolver::with_options(&store, ResolveOptions { max_depth: 1 });
    assert_eq!(
        shallow.generic_supertype(&TypeExpr::Raw(array_list), array_list, wk.collection),
        TypeExpr::Raw(wk.collection)
    );
    assert_eq!(
        Resolver::new(&store).options(),
        ResolveOptions::default()
    );
}

#[test]
fn supertype_checks_ancestry() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let array_list = store.class_id("java.util.ArrayList").unwrap();
    let context = generic(array_list, vec![TypeExpr::Raw(wk.string)]);

    assert_eq!(
        supertype(&store, &context, array_list, wk.collection),
        Ok(generic(wk.collection, vec![TypeExpr::Raw(wk.string)]))
    );
    assert_eq!(
        supertype(&store, &context, array_list, wk.map),
        Err(TypeError::NotASupertype {
            supertype: "java.util.Map".to_string(),
            subtype: "java.util.ArrayList".to_string(),
        })
    );
}

#[test]
fn collection_element_type_of_concrete_implementation() {
    let mut store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let list = store.class_id("java.util.List").unwrap();

    // class IntBox implements List<Integer>
    let int_box = store.intern_class_id("com.example.IntBox");
    class(
        &mut store,
        int_box,
        ClassKind::Class,
        &[],
        Some(TypeExpr::Raw(wk.object)),
        vec![generic(list, vec![TypeExpr::Raw(wk.integer)])],
    );

    assert_eq!(
        collection_element_type(&store, &TypeExpr::Raw(int_box), int_box),
        TypeExpr::Raw(wk.integer)
    );
}

#[test]
fn collection_element_type_of_parameterized_and_raw_contexts() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let array_list = store.class_id("java.util.ArrayList").unwrap();

    let array_list_string = generic(array_list, vec![TypeExpr::Raw(wk.string)]);
    assert_eq!(
        collection_element_type(&store, &array_list_string, array_list),
        TypeExpr::Raw(wk.string)
    );

    // Raw usage: the element type is the (unresolved) declared variable.
    let raw = collection_element_type(&store, &TypeExpr::Raw(array_list), array_list);
    assert_eq!(raw, TypeExpr::var("E", GenericDeclId::Class(array_list)));

    // Not a collection at all.
    assert_eq!(
        collection_element_type(&store, &TypeExpr::Raw(wk.string), wk.string),
        TypeExpr::Raw(wk.object)
    );
}

#[test]
fn map_key_value_types_of_parameterized_context() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let hash_map = store.class_id("java.util.HashMap").unwrap();

    let context = generic(
        hash_map,
        vec![TypeExpr::Raw(wk.string), TypeExpr::Raw(wk.integer)],
    );
    assert_eq!(
        map_key_value_types(&store, &context, hash_map),
        (TypeExpr::Raw(wk.string), TypeExpr::Raw(wk.integer))
    );
    assert_eq!(
        map_key_value_types(&store, &TypeExpr::Raw(wk.string), wk.string),
        (TypeExpr::Raw(wk.object), TypeExpr::Raw(wk.object))
    );
}

#[test]
fn properties_always_reports_string_keys_and_values() {
    let mut store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let string = TypeExpr::Raw(wk.string);

    assert_eq!(
        map_key_value_types(&store, &TypeExpr::Raw(wk.properties), wk.properties),
        (string.clone(), string.clone())
    );

    // class AppProperties extends Properties
    let app = store.intern_class_id("com.example.AppProperties");
    class(
        &mut store,
        app,
        ClassKind::Class,
        &[],
        Some(TypeExpr::Raw(wk.properties)),
        vec![],
    );
    assert_eq!(
        map_key_value_types(&store, &TypeExpr::Raw(app), app),
        (string.clone(), string)
    );

    // The declared signature is still visible through the ordinary supertype search.
    let hashtable = store.class_id("java.util.Hashtable").unwrap();
    assert_eq!(
        generic_supertype(&store, &TypeExpr::Raw(wk.properties), wk.properties, hashtable),
        generic(
            hashtable,
            vec![TypeExpr::Raw(wk.object), TypeExpr::Raw(wk.object)]
        )
    );
}
