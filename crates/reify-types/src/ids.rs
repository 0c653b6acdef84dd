use std::fmt;

/// Handle to a class (or interface, primitive, array class) registered in a [`crate::TypeStore`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    pub(crate) fn from_index(idx: usize) -> Self {
        Self(u32::try_from(idx).unwrap_or(u32::MAX))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

/// Handle to a generic method or constructor registered in a [`crate::TypeStore`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(u32);

impl MethodId {
    pub(crate) fn from_index(idx: usize) -> Self {
        Self(u32::try_from(idx).unwrap_or(u32::MAX))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodId({})", self.0)
    }
}

/// The entity that declared a type variable.
///
/// This is a lookup-only reference: resolution uses it to find the declaring class's ordered
/// type parameter list, never to own or mutate the declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GenericDeclId {
    Class(ClassId),
    Method(MethodId),
}

impl GenericDeclId {
    pub fn as_class(self) -> Option<ClassId> {
        match self {
            GenericDeclId::Class(id) => Some(id),
            GenericDeclId::Method(_) => None,
        }
    }
}
