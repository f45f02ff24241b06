//! Registry of type descriptors: assigns each registered type a stable bit
//! index within its kind (Component, ArrayElement, Tag).

use std::any::TypeId;

use rustc_hash::FxHashMap;

use crate::bitmask::CAP;
use crate::error::{EcsError, Result};

/// Which of the three independent, CAP-bit namespaces a type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Component,
    ArrayElement,
    Tag,
}

/// A type's bit position within its kind's namespace.
pub type TypeIndex = usize;

/// Opaque descriptor for a registered type.
#[derive(Debug, Clone, Copy)]
pub struct TypeDescriptor {
    pub index: TypeIndex,
    pub kind: TypeKind,
    pub size: usize,
    pub name_hash: u64,
    pub type_id: TypeId,
    /// Glue to run `Drop` over raw column bytes for component types that
    /// aren't trivially droppable. `None` for `Copy` types and for the
    /// `ArrayElement`/`Tag` kinds, which never need it.
    pub drop_fn: Option<unsafe fn(*mut u8)>,
}

#[derive(Default)]
struct KindTable {
    descriptors: Vec<TypeDescriptor>,
    by_type_id: FxHashMap<TypeId, TypeIndex>,
    by_name_hash: FxHashMap<u64, TypeIndex>,
}

impl KindTable {
    fn register(
        &mut self,
        kind: TypeKind,
        type_id: TypeId,
        size: usize,
        name_hash: u64,
        drop_fn: Option<unsafe fn(*mut u8)>,
    ) -> Result<TypeIndex> {
        if let Some(&idx) = self.by_type_id.get(&type_id) {
            return Ok(idx);
        }
        if self.by_name_hash.contains_key(&name_hash) {
            return Err(EcsError::AlreadyPresent);
        }
        if self.descriptors.len() >= CAP {
            return Err(EcsError::CapacityExceeded);
        }

        let index = self.descriptors.len();
        self.descriptors.push(TypeDescriptor {
            index,
            kind,
            size,
            name_hash,
            type_id,
            drop_fn,
        });
        self.by_type_id.insert(type_id, index);
        self.by_name_hash.insert(name_hash, index);
        Ok(index)
    }
}

/// Registry of type descriptors, shared by one or more `World`s. Indices
/// assigned here never shift once granted.
#[derive(Default)]
pub struct Schema {
    components: KindTable,
    arrays: KindTable,
    tags: KindTable,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, kind: TypeKind) -> &KindTable {
        match kind {
            TypeKind::Component => &self.components,
            TypeKind::ArrayElement => &self.arrays,
            TypeKind::Tag => &self.tags,
        }
    }

    fn table_mut(&mut self, kind: TypeKind) -> &mut KindTable {
        match kind {
            TypeKind::Component => &mut self.components,
            TypeKind::ArrayElement => &mut self.arrays,
            TypeKind::Tag => &mut self.tags,
        }
    }

    /// Register a type by raw descriptor fields (the external "type bank"
    /// seeding path of §6). Rejects a name-hash collision within the same
    /// kind, per the Schema contract in §4.A.
    pub fn register_raw(
        &mut self,
        kind: TypeKind,
        type_id: TypeId,
        size: usize,
        name_hash: u64,
    ) -> Result<TypeIndex> {
        self.table_mut(kind).register(kind, type_id, size, name_hash, None)
    }

    /// Register (or look up) a Rust type by its static identity. Used by
    /// the typed `World` API wrappers; idempotent by `TypeId`.
    pub fn register_type<T: 'static>(&mut self, kind: TypeKind, size: usize) -> Result<TypeIndex> {
        let type_id = TypeId::of::<T>();
        let name_hash = stable_name_hash(std::any::type_name::<T>());
        let drop_fn = if std::mem::needs_drop::<T>() {
            Some(drop_in_place_as::<T> as unsafe fn(*mut u8))
        } else {
            None
        };
        self.table_mut(kind).register(kind, type_id, size, name_hash, drop_fn)
    }

    pub fn index_of_type(&self, kind: TypeKind, type_id: TypeId) -> Option<TypeIndex> {
        self.table(kind).by_type_id.get(&type_id).copied()
    }

    pub fn index_of_name_hash(&self, kind: TypeKind, name_hash: u64) -> Option<TypeIndex> {
        self.table(kind).by_name_hash.get(&name_hash).copied()
    }

    pub fn descriptor(&self, kind: TypeKind, index: TypeIndex) -> Option<&TypeDescriptor> {
        self.table(kind).descriptors.get(index)
    }

    pub fn len(&self, kind: TypeKind) -> usize {
        self.table(kind).descriptors.len()
    }

    pub fn is_empty(&self, kind: TypeKind) -> bool {
        self.len(kind) == 0
    }
}

unsafe fn drop_in_place_as<T>(ptr: *mut u8) {
    std::ptr::drop_in_place(ptr as *mut T);
}

/// FxHash of a fully-qualified type name; stable for the lifetime of one
/// process, which is all §4.B requires of it.
pub fn stable_name_hash(name: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = rustc_hash::FxHasher::default();
    name.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_monotone_and_idempotent() {
        let mut schema = Schema::new();
        let i1 = schema.register_type::<u32>(TypeKind::Component, 4).unwrap();
        let i2 = schema.register_type::<u32>(TypeKind::Component, 4).unwrap();
        assert_eq!(i1, i2);

        let i3 = schema.register_type::<u64>(TypeKind::Component, 8).unwrap();
        assert_ne!(i1, i3);
    }

    #[test]
    fn kinds_have_independent_index_spaces() {
        let mut schema = Schema::new();
        let comp = schema.register_type::<u32>(TypeKind::Component, 4).unwrap();
        let tag = schema.register_type::<u32>(TypeKind::Tag, 0).unwrap();
        // u32 registered once per kind table; both can land on index 0.
        assert_eq!(comp, 0);
        assert_eq!(tag, 0);
    }

    #[test]
    fn capacity_exceeded() {
        let mut schema = Schema::new();
        struct Marker<const N: usize>;
        macro_rules! reg {
            ($n:expr) => {
                schema
                    .register_raw(
                        TypeKind::Tag,
                        TypeId::of::<Marker<$n>>(),
                        0,
                        $n as u64,
                    )
                    .unwrap();
            };
        }
        // Fill all CAP=64 slots.
        reg!(0); reg!(1); reg!(2); reg!(3); reg!(4); reg!(5); reg!(6); reg!(7);
        reg!(8); reg!(9); reg!(10); reg!(11); reg!(12); reg!(13); reg!(14); reg!(15);
        reg!(16); reg!(17); reg!(18); reg!(19); reg!(20); reg!(21); reg!(22); reg!(23);
        reg!(24); reg!(25); reg!(26); reg!(27); reg!(28); reg!(29); reg!(30); reg!(31);
        reg!(32); reg!(33); reg!(34); reg!(35); reg!(36); reg!(37); reg!(38); reg!(39);
        reg!(40); reg!(41); reg!(42); reg!(43); reg!(44); reg!(45); reg!(46); reg!(47);
        reg!(48); reg!(49); reg!(50); reg!(51); reg!(52); reg!(53); reg!(54); reg!(55);
        reg!(56); reg!(57); reg!(58); reg!(59); reg!(60); reg!(61); reg!(62); reg!(63);

        let overflow = schema.register_raw(TypeKind::Tag, TypeId::of::<Marker<64>>(), 0, 64);
        assert!(matches!(overflow, Err(EcsError::CapacityExceeded)));
    }

    #[test]
    fn duplicate_name_hash_rejected() {
        let mut schema = Schema::new();
        struct A;
        struct B;
        schema
            .register_raw(TypeKind::Component, TypeId::of::<A>(), 0, 42)
            .unwrap();
        let err = schema.register_raw(TypeKind::Component, TypeId::of::<B>(), 0, 42);
        assert!(matches!(err, Err(EcsError::AlreadyPresent)));
    }
}
