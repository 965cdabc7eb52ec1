//! Process-wide unique identifiers derived from declared symbols.
//!
//! The original design derived identity from the address of a per-symbol sentinel. Here a
//! startup registry hands out monotonically increasing integers instead; the registry is
//! append-only and IDs never change once allocated, so equality is plain integer equality.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Unique ID generated for a declared symbol.
///
/// Use the [`static_id!`](crate::static_id!) macro to declare one; every call site of the
/// generated function observes the same ID for the lifetime of the process.
#[derive(Clone, Copy)]
pub struct StaticId {
    /// The ID.
    id: usize,

    /// Name of the symbol the ID was generated from. Kept for diagnostics.
    name: &'static str,
}

impl StaticId {
    /// Allocate a fresh ID. Prefer the [`static_id!`](crate::static_id!) macro, which
    /// guarantees the allocation happens once per symbol.
    pub fn allocate(name: &'static str) -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        Self {
            id: NEXT.fetch_add(1, Ordering::Relaxed),
            name,
        }
    }

    /// Name of the symbol this ID was declared from.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for StaticId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for StaticId {}

impl PartialOrd for StaticId {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StaticId {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl std::hash::Hash for StaticId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Debug for StaticId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

/// Declare a function returning a [`StaticId`] unique to the declared symbol.
///
/// ```
/// trellis_ui::static_id!(pub my_tag);
///
/// assert_eq!(my_tag(), my_tag());
/// ```
#[macro_export]
macro_rules! static_id {
    ($(#[$attr:meta])* $vis:vis $name:ident) => {
        $(#[$attr])*
        $vis fn $name() -> $crate::static_id::StaticId {
            static ID: ::once_cell::sync::Lazy<$crate::static_id::StaticId> =
                ::once_cell::sync::Lazy::new(|| {
                    $crate::static_id::StaticId::allocate(stringify!($name))
                });
            *ID
        }
    };
}

#[cfg(test)]
mod tests {
    static_id!(first);
    static_id!(second);

    #[test]
    fn ids_are_stable_and_distinct() {
        assert_eq!(first(), first());
        assert_ne!(first(), second());
    }
}
