use std::collections::BTreeSet;

use crate::static_id::StaticId;

/// Unique ID of a node tag.
///
/// Tags attach extra identity to nodes without changing their type. They accumulate in the
/// tree's breadcrumbs as drawing descends, so observers can tell which named regions of the
/// tree a node was drawn under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagId {
    /// Unique ID of the tag.
    id: StaticId,
}

impl TagId {
    #[inline]
    pub const fn new(id: StaticId) -> Self {
        Self { id }
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.id.name()
    }
}

/// Declare a function returning a [`TagId`] unique to the declared symbol.
#[macro_export]
macro_rules! node_tag {
    ($(#[$attr:meta])* $vis:vis $name:ident) => {
        $(#[$attr])*
        $vis fn $name() -> $crate::tag_list::TagId {
            static ID: ::once_cell::sync::Lazy<$crate::tag_list::TagId> =
                ::once_cell::sync::Lazy::new(|| {
                    $crate::tag_list::TagId::new(
                        $crate::static_id::StaticId::allocate(stringify!($name)),
                    )
                });
            *ID
        }
    };
}

/// Node parameter assigning a new set of tags to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagList(BTreeSet<TagId>);

impl TagList {
    #[inline]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn add(&mut self, tag: TagId) {
        self.0.insert(tag);
    }

    #[inline]
    pub fn contains(&self, tag: TagId) -> bool {
        self.0.contains(&tag)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = TagId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<TagId> for TagList {
    fn from_iter<I: IntoIterator<Item = TagId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    node_tag!(warning);
    node_tag!(sidebar);

    #[test]
    fn tags_collect_into_lists() {
        let list: TagList = [warning(), sidebar()].into_iter().collect();
        assert!(list.contains(warning()));
        assert!(list.contains(sidebar()));
        assert_ne!(warning(), sidebar());
    }
}
