use crate::catalog::Catalog;
use serde::Serialize;
use std::cmp::Ordering;

/// Anything a [`Catalog`] can hold and a [`Group`] can own.
pub trait CatalogItem: Clone {
    fn id(&self) -> u64;
    fn name(&self) -> &str;

    /// Ordering used by [`Catalog::sort`].
    fn sort_order(a: &Self, b: &Self) -> Ordering;

    /// The group's sub-catalog of this kind, if it has been created.
    fn owned(group: &Group) -> Option<&Catalog<Self>>;
    fn owned_mut(group: &mut Group) -> &mut Option<Catalog<Self>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct File {
    pub id: u64,
    pub name: String,
    pub size: u64,
}

impl File {
    pub fn new(id: u64, name: impl Into<String>, size: u64) -> Self {
        Self {
            id,
            name: name.into(),
            size,
        }
    }

    /// Text after the last `.`, as displayed. A name without a dot is its own suffix.
    pub fn suffix(&self) -> &str {
        suffix_of(&self.name)
    }

    /// Lowercased suffix, the key files are grouped under.
    pub fn extension_key(&self) -> String {
        extension_key(&self.name)
    }
}

pub fn suffix_of(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

pub fn extension_key(name: &str) -> String {
    suffix_of(name).to_lowercase()
}

/// Case-insensitive first, lowercase before uppercase on ties: `a.txt` < `b.txt` < `B.txt`.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

impl CatalogItem for File {
    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn sort_order(a: &Self, b: &Self) -> Ordering {
        compare_names(&a.name, &b.name)
    }

    fn owned(group: &Group) -> Option<&Catalog<Self>> {
        group.files.as_ref()
    }

    fn owned_mut(group: &mut Group) -> &mut Option<Catalog<Self>> {
        &mut group.files
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extension {
    pub id: u64,
    pub name: String,
    /// Files carrying this suffix in the listing this extension was derived from.
    pub count: usize,
}

impl Extension {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            count: 1,
        }
    }
}

impl CatalogItem for Extension {
    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn sort_order(a: &Self, b: &Self) -> Ordering {
        b.count.cmp(&a.count)
    }

    fn owned(group: &Group) -> Option<&Catalog<Self>> {
        group.extensions.as_ref()
    }

    fn owned_mut(group: &mut Group) -> &mut Option<Catalog<Self>> {
        &mut group.extensions
    }
}

#[derive(Debug, Clone)]
pub struct Group {
    pub id: u64,
    pub name: String,
    pub extensions: Option<Catalog<Extension>>,
    pub files: Option<Catalog<File>>,
}

impl Group {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            extensions: None,
            files: None,
        }
    }

    /// True when at least one sub-catalog holds an item.
    pub fn has_items(&self) -> bool {
        self.extensions.as_ref().is_some_and(|c| !c.is_empty())
            || self.files.as_ref().is_some_and(|c| !c.is_empty())
    }

    pub fn extension_list(&self) -> &[Extension] {
        self.extensions.as_ref().map_or(&[], Catalog::items)
    }

    pub fn file_list(&self) -> &[File] {
        self.files.as_ref().map_or(&[], Catalog::items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_takes_text_after_last_dot() {
        let file = File::new(1, "archive.tar.GZ", 10);
        assert_eq!(file.suffix(), "GZ");
        assert_eq!(file.extension_key(), "gz");
    }

    #[test]
    fn dotless_name_is_its_own_suffix() {
        let file = File::new(1, "Makefile", 10);
        assert_eq!(file.suffix(), "Makefile");
        assert_eq!(file.extension_key(), "makefile");
    }

    #[test]
    fn names_compare_case_insensitively() {
        assert_eq!(compare_names("a.txt", "B.txt"), Ordering::Less);
        assert_eq!(compare_names("b.TXT", "c.pdf"), Ordering::Less);
        assert_eq!(compare_names("x", "x"), Ordering::Equal);
    }

    #[test]
    fn new_group_has_no_sub_catalogs() {
        let group = Group::new(1, "Docs");
        assert!(group.extensions.is_none());
        assert!(group.files.is_none());
        assert!(!group.has_items());
        assert!(group.file_list().is_empty());
    }
}
