use crate::constants::{FORBIDDEN_CHARS, GROUP_NAME_MAX_LEN, RESERVED_NAMES};
use crate::error::NameError;
use crate::model::Group;
use tracing::debug;

/// Ordered groups, unique by name.
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: Vec<Group>,
    high_water: u64,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `name` and appends a new group with no sub-catalogs.
    pub fn create(&mut self, name: &str) -> Result<&Group, NameError> {
        self.validate(name, None)?;
        self.high_water += 1;
        let group = Group::new(self.high_water, name);
        debug!(id = group.id, name, "Group created");
        self.groups.push(group);
        Ok(&self.groups[self.groups.len() - 1])
    }

    /// Removes the group. What it owned is not handed back anywhere; the
    /// unsorted view picks it up on the next refresh.
    pub fn delete(&mut self, id: u64) -> Option<Group> {
        let index = self.groups.iter().position(|g| g.id == id)?;
        let group = self.groups.remove(index);
        debug!(id, name = %group.name, "Group deleted");
        Some(group)
    }

    /// Renames a group. Renaming a missing id is a no-op.
    pub fn rename(&mut self, id: u64, new_name: &str) -> Result<(), NameError> {
        self.validate(new_name, Some(id))?;
        if let Some(group) = self.by_id_mut(id) {
            debug!(id, from = %group.name, to = new_name, "Group renamed");
            group.name = new_name.to_string();
        }
        Ok(())
    }

    /// True when no group holds any extension or file.
    pub fn is_empty(&self) -> bool {
        !self.groups.iter().any(Group::has_items)
    }

    /// Wipes every group's sub-catalogs; the groups themselves stay.
    pub fn clear_assignments(&mut self) {
        for group in &mut self.groups {
            if let Some(extensions) = group.extensions.as_mut() {
                extensions.clear();
            }
            if let Some(files) = group.files.as_mut() {
                files.clear();
            }
        }
    }

    pub fn exists_by_name(&self, name: &str) -> bool {
        self.groups.iter().any(|g| g.name == name)
    }

    pub fn by_id(&self, id: u64) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn by_id_mut(&mut self, id: u64) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Group> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn next_id(&self) -> u64 {
        self.high_water + 1
    }

    fn validate(&self, name: &str, renaming: Option<u64>) -> Result<(), NameError> {
        validate_name(name)?;
        let taken = self
            .groups
            .iter()
            .any(|g| g.name == name && Some(g.id) != renaming);
        if taken {
            return Err(NameError::Duplicate(name.to_string()));
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a GroupRegistry {
    type Item = &'a Group;
    type IntoIter = std::slice::Iter<'a, Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Checks a group name on its own, without looking at other groups.
pub fn validate_name(name: &str) -> Result<(), NameError> {
    let len = name.chars().count();
    if len == 0 {
        return Err(NameError::Empty);
    }
    if len > GROUP_NAME_MAX_LEN {
        return Err(NameError::TooLong { len });
    }
    if let Some(c) = name
        .chars()
        .find(|c| FORBIDDEN_CHARS.contains(c) || c.is_control())
    {
        return Err(NameError::ForbiddenChar(c));
    }
    let bad_edge = |c: char| c.is_whitespace() || c == '.';
    if name.starts_with(bad_edge) || name.ends_with(bad_edge) {
        return Err(NameError::BadEdge);
    }
    let upper = name.to_uppercase();
    if RESERVED_NAMES.contains(&upper.as_str()) {
        return Err(NameError::Reserved(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::model::{Extension, File};

    #[test]
    fn create_rejects_bad_names() {
        let mut registry = GroupRegistry::new();
        registry.create("Docs").unwrap();

        assert_eq!(registry.create("").err(), Some(NameError::Empty));
        assert_eq!(
            registry.create("abcdefghijklmnop").err(),
            Some(NameError::TooLong { len: 16 })
        );
        assert_eq!(
            registry.create("Docs").err(),
            Some(NameError::Duplicate("Docs".to_string()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn fifteen_characters_is_accepted() {
        let mut registry = GroupRegistry::new();
        let group = registry.create("abcdefghijklmno").unwrap();
        assert_eq!(group.name.len(), 15);
    }

    #[test]
    fn duplicate_check_is_case_sensitive() {
        let mut registry = GroupRegistry::new();
        registry.create("docs").unwrap();
        assert!(registry.create("Docs").is_ok());
    }

    #[test]
    fn forbidden_patterns() {
        assert_eq!(validate_name("a/b"), Err(NameError::ForbiddenChar('/')));
        assert_eq!(validate_name("*.pdf"), Err(NameError::ForbiddenChar('*')));
        assert_eq!(validate_name(" Docs"), Err(NameError::BadEdge));
        assert_eq!(validate_name("Docs."), Err(NameError::BadEdge));
        assert_eq!(validate_name(".."), Err(NameError::BadEdge));
        assert_eq!(
            validate_name("con"),
            Err(NameError::Reserved("con".to_string()))
        );
        assert_eq!(
            validate_name("LPT1"),
            Err(NameError::Reserved("LPT1".to_string()))
        );
        assert!(validate_name("Con tracts").is_ok());
    }

    #[test]
    fn ids_are_monotonic_across_deletes() {
        let mut registry = GroupRegistry::new();
        let a = registry.create("A").unwrap().id;
        let b = registry.create("B").unwrap().id;
        registry.delete(b);
        let c = registry.create("C").unwrap().id;
        assert!(a < b && b < c);
    }

    #[test]
    fn rename_excludes_self_from_uniqueness() {
        let mut registry = GroupRegistry::new();
        let id = registry.create("Docs").unwrap().id;
        registry.create("Media").unwrap();

        assert!(registry.rename(id, "Docs").is_ok());
        assert_eq!(
            registry.rename(id, "Media"),
            Err(NameError::Duplicate("Media".to_string()))
        );
        registry.rename(id, "Papers").unwrap();
        assert_eq!(registry.by_id(id).unwrap().name, "Papers");
    }

    #[test]
    fn empty_ignores_present_but_empty_sub_catalogs() {
        let mut registry = GroupRegistry::new();
        let id = registry.create("Docs").unwrap().id;
        assert!(registry.is_empty());

        registry.by_id_mut(id).unwrap().extensions = Some(Catalog::new());
        assert!(registry.is_empty());

        registry.by_id_mut(id).unwrap().files =
            Some([File::new(1, "a.txt", 1)].into_iter().collect());
        assert!(!registry.is_empty());
    }

    #[test]
    fn clear_assignments_keeps_groups() {
        let mut registry = GroupRegistry::new();
        let id = registry.create("Docs").unwrap().id;
        let group = registry.by_id_mut(id).unwrap();
        group.extensions = Some([Extension::new(1, "pdf")].into_iter().collect());

        registry.clear_assignments();
        assert_eq!(registry.len(), 1);
        assert!(registry.is_empty());
    }
}
