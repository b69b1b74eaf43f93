use crate::model::CatalogItem;

/// Ordered collection of one item kind, unique by name.
///
/// Lookups are linear; a catalog never holds more than one directory's entries.
/// Ids come from a high-water mark, so removing the last item and adding a new
/// one never hands out an id twice.
#[derive(Debug, Clone)]
pub struct Catalog<T> {
    items: Vec<T>,
    high_water: u64,
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            high_water: 0,
        }
    }
}

impl<T: CatalogItem> Catalog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends without checking names; callers make sure the name is not present.
    pub fn add(&mut self, item: T) {
        self.high_water = self.high_water.max(item.id());
        self.items.push(item);
    }

    pub fn exists_by_name(&self, name: &str) -> bool {
        self.items.iter().any(|i| i.name() == name)
    }

    pub fn by_name(&self, name: &str) -> Option<&T> {
        self.items.iter().find(|i| i.name() == name)
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|i| i.name() == name)
    }

    pub fn by_id(&self, id: u64) -> Option<&T> {
        self.items.iter().find(|i| i.id() == id)
    }

    /// Removes and returns the item with `id`, if any.
    pub fn remove(&mut self, id: u64) -> Option<T> {
        let index = self.items.iter().position(|i| i.id() == id)?;
        Some(self.items.remove(index))
    }

    pub fn next_id(&self) -> u64 {
        self.high_water + 1
    }

    /// Stable in-place sort by the item kind's ordering.
    pub fn sort(&mut self) {
        self.items.sort_by(T::sort_order);
    }

    /// Empties the catalog; issued ids stay issued.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: CatalogItem> FromIterator<T> for Catalog<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for item in iter {
            catalog.add(item);
        }
        catalog
    }
}

impl<'a, T: CatalogItem> IntoIterator for &'a Catalog<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
