use crate::catalog::Catalog;
use crate::groups::GroupRegistry;
use crate::model::CatalogItem;
use std::collections::HashSet;

/// Items of `initial` that no group owns, compared by name, in catalog order.
pub fn unsorted<'a, T: CatalogItem>(
    initial: &'a Catalog<T>,
    groups: &GroupRegistry,
) -> Vec<&'a T> {
    let owned: HashSet<&str> = groups
        .iter()
        .filter_map(T::owned)
        .flat_map(Catalog::iter)
        .map(CatalogItem::name)
        .collect();

    initial
        .iter()
        .filter(|item| !owned.contains(item.name()))
        .collect()
}

/// Case-insensitive substring filter. An empty query keeps everything.
pub fn matching<'a, T: CatalogItem>(items: Vec<&'a T>, query: &str) -> Vec<&'a T> {
    if query.is_empty() {
        return items;
    }
    let query = query.to_lowercase();
    items
        .into_iter()
        .filter(|item| item.name().to_lowercase().contains(&query))
        .collect()
}
