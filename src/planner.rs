use crate::catalog::Catalog;
use crate::error::PlanError;
use crate::groups::GroupRegistry;
use crate::model::{File, Group};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// What to do when one file name lands in the plan more than once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapPolicy {
    /// Keep every occurrence; the executor moves whatever is still there.
    #[default]
    Preserve,
    /// Drop a name already emitted earlier in registry order.
    FirstGroupWins,
    /// Refuse to build a plan with any duplicate.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub group: String,
    pub files: Vec<String>,
}

/// Group name to the files the executor should move into it, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MovePlan {
    pub entries: Vec<PlanEntry>,
}

impl MovePlan {
    pub fn get(&self, group: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|e| e.group == group)
            .map(|e| e.files.as_slice())
    }

    /// Directories the executor will create.
    pub fn directory_count(&self) -> usize {
        self.entries.len()
    }

    /// Moves the executor will attempt, duplicates included.
    pub fn file_count(&self) -> usize {
        self.entries.iter().map(|e| e.files.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.file_count() == 0
    }
}

/// A file name that appears in more than one place in a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    pub file: String,
    pub groups: Vec<String>,
}

/// Files of `all` whose lowercase suffix equals `extension`.
pub fn resolve_extension<'a>(
    all: &'a Catalog<File>,
    extension: &str,
) -> impl Iterator<Item = &'a File> {
    let extension = extension.to_string();
    all.iter()
        .filter(move |file| file.extension_key() == extension)
}

/// Extension-derived names followed by explicit files, as-is.
fn raw_entry(group: &Group, all: &Catalog<File>) -> PlanEntry {
    let mut files: Vec<String> = group
        .extension_list()
        .iter()
        .flat_map(|ext| resolve_extension(all, &ext.name))
        .map(|file| file.name.clone())
        .collect();
    files.extend(group.file_list().iter().map(|file| file.name.clone()));
    PlanEntry {
        group: group.name.clone(),
        files,
    }
}

/// Every file name that would be moved more than once, with the groups
/// claiming it (a group is repeated when it claims a file twice).
pub fn find_overlaps(groups: &GroupRegistry, all: &Catalog<File>) -> Vec<Overlap> {
    let mut claims: Vec<(String, Vec<String>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for group in groups {
        for file in raw_entry(group, all).files {
            if let Some(&i) = index.get(&file) {
                claims[i].1.push(group.name.clone());
            } else {
                index.insert(file.clone(), claims.len());
                claims.push((file, vec![group.name.clone()]));
            }
        }
    }

    claims
        .into_iter()
        .filter(|(_, groups)| groups.len() > 1)
        .map(|(file, groups)| Overlap { file, groups })
        .collect()
}

/// Compiles groups into a move plan, resolving extension rules against the
/// full file catalog. Every group gets an entry, even an empty one.
pub fn compile(
    groups: &GroupRegistry,
    all: &Catalog<File>,
    policy: OverlapPolicy,
) -> Result<MovePlan, PlanError> {
    let mut claimed: HashMap<String, String> = HashMap::new();
    let mut plan = MovePlan::default();

    for group in groups {
        let mut entry = raw_entry(group, all);

        if policy != OverlapPolicy::Preserve {
            let mut kept = Vec::with_capacity(entry.files.len());
            for file in entry.files {
                if let Some(first) = claimed.get(&file) {
                    if policy == OverlapPolicy::Reject {
                        return Err(PlanError::Conflict {
                            file,
                            first: first.clone(),
                            second: group.name.clone(),
                        });
                    }
                    debug!(%file, %first, dropped_from = %group.name, "Duplicate dropped");
                    continue;
                }
                claimed.insert(file.clone(), group.name.clone());
                kept.push(file);
            }
            entry.files = kept;
        }

        plan.entries.push(entry);
    }

    if policy == OverlapPolicy::Preserve {
        let overlaps = find_overlaps(groups, all);
        if !overlaps.is_empty() {
            warn!("Plan moves {} file(s) more than once", overlaps.len());
        }
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{ListingEntry, ingest};
    use crate::model::Extension;

    fn all_files(names: &[&str]) -> Catalog<File> {
        let listing: Vec<ListingEntry> = names.iter().map(|n| ListingEntry::new(*n, 1)).collect();
        ingest(&listing).files
    }

    fn with_extensions(groups: &mut GroupRegistry, name: &str, exts: &[&str]) {
        let id = groups.create(name).unwrap().id;
        let catalog = exts
            .iter()
            .enumerate()
            .map(|(i, e)| Extension::new(i as u64 + 1, *e))
            .collect();
        groups.by_id_mut(id).unwrap().extensions = Some(catalog);
    }

    fn with_files(groups: &mut GroupRegistry, name: &str, all: &Catalog<File>, files: &[&str]) {
        let id = match groups.by_name(name) {
            Some(g) => g.id,
            None => groups.create(name).unwrap().id,
        };
        let catalog = files
            .iter()
            .filter_map(|f| all.by_name(f).cloned())
            .collect();
        groups.by_id_mut(id).unwrap().files = Some(catalog);
    }

    #[test]
    fn extension_rule_resolves_against_full_catalog() {
        let all = all_files(&["x.pdf", "y.pdf", "z.txt"]);
        let mut groups = GroupRegistry::new();
        with_extensions(&mut groups, "Docs", &["pdf"]);

        let plan = compile(&groups, &all, OverlapPolicy::Preserve).unwrap();
        assert_eq!(
            plan.get("Docs"),
            Some(&["x.pdf".to_string(), "y.pdf".to_string()][..])
        );
    }

    #[test]
    fn extension_match_ignores_case() {
        let all = all_files(&["a.PDF", "b.pdf"]);
        let mut groups = GroupRegistry::new();
        with_extensions(&mut groups, "Docs", &["pdf"]);

        let plan = compile(&groups, &all, OverlapPolicy::Preserve).unwrap();
        assert_eq!(plan.file_count(), 2);
    }

    #[test]
    fn extensions_first_then_explicit_files() {
        let all = all_files(&["a.pdf", "b.txt", "c.jpg"]);
        let mut groups = GroupRegistry::new();
        with_extensions(&mut groups, "Mixed", &["jpg"]);
        with_files(&mut groups, "Mixed", &all, &["b.txt"]);

        let plan = compile(&groups, &all, OverlapPolicy::Preserve).unwrap();
        assert_eq!(
            plan.get("Mixed"),
            Some(&["c.jpg".to_string(), "b.txt".to_string()][..])
        );
    }

    #[test]
    fn empty_groups_still_get_an_entry() {
        let all = all_files(&["a.pdf"]);
        let mut groups = GroupRegistry::new();
        groups.create("Empty").unwrap();

        let plan = compile(&groups, &all, OverlapPolicy::Preserve).unwrap();
        assert_eq!(plan.directory_count(), 1);
        assert!(plan.is_empty());
    }

    // A file matched by one group's extension and assigned to another by name.
    fn overlapping() -> (GroupRegistry, Catalog<File>) {
        let all = all_files(&["a.pdf", "b.pdf"]);
        let mut groups = GroupRegistry::new();
        with_extensions(&mut groups, "Docs", &["pdf"]);
        with_files(&mut groups, "Keep", &all, &["a.pdf"]);
        (groups, all)
    }

    #[test]
    fn preserve_keeps_cross_group_duplicates() {
        let (groups, all) = overlapping();
        let plan = compile(&groups, &all, OverlapPolicy::Preserve).unwrap();

        assert_eq!(plan.file_count(), 3);
        assert_eq!(plan.get("Keep"), Some(&["a.pdf".to_string()][..]));
        assert_eq!(
            find_overlaps(&groups, &all),
            vec![Overlap {
                file: "a.pdf".to_string(),
                groups: vec!["Docs".to_string(), "Keep".to_string()],
            }]
        );
    }

    #[test]
    fn preserve_keeps_within_group_duplicates() {
        let all = all_files(&["a.pdf"]);
        let mut groups = GroupRegistry::new();
        with_extensions(&mut groups, "Docs", &["pdf"]);
        with_files(&mut groups, "Docs", &all, &["a.pdf"]);

        let plan = compile(&groups, &all, OverlapPolicy::Preserve).unwrap();
        assert_eq!(plan.file_count(), 2);
    }

    #[test]
    fn first_group_wins_drops_later_claims() {
        let (groups, all) = overlapping();
        let plan = compile(&groups, &all, OverlapPolicy::FirstGroupWins).unwrap();

        assert_eq!(plan.file_count(), 2);
        assert_eq!(plan.get("Keep"), Some(&[][..]));
    }

    #[test]
    fn reject_reports_conflict() {
        let (groups, all) = overlapping();
        let err = compile(&groups, &all, OverlapPolicy::Reject).unwrap_err();
        assert_eq!(
            err,
            PlanError::Conflict {
                file: "a.pdf".to_string(),
                first: "Docs".to_string(),
                second: "Keep".to_string(),
            }
        );
    }

    #[test]
    fn plan_serializes_as_ordered_entries() {
        let all = all_files(&["a.pdf"]);
        let mut groups = GroupRegistry::new();
        with_extensions(&mut groups, "Docs", &["pdf"]);

        let plan = compile(&groups, &all, OverlapPolicy::Preserve).unwrap();
        let json = serde_json::to_string(&plan).unwrap();
        assert_eq!(json, r#"[{"group":"Docs","files":["a.pdf"]}]"#);
    }
}
