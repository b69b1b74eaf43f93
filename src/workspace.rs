use crate::catalog::Catalog;
use crate::error::{NameError, PlanError};
use crate::groups::GroupRegistry;
use crate::ingest::{Ingested, Lister, ListingEntry, ingest};
use crate::model::{CatalogItem, Extension, File};
use crate::planner::{self, MovePlan, Overlap, OverlapPolicy};
use crate::resolver;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Everything known about one ingested directory: the initial catalogs,
/// the working catalogs items are dragged out of, the groups, and the
/// search filters applied to the unsorted panes.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub directory: Option<PathBuf>,
    initial_files: Catalog<File>,
    initial_extensions: Catalog<Extension>,
    files: Catalog<File>,
    extensions: Catalog<Extension>,
    pub groups: GroupRegistry,
    pub file_query: String,
    pub extension_query: String,
}

/// Counts for the status bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub files: usize,
    pub total_size: u64,
    pub extensions: usize,
    pub groups: usize,
    pub most_common: Option<(String, usize)>,
}

impl Workspace {
    /// Builds a fresh workspace from a listing; nothing carries over.
    pub fn from_listing(directory: Option<PathBuf>, listing: &[ListingEntry]) -> Self {
        let Ingested { files, extensions } = ingest(listing);
        Self {
            directory,
            files: files.clone(),
            extensions: extensions.clone(),
            initial_files: files,
            initial_extensions: extensions,
            ..Self::default()
        }
    }

    /// Lists `dir` and replaces this workspace. On failure nothing changes.
    pub fn load(&mut self, dir: &Path, lister: &dyn Lister) -> Result<()> {
        let listing = lister.list(dir)?;
        *self = Self::from_listing(Some(dir.to_path_buf()), &listing);
        info!("Loaded {}", dir.display());
        Ok(())
    }

    pub fn initial_files(&self) -> &Catalog<File> {
        &self.initial_files
    }

    pub fn initial_extensions(&self) -> &Catalog<Extension> {
        &self.initial_extensions
    }

    pub fn create_group(&mut self, name: &str) -> Result<u64, NameError> {
        self.groups.create(name).map(|g| g.id)
    }

    pub fn rename_group(&mut self, id: u64, name: &str) -> Result<(), NameError> {
        self.groups.rename(id, name)
    }

    /// Deletes a group and returns what it owned to the unsorted panes.
    pub fn delete_group(&mut self, id: u64) {
        if self.groups.delete(id).is_some() {
            self.refresh();
        }
    }

    /// Empties every group, keeping the groups.
    pub fn reset_groups(&mut self) {
        self.groups.clear_assignments();
        self.refresh();
    }

    pub fn assign_file(&mut self, group_id: u64, file_id: u64) -> bool {
        assign(&mut self.groups, &mut self.files, group_id, file_id)
    }

    pub fn assign_extension(&mut self, group_id: u64, extension_id: u64) -> bool {
        assign(&mut self.groups, &mut self.extensions, group_id, extension_id)
    }

    /// Takes a file out of a group. It shows up as unsorted after [`Self::refresh`].
    pub fn evict_file(&mut self, group_id: u64, file_id: u64) -> bool {
        evict::<File>(&mut self.groups, group_id, file_id)
    }

    pub fn evict_extension(&mut self, group_id: u64, extension_id: u64) -> bool {
        evict::<Extension>(&mut self.groups, group_id, extension_id)
    }

    /// Rebuilds the working catalogs as initial minus everything owned.
    pub fn refresh(&mut self) {
        self.files = resolver::unsorted(&self.initial_files, &self.groups)
            .into_iter()
            .cloned()
            .collect();
        self.extensions = resolver::unsorted(&self.initial_extensions, &self.groups)
            .into_iter()
            .cloned()
            .collect();
    }

    /// Files no group owns, derived from scratch.
    pub fn unsorted_files(&self) -> Vec<&File> {
        resolver::unsorted(&self.initial_files, &self.groups)
    }

    pub fn unsorted_extensions(&self) -> Vec<&Extension> {
        resolver::unsorted(&self.initial_extensions, &self.groups)
    }

    /// The file pane: the working catalog narrowed by the search query.
    pub fn visible_files(&self) -> Vec<&File> {
        resolver::matching(self.files.iter().collect(), &self.file_query)
    }

    pub fn visible_extensions(&self) -> Vec<&Extension> {
        resolver::matching(self.extensions.iter().collect(), &self.extension_query)
    }

    pub fn compile_plan(&self, policy: OverlapPolicy) -> Result<MovePlan, PlanError> {
        planner::compile(&self.groups, &self.initial_files, policy)
    }

    pub fn overlaps(&self) -> Vec<Overlap> {
        planner::find_overlaps(&self.groups, &self.initial_files)
    }

    /// Files an extension rule would pull in, from the full catalog.
    pub fn resolved_count(&self, extension: &str) -> usize {
        planner::resolve_extension(&self.initial_files, extension).count()
    }

    pub fn summary(&self) -> Summary {
        let most_common = self
            .initial_extensions
            .iter()
            .fold(None::<&Extension>, |best, ext| match best {
                Some(b) if b.count >= ext.count => Some(b),
                _ => Some(ext),
            })
            .map(|ext| (ext.name.clone(), ext.count));

        Summary {
            files: self.initial_files.len(),
            total_size: self.initial_files.iter().map(|f| f.size).sum(),
            extensions: self.extensions.len(),
            groups: self.groups.len(),
            most_common,
        }
    }
}

/// Moves an item out of `working` into the group's sub-catalog of the same
/// kind, creating that sub-catalog on first use. Unknown group or item ids
/// leave everything as it was.
fn assign<T: CatalogItem>(
    groups: &mut GroupRegistry,
    working: &mut Catalog<T>,
    group_id: u64,
    item_id: u64,
) -> bool {
    let Some(group) = groups.by_id_mut(group_id) else {
        debug!(group_id, "Assign to unknown group ignored");
        return false;
    };
    let Some(item) = working.remove(item_id) else {
        debug!(item_id, "Assign of unknown item ignored");
        return false;
    };

    let owned = T::owned_mut(group).get_or_insert_with(Catalog::new);
    if !owned.exists_by_name(item.name()) {
        debug!(group_id, item = item.name(), "Assigned");
        owned.add(item);
    }
    true
}

fn evict<T: CatalogItem>(groups: &mut GroupRegistry, group_id: u64, item_id: u64) -> bool {
    groups
        .by_id_mut(group_id)
        .and_then(|group| T::owned_mut(group).as_mut())
        .and_then(|owned| owned.remove(item_id))
        .is_some()
}
