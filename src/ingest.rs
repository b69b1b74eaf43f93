use crate::catalog::Catalog;
use crate::config::Settings;
use crate::model::{Extension, File, extension_key};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One entry of a flat directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub size: u64,
}

impl ListingEntry {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Produces the flat listing a directory is classified from.
pub trait Lister: Send + Sync {
    fn list(&self, dir: &Path) -> Result<Vec<ListingEntry>>;
}

/// Lists regular files directly inside a directory.
pub struct DirLister {
    settings: Settings,
}

impl DirLister {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

impl Lister for DirLister {
    fn list(&self, dir: &Path) -> Result<Vec<ListingEntry>> {
        let paths: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect();

        let entries: Vec<ListingEntry> = paths
            .par_iter()
            .filter_map(|path| {
                let metadata = fs::metadata(path).ok()?;
                if !metadata.is_file() {
                    return None;
                }
                let name = path.strip_prefix(dir).ok()?.to_string_lossy().into_owned();
                if self.settings.is_ignored(&name) {
                    return None;
                }
                Some(ListingEntry::new(name, metadata.len()))
            })
            .collect();

        debug!("Listed {} files in {}", entries.len(), dir.display());
        Ok(entries)
    }
}

/// Catalogs built from one listing.
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub files: Catalog<File>,
    pub extensions: Catalog<Extension>,
}

/// Builds the file catalog (name ascending) and the extension catalog
/// (count descending) from a listing. Extension ids follow first-seen
/// order in the listing.
pub fn ingest(listing: &[ListingEntry]) -> Ingested {
    let mut files = Catalog::new();
    for entry in listing {
        files.add(File::new(files.next_id(), entry.name.clone(), entry.size));
    }
    files.sort();

    let mut extensions: Catalog<Extension> = Catalog::new();
    for entry in listing {
        let key = extension_key(&entry.name);
        if let Some(existing) = extensions.by_name_mut(&key) {
            existing.count += 1;
        } else {
            extensions.add(Extension::new(extensions.next_id(), key));
        }
    }
    extensions.sort();

    info!(
        files = files.len(),
        extensions = extensions.len(),
        "Listing ingested"
    );
    Ingested { files, extensions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File as FsFile;
    use std::io::Write;
    use tempfile::tempdir;

    fn names<T: crate::model::CatalogItem>(catalog: &Catalog<T>) -> Vec<String> {
        catalog.iter().map(|i| i.name().to_string()).collect()
    }

    #[test]
    fn extensions_grouped_case_insensitively() {
        let listing = vec![
            ListingEntry::new("b.TXT", 1),
            ListingEntry::new("c.pdf", 1),
            ListingEntry::new("a.txt", 1),
        ];
        let ingested = ingest(&listing);

        assert_eq!(names(&ingested.files), vec!["a.txt", "b.TXT", "c.pdf"]);
        let counts: Vec<(String, usize)> = ingested
            .extensions
            .iter()
            .map(|e| (e.name.clone(), e.count))
            .collect();
        assert_eq!(
            counts,
            vec![("txt".to_string(), 2), ("pdf".to_string(), 1)]
        );
    }

    #[test]
    fn file_ids_follow_listing_order() {
        let listing = vec![ListingEntry::new("z.md", 1), ListingEntry::new("a.md", 2)];
        let ingested = ingest(&listing);
        assert_eq!(ingested.files.by_name("z.md").map(|f| f.id), Some(1));
        assert_eq!(ingested.files.by_name("a.md").map(|f| f.size), Some(2));
    }

    #[test]
    fn extension_ids_follow_first_seen_order() {
        let listing = vec![
            ListingEntry::new("a.jpg", 1),
            ListingEntry::new("b.pdf", 1),
            ListingEntry::new("c.pdf", 1),
        ];
        let ingested = ingest(&listing);
        assert_eq!(ingested.extensions.by_name("jpg").map(|e| e.id), Some(1));
        assert_eq!(ingested.extensions.by_name("pdf").map(|e| e.id), Some(2));
        assert_eq!(names(&ingested.extensions), vec!["pdf", "jpg"]);
    }

    #[test]
    fn dotless_name_becomes_its_own_extension() {
        let ingested = ingest(&[ListingEntry::new("LICENSE", 1)]);
        assert!(ingested.extensions.exists_by_name("license"));
    }

    #[test]
    fn dir_lister_keeps_visible_regular_files() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path();

        let mut f = FsFile::create(root.join("report.pdf"))?;
        f.write_all(&[0u8; 2048])?;
        FsFile::create(root.join(".hidden"))?;
        FsFile::create(root.join("Thumbs.db"))?;
        fs::create_dir(root.join("nested"))?;

        let settings = Settings {
            ignore: vec!["Thumbs".to_string()],
            ..Settings::default()
        };
        let entries = DirLister::new(settings).list(root)?;

        assert_eq!(entries, vec![ListingEntry::new("report.pdf", 2048)]);
        Ok(())
    }

    #[test]
    fn dir_lister_missing_directory_errors() {
        let lister = DirLister::new(Settings::default());
        let result = lister.list(Path::new("/path/to/non/existent/sortra_test_dir_12345"));
        assert!(result.is_err());
    }
}
