//! Collection records and their on-disk JSON cache.
//!
//! One metadata document exists per release version. It maps a collection's
//! directory key (relative to the module tree) to the collection's modules,
//! referenced helper libraries, documentation fragments and associated
//! tests. Keys are kept in a [`BTreeMap`] so documents are written in a
//! deterministic order.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::{self, Error},
    naming::is_package_marker,
};

/// Collections of one release keyed by directory.
pub type CollectionMap = BTreeMap<String, Collection,>;

/// Everything the assembler needs to know about one module directory.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize,)]
pub struct Collection
{
    /// Root of the owning release tree.
    pub basedir:        PathBuf,
    /// Derived collection name (directory key with `/` replaced by `_`).
    pub name:           String,
    /// Version of the owning release.
    pub version:        String,
    /// Module files relative to the module tree, in discovery order.
    #[serde(default)]
    pub modules:        Vec<String,>,
    /// Helper library names referenced by any module, sorted and unique.
    #[serde(default)]
    pub module_utils:   Vec<String,>,
    /// Documentation fragment names referenced by any module, sorted and
    /// unique.
    #[serde(default)]
    pub docs_fragments: Vec<String,>,
    /// Unit-test paths relative to the release's unit test root.
    #[serde(default)]
    pub units:          Vec<String,>,
    /// Integration-test target names.
    #[serde(default)]
    pub targets:        Vec<String,>,
}

impl Collection
{
    /// Creates an empty record for a directory of the given release.
    pub fn new(basedir: &Path, name: impl Into<String,>, version: impl Into<String,>,) -> Self
    {
        Self {
            basedir: basedir.to_path_buf(),
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Returns `true` when at least one module is not a package marker.
    ///
    /// Collections failing this check are never assembled or packaged.
    pub fn has_real_modules(&self,) -> bool
    {
        self.modules.iter().any(|module| !is_package_marker(module,),)
    }

    /// Appends a module path unless it is already recorded.
    pub fn push_module(&mut self, module: impl Into<String,>,)
    {
        push_unique(&mut self.modules, module.into(),);
    }

    /// Merges helper names, keeping the list sorted and unique.
    pub fn add_module_utils<I,>(&mut self, names: I,)
    where
        I: IntoIterator<Item = String,>,
    {
        merge_sorted(&mut self.module_utils, names,);
    }

    /// Merges fragment names, keeping the list sorted and unique.
    pub fn add_docs_fragments<I,>(&mut self, names: I,)
    where
        I: IntoIterator<Item = String,>,
    {
        merge_sorted(&mut self.docs_fragments, names,);
    }

    /// Appends a unit-test path unless it is already recorded.
    pub fn push_unit(&mut self, unit: impl Into<String,>,)
    {
        push_unique(&mut self.units, unit.into(),);
    }

    /// Appends an integration target unless it is already recorded.
    ///
    /// Returns `true` when the target was new.
    pub fn push_target(&mut self, target: impl Into<String,>,) -> bool
    {
        push_unique(&mut self.targets, target.into(),)
    }
}

fn push_unique(list: &mut Vec<String,>, value: String,) -> bool
{
    if list.contains(&value,) {
        return false;
    }
    list.push(value,);
    true
}

fn merge_sorted<I,>(list: &mut Vec<String,>, values: I,)
where
    I: IntoIterator<Item = String,>,
{
    list.extend(values.into_iter().filter(|value| !value.trim().is_empty(),),);
    list.sort();
    list.dedup();
}

/// Reads and writes metadata documents under the cache's `meta/` directory.
#[derive(Debug, Clone,)]
pub struct MetadataStore
{
    dir: PathBuf,
}

impl MetadataStore
{
    /// Creates a store rooted at `dir`. The directory is created lazily on
    /// first save.
    pub fn new(dir: impl Into<PathBuf,>,) -> Self
    {
        Self {
            dir: dir.into(),
        }
    }

    /// Path of the metadata document for `version`.
    pub fn path_for(&self, version: &str,) -> PathBuf
    {
        self.dir.join(format!("ansible-{version}-meta.json"),)
    }

    /// Returns whether a cached document exists for `version`.
    pub fn exists(&self, version: &str,) -> bool
    {
        self.path_for(version,).is_file()
    }

    /// Loads the document for `version`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read and
    /// [`Error::Serialize`] when it is not a valid document.
    pub fn load(&self, version: &str,) -> Result<CollectionMap, Error,>
    {
        let path = self.path_for(version,);
        let contents = fs::read_to_string(&path,).map_err(|source| error::io_error(&path, source,),)?;
        Ok(serde_json::from_str(&contents,)?,)
    }

    /// Persists `collections` as the document for `version`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when two collections share a name and
    /// version, and I/O or serialization errors from writing the file.
    pub fn save(&self, version: &str, collections: &CollectionMap,) -> Result<PathBuf, Error,>
    {
        ensure_unique_identities(collections,)?;

        fs::create_dir_all(&self.dir,).map_err(|source| error::io_error(&self.dir, source,),)?;
        let path = self.path_for(version,);
        let document = serde_json::to_string_pretty(collections,)?;
        fs::write(&path, document,).map_err(|source| error::io_error(&path, source,),)?;
        info!("wrote {} collections to {}", collections.len(), path.display());
        Ok(path,)
    }
}

/// Rejects maps in which two directory keys derive the same collection
/// identity (for example `a/b_c` and `a_b/c`).
///
/// # Errors
///
/// Returns [`Error::Validation`] naming both keys.
pub fn ensure_unique_identities(collections: &CollectionMap,) -> Result<(), Error,>
{
    let mut seen: HashMap<(&str, &str,), &str,> = HashMap::with_capacity(collections.len(),);
    for (key, collection,) in collections {
        let identity = (collection.name.as_str(), collection.version.as_str(),);
        if let Some(previous,) = seen.insert(identity, key.as_str(),) {
            return Err(Error::validation(format!(
                "collection '{}' version {} derived from both '{previous}' and '{key}'",
                collection.name, collection.version
            ),),);
        }
    }
    Ok((),)
}
