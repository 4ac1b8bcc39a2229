// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Module tree discovery.
//!
//! Walks a release's module directory, records every subdirectory as a
//! collection key and assigns each module file to the directory that
//! directly contains it. Files at the tree root belong to no collection and
//! are skipped.

use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::{
    config::Settings,
    error::{self, Error},
    metadata::{Collection, CollectionMap},
    naming::{CollectionName, is_package_marker, normalize_directory_key},
    release::Release,
};

/// Relative directory keys and file paths found under a module tree.
#[derive(Debug, Clone, Default, PartialEq, Eq,)]
pub struct ModuleTree
{
    /// Directory keys, `/`-separated, sorted.
    pub directories: Vec<String,>,
    /// File paths, `/`-separated, sorted.
    pub files:       Vec<String,>,
}

/// Returns whether `candidate` contains every filter substring.
///
/// An empty filter list matches everything.
pub fn matches_filters(candidate: &str, filters: &[String],) -> bool
{
    filters.iter().all(|filter| candidate.contains(filter.as_str(),),)
}

/// Lists directories and files under `modules_dir`.
///
/// Directories are kept when their key contains every filter substring;
/// files are kept when their path contains every filter substring.
///
/// # Errors
///
/// Returns [`Error::Io`] when the tree cannot be walked.
pub fn scan_module_tree(modules_dir: &Path, filters: &[String],) -> Result<ModuleTree, Error,>
{
    let mut tree = ModuleTree::default();

    for entry in WalkDir::new(modules_dir,).min_depth(1,) {
        let entry = entry.map_err(|e| error::walk_error(modules_dir, e,),)?;

        let Ok(relative,) = entry.path().strip_prefix(modules_dir,) else {
            continue;
        };
        let key = normalize_directory_key(&relative.to_string_lossy(),);
        if key.is_empty() || !matches_filters(&key, filters,) {
            continue;
        }

        if entry.file_type().is_dir() {
            tree.directories.push(key,);
        } else if entry.file_type().is_file() {
            tree.files.push(key,);
        }
    }

    tree.directories.sort();
    tree.files.sort();
    Ok(tree,)
}

/// Builds the initial collection records for a release from its module
/// tree. Only `modules` is populated; the extractor and test resolver fill
/// in the rest.
pub fn seed_collections(release: &Release, settings: &Settings, tree: &ModuleTree,) -> CollectionMap
{
    let mut collections = CollectionMap::new();

    for directory in &tree.directories {
        let Some(name,) =
            CollectionName::builder(directory,).prefix(&settings.collection_prefix,).build()
        else {
            continue;
        };
        collections.insert(
            directory.clone(),
            Collection::new(&release.basedir, name, release.version.clone(),),
        );
    }

    for file in &tree.files {
        let Some((directory, _,),) = file.rsplit_once('/',) else {
            debug!("{file} sits at the module tree root, skipping");
            continue;
        };
        if is_package_marker(file,) {
            continue;
        }
        match collections.get_mut(directory,) {
            Some(collection,) => collection.push_module(file.clone(),),
            None => debug!("{file} belongs to filtered directory {directory}, skipping"),
        }
    }

    collections
}

#[cfg(test)]
mod tests
{
    use std::{fs, path::Path};

    use tempfile::tempdir;

    use super::*;
    use crate::release::ReleaseOrigin;

    fn touch(root: &Path, relative: &str,)
    {
        let path = root.join(relative,);
        if let Some(parent,) = path.parent() {
            fs::create_dir_all(parent,).expect("failed to create parent",);
        }
        fs::write(&path, "# module\n",).expect("failed to write file",);
    }

    fn release_at(basedir: &Path,) -> Release
    {
        Release {
            basedir: basedir.to_path_buf(),
            version: "2.7.10".to_owned(),
            origin:  ReleaseOrigin::Archive,
        }
    }

    fn populate(basedir: &Path,)
    {
        let modules = basedir.join("lib/ansible/modules",);
        touch(&modules, "__init__.py",);
        touch(&modules, "stray.py",);
        touch(&modules, "cloud/__init__.py",);
        touch(&modules, "cloud/vmware/__init__.py",);
        touch(&modules, "cloud/vmware/vmware_host.py",);
        touch(&modules, "cloud/vmware/vmware_guest.py",);
        touch(&modules, "system/ping.py",);
    }

    #[test]
    fn scan_lists_relative_paths()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        populate(temp.path(),);

        let tree = scan_module_tree(&temp.path().join("lib/ansible/modules",), &[],)
            .expect("scan failed",);
        assert_eq!(tree.directories, vec!["cloud", "cloud/vmware", "system"]);
        assert!(tree.files.contains(&"cloud/vmware/vmware_guest.py".to_owned()));
        assert!(tree.files.contains(&"stray.py".to_owned()));
    }

    #[test]
    fn seeding_assigns_files_to_their_directory()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        populate(temp.path(),);
        let release = release_at(temp.path(),);

        let tree = scan_module_tree(&release.modules_dir(), &[],).expect("scan failed",);
        let collections = seed_collections(&release, &Settings::default(), &tree,);

        let keys: Vec<&str,> = collections.keys().map(String::as_str,).collect();
        assert_eq!(keys, vec!["cloud", "cloud/vmware", "system"]);

        let vmware = &collections["cloud/vmware"];
        assert_eq!(vmware.name, "cloud_vmware");
        assert_eq!(vmware.version, "2.7.10");
        assert_eq!(
            vmware.modules,
            vec!["cloud/vmware/vmware_guest.py", "cloud/vmware/vmware_host.py"]
        );
        assert!(collections["cloud"].modules.is_empty());
        assert!(!collections["cloud"].has_real_modules());
    }

    #[test]
    fn filters_restrict_directories_and_files()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        populate(temp.path(),);
        let release = release_at(temp.path(),);
        let filters = vec!["vmware".to_owned()];

        let tree = scan_module_tree(&release.modules_dir(), &filters,).expect("scan failed",);
        let collections = seed_collections(&release, &Settings::default(), &tree,);

        assert_eq!(collections.keys().collect::<Vec<_>>(), vec!["cloud/vmware"]);
        assert!(tree.files.iter().all(|file| file.contains("vmware")));
    }

    #[test]
    fn filters_are_combined_with_and()
    {
        let filters = vec!["cloud".to_owned(), "guest".to_owned()];
        assert!(matches_filters("cloud/vmware/vmware_guest.py", &filters));
        assert!(!matches_filters("cloud/vmware/vmware_host.py", &filters));
        assert!(matches_filters("anything", &[]));
    }

    #[test]
    fn prefix_is_applied_to_names()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        populate(temp.path(),);
        let release = release_at(temp.path(),);
        let settings = Settings {
            collection_prefix: "ansible_".to_owned(), ..Settings::default()
        };

        let tree = scan_module_tree(&release.modules_dir(), &[],).expect("scan failed",);
        let collections = seed_collections(&release, &settings, &tree,);
        assert_eq!(collections["system"].name, "ansible_system");
    }

    #[test]
    fn missing_tree_is_an_io_error()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let result = scan_module_tree(&temp.path().join("absent",), &[],);
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
