// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Collection assembly.
//!
//! Each collection with real modules is materialized under
//! `collections/ansible_collections/<namespace>/<name>`: a fixed skeleton, a
//! `galaxy.yml` manifest, the module files with their helper imports and
//! fragment references rewritten, the helper libraries and fragments they
//! reference, and their associated tests. Assembly always starts from the
//! release tree, so re-running it over an existing layout overwrites files
//! in place instead of accumulating them.

use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::{
    associate::is_task_file,
    config::Settings,
    error::{self, Error},
    metadata::{Collection, CollectionMap},
    naming::{is_package_marker, module_stem},
    progress,
    release,
    rewrite::{ImportRewriter, rewrite_task_file, rewrite_unit_test_imports},
    scanner::matches_filters,
};

/// Plugin directories created for every collection.
const PLUGIN_DIRS: &[&str] = &["action", "modules", "module_utils", "doc_fragments"];
/// Package markers that make the layout importable.
const PACKAGE_MARKERS: &[&str] = &[
    "plugins/__init__.py",
    "plugins/modules/__init__.py",
    "plugins/module_utils/__init__.py",
    "plugins/doc_fragments/__init__.py",
    "tests/__init__.py",
    "tests/unit/__init__.py",
];

/// `galaxy.yml` contents. Optional fields are written as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
pub struct GalaxyManifest
{
    /// Publishing namespace.
    pub namespace:     String,
    /// Collection name.
    pub name:          String,
    /// Collection version, taken from the release.
    pub version:       String,
    /// Authors list.
    pub authors:       Option<Vec<String,>,>,
    /// One-line description.
    pub description:   Option<String,>,
    /// License identifier.
    pub license:       Option<String,>,
    /// Search tags.
    pub tags:          Option<Vec<String,>,>,
    /// Collection dependencies with version ranges.
    pub dependencies:  Option<BTreeMap<String, String,>,>,
    /// Source repository URL.
    pub repository:    Option<String,>,
    /// Documentation URL.
    pub documentation: Option<String,>,
    /// Homepage URL.
    pub homepage:      Option<String,>,
    /// Issue tracker URL.
    pub issues:        Option<String,>,
}

impl GalaxyManifest
{
    /// Manifest for `collection` published under `namespace`.
    pub fn for_collection(namespace: &str, collection: &Collection,) -> Self
    {
        Self {
            namespace:     namespace.to_owned(),
            name:          collection.name.clone(),
            version:       collection.version.clone(),
            authors:       None,
            description:   None,
            license:       None,
            tags:          None,
            dependencies:  None,
            repository:    None,
            documentation: None,
            homepage:      None,
            issues:        None,
        }
    }
}

/// Why a collection was not materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason
{
    /// Only package markers, or no modules at all.
    NoRealModules,
    /// Excluded by the run's filter substrings.
    Filtered,
}

/// Outcome of assembling one or more releases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize,)]
pub struct AssemblyReport
{
    /// Collection directories written.
    pub materialized: Vec<PathBuf,>,
    /// Collection keys left out, with the reason.
    pub skipped:      Vec<(String, SkipReason,),>,
    /// Referenced helper or fragment sources that did not exist.
    pub missing:      Vec<PathBuf,>,
}

impl AssemblyReport
{
    /// Appends another report.
    pub fn merge(&mut self, other: Self,)
    {
        self.materialized.extend(other.materialized,);
        self.skipped.extend(other.skipped,);
        self.missing.extend(other.missing,);
    }
}

/// Assembles every eligible collection of one release.
///
/// # Errors
///
/// Returns [`Error::Io`] when the layout cannot be written and
/// [`Error::Parse`] when the manifest cannot be serialized.
pub fn assemble_collections(
    settings: &Settings,
    collections: &CollectionMap,
    filters: &[String],
    refresh: bool,
) -> Result<AssemblyReport, Error,>
{
    let pb = progress::spinner();
    let mut report = AssemblyReport::default();

    for (key, collection,) in collections {
        if key.is_empty() || !collection.has_real_modules() {
            debug!("{key} has no real modules, skipping");
            report.skipped.push((key.clone(), SkipReason::NoRealModules,),);
            continue;
        }
        if !matches_filters(key, filters,) {
            report.skipped.push((key.clone(), SkipReason::Filtered,),);
            continue;
        }

        pb.set_message(format!("Assembling {} {}...", collection.name, collection.version),);
        let (dir, missing,) = assemble_collection(settings, collection, refresh,)?;
        report.materialized.push(dir,);
        report.missing.extend(missing,);
    }

    pb.finish_with_message(format!("Assembled {} collections", report.materialized.len()),);
    Ok(report,)
}

/// Materializes one collection and returns its directory together with the
/// referenced sources that were missing.
///
/// # Errors
///
/// Returns [`Error::Io`] when the layout cannot be written.
pub fn assemble_collection(
    settings: &Settings,
    collection: &Collection,
    refresh: bool,
) -> Result<(PathBuf, Vec<PathBuf,>,), Error,>
{
    let cdir = settings.collection_dir(&collection.name,);
    if refresh && cdir.exists() {
        fs::remove_dir_all(&cdir,).map_err(|source| error::io_error(&cdir, source,),)?;
    }

    create_skeleton(&cdir,)?;
    write_manifest(&cdir, &GalaxyManifest::for_collection(&settings.namespace, collection,),)?;

    let rewriter = ImportRewriter::new(settings, &collection.name,);
    let stems: Vec<String,> = collection
        .modules
        .iter()
        .filter(|module| !is_package_marker(module,),)
        .map(|module| module_stem(module,).to_owned(),)
        .collect();
    let mut missing = Vec::new();

    copy_modules(&cdir, collection, &rewriter,)?;
    copy_module_utils(&cdir, collection, settings, &mut missing,)?;
    copy_doc_fragments(&cdir, collection, &mut missing,)?;
    copy_units(&cdir, collection, &stems,)?;
    copy_targets(&cdir, collection, &stems, settings,)?;

    info!("assembled {} {} at {}", collection.name, collection.version, cdir.display());
    Ok((cdir, missing,),)
}

fn create_skeleton(cdir: &Path,) -> Result<(), Error,>
{
    for plugin in PLUGIN_DIRS {
        let dir = cdir.join("plugins",).join(plugin,);
        fs::create_dir_all(&dir,).map_err(|source| error::io_error(&dir, source,),)?;
    }
    for marker in PACKAGE_MARKERS {
        let path = cdir.join(marker,);
        if path.exists() {
            continue;
        }
        if let Some(parent,) = path.parent() {
            fs::create_dir_all(parent,).map_err(|source| error::io_error(parent, source,),)?;
        }
        fs::write(&path, b"",).map_err(|source| error::io_error(&path, source,),)?;
    }
    Ok((),)
}

fn write_manifest(cdir: &Path, manifest: &GalaxyManifest,) -> Result<(), Error,>
{
    let path = cdir.join("galaxy.yml",);
    let document = serde_yaml::to_string(manifest,)?;
    fs::write(&path, document,).map_err(|source| error::io_error(&path, source,),)
}

fn copy_modules(cdir: &Path, collection: &Collection, rewriter: &ImportRewriter<'_,>,) -> Result<(), Error,>
{
    let modules_dir = release::modules_dir(&collection.basedir,);
    let dst_dir = cdir.join("plugins",).join("modules",);

    for module in &collection.modules {
        let src = modules_dir.join(module,);
        if !src.is_file() {
            error!("{} DOES NOT EXIST", src.display());
            continue;
        }
        let dst = dst_dir.join(file_name(module,),);
        copy_file(&src, &dst,)?;
        if is_package_marker(module,) {
            continue;
        }
        rewrite_in_place(&dst, |text| {
            let rewrite = rewriter.rewrite_module_utils_imports(text,);
            Ok(rewriter.rewrite_doc_fragments(&rewrite.text, &collection.docs_fragments,),)
        },)?;
    }
    Ok((),)
}

fn copy_module_utils(
    cdir: &Path,
    collection: &Collection,
    settings: &Settings,
    missing: &mut Vec<PathBuf,>,
) -> Result<(), Error,>
{
    let utils_dir = release::module_utils_dir(&collection.basedir,);
    let dst_dir = cdir.join("plugins",).join("module_utils",);

    for helper in &collection.module_utils {
        if helper.trim().is_empty() || settings.is_blacklisted(helper,) {
            continue;
        }
        let src = utils_dir.join(format!("{}.py", helper.replace('.', "/")),);
        if !src.is_file() {
            error!("{} DOES NOT EXIST", src.display());
            missing.push(src,);
            continue;
        }
        let leaf = helper.rsplit('.',).next().unwrap_or(helper,);
        copy_file(&src, &dst_dir.join(format!("{leaf}.py"),),)?;
    }
    Ok((),)
}

fn copy_doc_fragments(cdir: &Path, collection: &Collection, missing: &mut Vec<PathBuf,>,) -> Result<(), Error,>
{
    let legacy = release::legacy_doc_fragments_dir(&collection.basedir,);
    let src_dir = if legacy.exists() { legacy } else { release::doc_fragments_dir(&collection.basedir,) };
    let dst_dir = cdir.join("plugins",).join("doc_fragments",);

    for fragment in &collection.docs_fragments {
        let file = format!("{}.py", fragment.split('.',).next().unwrap_or(fragment,));
        let src = src_dir.join(&file,);
        if !src.is_file() {
            error!("{} DOES NOT EXIST", src.display());
            missing.push(src,);
            continue;
        }
        copy_file(&src, &dst_dir.join(&file,),)?;
    }
    Ok((),)
}

fn copy_units(cdir: &Path, collection: &Collection, stems: &[String],) -> Result<(), Error,>
{
    if collection.units.is_empty() {
        return Ok((),);
    }
    let units_dir = release::units_dir(&collection.basedir,);
    let dst_dir = cdir.join("tests",).join("unit",);
    fs::create_dir_all(&dst_dir,).map_err(|source| error::io_error(&dst_dir, source,),)?;

    for unit in &collection.units {
        let src = units_dir.join(unit,);
        if src.is_dir() {
            let entries = fs::read_dir(&src,).map_err(|source| error::io_error(&src, source,),)?;
            for entry in entries {
                let entry = entry.map_err(|source| error::io_error(&src, source,),)?;
                let child = entry.path();
                let dst = dst_dir.join(entry.file_name(),);
                if child.is_dir() {
                    if !dst.exists() {
                        copy_tree(&child, &dst,)?;
                    }
                } else {
                    copy_file(&child, &dst,)?;
                }
            }
        } else if src.is_file() {
            copy_file(&src, &dst_dir.join(file_name(unit,),),)?;
        } else {
            warn!("unit test {} does not exist", src.display());
        }
    }

    for entry in WalkDir::new(&dst_dir,) {
        let entry = entry.map_err(|e| error::walk_error(&dst_dir, e,),)?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "py",) {
            continue;
        }
        let depth = path
            .strip_prefix(cdir,)
            .ok()
            .and_then(Path::parent,)
            .map_or(0, |parent| parent.components().count(),);
        rewrite_in_place(path, |text| Ok(rewrite_unit_test_imports(text, stems, depth,),),)?;
    }
    Ok((),)
}

fn copy_targets(cdir: &Path, collection: &Collection, stems: &[String], settings: &Settings,) -> Result<(), Error,>
{
    if collection.targets.is_empty() {
        return Ok((),);
    }
    let targets_dir = release::targets_dir(&collection.basedir,);
    let dst_dir = cdir.join("tests",).join("integration",).join("targets",);
    fs::create_dir_all(&dst_dir,).map_err(|source| error::io_error(&dst_dir, source,),)?;

    for target in &collection.targets {
        let src = targets_dir.join(target,);
        let dst = dst_dir.join(target,);
        if !dst.exists() {
            if !src.is_dir() {
                warn!("integration target {} does not exist", src.display());
                continue;
            }
            copy_tree(&src, &dst,)?;
        }

        for entry in WalkDir::new(&dst,).follow_links(true,) {
            let entry = entry.map_err(|e| error::walk_error(&dst, e,),)?;
            if entry.file_type().is_file() && is_task_file(&dst, entry.path(),) {
                rewrite_in_place(entry.path(), |text| {
                    Ok(rewrite_task_file(text, stems, &settings.namespace, &collection.name,)?,)
                },)?;
            }
        }
    }
    Ok((),)
}

fn file_name(relative: &str,) -> &str
{
    relative.rsplit('/',).next().unwrap_or(relative,)
}

/// Copies a single file, creating the destination's parent directories.
///
/// # Errors
///
/// Returns [`Error::Io`] naming whichever side failed.
pub fn copy_file(src: &Path, dst: &Path,) -> Result<(), Error,>
{
    if let Some(parent,) = dst.parent() {
        fs::create_dir_all(parent,).map_err(|source| error::io_error(parent, source,),)?;
    }
    fs::copy(src, dst,).map_err(|source| error::io_error(src, source,),)?;
    Ok((),)
}

/// Recursively copies the directory `src` to `dst`. Symbolic links are
/// copied as the files or directories they point to; dangling links are
/// logged and skipped.
///
/// # Errors
///
/// Returns [`Error::Io`] when the source cannot be walked or a file cannot
/// be copied.
pub fn copy_tree(src: &Path, dst: &Path,) -> Result<(), Error,>
{
    for entry in WalkDir::new(src,).follow_links(true,) {
        let entry = match entry {
            Ok(entry,) => entry,
            Err(e,) if e.io_error().is_some_and(|io| io.kind() == ErrorKind::NotFound,) => {
                warn!("skipping dangling link {}", e.path().unwrap_or(src,).display());
                continue;
            }
            Err(e,) => return Err(error::walk_error(src, e,),),
        };
        let Ok(relative,) = entry.path().strip_prefix(src,) else {
            continue;
        };
        let target = dst.join(relative,);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target,).map_err(|source| error::io_error(&target, source,),)?;
        } else if entry.file_type().is_file() {
            copy_file(entry.path(), &target,)?;
        }
    }
    Ok((),)
}

/// Applies `rewrite` to a UTF-8 file, writing it back only when the text
/// changed. Files that are not valid UTF-8 are left untouched.
fn rewrite_in_place<F,>(path: &Path, rewrite: F,) -> Result<(), Error,>
where
    F: FnOnce(&str,) -> Result<String, Error,>,
{
    let bytes = fs::read(path,).map_err(|source| error::io_error(path, source,),)?;
    let Ok(text,) = String::from_utf8(bytes,) else {
        debug!("{} is not UTF-8, copied verbatim", path.display());
        return Ok((),);
    };
    let rewritten = rewrite(&text,)?;
    if rewritten != text {
        fs::write(path, rewritten,).map_err(|source| error::io_error(path, source,),)?;
    }
    Ok((),)
}

#[cfg(test)]
mod tests
{
    use std::{fs, path::Path};

    use tempfile::tempdir;

    use super::*;

    fn write(root: &Path, relative: &str, contents: &str,)
    {
        let path = root.join(relative,);
        if let Some(parent,) = path.parent() {
            fs::create_dir_all(parent,).expect("failed to create parent",);
        }
        fs::write(&path, contents,).expect("failed to write file",);
    }

    fn read(root: &Path, relative: &str,) -> String
    {
        fs::read_to_string(root.join(relative,),).expect("failed to read file",)
    }

    fn fixture(root: &Path,) -> (Settings, CollectionMap,)
    {
        let basedir = root.join("releases/ansible-2.7.10",);
        write(
            &basedir,
            "lib/ansible/modules/cloud/vmware/vmware_guest.py",
            "DOCUMENTATION = '''\nextends_documentation_fragment: vmware.documentation\n'''\nfrom ansible.module_utils.basic import AnsibleModule\nfrom ansible.module_utils.vmware import connect_to_api\n",
        );
        write(&basedir, "lib/ansible/modules/cloud/vmware/vmware_host.py", "print('host')\n",);
        write(&basedir, "lib/ansible/modules/cloud/__init__.py", "",);
        write(&basedir, "lib/ansible/module_utils/vmware.py", "# vmware helpers\n",);
        write(&basedir, "lib/ansible/plugins/doc_fragments/vmware.py", "class ModuleDocFragment: pass\n",);
        write(
            &basedir,
            "test/units/modules/cloud/vmware/test_vmware_guest.py",
            "from ansible.modules.cloud.vmware import vmware_guest\n",
        );
        write(&basedir, "test/integration/targets/vmware_guest/tasks/main.yml", "- vmware_guest:\n    name: vm\n",);
        write(&basedir, "test/integration/targets/vmware_guest/aliases", "cloud/vcenter\n",);

        let settings = Settings {
            var_dir: root.to_path_buf(),
            namespace: "acme".to_owned(),
            ..Settings::default()
        };

        let mut vmware = Collection::new(&basedir, "cloud_vmware", "2.7.10",);
        vmware.push_module("cloud/vmware/vmware_guest.py",);
        vmware.push_module("cloud/vmware/vmware_host.py",);
        vmware.add_module_utils(["basic".to_owned(), "vmware".to_owned(), "missing_helper".to_owned()],);
        vmware.add_docs_fragments(["vmware.documentation".to_owned()],);
        vmware.push_unit("modules/cloud/vmware",);
        vmware.push_target("vmware_guest",);

        let mut cloud = Collection::new(&basedir, "cloud", "2.7.10",);
        cloud.push_module("cloud/__init__.py",);

        let mut collections = CollectionMap::new();
        collections.insert("cloud".to_owned(), cloud,);
        collections.insert("cloud/vmware".to_owned(), vmware,);
        (settings, collections,)
    }

    #[test]
    fn collection_is_materialized_with_rewrites()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let (settings, collections,) = fixture(temp.path(),);

        let report = assemble_collections(&settings, &collections, &[], false,).expect("assembly failed",);
        let cdir = settings.collection_dir("cloud_vmware",);
        assert_eq!(report.materialized, vec![cdir.clone()]);
        assert_eq!(report.skipped, vec![("cloud".to_owned(), SkipReason::NoRealModules)]);
        assert_eq!(report.missing.len(), 1);
        assert!(report.missing[0].ends_with("module_utils/missing_helper.py"));

        let guest = read(&cdir, "plugins/modules/vmware_guest.py",);
        assert!(guest.contains("from acme.cloud_vmware.plugins.module_utils.vmware import connect_to_api"));
        assert!(guest.contains("from ansible.module_utils.basic import AnsibleModule"));
        assert!(guest.contains("extends_documentation_fragment: acme.cloud_vmware.vmware.documentation"));

        assert_eq!(read(&cdir, "plugins/module_utils/vmware.py"), "# vmware helpers\n");
        assert!(!cdir.join("plugins/module_utils/basic.py").exists());
        assert!(cdir.join("plugins/doc_fragments/vmware.py").is_file());
        assert!(cdir.join("plugins/action").is_dir());
        assert!(cdir.join("plugins/__init__.py").is_file());

        assert_eq!(
            read(&cdir, "tests/unit/test_vmware_guest.py"),
            "from ...plugins.modules import vmware_guest\n"
        );
        assert_eq!(
            read(&cdir, "tests/integration/targets/vmware_guest/tasks/main.yml"),
            "- acme.cloud_vmware.vmware_guest:\n    name: vm\n"
        );
        assert_eq!(read(&cdir, "tests/integration/targets/vmware_guest/aliases"), "cloud/vcenter\n");
    }

    #[test]
    fn manifest_carries_null_optional_fields()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let (settings, collections,) = fixture(temp.path(),);
        assemble_collections(&settings, &collections, &[], false,).expect("assembly failed",);

        let manifest: GalaxyManifest = serde_yaml::from_str(&read(
            &settings.collection_dir("cloud_vmware",),
            "galaxy.yml",
        ),)
        .expect("manifest should parse",);
        assert_eq!(manifest.namespace, "acme");
        assert_eq!(manifest.name, "cloud_vmware");
        assert_eq!(manifest.version, "2.7.10");
        assert!(manifest.authors.is_none());
        assert!(manifest.issues.is_none());
    }

    #[test]
    fn reassembly_without_refresh_is_stable()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let (settings, collections,) = fixture(temp.path(),);
        assemble_collections(&settings, &collections, &[], false,).expect("first assembly failed",);
        let cdir = settings.collection_dir("cloud_vmware",);
        let first = read(&cdir, "plugins/modules/vmware_guest.py",);
        let count = WalkDir::new(&cdir,).into_iter().count();

        assemble_collections(&settings, &collections, &[], false,).expect("second assembly failed",);
        assert_eq!(read(&cdir, "plugins/modules/vmware_guest.py"), first);
        assert_eq!(WalkDir::new(&cdir).into_iter().count(), count);
    }

    #[test]
    fn refresh_removes_stale_files()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let (settings, collections,) = fixture(temp.path(),);
        let cdir = settings.collection_dir("cloud_vmware",);
        write(&cdir, "plugins/modules/stale.py", "# stale\n",);

        assemble_collections(&settings, &collections, &[], true,).expect("assembly failed",);
        assert!(!cdir.join("plugins/modules/stale.py").exists());
        assert!(cdir.join("plugins/modules/vmware_guest.py").is_file());
    }

    #[test]
    fn filters_skip_collections()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let (settings, collections,) = fixture(temp.path(),);
        let report = assemble_collections(&settings, &collections, &["amazon".to_owned()], false,)
            .expect("assembly failed",);
        assert!(report.materialized.is_empty());
        assert!(report.skipped.contains(&("cloud/vmware".to_owned(), SkipReason::Filtered)));
    }

    #[cfg(unix)]
    #[test]
    fn copy_tree_resolves_symlinks()
    {
        use std::os::unix::fs::symlink;

        let temp = tempdir().expect("failed to create tempdir",);
        let src = temp.path().join("target",);
        write(&src, "tasks/real.yml", "- ping:\n",);
        symlink("real.yml", src.join("tasks/main.yml",),).expect("failed to create symlink",);
        symlink("missing.yml", src.join("tasks/dangling.yml",),).expect("failed to create symlink",);

        let dst = temp.path().join("copy",);
        copy_tree(&src, &dst,).expect("copy failed",);

        assert_eq!(read(&dst, "tasks/main.yml"), "- ping:\n");
        assert!(!fs::symlink_metadata(dst.join("tasks/main.yml"),).expect("missing copy",).is_symlink());
        assert!(!dst.join("tasks/dangling.yml").exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_task_files_are_rewritten()
    {
        use std::os::unix::fs::symlink;

        let temp = tempdir().expect("failed to create tempdir",);
        let (settings, collections,) = fixture(temp.path(),);
        let tasks = temp.path().join("releases/ansible-2.7.10/test/integration/targets/vmware_guest/tasks",);
        write(&tasks, "create.yml", "- vmware_guest:\n    state: present\n",);
        symlink("create.yml", tasks.join("linked.yml",),).expect("failed to create symlink",);

        assemble_collections(&settings, &collections, &[], false,).expect("assembly failed",);
        let cdir = settings.collection_dir("cloud_vmware",);
        assert_eq!(
            read(&cdir, "tests/integration/targets/vmware_guest/tasks/linked.yml"),
            "- acme.cloud_vmware.vmware_guest:\n    state: present\n"
        );
    }

    #[test]
    fn legacy_fragment_location_is_preferred()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let (settings, collections,) = fixture(temp.path(),);
        let basedir = temp.path().join("releases/ansible-2.7.10",);
        write(&basedir, "lib/ansible/utils/module_docs_fragments/vmware.py", "# legacy\n",);

        assemble_collections(&settings, &collections, &[], false,).expect("assembly failed",);
        assert_eq!(
            read(&settings.collection_dir("cloud_vmware",), "plugins/doc_fragments/vmware.py"),
            "# legacy\n"
        );
    }
}
