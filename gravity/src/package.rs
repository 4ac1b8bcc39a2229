// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Package building through external tools.
//!
//! Collection RPMs are produced by `fpm`, the stripped-down engine RPM by the
//! engine's own `make rpm` target, and repository metadata by `createrepo`.
//! All of them run through a [`CommandRunner`].

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::{
    assemble::{copy_file, copy_tree},
    command::CommandRunner,
    config::Settings,
    error::{self, Error},
    metadata::{Collection, CollectionMap},
    progress,
    scanner::matches_filters,
};

const PACKAGE_EXTENSION: &str = "rpm";
const REPODATA_DIR: &str = "repodata";
const ENGINE_RPM_DIR: &str = "rpm-build";

/// Outcome of one packaging run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize,)]
pub struct PackageReport
{
    /// Packages produced during this run.
    pub built:   Vec<PathBuf,>,
    /// Packages that already existed and were kept.
    pub skipped: Vec<PathBuf,>,
}

impl PackageReport
{
    /// Appends another report.
    pub fn merge(&mut self, other: Self,)
    {
        self.built.extend(other.built,);
        self.skipped.extend(other.skipped,);
    }
}

/// Artifact path for a collection: `<prefix><name>-<version>.rpm` inside
/// the repository directory.
pub fn package_path(settings: &Settings, collection: &Collection,) -> PathBuf
{
    settings.repo_dir().join(format!(
        "{}{}-{}.{PACKAGE_EXTENSION}",
        settings.package_prefix, collection.name, collection.version
    ),)
}

/// `fpm` invocation packaging the `plugins` tree of an assembled collection.
pub fn fpm_command(settings: &Settings, collection: &Collection, cdir: &Path, dst: &Path,) -> String
{
    let prefix = settings.install_path.join(&settings.namespace,).join(&collection.name,);
    format!(
        "fpm -t rpm -s dir -n {}{} --version {} -C {} --prefix {} -p {} plugins",
        settings.package_prefix,
        collection.name,
        collection.version,
        cdir.display(),
        prefix.display(),
        dst.display()
    )
}

/// Builds one package per assembled collection of a release.
///
/// Existing packages are kept unless `refresh` is set, in which case they
/// are deleted and rebuilt.
///
/// # Errors
///
/// Returns [`Error::PackagingFailed`] as soon as `fpm` exits non-zero and
/// [`Error::Io`] when the repository directory cannot be prepared.
pub fn build_packages(
    settings: &Settings,
    runner: &dyn CommandRunner,
    collections: &CollectionMap,
    filters: &[String],
    refresh: bool,
) -> Result<PackageReport, Error,>
{
    let repo_dir = settings.repo_dir();
    fs::create_dir_all(&repo_dir,).map_err(|source| error::io_error(&repo_dir, source,),)?;

    let pb = progress::spinner();
    let mut report = PackageReport::default();

    for (key, collection,) in collections {
        if key.is_empty() || !collection.has_real_modules() || !matches_filters(key, filters,) {
            continue;
        }

        let dst = package_path(settings, collection,);
        if refresh && dst.exists() {
            fs::remove_file(&dst,).map_err(|source| error::io_error(&dst, source,),)?;
        }
        if dst.exists() {
            debug!("{} exists, skipping", dst.display());
            report.skipped.push(dst,);
            continue;
        }

        let cdir = settings.collection_dir(&collection.name,);
        if !cdir.is_dir() {
            warn!("{} has not been assembled, skipping {}", cdir.display(), collection.name);
            continue;
        }

        pb.set_message(format!("Packaging {} {}...", collection.name, collection.version),);
        info!("build {}", dst.display());
        let cmd = fpm_command(settings, collection, &cdir, &dst,);
        info!("{cmd}");
        let output = runner.run(&cmd, None,)?;
        if !output.success() {
            info!("{cmd} rc: {}", output.code);
            info!("{}", output.stdout);
            info!("{}", output.stderr);
            pb.abandon_with_message(format!("Packaging {} failed", collection.name),);
            return Err(Error::PackagingFailed {
                command: cmd,
                code:    output.code,
            },);
        }
        report.built.push(dst,);
    }

    pb.finish_with_message(format!(
        "Built {} packages, kept {}",
        report.built.len(),
        report.skipped.len()
    ),);
    Ok(report,)
}

/// Regenerates the repository index: removes `repodata/` and runs
/// `createrepo .` inside the repository directory.
///
/// A failing `createrepo` is logged; the run continues.
///
/// # Errors
///
/// Returns [`Error::Io`] when the old index cannot be removed and
/// [`Error::Command`] when the shell cannot be spawned.
pub fn build_repodata(settings: &Settings, runner: &dyn CommandRunner,) -> Result<(), Error,>
{
    let repo_dir = settings.repo_dir();
    fs::create_dir_all(&repo_dir,).map_err(|source| error::io_error(&repo_dir, source,),)?;

    let repodata = repo_dir.join(REPODATA_DIR,);
    if repodata.exists() {
        fs::remove_dir_all(&repodata,).map_err(|source| error::io_error(&repodata, source,),)?;
    }

    info!("creating repo");
    let output = runner.run("createrepo .", Some(&repo_dir,),)?;
    if !output.success() {
        error!("createrepo exited with {}: {}", output.code, output.stderr.trim());
    }
    Ok((),)
}

/// Outcome of the engine package build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize,)]
pub struct EngineReport
{
    /// Whether the pristine checkout was cloned during this run.
    pub cloned:   bool,
    /// Entries removed from the build copy by whitelist pruning.
    pub pruned:   usize,
    /// Previously published engine packages removed from the repository.
    pub replaced: Vec<PathBuf,>,
    /// Freshly built packages copied into the repository.
    pub copied:   Vec<PathBuf,>,
}

/// Builds the minimal engine package and publishes it to the repository
/// directory. Repository metadata is not regenerated here.
///
/// With `noclean` the clone, copy, prune and build steps are skipped and the
/// packages already present in the build copy are published.
///
/// # Errors
///
/// Returns [`Error::Service`] when the clone fails, [`Error::Fatal`] when
/// `make` exits non-zero and [`Error::Io`] for filesystem failures.
pub fn build_engine_package(
    settings: &Settings,
    runner: &dyn CommandRunner,
    noclean: bool,
) -> Result<EngineReport, Error,>
{
    let engine = &settings.engine;
    let mut report = EngineReport::default();

    if !noclean {
        if !engine.checkout_dir.exists() {
            let cmd = format!(
                "git clone --branch={} {} {}",
                engine.branch,
                engine.repo,
                engine.checkout_dir.display()
            );
            info!("{cmd}");
            let output = runner.run(&cmd, None,)?;
            if !output.success() {
                return Err(Error::service(format!(
                    "{cmd} exited with {}: {}",
                    output.code,
                    output.stderr.trim()
                ),),);
            }
            report.cloned = true;
        }

        if engine.build_dir.exists() {
            fs::remove_dir_all(&engine.build_dir,)
                .map_err(|source| error::io_error(&engine.build_dir, source,),)?;
        }
        copy_tree(&engine.checkout_dir, &engine.build_dir,)?;

        let lib = engine.build_dir.join("lib",).join("ansible",);
        report.pruned += prune_tree(&lib.join("modules",), &engine.module_whitelist,)?;
        report.pruned += prune_tree(&lib.join("module_utils",), &engine.module_util_whitelist,)?;
        debug!("pruned {} entries", report.pruned);

        for cmd in ["make clean", "make rpm"] {
            let output = runner.run(cmd, Some(&engine.build_dir,),)?;
            if !output.success() {
                info!("{}", output.stdout);
                return Err(Error::fatal(format!(
                    "`{cmd}` in {} exited with {}",
                    engine.build_dir.display(),
                    output.code
                ),),);
            }
        }
    }

    let repo_dir = settings.repo_dir();
    fs::create_dir_all(&repo_dir,).map_err(|source| error::io_error(&repo_dir, source,),)?;

    for old in packages_in(&repo_dir,)? {
        let is_engine = old
            .file_name()
            .and_then(|name| name.to_str(),)
            .is_some_and(|name| name.contains(engine.package_marker.as_str(),),);
        if is_engine {
            fs::remove_file(&old,).map_err(|source| error::io_error(&old, source,),)?;
            report.replaced.push(old,);
        }
    }

    for built in packages_in(&engine.build_dir.join(ENGINE_RPM_DIR,),)? {
        let Some(name,) = built.file_name() else {
            continue;
        };
        let dst = repo_dir.join(name,);
        copy_file(&built, &dst,)?;
        report.copied.push(dst,);
    }
    info!("published {} engine packages", report.copied.len());

    Ok(report,)
}

/// `.rpm` files directly inside `dir`, sorted. A missing directory has none.
fn packages_in(dir: &Path,) -> Result<Vec<PathBuf,>, Error,>
{
    if !dir.is_dir() {
        return Ok(Vec::new(),);
    }
    let mut packages = Vec::new();
    for entry in fs::read_dir(dir,).map_err(|source| error::io_error(dir, source,),)? {
        let path = entry.map_err(|source| error::io_error(dir, source,),)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == PACKAGE_EXTENSION,) {
            packages.push(path,);
        }
    }
    packages.sort();
    Ok(packages,)
}

/// Removes every entry below `root` whose path contains none of the
/// whitelist substrings. Directories are visited before their contents, so
/// a rejected directory goes away together with everything inside it.
///
/// Returns the number of removed entries.
///
/// # Errors
///
/// Returns [`Error::Io`] when the tree cannot be walked or an entry cannot
/// be removed.
pub fn prune_tree(root: &Path, whitelist: &[String],) -> Result<usize, Error,>
{
    if !root.is_dir() {
        return Ok(0,);
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(root,).min_depth(1,).sort_by_file_name() {
        let entry = entry.map_err(|e| error::walk_error(root, e,),)?;
        entries.push((entry.path().to_path_buf(), entry.file_type().is_dir(),),);
    }

    let mut removed = 0;
    for (path, is_dir,) in entries {
        if !path.exists() {
            continue;
        }
        let text = path.to_string_lossy();
        if whitelist.iter().any(|keep| text.contains(keep.as_str(),),) {
            continue;
        }
        let result = if is_dir { fs::remove_dir_all(&path,) } else { fs::remove_file(&path,) };
        result.map_err(|source| error::io_error(&path, source,),)?;
        removed += 1;
    }
    Ok(removed,)
}
