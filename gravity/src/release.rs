// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Locally cached release trees.
//!
//! A release is either an extracted archive (`ansible-<version>.tar.gz`
//! unpacked next to itself) or the development checkout `devel.git`, whose
//! version is read from `lib/ansible/release.py`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    config::Settings,
    error::{self, Error},
};

/// Suffix of fetched release archives.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";
/// Directory name of the development checkout inside `releases/`.
pub const DEVEL_CHECKOUT: &str = "devel.git";
const ARCHIVE_STEM_PREFIX: &str = "ansible-";

/// Where a release tree came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseOrigin
{
    /// Extracted tagged archive.
    Archive,
    /// Version-controlled development checkout.
    Checkout,
}

/// A fetched and extracted (or checked-out) source tree for one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
pub struct Release
{
    /// Root of the source tree.
    pub basedir: PathBuf,
    /// Version string identifying the release.
    pub version: String,
    /// Archive or checkout.
    pub origin:  ReleaseOrigin,
}

impl Release
{
    /// Directory whose subdirectories become collections.
    pub fn modules_dir(&self,) -> PathBuf
    {
        modules_dir(&self.basedir,)
    }

    /// Helper library root.
    pub fn module_utils_dir(&self,) -> PathBuf
    {
        module_utils_dir(&self.basedir,)
    }

    /// Pre-plugin documentation fragment location.
    pub fn legacy_doc_fragments_dir(&self,) -> PathBuf
    {
        legacy_doc_fragments_dir(&self.basedir,)
    }

    /// Plugin-style documentation fragment location.
    pub fn doc_fragments_dir(&self,) -> PathBuf
    {
        doc_fragments_dir(&self.basedir,)
    }

    /// Unit-test root.
    pub fn units_dir(&self,) -> PathBuf
    {
        units_dir(&self.basedir,)
    }

    /// Integration-test target root.
    pub fn targets_dir(&self,) -> PathBuf
    {
        targets_dir(&self.basedir,)
    }
}

/// `lib/ansible/modules` under a release root.
pub fn modules_dir(basedir: &Path,) -> PathBuf
{
    basedir.join("lib",).join("ansible",).join("modules",)
}

/// `lib/ansible/module_utils` under a release root.
pub fn module_utils_dir(basedir: &Path,) -> PathBuf
{
    basedir.join("lib",).join("ansible",).join("module_utils",)
}

/// `lib/ansible/utils/module_docs_fragments` under a release root.
pub fn legacy_doc_fragments_dir(basedir: &Path,) -> PathBuf
{
    basedir.join("lib",).join("ansible",).join("utils",).join("module_docs_fragments",)
}

/// `lib/ansible/plugins/doc_fragments` under a release root.
pub fn doc_fragments_dir(basedir: &Path,) -> PathBuf
{
    basedir.join("lib",).join("ansible",).join("plugins",).join("doc_fragments",)
}

/// `test/units` under a release root.
pub fn units_dir(basedir: &Path,) -> PathBuf
{
    basedir.join("test",).join("units",)
}

/// `test/integration/targets` under a release root.
pub fn targets_dir(basedir: &Path,) -> PathBuf
{
    basedir.join("test",).join("integration",).join("targets",)
}

/// Splits an archive file name into its extraction directory and version.
///
/// # Examples
///
/// ```
/// use gravity::archive_version;
///
/// assert_eq!(
///     archive_version("ansible-2.7.10.tar.gz"),
///     Some(("ansible-2.7.10".to_owned(), "2.7.10".to_owned()))
/// );
/// assert_eq!(archive_version("ansible-2.7.10.zip"), None);
/// ```
pub fn archive_version(file_name: &str,) -> Option<(String, String,),>
{
    let stem = file_name.strip_suffix(ARCHIVE_SUFFIX,)?;
    if stem.is_empty() {
        return None;
    }
    let version = stem.strip_prefix(ARCHIVE_STEM_PREFIX,).unwrap_or(stem,);
    Some((stem.to_owned(), version.to_owned(),),)
}

/// Extracts the value of a `__version__ = '...'` assignment.
pub fn parse_version_line(line: &str,) -> Option<String,>
{
    if !line.starts_with("__version__",) {
        return None;
    }
    let value = line.split_whitespace().last()?.trim_matches(|ch| ch == '"' || ch == '\'',);
    if value.is_empty() || value.contains('=',) {
        return None;
    }
    Some(value.to_owned(),)
}

/// Reads a checkout's version from `lib/ansible/release.py`.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read and
/// [`Error::Validation`] when it carries no version assignment.
pub fn checkout_version(basedir: &Path,) -> Result<String, Error,>
{
    let path = basedir.join("lib",).join("ansible",).join("release.py",);
    let contents = fs::read_to_string(&path,).map_err(|source| error::io_error(&path, source,),)?;
    contents.lines().find_map(parse_version_line,).ok_or_else(|| {
        Error::validation(format!("no __version__ assignment in {}", path.display()),)
    },)
}

/// Lists the releases present in the cache, archives first (sorted by file
/// name) followed by the development checkout.
///
/// Archives whose extraction directory is missing, and a missing checkout,
/// are logged and skipped.
///
/// # Errors
///
/// Returns [`Error::Io`] when the releases directory exists but cannot be
/// listed, and propagates version lookup failures for the checkout.
pub fn discover_releases(settings: &Settings, devel_only: bool,) -> Result<Vec<Release,>, Error,>
{
    let releases_dir = settings.releases_dir();
    let mut releases = Vec::new();

    if !devel_only && releases_dir.is_dir() {
        let entries =
            fs::read_dir(&releases_dir,).map_err(|source| error::io_error(&releases_dir, source,),)?;
        let mut archives: Vec<String,> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| error::io_error(&releases_dir, source,),)?;
            if let Some(name,) = entry.file_name().to_str()
                && name.ends_with(ARCHIVE_SUFFIX,)
            {
                archives.push(name.to_owned(),);
            }
        }
        archives.sort();

        for archive in archives {
            let Some((stem, version,),) = archive_version(&archive,) else {
                continue;
            };
            let basedir = releases_dir.join(&stem,);
            if !basedir.is_dir() {
                warn!("{archive} has not been extracted, skipping");
                continue;
            }
            debug!("found release {version} at {}", basedir.display());
            releases.push(Release {
                basedir,
                version,
                origin: ReleaseOrigin::Archive,
            },);
        }
    }

    let checkout = releases_dir.join(DEVEL_CHECKOUT,);
    if checkout.is_dir() {
        let version = checkout_version(&checkout,)?;
        debug!("found checkout {version} at {}", checkout.display());
        releases.push(Release {
            basedir: checkout,
            version,
            origin: ReleaseOrigin::Checkout,
        },);
    } else {
        warn!("no development checkout at {}", checkout.display());
    }

    Ok(releases,)
}

#[cfg(test)]
mod tests
{
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn settings_for(var_dir: &Path,) -> Settings
    {
        Settings {
            var_dir: var_dir.to_path_buf(), ..Settings::default()
        }
    }

    fn write_release_py(basedir: &Path, version: &str,)
    {
        let lib = basedir.join("lib/ansible",);
        fs::create_dir_all(&lib,).expect("failed to create lib dir",);
        fs::write(
            lib.join("release.py",),
            format!("from __future__ import absolute_import\n\n__version__ = '{version}'\n__author__ = 'x'\n"),
        )
        .expect("failed to write release.py",);
    }

    #[test]
    fn archive_version_requires_suffix()
    {
        assert_eq!(
            archive_version("ansible-2.7.1.tar.gz"),
            Some(("ansible-2.7.1".to_owned(), "2.7.1".to_owned()))
        );
        assert_eq!(archive_version(".tar.gz"), None);
        assert_eq!(archive_version("devel.git"), None);
    }

    #[test]
    fn version_line_parsing_handles_quotes()
    {
        assert_eq!(parse_version_line("__version__ = '2.8.0.dev0'").as_deref(), Some("2.8.0.dev0"));
        assert_eq!(parse_version_line("__version__ = \"2.9.1\"").as_deref(), Some("2.9.1"));
        assert_eq!(parse_version_line("__author__ = 'x'"), None);
        assert_eq!(parse_version_line("__version__ ="), None);
    }

    #[test]
    fn checkout_version_reads_release_file()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        write_release_py(temp.path(), "2.8.0.dev0",);
        let version = checkout_version(temp.path(),).expect("version lookup failed",);
        assert_eq!(version, "2.8.0.dev0");
    }

    #[test]
    fn checkout_version_rejects_missing_assignment()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let lib = temp.path().join("lib/ansible",);
        fs::create_dir_all(&lib,).expect("failed to create lib dir",);
        fs::write(lib.join("release.py",), "# nothing\n",).expect("failed to write",);
        assert!(matches!(checkout_version(temp.path()), Err(Error::Validation { .. })));
    }

    #[test]
    fn discover_lists_extracted_archives_then_checkout()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let settings = settings_for(temp.path(),);
        let releases_dir = settings.releases_dir();
        fs::create_dir_all(releases_dir.join("ansible-2.7.2",),).expect("mkdir failed",);
        fs::create_dir_all(releases_dir.join("ansible-2.7.10",),).expect("mkdir failed",);
        fs::write(releases_dir.join("ansible-2.7.2.tar.gz",), b"",).expect("write failed",);
        fs::write(releases_dir.join("ansible-2.7.10.tar.gz",), b"",).expect("write failed",);
        fs::write(releases_dir.join("ansible-2.7.3.tar.gz",), b"",).expect("write failed",);
        write_release_py(&releases_dir.join(DEVEL_CHECKOUT,), "2.8.0.dev0",);

        let releases = discover_releases(&settings, false,).expect("discovery failed",);
        let versions: Vec<&str,> = releases.iter().map(|release| release.version.as_str(),).collect();
        assert_eq!(versions, vec!["2.7.10", "2.7.2", "2.8.0.dev0"]);
        assert_eq!(releases[2].origin, ReleaseOrigin::Checkout);
        assert_eq!(releases[0].modules_dir(), releases_dir.join("ansible-2.7.10/lib/ansible/modules"));
    }

    #[test]
    fn devel_only_skips_archives()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let settings = settings_for(temp.path(),);
        let releases_dir = settings.releases_dir();
        fs::create_dir_all(releases_dir.join("ansible-2.7.2",),).expect("mkdir failed",);
        fs::write(releases_dir.join("ansible-2.7.2.tar.gz",), b"",).expect("write failed",);
        write_release_py(&releases_dir.join(DEVEL_CHECKOUT,), "2.8.0.dev0",);

        let releases = discover_releases(&settings, true,).expect("discovery failed",);
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].origin, ReleaseOrigin::Checkout);
    }

    #[cfg(unix)]
    #[test]
    fn discover_skips_undecodable_and_foreign_entries()
    {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let temp = tempdir().expect("failed to create tempdir",);
        let settings = settings_for(temp.path(),);
        let releases_dir = settings.releases_dir();
        fs::create_dir_all(releases_dir.join("ansible-2.7.2",),).expect("mkdir failed",);
        fs::write(releases_dir.join("ansible-2.7.2.tar.gz",), b"",).expect("write failed",);
        fs::write(releases_dir.join("index.html",), b"",).expect("write failed",);
        fs::write(releases_dir.join(OsStr::from_bytes(b"ansible-\xff.tar.gz",),), b"",)
            .expect("write failed",);

        let releases = discover_releases(&settings, false,).expect("discovery failed",);
        let versions: Vec<&str,> = releases.iter().map(|release| release.version.as_str(),).collect();
        assert_eq!(versions, vec!["2.7.2"]);
    }

    #[test]
    fn discover_tolerates_empty_cache()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let releases = discover_releases(&settings_for(temp.path(),), false,)
            .expect("discovery failed",);
        assert!(releases.is_empty());
    }
}
