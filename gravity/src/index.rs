// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Release indexing.
//!
//! Indexing one release scans its module tree, extracts helper imports and
//! fragment references from every module, associates tests and persists
//! the resulting map as the release's metadata document. A release whose
//! document already exists is skipped unless a refresh is requested.

use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    associate::resolve_tests,
    config::Settings,
    error::{self, Error},
    extract::{extract_doc_fragments, extract_module_utils},
    metadata::CollectionMap,
    naming::is_package_marker,
    release::Release,
    scanner::{scan_module_tree, seed_collections},
};

/// What happened to one release during indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum IndexOutcome
{
    /// A metadata document already existed and was kept.
    Cached
    {
        /// Release version.
        version: String,
        /// Existing document.
        path:    PathBuf,
    },
    /// The release was scanned and its document written.
    Indexed
    {
        /// Release version.
        version:     String,
        /// Written document.
        path:        PathBuf,
        /// Number of collections recorded.
        collections: usize,
    },
}

/// Indexes every release in order.
///
/// # Errors
///
/// Stops at the first release that fails; see [`index_release`].
pub fn index_releases(
    releases: &[Release],
    settings: &Settings,
    filters: &[String],
    refresh: bool,
) -> Result<Vec<IndexOutcome,>, Error,>
{
    releases.iter().map(|release| index_release(release, settings, filters, refresh,),).collect()
}

/// Indexes a single release.
///
/// # Errors
///
/// Returns [`Error::Io`] when the module tree or a module cannot be read,
/// [`Error::Fatal`] when strict fragment parsing is enabled and a
/// documentation block cannot be parsed, and [`Error::Validation`] when two
/// directories derive the same collection name.
pub fn index_release(
    release: &Release,
    settings: &Settings,
    filters: &[String],
    refresh: bool,
) -> Result<IndexOutcome, Error,>
{
    let store = settings.metadata_store();
    let path = store.path_for(&release.version,);
    if store.exists(&release.version,) && !refresh {
        debug!("{} exists, skipping {}", path.display(), release.version);
        return Ok(IndexOutcome::Cached {
            version: release.version.clone(),
            path,
        },);
    }

    info!("index {}", release.basedir.display());
    let collections = build_collection_map(release, settings, filters,)?;
    let path = store.save(&release.version, &collections,)?;

    Ok(IndexOutcome::Indexed {
        version: release.version.clone(),
        path,
        collections: collections.len(),
    },)
}

/// Scans, extracts and associates tests for one release without touching
/// the metadata cache.
///
/// # Errors
///
/// See [`index_release`].
pub fn build_collection_map(
    release: &Release,
    settings: &Settings,
    filters: &[String],
) -> Result<CollectionMap, Error,>
{
    let modules_dir = release.modules_dir();
    let tree = scan_module_tree(&modules_dir, filters,)?;
    let mut collections = seed_collections(release, settings, &tree,);

    for (key, collection,) in collections.iter_mut() {
        let mut helpers = Vec::new();
        let mut fragments = Vec::new();

        for module in collection.modules.iter().filter(|module| !is_package_marker(module,),) {
            let path = modules_dir.join(module,);
            debug!("{}", path.display());
            let bytes = fs::read(&path,).map_err(|source| error::io_error(&path, source,),)?;
            let source = String::from_utf8_lossy(&bytes,);

            helpers.extend(extract_module_utils(&source,),);

            if !module.ends_with(".py",) {
                continue;
            }
            match extract_doc_fragments(&source,) {
                Ok(Some(found,),) => fragments.extend(found,),
                Ok(None,) => {}
                Err(failure,) if settings.strict_doc_fragments => {
                    return Err(Error::fatal(format!(
                        "documentation of {} in collection {key} could not be parsed: {}",
                        path.display(),
                        failure.message
                    ),),);
                }
                Err(failure,) => {
                    warn!(
                        "ignoring fragments of {} in collection {key}: {}",
                        path.display(),
                        failure.message
                    );
                }
            }
        }

        collection.add_module_utils(helpers,);
        collection.add_docs_fragments(fragments,);
    }

    resolve_tests(release, settings, &mut collections,)?;
    Ok(collections,)
}
