//! Repackaging of Ansible source releases into per-directory collections.
//!
//! The library fetches release archives and a development checkout, indexes
//! every module directory into a collection record (modules, helper
//! libraries, documentation fragments, unit tests and integration targets),
//! persists that index as JSON, materializes each collection into its own
//! namespaced layout with rewritten imports, and hands the layouts to
//! external packaging tools. [`run`] drives the phases in order; each phase
//! is also exposed on its own.

mod assemble;
mod associate;
mod command;
mod config;
mod error;
mod extract;
mod fetch;
mod index;
mod metadata;
mod naming;
mod package;
mod pipeline;
mod progress;
mod release;
mod rewrite;
mod scanner;

pub use assemble::{
    AssemblyReport, GalaxyManifest, SkipReason, assemble_collection, assemble_collections,
    copy_file, copy_tree,
};
pub use associate::{
    TestRoots, UnitIndex, associate_collection, is_task_file, resolve_tests, role_references,
};
pub use command::{CommandOutput, CommandRunner, ShellRunner};
pub use config::{
    DEFAULT_IMPORT_LINE_LIMIT, DevelSource, EngineSettings, Phase, ReleaseFilter, Settings,
    UnitFixture,
};
pub use error::{Error, io_error};
pub use extract::{
    FragmentParseFailure, documentation_block, extract_doc_fragments, extract_module_utils,
};
pub use fetch::{FetchReport, extract_archive, extract_links, fetch_releases, select_archives};
pub use index::{IndexOutcome, build_collection_map, index_release, index_releases};
pub use metadata::{Collection, CollectionMap, MetadataStore};
pub use naming::{CollectionName, is_package_marker, module_stem};
pub use package::{
    EngineReport, PackageReport, build_engine_package, build_packages, build_repodata,
    fpm_command, package_path, prune_tree,
};
pub use pipeline::{RunOptions, RunSummary, run};
pub use release::{Release, ReleaseOrigin, archive_version, discover_releases};
pub use rewrite::{ImportRewrite, ImportRewriter, rewrite_task_file, rewrite_unit_test_imports};
pub use scanner::{ModuleTree, matches_filters, scan_module_tree, seed_collections};
