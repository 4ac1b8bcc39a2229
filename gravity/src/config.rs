//! Run settings threaded through every pipeline phase.
//!
//! The types in this module mirror the structure of the optional YAML
//! settings document accepted by the CLI. Every field carries a default so
//! that an empty document (or no document at all) yields a working
//! configuration. A [`Settings`] value is built once per run and passed by
//! reference to each component; nothing in the crate reads ambient globals.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{self, Error},
    metadata::MetadataStore,
};

/// Line length above which a rewritten single-line import is reformatted
/// into a parenthesized, one-symbol-per-line block.
pub const DEFAULT_IMPORT_LINE_LIMIT: usize = 160;

const DEFAULT_VAR_DIR: &str = "cache";
const DEFAULT_NAMESPACE: &str = "evicted";
const DEFAULT_PACKAGE_PREFIX: &str = "ansible-collection-";
const DEFAULT_INSTALL_PATH: &str = "/usr/share/ansible/collections/ansible_collections";
const DEFAULT_RELEASES_URL: &str = "https://releases.ansible.com/ansible/";
const DEFAULT_DEVEL_URL: &str = "https://github.com/ansible/ansible.git";
const DEFAULT_DEVEL_BRANCH: &str = "devel";

/// Helper libraries that stay with the engine and are never relocated.
const DEFAULT_MODULE_UTIL_BLACKLIST: &[&str] = &[
    "_text",
    "basic",
    "common.collections",
    "common.dict_transformations",
    "common.removed",
    "config",
    "legacy",
    "parsing.convert_bool",
    "six",
    "six.moves",
    "six.moves.http_client",
    "six.moves.urllib",
    "six.moves.urllib.error",
    "six.moves.urllib.parse",
    "facts",
    "facts.timeout",
    "urls",
];

/// Root settings document.
///
/// # Examples
///
/// ```
/// use gravity::Settings;
///
/// let yaml = r#"
/// var_dir: /var/cache/gravity
/// namespace: acme
/// "#;
/// let settings = Settings::parse(yaml,).expect("valid settings",);
/// assert_eq!(settings.namespace, "acme");
/// assert_eq!(settings.import_line_limit, 160);
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq,)]
#[serde(default)]
pub struct Settings
{
    /// Cache root holding releases, metadata, collections and repos.
    pub var_dir:               PathBuf,
    /// Namespace every assembled collection is published under.
    pub namespace:             String,
    /// Prefix prepended to derived collection names.
    pub collection_prefix:     String,
    /// Prefix prepended to built package names.
    pub package_prefix:        String,
    /// Install root that packaged collections land in.
    pub install_path:          PathBuf,
    /// Helper libraries that are neither copied nor rewritten.
    pub module_util_blacklist: Vec<String,>,
    /// Listing page that tagged release archives are scraped from.
    pub releases_url:          String,
    /// Which tagged releases are considered current.
    pub release_filter:        ReleaseFilter,
    /// Version-controlled development source.
    pub devel:                 DevelSource,
    /// See [`DEFAULT_IMPORT_LINE_LIMIT`].
    pub import_line_limit:     usize,
    /// Fixture detection for unit-test dependencies.
    pub unit_fixture:          UnitFixture,
    /// Abort indexing when a documentation block cannot be parsed at all.
    pub strict_doc_fragments:  bool,
    /// Minimal engine package build.
    pub engine:                EngineSettings,
}

impl Default for Settings
{
    fn default() -> Self
    {
        Self {
            var_dir:               PathBuf::from(DEFAULT_VAR_DIR,),
            namespace:             DEFAULT_NAMESPACE.to_owned(),
            collection_prefix:     String::new(),
            package_prefix:        DEFAULT_PACKAGE_PREFIX.to_owned(),
            install_path:          PathBuf::from(DEFAULT_INSTALL_PATH,),
            module_util_blacklist: DEFAULT_MODULE_UTIL_BLACKLIST
                .iter()
                .map(|name| (*name).to_owned(),)
                .collect(),
            releases_url:          DEFAULT_RELEASES_URL.to_owned(),
            release_filter:        ReleaseFilter::default(),
            devel:                 DevelSource::default(),
            import_line_limit:     DEFAULT_IMPORT_LINE_LIMIT,
            unit_fixture:          UnitFixture::default(),
            strict_doc_fragments:  false,
            engine:                EngineSettings::default(),
        }
    }
}

impl Settings
{
    /// Loads settings from the provided YAML file path.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the file cannot be read or decoded, or when
    /// the decoded values violate invariants.
    pub fn load(path: &Path,) -> Result<Self, Error,>
    {
        let contents = fs::read_to_string(path,).map_err(|source| error::io_error(path, source,),)?;
        Self::parse(&contents,)
    }

    /// Parses settings from a YAML document string.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::Parse`] for malformed YAML and
    /// [`Error::Validation`] for rejected values.
    pub fn parse(contents: &str,) -> Result<Self, Error,>
    {
        let settings: Self = if contents.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(contents,)?
        };
        settings.validate()?;
        Ok(settings,)
    }

    fn validate(&self,) -> Result<(), Error,>
    {
        if self.namespace.trim().is_empty() {
            return Err(Error::validation("namespace must not be empty",),);
        }
        if self.namespace.contains(['.', '/', ' '],) {
            return Err(Error::validation(format!(
                "namespace '{}' must be a single identifier",
                self.namespace
            ),),);
        }
        if self.import_line_limit == 0 {
            return Err(Error::validation("import_line_limit must be positive",),);
        }
        Ok((),)
    }

    /// Returns whether a helper library is kept with the engine.
    pub fn is_blacklisted(&self, helper: &str,) -> bool
    {
        self.module_util_blacklist.iter().any(|name| name == helper,)
    }

    /// Directory holding fetched archives, extracted trees and the checkout.
    pub fn releases_dir(&self,) -> PathBuf
    {
        self.var_dir.join("releases",)
    }

    /// Directory holding one metadata file per release version.
    pub fn meta_dir(&self,) -> PathBuf
    {
        self.var_dir.join("meta",)
    }

    /// Metadata file for the given release version.
    pub fn metadata_path(&self, version: &str,) -> PathBuf
    {
        self.metadata_store().path_for(version,)
    }

    /// Store reading and writing this run's metadata documents.
    pub fn metadata_store(&self,) -> MetadataStore
    {
        MetadataStore::new(self.meta_dir(),)
    }

    /// Root of the assembled collection layout.
    pub fn collections_root(&self,) -> PathBuf
    {
        self.var_dir.join("collections",)
    }

    /// Assembled directory for one collection.
    pub fn collection_dir(&self, name: &str,) -> PathBuf
    {
        self.collections_root().join("ansible_collections",).join(&self.namespace,).join(name,)
    }

    /// Directory receiving built packages and the repository index.
    pub fn repo_dir(&self,) -> PathBuf
    {
        self.var_dir.join("repos",).join("rpm",)
    }
}

/// Predicate selecting which tagged releases are fetched.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq,)]
#[serde(default)]
pub struct ReleaseFilter
{
    /// Required major version.
    pub major:  u32,
    /// Accepted minor versions.
    pub minors: Vec<u32,>,
}

impl Default for ReleaseFilter
{
    fn default() -> Self
    {
        Self {
            major: 2, minors: vec![7],
        }
    }
}

impl ReleaseFilter
{
    /// Returns whether a dotted version string satisfies the predicate.
    ///
    /// Versions that do not start with `<major>.<minor>` never match.
    pub fn matches(&self, version: &str,) -> bool
    {
        let mut parts = version.split('.',);
        let major = parts.next().and_then(|value| value.parse::<u32,>().ok(),);
        let minor = parts.next().and_then(|value| value.parse::<u32,>().ok(),);
        match (major, minor,) {
            (Some(major,), Some(minor,),) => major == self.major && self.minors.contains(&minor,),
            _ => false,
        }
    }
}

/// Development checkout location.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq,)]
#[serde(default)]
pub struct DevelSource
{
    /// Clone URL.
    pub url:    String,
    /// Branch the checkout must be on.
    pub branch: String,
}

impl Default for DevelSource
{
    fn default() -> Self
    {
        Self {
            url: DEFAULT_DEVEL_URL.to_owned(), branch: DEFAULT_DEVEL_BRANCH.to_owned(),
        }
    }
}

/// Unit-test fixture that pulls in a shared conftest.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq,)]
#[serde(default)]
pub struct UnitFixture
{
    /// Substring that marks a unit test as depending on the fixture.
    pub marker:   String,
    /// Conftest path, relative to the unit test root.
    pub conftest: String,
}

impl Default for UnitFixture
{
    fn default() -> Self
    {
        Self {
            marker: "patch_ansible_module".to_owned(), conftest: "modules/conftest.py".to_owned(),
        }
    }
}

/// Settings for the stripped-down engine package.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq,)]
#[serde(default)]
pub struct EngineSettings
{
    /// Repository the engine is built from.
    pub repo:                  String,
    /// Branch checked out for the build.
    pub branch:                String,
    /// Pristine checkout location, cloned once.
    pub checkout_dir:          PathBuf,
    /// Scratch copy that gets pruned and built.
    pub build_dir:             PathBuf,
    /// Paths under `lib/ansible/modules` that survive pruning.
    pub module_whitelist:      Vec<String,>,
    /// Paths under `lib/ansible/module_utils` that survive pruning.
    pub module_util_whitelist: Vec<String,>,
    /// Substring identifying previously published engine packages.
    pub package_marker:        String,
}

impl Default for EngineSettings
{
    fn default() -> Self
    {
        Self {
            repo:                  "https://github.com/jctanner/ansible".to_owned(),
            branch:                "MAZER_DEMO_BRANCH".to_owned(),
            checkout_dir:          PathBuf::from("/tmp/ansible.mazer.checkout",),
            build_dir:             PathBuf::from("/tmp/ansible.mazer.build",),
            module_whitelist:      vec!["modules/__init__.py".to_owned()],
            module_util_whitelist: [
                "module_utils/__init__.py",
                "module_utils/common",
                "module_utils/compat",
                "module_utils/facts",
                "module_utils/parsing",
                "_text",
                "basic",
                "connection.py",
                "json_utils",
                "pycompat24",
                "six",
                "urls",
            ]
            .iter()
            .map(|entry| (*entry).to_owned(),)
            .collect(),
            package_marker:        "MAZERDEMO".to_owned(),
        }
    }
}

/// Pipeline phase selector.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum,)]
#[serde(rename_all = "snake_case")]
pub enum Phase
{
    /// Run every phase in order.
    All,
    /// Fetch and extract releases.
    Releases,
    /// Build metadata files.
    Index,
    /// Materialize collection layouts.
    Assemble,
    /// Build collection packages and the repository index.
    Package,
    /// Build the minimal engine package and the repository index.
    #[value(name = "package_engine")]
    PackageEngine,
}

impl Phase
{
    /// Whether the release fetcher runs.
    pub const fn fetches(self,) -> bool
    {
        matches!(self, Self::All | Self::Releases)
    }

    /// Whether indexing runs.
    pub const fn indexes(self,) -> bool
    {
        matches!(self, Self::All | Self::Index)
    }

    /// Whether assembly runs.
    pub const fn assembles(self,) -> bool
    {
        matches!(self, Self::All | Self::Assemble)
    }

    /// Whether collection packages are built.
    pub const fn packages_collections(self,) -> bool
    {
        matches!(self, Self::All | Self::Package)
    }

    /// Whether the engine package is built.
    pub const fn packages_engine(self,) -> bool
    {
        matches!(self, Self::PackageEngine)
    }

    /// Whether repository metadata is regenerated.
    pub const fn builds_repodata(self,) -> bool
    {
        matches!(self, Self::All | Self::Package | Self::PackageEngine)
    }
}
