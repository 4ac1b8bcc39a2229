// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Test association by naming convention.
//!
//! Integration targets share a module's bare name; unit tests are named
//! `test_<module>.py` anywhere under the unit-test root. Per-collection unit
//! directories live at `modules/<key>` and helper-library tests at
//! `module_utils/<segment>` where the segment is the second component of the
//! collection key (or the key itself when it has a single component).
//!
//! Role references found in a target's task files are followed one level:
//! only targets recorded by name matching are scanned, never targets that
//! were themselves added by a role reference.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;
use walkdir::WalkDir;

use crate::{
    config::{Settings, UnitFixture},
    error::{self, Error},
    metadata::{Collection, CollectionMap},
    naming::module_stem,
    release::Release,
};

/// Task keywords that pull in another role.
const ROLE_KEYWORDS: &[&str] = &["include_role", "import_role"];

/// Index of unit-test files by file name.
#[derive(Debug, Clone, Default,)]
pub struct UnitIndex
{
    by_name: BTreeMap<String, Vec<String,>,>,
}

impl UnitIndex
{
    /// Walks `units_dir` once and records every file relative to it.
    ///
    /// A missing directory yields an empty index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the tree cannot be walked.
    pub fn build(units_dir: &Path,) -> Result<Self, Error,>
    {
        let mut index = Self::default();
        if !units_dir.is_dir() {
            return Ok(index,);
        }

        for entry in WalkDir::new(units_dir,).sort_by_file_name() {
            let entry = entry.map_err(|e| error::walk_error(units_dir, e,),)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative,) = entry.path().strip_prefix(units_dir,) else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            index
                .by_name
                .entry(name,)
                .or_default()
                .push(relative.to_string_lossy().replace('\\', "/",),);
        }
        Ok(index,)
    }

    /// Relative paths of every file called `name`.
    pub fn lookup(&self, name: &str,) -> &[String]
    {
        self.by_name.get(name,).map(Vec::as_slice,).unwrap_or(&[],)
    }
}

/// Fills `units` and `targets` for every collection of a release.
///
/// # Errors
///
/// Returns [`Error::Io`] when the test trees or a task file cannot be read.
pub fn resolve_tests(
    release: &Release,
    settings: &Settings,
    collections: &mut CollectionMap,
) -> Result<(), Error,>
{
    let units_dir = release.units_dir();
    let targets_dir = release.targets_dir();
    let index = UnitIndex::build(&units_dir,)?;

    for (key, collection,) in collections.iter_mut() {
        associate_collection(
            key,
            collection,
            &TestRoots {
                units_dir: &units_dir, targets_dir: &targets_dir,
            },
            &index,
            &settings.unit_fixture,
        )?;
        debug!(
            "{key}: {} units, {} targets",
            collection.units.len(),
            collection.targets.len()
        );
    }
    Ok((),)
}

/// Unit and integration test roots of one release.
#[derive(Debug, Clone, Copy,)]
pub struct TestRoots<'a,>
{
    /// `test/units`.
    pub units_dir:   &'a Path,
    /// `test/integration/targets`.
    pub targets_dir: &'a Path,
}

/// Associates tests with a single collection.
///
/// # Errors
///
/// Returns [`Error::Io`] when a task file or unit-test file cannot be read.
pub fn associate_collection(
    key: &str,
    collection: &mut Collection,
    roots: &TestRoots<'_,>,
    index: &UnitIndex,
    fixture: &UnitFixture,
) -> Result<(), Error,>
{
    let stems: Vec<String,> =
        collection.modules.iter().map(|module| module_stem(module,).to_owned(),).collect();

    for stem in &stems {
        if roots.targets_dir.join(stem,).is_dir() {
            collection.push_target(stem.as_str(),);
        }
        for unit in index.lookup(&format!("test_{stem}.py"),) {
            collection.push_unit(unit.as_str(),);
        }
    }

    let modules_unit_dir = format!("modules/{key}");
    if roots.units_dir.join(&modules_unit_dir,).exists() {
        collection.push_unit(modules_unit_dir,);
    }

    let segment = helper_test_segment(key,);
    let helper_dir = format!("module_utils/{segment}");
    if roots.units_dir.join(&helper_dir,).exists() {
        collection.push_unit(helper_dir,);
    }
    let helper_file = format!("module_utils/test_{segment}.py");
    if roots.units_dir.join(&helper_file,).exists() {
        collection.push_unit(helper_file,);
    }

    expand_role_targets(collection, roots.targets_dir,)?;

    if !fixture.marker.is_empty() && units_reference(roots.units_dir, &collection.units, &fixture.marker,)? {
        debug!("{key} units use {}, adding {}", fixture.marker, fixture.conftest);
        collection.push_unit(fixture.conftest.as_str(),);
    }

    Ok((),)
}

/// Component of a collection key used to find helper-library tests.
pub fn helper_test_segment(key: &str,) -> &str
{
    match key.split_once('/',) {
        Some((_, rest,),) => rest.split('/',).next().unwrap_or(rest,),
        None => key,
    }
}

/// Adds the roles referenced by each currently recorded target.
fn expand_role_targets(collection: &mut Collection, targets_dir: &Path,) -> Result<(), Error,>
{
    let recorded = collection.targets.clone();
    for target in recorded {
        for role in target_role_references(&targets_dir.join(&target,),)? {
            if targets_dir.join(&role,).is_dir() && collection.push_target(role.as_str(),) {
                debug!("{target} pulls in role {role}");
            }
        }
    }
    Ok((),)
}

/// Role names referenced from the task files of one target.
///
/// # Errors
///
/// Returns [`Error::Io`] when a task file cannot be read.
pub fn target_role_references(target_dir: &Path,) -> Result<Vec<String,>, Error,>
{
    let mut roles = Vec::new();
    for path in task_files(target_dir,)? {
        let text = fs::read_to_string(&path,).map_err(|source| error::io_error(&path, source,),)?;
        for role in role_references(&text,) {
            if !roles.contains(&role,) {
                roles.push(role,);
            }
        }
    }
    Ok(roles,)
}

/// YAML files below any `tasks` directory of a target.
fn task_files(target_dir: &Path,) -> Result<Vec<PathBuf,>, Error,>
{
    let mut files = Vec::new();
    if !target_dir.is_dir() {
        return Ok(files,);
    }
    for entry in WalkDir::new(target_dir,).sort_by_file_name() {
        let entry = entry.map_err(|e| error::walk_error(target_dir, e,),)?;
        let path = entry.path();
        if entry.file_type().is_file() && is_task_file(target_dir, path,) {
            files.push(path.to_path_buf(),);
        }
    }
    Ok(files,)
}

/// Returns whether `path` is a YAML file inside a `tasks` directory below
/// `root`.
pub fn is_task_file(root: &Path, path: &Path,) -> bool
{
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str(),)
        .is_some_and(|ext| ext == "yml" || ext == "yaml",);
    let Ok(relative,) = path.strip_prefix(root,) else {
        return false;
    };
    is_yaml && relative.parent().is_some_and(|parent| parent.iter().any(|part| part == "tasks",),)
}

/// Extracts role names from `include_role`/`import_role` tasks.
///
/// Both the inline form (`include_role: name=foo`) and the mapping form
/// (`name: foo` on a more deeply indented following line) are recognised.
///
/// # Examples
///
/// ```
/// use gravity::role_references;
///
/// let tasks = "- include_role:\n    name: setup_vcsim\n- import_role: name=prepare_http_tests\n";
/// assert_eq!(role_references(tasks), vec!["setup_vcsim", "prepare_http_tests"]);
/// ```
pub fn role_references(text: &str,) -> Vec<String,>
{
    let lines: Vec<&str,> = text.lines().collect();
    let mut roles = Vec::new();

    for (position, line,) in lines.iter().enumerate() {
        let content = line.trim_start();
        let content = content.strip_prefix("- ",).map_or(content, str::trim_start,);
        let Some(rest,) = ROLE_KEYWORDS.iter().find_map(|keyword| {
            content.strip_prefix(keyword,).and_then(|rest| rest.strip_prefix(':',),)
        },) else {
            continue;
        };

        let role = inline_role_name(rest,).or_else(|| {
            let key_column = line.len() - content.len();
            lines[position + 1..]
                .iter()
                .filter(|next| !next.trim().is_empty(),)
                .take_while(|next| indentation(next,) > key_column,)
                .find_map(|next| {
                    next.trim_start().strip_prefix("name:",).map(clean_role_name,)
                },)
                .filter(|name| !name.is_empty(),)
        },);

        if let Some(role,) = role
            && !roles.contains(&role,)
        {
            roles.push(role,);
        }
    }
    roles
}

fn inline_role_name(rest: &str,) -> Option<String,>
{
    rest.split_whitespace()
        .find_map(|token| token.strip_prefix("name=",),)
        .map(clean_role_name,)
        .filter(|name| !name.is_empty(),)
}

fn clean_role_name(raw: &str,) -> String
{
    raw.trim().trim_matches(|ch| ch == '"' || ch == '\'',).to_owned()
}

fn indentation(line: &str,) -> usize
{
    line.len() - line.trim_start().len()
}

/// Returns whether any recorded unit file (or file below a recorded unit
/// directory) contains `marker`.
fn units_reference(units_dir: &Path, units: &[String], marker: &str,) -> Result<bool, Error,>
{
    for unit in units {
        let root = units_dir.join(unit,);
        for entry in WalkDir::new(&root,) {
            let Ok(entry,) = entry else {
                continue;
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let bytes = fs::read(entry.path(),).map_err(|source| error::io_error(entry.path(), source,),)?;
            if String::from_utf8_lossy(&bytes,).contains(marker,) {
                return Ok(true,);
            }
        }
    }
    Ok(false,)
}
