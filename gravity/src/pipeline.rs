// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Phase orchestration.
//!
//! [`run`] executes the selected phases strictly in order: releases, index,
//! assemble, collection packages, engine package, repository metadata. Each
//! phase reads what the previous one left in the cache directory, so any
//! phase can be re-run on its own.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::{
    assemble::{AssemblyReport, assemble_collections},
    command::CommandRunner,
    config::{Phase, Settings},
    error::Error,
    fetch::{FetchReport, fetch_releases},
    index::{IndexOutcome, index_releases},
    package::{EngineReport, PackageReport, build_engine_package, build_packages, build_repodata},
    release::{Release, discover_releases},
};

/// Per-run switches supplied by the CLI.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct RunOptions
{
    /// Phases to execute.
    pub phase:      Phase,
    /// Rebuild cached metadata, layouts and packages.
    pub refresh:    bool,
    /// Restrict fetching and discovery to the development checkout.
    pub devel_only: bool,
    /// Reuse the existing engine build copy.
    pub noclean:    bool,
    /// Substrings every processed directory key must contain.
    pub filters:    Vec<String,>,
}

impl Default for RunOptions
{
    fn default() -> Self
    {
        Self {
            phase:      Phase::All,
            refresh:    false,
            devel_only: false,
            noclean:    false,
            filters:    Vec::new(),
        }
    }
}

/// What each executed phase produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize,)]
pub struct RunSummary
{
    /// Fetch outcome, when the releases phase ran.
    pub fetch:    Option<FetchReport,>,
    /// One outcome per indexed release.
    pub indexed:  Vec<IndexOutcome,>,
    /// Combined assembly outcome over all releases.
    pub assembly: AssemblyReport,
    /// Combined packaging outcome over all releases.
    pub packages: PackageReport,
    /// Engine package outcome, when that phase ran.
    pub engine:   Option<EngineReport,>,
    /// Whether the repository index was regenerated.
    pub repodata: bool,
}

/// Runs the phases selected by `options.phase`.
///
/// # Errors
///
/// Propagates the first fatal error of any phase. Recoverable problems
/// (missing metadata for a release, missing helper sources, an empty
/// assembly run) are logged and do not stop the run.
pub fn run(
    settings: &Settings,
    runner: &dyn CommandRunner,
    options: &RunOptions,
) -> Result<RunSummary, Error,>
{
    let phase = options.phase;
    let mut summary = RunSummary::default();

    if phase.fetches() {
        summary.fetch = Some(fetch_releases(settings, runner, options.devel_only,)?,);
    }

    let needs_releases = phase.indexes() || phase.assembles() || phase.packages_collections();
    let releases = if needs_releases {
        discover_releases(settings, options.devel_only,)?
    } else {
        Vec::new()
    };

    if phase.indexes() {
        summary.indexed = index_releases(&releases, settings, &options.filters, options.refresh,)?;
    }

    if phase.assembles() {
        summary.assembly = assemble_releases(&releases, settings, options,)?;
        if summary.assembly.materialized.is_empty() {
            error!("no collections were assembled");
        }
    }

    if phase.packages_collections() {
        summary.packages = package_releases(&releases, settings, runner, options,)?;
    }

    if phase.packages_engine() {
        summary.engine = Some(build_engine_package(settings, runner, options.noclean,)?,);
    }

    if phase.builds_repodata() {
        build_repodata(settings, runner,)?;
        summary.repodata = true;
    }

    info!("run finished: {phase:?}");
    Ok(summary,)
}

fn assemble_releases(
    releases: &[Release],
    settings: &Settings,
    options: &RunOptions,
) -> Result<AssemblyReport, Error,>
{
    let store = settings.metadata_store();
    let mut report = AssemblyReport::default();

    for release in releases {
        if !store.exists(&release.version,) {
            warn!("no metadata for {}, run the index phase first", release.version);
            continue;
        }
        let collections = store.load(&release.version,)?;
        info!("assemble {} ({} collections)", release.version, collections.len());
        report.merge(assemble_collections(settings, &collections, &options.filters, options.refresh,)?,);
    }

    Ok(report,)
}

fn package_releases(
    releases: &[Release],
    settings: &Settings,
    runner: &dyn CommandRunner,
    options: &RunOptions,
) -> Result<PackageReport, Error,>
{
    let store = settings.metadata_store();
    let mut report = PackageReport::default();

    for release in releases {
        if !store.exists(&release.version,) {
            warn!("no metadata for {}, skipping packages", release.version);
            continue;
        }
        let collections = store.load(&release.version,)?;
        report.merge(build_packages(
            settings,
            runner,
            &collections,
            &options.filters,
            options.refresh,
        )?,);
    }

    Ok(report,)
}
