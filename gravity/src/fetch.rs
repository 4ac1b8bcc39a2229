// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Release fetching: tagged archives from the release index and the
//! development checkout.
//!
//! Every step checks the cache first, so re-running against a populated
//! cache performs no network or extraction work.

use std::{
    fs::{self, File},
    io::BufReader,
    path::Path,
};

use flate2::read::GzDecoder;
use masterror::AppError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    command::CommandRunner,
    config::{ReleaseFilter, Settings},
    error::Error,
    release::{ARCHIVE_SUFFIX, DEVEL_CHECKOUT, archive_version},
};

/// File name fragments marking archives that are not final releases.
const PRERELEASE_MARKERS: &[&str] = &["latest", "dev", "beta", "alpha", "0a", "0b", "rc"];

/// Summary of one fetch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize,)]
pub struct FetchReport
{
    /// Archives selected from the index.
    pub selected:   Vec<String,>,
    /// Archives downloaded during this run.
    pub downloaded: Vec<String,>,
    /// Archives extracted during this run.
    pub extracted:  Vec<String,>,
    /// Whether the development checkout was cloned during this run.
    pub cloned:     bool,
    /// Branch the checkout was switched to, if a switch was needed.
    pub switched:   Option<String,>,
}

/// Ensures all current tagged releases (unless `devel_only`) and the
/// development checkout exist in the cache.
///
/// # Errors
///
/// Returns [`Error::Service`] when the index or an archive cannot be
/// fetched or extracted, and [`Error::Fatal`] when the checkout cannot be
/// switched to the configured branch.
pub fn fetch_releases(
    settings: &Settings,
    runner: &dyn CommandRunner,
    devel_only: bool,
) -> Result<FetchReport, Error,>
{
    let cachedir = settings.releases_dir();
    fs::create_dir_all(&cachedir,).map_err(|source| crate::error::io_error(&cachedir, source,),)?;

    let mut report = FetchReport::default();

    if !devel_only {
        let client = reqwest::blocking::Client::new();
        info!("fetch {}", settings.releases_url);
        let listing = fetch_text(&client, &settings.releases_url,)?;
        let links = extract_links(&listing,)?;
        report.selected = select_archives(&links, &settings.release_filter,);
        info!("{} tarballs found", report.selected.len());

        for archive in &report.selected {
            let dst = cachedir.join(archive,);
            if !dst.exists() {
                let url = archive_url(&settings.releases_url, archive,);
                info!("fetching {url}");
                download(&client, &url, &dst,)?;
                report.downloaded.push(archive.clone(),);
            }

            let Some((stem, _,),) = archive_version(archive,) else {
                continue;
            };
            if !cachedir.join(&stem,).exists() {
                info!("extracting {archive}");
                extract_archive(&dst, &cachedir,)?;
                report.extracted.push(archive.clone(),);
            }
        }
    }

    let (cloned, switched,) = ensure_devel_checkout(settings, runner,)?;
    report.cloned = cloned;
    report.switched = switched;

    Ok(report,)
}

/// Collects every `href` value from an HTML listing page.
///
/// # Errors
///
/// Returns [`AppError`] only if the link pattern fails to compile.
pub fn extract_links(html: &str,) -> Result<Vec<String,>, AppError,>
{
    let pattern = Regex::new(r#"(?i)<a\s[^>]*?href\s*=\s*["']([^"']+)["']"#,)
        .map_err(|e| AppError::validation(format!("invalid regex: {e}"),),)?;

    Ok(pattern
        .captures_iter(html,)
        .filter_map(|cap| cap.get(1,).map(|href| href.as_str().to_owned(),),)
        .collect(),)
}

/// Returns whether an archive name carries a pre-release marker.
pub fn is_prerelease(name: &str,) -> bool
{
    PRERELEASE_MARKERS.iter().any(|marker| name.contains(marker,),)
}

/// Filters listing links down to current, final release archives.
///
/// Links are reduced to their final path segment, deduplicated and sorted.
pub fn select_archives(links: &[String], filter: &ReleaseFilter,) -> Vec<String,>
{
    let mut archives: Vec<String,> = links
        .iter()
        .map(|link| link.rsplit('/',).next().unwrap_or(link,).to_owned(),)
        .filter(|name| name.ends_with(ARCHIVE_SUFFIX,),)
        .filter(|name| !is_prerelease(name,),)
        .filter(|name| {
            archive_version(name,).is_some_and(|(_, version,)| filter.matches(&version,),)
        },)
        .collect();
    archives.sort();
    archives.dedup();
    archives
}

fn archive_url(base: &str, archive: &str,) -> String
{
    format!("{}/{archive}", base.trim_end_matches('/',))
}

fn fetch_text(client: &reqwest::blocking::Client, url: &str,) -> Result<String, AppError,>
{
    client
        .get(url,)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status,)
        .and_then(reqwest::blocking::Response::text,)
        .map_err(|e| AppError::service(format!("failed to fetch {url}: {e}"),),)
}

fn download(client: &reqwest::blocking::Client, url: &str, dst: &Path,) -> Result<(), AppError,>
{
    let bytes = client
        .get(url,)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status,)
        .and_then(reqwest::blocking::Response::bytes,)
        .map_err(|e| AppError::service(format!("failed to download {url}: {e}"),),)?;

    fs::write(dst, &bytes,)
        .map_err(|e| AppError::service(format!("failed to write {}: {e}", dst.display()),),)
}

/// Unpacks a gzip-compressed tarball into `dest_dir`.
///
/// # Errors
///
/// Returns [`AppError`] when the archive cannot be opened or unpacked.
pub fn extract_archive(archive: &Path, dest_dir: &Path,) -> Result<(), AppError,>
{
    let file = File::open(archive,).map_err(|e| {
        AppError::service(format!("failed to open {}: {e}", archive.display()),)
    },)?;
    let decoder = GzDecoder::new(BufReader::new(file,),);
    let mut tarball = tar::Archive::new(decoder,);
    tarball.unpack(dest_dir,).map_err(|e| {
        AppError::service(format!("failed to extract {}: {e}", archive.display()),)
    },)
}

/// Clones the development checkout once and keeps it on the configured
/// branch.
///
/// Returns whether a clone happened and which branch was switched to.
///
/// # Errors
///
/// Returns [`Error::Service`] when cloning fails and [`Error::Fatal`] when
/// the branch switch exits non-zero.
pub fn ensure_devel_checkout(
    settings: &Settings,
    runner: &dyn CommandRunner,
) -> Result<(bool, Option<String,>,), Error,>
{
    let checkout = settings.releases_dir().join(DEVEL_CHECKOUT,);
    let mut cloned = false;

    if !checkout.exists() {
        let cmd = format!("git clone {} {}", settings.devel.url, checkout.display());
        info!("{cmd}");
        let output = runner.run(&cmd, None,)?;
        if !output.success() {
            return Err(Error::service(format!(
                "{cmd} exited with {}: {}",
                output.code,
                output.stderr.trim()
            ),),);
        }
        cloned = true;
    }

    let branch = settings.devel.branch.trim();
    if branch.is_empty() {
        return Ok((cloned, None,),);
    }

    let output = runner.run("git rev-parse --abbrev-ref HEAD", Some(&checkout,),)?;
    let current = output.stdout.trim();
    if current == branch {
        return Ok((cloned, None,),);
    }

    debug!("{current} != {branch}");
    let cmd = format!("git checkout {branch}");
    let output = runner.run(&cmd, Some(&checkout,),)?;
    if !output.success() {
        return Err(Error::fatal(format!(
            "`{cmd}` in {} exited with {}: {}",
            checkout.display(),
            output.code,
            output.stderr.trim()
        ),),);
    }

    Ok((cloned, Some(branch.to_owned(),),),)
}

#[cfg(test)]
mod tests
{
    use std::{cell::RefCell, path::Path};

    use flate2::{Compression, write::GzEncoder};
    use tempfile::tempdir;

    use super::*;
    use crate::command::CommandOutput;

    struct ScriptedRunner
    {
        calls:     RefCell<Vec<String,>,>,
        branch:    String,
        fail_with: Option<i32,>,
    }

    impl CommandRunner for ScriptedRunner
    {
        fn run(&self, command: &str, _cwd: Option<&Path,>,) -> Result<CommandOutput, Error,>
        {
            self.calls.borrow_mut().push(command.to_owned(),);
            let code = if command.starts_with("git checkout",) { self.fail_with.unwrap_or(0,) } else { 0 };
            let stdout =
                if command.starts_with("git rev-parse",) { format!("{}\n", self.branch) } else { String::new() };
            Ok(CommandOutput {
                code, stdout, stderr: "boom".to_owned(),
            },)
        }
    }

    fn settings_for(var_dir: &Path,) -> Settings
    {
        Settings {
            var_dir: var_dir.to_path_buf(), ..Settings::default()
        }
    }

    #[test]
    fn extract_links_reads_anchor_hrefs()
    {
        let html = r#"<html><body>
<a href="../">../</a>
<a href="ansible-2.7.0.tar.gz">ansible-2.7.0.tar.gz</a>
<A HREF='ansible-2.7.1.tar.gz'>x</A>
</body></html>"#;
        let links = extract_links(html,).expect("link extraction failed",);
        assert_eq!(links, vec!["../", "ansible-2.7.0.tar.gz", "ansible-2.7.1.tar.gz"]);
    }

    #[test]
    fn select_archives_drops_prereleases_and_other_versions()
    {
        let links: Vec<String,> = [
            "ansible-2.7.0.tar.gz",
            "ansible-2.7.0.tar.gz.sha",
            "ansible-2.7.0rc1.tar.gz",
            "ansible-2.7.0b1.tar.gz",
            "ansible-2.7.0a1.tar.gz",
            "ansible-2.7.0.dev0.tar.gz",
            "ansible-latest.tar.gz",
            "ansible-2.6.5.tar.gz",
            "ansible-1.9.6.tar.gz",
            "/ansible/ansible-2.7.10.tar.gz",
            "ansible-2.7.0.tar.gz",
        ]
        .iter()
        .map(|link| (*link).to_owned(),)
        .collect();

        let selected = select_archives(&links, &ReleaseFilter::default(),);
        assert_eq!(selected, vec!["ansible-2.7.0.tar.gz", "ansible-2.7.10.tar.gz"]);
    }

    #[test]
    fn prerelease_markers_are_detected()
    {
        assert!(is_prerelease("ansible-2.8.0a1.tar.gz"));
        assert!(is_prerelease("ansible-2.8.0rc3.tar.gz"));
        assert!(is_prerelease("ansible-latest.tar.gz"));
        assert!(!is_prerelease("ansible-2.8.1.tar.gz"));
    }

    #[test]
    fn archive_url_joins_without_double_slash()
    {
        assert_eq!(
            archive_url("https://releases.example/ansible/", "ansible-2.7.0.tar.gz"),
            "https://releases.example/ansible/ansible-2.7.0.tar.gz"
        );
    }

    #[test]
    fn extract_archive_unpacks_tarball()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let archive = temp.path().join("ansible-2.7.0.tar.gz",);

        let file = File::create(&archive,).expect("failed to create archive",);
        let encoder = GzEncoder::new(file, Compression::default(),);
        let mut builder = tar::Builder::new(encoder,);
        let payload = b"__version__ = '2.7.0'\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(payload.len() as u64,);
        header.set_mode(0o644,);
        header.set_cksum();
        builder
            .append_data(&mut header, "ansible-2.7.0/lib/ansible/release.py", &payload[..],)
            .expect("failed to append entry",);
        builder.into_inner().expect("failed to finish tar",).finish().expect("failed to finish gzip",);

        extract_archive(&archive, temp.path(),).expect("extraction failed",);
        assert!(temp.path().join("ansible-2.7.0/lib/ansible/release.py").is_file());
    }

    #[test]
    fn checkout_on_target_branch_needs_no_switch()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let settings = settings_for(temp.path(),);
        fs::create_dir_all(settings.releases_dir().join(DEVEL_CHECKOUT,),).expect("mkdir failed",);

        let runner = ScriptedRunner {
            calls: RefCell::new(Vec::new(),), branch: "devel".to_owned(), fail_with: None,
        };
        let (cloned, switched,) =
            ensure_devel_checkout(&settings, &runner,).expect("checkout failed",);

        assert!(!cloned);
        assert!(switched.is_none());
        assert_eq!(runner.calls.borrow().len(), 1);
    }

    #[test]
    fn missing_checkout_is_cloned_and_switched()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let settings = settings_for(temp.path(),);

        let runner = ScriptedRunner {
            calls: RefCell::new(Vec::new(),), branch: "main".to_owned(), fail_with: None,
        };
        let (cloned, switched,) =
            ensure_devel_checkout(&settings, &runner,).expect("checkout failed",);

        assert!(cloned);
        assert_eq!(switched.as_deref(), Some("devel"));
        let calls = runner.calls.borrow();
        assert!(calls[0].starts_with("git clone https://github.com/ansible/ansible.git"));
        assert_eq!(calls[2], "git checkout devel");
    }

    #[test]
    fn failed_branch_switch_is_fatal()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let settings = settings_for(temp.path(),);
        fs::create_dir_all(settings.releases_dir().join(DEVEL_CHECKOUT,),).expect("mkdir failed",);

        let runner = ScriptedRunner {
            calls: RefCell::new(Vec::new(),), branch: "main".to_owned(), fail_with: Some(1,),
        };
        let error = ensure_devel_checkout(&settings, &runner,).expect_err("expected fatal error",);
        match error {
            Error::Fatal {
                message,
            } => assert!(message.contains("git checkout devel")),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn devel_only_fetch_touches_no_network()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let settings = Settings {
            releases_url: "http://127.0.0.1:9/unreachable".to_owned(),
            ..settings_for(temp.path(),)
        };
        fs::create_dir_all(settings.releases_dir().join(DEVEL_CHECKOUT,),).expect("mkdir failed",);

        let runner = ScriptedRunner {
            calls: RefCell::new(Vec::new(),), branch: "devel".to_owned(), fail_with: None,
        };
        let report = fetch_releases(&settings, &runner, true,).expect("fetch failed",);
        assert!(report.selected.is_empty());
        assert!(!report.cloned);
    }
}
