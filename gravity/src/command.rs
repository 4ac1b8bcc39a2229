// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Synchronous shell command execution.
//!
//! Commands run through `sh -c`, block until completion and have both output
//! streams fully buffered. A non-zero exit status is reported, not raised:
//! callers inspect [`CommandOutput::code`] themselves.

use std::{path::Path, process::Command};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;

/// Captured result of one shell invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
pub struct CommandOutput
{
    /// Exit status; `-1` when the process was terminated by a signal.
    pub code:   i32,
    /// Standard output decoded as UTF-8 (lossy).
    pub stdout: String,
    /// Standard error decoded as UTF-8 (lossy).
    pub stderr: String,
}

impl CommandOutput
{
    /// Returns `true` when the command exited with status zero.
    pub const fn success(&self,) -> bool
    {
        self.code == 0
    }
}

/// Executes shell command lines on behalf of the pipeline.
///
/// The fetcher and packager take a `&dyn CommandRunner` so that tests can
/// record invocations instead of touching `git`, `fpm` or `createrepo`.
pub trait CommandRunner
{
    /// Runs `command` through the shell, optionally inside `cwd`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Command`] only when the shell itself cannot be
    /// spawned.
    fn run(&self, command: &str, cwd: Option<&Path,>,) -> Result<CommandOutput, Error,>;
}

/// Production runner backed by `sh -c`.
#[derive(Debug, Clone, Copy, Default,)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner
{
    fn run(&self, command: &str, cwd: Option<&Path,>,) -> Result<CommandOutput, Error,>
    {
        debug!("{command}");
        let mut process = Command::new("sh",);
        process.arg("-c",).arg(command,);
        if let Some(dir,) = cwd {
            process.current_dir(dir,);
        }

        let output = process.output().map_err(|source| Error::Command {
            command: command.to_owned(),
            source,
        },)?;

        Ok(CommandOutput {
            code:   output.status.code().unwrap_or(-1,),
            stdout: String::from_utf8_lossy(&output.stdout,).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr,).into_owned(),
        },)
    }
}
