// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Text rewriting of relocated source files.
//!
//! Module files, unit tests and integration task files are treated as plain
//! text. Every heuristic that recognises an import statement or a fragment
//! reference lives in this module so that it can be exercised without any
//! filesystem orchestration.

use masterror::AppError;
use regex::Regex;
use tracing::debug;

use crate::{
    config::Settings,
    extract::{FRAGMENT_KEY, HELPER_IMPORT_PREFIX, helper_name},
};

const ENGINE_MODULES_PREFIX: &str = "ansible.modules";
const MAX_BLANK_RUN: usize = 2;
const BLOCK_INDENT: &str = "    ";

/// Result of rewriting helper imports in one file.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ImportRewrite
{
    /// Rewritten file contents.
    pub text:      String,
    /// Number of import statements pointed at the collection.
    pub rewritten: usize,
    /// Whether continuation lines of a multi-line statement were dropped.
    pub nulled:    bool,
}

/// Rewrites helper imports and fragment references of one collection.
///
/// # Examples
///
/// ```
/// use gravity::{ImportRewriter, Settings};
///
/// let settings = Settings {
///     namespace: "acme".to_owned(),
///     ..Settings::default()
/// };
/// let rewriter = ImportRewriter::new(&settings, "cloud_vmware",);
/// let rewrite =
///     rewriter.rewrite_module_utils_imports("from ansible.module_utils.vmware import connect\n",);
/// assert_eq!(
///     rewrite.text,
///     "from acme.cloud_vmware.plugins.module_utils.vmware import connect\n"
/// );
/// ```
#[derive(Debug, Clone, Copy,)]
pub struct ImportRewriter<'a,>
{
    namespace:  &'a str,
    collection: &'a str,
    blacklist:  &'a [String],
    line_limit: usize,
}

/// One helper import statement, possibly spanning several lines.
#[derive(Debug, Clone, PartialEq, Eq,)]
struct Statement<'s,>
{
    helper:  String,
    indent:  &'s str,
    clause:  &'s str,
    end:     usize,
    symbols: Vec<String,>,
}

impl<'a,> ImportRewriter<'a,>
{
    /// Creates a rewriter for `collection` using the namespace, blacklist
    /// and line limit from `settings`.
    pub fn new(settings: &'a Settings, collection: &'a str,) -> Self
    {
        Self {
            namespace: &settings.namespace,
            collection,
            blacklist: &settings.module_util_blacklist,
            line_limit: settings.import_line_limit,
        }
    }

    /// Dotted path a helper is imported from after relocation. Dotted
    /// helpers keep only their final segment, matching the flattened copy
    /// under `plugins/module_utils`.
    pub fn helper_path(&self, helper: &str,) -> String
    {
        let leaf = helper.rsplit('.',).next().unwrap_or(helper,);
        format!("{}.{}.plugins.module_utils.{leaf}", self.namespace, self.collection)
    }

    /// Fully qualified name of a documentation fragment.
    pub fn fragment_name(&self, fragment: &str,) -> String
    {
        format!("{}.{}.{fragment}", self.namespace, self.collection)
    }

    fn is_blacklisted(&self, helper: &str,) -> bool
    {
        self.blacklist.iter().any(|name| name == helper,)
    }

    /// Points every non-blacklisted helper import at the collection.
    ///
    /// A single-line statement keeps its import clause verbatim. A statement
    /// that spans several lines, ends in a backslash or would exceed the line
    /// limit after rewriting becomes a parenthesized block with one sorted,
    /// unique symbol per line. When continuation lines were dropped, the run
    /// of blank lines right after the block is cut to at most two. Each
    /// rewritten line keeps the line ending of the statement it replaces.
    pub fn rewrite_module_utils_imports(&self, source: &str,) -> ImportRewrite
    {
        let lines: Vec<&str,> = source.split('\n',).collect();
        let mut output: Vec<String,> = Vec::with_capacity(lines.len(),);
        let mut rewritten = 0;
        let mut nulled = false;
        let mut index = 0;

        while index < lines.len() {
            let line = lines[index];
            let Some(statement,) = self.statement_at(&lines, index,) else {
                output.push(line.to_owned(),);
                index += 1;
                continue;
            };

            let eol = line_ending(lines[statement.end],);
            let target = self.helper_path(&statement.helper,);
            let spans_lines = statement.end > index;
            let single = format!("{}from {target} import {}", statement.indent, statement.clause);
            let reformat =
                spans_lines || statement.clause.ends_with('\\',) || single.len() > self.line_limit;

            if reformat && !statement.symbols.is_empty() {
                output.push(format!("{}from {target} import ({eol}", statement.indent),);
                for symbol in &statement.symbols {
                    output.push(format!("{}{BLOCK_INDENT}{symbol},{eol}", statement.indent),);
                }
                output.push(format!("{}){eol}", statement.indent),);
            } else {
                output.push(format!("{single}{eol}"),);
            }

            debug!("{} -> {target}", statement.helper);
            rewritten += 1;
            index = statement.end + 1;

            if spans_lines {
                nulled = true;
                let gap = lines[index..].iter().take_while(|next| next.trim().is_empty(),).count();
                output.extend(
                    lines[index..index + gap.min(MAX_BLANK_RUN,)].iter().map(|blank| (*blank).to_owned(),),
                );
                index += gap;
            }
        }

        let text = output.join("\n",);
        ImportRewrite {
            text,
            rewritten,
            nulled,
        }
    }

    fn statement_at<'s,>(&self, lines: &[&'s str], start: usize,) -> Option<Statement<'s,>,>
    {
        let line = lines[start];
        let trimmed = line.trim_start();
        if !trimmed.starts_with(HELPER_IMPORT_PREFIX,) {
            return None;
        }
        let Some(helper,) = helper_name(trimmed,) else {
            debug!("can not split {trimmed}");
            return None;
        };
        if self.is_blacklisted(&helper,) {
            return None;
        }

        let (_, rest,) = trimmed.split_once(" import",)?;
        if !rest.starts_with([' ', '(', '\\'],) {
            return None;
        }
        let clause = rest.trim();
        let indent = &line[..line.len() - trimmed.len()];

        let end = if clause.starts_with('(',) {
            let offset = lines[start..]
                .iter()
                .position(|candidate| strip_comment(candidate,).contains(')',),)?;
            start + offset
        } else {
            let mut end = start;
            while strip_comment(lines[end],).trim_end().ends_with('\\',) && end + 1 < lines.len() {
                end += 1;
            }
            end
        };

        let mut joined = strip_comment(clause,).to_owned();
        for continuation in &lines[start + 1..=end] {
            joined.push(',',);
            joined.push_str(strip_comment(continuation,),);
        }

        Some(Statement {
            helper,
            indent,
            clause,
            end,
            symbols: import_symbols(&joined,),
        },)
    }

    /// Qualifies fragment references that name one of `fragments`.
    ///
    /// Scalar values, flow lists and block lists under the fragment key are
    /// handled. References that already carry the namespace are left alone.
    pub fn rewrite_doc_fragments(&self, source: &str, fragments: &[String],) -> String
    {
        let mut output: Vec<String,> = Vec::new();
        let mut list_indent: Option<usize,> = None;

        for raw in source.split('\n',) {
            let eol = line_ending(raw,);
            let line = raw.strip_suffix('\r',).unwrap_or(raw,);
            let trimmed = line.trim_start();
            let indent = &line[..line.len() - trimmed.len()];

            if let Some(key_indent,) = list_indent {
                if let Some(item,) = trimmed.strip_prefix('-',)
                    && indent.len() >= key_indent
                {
                    let name = unquote(item,);
                    if fragments.iter().any(|fragment| fragment == name,) {
                        output.push(format!("{indent}- {}{eol}", self.fragment_name(name,)),);
                    } else {
                        output.push(raw.to_owned(),);
                    }
                    continue;
                }
                if !trimmed.is_empty() {
                    list_indent = None;
                }
            }

            let Some(value,) =
                trimmed.strip_prefix(FRAGMENT_KEY,).and_then(|rest| rest.strip_prefix(':',),)
            else {
                output.push(raw.to_owned(),);
                continue;
            };

            let value = value.trim();
            if value.is_empty() {
                list_indent = Some(indent.len(),);
                output.push(raw.to_owned(),);
            } else if let Some(items,) = value.strip_prefix('[',).and_then(|v| v.strip_suffix(']',),) {
                let items: Vec<String,> = items
                    .split(',',)
                    .map(unquote,)
                    .filter(|item| !item.is_empty(),)
                    .map(|item| {
                        if fragments.iter().any(|fragment| fragment == item,) {
                            self.fragment_name(item,)
                        } else {
                            item.to_owned()
                        }
                    },)
                    .collect();
                output.push(format!("{indent}{FRAGMENT_KEY}: [{}]{eol}", items.join(", ")),);
            } else if fragments.iter().any(|fragment| fragment == unquote(value,),) {
                output.push(format!(
                    "{indent}{FRAGMENT_KEY}: {}{eol}",
                    self.fragment_name(unquote(value,),)
                ),);
            } else {
                output.push(raw.to_owned(),);
            }
        }

        output.join("\n",)
    }
}

/// Symbols imported by a statement clause: parentheses, continuations and
/// comments removed, sorted and unique. `name as alias` pairs stay intact.
pub fn import_symbols(clause: &str,) -> Vec<String,>
{
    let mut symbols: Vec<String,> = clause
        .split(',',)
        .map(|part| {
            part.replace(['(', ')', '\\'], " ",).split_whitespace().collect::<Vec<_>>().join(" ",)
        },)
        .filter(|symbol| !symbol.is_empty(),)
        .collect();
    symbols.sort();
    symbols.dedup();
    symbols
}

fn strip_comment(line: &str,) -> &str
{
    line.split_once('#',).map_or(line, |(code, _,)| code,)
}

fn unquote(value: &str,) -> &str
{
    value.trim().trim_matches(|ch| ch == '"' || ch == '\'',)
}

/// Carriage return left on a line split at `\n`, if any.
fn line_ending(line: &str,) -> &'static str
{
    if line.ends_with('\r',) { "\r" } else { "" }
}

/// Turns imports of relocated modules in a unit test into relative imports
/// of `plugins.modules`.
///
/// `depth` is the number of directories between the assembled collection
/// root and the test file; the relative prefix has `depth + 1` dots.
pub fn rewrite_unit_test_imports(source: &str, stems: &[String], depth: usize,) -> String
{
    let dots = ".".repeat(depth + 1,);
    source
        .split('\n',)
        .map(|line| rewrite_unit_test_line(line, stems, &dots,).unwrap_or_else(|| line.to_owned(),),)
        .collect::<Vec<_>>()
        .join("\n",)
}

fn rewrite_unit_test_line(line: &str, stems: &[String], dots: &str,) -> Option<String,>
{
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];
    let statement = trimmed.strip_prefix("from ",)?;
    let (path, clause,) = statement.split_once(" import ",)?;
    let path = path.trim();
    let relative = path.strip_prefix(ENGINE_MODULES_PREFIX,)?;
    if !(relative.is_empty() || relative.starts_with('.',)) {
        return None;
    }

    let is_stem = |name: &str| stems.iter().any(|stem| stem == name,);
    let leaf = path.rsplit('.',).next().unwrap_or(path,);
    if is_stem(leaf,) {
        return Some(format!("{indent}from {dots}plugins.modules.{leaf} import {clause}"),);
    }

    let imported: Vec<&str,> = strip_comment(clause,)
        .split(',',)
        .filter_map(|part| part.split_whitespace().next(),)
        .collect();
    if !imported.is_empty() && imported.iter().all(|name| is_stem(*name,),) {
        return Some(format!("{indent}from {dots}plugins.modules import {clause}"),);
    }
    None
}

/// Replaces bare module names used as task keys with their fully
/// qualified form.
///
/// A stem is only rewritten when the bare key is present and the qualified
/// name does not already occur as a whole word in the file, so running the
/// rewrite twice yields the same text.
///
/// # Errors
///
/// Returns [`AppError`] if a key pattern fails to compile.
pub fn rewrite_task_file(
    source: &str,
    stems: &[String],
    namespace: &str,
    collection: &str,
) -> Result<String, AppError,>
{
    let mut text = source.to_owned();
    for stem in stems {
        let qualified = format!("{namespace}.{collection}.{stem}");
        let already = Regex::new(&format!(r"\b{}\b", regex::escape(&qualified)),)
            .map_err(|e| AppError::validation(format!("invalid regex: {e}"),),)?;
        if already.is_match(&text,) {
            continue;
        }
        let pattern = Regex::new(&format!(r"(?m)^([ \t]*(?:-[ \t]+)?){}:", regex::escape(stem)),)
            .map_err(|e| AppError::validation(format!("invalid regex: {e}"),),)?;
        if pattern.is_match(&text,) {
            text = pattern.replace_all(&text, format!("${{1}}{qualified}:"),).into_owned();
        }
    }
    Ok(text,)
}
