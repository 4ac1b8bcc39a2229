//! Helper-library and documentation-fragment extraction from module text.
//!
//! Both extractors work on raw text. Helper imports are recognised by line
//! prefix; documentation fragments are read from the `DOCUMENTATION` block
//! with a two-stage strategy: a structured YAML parse of the whole block,
//! then a re-parse starting at the `extends_documentation_fragment` key when
//! the block as a whole is not valid YAML.

use serde_yaml::Value;
use tracing::{debug, warn};

/// Line prefix of an import from the helper-library namespace.
pub const HELPER_IMPORT_PREFIX: &str = "from ansible.module_utils";
/// Key listing the fragments a module's documentation extends.
pub const FRAGMENT_KEY: &str = "extends_documentation_fragment";
const DOCUMENTATION_MARKER: &str = "DOCUMENTATION";

/// Extracts logical helper names from every helper import in `source`.
///
/// The dotted path after `from` loses its first two segments (`ansible`
/// and `module_utils`): `from ansible.module_utils.vmware import x` yields
/// `vmware`, `from ansible.module_utils.network.common.utils import y`
/// yields `network.common.utils`. Lines that cannot be split, or that import
/// straight from the namespace root, are logged and skipped.
///
/// # Examples
///
/// ```
/// use gravity::extract_module_utils;
///
/// let source = "from ansible.module_utils.basic import AnsibleModule\n\
///               from ansible.module_utils.vmware import connect_to_api\n";
/// assert_eq!(extract_module_utils(source), vec!["basic", "vmware"]);
/// ```
pub fn extract_module_utils(source: &str,) -> Vec<String,>
{
    let mut names = Vec::new();
    for line in source.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with(HELPER_IMPORT_PREFIX,) {
            continue;
        }
        match helper_name(trimmed,) {
            Some(name,) => names.push(name,),
            None => debug!("can not split {trimmed}"),
        }
    }
    names.sort();
    names.dedup();
    names
}

/// Derives the helper name from one `from ansible.module_utils... import`
/// statement.
pub fn helper_name(statement: &str,) -> Option<String,>
{
    let path = statement.split_whitespace().nth(1,)?;
    let segments: Vec<&str,> = path.split('.',).collect();
    if segments.len() < 3 || segments[..2] != ["ansible", "module_utils"] {
        return None;
    }
    let name = segments[2..].join(".",);
    if name.is_empty() || segments[2..].iter().any(|segment| segment.is_empty(),) {
        return None;
    }
    Some(name,)
}

/// Why fragment extraction gave up on a documentation block.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct FragmentParseFailure
{
    /// Message from the YAML parser for the last attempted stage.
    pub message: String,
}

/// Returns the lines of the `DOCUMENTATION` block, starting with the
/// assignment line and ending before the closing triple quote.
pub fn documentation_block(source: &str,) -> Vec<&str,>
{
    let mut block = Vec::new();
    let mut in_docs = false;
    for line in source.lines() {
        if !in_docs && line.starts_with(DOCUMENTATION_MARKER,) {
            in_docs = true;
            block.push(line,);
            continue;
        }
        if !in_docs {
            continue;
        }
        let stripped = line.trim_start();
        if stripped.starts_with("'''",) || stripped.starts_with("\"\"\"",) {
            break;
        }
        block.push(line,);
    }
    block
}

/// Extracts the normalized fragment list from a module's documentation.
///
/// Returns `Ok(None)` when the module has no documentation block or its
/// documentation extends no fragments, and `Err` when neither parsing stage
/// could make sense of a block that mentions fragments. A scalar value is
/// wrapped into a one-element list.
///
/// # Errors
///
/// Returns [`FragmentParseFailure`] when both parsing stages fail.
pub fn extract_doc_fragments(source: &str,) -> Result<Option<Vec<String,>,>, FragmentParseFailure,>
{
    let block = documentation_block(source,);
    if block.len() < 2 {
        return Ok(None,);
    }
    let body = &block[1..];

    match parse_fragments(&body.join("\n",),) {
        Ok(fragments,) => Ok(fragments,),
        Err(first,) => {
            let Some(start,) = body.iter().position(|line| line.contains(FRAGMENT_KEY,),) else {
                debug!("documentation block is not valid YAML and extends nothing: {first}");
                return Ok(None,);
            };
            let tail = dedent(&body[start..],);
            parse_fragments(&tail,).map_err(|message| FragmentParseFailure {
                message,
            },)
        }
    }
}

fn parse_fragments(text: &str,) -> Result<Option<Vec<String,>,>, String,>
{
    let document: Value = serde_yaml::from_str(text,).map_err(|e| e.to_string(),)?;
    let Some(value,) = document.get(FRAGMENT_KEY,) else {
        return Ok(None,);
    };
    Ok(normalize_fragments(value,),)
}

fn normalize_fragments(value: &Value,) -> Option<Vec<String,>,>
{
    let fragments: Vec<String,> = match value {
        Value::String(name,) => vec![name.trim().to_owned()],
        Value::Sequence(items,) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(name,) => Some(name.trim().to_owned(),),
                other => {
                    warn!("ignoring non-string fragment reference {other:?}");
                    None
                }
            },)
            .collect(),
        Value::Null => return None,
        other => {
            warn!("ignoring fragment reference of unexpected shape {other:?}");
            return None;
        }
    };
    let fragments: Vec<String,> = fragments.into_iter().filter(|name| !name.is_empty(),).collect();
    if fragments.is_empty() { None } else { Some(fragments,) }
}

/// Removes the indentation of the first line from every line so that a
/// block cut out of a nested mapping parses as a top-level mapping.
fn dedent(lines: &[&str],) -> String
{
    let indent = lines.first().map_or(0, |line| leading_whitespace(line,),);
    lines
        .iter()
        .map(|line| {
            let cut = line
                .char_indices()
                .take_while(|(_, ch,)| ch.is_whitespace(),)
                .nth(indent,)
                .map_or_else(|| line.len() - line.trim_start().len(), |(offset, _,)| offset,);
            &line[cut..]
        },)
        .collect::<Vec<_>>()
        .join("\n",)
}

/// Number of leading whitespace characters.
fn leading_whitespace(line: &str,) -> usize
{
    line.chars().take_while(|ch| ch.is_whitespace(),).count()
}
