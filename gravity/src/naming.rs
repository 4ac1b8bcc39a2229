// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Utilities for deriving collection and module names from paths.
//!
//! Collection names are derived from a directory key relative to the module
//! tree: path separators become underscores and an optional prefix is
//! prepended. Module stems drop the platform-specific file suffix.

/// File suffixes stripped when deriving a module's bare name.
const MODULE_SUFFIXES: &[&str] = &[".py", ".ps1", ".ps2"];

/// Builder for collection names derived from a directory key.
#[derive(Debug, Clone, Copy,)]
pub struct CollectionName<'input,>
{
    directory: &'input str,
    prefix:    &'input str,
}

impl<'input,> CollectionName<'input,>
{
    /// Creates a new builder for the provided directory key.
    ///
    /// The builder retains a borrowed view of the key to avoid allocations
    /// until [`build`](Self::build) is invoked.
    pub const fn builder(directory: &'input str,) -> Self
    {
        Self {
            directory, prefix: "",
        }
    }

    /// Sets the prefix prepended to the derived name.
    #[must_use]
    pub const fn prefix(mut self, prefix: &'input str,) -> Self
    {
        self.prefix = prefix;
        self
    }

    /// Builds the collection name. Leading `./` and surrounding separators
    /// are ignored. Returns `None` for the module tree root, which never
    /// forms a collection.
    ///
    /// # Examples
    ///
    /// ```
    /// use gravity::CollectionName;
    ///
    /// let name = CollectionName::builder("./cloud/vmware/",).build();
    /// assert_eq!(name.as_deref(), Some("cloud_vmware"));
    /// ```
    pub fn build(self,) -> Option<String,>
    {
        let key = normalize_directory_key(self.directory,);
        if key.is_empty() {
            return None;
        }

        let mut name = String::with_capacity(self.prefix.len() + key.len(),);
        name.push_str(self.prefix,);
        name.push_str(&key.replace('/', "_",),);
        Some(name,)
    }
}

/// Normalizes a directory key: strips leading `./`, surrounding slashes and
/// collapses backslashes into forward slashes.
pub fn normalize_directory_key(directory: &str,) -> String
{
    let unified = directory.replace('\\', "/",);
    let mut key = unified.as_str();
    while let Some(rest,) = key.strip_prefix("./",) {
        key = rest;
    }
    match key.trim_matches('/',) {
        "." => String::new(),
        trimmed => trimmed.to_owned(),
    }
}

/// Returns a module's bare name: the file name without directories and
/// without a `.py`, `.ps1` or `.ps2` suffix.
///
/// # Examples
///
/// ```
/// use gravity::module_stem;
///
/// assert_eq!(module_stem("windows/win_ping.ps1"), "win_ping");
/// assert_eq!(module_stem("cloud/vmware/vmware_guest.py"), "vmware_guest");
/// ```
pub fn module_stem(path: &str,) -> &str
{
    let file = path.rsplit('/',).next().unwrap_or(path,);
    MODULE_SUFFIXES.iter().find_map(|suffix| file.strip_suffix(suffix,),).unwrap_or(file,)
}

/// Returns whether a module path points at a package marker file.
pub fn is_package_marker(path: &str,) -> bool
{
    path.rsplit('/',).next() == Some("__init__.py",)
}
