//! Index of installed distributions keyed by the top-level modules they own.
//!
//! Metadata comes from `*.dist-info` directories (wheels) and `*.egg-info`
//! directories or files (legacy installs). Ownership is read from
//! `top_level.txt`, then `RECORD`, then inferred from the distribution name.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::MetadataError;

/// Tracing target for metadata scanning.
const METADATA_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::distributions");

/// One installed distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    name: String,
    version: String,
    top_level: Vec<String>,
}

impl Distribution {
    /// Builds a distribution record.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, version: impl Into<String>, top_level: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            version: version.into(),
            top_level: top_level.into_iter().map(Into::into).collect(),
        }
    }

    /// Distribution name as declared in its metadata.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Installed version.
    #[must_use]
    pub fn version(&self) -> &str {
        self.version.as_str()
    }

    /// Top-level module names owned by the distribution.
    #[must_use]
    pub fn top_level(&self) -> &[String] {
        &self.top_level
    }
}

/// Lookup table from module name to owning distribution.
#[derive(Debug, Clone, Default)]
pub struct DistributionIndex {
    distributions: Vec<Distribution>,
    owners: HashMap<String, usize>,
}

impl DistributionIndex {
    /// Builds an index from already-parsed distributions.
    ///
    /// When two distributions claim the same module the first one wins, which
    /// mirrors import precedence along `sys.path`.
    #[must_use]
    pub fn from_distributions<I>(distributions: I) -> Self
    where
        I: IntoIterator<Item = Distribution>,
    {
        let mut index = Self::default();
        for distribution in distributions {
            index.insert(distribution);
        }
        index
    }

    /// Scans each directory in order for distribution metadata.
    ///
    /// Missing or unreadable directories and corrupt metadata entries are
    /// skipped; an empty index is a valid result.
    #[must_use]
    pub fn scan<P: AsRef<Path>>(search_paths: &[P]) -> Self {
        let mut index = Self::default();
        for path in search_paths {
            for distribution in scan_directory(path.as_ref()) {
                index.insert(distribution);
            }
        }
        debug!(
            target: METADATA_TARGET,
            distributions = index.distributions.len(),
            modules = index.owners.len(),
            "distribution index built"
        );
        index
    }

    /// Finds the distribution owning `module` by longest dotted-prefix match.
    #[must_use]
    pub fn lookup(&self, module: &str) -> Option<&Distribution> {
        let mut candidate = module;
        loop {
            if let Some(&position) = self.owners.get(candidate) {
                return self.distributions.get(position);
            }
            let (parent, _) = candidate.rsplit_once('.')?;
            candidate = parent;
        }
    }

    /// Number of indexed distributions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.distributions.len()
    }

    /// Returns `true` when no distribution was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.distributions.is_empty()
    }

    fn insert(&mut self, distribution: Distribution) {
        let position = self.distributions.len();
        for module in distribution.top_level() {
            self.owners.entry(module.clone()).or_insert(position);
        }
        self.distributions.push(distribution);
    }
}

fn scan_directory(directory: &Path) -> Vec<Distribution> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(error) => {
            debug!(
                target: METADATA_TARGET,
                path = %directory.display(),
                error = %error,
                "skipping unreadable search path"
            );
            return Vec::new();
        }
    };

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| metadata_kind(path).is_some())
        .collect();
    candidates.sort();

    candidates
        .iter()
        .filter_map(|path| match read_distribution(path) {
            Ok(distribution) => distribution,
            Err(error) => {
                warn!(
                    target: METADATA_TARGET,
                    error = %error,
                    "skipping unreadable distribution metadata"
                );
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetadataKind {
    DistInfo,
    EggInfo,
}

fn metadata_kind(path: &Path) -> Option<MetadataKind> {
    match path.extension().and_then(OsStr::to_str) {
        Some("dist-info") => Some(MetadataKind::DistInfo),
        Some("egg-info") => Some(MetadataKind::EggInfo),
        _ => None,
    }
}

/// Reads one metadata entry; `Ok(None)` means the entry lacks a name or version.
fn read_distribution(path: &Path) -> Result<Option<Distribution>, MetadataError> {
    let Some(kind) = metadata_kind(path) else {
        return Ok(None);
    };

    // An `.egg-info` file is the PKG-INFO document itself.
    if path.is_file() {
        let text = read_text(path)?;
        return Ok(parse_headers(&text).map(|(name, version)| {
            let top_level = vec![module_name_from_distribution(&name)];
            Distribution::new(name, version, top_level)
        }));
    }

    let metadata_file = match kind {
        MetadataKind::DistInfo => path.join("METADATA"),
        MetadataKind::EggInfo => path.join("PKG-INFO"),
    };
    let Some((name, version)) = parse_headers(&read_text(&metadata_file)?) else {
        return Ok(None);
    };

    let top_level = match read_top_level(path)? {
        Some(modules) if !modules.is_empty() => modules,
        _ => match read_record_modules(path)? {
            Some(modules) if !modules.is_empty() => modules,
            _ => vec![module_name_from_distribution(&name)],
        },
    };

    Ok(Some(Distribution::new(name, version, top_level)))
}

fn read_text(path: &Path) -> Result<String, MetadataError> {
    fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .map_err(|source| MetadataError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn read_optional(path: &Path) -> Result<Option<String>, MetadataError> {
    if path.is_file() {
        read_text(path).map(Some)
    } else {
        Ok(None)
    }
}

/// Extracts `Name` and `Version` from the RFC 822 header block.
fn parse_headers(text: &str) -> Option<(String, String)> {
    let mut name = None;
    let mut version = None;
    for line in text.lines() {
        if line.trim().is_empty() {
            break;
        }
        let Some((key, raw_value)) = line.split_once(':') else {
            continue;
        };
        let value = raw_value.trim();
        match key.trim() {
            "Name" if name.is_none() => name = Some(value.to_owned()),
            "Version" if version.is_none() => version = Some(value.to_owned()),
            _ => {}
        }
    }
    name.zip(version)
        .filter(|(found_name, found_version)| !found_name.is_empty() && !found_version.is_empty())
}

fn read_top_level(metadata_dir: &Path) -> Result<Option<Vec<String>>, MetadataError> {
    let Some(text) = read_optional(&metadata_dir.join("top_level.txt"))? else {
        return Ok(None);
    };
    let modules = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.replace(['/', '\\'], "."))
        .collect();
    Ok(Some(modules))
}

fn read_record_modules(metadata_dir: &Path) -> Result<Option<Vec<String>>, MetadataError> {
    let Some(text) = read_optional(&metadata_dir.join("RECORD"))? else {
        return Ok(None);
    };
    let mut modules: Vec<String> = text
        .lines()
        .filter_map(|line| line.split(',').next())
        .filter_map(record_module)
        .collect();
    modules.sort();
    modules.dedup();
    Ok(Some(modules))
}

/// Maps one `RECORD` path onto the top-level module it installs, if any.
fn record_module(entry: &str) -> Option<String> {
    let mut components = entry.trim().split(['/', '\\']);
    let first = components.next()?;
    let nested = components.next().is_some();

    if first.is_empty()
        || first == ".."
        || first == "__pycache__"
        || first.ends_with(".dist-info")
        || first.ends_with(".egg-info")
        || first.ends_with(".data")
    {
        return None;
    }

    if nested {
        return is_identifier(first).then(|| first.to_owned());
    }

    // Top-level files: `six.py`, `_cffi_backend.cpython-311-x86_64-linux-gnu.so`.
    let (stem, _) = first.split_once('.')?;
    let extension = first.rsplit('.').next()?;
    matches!(extension, "py" | "so" | "pyd")
        .then_some(stem)
        .filter(|candidate| is_identifier(candidate))
        .map(str::to_owned)
}

fn is_identifier(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|rest| rest.is_alphanumeric() || rest == '_')
}

fn module_name_from_distribution(name: &str) -> String {
    name.replace(['-', '.'], "_")
}
