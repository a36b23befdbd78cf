use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::schema::PolicyConfig;

/// Errors that can occur while loading the policy file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to open file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Section of the policy file a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// Before the first header; lines here are ignored.
    Preamble,
    Qwstfw,
    Aliases,
    Commands,
}

impl Section {
    fn from_header(line: &str) -> Option<Self> {
        match line {
            "[qwstfw]" => Some(Self::Qwstfw),
            "[aliases]" => Some(Self::Aliases),
            "[commands]" => Some(Self::Commands),
            _ => None,
        }
    }
}

/// Load a [`PolicyConfig`] from disk.
///
/// The file name component of `path` is looked up in the working directory
/// first; if that cannot be opened, `path` itself is tried.
pub fn load_policy(path: impl AsRef<Path>) -> Result<PolicyConfig, LoadError> {
    let path = path.as_ref();
    let mut file = open_policy_file(path)?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(load_policy_from_str(&contents))
}

fn open_policy_file(path: &Path) -> Result<File, LoadError> {
    if let Some(name) = path.file_name() {
        if let Ok(file) = File::open(name) {
            return Ok(file);
        }
    }

    File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a [`PolicyConfig`] from the text of a policy file.
///
/// Parsing is permissive: unknown keys, stray lines and lines outside any
/// section are skipped rather than rejected.
pub fn load_policy_from_str(contents: &str) -> PolicyConfig {
    let (_, config) = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .fold(
            (Section::Preamble, PolicyConfig::default()),
            |(section, config), line| apply_line(section, config, line),
        );
    config
}

fn apply_line(section: Section, mut config: PolicyConfig, line: &str) -> (Section, PolicyConfig) {
    if let Some(next) = Section::from_header(line) {
        return (next, config);
    }

    match section {
        Section::Qwstfw => {
            if line.starts_with("allow_downloads") && is_truthy(line) {
                config.allow_downloads = true;
            }
        }
        Section::Aliases => config.alias_commands.push(line.to_string()),
        Section::Commands => config.allowed_prefixes.push(line.to_string()),
        Section::Preamble => trace!(line, "ignoring line outside of any section"),
    }

    (section, config)
}

/// `true` only when the text after the last `=` is `true` in any letter case.
fn is_truthy(line: &str) -> bool {
    line.rsplit('=')
        .next()
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}
