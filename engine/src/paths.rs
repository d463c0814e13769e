//! Process-wide library search paths and registry extension files.
//!
//! `-I` appends user paths to a process-wide search list; it is extended,
//! never shrunk, and must be extended before any resolution so that
//! user-supplied names are visible. `-r` resolves library names through
//! that list and loads **registry extension files** — YAML descriptors that
//! alias new compiler/enhancer names onto registered ones:
//!
//! ```yaml
//! compilers:
//!   Ets: Ejavascript
//! pi_compilers:
//!   Ets: Ejavascript
//! enhancers:
//!   Quote: Escape
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use serde_yaml::Value;

use templet_core::{CommandOptionError, Result};

use crate::registry::Registry;

fn search_paths() -> &'static Mutex<Vec<PathBuf>> {
    static PATHS: OnceLock<Mutex<Vec<PathBuf>>> = OnceLock::new();
    PATHS.get_or_init(|| Mutex::new(Vec::new()))
}

/// Appends a comma-separated path list to the process-wide search paths.
pub fn append_search_paths(list: &str) {
    let mut paths = search_paths().lock().expect("search path lock");
    for path in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        paths.push(PathBuf::from(path));
    }
}

/// Resolves a file name directly or through the search paths.
pub fn resolve_file(name: &str) -> Option<PathBuf> {
    let direct = Path::new(name);
    if direct.is_file() {
        return Some(direct.to_path_buf());
    }
    let paths = search_paths().lock().expect("search path lock");
    paths
        .iter()
        .map(|base| base.join(name))
        .find(|candidate| candidate.is_file())
}

/// Resolves a library name: as given, then with a `.yaml` suffix.
fn resolve_library(name: &str) -> Option<PathBuf> {
    resolve_file(name).or_else(|| resolve_file(&format!("{name}.yaml")))
}

/// Loads a comma-separated list of registry extension libraries.
pub fn load_libraries(registry: &mut Registry, list: &str) -> Result<()> {
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let path = resolve_library(name)
            .ok_or_else(|| CommandOptionError::LibraryNotFound(name.to_string()))?;
        tracing::debug!(library = name, path = %path.display(), "loading registry extension");
        let raw = std::fs::read_to_string(&path)
            .map_err(|_| CommandOptionError::UnreadableFile(name.to_string()))?;
        let document: Value =
            serde_yaml::from_str(&raw).map_err(|err| CommandOptionError::MalformedData {
                file: name.to_string(),
                detail: err.to_string(),
            })?;
        let Value::Mapping(sections) = document else {
            return Err(CommandOptionError::RootNotMapping(name.to_string()));
        };
        for (section, aliases) in &sections {
            let (Some(section), Value::Mapping(aliases)) = (section.as_str(), aliases) else {
                return Err(CommandOptionError::MalformedData {
                    file: name.to_string(),
                    detail: "sections must be mappings of alias: target".to_string(),
                });
            };
            for (alias, target) in aliases {
                let (Some(alias), Some(target)) = (alias.as_str(), target.as_str()) else {
                    return Err(CommandOptionError::MalformedData {
                        file: name.to_string(),
                        detail: format!("non-string alias entry in '{section}'"),
                    });
                };
                match section {
                    "compilers" => registry.basic.add_alias(alias, target)?,
                    "pi_compilers" => registry.pi.add_alias(alias, target)?,
                    "enhancers" => registry.enhancers.add_alias(alias, target)?,
                    other => {
                        return Err(CommandOptionError::MalformedData {
                            file: name.to_string(),
                            detail: format!("unknown section '{other}'"),
                        });
                    }
                }
            }
        }
    }
    Ok(())
}
