//! Evaluation-context loading and merging.
//!
//! Context data comes from two places, later winning over earlier:
//!
//! 1. zero or more data files (`-f a.yaml,b.ctx`), merged in listed order —
//!    later files overwrite earlier top-level keys;
//! 2. an inline context string (`-c`), which **replaces** the combined
//!    datafile context entirely rather than merging with it.
//!
//! Data files dispatch on extension. `.yaml`/`.yml` parse as one YAML
//! document whose root must be a mapping. `.ctx` files are "scripted
//! context": a restricted assignment evaluator, one `name = <yaml literal>`
//! binding per line — no arbitrary code execution. Any other extension
//! fails fast.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use templet_core::{CommandOptionError, Result, parse_yaml_literal};

use crate::compiler::EvaluationContext;
use crate::paths;

/// Loading options carried from the run configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Expand tab characters in YAML files before parsing (`-t`).
    pub untabify: bool,
    /// Normalize string keys to symbolic form after loading (`-S`).
    pub intern_keys: bool,
}

/// Merges a comma-separated datafile list into one evaluation context.
pub fn load_datafiles(list: &str, options: LoadOptions) -> Result<EvaluationContext> {
    let mut context = EvaluationContext::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let loaded = load_datafile(name, options)?;
        // Shallow merge: later files overwrite earlier top-level keys.
        for (key, value) in loaded {
            context.insert(key, value);
        }
    }
    Ok(context)
}

fn load_datafile(name: &str, options: LoadOptions) -> Result<EvaluationContext> {
    let path = paths::resolve_file(name)
        .ok_or_else(|| CommandOptionError::FileNotFound(name.to_string()))?;
    let raw = std::fs::read_to_string(&path)
        .map_err(|_| CommandOptionError::UnreadableFile(name.to_string()))?;
    tracing::debug!(file = name, "loading context data file");

    match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => {
            let text = if options.untabify { untabify(&raw, 8) } else { raw };
            let document: Value = serde_yaml::from_str(&text).map_err(|err| {
                CommandOptionError::MalformedData {
                    file: name.to_string(),
                    detail: err.to_string(),
                }
            })?;
            let Value::Mapping(mut mapping) = document else {
                return Err(CommandOptionError::RootNotMapping(name.to_string()));
            };
            if options.intern_keys {
                intern_mapping_keys(&mut mapping);
            }
            Ok(mapping)
        }
        Some("ctx") => eval_scripted_context(&raw, name),
        _ => Err(CommandOptionError::UnsupportedDataFile(name.to_string())),
    }
}

/// Parses an inline `-c` context string.
///
/// A string whose first non-whitespace character is `{` is one YAML mapping
/// literal; anything else goes through the restricted assignment evaluator.
pub fn parse_inline_context(text: &str, options: LoadOptions) -> Result<EvaluationContext> {
    if text.trim_start().starts_with('{') {
        let document: Value =
            serde_yaml::from_str(text).map_err(|err| CommandOptionError::MalformedData {
                file: "-c".to_string(),
                detail: err.to_string(),
            })?;
        let Value::Mapping(mut mapping) = document else {
            return Err(CommandOptionError::RootNotMapping("-c".to_string()));
        };
        if options.intern_keys {
            intern_mapping_keys(&mut mapping);
        }
        Ok(mapping)
    } else {
        eval_scripted_context(text, "-c")
    }
}

/// The restricted scripted-context evaluator.
///
/// One binding per non-blank, non-`#` line: `name = <yaml literal>`. Names
/// are identifiers; values parse exactly like `--name=value` tokens.
fn eval_scripted_context(source: &str, origin: &str) -> Result<EvaluationContext> {
    let mut scope = EvaluationContext::new();
    for (index, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parsed = line.split_once('=').and_then(|(name, value)| {
            let name = name.trim();
            let valid = !name.is_empty()
                && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            valid.then(|| (name.to_string(), parse_yaml_literal(value.trim())))
        });
        let Some((name, value)) = parsed else {
            return Err(CommandOptionError::MalformedData {
                file: origin.to_string(),
                detail: format!("line {}: not an assignment", index + 1),
            });
        };
        scope.insert(Value::String(name), value);
    }
    Ok(scope)
}

/// Expands tab characters to the next multiple-of-`width` column boundary,
/// columns measured from the last line break or the start of the string.
pub fn untabify(text: &str, width: usize) -> String {
    let mut pieces = text.split('\t');
    let mut out = String::with_capacity(text.len());
    // The final piece carries no tab after it.
    let Some(first) = pieces.next() else {
        return out;
    };
    let mut pending = first;
    for next in pieces {
        out.push_str(pending);
        let column = match out.rfind('\n') {
            Some(pos) => out[pos + 1..].chars().count(),
            None => out.chars().count(),
        };
        let pad = width - (column % width);
        out.extend(std::iter::repeat_n(' ', pad));
        pending = next;
    }
    out.push_str(pending);
    out
}

fn normalize_key(key: &str) -> String {
    key.trim().replace('-', "_")
}

/// Recursively normalizes every string key in a mapping to symbolic form,
/// visiting nested mappings and sequences exactly once each. Values form an
/// owned tree, so termination is structural.
pub fn intern_mapping_keys(mapping: &mut Mapping) {
    let entries: Vec<(Value, Value)> = std::mem::take(mapping).into_iter().collect();
    for (key, mut value) in entries {
        intern_value_keys(&mut value);
        let key = match key {
            Value::String(name) => Value::String(normalize_key(&name)),
            other => other,
        };
        mapping.insert(key, value);
    }
}

fn intern_value_keys(value: &mut Value) {
    match value {
        Value::Mapping(mapping) => intern_mapping_keys(mapping),
        Value::Sequence(sequence) => {
            for item in sequence {
                intern_value_keys(item);
            }
        }
        _ => {}
    }
}
