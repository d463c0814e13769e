//! Option parsing and configuration projection for the `templet` command.
//!
//! This crate is the front half of the command pipeline:
//!
//! - [`OptionSchema`] — the static table of recognized short options, each
//!   bound to a symbolic name and one of three argument arities.
//! - [`tokenize`] — the hand-rolled tokenizer that splits a raw argument
//!   vector into parsed options, free-form `--name[=value]` properties, and
//!   positional filenames.
//! - [`RunConfig`] — the projected, named configuration view, so downstream
//!   code never depends on single-character keys.
//! - [`CommandOptionError`] — the single user-facing error kind.
//!
//! # Example
//!
//! ```
//! use templet_core::{command_schema, tokenize, RunConfig};
//!
//! let schema = command_schema();
//! let argv: Vec<String> = ["-xt", "-f", "data.yaml", "page.html"]
//!     .iter().map(|s| s.to_string()).collect();
//!
//! let parsed = tokenize(&schema, &argv).unwrap();
//! let config = RunConfig::project(&schema, &parsed.options);
//!
//! assert!(config.source_only && config.untabify);
//! assert_eq!(config.datafiles.as_deref(), Some("data.yaml"));
//! assert_eq!(parsed.filenames, vec!["page.html".to_string()]);
//! ```

mod config;
mod error;
mod schema;
mod tokenize;

pub use config::RunConfig;
pub use error::{CommandOptionError, Result};
pub use schema::{Arity, OptionSchema, OptionSpec, command_schema};
pub use tokenize::{OptionValue, ParsedOptions, TokenizedArgs, parse_yaml_literal, tokenize};
