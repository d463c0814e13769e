//! The template-compilation engine behind the `templet` command.
//!
//! This crate is the back half of the pipeline: it turns a resolved run
//! configuration into work. The pieces, leaves first:
//!
//! - [`template`] — embedded-pattern scanning into fragment streams, for
//!   both the default `<% %>` syntax and the `--pi` instruction syntax.
//! - [`generator`] — per-target-language source generators (ruby, php, c,
//!   java, scheme, perl, javascript).
//! - [`compiler`] — the [`Compiler`] trait the orchestrator drives, and the
//!   shipped [`TemplateCompiler`] with its restricted evaluator.
//! - [`enhancer`] — composable capabilities attached to a compiler via
//!   composition, never method injection.
//! - [`registry`] — class/enhancer registries and name resolution.
//! - [`context`] — evaluation-context loading and merging from data files
//!   and inline strings.
//! - [`paths`] — the process-wide search path list and registry extension
//!   files.
//!
//! # Example
//!
//! ```
//! use templet_engine::{Properties, Registry, resolve_compiler};
//!
//! let registry = Registry::bootstrap();
//! let mut compiler = resolve_compiler(&registry, None, Some("php"), &Properties::new()).unwrap();
//! compiler.convert("Hello <%= name %>\n");
//! assert!(compiler.src().contains("<?php echo name; ?>"));
//! ```
//!
//! # Scripted context is restricted
//!
//! `.ctx` data files and non-mapping `-c` strings go through a restricted
//! assignment evaluator (`name = <yaml literal>` per line). Arbitrary code
//! is never executed; template statements are carried into generated source
//! but not run.

pub mod compiler;
pub mod context;
pub mod enhancer;
pub mod generator;
pub mod paths;
pub mod registry;
pub mod template;

pub use compiler::{
    Binding, Compiler, EvaluationContext, Properties, TemplateCompiler, basic_properties,
    common_properties, escape_html, is_truthy, pi_properties, property,
};
pub use context::{LoadOptions, load_datafiles, parse_inline_context};
pub use enhancer::Enhancer;
pub use generator::PropertyInfo;
pub use registry::{
    CompilerClass, CompilerRegistry, DEFAULT_LANG, EnhancerClass, EnhancerRegistry, Registry,
    attach_enhancers, resolve_compiler, resolve_enhancers,
};
pub use template::{Fragment, MarkerSyntax, Pattern};
