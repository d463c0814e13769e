//! Projection from parsed option characters to a named configuration view.
//!
//! Downstream logic (resolver, context loader, orchestrator) never touches
//! single-character keys; it reads the typed [`RunConfig`] produced here.
//! Projection is pure and total: unknown characters are skipped, absent
//! fields keep their `false`/`None` defaults, and nothing can fail.

use crate::schema::OptionSchema;
use crate::tokenize::ParsedOptions;

/// The named, read-only view over one run's parsed options.
///
/// One field per schema entry. Flags are `bool`; argument options are
/// `Option<String>` with `None` as the "not supplied" sentinel — never a
/// magic string.
///
/// # Examples
///
/// ```
/// use templet_core::{command_schema, tokenize, RunConfig};
///
/// let schema = command_schema();
/// let argv: Vec<String> = ["-x", "-l", "php"].iter().map(|s| s.to_string()).collect();
/// let parsed = tokenize(&schema, &argv).unwrap();
/// let config = RunConfig::project(&schema, &parsed.options);
///
/// assert!(config.source_only);
/// assert_eq!(config.lang.as_deref(), Some("php"));
/// assert!(config.datafiles.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// `-h` / `--help`: print usage, properties, and enhancers.
    pub help: bool,
    /// `-v`: print the version string.
    pub version: bool,
    /// `-x`: emit generated source instead of evaluating.
    pub source_only: bool,
    /// `-T`: disable trimming around statement markers.
    pub no_trim: bool,
    /// `-t`: expand tabs in YAML data files before parsing.
    pub untabify: bool,
    /// `-S`: normalize string keys in loaded data to symbolic form.
    pub intern_keys: bool,
    /// `-b`: body only — suppress preamble and postamble.
    pub body_only: bool,
    /// `-B`: evaluate through a lexical-scope binding instead of the
    /// explicit context mapping.
    pub use_binding: bool,
    /// `-e`: enable escaping of expression output.
    pub escape: bool,
    /// `-p PATTERN`: embedded pattern (default `<% %>`).
    pub pattern: Option<String>,
    /// `-c CONTEXT`: inline context string (YAML mapping or scriptlet).
    pub context: Option<String>,
    /// `-C CLASSNAME`: explicit compiler class name.
    pub class_name: Option<String>,
    /// `-r LIBS`: comma-separated registry extension libraries.
    pub requires: Option<String>,
    /// `-f DATAFILES`: comma-separated context data files.
    pub datafiles: Option<String>,
    /// `-K KANJICODE`: output encoding name.
    pub kanji: Option<String>,
    /// `-I PATHS`: comma-separated library include paths.
    pub include_paths: Option<String>,
    /// `-l LANG`: target output language.
    pub lang: Option<String>,
    /// `-a ACTION`: convert / exec / execute.
    pub action: Option<String>,
    /// `-E ENHANCERS`: comma-separated enhancer names.
    pub enhancers: Option<String>,
}

impl RunConfig {
    /// Projects parsed options into the named view using the schema's
    /// symbolic names.
    pub fn project(schema: &OptionSchema, options: &ParsedOptions) -> Self {
        let mut config = Self::default();
        for (&ch, value) in options {
            let Some(spec) = schema.lookup(ch) else {
                continue;
            };
            let text = value.as_text().map(str::to_string);
            match spec.name {
                "help" => config.help = true,
                "version" => config.version = true,
                "source_only" => config.source_only = true,
                "no_trim" => config.no_trim = true,
                "untabify" => config.untabify = true,
                "intern_keys" => config.intern_keys = true,
                "body_only" => config.body_only = true,
                "use_binding" => config.use_binding = true,
                "escape" => config.escape = true,
                "pattern" => config.pattern = text,
                "context" => config.context = text,
                "class_name" => config.class_name = text,
                "requires" => config.requires = text,
                "datafiles" => config.datafiles = text,
                "kanji" => config.kanji = text,
                "include_paths" => config.include_paths = text,
                "lang" => config.lang = text,
                "action" => config.action = text,
                "enhancers" => config.enhancers = text,
                _ => {}
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::command_schema;
    use crate::tokenize::tokenize;

    fn project(tokens: &[&str]) -> RunConfig {
        let schema = command_schema();
        let argv: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        let parsed = tokenize(&schema, &argv).unwrap();
        RunConfig::project(&schema, &parsed.options)
    }

    #[test]
    fn test_every_supplied_field_is_projected() {
        let config = project(&[
            "-hvxTtSbeB", "-p", "[% %]", "-c", "{a: 1}", "-C", "Ephp", "-r", "extra", "-f",
            "data.yaml", "-K", "utf8", "-I", "lib", "-l", "java", "-a", "convert", "-E",
            "Escape",
        ]);
        assert!(config.help && config.version && config.source_only);
        assert!(config.no_trim && config.untabify && config.intern_keys);
        assert!(config.body_only && config.escape && config.use_binding);
        assert_eq!(config.pattern.as_deref(), Some("[% %]"));
        assert_eq!(config.context.as_deref(), Some("{a: 1}"));
        assert_eq!(config.class_name.as_deref(), Some("Ephp"));
        assert_eq!(config.requires.as_deref(), Some("extra"));
        assert_eq!(config.datafiles.as_deref(), Some("data.yaml"));
        assert_eq!(config.kanji.as_deref(), Some("utf8"));
        assert_eq!(config.include_paths.as_deref(), Some("lib"));
        assert_eq!(config.lang.as_deref(), Some("java"));
        assert_eq!(config.action.as_deref(), Some("convert"));
        assert_eq!(config.enhancers.as_deref(), Some("Escape"));
    }

    #[test]
    fn test_absent_fields_carry_no_value() {
        let config = project(&["-x"]);
        assert!(config.source_only);
        assert!(!config.help && !config.version && !config.escape);
        assert!(config.pattern.is_none());
        assert!(config.lang.is_none());
        assert!(config.action.is_none());
        assert!(config.datafiles.is_none());
    }
}
