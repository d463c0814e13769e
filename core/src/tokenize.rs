//! The hand-rolled argument tokenizer.
//!
//! Scans the raw token sequence left to right and splits it into three
//! products:
//!
//! - [`ParsedOptions`] — option character → value, honoring the schema's
//!   arity rules (flags record `true`, argument options record a string).
//! - a property mapping — free-form `--name[=value]` tokens, with hyphens
//!   normalized to underscores and values parsed as single-document YAML
//!   literals (`--level=3` yields the integer 3, a bare `--flag` yields
//!   `true`, `--list=[1,2]` yields a sequence).
//! - the remaining positional tokens (input filenames).
//!
//! Short options cluster: `-xTb` is three flags, and `-Keuc` is equivalent
//! to `-K euc`. The first token that does not start with `-` terminates
//! option scanning; everything from there on is positional.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_yaml::{Mapping, Value};

use crate::error::{CommandOptionError, Result};
use crate::schema::{Arity, OptionSchema};

/// Value recorded for one parsed option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// The option appeared as a flag (no argument).
    Switch,
    /// The option carried an argument.
    Text(String),
}

impl OptionValue {
    /// The argument text, when one was supplied.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Switch => None,
            OptionValue::Text(text) => Some(text),
        }
    }
}

/// Mapping of option character → parsed value, in character order.
pub type ParsedOptions = BTreeMap<char, OptionValue>;

/// Everything the tokenizer produces from one command line.
#[derive(Debug, Clone, Default)]
pub struct TokenizedArgs {
    /// Schema-declared short options.
    pub options: ParsedOptions,
    /// Free-form `--name[=value]` properties, in appearance order.
    pub properties: Mapping,
    /// Remaining positional tokens, in original order.
    pub filenames: Vec<String>,
}

fn context_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([-\w]+)(?:=(.*))?$").expect("context token regex"))
}

/// Parses a single-document YAML literal, falling back to a plain string
/// when the text is not valid YAML on its own (mirrors YAML scalar rules:
/// `3` is an integer, `true` a boolean, `[1,2]` a sequence).
pub fn parse_yaml_literal(text: &str) -> Value {
    serde_yaml::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Tokenizes a raw argument vector against an option schema.
///
/// # Examples
///
/// ```
/// use templet_core::{command_schema, tokenize, OptionValue};
///
/// let argv: Vec<String> = ["-xt", "-Keuc", "--level=3", "page.html"]
///     .iter().map(|s| s.to_string()).collect();
/// let parsed = tokenize(&command_schema(), &argv).unwrap();
///
/// assert_eq!(parsed.options[&'x'], OptionValue::Switch);
/// assert_eq!(parsed.options[&'K'], OptionValue::Text("euc".to_string()));
/// assert_eq!(parsed.filenames, vec!["page.html".to_string()]);
/// ```
///
/// # Errors
///
/// - `-Z` (undeclared character) → "unknown option"
/// - `-f` as the last token → "datafiles required"
/// - `--=x` (malformed context token) → "invalid context value"
pub fn tokenize(schema: &OptionSchema, argv: &[String]) -> Result<TokenizedArgs> {
    let mut options = ParsedOptions::new();
    let mut properties = Mapping::new();
    let mut index = 0;

    while index < argv.len() && argv[index].starts_with('-') {
        let token = &argv[index];
        index += 1;
        let body = &token[1..];

        if let Some(rest) = body.strip_prefix('-') {
            // Context token: --name or --name=value.
            let caps = context_token_re()
                .captures(rest)
                .ok_or_else(|| CommandOptionError::InvalidContextToken(rest.to_string()))?;
            let name = caps[1].replace('-', "_");
            let value = match caps.get(2) {
                Some(raw) => parse_yaml_literal(raw.as_str()),
                None => Value::Bool(true),
            };
            properties.insert(Value::String(name), value);
            continue;
        }

        // Option cluster: peel characters until one consumes the remainder.
        let mut rest = body;
        while let Some(ch) = rest.chars().next() {
            rest = &rest[ch.len_utf8()..];
            let spec = schema
                .lookup(ch)
                .ok_or(CommandOptionError::UnknownOption(ch))?;
            match spec.arity {
                Arity::None => {
                    options.insert(ch, OptionValue::Switch);
                }
                Arity::Required => {
                    let arg = if rest.is_empty() {
                        let next = argv.get(index).ok_or_else(|| {
                            CommandOptionError::MissingArgument {
                                ch,
                                name: spec.name.to_string(),
                            }
                        })?;
                        index += 1;
                        next.clone()
                    } else {
                        rest.to_string()
                    };
                    options.insert(ch, OptionValue::Text(arg));
                    rest = "";
                }
                Arity::Optional => {
                    if rest.is_empty() {
                        options.insert(ch, OptionValue::Switch);
                    } else {
                        options.insert(ch, OptionValue::Text(rest.to_string()));
                    }
                    rest = "";
                }
            }
        }
    }

    Ok(TokenizedArgs {
        options,
        properties,
        filenames: argv[index..].to_vec(),
    })
}
