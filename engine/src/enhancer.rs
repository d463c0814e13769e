//! Composable behavior capabilities attachable to a compiler instance.
//!
//! An enhancer never injects methods into the compiler; the compiler holds
//! an ordered list of attached capabilities and dispatches three hooks
//! through it: input preprocessing (before scanning), fragment rewriting
//! (after scanning), and the escape override. Attachment order matters and
//! is preserved.

use regex::Regex;
use serde_yaml::Value;

use crate::compiler::{Properties, property};
use crate::template::{Fragment, MarkerSyntax, Pattern};

/// A named, composable behavior capability.
pub trait Enhancer: std::fmt::Debug {
    /// Registry short name (without the `Enhancer` suffix).
    fn name(&self) -> &'static str;

    /// Forces the escape hook on plain expressions when true.
    fn forces_escape(&self) -> bool {
        false
    }

    /// Rewrites raw input before scanning. `None` leaves it untouched.
    fn preprocess(&self, _input: &str, _syntax: &MarkerSyntax) -> Option<String> {
        None
    }

    /// Rewrites the scanned fragment stream.
    fn rewrite(&self, fragments: Vec<Fragment>, _escape: bool) -> Vec<Fragment> {
        fragments
    }

    /// Properties to propagate onto the compiler at attachment time.
    fn attach_properties(&self) -> Vec<(String, Value)> {
        Vec::new()
    }
}

/// Forces escaping of `<%= %>` expression output.
#[derive(Debug, Default)]
pub struct EscapeEnhancer;

impl Enhancer for EscapeEnhancer {
    fn name(&self) -> &'static str {
        "Escape"
    }
    fn forces_escape(&self) -> bool {
        true
    }
}

/// Treats lines starting with `%` as statements; `%%` yields a literal `%`.
#[derive(Debug, Default)]
pub struct PercentLineEnhancer;

impl Enhancer for PercentLineEnhancer {
    fn name(&self) -> &'static str {
        "PercentLine"
    }

    fn preprocess(&self, input: &str, syntax: &MarkerSyntax) -> Option<String> {
        let mut out = String::with_capacity(input.len());
        let mut changed = false;
        for line in input.split_inclusive('\n') {
            if let Some(rest) = line.strip_prefix("%%") {
                out.push('%');
                out.push_str(rest);
                changed = true;
            } else if let Some(rest) = line.strip_prefix('%') {
                let (code, newline) = match rest.strip_suffix('\n') {
                    Some(code) => (code, "\n"),
                    None => (rest, ""),
                };
                out.push_str(&syntax.statement_token(code.trim()));
                out.push_str(newline);
                changed = true;
            } else {
                out.push_str(line);
            }
        }
        changed.then_some(out)
    }
}

/// Recognizes a second embedded pattern (default `[= =]`) for expressions
/// inside text fragments. The pattern comes from the `bipattern` property,
/// which is also propagated onto the compiler at attachment.
#[derive(Debug)]
pub struct BiPatternEnhancer {
    pattern: Pattern,
}

impl BiPatternEnhancer {
    pub fn from_properties(properties: &Properties) -> Self {
        let spec = property(properties, "bipattern")
            .and_then(Value::as_str)
            .unwrap_or("[= =]");
        let pattern = Pattern::parse(spec)
            .unwrap_or_else(|_| Pattern { prefix: "[=".to_string(), suffix: "=]".to_string() });
        Self { pattern }
    }
}

impl Enhancer for BiPatternEnhancer {
    fn name(&self) -> &'static str {
        "BiPattern"
    }

    fn rewrite(&self, fragments: Vec<Fragment>, escape: bool) -> Vec<Fragment> {
        let body = format!(
            "(?s){}(.*?){}",
            regex::escape(&self.pattern.prefix),
            regex::escape(&self.pattern.suffix)
        );
        let re = Regex::new(&body).expect("bipattern regex");
        let mut out = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            match fragment {
                Fragment::Text(text) => {
                    let mut last = 0;
                    for caps in re.captures_iter(&text) {
                        let m = caps.get(0).expect("whole match");
                        if m.start() > last {
                            out.push(Fragment::Text(text[last..m.start()].to_string()));
                        }
                        out.push(Fragment::Expr {
                            code: caps[1].trim().to_string(),
                            escaped: escape,
                        });
                        last = m.end();
                    }
                    if last < text.len() {
                        out.push(Fragment::Text(text[last..].to_string()));
                    }
                }
                other => out.push(other),
            }
        }
        out
    }

    fn attach_properties(&self) -> Vec<(String, Value)> {
        vec![(
            "bipattern".to_string(),
            Value::String(format!("{} {}", self.pattern.prefix, self.pattern.suffix)),
        )]
    }
}

/// Drops text fragments, leaving code-only output.
#[derive(Debug, Default)]
pub struct NoTextEnhancer;

impl Enhancer for NoTextEnhancer {
    fn name(&self) -> &'static str {
        "NoText"
    }

    fn rewrite(&self, fragments: Vec<Fragment>, _escape: bool) -> Vec<Fragment> {
        fragments
            .into_iter()
            .filter(|fragment| !matches!(fragment, Fragment::Text(_)))
            .collect()
    }
}

/// Strips leading indentation from every text line.
#[derive(Debug, Default)]
pub struct DeleteIndentEnhancer;

impl Enhancer for DeleteIndentEnhancer {
    fn name(&self) -> &'static str {
        "DeleteIndent"
    }

    fn rewrite(&self, fragments: Vec<Fragment>, _escape: bool) -> Vec<Fragment> {
        fragments
            .into_iter()
            .map(|fragment| match fragment {
                Fragment::Text(text) => {
                    let stripped: String = text
                        .split_inclusive('\n')
                        .map(|line| line.trim_start_matches([' ', '\t']))
                        .collect();
                    Fragment::Text(stripped)
                }
                other => other,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedded() -> MarkerSyntax {
        MarkerSyntax::Embedded(Pattern::default_embedded())
    }

    #[test]
    fn test_percent_line_rewrites_statements() {
        let enhancer = PercentLineEnhancer;
        let out = enhancer
            .preprocess("% each\ntext\n%% literal\n", &embedded())
            .unwrap();
        assert_eq!(out, "<% each %>\ntext\n% literal\n");
    }

    #[test]
    fn test_percent_line_leaves_plain_input_untouched() {
        let enhancer = PercentLineEnhancer;
        assert!(enhancer.preprocess("plain text\n", &embedded()).is_none());
    }

    #[test]
    fn test_bipattern_splits_text_fragments() {
        let enhancer = BiPatternEnhancer::from_properties(&Properties::new());
        let fragments = vec![Fragment::Text("a [= x =] b".to_string())];
        assert_eq!(
            enhancer.rewrite(fragments, false),
            vec![
                Fragment::Text("a ".to_string()),
                Fragment::Expr { code: "x".to_string(), escaped: false },
                Fragment::Text(" b".to_string()),
            ]
        );
    }

    #[test]
    fn test_bipattern_propagates_its_property() {
        let enhancer = BiPatternEnhancer::from_properties(&Properties::new());
        assert_eq!(
            enhancer.attach_properties(),
            vec![("bipattern".to_string(), Value::String("[= =]".to_string()))]
        );
    }

    #[test]
    fn test_no_text_drops_text() {
        let enhancer = NoTextEnhancer;
        let fragments = vec![
            Fragment::Text("x".to_string()),
            Fragment::Stmt("code".to_string()),
        ];
        assert_eq!(
            enhancer.rewrite(fragments, false),
            vec![Fragment::Stmt("code".to_string())]
        );
    }

    #[test]
    fn test_delete_indent_strips_leading_whitespace() {
        let enhancer = DeleteIndentEnhancer;
        let fragments = vec![Fragment::Text("  a\n\tb\n".to_string())];
        assert_eq!(
            enhancer.rewrite(fragments, false),
            vec![Fragment::Text("a\nb\n".to_string())]
        );
    }
}
