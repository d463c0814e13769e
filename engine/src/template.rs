//! Embedded-pattern scanning: template text → fragment stream.
//!
//! Two marker syntaxes exist. The default embedded syntax wraps code in a
//! configurable prefix/suffix pair (`<% %>` unless overridden), with `=`
//! marking an expression, `==` the inverse-escaped expression, and `#` a
//! comment. The processing-instruction syntax scans `<?rb ... ?>`-style
//! instructions and `@{...}@` / `@!{...}@` expressions instead.

use regex::Regex;

use templet_core::{CommandOptionError, Result};

/// One compiled piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Literal text, passed through verbatim.
    Text(String),
    /// An embedded statement. Emitted into generated source; not executed
    /// by the restricted evaluator.
    Stmt(String),
    /// An embedded expression, resolved against the evaluation context.
    Expr {
        /// Expression text (a dotted path at evaluation time).
        code: String,
        /// Whether output passes through the escape hook.
        escaped: bool,
    },
}

/// A prefix/suffix marker pair, e.g. `<% %>` or `[= =]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub prefix: String,
    pub suffix: String,
}

impl Pattern {
    /// Parses a `"PREFIX SUFFIX"` pattern spec.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut parts = spec.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(prefix), Some(suffix), None) => Ok(Self {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
            }),
            _ => Err(CommandOptionError::InvalidPattern(spec.to_string())),
        }
    }

    /// The default embedded pattern, `<% %>`.
    pub fn default_embedded() -> Self {
        Self { prefix: "<%".to_string(), suffix: "%>".to_string() }
    }

    fn regex(&self) -> Regex {
        let body = format!(
            "(?s){}(==|=|#)?(.*?){}",
            regex::escape(&self.prefix),
            regex::escape(&self.suffix)
        );
        Regex::new(&body).expect("embedded pattern regex")
    }
}

/// Which marker namespace a compiler scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerSyntax {
    /// The default `<% %>`-style embedded markers.
    Embedded(Pattern),
    /// `<?name ... ?>` instructions with `@{...}@` expressions.
    Pi {
        /// Instruction name, e.g. `rb` for `<?rb ... ?>`.
        name: String,
    },
}

impl MarkerSyntax {
    /// Wraps code in this syntax's statement markers. Used by enhancers that
    /// rewrite raw input into statements.
    pub fn statement_token(&self, code: &str) -> String {
        match self {
            MarkerSyntax::Embedded(pattern) => {
                format!("{} {} {}", pattern.prefix, code, pattern.suffix)
            }
            MarkerSyntax::Pi { name } => format!("<?{name} {code} ?>"),
        }
    }

    /// Scans input into fragments.
    ///
    /// `trim` removes the indentation and trailing newline around statement
    /// markers that sit alone on a line. `escape` decides how the plain
    /// expression indicator is treated: with `escape` on, `<%= %>` output is
    /// escaped and `<%== %>` is raw; with it off the roles swap.
    pub fn scan(&self, input: &str, trim: bool, escape: bool) -> Vec<Fragment> {
        match self {
            MarkerSyntax::Embedded(pattern) => {
                scan_embedded(input, pattern, trim, escape)
            }
            MarkerSyntax::Pi { name } => scan_pi(input, name, trim),
        }
    }
}

fn push_text(fragments: &mut Vec<Fragment>, text: &str) {
    if !text.is_empty() {
        fragments.push(Fragment::Text(text.to_string()));
    }
}

/// True when `text` ends at a line start followed only by indentation.
fn at_line_indent(text: &str) -> bool {
    let stripped = text.trim_end_matches([' ', '\t']);
    stripped.is_empty() || stripped.ends_with('\n')
}

fn scan_embedded(input: &str, pattern: &Pattern, trim: bool, escape: bool) -> Vec<Fragment> {
    let re = pattern.regex();
    let mut fragments = Vec::new();
    let mut last = 0;

    for caps in re.captures_iter(input) {
        let m = caps.get(0).expect("whole match");
        if m.start() < last {
            continue;
        }
        let mut text = &input[last..m.start()];
        last = m.end();

        let indicator = caps.get(1).map_or("", |i| i.as_str());
        let code = caps.get(2).map_or("", |c| c.as_str());

        match indicator {
            "" | "#" => {
                // Statements and comments trim their own line.
                let tail = &input[last..];
                if trim && at_line_indent(text) && (tail.starts_with('\n') || tail.starts_with("\r\n"))
                {
                    text = text.trim_end_matches([' ', '\t']);
                    last += if tail.starts_with("\r\n") { 2 } else { 1 };
                }
                push_text(&mut fragments, text);
                if indicator.is_empty() {
                    fragments.push(Fragment::Stmt(code.trim().to_string()));
                }
            }
            "=" => {
                push_text(&mut fragments, text);
                fragments.push(Fragment::Expr { code: code.trim().to_string(), escaped: escape });
            }
            "==" => {
                push_text(&mut fragments, text);
                fragments.push(Fragment::Expr { code: code.trim().to_string(), escaped: !escape });
            }
            _ => unreachable!("indicator alternation"),
        }
    }

    push_text(&mut fragments, &input[last..]);
    fragments
}

fn scan_pi(input: &str, name: &str, trim: bool) -> Vec<Fragment> {
    let body = format!(
        r"(?s)<\?{}(\s.*?)?\?>|@(!)?\{{(.*?)\}}@",
        regex::escape(name)
    );
    let re = Regex::new(&body).expect("pi pattern regex");
    let mut fragments = Vec::new();
    let mut last = 0;

    for caps in re.captures_iter(input) {
        let m = caps.get(0).expect("whole match");
        if m.start() < last {
            continue;
        }
        let mut text = &input[last..m.start()];
        last = m.end();

        if let Some(expr) = caps.get(3) {
            // @{...}@ escapes by default; @!{...}@ is raw.
            let raw = caps.get(2).is_some();
            push_text(&mut fragments, text);
            fragments.push(Fragment::Expr {
                code: expr.as_str().trim().to_string(),
                escaped: !raw,
            });
        } else {
            let code = caps.get(1).map_or("", |c| c.as_str());
            let tail = &input[last..];
            if trim && at_line_indent(text) && (tail.starts_with('\n') || tail.starts_with("\r\n")) {
                text = text.trim_end_matches([' ', '\t']);
                last += if tail.starts_with("\r\n") { 2 } else { 1 };
            }
            push_text(&mut fragments, text);
            fragments.push(Fragment::Stmt(code.trim().to_string()));
        }
    }

    push_text(&mut fragments, &input[last..]);
    fragments
}
