//! Per-language source generators.
//!
//! A [`Generator`] turns the fragment stream into source text for one target
//! language. Each shipped target appends to a string buffer (or prints
//! directly, for targets without one); the compiler drives the calls and
//! decides whether preamble/postamble are emitted.

use serde_yaml::Value;

use crate::compiler::Properties;

/// One supported engine property, for the `-h` listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyInfo {
    pub name: &'static str,
    pub default: &'static str,
    pub desc: &'static str,
}

/// Target-language code generation behind the fragment stream.
pub trait Generator {
    /// Language identifier (`ruby`, `php`, ...).
    fn lang(&self) -> &'static str;
    fn preamble(&self, out: &mut String);
    fn text(&self, out: &mut String, text: &str);
    fn stmt(&self, out: &mut String, code: &str);
    fn expr(&self, out: &mut String, code: &str, escaped: bool);
    fn postamble(&self, out: &mut String);
    /// Language-specific properties for the help listing.
    fn supported_properties(&self) -> Vec<PropertyInfo> {
        Vec::new()
    }
}

fn quote_single(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}

fn quote_double(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Ruby: accumulate into `_buf`, escape through `CGI.escapeHTML`.
#[derive(Debug, Default)]
pub struct RubyGenerator;

impl Generator for RubyGenerator {
    fn lang(&self) -> &'static str {
        "ruby"
    }
    fn preamble(&self, out: &mut String) {
        out.push_str("_buf = '';");
    }
    fn text(&self, out: &mut String, text: &str) {
        out.push_str(" _buf << '");
        out.push_str(&quote_single(text));
        out.push_str("';");
    }
    fn stmt(&self, out: &mut String, code: &str) {
        out.push(' ');
        out.push_str(code);
        out.push(';');
    }
    fn expr(&self, out: &mut String, code: &str, escaped: bool) {
        if escaped {
            out.push_str(&format!(" _buf << CGI.escapeHTML(({code}).to_s);"));
        } else {
            out.push_str(&format!(" _buf << ({code}).to_s;"));
        }
    }
    fn postamble(&self, out: &mut String) {
        out.push_str("\n_buf.to_s\n");
    }
}

/// PHP: literal text with `<?php ?>` islands.
#[derive(Debug, Default)]
pub struct PhpGenerator;

impl Generator for PhpGenerator {
    fn lang(&self) -> &'static str {
        "php"
    }
    fn preamble(&self, _out: &mut String) {}
    fn text(&self, out: &mut String, text: &str) {
        out.push_str(text);
    }
    fn stmt(&self, out: &mut String, code: &str) {
        out.push_str(&format!("<?php {code}; ?>"));
    }
    fn expr(&self, out: &mut String, code: &str, escaped: bool) {
        if escaped {
            out.push_str(&format!("<?php echo htmlspecialchars({code}); ?>"));
        } else {
            out.push_str(&format!("<?php echo {code}; ?>"));
        }
    }
    fn postamble(&self, _out: &mut String) {}
}

/// C: `fputs`/`fprintf` to a configurable stream.
#[derive(Debug)]
pub struct CGenerator {
    stream: String,
}

impl CGenerator {
    pub fn from_properties(properties: &Properties) -> Self {
        let stream = properties
            .get(&Value::String("out".to_string()))
            .and_then(Value::as_str)
            .unwrap_or("stdout")
            .to_string();
        Self { stream }
    }
}

impl Generator for CGenerator {
    fn lang(&self) -> &'static str {
        "c"
    }
    fn preamble(&self, _out: &mut String) {}
    fn text(&self, out: &mut String, text: &str) {
        out.push_str(&format!("fputs(\"{}\", {});\n", quote_double(text), self.stream));
    }
    fn stmt(&self, out: &mut String, code: &str) {
        out.push_str(code);
        out.push('\n');
    }
    fn expr(&self, out: &mut String, code: &str, _escaped: bool) {
        out.push_str(&format!("fprintf({}, \"%s\", {code});\n", self.stream));
    }
    fn postamble(&self, _out: &mut String) {}
    fn supported_properties(&self) -> Vec<PropertyInfo> {
        vec![PropertyInfo { name: "out", default: "stdout", desc: "output stream" }]
    }
}

/// Java: `StringBuilder` with a configurable buffer variable.
#[derive(Debug)]
pub struct JavaGenerator {
    bufvar: String,
}

impl JavaGenerator {
    pub fn from_properties(properties: &Properties) -> Self {
        let bufvar = properties
            .get(&Value::String("bufvar".to_string()))
            .and_then(Value::as_str)
            .unwrap_or("_buf")
            .to_string();
        Self { bufvar }
    }
}

impl Generator for JavaGenerator {
    fn lang(&self) -> &'static str {
        "java"
    }
    fn preamble(&self, out: &mut String) {
        out.push_str(&format!("StringBuilder {} = new StringBuilder();\n", self.bufvar));
    }
    fn text(&self, out: &mut String, text: &str) {
        out.push_str(&format!("{}.append(\"{}\");\n", self.bufvar, quote_double(text)));
    }
    fn stmt(&self, out: &mut String, code: &str) {
        out.push_str(code);
        out.push('\n');
    }
    fn expr(&self, out: &mut String, code: &str, escaped: bool) {
        if escaped {
            out.push_str(&format!("{}.append(escape({code}));\n", self.bufvar));
        } else {
            out.push_str(&format!("{}.append({code});\n", self.bufvar));
        }
    }
    fn postamble(&self, out: &mut String) {
        out.push_str(&format!("return {}.toString();\n", self.bufvar));
    }
    fn supported_properties(&self) -> Vec<PropertyInfo> {
        vec![PropertyInfo { name: "bufvar", default: "_buf", desc: "buffer variable name" }]
    }
}

/// Scheme: cons onto a list, reverse at the end.
#[derive(Debug, Default)]
pub struct SchemeGenerator;

impl Generator for SchemeGenerator {
    fn lang(&self) -> &'static str {
        "scheme"
    }
    fn preamble(&self, out: &mut String) {
        out.push_str("(let ((_buf '()))\n");
    }
    fn text(&self, out: &mut String, text: &str) {
        out.push_str(&format!("(set! _buf (cons \"{}\" _buf))\n", quote_double(text)));
    }
    fn stmt(&self, out: &mut String, code: &str) {
        out.push_str(code);
        out.push('\n');
    }
    fn expr(&self, out: &mut String, code: &str, _escaped: bool) {
        out.push_str(&format!("(set! _buf (cons {code} _buf))\n"));
    }
    fn postamble(&self, out: &mut String) {
        out.push_str("(apply string-append (reverse _buf)))\n");
    }
}

/// Perl: print directly.
#[derive(Debug, Default)]
pub struct PerlGenerator;

impl Generator for PerlGenerator {
    fn lang(&self) -> &'static str {
        "perl"
    }
    fn preamble(&self, out: &mut String) {
        out.push_str("use strict;\n");
    }
    fn text(&self, out: &mut String, text: &str) {
        out.push_str(&format!("print('{}');\n", quote_single(text)));
    }
    fn stmt(&self, out: &mut String, code: &str) {
        out.push_str(code);
        out.push('\n');
    }
    fn expr(&self, out: &mut String, code: &str, _escaped: bool) {
        out.push_str(&format!("print({code});\n"));
    }
    fn postamble(&self, _out: &mut String) {}
}

/// JavaScript: array buffer joined at the end.
#[derive(Debug, Default)]
pub struct JavascriptGenerator;

impl Generator for JavascriptGenerator {
    fn lang(&self) -> &'static str {
        "javascript"
    }
    fn preamble(&self, out: &mut String) {
        out.push_str("var _buf = [];\n");
    }
    fn text(&self, out: &mut String, text: &str) {
        out.push_str(&format!("_buf.push(\"{}\");\n", quote_double(text)));
    }
    fn stmt(&self, out: &mut String, code: &str) {
        out.push_str(code);
        out.push('\n');
    }
    fn expr(&self, out: &mut String, code: &str, _escaped: bool) {
        out.push_str(&format!("_buf.push({code});\n"));
    }
    fn postamble(&self, out: &mut String) {
        out.push_str("document.write(_buf.join(\"\"));\n");
    }
}
