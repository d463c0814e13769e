//! The compiler instance behind the orchestrator's narrow interface.
//!
//! A [`TemplateCompiler`] is constructed from a property mapping, converts
//! one input at a time (per-compile state is overwritten, not accumulated),
//! and exposes exactly the surface the command front end drives: filename
//! accessors, `convert`, `src`, `evaluate`, `result`, and `extend`.
//!
//! Evaluation is deliberately restricted: expressions resolve as dotted
//! paths into the evaluation context; statements are emitted into generated
//! source but never executed. There is no sandboxed interpreter here.

use serde_yaml::{Mapping, Value};

use templet_core::Result;

use crate::enhancer::Enhancer;
use crate::generator::{Generator, PropertyInfo};
use crate::template::{Fragment, MarkerSyntax, Pattern};

/// Engine properties: the free-form `--name[=value]` mapping from the
/// command line, insertion-ordered.
pub type Properties = Mapping;

/// The merged key/value environment a compiled template renders against.
pub type EvaluationContext = Mapping;

/// Truthiness for property values: absent, `null`, and `false` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

/// Looks up a property by name.
pub fn property<'a>(properties: &'a Properties, name: &str) -> Option<&'a Value> {
    properties.get(&Value::String(name.to_string()))
}

/// The lexical-scope variant of an evaluation environment, consumed by
/// [`Compiler::result`]. Thin by design: it keeps the `evaluate`/`result`
/// seam explicit without exposing the caller's whole scope.
#[derive(Debug, Clone, Default)]
pub struct Binding {
    scope: Mapping,
}

impl Binding {
    /// Builds a binding exposing the context's top-level entries as locals.
    pub fn from_context(context: &EvaluationContext) -> Self {
        Self { scope: context.clone() }
    }

    fn scope(&self) -> &Mapping {
        &self.scope
    }
}

/// The narrow interface the execution orchestrator drives.
pub trait Compiler {
    /// Sets the filename reported for the next conversion.
    fn set_filename(&mut self, filename: &str);
    /// The current filename.
    fn filename(&self) -> &str;
    /// Compiles raw template text, replacing any previous compile state.
    fn convert(&mut self, input: &str);
    /// Generated target-language source for the last conversion.
    fn src(&self) -> String;
    /// Renders the last conversion against an explicit context mapping.
    fn evaluate(&self, context: &EvaluationContext) -> Result<String>;
    /// Renders the last conversion against a lexical-scope binding.
    fn result(&self, binding: &Binding) -> Result<String>;
    /// Attaches an enhancer capability. Order of attachment is preserved.
    fn extend(&mut self, enhancer: Box<dyn Enhancer>);
    /// Overrides one engine property after construction.
    fn set_property(&mut self, name: &str, value: Value);
}

/// The shipped compiler implementation: one generator, one marker syntax,
/// an ordered list of attached enhancers.
pub struct TemplateCompiler {
    properties: Properties,
    generator: Box<dyn Generator>,
    syntax: MarkerSyntax,
    trim: bool,
    escape: bool,
    preamble: bool,
    postamble: bool,
    filename: String,
    fragments: Vec<Fragment>,
    enhancers: Vec<Box<dyn Enhancer>>,
}

impl TemplateCompiler {
    /// Builds a compiler from a generator, marker syntax, and properties.
    ///
    /// Recognized properties: `pattern` (embedded pair), `trim` (default
    /// true), `escape` (default false), `preamble`/`postamble` (default
    /// true). Unknown properties are kept and visible to enhancers.
    pub fn new(
        generator: Box<dyn Generator>,
        syntax: MarkerSyntax,
        properties: &Properties,
    ) -> Result<Self> {
        let truthy = |name: &str, default: bool| {
            property(properties, name).map_or(default, is_truthy)
        };
        let syntax = match (&syntax, property(properties, "pattern")) {
            (MarkerSyntax::Embedded(_), Some(Value::String(spec))) => {
                MarkerSyntax::Embedded(Pattern::parse(spec)?)
            }
            _ => syntax,
        };
        Ok(Self {
            properties: properties.clone(),
            generator,
            syntax,
            trim: truthy("trim", true),
            escape: truthy("escape", false),
            preamble: truthy("preamble", true),
            postamble: truthy("postamble", true),
            filename: String::new(),
            fragments: Vec::new(),
            enhancers: Vec::new(),
        })
    }

    /// The attached enhancers, in attachment order.
    pub fn enhancers(&self) -> &[Box<dyn Enhancer>] {
        &self.enhancers
    }

    /// The compiled fragment stream of the last conversion.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Property mapping the compiler was built with, including later
    /// [`set_property`](Compiler::set_property) overrides.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    fn effective_escape(&self) -> bool {
        self.escape || self.enhancers.iter().any(|e| e.forces_escape())
    }

    fn render(&self, root: &Mapping) -> String {
        let mut out = String::new();
        for fragment in &self.fragments {
            match fragment {
                Fragment::Text(text) => out.push_str(text),
                Fragment::Stmt(_) => {}
                Fragment::Expr { code, escaped } => {
                    let rendered = lookup_path(root, code)
                        .map(render_value)
                        .unwrap_or_default();
                    if *escaped {
                        out.push_str(&escape_html(&rendered));
                    } else {
                        out.push_str(&rendered);
                    }
                }
            }
        }
        out
    }
}

impl Compiler for TemplateCompiler {
    fn set_filename(&mut self, filename: &str) {
        self.filename = filename.to_string();
    }

    fn filename(&self) -> &str {
        &self.filename
    }

    fn convert(&mut self, input: &str) {
        let mut text = input.to_string();
        for enhancer in &self.enhancers {
            if let Some(rewritten) = enhancer.preprocess(&text, &self.syntax) {
                text = rewritten;
            }
        }
        let escape = self.effective_escape();
        let mut fragments = self.syntax.scan(&text, self.trim, escape);
        for enhancer in &self.enhancers {
            fragments = enhancer.rewrite(fragments, escape);
        }
        self.fragments = fragments;
    }

    fn src(&self) -> String {
        let mut out = String::new();
        if self.preamble {
            self.generator.preamble(&mut out);
        }
        for fragment in &self.fragments {
            match fragment {
                Fragment::Text(text) => self.generator.text(&mut out, text),
                Fragment::Stmt(code) => self.generator.stmt(&mut out, code),
                Fragment::Expr { code, escaped } => {
                    self.generator.expr(&mut out, code, *escaped)
                }
            }
        }
        if self.postamble {
            self.generator.postamble(&mut out);
        }
        out
    }

    fn evaluate(&self, context: &EvaluationContext) -> Result<String> {
        Ok(self.render(context))
    }

    fn result(&self, binding: &Binding) -> Result<String> {
        Ok(self.render(binding.scope()))
    }

    fn extend(&mut self, enhancer: Box<dyn Enhancer>) {
        tracing::debug!(enhancer = enhancer.name(), "attaching enhancer");
        self.enhancers.push(enhancer);
    }

    fn set_property(&mut self, name: &str, value: Value) {
        self.properties.insert(Value::String(name.to_string()), value);
    }
}

/// Resolves a dotted path (`user.name`, `items.0`) through a mapping.
fn lookup_path<'a>(root: &'a Mapping, expr: &str) -> Option<&'a Value> {
    let mut segments = expr.split('.').map(str::trim);
    let first = segments.next()?;
    let mut current = root.get(&Value::String(first.to_string()))?;
    for segment in segments {
        current = match current {
            Value::Mapping(mapping) => mapping.get(&Value::String(segment.to_string()))?,
            Value::Sequence(sequence) => sequence.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other)
            .unwrap_or_else(|_| serde_yaml::to_string(other).unwrap_or_default().trim_end().to_string()),
    }
}

/// Escapes `& < > " '` for markup output.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

/// Properties shared by both marker namespaces.
pub fn common_properties() -> Vec<PropertyInfo> {
    vec![
        PropertyInfo { name: "escape", default: "false", desc: "escape expression output" },
        PropertyInfo { name: "preamble", default: "true", desc: "emit preamble" },
        PropertyInfo { name: "postamble", default: "true", desc: "emit postamble" },
        PropertyInfo { name: "encoding", default: "none", desc: "output encoding name" },
    ]
}

/// Properties specific to the default embedded marker namespace.
pub fn basic_properties() -> Vec<PropertyInfo> {
    vec![
        PropertyInfo { name: "pattern", default: "<% %>", desc: "embedded pattern" },
        PropertyInfo { name: "trim", default: "true", desc: "trim statement lines" },
        PropertyInfo { name: "bipattern", default: "[= =]", desc: "BiPattern expression pair" },
    ]
}

/// Properties specific to the processing-instruction namespace.
pub fn pi_properties() -> Vec<PropertyInfo> {
    vec![
        PropertyInfo { name: "pi", default: "rb", desc: "processing instruction name" },
        PropertyInfo { name: "trim", default: "true", desc: "trim instruction lines" },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::RubyGenerator;

    fn compiler() -> TemplateCompiler {
        TemplateCompiler::new(
            Box::new(RubyGenerator),
            MarkerSyntax::Embedded(Pattern::default_embedded()),
            &Properties::new(),
        )
        .unwrap()
    }

    fn context(yaml: &str) -> EvaluationContext {
        match serde_yaml::from_str(yaml).unwrap() {
            Value::Mapping(mapping) => mapping,
            other => panic!("expected mapping, got {other:?}"),
        }
    }

    #[test]
    fn test_convert_replaces_previous_state() {
        let mut compiler = compiler();
        compiler.convert("one <%= a %>");
        assert_eq!(compiler.fragments().len(), 2);
        compiler.convert("two");
        assert_eq!(compiler.fragments(), &[Fragment::Text("two".to_string())]);
    }

    #[test]
    fn test_evaluate_resolves_dotted_paths() {
        let mut compiler = compiler();
        compiler.convert("Hello <%= user.name %>, #<%= items.1 %>!");
        let context = context("user: {name: World}\nitems: [a, b]");
        assert_eq!(compiler.evaluate(&context).unwrap(), "Hello World, #b!");
    }

    #[test]
    fn test_unresolvable_expression_renders_empty() {
        let mut compiler = compiler();
        compiler.convert("[<%= missing.key %>]");
        assert_eq!(compiler.evaluate(&context("a: 1")).unwrap(), "[]");
    }

    #[test]
    fn test_statements_are_not_executed() {
        let mut compiler = compiler();
        compiler.convert("a\n<% anything at all %>\nb\n");
        assert_eq!(compiler.evaluate(&Properties::new()).unwrap(), "a\nb\n");
    }

    #[test]
    fn test_escape_property_escapes_expressions() {
        let mut properties = Properties::new();
        properties.insert(Value::String("escape".to_string()), Value::Bool(true));
        let mut compiler = TemplateCompiler::new(
            Box::new(RubyGenerator),
            MarkerSyntax::Embedded(Pattern::default_embedded()),
            &properties,
        )
        .unwrap();
        compiler.convert("<%= markup %> <%== markup %>");
        let context = context("markup: <b>hi</b>");
        assert_eq!(
            compiler.evaluate(&context).unwrap(),
            "&lt;b&gt;hi&lt;/b&gt; <b>hi</b>"
        );
    }

    #[test]
    fn test_result_uses_binding_scope() {
        let mut compiler = compiler();
        compiler.convert("<%= greeting %>");
        let binding = Binding::from_context(&context("greeting: hey"));
        assert_eq!(compiler.result(&binding).unwrap(), "hey");
    }

    #[test]
    fn test_src_round_trip_through_generator() {
        let mut compiler = compiler();
        compiler.convert("Hi <%= name %>\n");
        let src = compiler.src();
        assert!(src.starts_with("_buf = '';"));
        assert!(src.contains("_buf << (name).to_s;"));
        assert!(src.ends_with("_buf.to_s\n"));
    }

    #[test]
    fn test_body_only_suppresses_preamble_and_postamble() {
        let mut properties = Properties::new();
        properties.insert(Value::String("preamble".to_string()), Value::Bool(false));
        properties.insert(Value::String("postamble".to_string()), Value::Bool(false));
        let mut compiler = TemplateCompiler::new(
            Box::new(RubyGenerator),
            MarkerSyntax::Embedded(Pattern::default_embedded()),
            &properties,
        )
        .unwrap();
        compiler.convert("x");
        assert_eq!(compiler.src(), " _buf << 'x';");
    }
}
