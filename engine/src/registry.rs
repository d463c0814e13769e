//! Compiler-class and enhancer registries, plus name resolution.
//!
//! Two parallel compiler registries exist: one for the default embedded
//! marker syntax, one for the processing-instruction syntax (`--pi`). Both
//! are populated at bootstrap and queried by exact class name; the help
//! listing is a plain registry enumeration. Enhancers live in their own
//! registry, keyed by `<Name>Enhancer`.

use serde_yaml::Value;

use templet_core::{CommandOptionError, Result};

use crate::compiler::{Compiler, Properties, TemplateCompiler, is_truthy, property};
use crate::enhancer::{
    BiPatternEnhancer, DeleteIndentEnhancer, Enhancer, EscapeEnhancer, NoTextEnhancer,
    PercentLineEnhancer,
};
use crate::generator::{
    CGenerator, Generator, JavaGenerator, JavascriptGenerator, PerlGenerator, PhpGenerator,
    PropertyInfo, RubyGenerator, SchemeGenerator,
};
use crate::template::{MarkerSyntax, Pattern};

/// The language assumed when `-l` is absent.
pub const DEFAULT_LANG: &str = "ruby";

/// One registered compiler class.
#[derive(Clone)]
pub struct CompilerClass {
    /// Registry name, e.g. `Eruby`.
    pub name: String,
    /// Target language identifier.
    pub lang: &'static str,
    /// Whether instances scan the processing-instruction syntax.
    pub pi: bool,
    /// Whether instances escape plain expressions by default.
    pub escape_default: bool,
    make_generator: fn(&Properties) -> Box<dyn Generator>,
}

impl CompilerClass {
    /// Instantiates a compiler with the accumulated properties.
    pub fn instantiate(&self, properties: &Properties) -> Result<Box<dyn Compiler>> {
        let mut properties = properties.clone();
        if self.escape_default && property(&properties, "escape").is_none() {
            properties.insert(Value::String("escape".to_string()), Value::Bool(true));
        }
        let syntax = if self.pi {
            let name = match property(&properties, "pi") {
                Some(Value::String(name)) => name.clone(),
                _ => pi_name_for(self.lang).to_string(),
            };
            MarkerSyntax::Pi { name }
        } else {
            MarkerSyntax::Embedded(Pattern::default_embedded())
        };
        let generator = (self.make_generator)(&properties);
        Ok(Box::new(TemplateCompiler::new(generator, syntax, &properties)?))
    }

    /// Language-specific supported properties, for the help listing.
    pub fn supported_properties(&self, properties: &Properties) -> Vec<PropertyInfo> {
        (self.make_generator)(properties).supported_properties()
    }
}

/// Default processing-instruction name per language.
fn pi_name_for(lang: &str) -> &'static str {
    match lang {
        "ruby" => "rb",
        "php" => "php",
        "c" => "c",
        "java" => "java",
        "scheme" => "scheme",
        "perl" => "perl",
        "javascript" => "js",
        _ => "rb",
    }
}

/// Registry of compiler classes for one marker namespace.
#[derive(Clone, Default)]
pub struct CompilerRegistry {
    classes: Vec<CompilerClass>,
}

impl CompilerRegistry {
    /// Exact-name lookup.
    pub fn lookup(&self, name: &str) -> Option<&CompilerClass> {
        self.classes.iter().find(|class| class.name == name)
    }

    /// All classes, in registration order.
    pub fn classes(&self) -> &[CompilerClass] {
        &self.classes
    }

    fn register(&mut self, class: CompilerClass) {
        debug_assert!(self.lookup(&class.name).is_none(), "duplicate class name");
        self.classes.push(class);
    }

    /// Registers `alias` as another name for the existing class `target`.
    pub fn add_alias(&mut self, alias: &str, target: &str) -> Result<()> {
        let class = self.lookup(target).ok_or_else(|| CommandOptionError::MalformedData {
            file: alias.to_string(),
            detail: format!("alias target '{target}' is not a registered class"),
        })?;
        let mut clone = class.clone();
        clone.name = alias.to_string();
        self.classes.push(clone);
        Ok(())
    }
}

/// One registered enhancer capability.
#[derive(Clone)]
pub struct EnhancerClass {
    /// Full registry name, e.g. `EscapeEnhancer`.
    pub name: String,
    /// One-line description for the help listing.
    pub desc: &'static str,
    factory: fn(&Properties) -> Box<dyn Enhancer>,
}

impl EnhancerClass {
    pub fn instantiate(&self, properties: &Properties) -> Box<dyn Enhancer> {
        (self.factory)(properties)
    }
}

/// Registry of enhancer capabilities.
#[derive(Clone, Default)]
pub struct EnhancerRegistry {
    classes: Vec<EnhancerClass>,
}

impl EnhancerRegistry {
    pub fn lookup(&self, name: &str) -> Option<&EnhancerClass> {
        self.classes.iter().find(|class| class.name == name)
    }

    pub fn classes(&self) -> &[EnhancerClass] {
        &self.classes
    }

    /// Registers `alias` (short name) for the existing short name `target`.
    pub fn add_alias(&mut self, alias: &str, target: &str) -> Result<()> {
        let full_target = format!("{target}Enhancer");
        let class = self.lookup(&full_target).ok_or_else(|| {
            CommandOptionError::MalformedData {
                file: alias.to_string(),
                detail: format!("alias target '{target}' is not a registered enhancer"),
            }
        })?;
        let mut clone = class.clone();
        clone.name = format!("{alias}Enhancer");
        self.classes.push(clone);
        Ok(())
    }
}

/// The full registry surface the resolver queries.
#[derive(Clone, Default)]
pub struct Registry {
    /// Classes scanning the default embedded syntax.
    pub basic: CompilerRegistry,
    /// Classes scanning the processing-instruction syntax.
    pub pi: CompilerRegistry,
    /// Enhancer capabilities.
    pub enhancers: EnhancerRegistry,
}

impl Registry {
    /// Builds the registries shipped with the command.
    pub fn bootstrap() -> Self {
        let mut registry = Self::default();

        let langs: [(&'static str, fn(&Properties) -> Box<dyn Generator>); 7] = [
            ("ruby", |_| Box::new(RubyGenerator)),
            ("php", |_| Box::new(PhpGenerator)),
            ("c", |p| Box::new(CGenerator::from_properties(p))),
            ("java", |p| Box::new(JavaGenerator::from_properties(p))),
            ("scheme", |_| Box::new(SchemeGenerator)),
            ("perl", |_| Box::new(PerlGenerator)),
            ("javascript", |_| Box::new(JavascriptGenerator)),
        ];
        for (lang, make_generator) in langs {
            let name = format!("E{lang}");
            registry.basic.register(CompilerClass {
                name: name.clone(),
                lang,
                pi: false,
                escape_default: false,
                make_generator,
            });
            registry.pi.register(CompilerClass {
                name,
                lang,
                pi: true,
                escape_default: false,
                make_generator,
            });
        }
        registry.basic.register(CompilerClass {
            name: "XmlEruby".to_string(),
            lang: "ruby",
            pi: false,
            escape_default: true,
            make_generator: |_| Box::new(RubyGenerator),
        });
        registry
            .basic
            .add_alias("Ejs", "Ejavascript")
            .expect("bootstrap alias");
        registry
            .pi
            .add_alias("Ejs", "Ejavascript")
            .expect("bootstrap alias");

        let enhancers: [(&'static str, &'static str, fn(&Properties) -> Box<dyn Enhancer>); 5] = [
            ("Escape", "HTML-escape plain expression output", |_| {
                Box::new(EscapeEnhancer)
            }),
            ("PercentLine", "treat lines starting with '%' as statements", |_| {
                Box::new(PercentLineEnhancer)
            }),
            ("BiPattern", "second expression pattern (default '[= =]')", |p| {
                Box::new(BiPatternEnhancer::from_properties(p))
            }),
            ("NoText", "drop text, emit code only", |_| Box::new(NoTextEnhancer)),
            ("DeleteIndent", "strip leading indentation from text lines", |_| {
                Box::new(DeleteIndentEnhancer)
            }),
        ];
        for (short, desc, factory) in enhancers {
            registry.enhancers.classes.push(EnhancerClass {
                name: format!("{short}Enhancer"),
                desc,
                factory,
            });
        }

        registry
    }
}

/// Resolves the requested class/language into a compiler instance.
///
/// Class name defaults to `E<lang>`; `lang` defaults to
/// [`DEFAULT_LANG`]. A truthy `pi` property selects the
/// processing-instruction registry. Lookup failure names the explicit class
/// when one was given, otherwise the language it was derived from.
pub fn resolve_compiler(
    registry: &Registry,
    class_name: Option<&str>,
    lang: Option<&str>,
    properties: &Properties,
) -> Result<Box<dyn Compiler>> {
    let pi = property(properties, "pi").is_some_and(is_truthy);
    let table = if pi { &registry.pi } else { &registry.basic };
    let lang_name = lang.unwrap_or(DEFAULT_LANG);
    let derived;
    let name = match class_name {
        Some(explicit) => explicit,
        None => {
            derived = format!("E{lang_name}");
            &derived
        }
    };
    let class = table.lookup(name).ok_or_else(|| match class_name {
        Some(explicit) => CommandOptionError::InvalidClass(explicit.to_string()),
        None => CommandOptionError::InvalidLanguage {
            lang: lang_name.to_string(),
            class: name.to_string(),
        },
    })?;
    tracing::debug!(class = %class.name, lang = class.lang, pi, "resolved compiler class");
    class.instantiate(properties)
}

/// Resolves a comma-separated enhancer-name list, in order.
///
/// The first unknown name aborts, identifying exactly that name.
pub fn resolve_enhancers(
    registry: &EnhancerRegistry,
    names: &str,
    properties: &Properties,
) -> Result<Vec<Box<dyn Enhancer>>> {
    let mut enhancers = Vec::new();
    for short in names.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let class = registry
            .lookup(&format!("{short}Enhancer"))
            .ok_or_else(|| CommandOptionError::UnknownEnhancer(short.to_string()))?;
        enhancers.push(class.instantiate(properties));
    }
    Ok(enhancers)
}

/// Attaches resolved enhancers in order, propagating any attachment
/// properties (e.g. BiPattern's `bipattern`) onto the compiler first.
pub fn attach_enhancers(compiler: &mut dyn Compiler, enhancers: Vec<Box<dyn Enhancer>>) {
    for enhancer in enhancers {
        for (name, value) in enhancer.attach_properties() {
            compiler.set_property(&name, value);
        }
        compiler.extend(enhancer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_registers_both_namespaces() {
        let registry = Registry::bootstrap();
        assert!(registry.basic.lookup("Eruby").is_some());
        assert!(registry.basic.lookup("Ephp").is_some());
        assert!(registry.basic.lookup("XmlEruby").is_some());
        assert!(registry.pi.lookup("Eruby").is_some());
        assert!(registry.pi.lookup("XmlEruby").is_none());
        assert!(registry.basic.lookup("Ejs").is_some());
    }

    #[test]
    fn test_resolver_derives_class_from_language() {
        let registry = Registry::bootstrap();
        let compiler =
            resolve_compiler(&registry, None, Some("php"), &Properties::new());
        assert!(compiler.is_ok());
    }

    #[test]
    fn test_resolver_reports_language_for_derived_names() {
        let registry = Registry::bootstrap();
        let err = resolve_compiler(&registry, None, Some("cobol"), &Properties::new())
            .err()
            .unwrap();
        assert_eq!(
            err,
            CommandOptionError::InvalidLanguage {
                lang: "cobol".to_string(),
                class: "Ecobol".to_string(),
            }
        );
    }

    #[test]
    fn test_resolver_reports_class_for_explicit_names() {
        let registry = Registry::bootstrap();
        let err = resolve_compiler(&registry, Some("Nope"), Some("ruby"), &Properties::new())
            .err()
            .unwrap();
        assert_eq!(err, CommandOptionError::InvalidClass("Nope".to_string()));
    }

    #[test]
    fn test_pi_property_selects_alternate_registry() {
        let registry = Registry::bootstrap();
        let mut properties = Properties::new();
        properties.insert(Value::String("pi".to_string()), Value::Bool(true));
        // XmlEruby only exists in the basic registry.
        let err = resolve_compiler(&registry, Some("XmlEruby"), None, &properties)
            .err()
            .unwrap();
        assert_eq!(err, CommandOptionError::InvalidClass("XmlEruby".to_string()));
        assert!(resolve_compiler(&registry, None, None, &properties).is_ok());
    }

    #[test]
    fn test_enhancer_resolution_short_circuits_at_first_failure() {
        let registry = Registry::bootstrap();
        let err = resolve_enhancers(
            &registry.enhancers,
            "Escape,Missing,AlsoMissing",
            &Properties::new(),
        )
        .unwrap_err();
        assert_eq!(err, CommandOptionError::UnknownEnhancer("Missing".to_string()));
    }

    #[test]
    fn test_enhancers_resolve_in_request_order() {
        let registry = Registry::bootstrap();
        let enhancers = resolve_enhancers(
            &registry.enhancers,
            "PercentLine, Escape",
            &Properties::new(),
        )
        .unwrap();
        let names: Vec<&str> = enhancers.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["PercentLine", "Escape"]);
    }

    #[test]
    fn test_bipattern_attachment_propagates_property() {
        let registry = Registry::bootstrap();
        let mut compiler = resolve_compiler(&registry, None, None, &Properties::new()).unwrap();
        let enhancers =
            resolve_enhancers(&registry.enhancers, "BiPattern", &Properties::new()).unwrap();
        attach_enhancers(compiler.as_mut(), enhancers);
        compiler.convert("a [= x =] b");
        let mut context = Properties::new();
        context.insert(Value::String("x".to_string()), Value::String("X".to_string()));
        assert_eq!(compiler.evaluate(&context).unwrap(), "a X b");
    }
}
