use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use serde_yaml::Value;

use templet_core::{
    CommandOptionError, RunConfig, command_schema, tokenize,
};
use templet_engine::{
    Binding, Compiler, EvaluationContext, LoadOptions, Properties, Registry, attach_enhancers,
    basic_properties, common_properties, is_truthy, load_datafiles, parse_inline_context,
    paths::{append_search_paths, load_libraries},
    pi_properties, property, resolve_compiler, resolve_enhancers,
};

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if let Err(err) = run(&argv) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Convert,
    Execute,
}

fn run(argv: &[String]) -> Result<(), CommandOptionError> {
    let schema = command_schema();
    let parsed = tokenize(&schema, argv)?;
    let mut properties = parsed.properties;
    let mut config = RunConfig::project(&schema, &parsed.options);
    if property(&properties, "help").is_some_and(is_truthy) {
        config.help = true;
    }

    if config.help || config.version {
        let registry = Registry::bootstrap();
        if config.version {
            println!("{PACKAGE_VERSION}");
        }
        if config.help {
            print!("{}", usage());
            print!("{}", show_properties(&registry, &properties));
            print!("{}", show_enhancers(&registry));
        }
        return Ok(());
    }

    // Search paths and registry extensions must land before any lookup.
    if let Some(paths) = &config.include_paths {
        append_search_paths(paths);
    }
    let mut registry = Registry::bootstrap();
    if let Some(libs) = &config.requires {
        load_libraries(&mut registry, libs)?;
    }

    let action = resolve_action(&config)?;
    merge_option_properties(&config, &mut properties);

    let mut compiler = resolve_compiler(
        &registry,
        config.class_name.as_deref(),
        config.lang.as_deref(),
        &properties,
    )?;
    if let Some(names) = &config.enhancers {
        let enhancers = resolve_enhancers(&registry.enhancers, names, &properties)?;
        attach_enhancers(compiler.as_mut(), enhancers);
    }

    let load = LoadOptions {
        untabify: config.untabify,
        intern_keys: config.intern_keys,
    };
    let mut context = EvaluationContext::new();
    if let Some(datafiles) = &config.datafiles {
        context = load_datafiles(datafiles, load)?;
    }
    if let Some(inline) = &config.context {
        // The inline string replaces the datafile context, not merges.
        context = parse_inline_context(inline, load)?;
    }

    if parsed.filenames.is_empty() {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .map_err(|_| CommandOptionError::UnreadableFile("(stdin)".to_string()))?;
        compiler.set_filename("(stdin)");
        compiler.convert(&input);
        emit(action, compiler.as_ref(), &context, &config)?;
    } else {
        for filename in &parsed.filenames {
            if !Path::new(filename).is_file() {
                return Err(CommandOptionError::FileNotFound(filename.clone()));
            }
            let input = fs::read_to_string(filename)
                .map_err(|_| CommandOptionError::UnreadableFile(filename.clone()))?;
            compiler.set_filename(filename);
            compiler.convert(&input);
            emit(action, compiler.as_ref(), &context, &config)?;
        }
    }

    Ok(())
}

/// `-a` wins; `-x` or an explicit `-l` default to convert; otherwise the
/// run evaluates and prints the rendering.
fn resolve_action(config: &RunConfig) -> Result<Action, CommandOptionError> {
    match config.action.as_deref() {
        Some("convert") => Ok(Action::Convert),
        Some("exec") | Some("execute") => Ok(Action::Execute),
        Some(other) => Err(CommandOptionError::InvalidAction(other.to_string())),
        None if config.source_only || config.lang.is_some() => Ok(Action::Convert),
        None => Ok(Action::Execute),
    }
}

/// Folds short options into the engine property mapping. Explicit
/// `--name=value` properties win over their short-option equivalents.
fn merge_option_properties(config: &RunConfig, properties: &mut Properties) {
    fn set(properties: &mut Properties, name: &str, value: Value) {
        properties.insert(Value::String(name.to_string()), value);
    }
    if config.escape && property(properties, "escape").is_none() {
        set(properties, "escape", Value::Bool(true));
    }
    if let Some(pattern) = &config.pattern {
        set(properties, "pattern", Value::String(pattern.clone()));
    }
    if config.no_trim {
        set(properties, "trim", Value::Bool(false));
    }
    if config.body_only {
        set(properties, "preamble", Value::Bool(false));
        set(properties, "postamble", Value::Bool(false));
    }
    if let Some(kanji) = &config.kanji {
        set(properties, "encoding", Value::String(kanji.clone()));
    }
}

fn emit(
    action: Action,
    compiler: &dyn Compiler,
    context: &EvaluationContext,
    config: &RunConfig,
) -> Result<(), CommandOptionError> {
    let output = match action {
        Action::Convert => compiler.src(),
        Action::Execute => {
            if config.use_binding {
                compiler.result(&Binding::from_context(context))?
            } else {
                compiler.evaluate(context)?
            }
        }
    };
    if !output.is_empty() {
        print!("{output}");
        let _ = std::io::stdout().flush();
    }
    Ok(())
}

fn usage() -> String {
    "\
templet - embedded program converter for multiple languages
Usage: templet [..options..] [file ...]
  -h, --help    : help
  -v            : version
  -x            : show converted code
  -T            : don't trim spaces around statement markers
  -b            : body only (no preamble nor postamble)
  -e            : escape (equal to '-E Escape')
  -p pattern    : embedded pattern (default '<% %>')
  -l lang       : convert but no execute (ruby/php/c/java/scheme/perl/js)
  -C classname  : compiler class name (Eruby, Ephp, XmlEruby, ...)
  -a action     : action (convert/exec/execute)
  -r lib1,lib2  : registry extension libraries
  -E e1,e2,...  : enhancer names (Escape, PercentLine, BiPattern, ...)
  -I path       : library include path
  -K kanji      : output encoding (euc/sjis/utf8) (default none)
  -c context    : context data string (yaml inline style or 'name = value' lines)
  -f datafile   : context data file ('*.yaml', '*.yml', or '*.ctx')
  -t            : expand tab characters in YAML file
  -S            : convert mapping keys to normalized symbolic form
  -B            : invoke 'result(binding)' instead of 'evaluate(context)'
  --pi=name     : parse '<?name ... ?>' instead of '<% ... %>'

"
    .to_string()
}

fn format_property_line(name: &str, default: &str, desc: &str) -> String {
    format!("     --{:<23} : {}\n", format!("{name}={default}"), desc)
}

fn show_properties(registry: &Registry, properties: &Properties) -> String {
    let mut out = String::from("supported properties:\n");

    let groups = [
        ("(common)", common_properties()),
        ("(basic)", basic_properties()),
        ("(pi)", pi_properties()),
    ];
    for (label, props) in groups {
        out.push_str(&format!("  * {label}\n"));
        for prop in props {
            out.push_str(&format_property_line(prop.name, prop.default, prop.desc));
        }
    }

    for class in registry.basic.classes() {
        // One entry per base language; aliases and variants are skipped.
        if class.name != format!("E{}", class.lang) {
            continue;
        }
        out.push_str(&format!("  * {}\n", class.lang));
        for prop in class.supported_properties(properties) {
            out.push_str(&format_property_line(prop.name, prop.default, prop.desc));
        }
    }

    out.push('\n');
    out
}

fn show_enhancers(registry: &Registry) -> String {
    let mut out = String::from("enhancers:\n");
    for class in registry.enhancers.classes() {
        let short = class.name.strip_suffix("Enhancer").unwrap_or(&class.name);
        out.push_str(&format!("  {short:<13} : {}\n", class.desc));
    }
    out
}
