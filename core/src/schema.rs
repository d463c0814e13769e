//! Static declaration of the recognized short options.
//!
//! An [`OptionSchema`] classifies each single-character option into one of
//! three argument arities and binds it to a symbolic name. The schema is
//! built once at process start and is immutable afterwards; the tokenizer
//! and the configuration projector both consult it so that downstream code
//! never depends on raw option characters.

use std::collections::HashSet;

/// Argument arity of a short option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// A flag: no argument, recorded as `true`.
    None,
    /// The option requires an argument, either as the rest of the token or
    /// as the next whole token.
    Required,
    /// The option takes an argument only when one trails in the same token;
    /// otherwise it behaves as a flag.
    Optional,
}

/// One schema entry: a character, its symbolic name, and its arity.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    /// Option character (e.g. `'f'` for `-f`).
    pub ch: char,
    /// Symbolic name used by the configuration projector.
    pub name: &'static str,
    /// Argument arity.
    pub arity: Arity,
}

/// The full table of recognized short options.
///
/// Invariant: every declared character has exactly one name and exactly one
/// arity, and names are unique. Violations panic at construction — an
/// inconsistent schema is a packaging defect, not a user error.
///
/// # Examples
///
/// ```
/// use templet_core::{Arity, OptionSchema, OptionSpec};
///
/// let schema = OptionSchema::new(vec![
///     OptionSpec { ch: 'v', name: "version", arity: Arity::None },
///     OptionSpec { ch: 'f', name: "datafiles", arity: Arity::Required },
/// ]);
/// assert_eq!(schema.lookup('f').unwrap().name, "datafiles");
/// assert!(schema.lookup('Z').is_none());
/// ```
#[derive(Debug, Clone)]
pub struct OptionSchema {
    specs: Vec<OptionSpec>,
}

impl OptionSchema {
    /// Builds a schema, asserting character and name uniqueness.
    ///
    /// # Panics
    ///
    /// Panics when two entries share a character or a symbolic name.
    pub fn new(specs: Vec<OptionSpec>) -> Self {
        let mut chars = HashSet::new();
        let mut names = HashSet::new();
        for spec in &specs {
            assert!(
                chars.insert(spec.ch),
                "option schema declares '{}' twice",
                spec.ch
            );
            assert!(
                names.insert(spec.name),
                "option schema declares name '{}' twice",
                spec.name
            );
        }
        Self { specs }
    }

    /// Looks up the entry for an option character.
    pub fn lookup(&self, ch: char) -> Option<&OptionSpec> {
        self.specs.iter().find(|spec| spec.ch == ch)
    }

    /// All entries in declaration order.
    pub fn specs(&self) -> &[OptionSpec] {
        &self.specs
    }
}

/// The schema shipped with the `templet` command.
///
/// Flags: `-h -v -x -T -t -S -b -e -B`; argument options:
/// `-p -c -C -r -f -K -I -l -a -E`. The optional-arity class is empty here
/// but fully supported by the tokenizer.
pub fn command_schema() -> OptionSchema {
    use Arity::{None, Required};
    OptionSchema::new(vec![
        OptionSpec { ch: 'h', name: "help", arity: None },
        OptionSpec { ch: 'v', name: "version", arity: None },
        OptionSpec { ch: 'x', name: "source_only", arity: None },
        OptionSpec { ch: 'T', name: "no_trim", arity: None },
        OptionSpec { ch: 't', name: "untabify", arity: None },
        OptionSpec { ch: 'S', name: "intern_keys", arity: None },
        OptionSpec { ch: 'b', name: "body_only", arity: None },
        OptionSpec { ch: 'e', name: "escape", arity: None },
        OptionSpec { ch: 'B', name: "use_binding", arity: None },
        OptionSpec { ch: 'p', name: "pattern", arity: Required },
        OptionSpec { ch: 'c', name: "context", arity: Required },
        OptionSpec { ch: 'C', name: "class_name", arity: Required },
        OptionSpec { ch: 'r', name: "requires", arity: Required },
        OptionSpec { ch: 'f', name: "datafiles", arity: Required },
        OptionSpec { ch: 'K', name: "kanji", arity: Required },
        OptionSpec { ch: 'I', name: "include_paths", arity: Required },
        OptionSpec { ch: 'l', name: "lang", arity: Required },
        OptionSpec { ch: 'a', name: "action", arity: Required },
        OptionSpec { ch: 'E', name: "enhancers", arity: Required },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_schema_is_consistent() {
        let schema = command_schema();
        assert_eq!(schema.specs().len(), 19);
        assert_eq!(schema.lookup('h').unwrap().name, "help");
        assert_eq!(schema.lookup('E').unwrap().arity, Arity::Required);
        assert!(schema.lookup('Z').is_none());
    }

    #[test]
    #[should_panic(expected = "declares 'x' twice")]
    fn test_duplicate_character_panics() {
        OptionSchema::new(vec![
            OptionSpec { ch: 'x', name: "one", arity: Arity::None },
            OptionSpec { ch: 'x', name: "two", arity: Arity::None },
        ]);
    }

    #[test]
    #[should_panic(expected = "declares name 'same' twice")]
    fn test_duplicate_name_panics() {
        OptionSchema::new(vec![
            OptionSpec { ch: 'a', name: "same", arity: Arity::None },
            OptionSpec { ch: 'b', name: "same", arity: Arity::None },
        ]);
    }
}
