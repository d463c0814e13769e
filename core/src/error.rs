//! The single user-facing error type for the command front end.
//!
//! Every failure a user can provoke from the command line — a bad option, a
//! missing argument, an unknown output class, a malformed data file — is a
//! [`CommandOptionError`]. The variants exist so callers can match on the
//! failure mode; the `Display` messages are what the binary prints to stderr
//! before exiting with status 1.

use thiserror::Error;

/// User-facing command-line errors.
///
/// All variants are non-recoverable at the point raised: they propagate to
/// the top level and abort the run. Internal invariant violations (such as an
/// inconsistent option schema) are panics, not `CommandOptionError`s — those
/// indicate a packaging defect rather than user error.
///
/// # Examples
///
/// ```
/// use templet_core::CommandOptionError;
///
/// let err = CommandOptionError::UnknownOption('Z');
/// assert_eq!(err.to_string(), "-Z: unknown option.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandOptionError {
    /// A short option character not declared in the schema.
    #[error("-{0}: unknown option.")]
    UnknownOption(char),
    /// A required-argument option appeared with no argument to consume.
    #[error("-{ch}: {name} required.")]
    MissingArgument { ch: char, name: String },
    /// A `--name[=value]` token whose name part is not word/hyphen characters.
    #[error("--{0}: invalid context value.")]
    InvalidContextToken(String),
    /// An explicit `-C` class name with no registry entry.
    #[error("-C {0}: invalid class name.")]
    InvalidClass(String),
    /// A `-l` language whose derived class name has no registry entry.
    #[error("-l {lang}: invalid language name (class {class} not found).")]
    InvalidLanguage { lang: String, class: String },
    /// An enhancer name with no registry entry.
    #[error("{0}: no such enhancer (try '-h' to show all enhancers).")]
    UnknownEnhancer(String),
    /// An `-a` value outside convert/exec/execute.
    #[error("-a {0}: invalid action (convert/exec/execute).")]
    InvalidAction(String),
    /// A pattern spec that is not a `"PREFIX SUFFIX"` pair.
    #[error("-p {0}: invalid embedded pattern.")]
    InvalidPattern(String),
    /// An input or data file that does not exist.
    #[error("{0}: file not found.")]
    FileNotFound(String),
    /// A file that exists but could not be read.
    #[error("{0}: cannot read file.")]
    UnreadableFile(String),
    /// A data file whose extension is not `.yaml`, `.yml`, or `.ctx`.
    #[error("{0}: unsupported file type ('*.yaml', '*.yml', or '*.ctx' required).")]
    UnsupportedDataFile(String),
    /// A data file or inline context whose top-level value is not a mapping.
    #[error("{0}: root object is not a mapping.")]
    RootNotMapping(String),
    /// A data, context, or library file with malformed contents.
    #[error("{file}: {detail}")]
    MalformedData { file: String, detail: String },
    /// An `-r` library name that resolves to no file on the search path.
    #[error("-r {0}: library not found.")]
    LibraryNotFound(String),
}

/// Convenience alias for results with [`CommandOptionError`].
pub type Result<T> = std::result::Result<T, CommandOptionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_cli_wording() {
        assert_eq!(
            CommandOptionError::UnknownOption('Z').to_string(),
            "-Z: unknown option."
        );
        assert_eq!(
            CommandOptionError::MissingArgument {
                ch: 'f',
                name: "datafiles".to_string()
            }
            .to_string(),
            "-f: datafiles required."
        );
        assert_eq!(
            CommandOptionError::FileNotFound("ctx.yaml".to_string()).to_string(),
            "ctx.yaml: file not found."
        );
        assert_eq!(
            CommandOptionError::RootNotMapping("-c".to_string()).to_string(),
            "-c: root object is not a mapping."
        );
    }
}
