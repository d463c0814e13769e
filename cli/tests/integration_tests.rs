use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path =
            std::env::temp_dir().join(format!("templet_cli_test_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn write(&self, name: &str, contents: &str) -> String {
        let path = self.path.join(name);
        fs::write(&path, contents).expect("failed to write file");
        path.to_str().unwrap().to_string()
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn templet(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_templet"))
        .args(args)
        .output()
        .expect("failed to run templet")
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

// ---------------------------------------------------------------------------
// Help / version
// ---------------------------------------------------------------------------

#[test]
fn help_lists_usage_properties_and_enhancers() {
    let out = templet(&["-h"]);
    assert!(out.status.success());
    let text = stdout_of(&out);
    assert!(text.contains("Usage: templet"));
    assert!(text.contains("supported properties:"));
    assert!(text.contains("* (common)"));
    assert!(text.contains("enhancers:"));
    assert!(text.contains("BiPattern"));
}

#[test]
fn long_help_property_is_equivalent_to_short_flag() {
    let short = templet(&["-h"]);
    let long = templet(&["--help"]);
    assert!(long.status.success());
    assert_eq!(stdout_of(&short), stdout_of(&long));
}

#[test]
fn version_flag_prints_package_version() {
    let out = templet(&["-v"]);
    assert!(out.status.success());
    assert_eq!(stdout_of(&out).trim(), env!("CARGO_PKG_VERSION"));
}

// ---------------------------------------------------------------------------
// Option errors
// ---------------------------------------------------------------------------

#[test]
fn unknown_option_fails_with_status_one() {
    let out = templet(&["-Z"]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(stderr_of(&out).trim(), "-Z: unknown option.");
    assert!(stdout_of(&out).is_empty());
}

#[test]
fn missing_required_argument_fails() {
    let out = templet(&["-f"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr_of(&out).contains("required"));
}

#[test]
fn invalid_language_names_the_derived_class() {
    let out = templet(&["-l", "cobol", "-x"]);
    assert_eq!(out.status.code(), Some(1));
    let err = stderr_of(&out);
    assert!(err.contains("-l cobol"));
    assert!(err.contains("Ecobol"));
}

#[test]
fn unknown_enhancer_is_named_exactly() {
    let dir = TempDir::new("unknown_enhancer");
    let template = dir.write("page.templet", "hi\n");
    let out = templet(&["-E", "Escape,Nope", &template]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr_of(&out).starts_with("Nope: no such enhancer"));
}

#[test]
fn missing_input_file_fails() {
    let out = templet(&["definitely-missing.templet"]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(
        stderr_of(&out).trim(),
        "definitely-missing.templet: file not found."
    );
}

// ---------------------------------------------------------------------------
// Actions and rendering
// ---------------------------------------------------------------------------

#[test]
fn default_action_renders_against_datafile_context() {
    let dir = TempDir::new("render_default");
    let template = dir.write("page.templet", "Hello <%= name %>!\n");
    let data = dir.write("data.yaml", "name: World\n");
    let out = templet(&["-f", &data, &template]);
    assert!(out.status.success(), "stderr: {}", stderr_of(&out));
    assert_eq!(stdout_of(&out), "Hello World!\n");
}

#[test]
fn source_only_emits_generated_code_never_rendering() {
    let dir = TempDir::new("source_only");
    let template = dir.write("page.templet", "Hello <%= name %>!\n");
    let data = dir.write("data.yaml", "name: World\n");
    let out = templet(&["-x", "-f", &data, &template]);
    assert!(out.status.success());
    let text = stdout_of(&out);
    assert!(text.contains("_buf"));
    assert!(text.contains("(name).to_s"));
    assert!(!text.contains("Hello World"));
}

#[test]
fn explicit_lang_defaults_to_convert_action() {
    let dir = TempDir::new("lang_convert");
    let template = dir.write("page.templet", "Hello <%= name %>!\n");
    let out = templet(&["-l", "php", &template]);
    assert!(out.status.success());
    assert!(stdout_of(&out).contains("<?php echo name; ?>"));
}

#[test]
fn invalid_action_fails() {
    let dir = TempDir::new("invalid_action");
    let template = dir.write("page.templet", "hi\n");
    let out = templet(&["-a", "destroy", &template]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr_of(&out).contains("invalid action"));
}

#[test]
fn stdin_is_read_when_no_files_are_given() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_templet"))
        .args(["-c", "{name: Pipe}"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn templet");
    child
        .stdin
        .as_mut()
        .unwrap()
        .write_all(b"Hi <%= name %>\n")
        .unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "Hi Pipe\n");
}

#[test]
fn multiple_inputs_emit_in_order() {
    let dir = TempDir::new("input_order");
    let first = dir.write("a.templet", "first\n");
    let second = dir.write("b.templet", "second\n");
    let out = templet(&[&first, &second]);
    assert!(out.status.success());
    assert_eq!(stdout_of(&out), "first\nsecond\n");
}

// ---------------------------------------------------------------------------
// Context loading
// ---------------------------------------------------------------------------

#[test]
fn later_datafile_overwrites_earlier_keys() {
    let dir = TempDir::new("datafile_order");
    let template = dir.write("page.templet", "<%= name %>\n");
    let first = dir.write("a.yaml", "name: First\n");
    let second = dir.write("b.yaml", "name: Second\n");
    let out = templet(&["-f", &format!("{first},{second}"), &template]);
    assert!(out.status.success());
    assert_eq!(stdout_of(&out), "Second\n");
}

#[test]
fn inline_context_replaces_datafile_context() {
    let dir = TempDir::new("inline_override");
    let template = dir.write("page.templet", "<%= name %>|<%= other %>\n");
    let data = dir.write("data.yaml", "name: File\nother: kept\n");
    let out = templet(&["-f", &data, "-c", "{name: Inline}", &template]);
    assert!(out.status.success());
    // Replacement, not merge: keys only in the datafile disappear.
    assert_eq!(stdout_of(&out), "Inline|\n");
}

#[test]
fn unsupported_datafile_extension_aborts_the_run() {
    let dir = TempDir::new("bad_extension");
    let template = dir.write("page.templet", "hi\n");
    let data = dir.write("data.json", "{\"a\": 1}");
    let out = templet(&["-f", &data, &template]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr_of(&out).contains("unsupported file type"));
}

#[test]
fn scripted_context_file_binds_assignments() {
    let dir = TempDir::new("scripted_ctx");
    let template = dir.write("page.templet", "<%= greeting %> x<%= count %>\n");
    let data = dir.write("vars.ctx", "greeting = hello\ncount = 2\n");
    let out = templet(&["-f", &data, &template]);
    assert!(out.status.success(), "stderr: {}", stderr_of(&out));
    assert_eq!(stdout_of(&out), "hello x2\n");
}

// ---------------------------------------------------------------------------
// Properties and enhancers
// ---------------------------------------------------------------------------

#[test]
fn escape_flag_escapes_expression_output() {
    let dir = TempDir::new("escape_flag");
    let template = dir.write("page.templet", "<%= markup %>\n");
    let out = templet(&["-e", "-c", "{markup: <b>hi</b>}", &template]);
    assert!(out.status.success());
    assert_eq!(stdout_of(&out), "&lt;b&gt;hi&lt;/b&gt;\n");
}

#[test]
fn pi_property_switches_marker_namespace() {
    let dir = TempDir::new("pi_namespace");
    let template = dir.write("page.templet", "Hi @{markup}@\n");
    let out = templet(&["--pi", "-c", "{markup: <b>}", &template]);
    assert!(out.status.success());
    assert_eq!(stdout_of(&out), "Hi &lt;b&gt;\n");
}

#[test]
fn custom_pattern_option_is_honored() {
    let dir = TempDir::new("custom_pattern");
    let template = dir.write("page.templet", "[%= name %]\n");
    let out = templet(&["-p", "[% %]", "-c", "{name: Pat}", &template]);
    assert!(out.status.success());
    assert_eq!(stdout_of(&out), "Pat\n");
}

#[test]
fn percent_line_enhancer_rewrites_percent_lines() {
    let dir = TempDir::new("percent_line");
    let template = dir.write("page.templet", "% each\ntext <%= name %>\n");
    let out = templet(&["-x", "-E", "PercentLine", &template]);
    assert!(out.status.success());
    let text = stdout_of(&out);
    assert!(text.contains("each;"));
    assert!(!text.contains('%'));
}

#[test]
fn registry_extension_library_adds_aliases() {
    let dir = TempDir::new("registry_extension");
    let template = dir.write("page.templet", "x <%= name %>\n");
    dir.write("extra.yaml", "compilers:\n  Emine: Ephp\n");
    let out = templet(&[
        "-I",
        dir.path.to_str().unwrap(),
        "-r",
        "extra",
        "-C",
        "Emine",
        "-x",
        &template,
    ]);
    assert!(out.status.success(), "stderr: {}", stderr_of(&out));
    assert!(stdout_of(&out).contains("<?php echo name; ?>"));
}

#[test]
fn binding_variant_renders_the_same_scope() {
    let dir = TempDir::new("binding_variant");
    let template = dir.write("page.templet", "<%= name %>\n");
    let out = templet(&["-B", "-c", "{name: Bound}", &template]);
    assert!(out.status.success());
    assert_eq!(stdout_of(&out), "Bound\n");
}
