//! Integration tests for `tsbundle bundle`.
//!
//! These tests verify:
//! - `--json` output is always valid JSON with `ok`, `outputs` and `errors`
//! - Error codes are SCREAMING_SNAKE_CASE
//! - Diagnostics fail the command with exit status 1
//! - Settings come from tsbundle.json when no flags are given

use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-q", "-p", "tsbundle-cli", "--bin", "tsbundle", "--"]);
    cmd
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
    cargo_bin()
        .args(args)
        .arg("--cwd")
        .arg(dir)
        .output()
        .expect("Failed to run bundle command")
}

fn json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("Output should be valid JSON")
}

#[test]
fn test_bundle_writes_outfile() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("entry.ts"),
        "import { greet } from \"./lib\"\ndeclare const process: any\ngreet()\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("lib.ts"),
        "export function greet() {}\n",
    )
    .unwrap();

    let output = run_in(dir.path(), &["bundle", "entry.ts", "-o", "dist/out.js", "--json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json = json(&output);
    assert_eq!(json["ok"], true);
    assert_eq!(json["schema_version"], 1);
    assert_eq!(json["modules"].as_array().unwrap().len(), 2);
    assert!(json["errors"].as_array().unwrap().is_empty());
    assert_eq!(json["outputs"][0]["status"], "written");

    let bundle = std::fs::read_to_string(dir.path().join("dist").join("out.js")).unwrap();
    assert!(bundle.starts_with("let __require, __export, __exportStar;\n"));
    assert!(bundle.contains("    const { greet } = __require(1);\n    greet();\n"));
    assert!(bundle.contains("    function greet() {}\n    __export(1, { greet: () => greet });\n"));
    assert!(bundle.ends_with("}, 0);\n"));
    assert!(!bundle.contains("declare"));
}

#[test]
fn test_unchanged_output_is_not_rewritten() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("entry.ts"), "let foo\n").unwrap();

    let args = ["bundle", "entry.ts", "-o", "out.js", "--json"];
    let first = json(&run_in(dir.path(), &args));
    let second = json(&run_in(dir.path(), &args));

    assert_eq!(first["outputs"][0]["status"], "written");
    assert_eq!(second["outputs"][0]["status"], "unchanged");
    assert_eq!(first["outputs"][0]["hash"], second["outputs"][0]["hash"]);
}

#[test]
fn test_bundle_to_stdout() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("entry.ts"), "declare class foo {}\nlet foo\n").unwrap();

    let output = run_in(dir.path(), &["bundle", "entry.ts"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("    ;\n    let foo;\n  }\n}, 0);\n"), "{stdout}");
}

#[test]
fn test_resolve_error_fails_with_json() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("entry.ts"), "import \"./missing\"\n").unwrap();

    let output = run_in(dir.path(), &["bundle", "entry.ts", "-o", "out.js", "--json"]);
    assert_eq!(output.status.code(), Some(1));

    let json = json(&output);
    assert_eq!(json["ok"], false);
    let error = &json["errors"][0];
    assert_eq!(error["code"], "RESOLVE_ERROR");
    assert_eq!(error["text"], "Could not resolve \"./missing\"");
    assert_eq!(error["location"]["line"], 1);

    let code = error["code"].as_str().unwrap();
    assert!(code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c == '_' || c.is_ascii_digit()));
    assert!(!dir.path().join("out.js").exists());
}

#[test]
fn test_parse_error_human_output() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("entry.ts"), "let a = 1\ndeclare foo bar\n").unwrap();

    let output = run_in(dir.path(), &["bundle", "entry.ts"]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(":2:8: error: Unexpected \"foo\" after \"declare\""), "{stderr}");
    assert!(stderr.contains("declare foo bar\n        ^"), "{stderr}");
    assert!(stderr.contains("1 error"));
}

#[test]
fn test_output_layout_errors() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("a.ts"), "let a\n").unwrap();
    std::fs::write(dir.path().join("b.ts"), "let b\n").unwrap();

    let output = run_in(dir.path(), &["bundle", "a.ts", "b.ts", "-o", "out.js", "--json"]);
    assert_eq!(output.status.code(), Some(1));
    let error = &json(&output)["errors"][0];
    assert_eq!(error["code"], "COMPILE_ERROR");
    assert_eq!(
        error["text"],
        "Cannot use an output file when there are multiple entry points"
    );

    std::fs::write(dir.path().join("c.js"), "let c\n").unwrap();
    let output = run_in(dir.path(), &["bundle", "c.js", "--outdir", ".", "--json"]);
    assert_eq!(output.status.code(), Some(1));
    let error = &json(&output)["errors"][0];
    assert_eq!(error["code"], "COMPILE_ERROR");
    assert!(error["text"].as_str().unwrap().starts_with("Refusing to overwrite input file"));
    assert_eq!(std::fs::read_to_string(dir.path().join("c.js")).unwrap(), "let c\n");
}

#[test]
fn test_settings_from_config_file() {
    let dir = tempdir().unwrap();
    std::fs::create_dir(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("src").join("a.ts"), "export const a = 1\n").unwrap();
    std::fs::write(dir.path().join("src").join("b.ts"), "export const b = 2\n").unwrap();
    std::fs::write(
        dir.path().join("tsbundle.json"),
        r#"{"entryPoints": ["src/a.ts", "src/b.ts"], "outdir": "dist"}"#,
    )
    .unwrap();

    let output = run_in(dir.path(), &["bundle", "--json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json = json(&output);
    assert_eq!(json["outputs"].as_array().unwrap().len(), 2);
    assert!(dir.path().join("dist").join("a.js").is_file());
    assert!(dir.path().join("dist").join("b.js").is_file());
}

#[test]
fn test_invalid_config_is_a_config_error() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("tsbundle.json"), r#"{"entryPoint": "x.ts"}"#).unwrap();

    let output = run_in(dir.path(), &["bundle", "--json"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(json(&output)["errors"][0]["code"], "CONFIG_ERROR");
}

#[test]
fn test_no_bundle_transforms_entry_only() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("entry.ts"),
        "import { x } from \"./nowhere\"\ndeclare let y: number\nlet z = x\n",
    )
    .unwrap();

    let output = run_in(dir.path(), &["bundle", "entry.ts", "--no-bundle", "--outdir", "out"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let code = std::fs::read_to_string(dir.path().join("out").join("entry.js")).unwrap();
    assert_eq!(code, "import { x } from \"./nowhere\";\nlet z = x;\n");
}

#[test]
fn test_version() {
    let output = cargo_bin().arg("version").output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("tsbundle "));
}
