//! Tests for command dispatch through execute_command

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tempfile::TempDir;

use jobad::cli::commands::execute_command;
use jobad::cli::Cli;
use jobad::exitcode;

const DOC: &str = r#"
id = "root"
property = { name = "verbose", type = "boolean", value = false }

[[children]]
id = "details"
conditional = "verbose=true"

[[children]]
id = "summary"
conditional = "not(verbose=true)"
"#;

fn write_doc(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("doc.toml");
    fs::write(&path, DOC).unwrap();
    path
}

fn run(args: &[&str]) -> Result<String, i32> {
    let cli = Cli::parse_from(args);
    let mut out = Vec::new();
    execute_command(&cli, &mut out).map_err(|e| e.exit_code())?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn given_expression_and_values_when_eval_then_prints_result() {
    let output = run(&["jobad", "eval", "and(a=1,b>2)", "-s", "a=1", "-s", "b=10"]).unwrap();
    assert_eq!(output.trim(), "true");
}

#[test]
fn given_repeated_value_when_eval_then_last_one_wins() {
    let output = run(&["jobad", "eval", "a=2", "-s", "a=1", "-s", "a=2"]).unwrap();
    assert_eq!(output.trim(), "true");
}

#[test]
fn given_malformed_expression_when_eval_then_exits_with_dataerr() {
    assert_eq!(run(&["jobad", "eval", "and(a=1"]), Err(exitcode::DATAERR));
}

#[test]
fn given_expression_when_parse_then_prints_canonical_form_and_properties() {
    let output = run(&["jobad", "parse", "or( b=1 , not(a<2))"]).unwrap();
    assert_eq!(output, "or(b=1,not(a<2))\nproperties: a, b\n");
}

#[test]
fn given_document_when_show_then_renders_hidden_state() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(&dir);

    let output = run(&["jobad", "show", doc.to_str().unwrap()]).unwrap();

    assert!(output.contains("details if verbose=true [hidden]"));
    assert!(output.contains("summary if not(verbose=true)\n"));
}

#[test]
fn given_document_when_set_then_prints_reevaluated_tree() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(&dir);

    let output = run(&["jobad", "set", doc.to_str().unwrap(), "root", "true"]).unwrap();

    assert!(output.contains("details if verbose=true\n"));
    assert!(output.contains("summary if not(verbose=true) [hidden]"));
}

#[test]
fn given_unknown_node_when_context_then_exits_with_usage() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(&dir);

    assert_eq!(
        run(&["jobad", "context", doc.to_str().unwrap(), "missing"]),
        Err(exitcode::USAGE)
    );
}

#[test]
fn given_child_node_when_context_then_lists_inherited_values() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(&dir);

    let output = run(&["jobad", "context", doc.to_str().unwrap(), "details"]).unwrap();

    assert_eq!(output, "verbose=false\n");
}

#[test]
fn given_missing_document_when_show_then_exits_with_noinput() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.toml");

    assert_eq!(
        run(&["jobad", "show", missing.to_str().unwrap()]),
        Err(exitcode::NOINPUT)
    );
}

#[test]
fn given_flag_command_when_hiding_then_reports_effective_setting() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(&dir);

    let output = run(&[
        "jobad",
        "flag",
        doc.to_str().unwrap(),
        "details",
        "reconstructed",
        "hide",
    ])
    .unwrap();

    assert!(output.starts_with("details.reconstructed = hide\n"));
}

#[test]
fn given_no_command_when_running_then_usage_error() {
    assert_eq!(run(&["jobad"]), Err(exitcode::USAGE));
}
