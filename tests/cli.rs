use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn nebula() -> Command {
    Command::new(env!("CARGO_BIN_EXE_nebula"))
}

fn script(dir: &TempDir, name: &str, source: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, source).expect("failed to write script");
    path
}

fn run(paths: &[&Path]) -> Output {
    nebula().args(paths).output().expect("failed to execute nebula")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn version_flag() {
    let output = nebula().arg("--version").output().expect("failed to execute nebula");
    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn runs_a_script() {
    let dir = TempDir::new().unwrap();
    let main = script(&dir, "hello.neb", "def Main():\n print 'hello'\n end\n");

    let output = run(&[&main]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "hello\n");
}

#[test]
fn functions_can_live_in_another_file() {
    let dir = TempDir::new().unwrap();
    let lib = script(&dir, "lib.neb", "def Shout(s):\n print s\n end\n");
    let main = script(&dir, "main.neb", "def Main():\n Shout('hey')\n end\n");
    let notes = script(&dir, "notes.txt", "not a script");

    let output = run(&[&lib, &notes, &main]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "hey\n");
}

#[test]
fn requires_a_source_file() {
    let output = nebula().output().expect("failed to execute nebula");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("required source file as arg"));

    let dir = TempDir::new().unwrap();
    let notes = script(&dir, "notes.txt", "def Main():\n end\n");
    let output = run(&[&notes]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("required source file as arg"));
}

#[test]
fn assembly_errors_exit_with_failure() {
    let dir = TempDir::new().unwrap();
    let main = script(&dir, "bad.neb", "print 'outside'\n");

    let output = run(&[&main]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("L1"));
    assert!(stderr(&output).contains("dangling statement - print"));
}

#[test]
fn runtime_errors_print_a_stack_trace() {
    let dir = TempDir::new().unwrap();
    let main = script(
        &dir,
        "trace.neb",
        "def Inner():\n print missing\n end\n def Main():\n print 'before'\n Inner()\n end\n",
    );

    let output = run(&[&main]);
    assert!(!output.status.success());
    assert_eq!(stdout(&output), "before\n");

    let trace = stderr(&output);
    assert!(trace.contains("Stack trace -"));
    assert!(trace.contains("Inner() - Error L2 in "));
    assert!(trace.contains("undeclared symbol - missing."));
    assert!(trace.trim_end().ends_with("Main()"));
}
