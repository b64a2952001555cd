//! Word expansion observed through real statements and the environment.

use std::fs;
use std::path::{Path, PathBuf};

use minibash_interpreter::Interpreter;
use tempfile::{tempdir, TempDir};

fn run(script: &str) -> i32 {
    let mut interpreter = Interpreter::new().unwrap();
    interpreter.run_script(script).unwrap()
}

fn out_file() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out");
    (dir, path)
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_bare_word_roundtrip() {
    let (_dir, out) = out_file();
    assert_eq!(run(&format!("echo abc-def_123 > {}", out.display())), 0);
    assert_eq!(read(&out), "abc-def_123\n");
}

#[test]
fn test_single_quotes_are_literal() {
    let (_dir, out) = out_file();
    run(&format!("echo 'a  b $HOME' > {}", out.display()));
    assert_eq!(read(&out), "a  b $HOME\n");
}

#[test]
fn test_double_quoted_variables() {
    let (_dir, out) = out_file();
    let status = run(&format!(
        "MB_EXPN_A=one; MB_EXPN_B=two; echo \"$MB_EXPN_A-$MB_EXPN_B\" > {}",
        out.display()
    ));
    assert_eq!(status, 0);
    assert_eq!(read(&out), "one-two\n");
}

#[test]
fn test_unset_variable_expands_to_empty() {
    std::env::remove_var("MB_EXPN_UNSET");
    let (_dir, out) = out_file();
    run(&format!("echo \"[$MB_EXPN_UNSET]\" > {}", out.display()));
    assert_eq!(read(&out), "[]\n");
}

#[test]
fn test_braced_expansion_in_string() {
    let (_dir, out) = out_file();
    run(&format!(
        "MB_EXPN_BR=val; echo \"x${{MB_EXPN_BR}}y\" > {}",
        out.display()
    ));
    assert_eq!(read(&out), "xvaly\n");
}

#[test]
fn test_dollar_question_reads_latest_status() {
    let (_dir, out) = out_file();
    let status = run(&format!("false; echo $? > {}", out.display()));
    assert_eq!(status, 0);
    assert_eq!(read(&out), "1\n");
}

#[test]
fn test_dollar_question_after_success() {
    let (_dir, out) = out_file();
    run(&format!("true; echo $? > {}", out.display()));
    assert_eq!(read(&out), "0\n");
}

#[test]
fn test_dollar_dollar_is_the_shell_pid() {
    let (_dir, out) = out_file();
    run(&format!("echo \"$$ $$\" > {}", out.display()));
    let expected = format!("{0} {0}\n", std::process::id());
    assert_eq!(read(&out), expected);
}

#[test]
fn test_substitution_captures_stdout() {
    let (_dir, out) = out_file();
    run(&format!("echo \"got $(echo hi)\" > {}", out.display()));
    assert_eq!(read(&out), "got hi\n");
}

#[test]
fn test_empty_substitution() {
    let (_dir, out) = out_file();
    run(&format!("echo \"[$(echo)]\" > {}", out.display()));
    assert_eq!(read(&out), "[]\n");
}

#[test]
fn test_substitution_strips_only_trailing_newlines() {
    let (_dir, out) = out_file();
    run(&format!(
        "echo \"[$(printf 'x\\n\\n\\n')]\" > {}",
        out.display()
    ));
    assert_eq!(read(&out), "[x]\n");
}

#[test]
fn test_substitution_sees_parent_variables() {
    let (_dir, out) = out_file();
    run(&format!(
        "MB_EXPN_SUB=inner; echo \"$(echo $MB_EXPN_SUB)\" > {}",
        out.display()
    ));
    assert_eq!(read(&out), "inner\n");
}

#[test]
fn test_nested_substitution() {
    let (_dir, out) = out_file();
    run(&format!("echo \"$(echo $(echo deep))\" > {}", out.display()));
    assert_eq!(read(&out), "deep\n");
}

#[test]
fn test_empty_string_argument_is_preserved() {
    let (_dir, out) = out_file();
    run(&format!("echo \"\" x > {}", out.display()));
    assert_eq!(read(&out), " x\n");
}

#[test]
fn test_assignment_then_echo_roundtrip() {
    let (_dir, out) = out_file();
    let status = run(&format!("MB_EXPN_RT=V; echo $MB_EXPN_RT > {}", out.display()));
    assert_eq!(status, 0);
    assert_eq!(read(&out), "V\n");
}
