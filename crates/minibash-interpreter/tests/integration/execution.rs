//! Statement execution: statuses, short-circuit, pipelines, redirections.

use std::fs;
use std::path::Path;

use minibash_interpreter::Interpreter;
use tempfile::tempdir;

fn run(script: &str) -> i32 {
    let mut interpreter = Interpreter::new().unwrap();
    interpreter.run_script(script).unwrap()
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_true_and_false_statuses() {
    assert_eq!(run("true"), 0);
    assert_eq!(run("false"), 1);
}

#[test]
fn test_missing_command_is_127() {
    assert_eq!(run("definitely-not-a-command-minibash"), 127);
}

#[test]
fn test_signal_death_maps_to_128_plus_signal() {
    // sh kills itself with SIGTERM (15)
    assert_eq!(run("sh -c 'kill -TERM $$'"), 143);
}

#[test]
fn test_status_stays_in_byte_range() {
    for script in ["true", "false", "sh -c 'exit 250'", "no-such-command-xyz"] {
        let status = run(script);
        assert!((0..=255).contains(&status), "{script} gave {status}");
    }
}

#[test]
fn test_assignment_sets_environment_and_succeeds() {
    assert_eq!(run("MB_EXEC_ASSIGN=seven"), 0);
    assert_eq!(std::env::var("MB_EXEC_ASSIGN").unwrap(), "seven");
}

#[test]
fn test_comment_keeps_previous_status() {
    assert_eq!(run("# only a note"), 0);
    assert_eq!(run("false\n# still one"), 1);
}

#[test]
fn test_and_short_circuits_on_failure() {
    let dir = tempdir().unwrap();
    let marker = dir.path().join("marker");
    let status = run(&format!("false && echo oops > {}", marker.display()));
    assert_eq!(status, 1);
    assert!(!marker.exists());
}

#[test]
fn test_or_runs_right_on_failure() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    let status = run(&format!("false || echo rescued > {}", out.display()));
    assert_eq!(status, 0);
    assert_eq!(read(&out), "rescued\n");
}

#[test]
fn test_semicolon_runs_after_skipped_branch() {
    let dir = tempdir().unwrap();
    let skipped = dir.path().join("skipped");
    let reached = dir.path().join("reached");
    let status = run(&format!(
        "false && echo a > {} ; echo b > {}",
        skipped.display(),
        reached.display()
    ));
    assert_eq!(status, 0);
    assert!(!skipped.exists());
    assert_eq!(read(&reached), "b\n");
}

#[test]
fn test_or_then_and_chain() {
    let dir = tempdir().unwrap();
    let y = dir.path().join("y");
    let z = dir.path().join("z");
    let status = run(&format!(
        "false || echo y > {} && echo z > {}",
        y.display(),
        z.display()
    ));
    assert_eq!(status, 0);
    assert_eq!(read(&y), "y\n");
    assert_eq!(read(&z), "z\n");
}

#[test]
fn test_pipeline_status_comes_from_last_stage() {
    assert_eq!(run("true | false"), 1);
    assert_eq!(run("false | true"), 0);
}

#[test]
fn test_pipeline_flows_data() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    let status = run(&format!("printf 'a b c' | wc -w > {}", out.display()));
    assert_eq!(status, 0);
    assert_eq!(read(&out).trim(), "3");
}

#[test]
fn test_three_stage_pipeline() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    let status = run(&format!(
        "printf 'b\\na\\nc\\n' | sort | head -n 1 > {}",
        out.display()
    ));
    assert_eq!(status, 0);
    assert_eq!(read(&out), "a\n");
}

#[test]
fn test_truncate_then_append() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    assert_eq!(run(&format!("echo one > {}", out.display())), 0);
    assert_eq!(run(&format!("echo two >> {}", out.display())), 0);
    assert_eq!(read(&out), "one\ntwo\n");
}

#[test]
fn test_input_redirection() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    let out = dir.path().join("out");
    fs::write(&input, "data\n").unwrap();
    let status = run(&format!("cat < {} > {}", input.display(), out.display()));
    assert_eq!(status, 0);
    assert_eq!(read(&out), "data\n");
}

#[test]
fn test_unopenable_input_fails_statement() {
    assert_eq!(run("cat < /definitely/missing/minibash-input"), 1);
}

#[test]
fn test_unopenable_output_fails_statement() {
    assert_eq!(run("echo hi > /definitely/missing/dir/out"), 1);
}

#[test]
fn test_unimplemented_statement_kind_is_recovered() {
    assert_eq!(run("if true; then echo hi; fi"), 1);
}

#[test]
fn test_subshell_children_run_in_sequence() {
    assert_eq!(run("(true)"), 0);
    assert_eq!(run("(false)"), 1);
}

#[test]
fn test_pipeline_leaks_no_descriptors() {
    fn open_fds() -> usize {
        fs::read_dir("/proc/self/fd").unwrap().count()
    }

    // Other test threads open and close descriptors concurrently, so one
    // equal before/after pair out of a few attempts is the signal.
    run("printf 'warm' | cat | wc -c");
    let mut stable = false;
    for _ in 0..5 {
        let before = open_fds();
        run("printf 'x y' | cat | wc -w");
        let after = open_fds();
        if before == after {
            stable = true;
            break;
        }
    }
    assert!(stable, "pipeline runs kept growing the descriptor table");
}
