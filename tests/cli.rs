use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn jsc() -> Command {
    Command::cargo_bin("jsc").expect("binary exists")
}

#[test]
fn jsc_inline_script_prints() {
    jsc()
        .arg("-e")
        .arg("print(1+1)")
        .assert()
        .success()
        .stdout("2\n");
}

#[test]
fn jsc_print_joins_arguments() {
    jsc()
        .args(["-e", "print('a', 1, true, null)"])
        .assert()
        .success()
        .stdout("a 1 true null\n");
}

#[test]
fn jsc_uncaught_exception_exits_with_three() {
    jsc()
        .args(["-e", "throw new Error('boom')"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Exception: Error: boom"));
}

#[test]
fn jsc_later_scripts_run_after_exception() {
    jsc()
        .args(["-e", "throw 1", "-e", "print('still running')"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Exception: 1"))
        .stdout(predicate::str::contains("still running"));
}

#[test]
fn jsc_without_scripts_enters_shell() {
    jsc().write_stdin("").assert().success().stdout("> \n");
}

#[test]
fn jsc_shell_evaluates_piped_lines() {
    jsc()
        .write_stdin("var x = 6\nx * 7\n")
        .assert()
        .success()
        .stdout("> undefined\n> 42\n> \n");
}

#[test]
fn jsc_interactive_after_scripts() {
    jsc()
        .args(["-e", "var seeded = 'kept'", "-i"])
        .write_stdin("seeded\n")
        .assert()
        .success()
        .stdout("> kept\n> \n");
}

#[test]
fn jsc_missing_file_aborts_remaining_scripts() {
    let dir = tempdir().expect("create temp dir");
    let first = dir.path().join("a.js");
    let last = dir.path().join("b.js");
    fs::write(&first, "print('a')").expect("write a.js");
    fs::write(&last, "print('b')").expect("write b.js");
    let missing = dir.path().join("missing.js");

    jsc()
        .arg(&first)
        .arg(&missing)
        .arg(&last)
        .assert()
        .code(3)
        .stdout(predicate::str::contains("a\n"))
        .stdout(predicate::str::contains("b").not())
        .stderr(predicate::str::contains("Could not open file"));
}

#[test]
fn jsc_unknown_option_is_treated_as_file() {
    jsc()
        .arg("--totallyUnknown")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Could not open file: --totallyUnknown"))
        .stderr(predicate::function(|stderr: &str| {
            stderr.matches("Could not open file").count() == 1
        }));
}

#[test]
fn jsc_runs_shebang_file() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("tool.js");
    fs::write(&script, "#!/usr/bin/env jsc\nprint('from file')\n").expect("write script");

    jsc()
        .arg("-f")
        .arg(&script)
        .assert()
        .success()
        .stdout("from file\n");
}

#[test]
fn jsc_trailing_arguments_bind_to_arguments() {
    jsc()
        .args(["-e", "print(arguments.length, arguments.join('|'))", "--", "x", "-e", "y"])
        .assert()
        .success()
        .stdout("3 x|-e|y\n");
}

#[test]
fn jsc_reports_exit_code() {
    jsc()
        .args(["-x", "-e", "1"])
        .assert()
        .success()
        .stdout("jsc exiting 0\n");

    jsc()
        .args(["-x", "-e", "throw 0"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("jsc exiting 3"));
}

#[test]
fn jsc_help_prints_usage() {
    jsc()
        .arg("-h")
        .assert()
        .success()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn jsc_flag_without_value_is_usage_error() {
    jsc()
        .arg("-f")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn jsc_options_lists_engine_options() {
    jsc()
        .arg("--options")
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("All engine options:"))
        .stderr(predicate::str::contains("maxLoopIterations"));
}

#[test]
fn jsc_engine_option_is_applied() {
    jsc()
        .args(["--maxLoopIterations=10", "-e", "for (;;) {}"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Exception:"));
}

#[test]
fn jsc_profile_is_written() {
    let dir = tempdir().expect("create temp dir");
    let output = dir.path().join("profile.json");

    jsc()
        .arg("-p")
        .arg(&output)
        .args(["-e", "1 + 1"])
        .assert()
        .success();

    let saved = fs::read_to_string(&output).expect("profile exists");
    let database: serde_json::Value = serde_json::from_str(&saved).expect("valid json");
    assert_eq!(database["version"], 1);
    assert_eq!(database["records"][0]["source"], "[Command Line]");
}

#[test]
fn jsc_quit_exits_cleanly() {
    jsc()
        .args(["-e", "print('before'); quit(); print('after')"])
        .assert()
        .success()
        .stdout("before\n");
}

#[test]
fn jsc_readline_returns_line_without_newline() {
    jsc()
        .args(["-e", "print('[' + readline() + ']')"])
        .write_stdin("abc\nnext\n")
        .assert()
        .success()
        .stdout("[abc]\n");
}

#[test]
fn jsc_readline_at_end_of_input_is_empty() {
    jsc()
        .args(["-e", "print('[' + readline() + ']')"])
        .write_stdin("")
        .assert()
        .success()
        .stdout("[]\n");
}

#[test]
fn jsc_shell_lines_can_call_readline() {
    jsc()
        .write_stdin("readline()\nhello\n")
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .success()
        .stdout("> hello\n> \n");
}

#[test]
fn jsc_unsaved_profile_is_reported_once() {
    let dir = tempdir().expect("create temp dir");
    let output = dir.path().join("no-such-dir").join("profile.json");

    jsc()
        .arg("-p")
        .arg(&output)
        .args(["-e", "1"])
        .assert()
        .success()
        .stderr("could not save profiler output.\n");
}
