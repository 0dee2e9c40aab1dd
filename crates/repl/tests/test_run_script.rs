//! End-to-end coverage of the script-running exit-code contract
//! (`spec.md` §6: 0 normal, 1 a reported error).

use reblang_repl::{run_script, Args};

fn args(script: std::path::PathBuf) -> Args {
    Args { search_path: Vec::new(), verbose: false, halt_on_error: false, script: Some(script), args: Vec::new() }
}

#[test]
fn successful_script_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ok.reb");
    std::fs::write(&path, "print 1 + 2").unwrap();
    assert_eq!(run_script(&args(path)), reblang_repl::EXIT_OK);
}

#[test]
fn uncaught_error_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.reb");
    std::fs::write(&path, "1 / 0").unwrap();
    assert_eq!(run_script(&args(path)), reblang_repl::EXIT_ERROR);
}

#[test]
fn quit_with_code_propagates_exit_status() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quit.reb");
    std::fs::write(&path, "quit 7").unwrap();
    assert_eq!(run_script(&args(path)), 7);
}

#[test]
fn needs_resolved_against_load_search_path() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("util.reb"), "triple: func [x] [x * 3]").unwrap();
    let main_path = dir.path().join("main.reb");
    std::fs::write(&main_path, "REBOL [Needs: [util]] quit triple 14").unwrap();

    let mut a = args(main_path);
    a.search_path = vec![dir.path().to_path_buf()];
    assert_eq!(run_script(&a), 42);
}

#[test]
fn missing_script_file_exits_one() {
    let a = args(std::path::PathBuf::from("/nonexistent/path/to/nowhere.reb"));
    assert_eq!(run_script(&a), reblang_repl::EXIT_ERROR);
}
