//! The console: CLI argument parsing, script loading, the interactive
//! loop, and the exit-code contract (`spec.md` §6).
//!
//! Grounded on the teacher's `seq-repl` `main.rs`/`app.rs` split — a
//! `clap` args struct, a `fn run(...) -> Result<(), String>` entry point,
//! and a panic hook installed before anything touches the terminal —
//! generalized from a split-pane `ratatui` TUI to a plain line REPL built
//! on `rustyline`, since this core has no IR panes to render (`spec.md`
//! §1 treats CLI/TUI surface as a collaborator, not something this
//! console needs to reproduce in full).

use clap::Parser as ClapParser;
use reblang_core::cell::Cell;
use reblang_runtime::api::ApiBuilder;
use reblang_runtime::engine::Engine;
use reblang_runtime::eval::EvalResult;
use reblang_runtime::mold::{self, Mode};
use std::path::PathBuf;

#[derive(ClapParser, Debug)]
#[command(name = "reblang")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A console for the reblang interpreter core", long_about = None)]
pub struct Args {
    /// Directory to search for a script's `Needs:` modules. Repeatable.
    #[arg(long = "load", value_name = "DIR")]
    pub search_path: Vec<PathBuf>,

    /// Enable debug/trace logging (also settable via `RUST_LOG`).
    #[arg(short, long)]
    pub verbose: bool,

    /// Exit on the first uncaught error instead of continuing (scripts
    /// only; the interactive loop always continues).
    #[arg(long)]
    pub halt_on_error: bool,

    /// Script to run. Omitted: start the interactive loop.
    pub script: Option<PathBuf>,

    /// Arguments passed through to the script as `system/options/args`.
    pub args: Vec<String>,
}

/// Process exit status, `spec.md` §6's contract: 0 normal, 1 a reported
/// error, 130 a cooperative halt (matches the shell convention for
/// `SIGINT`, which is what `Ctrl-C` delivers when the `signals` feature
/// is on).
pub const EXIT_OK: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_HALT: i32 = 130;

fn init_logging(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn install_args(engine: &mut Engine, script_args: &[String]) {
    let values: Vec<Cell> = script_args.iter().map(|s| reblang_runtime::text::new_text(engine, s)).collect();
    let id = engine.pool.alloc_unmanaged(reblang_runtime::series::SeriesData::Array(values));
    engine.pool.manage(id);
    let block = Cell::aggregate(reblang_core::Kind::Block, id, 0);
    let args_sym = reblang_runtime::symbol::intern("args");
    let options_sym = reblang_runtime::symbol::intern("options");

    let options_ctx = reblang_runtime::context::Context::create(&mut engine.pool, true);
    let _ = options_ctx.append(&mut engine.pool, args_sym, block);
    engine.pool.manage(options_ctx.keylist);
    engine.pool.manage(options_ctx.values);
    let options_cell = Cell::aggregate(reblang_core::Kind::Object, options_ctx.values, 0);
    let _ = engine.system.append(&mut engine.pool, options_sym, options_cell);
}

/// Run a loaded script body to completion, reporting the result the way
/// `spec.md` §6 describes: 0 normal, 1 a reported error, 130 a halt.
fn run_to_exit(engine: &mut Engine, body: reblang_core::cell::NodeId) -> i32 {
    let mut frame = reblang_runtime::context::Frame::new(
        reblang_runtime::context::Context::create(&mut engine.pool, true),
        engine.lib.values,
        None,
    );
    match reblang_runtime::eval::do_block(engine, &mut frame, body) {
        EvalResult::Thrown { label, value } if is_quit(&label) => {
            reblang_runtime::api::unbox_integer(&value).map(|n| n as i32).unwrap_or(EXIT_OK)
        }
        EvalResult::Thrown { value, .. } => {
            eprintln!("{}", mold::render(engine, &value, Mode::Form));
            EXIT_ERROR
        }
        _ => EXIT_OK,
    }
}

fn is_quit(label: &Cell) -> bool {
    let quit = reblang_runtime::symbol::intern("%%quit%%");
    reblang_runtime::binding::symbol_of(label).map(|s| s == quit).unwrap_or(false)
}

/// Run a script file to completion and return the process exit code.
pub fn run_script(args: &Args) -> i32 {
    init_logging(args.verbose);
    let mut engine = Engine::bootstrap();
    install_args(&mut engine, &args.args);

    let script = args.script.as_ref().expect("run_script requires Args::script");
    let mut loader = reblangc::loader::Loader::new(&args.search_path);
    let result = match loader.load_file(&mut engine, script) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("reblang: {e}");
            return EXIT_ERROR;
        }
    };
    run_to_exit(&mut engine, result.body)
}

/// One line's outcome: keep reading, or stop the session with this exit
/// code (a `QUIT`, or an uncaught error when `--halt-on-error` is set).
enum LineOutcome {
    Continue,
    Exit(i32),
}

/// Evaluate one line of interactive input, printing its result the way a
/// console session conventionally echoes unrequested top-level values
/// (`spec.md` §6). `halt_on_error` decides whether an uncaught error ends
/// the session (`Args::halt_on_error`) or is just printed as a
/// diagnostic, the way a REPL normally recovers from a bad line.
fn eval_line(engine: &mut Engine, line: &str, halt_on_error: bool) -> LineOutcome {
    let mut frame = reblang_runtime::context::Frame::new(
        reblang_runtime::context::Context::create(&mut engine.pool, true),
        engine.lib.values,
        None,
    );
    let scanned = reblang_runtime::scanner::scan(engine, line);
    let id = engine.pool.alloc_unmanaged(reblang_runtime::series::SeriesData::Array(scanned));
    engine.pool.manage(id);

    match reblang_runtime::eval::do_block(engine, &mut frame, id) {
        EvalResult::Thrown { label, value } if is_quit(&label) => {
            LineOutcome::Exit(reblang_runtime::api::unbox_integer(&value).map(|n| n as i32).unwrap_or(EXIT_OK))
        }
        EvalResult::Thrown { value, .. } => {
            println!("{}", mold::render(engine, &value, Mode::Form));
            if halt_on_error {
                LineOutcome::Exit(EXIT_ERROR)
            } else {
                LineOutcome::Continue
            }
        }
        EvalResult::Null | EvalResult::Invisible => LineOutcome::Continue,
        EvalResult::Value(v) => {
            println!("== {}", mold::render(engine, &v, Mode::Mold));
            LineOutcome::Continue
        }
        EvalResult::Redo | EvalResult::Reference(_) => LineOutcome::Continue,
    }
}

fn history_path() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(".reblang_history"))
}

/// Interactive read-eval-print loop. Mirrors the builder the rest of the
/// embedding surface uses (`reblang_runtime::api::ApiBuilder`) for one-off
/// evaluation at startup (`--load` search-path probing), then hands off
/// to a line-at-a-time loop for everything the user types.
pub fn run_interactive(args: &Args) -> i32 {
    init_logging(args.verbose);
    let mut engine = Engine::bootstrap();
    install_args(&mut engine, &args.args);

    ApiBuilder::new().source("print \"reblang\"").elide(&mut engine);

    let mut editor = rustyline::DefaultEditor::new().expect("terminal does not support line editing");
    if let Some(path) = history_path() {
        let _ = editor.load_history(&path);
    }

    let halt = engine.halt.clone();
    loop {
        if halt.load(std::sync::atomic::Ordering::Relaxed) {
            println!("[halted]");
            engine.clear_halt();
        }
        let readline = editor.readline(">> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());
                if let LineOutcome::Exit(code) = eval_line(&mut engine, &line, args.halt_on_error) {
                    if let Some(path) = history_path() {
                        let _ = editor.save_history(&path);
                    }
                    return code;
                }
                engine.collect_garbage(&[]);
            }
            Err(rustyline::error::ReadlineError::Interrupted) => continue,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("reblang: {err}");
                break;
            }
        }
    }
    if let Some(path) = history_path() {
        let _ = editor.save_history(&path);
    }
    EXIT_OK
}

pub fn run(args: &Args) -> i32 {
    if args.script.is_some() {
        run_script(args)
    } else {
        run_interactive(args)
    }
}
