//! `reblang` — run a script, or start the interactive console.
//!
//! Usage:
//!   reblang                      # start the interactive console
//!   reblang script.reb           # run a script, exit with its status
//!   reblang --load lib script.reb arg1 arg2
//!
//! Exit codes (`spec.md` §6): 0 normal, 1 a reported error, 130 a halt.

use clap::Parser as ClapParser;
use reblang_repl::Args;

fn main() {
    let args = Args::parse();
    std::process::exit(reblang_repl::run(&args));
}
