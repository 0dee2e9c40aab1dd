//! Source scanning and the `REBOL [header]` / module-search-path load
//! format layered on top of `reblang_runtime::scanner` (`spec.md` §6's
//! "Load format" paragraph).
//!
//! Grounded on the teacher's tokenizer-then-parser split
//! (`navicore-cem3` `crates/compiler/src/parser.rs`) and its include
//! resolver (`crates/compiler/src/resolver.rs`'s canonical-path dedup
//! over a search path), generalized from Seq's concatenative include
//! grammar to reading a leading header object off an already-scanned
//! cell stream and resolving its `Needs` field against a directory
//! search path instead of `std:`/`ffi:` include prefixes.

pub mod header;
pub mod loader;

pub use header::Header;
pub use loader::{load_file, load_str, LoadError};
