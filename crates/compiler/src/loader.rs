//! `LOAD`: turn source text (or a file) into a scanned body plus its
//! optional [`Header`], resolving `Needs:` against a module search path
//! before the body runs (`spec.md` §6's "Load format" paragraph).
//!
//! Grounded on the teacher's include resolver
//! (`navicore-cem3` `crates/compiler/src/resolver.rs`) for "canonicalize,
//! dedup against an already-loaded set, recurse before the requesting
//! file's own content" — generalized from `std:`/`ffi:` include prefixes
//! to a directory search path of `.reb`/`.r3` files, and its shebang
//! stripping (`crates/compiler/src/script.rs::strip_shebang`) so a
//! `#!/usr/bin/env reblang` line doesn't shift scanner column numbers.

use reblang_core::cell::NodeId;
use reblang_runtime::context::{Context, Frame};
use reblang_runtime::engine::Engine;
use reblang_runtime::eval::do_block;
use reblang_runtime::series::SeriesData;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::header::{self, Header};

#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, source: std::io::Error },
    NeedNotFound { name: String },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => write!(f, "failed to read '{}': {source}", path.display()),
            LoadError::NeedNotFound { name } => write!(f, "needed module '{name}' not found on the search path"),
        }
    }
}

impl std::error::Error for LoadError {}

#[derive(Debug)]
pub struct LoadResult {
    pub header: Option<Header>,
    pub body: NodeId,
}

/// Replace a leading `#!...` line with a comment of the same length, so
/// line numbers in any later diagnostics stay aligned.
fn strip_shebang(source: &str) -> std::borrow::Cow<'_, str> {
    if !source.starts_with("#!") {
        return std::borrow::Cow::Borrowed(source);
    }
    match source.find('\n') {
        Some(nl) => {
            let mut out = String::with_capacity(source.len());
            out.push('#');
            out.push_str(&" ".repeat(nl.saturating_sub(1)));
            out.push_str(&source[nl..]);
            std::borrow::Cow::Owned(out)
        }
        None => std::borrow::Cow::Borrowed("#"),
    }
}

/// Scan `text`, split off a leading header if present, and wrap the
/// remaining cells in a block node.
pub fn load_str(engine: &mut Engine, text: &str) -> LoadResult {
    let source = strip_shebang(text);
    let cells = reblang_runtime::scanner::scan(engine, &source);
    let (header, consumed) = header::parse(engine, &cells);
    let body_cells = cells[consumed..].to_vec();
    let id = engine.pool.alloc_unmanaged(SeriesData::Array(body_cells));
    engine.pool.manage(id);
    LoadResult { header, body: id }
}

/// Loads a file and everything its header's `Needs:` list names,
/// running each dependency's body against `engine.lib` before returning
/// the requesting file's own body — so `Needs` behaves like an eager,
/// dependency-first module load (`spec.md` §6).
pub struct Loader<'a> {
    search_path: &'a [PathBuf],
    loaded: HashSet<PathBuf>,
}

impl<'a> Loader<'a> {
    pub fn new(search_path: &'a [PathBuf]) -> Loader<'a> {
        Loader { search_path, loaded: HashSet::new() }
    }

    pub fn load_file(&mut self, engine: &mut Engine, path: &Path) -> Result<LoadResult, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
        if let Ok(canonical) = path.canonicalize() {
            self.loaded.insert(canonical);
        }
        let result = load_str(engine, &text);
        if let Some(header) = &result.header {
            for need in &header.needs {
                self.resolve_need(engine, need)?;
            }
        }
        Ok(result)
    }

    fn resolve_need(&mut self, engine: &mut Engine, name: &str) -> Result<(), LoadError> {
        let found = self
            .search_path
            .iter()
            .flat_map(|dir| [dir.join(format!("{name}.reb")), dir.join(format!("{name}.r3")), dir.join(name)])
            .find(|candidate| candidate.is_file());
        let Some(path) = found else {
            return Err(LoadError::NeedNotFound { name: name.to_string() });
        };
        let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
        if self.loaded.contains(&canonical) {
            return Ok(());
        }
        let dependency = self.load_file(engine, &path)?;
        let mut frame = Frame::new(Context::create(&mut engine.pool, true), engine.lib.values, None);
        let _ = do_block(engine, &mut frame, dependency.body);
        Ok(())
    }
}

/// Convenience entry point for a one-off load with no `Needs` support
/// (no search path supplied).
pub fn load_file(engine: &mut Engine, path: &Path) -> Result<LoadResult, LoadError> {
    Loader::new(&[]).load_file(engine, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(engine: &mut Engine, body: NodeId) -> reblang_core::cell::Cell {
        let mut frame = Frame::new(Context::create(&mut engine.pool, true), engine.lib.values, None);
        do_block(engine, &mut frame, body).into_cell()
    }

    #[test]
    fn loads_body_without_header() {
        let mut engine = Engine::bootstrap();
        let result = load_str(&mut engine, "1 + 2");
        assert_eq!(run(&mut engine, result.body), reblang_core::cell::Cell::integer(3));
    }

    #[test]
    fn resolves_needs_against_search_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("util.reb"), "double: func [x] [x * 2]").unwrap();
        let main_path = dir.path().join("main.reb");
        std::fs::write(&main_path, "REBOL [Needs: [util]] double 21").unwrap();

        let mut engine = Engine::bootstrap();
        let search_path = vec![dir.path().to_path_buf()];
        let mut loader = Loader::new(&search_path);
        let result = loader.load_file(&mut engine, &main_path).unwrap();
        assert_eq!(run(&mut engine, result.body), reblang_core::cell::Cell::integer(42));
    }

    #[test]
    fn missing_need_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let main_path = dir.path().join("main.reb");
        std::fs::write(&main_path, "REBOL [Needs: [missing-module]] 1").unwrap();

        let mut engine = Engine::bootstrap();
        let search_path: Vec<PathBuf> = vec![];
        let mut loader = Loader::new(&search_path);
        let err = loader.load_file(&mut engine, &main_path).unwrap_err();
        assert!(matches!(err, LoadError::NeedNotFound { .. }));
    }
}
