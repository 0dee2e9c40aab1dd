//! External API: a safe-Rust stand-in for the variadic, string-and-value
//! mixed C API extensions embed against (`spec.md` §6).
//!
//! The real API is `rebValue("print [", word, "]")`-style: a null-
//! terminated `va_list` alternating source fragments and `REBVAL*`
//! pointers, run as if the fragments and spliced values were one
//! program. Rust has no variadic functions with mixed types, so this
//! core exposes the same idea as a builder: push fragments in order,
//! then run them as a single block. Grounded on the teacher's builder
//! pattern for assembling a program incrementally before handing it to
//! one execution entry point (`navicore-cem3` `crates/repl/src/main.rs`'s
//! accumulate-then-`eval_line` loop).

use crate::context::{Context, Frame};
use crate::engine::Engine;
use crate::eval::{do_block, EvalResult};
use crate::series::SeriesData;
use reblang_core::cell::Cell;
use reblang_core::Kind;

enum Fragment {
    Source(String),
    Value(Cell),
}

/// Accumulates fragments for one API call (`spec.md` §6's variadic
/// convention, §9's "Value/Elide/Did/Unbox/..." operation set).
#[derive(Default)]
pub struct ApiBuilder {
    fragments: Vec<Fragment>,
}

impl ApiBuilder {
    pub fn new() -> ApiBuilder {
        ApiBuilder { fragments: Vec::new() }
    }

    /// Append a raw source fragment, scanned and spliced into the
    /// program at this position.
    pub fn source(mut self, text: impl Into<String>) -> ApiBuilder {
        self.fragments.push(Fragment::Source(text.into()));
        self
    }

    /// Splice an already-constructed value in verbatim (no scanning).
    pub fn value(mut self, cell: Cell) -> ApiBuilder {
        self.fragments.push(Fragment::Value(cell));
        self
    }

    fn assemble(&self, engine: &mut Engine) -> reblang_core::cell::NodeId {
        let mut cells = Vec::new();
        for frag in &self.fragments {
            match frag {
                Fragment::Source(text) => {
                    let scanned = crate::scanner::scan(engine, text);
                    cells.extend(scanned);
                }
                Fragment::Value(cell) => cells.push(*cell),
            }
        }
        let id = engine.pool.alloc_unmanaged(SeriesData::Array(cells));
        engine.pool.manage(id);
        id
    }

    /// `rebValue`: run the assembled program, returning its last result
    /// as a plain value (null/invisible collapse to `Cell::null()`).
    pub fn value_result(self, engine: &mut Engine) -> Cell {
        let block = self.assemble(engine);
        let mut frame = Frame::new(Context::create(&mut engine.pool, true), engine.lib.values, None);
        do_block(engine, &mut frame, block).into_cell()
    }

    /// `rebElide`: run for effect, discarding the result.
    pub fn elide(self, engine: &mut Engine) {
        let _ = self.value_result(engine);
    }

    /// `rebDid`: run and coerce to a Rust bool via truthiness
    /// (`spec.md` §3.2: null and `false` are falsey, everything else,
    /// including blank, is truthy).
    pub fn did(self, engine: &mut Engine) -> bool {
        let v = self.value_result(engine);
        is_truthy(&v)
    }
}

pub fn is_truthy(v: &Cell) -> bool {
    if v.is_null() {
        return false;
    }
    !matches!(v.payload(), reblang_core::cell::Payload::Logic(false))
}

/// `rebUnbox`: extract a Rust `i64` from an `integer!` result, if that's
/// what came back.
pub fn unbox_integer(v: &Cell) -> Option<i64> {
    match v.payload() {
        reblang_core::cell::Payload::Integer(n) => Some(*n),
        _ => None,
    }
}

/// `rebSpell`: extract a Rust `String` from a `text!` result.
pub fn spell(engine: &Engine, v: &Cell) -> Option<String> {
    crate::text::as_str(engine, v).map(|s| s.to_string())
}

/// `rebManage`/`rebUnmanage`: hand an API-held node to (or withdraw it
/// from) the GC (`spec.md` §6, §4.2).
pub fn manage(engine: &mut Engine, v: &Cell) {
    if let Some(node) = v.node() {
        engine.pool.manage(node);
    }
}

pub fn is_managed(engine: &Engine, v: &Cell) -> bool {
    v.node().map(|n| engine.pool.is_managed(n)).unwrap_or(true)
}

/// `rebRelease`: the API's reference to a value is done; frees it if it
/// was never handed to the GC and nothing else rooted it.
pub fn release(engine: &mut Engine, v: &Cell) {
    if let Some(node) = v.node() {
        if !engine.pool.is_managed(node) {
            engine.pool.free_unmanaged(node);
        }
    }
}

/// `rebHandle`: wrap an opaque Rust resource as a `handle!` value.
pub fn handle(engine: &mut Engine, opaque: usize) -> Cell {
    let id = engine.pool.alloc_unmanaged(SeriesData::Handle { opaque });
    engine.pool.manage(id);
    Cell::aggregate(Kind::Handle, id, 0)
}

/// `rebRepossess`: take ownership of a series the embedder built
/// out-of-band (e.g. a binary filled by a C buffer), handing it a normal
/// managed-series identity.
pub fn repossess(engine: &mut Engine, data: Vec<u8>) -> Cell {
    let id = engine.pool.alloc_unmanaged(SeriesData::Binary(data));
    engine.pool.manage(id);
    Cell::aggregate(Kind::Binary, id, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;

    #[test]
    fn value_result_runs_source_fragments() {
        let mut engine = Engine::bootstrap();
        let result = ApiBuilder::new().source("1 + 2").value_result(&mut engine);
        assert_eq!(result, Cell::integer(3));
    }

    #[test]
    fn did_applies_truthiness() {
        let mut engine = Engine::bootstrap();
        assert!(!ApiBuilder::new().source("1 = 2").did(&mut engine));
        assert!(ApiBuilder::new().source("1 = 1").did(&mut engine));
    }
}
