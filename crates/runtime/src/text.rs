//! `text!` construction and extraction helpers shared by `error.rs`,
//! `mold.rs`, and `natives.rs`. Grounded on `series.rs`'s
//! `SeriesData::Utf8String` representation (`spec.md` §3.4).

use crate::engine::Engine;
use crate::series::SeriesData;
use reblang_core::cell::Cell;
use reblang_core::Kind;

/// Allocate a new, fully-owned `text!` value from a Rust string slice.
pub fn new_text(engine: &mut Engine, s: &str) -> Cell {
    let id = engine.pool.alloc_unmanaged(SeriesData::Utf8String {
        bytes: s.as_bytes().to_vec(),
        bookmark: std::cell::Cell::new((0, 0)),
    });
    engine.pool.manage(id);
    Cell::aggregate(Kind::Text, id, 0)
}

/// Read a `text!` (or `file!`/`url!`/...) value's backing bytes as a
/// `&str`, if the cell is an any-string! aggregate.
pub fn as_str<'a>(engine: &'a Engine, cell: &Cell) -> Option<&'a str> {
    let kind = cell.base_kind()?;
    if !kind.is_any_string() {
        return None;
    }
    let reblang_core::cell::Payload::Aggregate { node, .. } = cell.payload() else {
        return None;
    };
    match &engine.pool.get(*node)?.data {
        SeriesData::Utf8String { bytes, .. } => std::str::from_utf8(bytes).ok(),
        _ => None,
    }
}
