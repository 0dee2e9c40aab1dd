//! `REBOL [Title: ... Type: ... Name: ... Version: ... Needs: [...]]`:
//! the optional leading header block every loadable source carries
//! (`spec.md` §6's "Load format" paragraph).
//!
//! Parsed as an ordinary object literal via the same scanner as the rest
//! of the source, then read with a small schema-free field lookup,
//! matching the teacher's `script.rs` treatment of script metadata as
//! data rather than compiler-internal structure.

use reblang_core::cell::{Cell, Payload};
use reblang_core::Kind;
use reblang_runtime::engine::Engine;
use reblang_runtime::series::SeriesData;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub title: Option<String>,
    /// `Type:` — named `kind` here since `type` is a Rust keyword.
    pub kind: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub needs: Vec<String>,
}

fn array_cells(engine: &Engine, cell: &Cell) -> Option<Vec<Cell>> {
    let Payload::Aggregate { node, .. } = cell.payload() else {
        return None;
    };
    match &engine.pool.get(*node)?.data {
        SeriesData::Array(v) => Some(v.clone()),
        _ => None,
    }
}

fn word_text(engine: &Engine, cell: &Cell) -> Option<String> {
    match cell.payload() {
        Payload::Word(sym) => Some(reblang_runtime::symbol::spelling(*sym)),
        _ => None,
    }
}

fn field_text(engine: &Engine, value: &Cell) -> Option<String> {
    reblang_runtime::text::as_str(engine, value).map(str::to_string).or_else(|| word_text(engine, value))
}

/// If `cells` opens with `REBOL [...]`, parse the block's set-word/value
/// pairs into a [`Header`] and return it along with how many leading
/// cells it consumed (always 2: the `REBOL` word and the block).
/// Otherwise returns `(None, 0)` and the caller treats every cell as body.
pub fn parse(engine: &Engine, cells: &[Cell]) -> (Option<Header>, usize) {
    let Some(first) = cells.first() else {
        return (None, 0);
    };
    if first.base_kind() != Some(Kind::Word) {
        return (None, 0);
    }
    let Some(name) = word_text(engine, first) else {
        return (None, 0);
    };
    if !name.eq_ignore_ascii_case("rebol") {
        return (None, 0);
    }
    let Some(block) = cells.get(1) else {
        return (None, 0);
    };
    if block.base_kind() != Some(Kind::Block) {
        return (None, 0);
    }
    let fields = array_cells(engine, block).unwrap_or_default();

    let mut header = Header::default();
    let mut i = 0;
    while i + 1 < fields.len() {
        let key = match fields[i].base_kind() {
            Some(Kind::SetWord) => word_text(engine, &fields[i]),
            _ => None,
        };
        let value = fields[i + 1];
        i += 2;
        let Some(key) = key else { continue };
        match key.to_lowercase().as_str() {
            "title" => header.title = field_text(engine, &value),
            "type" => header.kind = field_text(engine, &value),
            "name" => header.name = field_text(engine, &value),
            "version" => header.version = field_text(engine, &value),
            "needs" => {
                header.needs = array_cells(engine, &value)
                    .unwrap_or_else(|| vec![value])
                    .iter()
                    .filter_map(|c| field_text(engine, c))
                    .collect();
            }
            _ => {}
        }
    }
    (Some(header), 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reblang_runtime::scanner;

    #[test]
    fn parses_title_and_needs() {
        let mut engine = Engine::bootstrap();
        let cells = scanner::scan(&mut engine, r#"REBOL [Title: "demo" Needs: [util]] 1 + 2"#);
        let (header, consumed) = parse(&engine, &cells);
        let header = header.unwrap();
        assert_eq!(header.title.as_deref(), Some("demo"));
        assert_eq!(header.needs, vec!["util".to_string()]);
        assert_eq!(consumed, 2);
        assert_eq!(cells.len() - consumed, 3);
    }

    #[test]
    fn headerless_source_parses_as_none() {
        let mut engine = Engine::bootstrap();
        let cells = scanner::scan(&mut engine, "1 + 2");
        let (header, consumed) = parse(&engine, &cells);
        assert!(header.is_none());
        assert_eq!(consumed, 0);
    }
}
