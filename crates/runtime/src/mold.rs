//! MOLD/FORM: textual rendering, and the `load(mold(v)) == v` round-trip
//! for reloadable types (`spec.md` §6, §8).
//!
//! Grounded on the teacher's `Display` impls walking a `Value` tree
//! (`navicore-cem3` `crates/runtime/src/value.rs`'s pretty-printer),
//! generalized to two render modes (`mold`'s machine-readable form vs.
//! `form`'s display form) since the teacher's `Value` only ever needed
//! one.

use crate::engine::Engine;
use crate::series::SeriesData;
use crate::text::as_str;
use reblang_core::cell::Payload;
use reblang_core::{Cell, Kind};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Re-loadable: strings are quoted, words are bare, blocks bracketed.
    Mold,
    /// Human display: strings are bare, no load round-trip implied.
    Form,
}

pub fn render(engine: &Engine, value: &Cell, mode: Mode) -> String {
    let mut out = String::new();
    write_value(engine, value, mode, &mut out);
    out
}

fn write_value(engine: &Engine, value: &Cell, mode: Mode, out: &mut String) {
    if let Some(depth) = value.inline_quote_depth() {
        if depth > 0 {
            for _ in 0..depth {
                out.push('\'');
            }
            write_value(engine, &value.dequote_one(), mode, out);
            return;
        }
    }
    if value.is_null() {
        out.push_str("null");
        return;
    }
    if value.is_blank() {
        out.push('_');
        return;
    }
    let Some(kind) = value.base_kind() else {
        out.push_str("~unreadable~");
        return;
    };
    match (kind, value.payload()) {
        (Kind::Integer, Payload::Integer(n)) => {
            let _ = write!(out, "{n}");
        }
        (Kind::Decimal, Payload::Decimal(n)) => {
            let _ = write!(out, "{n}");
        }
        (Kind::Logic, Payload::Logic(b)) => {
            out.push_str(if *b { "true" } else { "false" });
        }
        (Kind::Char, Payload::Char(c)) => {
            if mode == Mode::Mold {
                let _ = write!(out, "#\"{c}\"");
            } else {
                out.push(*c);
            }
        }
        (Kind::Word, Payload::Word(sym)) => out.push_str(&crate::symbol::spelling(*sym)),
        (Kind::SetWord, Payload::Word(sym)) => {
            out.push_str(&crate::symbol::spelling(*sym));
            out.push(':');
        }
        (Kind::GetWord, Payload::Word(sym)) => {
            out.push(':');
            out.push_str(&crate::symbol::spelling(*sym));
        }
        (Kind::Refinement, Payload::Word(sym)) => {
            out.push('/');
            out.push_str(&crate::symbol::spelling(*sym));
        }
        (Kind::Issue, Payload::Word(sym)) => {
            out.push('#');
            out.push_str(&crate::symbol::spelling(*sym));
        }
        (Kind::Money, Payload::Money(cents)) => {
            let _ = write!(out, "${}.{:02}", cents / 100, (cents % 100).abs());
        }
        (Kind::Pair, Payload::Pair(x, y)) => {
            let _ = write!(out, "{x}x{y}");
        }
        (Kind::Time, Payload::Time(nanos)) => {
            let total_secs = nanos.div_euclid(1_000_000_000);
            let h = total_secs / 3600;
            let m = (total_secs % 3600) / 60;
            let s = total_secs % 60;
            let _ = write!(out, "{h}:{m:02}:{s:02}");
        }
        (Kind::Date, Payload::Date { year, month, day, .. }) => {
            let _ = write!(out, "{year}-{month:02}-{day:02}");
        }
        (Kind::File, _) => {
            out.push('%');
            out.push_str(as_str(engine, value).unwrap_or(""));
        }
        (Kind::Binary, Payload::Aggregate { node, .. }) => {
            out.push_str("#{");
            if let Some(SeriesData::Binary(bytes)) = engine.pool.get(*node).map(|n| &n.data) {
                for b in bytes {
                    let _ = write!(out, "{b:02x}");
                }
            }
            out.push('}');
        }
        (k, _) if k.is_any_string() => {
            let text = as_str(engine, value).unwrap_or("");
            if mode == Mode::Mold {
                out.push('"');
                for c in text.chars() {
                    match c {
                        '"' => out.push_str("^\""),
                        '^' => out.push_str("^^"),
                        _ => out.push(c),
                    }
                }
                out.push('"');
            } else {
                out.push_str(text);
            }
        }
        (k, Payload::Aggregate { node, .. }) if k.is_any_array() => {
            let (open, close) = match k {
                Kind::Block => ("[", "]"),
                Kind::Group => ("(", ")"),
                _ => ("[", "]"),
            };
            out.push_str(open);
            if let Some(SeriesData::Array(cells)) = engine.pool.get(*node).map(|n| &n.data) {
                for (i, c) in cells.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    write_value(engine, c, mode, out);
                }
            }
            out.push_str(close);
        }
        _ => {
            let _ = write!(out, "#[{}]", kind.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::series::SeriesData;

    #[test]
    fn molds_integer_and_block() {
        let mut engine = Engine::bootstrap();
        assert_eq!(render(&engine, &Cell::integer(42), Mode::Mold), "42");

        let id = engine.pool.alloc_unmanaged(SeriesData::Array(vec![Cell::integer(1), Cell::integer(2)]));
        engine.pool.manage(id);
        let block = Cell::aggregate(Kind::Block, id, 0);
        assert_eq!(render(&engine, &block, Mode::Mold), "[1 2]");
    }

    #[test]
    fn molds_text_with_quotes_and_forms_without() {
        let mut engine = Engine::bootstrap();
        let t = crate::text::new_text(&mut engine, "hi");
        assert_eq!(render(&engine, &t, Mode::Mold), "\"hi\"");
        assert_eq!(render(&engine, &t, Mode::Form), "hi");
    }
}
