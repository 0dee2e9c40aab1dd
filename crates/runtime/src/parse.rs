//! PARSE: a combinator-style matcher over strings/blocks sharing the
//! evaluator's binding and cell model (`spec.md` §4.7).
//!
//! Grounded on `gc.rs`'s and `eval.rs`'s "walk a cursor, backtrack by
//! saving position" shape — `spec.md` §9 calls for exactly that: "PARSE
//! is a recursive matcher; implement rules as a tagged enum plus a
//! generic combine step. Backtracking is by saving input position."

use crate::context::Frame;
use crate::engine::Engine;
use crate::eval::Cursor;
use crate::series::SeriesData;
use crate::text::as_str;
use reblang_core::cell::{Cell, Payload};
use reblang_core::Kind;

/// Where PARSE is reading from. A string! input advances by byte offset
/// (over a UTF-8 boundary); a block! input advances by cell index, reusing
/// [`Cursor`].
enum Subject<'e> {
    Text { bytes: &'e [u8], pos: usize },
    Block(Cursor),
}

/// Run `rules` against `input`. Returns the remainder of the input on
/// success (an empty string/block at end, or however far a partial match
/// consumed), or `None` on failure (`spec.md` §4.7: "Return is the input
/// series on success, null on failure").
pub fn parse(engine: &mut Engine, frame: &mut Frame, input: Cell, rules: Cell) -> Option<Cell> {
    let Payload::Aggregate { node: rules_node, .. } = rules.payload() else {
        return None;
    };
    let rule_cells = match &engine.pool.get(*rules_node)?.data {
        SeriesData::Array(v) => v.clone(),
        _ => return None,
    };

    if let Some(text) = as_str(engine, &input) {
        let bytes = text.as_bytes().to_vec();
        let mut pos = 0usize;
        if run_text_rules(engine, frame, &rule_cells, &bytes, &mut pos) {
            Some(crate::text::new_text(engine, std::str::from_utf8(&bytes[pos..]).unwrap_or("")))
        } else {
            None
        }
    } else if input.base_kind().map(|k| k.is_any_array()).unwrap_or(false) {
        let Payload::Aggregate { node, .. } = input.payload() else { return None };
        let mut cursor = Cursor::new(*node);
        if run_block_rules(engine, frame, &rule_cells, &mut cursor) {
            Some(Cell::aggregate(Kind::Block, *node, cursor.index))
        } else {
            None
        }
    } else {
        None
    }
}

fn rule_text(engine: &Engine, seg: &Cell) -> Option<String> {
    as_str(engine, seg).map(|s| s.to_string())
}

fn run_text_rules(engine: &mut Engine, frame: &mut Frame, rules: &[Cell], bytes: &[u8], pos: &mut usize) -> bool {
    let mut i = 0;
    while i < rules.len() {
        let rule = rules[i];
        let sym = crate::binding::symbol_of(&rule).map(crate::symbol::spelling);
        match sym.as_deref() {
            Some("some") | Some("any") | Some("while") => {
                let min_count = if sym.as_deref() == Some("some") { 1 } else { 0 };
                i += 1;
                let Some(sub) = rules.get(i) else { return false };
                let mut count = 0;
                loop {
                    let saved = *pos;
                    if match_one_text(engine, sub, bytes, pos) {
                        count += 1;
                    } else {
                        *pos = saved;
                        break;
                    }
                }
                if count < min_count {
                    return false;
                }
            }
            Some("end") => {
                return *pos == bytes.len();
            }
            Some("to") | Some("thru") => {
                let thru = sym.as_deref() == Some("thru");
                i += 1;
                let Some(sub) = rules.get(i) else { return false };
                let Some(needle) = rule_text(engine, sub) else { return false };
                let haystack = std::str::from_utf8(&bytes[*pos..]).unwrap_or("");
                match haystack.find(&needle) {
                    Some(off) => *pos += off + if thru { needle.len() } else { 0 },
                    None => return false,
                }
            }
            Some("skip") => {
                if *pos >= bytes.len() {
                    return false;
                }
                *pos += 1;
            }
            Some("not") => {
                i += 1;
                let Some(sub) = rules.get(i) else { return false };
                let saved = *pos;
                let matched = match_one_text(engine, sub, bytes, pos);
                *pos = saved;
                if matched {
                    return false;
                }
            }
            _ => {
                if !match_one_text(engine, &rule, bytes, pos) {
                    return false;
                }
            }
        }
        let _ = frame;
        i += 1;
    }
    true
}

fn match_one_text(engine: &Engine, rule: &Cell, bytes: &[u8], pos: &mut usize) -> bool {
    if let Some(lit) = rule_text(engine, rule) {
        let remaining = std::str::from_utf8(&bytes[*pos..]).unwrap_or("");
        if remaining.starts_with(lit.as_str()) {
            *pos += lit.len();
            return true;
        }
        return false;
    }
    if let Payload::Char(c) = rule.payload() {
        let remaining = std::str::from_utf8(&bytes[*pos..]).unwrap_or("");
        if let Some(first) = remaining.chars().next() {
            if first == *c {
                *pos += first.len_utf8();
                return true;
            }
        }
        return false;
    }
    false
}

fn run_block_rules(engine: &mut Engine, frame: &mut Frame, rules: &[Cell], cursor: &mut Cursor) -> bool {
    let mut i = 0;
    while i < rules.len() {
        let rule = rules[i];
        let sym = crate::binding::symbol_of(&rule).map(crate::symbol::spelling);
        match sym.as_deref() {
            Some("some") | Some("any") | Some("while") => {
                let min_count = if sym.as_deref() == Some("some") { 1 } else { 0 };
                i += 1;
                let Some(sub) = rules.get(i).copied() else { return false };
                let mut count = 0;
                loop {
                    let saved = *cursor;
                    if match_one_block(engine, &sub, cursor) {
                        count += 1;
                    } else {
                        *cursor = saved;
                        break;
                    }
                }
                if count < min_count {
                    return false;
                }
            }
            Some("end") => return cursor.is_end(engine),
            Some("skip") => {
                if cursor.is_end(engine) {
                    return false;
                }
                cursor.advance();
            }
            _ => {
                if !match_one_block(engine, &rule, cursor) {
                    return false;
                }
            }
        }
        let _ = frame;
        i += 1;
    }
    true
}

fn match_one_block(engine: &Engine, rule: &Cell, cursor: &mut Cursor) -> bool {
    let next = cursor.peek(engine);
    if next.is_end() {
        return false;
    }
    if reblang_core::cell::eq_atomic(rule, &next, reblang_core::EqMode::Equivalence) == Some(true) {
        cursor.advance();
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::engine::Engine;

    fn word_rule(text: &str) -> Cell {
        Cell::word(crate::symbol::intern(text))
    }

    #[test]
    fn some_a_some_b_end_matches_aaabbb() {
        let mut engine = Engine::bootstrap();
        let mut frame = Frame::new(Context::create(&mut engine.pool, true), engine.lib.values, None);
        let rule_cells = vec![
            word_rule("some"),
            crate::text::new_text(&mut engine, "a"),
            word_rule("some"),
            crate::text::new_text(&mut engine, "b"),
            word_rule("end"),
        ];
        let rules_node = engine.pool.alloc_unmanaged(SeriesData::Array(rule_cells));
        engine.pool.manage(rules_node);
        let rules = Cell::aggregate(Kind::Block, rules_node, 0);
        let input = crate::text::new_text(&mut engine, "aaabbb");
        let result = parse(&mut engine, &mut frame, input, rules);
        assert!(result.is_some());

        let input2 = crate::text::new_text(&mut engine, "aaabbc");
        let result2 = parse(&mut engine, &mut frame, input2, rules);
        assert!(result2.is_none());
    }
}
