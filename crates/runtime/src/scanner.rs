//! Source scanning: UTF-8 text to a cell array (`spec.md` §6's lexer
//! paragraph). Owned by `reblang-runtime` rather than `reblang-compiler`
//! because producing a bound `WORD!` cell requires the symbol interner
//! and, for any top-level word, the `lib` context — both runtime
//! concerns. `reblang-compiler` layers the `REBOL [header]` / module
//! format on top of this (`spec.md` §6's "Load format" paragraph).
//!
//! Grounded on the teacher's hand-rolled recursive-descent reader
//! (`navicore-cem3` `crates/compiler/src/lib.rs`'s s-expression reader)
//! for "one `Reader` struct walking a `&[char]` with an explicit index,
//! no external parser-generator crate" — generalized from one bracket
//! form (s-expressions) to integers, decimals, pairs, times, dates,
//! money, binary (`#{...}`, `2#{...}`, `64#{...}`), files (`%...`),
//! issues (`#...`), chars, strings, words, set-words, get-words,
//! refinements, paths, and blocks/groups. `spec.md` §6 also names
//! tag/url/email literals; those are not scanned here since their
//! delimiters (`<`, `:`, `@`) collide with this scanner's existing
//! word/set-word/path/compare-operator handling and disentangling them
//! is left for a dedicated lookahead pass (see DESIGN.md).

use crate::engine::Engine;
use crate::series::SeriesData;
use reblang_core::cell::{Cell, Extra, Payload};
use reblang_core::Kind;

struct Scanner<'e> {
    engine: &'e mut Engine,
    chars: Vec<char>,
    pos: usize,
}

/// Scan `text` into a flat sequence of top-level cells (callers wrap the
/// result in a block themselves; this mirrors how `LOAD` returns "a
/// block of values" without assuming one).
pub fn scan(engine: &mut Engine, text: &str) -> Vec<Cell> {
    let mut s = Scanner { engine, chars: text.chars().collect(), pos: 0 };
    s.scan_sequence(None)
}

impl<'e> Scanner<'e> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.pos += 1;
                }
                Some(';') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    /// Scan cells until end-of-input, or until `close` is seen (consumed).
    fn scan_sequence(&mut self, close: Option<char>) -> Vec<Cell> {
        let mut out = Vec::new();
        loop {
            self.skip_ws_and_comments();
            match self.peek() {
                None => break,
                Some(c) if Some(c) == close => {
                    self.pos += 1;
                    break;
                }
                _ => {}
            }
            if let Some(cell) = self.scan_one() {
                out.push(cell);
            } else {
                break;
            }
        }
        out
    }

    fn scan_one(&mut self) -> Option<Cell> {
        let c = self.peek()?;
        match c {
            '[' => {
                self.pos += 1;
                let cells = self.scan_sequence(Some(']'));
                // `[a b]:` immediately followed by `:`, no intervening
                // whitespace: a set-block destructuring target
                // (`spec.md` §8 scenario 4), not a literal block.
                if self.peek() == Some(':') {
                    self.pos += 1;
                    Some(self.alloc_array(Kind::SetBlock, cells))
                } else {
                    Some(self.alloc_array(Kind::Block, cells))
                }
            }
            '(' => {
                self.pos += 1;
                let cells = self.scan_sequence(Some(')'));
                Some(self.alloc_array(Kind::Group, cells))
            }
            '"' => self.scan_string(),
            '\'' => {
                self.pos += 1;
                let inner = self.scan_one()?;
                inner.quote_one().ok().or(Some(inner))
            }
            '#' if self.chars.get(self.pos + 1) == Some(&'"') => self.scan_char_literal(),
            '#' if self.chars.get(self.pos + 1) == Some(&'{') => {
                self.pos += 2;
                self.scan_binary_body(16)
            }
            '#' => {
                self.pos += 1;
                self.scan_issue()
            }
            '$' => self.scan_money(),
            '%' => self.scan_file(),
            ':' => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(Self::is_word_char) {
                    self.pos += 1;
                }
                let word_text: String = self.chars[start..self.pos].iter().collect();
                Some(Cell::get_word(crate::symbol::intern(&word_text)))
            }
            c if c.is_ascii_digit() => {
                if let Some((radix, prefix_len)) = self.radix_binary_prefix() {
                    self.pos += prefix_len;
                    self.scan_binary_body(radix)
                } else {
                    self.scan_number()
                }
            }
            c if c == '-' && self.chars.get(self.pos + 1).is_some_and(|d| d.is_ascii_digit()) => self.scan_number(),
            _ => self.scan_word_like(),
        }
    }

    fn alloc_array(&mut self, kind: Kind, cells: Vec<Cell>) -> Cell {
        let id = self.engine.pool.alloc_unmanaged(SeriesData::Array(cells));
        self.engine.pool.manage(id);
        Cell::aggregate(kind, id, 0)
    }

    fn scan_string(&mut self) -> Option<Cell> {
        self.pos += 1; // opening quote
        let mut s = String::new();
        loop {
            match self.bump()? {
                '"' => break,
                '^' => {
                    let escaped = self.bump()?;
                    s.push(match escaped {
                        '"' => '"',
                        '^' => '^',
                        'n' | 'N' => '\n',
                        't' | 'T' => '\t',
                        other => other,
                    });
                }
                other => s.push(other),
            }
        }
        Some(crate::text::new_text(self.engine, &s))
    }

    fn scan_char_literal(&mut self) -> Option<Cell> {
        self.pos += 2; // `#"`
        let c = self.bump()?;
        if self.peek() == Some('"') {
            self.pos += 1;
        }
        Some(Cell::char(c))
    }

    /// `#word`/`#123`: an `issue!`, atomic like `word!` but carrying its
    /// own symbol rather than resolving through a context.
    fn scan_issue(&mut self) -> Option<Cell> {
        let text = self.scan_bare_word_text().unwrap_or_default();
        Some(Cell::new(Kind::Issue, Extra::None, Payload::Word(crate::symbol::intern(&text))))
    }

    /// `$19.99`/`$-5`: a `money!`, stored in minor units (cents).
    fn scan_money(&mut self) -> Option<Cell> {
        self.pos += 1; // '$'
        let start = self.pos;
        if matches!(self.peek(), Some('-') | Some('+')) {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let mut has_digits = self.pos > start;
        if self.peek() == Some('.') {
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
                has_digits = true;
            }
        }
        if !has_digits {
            return None;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let amount: f64 = text.parse().ok()?;
        Some(Cell::new(Kind::Money, Extra::None, Payload::Money((amount * 100.0).round() as i64)))
    }

    /// `%path/to/file`: a `file!`, backed by the same `Utf8String` series
    /// `text!` uses (`spec.md` §3.4's any-string! family).
    fn scan_file(&mut self) -> Option<Cell> {
        self.pos += 1; // '%'
        let text = self.scan_bare_word_text().unwrap_or_default();
        Some(self.alloc_string_kind(Kind::File, &text))
    }

    fn alloc_string_kind(&mut self, kind: Kind, s: &str) -> Cell {
        let id = self
            .engine
            .pool
            .alloc_unmanaged(SeriesData::Utf8String { bytes: s.as_bytes().to_vec(), bookmark: std::cell::Cell::new((0, 0)) });
        self.engine.pool.manage(id);
        Cell::aggregate(kind, id, 0)
    }

    /// Whether `self.pos` starts a `2#{...}` or `64#{...}` radix-prefixed
    /// binary literal; returns the radix and the prefix length to skip
    /// (digits + `#` + `{`) without consuming anything.
    fn radix_binary_prefix(&self) -> Option<(u32, usize)> {
        let lookahead: String = self.chars[self.pos..].iter().take(4).collect();
        if lookahead.starts_with("2#{") {
            Some((2, 3))
        } else if lookahead.starts_with("64#{") {
            Some((64, 4))
        } else {
            None
        }
    }

    /// Reads a `binary!` body up to (and consuming) the closing `}`,
    /// decoding it per `radix` (16 for `#{...}`, 2 or 64 for the prefixed
    /// forms), and allocates a `binary!` cell from the bytes.
    fn scan_binary_body(&mut self, radix: u32) -> Option<Cell> {
        let mut body = String::new();
        loop {
            match self.bump()? {
                '}' => break,
                c if c.is_whitespace() => {}
                c => body.push(c),
            }
        }
        let bytes = match radix {
            16 => hex::decode(&body).ok()?,
            2 => decode_binary_bits(&body),
            64 => decode_base64(&body)?,
            _ => return None,
        };
        let id = self.engine.pool.alloc_unmanaged(SeriesData::Binary(bytes));
        self.engine.pool.manage(id);
        Some(Cell::aggregate(Kind::Binary, id, 0))
    }

    fn scan_number(&mut self) -> Option<Cell> {
        let start = self.pos;
        if self.peek() == Some('-') || self.peek() == Some('+') {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let mut is_decimal = false;
        if self.peek() == Some('.') && self.chars.get(self.pos + 1).is_some_and(|c| c.is_ascii_digit()) {
            is_decimal = true;
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if !is_decimal {
            if self.peek() == Some('-') && self.chars.get(self.pos + 1).is_some_and(|c| c.is_ascii_digit()) {
                if let Some(cell) = self.try_scan_date(start) {
                    return Some(cell);
                }
            }
            if self.peek() == Some(':') {
                if let Some(cell) = self.try_scan_time(start) {
                    return Some(cell);
                }
            }
        }
        if matches!(self.peek(), Some('x') | Some('X'))
            && self.chars.get(self.pos + 1).is_some_and(|c| c.is_ascii_digit() || *c == '-')
        {
            if let Some(cell) = self.try_scan_pair(start) {
                return Some(cell);
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if is_decimal {
            text.parse::<f64>().ok().map(Cell::decimal)
        } else {
            text.parse::<i64>().ok().map(Cell::integer)
        }
    }

    fn scan_two_digit_field(&mut self) -> Option<u8> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        self.chars[start..self.pos].iter().collect::<String>().parse().ok()
    }

    /// `YYYY-MM-DD`, the digit run already scanned at `[start, self.pos)`
    /// being the year. Restores `self.pos` and returns `None` if the
    /// trailing `-MM-DD` doesn't parse, so the caller falls back to a
    /// plain integer followed by a `-` word.
    fn try_scan_date(&mut self, start: usize) -> Option<Cell> {
        let snapshot = self.pos;
        let year: i16 = self.chars[start..self.pos].iter().collect::<String>().parse().ok()?;
        self.pos += 1; // '-'
        let Some(month) = self.scan_two_digit_field() else {
            self.pos = snapshot;
            return None;
        };
        if self.peek() != Some('-') {
            self.pos = snapshot;
            return None;
        }
        self.pos += 1;
        let Some(day) = self.scan_two_digit_field() else {
            self.pos = snapshot;
            return None;
        };
        Some(Cell::new(Kind::Date, Extra::None, Payload::Date { year, month, day, nanos: None, zone_minutes: None }))
    }

    /// `H:M[:S[.fraction]]`, the digit run already scanned at
    /// `[start, self.pos)` being the hour.
    fn try_scan_time(&mut self, start: usize) -> Option<Cell> {
        let snapshot = self.pos;
        let hour: i64 = self.chars[start..self.pos].iter().collect::<String>().parse().ok()?;
        self.pos += 1; // ':'
        let Some(minute) = self.scan_two_digit_field() else {
            self.pos = snapshot;
            return None;
        };
        let mut second = 0i64;
        let mut nanos_frac = 0i64;
        if self.peek() == Some(':') {
            self.pos += 1;
            let Some(s) = self.scan_two_digit_field() else {
                self.pos = snapshot;
                return None;
            };
            second = s as i64;
            if self.peek() == Some('.') && self.chars.get(self.pos + 1).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
                let frac_start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
                let frac_text: String = self.chars[frac_start..self.pos].iter().collect();
                let digits = frac_text.len().min(9);
                let frac_val: i64 = frac_text.parse().unwrap_or(0);
                nanos_frac = frac_val * 10i64.pow((9 - digits) as u32);
            }
        }
        let nanos = hour * 3_600_000_000_000 + (minute as i64) * 60_000_000_000 + second * 1_000_000_000 + nanos_frac;
        Some(Cell::new(Kind::Time, Extra::None, Payload::Time(nanos)))
    }

    /// `NxM`, the first number already scanned at `[start, self.pos)`.
    fn try_scan_pair(&mut self, start: usize) -> Option<Cell> {
        let snapshot = self.pos;
        let x: f32 = self.chars[start..self.pos].iter().collect::<String>().parse().ok()?;
        self.pos += 1; // 'x' / 'X'
        let y_start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek() == Some('.') && self.chars.get(self.pos + 1).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if self.pos == y_start {
            self.pos = snapshot;
            return None;
        }
        let y: f32 = match self.chars[y_start..self.pos].iter().collect::<String>().parse() {
            Ok(v) => v,
            Err(_) => {
                self.pos = snapshot;
                return None;
            }
        };
        Some(Cell::new(Kind::Pair, Extra::None, Payload::Pair(x, y)))
    }

    fn is_word_char(c: char) -> bool {
        !c.is_whitespace() && !matches!(c, '[' | ']' | '(' | ')' | '"' | ';' | '/' | ':')
    }

    fn scan_bare_word_text(&mut self) -> Option<String> {
        let start = self.pos;
        while self.peek().is_some_and(Self::is_word_char) {
            self.pos += 1;
        }
        if self.pos == start {
            None
        } else {
            Some(self.chars[start..self.pos].iter().collect())
        }
    }

    /// A word not introduced by `/` or `:`; may turn out to be a path's
    /// first segment (`foo/bar`), a set-word (`foo:`), or a plain word.
    fn scan_word_like(&mut self) -> Option<Cell> {
        let leading_refinement = self.peek() == Some('/');
        if leading_refinement {
            self.pos += 1;
        }
        let word_text = self.scan_bare_word_text();
        if word_text.is_none() && !leading_refinement {
            // Unrecognized character; consume it so the scanner makes
            // progress instead of looping forever.
            self.pos += 1;
            return None;
        }
        let word_text = word_text.unwrap_or_default();

        if leading_refinement {
            let sym = crate::symbol::intern(&word_text);
            return Some(Cell::new(Kind::Refinement, Extra::None, Payload::Word(sym)));
        }

        // `foo/bar/baz`: a run of `/segment` continuations with no
        // intervening whitespace builds one PATH! cell instead of
        // separate words (`spec.md` §6's path lexical form).
        if self.peek() == Some('/') {
            let mut segments = vec![Cell::word(crate::symbol::intern(&word_text))];
            while self.peek() == Some('/') {
                self.pos += 1;
                let seg_text = self.scan_bare_word_text().unwrap_or_default();
                segments.push(Cell::word(crate::symbol::intern(&seg_text)));
            }
            let is_set = self.peek() == Some(':');
            if is_set {
                self.pos += 1;
            }
            segments[0] = self.bind_top_level(segments[0]);
            let kind = if is_set { Kind::SetPath } else { Kind::Path };
            return Some(self.alloc_array(kind, segments));
        }

        let is_set = self.peek() == Some(':');
        if is_set {
            self.pos += 1;
        }
        let sym = crate::symbol::intern(&word_text);
        if is_set {
            Some(Cell::set_word(sym))
        } else {
            Some(self.bind_top_level(Cell::word(sym)))
        }
    }

    /// Words scanned at the top level (or inside literal blocks produced
    /// by a script) bind immediately against `lib`, the same way the
    /// teacher's reader resolves symbols against its one global
    /// environment at read time rather than leaving them unbound
    /// (`spec.md` §4.5's "no bare global table"). A word not already a
    /// key of `lib` is declared there on first sight (initialized blank)
    /// instead of staying unbound, since this core has no separate
    /// bind-then-evaluate pass to defer declaration to.
    fn bind_top_level(&mut self, word: Cell) -> Cell {
        if let Some(sym) = crate::binding::symbol_of(&word) {
            if self.engine.lib.lookup(&self.engine.pool, sym).is_none() {
                let _ = self.engine.lib.append(&mut self.engine.pool, sym, Cell::blank());
            }
        }
        self.engine.lib.bind_word(&self.engine.pool, &word).unwrap_or(word)
    }
}

/// `2#{...}`: packs '0'/'1' characters MSB-first into bytes, left-padding
/// (i.e. shifting) a trailing partial byte so a non-multiple-of-8 bit
/// count still decodes deterministically.
fn decode_binary_bits(s: &str) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut acc = 0u8;
    let mut n = 0u8;
    for c in s.chars() {
        let bit = match c {
            '0' => 0,
            '1' => 1,
            _ => continue,
        };
        acc = (acc << 1) | bit;
        n += 1;
        if n == 8 {
            bytes.push(acc);
            acc = 0;
            n = 0;
        }
    }
    if n > 0 {
        acc <<= 8 - n;
        bytes.push(acc);
    }
    bytes
}

/// `64#{...}`: standard-alphabet base64, tolerant of interior whitespace
/// and `=` padding.
fn decode_base64(s: &str) -> Option<Vec<u8>> {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut bytes = Vec::new();
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    for c in s.bytes() {
        if c == b'=' || c.is_ascii_whitespace() {
            continue;
        }
        let val = ALPHABET.iter().position(|&b| b == c)? as u32;
        acc = (acc << 6) | val;
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            bytes.push(((acc >> bits) & 0xFF) as u8);
        }
    }
    Some(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;

    #[test]
    fn scans_arithmetic_expression() {
        let mut engine = Engine::bootstrap();
        let cells = scan(&mut engine, "1 + 2 * 3");
        assert_eq!(cells.len(), 5);
        assert_eq!(cells[0], Cell::integer(1));
        assert_eq!(cells[2], Cell::integer(2));
    }

    #[test]
    fn scans_nested_block() {
        let mut engine = Engine::bootstrap();
        let cells = scan(&mut engine, "[1 [2 3]]");
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].base_kind(), Some(Kind::Block));
    }

    #[test]
    fn scans_string_with_caret_escape() {
        let mut engine = Engine::bootstrap();
        let cells = scan(&mut engine, "\"a^\"b\"");
        assert_eq!(crate::text::as_str(&engine, &cells[0]), Some("a\"b"));
    }

    #[test]
    fn scans_pair_time_date_money_and_issue() {
        let mut engine = Engine::bootstrap();
        let cells = scan(&mut engine, "10x20 12:30:05 2024-01-15 $19.99 #foo");
        assert_eq!(cells[0], Cell::new(Kind::Pair, Extra::None, Payload::Pair(10.0, 20.0)));
        assert_eq!(
            cells[1],
            Cell::new(Kind::Time, Extra::None, Payload::Time(12 * 3_600_000_000_000 + 30 * 60_000_000_000 + 5_000_000_000))
        );
        assert_eq!(
            cells[2],
            Cell::new(Kind::Date, Extra::None, Payload::Date { year: 2024, month: 1, day: 15, nanos: None, zone_minutes: None })
        );
        assert_eq!(cells[3], Cell::new(Kind::Money, Extra::None, Payload::Money(1999)));
        assert_eq!(cells[4].base_kind(), Some(Kind::Issue));
    }

    #[test]
    fn scans_binary_literal_forms() {
        let mut engine = Engine::bootstrap();
        let cells = scan(&mut engine, "#{68656C6C6F} 2#{01000001} 64#{aGk=}");
        for cell in &cells {
            assert_eq!(cell.base_kind(), Some(Kind::Binary));
        }
        let SeriesData::Binary(bytes) = &engine.pool.get(extract_node(&cells[0])).unwrap().data else { panic!() };
        assert_eq!(bytes, b"hello");
        let SeriesData::Binary(bytes) = &engine.pool.get(extract_node(&cells[1])).unwrap().data else { panic!() };
        assert_eq!(bytes, &[0x41]);
        let SeriesData::Binary(bytes) = &engine.pool.get(extract_node(&cells[2])).unwrap().data else { panic!() };
        assert_eq!(bytes, b"hi");
    }

    fn extract_node(cell: &Cell) -> reblang_core::cell::NodeId {
        match cell.payload() {
            Payload::Aggregate { node, .. } => *node,
            _ => panic!("expected aggregate"),
        }
    }

    #[test]
    fn scans_file_literal() {
        let mut engine = Engine::bootstrap();
        let cells = scan(&mut engine, "%script.reb");
        assert_eq!(cells[0].base_kind(), Some(Kind::File));
        assert_eq!(crate::text::as_str(&engine, &cells[0]), Some("script.reb"));
    }
}
