//! The datatype discriminant.
//!
//! A cell's kind byte packs both "what datatype is this" and "how many
//! times has it been quoted" into a single `u8`. Depths 0..=3 are encoded
//! by adding a multiple of [`QUOTE_SHIFT`] to the base kind id, the same
//! trick `spec.md` §3.3 describes: a quoted word costs exactly as much as
//! a word. A 64-wide block per depth is the largest that still lets four
//! depths (0..=3) coexist in a `u8`; a fifth would overflow, which is
//! exactly why depth 4 and beyond fall back to an allocated `Quoted` node
//! instead of a kind-byte trick (see `reblang-runtime::series::quoted`).

/// Width of one quoting "band" in kind-byte space. Four bands (0..=3) fill
/// a `u8` exactly: `4 * 64 == 256`.
pub const QUOTE_SHIFT: u8 = 64;

/// Highest depth representable by adding multiples of `QUOTE_SHIFT` to the
/// kind byte before it must spill into an allocated node.
pub const MAX_INLINE_QUOTE_DEPTH: u8 = 3;

/// The end-of-array marker. Never a user-observable value; reaching it
/// from a non-variadic source is an end-of-input error (`spec.md` §3.1).
pub const END_KIND: u8 = 0;

/// `null`: the absent value. Distinct from [`Kind::Blank`]. Stored as the
/// highest id in the depth-0 band so it never collides with a real
/// datatype as new kinds are added below it.
pub const NULL_KIND: u8 = QUOTE_SHIFT - 1;

/// Highest real datatype id a [`Kind`] may hold before the reserved
/// internal-signal and null slots begin.
pub const MAX_KIND: u8 = NULL_KIND - 1;

/// Every real datatype the core knows how to carry in a cell.
///
/// This is a representative subset of the "sixty-plus datatypes" `spec.md`
/// §1 describes, not an exhaustive port of Ren-C's type list: it covers
/// every lexer form in §6 and every generic action exercised by §8's
/// concrete scenarios. New kinds slot in below [`MAX_KIND`]; nothing else
/// in the core depends on the exact count.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    // --- atomic: payload lives entirely inline in the cell ---
    Integer = 1,
    Decimal = 2,
    Percent = 3,
    Money = 4,
    Pair = 5,
    Tuple = 6,
    Time = 7,
    Date = 8,
    Char = 9,
    Logic = 10,
    Blank = 11,
    Handle = 12,
    Datatype = 13,
    Typeset = 14,

    // --- any-word!: bindable, atomic payload (symbol id + binding) ---
    Word = 20,
    SetWord = 21,
    GetWord = 22,
    Refinement = 23,
    Issue = 24,

    // --- any-array!: aggregate, payload is a node + index ---
    Block = 30,
    Group = 31,
    Path = 32,
    SetPath = 33,
    GetPath = 34,
    /// `[a b]:`: a multiple-return-value destructuring target
    /// (`spec.md` §8 scenario 4). An any-array! like `Block`, but the
    /// evaluator treats it as a set site rather than a literal.
    SetBlock = 35,

    // --- any-string!: aggregate ---
    Text = 40,
    File = 41,
    Url = 42,
    Email = 43,
    Tag = 44,

    // --- other aggregates ---
    Binary = 48,
    Bitset = 49,
    Map = 50,
    Object = 51,
    Module = 52,
    Error = 53,
    Port = 54,
    Frame = 55,
    Action = 56,
    Varargs = 57,

    /// An escaped quote at depth >= 4 (`spec.md` §3.3): the kind-byte
    /// trick only has room for three in-cell bands, so deeper quoting
    /// allocates a node holding `{ depth, inner: Cell }`.
    Quoted = 58,
}

const _: () = assert!((Kind::Varargs as u8) <= MAX_KIND, "Kind overran the reserved band");

impl Kind {
    /// Construct from a raw depth-0 (unquoted) kind byte, if it names a
    /// real datatype.
    pub fn from_u8(byte: u8) -> Option<Kind> {
        use Kind::*;
        Some(match byte {
            1 => Integer,
            2 => Decimal,
            3 => Percent,
            4 => Money,
            5 => Pair,
            6 => Tuple,
            7 => Time,
            8 => Date,
            9 => Char,
            10 => Logic,
            11 => Blank,
            12 => Handle,
            13 => Datatype,
            14 => Typeset,
            20 => Word,
            21 => SetWord,
            22 => GetWord,
            23 => Refinement,
            24 => Issue,
            30 => Block,
            31 => Group,
            32 => Path,
            33 => SetPath,
            34 => GetPath,
            35 => SetBlock,
            40 => Text,
            41 => File,
            42 => Url,
            43 => Email,
            44 => Tag,
            48 => Binary,
            49 => Bitset,
            50 => Map,
            51 => Object,
            52 => Module,
            53 => Error,
            54 => Port,
            55 => Frame,
            56 => Action,
            57 => Varargs,
            58 => Quoted,
            _ => return None,
        })
    }

    /// Whether this kind's payload is inline (atomic) vs. a node+index
    /// pair (aggregate). Mirrors the split `spec.md` §3.1 draws between
    /// "Atomic kinds" and "Aggregate kinds".
    pub fn is_atomic(self) -> bool {
        matches!(
            self,
            Kind::Integer
                | Kind::Decimal
                | Kind::Percent
                | Kind::Money
                | Kind::Pair
                | Kind::Tuple
                | Kind::Time
                | Kind::Date
                | Kind::Char
                | Kind::Logic
                | Kind::Blank
                | Kind::Handle
                | Kind::Datatype
                | Kind::Typeset
                | Kind::Word
                | Kind::SetWord
                | Kind::GetWord
                | Kind::Refinement
                | Kind::Issue
        )
    }

    /// Any-word! family: bindable words that resolve through a context.
    pub fn is_any_word(self) -> bool {
        matches!(
            self,
            Kind::Word | Kind::SetWord | Kind::GetWord | Kind::Refinement | Kind::Issue
        )
    }

    /// Any-array! family: blocks/groups/paths, sharing the evaluator's
    /// array-walking machinery.
    pub fn is_any_array(self) -> bool {
        matches!(
            self,
            Kind::Block | Kind::Group | Kind::Path | Kind::SetPath | Kind::GetPath | Kind::SetBlock
        )
    }

    /// Any-string! family: UTF-8 backed series with codepoint indexing.
    pub fn is_any_string(self) -> bool {
        matches!(
            self,
            Kind::Text | Kind::File | Kind::Url | Kind::Email | Kind::Tag
        )
    }

    pub fn is_any_path(self) -> bool {
        matches!(self, Kind::Path | Kind::SetPath | Kind::GetPath)
    }

    /// Whether a value of this kind is inert: evaluating it yields itself,
    /// with no lookup or invocation (`spec.md` §4.3 step 2).
    pub fn is_inert(self) -> bool {
        !self.is_any_word()
            && !matches!(self, Kind::Group | Kind::Path | Kind::SetPath | Kind::GetPath | Kind::SetBlock)
    }

    pub fn name(self) -> &'static str {
        use Kind::*;
        match self {
            Integer => "integer!",
            Decimal => "decimal!",
            Percent => "percent!",
            Money => "money!",
            Pair => "pair!",
            Tuple => "tuple!",
            Time => "time!",
            Date => "date!",
            Char => "char!",
            Logic => "logic!",
            Blank => "blank!",
            Handle => "handle!",
            Datatype => "datatype!",
            Typeset => "typeset!",
            Word => "word!",
            SetWord => "set-word!",
            GetWord => "get-word!",
            Refinement => "refinement!",
            Issue => "issue!",
            Block => "block!",
            Group => "group!",
            Path => "path!",
            SetPath => "set-path!",
            GetPath => "get-path!",
            SetBlock => "set-block!",
            Text => "text!",
            File => "file!",
            Url => "url!",
            Email => "email!",
            Tag => "tag!",
            Binary => "binary!",
            Bitset => "bitset!",
            Map => "map!",
            Object => "object!",
            Module => "module!",
            Error => "error!",
            Port => "port!",
            Frame => "frame!",
            Action => "action!",
            Varargs => "varargs!",
            Quoted => "quoted!",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_bands_fit_in_a_byte() {
        assert_eq!(QUOTE_SHIFT as u16 * 4, 256);
        assert!((MAX_KIND as u16) < QUOTE_SHIFT as u16);
    }

    #[test]
    fn round_trips_every_kind() {
        for byte in 0..=255u8 {
            if let Some(k) = Kind::from_u8(byte) {
                assert_eq!(k as u8, byte);
            }
        }
    }

    #[test]
    fn null_kind_is_not_a_real_datatype() {
        assert!(Kind::from_u8(NULL_KIND).is_none());
    }
}
