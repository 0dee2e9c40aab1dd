//! Process-wide symbol interning (`spec.md` §3.5).
//!
//! Grounded on the teacher's lazily-initialized process-wide table idiom
//! (`crates/compiler/src/lib.rs` caches its stdlib via a `static ... :
//! OnceLock<...>`), generalized from a one-shot cache to a growable
//! interner that both built-in and user/extension words share.

use reblang_core::cell::SymbolId;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

macro_rules! builtin_symbols {
    ($($konst:ident => $text:literal),* $(,)?) => {
        builtin_symbols!(@count 0; $($konst => $text,)*);

        const BUILTIN_NAMES: &[&str] = &[$($text),*];
    };
    (@count $n:expr;) => {};
    (@count $n:expr; $konst:ident => $text:literal, $($rest:ident => $rest_text:literal,)*) => {
        pub const $konst: SymbolId = SymbolId($n);
        builtin_symbols!(@count $n + 1; $($rest => $rest_text,)*);
    };
}

// Built-in words get a stable, compile-time-constant id (`spec.md` §3.5:
// "carry a compile-time-constant numeric id for the built-in set").
// Indices are assigned in declaration order starting at 0; user words
// are interned afterward and get ids >= BUILTIN_NAMES.len().
builtin_symbols! {
    SYM_SELF => "self",
    SYM_TRUE => "true",
    SYM_FALSE => "false",
    SYM_NONE => "none",
    SYM_IF => "if",
    SYM_EITHER => "either",
    SYM_CASE => "case",
    SYM_SWITCH => "switch",
    SYM_REDUCE => "reduce",
    SYM_DO => "do",
    SYM_FUNC => "func",
    SYM_FUNCTION => "function",
    SYM_METHOD => "method",
    SYM_PRINT => "print",
    SYM_PROBE => "probe",
    SYM_MOLD => "mold",
    SYM_FORM => "form",
    SYM_PARSE => "parse",
    SYM_CATCH => "catch",
    SYM_THROW => "throw",
    SYM_TRAP => "trap",
    SYM_QUIT => "quit",
    SYM_HALT => "halt",
    SYM_SPECIALIZE => "specialize",
    SYM_ADAPT => "adapt",
    SYM_ENCLOSE => "enclose",
    SYM_AUGMENT => "augment",
    SYM_HIJACK => "hijack",
    SYM_CHAIN => "chain",
    SYM_RESKIN => "reskin",
    SYM_ELIDE => "elide",
    SYM_RETURN => "return",
    SYM_THEN => "then",
    SYM_ELSE => "else",
    SYM_OPT => "opt",
    SYM_QUOTED_Q => "quoted?",
    SYM_UNEVAL => "uneval",
    SYM_DEQUOTE => "dequote",
    SYM_SELECT => "select",
    SYM_TAKE => "take",
    SYM_SET => "set",
    SYM_GET => "get",
    SYM_SCRIPT_CAT => "script",
    SYM_SYNTAX_CAT => "syntax",
    SYM_MATH_CAT => "math",
    SYM_ACCESS_CAT => "access",
    SYM_INTERNAL_CAT => "internal",
    SYM_NO_VALUE => "no-value",
    SYM_EXPECT_ARG => "expect-arg",
    SYM_OUT_OF_RANGE => "out-of-range",
    SYM_BAD_REFINE => "bad-refine",
    SYM_NOT_OPEN => "not-open",
    SYM_NEED_NON_END => "need-non-end",
    SYM_DUPLICATE_KEY => "duplicate-key",
    SYM_END_OF_INPUT => "end-of-input",
    SYM_ZERO_DIVIDE => "zero-divide",
    SYM_INVALID_ARG => "invalid-arg",
}

struct Interner {
    by_text: HashMap<Box<str>, SymbolId>,
    by_id: Vec<Box<str>>,
}

impl Interner {
    fn bootstrap() -> Interner {
        let mut by_text = HashMap::with_capacity(BUILTIN_NAMES.len() * 2);
        let mut by_id = Vec::with_capacity(BUILTIN_NAMES.len() * 2);
        for (i, name) in BUILTIN_NAMES.iter().enumerate() {
            by_text.insert((*name).into(), SymbolId(i as u32));
            by_id.push((*name).into());
        }
        Interner { by_text, by_id }
    }

    fn intern(&mut self, text: &str) -> SymbolId {
        // Case-preserving storage, case-insensitive lookup (spec.md §3.5).
        let casefold = text.to_lowercase();
        if let Some(&id) = self.by_text.get(casefold.as_str()) {
            return id;
        }
        let id = SymbolId(self.by_id.len() as u32);
        self.by_id.push(text.into());
        self.by_text.insert(casefold.into_boxed_str(), id);
        id
    }

    fn text(&self, id: SymbolId) -> &str {
        &self.by_id[id.0 as usize]
    }
}

fn table() -> &'static Mutex<Interner> {
    static TABLE: OnceLock<Mutex<Interner>> = OnceLock::new();
    TABLE.get_or_init(|| Mutex::new(Interner::bootstrap()))
}

/// Intern `text`, returning its canonical id. Repeated interning of the
/// same (case-insensitive) text always returns the same id.
pub fn intern(text: &str) -> SymbolId {
    table().lock().unwrap().intern(text)
}

/// Look up the case-preserving spelling a symbol was first interned with.
pub fn spelling(id: SymbolId) -> String {
    table().lock().unwrap().text(id).to_string()
}

/// Case-insensitive symbol equality. Symbols compare equal iff they were
/// interned to the same id (`spec.md` §3.5), so this is just `==` — kept
/// as a named function so call sites read like the spec's vocabulary.
pub fn symbols_equal(a: SymbolId, b: SymbolId) -> bool {
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_ids_are_stable_across_interns() {
        assert_eq!(intern("if"), SYM_IF);
        assert_eq!(intern("IF"), SYM_IF);
        assert_eq!(intern("If"), SYM_IF);
    }

    #[test]
    fn case_preserving_storage_case_insensitive_lookup() {
        let id = intern("MyWord");
        assert_eq!(spelling(id), "MyWord");
        assert_eq!(intern("myword"), id);
        assert_eq!(intern("MYWORD"), id);
    }

    #[test]
    fn unknown_words_get_fresh_ids_above_the_builtin_range() {
        let id = intern("totally-user-defined-word-xyz");
        assert!(id.0 as usize >= BUILTIN_NAMES.len());
    }
}
