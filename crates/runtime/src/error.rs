//! Error taxonomy, raising, and unwinding (`spec.md` §3.8, §4.3's FAIL
//! path, §7).
//!
//! Grounded on the teacher's `CodeGenError`
//! (`navicore-cem3` `crates/compiler/src/codegen/error.rs`) for "a plain
//! enum implementing `Display`+`Error`, constructed with `?`-friendly
//! `From` impls" — generalized from two variants (logic/format) to the
//! category/id taxonomy `spec.md` §3.8 specifies, because unlike a
//! compiler error a Rebol error must also be reconstructible as a
//! first-class `error!` value the language itself can inspect
//! (`spec.md` §3.8's "errors are ordinary contexts").

use crate::context::Context;
use crate::engine::Engine;
use reblang_core::cell::Cell;
use std::fmt;

/// `spec.md` §3.8's category list, closed here to what the native set in
/// `natives.rs` actually raises; extension code can still construct an
/// arbitrary `error!` object directly without going through this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Math,
    Syntax,
    Script,
    Access,
    User,
    Internal,
}

impl Category {
    fn symbol_name(self) -> &'static str {
        match self {
            Category::Math => "math",
            Category::Syntax => "syntax",
            Category::Script => "script",
            Category::Access => "access",
            Category::User => "user",
            Category::Internal => "internal",
        }
    }
}

/// A raised error, both a Rust-level `Error` for `?`-propagation inside
/// natives and a value the evaluator converts to an `error!` context
/// before unwinding (`spec.md` §3.8).
#[derive(Debug, Clone)]
pub struct RebolError {
    pub category: Category,
    pub id: &'static str,
    pub message: String,
    pub near: Option<String>,
}

impl fmt::Display for RebolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "** {} error: {}", self.category.symbol_name(), self.message)?;
        if let Some(near) = &self.near {
            write!(f, " (near: {near})")?;
        }
        Ok(())
    }
}

impl std::error::Error for RebolError {}

impl RebolError {
    pub fn new(category: Category, id: &'static str, message: impl Into<String>) -> RebolError {
        RebolError { category, id, message: message.into(), near: None }
    }

    pub fn near(mut self, text: impl Into<String>) -> RebolError {
        self.near = Some(text.into());
        self
    }

    pub fn no_value(engine: &Engine, word: &Cell) -> RebolError {
        let name = crate::binding::symbol_of(word)
            .map(crate::symbol::spelling)
            .unwrap_or_else(|| "?".to_string());
        let _ = engine;
        RebolError::new(Category::Script, "no-value", format!("{name} has no value"))
    }

    pub fn no_arg(engine: &Engine) -> RebolError {
        let _ = engine;
        RebolError::new(Category::Script, "expect-arg", "enfix action has no left-hand argument")
    }

    pub fn end_of_input(engine: &Engine) -> RebolError {
        let _ = engine;
        RebolError::new(Category::Syntax, "end-of-input", "unexpected end of input while gathering an argument")
    }

    pub fn zero_divide(engine: &Engine) -> RebolError {
        let _ = engine;
        RebolError::new(Category::Math, "zero-divide", "attempt to divide by zero")
    }

    pub fn out_of_range(engine: &Engine, detail: impl Into<String>) -> RebolError {
        let _ = engine;
        RebolError::new(Category::Script, "out-of-range", detail.into())
    }

    pub fn invalid_arg(engine: &Engine, detail: impl Into<String>) -> RebolError {
        let _ = engine;
        RebolError::new(Category::Script, "invalid-arg", detail.into())
    }

    pub fn user(message: impl Into<String>) -> RebolError {
        RebolError::new(Category::User, "user", message.into())
    }

    pub fn internal(engine: &Engine, detail: impl Into<String>) -> RebolError {
        let _ = engine;
        RebolError::new(Category::Internal, "internal", detail.into())
    }

    /// Materialize this error as an `error!` context (`spec.md` §3.8):
    /// `category`, `id`, `message`, and `near` each become a key, so
    /// `TRAP` and `CATCH` handlers can inspect a caught error the same
    /// way they inspect any other object.
    pub fn into_cell(self, engine: &mut Engine) -> Cell {
        let ctx = Context::create(&mut engine.pool, true);
        let category_sym = crate::symbol::intern("category");
        let id_sym = crate::symbol::intern("id");
        let message_sym = crate::symbol::intern("message");
        let near_sym = crate::symbol::intern("near");
        let _ = ctx.append(
            &mut engine.pool,
            category_sym,
            Cell::word(crate::symbol::intern(self.category.symbol_name())),
        );
        let _ = ctx.append(&mut engine.pool, id_sym, Cell::word(crate::symbol::intern(self.id)));
        let message_text = crate::text::new_text(engine, &self.message);
        let _ = ctx.append(&mut engine.pool, message_sym, message_text);
        if let Some(near) = &self.near {
            let near_text = crate::text::new_text(engine, near);
            let _ = ctx.append(&mut engine.pool, near_sym, near_text);
        }
        engine.pool.manage(ctx.keylist);
        engine.pool.manage(ctx.values);
        Cell::aggregate(reblang_core::Kind::Error, ctx.values, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_renders_category_and_message() {
        let e = RebolError::new(Category::Math, "zero-divide", "attempt to divide by zero");
        assert_eq!(e.to_string(), "** math error: attempt to divide by zero");
    }
}
