//! Context, key, and variable; frames (`spec.md` §3.6, §4.5).
//!
//! Grounded on the teacher's "fixed shape plus a parallel values array"
//! aggregates — `VariantData { tag, fields }` and `Closure { fn_ptr, env }`
//! in `navicore-cem3` `crates/runtime/src/value.rs` — generalized from
//! Arc-immutable to GC-managed and mutable, since unlike the teacher's
//! functional Variant, Rebol objects are appended to and frames are
//! written through by SET-WORD!.

use crate::binding::{BindingRef, DerivedChain};
use crate::series::{SeriesData, SeriesPool};
use reblang_core::cell::{Cell, NodeId, SymbolId};

/// One entry in a keylist: which symbol, and whether it's hidden from
/// `words-of`/enumeration (local variables and the implicit SELF slot
/// use this, `spec.md` §3.6, §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEntry {
    pub symbol: SymbolId,
    pub hidden: bool,
}

/// An object/module/frame: a keylist plus a values array
/// (`spec.md` §3.6).
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub keylist: NodeId,
    pub values: NodeId,
    pub meta: Option<NodeId>,
    pub selfless: bool,
}

#[derive(Debug)]
pub enum ContextError {
    UnknownKey,
    DuplicateKey,
    Protected,
}

impl Context {
    /// Create an empty context. `selfless` objects skip the implicit
    /// `self` key (`spec.md` §4.5).
    pub fn create(pool: &mut SeriesPool, selfless: bool) -> Context {
        let mut keys = Vec::new();
        if !selfless {
            keys.push(KeyEntry { symbol: crate::symbol::SYM_SELF, hidden: true });
        }
        let keylist = pool.alloc_unmanaged(SeriesData::Keylist(keys));
        let n_values = if selfless { 0 } else { 1 };
        let values = pool.alloc_unmanaged(SeriesData::Array(vec![Cell::blank(); n_values]));
        pool.get_mut(values).unwrap().keylist = Some(keylist);
        Context { keylist, values, meta: None, selfless }
    }

    fn keylist_len(pool: &SeriesPool, keylist: NodeId) -> usize {
        match &pool.get(keylist).unwrap().data {
            SeriesData::Keylist(v) => v.len(),
            _ => unreachable!("context.keylist did not point at a Keylist node"),
        }
    }

    fn find(pool: &SeriesPool, keylist: NodeId, symbol: SymbolId) -> Option<usize> {
        match &pool.get(keylist).unwrap().data {
            SeriesData::Keylist(v) => v.iter().position(|k| k.symbol == symbol),
            _ => unreachable!(),
        }
    }

    pub fn lookup(&self, pool: &SeriesPool, symbol: SymbolId) -> Option<u32> {
        Context::find(pool, self.keylist, symbol).map(|i| i as u32)
    }

    pub fn get(&self, pool: &SeriesPool, index: u32) -> Cell {
        match &pool.get(self.values).unwrap().data {
            SeriesData::Array(v) => v[index as usize],
            _ => unreachable!(),
        }
    }

    /// `spec.md` §3.6's binding invariant: `get(w) == k.values[index]`.
    pub fn get_binding(&self, pool: &SeriesPool, binding: BindingRef) -> Cell {
        debug_assert_eq!(binding.context, self.values_node_for_binding());
        self.get(pool, binding.index)
    }

    fn values_node_for_binding(&self) -> NodeId {
        self.values
    }

    pub fn set(&self, pool: &mut SeriesPool, index: u32, value: Cell) -> Result<(), ContextError> {
        let node = pool.get_mut(self.values).unwrap();
        if node.is_protected() {
            return Err(ContextError::Protected);
        }
        match &mut node.data {
            SeriesData::Array(v) => {
                v[index as usize] = value;
                Ok(())
            }
            _ => unreachable!(),
        }
    }

    /// Append a new key. `spec.md` §4.5: "Append to an object is
    /// permitted only for absent keys; duplicate bindings fail."
    pub fn append(&self, pool: &mut SeriesPool, symbol: SymbolId, value: Cell) -> Result<u32, ContextError> {
        if Context::find(pool, self.keylist, symbol).is_some() {
            return Err(ContextError::DuplicateKey);
        }
        let index = Context::keylist_len(pool, self.keylist) as u32;
        match &mut pool.get_mut(self.keylist).unwrap().data {
            SeriesData::Keylist(v) => v.push(KeyEntry { symbol, hidden: false }),
            _ => unreachable!(),
        }
        match &mut pool.get_mut(self.values).unwrap().data {
            SeriesData::Array(v) => v.push(value),
            _ => unreachable!(),
        }
        Ok(index)
    }

    /// Bind a word cell against this context if it names one of its
    /// keys, returning the rebound word (`spec.md` §3.6, §4.3's WORD!
    /// step).
    pub fn bind_word(&self, pool: &SeriesPool, word: &Cell) -> Option<Cell> {
        let symbol = crate::binding::symbol_of(word)?;
        let index = self.lookup(pool, symbol)?;
        Some(crate::binding::rebind(word, BindingRef { context: self.values, index }))
    }

    /// Reconstruct a `Context` from just its values node, using the
    /// keylist back-reference every values node carries (`spec.md` §3.6).
    /// A word's binding stores only `{ context: values_node, index }`; this
    /// is how the evaluator turns that back into something it can call
    /// `get`/`set`/`append` on without a separate context registry.
    pub fn from_values_node(pool: &SeriesPool, values: NodeId) -> Option<Context> {
        let node = pool.get(values)?;
        let keylist = node.keylist?;
        let selfless = match &pool.get(keylist)?.data {
            SeriesData::Keylist(keys) => {
                !keys.first().map(|k| k.symbol == crate::symbol::SYM_SELF && k.hidden).unwrap_or(false)
            }
            _ => true,
        };
        Some(Context { keylist, values, meta: None, selfless })
    }
}

/// A frame: the activation record of an action call (`spec.md` §3.6,
/// §3.7). Its "keylist" is the callee's current paramlist; its values
/// array is the argument/local slots.
pub struct Frame {
    pub vars: Context,
    /// The paramlist currently in effect. Moves outward as composite
    /// layers (adapt/enclose/...) complete (`spec.md` §3.7, §4.4).
    pub phase: NodeId,
    pub caller: Option<Box<Frame>>,
    pub derived: DerivedChain,
    pub out: Cell,
}

impl Frame {
    pub fn new(vars: Context, phase: NodeId, caller: Option<Box<Frame>>) -> Frame {
        Frame { vars, phase, caller, derived: DerivedChain::empty(), out: Cell::null() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_lookup_then_duplicate_fails() {
        let mut pool = SeriesPool::new();
        let ctx = Context::create(&mut pool, false);
        let sym = crate::symbol::intern("x");
        let idx = ctx.append(&mut pool, sym, Cell::integer(10)).unwrap();
        assert_eq!(ctx.lookup(&pool, sym), Some(idx));
        assert_eq!(ctx.get(&pool, idx), Cell::integer(10));
        assert!(matches!(ctx.append(&mut pool, sym, Cell::integer(20)), Err(ContextError::DuplicateKey)));
    }

    #[test]
    fn selfless_context_has_no_implicit_self() {
        let mut pool = SeriesPool::new();
        let ctx = Context::create(&mut pool, true);
        assert_eq!(ctx.lookup(&pool, crate::symbol::SYM_SELF), None);
    }

    #[test]
    fn binding_invariant_get_matches_values_slot() {
        let mut pool = SeriesPool::new();
        let ctx = Context::create(&mut pool, false);
        let sym = crate::symbol::intern("y");
        let idx = ctx.append(&mut pool, sym, Cell::integer(42)).unwrap();
        let word = ctx.bind_word(&pool, &Cell::word(sym)).unwrap();
        let binding = crate::binding::binding_of(&word).unwrap();
        assert_eq!(ctx.get_binding(&pool, binding), Cell::integer(42));
    }
}
