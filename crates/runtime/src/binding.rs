//! Binding: the relation between an `ANY-WORD!` and a variable slot
//! (`spec.md` §3.6, §4.5).

use reblang_core::cell::{Cell, Extra, NodeId, Payload, SymbolId};

/// `{ context, index }`, re-exported at the crate boundary so callers
/// don't have to reach into `reblang_core::cell::Extra` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingRef {
    pub context: NodeId,
    pub index: u32,
}

/// Read a word cell's binding, if it has one.
pub fn binding_of(word: &Cell) -> Option<BindingRef> {
    match word.extra() {
        Extra::Binding { context, index } => Some(BindingRef { context: *context, index: *index }),
        _ => None,
    }
}

/// Rebind a word cell to a new slot. `spec.md` §3.6: "Rebinding does not
/// mutate the word in place; it returns a new cell with the binding
/// replaced (words are value-semantic w.r.t. binding)." The `&Cell`
/// parameter enforces the "does not mutate in place" half at the type
/// level: callers can't get a `&mut Cell` out of this and must take the
/// returned value instead.
pub fn rebind(word: &Cell, to: BindingRef) -> Cell {
    let mut out = *word;
    *out.extra_mut() = Extra::Binding { context: to.context, index: to.index };
    out
}

/// The symbol a word cell names, regardless of its binding state.
pub fn symbol_of(word: &Cell) -> Option<SymbolId> {
    match word.payload() {
        Payload::Word(sym) => Some(*sym),
        _ => None,
    }
}

/// Derived binding (`spec.md` §4.5): a small outward search chain of
/// contexts consulted when a method body's words resolve through a
/// derived object rather than the context the method was defined in.
/// Opt-in per function: `METHOD` builds a frame carrying a non-empty
/// chain; `FUNC` always runs with an empty one (see DESIGN.md's
/// resolution of the corresponding Open Question in `spec.md` §9).
#[derive(Debug, Clone, Default)]
pub struct DerivedChain(pub Vec<NodeId>);

impl DerivedChain {
    pub fn empty() -> DerivedChain {
        DerivedChain(Vec::new())
    }

    pub fn push_outer(&mut self, ctx: NodeId) {
        self.0.push(ctx);
    }
}
