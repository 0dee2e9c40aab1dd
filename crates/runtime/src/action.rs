//! Action (function): paramlist, body, dispatcher, details
//! (`spec.md` §3.7), and the composite-action transformations of that
//! triple (`spec.md` §4.4).
//!
//! Grounded on the teacher's two-entry-point function values
//! (`Value::Closure { fn_ptr, env }`, `Value::Quotation { wrapper,
//! impl_ }` in `navicore-cem3` `crates/runtime/src/value.rs`) for "a
//! function value is a pointer plus captured data" — generalized from raw
//! function pointers (meaningful only when calling into LLVM-compiled
//! code) to a safe `Dispatch` enum, since this core has no native-code
//! calling convention to interoperate with.

use crate::context::{Context, Frame};
use crate::engine::Engine;
use crate::eval::EvalResult;
use bitflags::bitflags;
use reblang_core::cell::{Cell, NodeId};
use reblang_core::Kind;
use std::rc::Rc;

/// How a parameter is gathered from the call site (`spec.md` §3.7, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamClass {
    Normal,
    Tight,
    SoftQuote,
    HardQuote,
    Modal,
    Output,
    Local,
    Return,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ParamFlags: u8 {
        const ENDABLE   = 1 << 0;
        const SKIPPABLE = 1 << 1;
        const VARIADIC  = 1 << 2;
        const HIDDEN    = 1 << 3;
        /// This is a refinement: a named optional parameter that may
        /// itself take further arguments (`spec.md` §3.7).
        const REFINEMENT = 1 << 4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub symbol: reblang_core::cell::SymbolId,
    pub class: ParamClass,
    pub flags: ParamFlags,
    /// `None` means "any type accepted". A real typeset check would index
    /// into a typeset table; the minimal core treats every declared
    /// parameter as untyped except where a native enforces its own checks.
    pub typeset: Option<u64>,
}

impl ParamSpec {
    pub fn is_refinement(&self) -> bool {
        self.flags.contains(ParamFlags::REFINEMENT)
    }
}

/// Opaque handle into the engine's action table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(pub u32);

pub type NativeFn = Rc<dyn Fn(&mut Frame, &mut Engine) -> EvalResult>;

/// `spec.md` §3.7: "Dispatcher is a C function that takes a frame and
/// returns a value or a pseudotype signal." Composite actions wrap an
/// inner action's dispatcher (`spec.md` §4.4).
#[derive(Clone)]
pub enum Dispatch {
    Native(NativeFn),
    /// An interpreted function: `body` is a block node run with the
    /// frame's context bound in.
    Interpreted { body: NodeId },
    Composite(CompositeKind),
}

impl std::fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dispatch::Native(_) => write!(f, "Dispatch::Native(..)"),
            Dispatch::Interpreted { body } => write!(f, "Dispatch::Interpreted({body:?})"),
            Dispatch::Composite(c) => write!(f, "Dispatch::Composite({c:?})"),
        }
    }
}

/// The composite-action family from `spec.md` §4.4, each producing an
/// action whose dispatcher wraps an inner action's dispatcher.
#[derive(Debug, Clone)]
pub enum CompositeKind {
    /// Fills some parameter slots with fixed values; the outer paramlist
    /// hides those slots.
    Specialize { inner: ActionId, fixed: NodeId },
    /// Prepends a prelude block that runs with the frame partially
    /// filled, before the inner dispatcher sees it.
    Adapt { inner: ActionId, prelude: NodeId },
    /// Wraps the inner action in an outer action that receives the fully
    /// built frame and decides whether/how to invoke the inner.
    Enclose { inner: ActionId, outer_body: NodeId },
    /// Adds new parameters without changing behavior; must be further
    /// adapted/enclosed to use them.
    Augment { inner: ActionId, added: NodeId },
    /// Rewrites parameter type declarations without changing behavior.
    /// Type checking is redone against the inner action on entry so a
    /// reskin cannot bypass invariants the inner native assumes
    /// (`spec.md` §4.4).
    Reskin { inner: ActionId, types: NodeId },
    /// Runs each step's action in sequence, piping the output of one into
    /// the input of the next.
    Chain { steps: Vec<ActionId> },
}

#[derive(Debug, Clone)]
pub struct Action {
    pub paramlist: NodeId,
    pub dispatch: Dispatch,
    pub details: Option<NodeId>,
    /// Enfix call convention: consumes its left-hand value
    /// (`spec.md` §4.3).
    pub enfix: bool,
    /// Defer/postpone bits used by the evaluator's lookahead state
    /// machine instead of an operator-precedence table (`spec.md` §4.3).
    pub defer: bool,
    pub postpone: bool,
    /// `METHOD`-declared actions resolve words dynamically against the
    /// calling context's derived chain; `FUNC`-declared ones don't
    /// (`spec.md` §4.5, and the Open Question resolved in DESIGN.md).
    pub resolve_dynamically: bool,
    /// `FUNC`/`METHOD`'s persistent argument context, built once at
    /// definition time with one key per paramlist entry. The evaluator
    /// reuses its values array as every call's frame instead of
    /// allocating a fresh one, since the body's words were bound against
    /// this specific context (see `eval::bind_body_deep`). Natives and
    /// composites don't need one: natives read arguments positionally by
    /// symbol out of a transient frame, and composites delegate to an
    /// inner action that already has its own.
    pub env: Option<Context>,
}

impl Action {
    pub fn native(paramlist: NodeId, f: NativeFn) -> Action {
        Action {
            paramlist,
            dispatch: Dispatch::Native(f),
            details: None,
            enfix: false,
            defer: false,
            postpone: false,
            resolve_dynamically: false,
            env: None,
        }
    }

    pub fn interpreted(paramlist: NodeId, body: NodeId, resolve_dynamically: bool, env: Context) -> Action {
        Action {
            paramlist,
            dispatch: Dispatch::Interpreted { body },
            details: None,
            enfix: false,
            defer: false,
            postpone: false,
            resolve_dynamically,
            env: Some(env),
        }
    }
}

/// An `action!` value referencing `id`. Repurposes the aggregate
/// payload's node slot to hold the id directly rather than a series node:
/// actions live in the engine's action table, not the GC'd series pool,
/// so there is no node to point at.
pub fn action_cell(id: ActionId) -> Cell {
    Cell::aggregate(Kind::Action, NodeId(id.0), 0)
}

/// The action id an `action!` value names, if it is one.
pub fn action_id(cell: &Cell) -> Option<ActionId> {
    if cell.base_kind()? != Kind::Action {
        return None;
    }
    match cell.payload() {
        reblang_core::cell::Payload::Aggregate { node, .. } => Some(ActionId(node.0)),
        _ => None,
    }
}

/// `HIJACK`: atomically swap `target`'s dispatcher and details so every
/// existing reference, specialization, and in-flight frame observes the
/// new behavior (`spec.md` §4.4, §8 scenario 6).
pub fn hijack(engine: &mut Engine, target: ActionId, replacement: ActionId) {
    let new_action = engine.actions.get(&replacement).expect("hijack: unknown replacement").clone();
    if let Some(slot) = engine.actions.get_mut(&target) {
        slot.dispatch = new_action.dispatch;
        slot.details = new_action.details;
        slot.paramlist = new_action.paramlist;
    }
}
