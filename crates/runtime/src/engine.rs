//! [`Engine`]: the process-wide interpreter state — the series pool, the
//! action table, the root contexts, and the halt flag (`spec.md` §4.2,
//! §4.6, §9).
//!
//! Grounded on the teacher's top-level `Compiler`/`Runtime` struct
//! (`navicore-cem3` `crates/compiler/src/lib.rs`) for "one struct owns
//! every long-lived table, built once at startup and threaded through by
//! `&mut` reference" — generalized from a compile-then-run pipeline to an
//! always-resident interpreter state, since this core never hands off to
//! a separate execution phase (`spec.md` §1's Non-goals rule out
//! compilation to native code).

use crate::action::{Action, ActionId, NativeFn, ParamClass, ParamFlags, ParamSpec};
use crate::context::Context;
use crate::gc::{self, Roots};
use crate::series::{SeriesData, SeriesPool};
use reblang_core::cell::{Cell, NodeId, SymbolId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct Engine {
    pub pool: SeriesPool,
    pub actions: HashMap<ActionId, Action>,
    next_action: u32,
    /// The root module natives and user top-level definitions bind into
    /// (`spec.md` §4.5's "no bare global table": even the top level is a
    /// context).
    pub lib: Context,
    /// `system`: the conventional home for engine-introspection values
    /// (`spec.md` §4.6's external-API surface reads this, e.g. the
    /// catalog of error categories).
    pub system: Context,
    /// Set by a signal handler or the external API's `rebHalt` equivalent;
    /// checked by the evaluator between steps (`spec.md` §4.3, §9).
    pub halt: Arc<AtomicBool>,
    /// Values temporarily off the cell graph during construction — PARSE's
    /// backtrack stack, MOLD's in-progress buffer references, and the
    /// like. Traced as a GC root (`spec.md` §4.2).
    pub data_stack: Vec<Cell>,
}

impl Engine {
    /// Build an engine with nothing but the two root contexts allocated;
    /// no natives registered. Most callers want [`Engine::bootstrap`].
    fn empty() -> Engine {
        let mut pool = SeriesPool::new();
        let lib = Context::create(&mut pool, false);
        let system = Context::create(&mut pool, false);
        pool.manage(lib.keylist);
        pool.manage(lib.values);
        pool.manage(system.keylist);
        pool.manage(system.values);
        Engine {
            pool,
            actions: HashMap::new(),
            next_action: 0,
            lib,
            system,
            halt: Arc::new(AtomicBool::new(false)),
            data_stack: Vec::new(),
        }
    }

    /// Build an engine with the native set installed (`spec.md` §2's
    /// supplemented natives table) and, when the `signals` feature is
    /// on, Ctrl-C wired to cooperative `HALT` the same way the teacher's
    /// scheduler installs its diagnostics handler at startup.
    pub fn bootstrap() -> Engine {
        let mut engine = Engine::empty();
        crate::natives::install(&mut engine);
        #[cfg(feature = "signals")]
        crate::signals::install(engine.halt.clone());
        engine
    }

    pub fn halt_requested(&self) -> bool {
        self.halt.load(Ordering::Relaxed)
    }

    pub fn request_halt(&self) {
        self.halt.store(true, Ordering::Relaxed);
    }

    pub fn clear_halt(&self) {
        self.halt.store(false, Ordering::Relaxed);
    }

    /// Reconstruct the context a word's binding names, from just the
    /// values-node id stored in `Extra::Binding` (`spec.md` §3.6).
    pub fn context_at(&self, values: NodeId) -> Option<Context> {
        Context::from_values_node(&self.pool, values)
    }

    pub fn paramlist_of(&self, node: NodeId) -> Vec<ParamSpec> {
        match &self.pool.get(node).expect("dangling paramlist reference").data {
            SeriesData::Paramlist(v) => v.clone(),
            _ => panic!("node is not a paramlist"),
        }
    }

    pub(crate) fn alloc_paramlist(&mut self, params: Vec<ParamSpec>) -> NodeId {
        let id = self.pool.alloc_unmanaged(SeriesData::Paramlist(params));
        self.pool.manage(id);
        id
    }

    /// `FUNC`/`METHOD` (`natives.rs`): build an interpreted action from a
    /// parameter list and a body block, with a persistent argument
    /// context carrying one key per parameter (`action::Action::env`).
    pub fn define_interpreted(&mut self, params: Vec<ParamSpec>, body: NodeId, resolve_dynamically: bool) -> ActionId {
        let env = Context::create(&mut self.pool, true);
        for p in &params {
            let _ = env.append(&mut self.pool, p.symbol, Cell::blank());
        }
        self.pool.manage(env.keylist);
        self.pool.manage(env.values);
        let paramlist = self.alloc_paramlist(params);
        let action = Action::interpreted(paramlist, body, resolve_dynamically, env);
        self.register_action(action)
    }

    /// Register a native and bind it into `lib` under `name`
    /// (`spec.md` §2's native-registration path; every built-in in
    /// `natives.rs` goes through this).
    pub fn define_native(&mut self, name: &str, params: Vec<ParamSpec>, f: NativeFn) -> ActionId {
        self.define_native_ex(name, params, f, false, false, false)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn define_native_ex(
        &mut self,
        name: &str,
        params: Vec<ParamSpec>,
        f: NativeFn,
        enfix: bool,
        defer: bool,
        postpone: bool,
    ) -> ActionId {
        let paramlist = self.alloc_paramlist(params);
        let mut action = Action::native(paramlist, f);
        action.enfix = enfix;
        action.defer = defer;
        action.postpone = postpone;
        let id = self.register_action(action);
        let symbol = crate::symbol::intern(name);
        let _ = self.lib.append(&mut self.pool, symbol, crate::action::action_cell(id));
        id
    }

    pub fn register_action(&mut self, action: Action) -> ActionId {
        let id = ActionId(self.next_action);
        self.next_action += 1;
        self.actions.insert(id, action);
        id
    }

    /// Helper for `natives.rs`: a plain, non-refinement, evaluated
    /// (`Normal`) parameter.
    pub fn param(symbol: SymbolId, class: ParamClass) -> ParamSpec {
        ParamSpec { symbol, class, flags: ParamFlags::empty(), typeset: None }
    }

    pub fn refinement(symbol: SymbolId, takes_arg: bool) -> ParamSpec {
        ParamSpec {
            symbol,
            class: ParamClass::Normal,
            flags: ParamFlags::REFINEMENT,
            typeset: if takes_arg { Some(1) } else { None },
        }
    }

    /// Run a full mark-and-sweep collection, rooted at the two top-level
    /// contexts, the data stack, and anything explicitly guarded
    /// (`spec.md` §4.2). `frame_cells` lets a caller pass in the values
    /// of any in-flight frame the collector wouldn't otherwise see (the
    /// console REPL does this between top-level expressions).
    pub fn collect_garbage(&mut self, frame_cells: &[Cell]) -> usize {
        let globals = [self.lib.keylist, self.lib.values, self.system.keylist, self.system.values];
        gc::collect(
            &mut self.pool,
            Roots {
                data_stack: &self.data_stack,
                frame_cells,
                api_handles: &[],
                globals: &globals,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_binds_natives_into_lib() {
        let engine = Engine::bootstrap();
        let plus = crate::symbol::intern("+");
        assert!(engine.lib.lookup(&engine.pool, plus).is_some());
    }
}
