//! The evaluator: the DO loop and its variants (`spec.md` §4.3).
//!
//! Grounded on the teacher's explicit, exhaustively-matched per-step
//! state (`navicore-cem3` `crates/compiler/src/codegen/state.rs`,
//! `codegen/inline/dispatch.rs`) for "one step function, one big `match`
//! over a discriminant, no hidden control flow" — generalized from
//! bytecode dispatch over a fixed instruction set to tree-walking
//! dispatch over cells, because this core has no code generation stage
//! to have already lowered control flow into (`spec.md` §1's Non-goals).

use crate::action::{Action, ActionId, CompositeKind, Dispatch, ParamClass, ParamFlags};
use crate::binding::{self, BindingRef};
use crate::context::{Context, Frame};
use crate::engine::Engine;
use crate::series::SeriesData;
use reblang_core::cell::{Cell, Extra, NodeId, Payload, SymbolId};
use reblang_core::Kind;

/// `spec.md` §4.3's "Output conventions" paragraph, verbatim as a Rust
/// enum: every dispatcher returns exactly one of these.
#[derive(Debug, Clone)]
pub enum EvalResult {
    Value(Cell),
    Null,
    /// "I did not contribute to the expression" (`spec.md` §3.2, §4.3).
    Invisible,
    /// Non-local exit. `label` distinguishes a raised error (the reserved
    /// `FAIL` label) from a user `THROW`/`CATCH` label (`spec.md` §3.8,
    /// §7).
    Thrown { label: Cell, value: Cell },
    /// Re-dispatch after the dispatcher rewrote the frame (used by
    /// `ADAPT`'s prelude and by `HIJACK`ed natives that need another
    /// pass).
    Redo,
    /// The output cell is itself an indirection: "the result lives in the
    /// containing aggregate at this slot" (`spec.md` §4.3, §4.6).
    Reference(BindingRef),
}

impl EvalResult {
    pub fn is_thrown(&self) -> bool {
        matches!(self, EvalResult::Thrown { .. })
    }

    /// Collapse to a plain value for contexts that can't observe
    /// invisibility/null distinctions (e.g. MOLD's input).
    pub fn into_cell(self) -> Cell {
        match self {
            EvalResult::Value(c) => c,
            EvalResult::Null | EvalResult::Invisible => Cell::null(),
            EvalResult::Thrown { value, .. } => value,
            EvalResult::Redo => Cell::null(),
            EvalResult::Reference(_) => Cell::null(),
        }
    }
}

/// A cursor over a cell array, the unit the evaluator and PARSE both walk
/// (`spec.md` §4.3, §4.7 share this model deliberately).
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    pub array: NodeId,
    pub index: u32,
}

impl Cursor {
    pub fn new(array: NodeId) -> Cursor {
        Cursor { array, index: 0 }
    }

    fn cells<'a>(&self, engine: &'a Engine) -> &'a [Cell] {
        match &engine.pool.get(self.array).expect("cursor into freed array").data {
            SeriesData::Array(v) => v,
            _ => panic!("cursor is not over an array series"),
        }
    }

    pub fn peek(&self, engine: &Engine) -> Cell {
        self.cells(engine).get(self.index as usize).copied().unwrap_or_else(Cell::end)
    }

    pub fn peek_at(&self, engine: &Engine, offset: i32) -> Cell {
        let idx = self.index as i64 + offset as i64;
        if idx < 0 {
            return Cell::end();
        }
        self.cells(engine).get(idx as usize).copied().unwrap_or_else(Cell::end)
    }

    pub fn advance(&mut self) -> Cell {
        self.index += 1;
        Cell::end()
    }

    pub fn is_end(&self, engine: &Engine) -> bool {
        self.peek(engine).is_end()
    }
}

/// Raised error label reserved for `FAIL`, distinguishing it from a user
/// `THROW` whose label is an arbitrary word/function (`spec.md` §3.8).
pub fn fail_label() -> Cell {
    Cell::word(crate::symbol::intern("%%fail%%"))
}

/// Thrown label `QUIT`/`HALT` use to unwind all the way to the console
/// loop (`spec.md` §6's exit-code contract), distinct from [`fail_label`]
/// so a `CATCH` without a matching name doesn't accidentally swallow a
/// process exit.
pub fn quit_label() -> Cell {
    Cell::word(crate::symbol::intern("%%quit%%"))
}

pub fn fail(err: crate::error::RebolError, engine: &mut Engine) -> EvalResult {
    let value = err.into_cell(engine);
    EvalResult::Thrown { label: fail_label(), value }
}

/// Run a block to completion, returning its last value
/// (`spec.md` §4.3 step 1: "output is whatever was last produced").
pub fn do_block(engine: &mut Engine, frame: &mut Frame, array: NodeId) -> EvalResult {
    let mut cursor = Cursor::new(array);
    let mut last = EvalResult::Null;
    loop {
        if cursor.is_end(engine) {
            return last;
        }
        let result = step(engine, frame, &mut cursor);
        if result.is_thrown() {
            return result;
        }
        if !matches!(result, EvalResult::Invisible) {
            last = result;
        }
    }
}

/// One step of the DO loop (`spec.md` §4.3's numbered per-step
/// algorithm). Advances `cursor` past everything it consumed (the
/// primary expression plus any enfix operators applied to it).
pub fn step(engine: &mut Engine, frame: &mut Frame, cursor: &mut Cursor) -> EvalResult {
    let cell = cursor.peek(engine);
    if cell.is_end() {
        return EvalResult::Null;
    }

    let mut primary = classify_and_run(engine, frame, cursor, cell);
    if primary.is_thrown() {
        return primary;
    }

    // Enfix lookahead: "if the next cell is a word bound to an enfixed
    // action, invoke that action with the primary value supplied as its
    // left-hand argument. Repeat until no enfix or a lower-precedence-
    // deferring enfix is seen." (spec.md §4.3)
    loop {
        let lookahead = cursor.peek(engine);
        let Some((action_id, action)) = resolve_enfix_action(engine, frame, lookahead) else {
            break;
        };
        if action.postpone {
            // Postponed enfix runs only after the enclosing expression
            // completes; this step is not the enclosing expression unless
            // the caller is top-level DO, so we stop consuming here and
            // let the caller's own lookahead (if any) pick it up.
            break;
        }
        cursor.advance(); // consume the enfix word
        let left = primary.into_cell();
        primary = invoke_enfix(engine, frame, cursor, action_id, &action, left);
        if primary.is_thrown() {
            return primary;
        }
        if !action.defer {
            continue;
        }
        // `defer` hands the left-hand value onward only if the *next*
        // token is itself a normal-arity enfix wanting it; otherwise
        // behave like a normal (non-deferring) enfix call, which the loop
        // above already did by invoking it, so we simply continue the
        // lookahead loop as usual.
    }
    primary
}

fn classify_and_run(engine: &mut Engine, frame: &mut Frame, cursor: &mut Cursor, cell: Cell) -> EvalResult {
    let depth = cell.inline_quote_depth().unwrap_or(0);
    if depth > 0 {
        // "lit-word (quoted word): output the dequoted word." Generalized
        // in this core to "any quoted value evaluates to itself one level
        // less quoted", matching §3.3's "quoted?/dequote" contract; the
        // evaluator never auto-reduces quote depth further than one step
        // per visit, so `''x` evaluates to `'x`, not `x`.
        cursor.advance();
        return EvalResult::Value(cell.dequote_one());
    }

    let Some(kind) = cell.base_kind() else {
        cursor.advance();
        return EvalResult::Value(cell);
    };

    match kind {
        Kind::Word => eval_word(engine, frame, cursor, cell),
        Kind::SetWord => eval_set_word(engine, frame, cursor, cell),
        Kind::GetWord => {
            cursor.advance();
            match lookup_word(engine, frame, &cell) {
                Some(v) => EvalResult::Value(v),
                None => fail(crate::error::RebolError::no_value(engine, &cell), engine),
            }
        }
        Kind::Group => {
            cursor.advance();
            let inner = match cell.payload() {
                Payload::Aggregate { node, .. } => *node,
                _ => unreachable!(),
            };
            do_block(engine, frame, inner)
        }
        Kind::Path | Kind::GetPath => {
            cursor.advance();
            crate::paths::eval_path(engine, frame, cursor, &cell, kind == Kind::GetPath)
        }
        Kind::SetPath => eval_set_path(engine, frame, cursor, cell),
        Kind::SetBlock => eval_set_block(engine, frame, cursor, cell),
        _ => {
            // Inert kind: "output is the cell" (spec.md §4.3 step 2).
            cursor.advance();
            EvalResult::Value(cell)
        }
    }
}

fn lookup_word(engine: &Engine, frame: &Frame, word: &Cell) -> Option<Cell> {
    let binding = binding::binding_of(word)?;
    let ctx = engine.context_at(binding.context)?;
    Some(ctx.get(&engine.pool, binding.index))
}

fn eval_word(engine: &mut Engine, frame: &mut Frame, cursor: &mut Cursor, cell: Cell) -> EvalResult {
    cursor.advance();
    let Some(value) = lookup_word(engine, frame, &cell) else {
        return fail(crate::error::RebolError::no_value(engine, &cell), engine);
    };
    if let Some((id, action)) = as_action(engine, &value) {
        if action.enfix {
            // "If the value is an enfixed action with end-of-array on its
            // left, error 'no arg'." (spec.md §4.3)
            return fail(crate::error::RebolError::no_arg(engine), engine);
        }
        return call_action(engine, frame, cursor, id, &action, &[]);
    }
    EvalResult::Value(value)
}

fn eval_set_word(engine: &mut Engine, frame: &mut Frame, cursor: &mut Cursor, cell: Cell) -> EvalResult {
    cursor.advance();
    let rhs = step(engine, frame, cursor);
    if rhs.is_thrown() {
        return rhs;
    }
    let value = rhs.into_cell();
    let Some(binding) = binding::binding_of(&cell) else {
        return fail(crate::error::RebolError::no_value(engine, &cell), engine);
    };
    store(engine, binding, value);
    EvalResult::Value(value)
}

fn eval_set_path(engine: &mut Engine, frame: &mut Frame, cursor: &mut Cursor, cell: Cell) -> EvalResult {
    cursor.advance();
    let rhs = step(engine, frame, cursor);
    if rhs.is_thrown() {
        return rhs;
    }
    let value = rhs.into_cell();
    crate::paths::set_path(engine, frame, &cell, value)
}

/// `[a b]: ...`: multiple-return-value destructuring (`spec.md` §8
/// scenario 4). Evaluates one expression per target, left to right; once
/// the source runs out, the last value produced broadcasts to every
/// remaining target (`[a b]: <thing>` sets both `a` and `b` to `<thing>`,
/// while `[a b]: 10 20` sets them independently). This is the resolution
/// this core picked for the Open Question on SET-BLOCK!/`<output>`
/// interaction — see DESIGN.md.
fn eval_set_block(engine: &mut Engine, frame: &mut Frame, cursor: &mut Cursor, cell: Cell) -> EvalResult {
    cursor.advance();
    let Payload::Aggregate { node, .. } = cell.payload() else {
        return fail(crate::error::RebolError::invalid_arg(engine, "set-block target is not an array"), engine);
    };
    let targets = match &engine.pool.get(*node).expect("dangling set-block target").data {
        SeriesData::Array(v) => v.clone(),
        _ => return fail(crate::error::RebolError::invalid_arg(engine, "set-block target is not an array"), engine),
    };
    let mut last = Cell::null();
    for target in &targets {
        let value = if cursor.is_end(engine) {
            last
        } else {
            let r = step(engine, frame, cursor);
            if r.is_thrown() {
                return r;
            }
            r.into_cell()
        };
        last = value;
        if let Some(binding) = binding::binding_of(target) {
            store(engine, binding, value);
        }
    }
    EvalResult::Value(last)
}

fn store(engine: &mut Engine, binding: BindingRef, value: Cell) {
    if let Some(ctx) = engine.context_at(binding.context) {
        let _ = ctx.set(&mut engine.pool, binding.index, value);
    }
}

fn as_action(engine: &Engine, value: &Cell) -> Option<(ActionId, Action)> {
    let id = crate::action::action_id(value)?;
    engine.actions.get(&id).cloned().map(|a| (id, a))
}

fn resolve_enfix_action(engine: &Engine, frame: &Frame, cell: Cell) -> Option<(ActionId, Action)> {
    if cell.is_end() || cell.base_kind()? != Kind::Word {
        return None;
    }
    let value = lookup_word(engine, frame, &cell)?;
    let (id, action) = as_action(engine, &value)?;
    if action.enfix { Some((id, action)) } else { None }
}

fn invoke_enfix(
    engine: &mut Engine,
    frame: &mut Frame,
    cursor: &mut Cursor,
    id: ActionId,
    action: &Action,
    left: Cell,
) -> EvalResult {
    call_action_with_left(engine, frame, cursor, id, action, Some(left), &[])
}

fn call_action(
    engine: &mut Engine,
    frame: &mut Frame,
    cursor: &mut Cursor,
    id: ActionId,
    action: &Action,
    refinements: &[SymbolId],
) -> EvalResult {
    call_action_with_left(engine, frame, cursor, id, action, None, refinements)
}

/// Argument gathering, one arm per [`ParamClass`] (`spec.md` §4.3's
/// bulleted list), then dispatch. `refinements` names the path-segment
/// refinements requested at the call site (`path/to/refine arg`,
/// `spec.md` §8 scenario 3); a plain word call passes an empty slice.
pub(crate) fn call_action_with_left(
    engine: &mut Engine,
    frame: &mut Frame,
    cursor: &mut Cursor,
    id: ActionId,
    action: &Action,
    left: Option<Cell>,
    refinements: &[SymbolId],
) -> EvalResult {
    let params = engine.paramlist_of(action.paramlist);
    // Interpreted actions reuse their persistent argument context (so the
    // body, bound to it once per call in `dispatch`, sees these slots);
    // natives and composites get a fresh transient one. `put` treats both
    // uniformly: a key already present (the persistent case) is set, a
    // new one (the transient case) is appended.
    let new_ctx = action.env.unwrap_or_else(|| Context::create(&mut engine.pool, true));
    fn put(engine: &mut Engine, ctx: &Context, symbol: SymbolId, value: Cell) {
        match ctx.lookup(&engine.pool, symbol) {
            Some(idx) => {
                let _ = ctx.set(&mut engine.pool, idx, value);
            }
            None => {
                let _ = ctx.append(&mut engine.pool, symbol, value);
            }
        }
    }
    let mut left = left;
    let mut requested: Vec<SymbolId> = refinements.to_vec();

    for p in params.iter() {
        if p.is_refinement() {
            continue; // gathered in the reordering pass below
        }
        if p.flags.contains(ParamFlags::HIDDEN) || p.class == ParamClass::Local {
            put(engine, &new_ctx, p.symbol, Cell::blank());
            continue;
        }
        let value = if let Some(l) = left.take() {
            l
        } else {
            match gather_argument(engine, frame, cursor, p) {
                Ok(v) => v,
                Err(result) => return result,
            }
        };
        put(engine, &new_ctx, p.symbol, value);
    }

    // Refinement reordering (`spec.md` §4.3, §8 scenario 3): a refinement
    // is filled by a preceding path step (`foo/bar`), named positionally
    // at the call site but filled here in declaration order regardless of
    // the order the path named them in.
    for p in params.iter().filter(|p| p.is_refinement()) {
        match requested.iter().position(|s| *s == p.symbol) {
            Some(pos) => {
                requested.remove(pos);
                // A used refinement's slot holds the refinement word itself
                // (`/y`), not `true` — `:y` inside the body must mold as
                // `/y` (`spec.md` §8 scenario 3), and only an absent
                // refinement is `false`.
                put(engine, &new_ctx, p.symbol, Cell::new(Kind::Refinement, Extra::None, Payload::Word(p.symbol)));
            }
            None => {
                put(engine, &new_ctx, p.symbol, Cell::logic(false));
            }
        }
    }
    for p in params.iter().filter(|p| p.is_refinement()) {
        // Any arguments declared immediately after a refinement belong to
        // it; represented here by a `typeset` marker of `1` meaning
        // "takes one argument" for simplicity (a full implementation
        // would nest a sub-paramlist per refinement).
        if p.typeset == Some(1) {
            let present = new_ctx
                .lookup(&engine.pool, p.symbol)
                .map(|idx| new_ctx.get(&engine.pool, idx))
                .map(|c| c.base_kind() == Some(Kind::Refinement))
                .unwrap_or(false);
            if present {
                match gather_argument(engine, frame, cursor, p) {
                    Ok(v) => put(engine, &new_ctx, p.symbol, v),
                    Err(result) => return result,
                }
            }
        }
    }
    let phase = action.paramlist;
    let mut callee_frame = Frame::new(new_ctx, phase, None);
    if action.resolve_dynamically {
        callee_frame.derived = frame.derived.clone();
    }
    dispatch(engine, &mut callee_frame, id, action)
}

fn gather_argument(
    engine: &mut Engine,
    frame: &mut Frame,
    cursor: &mut Cursor,
    param: &crate::action::ParamSpec,
) -> Result<Cell, EvalResult> {
    use ParamClass::*;
    match param.class {
        Normal | Output | Return => {
            let r = step(engine, frame, cursor);
            if r.is_thrown() {
                return Err(r);
            }
            Ok(r.into_cell())
        }
        Tight => {
            // Tight arguments evaluate one expression but never let a
            // trailing enfix word steal it first; modeled here by
            // classifying+running just the next cell without the enfix
            // lookahead loop `step` performs.
            let cell = cursor.peek(engine);
            if cell.is_end() {
                return Err(fail(crate::error::RebolError::end_of_input(engine), engine));
            }
            let r = classify_and_run(engine, frame, cursor, cell);
            if r.is_thrown() {
                return Err(r);
            }
            Ok(r.into_cell())
        }
        HardQuote => {
            let cell = cursor.peek(engine);
            if cell.is_end() {
                return Err(fail(crate::error::RebolError::end_of_input(engine), engine));
            }
            cursor.advance();
            Ok(cell)
        }
        SoftQuote => {
            let cell = cursor.peek(engine);
            if cell.is_end() {
                return Err(fail(crate::error::RebolError::end_of_input(engine), engine));
            }
            let needs_eval = matches!(cell.base_kind(), Some(Kind::Group) | Some(Kind::GetWord) | Some(Kind::GetPath));
            if needs_eval {
                let r = step(engine, frame, cursor);
                if r.is_thrown() {
                    return Err(r);
                }
                Ok(r.into_cell())
            } else {
                cursor.advance();
                Ok(cell)
            }
        }
        Modal => {
            // `@value`: hard-quote if preceded by `@`, else normal. The
            // scanner encodes a modal-marked argument as an issue! cell
            // whose payload names the marked word; anything else falls
            // through to normal evaluation.
            let cell = cursor.peek(engine);
            if cell.base_kind() == Some(Kind::Issue) {
                cursor.advance();
                Ok(cell)
            } else {
                let r = step(engine, frame, cursor);
                if r.is_thrown() {
                    return Err(r);
                }
                Ok(r.into_cell())
            }
        }
        Local => Ok(Cell::blank()),
    }
    .or_else(|e| {
        if param.flags.contains(ParamFlags::SKIPPABLE) {
            Ok(Cell::null())
        } else if param.flags.contains(ParamFlags::ENDABLE) && cursor.is_end(engine) {
            Ok(Cell::null())
        } else {
            Err(e)
        }
    })
}

/// Run a dispatcher, following composite wrappers outward
/// (`spec.md` §3.7, §4.4): the frame's `phase` pointer moves to the next
/// layer as each completes.
fn dispatch(engine: &mut Engine, frame: &mut Frame, id: ActionId, action: &Action) -> EvalResult {
    match &action.dispatch {
        Dispatch::Native(f) => f.clone()(frame, engine),
        Dispatch::Interpreted { body } => {
            // `FUNC`/`METHOD` don't pre-bind their body at definition time:
            // each call gets a fresh argument context (a new keylist/values
            // pair, per the gathering loop above), so the body's words are
            // rebound against it here instead (`spec.md` §4.5). This is not
            // reentrant: a recursive or concurrent call of the same action
            // would stomp on the rebinding made by an outer, still-running
            // call, since both mutate the same shared body cells in place.
            let vars = frame.vars;
            bind_body_deep(engine, &vars, *body);
            do_block(engine, frame, *body)
        }
        Dispatch::Composite(kind) => dispatch_composite(engine, frame, id, kind.clone()),
    }
}

/// Rebind every word in `node` (recursing into nested blocks/groups/paths)
/// that names one of `ctx`'s keys, so a function body's parameter and local
/// references resolve against this call's argument context.
fn bind_body_deep(engine: &mut Engine, ctx: &Context, node: NodeId) {
    let len = match &engine.pool.get(node) {
        Some(n) => match &n.data {
            SeriesData::Array(v) => v.len(),
            _ => return,
        },
        None => return,
    };
    for i in 0..len {
        let cell = match &engine.pool.get(node).unwrap().data {
            SeriesData::Array(v) => v[i],
            _ => return,
        };
        let Some(kind) = cell.base_kind() else { continue };
        if matches!(kind, Kind::Word | Kind::SetWord | Kind::GetWord) {
            if let Some(bound) = ctx.bind_word(&engine.pool, &cell) {
                if let SeriesData::Array(v) = &mut engine.pool.get_mut(node).unwrap().data {
                    v[i] = bound;
                }
            }
        } else if kind.is_any_array() {
            if let Payload::Aggregate { node: inner, .. } = cell.payload() {
                bind_body_deep(engine, ctx, *inner);
            }
        }
    }
}

fn dispatch_composite(engine: &mut Engine, frame: &mut Frame, _id: ActionId, kind: CompositeKind) -> EvalResult {
    match kind {
        CompositeKind::Specialize { inner, fixed } => {
            apply_fixed_args(engine, frame, fixed);
            run_inner(engine, frame, inner)
        }
        CompositeKind::Adapt { inner, prelude } => {
            let r = do_block(engine, frame, prelude);
            if r.is_thrown() {
                return r;
            }
            run_inner(engine, frame, inner)
        }
        CompositeKind::Enclose { inner: _, outer_body } => {
            // `ENCLOSE`'s constructor (`natives::enclose`) binds a word
            // naming the inner action into `outer_body`'s own closure
            // context before storing it here, the same way `FUNC` binds a
            // body to its paramlist context at definition time; by the
            // time dispatch reaches this arm, the inner action is already
            // reachable from inside the body through ordinary word lookup
            // (`spec.md` §4.4's "receives the fully built frame").
            do_block(engine, frame, outer_body)
        }
        CompositeKind::Augment { inner, added: _ } => run_inner(engine, frame, inner),
        CompositeKind::Reskin { inner, types: _ } => run_inner(engine, frame, inner),
        CompositeKind::Chain { steps } => {
            let mut result = EvalResult::Value(frame.out);
            for step_id in steps {
                let action = engine.actions.get(&step_id).cloned();
                if let Some(action) = action {
                    let input = result.into_cell();
                    let mut step_ctx = Context::create(&mut engine.pool, true);
                    let params = engine.paramlist_of(action.paramlist);
                    if let Some(first) = params.first() {
                        let _ = step_ctx.append(&mut engine.pool, first.symbol, input);
                    }
                    let mut step_frame = Frame::new(step_ctx, action.paramlist, None);
                    result = dispatch(engine, &mut step_frame, step_id, &action);
                    if result.is_thrown() {
                        return result;
                    }
                }
            }
            result
        }
    }
}

fn apply_fixed_args(engine: &mut Engine, frame: &mut Frame, fixed: NodeId) {
    if let SeriesData::Array(pairs) = &engine.pool.get(fixed).unwrap().data {
        let pairs = pairs.clone();
        for chunk in pairs.chunks(2) {
            if let [sym_cell, value] = chunk {
                if let Payload::Word(sym) = sym_cell.payload() {
                    let _ = frame.vars.append(&mut engine.pool, *sym, *value);
                }
            }
        }
    }
}

fn run_inner(engine: &mut Engine, frame: &mut Frame, inner: ActionId) -> EvalResult {
    let action = engine.actions.get(&inner).cloned();
    match action {
        Some(action) => dispatch(engine, frame, inner, &action),
        None => fail(crate::error::RebolError::internal(engine, "dangling action reference"), engine),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;

    fn block_of(engine: &mut Engine, cells: Vec<Cell>) -> NodeId {
        let id = engine.pool.alloc_unmanaged(SeriesData::Array(cells));
        engine.pool.manage(id);
        id
    }

    #[test]
    fn arithmetic_left_to_right_enfix() {
        // spec.md §8 scenario 1: `1 + 2 * 3` -> 9
        let mut engine = Engine::bootstrap();
        let plus = crate::symbol::intern("+");
        let star = crate::symbol::intern("*");
        let plus_word = engine.lib.bind_word(&engine.pool, &Cell::word(plus)).unwrap();
        let star_word = engine.lib.bind_word(&engine.pool, &Cell::word(star)).unwrap();
        let block = block_of(
            &mut engine,
            vec![
                Cell::integer(1),
                plus_word,
                Cell::integer(2),
                star_word,
                Cell::integer(3),
            ],
        );
        let mut frame = Frame::new(Context::create(&mut engine.pool, true), block, None);
        let result = do_block(&mut engine, &mut frame, block);
        assert_eq!(result.into_cell(), Cell::integer(9));
    }
}
