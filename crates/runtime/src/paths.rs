//! `PATH!`/`GET-PATH!`/`SET-PATH!` evaluation (`spec.md` §3.1's any-path
//! family, §4.3's per-step algorithm, §8 scenario 3's refinement
//! reordering).
//!
//! A path's first segment names either an action to call (with the
//! remaining word segments supplying refinements, e.g. `append/only`) or
//! a context/aggregate to walk into (`obj/field/sub-field`). This core
//! does not try to disambiguate beyond "first segment is a word bound to
//! an action" vs "everything else", which covers every path form in
//! `spec.md` §6's lexical grammar and §8's scenarios.

use crate::context::Frame;
use crate::engine::Engine;
use crate::eval::{Cursor, EvalResult};
use reblang_core::cell::{Cell, Payload, SymbolId};
use reblang_core::Kind;

fn segments(engine: &Engine, path: &Cell) -> Vec<Cell> {
    let Payload::Aggregate { node, .. } = path.payload() else {
        return Vec::new();
    };
    match &engine.pool.get(*node).expect("dangling path node").data {
        crate::series::SeriesData::Array(v) => v.clone(),
        _ => Vec::new(),
    }
}

fn segment_symbol(seg: &Cell) -> Option<SymbolId> {
    match seg.payload() {
        Payload::Word(s) => Some(*s),
        _ => None,
    }
}

pub fn eval_path(engine: &mut Engine, frame: &mut Frame, cursor: &mut Cursor, path: &Cell, is_get: bool) -> EvalResult {
    let segs = segments(engine, path);
    let Some(head) = segs.first() else {
        return EvalResult::Null;
    };
    let Some(head_binding) = crate::binding::binding_of(head) else {
        return crate::eval::fail(crate::error::RebolError::no_value(engine, head), engine);
    };
    let Some(ctx) = engine.context_at(head_binding.context) else {
        return crate::eval::fail(crate::error::RebolError::internal(engine, "dangling path binding"), engine);
    };
    let head_value = ctx.get(&engine.pool, head_binding.index);

    if let Some(id) = crate::action::action_id(&head_value) {
        if is_get {
            return EvalResult::Value(head_value);
        }
        let action = engine.actions.get(&id).cloned().expect("action table missing live id");
        let refinements: Vec<SymbolId> = segs[1..].iter().filter_map(segment_symbol).collect();
        return crate::eval::call_action_with_left(engine, frame, cursor, id, &action, None, &refinements);
    }

    // Not an action: walk the remaining segments as selections into an
    // object or aggregate (`spec.md` §3.6's context lookup, generalized to
    // `any-array!` indexing for `block/1`-style paths).
    let mut value = head_value;
    for seg in &segs[1..] {
        value = match select_one(engine, &value, seg) {
            Some(v) => v,
            None => return crate::eval::fail(crate::error::RebolError::invalid_arg(engine, "path selection failed"), engine),
        };
    }
    EvalResult::Value(value)
}

fn select_one(engine: &Engine, value: &Cell, seg: &Cell) -> Option<Cell> {
    let kind = value.base_kind()?;
    if matches!(kind, Kind::Object | Kind::Module | Kind::Error) {
        let Payload::Aggregate { node, .. } = value.payload() else { return None };
        let ctx = engine.context_at(*node)?;
        let sym = segment_symbol(seg)?;
        let index = ctx.lookup(&engine.pool, sym)?;
        return Some(ctx.get(&engine.pool, index));
    }
    if kind.is_any_array() {
        let Payload::Aggregate { node, .. } = value.payload() else { return None };
        let SymbolOrIndex::Index(i) = classify_index(seg)? else { return None };
        match &engine.pool.get(*node)?.data {
            crate::series::SeriesData::Array(v) => v.get(i).copied(),
            _ => None,
        }
    } else {
        None
    }
}

enum SymbolOrIndex {
    Index(usize),
}

fn classify_index(seg: &Cell) -> Option<SymbolOrIndex> {
    match seg.payload() {
        Payload::Integer(n) if *n >= 1 => Some(SymbolOrIndex::Index((*n - 1) as usize)),
        _ => None,
    }
}

/// `SET-PATH!`: same walk as [`eval_path`], but the final segment's slot
/// is written rather than read (`spec.md` §4.3's SET-PATH! step).
pub fn set_path(engine: &mut Engine, _frame: &mut Frame, path: &Cell, value: Cell) -> EvalResult {
    let segs = segments(engine, path);
    let Some(head) = segs.first() else {
        return EvalResult::Null;
    };
    let Some(head_binding) = crate::binding::binding_of(head) else {
        return crate::eval::fail(crate::error::RebolError::no_value(engine, head), engine);
    };
    let Some(ctx) = engine.context_at(head_binding.context) else {
        return crate::eval::fail(crate::error::RebolError::internal(engine, "dangling path binding"), engine);
    };

    if segs.len() == 1 {
        let _ = ctx.set(&mut engine.pool, head_binding.index, value);
        return EvalResult::Value(value);
    }

    let mut current = ctx.get(&engine.pool, head_binding.index);
    for seg in &segs[1..segs.len() - 1] {
        match select_one(engine, &current, seg) {
            Some(v) => current = v,
            None => return crate::eval::fail(crate::error::RebolError::invalid_arg(engine, "path selection failed"), engine),
        }
    }
    let last = &segs[segs.len() - 1];
    if write_one(engine, &current, last, value) {
        EvalResult::Value(value)
    } else {
        crate::eval::fail(crate::error::RebolError::invalid_arg(engine, "path assignment failed"), engine)
    }
}

fn write_one(engine: &mut Engine, target: &Cell, seg: &Cell, value: Cell) -> bool {
    let Some(kind) = target.base_kind() else { return false };
    if matches!(kind, Kind::Object | Kind::Module | Kind::Error) {
        let Payload::Aggregate { node, .. } = target.payload() else { return false };
        let Some(ctx) = engine.context_at(*node) else { return false };
        let Some(sym) = segment_symbol(seg) else { return false };
        let Some(index) = ctx.lookup(&engine.pool, sym) else { return false };
        return ctx.set(&mut engine.pool, index, value).is_ok();
    }
    if kind.is_any_array() {
        let Payload::Aggregate { node, .. } = target.payload() else { return false };
        let Some(SymbolOrIndex::Index(i)) = classify_index(seg) else { return false };
        if let Some(n) = engine.pool.get_mut(*node) {
            if let crate::series::SeriesData::Array(v) = &mut n.data {
                if let Some(slot) = v.get_mut(i) {
                    *slot = value;
                    return true;
                }
            }
        }
    }
    false
}
