//! The native set: every built-in `lib` binds at bootstrap
//! (`spec.md` §2's supplemented native table, §4.3's control-flow
//! dispatchers, §4.4's composite-action constructors, §4.7's `parse`).
//!
//! Grounded on the teacher's single `install`-style registration pass
//! wiring a fixed table of entry points into one environment
//! (`navicore-cem3` `crates/compiler/src/codegen/mod.rs`'s intrinsic
//! registration), generalized from a compile-time symbol table to a
//! runtime one since these bind into `lib` rather than an LLVM module.

use crate::action::{Action, ActionId, CompositeKind, Dispatch, ParamClass};
use crate::context::{Context, Frame};
use crate::engine::Engine;
use crate::error::RebolError;
use crate::eval::{do_block, fail, step, Cursor, EvalResult};
use crate::series::SeriesData;
use reblang_core::cell::{Cell, Payload, SymbolId};
use reblang_core::Kind;

fn arg(frame: &Frame, engine: &Engine, sym: SymbolId) -> Cell {
    frame
        .vars
        .lookup(&engine.pool, sym)
        .map(|idx| frame.vars.get(&engine.pool, idx))
        .unwrap_or_else(Cell::null)
}

fn array_cells(engine: &Engine, value: &Cell) -> Option<Vec<Cell>> {
    let Payload::Aggregate { node, .. } = value.payload() else {
        return None;
    };
    match &engine.pool.get(*node)?.data {
        SeriesData::Array(v) => Some(v.clone()),
        _ => None,
    }
}

fn array_node(value: &Cell) -> Option<reblang_core::cell::NodeId> {
    match value.payload() {
        Payload::Aggregate { node, .. } => Some(*node),
        _ => None,
    }
}

fn wrap_block(engine: &mut Engine, cells: Vec<Cell>) -> Cell {
    let id = engine.pool.alloc_unmanaged(SeriesData::Array(cells));
    engine.pool.manage(id);
    Cell::aggregate(Kind::Block, id, 0)
}

/// Build a paramlist from a `FUNC`/`METHOD`/`AUGMENT` spec block: plain
/// words become `Normal` parameters, `/refine` becomes a refinement, and
/// a block immediately following a refinement marks it as argument-
/// taking (`spec.md` §3.7, §6's lexer paragraph). Leading type-annotation
/// blocks before a word and string doc-comments are skipped, not
/// enforced — this core has no typeset-checking machinery beyond the
/// bit described in `action.rs`.
fn build_paramlist(engine: &Engine, spec: &Cell) -> Vec<crate::action::ParamSpec> {
    let cells = array_cells(engine, spec).unwrap_or_default();
    let mut params = Vec::new();
    let mut i = 0;
    while i < cells.len() {
        let cell = cells[i];
        match cell.base_kind() {
            Some(Kind::Word) => {
                if let Payload::Word(sym) = cell.payload() {
                    params.push(Engine::param(*sym, ParamClass::Normal));
                }
                i += 1;
            }
            Some(Kind::Refinement) => {
                if let Payload::Word(sym) = cell.payload() {
                    let takes_arg = cells.get(i + 1).map(|c| c.base_kind() == Some(Kind::Block)).unwrap_or(false);
                    params.push(Engine::refinement(*sym, takes_arg));
                    i += if takes_arg { 2 } else { 1 };
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    params
}

fn install_arithmetic(engine: &mut Engine) {
    let value1 = crate::symbol::intern("value1");
    let value2 = crate::symbol::intern("value2");

    macro_rules! math_native {
        ($name:literal, $iop:expr, $fop:expr) => {{
            let v1 = value1;
            let v2 = value2;
            // `v2` is `Tight` so enfix math stays strictly left-to-right
            // (`spec.md` §8 scenario 1): gathering it must not run the
            // enfix lookahead loop, or `1 + 2 * 3` would greedily fold
            // `2 * 3` before `+` ever sees it.
            let params = vec![Engine::param(v1, ParamClass::Normal), Engine::param(v2, ParamClass::Tight)];
            let iop: fn(i64, i64) -> Option<i64> = $iop;
            let fop: fn(f64, f64) -> f64 = $fop;
            engine.define_native_ex(
                $name,
                params,
                std::rc::Rc::new(move |frame, engine| {
                    let a = arg(frame, engine, v1);
                    let b = arg(frame, engine, v2);
                    match numeric_binop(a, b, iop, fop) {
                        Some(c) => EvalResult::Value(c),
                        None => fail(RebolError::invalid_arg(engine, "expected integer!/decimal! operands"), engine),
                    }
                }),
                true,  // enfix
                false, // defer
                false, // postpone
            );
        }};
    }

    math_native!("+", |a, b| a.checked_add(b), |a, b| a + b);
    math_native!("-", |a, b| a.checked_sub(b), |a, b| a - b);
    math_native!("*", |a, b| a.checked_mul(b), |a, b| a * b);

    {
        let v1 = value1;
        let v2 = value2;
        let params = vec![Engine::param(v1, ParamClass::Normal), Engine::param(v2, ParamClass::Tight)];
        engine.define_native_ex(
            "/",
            params,
            std::rc::Rc::new(move |frame, engine| {
                let a = arg(frame, engine, v1);
                let b = arg(frame, engine, v2);
                if matches!(b.payload(), Payload::Integer(0)) {
                    return fail(RebolError::zero_divide(engine), engine);
                }
                match numeric_binop(a, b, |x, y| if y == 0 { None } else { Some(x / y) }, |x, y| x / y) {
                    Some(c) => EvalResult::Value(c),
                    None => fail(RebolError::invalid_arg(engine, "expected integer!/decimal! operands"), engine),
                }
            }),
            true,
            false,
            false,
        );
    }

    macro_rules! compare_native {
        ($name:literal, $mode:expr, $int_cmp:expr) => {{
            let v1 = value1;
            let v2 = value2;
            let params = vec![Engine::param(v1, ParamClass::Normal), Engine::param(v2, ParamClass::Tight)];
            let int_cmp: fn(i64, i64) -> bool = $int_cmp;
            engine.define_native_ex(
                $name,
                params,
                std::rc::Rc::new(move |frame, engine| {
                    let a = arg(frame, engine, v1);
                    let b = arg(frame, engine, v2);
                    EvalResult::Value(Cell::logic(compare(&a, &b, $mode, int_cmp)))
                }),
                true,
                false,
                false,
            );
        }};
    }

    compare_native!("=", reblang_core::EqMode::Equivalence, |a, b| a == b);
    compare_native!("==", reblang_core::EqMode::Strict, |a, b| a == b);
    compare_native!("<", reblang_core::EqMode::Equivalence, |a, b| a < b);
    compare_native!(">", reblang_core::EqMode::Equivalence, |a, b| a > b);
    compare_native!("<=", reblang_core::EqMode::Equivalence, |a, b| a <= b);
    compare_native!(">=", reblang_core::EqMode::Equivalence, |a, b| a >= b);
}

fn numeric_binop(a: Cell, b: Cell, iop: impl Fn(i64, i64) -> Option<i64>, fop: impl Fn(f64, f64) -> f64) -> Option<Cell> {
    match (a.payload(), b.payload()) {
        (Payload::Integer(x), Payload::Integer(y)) => iop(*x, *y).map(Cell::integer),
        (Payload::Integer(x), Payload::Decimal(y)) => Some(Cell::decimal(fop(*x as f64, *y))),
        (Payload::Decimal(x), Payload::Integer(y)) => Some(Cell::decimal(fop(*x, *y as f64))),
        (Payload::Decimal(x), Payload::Decimal(y)) => Some(Cell::decimal(fop(*x, *y))),
        _ => None,
    }
}

fn compare(a: &Cell, b: &Cell, mode: reblang_core::EqMode, int_cmp: impl Fn(i64, i64) -> bool) -> bool {
    match (a.payload(), b.payload()) {
        (Payload::Integer(x), Payload::Integer(y)) => int_cmp(*x, *y),
        (Payload::Integer(x), Payload::Decimal(y)) => int_cmp_f(*x as f64, *y, &int_cmp),
        (Payload::Decimal(x), Payload::Integer(y)) => int_cmp_f(*x, *y as f64, &int_cmp),
        (Payload::Decimal(x), Payload::Decimal(y)) => int_cmp_f(*x, *y, &int_cmp),
        _ => reblang_core::cell::eq_atomic(a, b, mode).unwrap_or(false),
    }
}

/// Re-runs an integer comparator's ordering against floats by encoding
/// the same three probe points (`<`, `==`, `>`) it would have answered
/// for integers, since the comparison natives only ever pass in `==`,
/// `<`, `>`, `<=`, or `>=` closures.
fn int_cmp_f(x: f64, y: f64, int_cmp: &impl Fn(i64, i64) -> bool) -> bool {
    let probe = if x < y {
        -1
    } else if x > y {
        1
    } else {
        0
    };
    int_cmp(probe, 0)
}

fn install_control_flow(engine: &mut Engine) {
    let sym_condition = crate::symbol::intern("condition");
    let sym_body = crate::symbol::intern("body");
    let sym_true = crate::symbol::intern("true-branch");
    let sym_false = crate::symbol::intern("false-branch");
    let sym_cases = crate::symbol::intern("cases");
    let sym_value = crate::symbol::intern("value");
    let sym_input = crate::symbol::intern("input");
    let sym_source = crate::symbol::intern("source");

    {
        let (c, b) = (sym_condition, sym_body);
        engine.define_native(
            "if",
            vec![Engine::param(c, ParamClass::Normal), Engine::param(b, ParamClass::Normal)],
            std::rc::Rc::new(move |frame, engine| {
                let cond = arg(frame, engine, c);
                if !crate::api::is_truthy(&cond) {
                    return EvalResult::Null;
                }
                run_body_block(engine, frame, &arg(frame, engine, b))
            }),
        );
    }

    {
        let (c, t, f) = (sym_condition, sym_true, sym_false);
        engine.define_native(
            "either",
            vec![
                Engine::param(c, ParamClass::Normal),
                Engine::param(t, ParamClass::Normal),
                Engine::param(f, ParamClass::Normal),
            ],
            std::rc::Rc::new(move |frame, engine| {
                let cond = arg(frame, engine, c);
                let branch = if crate::api::is_truthy(&cond) { arg(frame, engine, t) } else { arg(frame, engine, f) };
                run_body_block(engine, frame, &branch)
            }),
        );
    }

    {
        let cases = sym_cases;
        engine.define_native(
            "case",
            vec![Engine::param(cases, ParamClass::Normal)],
            std::rc::Rc::new(move |frame, engine| {
                let cases_val = arg(frame, engine, cases);
                let Some(node) = array_node(&cases_val) else {
                    return fail(RebolError::invalid_arg(engine, "case expects a block of cases"), engine);
                };
                let mut cursor = Cursor::new(node);
                loop {
                    if cursor.is_end(engine) {
                        return EvalResult::Null;
                    }
                    let cond_result = step(engine, frame, &mut cursor);
                    if cond_result.is_thrown() {
                        return cond_result;
                    }
                    let body_cell = cursor.peek(engine);
                    if body_cell.is_end() {
                        return EvalResult::Null;
                    }
                    cursor.advance();
                    if crate::api::is_truthy(&cond_result.into_cell()) {
                        return run_body_block(engine, frame, &body_cell);
                    }
                }
            }),
        );
    }

    {
        let (value, cases) = (sym_value, sym_cases);
        engine.define_native(
            "switch",
            vec![Engine::param(value, ParamClass::Normal), Engine::param(cases, ParamClass::Normal)],
            std::rc::Rc::new(move |frame, engine| {
                let subject = arg(frame, engine, value);
                let cases_val = arg(frame, engine, cases);
                let cells = array_cells(engine, &cases_val).unwrap_or_default();
                let mut i = 0;
                while i + 1 < cells.len() {
                    let matched =
                        reblang_core::cell::eq_atomic(&cells[i], &subject, reblang_core::EqMode::Equivalence).unwrap_or(false);
                    let body = cells[i + 1];
                    i += 2;
                    if matched {
                        return run_body_block(engine, frame, &body);
                    }
                }
                EvalResult::Null
            }),
        );
    }

    {
        let input = sym_input;
        engine.define_native(
            "reduce",
            vec![Engine::param(input, ParamClass::Normal)],
            std::rc::Rc::new(move |frame, engine| {
                let source = arg(frame, engine, input);
                let Some(node) = array_node(&source) else {
                    return fail(RebolError::invalid_arg(engine, "reduce expects a block"), engine);
                };
                let mut cursor = Cursor::new(node);
                let mut out = Vec::new();
                loop {
                    if cursor.is_end(engine) {
                        break;
                    }
                    let r = step(engine, frame, &mut cursor);
                    if r.is_thrown() {
                        return r;
                    }
                    if !matches!(r, EvalResult::Invisible) {
                        out.push(r.into_cell());
                    }
                }
                EvalResult::Value(wrap_block(engine, out))
            }),
        );
    }

    {
        let source = sym_source;
        engine.define_native(
            "do",
            vec![Engine::param(source, ParamClass::Normal)],
            std::rc::Rc::new(move |frame, engine| {
                let value = arg(frame, engine, source);
                if let Some(k) = value.base_kind() {
                    if k.is_any_array() {
                        if let Some(node) = array_node(&value) {
                            return do_block(engine, frame, node);
                        }
                    }
                    if k.is_any_string() {
                        if let Some(text) = crate::text::as_str(engine, &value).map(str::to_string) {
                            let cells = crate::scanner::scan(engine, &text);
                            let id = engine.pool.alloc_unmanaged(SeriesData::Array(cells));
                            engine.pool.manage(id);
                            return do_block(engine, frame, id);
                        }
                    }
                }
                EvalResult::Value(value)
            }),
        );
    }

    {
        let value = sym_value;
        engine.define_native(
            "elide",
            vec![Engine::param(value, ParamClass::Normal)],
            std::rc::Rc::new(move |_frame, _engine| EvalResult::Invisible),
        );
    }
}

/// Evaluate `cell` as a body: if it's a block, run it; otherwise treat it
/// as an already-evaluated value (`spec.md` §4.3's "blocks are inert"
/// means an `IF`/`EITHER`/`CASE`/`SWITCH` branch argument is received as
/// the literal block, not its contents).
fn run_body_block(engine: &mut Engine, frame: &mut Frame, cell: &Cell) -> EvalResult {
    match array_node(cell) {
        Some(node) if cell.base_kind().map(|k| k.is_any_array()).unwrap_or(false) => do_block(engine, frame, node),
        _ => EvalResult::Value(*cell),
    }
}

fn install_functions(engine: &mut Engine) {
    let spec = crate::symbol::intern("spec");
    let body = crate::symbol::intern("body");

    for (name, dynamic) in [("func", false), ("function", false), ("method", true)] {
        let (s, b) = (spec, body);
        engine.define_native(
            name,
            vec![Engine::param(s, ParamClass::Normal), Engine::param(b, ParamClass::Normal)],
            std::rc::Rc::new(move |frame, engine| {
                let spec_val = arg(frame, engine, s);
                let body_val = arg(frame, engine, b);
                let Some(body_node) = array_node(&body_val) else {
                    return fail(RebolError::invalid_arg(engine, "func expects a body block"), engine);
                };
                let params = build_paramlist(engine, &spec_val);
                let id = engine.define_interpreted(params, body_node, dynamic);
                EvalResult::Value(crate::action::action_cell(id))
            }),
        );
    }
}

fn install_text(engine: &mut Engine) {
    let value = crate::symbol::intern("value");

    engine.define_native(
        "print",
        vec![Engine::param(value, ParamClass::Normal)],
        std::rc::Rc::new(move |frame, engine| {
            let v = arg(frame, engine, value);
            println!("{}", crate::mold::render(engine, &v, crate::mold::Mode::Form));
            EvalResult::Invisible
        }),
    );

    engine.define_native(
        "probe",
        vec![Engine::param(value, ParamClass::Normal)],
        std::rc::Rc::new(move |frame, engine| {
            let v = arg(frame, engine, value);
            println!("{}", crate::mold::render(engine, &v, crate::mold::Mode::Mold));
            EvalResult::Value(v)
        }),
    );

    engine.define_native(
        "mold",
        vec![Engine::param(value, ParamClass::Normal)],
        std::rc::Rc::new(move |frame, engine| {
            let v = arg(frame, engine, value);
            let text = crate::mold::render(engine, &v, crate::mold::Mode::Mold);
            EvalResult::Value(crate::text::new_text(engine, &text))
        }),
    );

    engine.define_native(
        "form",
        vec![Engine::param(value, ParamClass::Normal)],
        std::rc::Rc::new(move |frame, engine| {
            let v = arg(frame, engine, value);
            let text = crate::mold::render(engine, &v, crate::mold::Mode::Form);
            EvalResult::Value(crate::text::new_text(engine, &text))
        }),
    );
}

/// `COPY`: a fresh, independently-mutable aggregate for block/string
/// kinds; a fresh `ActionId` sharing the same dispatcher for `action!`
/// values, so hijacking the original later leaves the copy's behavior
/// untouched (`spec.md` §8 scenario 6's `foo-old: copy :foo`); anything
/// else already has value semantics and is returned as-is.
fn install_series(engine: &mut Engine) {
    let value = crate::symbol::intern("value");
    engine.define_native(
        "copy",
        vec![Engine::param(value, ParamClass::Normal)],
        std::rc::Rc::new(move |frame, engine| {
            let v = arg(frame, engine, value);
            EvalResult::Value(copy_value(engine, &v))
        }),
    );
}

fn copy_value(engine: &mut Engine, v: &Cell) -> Cell {
    if let Some(id) = crate::action::action_id(v) {
        let cloned = engine.actions.get(&id).expect("copy: dangling action id").clone();
        return crate::action::action_cell(engine.register_action(cloned));
    }
    let Some(kind) = v.base_kind() else {
        return *v;
    };
    if kind.is_any_array() {
        let cells = array_cells(engine, v).unwrap_or_default();
        return Cell::aggregate(kind, wrap_block(engine, cells).node().expect("wrap_block always aggregates"), 0);
    }
    if kind.is_any_string() {
        if let Some(text) = crate::text::as_str(engine, v) {
            let text = text.to_owned();
            let copied = crate::text::new_text(engine, &text);
            return Cell::aggregate(kind, copied.node().expect("new_text always aggregates"), 0);
        }
    }
    *v
}

fn install_parse(engine: &mut Engine) {
    let input = crate::symbol::intern("input");
    let rules = crate::symbol::intern("rules");
    engine.define_native(
        "parse",
        vec![Engine::param(input, ParamClass::Normal), Engine::param(rules, ParamClass::Normal)],
        std::rc::Rc::new(move |frame, engine| {
            let input_val = arg(frame, engine, input);
            let rules_val = arg(frame, engine, rules);
            match crate::parse::parse(engine, frame, input_val, rules_val) {
                Some(result) => EvalResult::Value(result),
                None => EvalResult::Null,
            }
        }),
    );
}

fn install_exceptions(engine: &mut Engine) {
    let label = crate::symbol::intern("label");
    let value = crate::symbol::intern("value");
    let body = crate::symbol::intern("body");

    {
        let (l, v) = (label, value);
        engine.define_native(
            "throw",
            vec![Engine::param(l, ParamClass::Normal), Engine::param(v, ParamClass::Normal)],
            std::rc::Rc::new(move |frame, engine| EvalResult::Thrown { label: arg(frame, engine, l), value: arg(frame, engine, v) }),
        );
    }

    {
        let b = body;
        engine.define_native(
            "catch",
            vec![Engine::param(b, ParamClass::Normal)],
            std::rc::Rc::new(move |frame, engine| {
                let body_val = arg(frame, engine, b);
                let result = run_body_block(engine, frame, &body_val);
                match result {
                    EvalResult::Thrown { label, value } if !is_fail_label(&label) => EvalResult::Value(value),
                    other => other,
                }
            }),
        );
    }

    {
        let b = body;
        engine.define_native(
            "trap",
            vec![Engine::param(b, ParamClass::Normal)],
            std::rc::Rc::new(move |frame, engine| {
                let body_val = arg(frame, engine, b);
                let result = run_body_block(engine, frame, &body_val);
                match result {
                    EvalResult::Thrown { label, value } if is_fail_label(&label) => EvalResult::Value(value),
                    other => other,
                }
            }),
        );
    }

    {
        let v = value;
        engine.define_native_ex(
            "quit",
            vec![{
                let mut p = Engine::param(v, ParamClass::Normal);
                p.flags.insert(crate::action::ParamFlags::ENDABLE);
                p
            }],
            std::rc::Rc::new(move |frame, engine| {
                let code = arg(frame, engine, v);
                let code = if code.is_null() { Cell::integer(0) } else { code };
                EvalResult::Thrown { label: crate::eval::quit_label(), value: code }
            }),
            false,
            false,
            false,
        );
    }

    engine.define_native(
        "halt",
        vec![],
        std::rc::Rc::new(move |_frame, engine| {
            engine.request_halt();
            EvalResult::Thrown { label: crate::eval::quit_label(), value: Cell::integer(130) }
        }),
    );
}

fn is_fail_label(label: &Cell) -> bool {
    crate::binding::symbol_of(label).map(|s| s == crate::symbol::intern("%%fail%%")).unwrap_or(false)
}

fn dequote_if_quoted(cell: Cell) -> Cell {
    if cell.inline_quote_depth().unwrap_or(0) > 0 {
        cell.dequote_one()
    } else {
        cell
    }
}

fn resolve_action(engine: &Engine, frame: &Frame, value: &Cell) -> Option<ActionId> {
    let resolved = if value.base_kind() == Some(Kind::Word) {
        crate::binding::binding_of(value)
            .and_then(|b| engine.context_at(b.context).map(|ctx| ctx.get(&engine.pool, b.index)))
            .unwrap_or(*value)
    } else {
        let _ = frame;
        *value
    };
    crate::action::action_id(&resolved)
}

fn install_composites(engine: &mut Engine) {
    let target = crate::symbol::intern("target");
    let spec_sym = crate::symbol::intern("spec");
    let replacement = crate::symbol::intern("replacement");
    let steps_sym = crate::symbol::intern("steps");

    {
        let (t, s) = (target, spec_sym);
        engine.define_native(
            "specialize",
            vec![Engine::param(t, ParamClass::Normal), Engine::param(s, ParamClass::Normal)],
            std::rc::Rc::new(move |frame, engine| {
                let target_val = arg(frame, engine, t);
                let Some(inner) = resolve_action(engine, frame, &target_val) else {
                    return fail(RebolError::invalid_arg(engine, "specialize expects an action!"), engine);
                };
                let fixed_val = arg(frame, engine, s);
                let Some(fixed_node) = array_node(&fixed_val) else {
                    return fail(RebolError::invalid_arg(engine, "specialize expects a block of word/value pairs"), engine);
                };
                let fixed_cells = array_cells(engine, &fixed_val).unwrap_or_default();
                let fixed_syms: Vec<SymbolId> = fixed_cells
                    .chunks(2)
                    .filter_map(|c| match c.first()?.payload() {
                        Payload::Word(sym) => Some(*sym),
                        _ => None,
                    })
                    .collect();
                let inner_params = engine.paramlist_of(engine.actions.get(&inner).expect("dangling action").paramlist);
                let outer_params: Vec<_> = inner_params.into_iter().filter(|p| !fixed_syms.contains(&p.symbol)).collect();
                let outer_paramlist = engine.alloc_paramlist(outer_params);
                let action = Action {
                    paramlist: outer_paramlist,
                    dispatch: Dispatch::Composite(CompositeKind::Specialize { inner, fixed: fixed_node }),
                    details: None,
                    enfix: false,
                    defer: false,
                    postpone: false,
                    resolve_dynamically: false,
                    env: None,
                };
                EvalResult::Value(crate::action::action_cell(engine.register_action(action)))
            }),
        );
    }

    {
        let (t, s) = (target, spec_sym);
        engine.define_native(
            "adapt",
            vec![Engine::param(t, ParamClass::Normal), Engine::param(s, ParamClass::Normal)],
            std::rc::Rc::new(move |frame, engine| {
                let target_val = arg(frame, engine, t);
                let Some(inner) = resolve_action(engine, frame, &target_val) else {
                    return fail(RebolError::invalid_arg(engine, "adapt expects an action!"), engine);
                };
                let prelude_val = arg(frame, engine, s);
                let Some(prelude_node) = array_node(&prelude_val) else {
                    return fail(RebolError::invalid_arg(engine, "adapt expects a prelude block"), engine);
                };
                let paramlist = engine.actions.get(&inner).expect("dangling action").paramlist;
                let action = Action {
                    paramlist,
                    dispatch: Dispatch::Composite(CompositeKind::Adapt { inner, prelude: prelude_node }),
                    details: None,
                    enfix: false,
                    defer: false,
                    postpone: false,
                    resolve_dynamically: false,
                    env: None,
                };
                EvalResult::Value(crate::action::action_cell(engine.register_action(action)))
            }),
        );
    }

    {
        let (t, s) = (target, spec_sym);
        engine.define_native(
            "enclose",
            vec![Engine::param(t, ParamClass::Normal), Engine::param(s, ParamClass::Normal)],
            std::rc::Rc::new(move |frame, engine| {
                let target_val = arg(frame, engine, t);
                let Some(inner) = resolve_action(engine, frame, &target_val) else {
                    return fail(RebolError::invalid_arg(engine, "enclose expects an action!"), engine);
                };
                let body_val = arg(frame, engine, s);
                let Some(body_node) = array_node(&body_val) else {
                    return fail(RebolError::invalid_arg(engine, "enclose expects an outer body block"), engine);
                };
                let paramlist = engine.actions.get(&inner).expect("dangling action").paramlist;
                let action = Action {
                    paramlist,
                    dispatch: Dispatch::Composite(CompositeKind::Enclose { inner, outer_body: body_node }),
                    details: None,
                    enfix: false,
                    defer: false,
                    postpone: false,
                    resolve_dynamically: false,
                    env: None,
                };
                EvalResult::Value(crate::action::action_cell(engine.register_action(action)))
            }),
        );
    }

    {
        let (t, s) = (target, spec_sym);
        engine.define_native(
            "augment",
            vec![Engine::param(t, ParamClass::Normal), Engine::param(s, ParamClass::Normal)],
            std::rc::Rc::new(move |frame, engine| {
                let target_val = arg(frame, engine, t);
                let Some(inner) = resolve_action(engine, frame, &target_val) else {
                    return fail(RebolError::invalid_arg(engine, "augment expects an action!"), engine);
                };
                let added_val = arg(frame, engine, s);
                let Some(added_node) = array_node(&added_val) else {
                    return fail(RebolError::invalid_arg(engine, "augment expects a spec block"), engine);
                };
                let mut params = engine.paramlist_of(engine.actions.get(&inner).expect("dangling action").paramlist);
                params.extend(build_paramlist(engine, &added_val));
                let outer_paramlist = engine.alloc_paramlist(params);
                let action = Action {
                    paramlist: outer_paramlist,
                    dispatch: Dispatch::Composite(CompositeKind::Augment { inner, added: added_node }),
                    details: None,
                    enfix: false,
                    defer: false,
                    postpone: false,
                    resolve_dynamically: false,
                    env: None,
                };
                EvalResult::Value(crate::action::action_cell(engine.register_action(action)))
            }),
        );
    }

    {
        let (t, s) = (target, spec_sym);
        engine.define_native(
            "reskin",
            vec![Engine::param(t, ParamClass::Normal), Engine::param(s, ParamClass::Normal)],
            std::rc::Rc::new(move |frame, engine| {
                let target_val = arg(frame, engine, t);
                let Some(inner) = resolve_action(engine, frame, &target_val) else {
                    return fail(RebolError::invalid_arg(engine, "reskin expects an action!"), engine);
                };
                let types_val = arg(frame, engine, s);
                let Some(types_node) = array_node(&types_val) else {
                    return fail(RebolError::invalid_arg(engine, "reskin expects a types block"), engine);
                };
                let paramlist = engine.actions.get(&inner).expect("dangling action").paramlist;
                let action = Action {
                    paramlist,
                    dispatch: Dispatch::Composite(CompositeKind::Reskin { inner, types: types_node }),
                    details: None,
                    enfix: false,
                    defer: false,
                    postpone: false,
                    resolve_dynamically: false,
                    env: None,
                };
                EvalResult::Value(crate::action::action_cell(engine.register_action(action)))
            }),
        );
    }

    {
        let steps = steps_sym;
        engine.define_native(
            "chain",
            vec![Engine::param(steps, ParamClass::Normal)],
            std::rc::Rc::new(move |frame, engine| {
                let steps_val = arg(frame, engine, steps);
                let cells = array_cells(engine, &steps_val).unwrap_or_default();
                let ids: Vec<ActionId> = cells.iter().filter_map(|c| resolve_action(engine, frame, c)).collect();
                let Some(&first) = ids.first() else {
                    return fail(RebolError::invalid_arg(engine, "chain expects a non-empty block of actions"), engine);
                };
                let paramlist = engine.actions.get(&first).expect("dangling action").paramlist;
                let action = Action {
                    paramlist,
                    dispatch: Dispatch::Composite(CompositeKind::Chain { steps: ids }),
                    details: None,
                    enfix: false,
                    defer: false,
                    postpone: false,
                    resolve_dynamically: false,
                    env: None,
                };
                EvalResult::Value(crate::action::action_cell(engine.register_action(action)))
            }),
        );
    }

    {
        let (t, r) = (target, replacement);
        engine.define_native(
            "hijack",
            vec![Engine::param(t, ParamClass::HardQuote), Engine::param(r, ParamClass::Normal)],
            std::rc::Rc::new(move |frame, engine| {
                let raw = arg(frame, engine, t);
                let word = dequote_if_quoted(raw);
                let Some(binding) = crate::binding::binding_of(&word) else {
                    return fail(RebolError::invalid_arg(engine, "hijack target is not a bound word"), engine);
                };
                let Some(ctx) = engine.context_at(binding.context) else {
                    return fail(RebolError::internal(engine, "dangling hijack target binding"), engine);
                };
                let Some(target_id) = crate::action::action_id(&ctx.get(&engine.pool, binding.index)) else {
                    return fail(RebolError::invalid_arg(engine, "hijack target does not name an action!"), engine);
                };
                let replacement_val = arg(frame, engine, r);
                let Some(replacement_id) = crate::action::action_id(&replacement_val) else {
                    return fail(RebolError::invalid_arg(engine, "hijack replacement is not an action!"), engine);
                };
                crate::action::hijack(engine, target_id, replacement_id);
                EvalResult::Value(replacement_val)
            }),
        );
    }
}

/// Install the full native set into a freshly-created, otherwise empty
/// [`Engine`] (`spec.md` §2).
pub fn install(engine: &mut Engine) {
    install_arithmetic(engine);
    install_control_flow(engine);
    install_functions(engine);
    install_text(engine);
    install_series(engine);
    install_parse(engine);
    install_exceptions(engine);
    install_composites(engine);
}
