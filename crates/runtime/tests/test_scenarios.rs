//! End-to-end coverage of the evaluator's concrete scenarios: enfix
//! arithmetic, invisibles inside `reduce`, refinement reordering,
//! `SET-BLOCK!` destructuring, `PARSE`, and `HIJACK`.

use reblang_core::cell::Cell;
use reblang_runtime::api::ApiBuilder;
use reblang_runtime::engine::Engine;
use reblang_runtime::mold::{render, Mode};

fn value(engine: &mut Engine, src: &str) -> Cell {
    ApiBuilder::new().source(src).value_result(engine)
}

fn molded(engine: &mut Engine, src: &str) -> String {
    let v = value(engine, src);
    render(engine, &v, Mode::Mold)
}

#[test]
fn enfix_arithmetic_is_left_to_right() {
    let mut engine = Engine::bootstrap();
    assert_eq!(value(&mut engine, "1 + 2 * 3"), Cell::integer(9));
}

#[test]
fn reduce_skips_invisible_elide_expressions() {
    let mut engine = Engine::bootstrap();
    assert_eq!(molded(&mut engine, "reduce [1 + 2 elide 3 + 4 5 + 6]"), "[3 11]");
}

#[test]
fn refinements_reorder_by_name_not_call_position() {
    let mut engine = Engine::bootstrap();
    ApiBuilder::new().source("foo: func [x /y /z [integer!]] [reduce [x :y :z]]").elide(&mut engine);
    assert_eq!(molded(&mut engine, "foo/z/y 10 20"), "[10 /y 20]");
}

#[test]
fn set_block_destructures_and_broadcasts_on_exhaustion() {
    let mut engine = Engine::bootstrap();
    ApiBuilder::new().source("[a b]: 10 20").elide(&mut engine);
    assert_eq!(value(&mut engine, "a"), Cell::integer(10));
    assert_eq!(value(&mut engine, "b"), Cell::integer(20));

    ApiBuilder::new().source("[c d]: 99").elide(&mut engine);
    assert_eq!(value(&mut engine, "c"), Cell::integer(99));
    assert_eq!(value(&mut engine, "d"), Cell::integer(99));
}

#[test]
fn parse_matches_and_fails_by_rule() {
    let mut engine = Engine::bootstrap();
    assert_eq!(molded(&mut engine, r#"parse "aaabbb" [some "a" some "b" end]"#), "\"\"");
    assert_eq!(value(&mut engine, r#"parse "aaabbc" [some "a" some "b" end]"#), Cell::null());
}

#[test]
fn hijack_replaces_behavior_for_existing_and_future_calls() {
    let mut engine = Engine::bootstrap();
    ApiBuilder::new()
        .source("foo: func [x] [x * 2] foo-old: copy :foo hijack 'foo func [x] [1 + foo-old x]")
        .elide(&mut engine);
    assert_eq!(value(&mut engine, "foo 10"), Cell::integer(21));
}
