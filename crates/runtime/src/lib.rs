//! reblang-runtime: the always-resident interpreter core — cell graph
//! allocator, symbol interner, contexts, actions, evaluator, and the
//! native set bound into `lib` at bootstrap (`spec.md` §4).
//!
//! `reblang-compiler` layers the `REBOL [header]` load format on top of
//! [`scanner`]; `reblang-repl` drives an [`Engine`] through [`api`].

pub mod action;
pub mod api;
pub mod binding;
pub mod context;
pub mod engine;
pub mod error;
pub mod eval;
pub mod gc;
pub mod mold;
pub mod natives;
pub mod parse;
pub mod paths;
pub mod scanner;
pub mod series;
#[cfg(feature = "signals")]
pub mod signals;
pub mod symbol;
pub mod text;

pub use action::{Action, ActionId, CompositeKind, Dispatch, ParamClass, ParamFlags, ParamSpec};
pub use api::ApiBuilder;
pub use context::{Context, Frame};
pub use engine::Engine;
pub use error::{Category, RebolError};
pub use eval::EvalResult;
