//! `vela_engine` — the value, object, function, environment, context, garbage
//! collector and meta-object protocol that a JavaScript evaluator is built
//! on top of.
//!
//! More information:
//!  - [ECMAScript reference][spec]
//!
//! [spec]: https://tc39.es/ecma262/
#![deny(
    unused_qualifications,
    clippy::all,
    unused_import_braces,
    unused_lifetimes,
    unreachable_pub,
    trivial_numeric_casts,
    missing_debug_implementations,
    deprecated_in_future,
    non_ascii_idents,
    rust_2018_compatibility,
    rust_2018_idioms,
    future_incompatible,
    nonstandard_style
)]
#![warn(clippy::perf, clippy::single_match_else, clippy::dbg_macro)]
#![allow(
    clippy::missing_inline_in_public_items,
    clippy::cognitive_complexity,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::as_conversions
)]

pub mod builtins;
pub mod context;
pub mod environment;
pub mod exec;
pub mod function;
pub mod gc;
pub mod iterator;
pub mod object;
pub mod property;
pub mod shape;
pub mod symbol;
pub mod syntax;
pub mod value;

pub use context::Context;
pub use object::JsObject;
pub use value::{JsString, JsValue};

/// Every fallible script-visible operation returns this: `Ok` on success,
/// `Err` carrying the thrown [`JsValue`] on failure. See §4.5/§7 — script
/// control flow never uses a Rust panic or a host exception for a `throw`.
pub type JsResult<T> = Result<T, JsValue>;

/// Parses and evaluates `src` as a script in a fresh [`Context`], returning
/// the completion value's `ToString` or the thrown value's `ToString`
/// prefixed as an error. Mirrors the reference project's top-level
/// `forward`/`forward_val` helpers, used by the CLI and by tests.
pub fn forward(context: &mut context::Context, src: &str) -> String {
    match forward_val(context, src) {
        Ok(v) => v.to_string(),
        Err(e) => format!("Uncaught {}", context.stringify_thrown(&e)),
    }
}

/// Like [`forward`] but returns the [`JsValue`] (or thrown value) instead of
/// stringifying it, so callers can inspect the result.
pub fn forward_val(context: &mut context::Context, src: &str) -> JsResult<JsValue> {
    let ast = syntax::parse(src).map_err(|e| context.construct_syntax_error(e.to_string()))?;
    context.eval_program(&ast)
}
