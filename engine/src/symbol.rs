//! The `Symbol` primitive type and the well-known symbol registry.
//!
//! More information:
//!  - [ECMAScript reference][spec]
//!
//! [spec]: https://tc39.es/ecma262/#sec-symbol-value

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::gc::{empty_trace, Finalize, Trace};

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
struct SymbolData {
    id: u64,
    description: Option<Box<str>>,
}

/// A unique symbol value. Two `JsSymbol`s are equal iff they are the same
/// allocation (`Arc::ptr_eq`) — `Symbol("a") !== Symbol("a")`.
#[derive(Debug, Clone)]
pub struct JsSymbol(Arc<SymbolData>);

impl JsSymbol {
    pub fn new(description: Option<String>) -> Self {
        let id = NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed);
        Self(Arc::new(SymbolData {
            id,
            description: description.map(|d| d.into_boxed_str()),
        }))
    }

    pub fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }
}

impl PartialEq for JsSymbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for JsSymbol {}

impl std::hash::Hash for JsSymbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Display for JsSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0.description.as_deref().unwrap_or(""))
    }
}

unsafe impl Trace for JsSymbol {
    empty_trace!();
}
impl Finalize for JsSymbol {}

/// The well-known symbols populated once at realm creation and never
/// modified afterward (§9, "Global mutable state").
#[derive(Debug, Clone)]
pub struct WellKnownSymbols {
    pub iterator: JsSymbol,
    pub async_iterator: JsSymbol,
    pub has_instance: JsSymbol,
    pub is_concat_spreadable: JsSymbol,
    pub to_primitive: JsSymbol,
    pub to_string_tag: JsSymbol,
    pub unscopables: JsSymbol,
    pub species: JsSymbol,
}

impl WellKnownSymbols {
    pub fn new() -> Self {
        Self {
            iterator: JsSymbol::new(Some("Symbol.iterator".into())),
            async_iterator: JsSymbol::new(Some("Symbol.asyncIterator".into())),
            has_instance: JsSymbol::new(Some("Symbol.hasInstance".into())),
            is_concat_spreadable: JsSymbol::new(Some("Symbol.isConcatSpreadable".into())),
            to_primitive: JsSymbol::new(Some("Symbol.toPrimitive".into())),
            to_string_tag: JsSymbol::new(Some("Symbol.toStringTag".into())),
            unscopables: JsSymbol::new(Some("Symbol.unscopables".into())),
            species: JsSymbol::new(Some("Symbol.species".into())),
        }
    }
}

impl Default for WellKnownSymbols {
    fn default() -> Self {
        Self::new()
    }
}
