//! Property keys, attributes, and descriptors.
//!
//! More information:
//!  - [ECMAScript reference][spec]
//!
//! [spec]: https://tc39.es/ecma262/#sec-property-descriptor-specification-type

use crate::object::JsObject;
use crate::symbol::JsSymbol;
use crate::value::JsValue;
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// The three boolean attributes every own property carries, in addition
    /// to whatever the `PropertyDescriptor`'s own value/accessor fields say.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Attribute: u8 {
        const WRITABLE     = 0b0000_0001;
        const ENUMERABLE   = 0b0000_0010;
        const CONFIGURABLE = 0b0000_0100;
    }
}

impl Default for Attribute {
    fn default() -> Self {
        Attribute::WRITABLE | Attribute::ENUMERABLE | Attribute::CONFIGURABLE
    }
}

/// A property key: a string, a well-known/unique symbol, or a canonical
/// array index (kept as a distinct variant so integer-indexed storage never
/// has to re-parse a string, per §4.1/§4.2 of the object access protocol).
#[derive(Debug, Clone)]
pub enum PropertyKey {
    String(Box<str>),
    Symbol(JsSymbol),
    Index(u32),
}

impl PropertyKey {
    /// `true` iff `s` is a canonical, non-negative, `<= 2^32 - 2` array
    /// index: nonempty, all digits, no leading zero (except the literal
    /// `"0"`), round-trips through a `u32` parse/print.
    pub fn parse_array_index(s: &str) -> Option<u32> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if s.len() > 1 && s.as_bytes()[0] == b'0' {
            return None;
        }
        let n: u64 = s.parse().ok()?;
        if n > u32::MAX as u64 - 1 {
            return None;
        }
        let n = n as u32;
        if n.to_string() == s {
            Some(n)
        } else {
            None
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{s}"),
            PropertyKey::Symbol(s) => write!(f, "{s}"),
            PropertyKey::Index(i) => write!(f, "{i}"),
        }
    }
}

impl PartialEq for PropertyKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyKey::String(a), PropertyKey::String(b)) => a == b,
            (PropertyKey::Symbol(a), PropertyKey::Symbol(b)) => a == b,
            (PropertyKey::Index(a), PropertyKey::Index(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for PropertyKey {}

impl std::hash::Hash for PropertyKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            PropertyKey::String(s) => {
                0u8.hash(state);
                s.hash(state);
            }
            PropertyKey::Symbol(s) => {
                1u8.hash(state);
                s.hash(state);
            }
            PropertyKey::Index(i) => {
                2u8.hash(state);
                i.hash(state);
            }
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        match PropertyKey::parse_array_index(s) {
            Some(i) => PropertyKey::Index(i),
            None => PropertyKey::String(s.into()),
        }
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        PropertyKey::from(s.as_str())
    }
}

impl From<JsSymbol> for PropertyKey {
    fn from(s: JsSymbol) -> Self {
        PropertyKey::Symbol(s)
    }
}

macro_rules! impl_index_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for PropertyKey {
            fn from(i: $ty) -> Self {
                PropertyKey::Index(i as u32)
            }
        })*
    };
}
impl_index_from!(u8, u16, u32, usize);

/// Whether a [`PropertyDescriptor`] describes a data property, an accessor
/// property, or carries only attribute bits ("generic", used for partial
/// updates through `defineProperty`).
#[derive(Debug, Clone)]
pub enum PropertyDescriptor {
    Data(DataDescriptor),
    Accessor(AccessorDescriptor),
    Generic(GenericDescriptor),
}

/// Presence bits distinguishing "attribute omitted" from "attribute
/// explicitly set to its default `false`", per §3.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Presence {
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

#[derive(Debug, Clone)]
pub struct DataDescriptor {
    pub value: JsValue,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
    pub present: Presence,
}

#[derive(Debug, Clone)]
pub struct AccessorDescriptor {
    pub get: Option<JsObject>,
    pub set: Option<JsObject>,
    pub enumerable: bool,
    pub configurable: bool,
    pub present: Presence,
}

#[derive(Debug, Clone, Default)]
pub struct GenericDescriptor {
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
    pub writable: Option<bool>,
}

impl PropertyDescriptor {
    pub fn is_data_descriptor(&self) -> bool {
        matches!(self, PropertyDescriptor::Data(_))
    }

    pub fn is_accessor_descriptor(&self) -> bool {
        matches!(self, PropertyDescriptor::Accessor(_))
    }

    pub fn is_generic_descriptor(&self) -> bool {
        matches!(self, PropertyDescriptor::Generic(_))
    }

    pub fn enumerable(&self) -> bool {
        match self {
            PropertyDescriptor::Data(d) => d.enumerable,
            PropertyDescriptor::Accessor(a) => a.enumerable,
            PropertyDescriptor::Generic(g) => g.enumerable.unwrap_or(false),
        }
    }

    pub fn configurable(&self) -> bool {
        match self {
            PropertyDescriptor::Data(d) => d.configurable,
            PropertyDescriptor::Accessor(a) => a.configurable,
            PropertyDescriptor::Generic(g) => g.configurable.unwrap_or(false),
        }
    }

    pub fn writable(&self) -> Option<bool> {
        match self {
            PropertyDescriptor::Data(d) => Some(d.writable),
            PropertyDescriptor::Accessor(_) => None,
            PropertyDescriptor::Generic(g) => g.writable,
        }
    }

    pub fn value(&self) -> Option<&JsValue> {
        match self {
            PropertyDescriptor::Data(d) => Some(&d.value),
            _ => None,
        }
    }

    pub fn getter(&self) -> Option<&JsObject> {
        match self {
            PropertyDescriptor::Accessor(a) => a.get.as_ref(),
            _ => None,
        }
    }

    pub fn setter(&self) -> Option<&JsObject> {
        match self {
            PropertyDescriptor::Accessor(a) => a.set.as_ref(),
            _ => None,
        }
    }

    /// Builder entry point, mirroring the fluent `PropertyDescriptor::builder()`
    /// idiom used throughout the engine's built-in registration code.
    pub fn builder() -> PropertyDescriptorBuilder {
        PropertyDescriptorBuilder::default()
    }

    /// A plain, fully-present data descriptor with the default attributes
    /// (writable, enumerable, configurable all `true`) — the shape the
    /// object access protocol creates implicitly for `obj.x = v`.
    pub fn default_data(value: JsValue) -> Self {
        PropertyDescriptor::Data(DataDescriptor {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
            present: Presence {
                writable: true,
                enumerable: true,
                configurable: true,
            },
        })
    }

    pub fn from_attribute(value: JsValue, attrs: Attribute) -> Self {
        PropertyDescriptor::Data(DataDescriptor {
            value,
            writable: attrs.contains(Attribute::WRITABLE),
            enumerable: attrs.contains(Attribute::ENUMERABLE),
            configurable: attrs.contains(Attribute::CONFIGURABLE),
            present: Presence {
                writable: true,
                enumerable: true,
                configurable: true,
            },
        })
    }
}

#[derive(Debug, Default)]
pub struct PropertyDescriptorBuilder {
    value: Option<JsValue>,
    get: Option<JsObject>,
    set: Option<JsObject>,
    writable: Option<bool>,
    enumerable: Option<bool>,
    configurable: Option<bool>,
}

impl PropertyDescriptorBuilder {
    pub fn value(mut self, value: impl Into<JsValue>) -> Self {
        self.value = Some(value.into());
        self
    }
    pub fn get(mut self, get: JsObject) -> Self {
        self.get = Some(get);
        self
    }
    pub fn set(mut self, set: JsObject) -> Self {
        self.set = Some(set);
        self
    }
    pub fn writable(mut self, w: bool) -> Self {
        self.writable = Some(w);
        self
    }
    pub fn enumerable(mut self, e: bool) -> Self {
        self.enumerable = Some(e);
        self
    }
    pub fn configurable(mut self, c: bool) -> Self {
        self.configurable = Some(c);
        self
    }

    pub fn build(self) -> PropertyDescriptor {
        let enumerable = self.enumerable.unwrap_or(false);
        let configurable = self.configurable.unwrap_or(false);
        let present = Presence {
            writable: self.writable.is_some(),
            enumerable: self.enumerable.is_some(),
            configurable: self.configurable.is_some(),
        };
        if self.get.is_some() || self.set.is_some() {
            PropertyDescriptor::Accessor(AccessorDescriptor {
                get: self.get,
                set: self.set,
                enumerable,
                configurable,
                present,
            })
        } else if let Some(value) = self.value {
            PropertyDescriptor::Data(DataDescriptor {
                value,
                writable: self.writable.unwrap_or(false),
                enumerable,
                configurable,
                present,
            })
        } else {
            PropertyDescriptor::Generic(GenericDescriptor {
                enumerable: self.enumerable,
                configurable: self.configurable,
                writable: self.writable,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_index_parsing() {
        assert_eq!(PropertyKey::parse_array_index("0"), Some(0));
        assert_eq!(PropertyKey::parse_array_index("12"), Some(12));
        assert_eq!(PropertyKey::parse_array_index("01"), None);
        assert_eq!(PropertyKey::parse_array_index(""), None);
        assert_eq!(PropertyKey::parse_array_index("-1"), None);
        assert_eq!(PropertyKey::parse_array_index("4294967295"), None);
        assert_eq!(PropertyKey::parse_array_index("4294967294"), Some(4294967294));
    }

    #[test]
    fn builder_defaults_to_generic_when_nothing_set() {
        let desc = PropertyDescriptor::builder().configurable(true).build();
        assert!(desc.is_generic_descriptor());
        assert!(desc.configurable());
    }

    #[test]
    fn builder_prefers_accessor_when_getter_present() {
        let desc = PropertyDescriptor::builder().enumerable(true).build();
        assert!(desc.is_generic_descriptor());
    }
}
