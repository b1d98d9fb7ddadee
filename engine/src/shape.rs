//! Shapes: immutable, shared hidden-class descriptors for object layout.
//!
//! A `Shape` never mutates once created. Adding a property to an object
//! computes (or reuses) a child shape reached by the edge `(name, attrs)`
//! from the object's current shape; two objects that add the same property
//! names with the same attributes in the same order end up pointing at the
//! *same* `Shape`, which is what makes `(shape, offset)` a valid cache key
//! for a monomorphic property-access call site.

use crate::property::Attribute;
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

pub type ShapeId = u64;

/// Where a named property lives within an object that has this shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyInfo {
    pub offset: usize,
    pub attributes: Attribute,
}

/// Inline slot capacity before properties spill into an object's overflow
/// map (§3: "Capacity of inline storage up to 32 properties").
pub const INLINE_CAPACITY: usize = 32;

#[derive(Debug)]
struct ShapeInner {
    id: ShapeId,
    parent: Option<Shape>,
    transition_key: Option<Box<str>>,
    transition_attrs: Option<Attribute>,
    /// Full property map inherited from `parent` plus this shape's own
    /// addition, insertion-ordered (order is observable, per §4.1).
    properties: IndexMap<Box<str>, PropertyInfo, BuildHasherDefault<FxHasher>>,
}

/// A node in the shape transition tree. Cheaply `Clone`-able (an `Arc`
/// bump); identity (`Shape::ptr_eq`) is what "two objects share a shape"
/// means.
#[derive(Debug, Clone)]
pub struct Shape(Arc<ShapeInner>);

impl Shape {
    pub fn id(&self) -> ShapeId {
        self.0.id
    }

    pub fn len(&self) -> usize {
        self.0.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.properties.is_empty()
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.properties.contains_key(name)
    }

    pub fn get_info(&self, name: &str) -> Option<PropertyInfo> {
        self.0.properties.get(name).copied()
    }

    /// Iterates property names in the shape's insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.properties.keys().map(|k| k.as_ref())
    }

    pub fn ptr_eq(a: &Shape, b: &Shape) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Returns the unique child shape reached by adding `name` with
    /// `attrs`, creating and caching it in the process-global transition
    /// table if this is the first object to take this edge.
    pub fn add(&self, name: &str, attrs: Attribute) -> Shape {
        TransitionTable::global().add(self, name, attrs)
    }
}

/// `(parent shape id, property name, attributes)` — the transition table's
/// key, per §4.1: "The transition table is keyed by `(parent_shape, name,
/// attrs)`."
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TransitionKey {
    parent: ShapeId,
    name: Box<str>,
    attrs: Attribute,
}

/// Process-global, monotonically growing DAG of shapes (§9: "Shape
/// transition table: keyed by (shape_id, name, attrs). Process-wide.").
pub struct TransitionTable {
    next_id: AtomicU64,
    edges: Mutex<FxHashMap<TransitionKey, Shape>>,
    root: OnceLock<Shape>,
}

static TABLE: OnceLock<TransitionTable> = OnceLock::new();

impl TransitionTable {
    pub fn global() -> &'static TransitionTable {
        TABLE.get_or_init(TransitionTable::new)
    }

    fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            edges: Mutex::new(FxHashMap::default()),
            root: OnceLock::new(),
        }
    }

    fn alloc_id(&self) -> ShapeId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// The empty shape shared by every freshly allocated ordinary object.
    pub fn root(&self) -> Shape {
        self.root
            .get_or_init(|| {
                Shape(Arc::new(ShapeInner {
                    id: self.alloc_id(),
                    parent: None,
                    transition_key: None,
                    transition_attrs: None,
                    properties: IndexMap::default(),
                }))
            })
            .clone()
    }

    fn add(&self, parent: &Shape, name: &str, attrs: Attribute) -> Shape {
        let key = TransitionKey {
            parent: parent.id(),
            name: name.into(),
            attrs,
        };
        let mut edges = self.edges.lock().expect("shape transition table poisoned");
        if let Some(existing) = edges.get(&key) {
            return existing.clone();
        }
        let offset = parent.len();
        let mut properties = parent.0.properties.clone();
        properties.insert(
            name.into(),
            PropertyInfo {
                offset,
                attributes: attrs,
            },
        );
        let child = Shape(Arc::new(ShapeInner {
            id: self.alloc_id(),
            parent: Some(parent.clone()),
            transition_key: Some(name.into()),
            transition_attrs: Some(attrs),
            properties,
        }));
        edges.insert(key, child.clone());
        log::trace!("shape: new transition {} --{name}--> {} ({} edges total)", parent.id(), child.id(), edges.len());
        if edges.len().is_power_of_two() {
            log::debug!("shape transition table grew to {} edges", edges.len());
        }
        child
    }
}

pub fn root_shape() -> Shape {
    TransitionTable::global().root()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_addition_sequences_share_a_shape() {
        let root = root_shape();
        let attrs = Attribute::default();
        let a = root.add("x", attrs).add("y", attrs);
        let b = root.add("x", attrs).add("y", attrs);
        assert!(Shape::ptr_eq(&a, &b));
        assert_eq!(a.get_info("y").unwrap().offset, 1);
    }

    #[test]
    fn different_order_diverges() {
        let root = root_shape();
        let attrs = Attribute::default();
        let a = root.add("x", attrs).add("y", attrs);
        let b = root.add("y", attrs).add("x", attrs);
        assert!(!Shape::ptr_eq(&a, &b));
    }

    #[test]
    fn different_attributes_diverge() {
        let root = root_shape();
        let a = root.add("x", Attribute::default());
        let b = root.add("x", Attribute::ENUMERABLE);
        assert!(!Shape::ptr_eq(&a, &b));
    }
}
