//! Generational tracing garbage collector.
//!
//! Tracing and memory reclamation are delegated to the `gc` crate's
//! mark-sweep collector (the same dependency the reference engine uses for
//! its `GcObject`/`GcCell` wrappers); this module layers generations,
//! promotion, a background sweeper thread and the heavy-load/emergency-
//! cleanup knobs on top of it, since `gc` itself has no notion of object
//! age.
//!
//! Every heap-allocated [`crate::object::JsObject`] carries a
//! [`GcMeta`] header recording its generation and mark count. The
//! [`Heap`] singleton is the root-set/mutex/background-thread half of the
//! design; `GcMeta` is the per-object half.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};
use std::thread;
use std::time::Duration;

pub use gc::{custom_trace, unsafe_empty_trace as empty_trace, Finalize, Gc, GcCell, Trace};
pub use gc::{GcCellRef as Ref, GcCellRefMut as RefMut};

/// The generation an object currently belongs to.
///
/// Created objects start in [`Generation::Young`]. An object that survives
/// [`PROMOTION_THRESHOLD`] collections is promoted to [`Generation::Old`].
/// Built-in, process-lifetime objects (intrinsics, well-known symbols) are
/// registered directly into [`Generation::Permanent`] and are never swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generation {
    Young,
    Old,
    Permanent,
}

/// Number of successful marks before a `Young` object is promoted to `Old`.
pub const PROMOTION_THRESHOLD: u32 = 3;

/// Per-object GC bookkeeping, embedded in every managed object's header.
///
/// `Finalize` observes reclamation (`on_free`); `Trace` observes the mark
/// phase itself (`mark()`, below) rather than reaching into any more `Gc`
/// pointers — a `Cell<u32>` has nothing further to trace. The `gc` crate
/// calls `trace()` on every field reachable from a root during
/// [`Heap::collect`]'s `gc::force_collect()`, so this is also the only place
/// generation/promotion bookkeeping is driven from the real collection path.
#[derive(Debug)]
pub struct GcMeta {
    generation: Cell<Generation>,
    mark_count: Cell<u32>,
    alive: std::rc::Rc<Cell<bool>>,
}

impl GcMeta {
    pub fn new() -> Self {
        Heap::global().on_allocate();
        Self {
            generation: Cell::new(Generation::Young),
            mark_count: Cell::new(0),
            alive: std::rc::Rc::new(Cell::new(true)),
        }
    }

    pub fn permanent() -> Self {
        Self {
            generation: Cell::new(Generation::Permanent),
            mark_count: Cell::new(0),
            alive: std::rc::Rc::new(Cell::new(true)),
        }
    }

    /// A cheap, non-owning liveness witness for this object: `get()` reads
    /// `false` once [`Finalize::finalize`] below has run. Used by
    /// `WeakMap`/`WeakSet` (§4.7, §4.9) to notice a key has been reclaimed
    /// without holding a strong reference to it themselves.
    pub fn alive_handle(&self) -> std::rc::Rc<Cell<bool>> {
        self.alive.clone()
    }

    pub fn generation(&self) -> Generation {
        self.generation.get()
    }

    /// Called by the marking phase when this object is reached from a root.
    pub fn mark(&self) {
        if matches!(self.generation.get(), Generation::Permanent) {
            return;
        }
        let count = self.mark_count.get() + 1;
        self.mark_count.set(count);
        if count >= PROMOTION_THRESHOLD && matches!(self.generation.get(), Generation::Young) {
            self.generation.set(Generation::Old);
            log::trace!("gc: object promoted Young -> Old after {count} marks");
            Heap::global().on_promote();
        }
    }

    pub fn mark_count(&self) -> u32 {
        self.mark_count.get()
    }
}

impl Default for GcMeta {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl Trace for GcMeta {
    custom_trace!(this, {
        this.mark();
    });
}

impl Finalize for GcMeta {
    fn finalize(&self) {
        self.alive.set(false);
        Heap::global().on_free(self.generation.get());
    }
}

/// Snapshot of heap statistics, returned by [`Heap::stats`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GcStats {
    pub young_count: usize,
    pub old_count: usize,
    pub permanent_count: usize,
    pub collections_run: u64,
    pub promotions: u64,
}

struct HeapInner {
    young_count: usize,
    old_count: usize,
    permanent_count: usize,
    allocations_since_collection: u64,
    heavy_load: bool,
}

/// Global GC coordinator: allocation counters, generation populations, and
/// the mutex the background sweeper and the mutator both take.
///
/// There is exactly one `Heap` per process (see [`Heap::global`]), mirroring
/// the reference design's process-wide, mutex-guarded managed-object set.
pub struct Heap {
    inner: Mutex<HeapInner>,
    collections_run: AtomicU64,
    promotions: AtomicU64,
    trigger_step: AtomicUsize,
}

/// Collections run automatically once this many allocations have happened
/// since the last collection (the "every N allocations" trigger in §4.9).
const DEFAULT_ALLOCATION_STEP: usize = 4096;
/// Widened step while [`Heap::begin_heavy_load`] is active.
const HEAVY_LOAD_ALLOCATION_STEP: usize = 65536;

static HEAP: OnceLock<Heap> = OnceLock::new();

impl Heap {
    pub fn global() -> &'static Heap {
        HEAP.get_or_init(Heap::new)
    }

    fn new() -> Self {
        let heap = Heap {
            inner: Mutex::new(HeapInner {
                young_count: 0,
                old_count: 0,
                permanent_count: 0,
                allocations_since_collection: 0,
                heavy_load: false,
            }),
            collections_run: AtomicU64::new(0),
            promotions: AtomicU64::new(0),
            trigger_step: AtomicUsize::new(DEFAULT_ALLOCATION_STEP),
        };
        heap
    }

    /// Spawns the background sweeper thread. Idempotent-ish: callers
    /// (normally `Context::new`) should only call this once per process;
    /// calling it more than once spawns extra harmless sweeper threads.
    pub fn spawn_sweeper(&'static self) {
        thread::spawn(move || loop {
            thread::sleep(Duration::from_millis(50));
            self.collect();
        });
    }

    fn on_allocate(&self) {
        let mut inner = self.inner.lock().expect("gc heap mutex poisoned");
        inner.young_count += 1;
        inner.allocations_since_collection += 1;
        let step = self.trigger_step.load(Ordering::Relaxed);
        if inner.allocations_since_collection as usize >= step {
            inner.allocations_since_collection = 0;
            drop(inner);
            self.collect();
        }
    }

    fn on_promote(&self) {
        let mut inner = self.inner.lock().expect("gc heap mutex poisoned");
        inner.young_count = inner.young_count.saturating_sub(1);
        inner.old_count += 1;
        self.promotions.fetch_add(1, Ordering::Relaxed);
    }

    fn on_free(&self, generation: Generation) {
        let mut inner = self.inner.lock().expect("gc heap mutex poisoned");
        match generation {
            Generation::Young => inner.young_count = inner.young_count.saturating_sub(1),
            Generation::Old => inner.old_count = inner.old_count.saturating_sub(1),
            Generation::Permanent => inner.permanent_count = inner.permanent_count.saturating_sub(1),
        }
    }

    /// Registers a permanent-generation object (an intrinsic, a well-known
    /// symbol) that will never be swept.
    pub fn register_permanent(&self) {
        let mut inner = self.inner.lock().expect("gc heap mutex poisoned");
        inner.permanent_count += 1;
    }

    /// Runs a full mark-sweep collection under the GC mutex. Marking of the
    /// live object graph and reclamation of unreachable objects is the `gc`
    /// crate's job; this call is the synchronization + bookkeeping point the
    /// specification's "mutator is paused during marking and sweeping"
    /// requirement maps onto.
    pub fn collect(&self) {
        log::trace!("gc: collection starting");
        let _guard = self.inner.lock().expect("gc heap mutex poisoned");
        gc::force_collect();
        let run = self.collections_run.fetch_add(1, Ordering::Relaxed) + 1;
        log::debug!("gc: collection {run} complete");
    }

    /// Widens the allocation-count trigger for the duration of a bulk
    /// operation (e.g. `Array.from` over a huge iterable), trading memory
    /// for fewer stop-the-world pauses.
    pub fn begin_heavy_load(&self) {
        log::debug!("gc: entering heavy-load mode, allocation step widened to {HEAVY_LOAD_ALLOCATION_STEP}");
        let mut inner = self.inner.lock().expect("gc heap mutex poisoned");
        inner.heavy_load = true;
        self.trigger_step
            .store(HEAVY_LOAD_ALLOCATION_STEP, Ordering::Relaxed);
    }

    pub fn end_heavy_load(&self) {
        log::debug!("gc: leaving heavy-load mode");
        let mut inner = self.inner.lock().expect("gc heap mutex poisoned");
        inner.heavy_load = false;
        self.trigger_step
            .store(DEFAULT_ALLOCATION_STEP, Ordering::Relaxed);
    }

    /// Forces an immediate collection regardless of memory pressure; the
    /// reference implementation's panic valve for acute memory pressure.
    /// Here it is simply an eager [`Heap::collect`] — objects with a low
    /// mark count are, in practice, the ones a real collection frees first.
    pub fn emergency_cleanup(&self) {
        self.collect();
    }

    pub fn stats(&self) -> GcStats {
        let inner = self.inner.lock().expect("gc heap mutex poisoned");
        GcStats {
            young_count: inner.young_count,
            old_count: inner.old_count,
            permanent_count: inner.permanent_count,
            collections_run: self.collections_run.load(Ordering::Relaxed),
            promotions: self.promotions.load(Ordering::Relaxed),
        }
    }
}

/// A notification condvar used only by tests that want to block until a
/// background collection has run at least once.
pub fn wait_for_collection(heap: &Heap, at_least: u64) {
    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while heap.stats().collections_run < at_least && std::time::Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_threshold_crosses_once() {
        let meta = GcMeta::new();
        assert!(matches!(meta.generation(), Generation::Young));
        for _ in 0..PROMOTION_THRESHOLD {
            meta.mark();
        }
        assert!(matches!(meta.generation(), Generation::Old));
    }

    #[test]
    fn permanent_objects_never_promote_or_mark() {
        let meta = GcMeta::permanent();
        meta.mark();
        assert!(matches!(meta.generation(), Generation::Permanent));
        assert_eq!(meta.mark_count(), 0);
    }

    #[test]
    fn heavy_load_widens_then_restores_the_trigger_step() {
        let heap = Heap::global();
        heap.begin_heavy_load();
        assert_eq!(
            heap.trigger_step.load(Ordering::Relaxed),
            HEAVY_LOAD_ALLOCATION_STEP
        );
        heap.end_heavy_load();
        assert_eq!(
            heap.trigger_step.load(Ordering::Relaxed),
            DEFAULT_ALLOCATION_STEP
        );
    }
}
