//! Fixed-capacity object table with a mark-sweep collector.
//!
//! Every object lives in its own boxed cell registered in one of `capacity`
//! slots; a [`Value`] is the index of that slot. Allocation scans forward from
//! the most recently used slot, wrapping around once. The owner of the heap
//! decides when to collect, because only it knows the root set.
//!
//! Marks are kept in a side bit vector rather than in the cells, so the unmark
//! phase is a single wholesale clear.

use super::{object::Object, value::Value};
use crate::utils::bitvec::BitVector;

/// Smallest table the runtime will agree to run with.
pub const MIN_SLOTS: usize = 256;

#[derive(Clone, Debug, Default)]
pub struct GcStats {
    pub collections: usize,
    pub total_allocated: usize,
    pub total_freed: usize,
}

pub struct Heap {
    slots: Box<[Option<Box<Object>>]>,
    marks: BitVector,
    /// Slot handed out by the most recent allocation.
    cursor: usize,
    live: usize,
    pub stats: GcStats,
}

impl Heap {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_SLOTS);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        let mut slots = slots.into_boxed_slice();
        slots[0] = Some(Box::new(Object::Nil));

        Self {
            slots,
            marks: BitVector::new(capacity),
            cursor: 0,
            live: 1,
            stats: GcStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots, Nil included.
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn get(&self, value: Value) -> Option<&Object> {
        self.slots.get(value.slot()?)?.as_deref()
    }

    pub fn get_mut(&mut self, value: Value) -> Option<&mut Object> {
        self.slots.get_mut(value.slot()?)?.as_deref_mut()
    }

    pub fn contains(&self, value: Value) -> bool {
        self.get(value).is_some()
    }

    /// Address of the slot table itself.
    pub fn slots_address(&self) -> u64 {
        self.slots.as_ptr() as u64
    }

    fn find_free(&self) -> Option<usize> {
        let capacity = self.capacity();
        (1..=capacity)
            .map(|step| (self.cursor + step) % capacity)
            .find(|&index| self.slots[index].is_none())
    }

    /// Places `object` in the next free slot, handing it back if the table is full.
    pub fn try_allocate(&mut self, object: Object) -> Result<Value, Object> {
        let Some(index) = self.find_free() else {
            return Err(object);
        };

        self.slots[index] = Some(Box::new(object));
        self.cursor = index;
        self.live += 1;
        self.stats.total_allocated += 1;
        Ok(Value::from_raw(index as u64))
    }

    /// Runs one full mark-sweep pass and returns the number of freed slots.
    ///
    /// Handles in `roots` or inside live objects that do not name an occupied
    /// slot are skipped, so corrupted references cannot derail the pass.
    pub fn collect(&mut self, roots: impl IntoIterator<Item = Value>) -> usize {
        self.mark(std::iter::once(Value::NIL).chain(roots));
        let freed = self.sweep();
        self.marks.clear_all();

        self.stats.collections += 1;
        self.stats.total_freed += freed;
        log::debug!(
            target: "forsp::gc",
            "collection #{}: freed {} slots, {} of {} live",
            self.stats.collections,
            freed,
            self.live,
            self.capacity()
        );
        freed
    }

    fn mark(&mut self, roots: impl IntoIterator<Item = Value>) {
        let mut worklist: Vec<Value> = roots.into_iter().collect();

        while let Some(value) = worklist.pop() {
            let Some(index) = value.slot() else { continue };
            let Some(Some(object)) = self.slots.get(index) else {
                continue;
            };
            if self.marks.test_and_set(index) {
                continue;
            }
            object.for_each_reference(|child| worklist.push(child));
        }
    }

    fn sweep(&mut self) -> usize {
        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_some() && !self.marks.get(index) {
                *slot = None;
                freed += 1;
            }
        }
        self.live -= freed;
        freed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(heap: &mut Heap, car: Value, cdr: Value) -> Value {
        match heap.try_allocate(Object::Pair(car, cdr)) {
            Ok(v) => v,
            Err(_) => panic!("heap full"),
        }
    }

    fn number(heap: &mut Heap, n: i64) -> Value {
        match heap.try_allocate(Object::Number(n)) {
            Ok(v) => v,
            Err(_) => panic!("heap full"),
        }
    }

    #[test]
    fn nil_occupies_slot_zero() {
        let heap = Heap::new(0);
        assert_eq!(heap.capacity(), MIN_SLOTS);
        assert!(matches!(heap.get(Value::NIL), Some(Object::Nil)));
        assert_eq!(heap.live(), 1);
    }

    #[test]
    fn allocation_scans_forward_and_wraps() {
        let mut heap = Heap::new(MIN_SLOTS);
        let first = number(&mut heap, 1);
        let second = number(&mut heap, 2);
        assert_eq!(first.raw(), 1);
        assert_eq!(second.raw(), 2);

        for n in 3..MIN_SLOTS as i64 {
            number(&mut heap, n);
        }
        assert!(heap.try_allocate(Object::Number(0)).is_err());

        heap.collect([second]);
        assert_eq!(heap.live(), 2);
        // the scan resumes after the last used slot and wraps to the freed ones
        let next = number(&mut heap, 99);
        assert_eq!(next.raw(), 1);
    }

    #[test]
    fn collection_keeps_reachable_structure() {
        let mut heap = Heap::new(MIN_SLOTS);
        let a = number(&mut heap, 10);
        let b = number(&mut heap, 20);
        let inner = pair(&mut heap, b, Value::NIL);
        let list = pair(&mut heap, a, inner);
        let garbage = number(&mut heap, 30);
        let garbage_pair = pair(&mut heap, garbage, Value::NIL);

        let freed = heap.collect([list]);
        assert_eq!(freed, 2);
        assert!(heap.contains(a) && heap.contains(b) && heap.contains(inner));
        assert!(!heap.contains(garbage) && !heap.contains(garbage_pair));
        assert_eq!(heap.stats.collections, 1);
    }

    #[test]
    fn cycles_terminate_and_survive() {
        let mut heap = Heap::new(MIN_SLOTS);
        let cell = pair(&mut heap, Value::NIL, Value::NIL);
        if let Some(Object::Pair(_, cdr)) = heap.get_mut(cell) {
            *cdr = cell;
        }
        let orphan = pair(&mut heap, Value::NIL, Value::NIL);
        if let Some(Object::Pair(car, _)) = heap.get_mut(orphan) {
            *car = orphan;
        }

        heap.collect([cell]);
        assert!(heap.contains(cell));
        assert!(!heap.contains(orphan));
    }

    #[test]
    fn dangling_handles_are_ignored() {
        let mut heap = Heap::new(MIN_SLOTS);
        let bogus = Value::from_raw(u64::MAX);
        let unused = Value::from_raw(77);
        let holder = pair(&mut heap, bogus, unused);

        heap.collect([holder, bogus]);
        assert!(heap.contains(holder));
        assert!(heap.get(bogus).is_none());
    }

    #[test]
    fn closure_references_are_traced() {
        let mut heap = Heap::new(MIN_SLOTS);
        let body = pair(&mut heap, Value::NIL, Value::NIL);
        let env = pair(&mut heap, Value::NIL, Value::NIL);
        let closure = match heap.try_allocate(Object::Closure { body, env }) {
            Ok(v) => v,
            Err(_) => panic!("heap full"),
        };
        heap.collect([closure]);
        assert!(heap.contains(body) && heap.contains(env));
    }
}
