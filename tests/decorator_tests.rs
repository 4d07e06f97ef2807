//! Clearing, soft-quota bypass, statistics, owning and guarantee decorators

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use bufquota_mem::{
    BufferAllocator, ClearingBufferAllocator, CountingStatisticsCollector, GuaranteeMemory,
    HeapBufferAllocator, MemTracker, MemoryLimit, MemoryStatisticsCollectingBufferAllocator,
    OwningBufferAllocator, SoftQuotaBypassingBufferAllocator, StatisticsSnapshot,
};

#[test]
fn test_clearing_zeroes_new_and_extended_memory() {
    let clearing = ClearingBufferAllocator::new(HeapBufferAllocator::new());

    let mut buffer = clearing.allocate(16).expect("allocate");
    assert!(buffer.iter().all(|&b| b == 0));

    buffer.fill(1);
    assert!(clearing.reallocate(32, &mut buffer));
    assert!(buffer[..16].iter().all(|&b| b == 1));
    assert!(buffer[16..].iter().all(|&b| b == 0));

    let mut slot = None;
    assert!(clearing.best_effort_reallocate_slot(8, 8, &mut slot));
    assert!(slot.iter().flat_map(|b| b.iter()).all(|&b| b == 0));
}

#[test]
fn test_bypass_reports_at_least_bypass_amount() {
    let soft = MemoryLimit::with_enforcement(100, false, HeapBufferAllocator::new());
    let bypass = SoftQuotaBypassingBufferAllocator::new(soft, 1000);

    assert!(bypass.available() >= 1000);

    // The soft limit alone would have capped this at 100 bytes.
    let burst = bypass.best_effort_allocate(600, 1).expect("burst");
    assert_eq!(burst.size(), 600);
    assert_eq!(bypass.usage(), 600);
    assert_eq!(bypass.available(), 400);

    drop(burst);
    assert_eq!(bypass.usage(), 0);
    assert_eq!(bypass.available(), 1000);
}

#[test]
fn test_bypass_never_exceeds_hard_quota() {
    let hard = MemoryLimit::new(100, HeapBufferAllocator::new());
    let bypass = SoftQuotaBypassingBufferAllocator::new(&hard, 1000);

    // The aggressive attempt is refused, the fallback is capped.
    let buffer = bypass.best_effort_allocate(600, 1).expect("fallback");
    assert_eq!(buffer.size(), 100);
    assert_eq!(hard.usage(), 100);
    assert!(bypass.allocate(1).is_none());
}

#[test]
fn test_bypass_degrades_to_minimal_past_bypass_amount() {
    let soft = MemoryLimit::with_enforcement(100, false, HeapBufferAllocator::new());
    let bypass = SoftQuotaBypassingBufferAllocator::new(soft, 300);

    let first = bypass.best_effort_allocate(300, 1).expect("within bypass");
    assert_eq!(first.size(), 300);
    assert_eq!(bypass.available(), 0);

    let second = bypass.best_effort_allocate(300, 10).expect("soft minimal");
    assert_eq!(second.size(), 10);
}

#[test]
fn test_statistics_are_collected() {
    let stats = MemoryStatisticsCollectingBufferAllocator::new(
        MemoryLimit::new(100, HeapBufferAllocator::new()),
        CountingStatisticsCollector::new(),
    );

    let mut a = stats.allocate(60).expect("a");
    assert!(stats.allocate(60).is_none());
    let b = stats.best_effort_allocate(60, 10).expect("b");
    assert_eq!(b.size(), 40);

    assert!(!stats.reallocate(80, &mut a));
    drop(b);
    assert!(stats.reallocate(20, &mut a));
    drop(a);

    let snapshot = stats.collector().snapshot();
    assert_eq!(
        snapshot,
        StatisticsSnapshot {
            allocated_bytes: 100,
            refused_bytes: 60 + 20,
            freed_bytes: 100,
            allocations: 2,
            refusals: 2,
            frees: 3,
        }
    );
    assert_eq!(snapshot.outstanding_bytes(), 0);

    let json = serde_json::to_string(&snapshot).expect("serialize");
    assert!(json.contains("\"allocated_bytes\":100"));
}

#[test]
fn test_refused_growth_is_reported_even_with_small_minimal() {
    let stats = MemoryStatisticsCollectingBufferAllocator::new(
        GuaranteeMemory::new(1000, HeapBufferAllocator::new()),
        CountingStatisticsCollector::new(),
    );
    let mut buffer = stats.allocate(600).expect("allocate");
    let _rest = stats.allocate(400).expect("rest");

    assert!(!stats.best_effort_reallocate(700, 10, &mut buffer));
    assert_eq!(buffer.size(), 600);

    let snapshot = stats.collector().snapshot();
    assert_eq!(snapshot.refusals, 1);
    assert_eq!(snapshot.refused_bytes, 100);
}

struct DropRecorder {
    id: u32,
    log: Rc<RefCell<Vec<u32>>>,
}

impl Drop for DropRecorder {
    fn drop(&mut self) {
        self.log.borrow_mut().push(self.id);
    }
}

#[test]
fn test_owning_destroys_objects_in_reverse_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let heap = HeapBufferAllocator::new();
    let mut owning = OwningBufferAllocator::new(&heap);
    for id in 1..=3 {
        owning.add(DropRecorder {
            id,
            log: Rc::clone(&log),
        });
    }
    assert_eq!(owning.len(), 3);

    {
        let buffer = owning.allocate(10).expect("allocate");
        assert_eq!(buffer.size(), 10);
    }
    assert!(log.borrow().is_empty());

    drop(owning);
    assert_eq!(*log.borrow(), vec![3, 2, 1]);
}

#[test]
fn test_owning_binds_heterogeneous_objects() {
    let tracker = MemTracker::new_root("owned", None);
    let collector = Arc::new(CountingStatisticsCollector::new());

    let mut owning: OwningBufferAllocator<_> =
        OwningBufferAllocator::new(HeapBufferAllocator::new());
    owning
        .add(Box::new(Arc::clone(&tracker)))
        .add(Box::new(Arc::clone(&collector)));
    assert_eq!(Arc::strong_count(&tracker), 2);

    drop(owning);
    assert_eq!(Arc::strong_count(&tracker), 1);
    assert_eq!(Arc::strong_count(&collector), 1);
}

#[test]
fn test_guarantee_is_all_or_nothing() {
    let guarantee = GuaranteeMemory::new(1000, HeapBufferAllocator::new());

    assert!(guarantee.allocate(1001).is_none());
    assert!(guarantee.best_effort_allocate(1001, 1).is_none());
    assert_eq!(guarantee.usage(), 0);

    let buffer = guarantee.allocate(1000).expect("exact fit");
    assert_eq!(buffer.size(), 1000);
    assert!(guarantee.allocate(1).is_none());
    assert!(guarantee.best_effort_allocate(5, 1).is_none());

    drop(buffer);
    assert_eq!(guarantee.available(), 1000);
}

#[test]
fn test_collector_shared_between_allocators() {
    let heap = HeapBufferAllocator::new();
    let collector = Arc::new(CountingStatisticsCollector::new());
    let left = MemoryStatisticsCollectingBufferAllocator::new(&heap, Arc::clone(&collector));
    let right = MemoryStatisticsCollectingBufferAllocator::new(&heap, Arc::clone(&collector));

    let a = left.allocate(10).expect("left");
    let b = right.allocate(20).expect("right");
    assert_eq!(collector.snapshot().outstanding_bytes(), 30);

    drop((a, b));
    let snapshot = collector.snapshot();
    assert_eq!(snapshot.allocations, 2);
    assert_eq!(snapshot.frees, 2);
    assert_eq!(snapshot.outstanding_bytes(), 0);
}
