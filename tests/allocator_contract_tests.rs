//! Contract every allocator in the family must honor

use std::sync::Arc;

use bufquota_mem::{
    BufferAllocator, ClearingBufferAllocator, CountingStatisticsCollector, Error,
    GuaranteeMemory, HeapBufferAllocator, MemTracker, MemoryLimit,
    MemoryStatisticsCollectingBufferAllocator, MemoryTrackingBufferAllocator,
    OwningBufferAllocator, SoftQuotaBypassingBufferAllocator, ThreadSafeBufferAllocator,
    ThreadSafeMemoryLimit,
};

const QUOTA: usize = 4096;

fn boxed<'a>(allocator: impl BufferAllocator + 'a) -> Box<dyn BufferAllocator + 'a> {
    Box::new(allocator)
}

/// One instance of every allocator, each bounded by `QUOTA` where it has a bound.
fn family(heap: &HeapBufferAllocator) -> Vec<(&'static str, Box<dyn BufferAllocator + '_>)> {
    vec![
        ("heap", boxed(heap)),
        ("memory_limit", boxed(MemoryLimit::new(QUOTA, heap))),
        (
            "soft_memory_limit",
            boxed(MemoryLimit::with_enforcement(QUOTA, false, heap)),
        ),
        (
            "clearing",
            boxed(ClearingBufferAllocator::new(MemoryLimit::new(QUOTA, heap))),
        ),
        (
            "bypass",
            boxed(SoftQuotaBypassingBufferAllocator::new(
                MemoryLimit::with_enforcement(QUOTA, false, heap),
                QUOTA / 2,
            )),
        ),
        (
            "stats",
            boxed(MemoryStatisticsCollectingBufferAllocator::new(
                MemoryLimit::new(QUOTA, heap),
                CountingStatisticsCollector::new(),
            )),
        ),
        (
            "tracking",
            boxed(MemoryTrackingBufferAllocator::with_enforcement(
                heap,
                MemTracker::new_root("contract", Some(QUOTA as i64)),
                true,
            )),
        ),
        (
            "thread_safe",
            boxed(ThreadSafeBufferAllocator::new(MemoryLimit::new(QUOTA, heap))),
        ),
        (
            "thread_safe_memory_limit",
            boxed(ThreadSafeMemoryLimit::new(QUOTA, true, heap)),
        ),
        ("owning", boxed(OwningBufferAllocator::<_, ()>::new(heap))),
        ("guarantee", boxed(GuaranteeMemory::new(QUOTA, heap))),
    ]
}

#[test]
fn test_allocate_zero_is_non_null_and_empty() {
    let heap = HeapBufferAllocator::new();
    for (name, allocator) in family(&heap) {
        let buffer = allocator
            .allocate(0)
            .unwrap_or_else(|| panic!("{name}: allocate(0) failed"));
        assert_eq!(buffer.size(), 0, "{name}");
        assert!(buffer.is_empty(), "{name}");
        assert!(!buffer.as_ptr().is_null(), "{name}");
    }
}

#[test]
fn test_best_effort_sizes_stay_in_range() {
    let heap = HeapBufferAllocator::new();
    let cases = [(100, 100), (1000, 10), (QUOTA, 1), (2 * QUOTA, QUOTA / 4)];
    for (name, allocator) in family(&heap) {
        for (requested, minimal) in cases {
            if let Some(buffer) = allocator.best_effort_allocate(requested, minimal) {
                assert!(
                    buffer.size() >= minimal && buffer.size() <= requested,
                    "{name}: size {} outside [{minimal}, {requested}]",
                    buffer.size()
                );
            }
        }
    }
}

#[test]
fn test_zero_minimal_never_fails_under_exhausted_hard_quota() {
    let limit = MemoryLimit::new(64, HeapBufferAllocator::new());
    let _hog = limit.allocate(64).expect("fill the quota");
    assert_eq!(limit.available(), 0);

    let buffer = limit
        .best_effort_allocate(100, 0)
        .expect("minimal 0 must succeed");
    assert_eq!(buffer.size(), 0);
    assert_eq!(limit.usage(), 64);
}

#[test]
fn test_same_size_reallocation_is_a_noop() {
    let heap = HeapBufferAllocator::new();
    for (name, allocator) in family(&heap) {
        let mut buffer = allocator.allocate(32).expect("allocate");
        buffer.copy_from_slice(&[0xAB; 32]);
        assert!(allocator.reallocate(32, &mut buffer), "{name}");
        assert_eq!(buffer.size(), 32, "{name}");
        assert!(buffer.iter().all(|&b| b == 0xAB), "{name}");
    }
}

#[test]
fn test_same_size_reallocation_succeeds_near_the_quota() {
    let heap = HeapBufferAllocator::new();
    for (name, allocator) in family(&heap) {
        let mut buffer = allocator.allocate(3000).expect("allocate");
        buffer.fill(0x5A);

        assert!(allocator.reallocate(3000, &mut buffer), "{name}: same size");
        assert_eq!(buffer.size(), 3000, "{name}");
        assert!(allocator.reallocate(2500, &mut buffer), "{name}: shrink");
        assert_eq!(buffer.size(), 2500, "{name}");
        assert!(allocator.reallocate(3000, &mut buffer), "{name}: regrow");
        assert!(buffer[..2500].iter().all(|&b| b == 0x5A), "{name}");
    }
}

#[test]
fn test_reallocation_preserves_content() {
    let heap = HeapBufferAllocator::new();
    for (name, allocator) in family(&heap) {
        let mut buffer = allocator.allocate(16).expect("allocate");
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = i as u8;
        }

        assert!(allocator.reallocate(256, &mut buffer), "{name}: grow");
        assert_eq!(buffer.size(), 256);
        assert!(buffer[..16].iter().enumerate().all(|(i, &b)| b == i as u8));

        assert!(allocator.reallocate(8, &mut buffer), "{name}: shrink");
        assert_eq!(buffer.size(), 8);
        assert!(buffer.iter().enumerate().all(|(i, &b)| b == i as u8));
    }
}

#[test]
fn test_failed_reallocation_leaves_buffer_untouched() {
    let limit = MemoryLimit::new(100, HeapBufferAllocator::new());
    let mut buffer = limit.allocate(50).expect("allocate");
    buffer.fill(7);
    let data = buffer.as_ptr();

    assert!(!limit.reallocate(200, &mut buffer));
    assert_eq!(buffer.size(), 50);
    assert_eq!(buffer.as_ptr(), data);
    assert!(buffer.iter().all(|&b| b == 7));
    assert_eq!(limit.usage(), 50);
}

#[test]
fn test_usage_returns_to_baseline_after_each_pair() {
    let heap = HeapBufferAllocator::new();
    let limit = MemoryLimit::new(QUOTA, &heap);
    let _resident = limit.allocate(100).expect("allocate");
    let baseline = limit.usage();

    for size in [0, 1, 17, 512, QUOTA - 100] {
        let buffer = limit.allocate(size).expect("allocate");
        assert_eq!(limit.usage(), baseline + size);
        drop(buffer);
        assert_eq!(limit.usage(), baseline);
    }

    let mut buffer = limit.allocate(10).expect("allocate");
    assert!(limit.reallocate(1000, &mut buffer));
    assert!(limit.reallocate(3, &mut buffer));
    drop(buffer);
    assert_eq!(limit.usage(), baseline);
}

#[cfg(debug_assertions)]
#[test]
fn test_fresh_memory_is_poisoned_in_debug_builds() {
    let heap = HeapBufferAllocator::new();
    let buffer = heap.allocate(7).expect("allocate");
    assert_eq!(&buffer[..], b"NEWNEWN");

    let mut buffer = heap.allocate(3).expect("allocate");
    buffer.copy_from_slice(b"abc");
    assert!(heap.reallocate(8, &mut buffer));
    assert_eq!(&buffer[..], b"abcNEWNE");
}

#[test]
fn test_slot_reallocation_allocates_when_empty() {
    let limit = MemoryLimit::new(100, HeapBufferAllocator::new());
    let mut slot = None;

    assert!(limit.reallocate_slot(30, &mut slot));
    assert_eq!(slot.as_ref().map(|b| b.size()), Some(30));

    assert!(limit.reallocate_slot(70, &mut slot));
    assert_eq!(slot.as_ref().map(|b| b.size()), Some(70));
    assert_eq!(limit.usage(), 70);

    assert!(!limit.reallocate_slot(120, &mut slot));
    assert_eq!(slot.as_ref().map(|b| b.size()), Some(70));

    slot = None;
    assert_eq!(limit.usage(), 0);
    assert!(!limit.best_effort_reallocate_slot(200, 150, &mut slot));
    assert!(slot.is_none());
}

#[test]
fn test_fallible_variants_report_errors() {
    let limit = MemoryLimit::new(100, HeapBufferAllocator::new());
    let result = limit.try_allocate(200);
    assert!(matches!(
        result,
        Err(Error::AllocationRefused {
            requested: 200,
            minimal: 200,
            available: 100,
        })
    ));

    let mut buffer = limit.try_best_effort_allocate(200, 10).expect("capped");
    assert_eq!(buffer.size(), 100);
    assert!(matches!(
        limit.try_reallocate(150, &mut buffer),
        Err(Error::ReallocationRefused { current: 100, .. })
    ));
    assert_eq!(buffer.size(), 100);
    drop(buffer);
    assert_eq!(limit.usage(), 0);
}

#[test]
fn test_buffers_report_their_originator() {
    let heap = HeapBufferAllocator::shared();
    let limit = MemoryLimit::new(100, Arc::clone(&heap));
    let buffer = limit.allocate(10).expect("allocate");
    assert_eq!(buffer.allocator().available(), 90);
}
