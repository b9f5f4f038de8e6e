//! Per-channel sample ring
//!
//! ## Overview
//!
//! Every channel record embeds a [`SampleRing`] holding its most recent
//! samples. The sampling path is the only writer; the export path is the
//! only reader. The two may run in different execution contexts (an ADC
//! data-ready interrupt and the main loop), so cursors are atomics and the
//! ring never blocks either side.
//!
//! ## Overwrite-oldest
//!
//! The ring holds exactly `N` samples. Writing into a full ring discards the
//! oldest sample first, so a slow reader sees the last `N` samples in write
//! order and nothing else:
//!
//! ```text
//! Capacity 4, after writes 1..=5:
//!
//!  slot:   0     1     2     3
//!        ┌─────┬─────┬─────┬─────┐
//!        │  5  │  2  │  3  │  4  │
//!        └─────┴─────┴─────┴─────┘
//!           ↑     ↑
//!         head  tail           drain order: 2, 3, 4, 5
//! ```
//!
//! ## Cursors
//!
//! `head` and `tail` count modulo `2N` rather than `N`, so `head == tail`
//! always means empty and a distance of `N` means full. No slot is wasted
//! and `N` need not be a power of two.
//!
//! - The producer owns `head`. When full it first bumps `tail` with a CAS,
//!   then writes the slot, then publishes `head` with Release ordering.
//! - The consumer reads a slot, then claims it by CAS on `tail`. If the
//!   producer discarded that sample in the meantime the CAS fails and the
//!   consumer retries from the new `tail`.
//!
//! ## Batches
//!
//! Export reads a batch with [`SampleRing::peek_batch`], hands it to the
//! consumer, and only then calls [`SampleRing::commit`]. A batch the
//! consumer refuses is simply not committed and is offered again next time.

#![allow(unsafe_code)]

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::ptr;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use heapless::Vec;

/// Ring counters
///
/// Track ring health without touching the data path
#[derive(Debug, Default)]
pub struct RingStats {
    /// Samples written
    pub written: AtomicU32,
    /// Samples handed to the reader and committed
    pub drained: AtomicU32,
    /// Samples discarded because the ring was full
    pub overwritten: AtomicU32,
}

impl RingStats {
    const fn new() -> Self {
        Self {
            written: AtomicU32::new(0),
            drained: AtomicU32::new(0),
            overwritten: AtomicU32::new(0),
        }
    }

    fn reset(&self) {
        self.written.store(0, Ordering::Relaxed);
        self.drained.store(0, Ordering::Relaxed);
        self.overwritten.store(0, Ordering::Relaxed);
    }
}

/// Samples read from the ring but not yet released
#[derive(Debug, Clone)]
pub struct ReadBatch<T, const M: usize> {
    start: usize,
    items: Vec<T, M>,
}

impl<T, const M: usize> ReadBatch<T, M> {
    /// Samples in write order
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of samples in the batch
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the ring had nothing to read
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Keep only the oldest `len` samples; the rest stay in the ring
    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }
}

/// Fixed-capacity overwrite-oldest sample ring
pub struct SampleRing<T: Copy, const N: usize> {
    slots: UnsafeCell<[MaybeUninit<T>; N]>,
    /// Next write position, modulo 2N (producer owned)
    head: AtomicUsize,
    /// Next read position, modulo 2N
    tail: AtomicUsize,
    stats: RingStats,
}

// Slots are only written by the single producer and only read in
// [tail, head), which the producer publishes with Release ordering.
unsafe impl<T: Copy + Send, const N: usize> Sync for SampleRing<T, N> {}

impl<T: Copy, const N: usize> SampleRing<T, N> {
    const NONZERO: () = assert!(N > 0, "ring capacity must be non-zero");

    /// Empty ring; usable in static context
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::NONZERO;
        Self {
            // An array of MaybeUninit needs no initialization
            slots: UnsafeCell::new(unsafe { MaybeUninit::uninit().assume_init() }),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            stats: RingStats::new(),
        }
    }

    #[inline]
    const fn advance(index: usize, by: usize) -> usize {
        (index + by) % (2 * N)
    }

    #[inline]
    const fn distance(from: usize, to: usize) -> usize {
        (to + 2 * N - from) % (2 * N)
    }

    #[inline]
    fn read_slot(&self, index: usize) -> T {
        // SAFETY: callers only pass indices in [tail, head), which the
        // producer initialized before publishing head.
        unsafe {
            let slots = &*self.slots.get();
            ptr::read_volatile(slots[index % N].as_ptr())
        }
    }

    /// Append a sample, discarding the oldest if the ring is full
    ///
    /// Must only be called from the single producer context.
    pub fn write(&self, value: T) {
        let head = self.head.load(Ordering::Relaxed);

        loop {
            let tail = self.tail.load(Ordering::Acquire);
            if Self::distance(tail, head) < N {
                break;
            }
            if self
                .tail
                .compare_exchange(
                    tail,
                    Self::advance(tail, 1),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                self.stats.overwritten.fetch_add(1, Ordering::Relaxed);
                break;
            }
        }

        // SAFETY: single producer; the slot at head is outside [tail, head)
        unsafe {
            let slots = &mut *self.slots.get();
            ptr::write_volatile(slots[head % N].as_mut_ptr(), value);
        }

        self.head.store(Self::advance(head, 1), Ordering::Release);
        self.stats.written.fetch_add(1, Ordering::Relaxed);
    }

    /// Remove and return the oldest sample, `None` when empty
    pub fn drain_one(&self) -> Option<T> {
        loop {
            let tail = self.tail.load(Ordering::Acquire);
            let head = self.head.load(Ordering::Acquire);
            if tail == head {
                return None;
            }

            let value = self.read_slot(tail);
            if self
                .tail
                .compare_exchange(
                    tail,
                    Self::advance(tail, 1),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                self.stats.drained.fetch_add(1, Ordering::Relaxed);
                return Some(value);
            }
            // producer discarded this sample while we read it
            core::hint::spin_loop();
        }
    }

    /// Read up to `M` oldest samples without removing them
    pub fn peek_batch<const M: usize>(&self) -> ReadBatch<T, M> {
        let start = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        let available = Self::distance(start, head).min(M);

        let mut items = Vec::new();
        for offset in 0..available {
            // cannot fail: available <= M
            let _ = items.push(self.read_slot(Self::advance(start, offset)));
        }
        ReadBatch { start, items }
    }

    /// Release a batch returned by [`SampleRing::peek_batch`]
    ///
    /// Returns how many of the batch's samples were still buffered and are
    /// now released. Fewer than `batch.len()` means the producer overwrote
    /// part of the batch after it was read; the ring is still advanced past
    /// it.
    pub fn commit<const M: usize>(&self, batch: &ReadBatch<T, M>) -> usize {
        let count = batch.len();
        if count == 0 {
            return 0;
        }
        let end = Self::advance(batch.start, count);

        loop {
            let tail = self.tail.load(Ordering::Acquire);
            let consumed = Self::distance(batch.start, tail);
            if consumed >= count {
                // producer already discarded the whole batch
                return 0;
            }
            if self
                .tail
                .compare_exchange(tail, end, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                self.stats
                    .drained
                    .fetch_add((count - consumed) as u32, Ordering::Relaxed);
                return count - consumed;
            }
        }
    }

    /// Discard every buffered sample
    pub fn clear(&self) {
        let head = self.head.load(Ordering::Acquire);
        self.tail.store(head, Ordering::Release);
    }

    /// Discard samples and zero the counters
    pub fn reset(&self) {
        self.clear();
        self.stats.reset();
    }

    /// Number of buffered samples
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        Self::distance(tail, head)
    }

    /// True when nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the next write discards a sample
    pub fn is_full(&self) -> bool {
        self.len() == N
    }

    /// Maximum number of buffered samples
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Ring counters
    pub fn stats(&self) -> &RingStats {
        &self.stats
    }
}

impl<T: Copy, const N: usize> Default for SampleRing<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy, const N: usize> core::fmt::Debug for SampleRing<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SampleRing")
            .field("len", &self.len())
            .field("capacity", &N)
            .finish()
    }
}
