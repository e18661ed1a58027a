//! The bounded sample ring shared between one producer and one consumer.
//!
//! `put` and `take` never block: each transfers as much as the counters allow
//! right now and reports how much it moved. Blocking is isolated to the
//! explicit wait operations, which side may block being fixed at construction
//! by the [`WaitRole`].

use std::cell::UnsafeCell;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::RingError;

/// Which side of the ring is eligible to block.
///
/// A ring either signals on data or on space, never both. A full-duplex
/// producer/consumer pair that must block on *both* availability and space
/// needs two ring instances, one per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitRole {
    /// The consumer blocks in [`SampleRing::wait_for_data`]; `put` signals it.
    WaitForData,
    /// The producer blocks in [`SampleRing::wait_for_space`]; `take` signals it.
    WaitForSpace,
}

impl fmt::Display for WaitRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WaitForData => "data",
            Self::WaitForSpace => "space",
        })
    }
}

/// A fixed-capacity ring of samples connecting one producer thread to one
/// consumer thread.
///
/// The ring tracks how many slots are occupied and how many are free and
/// sizes every transfer to those counts, so the two sides always touch
/// disjoint regions of storage and the memory copies run without any lock.
/// The monitor lock is taken only for wait/signal bookkeeping.
///
/// # Usage contract
///
/// Exactly one thread may call [`put`](Self::put) and exactly one thread may
/// call [`take`](Self::take) at a time. [`split`](Self::split) enforces this
/// discipline at the type level; when sharing the ring directly through an
/// `Arc`, the caller is responsible for it.
///
/// # Example
///
/// ```
/// use sample_ring::{SampleRing, WaitRole};
///
/// let ring = SampleRing::new(WaitRole::WaitForData, 4);
/// assert_eq!(ring.put(&[1, 2, 3]), 3);
/// assert_eq!(ring.put(&[4, 5]), 1); // only one slot was free
///
/// let mut out = [0; 10];
/// assert_eq!(ring.take(&mut out), 4);
/// assert_eq!(&out[..4], &[1, 2, 3, 4]);
/// ```
pub struct SampleRing<T> {
    capacity: usize,
    storage: Box<[UnsafeCell<T>]>,
    /// Next slot to write. Only advanced by the producer.
    write_index: AtomicUsize,
    /// Next slot to read. Only advanced by the consumer.
    read_index: AtomicUsize,
    occupied: AtomicUsize,
    free: AtomicUsize,
    wait_role: WaitRole,
    monitor: Mutex<()>,
    condition: Condvar,
}

// Safety: the occupied/free counters gate every transfer, so the producer
// writes only slots the consumer has vacated and the consumer reads only
// slots the producer has published (release stores after the copy, acquire
// loads at the gate). This holds for one producer and one consumer, which is
// the documented usage contract.
unsafe impl<T: Send> Send for SampleRing<T> {}
unsafe impl<T: Send> Sync for SampleRing<T> {}

impl<T: Copy + Default> SampleRing<T> {
    /// Creates a ring with `capacity` zeroed slots and the given wait role.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. A zero-capacity ring can never transfer
    /// anything, so this is a contract violation rather than a recoverable
    /// condition.
    #[must_use]
    pub fn new(wait_role: WaitRole, capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be positive");

        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || UnsafeCell::new(T::default()));

        tracing::debug!(capacity, role = %wait_role, "created sample ring");

        Self {
            capacity,
            storage: slots.into_boxed_slice(),
            write_index: AtomicUsize::new(0),
            read_index: AtomicUsize::new(0),
            occupied: AtomicUsize::new(0),
            free: AtomicUsize::new(capacity),
            wait_role,
            monitor: Mutex::new(()),
            condition: Condvar::new(),
        }
    }

    /// Copies as many samples from `input` as there is free space, starting
    /// at the write index and wrapping at the capacity boundary.
    ///
    /// Returns how many samples were transferred, at most
    /// `min(free, input.len())`. Never blocks; callers that need to enqueue
    /// everything must loop, re-waiting on space between attempts.
    ///
    /// Signals a waiting consumer when the ring's role is
    /// [`WaitRole::WaitForData`].
    pub fn put(&self, input: &[T]) -> usize {
        let count = self.free.load(Ordering::Acquire).min(input.len());

        if count > 0 {
            let write_index = self.write_index.load(Ordering::Relaxed);
            // Safety: `count` slots starting at `write_index` were counted
            // free, so the consumer cannot be reading them.
            unsafe { self.copy_in(write_index, &input[..count]) };
            self.write_index
                .store((write_index + count) % self.capacity, Ordering::Relaxed);

            // Publish the data before advertising it: the consumer's acquire
            // load of `occupied` must see the completed copy.
            self.free.fetch_sub(count, Ordering::Release);
            self.occupied.fetch_add(count, Ordering::Release);
        }

        if self.wait_role == WaitRole::WaitForData {
            let _guard = self.monitor.lock();
            self.condition.notify_one();
        }

        count
    }

    /// Copies as many samples into `output` as the ring currently holds,
    /// starting at the read index and wrapping at the capacity boundary.
    ///
    /// Returns how many samples were transferred, at most
    /// `min(occupied, output.len())`. Never blocks; callers that need a full
    /// read must loop, re-waiting on availability between attempts.
    ///
    /// Signals a waiting producer when the ring's role is
    /// [`WaitRole::WaitForSpace`].
    pub fn take(&self, output: &mut [T]) -> usize {
        let count = self.occupied.load(Ordering::Acquire).min(output.len());

        if count > 0 {
            let read_index = self.read_index.load(Ordering::Relaxed);
            // Safety: `count` slots starting at `read_index` were counted
            // occupied, so the producer cannot be writing them.
            unsafe { self.copy_out(read_index, &mut output[..count]) };
            self.read_index
                .store((read_index + count) % self.capacity, Ordering::Relaxed);

            // Vacate the slots before advertising them: the producer's
            // acquire load of `free` must see the completed copy.
            self.occupied.fetch_sub(count, Ordering::Release);
            self.free.fetch_add(count, Ordering::Release);
        }

        if self.wait_role == WaitRole::WaitForSpace {
            let _guard = self.monitor.lock();
            self.condition.notify_one();
        }

        count
    }

    /// Blocks the calling thread until at least one sample is available.
    ///
    /// The predicate is re-checked after every wake, so spurious wakeups and
    /// already-drained signals are harmless.
    ///
    /// # Panics
    ///
    /// Panics if the ring was constructed with [`WaitRole::WaitForSpace`]:
    /// `put` never signals on such a ring, so this wait could never be woken.
    pub fn wait_for_data(&self) {
        assert!(
            self.wait_role == WaitRole::WaitForData,
            "wait_for_data called on a ring configured to wait for space"
        );

        let mut guard = self.monitor.lock();
        while self.occupied.load(Ordering::Acquire) == 0 {
            self.condition.wait(&mut guard);
        }
    }

    /// Blocks the calling thread until at least one slot is free.
    ///
    /// # Panics
    ///
    /// Panics if the ring was constructed with [`WaitRole::WaitForData`]:
    /// `take` never signals on such a ring, so this wait could never be woken.
    pub fn wait_for_space(&self) {
        assert!(
            self.wait_role == WaitRole::WaitForSpace,
            "wait_for_space called on a ring configured to wait for data"
        );

        let mut guard = self.monitor.lock();
        while self.free.load(Ordering::Acquire) == 0 {
            self.condition.wait(&mut guard);
        }
    }

    /// Bounded variant of [`wait_for_data`](Self::wait_for_data).
    ///
    /// Returns [`RingError::WaitTimedOut`] if no sample became available
    /// within `timeout`. The predicate is re-checked after a timed-out wake,
    /// so a signal that raced the deadline is never lost.
    ///
    /// # Panics
    ///
    /// Panics if the ring was constructed with [`WaitRole::WaitForSpace`].
    pub fn wait_for_data_timeout(&self, timeout: Duration) -> Result<(), RingError> {
        assert!(
            self.wait_role == WaitRole::WaitForData,
            "wait_for_data_timeout called on a ring configured to wait for space"
        );

        let deadline = Instant::now() + timeout;
        let mut guard = self.monitor.lock();
        while self.occupied.load(Ordering::Acquire) == 0 {
            if self.condition.wait_until(&mut guard, deadline).timed_out() {
                if self.occupied.load(Ordering::Acquire) > 0 {
                    return Ok(());
                }
                return Err(RingError::WaitTimedOut {
                    role: WaitRole::WaitForData,
                    timeout,
                });
            }
        }
        Ok(())
    }

    /// Bounded variant of [`wait_for_space`](Self::wait_for_space).
    ///
    /// Returns [`RingError::WaitTimedOut`] if no slot became free within
    /// `timeout`.
    ///
    /// # Panics
    ///
    /// Panics if the ring was constructed with [`WaitRole::WaitForData`].
    pub fn wait_for_space_timeout(&self, timeout: Duration) -> Result<(), RingError> {
        assert!(
            self.wait_role == WaitRole::WaitForSpace,
            "wait_for_space_timeout called on a ring configured to wait for data"
        );

        let deadline = Instant::now() + timeout;
        let mut guard = self.monitor.lock();
        while self.free.load(Ordering::Acquire) == 0 {
            if self.condition.wait_until(&mut guard, deadline).timed_out() {
                if self.free.load(Ordering::Acquire) > 0 {
                    return Ok(());
                }
                return Err(RingError::WaitTimedOut {
                    role: WaitRole::WaitForSpace,
                    timeout,
                });
            }
        }
        Ok(())
    }

    /// Reinitializes the ring for a restarted stream.
    ///
    /// Indices return to 0, `occupied` to 0, `free` to the capacity, and all
    /// buffered content is discarded (every slot is overwritten with the
    /// default sample), so nothing written before the reset can resurface.
    ///
    /// Not safe to call concurrently with an in-flight `put` or `take` on the
    /// same instance: both the producer and the consumer must be quiesced
    /// while the reset runs.
    pub fn reset(&self) {
        self.write_index.store(0, Ordering::Relaxed);
        self.read_index.store(0, Ordering::Relaxed);
        self.occupied.store(0, Ordering::Release);
        self.free.store(self.capacity, Ordering::Release);

        for slot in self.storage.iter() {
            // Safety: the caller guarantees exclusive access during reset.
            unsafe { *slot.get() = T::default() };
        }

        tracing::debug!(capacity = self.capacity, "sample ring reset");
    }

    /// Two-part wraparound copy from `src` into storage starting at `start`.
    ///
    /// Both segments derive from the same transfer count, so a copy is always
    /// internally consistent.
    ///
    /// # Safety
    ///
    /// The slots `[start, start + src.len())` (mod capacity) must currently
    /// be free, and no other thread may be writing the ring.
    unsafe fn copy_in(&self, start: usize, src: &[T]) {
        let first = src.len().min(self.capacity - start);
        std::ptr::copy_nonoverlapping(src.as_ptr(), self.storage[start].get(), first);
        std::ptr::copy_nonoverlapping(
            src[first..].as_ptr(),
            self.storage[0].get(),
            src.len() - first,
        );
    }

    /// Two-part wraparound copy out of storage starting at `start`.
    ///
    /// # Safety
    ///
    /// The slots `[start, start + dst.len())` (mod capacity) must currently
    /// be occupied, and no other thread may be reading the ring.
    unsafe fn copy_out(&self, start: usize, dst: &mut [T]) {
        let first = dst.len().min(self.capacity - start);
        std::ptr::copy_nonoverlapping(self.storage[start].get(), dst.as_mut_ptr(), first);
        std::ptr::copy_nonoverlapping(
            self.storage[0].get(),
            dst[first..].as_mut_ptr(),
            dst.len() - first,
        );
    }

    /// Returns the fixed capacity of the ring.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of currently filled slots.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.occupied.load(Ordering::Acquire)
    }

    /// Returns the number of currently empty slots.
    #[must_use]
    pub fn free(&self) -> usize {
        self.free.load(Ordering::Acquire)
    }

    /// Returns `true` if no samples are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occupied() == 0
    }

    /// Returns `true` if every slot is filled.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.free() == 0
    }

    /// Returns the wait role fixed at construction.
    #[must_use]
    pub fn wait_role(&self) -> WaitRole {
        self.wait_role
    }
}

impl<T> fmt::Debug for SampleRing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleRing")
            .field("capacity", &self.capacity)
            .field("occupied", &self.occupied.load(Ordering::Relaxed))
            .field("free", &self.free.load(Ordering::Relaxed))
            .field("wait_role", &self.wait_role)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invariant_holds<T: Copy + Default>(ring: &SampleRing<T>) -> bool {
        ring.occupied() + ring.free() == ring.capacity()
    }

    #[test]
    fn test_partial_put_then_full_take() {
        let ring = SampleRing::new(WaitRole::WaitForData, 4);

        assert_eq!(ring.put(&[1, 2, 3]), 3);
        assert_eq!(ring.occupied(), 3);
        assert_eq!(ring.free(), 1);

        // Only one slot is free, so only one sample fits.
        assert_eq!(ring.put(&[4, 5]), 1);
        assert_eq!(ring.occupied(), 4);
        assert_eq!(ring.free(), 0);
        assert!(ring.is_full());

        let mut out = [0; 10];
        assert_eq!(ring.take(&mut out), 4);
        assert_eq!(&out[..4], &[1, 2, 3, 4]);
        assert_eq!(ring.occupied(), 0);
        assert_eq!(ring.free(), 4);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_take_from_empty_transfers_nothing() {
        let ring = SampleRing::<i16>::new(WaitRole::WaitForData, 8);
        let mut out = [0i16; 4];
        assert_eq!(ring.take(&mut out), 0);
        assert!(invariant_holds(&ring));
    }

    #[test]
    fn test_put_into_full_transfers_nothing() {
        let ring = SampleRing::new(WaitRole::WaitForData, 2);
        assert_eq!(ring.put(&[1.0f32, 2.0]), 2);
        assert_eq!(ring.put(&[3.0]), 0);
        assert!(invariant_holds(&ring));
    }

    #[test]
    fn test_wraparound_at_capacity_boundary() {
        let capacity = 8;
        let ring = SampleRing::new(WaitRole::WaitForData, capacity);
        let mut out = [0i32; 16];

        // Move the write index to 6 so the next put crosses the boundary.
        assert_eq!(ring.put(&[0, 1, 2, 3, 4, 5]), 6);
        assert_eq!(ring.take(&mut out[..6]), 6);

        // 5 samples from index 6 split into 2 at the tail and 3 from index 0.
        assert_eq!(ring.put(&[10, 11, 12, 13, 14]), 5);
        assert_eq!(ring.occupied(), 5);

        let mut wrapped = [0i32; 5];
        assert_eq!(ring.take(&mut wrapped), 5);
        assert_eq!(wrapped, [10, 11, 12, 13, 14]);
        assert!(invariant_holds(&ring));
    }

    #[test]
    fn test_capacity_plus_k_across_two_puts() {
        let capacity = 6;
        let ring = SampleRing::new(WaitRole::WaitForData, capacity);
        let data: Vec<i32> = (0..10).collect();

        let first = ring.put(&data);
        assert_eq!(first, capacity);

        let mut received = vec![0i32; 10];
        let drained = ring.take(&mut received[..first]);
        assert_eq!(drained, first);

        let second = ring.put(&data[first..]);
        assert_eq!(second, data.len() - first);
        assert_eq!(ring.take(&mut received[first..]), second);

        assert_eq!(received, data);
    }

    #[test]
    fn test_counts_invariant_over_random_ops() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(7);
        let ring = SampleRing::new(WaitRole::WaitForData, 7);
        let mut scratch = [0u8; 16];

        for _ in 0..500 {
            if rng.gen_bool(0.5) {
                let n = rng.gen_range(0..=16);
                let chunk: Vec<u8> = (0..n).map(|_| rng.gen()).collect();
                let moved = ring.put(&chunk);
                assert!(moved <= chunk.len());
            } else {
                let n = rng.gen_range(0..=16);
                let moved = ring.take(&mut scratch[..n]);
                assert!(moved <= n);
            }
            assert!(invariant_holds(&ring));
        }
    }

    #[test]
    fn test_reset_discards_buffered_content() {
        let ring = SampleRing::new(WaitRole::WaitForData, 4);
        let mut out = [0i16; 4];

        assert_eq!(ring.put(&[9, 9, 9]), 3);
        assert_eq!(ring.take(&mut out[..1]), 1);

        ring.reset();
        assert_eq!(ring.occupied(), 0);
        assert_eq!(ring.free(), 4);

        // A full fill-and-drain after reset must see only the new samples.
        assert_eq!(ring.put(&[1, 2, 3, 4]), 4);
        assert_eq!(ring.take(&mut out), 4);
        assert_eq!(out, [1, 2, 3, 4]);
    }

    #[test]
    fn test_capacity_one() {
        let ring = SampleRing::new(WaitRole::WaitForData, 1);
        let mut out = [0u32; 1];

        for value in 0..5u32 {
            assert_eq!(ring.put(&[value]), 1);
            assert_eq!(ring.put(&[99]), 0);
            assert_eq!(ring.take(&mut out), 1);
            assert_eq!(out[0], value);
        }
    }

    #[test]
    #[should_panic(expected = "ring capacity must be positive")]
    fn test_zero_capacity_panics() {
        let _ = SampleRing::<f32>::new(WaitRole::WaitForData, 0);
    }

    #[test]
    #[should_panic(expected = "wait_for_space called on a ring configured to wait for data")]
    fn test_wrong_role_wait_panics() {
        let ring = SampleRing::<f32>::new(WaitRole::WaitForData, 4);
        ring.wait_for_space();
    }

    #[test]
    fn test_wait_for_data_returns_when_data_present() {
        let ring = SampleRing::new(WaitRole::WaitForData, 4);
        ring.put(&[1i16]);
        // Must not block: the predicate already holds.
        ring.wait_for_data();
    }

    #[test]
    fn test_wait_for_data_timeout_on_empty_ring() {
        let ring = SampleRing::<i16>::new(WaitRole::WaitForData, 4);
        let result = ring.wait_for_data_timeout(Duration::from_millis(20));
        assert!(matches!(result, Err(RingError::WaitTimedOut { .. })));
    }

    #[test]
    fn test_wait_for_space_timeout_on_full_ring() {
        let ring = SampleRing::new(WaitRole::WaitForSpace, 2);
        assert_eq!(ring.put(&[1i16, 2]), 2);
        let result = ring.wait_for_space_timeout(Duration::from_millis(20));
        assert!(matches!(result, Err(RingError::WaitTimedOut { .. })));
    }

    #[test]
    fn test_debug_output_reports_counts() {
        let ring = SampleRing::new(WaitRole::WaitForData, 4);
        ring.put(&[1i16, 2]);
        let debug = format!("{ring:?}");
        assert!(debug.contains("capacity: 4"));
        assert!(debug.contains("occupied: 2"));
    }
}
