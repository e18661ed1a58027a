//! Producer and consumer halves of a sample ring.
//!
//! [`SampleRing::split`] wraps a ring in an `Arc` and hands back one
//! [`RingProducer`] and one [`RingConsumer`]. Neither half is cloneable and
//! every transfer method takes `&mut self`, so the single-producer
//! single-consumer discipline the ring relies on is enforced by ownership
//! instead of documentation.

use std::sync::Arc;
use std::time::Duration;

use crate::error::RingError;
use crate::ring::SampleRing;

impl<T: Copy + Default> SampleRing<T> {
    /// Splits the ring into its producer and consumer halves.
    ///
    /// # Example
    ///
    /// ```
    /// use sample_ring::{SampleRing, WaitRole};
    ///
    /// let (mut producer, mut consumer) =
    ///     SampleRing::new(WaitRole::WaitForData, 1024).split();
    ///
    /// let handle = std::thread::spawn(move || {
    ///     let mut received = vec![0i16; 4];
    ///     consumer.read_exact(&mut received);
    ///     received
    /// });
    ///
    /// // The primitive transfer is partial; loop until everything is in.
    /// let mut pending: &[i16] = &[1, 2, 3, 4];
    /// while !pending.is_empty() {
    ///     let sent = producer.put(pending);
    ///     pending = &pending[sent..];
    /// }
    ///
    /// assert_eq!(handle.join().unwrap(), vec![1, 2, 3, 4]);
    /// ```
    #[must_use]
    pub fn split(self) -> (RingProducer<T>, RingConsumer<T>) {
        let ring = Arc::new(self);
        (
            RingProducer {
                ring: Arc::clone(&ring),
            },
            RingConsumer { ring },
        )
    }
}

/// The writing half of a split ring.
///
/// Owned by exactly one thread; transfer methods take `&mut self` so a
/// second producer cannot exist without going through this handle.
#[derive(Debug)]
pub struct RingProducer<T> {
    ring: Arc<SampleRing<T>>,
}

impl<T: Copy + Default> RingProducer<T> {
    /// Enqueues as many samples from `input` as there is free space.
    ///
    /// Returns how many were transferred. Never blocks.
    pub fn put(&mut self, input: &[T]) -> usize {
        self.ring.put(input)
    }

    /// Blocks until at least one slot is free.
    ///
    /// # Panics
    ///
    /// Panics unless the ring was constructed with [`WaitRole::WaitForSpace`](crate::WaitRole::WaitForSpace).
    pub fn wait_for_space(&self) {
        self.ring.wait_for_space();
    }

    /// Bounded variant of [`wait_for_space`](Self::wait_for_space).
    ///
    /// # Panics
    ///
    /// Panics unless the ring was constructed with [`WaitRole::WaitForSpace`](crate::WaitRole::WaitForSpace).
    pub fn wait_for_space_timeout(&self, timeout: Duration) -> Result<(), RingError> {
        self.ring.wait_for_space_timeout(timeout)
    }

    /// Enqueues all of `data`, blocking on space as needed.
    ///
    /// This is the fully-blocking convenience over the partial [`put`]: it
    /// loops transfer-then-wait until every sample is in the ring. Requires a
    /// consumer that keeps draining the ring, otherwise it blocks forever.
    ///
    /// [`put`]: Self::put
    ///
    /// # Panics
    ///
    /// Panics unless the ring was constructed with [`WaitRole::WaitForSpace`](crate::WaitRole::WaitForSpace):
    /// on a `WaitForData` ring the consumer never signals space, so the inner
    /// wait could never be woken.
    pub fn write_all(&mut self, data: &[T]) {
        let mut sent = 0;
        while sent < data.len() {
            sent += self.ring.put(&data[sent..]);
            if sent < data.len() {
                self.ring.wait_for_space();
            }
        }
    }

    /// Like [`write_all`](Self::write_all), but each inner wait is bounded by
    /// `timeout`.
    ///
    /// On timeout the samples enqueued so far stay in the ring.
    ///
    /// # Panics
    ///
    /// Panics unless the ring was constructed with [`WaitRole::WaitForSpace`](crate::WaitRole::WaitForSpace).
    pub fn write_all_timeout(&mut self, data: &[T], timeout: Duration) -> Result<(), RingError> {
        let mut sent = 0;
        while sent < data.len() {
            sent += self.ring.put(&data[sent..]);
            if sent < data.len() {
                self.ring.wait_for_space_timeout(timeout)?;
            }
        }
        Ok(())
    }

    /// Returns the number of currently empty slots.
    #[must_use]
    pub fn free(&self) -> usize {
        self.ring.free()
    }

    /// Returns `true` if every slot is filled.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    /// Returns the fixed capacity of the ring.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

/// The reading half of a split ring.
#[derive(Debug)]
pub struct RingConsumer<T> {
    ring: Arc<SampleRing<T>>,
}

impl<T: Copy + Default> RingConsumer<T> {
    /// Dequeues as many samples into `output` as the ring currently holds.
    ///
    /// Returns how many were transferred. Never blocks.
    pub fn take(&mut self, output: &mut [T]) -> usize {
        self.ring.take(output)
    }

    /// Dequeues up to `max` samples into an owned buffer.
    ///
    /// The returned vector holds only what was actually available and may be
    /// empty.
    #[must_use]
    pub fn take_chunk(&mut self, max: usize) -> Vec<T> {
        let mut out = vec![T::default(); max];
        let count = self.ring.take(&mut out);
        out.truncate(count);
        out
    }

    /// Blocks until at least one sample is available.
    ///
    /// # Panics
    ///
    /// Panics unless the ring was constructed with [`WaitRole::WaitForData`](crate::WaitRole::WaitForData).
    pub fn wait_for_data(&self) {
        self.ring.wait_for_data();
    }

    /// Bounded variant of [`wait_for_data`](Self::wait_for_data).
    ///
    /// # Panics
    ///
    /// Panics unless the ring was constructed with [`WaitRole::WaitForData`](crate::WaitRole::WaitForData).
    pub fn wait_for_data_timeout(&self, timeout: Duration) -> Result<(), RingError> {
        self.ring.wait_for_data_timeout(timeout)
    }

    /// Fills all of `output`, blocking on availability as needed.
    ///
    /// Requires a producer that keeps feeding the ring, otherwise it blocks
    /// forever. End-of-stream is not signaled by the ring; callers that need
    /// it must agree on an out-of-band sentinel with the producer.
    ///
    /// # Panics
    ///
    /// Panics unless the ring was constructed with [`WaitRole::WaitForData`](crate::WaitRole::WaitForData):
    /// on a `WaitForSpace` ring the producer never signals data, so the inner
    /// wait could never be woken.
    pub fn read_exact(&mut self, output: &mut [T]) {
        let mut filled = 0;
        while filled < output.len() {
            filled += self.ring.take(&mut output[filled..]);
            if filled < output.len() {
                self.ring.wait_for_data();
            }
        }
    }

    /// Like [`read_exact`](Self::read_exact), but each inner wait is bounded
    /// by `timeout`.
    ///
    /// On timeout the samples already copied into `output` stay there.
    ///
    /// # Panics
    ///
    /// Panics unless the ring was constructed with [`WaitRole::WaitForData`](crate::WaitRole::WaitForData).
    pub fn read_exact_timeout(
        &mut self,
        output: &mut [T],
        timeout: Duration,
    ) -> Result<(), RingError> {
        let mut filled = 0;
        while filled < output.len() {
            filled += self.ring.take(&mut output[filled..]);
            if filled < output.len() {
                self.ring.wait_for_data_timeout(timeout)?;
            }
        }
        Ok(())
    }

    /// Returns the number of currently filled slots.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.ring.occupied()
    }

    /// Returns `true` if no samples are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Returns the fixed capacity of the ring.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::WaitRole;

    #[test]
    fn test_split_halves_share_state() {
        let (mut producer, mut consumer) = SampleRing::new(WaitRole::WaitForData, 8).split();

        assert_eq!(producer.put(&[1i16, 2, 3]), 3);
        assert_eq!(consumer.occupied(), 3);
        assert_eq!(producer.free(), 5);

        let mut out = [0i16; 3];
        assert_eq!(consumer.take(&mut out), 3);
        assert_eq!(out, [1, 2, 3]);
    }

    #[test]
    fn test_take_chunk_returns_only_available() {
        let (mut producer, mut consumer) = SampleRing::new(WaitRole::WaitForData, 8).split();

        producer.put(&[7i16, 8]);
        let chunk = consumer.take_chunk(16);
        assert_eq!(chunk, vec![7, 8]);
        assert!(consumer.take_chunk(16).is_empty());
    }

    #[test]
    fn test_write_all_blocks_until_drained() {
        let (mut producer, mut consumer) = SampleRing::new(WaitRole::WaitForSpace, 4).split();
        let data: Vec<i16> = (0..64).collect();

        let drain = std::thread::spawn(move || {
            let mut received = Vec::new();
            let mut scratch = [0i16; 4];
            while received.len() < 64 {
                let n = consumer.take(&mut scratch);
                received.extend_from_slice(&scratch[..n]);
                if n == 0 {
                    std::thread::yield_now();
                }
            }
            received
        });

        producer.write_all(&data);
        assert_eq!(drain.join().unwrap(), data);
    }

    #[test]
    fn test_read_exact_blocks_until_fed() {
        let (mut producer, mut consumer) = SampleRing::new(WaitRole::WaitForData, 4).split();
        let data: Vec<i16> = (100..164).collect();

        let feed = {
            let data = data.clone();
            std::thread::spawn(move || {
                let mut sent = 0;
                while sent < data.len() {
                    let n = producer.put(&data[sent..]);
                    sent += n;
                    if n == 0 {
                        std::thread::yield_now();
                    }
                }
            })
        };

        let mut received = vec![0i16; 64];
        consumer.read_exact(&mut received);
        feed.join().unwrap();
        assert_eq!(received, data);
    }

    #[test]
    fn test_write_all_timeout_reports_stalled_consumer() {
        let (mut producer, _consumer) = SampleRing::new(WaitRole::WaitForSpace, 2).split();

        let result = producer.write_all_timeout(&[1i16, 2, 3], Duration::from_millis(20));
        assert!(matches!(result, Err(RingError::WaitTimedOut { .. })));
        // The ring kept what fit before the wait timed out.
        assert!(producer.is_full());
    }

    #[test]
    fn test_read_exact_timeout_reports_stalled_producer() {
        let (mut producer, mut consumer) = SampleRing::new(WaitRole::WaitForData, 4).split();
        producer.put(&[5i16]);

        let mut out = [0i16; 3];
        let result = consumer.read_exact_timeout(&mut out, Duration::from_millis(20));
        assert!(matches!(result, Err(RingError::WaitTimedOut { .. })));
        assert_eq!(out[0], 5);
    }
}
