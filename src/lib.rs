//! # sample-ring
//!
//! Bounded, thread-safe sample ring for decoupling a producer thread from a
//! consumer thread.
//!
//! `sample-ring` provides a fixed-capacity circular buffer for continuous
//! numeric sample streams (captured or synthesized audio) with partial,
//! never-blocking transfers and explicit blocking waits, so a real-time
//! producer and a slower consumer can run concurrently without unbounded
//! memory growth and without busy-waiting.
//!
//! ## Quick Start
//!
//! ```rust
//! use sample_ring::{SampleRing, WaitRole};
//!
//! // The consumer side may block; `put` signals it when data arrives.
//! let (mut producer, mut consumer) = SampleRing::new(WaitRole::WaitForData, 4096).split();
//!
//! let capture = std::thread::spawn(move || {
//!     let samples: Vec<i16> = (0..8192).map(|i| (i % 128) as i16).collect();
//!     let mut sent = 0;
//!     while sent < samples.len() {
//!         let n = producer.put(&samples[sent..]);
//!         sent += n;
//!         if n == 0 {
//!             std::thread::yield_now();
//!         }
//!     }
//! });
//!
//! let mut received = vec![0i16; 8192];
//! consumer.read_exact(&mut received); // blocks via wait_for_data as needed
//! capture.join().unwrap();
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Producer Thread → SampleRing (occupied/free counters + monitor) → Consumer Thread
//! ```
//!
//! - **Partial transfers**: [`SampleRing::put`] and [`SampleRing::take`] move
//!   `min(count, requested)` samples and return immediately; callers loop to
//!   move more. The memory copies run without holding any lock because the
//!   counters guarantee the two sides touch disjoint storage.
//! - **Wait role**: each ring blocks exactly one side, fixed at construction
//!   ([`WaitRole`]). Bidirectional blocking needs two rings, one per role.
//! - **FIFO**: samples come out in the order they went in, with no loss,
//!   duplication, or reordering.
//!
//! End-of-stream is not signaled by the ring; producer and consumer must
//! agree on an out-of-band flag or sentinel.

#![warn(missing_docs)]

mod error;
mod handle;
mod ring;

pub use error::RingError;
pub use handle::{RingConsumer, RingProducer};
pub use ring::{SampleRing, WaitRole};
