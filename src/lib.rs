#![feature(portable_simd)]
// briskcsv - fast CSV tokenizing core with multiple output strategies
//
// Library safety: no unwrap/expect in production code. Fallible paths use
// match + early return.
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//
// One generic engine walks the input in field/row units; the output
// strategies plug into it as emitters:
//
// A: Copying — owned rows (parse / parse_with)
// B: Slicing — zero-copy sub-slices of the input (parse_borrowed)
// C: Chunked — owned rows + last complete-row offset (parse_chunk)
// D: Streaming — chunked feeding in bounded memory (StreamingParser)
// E: Parallel — row-aligned batches via rayon (parse_parallel)
//
// Parsing never aborts mid-stream: structural problems (unterminated quote,
// escape inside an unquoted field, row storage exhaustion) come back as a
// partial result with the rows recovered so far.

pub mod config;
pub mod core;
pub mod error;
pub mod strategy;

pub use crate::config::{Config, MAX_PATTERN_LEN, MAX_SEPARATORS};
pub use crate::core::engine::Emitter;
pub use crate::error::{BufferOverflow, ConfigError, PartialReason};
pub use crate::strategy::{
    parse, parse_borrowed, parse_chunk, parse_parallel, parse_with, BorrowedRow, ParseOutput,
    Row, StreamingParser,
};

// ============================================================================
// Allocator Configuration
// ============================================================================

// With memory_tracking enabled, the global allocator is wrapped in a counting
// shim; the counters live here and the `memory` module reads them.
#[cfg(feature = "memory_tracking")]
mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};

    pub static LIVE: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK: AtomicUsize = AtomicUsize::new(0);

    /// Counts live and peak heap bytes around an inner allocator. Monotonic
    /// ordering is enough: the counters are a diagnostic, not a ledger.
    pub struct CountingAlloc<A>(pub A);

    unsafe impl<A: GlobalAlloc> GlobalAlloc for CountingAlloc<A> {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = self.0.alloc(layout);
            if !ptr.is_null() {
                let live = LIVE.fetch_add(layout.size(), Relaxed) + layout.size();
                PEAK.fetch_max(live, Relaxed);
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            LIVE.fetch_sub(layout.size(), Relaxed);
            self.0.dealloc(ptr, layout)
        }
    }
}

#[cfg(all(feature = "memory_tracking", feature = "mimalloc"))]
#[global_allocator]
static GLOBAL: tracking::CountingAlloc<mimalloc::MiMalloc> =
    tracking::CountingAlloc(mimalloc::MiMalloc);

#[cfg(all(feature = "memory_tracking", not(feature = "mimalloc")))]
#[global_allocator]
static GLOBAL: tracking::CountingAlloc<std::alloc::System> =
    tracking::CountingAlloc(std::alloc::System);

// Without tracking, mimalloc (when selected) runs unwrapped
#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Memory Tracking (only meaningful when the memory_tracking feature is on)
// ============================================================================

/// Diagnostic heap counters. With the `memory_tracking` feature disabled all
/// three functions return zeros and the tracking code does not exist.
pub mod memory {
    /// Current heap allocation in bytes.
    #[cfg(feature = "memory_tracking")]
    pub fn current_allocated() -> usize {
        use std::sync::atomic::Ordering;
        crate::tracking::LIVE.load(Ordering::SeqCst)
    }

    /// Peak heap allocation since the last reset.
    #[cfg(feature = "memory_tracking")]
    pub fn peak_allocated() -> usize {
        use std::sync::atomic::Ordering;
        crate::tracking::PEAK.load(Ordering::SeqCst)
    }

    /// Reset the peak to the current level; returns `(current, old_peak)`.
    #[cfg(feature = "memory_tracking")]
    pub fn reset_stats() -> (usize, usize) {
        use std::sync::atomic::Ordering;
        let current = crate::tracking::LIVE.load(Ordering::SeqCst);
        let peak = crate::tracking::PEAK.swap(current, Ordering::SeqCst);
        (current, peak)
    }

    #[cfg(not(feature = "memory_tracking"))]
    pub fn current_allocated() -> usize {
        0
    }

    #[cfg(not(feature = "memory_tracking"))]
    pub fn peak_allocated() -> usize {
        0
    }

    #[cfg(not(feature = "memory_tracking"))]
    pub fn reset_stats() -> (usize, usize) {
        (0, 0)
    }
}
