//! Fixed-window integer averager.
//!
//! A ring of the last `N` samples backed by [`heapless::HistoryBuffer`].
//! The mean truncates toward zero; callers who want rounding add half a
//! sample before pushing.
//!
//! ```text
//!   push(s) ──▶ [ s0 s1 s2 … sN-1 ] ──▶ Σ / len
//!                  ▲ oldest evicted once full
//! ```

use heapless::HistoryBuffer;

/// Integer sample types the averager accepts (the "sample width").
pub trait Sample: Copy + Default {
    fn widen(self) -> u64;
    /// Narrow a mean back to the sample width.  Means never exceed the
    /// largest sample, so this cannot truncate.
    fn narrow(wide: u64) -> Self;
}

macro_rules! impl_sample {
    ($($t:ty),*) => {
        $(
            impl Sample for $t {
                fn widen(self) -> u64 {
                    self as u64
                }

                fn narrow(wide: u64) -> Self {
                    wide as $t
                }
            }
        )*
    };
}

impl_sample!(u8, u16, u32);

/// Running average over a window of `N` samples.
pub struct Averager<T: Sample, const N: usize> {
    ring: HistoryBuffer<T, N>,
}

impl<T: Sample, const N: usize> Averager<T, N> {
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuffer::new(),
        }
    }

    /// Insert a sample, evicting the oldest once the window is full.
    pub fn push(&mut self, sample: T) {
        self.ring.write(sample);
    }

    /// Mean of the samples present.  An empty window averages to zero.
    pub fn current_average(&self) -> T {
        let samples = self.ring.as_slice();
        if samples.is_empty() {
            return T::default();
        }
        let sum: u64 = samples.iter().map(|s| s.widen()).sum();
        T::narrow(sum / samples.len() as u64)
    }

    /// Clear the window and pre-fill every slot with `seed`.
    pub fn reset(&mut self, seed: T) {
        self.ring.clear();
        for _ in 0..N {
            self.ring.write(seed);
        }
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.ring.len() == N
    }
}

impl<T: Sample, const N: usize> Default for Averager<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
