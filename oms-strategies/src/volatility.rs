//! Rolling volatility from a fixed-size price history
//!
//! Circular buffer of mid prices; volatility is the sample standard
//! deviation of log returns over adjacent valid entries. No heap
//! allocation: the window lives inline in the struct.

/// Fixed-window volatility estimator
///
/// Entries are valid once written (zero means "not yet observed");
/// a return needs two adjacent valid entries. Fewer than two returns
/// yields zero volatility.
#[derive(Clone)]
pub struct RollingVolatility<const N: usize> {
    prices: [f64; N],
    position: usize,
}

impl<const N: usize> RollingVolatility<N> {
    pub const fn new() -> Self {
        Self {
            prices: [0.0; N],
            position: 0,
        }
    }

    /// Record a new mid price at the next circular slot
    #[inline]
    pub fn record(&mut self, price: f64) {
        self.prices[self.position] = price;
        self.position = (self.position + 1) % N;
    }

    /// Sample standard deviation of log returns across the window
    pub fn calculate(&self) -> f64 {
        let mut returns = [0.0f64; N];
        let mut count = 0usize;
        let mut sum = 0.0;

        for i in 1..N {
            let prev = self.prices[i - 1];
            let curr = self.prices[i];
            if prev > 0.0 && curr > 0.0 {
                let ret = (curr / prev).ln();
                returns[count] = ret;
                sum += ret;
                count += 1;
            }
        }

        if count < 2 {
            return 0.0;
        }

        let mean = sum / count as f64;
        let variance_sum: f64 = returns[..count]
            .iter()
            .map(|ret| (ret - mean) * (ret - mean))
            .sum();

        (variance_sum / (count - 1) as f64).sqrt()
    }
}

impl<const N: usize> Default for RollingVolatility<N> {
    fn default() -> Self {
        Self::new()
    }
}
