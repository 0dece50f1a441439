/// Emits at most `max` warnings through `log`, then only counts. Call `summarize()` once the
/// noisy pass is over to report how many were swallowed.
///
/// Event logs from a big simulation can hit the same inconsistency hundreds of thousands of
/// times, so anything that warns per-event should go through this.
#[derive(Debug)]
pub struct RateLimitedWarn {
    label: &'static str,
    max: usize,
    count: usize,
}

impl RateLimitedWarn {
    pub fn new(label: &'static str, max: usize) -> RateLimitedWarn {
        RateLimitedWarn {
            label,
            max,
            count: 0,
        }
    }

    /// The message is only built for warnings under the cap, whether or not a logger is
    /// listening.
    pub fn warn<F: FnOnce() -> String>(&mut self, msg: F) {
        self.count += 1;
        if self.count <= self.max {
            let msg = msg();
            warn!("{}: {}", self.label, msg);
            if self.count == self.max {
                warn!("{}: further warnings of this kind are suppressed", self.label);
            }
        }
    }

    /// How many times `warn` has been called, including suppressed ones.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn suppressed(&self) -> usize {
        self.count.saturating_sub(self.max)
    }

    pub fn summarize(&self) {
        if self.suppressed() > 0 {
            warn!(
                "{}: {} warnings total, {} suppressed",
                self.label,
                self.count,
                self.suppressed()
            );
        }
    }
}
