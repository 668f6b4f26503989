//! Per-direction delay/jitter/loss accumulator (C3).
//!
//! Delays are carried as 64-bit floating-point milliseconds throughout —
//! the jitter EWMA's division by 16 is not integer-safe, and sums over
//! long runs need the extra precision.

/// One direction's running aggregates.
#[derive(Debug, Clone, Copy, Default)]
struct Direction {
    min: f64,
    max: f64,
    sum: f64,
    last: f64,
    jitter: f64,
}

impl Direction {
    fn start(delay: f64) -> Self {
        Self {
            min: delay,
            max: delay,
            sum: delay,
            last: delay,
            jitter: 0.0,
        }
    }

    fn update(&mut self, delay: f64, sample_index: u64) {
        self.min = self.min.min(delay);
        self.max = self.max.max(delay);
        self.sum += delay;

        let diff = (self.last - delay).abs();
        self.jitter = if sample_index == 1 {
            diff
        } else {
            self.jitter + (diff - self.jitter) / 16.0
        };

        self.last = delay;
    }
}

/// A finalized direction's numbers, ready to render.
#[derive(Debug, Clone, Copy)]
pub struct DirectionReport {
    pub min_ms: f64,
    pub max_ms: f64,
    pub avg_ms: f64,
    pub jitter_ms: f64,
    pub loss_pct: f64,
}

/// The report `Statistics::finalize` produces.
#[derive(Debug, Clone)]
pub struct Report {
    /// `None` when no reply was ever received (100% roundtrip loss).
    pub outbound: Option<DirectionReport>,
    pub inbound: Option<DirectionReport>,
    pub roundtrip: Option<DirectionReport>,
    pub received: u64,
    pub total_sent: u64,
}

/// Per-direction min/max/sum/jitter/loss accumulator (§3).
#[derive(Debug, Default)]
pub struct Statistics {
    count: u64,
    outbound: Option<Direction>,
    inbound: Option<Direction>,
    roundtrip: Option<Direction>,
    loss_outbound: i64,
    loss_inbound: i64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one matched reply's delays and sequence numbers into the
    /// aggregates. `receiver_seq`/`sender_seq` are the reply's echoed
    /// sequence fields, used only to derive loss — not stored.
    pub fn add(&mut self, delay_rt: f64, delay_ob: f64, delay_ib: f64, rseq: u32, sseq: u32) {
        self.count += 1;

        match &mut self.outbound {
            Some(d) => d.update(delay_ob, self.count),
            None => self.outbound = Some(Direction::start(delay_ob)),
        }
        match &mut self.inbound {
            Some(d) => d.update(delay_ib, self.count),
            None => self.inbound = Some(Direction::start(delay_ib)),
        }
        match &mut self.roundtrip {
            Some(d) => d.update(delay_rt, self.count),
            None => self.roundtrip = Some(Direction::start(delay_rt)),
        }

        self.loss_outbound = sseq as i64 - rseq as i64;
        self.loss_inbound = rseq as i64 - (self.count as i64 - 1);
    }

    pub fn received(&self) -> u64 {
        self.count
    }

    /// Renders the final report against `total_sent`. When no sample was
    /// ever added, every direction is `None` (100% roundtrip loss).
    pub fn finalize(&self, total_sent: u64) -> Report {
        let loss_roundtrip = total_sent.saturating_sub(self.count);

        let direction = |d: &Option<Direction>, loss: i64| -> Option<DirectionReport> {
            let d = d.as_ref()?;
            let loss_pct = if total_sent == 0 {
                0.0
            } else {
                100.0 * loss as f64 / total_sent as f64
            };
            Some(DirectionReport {
                min_ms: d.min,
                max_ms: d.max,
                avg_ms: d.sum / self.count as f64,
                jitter_ms: d.jitter,
                loss_pct,
            })
        };

        Report {
            outbound: direction(&self.outbound, self.loss_outbound),
            inbound: direction(&self.inbound, self.loss_inbound),
            roundtrip: direction(&self.roundtrip, loss_roundtrip as i64),
            received: self.count,
            total_sent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_has_zero_jitter() {
        let mut s = Statistics::new();
        s.add(10.0, 5.0, 5.0, 0, 0);
        let report = s.finalize(1);
        assert_eq!(report.roundtrip.unwrap().jitter_ms, 0.0);
    }

    #[test]
    fn jitter_converges_toward_amplitude_over_16_coefficient() {
        let mut s = Statistics::new();
        let samples = [10.0, 20.0, 10.0, 20.0, 10.0, 20.0, 10.0, 20.0];
        for (i, d) in samples.iter().enumerate() {
            s.add(*d, *d, *d, i as u32, i as u32);
        }
        let report = s.finalize(samples.len() as u64);
        // Known closed form after 7 alternations of amplitude-10 EWMA(1/16).
        assert!(report.roundtrip.unwrap().jitter_ms > 3.0);
    }

    #[test]
    fn min_max_track_extremes() {
        let mut s = Statistics::new();
        for d in [5.0, 1.0, 9.0, 3.0] {
            s.add(d, d, d, 0, 0);
        }
        let r = s.finalize(4).roundtrip.unwrap();
        assert_eq!(r.min_ms, 1.0);
        assert_eq!(r.max_ms, 9.0);
        assert_eq!(r.avg_ms, (5.0 + 1.0 + 9.0 + 3.0) / 4.0);
    }

    #[test]
    fn no_samples_yields_none_directions() {
        let s = Statistics::new();
        let report = s.finalize(10);
        assert!(report.outbound.is_none());
        assert!(report.roundtrip.is_none());
        assert_eq!(report.received, 0);
    }

    #[test]
    fn loss_accounting_matches_uniform_drop() {
        let mut s = Statistics::new();
        // 8 of 10 requests got a reply; receiver_seq runs 0..8 contiguously.
        for rseq in 0..8u32 {
            s.add(1.0, 1.0, 1.0, rseq, rseq);
        }
        let report = s.finalize(10);
        let rt = report.roundtrip.unwrap();
        assert!((rt.loss_pct - 20.0).abs() < 1e-9);
    }
}
