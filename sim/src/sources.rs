//! Simulated targets and per-source observation models.
//!
//! Each [`SimSource`] mimics the error/quality character of one contributor
//! class: data links are coarse but persistent, surveillance feeds are
//! sharp, IRST is angle-accurate but range-poor, and so on. Covariance
//! proxies and quality values follow the reference source characteristics.

use fusion_core::{ReportFrame, SourceKind};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A constant-velocity simulated target.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Target {
    pub id: u32,
    /// Position east/north/up, meters
    pub pos: [f64; 3],
    /// Velocity east/north/up, m/s
    pub vel: [f64; 3],
}

impl Target {
    pub fn step(&mut self, dt_s: f64) {
        for i in 0..3 {
            self.pos[i] += self.vel[i] * dt_s;
        }
    }
}

/// Observation model of one contributing source.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimSource {
    pub kind: SourceKind,
    /// Position noise half-width per axis, meters (uniform)
    pub pos_noise_m: f64,
    /// Velocity noise half-width per axis, m/s (uniform)
    pub vel_noise_ms: f64,
    pub cov_pos: u32,
    pub cov_vel: u32,
    pub quality: u8,
    /// Reporting period, milliseconds
    pub period_ms: u64,
}

impl SimSource {
    /// Whether this source reports at simulation time `now_ms`.
    pub fn due(&self, now_ms: u64) -> bool {
        self.period_ms > 0 && now_ms % self.period_ms == 0
    }

    /// Produce one noisy report frame for `target`.
    pub fn observe<R: Rng>(&self, target: &Target, now_ms: u64, rng: &mut R) -> ReportFrame {
        let jitter = |rng: &mut R, half_width: f64| (rng.gen::<f64>() * 2.0 - 1.0) * half_width;
        let mut pos = target.pos;
        let mut vel = target.vel;
        for i in 0..3 {
            pos[i] += jitter(rng, self.pos_noise_m);
            vel[i] += jitter(rng, self.vel_noise_ms);
        }
        ReportFrame {
            // Source-local numbering: source id in the high byte.
            track_id: (self.kind.wire_id() as u32) << 24 | target.id,
            source: self.kind.wire_id(),
            class_hint: 0,
            pos,
            vel,
            cov_pos: self.cov_pos,
            cov_vel: self.cov_vel,
            timestamp: now_ms,
            quality: self.quality,
        }
    }

    // -----------------------------------------------------------------------
    // Presets
    // -----------------------------------------------------------------------

    /// Own-ship radar: sharp position, good velocity, fast refresh.
    pub fn own_radar() -> Self {
        Self {
            kind: SourceKind::OwnRadar,
            pos_noise_m: 30.0,
            vel_noise_ms: 3.0,
            cov_pos: 10_000,
            cov_vel: 100,
            quality: 128,
            period_ms: 1_000,
        }
    }

    /// Link-16-class tactical data link: coarse, slow, reliable.
    pub fn tactical_link() -> Self {
        Self {
            kind: SourceKind::TacticalDataLink,
            pos_noise_m: 150.0,
            vel_noise_ms: 10.0,
            cov_pos: 100_000,
            cov_vel: 1_000,
            quality: 80,
            period_ms: 5_000,
        }
    }

    /// Surveillance network feed (ASTERIX class): best accuracy.
    pub fn surveillance() -> Self {
        Self {
            kind: SourceKind::SurveillanceAsterix,
            pos_noise_m: 25.0,
            vel_noise_ms: 2.0,
            cov_pos: 2_500,
            cov_vel: 25,
            quality: 150,
            period_ms: 4_000,
        }
    }

    /// IRST: confirms presence, poor absolute position.
    pub fn irst() -> Self {
        Self {
            kind: SourceKind::InfraredSearchTrack,
            pos_noise_m: 400.0,
            vel_noise_ms: 30.0,
            cov_pos: 1_000_000,
            cov_vel: 100_000,
            quality: 100,
            period_ms: 2_000,
        }
    }

    /// ESM bearing reports: very coarse position estimate.
    pub fn esm() -> Self {
        Self {
            kind: SourceKind::ElectronicSupport,
            pos_noise_m: 500.0,
            vel_noise_ms: 40.0,
            cov_pos: 2_000_000,
            cov_vel: 200_000,
            quality: 60,
            period_ms: 3_000,
        }
    }

    /// ADS-B: cooperative, precise, only some targets carry it.
    pub fn adsb() -> Self {
        Self {
            kind: SourceKind::Adsb,
            pos_noise_m: 10.0,
            vel_noise_ms: 1.0,
            cov_pos: 400,
            cov_vel: 16,
            quality: 200,
            period_ms: 1_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn observation_stays_near_truth() {
        let target = Target {
            id: 7,
            pos: [5_000.0, -2_000.0, 9_000.0],
            vel: [200.0, 0.0, 0.0],
        };
        let src = SimSource::surveillance();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..50 {
            let frame = src.observe(&target, 0, &mut rng);
            for i in 0..3 {
                assert!((frame.pos[i] - target.pos[i]).abs() <= src.pos_noise_m);
                assert!((frame.vel[i] - target.vel[i]).abs() <= src.vel_noise_ms);
            }
            assert_eq!(frame.source, SourceKind::SurveillanceAsterix.wire_id());
        }
    }

    #[test]
    fn due_follows_period() {
        let src = SimSource::tactical_link();
        assert!(src.due(0));
        assert!(!src.due(1_000));
        assert!(src.due(5_000));
    }

    #[test]
    fn target_steps_linearly() {
        let mut t = Target {
            id: 0,
            pos: [0.0, 0.0, 0.0],
            vel: [100.0, -50.0, 2.0],
        };
        t.step(2.0);
        assert_eq!(t.pos, [200.0, -100.0, 4.0]);
    }
}
