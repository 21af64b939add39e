//! Scenario definitions.
//!
//! Each scenario is a named configuration of targets and sources. All
//! scenarios are deterministic given the same seed.

use crate::replay::TimedFrame;
use crate::sources::{SimSource, Target};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Which pre-defined scenario to load.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenarioKind {
    /// 1 target observed by data link + surveillance + IRST
    MultiSource,
    /// 8 targets converging on the origin, 4 sources
    Crossing,
    /// 2 targets, one of which goes silent halfway through
    Silence,
    /// 200 random targets, all 6 sources — throughput stress
    Stress,
    /// 10 fully random targets (reference factory pattern)
    Factory,
}

/// A fully configured simulation scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub seed: u64,
    /// Total simulated time, milliseconds
    pub duration_ms: u64,
    /// Simulation step, milliseconds
    pub tick_ms: u64,
    pub targets: Vec<Target>,
    pub sources: Vec<SimSource>,
    /// If set, the last target stops being observed after this time
    pub silence_after_ms: Option<u64>,
}

impl Scenario {
    /// Build the named scenario. Uses `seed` for repeatability.
    pub fn build(kind: ScenarioKind, seed: u64) -> Self {
        match kind {
            ScenarioKind::MultiSource => Self::multi_source(seed),
            ScenarioKind::Crossing => Self::crossing(seed),
            ScenarioKind::Silence => Self::silence(seed),
            ScenarioKind::Stress => Self::stress(seed),
            ScenarioKind::Factory => Self::factory(seed),
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 1: MultiSource — the reference Link 16 + ASTERIX + IRST case
    // -----------------------------------------------------------------------
    fn multi_source(seed: u64) -> Self {
        Scenario {
            name: "multi_source".into(),
            seed,
            duration_ms: 60_000,
            tick_ms: 1_000,
            targets: vec![Target {
                id: 0,
                pos: [10_000.0, 20_000.0, 5_000.0],
                vel: [100.0, 50.0, 0.0],
            }],
            sources: vec![
                SimSource::tactical_link(),
                SimSource::surveillance(),
                SimSource::irst(),
            ],
            silence_after_ms: None,
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 2: Crossing — 8 targets converging on the origin
    // -----------------------------------------------------------------------
    fn crossing(seed: u64) -> Self {
        let targets = (0..8)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::TAU / 8.0;
                let r = 25_000.0_f64;
                Target {
                    id: i,
                    pos: [r * angle.cos(), r * angle.sin(), 8_000.0],
                    vel: [-200.0 * angle.cos(), -200.0 * angle.sin(), 0.0],
                }
            })
            .collect();

        Scenario {
            name: "crossing".into(),
            seed,
            duration_ms: 120_000,
            tick_ms: 1_000,
            targets,
            sources: vec![
                SimSource::own_radar(),
                SimSource::tactical_link(),
                SimSource::surveillance(),
                SimSource::adsb(),
            ],
            silence_after_ms: None,
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 3: Silence — exercises the timeout path
    // -----------------------------------------------------------------------
    fn silence(seed: u64) -> Self {
        Scenario {
            name: "silence".into(),
            seed,
            duration_ms: 120_000,
            tick_ms: 1_000,
            targets: vec![
                Target {
                    id: 0,
                    pos: [-10_000.0, 0.0, 6_000.0],
                    vel: [150.0, 0.0, 0.0],
                },
                Target {
                    id: 1,
                    pos: [10_000.0, 5_000.0, 7_000.0],
                    vel: [-150.0, 10.0, 0.0],
                },
            ],
            sources: vec![SimSource::own_radar(), SimSource::surveillance()],
            // Target 1 goes dark after 30 s and should age out of the store.
            silence_after_ms: Some(30_000),
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 4: Stress — 200 random targets, all sources
    // -----------------------------------------------------------------------
    fn stress(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(4));
        let targets = (0..200)
            .map(|i| {
                let speed = 100.0 + rng.gen::<f64>() * 150.0;
                let heading = rng.gen::<f64>() * std::f64::consts::TAU;
                // Spawn area + one minute of drift stays inside the Q16.16
                // position range.
                Target {
                    id: i,
                    pos: [
                        (rng.gen::<f64>() - 0.5) * 28_000.0,
                        (rng.gen::<f64>() - 0.5) * 28_000.0,
                        1_000.0 + rng.gen::<f64>() * 14_000.0,
                    ],
                    vel: [speed * heading.cos(), speed * heading.sin(), 0.0],
                }
            })
            .collect();

        Scenario {
            name: "stress".into(),
            seed,
            duration_ms: 60_000,
            tick_ms: 1_000,
            targets,
            sources: vec![
                SimSource::own_radar(),
                SimSource::tactical_link(),
                SimSource::surveillance(),
                SimSource::irst(),
                SimSource::esm(),
                SimSource::adsb(),
            ],
            silence_after_ms: None,
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 5: Factory — the reference random test-vector pattern
    // -----------------------------------------------------------------------
    fn factory(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let targets = (0..10)
            .map(|i| Target {
                id: i,
                pos: [
                    (rng.gen::<f64>() - 0.5) * 56_000.0,
                    (rng.gen::<f64>() - 0.5) * 56_000.0,
                    1_000.0 + rng.gen::<f64>() * 14_000.0,
                ],
                vel: [
                    (rng.gen::<f64>() - 0.5) * 600.0,
                    (rng.gen::<f64>() - 0.5) * 600.0,
                    0.0,
                ],
            })
            .collect();

        Scenario {
            name: "factory".into(),
            seed,
            duration_ms: 10_000,
            tick_ms: 1_000,
            targets,
            sources: vec![
                SimSource::tactical_link(),
                SimSource::surveillance(),
                SimSource::adsb(),
            ],
            silence_after_ms: None,
        }
    }

    /// Generate the full chronological report stream for this scenario.
    pub fn generate(&self) -> Vec<TimedFrame> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut targets = self.targets.clone();
        let mut frames = Vec::new();
        let dt_s = self.tick_ms as f64 / 1_000.0;

        let mut now_ms = 0u64;
        while now_ms < self.duration_ms {
            for source in &self.sources {
                if !source.due(now_ms) {
                    continue;
                }
                for (idx, target) in targets.iter().enumerate() {
                    if let Some(cutoff) = self.silence_after_ms {
                        if now_ms >= cutoff && idx == targets.len() - 1 {
                            continue;
                        }
                    }
                    frames.push(TimedFrame {
                        now_ms,
                        frame: source.observe(target, now_ms, &mut rng),
                    });
                }
            }
            for target in &mut targets {
                target.step(dt_s);
            }
            now_ms += self.tick_ms;
        }
        frames
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let s = Scenario::build(ScenarioKind::MultiSource, 42);
        let a = s.generate();
        let b = s.generate();
        assert_eq!(a.len(), b.len());
        assert!(!a.is_empty());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.now_ms, y.now_ms);
            assert_eq!(x.frame.pos, y.frame.pos);
        }
    }

    #[test]
    fn silence_scenario_stops_observing_last_target() {
        let s = Scenario::build(ScenarioKind::Silence, 7);
        let frames = s.generate();
        let cutoff = s.silence_after_ms.unwrap();
        let observed_after = frames
            .iter()
            .filter(|f| f.now_ms >= cutoff && f.frame.track_id & 0x00FF_FFFF == 1)
            .count();
        assert_eq!(observed_after, 0);
    }

    #[test]
    fn frames_are_chronological() {
        let s = Scenario::build(ScenarioKind::Crossing, 3);
        let frames = s.generate();
        assert!(frames.windows(2).all(|w| w[0].now_ms <= w[1].now_ms));
    }
}
