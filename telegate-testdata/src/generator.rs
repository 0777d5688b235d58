// Telegate Testdata - Core generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Adapter stream generation.
//!
//! Simulates the demo mill tick by tick and records every update its
//! adapter would push. With a seed the stream is fully reproducible.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use telegate::{FaultReport, FaultStateOp, ObservationInput, Qualifier, ValueSet};

use crate::dataset::{Dataset, DatasetMetadata};
use crate::machining::{items, MachiningScenario, DEVICE};
use crate::update::AdapterUpdate;

/// Ticks per part cycle.
const CYCLE_TICKS: usize = 20;
/// Active ticks within a part cycle.
const ACTIVE_TICKS: usize = 15;
/// Ticks between spindle load series.
const LOAD_SERIES_EVERY: usize = 5;
/// Ticks between controller variable snapshots.
const VARIABLES_EVERY: usize = 25;
/// Coolant level that raises the low-coolant warning.
const COOLANT_LOW: f64 = 20.0;

/// Generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Start timestamp in milliseconds.
    pub start_time_ms: i64,
    /// Interval between ticks in milliseconds.
    pub sample_interval_ms: i64,
    /// Number of ticks to simulate.
    pub num_samples: usize,
    /// Random seed for reproducibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Device key of the simulated mill.
    pub device_key: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            start_time_ms: 1706745600000, // 2024-02-01 00:00:00 UTC
            sample_interval_ms: 1_000,
            num_samples: 200,
            seed: None,
            device_key: DEVICE.to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Create a new generator config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set start timestamp.
    pub fn with_start_time(mut self, timestamp_ms: i64) -> Self {
        self.start_time_ms = timestamp_ms;
        self
    }

    /// Set tick interval.
    pub fn with_sample_interval_ms(mut self, interval_ms: i64) -> Self {
        self.sample_interval_ms = interval_ms;
        self
    }

    /// Set number of ticks.
    pub fn with_num_samples(mut self, n: usize) -> Self {
        self.num_samples = n;
        self
    }

    /// Set duration in minutes (calculates num_samples from interval).
    pub fn with_duration_minutes(mut self, minutes: f64) -> Self {
        let total_ms = minutes * 60_000.0;
        self.num_samples = (total_ms / self.sample_interval_ms.max(1) as f64).ceil() as usize;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the device key.
    pub fn with_device_key(mut self, device_key: &str) -> Self {
        self.device_key = device_key.to_string();
        self
    }

    /// Get total duration in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        self.sample_interval_ms * self.num_samples.saturating_sub(1) as i64
    }

    /// Get end timestamp.
    pub fn end_time_ms(&self) -> i64 {
        self.start_time_ms + self.duration_ms()
    }
}

/// Generate the adapter stream of a scenario.
pub fn generate_dataset(config: &GeneratorConfig, scenario: MachiningScenario) -> Dataset {
    let rng: Box<dyn RngCore> = match config.seed {
        Some(s) => Box::new(StdRng::seed_from_u64(s)),
        None => Box::new(StdRng::from_entropy()),
    };

    let mut mill = MillSimulator::new(config, scenario, rng);
    for tick in 0..config.num_samples {
        mill.tick(tick);
    }

    Dataset::new(mill.updates).with_metadata(DatasetMetadata {
        name: Some(scenario.name().to_string()),
        scenario: Some(scenario),
        description: Some(scenario.description().to_string()),
        device_key: Some(config.device_key.clone()),
        seed: config.seed,
        sample_interval_ms: Some(config.sample_interval_ms),
    })
}

/// Tick at which a fraction of the run is reached.
fn at(num_samples: usize, fraction: f64) -> usize {
    (num_samples as f64 * fraction) as usize
}

struct MillSimulator<'a> {
    config: &'a GeneratorConfig,
    scenario: MachiningScenario,
    rng: Box<dyn RngCore>,
    coolant_level: f64,
    coolant_low: bool,
    connected: bool,
    updates: Vec<AdapterUpdate>,
}

impl<'a> MillSimulator<'a> {
    fn new(config: &'a GeneratorConfig, scenario: MachiningScenario, rng: Box<dyn RngCore>) -> Self {
        Self {
            config,
            scenario,
            rng,
            coolant_level: 95.0,
            coolant_low: false,
            connected: true,
            updates: Vec::new(),
        }
    }

    fn device(&self) -> &str {
        &self.config.device_key
    }

    fn timestamp(&self, tick: usize) -> i64 {
        self.config.start_time_ms + tick as i64 * self.config.sample_interval_ms
    }

    fn noise(&mut self, std: f64) -> f64 {
        Normal::new(0.0, std)
            .map(|normal| normal.sample(&mut *self.rng))
            .unwrap_or(0.0)
    }

    fn push_value(&mut self, item: &str, ts: i64, value: impl Into<String>) {
        let update = AdapterUpdate::observation(self.device(), item, ts, ValueSet::result(value));
        self.updates.push(update);
    }

    fn push_values(&mut self, item: &str, ts: i64, values: ValueSet) {
        let update = AdapterUpdate::observation(self.device(), item, ts, values);
        self.updates.push(update);
    }

    fn push_input(&mut self, input: ObservationInput) {
        let update = AdapterUpdate::observation(
            self.device(),
            input.data_item_key(),
            input.timestamp(),
            input.values().clone(),
        );
        self.updates.push(update);
    }

    fn push_condition(&mut self, item: &str, ts: i64, op: FaultStateOp) {
        let update = AdapterUpdate::condition(self.device(), item, ts, op);
        self.updates.push(update);
    }

    fn tick(&mut self, tick: usize) {
        let n = self.config.num_samples;
        let ts = self.timestamp(tick);

        if tick == 0 {
            self.connect(ts);
        }

        if self.scenario == MachiningScenario::AdapterDisconnect {
            if tick == at(n, 0.5) {
                self.disconnect(ts);
            } else if tick == at(n, 0.75) {
                self.connect(ts);
            }
        }
        if !self.connected {
            return;
        }

        self.run_scenario(tick, ts);
        self.cycle(tick, ts);
    }

    /// Initial state of every item after the adapter connects
    fn connect(&mut self, ts: i64) {
        self.connected = true;
        self.push_value(items::EXECUTION, ts, "READY");
        self.push_value(items::PROGRAM, ts, "O1001");
        self.push_condition(items::SYSTEM, ts, FaultStateOp::set_normal());
        self.push_condition(items::X_TRAVEL, ts, FaultStateOp::set_normal());
        self.push_condition(items::COOLANT, ts, FaultStateOp::set_normal());

        let table = ObservationInput::table(
            self.device(),
            items::TOOL_TABLE,
            ts,
            vec![
                ("T1", ValueSet::new().with("LENGTH", "101.2").with("DIAMETER", "12")),
                ("T2", ValueSet::new().with("LENGTH", "87.5").with("DIAMETER", "6")),
            ],
        );
        self.push_input(table);
    }

    /// Everything the agent should mark unavailable when the adapter drops
    fn disconnect(&mut self, ts: i64) {
        self.connected = false;
        for item in [
            items::EXECUTION,
            items::PROGRAM,
            items::SPINDLE_SPEED,
            items::X_POSITION,
            items::COOLANT_LEVEL,
        ] {
            self.push_values(item, ts, ValueSet::unavailable());
        }
        for item in [items::SYSTEM, items::X_TRAVEL, items::COOLANT] {
            self.push_condition(item, ts, FaultStateOp::set_unavailable());
        }
    }

    fn run_scenario(&mut self, tick: usize, ts: i64) {
        let n = self.config.num_samples;
        match self.scenario {
            MachiningScenario::NormalCycle | MachiningScenario::AdapterDisconnect => {}
            MachiningScenario::CoolantFault => {
                if tick == at(n, 0.7) {
                    self.coolant_level = 95.0;
                    self.push_value(items::MESSAGE, ts, "Coolant refilled");
                }
            }
            MachiningScenario::AxisOvertravel => {
                if tick == at(n, 0.3) {
                    let report = FaultReport::coded("X1")
                        .with_message("Soft limit approached")
                        .with_qualifier(Qualifier::High);
                    self.push_condition(items::X_TRAVEL, ts, FaultStateOp::add_warning(report));
                } else if tick == at(n, 0.35) {
                    let report = FaultReport::coded("X2").with_message("Following error");
                    self.push_condition(items::X_TRAVEL, ts, FaultStateOp::add_fault(report));
                } else if tick == at(n, 0.5) {
                    let report = FaultReport::message("Axis Overtravel");
                    self.push_condition(items::X_TRAVEL, ts, FaultStateOp::set_fault(report));
                    self.push_value(items::MESSAGE, ts, "Axis Overtravel");
                } else if tick == at(n, 0.8) {
                    self.push_condition(items::X_TRAVEL, ts, FaultStateOp::set_normal());
                }
            }
        }
    }

    /// Part cycle: execution state, spindle, axis motion, coolant use
    fn cycle(&mut self, tick: usize, ts: i64) {
        let phase = tick % CYCLE_TICKS;
        let active = phase < ACTIVE_TICKS;
        self.push_value(items::EXECUTION, ts, if active { "ACTIVE" } else { "READY" });

        let speed = if active {
            (1200.0 + self.noise(5.0)).round()
        } else {
            0.0
        };
        self.push_value(items::SPINDLE_SPEED, ts, format!("{}", speed));

        let position = if active {
            100.0 * (phase as f64 / ACTIVE_TICKS as f64) + self.noise(0.002)
        } else {
            0.0
        };
        self.push_value(items::X_POSITION, ts, format!("{:.3}", position));

        if active && phase % LOAD_SERIES_EVERY == 0 {
            let samples: Vec<f64> = (0..4)
                .map(|_| ((35.0 + self.noise(2.0)) * 10.0).round() / 10.0)
                .collect();
            let series =
                ObservationInput::time_series(self.device(), items::SPINDLE_LOAD, ts, 100.0, &samples);
            self.push_input(series);
        }

        if tick % VARIABLES_EVERY == 0 {
            let values = ValueSet::new()
                .with("feed_override", "100")
                .with("part_count", (tick / CYCLE_TICKS).to_string());
            self.push_values(items::VARIABLES, ts, values);
        }

        if active {
            let usage = match self.scenario {
                MachiningScenario::CoolantFault => 0.8,
                _ => 0.05,
            };
            self.coolant_level = (self.coolant_level - usage).max(0.0);
        }
        self.push_value(items::COOLANT_LEVEL, ts, format!("{:.1}", self.coolant_level));

        let low = self.coolant_level < COOLANT_LOW;
        if low != self.coolant_low {
            self.coolant_low = low;
            let op = if low {
                FaultStateOp::add_warning(
                    FaultReport::coded("113")
                        .with_message("Coolant Low")
                        .with_qualifier(Qualifier::Low),
                )
            } else {
                FaultStateOp::add_normal(FaultReport::coded("113"))
            };
            self.push_condition(items::COOLANT, ts, op);
        }
    }
}
