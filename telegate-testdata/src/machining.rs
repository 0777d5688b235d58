// Telegate Testdata - Machining cell
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Three-axis mill device model and its scenarios.
//!
//! The demo device has a controller, a spindle, a linear X axis and a
//! coolant system. Every data item category and representation is
//! covered at least once.

use serde::{Deserialize, Serialize};
use telegate::{ComponentDescriptor, DataItemDescriptor, Representation, StaticCatalog};

/// Default device key of the demo mill.
pub const DEVICE: &str = "mill";

/// Data item keys of the demo mill.
pub mod items {
    /// Execution state event.
    pub const EXECUTION: &str = "exec";
    /// Active program event.
    pub const PROGRAM: &str = "program";
    /// Operator message event (discrete).
    pub const MESSAGE: &str = "message";
    /// Controller variables (data set).
    pub const VARIABLES: &str = "vars";
    /// Tool offsets (table).
    pub const TOOL_TABLE: &str = "tools";
    /// Controller system condition.
    pub const SYSTEM: &str = "system";
    /// Spindle speed sample.
    pub const SPINDLE_SPEED: &str = "spindle_speed";
    /// Spindle load series (time series).
    pub const SPINDLE_LOAD: &str = "spindle_load";
    /// X position sample.
    pub const X_POSITION: &str = "xpos";
    /// X travel condition.
    pub const X_TRAVEL: &str = "xtravel";
    /// Coolant level sample.
    pub const COOLANT_LEVEL: &str = "coolant_level";
    /// Coolant condition.
    pub const COOLANT: &str = "coolant_cond";
}

/// Component ids of the demo mill.
pub mod components {
    /// Controller.
    pub const CONTROLLER: &str = "controller";
    /// Spindle.
    pub const SPINDLE: &str = "spindle";
    /// Linear X axis.
    pub const X_AXIS: &str = "x";
    /// Coolant system.
    pub const COOLANT: &str = "coolant";
}

/// Machining scenario types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachiningScenario {
    /// Repeating part cycles, no faults.
    NormalCycle,
    /// Coolant runs low, warning raised then cleared after refill.
    CoolantFault,
    /// Two coded travel faults collapsed by an uncoded overtravel fault.
    AxisOvertravel,
    /// Adapter drops out mid-run and reconnects.
    AdapterDisconnect,
}

impl MachiningScenario {
    /// All scenarios.
    pub fn all() -> [MachiningScenario; 4] {
        [
            Self::NormalCycle,
            Self::CoolantFault,
            Self::AxisOvertravel,
            Self::AdapterDisconnect,
        ]
    }

    /// Scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NormalCycle => "normal_cycle",
            Self::CoolantFault => "coolant_fault",
            Self::AxisOvertravel => "axis_overtravel",
            Self::AdapterDisconnect => "adapter_disconnect",
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NormalCycle => "Repeating part cycles without faults",
            Self::CoolantFault => "Coolant low warning, refill, back to normal",
            Self::AxisOvertravel => "Coded travel faults collapsed by an overtravel fault",
            Self::AdapterDisconnect => "Adapter disconnect and reconnect",
        }
    }
}

/// Build the catalog of the demo mill under `device_key`.
pub fn demo_catalog(device_key: &str) -> StaticCatalog {
    StaticCatalog::new()
        .with_component(
            ComponentDescriptor::new(components::CONTROLLER, device_key, "Controller")
                .with_name("cnc"),
        )
        .with_component(
            ComponentDescriptor::new(components::SPINDLE, device_key, "Rotary").with_name("C"),
        )
        .with_component(
            ComponentDescriptor::new(components::X_AXIS, device_key, "Linear").with_name("X"),
        )
        .with_component(ComponentDescriptor::new(
            components::COOLANT,
            device_key,
            "Coolant",
        ))
        .with_data_item(
            DataItemDescriptor::event(items::EXECUTION, device_key, components::CONTROLLER)
                .with_kind("EXECUTION"),
        )
        .with_data_item(
            DataItemDescriptor::event(items::PROGRAM, device_key, components::CONTROLLER)
                .with_kind("PROGRAM"),
        )
        .with_data_item(
            DataItemDescriptor::event(items::MESSAGE, device_key, components::CONTROLLER)
                .with_kind("MESSAGE")
                .discrete(),
        )
        .with_data_item(
            DataItemDescriptor::event(items::VARIABLES, device_key, components::CONTROLLER)
                .with_kind("VARIABLE")
                .with_representation(Representation::DataSet),
        )
        .with_data_item(
            DataItemDescriptor::event(items::TOOL_TABLE, device_key, components::CONTROLLER)
                .with_kind("TOOL_OFFSETS")
                .with_representation(Representation::Table),
        )
        .with_data_item(
            DataItemDescriptor::condition(items::SYSTEM, device_key, components::CONTROLLER)
                .with_kind("SYSTEM"),
        )
        .with_data_item(
            DataItemDescriptor::sample(items::SPINDLE_SPEED, device_key, components::SPINDLE)
                .with_kind("ROTARY_VELOCITY"),
        )
        .with_data_item(
            DataItemDescriptor::sample(items::SPINDLE_LOAD, device_key, components::SPINDLE)
                .with_kind("LOAD")
                .with_representation(Representation::TimeSeries),
        )
        .with_data_item(
            DataItemDescriptor::sample(items::X_POSITION, device_key, components::X_AXIS)
                .with_kind("POSITION"),
        )
        .with_data_item(
            DataItemDescriptor::condition(items::X_TRAVEL, device_key, components::X_AXIS)
                .with_kind("POSITION"),
        )
        .with_data_item(
            DataItemDescriptor::sample(items::COOLANT_LEVEL, device_key, components::COOLANT)
                .with_kind("FILL_LEVEL"),
        )
        .with_data_item(
            DataItemDescriptor::condition(items::COOLANT, device_key, components::COOLANT)
                .with_kind("FILL_LEVEL"),
        )
}
