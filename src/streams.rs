//! Hierarchical stream projection
//!
//! [`StreamAssembler`] turns a flat, sequence-ordered list of buffered
//! observations into the document hierarchy
//!
//! ```text
//! DeviceStream (device key)
//! └── ComponentStream (structural element)
//!     ├── samples     ─┐
//!     ├── events       ├─ filtered views over one unified list
//!     └── conditions  ─┘
//! ```
//!
//! Grouping is a single pass; devices and components appear in the order
//! of their first observation. Category and representation views are tag
//! filters over the unified list, so they can never disagree with it.
//! Nothing here is retained between reads.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::buffer::BufferedObservation;
use crate::catalog::TypeCatalog;
use crate::observation::{Category, Representation};

/// Observations of one structural element
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ComponentStream {
    component_id: String,
    kind: Option<String>,
    name: Option<String>,
    observations: Vec<BufferedObservation>,
}

impl ComponentStream {
    fn new(component_id: &str, catalog: Option<&dyn TypeCatalog>) -> Self {
        let descriptor = catalog.and_then(|c| c.component(component_id));
        Self {
            component_id: component_id.to_string(),
            kind: descriptor.map(|d| d.kind.clone()),
            name: descriptor.and_then(|d| d.name.clone()),
            observations: Vec::new(),
        }
    }

    /// Structural element id
    pub fn component_id(&self) -> &str {
        &self.component_id
    }

    /// Element type, when the catalog knows it
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Element display name, when the catalog knows it
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// All observations in sequence order
    pub fn observations(&self) -> &[BufferedObservation] {
        &self.observations
    }

    /// Observations of one category
    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &BufferedObservation> {
        self.observations
            .iter()
            .filter(move |o| o.category() == category)
    }

    /// Samples
    pub fn samples(&self) -> impl Iterator<Item = &BufferedObservation> {
        self.by_category(Category::Sample)
    }

    /// Events
    pub fn events(&self) -> impl Iterator<Item = &BufferedObservation> {
        self.by_category(Category::Event)
    }

    /// Conditions
    pub fn conditions(&self) -> impl Iterator<Item = &BufferedObservation> {
        self.by_category(Category::Condition)
    }

    /// Samples with a given representation
    pub fn samples_of(
        &self,
        representation: Representation,
    ) -> impl Iterator<Item = &BufferedObservation> {
        self.samples()
            .filter(move |o| o.representation() == representation)
    }

    /// Events with a given representation
    pub fn events_of(
        &self,
        representation: Representation,
    ) -> impl Iterator<Item = &BufferedObservation> {
        self.events()
            .filter(move |o| o.representation() == representation)
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Check if the stream is empty
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Component streams of one device
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DeviceStream {
    device_key: String,
    components: Vec<ComponentStream>,
}

impl DeviceStream {
    /// Device key
    pub fn device_key(&self) -> &str {
        &self.device_key
    }

    /// Component streams in order of first observation
    pub fn components(&self) -> &[ComponentStream] {
        &self.components
    }

    /// Component stream by id
    pub fn component(&self, component_id: &str) -> Option<&ComponentStream> {
        self.components
            .iter()
            .find(|c| c.component_id == component_id)
    }

    /// All observations of the device, grouped by component
    pub fn observations(&self) -> impl Iterator<Item = &BufferedObservation> {
        self.components.iter().flat_map(|c| c.observations.iter())
    }

    /// Total number of observations
    pub fn observation_count(&self) -> usize {
        self.components.iter().map(ComponentStream::len).sum()
    }
}

/// Builds device/component streams from buffered observations
#[derive(Default, Clone, Copy)]
pub struct StreamAssembler<'a> {
    catalog: Option<&'a dyn TypeCatalog>,
}

impl<'a> StreamAssembler<'a> {
    /// Assembler without component metadata
    pub fn new() -> Self {
        Self { catalog: None }
    }

    /// Assembler that labels components from the catalog
    pub fn with_catalog(catalog: &'a dyn TypeCatalog) -> Self {
        Self {
            catalog: Some(catalog),
        }
    }

    /// Group observations by device, then by structural element
    pub fn assemble<'b, I>(&self, observations: I) -> Vec<DeviceStream>
    where
        I: IntoIterator<Item = &'b BufferedObservation>,
    {
        let mut devices: Vec<DeviceStream> = Vec::new();
        let mut device_index: HashMap<String, usize> = HashMap::new();
        let mut component_index: HashMap<(usize, String), usize> = HashMap::new();

        for observation in observations {
            let d = match device_index.get(observation.device_key()) {
                Some(&d) => d,
                None => {
                    devices.push(DeviceStream {
                        device_key: observation.device_key().to_string(),
                        components: Vec::new(),
                    });
                    device_index.insert(observation.device_key().to_string(), devices.len() - 1);
                    devices.len() - 1
                }
            };

            let device = &mut devices[d];
            let key = (d, observation.component_id().to_string());
            let c = match component_index.get(&key) {
                Some(&c) => c,
                None => {
                    device
                        .components
                        .push(ComponentStream::new(observation.component_id(), self.catalog));
                    let c = device.components.len() - 1;
                    component_index.insert(key, c);
                    c
                }
            };
            device.components[c].observations.push(observation.clone());
        }

        devices
    }
}

impl std::fmt::Debug for StreamAssembler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamAssembler")
            .field("catalog", &self.catalog.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SequencedBuffer;
    use crate::catalog::{ComponentDescriptor, DataItemDescriptor, StaticCatalog};
    use crate::fault_state::{FaultReport, FaultStateAggregator};
    use crate::observation::{ObservationInput, ObservationRecord};
    use crate::value_set::ValueSet;

    fn catalog() -> StaticCatalog {
        StaticCatalog::new()
            .with_component(
                ComponentDescriptor::new("ctrl", "mill", "Controller").with_name("controller"),
            )
            .with_data_item(DataItemDescriptor::event("exec", "mill", "ctrl"))
            .with_data_item(
                DataItemDescriptor::event("vars", "mill", "ctrl")
                    .with_representation(Representation::DataSet),
            )
            .with_data_item(DataItemDescriptor::condition("system", "mill", "ctrl"))
            .with_data_item(DataItemDescriptor::sample("xpos", "mill", "x"))
            .with_data_item(
                DataItemDescriptor::sample("xload", "mill", "x")
                    .with_representation(Representation::TimeSeries),
            )
            .with_data_item(DataItemDescriptor::event("exec2", "lathe", "ctrl2"))
    }

    fn filled_buffer(catalog: &StaticCatalog) -> SequencedBuffer {
        let mut buffer = SequencedBuffer::new(32);
        let inputs = vec![
            ObservationInput::value("mill", "xpos", 1, "10.5"),
            ObservationInput::value("mill", "exec", 2, "ACTIVE"),
            ObservationInput::value("lathe", "exec2", 3, "READY"),
            ObservationInput::time_series("mill", "xload", 4, 10.0, &[1.0, 2.0]),
            ObservationInput::data_set("mill", "vars", 5, ValueSet::new().with("a", "1")),
        ];
        for input in inputs {
            buffer.append(input.resolve(catalog).unwrap());
        }

        let agg = FaultStateAggregator::new("mill", "system");
        let update = agg.add_warning(FaultReport::coded("1"), 6);
        let descriptor = catalog.describe("system").unwrap();
        buffer.append(ObservationRecord::condition("mill", descriptor, update.snapshot, 6).unwrap());
        buffer
    }

    #[test]
    fn test_groups_by_device_then_component() {
        let catalog = catalog();
        let buffer = filled_buffer(&catalog);
        let slice = buffer.slice(1, 100);
        let streams = StreamAssembler::new().assemble(&slice);

        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].device_key(), "mill");
        assert_eq!(streams[1].device_key(), "lathe");

        let mill = &streams[0];
        let ids: Vec<_> = mill.components().iter().map(|c| c.component_id()).collect();
        assert_eq!(ids, vec!["x", "ctrl"]);
        assert_eq!(mill.observation_count(), 5);
    }

    #[test]
    fn test_category_views() {
        let catalog = catalog();
        let buffer = filled_buffer(&catalog);
        let slice = buffer.slice(1, 100);
        let streams = StreamAssembler::new().assemble(&slice);
        let mill = &streams[0];

        let ctrl = mill.component("ctrl").unwrap();
        assert_eq!(ctrl.events().count(), 2);
        assert_eq!(ctrl.conditions().count(), 1);
        assert_eq!(ctrl.samples().count(), 0);
        assert_eq!(ctrl.events_of(Representation::DataSet).count(), 1);
        assert_eq!(ctrl.events_of(Representation::Value).count(), 1);

        let x = mill.component("x").unwrap();
        assert_eq!(x.samples().count(), 2);
        assert_eq!(x.samples_of(Representation::TimeSeries).count(), 1);
        assert_eq!(x.samples_of(Representation::Table).count(), 0);
    }

    #[test]
    fn test_views_partition_unified_list() {
        let catalog = catalog();
        let buffer = filled_buffer(&catalog);
        let slice = buffer.slice(1, 100);
        for device in StreamAssembler::new().assemble(&slice) {
            for component in device.components() {
                let total = component.samples().count()
                    + component.events().count()
                    + component.conditions().count();
                assert_eq!(total, component.len());
            }
        }
    }

    #[test]
    fn test_preserves_sequence_order_within_component() {
        let catalog = catalog();
        let buffer = filled_buffer(&catalog);
        let slice = buffer.slice(1, 100);
        let streams = StreamAssembler::new().assemble(&slice);
        let ctrl = streams[0].component("ctrl").unwrap();
        let sequences: Vec<_> = ctrl.observations().iter().map(|o| o.sequence()).collect();
        assert_eq!(sequences, vec![2, 5, 6]);
    }

    #[test]
    fn test_catalog_labels_components() {
        let catalog = catalog();
        let buffer = filled_buffer(&catalog);
        let slice = buffer.slice(1, 100);
        let streams = StreamAssembler::with_catalog(&catalog).assemble(&slice);
        let ctrl = streams[0].component("ctrl").unwrap();
        assert_eq!(ctrl.kind(), Some("Controller"));
        assert_eq!(ctrl.name(), Some("controller"));
        assert_eq!(streams[0].component("x").unwrap().kind(), None);
    }

    #[test]
    fn test_empty_input() {
        let streams = StreamAssembler::new().assemble(&Vec::<BufferedObservation>::new());
        assert!(streams.is_empty());
    }
}
