//! Data item type catalog
//!
//! The catalog is the read-only lookup this core consults to learn a data
//! item's category, representation and owning structural element. The
//! device model loader that fills it lives elsewhere; [`StaticCatalog`]
//! is the in-memory implementation it hands over.

use std::collections::HashMap;

use crate::observation::{Category, Representation};

/// Type metadata of one data item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataItemDescriptor {
    /// Data item key, unique across devices
    pub key: String,
    /// Owning device
    pub device_key: String,
    /// Owning structural element
    pub component_id: String,
    /// SAMPLE / EVENT / CONDITION
    pub category: Category,
    /// VALUE / DATA_SET / TABLE / TIME_SERIES
    pub representation: Representation,
    /// Repeated identical values are distinct events
    pub discrete: bool,
    /// Type name (e.g. `EXECUTION`, `SPINDLE_SPEED`)
    pub kind: Option<String>,
}

impl DataItemDescriptor {
    /// Create a descriptor with the VALUE representation
    pub fn new(
        key: impl Into<String>,
        device_key: impl Into<String>,
        component_id: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            key: key.into(),
            device_key: device_key.into(),
            component_id: component_id.into(),
            category,
            representation: Representation::Value,
            discrete: false,
            kind: None,
        }
    }

    /// SAMPLE descriptor
    pub fn sample(
        key: impl Into<String>,
        device_key: impl Into<String>,
        component_id: impl Into<String>,
    ) -> Self {
        Self::new(key, device_key, component_id, Category::Sample)
    }

    /// EVENT descriptor
    pub fn event(
        key: impl Into<String>,
        device_key: impl Into<String>,
        component_id: impl Into<String>,
    ) -> Self {
        Self::new(key, device_key, component_id, Category::Event)
    }

    /// CONDITION descriptor
    pub fn condition(
        key: impl Into<String>,
        device_key: impl Into<String>,
        component_id: impl Into<String>,
    ) -> Self {
        Self::new(key, device_key, component_id, Category::Condition)
    }

    /// Set the representation
    pub fn with_representation(mut self, representation: Representation) -> Self {
        self.representation = representation;
        self
    }

    /// Mark as discrete
    pub fn discrete(mut self) -> Self {
        self.discrete = true;
        self
    }

    /// Set the type name
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

/// Metadata of a structural element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDescriptor {
    /// Component id
    pub id: String,
    /// Owning device
    pub device_key: String,
    /// Element type (e.g. `Controller`, `Rotary`, `Linear`)
    pub kind: String,
    /// Display name
    pub name: Option<String>,
}

impl ComponentDescriptor {
    /// Create a component descriptor
    pub fn new(
        id: impl Into<String>,
        device_key: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            device_key: device_key.into(),
            kind: kind.into(),
            name: None,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Read-only data item type lookup
pub trait TypeCatalog: Send + Sync {
    /// Describe a data item
    fn describe(&self, data_item_key: &str) -> Option<&DataItemDescriptor>;

    /// Describe a structural element
    fn component(&self, _component_id: &str) -> Option<&ComponentDescriptor> {
        None
    }

    /// Known device keys
    fn devices(&self) -> Vec<&str>;

    /// Data items of a device, in catalog order
    fn data_items(&self, device_key: &str) -> Vec<&DataItemDescriptor>;

    /// `ResolveCategory(dataItemKey)`
    fn resolve_category(&self, data_item_key: &str) -> Option<Category> {
        self.describe(data_item_key).map(|d| d.category)
    }

    /// `ResolveRepresentation(dataItemKey)`
    fn resolve_representation(&self, data_item_key: &str) -> Option<Representation> {
        self.describe(data_item_key).map(|d| d.representation)
    }

    /// Check if a device is known
    fn has_device(&self, device_key: &str) -> bool {
        self.devices().contains(&device_key)
    }
}

/// In-memory catalog
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    devices: Vec<String>,
    components: HashMap<String, ComponentDescriptor>,
    items: Vec<DataItemDescriptor>,
    index: HashMap<String, usize>,
}

impl StaticCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device
    pub fn add_device(&mut self, device_key: impl Into<String>) {
        let device_key = device_key.into();
        if !self.devices.contains(&device_key) {
            self.devices.push(device_key);
        }
    }

    /// Register a structural element (and its device)
    pub fn add_component(&mut self, component: ComponentDescriptor) {
        self.add_device(component.device_key.clone());
        self.components.insert(component.id.clone(), component);
    }

    /// Register a data item (and its device).
    ///
    /// A descriptor with an existing key replaces the old one in place.
    pub fn add_data_item(&mut self, item: DataItemDescriptor) {
        self.add_device(item.device_key.clone());
        match self.index.get(&item.key) {
            Some(&pos) => self.items[pos] = item,
            None => {
                self.index.insert(item.key.clone(), self.items.len());
                self.items.push(item);
            }
        }
    }

    /// Builder form of [`StaticCatalog::add_device`]
    pub fn with_device(mut self, device_key: impl Into<String>) -> Self {
        self.add_device(device_key);
        self
    }

    /// Builder form of [`StaticCatalog::add_component`]
    pub fn with_component(mut self, component: ComponentDescriptor) -> Self {
        self.add_component(component);
        self
    }

    /// Builder form of [`StaticCatalog::add_data_item`]
    pub fn with_data_item(mut self, item: DataItemDescriptor) -> Self {
        self.add_data_item(item);
        self
    }

    /// Number of data items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the catalog has no data items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl TypeCatalog for StaticCatalog {
    fn describe(&self, data_item_key: &str) -> Option<&DataItemDescriptor> {
        self.index.get(data_item_key).map(|&pos| &self.items[pos])
    }

    fn component(&self, component_id: &str) -> Option<&ComponentDescriptor> {
        self.components.get(component_id)
    }

    fn devices(&self) -> Vec<&str> {
        self.devices.iter().map(String::as_str).collect()
    }

    fn data_items(&self, device_key: &str) -> Vec<&DataItemDescriptor> {
        self.items
            .iter()
            .filter(|item| item.device_key == device_key)
            .collect()
    }
}
