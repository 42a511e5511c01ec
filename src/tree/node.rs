//! Node types: NodeKey, InstanceData.

use slotmap::new_key_type;

use crate::ids::InstanceId;

new_key_type! {
    /// Arena slot of an instance. Copy, lightweight (u64).
    pub struct NodeKey;
}

/// Data associated with a single instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceData {
    /// Stable instance id, as referenced by variables and props.
    pub id: InstanceId,
    /// Component name (e.g. "Box", "Collection").
    pub kind: String,
    /// Optional human label.
    pub label: Option<String>,
}

impl InstanceData {
    pub fn new(id: impl Into<InstanceId>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            label: None,
        }
    }

    /// Set the label (builder).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
