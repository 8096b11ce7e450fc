//! DSP node registry and processing order
//!
//! Nodes are created once and kept registered for the lifetime of the engine;
//! attach and detach only edit the processing order. All edits happen on the
//! audio thread between buffers, so the render loop never observes a
//! half-applied change.

use log::warn;

use crate::types::StereoBuffer;

use super::nodes::{DspNode, NodeId};

/// Outcome of a graph edit, reported back to the control thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    Rejected,
}

struct NodeEntry {
    id: NodeId,
    node: Box<dyn DspNode>,
}

pub struct NodeGraph {
    registry: Vec<NodeEntry>,
    /// Indices into `registry`, in processing order
    order: Vec<usize>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self {
            registry: Vec::new(),
            order: Vec::new(),
        }
    }

    fn registry_index(&self, id: NodeId) -> Option<usize> {
        self.registry.iter().position(|e| e.id == id)
    }

    /// Register a node. Replaces any existing node under the same id, which
    /// only happens if the control side reuses an id without detaching.
    pub fn create(&mut self, id: NodeId, node: Box<dyn DspNode>) {
        if let Some(idx) = self.registry_index(id) {
            warn!("node id {:?} re-created, replacing", id);
            self.order.retain(|&i| i != idx);
            self.registry[idx] = NodeEntry { id, node };
            return;
        }
        self.registry.push(NodeEntry { id, node });
    }

    /// Insert a registered node into the processing order at `position`
    /// (clamped to the tail). Rejected when the node is unknown or already
    /// attached.
    pub fn attach(&mut self, id: NodeId, position: usize) -> EditOutcome {
        let Some(idx) = self.registry_index(id) else {
            return EditOutcome::Rejected;
        };
        if self.order.contains(&idx) {
            return EditOutcome::Rejected;
        }
        let position = position.min(self.order.len());
        self.order.insert(position, idx);
        self.registry[idx].node.reset();
        EditOutcome::Applied
    }

    /// Remove a node from the processing order. Rejected when the node is
    /// unknown or not attached.
    pub fn detach(&mut self, id: NodeId) -> EditOutcome {
        let Some(idx) = self.registry_index(id) else {
            return EditOutcome::Rejected;
        };
        let before = self.order.len();
        self.order.retain(|&i| i != idx);
        if self.order.len() == before {
            return EditOutcome::Rejected;
        }
        EditOutcome::Applied
    }

    /// Set a parameter on a registered node, attached or not
    pub fn set_param(&mut self, id: NodeId, index: usize, value: f32) -> EditOutcome {
        match self.registry_index(id) {
            Some(idx) => {
                self.registry[idx].node.set_param(index, value);
                EditOutcome::Applied
            }
            None => EditOutcome::Rejected,
        }
    }

    pub fn attached_count(&self) -> usize {
        self.order.len()
    }

    /// Run the buffer through every attached node in order
    pub fn process(&mut self, buffer: &mut StereoBuffer) {
        let Self { registry, order } = self;
        for &idx in order.iter() {
            registry[idx].node.process(buffer);
        }
    }
}

impl Default for NodeGraph {
    fn default() -> Self {
        Self::new()
    }
}
