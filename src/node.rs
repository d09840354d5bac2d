use std::fmt::Debug;

use crate::{
    context::AudioContext,
    msg::NodeMessage,
    ports::{Frame, Ports},
};

/// One entry per input port, `None` when nothing upstream is connected.
pub type Inputs<'a> = [Option<&'a Frame>];

/// One frame per output port.
pub type Outputs = [Frame];

/// The node trait that any processing node must implement.
///
/// `generate` is called once per frame, after every upstream node has
/// written its outputs for that frame. It must not block, allocate or do I/O.
///
/// Nodes are expected to size their own outputs from [`Ports::sync_outputs`],
/// so linked channel counts are re-derived every frame.
pub trait Node {
    fn generate(&mut self, ctx: &mut AudioContext, inputs: &Inputs, outputs: &mut Outputs);
    fn ports(&self) -> &Ports;
    /// Messages arrive from the control side, between frames.
    fn handle_msg(&mut self, _msg: NodeMessage) {}
}

pub trait DynNode: Node + Send {}
impl<T> DynNode for T where T: Node + Send {}

/// A small wrapper type for debugging nodes at runtime.
pub struct NodeWithMeta {
    name: String,
    node_kind: String,
    node: Box<dyn DynNode>,
}

impl NodeWithMeta {
    pub fn new(name: String, node_kind: String, node: Box<dyn DynNode>) -> Self {
        Self {
            name,
            node_kind,
            node,
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn node_kind(&self) -> &str {
        &self.node_kind
    }
    pub fn get_node(&self) -> &dyn DynNode {
        self.node.as_ref()
    }
    pub fn get_node_mut(&mut self) -> &mut dyn DynNode {
        self.node.as_mut()
    }
}

impl Debug for NodeWithMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(&self.name)
            .field("node_kind", &self.node_kind)
            .field("ports", self.node.ports())
            .finish()
    }
}
