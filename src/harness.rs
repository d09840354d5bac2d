use std::fmt::Debug;

use slotmap::{SecondaryMap, SlotMap, new_key_type};

use crate::{
    MAX_INPUTS,
    config::{Config, ConfigError},
    context::AudioContext,
    msg::LegatoMsg,
    node::{DynNode, NodeWithMeta},
    ports::{ChannelPolicy, Frame},
};

new_key_type! {
    /// A slotmap key corresponding to a particular node.
    pub struct NodeKey;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct ConnectionEntry {
    pub node_key: NodeKey,
    pub port_index: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Connection {
    pub source: ConnectionEntry,
    pub sink: ConnectionEntry,
}

#[derive(Clone, Debug, PartialEq)]
pub enum HarnessError {
    InvalidConfig(ConfigError),
    NodeDoesNotExist,
    PortOutOfRange,
    InputAlreadyConnected,
    /// Sources must be added before the nodes they feed.
    OrderViolation,
    TooManyInputs,
    TooManyChannels,
}

/// What feeds an input port.
#[derive(Clone, Debug)]
enum Source {
    Node(ConnectionEntry),
    External(Frame),
}

/// A minimal single-threaded scheduler.
///
/// Nodes run in the order they were added, and a connection may only feed a
/// node added after its source, so every node sees its inputs for the current
/// frame. Inputs can also be fed from outside with [`FrameHarness::set_input`].
///
/// Frames are preallocated when a node is added, `next_frame` does not
/// allocate.
pub struct FrameHarness {
    context: AudioContext,
    nodes: SlotMap<NodeKey, NodeWithMeta>,
    order: Vec<NodeKey>,
    // Where the nodes write their output to
    port_sources: SecondaryMap<NodeKey, Vec<Frame>>,
    // One entry per input port
    incoming: SecondaryMap<NodeKey, Vec<Option<Source>>>,
    sink_key: Option<NodeKey>,
}

impl FrameHarness {
    pub fn new(config: Config) -> Result<Self, HarnessError> {
        config.validate().map_err(HarnessError::InvalidConfig)?;
        let capacity = config.initial_graph_capacity;

        Ok(Self {
            context: AudioContext::new(config),
            nodes: SlotMap::with_capacity_and_key(capacity),
            order: Vec::with_capacity(capacity),
            port_sources: SecondaryMap::with_capacity(capacity),
            incoming: SecondaryMap::with_capacity(capacity),
            sink_key: None,
        })
    }

    pub fn add_node(
        &mut self,
        node: Box<dyn DynNode>,
        name: String,
        node_kind: String,
    ) -> Result<NodeKey, HarnessError> {
        let ports = node.ports();
        let input_count = ports.inputs.len();
        let output_count = ports.outputs.len();

        if input_count > MAX_INPUTS {
            return Err(HarnessError::TooManyInputs);
        }

        let max_channels = self.context.get_config().max_channels;
        let too_wide = (0..output_count).any(|i| {
            matches!(ports.channel_policy(i), Some(ChannelPolicy::Fixed(n)) if n > max_channels)
        });
        if too_wide {
            return Err(HarnessError::TooManyChannels);
        }

        tracing::debug!(%name, %node_kind, input_count, output_count, "adding node");

        // Sized as if nothing were connected, until the first frame runs
        let initial: Vec<Frame> = (0..output_count)
            .map(|i| {
                let mut frame = Frame::new();
                let _ = frame.resize(ports.output_channels(i, &[]), 0.0);
                frame
            })
            .collect();

        let node_key = self.nodes.insert(NodeWithMeta::new(name, node_kind, node));
        self.order.push(node_key);
        self.port_sources.insert(node_key, initial);
        self.incoming.insert(node_key, vec![None; input_count]);

        Ok(node_key)
    }

    pub fn connect(&mut self, connection: Connection) -> Result<Connection, HarnessError> {
        let Connection { source, sink } = connection;

        let source_pos = self.position(source.node_key)?;
        let sink_pos = self.position(sink.node_key)?;
        if source_pos >= sink_pos {
            return Err(HarnessError::OrderViolation);
        }

        let source_outputs = self
            .port_sources
            .get(source.node_key)
            .ok_or(HarnessError::NodeDoesNotExist)?
            .len();
        if source.port_index >= source_outputs {
            return Err(HarnessError::PortOutOfRange);
        }

        let slot = self.input_slot(sink)?;
        if matches!(*slot, Some(Source::Node(_))) {
            return Err(HarnessError::InputAlreadyConnected);
        }
        *slot = Some(Source::Node(source));

        tracing::debug!(?connection, "connected");
        Ok(connection)
    }

    /// Unplug whatever feeds an input, it goes back to being unconnected.
    pub fn disconnect(&mut self, sink: ConnectionEntry) -> Result<(), HarnessError> {
        *self.input_slot(sink)? = None;
        Ok(())
    }

    /// Feed an input from outside the graph, until it is changed or
    /// disconnected.
    pub fn set_input(&mut self, sink: ConnectionEntry, samples: &[f32]) -> Result<(), HarnessError> {
        let max_channels = self.context.get_config().max_channels;
        if samples.len() > max_channels {
            return Err(HarnessError::TooManyChannels);
        }
        let frame = Frame::from_slice(samples).map_err(|_| HarnessError::TooManyChannels)?;
        let slot = self.input_slot(sink)?;
        if matches!(*slot, Some(Source::Node(_))) {
            return Err(HarnessError::InputAlreadyConnected);
        }
        *slot = Some(Source::External(frame));
        Ok(())
    }

    pub fn set_sink_key(&mut self, key: NodeKey) -> Result<(), HarnessError> {
        match self.nodes.contains_key(key) {
            true => {
                self.sink_key = Some(key);
                Ok(())
            }
            false => Err(HarnessError::NodeDoesNotExist),
        }
    }

    /// Forward a message from the control side to its node.
    pub fn handle_msg(&mut self, msg: LegatoMsg) {
        match msg {
            LegatoMsg::NodeMessage(key, node_msg) => match self.nodes.get_mut(key) {
                Some(node) => node.get_node_mut().handle_msg(node_msg),
                None => tracing::warn!(?key, "message for missing node"),
            },
        }
    }

    /// The channel count an output carries given the inputs it currently sees.
    pub fn output_channels(&self, key: NodeKey, port_index: usize) -> Option<usize> {
        let node = self.nodes.get(key)?;
        let mut inputs: [Option<&Frame>; MAX_INPUTS] = [None; MAX_INPUTS];
        gather_inputs(self.incoming.get(key), &self.port_sources, &mut inputs);

        let ports = node.get_node().ports();
        if port_index >= ports.outputs.len() {
            return None;
        }
        let input_count = ports.inputs.len().min(MAX_INPUTS);
        Some(ports.output_channels(port_index, &inputs[..input_count]))
    }

    pub fn outputs(&self, key: NodeKey) -> Option<&[Frame]> {
        self.port_sources.get(key).map(Vec::as_slice)
    }

    pub fn sink_key(&self) -> Option<NodeKey> {
        self.sink_key
    }

    pub fn get_node(&self, key: NodeKey) -> Option<&NodeWithMeta> {
        self.nodes.get(key)
    }

    pub fn get_context(&self) -> &AudioContext {
        &self.context
    }

    pub fn get_config(&self) -> Config {
        self.context.get_config()
    }

    /// Run every node once and return the frames of the sink node.
    pub fn next_frame(&mut self) -> &[Frame] {
        for &node_key in self.order.iter() {
            let Some(meta) = self.nodes.get_mut(node_key) else {
                continue;
            };
            let node = meta.get_node_mut();
            let input_count = node.ports().inputs.len().min(MAX_INPUTS);

            // Taken out so upstream frames can be borrowed at the same time.
            // An empty Vec does not allocate.
            let mut outputs = match self.port_sources.get_mut(node_key) {
                Some(outputs) => std::mem::take(outputs),
                None => continue,
            };

            {
                let mut inputs: [Option<&Frame>; MAX_INPUTS] = [None; MAX_INPUTS];
                gather_inputs(self.incoming.get(node_key), &self.port_sources, &mut inputs);
                node.generate(&mut self.context, &inputs[..input_count], &mut outputs);
            }

            if let Some(slot) = self.port_sources.get_mut(node_key) {
                *slot = outputs;
            }
        }

        self.context.advance_frame();

        self.sink_key
            .and_then(|key| self.port_sources.get(key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn position(&self, key: NodeKey) -> Result<usize, HarnessError> {
        self.order
            .iter()
            .position(|x| *x == key)
            .ok_or(HarnessError::NodeDoesNotExist)
    }

    fn input_slot(&mut self, sink: ConnectionEntry) -> Result<&mut Option<Source>, HarnessError> {
        self.incoming
            .get_mut(sink.node_key)
            .ok_or(HarnessError::NodeDoesNotExist)?
            .get_mut(sink.port_index)
            .ok_or(HarnessError::PortOutOfRange)
    }
}

fn gather_inputs<'a>(
    wires: Option<&'a Vec<Option<Source>>>,
    port_sources: &'a SecondaryMap<NodeKey, Vec<Frame>>,
    inputs: &mut [Option<&'a Frame>; MAX_INPUTS],
) {
    for (slot, wire) in inputs.iter_mut().zip(wires.into_iter().flatten()) {
        *slot = match wire {
            Some(Source::Node(entry)) => port_sources
                .get(entry.node_key)
                .and_then(|outputs| outputs.get(entry.port_index)),
            Some(Source::External(frame)) => Some(frame),
            None => None,
        };
    }
}

impl Debug for FrameHarness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entry(&"config", &self.context.get_config())
            .entry(&"frame", &self.context.frame())
            .key(&"nodes")
            .value(&self.nodes)
            .entry(&"sink_key", &self.sink_key)
            .finish()
    }
}

/// A harness holding one node, which is also the sink.
pub fn get_node_test_harness(node: Box<dyn DynNode>) -> Result<FrameHarness, HarnessError> {
    let mut harness = FrameHarness::new(Config::default())?;
    let key = harness.add_node(node, "test node".into(), "test".into())?;
    harness.set_sink_key(key)?;
    Ok(harness)
}
