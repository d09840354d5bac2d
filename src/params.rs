//! Link-or-default parameters.
//!
//! Every parameter of a node has a stored value, and may also be linked to one
//! of the node's input ports. When that port is connected, the first channel of
//! its current frame wins; otherwise the stored value is used. Resolution runs
//! fresh on every frame, so a cable can be patched in or out between any two
//! frames without the node noticing anything but the value.

use crate::msg::NodeMessage;
use crate::node::Inputs;

#[cfg(feature = "serde")]
use serde::Serialize;

#[derive(Clone, Debug, PartialEq)]
pub enum ParamError {
    ParamNotFound,
}

/// Index of a parameter on its node. Nodes hand these out as constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParamKey(usize);

impl ParamKey {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Binding {
    Fixed,
    Linked(usize),
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Param {
    name: &'static str,
    binding: Binding,
    value: f32,
}

impl Param {
    pub fn fixed(name: &'static str, value: f32) -> Self {
        Self {
            name,
            binding: Binding::Fixed,
            value,
        }
    }
    /// A parameter that follows input `input` whenever it is connected.
    pub fn linked(name: &'static str, input: usize, default: f32) -> Self {
        Self {
            name,
            binding: Binding::Linked(input),
            value: default,
        }
    }
    pub fn name(&self) -> &'static str {
        self.name
    }
    pub fn binding(&self) -> Binding {
        self.binding
    }
    /// The stored value, used whenever no live signal overrides it.
    pub fn value(&self) -> f32 {
        self.value
    }

    #[inline(always)]
    fn resolve(&self, inputs: &Inputs) -> f32 {
        match self.binding {
            Binding::Linked(input) => match inputs.get(input).copied().flatten() {
                Some(frame) => frame.first().copied().unwrap_or(0.0),
                None => self.value,
            },
            Binding::Fixed => self.value,
        }
    }
}

/// The parameter bindings of a single node.
///
/// Boxed, as the set of parameters is decided when the node is built.
#[derive(Clone, Debug, PartialEq)]
pub struct Params {
    params: Box<[Param]>,
}

impl Params {
    pub fn new(params: Vec<Param>) -> Self {
        Self {
            params: params.into_boxed_slice(),
        }
    }

    /// The value of a parameter for the current frame.
    ///
    /// Never fails; an unknown key resolves to `0.0`.
    #[inline(always)]
    pub fn resolve(&self, key: ParamKey, inputs: &Inputs) -> f32 {
        self.params
            .get(key.0)
            .map_or(0.0, |param| param.resolve(inputs))
    }

    pub fn key(&self, name: &str) -> Result<ParamKey, ParamError> {
        self.params
            .iter()
            .position(|x| x.name == name)
            .map(ParamKey)
            .ok_or(ParamError::ParamNotFound)
    }

    pub fn get(&self, key: ParamKey) -> Result<f32, ParamError> {
        self.params
            .get(key.0)
            .map(|x| x.value)
            .ok_or(ParamError::ParamNotFound)
    }

    /// Overwrite the stored value. A connected linked input still wins.
    pub fn set(&mut self, key: ParamKey, val: f32) -> Result<(), ParamError> {
        match self.params.get_mut(key.0) {
            Some(param) => {
                param.value = val;
                Ok(())
            }
            None => Err(ParamError::ParamNotFound),
        }
    }

    pub fn set_by_name(&mut self, name: &str, val: f32) -> Result<(), ParamError> {
        let key = self.key(name)?;
        self.set(key, val)
    }

    pub fn apply_msg(&mut self, msg: &NodeMessage) -> Result<(), ParamError> {
        match msg {
            NodeMessage::SetParam(payload) => {
                self.set_by_name(payload.param_name, payload.value.as_f32())
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
