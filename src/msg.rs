use crate::harness::NodeKey;

/// A subset of values that are realtime safe to hand to a node.
#[derive(Clone, Debug, PartialEq)]
pub enum RtValue {
    F32(f32),
    I32(i32),
    U32(u32),
    Bool(bool),
}

impl RtValue {
    /// Every parameter is stored as an `f32`, booleans become `1.0` or `0.0`.
    pub fn as_f32(&self) -> f32 {
        match *self {
            RtValue::F32(x) => x,
            RtValue::I32(x) => x as f32,
            RtValue::U32(x) => x as f32,
            RtValue::Bool(x) => {
                if x {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParamPayload {
    pub param_name: &'static str,
    pub value: RtValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LegatoMsg {
    NodeMessage(NodeKey, NodeMessage),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeMessage {
    SetParam(ParamPayload),
}

impl NodeMessage {
    pub fn set_param(param_name: &'static str, value: RtValue) -> Self {
        NodeMessage::SetParam(ParamPayload { param_name, value })
    }
}
