use crate::{
    context::AudioContext,
    msg::NodeMessage,
    node::{Inputs, Node, Outputs},
    params::{Param, ParamKey, Params},
    ports::{PortBuilder, Ports},
};

pub const MUL: ParamKey = ParamKey::new(0);
pub const ADD: ParamKey = ParamKey::new(1);

/// Scales then offsets every channel of its input: `out = in * mul + add`.
///
/// `mul` and `add` follow inputs 1 and 2 when they are connected. The output
/// carries as many channels as input 0 does on the current frame.
#[derive(Clone, Debug)]
pub struct MulAdd {
    params: Params,
    ports: Ports,
}

impl MulAdd {
    pub fn new(mul: f32, add: f32) -> Self {
        Self {
            params: Params::new(vec![Param::linked("mul", 1, mul), Param::linked("add", 2, add)]),
            ports: PortBuilder::default()
                .audio_in(1)
                .audio_in_named(&["mul", "add"])
                .audio_out(1)
                .link_channels(0, 0)
                .build(),
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }
}

impl Default for MulAdd {
    fn default() -> Self {
        Self::new(1.0, 0.0)
    }
}

impl Node for MulAdd {
    fn generate(&mut self, _: &mut AudioContext, inputs: &Inputs, outputs: &mut Outputs) {
        self.ports.sync_outputs(inputs, outputs);
        let Some(out) = outputs.first_mut() else {
            return;
        };

        let mul = self.params.resolve(MUL, inputs);
        let add = self.params.resolve(ADD, inputs);

        match inputs.first().copied().flatten() {
            Some(input) => {
                for (o, x) in out.iter_mut().zip(input.iter()) {
                    *o = x * mul + add;
                }
            }
            // Unconnected input is one silent channel
            None => out.fill(add),
        }
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn handle_msg(&mut self, msg: NodeMessage) {
        if let Err(err) = self.params.apply_msg(&msg) {
            tracing::warn!(?err, ?msg, "mul add ignored message");
        }
    }
}
