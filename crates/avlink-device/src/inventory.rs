//! Input and output management on [`Device`].

use avlink_binding::CommandRegistry;

use crate::device::Device;
use crate::error::{DeviceError, Result};
use crate::input::{Button, Encoder, Input, InputKind, Multiplexer};
use crate::output::{Output, OutputKind, Pwm, ShiftRegister};

/// Maximum inputs on one device.
pub const MAX_INPUTS: usize = 128;

/// Maximum inputs of one kind on one device.
pub const MAX_INPUTS_PER_KIND: usize = 32;

impl Device {
    // ----- inputs -----

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn input(&self, index: usize) -> Option<&Input> {
        self.inputs.get(index)
    }

    pub fn input_mut(&mut self, index: usize) -> Option<&mut Input> {
        self.inputs.get_mut(index)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Input> {
        self.inputs.iter()
    }

    /// Remove an input, ending any command it holds.
    pub fn delete_input(
        &mut self,
        index: usize,
        commands: &mut dyn CommandRegistry,
    ) -> Result<Input> {
        let len = self.inputs.len();
        let input = self
            .inputs
            .get_mut(index)
            .ok_or(DeviceError::IndexOutOfRange { index, len })?;
        input.release(commands);
        Ok(self.inputs.remove(index))
    }

    /// Rename an input. Names are unique per kind.
    pub fn rename_input(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let len = self.inputs.len();
        let kind = self
            .inputs
            .get(index)
            .ok_or(DeviceError::IndexOutOfRange { index, len })?
            .kind();
        if self.input_position(kind, &name).is_some_and(|other| other != index) {
            return Err(DeviceError::DuplicateName { kind, name });
        }
        self.inputs[index].set_name(name);
        Ok(())
    }

    /// Add an unnamed encoder.
    pub fn add_encoder(&mut self) -> Result<&mut Encoder> {
        let comment = self.reserve_input(InputKind::Encoder)?;
        self.inputs.push(Input::Encoder(Encoder::with_comment(comment)));
        match self.inputs.last_mut() {
            Some(Input::Encoder(encoder)) => Ok(encoder),
            _ => unreachable!("an encoder was just pushed"),
        }
    }

    /// Add an unnamed button.
    pub fn add_button(&mut self) -> Result<&mut Button> {
        let comment = self.reserve_input(InputKind::Button)?;
        self.inputs.push(Input::Button(Button::with_comment(comment)));
        match self.inputs.last_mut() {
            Some(Input::Button(button)) => Ok(button),
            _ => unreachable!("a button was just pushed"),
        }
    }

    /// Add an unnamed multiplexer.
    pub fn add_multiplexer(&mut self) -> Result<&mut Multiplexer> {
        let comment = self.reserve_input(InputKind::Multiplexer)?;
        self.inputs.push(Input::Multiplexer(Multiplexer::with_comment(comment)));
        match self.inputs.last_mut() {
            Some(Input::Multiplexer(mux)) => Ok(mux),
            _ => unreachable!("a multiplexer was just pushed"),
        }
    }

    /// Encoder called `name`, created if missing.
    pub fn encoder_named(&mut self, name: &str) -> Result<&mut Encoder> {
        let index = match self.input_position(InputKind::Encoder, name) {
            Some(index) => index,
            None => {
                self.add_encoder()?.name = name.to_string();
                self.inputs.len() - 1
            }
        };
        match &mut self.inputs[index] {
            Input::Encoder(encoder) => Ok(encoder),
            _ => unreachable!("index points at an encoder"),
        }
    }

    /// Button called `name`, created if missing.
    pub fn button_named(&mut self, name: &str) -> Result<&mut Button> {
        let index = match self.input_position(InputKind::Button, name) {
            Some(index) => index,
            None => {
                self.add_button()?.name = name.to_string();
                self.inputs.len() - 1
            }
        };
        match &mut self.inputs[index] {
            Input::Button(button) => Ok(button),
            _ => unreachable!("index points at a button"),
        }
    }

    /// Multiplexer called `name`, created if missing.
    pub fn multiplexer_named(&mut self, name: &str) -> Result<&mut Multiplexer> {
        let index = match self.input_position(InputKind::Multiplexer, name) {
            Some(index) => index,
            None => {
                self.add_multiplexer()?.name = name.to_string();
                self.inputs.len() - 1
            }
        };
        match &mut self.inputs[index] {
            Input::Multiplexer(mux) => Ok(mux),
            _ => unreachable!("index points at a multiplexer"),
        }
    }

    pub fn find_encoder(&self, name: &str) -> Option<&Encoder> {
        self.inputs.iter().find_map(|input| match input {
            Input::Encoder(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    pub fn find_encoder_mut(&mut self, name: &str) -> Option<&mut Encoder> {
        self.inputs.iter_mut().find_map(|input| match input {
            Input::Encoder(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    pub fn find_button(&self, name: &str) -> Option<&Button> {
        self.inputs.iter().find_map(|input| match input {
            Input::Button(b) if b.name == name => Some(b),
            _ => None,
        })
    }

    pub fn find_button_mut(&mut self, name: &str) -> Option<&mut Button> {
        self.inputs.iter_mut().find_map(|input| match input {
            Input::Button(b) if b.name == name => Some(b),
            _ => None,
        })
    }

    pub fn find_multiplexer(&self, name: &str) -> Option<&Multiplexer> {
        self.inputs.iter().find_map(|input| match input {
            Input::Multiplexer(m) if m.name == name => Some(m),
            _ => None,
        })
    }

    pub fn find_multiplexer_mut(&mut self, name: &str) -> Option<&mut Multiplexer> {
        self.inputs.iter_mut().find_map(|input| match input {
            Input::Multiplexer(m) if m.name == name => Some(m),
            _ => None,
        })
    }

    fn input_position(&self, kind: InputKind, name: &str) -> Option<usize> {
        self.inputs
            .iter()
            .position(|input| input.kind() == kind && input.name() == name)
    }

    /// Check limits for one more input of `kind` and return its default
    /// comment.
    fn reserve_input(&self, kind: InputKind) -> Result<String> {
        if self.inputs.len() >= MAX_INPUTS {
            return Err(DeviceError::TooManyInputs {
                kind: "inputs",
                limit: MAX_INPUTS,
            });
        }
        let of_kind = self.inputs.iter().filter(|i| i.kind() == kind).count();
        if of_kind >= MAX_INPUTS_PER_KIND {
            return Err(DeviceError::TooManyInputs {
                kind: kind.plural(),
                limit: MAX_INPUTS_PER_KIND,
            });
        }
        Ok(format!("{} #{}", kind.label(), of_kind + 1))
    }

    // ----- outputs -----

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn output(&self, index: usize) -> Option<&Output> {
        self.outputs.get(index)
    }

    pub fn output_mut(&mut self, index: usize) -> Option<&mut Output> {
        self.outputs.get_mut(index)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Output> {
        self.outputs.iter()
    }

    pub fn delete_output(&mut self, index: usize) -> Result<Output> {
        let len = self.outputs.len();
        if index >= len {
            return Err(DeviceError::IndexOutOfRange { index, len });
        }
        Ok(self.outputs.remove(index))
    }

    /// Give an output another id. Ids are unique per kind.
    pub fn set_output_id(&mut self, index: usize, id: i16) -> Result<()> {
        let len = self.outputs.len();
        let kind = self
            .outputs
            .get(index)
            .ok_or(DeviceError::IndexOutOfRange { index, len })?
            .kind();
        if self.output_position(kind, id).is_some_and(|other| other != index) {
            return Err(DeviceError::DuplicateOutputId { kind, id });
        }
        self.outputs[index].set_id(id);
        Ok(())
    }

    /// Add a PWM output on the lowest unused pin.
    pub fn add_pwm(&mut self) -> &mut Pwm {
        let mut pwm = Pwm::new(self.unused_output_id(OutputKind::Pwm));
        pwm.comment = format!("PWM #{}", self.count_outputs(OutputKind::Pwm) + 1);
        self.outputs.push(Output::Pwm(pwm));
        match self.outputs.last_mut() {
            Some(Output::Pwm(pwm)) => pwm,
            _ => unreachable!("a pwm was just pushed"),
        }
    }

    /// Add a shift register on the lowest unused module.
    pub fn add_shift_register(&mut self) -> &mut ShiftRegister {
        let kind = OutputKind::ShiftRegister;
        let mut sreg = ShiftRegister::new(self.unused_output_id(kind));
        sreg.comment = format!("Shift register #{}", self.count_outputs(kind) + 1);
        self.outputs.push(Output::ShiftRegister(sreg));
        match self.outputs.last_mut() {
            Some(Output::ShiftRegister(sreg)) => sreg,
            _ => unreachable!("a shift register was just pushed"),
        }
    }

    /// PWM output with `id`, created if missing.
    pub fn pwm_with_id(&mut self, id: i16) -> &mut Pwm {
        let index = match self.output_position(OutputKind::Pwm, id) {
            Some(index) => index,
            None => {
                self.add_pwm().id = id;
                self.outputs.len() - 1
            }
        };
        match &mut self.outputs[index] {
            Output::Pwm(pwm) => pwm,
            Output::ShiftRegister(_) => unreachable!("index points at a pwm"),
        }
    }

    /// Shift register with `id`, created if missing.
    pub fn shift_register_with_id(&mut self, id: i16) -> &mut ShiftRegister {
        let index = match self.output_position(OutputKind::ShiftRegister, id) {
            Some(index) => index,
            None => {
                self.add_shift_register().id = id;
                self.outputs.len() - 1
            }
        };
        match &mut self.outputs[index] {
            Output::ShiftRegister(sreg) => sreg,
            Output::Pwm(_) => unreachable!("index points at a shift register"),
        }
    }

    pub fn find_pwm(&self, id: i16) -> Option<&Pwm> {
        self.outputs.iter().find_map(|output| match output {
            Output::Pwm(p) if p.id == id => Some(p),
            _ => None,
        })
    }

    pub fn find_shift_register(&self, id: i16) -> Option<&ShiftRegister> {
        self.outputs.iter().find_map(|output| match output {
            Output::ShiftRegister(s) if s.id == id => Some(s),
            _ => None,
        })
    }

    fn output_position(&self, kind: OutputKind, id: i16) -> Option<usize> {
        self.outputs
            .iter()
            .position(|output| output.kind() == kind && output.id() == id)
    }

    fn unused_output_id(&self, kind: OutputKind) -> i16 {
        (0..=i16::MAX)
            .find(|&id| self.output_position(kind, id).is_none())
            .unwrap_or(i16::MAX)
    }

    fn count_outputs(&self, kind: OutputKind) -> usize {
        self.outputs.iter().filter(|o| o.kind() == kind).count()
    }
}
