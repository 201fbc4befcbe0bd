use std::fmt;

use avlink_binding::{Comparison, DataBinding, DataRegistry, Modifier};
use avlink_frame::commands::{SET_PIN, SET_SHIFT_REGISTER_PINS};
use avlink_frame::{Session, MAX_PINS, PIN_LIST_SEPARATOR, PWM_MAX_DUTY};
use tracing::debug;

use crate::error::{DeviceError, Result};

/// Output entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Pwm,
    ShiftRegister,
}

impl OutputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pwm => "pwm",
            Self::ShiftRegister => "shift-register",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PWM output driven by one host value.
#[derive(Debug, Clone)]
pub struct Pwm {
    pub(crate) id: i16,
    pub comment: String,
    pub data: DataBinding,
    pub modifier: Modifier,
    pub operand: f32,
    last_sent: Option<u8>,
}

impl Pwm {
    pub fn new(id: i16) -> Self {
        Self {
            id,
            comment: String::new(),
            data: DataBinding::default(),
            modifier: Modifier::Mul,
            operand: 1.0,
            last_sent: None,
        }
    }

    pub fn id(&self) -> i16 {
        self.id
    }

    /// Move to another pin. The next update sends the current duty.
    pub(crate) fn set_id(&mut self, id: i16) {
        self.id = id;
        self.last_sent = None;
    }

    /// Duty last queued for the device; `None` if nothing was sent yet.
    pub fn last_sent(&self) -> Option<u8> {
        self.last_sent
    }

    /// Duty for the current host value, or `None` when the binding is
    /// unresolved or the value is NaN.
    ///
    /// The value goes through the modifier, is clamped to `[0, 1]` and
    /// scaled to `0..=254`, truncating.
    pub fn duty(&mut self, data: &dyn DataRegistry) -> Option<u8> {
        let value = self.data.read(data)?.as_f32();
        let value = self.modifier.apply(value, self.operand);
        if value.is_nan() {
            return None;
        }
        Some((value.clamp(0.0, 1.0) * f32::from(PWM_MAX_DUTY)) as u8)
    }

    /// Queue a `SetPin` frame if the duty changed. Returns whether a frame
    /// was queued.
    pub fn update(&mut self, data: &dyn DataRegistry, session: &mut Session) -> bool {
        let Some(duty) = self.duty(data) else {
            return false;
        };
        if self.last_sent == Some(duty) {
            return false;
        }
        debug!(id = self.id, duty, "pwm changed");
        self.last_sent = Some(duty);
        session.begin(SET_PIN);
        session.arg_int(self.id);
        session.arg_int(i16::from(duty));
        session.commit();
        true
    }

    /// Queue a frame switching the output off.
    pub fn reset(&mut self, session: &mut Session) {
        self.last_sent = Some(0);
        session.begin(SET_PIN);
        session.arg_int(self.id);
        session.arg_int(0);
        session.commit();
    }
}

/// One shift-register output pin.
#[derive(Debug, Clone, Default)]
pub struct ShiftPin {
    pub data: DataBinding,
    pub comparison: Comparison,
    pub threshold: f32,
    last_sent: Option<bool>,
}

impl ShiftPin {
    pub fn new(path: impl Into<String>, comparison: Comparison, threshold: f32) -> Self {
        Self {
            data: DataBinding::new(path),
            comparison,
            threshold,
            last_sent: None,
        }
    }

    /// State last queued for the device; `None` if nothing was sent yet.
    pub fn last_sent(&self) -> Option<bool> {
        self.last_sent
    }

    /// New state if it differs from the last one sent.
    fn poll(&mut self, data: &dyn DataRegistry) -> Option<bool> {
        let value = self.data.read(data)?;
        let state = self.comparison.evaluate(value, self.threshold)?;
        if self.last_sent == Some(state) {
            return None;
        }
        self.last_sent = Some(state);
        Some(state)
    }
}

/// Shift register with up to [`MAX_PINS`] independently bound pins.
#[derive(Debug, Clone)]
pub struct ShiftRegister {
    pub(crate) id: i16,
    pub comment: String,
    pins: Vec<ShiftPin>,
}

impl ShiftRegister {
    pub fn new(id: i16) -> Self {
        Self {
            id,
            comment: String::new(),
            pins: Vec::new(),
        }
    }

    pub fn id(&self) -> i16 {
        self.id
    }

    /// Move to another module. The next update sends every pin state.
    pub(crate) fn set_id(&mut self, id: i16) {
        self.id = id;
        for pin in &mut self.pins {
            pin.last_sent = None;
        }
    }

    /// Number of configured pins (highest configured index + 1).
    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    pub fn pin(&self, pin: usize) -> Option<&ShiftPin> {
        self.pins.get(pin)
    }

    pub fn pin_mut(&mut self, pin: usize) -> Option<&mut ShiftPin> {
        self.pins.get_mut(pin)
    }

    pub fn pins(&self) -> impl Iterator<Item = (usize, &ShiftPin)> {
        self.pins.iter().enumerate()
    }

    /// Configure `pin`, growing the pin list as needed.
    pub fn set_pin(&mut self, pin: usize, config: ShiftPin) -> Result<&mut ShiftPin> {
        if pin >= MAX_PINS {
            return Err(DeviceError::PinOutOfRange { pin, max: MAX_PINS });
        }
        if pin >= self.pins.len() {
            self.pins.resize_with(pin + 1, ShiftPin::default);
        }
        self.pins[pin] = config;
        Ok(&mut self.pins[pin])
    }

    /// Queue at most one "on" and one "off" frame for the pins whose state
    /// changed. Returns the number of frames queued.
    pub fn update(&mut self, data: &dyn DataRegistry, session: &mut Session) -> usize {
        let mut on = Vec::new();
        let mut off = Vec::new();
        for (index, pin) in self.pins.iter_mut().enumerate() {
            match pin.poll(data) {
                Some(true) => on.push(index),
                Some(false) => off.push(index),
                None => {}
            }
        }

        let mut frames = 0;
        for (pins, state) in [(on, 1), (off, 0)] {
            if pins.is_empty() {
                continue;
            }
            debug!(id = self.id, ?pins, state, "shift register changed");
            self.queue(session, &pins, state);
            frames += 1;
        }
        frames
    }

    /// Queue a frame switching every physical pin off.
    pub fn reset(&mut self, session: &mut Session) {
        for pin in &mut self.pins {
            pin.last_sent = Some(false);
        }
        let all: Vec<usize> = (0..MAX_PINS).collect();
        self.queue(session, &all, 0);
    }

    fn queue(&self, session: &mut Session, pins: &[usize], state: i16) {
        let mut list = String::with_capacity(pins.len() * 3);
        for (i, pin) in pins.iter().enumerate() {
            if i > 0 {
                list.push(PIN_LIST_SEPARATOR);
            }
            list.push_str(&pin.to_string());
        }
        session.begin(SET_SHIFT_REGISTER_PINS);
        session.arg_int(self.id);
        session.arg_str(&list);
        session.arg_int(state);
        session.commit();
    }
}

/// An output entity.
#[derive(Debug, Clone)]
pub enum Output {
    Pwm(Pwm),
    ShiftRegister(ShiftRegister),
}

impl Output {
    pub fn kind(&self) -> OutputKind {
        match self {
            Self::Pwm(_) => OutputKind::Pwm,
            Self::ShiftRegister(_) => OutputKind::ShiftRegister,
        }
    }

    pub fn id(&self) -> i16 {
        match self {
            Self::Pwm(p) => p.id,
            Self::ShiftRegister(s) => s.id,
        }
    }

    pub(crate) fn set_id(&mut self, id: i16) {
        match self {
            Self::Pwm(p) => p.set_id(id),
            Self::ShiftRegister(s) => s.set_id(id),
        }
    }

    pub fn comment(&self) -> &str {
        match self {
            Self::Pwm(p) => &p.comment,
            Self::ShiftRegister(s) => &s.comment,
        }
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        let comment = comment.into();
        match self {
            Self::Pwm(p) => p.comment = comment,
            Self::ShiftRegister(s) => s.comment = comment,
        }
    }

    /// Queue frames for changed host values. Returns the frames queued.
    pub fn update(&mut self, data: &dyn DataRegistry, session: &mut Session) -> usize {
        match self {
            Self::Pwm(p) => usize::from(p.update(data, session)),
            Self::ShiftRegister(s) => s.update(data, session),
        }
    }

    /// Queue frames switching the output off.
    pub fn reset(&mut self, session: &mut Session) {
        match self {
            Self::Pwm(p) => p.reset(session),
            Self::ShiftRegister(s) => s.reset(session),
        }
    }

    pub fn as_pwm(&self) -> Option<&Pwm> {
        match self {
            Self::Pwm(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_shift_register(&self) -> Option<&ShiftRegister> {
        match self {
            Self::ShiftRegister(s) => Some(s),
            _ => None,
        }
    }
}
