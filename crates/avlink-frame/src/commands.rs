//! Protocol command ids.
//!
//! Ids are fixed by the peripheral firmware. Only the first
//! [`COMMAND_TABLE_SIZE`] ids can be dispatched to handlers; anything else
//! (including [`DEBUG`]) is skipped by receivers.

pub const INIT_MODULE: i16 = 0;
pub const SET_MODULE: i16 = 1;
/// Host -> device: set an output pin duty (`pin, duty`).
pub const SET_PIN: i16 = 2;
pub const SET_STEPPER: i16 = 3;
pub const SET_SERVO: i16 = 4;
pub const STATUS: i16 = 5;
/// Device -> host: encoder turned (`name, event`).
pub const ENCODER_CHANGE: i16 = 6;
/// Device -> host: button pressed/released (`name, state`).
pub const BUTTON_CHANGE: i16 = 7;
pub const STEPPER_CHANGE: i16 = 8;
/// Host -> device: request identity.
pub const GET_INFO: i16 = 9;
/// Device -> host: identity (`type, name, serial, version`).
pub const INFO: i16 = 10;
pub const SET_CONFIG: i16 = 11;
pub const GET_CONFIG: i16 = 12;
pub const RESET_CONFIG: i16 = 13;
pub const SAVE_CONFIG: i16 = 14;
pub const CONFIG_SAVED: i16 = 15;
pub const ACTIVATE_CONFIG: i16 = 16;
pub const CONFIG_ACTIVATED: i16 = 17;
pub const SET_POWER_SAVING_MODE: i16 = 18;
pub const SET_NAME: i16 = 19;
pub const GEN_NEW_SERIAL: i16 = 20;
pub const RESET_STEPPER: i16 = 21;
pub const SET_ZERO_STEPPER: i16 = 22;
pub const TRIGGER: i16 = 23;
pub const RESET_BOARD: i16 = 24;
pub const SET_LCD_DISPLAY_I2C: i16 = 25;
pub const SET_MODULE_BRIGHTNESS: i16 = 26;
/// Host -> device: switch shift-register outputs (`module, pins, state`).
pub const SET_SHIFT_REGISTER_PINS: i16 = 27;
pub const ANALOG_CHANGE: i16 = 28;
pub const INPUT_SHIFTER_CHANGE: i16 = 29;
/// Device -> host: multiplexed input changed (`name, pin, state`).
pub const DIG_IN_MUX_CHANGE: i16 = 30;
pub const SET_STEPPER_SPEED_ACCEL: i16 = 31;
pub const SET_CUSTOM_DEVICE: i16 = 32;
pub const SET_MODULE_SINGLE_SEGMENT: i16 = 33;
pub const DEBUG: i16 = 0xFF;

/// Number of dispatchable ids (`0..COMMAND_TABLE_SIZE`).
pub const COMMAND_TABLE_SIZE: usize = 34;

/// Maximum inputs on one multiplexer and outputs on one shift register.
pub const MAX_PINS: usize = 16;

/// Joins pin indices in a shift-register frame (`0|1|2`).
pub const PIN_LIST_SEPARATOR: char = '|';

/// Full-scale PWM duty.
pub const PWM_MAX_DUTY: u8 = 254;

/// Returns a human-readable name for a command id.
pub fn command_name(id: i16) -> &'static str {
    match id {
        INIT_MODULE => "InitModule",
        SET_MODULE => "SetModule",
        SET_PIN => "SetPin",
        SET_STEPPER => "SetStepper",
        SET_SERVO => "SetServo",
        STATUS => "Status",
        ENCODER_CHANGE => "EncoderChange",
        BUTTON_CHANGE => "ButtonChange",
        STEPPER_CHANGE => "StepperChange",
        GET_INFO => "GetInfo",
        INFO => "Info",
        SET_CONFIG => "SetConfig",
        GET_CONFIG => "GetConfig",
        RESET_CONFIG => "ResetConfig",
        SAVE_CONFIG => "SaveConfig",
        CONFIG_SAVED => "ConfigSaved",
        ACTIVATE_CONFIG => "ActivateConfig",
        CONFIG_ACTIVATED => "ConfigActivated",
        SET_POWER_SAVING_MODE => "SetPowerSavingMode",
        SET_NAME => "SetName",
        GEN_NEW_SERIAL => "GenNewSerial",
        RESET_STEPPER => "ResetStepper",
        SET_ZERO_STEPPER => "SetZeroStepper",
        TRIGGER => "Trigger",
        RESET_BOARD => "ResetBoard",
        SET_LCD_DISPLAY_I2C => "SetLcdDisplayI2C",
        SET_MODULE_BRIGHTNESS => "SetModuleBrightness",
        SET_SHIFT_REGISTER_PINS => "SetShiftRegisterPins",
        ANALOG_CHANGE => "AnalogChange",
        INPUT_SHIFTER_CHANGE => "InputShifterChange",
        DIG_IN_MUX_CHANGE => "DigInMuxChange",
        SET_STEPPER_SPEED_ACCEL => "SetStepperSpeedAccel",
        SET_CUSTOM_DEVICE => "SetCustomDevice",
        SET_MODULE_SINGLE_SEGMENT => "SetModuleSingleSegment",
        DEBUG => "Debug",
        _ => "Unknown",
    }
}

/// Returns the handler-table slot for `id`, or `None` outside the table.
pub fn table_index(id: i16) -> Option<usize> {
    usize::try_from(id)
        .ok()
        .filter(|&index| index < COMMAND_TABLE_SIZE)
}
