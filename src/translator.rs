use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;
use crate::footswitch::{is_bit_enabled, Report};

/// Number of switches carried in a button report.
pub const SWITCH_COUNT: usize = 8;

const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;
const VELOCITY_ON: u8 = 127;
const VELOCITY_OFF: u8 = 0;
const MIDI_DATA_MAX: u8 = 127;

/// A MIDI channel in the user-facing 1..=16 numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Channel(u8);

impl Channel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 16;

    pub fn new(number: u8) -> Result<Self, BridgeError> {
        if (Self::MIN..=Self::MAX).contains(&number) {
            Ok(Self(number))
        } else {
            Err(BridgeError::Config(format!(
                "MIDI channel {number} is outside {}..={}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    #[allow(dead_code)]
    pub fn number(self) -> u8 {
        self.0
    }

    /// Zero-based offset added to a status byte.
    pub fn offset(self) -> u8 {
        self.0 - 1
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self(1)
    }
}

impl TryFrom<u8> for Channel {
    type Error = BridgeError;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        Self::new(number)
    }
}

impl From<Channel> for u8 {
    fn from(channel: Channel) -> Self {
        channel.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A three byte MIDI 1.0 channel message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiMessage {
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
}

impl MidiMessage {
    /// Switch edge. Releases keep the note-on status and carry velocity 0.
    pub fn note(channel: Channel, note: u8, pressed: bool) -> Self {
        Self {
            status: NOTE_ON + channel.offset(),
            data1: note,
            data2: if pressed { VELOCITY_ON } else { VELOCITY_OFF },
        }
    }

    pub fn control_change(channel: Channel, controller: u8, value: u8) -> Self {
        Self {
            status: CONTROL_CHANGE + channel.offset(),
            data1: controller,
            data2: value,
        }
    }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.status, self.data1, self.data2]
    }
}

/// One logical note fired by a physical switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteTarget {
    pub note: u8,
    /// Falls back to the session channel when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
}

impl NoteTarget {
    pub fn new(note: u8) -> Self {
        Self {
            note,
            channel: None,
        }
    }

    #[allow(dead_code)]
    pub fn on_channel(note: u8, channel: Channel) -> Self {
        Self {
            note,
            channel: Some(channel),
        }
    }
}

/// Switch index to the notes it drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonMap {
    targets: [Vec<NoteTarget>; SWITCH_COUNT],
}

impl ButtonMap {
    /// A map with no switch wired to anything.
    #[allow(dead_code)]
    pub fn empty() -> Self {
        Self {
            targets: Default::default(),
        }
    }

    pub fn targets(&self, index: usize) -> &[NoteTarget] {
        self.targets.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set(&mut self, index: usize, targets: Vec<NoteTarget>) -> Result<(), BridgeError> {
        if let Some(note) = targets.iter().find(|t| t.note > MIDI_DATA_MAX) {
            return Err(BridgeError::Config(format!(
                "note {} on switch {index} is above {MIDI_DATA_MAX}",
                note.note
            )));
        }
        let slot = self.targets.get_mut(index).ok_or_else(|| {
            BridgeError::Config(format!(
                "switch index {index} is outside 0..{SWITCH_COUNT}"
            ))
        })?;
        *slot = targets;
        Ok(())
    }
}

impl Default for ButtonMap {
    /// Switch `i` plays note `i` on the session channel.
    fn default() -> Self {
        Self {
            targets: std::array::from_fn(|i| vec![NoteTarget::new(i as u8)]),
        }
    }
}

/// Calibrated travel of the expression pedal potentiometer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PedalCalibration {
    pub min: i32,
    pub max: i32,
    pub controller: u8,
}

impl Default for PedalCalibration {
    fn default() -> Self {
        Self {
            min: 70,
            max: 600,
            controller: 1,
        }
    }
}

impl PedalCalibration {
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.min >= self.max {
            return Err(BridgeError::Config(format!(
                "pedal min ({}) must be below max ({})",
                self.min, self.max
            )));
        }
        if self.controller > MIDI_DATA_MAX {
            return Err(BridgeError::Config(format!(
                "pedal controller {} is above {MIDI_DATA_MAX}",
                self.controller
            )));
        }
        Ok(())
    }

    /// Scale a raw reading onto 0..=127, clamping outside the calibrated range.
    pub fn convert_expression_pedal_value(&self, raw: i32) -> u8 {
        let span = f64::from(self.max) - f64::from(self.min);
        let scaled = (f64::from(raw) - f64::from(self.min)) * f64::from(MIDI_DATA_MAX) / span;
        scaled.clamp(0.0, f64::from(MIDI_DATA_MAX)).round() as u8
    }
}

/// Last state that was sent out. Starts zeroed for every session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslatorState {
    pub last_button_bits: u8,
    pub last_pedal_value: u8,
}

/// Turns footswitch reports into edge-triggered MIDI messages.
#[derive(Debug, Clone)]
pub struct Translator {
    channel: Channel,
    buttons: ButtonMap,
    pedal: PedalCalibration,
}

impl Translator {
    pub fn new(channel: Channel, buttons: ButtonMap, pedal: PedalCalibration) -> Self {
        Self {
            channel,
            buttons,
            pedal,
        }
    }

    #[allow(dead_code)]
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Decode one report and diff it against `state`.
    ///
    /// Returns the state to carry into the next call together with the
    /// messages to send, in switch index order. Unknown report lengths leave
    /// the state untouched.
    pub fn translate(
        &self,
        state: TranslatorState,
        report: &[u8],
    ) -> (TranslatorState, Vec<MidiMessage>) {
        match Report::parse(report) {
            Some(Report::Buttons(bits)) => self.translate_buttons(state, bits),
            Some(Report::Pedal(raw)) => self.translate_pedal(state, raw),
            None => (state, Vec::new()),
        }
    }

    fn translate_buttons(
        &self,
        state: TranslatorState,
        bits: u8,
    ) -> (TranslatorState, Vec<MidiMessage>) {
        let mut messages = Vec::new();
        for index in 0..SWITCH_COUNT as u8 {
            let pressed = is_bit_enabled(bits, index);
            if pressed == is_bit_enabled(state.last_button_bits, index) {
                continue;
            }
            for target in self.buttons.targets(index as usize) {
                let channel = target.channel.unwrap_or(self.channel);
                messages.push(MidiMessage::note(channel, target.note, pressed));
            }
        }

        let next = TranslatorState {
            last_button_bits: bits,
            ..state
        };
        (next, messages)
    }

    fn translate_pedal(
        &self,
        state: TranslatorState,
        raw: i16,
    ) -> (TranslatorState, Vec<MidiMessage>) {
        let mapped = self.pedal.convert_expression_pedal_value(i32::from(raw));
        if mapped == state.last_pedal_value {
            return (state, Vec::new());
        }

        let message = MidiMessage::control_change(self.channel, self.pedal.controller, mapped);
        let next = TranslatorState {
            last_pedal_value: mapped,
            ..state
        };
        (next, vec![message])
    }
}
