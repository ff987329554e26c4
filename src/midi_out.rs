use midir::{MidiOutput, MidiOutputConnection, MidiOutputPort};
use tracing::debug;

use crate::bridge::MidiSink;
use crate::error::{BridgeError, BridgeResult};
use crate::translator::MidiMessage;

const CLIENT_NAME: &str = "footswitch-midi";
const CONNECTION_NAME: &str = "footswitch-midi-out";

/// An open connection to one host MIDI output port.
pub struct MidiOut {
    connection: MidiOutputConnection,
    port_name: String,
}

impl MidiOut {
    /// Names of the host's MIDI outputs in enumeration order.
    pub fn list_ports() -> BridgeResult<Vec<String>> {
        let midi_out = new_client()?;
        Ok(midi_out
            .ports()
            .iter()
            .map(|port| {
                midi_out
                    .port_name(port)
                    .unwrap_or_else(|_| "<unknown>".into())
            })
            .collect())
    }

    /// Connect to the port picked by `selector`, see [`select_port`].
    pub fn connect(selector: &str) -> BridgeResult<Self> {
        let midi_out = new_client()?;
        let ports = midi_out.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|port| midi_out.port_name(port).unwrap_or_default())
            .collect();

        let index = select_port(&names, selector)
            .ok_or_else(|| BridgeError::PortNotFound(selector.to_string()))?;
        let target_port: &MidiOutputPort = &ports[index];
        let port_name = names[index].clone();
        debug!(port = %port_name, index, "connecting MIDI output");

        let connection = midi_out
            .connect(target_port, CONNECTION_NAME)
            .map_err(|err| BridgeError::Connection(err.to_string()))?;

        Ok(Self {
            connection,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl MidiSink for MidiOut {
    fn send(&mut self, message: &MidiMessage) -> BridgeResult<()> {
        self.connection
            .send(&message.to_bytes())
            .map_err(|err| BridgeError::Send(err.to_string()))
    }
}

fn new_client() -> BridgeResult<MidiOutput> {
    MidiOutput::new(CLIENT_NAME).map_err(|err| BridgeError::MidiInit(err.to_string()))
}

/// Pick an output port index.
///
/// A numeric selector is an index into `names`. Any other non-empty selector
/// is a case-insensitive substring of the port name. An empty selector takes
/// the second port when there is more than one, since the first is usually
/// the host's through port.
pub fn select_port(names: &[String], selector: &str) -> Option<usize> {
    let selector = selector.trim();
    if names.is_empty() {
        return None;
    }

    if selector.is_empty() {
        return Some(if names.len() > 1 { 1 } else { 0 });
    }

    if let Ok(index) = selector.parse::<usize>() {
        return (index < names.len()).then_some(index);
    }

    let hint = selector.to_lowercase();
    names
        .iter()
        .position(|name| name.to_lowercase().contains(&hint))
}

#[cfg(test)]
mod tests {
    use super::select_port;

    fn ports() -> Vec<String> {
        vec![
            "Midi Through Port-0".to_string(),
            "IAC Driver Bus 1".to_string(),
            "USB MIDI Interface".to_string(),
        ]
    }

    #[test]
    fn empty_selector_skips_through_port() {
        assert_eq!(select_port(&ports(), ""), Some(1));
        assert_eq!(select_port(&ports()[..1], "  "), Some(0));
    }

    #[test]
    fn numeric_selector_is_an_index() {
        assert_eq!(select_port(&ports(), "2"), Some(2));
        assert_eq!(select_port(&ports(), "3"), None);
    }

    #[test]
    fn name_hint_is_case_insensitive() {
        assert_eq!(select_port(&ports(), "usb midi"), Some(2));
        assert_eq!(select_port(&ports(), "iac"), Some(1));
        assert_eq!(select_port(&ports(), "loopMIDI"), None);
    }

    #[test]
    fn no_ports_means_no_selection() {
        assert_eq!(select_port(&[], ""), None);
    }
}
