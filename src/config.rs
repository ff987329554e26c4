//! Session configuration, loaded from an optional YAML file.
//!
//! ```yaml
//! midi:
//!   channel: 1
//!   port: "IAC"
//! usb:
//!   vendor_id: 0x17cc
//!   read_timeout_ms: 100
//! pedal:
//!   min: 70
//!   max: 600
//!   controller: 1
//! buttons:
//!   - switch: 0
//!     notes:
//!       - note: 36
//!       - note: 38
//!         channel: 10
//! ```

use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};
use crate::footswitch::DEFAULT_VENDOR_ID;
use crate::translator::{ButtonMap, Channel, NoteTarget, PedalCalibration, Translator};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub midi: MidiConfig,
    pub usb: UsbConfig,
    pub pedal: PedalCalibration,
    /// Overrides for individual switches; unlisted switches keep the
    /// default `switch i -> note i` wiring.
    pub buttons: Vec<ButtonConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MidiConfig {
    pub channel: Channel,
    /// Port name hint or enumeration index. Empty picks a default port.
    pub port: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UsbConfig {
    pub vendor_id: u16,
    pub read_timeout_ms: u64,
}

impl Default for UsbConfig {
    fn default() -> Self {
        Self {
            vendor_id: DEFAULT_VENDOR_ID,
            read_timeout_ms: 100,
        }
    }
}

impl UsbConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ButtonConfig {
    pub switch: usize,
    #[serde(default)]
    pub notes: Vec<NoteTarget>,
}

impl Config {
    pub fn load(path: &Path) -> BridgeResult<Self> {
        let text = fs::read_to_string(path).map_err(|err| {
            BridgeError::Config(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> BridgeResult<Self> {
        let config: Config =
            serde_yaml::from_str(text).map_err(|err| BridgeError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BridgeResult<()> {
        self.pedal.validate()?;
        if self.usb.read_timeout_ms == 0 {
            return Err(BridgeError::Config(
                "usb.read_timeout_ms must be positive".into(),
            ));
        }
        self.button_map().map(|_| ())
    }

    pub fn button_map(&self) -> BridgeResult<ButtonMap> {
        let mut map = ButtonMap::default();
        for button in &self.buttons {
            map.set(button.switch, button.notes.clone())?;
        }
        Ok(map)
    }

    pub fn translator(&self) -> BridgeResult<Translator> {
        Ok(Translator::new(
            self.midi.channel,
            self.button_map()?,
            self.pedal,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.midi.channel.number(), 1);
        assert_eq!(config.usb.vendor_id, 0x17cc);
        assert_eq!(config.pedal, PedalCalibration::default());
        assert_eq!(config.button_map().unwrap(), ButtonMap::default());
    }

    #[test]
    fn parses_full_document() {
        let yaml = r#"
midi:
  channel: 3
  port: "usb midi"
usb:
  vendor_id: 6092
  read_timeout_ms: 250
pedal:
  min: 100
  max: 900
  controller: 11
buttons:
  - switch: 0
    notes:
      - note: 36
      - note: 38
        channel: 10
  - switch: 7
    notes: []
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.midi.channel.number(), 3);
        assert_eq!(config.midi.port, "usb midi");
        assert_eq!(config.usb.read_timeout(), Duration::from_millis(250));
        assert_eq!(config.pedal.controller, 11);

        let map = config.button_map().unwrap();
        assert_eq!(
            map.targets(0),
            &[
                NoteTarget::new(36),
                NoteTarget::on_channel(38, Channel::new(10).unwrap()),
            ]
        );
        assert_eq!(map.targets(1), &[NoteTarget::new(1)]);
        assert!(map.targets(7).is_empty());
    }

    #[test]
    fn rejects_channel_out_of_range() {
        assert!(Config::from_yaml("midi:\n  channel: 17\n").is_err());
        assert!(Config::from_yaml("midi:\n  channel: 0\n").is_err());
    }

    #[test]
    fn rejects_bad_switch_index() {
        let yaml = "buttons:\n  - switch: 8\n    notes:\n      - note: 1\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn rejects_inverted_pedal_range() {
        assert!(Config::from_yaml("pedal:\n  min: 600\n  max: 70\n").is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(Config::from_yaml("midi:\n  chanel: 2\n").is_err());
    }

    #[test]
    fn rejects_unknown_pedal_keys() {
        assert!(Config::from_yaml("pedal:\n  mn: 100\n").is_err());
    }

    #[test]
    fn translator_uses_configured_channel() {
        let config = Config::from_yaml("midi:\n  channel: 5\n").unwrap();
        assert_eq!(config.translator().unwrap().channel().number(), 5);
    }
}
