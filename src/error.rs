use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("no USB device with vendor id {vendor_id:#06x} was found")]
    DeviceNotFound { vendor_id: u16 },

    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),

    #[error("failed to initialise MIDI output: {0}")]
    MidiInit(String),

    #[error("no MIDI output port matching \"{0}\" was found")]
    PortNotFound(String),

    #[error("failed to open MIDI connection: {0}")]
    Connection(String),

    #[error("failed to send MIDI message: {0}")]
    Send(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;
