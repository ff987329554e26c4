use std::time::Duration;

use rusb::{Context, DeviceHandle, Error, UsbContext};
use tracing::{debug, info, warn};

use crate::bridge::{ReadOutcome, ReportSource};
use crate::error::{BridgeError, BridgeResult};

/// Native Instruments.
pub const DEFAULT_VENDOR_ID: u16 = 0x17cc;

const USB_CONFIGURATION: u8 = 1;
const USB_INTERFACE: u8 = 0;
const USB_READ_ENDPOINT: u8 = 0x81;
const MAX_REPORT_LEN: usize = 128;

/// An opened footswitch, ready for interrupt-in reads.
pub struct FootswitchDevice {
    _context: Context,
    handle: DeviceHandle<Context>,
    input_buf: [u8; MAX_REPORT_LEN],
    timeout: Duration,
}

impl FootswitchDevice {
    /// Open the first device on the bus carrying `vendor_id`.
    pub fn open(vendor_id: u16, timeout: Duration) -> BridgeResult<Self> {
        let context = Context::new()?;
        let mut handle = None;

        for device in context.devices()?.iter() {
            let Ok(desc) = device.device_descriptor() else {
                continue;
            };
            if desc.vendor_id() == vendor_id {
                info!(
                    vendor_id = %format!("{:#06x}", desc.vendor_id()),
                    product_id = %format!("{:#06x}", desc.product_id()),
                    bus = device.bus_number(),
                    address = device.address(),
                    "footswitch found"
                );
                handle = Some(device.open()?);
                break;
            }
        }

        let mut handle = handle.ok_or(BridgeError::DeviceNotFound { vendor_id })?;

        // usbhid usually owns the interface on Linux.
        match handle.set_auto_detach_kernel_driver(true) {
            Ok(()) | Err(Error::NotSupported) => {}
            Err(err) => warn!(error = %err, "could not enable kernel driver auto-detach"),
        }

        handle.set_active_configuration(USB_CONFIGURATION)?;
        handle.claim_interface(USB_INTERFACE)?;

        Ok(Self {
            _context: context,
            handle,
            input_buf: [0; MAX_REPORT_LEN],
            timeout,
        })
    }
}

impl ReportSource for FootswitchDevice {
    fn read_report(&mut self) -> BridgeResult<ReadOutcome> {
        match self
            .handle
            .read_interrupt(USB_READ_ENDPOINT, &mut self.input_buf, self.timeout)
        {
            Ok(len) => Ok(ReadOutcome::Report(self.input_buf[..len].to_vec())),
            Err(Error::Timeout) => Ok(ReadOutcome::Idle),
            Err(Error::NoDevice) => {
                debug!("footswitch disconnected");
                Ok(ReadOutcome::EndOfStream)
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl Drop for FootswitchDevice {
    fn drop(&mut self) {
        let _ = self.handle.release_interface(USB_INTERFACE);
    }
}
