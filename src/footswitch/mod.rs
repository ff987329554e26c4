mod device;
mod report;

pub use device::{FootswitchDevice, DEFAULT_VENDOR_ID};
#[allow(unused_imports)]
pub use report::{is_bit_enabled, Report, BUTTON_REPORT_LEN, PEDAL_REPORT_LEN};
