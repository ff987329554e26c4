/// Length of a report carrying the footswitch bitmask.
pub const BUTTON_REPORT_LEN: usize = 8;
/// Length of a report carrying the expression pedal position.
pub const PEDAL_REPORT_LEN: usize = 33;

const BUTTON_OFFSET: usize = 1;
const PEDAL_OFFSET: usize = 5;

/// A decoded interrupt-in report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    /// Bit `i` set means switch `i` is held down.
    Buttons(u8),
    /// Raw potentiometer reading, big-endian on the wire.
    Pedal(i16),
}

impl Report {
    /// Parse a raw USB input buffer. Lengths other than 8 and 33 bytes carry
    /// nothing we understand and yield `None`.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        match buf.len() {
            BUTTON_REPORT_LEN => Some(Report::Buttons(buf[BUTTON_OFFSET])),
            PEDAL_REPORT_LEN => Some(Report::Pedal(i16::from_be_bytes([
                buf[PEDAL_OFFSET],
                buf[PEDAL_OFFSET + 1],
            ]))),
            _ => None,
        }
    }
}

/// True when bit `index` of `bits` is set.
pub fn is_bit_enabled(bits: u8, index: u8) -> bool {
    (1u8)
        .checked_shl(index as u32)
        .map(|mask| bits & mask != 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_button_frame() {
        let buf = [0x01, 0b1000_0101, 0, 0, 0, 0, 0, 0];
        assert_eq!(Report::parse(&buf), Some(Report::Buttons(0b1000_0101)));
    }

    #[test]
    fn parses_pedal_frame_big_endian() {
        let mut buf = [0u8; PEDAL_REPORT_LEN];
        buf[5] = 0x01;
        buf[6] = 0x4F;
        assert_eq!(Report::parse(&buf), Some(Report::Pedal(335)));
    }

    #[test]
    fn pedal_value_is_signed() {
        let mut buf = [0u8; PEDAL_REPORT_LEN];
        buf[5] = 0xFF;
        buf[6] = 0xFE;
        assert_eq!(Report::parse(&buf), Some(Report::Pedal(-2)));
    }

    #[test]
    fn ignores_other_lengths() {
        assert_eq!(Report::parse(&[]), None);
        assert_eq!(Report::parse(&[0u8; 10]), None);
        assert_eq!(Report::parse(&[0u8; 64]), None);
    }

    #[test]
    fn bit_lookup() {
        assert!(is_bit_enabled(0b0000_0001, 0));
        assert!(!is_bit_enabled(0b0000_0001, 1));
        assert!(is_bit_enabled(0b1000_0000, 7));
        assert!(!is_bit_enabled(0xFF, 8));
    }
}
