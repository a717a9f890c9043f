//! Well-known N64 controller requests
//!
//! Ready-made command frames in the layout the emulator hands to
//! [`SerialInput::exchange`](super::SerialInput::exchange), with the
//! response region pre-filled with `0xFF`.

/// Controller status / identity
pub const CMD_INFO: u8 = 0x00;
/// Button and stick state
pub const CMD_READ_BUTTONS: u8 = 0x01;
/// Reset, answers like [`CMD_INFO`]
pub const CMD_RESET: u8 = 0xFF;

/// Length of the status response: 2 id bytes + 1 accessory byte
pub const INFO_RESPONSE_LEN: u8 = 3;
/// Length of the button response: 2 button bytes + x + y
pub const BUTTONS_RESPONSE_LEN: u8 = 4;

fn request(command: u8, rx_len: u8) -> Vec<u8> {
    let mut frame = vec![0x01, rx_len, command];
    frame.resize(frame.len() + usize::from(rx_len), 0xFF);
    frame
}

/// `01 03 00 FF FF FF`
pub fn info_request() -> Vec<u8> {
    request(CMD_INFO, INFO_RESPONSE_LEN)
}

/// `01 04 01 FF FF FF FF`
pub fn read_buttons_request() -> Vec<u8> {
    request(CMD_READ_BUTTONS, BUTTONS_RESPONSE_LEN)
}

/// `01 03 FF FF FF FF`
pub fn reset_request() -> Vec<u8> {
    request(CMD_RESET, INFO_RESPONSE_LEN)
}
