// src/commands.rs

use crate::channel::DacBank;

/// Trailer byte closing every frame.
pub const TERMINATOR: u8 = 0x50;

pub const CMD_GPIO_DIRECTION: u8 = 0x57;
pub const CMD_ENABLE: u8 = 0x4F;
pub const CMD_IIC: u8 = 0x53;

/// Sub-address selecting the DAC data registers on an IIC write.
pub const DAC_WRITE: u8 = 0x03;
/// IIC address of the temperature sensor, read direction.
pub const TEMP_SENSOR: u8 = 0x91;
pub const TEMP_READ: u8 = 0x02;

/// Enable register value with every channel disabled (active low, bit 7 clear).
pub const ALL_DISABLED: u8 = 0x7F;
/// Selector byte addressing every DAC output of a bank.
pub const ALL_OUTPUTS: u8 = 0x0F;

pub const TEMPERATURE_FACTOR: f32 = 0.125;
pub const TEMPERATURE_REPLY_LEN: usize = 2;

/// GPIO0-3 as open drain outputs.
pub fn gpio_low_direction() -> Vec<u8> {
    vec![CMD_GPIO_DIRECTION, 0x02, 0xFF, TERMINATOR]
}

/// GPIO5-7 push-pull outputs, GPIO4 open drain.
pub fn gpio_high_direction() -> Vec<u8> {
    vec![CMD_GPIO_DIRECTION, 0x03, 0xAB, TERMINATOR]
}

pub fn enable_register(reg: u8) -> Vec<u8> {
    vec![CMD_ENABLE, reg & ALL_DISABLED, TERMINATOR]
}

/// Splits a 0-255 level into the two DAC data bytes.
///
/// The DAC is driven inverted, so level 255 is full output. The high byte
/// carries a fixed `0xF` tag in its top nibble.
pub fn intensity_bytes(level: u8) -> (u8, u8) {
    let inverted = 255 - level;
    let high = (inverted >> 4) | 0xF0;
    let low = (inverted & 0x0F) << 4;
    (high, low)
}

pub fn intensity(bank: DacBank, selector: u8, level: u8) -> Vec<u8> {
    let (high, low) = intensity_bytes(level);
    vec![
        CMD_IIC,
        bank.address(),
        DAC_WRITE,
        selector,
        high,
        low,
        TERMINATOR,
    ]
}

pub fn temperature_query() -> Vec<u8> {
    vec![CMD_IIC, TEMP_SENSOR, TEMP_READ, TERMINATOR]
}

/// Decodes the big-endian sensor reply into degrees Celsius.
///
/// Only the eleven most significant bits carry the reading.
pub fn decode_temperature(reply: [u8; TEMPERATURE_REPLY_LEN]) -> f32 {
    let raw = u16::from_be_bytes(reply) >> 5;
    f32::from(raw) * TEMPERATURE_FACTOR
}

/// Renders a frame as space separated hex for logs.
pub fn hex(frame: &[u8]) -> String {
    frame
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
