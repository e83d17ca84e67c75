// VSI Sensor - Virtual Streaming Interface Peripheral Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod driver;
pub mod frames;
pub mod peripheral;
pub mod registers;
pub mod source;

use std::path::PathBuf;

pub use peripheral::SensorPeripheral;
pub use registers::RegisterBank;

#[derive(Debug, thiserror::Error)]
pub enum VsiError {
    /// The backing data file could not be opened when the receiver was enabled.
    #[error("Cannot open sensor data file {path:?}: {source}")]
    Configuration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Record source is already open")]
    SourceAlreadyOpen,
    #[error("Record source is not open")]
    SourceNotOpen,
    #[error("User register index {0} out of range")]
    IndexOutOfRange(u32),
    #[error("Malformed record at line {line}: invalid sample {token:?}")]
    MalformedRecord { line: usize, token: String },
    #[error("Record source I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type VsiResult<T> = Result<T, VsiError>;

/// Entry points the host simulator invokes on register access, DMA transfers
/// and timer overflow.
///
/// Calls are synchronous and serial. Every mutating entry point takes
/// `&mut self`, so the host cannot re-enter the peripheral mid-call.
pub trait VsiHost {
    fn init(&mut self);

    fn read_irq(&self) -> u32;
    fn write_irq(&mut self, value: u32) -> u32;

    /// Index 0 is Timer.Control, 1 is Timer.Interval. Other indices are ignored.
    fn write_timer(&mut self, index: u32, value: u32) -> u32;
    /// Called on timer overflow.
    fn on_timer_expiry(&mut self);

    /// Index 0 is DMA.Control. Other indices are ignored.
    fn write_dma(&mut self, index: u32, value: u32) -> u32;
    /// Peripheral to memory transfer. Always returns exactly `size` bytes.
    fn dma_read_p2m(&mut self, size: u32) -> VsiResult<Vec<u8>>;
    /// Memory to peripheral transfer. `size` is informational.
    fn dma_write_m2p(&mut self, data: Vec<u8>, size: u32);

    fn read_user(&self, index: u32) -> VsiResult<u32>;
    fn write_user(&mut self, index: u32, value: u32) -> VsiResult<u32>;
}
