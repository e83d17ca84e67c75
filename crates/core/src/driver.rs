// VSI Sensor - Virtual Streaming Interface Peripheral Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Firmware-side sensor driver.
//!
//! Programs a VSI instance through the host entry points the same way the
//! target firmware does: configure the stream format, describe the DMA
//! buffer, then start the periodic timer that moves one block per period.

use crate::frames::frame_size;
use crate::registers::{
    Control, DmaControl, FrameFormat, TimerControl, CHANNELS, CONTROL, DMA_CONTROL, SAMPLE_BITS,
    SAMPLE_RATE, TIMER_CONTROL, TIMER_INTERVAL,
};
use crate::{VsiError, VsiHost};
use vsi_config::StreamConfig;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("Sensor driver is not initialized")]
    NotInitialized,
    #[error("Invalid sensor parameter: {0}")]
    InvalidParameter(&'static str),
    #[error("Sensor interface is busy")]
    Busy,
    #[error(transparent)]
    Peripheral(#[from] VsiError),
    #[error(transparent)]
    Config(#[from] anyhow::Error),
}

pub type DriverResult<T> = Result<T, DriverError>;

/// Transfer direction of the driven VSI instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interface {
    /// Sensor input, DMA peripheral to memory.
    Rx,
    /// Sensor output, DMA memory to peripheral.
    Tx,
}

impl Interface {
    fn dma_direction(self) -> DmaControl {
        match self {
            Interface::Rx => DmaControl::empty(),
            Interface::Tx => DmaControl::DIRECTION_M2P,
        }
    }

    fn event(self) -> DriverEvent {
        match self {
            Interface::Rx => DriverEvent::RX_DATA,
            Interface::Tx => DriverEvent::TX_DATA,
        }
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DriverControl: u32 {
        const ENABLE = 1 << 0;
        const DISABLE = 1 << 1;
        const PAUSE = 1 << 2;
        const RESUME = 1 << 3;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DriverEvent: u32 {
        const TX_DATA = 1 << 0;
        const RX_DATA = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriverStatus {
    pub active: bool,
}

const IRQ_PENDING: u32 = 1 << 0;

const STREAMING_TIMER: TimerControl = TimerControl::RUN
    .union(TimerControl::PERIODIC)
    .union(TimerControl::TRIG_IRQ)
    .union(TimerControl::TRIG_DMA);

/// Timer period in microseconds for one block of `block_size` bytes.
///
/// Saturates to `u32::MAX` (timer effectively stopped) when the frame size
/// or sample rate is zero, or when the period does not fit.
pub fn timer_interval(block_size: u32, format: FrameFormat, sample_rate: u32) -> u32 {
    let sample_size = frame_size(format);
    if sample_size == 0 || sample_rate == 0 {
        return u32::MAX;
    }
    let frames = block_size as u64 / sample_size;
    u32::try_from(1_000_000 * frames / sample_rate as u64).unwrap_or(u32::MAX)
}

#[derive(Debug)]
pub struct SensorDriver<H: VsiHost> {
    host: H,
    interface: Interface,
    initialized: bool,
    // Shadows of the write-only timer and DMA control registers.
    timer_control: TimerControl,
    dma_control: DmaControl,
    block_num: u32,
    block_size: u32,
    block_count: u32,
}

impl<H: VsiHost> SensorDriver<H> {
    pub fn new(host: H, interface: Interface) -> Self {
        Self {
            host,
            interface,
            initialized: false,
            timer_control: TimerControl::empty(),
            dma_control: DmaControl::empty(),
            block_num: 0,
            block_size: 0,
            block_count: 0,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn interface(&self) -> Interface {
        self.interface
    }

    pub fn block_num(&self) -> u32 {
        self.block_num
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Blocks moved since the driver was created.
    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    pub fn initialize(&mut self) -> DriverResult<()> {
        self.host.init();
        self.reset_peripheral()?;
        self.initialized = true;
        tracing::info!("Sensor driver initialized ({:?})", self.interface);
        Ok(())
    }

    pub fn uninitialize(&mut self) -> DriverResult<()> {
        self.reset_peripheral()?;
        self.initialized = false;
        tracing::info!("Sensor driver uninitialized ({:?})", self.interface);
        Ok(())
    }

    fn reset_peripheral(&mut self) -> DriverResult<()> {
        self.write_timer_control(TimerControl::empty());
        self.write_dma_control(DmaControl::empty());
        self.host.write_irq(0);
        self.host.write_user(CONTROL, 0)?;
        Ok(())
    }

    pub fn configure(
        &mut self,
        channels: u32,
        sample_bits: u32,
        sample_rate: u32,
    ) -> DriverResult<()> {
        self.require_initialized()?;

        if !(1..=32).contains(&channels) {
            return Err(DriverError::InvalidParameter("channels must be 1..=32"));
        }
        if !(8..=32).contains(&sample_bits) {
            return Err(DriverError::InvalidParameter("sample_bits must be 8..=32"));
        }
        if sample_rate == 0 {
            return Err(DriverError::InvalidParameter("sample_rate must be nonzero"));
        }
        if self.control_register()?.contains(Control::ENABLE) {
            return Err(DriverError::Busy);
        }

        self.host.write_user(CHANNELS, channels)?;
        self.host.write_user(SAMPLE_BITS, sample_bits)?;
        self.host.write_user(SAMPLE_RATE, sample_rate)?;
        Ok(())
    }

    pub fn set_buf(&mut self, block_num: u32, block_size: u32) -> DriverResult<()> {
        self.require_initialized()?;
        if self.dma_control.contains(DmaControl::ENABLE) {
            return Err(DriverError::Busy);
        }
        self.block_num = block_num;
        self.block_size = block_size;
        tracing::debug!("DMA buffer: {} blocks of {} bytes", block_num, block_size);
        Ok(())
    }

    pub fn configure_stream(&mut self, stream: &StreamConfig) -> DriverResult<()> {
        let block_size = stream.block_size_bytes()?;
        self.configure(stream.channels, stream.sample_bits, stream.sample_rate)?;
        self.set_buf(stream.block_num, block_size)
    }

    pub fn control(&mut self, control: DriverControl) -> DriverResult<()> {
        self.require_initialized()?;

        if control.contains(DriverControl::DISABLE) {
            self.write_timer_control(TimerControl::empty());
            self.write_dma_control(DmaControl::empty());
            self.host.write_user(CONTROL, 0)?;
        } else if control.contains(DriverControl::ENABLE) {
            self.host.write_user(CONTROL, Control::ENABLE.bits())?;
            self.write_dma_control(self.interface.dma_direction() | DmaControl::ENABLE);

            let format = FrameFormat {
                channels: self.host.read_user(CHANNELS)?,
                sample_bits: self.host.read_user(SAMPLE_BITS)?,
            };
            let sample_rate = self.host.read_user(SAMPLE_RATE)?;
            let interval = timer_interval(self.block_size, format, sample_rate);
            self.host.write_timer(TIMER_INTERVAL, interval);
            self.write_timer_control(STREAMING_TIMER);
        }

        if control.contains(DriverControl::PAUSE) {
            self.write_timer_control(TimerControl::empty());
            self.write_dma_control(DmaControl::empty());
        } else if control.contains(DriverControl::RESUME) {
            self.write_timer_control(STREAMING_TIMER);
            self.write_dma_control(self.interface.dma_direction() | DmaControl::ENABLE);
        }

        Ok(())
    }

    pub fn status(&self) -> DriverResult<DriverStatus> {
        Ok(DriverStatus {
            active: self.control_register()?.contains(Control::ENABLE),
        })
    }

    /// One timer period on an input interface. Returns `None` when DMA is
    /// not running.
    pub fn receive_block(&mut self) -> DriverResult<Option<Vec<u8>>> {
        self.require_initialized()?;
        if self.interface != Interface::Rx {
            return Err(DriverError::InvalidParameter("receive on a transmit interface"));
        }

        self.host.on_timer_expiry();
        if !self.dma_running() {
            return Ok(None);
        }

        let block = self.host.dma_read_p2m(self.block_size)?;
        self.complete_block();
        Ok(Some(block))
    }

    /// One timer period on an output interface. Returns whether the block
    /// was handed to the peripheral.
    pub fn transmit_block(&mut self, data: Vec<u8>) -> DriverResult<bool> {
        self.require_initialized()?;
        if self.interface != Interface::Tx {
            return Err(DriverError::InvalidParameter("transmit on a receive interface"));
        }

        self.host.on_timer_expiry();
        if !self.dma_running() {
            return Ok(false);
        }

        self.host.dma_write_m2p(data, self.block_size);
        self.complete_block();
        Ok(true)
    }

    /// Interrupt handler: acknowledges a pending block interrupt and reports
    /// the matching event.
    pub fn handle_irq(&mut self) -> Option<DriverEvent> {
        let status = self.host.read_irq();
        if status & IRQ_PENDING == 0 {
            return None;
        }
        self.host.write_irq(status & !IRQ_PENDING);
        Some(self.interface.event())
    }

    fn complete_block(&mut self) {
        self.block_count = self.block_count.wrapping_add(1);
        if self.timer_control.contains(TimerControl::TRIG_IRQ) {
            let status = self.host.read_irq() | IRQ_PENDING;
            self.host.write_irq(status);
        }
    }

    fn dma_running(&self) -> bool {
        self.dma_control.contains(DmaControl::ENABLE)
            && (self.dma_control & DmaControl::DIRECTION_M2P) == self.interface.dma_direction()
    }

    fn control_register(&self) -> DriverResult<Control> {
        Ok(Control::from_bits_retain(self.host.read_user(CONTROL)?))
    }

    fn write_timer_control(&mut self, value: TimerControl) {
        self.timer_control = value;
        self.host.write_timer(TIMER_CONTROL, value.bits());
    }

    fn write_dma_control(&mut self, value: DmaControl) {
        self.dma_control = value;
        self.host.write_dma(DMA_CONTROL, value.bits());
    }

    fn require_initialized(&self) -> DriverResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(DriverError::NotInitialized)
        }
    }
}
