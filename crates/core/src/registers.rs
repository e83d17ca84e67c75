// VSI Sensor - Virtual Streaming Interface Peripheral Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::source::RecordSource;
use crate::{VsiError, VsiResult};
use std::path::{Path, PathBuf};

/// Number of VSI user registers (`Regs[0..64]`).
pub const USER_REG_COUNT: usize = 64;

// User register indices
pub const CONTROL: u32 = 0;
pub const CHANNELS: u32 = 1;
pub const SAMPLE_BITS: u32 = 2;
pub const SAMPLE_RATE: u32 = 3;

// Timer register indices
pub const TIMER_CONTROL: u32 = 0;
pub const TIMER_INTERVAL: u32 = 1;

// DMA register indices
pub const DMA_CONTROL: u32 = 0;

bitflags::bitflags! {
    /// User CONTROL register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Control: u32 {
        const ENABLE = 1 << 0;
    }

    /// VSI Timer.Control register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TimerControl: u32 {
        const RUN = 1 << 0;
        const PERIODIC = 1 << 1;
        const TRIG_IRQ = 1 << 2;
        const TRIG_DMA = 1 << 3;
    }

    /// VSI DMA.Control register. Direction bit clear means P2M.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DmaControl: u32 {
        const ENABLE = 1 << 0;
        const DIRECTION_M2P = 1 << 1;
    }
}

/// Channel count and sample width as currently programmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameFormat {
    pub channels: u32,
    pub sample_bits: u32,
}

/// IRQ, timer, DMA and user registers of one VSI sensor input.
///
/// Owns the record source: CONTROL enable edges are the only thing that
/// opens or closes it.
#[derive(Debug, serde::Serialize)]
pub struct RegisterBank {
    irq_status: u32,
    timer_control: u32,
    timer_interval: u32,
    dma_control: u32,
    /// Always `USER_REG_COUNT` entries.
    regs: Vec<u32>,

    #[serde(skip)]
    data_file: PathBuf,
    #[serde(skip)]
    source: RecordSource,
}

impl RegisterBank {
    pub fn new(data_file: impl Into<PathBuf>) -> Self {
        Self {
            irq_status: 0,
            timer_control: 0,
            timer_interval: 0,
            dma_control: 0,
            regs: vec![0; USER_REG_COUNT],
            data_file: data_file.into(),
            source: RecordSource::new(),
        }
    }

    pub fn read_irq(&self) -> u32 {
        let value = self.irq_status;
        tracing::debug!("Read interrupt request: {}", value);
        value
    }

    pub fn write_irq(&mut self, value: u32) -> u32 {
        self.irq_status = value;
        tracing::debug!("Write interrupt request: {}", value);
        value
    }

    pub fn write_timer(&mut self, index: u32, value: u32) -> u32 {
        match index {
            TIMER_CONTROL => {
                self.timer_control = value;
                tracing::debug!("Write Timer_Control: {}", value);
            }
            TIMER_INTERVAL => {
                self.timer_interval = value;
                tracing::debug!("Write Timer_Interval: {}", value);
            }
            _ => {}
        }
        value
    }

    pub fn write_dma(&mut self, index: u32, value: u32) -> u32 {
        if index == DMA_CONTROL {
            self.dma_control = value;
            tracing::debug!("Write DMA_Control: {}", value);
        }
        value
    }

    pub fn read_user(&self, index: u32) -> VsiResult<u32> {
        let value = self.regs[Self::slot(index)?];
        tracing::debug!("Read user register at index {}: {}", index, value);
        Ok(value)
    }

    /// Runs the register's side effect against the old contents, then
    /// stores `value`. A failed side effect leaves the register unchanged.
    pub fn write_user(&mut self, index: u32, value: u32) -> VsiResult<u32> {
        let slot = Self::slot(index)?;
        self.dispatch_user_write(index, value)?;
        self.regs[slot] = value;
        tracing::debug!("Write user register at index {}: {}", index, value);
        Ok(value)
    }

    fn dispatch_user_write(&mut self, index: u32, value: u32) -> VsiResult<()> {
        match index {
            CONTROL => self.write_control(value)?,
            CHANNELS => tracing::info!("Number of channels: {}", value),
            SAMPLE_BITS => tracing::info!("Sample bits: {}", value),
            SAMPLE_RATE => tracing::info!("Sample rate: {}", value),
            _ => {}
        }
        Ok(())
    }

    fn write_control(&mut self, value: u32) -> VsiResult<()> {
        let old = self.control();
        let new = Control::from_bits_retain(value);

        if (old ^ new).contains(Control::ENABLE) {
            if new.contains(Control::ENABLE) {
                tracing::info!("Enable Receiver");
                self.source.open(&self.data_file)?;
            } else {
                tracing::info!("Disable Receiver");
                self.source.close()?;
            }
        }
        Ok(())
    }

    fn slot(index: u32) -> VsiResult<usize> {
        let slot = index as usize;
        if slot < USER_REG_COUNT {
            Ok(slot)
        } else {
            Err(VsiError::IndexOutOfRange(index))
        }
    }

    pub fn irq_status(&self) -> u32 {
        self.irq_status
    }

    pub fn control(&self) -> Control {
        Control::from_bits_retain(self.regs[CONTROL as usize])
    }

    pub fn enabled(&self) -> bool {
        self.control().contains(Control::ENABLE)
    }

    pub fn frame_format(&self) -> FrameFormat {
        FrameFormat {
            channels: self.regs[CHANNELS as usize],
            sample_bits: self.regs[SAMPLE_BITS as usize],
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.regs[SAMPLE_RATE as usize]
    }

    pub fn timer_control(&self) -> TimerControl {
        TimerControl::from_bits_retain(self.timer_control)
    }

    pub fn timer_interval(&self) -> u32 {
        self.timer_interval
    }

    pub fn dma_control(&self) -> DmaControl {
        DmaControl::from_bits_retain(self.dma_control)
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn source(&self) -> &RecordSource {
        &self.source
    }

    pub(crate) fn source_mut(&mut self) -> &mut RecordSource {
        &mut self.source
    }
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new(vsi_config::DEFAULT_DATA_FILE)
    }
}
