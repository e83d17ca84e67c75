// VSI Sensor - Virtual Streaming Interface Peripheral Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::registers::RegisterBank;
use crate::{frames, VsiHost, VsiResult};
use vsi_config::VsiConfig;

/// VSI0 sensor input: register bank plus the current DMA data buffer.
#[derive(Debug)]
pub struct SensorPeripheral {
    name: String,
    registers: RegisterBank,
    /// Last block loaded for a P2M transfer or received from an M2P transfer.
    data: Vec<u8>,
}

impl SensorPeripheral {
    pub fn new(config: &VsiConfig) -> Self {
        Self {
            name: config.name.clone(),
            registers: RegisterBank::new(config.data_file.clone()),
            data: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registers(&self) -> &RegisterBank {
        &self.registers
    }

    pub fn data_buffer(&self) -> &[u8] {
        &self.data
    }

    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "registers": serde_json::to_value(&self.registers).unwrap_or(serde_json::Value::Null),
            "source_open": self.registers.source().is_open(),
            "data_len": self.data.len(),
        })
    }
}

impl Default for SensorPeripheral {
    fn default() -> Self {
        Self::new(&VsiConfig::default())
    }
}

impl VsiHost for SensorPeripheral {
    fn init(&mut self) {
        tracing::info!("VSI peripheral '{}' initialized", self.name);
    }

    fn read_irq(&self) -> u32 {
        self.registers.read_irq()
    }

    fn write_irq(&mut self, value: u32) -> u32 {
        self.registers.write_irq(value)
    }

    fn write_timer(&mut self, index: u32, value: u32) -> u32 {
        self.registers.write_timer(index, value)
    }

    fn on_timer_expiry(&mut self) {
        tracing::debug!("Timer event on '{}'", self.name);
    }

    fn write_dma(&mut self, index: u32, value: u32) -> u32 {
        self.registers.write_dma(index, value)
    }

    fn dma_read_p2m(&mut self, size: u32) -> VsiResult<Vec<u8>> {
        let format = self.registers.frame_format();
        self.data = frames::load_block(self.registers.source_mut(), format, size)?;

        let block = frames::produce_dma_block(&self.data, size);
        tracing::debug!("Read data ({} bytes)", size);
        Ok(block)
    }

    fn dma_write_m2p(&mut self, data: Vec<u8>, size: u32) {
        self.data = data;
        tracing::debug!("Write data ({} bytes)", size);
    }

    fn read_user(&self, index: u32) -> VsiResult<u32> {
        self.registers.read_user(index)
    }

    fn write_user(&mut self, index: u32, value: u32) -> VsiResult<u32> {
        self.registers.write_user(index, value)
    }
}
