// VSI Sensor - Virtual Streaming Interface Peripheral Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::registers::FrameFormat;
use crate::source::RecordSource;
use crate::VsiResult;

/// Bytes per frame: one sample per channel, each rounded up to whole bytes.
pub fn frame_size(format: FrameFormat) -> u64 {
    format.channels as u64 * ((format.sample_bits as u64 + 7) / 8)
}

/// Loads the sensor data backing one DMA block of `block_size` bytes.
///
/// A zero frame size loads zero frames and leaves the source untouched.
/// Otherwise exactly one record is pulled, whatever the frame budget is.
pub fn load_block(
    source: &mut RecordSource,
    format: FrameFormat,
    block_size: u32,
) -> VsiResult<Vec<u8>> {
    tracing::info!("Load sensor frames into data buffer");
    let frame_size = frame_size(format);
    if frame_size == 0 {
        tracing::debug!("Frame size is zero ({:?}), no frames loaded", format);
        return Ok(Vec::new());
    }

    let frames_max = block_size as u64 / frame_size;
    source.read_next_record(frames_max)
}

/// Fits `loaded` into a block of exactly `size` bytes, zero padding or
/// truncating as needed.
pub fn produce_dma_block(loaded: &[u8], size: u32) -> Vec<u8> {
    let mut block = vec![0u8; size as usize];
    let n = loaded.len().min(block.len());
    block[..n].copy_from_slice(&loaded[..n]);
    block
}
