// VSI Sensor - Virtual Streaming Interface Peripheral Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use vsi_config::VsiConfig;
use vsi_core::registers::{CHANNELS, CONTROL, SAMPLE_BITS, SAMPLE_RATE};
use vsi_core::{SensorPeripheral, VsiError, VsiHost};

static SEQ: AtomicU64 = AtomicU64::new(0);

fn write_capture(prefix: &str, contents: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push("vsi-core-it");
    let _ = std::fs::create_dir_all(&dir);

    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let seq = SEQ.fetch_add(1, Ordering::SeqCst);
    let path = dir.join(format!("{}-{}-{}.txt", prefix, nonce, seq));
    std::fs::write(&path, contents).expect("Failed to write temp file");
    path
}

fn peripheral_for(contents: &str) -> SensorPeripheral {
    let config = VsiConfig {
        data_file: write_capture("capture", contents),
        ..Default::default()
    };
    let mut p = SensorPeripheral::new(&config);
    p.init();
    p
}

/// Two 8-bit channels, receiver enabled, first-read sentinel consumed.
fn streaming(contents: &str) -> anyhow::Result<SensorPeripheral> {
    let mut p = peripheral_for(contents);
    p.write_user(CHANNELS, 2)?;
    p.write_user(SAMPLE_BITS, 8)?;
    p.write_user(SAMPLE_RATE, 16_000)?;
    p.write_user(CONTROL, 1)?;
    assert_eq!(p.dma_read_p2m(4)?, vec![0, 0, 0, 0]);
    Ok(p)
}

#[test]
fn test_exact_fit_truncation_and_padding() -> anyhow::Result<()> {
    let mut p = streaming("1 2 3 4\n")?;
    assert_eq!(p.dma_read_p2m(4)?, vec![1, 2, 3, 4]);
    assert_eq!(p.dma_read_p2m(2)?, vec![1, 2]);
    assert_eq!(p.dma_read_p2m(8)?, vec![1, 2, 3, 4, 0, 0, 0, 0]);
    Ok(())
}

#[test]
fn test_first_read_ignores_file_content() -> anyhow::Result<()> {
    let mut p = peripheral_for("255 255 255 255\n");
    p.write_user(CHANNELS, 1)?;
    p.write_user(SAMPLE_BITS, 8)?;
    p.write_user(CONTROL, 1)?;
    assert_eq!(p.dma_read_p2m(16)?, vec![0; 16]);
    assert_eq!(p.dma_read_p2m(4)?, vec![255; 4]);
    Ok(())
}

#[test]
fn test_circular_playback() -> anyhow::Result<()> {
    let mut p = streaming("1 1\n2 2\n3 3\n")?;
    let reads: Vec<Vec<u8>> = (0..4)
        .map(|_| p.dma_read_p2m(2))
        .collect::<Result<_, _>>()?;
    assert_eq!(reads[0], vec![1, 1]);
    assert_eq!(reads[2], vec![3, 3]);
    assert_eq!(reads[3], reads[0]);
    Ok(())
}

#[test]
fn test_block_size_always_honoured() -> anyhow::Result<()> {
    let mut p = streaming("1 2 3 4 5 6 7 8 9\n\n42\n")?;
    for size in [0u32, 1, 3, 4, 7, 64, 1024] {
        assert_eq!(p.dma_read_p2m(size)?.len(), size as usize);
    }

    // Still exact when the format collapses to a zero frame size.
    p.write_user(CHANNELS, 0)?;
    for size in [0u32, 5, 128] {
        assert_eq!(p.dma_read_p2m(size)?, vec![0; size as usize]);
    }
    Ok(())
}

#[test]
fn test_reenable_restarts_capture() -> anyhow::Result<()> {
    let mut p = streaming("10 10\n20 20\n30 30\n")?;
    assert_eq!(p.dma_read_p2m(2)?, vec![10, 10]);
    assert_eq!(p.dma_read_p2m(2)?, vec![20, 20]);

    p.write_user(CONTROL, 0)?;
    assert!(!p.registers().source().is_open());
    p.write_user(CONTROL, 1)?;
    assert!(p.registers().source().is_open());

    assert_eq!(p.dma_read_p2m(2)?, vec![10, 10]);
    Ok(())
}

#[test]
fn test_non_enable_control_bits_leave_source_alone() -> anyhow::Result<()> {
    let mut p = streaming("5 5\n6 6\n")?;
    assert_eq!(p.dma_read_p2m(2)?, vec![5, 5]);

    for value in [0x3, 0xFFFF_FFFF, 0x8000_0001, 0x1] {
        p.write_user(CONTROL, value)?;
        assert!(p.registers().source().is_open());
    }
    // No reopen happened, so the stream position carried on.
    assert_eq!(p.dma_read_p2m(2)?, vec![6, 6]);

    for value in [0x0, 0x2, 0xFFFF_FFFE] {
        p.write_user(CONTROL, value)?;
        assert!(!p.registers().source().is_open());
    }
    Ok(())
}

#[test]
fn test_m2p_buffer_is_verbatim() {
    let mut p = SensorPeripheral::default();
    let data = vec![3u8, 1, 4, 1, 5, 9, 2, 6];

    p.dma_write_m2p(data.clone(), 4);
    assert_eq!(p.data_buffer(), data.as_slice());

    p.dma_write_m2p(data.clone(), 4096);
    assert_eq!(p.data_buffer(), data.as_slice());
}

#[test]
fn test_missing_capture_fails_enable() {
    let config = VsiConfig {
        data_file: PathBuf::from("/nonexistent/vsi/intdata.txt"),
        ..Default::default()
    };
    let mut p = SensorPeripheral::new(&config);

    let err = p.write_user(CONTROL, 1).unwrap_err();
    assert!(matches!(err, VsiError::Configuration { .. }));
    assert!(err.to_string().contains("intdata.txt"));
    assert_eq!(p.read_user(CONTROL).unwrap(), 0);
}

#[test]
fn test_register_surface() -> anyhow::Result<()> {
    let mut p = SensorPeripheral::default();
    assert_eq!(p.write_irq(1), 1);
    assert_eq!(p.read_irq(), 1);
    assert_eq!(p.write_timer(5, 123), 123);
    assert_eq!(p.write_dma(3, 456), 456);
    p.on_timer_expiry();

    assert_eq!(p.write_user(17, 0xABCD)?, 0xABCD);
    assert_eq!(p.read_user(17)?, 0xABCD);
    assert!(matches!(
        p.read_user(64),
        Err(VsiError::IndexOutOfRange(64))
    ));
    Ok(())
}
