// VSI Sensor - Virtual Streaming Interface Peripheral Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Circular record stream backed by a text capture.
//!
//! Each line of the capture is one record: whitespace separated decimal
//! sample values in `0..=255`. Reaching the end of the file rewinds to the
//! first line, so a finite capture plays back as continuous sampling.

use crate::{VsiError, VsiResult};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

#[derive(Debug)]
struct OpenStream {
    path: PathBuf,
    reader: BufReader<File>,
    // Line number of the most recently returned record (1-based, 0 after rewind).
    line: usize,
}

impl OpenStream {
    fn next_line(&mut self) -> VsiResult<String> {
        let mut row = String::new();
        for _ in 0..2 {
            if self.reader.read_line(&mut row)? > 0 {
                self.line += 1;
                return Ok(row);
            }
            tracing::debug!("End of data file {:?}, rewinding", self.path);
            self.reader.seek(SeekFrom::Start(0))?;
            self.line = 0;
        }

        // Rewinding still produced nothing: the capture is empty.
        tracing::warn!("Data file {:?} is empty", self.path);
        Ok(row)
    }
}

/// Restartable record stream, opened and closed by receiver enable edges.
#[derive(Debug, Default)]
pub struct RecordSource {
    stream: Option<OpenStream>,
    /// Cleared only at construction. The first read of a session yields an
    /// empty record before any data is sourced.
    primed: bool,
}

impl RecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub fn is_primed(&self) -> bool {
        self.primed
    }

    pub fn path(&self) -> Option<&Path> {
        self.stream.as_ref().map(|s| s.path.as_path())
    }

    pub fn open(&mut self, path: &Path) -> VsiResult<()> {
        if self.stream.is_some() {
            return Err(VsiError::SourceAlreadyOpen);
        }

        tracing::info!("Open data file (read mode): {:?}", path);
        let configuration = |source: io::Error| VsiError::Configuration {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(configuration)?;
        let metadata = file.metadata().map_err(configuration)?;
        if !metadata.is_file() {
            return Err(configuration(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }
        tracing::info!("  Number of Bytes: {}", metadata.len());

        self.stream = Some(OpenStream {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            line: 0,
        });
        Ok(())
    }

    pub fn close(&mut self) -> VsiResult<()> {
        let stream = self.stream.take().ok_or(VsiError::SourceNotOpen)?;
        tracing::info!("Close data file {:?}", stream.path);
        Ok(())
    }

    /// Returns the next record of the capture.
    ///
    /// `requested_frames` is what the caller would like to receive; one line
    /// is returned per call regardless.
    pub fn read_next_record(&mut self, requested_frames: u64) -> VsiResult<Vec<u8>> {
        tracing::info!("Read data record ({} frames requested)", requested_frames);
        if !self.primed {
            self.primed = true;
            return Ok(Vec::new());
        }

        let stream = self.stream.as_mut().ok_or(VsiError::SourceNotOpen)?;
        let row = stream.next_line()?;
        let record = parse_record(stream.line, &row)?;
        tracing::debug!("data: {:?}", record);
        Ok(record)
    }
}

fn parse_record(line: usize, row: &str) -> VsiResult<Vec<u8>> {
    row.split_whitespace()
        .map(|token| {
            token.parse::<u8>().map_err(|_| VsiError::MalformedRecord {
                line,
                token: token.to_string(),
            })
        })
        .collect()
}
