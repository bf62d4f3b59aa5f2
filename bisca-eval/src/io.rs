//! Binary weight persistence.
//!
//! New format: `[i32 input][i32 hidden1][i32 hidden2]` then `w1 b1 w2 b2 w3
//! b3` as little-endian f32. Legacy format: two-int header and a single
//! hidden layer (`w1 b1 w3 b3`). Legacy files carry no tag; they are
//! detected by reading the would-be third header int and rejecting values
//! outside a plausible hidden-layer range.

use std::fs;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use bytemuck::cast_slice;
use thiserror::Error;

use crate::network::NnueWeights;

/// Largest hidden-layer width accepted by the header plausibility check.
const MAX_PLAUSIBLE_HIDDEN: i32 = 1024;

#[derive(Debug, Error)]
pub enum WeightsError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid header: {0}")]
    BadHeader(String),
    #[error("file truncated: expected {expected} more floats")]
    Truncated { expected: usize },
}

/// Write weights in the new (two-hidden-layer) format.
pub fn save_weights(weights: &NnueWeights, path: &Path) -> Result<(), WeightsError> {
    let mut f = BufWriter::new(File::create(path)?);

    f.write_all(&(weights.input_size as i32).to_le_bytes())?;
    f.write_all(&(weights.hidden1 as i32).to_le_bytes())?;
    f.write_all(&(weights.hidden2 as i32).to_le_bytes())?;

    f.write_all(cast_slice(&weights.w1))?;
    f.write_all(cast_slice(&weights.b1))?;
    f.write_all(cast_slice(&weights.w2))?;
    f.write_all(cast_slice(&weights.b2))?;
    f.write_all(cast_slice(&weights.w3))?;
    f.write_all(&weights.b3.to_le_bytes())?;

    f.flush()?;
    Ok(())
}

/// Read weights, auto-detecting the legacy single-hidden-layer format.
///
/// A legacy file maps onto the in-memory two-layer structure with
/// `hidden2 = 0` and `w3` of length `hidden1`.
pub fn load_weights(path: &Path) -> Result<NnueWeights, WeightsError> {
    let bytes = fs::read(path)?;
    let mut r = Reader::new(&bytes);

    let input_size = r
        .read_i32()
        .ok_or_else(|| WeightsError::BadHeader("missing input size".into()))?;
    let hidden1 = r
        .read_i32()
        .ok_or_else(|| WeightsError::BadHeader("missing hidden1".into()))?;
    if input_size <= 0 || hidden1 <= 0 || hidden1 > MAX_PLAUSIBLE_HIDDEN {
        return Err(WeightsError::BadHeader(format!(
            "input={} hidden1={}",
            input_size, hidden1
        )));
    }
    let input_size = input_size as usize;
    let hidden1 = hidden1 as usize;

    // Third header int distinguishes the formats: absent or implausible
    // means a legacy file, whose third word is already weight data.
    let mark = r.pos;
    match r.read_i32() {
        Some(h2) if (0..=MAX_PLAUSIBLE_HIDDEN).contains(&h2) => {
            let hidden2 = h2 as usize;
            let w1 = r.read_f32_vec(hidden1 * input_size)?;
            let b1 = r.read_f32_vec(hidden1)?;
            let w2 = r.read_f32_vec(hidden2 * hidden1)?;
            let b2 = r.read_f32_vec(hidden2)?;
            let w3 = r.read_f32_vec(hidden2)?;
            let b3 = r.read_f32()?;
            Ok(NnueWeights {
                w1,
                b1,
                w2,
                b2,
                w3,
                b3,
                input_size,
                hidden1,
                hidden2,
            })
        }
        _ => {
            r.pos = mark;
            let w1 = r.read_f32_vec(hidden1 * input_size)?;
            let b1 = r.read_f32_vec(hidden1)?;
            let w3 = r.read_f32_vec(hidden1)?;
            let b3 = r.read_f32()?;
            Ok(NnueWeights {
                w1,
                b1,
                w2: Vec::new(),
                b2: Vec::new(),
                w3,
                b3,
                input_size,
                hidden1,
                hidden2: 0,
            })
        }
    }
}

/// Little-endian slice reader over the file contents.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn read_i32(&mut self) -> Option<i32> {
        let chunk = self.bytes.get(self.pos..self.pos + 4)?;
        self.pos += 4;
        Some(i32::from_le_bytes(chunk.try_into().expect("4-byte slice")))
    }

    fn read_f32(&mut self) -> Result<f32, WeightsError> {
        let chunk = self
            .bytes
            .get(self.pos..self.pos + 4)
            .ok_or(WeightsError::Truncated { expected: 1 })?;
        self.pos += 4;
        Ok(f32::from_le_bytes(chunk.try_into().expect("4-byte slice")))
    }

    fn read_f32_vec(&mut self, count: usize) -> Result<Vec<f32>, WeightsError> {
        let end = self.pos + count * 4;
        let chunk = self
            .bytes
            .get(self.pos..end)
            .ok_or(WeightsError::Truncated { expected: count })?;
        self.pos = end;
        Ok(chunk
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes(b.try_into().expect("4-byte chunk")))
            .collect())
    }
}
