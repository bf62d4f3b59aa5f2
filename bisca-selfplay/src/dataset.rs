//! Flat binary dataset of training samples.
//!
//! Layout: `u32 sample_count`, then per sample `u32 feature_len`,
//! `f32 x feature_len` features, `f32 outcome`. Little-endian throughout.

use std::fs;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use bytemuck::cast_slice;
use thiserror::Error;

/// One training pair: the mover's feature vector and the game's final
/// score differential (player 0 minus player 1).
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub features: Vec<f32>,
    pub outcome: f32,
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("file truncated at sample {index}")]
    Truncated { index: usize },
}

pub fn write_samples(path: &Path, samples: &[Sample]) -> Result<(), DatasetError> {
    let mut f = BufWriter::new(File::create(path)?);

    f.write_all(&(samples.len() as u32).to_le_bytes())?;
    for sample in samples {
        f.write_all(&(sample.features.len() as u32).to_le_bytes())?;
        f.write_all(cast_slice(&sample.features))?;
        f.write_all(&sample.outcome.to_le_bytes())?;
    }

    f.flush()?;
    Ok(())
}

pub fn read_samples(path: &Path) -> Result<Vec<Sample>, DatasetError> {
    let bytes = fs::read(path)?;
    let mut pos = 0usize;

    let count_bytes = take(&bytes, &mut pos, 4, 0)?;
    let count = u32::from_le_bytes(count_bytes.try_into().expect("4-byte slice")) as usize;

    let mut samples = Vec::with_capacity(count);
    for index in 0..count {
        let len_bytes = take(&bytes, &mut pos, 4, index)?;
        let len = u32::from_le_bytes(len_bytes.try_into().expect("4-byte slice")) as usize;

        let feat_bytes = take(&bytes, &mut pos, len * 4, index)?;
        let features = feat_bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes(b.try_into().expect("4-byte chunk")))
            .collect();

        let outcome_bytes = take(&bytes, &mut pos, 4, index)?;
        let outcome = f32::from_le_bytes(outcome_bytes.try_into().expect("4-byte slice"));

        samples.push(Sample { features, outcome });
    }

    Ok(samples)
}

fn take<'a>(
    bytes: &'a [u8],
    pos: &mut usize,
    n: usize,
    index: usize,
) -> Result<&'a [u8], DatasetError> {
    let chunk = bytes
        .get(*pos..*pos + n)
        .ok_or(DatasetError::Truncated { index })?;
    *pos += n;
    Ok(chunk)
}
