use std::collections::HashMap;

use crate::decode::PixelSource;
use crate::error::DecodeError;
use crate::quantize::{ColorBucket, quantize_srgb};

/// Occurrence counts per bucket, kept in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Histogram {
    entries: Vec<(ColorBucket, u64)>,
    index: HashMap<ColorBucket, usize>,
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, bucket: ColorBucket) {
        match self.index.get(&bucket) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(bucket, self.entries.len());
                self.entries.push((bucket, 1));
            }
        }
    }

    pub fn get(&self, bucket: &ColorBucket) -> Option<u64> {
        self.index.get(bucket).map(|&i| self.entries[i].1)
    }

    pub fn entries(&self) -> &[(ColorBucket, u64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of samples taken.
    pub fn samples(&self) -> u64 {
        self.entries.iter().map(|(_, n)| n).sum()
    }
}

/// Walk the sampling grid and count quantized colors.
///
/// The outer loop runs over columns and the inner loop over rows, so buckets
/// are inserted column by column. That order decides ties later on.
pub fn count<P: PixelSource + ?Sized>(
    pixels: &P,
    precision: u32,
) -> Result<Histogram, DecodeError> {
    let step = precision.max(1) as usize;
    let (width, height) = pixels.dimensions();
    let mut histogram = Histogram::new();

    for x in (0..width).step_by(step) {
        for y in (0..height).step_by(step) {
            let color = pixels.pixel(x, y)?;
            histogram.record(quantize_srgb(color));
        }
    }

    tracing::debug!(
        width,
        height,
        precision = step,
        samples = histogram.samples(),
        buckets = histogram.len(),
        "Counted colors"
    );
    Ok(histogram)
}
