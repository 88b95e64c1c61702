//! TIFF predictors
//!
//! Predictors transform chunk rows before compression so that smooth
//! rasters compress better. Decoding reverses them after decompression.
//! All functions work on whole rows of `width * samples_per_pixel`
//! samples; a trailing partial row is left untouched.

use byteorder::{BigEndian, ByteOrder as Endianness, LittleEndian};

use crate::io::byte_order::ByteOrder;
use crate::tiff::constants::predictor;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::types::SampleKind;

/// Reverses the predictor recorded in the Predictor tag
pub fn undo(code: u16, data: &mut [u8], width: usize, samples_per_pixel: usize,
            kind: SampleKind, order: ByteOrder) -> TiffResult<()> {
    match code {
        predictor::NONE => Ok(()),
        predictor::HORIZONTAL_DIFFERENCING if !kind.is_float() => {
            undo_horizontal(data, width, samples_per_pixel, kind.size(), order);
            Ok(())
        }
        predictor::FLOATING_POINT if kind.is_float() => {
            undo_floating_point(data, width, samples_per_pixel, kind.size(), order);
            Ok(())
        }
        _ => Err(TiffError::Generic(format!(
            "Predictor {} is not supported for {} samples", code, kind
        ))),
    }
}

/// Applies the predictor before compression; the inverse of [`undo`]
pub fn apply(code: u16, data: &mut [u8], width: usize, samples_per_pixel: usize,
             kind: SampleKind, order: ByteOrder) -> TiffResult<()> {
    match code {
        predictor::NONE => Ok(()),
        predictor::HORIZONTAL_DIFFERENCING if !kind.is_float() => {
            apply_horizontal(data, width, samples_per_pixel, kind.size(), order);
            Ok(())
        }
        predictor::FLOATING_POINT if kind.is_float() => {
            apply_floating_point(data, width, samples_per_pixel, kind.size(), order);
            Ok(())
        }
        _ => Err(TiffError::Generic(format!(
            "Predictor {} is not supported for {} samples", code, kind
        ))),
    }
}

fn read_uint(bytes: &[u8], order: ByteOrder) -> u64 {
    match order {
        ByteOrder::LittleEndian => LittleEndian::read_uint(bytes, bytes.len()),
        ByteOrder::BigEndian => BigEndian::read_uint(bytes, bytes.len()),
    }
}

fn write_uint(value: u64, bytes: &mut [u8], order: ByteOrder) {
    let size = bytes.len();
    let value = if size < 8 { value & ((1u64 << (8 * size)) - 1) } else { value };
    match order {
        ByteOrder::LittleEndian => LittleEndian::write_uint(bytes, value, size),
        ByteOrder::BigEndian => BigEndian::write_uint(bytes, value, size),
    }
}

/// Horizontal differencing: each sample stores the difference to the same
/// component of the previous pixel, with wrapping integer arithmetic.
pub fn undo_horizontal(data: &mut [u8], width: usize, samples_per_pixel: usize,
                       sample_size: usize, order: ByteOrder) {
    let stride = samples_per_pixel * sample_size;
    let row_bytes = width * stride;
    if row_bytes == 0 {
        return;
    }

    for row in data.chunks_exact_mut(row_bytes) {
        for i in (stride..row.len()).step_by(sample_size) {
            let previous = read_uint(&row[i - stride..i - stride + sample_size], order);
            let current = read_uint(&row[i..i + sample_size], order);
            write_uint(current.wrapping_add(previous), &mut row[i..i + sample_size], order);
        }
    }
}

pub fn apply_horizontal(data: &mut [u8], width: usize, samples_per_pixel: usize,
                        sample_size: usize, order: ByteOrder) {
    let stride = samples_per_pixel * sample_size;
    let row_bytes = width * stride;
    if row_bytes == 0 {
        return;
    }

    for row in data.chunks_exact_mut(row_bytes) {
        for i in (stride..row.len()).step_by(sample_size).rev() {
            let previous = read_uint(&row[i - stride..i - stride + sample_size], order);
            let current = read_uint(&row[i..i + sample_size], order);
            write_uint(current.wrapping_sub(previous), &mut row[i..i + sample_size], order);
        }
    }
}

/// Byte plane holding byte `byte` of a sample laid out in `order`.
/// Planes are always most-significant first.
fn plane_of(byte: usize, sample_size: usize, order: ByteOrder) -> usize {
    match order {
        ByteOrder::BigEndian => byte,
        ByteOrder::LittleEndian => sample_size - 1 - byte,
    }
}

/// Floating point predictor: the row's sample bytes are split into byte
/// planes and the planes are byte-wise differenced.
pub fn undo_floating_point(data: &mut [u8], width: usize, samples_per_pixel: usize,
                           sample_size: usize, order: ByteOrder) {
    let row_bytes = width * samples_per_pixel * sample_size;
    if row_bytes == 0 {
        return;
    }
    let words = width * samples_per_pixel;

    for row in data.chunks_exact_mut(row_bytes) {
        for i in samples_per_pixel..row.len() {
            row[i] = row[i].wrapping_add(row[i - samples_per_pixel]);
        }

        let planes = row.to_vec();
        for word in 0..words {
            for byte in 0..sample_size {
                let plane = plane_of(byte, sample_size, order);
                row[word * sample_size + byte] = planes[plane * words + word];
            }
        }
    }
}

pub fn apply_floating_point(data: &mut [u8], width: usize, samples_per_pixel: usize,
                            sample_size: usize, order: ByteOrder) {
    let row_bytes = width * samples_per_pixel * sample_size;
    if row_bytes == 0 {
        return;
    }
    let words = width * samples_per_pixel;

    for row in data.chunks_exact_mut(row_bytes) {
        let samples = row.to_vec();
        for word in 0..words {
            for byte in 0..sample_size {
                let plane = plane_of(byte, sample_size, order);
                row[plane * words + word] = samples[word * sample_size + byte];
            }
        }

        for i in (samples_per_pixel..row.len()).rev() {
            row[i] = row[i].wrapping_sub(row[i - samples_per_pixel]);
        }
    }
}
