//! Quantization and inverse quantization
//!
//! The forward path searches the step-scaled interval table for each
//! subband difference, applies a dither-derived correction to the interval
//! midpoint and keeps both the chosen index and the adjacent index that
//! would flip the codeword parity, together with the quantization error the
//! swap would cost. The inverse path reconstructs the difference and drives
//! the adaptive step size; it runs identically on the encode and decode
//! sides, which is what keeps the two in lockstep.

use crate::fixedpoint::{clip, clip_intp2, diffsign, rshift32, rshift32_clip24, rshift64, rshift64_clip24};
use crate::tables::{Tables, QUANTIZATION_FACTORS};
use crate::types::{InvertQuantize, Prediction, Quantize};

/// Find the quantization index bracketing `value` in the step-scaled
/// interval table. The table is pre-sorted, so the search halves the
/// remaining range each iteration.
#[inline]
pub fn bin_search(value: i32, factor: i32, intervals: &[i32]) -> i32 {
    let mut idx: usize = 0;
    let mut i = intervals.len() >> 1;

    while i > 0 {
        if factor as i64 * intervals[idx + i] as i64 <= (value as i64) << 24 {
            idx += i;
        }
        i >>= 1;
    }

    idx as i32
}

impl Quantize {
    /// Quantize one subband difference against the current step size.
    pub fn quantize_difference(
        &mut self,
        sample_difference: i32,
        dither: i32,
        quantization_factor: i32,
        tables: &Tables,
    ) {
        let intervals = tables.quantize_intervals;

        let mut sample_difference_abs = sample_difference;
        if sample_difference_abs < 0 {
            sample_difference_abs = -sample_difference_abs;
        }
        if sample_difference_abs > (1 << 23) - 1 {
            sample_difference_abs = (1 << 23) - 1;
        }

        let mut quantized_sample = bin_search(
            sample_difference_abs >> 4,
            quantization_factor,
            intervals,
        );

        let idx = quantized_sample as usize;
        let d = rshift32_clip24(((dither as i64 * dither as i64) >> 32) as i32, 7) - (1 << 23);
        let d = rshift64(
            d as i64 * tables.quantize_dither_factors[idx] as i64,
            23,
        ) as i32;

        let mean = (intervals[idx + 1] + intervals[idx]) / 2;
        let interval = (intervals[idx + 1] - intervals[idx])
            * (-((sample_difference < 0) as i32) | 1);

        let dithered_sample = rshift64_clip24(
            dither as i64 * interval as i64 + ((clip_intp2(mean + d, 23) as i64) << 32),
            32,
        );
        let error = ((sample_difference_abs as i64) << 20)
            - dithered_sample as i64 * quantization_factor as i64;
        self.error = rshift64(error, 23) as i32;
        if self.error < 0 {
            self.error = -self.error;
        }

        let mut parity_change = quantized_sample;
        if error < 0 {
            quantized_sample -= 1;
        } else {
            parity_change -= 1;
        }

        let inv = -((sample_difference < 0) as i32);
        self.quantized_sample = quantized_sample ^ inv;
        self.quantized_sample_parity_change = parity_change ^ inv;
    }
}

impl InvertQuantize {
    /// Reconstruct a difference from a quantized sample and update the
    /// adaptive step size.
    pub fn invert_quantization(&mut self, quantized_sample: i32, dither: i32, tables: &Tables) {
        let idx = ((quantized_sample ^ -((quantized_sample < 0) as i32)) + 1) as usize;
        let mut qr = tables.quantize_intervals[idx] / 2;
        if quantized_sample < 0 {
            qr = -qr;
        }

        let qr = rshift64_clip24(
            ((qr as i64) << 32)
                + dither as i64 * tables.invert_quantize_dither_factors[idx] as i64,
            32,
        );
        self.reconstructed_difference =
            ((self.quantization_factor as i64 * qr as i64) >> 19) as i32;

        // Decay factor_select toward zero and blend in the table offset for
        // the decoded level.
        let factor_select = 32620 * self.factor_select;
        let factor_select = rshift32(
            factor_select + tables.quantize_factor_select_offset[idx] as i32 * (1 << 15),
            15,
        );
        self.factor_select = clip(factor_select, 0, tables.factor_max);

        // Derive the next quantization step from the log table.
        let idx = ((self.factor_select & 0xFF) >> 3) as usize;
        let shift = (tables.factor_max - self.factor_select) >> 8;
        self.quantization_factor = ((QUANTIZATION_FACTORS[idx] as i32) << 11) >> shift;
    }

    /// Inverse-quantize one subband sample and run the predictor update,
    /// including the sign-correlation adaptation of the two pole weights.
    pub fn process_subband(
        &mut self,
        prediction: &mut Prediction,
        quantized_sample: i32,
        dither: i32,
        tables: &Tables,
    ) {
        self.invert_quantization(quantized_sample, dither, tables);

        let sign = diffsign(
            self.reconstructed_difference,
            -prediction.predicted_difference,
        );
        let same_sign = [sign * prediction.prev_sign[0], sign * prediction.prev_sign[1]];
        prediction.prev_sign[0] = prediction.prev_sign[1];
        prediction.prev_sign[1] = sign | 1;

        let mut range = 0x100000;
        let sw1 = rshift32(-same_sign[1] * prediction.s_weight[1], 1);
        let sw1 = (clip(sw1, -range, range) & !0xF) * 16;

        range = 0x300000;
        let weight0 = 254 * prediction.s_weight[0] + 0x800000 * same_sign[0] + sw1;
        prediction.s_weight[0] = clip(rshift32(weight0, 8), -range, range);

        range = 0x3C0000 - prediction.s_weight[0];
        let weight1 = 255 * prediction.s_weight[1] + 0xC00000 * same_sign[1];
        prediction.s_weight[1] = clip(rshift32(weight1, 8), -range, range);

        prediction.filtering(self.reconstructed_difference, tables.prediction_order);
    }
}
