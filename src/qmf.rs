//! QMF filter bank
//!
//! Two-level polyphase quadrature mirror filter tree splitting 4 PCM
//! samples into 4 subband samples and back. The outer pair handles the
//! first 4-to-2 split, two inner pairs handle the second split per branch.
//! Analysis convolves at shift 23 on both levels; synthesis uses 22 then 21
//! to compensate the filter gain. Those shifts are fixed constants of the
//! format.

use crate::fixedpoint::{clip_intp2, rshift64_clip24};
use crate::tables::{QMF_INNER_COEFFS, QMF_OUTER_COEFFS};
use crate::types::{FilterSignal, QmfAnalysis, FILTER_TAPS, NB_FILTERS, NB_SUBBANDS};

impl FilterSignal {
    /// Append a sample to the history, keeping the offset copy in step.
    #[inline]
    pub fn push(&mut self, sample: i32) {
        self.buffer[self.pos as usize] = sample;
        self.buffer[self.pos as usize + FILTER_TAPS] = sample;
        self.pos = (self.pos + 1) & (FILTER_TAPS as u8 - 1);
    }

    /// 16-tap dot product against `coeffs`, rounded and clipped into the
    /// 24-bit domain.
    #[inline]
    pub fn convolve(&self, coeffs: &[i32; FILTER_TAPS], shift: u32) -> i32 {
        let sig = &self.buffer[self.pos as usize..self.pos as usize + FILTER_TAPS];
        let mut e: i64 = 0;
        for i in 0..FILTER_TAPS {
            e += sig[i] as i64 * coeffs[i] as i64;
        }
        rshift64_clip24(e, shift)
    }
}

/// Split 2 samples into a low and a high subband sample.
fn polyphase_analysis(
    signal: &mut [FilterSignal; NB_FILTERS],
    coeffs: &[[i32; FILTER_TAPS]; NB_FILTERS],
    shift: u32,
    samples: &[i32; NB_FILTERS],
) -> (i32, i32) {
    let mut subbands = [0i32; NB_FILTERS];

    for i in 0..NB_FILTERS {
        signal[i].push(samples[NB_FILTERS - 1 - i]);
        subbands[i] = signal[i].convolve(&coeffs[i], shift);
    }

    let low = clip_intp2(subbands[0] + subbands[1], 23);
    let high = clip_intp2(subbands[0] - subbands[1], 23);
    (low, high)
}

/// Join a low and a high subband sample back into 2 samples.
fn polyphase_synthesis(
    signal: &mut [FilterSignal; NB_FILTERS],
    coeffs: &[[i32; FILTER_TAPS]; NB_FILTERS],
    shift: u32,
    low_subband_input: i32,
    high_subband_input: i32,
    samples: &mut [i32],
) {
    let subbands = [
        low_subband_input + high_subband_input,
        low_subband_input - high_subband_input,
    ];

    for i in 0..NB_FILTERS {
        signal[i].push(subbands[1 - i]);
        samples[i] = signal[i].convolve(&coeffs[i], shift);
    }
}

impl QmfAnalysis {
    /// Split 4 PCM samples into 4 subband samples.
    pub fn tree_analysis(
        &mut self,
        samples: &[i32; NB_SUBBANDS],
        subband_samples: &mut [i32; NB_SUBBANDS],
    ) {
        let mut intermediate = [0i32; NB_SUBBANDS];

        // First split: 4 samples into 2 intermediate subbands, downsampled
        // to 2 samples each.
        for i in 0..2 {
            let pair = [samples[2 * i], samples[2 * i + 1]];
            let (low, high) = polyphase_analysis(
                &mut self.outer_filter_signal,
                &QMF_OUTER_COEFFS,
                23,
                &pair,
            );
            intermediate[i] = low;
            intermediate[2 + i] = high;
        }

        // Second split: each intermediate pair into its final subbands.
        for i in 0..2 {
            let pair = [intermediate[2 * i], intermediate[2 * i + 1]];
            let (low, high) = polyphase_analysis(
                &mut self.inner_filter_signal[i],
                &QMF_INNER_COEFFS,
                23,
                &pair,
            );
            subband_samples[2 * i] = low;
            subband_samples[2 * i + 1] = high;
        }
    }

    /// Join 4 subband samples back into 4 PCM samples.
    pub fn tree_synthesis(
        &mut self,
        subband_samples: &[i32; NB_SUBBANDS],
        samples: &mut [i32; NB_SUBBANDS],
    ) {
        let mut intermediate = [0i32; NB_SUBBANDS];

        // Join 4 subbands into 2 intermediate subbands, upsampled to 2
        // samples each.
        for i in 0..2 {
            polyphase_synthesis(
                &mut self.inner_filter_signal[i],
                &QMF_INNER_COEFFS,
                22,
                subband_samples[2 * i],
                subband_samples[2 * i + 1],
                &mut intermediate[2 * i..],
            );
        }

        // Join the 2 intermediate subbands, upsampled to 4 samples.
        for i in 0..2 {
            polyphase_synthesis(
                &mut self.outer_filter_signal,
                &QMF_OUTER_COEFFS,
                21,
                intermediate[i],
                intermediate[2 + i],
                &mut samples[2 * i..],
            );
        }
    }
}
