//! Type definitions for the codec
//!
//! All per-session state lives in the structs defined here. One
//! [`CodecContext`] owns everything for one stereo stream: two channels,
//! each with a QMF analysis tree and four subband processors. There is no
//! global state; independent sessions never interact.

/// Number of audio channels per session (stereo only).
pub const NB_CHANNELS: usize = 2;
/// Number of frequency subbands produced by the QMF tree.
pub const NB_SUBBANDS: usize = 4;
/// Polyphase branches per QMF split.
pub const NB_FILTERS: usize = 2;
/// Taps per QMF filter.
pub const FILTER_TAPS: usize = 16;
/// Group delay of the two-level filter bank, in PCM samples per channel.
pub const LATENCY_SAMPLES: usize = 90;
/// Encoded blocks covering the filter-bank latency (warm-up and flush).
pub const LATENCY_BLOCKS: usize = (LATENCY_SAMPLES + 3) / 4;

pub const LEFT: usize = 0;
pub const RIGHT: usize = 1;

/// Bit-width variant, fixed for the session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// 16-bit codeword per channel per block, 4 encoded bytes per block.
    Standard,
    /// 24-bit codeword per channel per block, 6 encoded bytes per block.
    Hd,
}

impl Mode {
    /// Encoded bytes per 4-sample stereo block.
    #[inline]
    pub fn sample_size(self) -> usize {
        match self {
            Mode::Standard => 4,
            Mode::Hd => 6,
        }
    }

    /// Index into the constant table bank.
    #[inline]
    pub(crate) fn table_bank(self) -> usize {
        match self {
            Mode::Standard => 0,
            Mode::Hd => 1,
        }
    }
}

/// 16-tap circular signal history for one QMF filter.
///
/// The last 16 samples are stored twice, 16 apart, so the convolution can
/// always read a contiguous 16-element window starting at `pos` without
/// wraparound logic.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilterSignal {
    pub buffer: [i32; 2 * FILTER_TAPS],
    pub pos: u8,
}

/// Filter state for one channel's two-level QMF tree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QmfAnalysis {
    pub outer_filter_signal: [FilterSignal; NB_FILTERS],
    pub inner_filter_signal: [[FilterSignal; NB_FILTERS]; NB_FILTERS],
}

/// Encode-side quantizer output for one subband sample.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Quantize {
    pub quantized_sample: i32,
    /// Adjacent index flipping the sample's parity at the recorded error.
    pub quantized_sample_parity_change: i32,
    pub error: i32,
}

/// Adaptive step-size state shared by the encode and decode paths.
///
/// The encoder re-runs the inverse quantizer on its own output so that this
/// state evolves identically on both sides of the wire.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InvertQuantize {
    pub quantization_factor: i32,
    pub factor_select: i32,
    pub reconstructed_difference: i32,
}

/// Adaptive predictor state for one subband.
///
/// `reconstructed_differences` is another double-length ring: the order-sized
/// window of past differences is readable contiguously ending at
/// `order + pos`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub prev_sign: [i32; 2],
    pub s_weight: [i32; 2],
    pub d_weight: [i32; 24],
    pub pos: i32,
    pub reconstructed_differences: [i32; 48],
    pub previous_reconstructed_sample: i32,
    pub predicted_difference: i32,
    pub predicted_sample: i32,
}

impl Default for Prediction {
    fn default() -> Self {
        Self {
            prev_sign: [1, 1],
            s_weight: [0; 2],
            d_weight: [0; 24],
            pos: 0,
            reconstructed_differences: [0; 48],
            previous_reconstructed_sample: 0,
            predicted_difference: 0,
            predicted_sample: 0,
        }
    }
}

/// Complete per-channel state.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Channel {
    pub codeword_history: i32,
    pub dither_parity: i32,
    pub dither: [i32; NB_SUBBANDS],
    pub qmf: QmfAnalysis,
    pub quantize: [Quantize; NB_SUBBANDS],
    pub invert_quantize: [InvertQuantize; NB_SUBBANDS],
    pub prediction: [Prediction; NB_SUBBANDS],
}

/// One codec session: a stereo channel pair plus streaming bookkeeping.
#[derive(Debug, Clone)]
pub struct CodecContext {
    pub channels: [Channel; NB_CHANNELS],
    mode: Mode,
    pub sync_idx: u8,
    /// Zero-input blocks still to flush before the encoder pipeline drains.
    pub encode_remaining: u8,
    /// Warm-up blocks still to discard on the decode side.
    pub decode_skip_leading: u8,
    /// Clean blocks seen since the current resync episode started.
    pub decode_sync_packets: usize,
    /// Bytes consumed but not emitted during the current resync episode.
    pub decode_dropped: usize,
    pub decode_sync_buffer: [u8; 6],
    pub decode_sync_buffer_len: u8,
}

impl CodecContext {
    /// Create a session for the given bit-width mode.
    pub fn new(mode: Mode) -> Self {
        Self {
            channels: Default::default(),
            mode,
            sync_idx: 0,
            encode_remaining: LATENCY_BLOCKS as u8,
            decode_skip_leading: LATENCY_BLOCKS as u8,
            decode_sync_packets: 0,
            decode_dropped: 0,
            decode_sync_buffer: [0; 6],
            decode_sync_buffer_len: 0,
        }
    }

    /// The session's bit-width mode.
    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Full reset: zero all per-sample state, keep the mode flag, re-arm
    /// the warm-up and flush counters.
    pub fn reset(&mut self) {
        *self = Self::new(self.mode);
    }
}
