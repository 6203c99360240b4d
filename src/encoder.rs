//! Encoding pipelines
//!
//! A block is 4 PCM samples per channel. Encoding quantizes both channels,
//! embeds the sync parity, then re-runs the inverse quantizer and predictor
//! on its own output so the encoder state tracks what the decoder will
//! compute, and finally packs one codeword per channel. The bulk entry
//! point consumes packed 24-bit little-endian PCM triples; `encode_finish`
//! drains the filter-bank latency with zero-input blocks.

use log::debug;

use crate::error::{CodecError, CodecResult};
use crate::sync::insert_sync;
use crate::types::{CodecContext, Mode, NB_CHANNELS};

impl CodecContext {
    /// Encode one 4-sample stereo block into `output` (4 or 6 bytes).
    pub(crate) fn encode_samples(&mut self, samples: &[[i32; 4]; NB_CHANNELS], output: &mut [u8]) {
        let mode = self.mode();
        for (channel, samples) in self.channels.iter_mut().zip(samples.iter()) {
            channel.encode(samples, mode);
        }

        insert_sync(&mut self.channels, &mut self.sync_idx);

        for (idx, channel) in self.channels.iter_mut().enumerate() {
            channel.invert_quantize_and_prediction(mode);
            match mode {
                Mode::Hd => {
                    let codeword = channel.pack_codeword_hd();
                    output[3 * idx] = (codeword >> 16) as u8;
                    output[3 * idx + 1] = (codeword >> 8) as u8;
                    output[3 * idx + 2] = codeword as u8;
                }
                Mode::Standard => {
                    let codeword = channel.pack_codeword();
                    output[2 * idx] = (codeword >> 8) as u8;
                    output[2 * idx + 1] = codeword as u8;
                }
            }
        }
    }

    /// Encode one block of 4 stereo samples (24-bit signed, sample-major)
    /// and return the number of bytes written.
    pub fn encode_block(
        &mut self,
        pcm: &[[i32; NB_CHANNELS]; 4],
        output: &mut [u8],
    ) -> CodecResult<usize> {
        let sample_size = self.mode().sample_size();
        if output.len() < sample_size {
            return Err(CodecError::OutputTooSmall {
                needed: sample_size,
                available: output.len(),
            });
        }

        let mut samples = [[0i32; 4]; NB_CHANNELS];
        for (sample, frame) in pcm.iter().enumerate() {
            for (channel, &value) in frame.iter().enumerate() {
                samples[channel][sample] = value;
            }
        }
        self.encode_samples(&samples, output);
        Ok(sample_size)
    }

    /// Encode a buffer of packed 24-bit little-endian PCM triples
    /// (interleaved stereo). Stops at the last whole block that fits both
    /// budgets; stores the bytes written through `written` and returns the
    /// bytes consumed.
    pub fn encode(&mut self, input: &[u8], output: &mut [u8], written: &mut usize) -> usize {
        let sample_size = self.mode().sample_size();
        let mut ipos = 0;
        let mut opos = 0;

        while ipos + 3 * NB_CHANNELS * 4 <= input.len() && opos + sample_size <= output.len() {
            let mut samples = [[0i32; 4]; NB_CHANNELS];
            for sample in 0..4 {
                for frame in samples.iter_mut() {
                    // The third byte carries the sign of the 24-bit value.
                    frame[sample] = input[ipos] as i32
                        | (input[ipos + 1] as i32) << 8
                        | (input[ipos + 2] as i8 as i32) << 16;
                    ipos += 3;
                }
            }
            self.encode_samples(&samples, &mut output[opos..]);
            opos += sample_size;
        }

        *written = opos;
        ipos
    }

    /// Flush the encoder's pipeline latency with zero-input blocks.
    ///
    /// Call repeatedly until it returns `true`; each call writes as many of
    /// the remaining flush blocks as fit in `output`. Once drained the
    /// session is fully reset.
    pub fn encode_finish(&mut self, output: &mut [u8], written: &mut usize) -> bool {
        let sample_size = self.mode().sample_size();
        let mut opos = 0;

        if self.encode_remaining == 0 {
            *written = 0;
            return true;
        }

        let samples = [[0i32; 4]; NB_CHANNELS];
        while self.encode_remaining > 0 && opos + sample_size <= output.len() {
            self.encode_samples(&samples, &mut output[opos..]);
            self.encode_remaining -= 1;
            opos += sample_size;
        }

        *written = opos;

        if self.encode_remaining > 0 {
            return false;
        }

        debug!("encoder latency flushed, resetting session");
        self.reset();
        true
    }
}
