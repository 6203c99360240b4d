//! Per-channel pipelines
//!
//! One channel carries the QMF tree, the four subband processors, the
//! pseudo-random dither generator seeded from its own codeword history, and
//! the codeword packing for both bit-width modes. The dither generator runs
//! from quantized data only, so the decoder reproduces the encoder's dither
//! stream without any side information.

use crate::fixedpoint::{clip_intp2, sign_extend};
use crate::tables::Tables;
use crate::types::{Channel, Mode, NB_SUBBANDS};

impl Channel {
    /// Fold the low-order bits of the previous block's quantized samples
    /// into the rolling codeword history.
    fn update_codeword_history(&mut self) {
        let cw = (self.quantize[0].quantized_sample & 3)
            + ((self.quantize[1].quantized_sample & 2) << 1)
            + ((self.quantize[2].quantized_sample & 1) << 3);
        self.codeword_history = (cw << 8).wrapping_add(
            ((self.codeword_history as u32) << 4) as i32,
        );
    }

    /// Derive the four subband dither values and the dither parity bit for
    /// the next block from the codeword history.
    pub fn generate_dither(&mut self) {
        self.update_codeword_history();

        let m = 5184443i64 * (self.codeword_history >> 7) as i64;
        let d = (m * 4 + (m >> 22)) as i32;
        for subband in 0..NB_SUBBANDS {
            self.dither[subband] = ((d as u32) << (23 - 5 * subband)) as i32;
        }
        self.dither_parity = (d >> 25) & 1;
    }

    /// Parity over the dither bit and all four quantized samples.
    pub fn quantized_parity(&self) -> i32 {
        let mut parity = self.dither_parity;
        for quantize in &self.quantize {
            parity ^= quantize.quantized_sample;
        }
        parity & 1
    }

    /// Analyze and quantize 4 PCM samples.
    pub fn encode(&mut self, samples: &[i32; 4], mode: Mode) {
        let mut subband_samples = [0i32; NB_SUBBANDS];

        self.qmf.tree_analysis(samples, &mut subband_samples);
        self.generate_dither();

        for (subband, &sample) in subband_samples.iter().enumerate() {
            let diff = clip_intp2(sample - self.prediction[subband].predicted_sample, 23);
            self.quantize[subband].quantize_difference(
                diff,
                self.dither[subband],
                self.invert_quantize[subband].quantization_factor,
                Tables::for_subband(mode, subband),
            );
        }
    }

    /// Synthesize 4 PCM samples from the reconstructed subband state.
    pub fn decode(&mut self, samples: &mut [i32; 4]) {
        let mut subband_samples = [0i32; NB_SUBBANDS];

        for (subband, out) in subband_samples.iter_mut().enumerate() {
            *out = self.prediction[subband].previous_reconstructed_sample;
        }
        self.qmf.tree_synthesis(&subband_samples, samples);
    }

    /// Run the inverse quantizer and predictor over every subband. Both the
    /// encoder and the decoder call this with the same quantized samples,
    /// keeping their adaptive state bit-identical.
    pub fn invert_quantize_and_prediction(&mut self, mode: Mode) {
        for subband in 0..NB_SUBBANDS {
            let (iq, pred) = (
                &mut self.invert_quantize[subband],
                &mut self.prediction[subband],
            );
            iq.process_subband(
                pred,
                self.quantize[subband].quantized_sample,
                self.dither[subband],
                Tables::for_subband(mode, subband),
            );
        }
    }

    /// Pack the quantized samples into a 16-bit codeword (7/4/2/3-bit
    /// fields), the parity replacing the low bit of the last field.
    pub fn pack_codeword(&self) -> u16 {
        let parity = self.quantized_parity();
        ((((self.quantize[3].quantized_sample & 0x06) | parity) << 13)
            | ((self.quantize[2].quantized_sample & 0x03) << 11)
            | ((self.quantize[1].quantized_sample & 0x0F) << 7)
            | (self.quantize[0].quantized_sample & 0x7F)) as u16
    }

    /// Pack the quantized samples into a 24-bit HD codeword (9/6/4/5-bit
    /// fields), same parity placement.
    pub fn pack_codeword_hd(&self) -> u32 {
        let parity = self.quantized_parity();
        ((((self.quantize[3].quantized_sample & 0x1E) | parity) << 19)
            | ((self.quantize[2].quantized_sample & 0x0F) << 15)
            | ((self.quantize[1].quantized_sample & 0x3F) << 9)
            | (self.quantize[0].quantized_sample & 0x1FF)) as u32
    }

    /// Unpack a 16-bit codeword, sign-extending each field and overwriting
    /// the last field's low bit with the recomputed parity.
    pub fn unpack_codeword(&mut self, codeword: u16) {
        self.quantize[0].quantized_sample = sign_extend(codeword as i32, 7);
        self.quantize[1].quantized_sample = sign_extend((codeword >> 7) as i32, 4);
        self.quantize[2].quantized_sample = sign_extend((codeword >> 11) as i32, 2);
        self.quantize[3].quantized_sample = sign_extend((codeword >> 13) as i32, 3);
        self.quantize[3].quantized_sample =
            (self.quantize[3].quantized_sample & !1) | self.quantized_parity();
    }

    /// Unpack a 24-bit HD codeword.
    pub fn unpack_codeword_hd(&mut self, codeword: u32) {
        self.quantize[0].quantized_sample = sign_extend(codeword as i32, 9);
        self.quantize[1].quantized_sample = sign_extend((codeword >> 9) as i32, 6);
        self.quantize[2].quantized_sample = sign_extend((codeword >> 15) as i32, 4);
        self.quantize[3].quantized_sample = sign_extend((codeword >> 19) as i32, 5);
        self.quantize[3].quantized_sample =
            (self.quantize[3].quantized_sample & !1) | self.quantized_parity();
    }
}
