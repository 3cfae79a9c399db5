//! The LZMA probability model.
//!
//! Rust port of the `DECODER_STATE` union in `minilzlib/lzmadec.c` /
//! `lzmadec.h`. The source overlays a structured view and a flat array via a
//! C union; here the structured view *is* the representation, and named
//! sub-slices are obtained by plain field access instead of pointer
//! arithmetic into the flat form.

use crate::lzma::rangedec::{Prob, HALF_PROB};

pub const NUM_STATES: usize = 12;
pub const NUM_POS_BITS: usize = 4; // 1 << LZMA_PB, LZMA_PB fixed at 2
pub const NUM_LITERAL_CODERS: usize = 8; // 1 << LZMA_LC, LZMA_LC fixed at 3
pub const LITERAL_CODER_SIZE: usize = 0x300;
pub const NUM_LEN_TO_POS_STATES: usize = 4;
pub const NUM_FULL_DISTANCES: usize = 128;
pub const END_POS_MODEL_INDEX: usize = 14;
pub const NUM_ALIGN_BITS: usize = 4;
pub const NUM_DIST_SLOTS: usize = 64;

/// `Choice`/`Choice2`/`Low`/`Mid`/`High` sub-tree, shared by the length and
/// rep-length decoders.
pub struct LengthCoder {
    pub choice: Prob,
    pub choice2: Prob,
    pub low: [[Prob; 8]; NUM_POS_BITS],
    pub mid: [[Prob; 8]; NUM_POS_BITS],
    pub high: [Prob; 256],
}

impl LengthCoder {
    fn new() -> Self {
        LengthCoder {
            choice: HALF_PROB,
            choice2: HALF_PROB,
            low: [[HALF_PROB; 8]; NUM_POS_BITS],
            mid: [[HALF_PROB; 8]; NUM_POS_BITS],
            high: [HALF_PROB; 256],
        }
    }

    fn reset(&mut self) {
        *self = LengthCoder::new();
    }
}

pub struct LzmaProbabilities {
    pub is_match: [[Prob; NUM_POS_BITS]; NUM_STATES],
    pub is_rep: [Prob; NUM_STATES],
    pub is_rep_g0: [Prob; NUM_STATES],
    pub is_rep_g1: [Prob; NUM_STATES],
    pub is_rep_g2: [Prob; NUM_STATES],
    pub is_rep0_long: [[Prob; NUM_POS_BITS]; NUM_STATES],
    pub pos_slot: [[Prob; NUM_DIST_SLOTS]; NUM_LEN_TO_POS_STATES],
    pub spec_pos: [Prob; NUM_FULL_DISTANCES - END_POS_MODEL_INDEX + 1],
    pub align: [Prob; 1 << NUM_ALIGN_BITS],
    pub len_coder: LengthCoder,
    pub rep_len_coder: LengthCoder,
    pub literal: [[Prob; LITERAL_CODER_SIZE]; NUM_LITERAL_CODERS],
}

impl LzmaProbabilities {
    /// Allocated on the heap: at ~14 KiB this is too large for a comfortable
    /// stack frame, matching the crate's general avoidance of multi-KiB
    /// stack arrays.
    pub fn new() -> Box<Self> {
        Box::new(LzmaProbabilities {
            is_match: [[HALF_PROB; NUM_POS_BITS]; NUM_STATES],
            is_rep: [HALF_PROB; NUM_STATES],
            is_rep_g0: [HALF_PROB; NUM_STATES],
            is_rep_g1: [HALF_PROB; NUM_STATES],
            is_rep_g2: [HALF_PROB; NUM_STATES],
            is_rep0_long: [[HALF_PROB; NUM_POS_BITS]; NUM_STATES],
            pos_slot: [[HALF_PROB; NUM_DIST_SLOTS]; NUM_LEN_TO_POS_STATES],
            spec_pos: [HALF_PROB; NUM_FULL_DISTANCES - END_POS_MODEL_INDEX + 1],
            align: [HALF_PROB; 1 << NUM_ALIGN_BITS],
            len_coder: LengthCoder::new(),
            rep_len_coder: LengthCoder::new(),
            literal: [[HALF_PROB; LITERAL_CODER_SIZE]; NUM_LITERAL_CODERS],
        })
    }

    /// Resets every probability to the midpoint, as required by an LZMA2
    /// `Simple` or `Full` reset.
    pub fn reset(&mut self) {
        for row in self.is_match.iter_mut() {
            row.fill(HALF_PROB);
        }
        self.is_rep.fill(HALF_PROB);
        self.is_rep_g0.fill(HALF_PROB);
        self.is_rep_g1.fill(HALF_PROB);
        self.is_rep_g2.fill(HALF_PROB);
        for row in self.is_rep0_long.iter_mut() {
            row.fill(HALF_PROB);
        }
        for row in self.pos_slot.iter_mut() {
            row.fill(HALF_PROB);
        }
        self.spec_pos.fill(HALF_PROB);
        self.align.fill(HALF_PROB);
        self.len_coder.reset();
        self.rep_len_coder.reset();
        for coder in self.literal.iter_mut() {
            coder.fill(HALF_PROB);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_slot_count_matches_layout_formula() {
        let non_literal = NUM_STATES * NUM_POS_BITS // is_match
            + NUM_STATES * 3 // is_rep, is_rep_g1, is_rep_g2
            + NUM_STATES // is_rep_g0
            + NUM_STATES * NUM_POS_BITS // is_rep0_long
            + NUM_LEN_TO_POS_STATES * NUM_DIST_SLOTS // pos_slot
            + (NUM_FULL_DISTANCES - END_POS_MODEL_INDEX + 1) // spec_pos
            + (1 << NUM_ALIGN_BITS) // align
            + 2 * (2 + NUM_POS_BITS * 8 + NUM_POS_BITS * 8 + 256); // len_coder + rep_len_coder
        let literal = NUM_LITERAL_CODERS * LITERAL_CODER_SIZE;
        assert_eq!(non_literal, 1175);
        assert_eq!(literal, 6144);
        assert_eq!(non_literal + literal, 7319);
    }

    #[test]
    fn fresh_probabilities_start_at_midpoint() {
        let probs = LzmaProbabilities::new();
        assert_eq!(probs.is_rep[0], HALF_PROB);
        assert_eq!(probs.literal[0][0], HALF_PROB);
    }
}
