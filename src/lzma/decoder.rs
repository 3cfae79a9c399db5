//! LZMA sequence decoder: literals, matches, and the four rep-distance forms.
//!
//! Rust port of `minilzlib/lzmadec.c`. Properties are hardcoded to the
//! canonical `{lc=3, lp=0, pb=2}`; any other property byte is rejected.

use crate::dict::HistoryDict;
use crate::error::{BootCodecError, Result};
use crate::input::InputCursor;
use crate::lzma::probabilities::{LzmaProbabilities, NUM_LEN_TO_POS_STATES};
use crate::lzma::rangedec::RangeDecoder;

/// `(pb * 45 + lp * 9 + lc)` for the canonical `{lc=3, lp=0, pb=2}` properties.
pub const SUPPORTED_PROPERTY_BYTE: u8 = 93;

const END_POS_MODEL_INDEX: u32 = 14;
const NUM_ALIGN_BITS: u32 = 4;
const MIN_MATCH_LEN: u32 = 2;

/// LZMA's 12-state sequence machine, tracking the kind of the last couple of
/// decoded packets. Transition rules follow the reference algorithm: a
/// literal always collapses toward state 0; match/rep/shortrep packets each
/// push the state toward their own high-water mark, folding at state 7.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SequenceState(u8);

impl SequenceState {
    pub const INITIAL: SequenceState = SequenceState(0);

    fn is_literal_state(self) -> bool {
        self.0 < 7
    }

    fn after_literal(self) -> Self {
        let s = self.0;
        SequenceState(if s < 4 {
            0
        } else if s < 10 {
            s - 3
        } else {
            s - 6
        })
    }

    fn after_match(self) -> Self {
        SequenceState(if self.0 < 7 { 7 } else { 10 })
    }

    fn after_rep(self) -> Self {
        SequenceState(if self.0 < 7 { 8 } else { 11 })
    }

    fn after_short_rep(self) -> Self {
        SequenceState(if self.0 < 7 { 9 } else { 11 })
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

pub struct LzmaDecoder {
    probs: Box<LzmaProbabilities>,
    state: SequenceState,
    rep: [u32; 4],
}

impl LzmaDecoder {
    pub fn new() -> Self {
        LzmaDecoder {
            probs: LzmaProbabilities::new(),
            state: SequenceState::INITIAL,
            rep: [0; 4],
        }
    }

    /// A `Simple` LZMA2 reset: probabilities and state reset, recent
    /// distances cleared, property byte left untouched.
    pub fn reset_state(&mut self) {
        self.probs.reset();
        self.state = SequenceState::INITIAL;
        self.rep = [0; 4];
    }

    /// Validates and installs a property byte (`Full`/`Property` reset).
    pub fn set_properties(&mut self, property_byte: u8) -> Result<()> {
        if property_byte != SUPPORTED_PROPERTY_BYTE {
            return Err(BootCodecError::UnsupportedConfiguration(
                "unsupported LZMA properties (only lc=3, lp=0, pb=2 supported)",
            ));
        }
        Ok(())
    }

    fn len_to_dist_state(len: u32) -> usize {
        (len - MIN_MATCH_LEN).min((NUM_LEN_TO_POS_STATES - 1) as u32) as usize
    }

    fn decode_len(
        &mut self,
        rc: &mut RangeDecoder,
        input: &mut InputCursor<'_>,
        is_rep: bool,
        pos_state: usize,
    ) -> Result<u32> {
        let coder = if is_rep {
            &mut self.probs.rep_len_coder
        } else {
            &mut self.probs.len_coder
        };
        if rc.decode_bit(input, &mut coder.choice)? == 0 {
            let sym = rc.decode_bittree(input, &mut coder.low[pos_state], 3)?;
            return Ok(2 + sym);
        }
        if rc.decode_bit(input, &mut coder.choice2)? == 0 {
            let sym = rc.decode_bittree(input, &mut coder.mid[pos_state], 3)?;
            return Ok(10 + sym);
        }
        let sym = rc.decode_bittree(input, &mut coder.high, 8)?;
        Ok(18 + sym)
    }

    fn decode_distance(
        &mut self,
        rc: &mut RangeDecoder,
        input: &mut InputCursor<'_>,
        len: u32,
    ) -> Result<u32> {
        let dist_state = Self::len_to_dist_state(len);
        let slot = rc.decode_bittree(input, &mut self.probs.pos_slot[dist_state], 6)?;
        if slot < 4 {
            return Ok(slot);
        }
        let num_direct_bits = (slot >> 1) - 1;
        let mut dist = (2 | (slot & 1)) << num_direct_bits;
        if slot < END_POS_MODEL_INDEX {
            let base = (dist - slot) as usize;
            dist += rc.decode_reverse_bittree(
                input,
                &mut self.probs.spec_pos[base..],
                num_direct_bits,
            )?;
        } else {
            dist = dist.wrapping_add(rc.decode_direct(input, num_direct_bits - NUM_ALIGN_BITS)? << NUM_ALIGN_BITS);
            dist += rc.decode_reverse_bittree(input, &mut self.probs.align, NUM_ALIGN_BITS)?;
        }
        Ok(dist)
    }

    /// Decodes packets until `dict` reports its current chunk complete.
    pub fn decode(
        &mut self,
        rc: &mut RangeDecoder,
        input: &mut InputCursor<'_>,
        dict: &mut HistoryDict<'_>,
    ) -> Result<()> {
        while dict.can_write() {
            let pos_state = dict.offset() & 3;
            let st = self.state.index();
            if rc.decode_bit(input, &mut self.probs.is_match[st][pos_state])? == 0 {
                // Literal.
                let prev_byte = if dict.offset() == 0 { 0 } else { dict.get(1) };
                let literal_coder_index = (prev_byte >> 5) as usize;
                let coder = &mut self.probs.literal[literal_coder_index];
                let symbol = if self.state.is_literal_state() {
                    rc.decode_bittree(input, coder, 8)? as u8
                } else {
                    let match_byte = dict.get(self.rep[0] as usize + 1);
                    rc.decode_matched_literal(input, coder, match_byte)?
                };
                dict.put(symbol)?;
                self.state = self.state.after_literal();
                continue;
            }
            // Match or rep.
            let len;
            if rc.decode_bit(input, &mut self.probs.is_rep[st])? == 0 {
                // Match: shift the rep distances and decode a fresh one.
                self.rep[3] = self.rep[2];
                self.rep[2] = self.rep[1];
                self.rep[1] = self.rep[0];
                len = self.decode_len(rc, input, false, pos_state)?;
                self.rep[0] = self.decode_distance(rc, input, len)?;
                self.state = self.state.after_match();
            } else if rc.decode_bit(input, &mut self.probs.is_rep_g0[st])? == 0 {
                if rc.decode_bit(input, &mut self.probs.is_rep0_long[st][pos_state])? == 0 {
                    // Short rep: a single byte at the unchanged rep0 distance.
                    self.state = self.state.after_short_rep();
                    dict.repeat(1, self.rep[0] as usize + 1)?;
                    continue;
                }
                len = self.decode_len(rc, input, true, pos_state)?;
                self.state = self.state.after_rep();
            } else {
                let dist;
                if rc.decode_bit(input, &mut self.probs.is_rep_g1[st])? == 0 {
                    dist = self.rep[1];
                    self.rep[1] = self.rep[0];
                } else if rc.decode_bit(input, &mut self.probs.is_rep_g2[st])? == 0 {
                    dist = self.rep[2];
                    self.rep[2] = self.rep[1];
                    self.rep[1] = self.rep[0];
                } else {
                    dist = self.rep[3];
                    self.rep[3] = self.rep[2];
                    self.rep[2] = self.rep[1];
                    self.rep[1] = self.rep[0];
                }
                self.rep[0] = dist;
                len = self.decode_len(rc, input, true, pos_state)?;
                self.state = self.state.after_rep();
            }
            dict.repeat(len as usize, self.rep[0] as usize + 1)?;
        }
        Ok(())
    }
}

impl Default for LzmaDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_properties() {
        let mut dec = LzmaDecoder::new();
        assert!(dec.set_properties(92).is_err());
        assert!(dec.set_properties(93).is_ok());
    }

    #[test]
    fn len_to_dist_state_saturates_at_three() {
        assert_eq!(LzmaDecoder::len_to_dist_state(2), 0);
        assert_eq!(LzmaDecoder::len_to_dist_state(3), 1);
        assert_eq!(LzmaDecoder::len_to_dist_state(10), 3);
        assert_eq!(LzmaDecoder::len_to_dist_state(273), 3);
    }

    #[test]
    fn state_transitions_fold_correctly() {
        let s = SequenceState::INITIAL;
        assert_eq!(s.after_match().index(), 7);
        assert_eq!(s.after_match().after_literal().index(), 4);
    }
}
