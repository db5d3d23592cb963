use super::util::*;
use crate::def::*;

/* number of context models per syntax element */
pub(crate) const NUM_CTX_SPLIT_CU_FLAG: usize = 3;
pub(crate) const NUM_CTX_SKIP_FLAG: usize = 3;
pub(crate) const NUM_CTX_SKIP_IDX: usize = 4;
pub(crate) const NUM_CTX_DIRECT_FLAG: usize = 1;
pub(crate) const NUM_CTX_PRED_MODE: usize = 1;
pub(crate) const NUM_CTX_PART_SIZE: usize = 4;
pub(crate) const NUM_CTX_INTER_DIR: usize = 3;
pub(crate) const NUM_CTX_REF_IDX: usize = 2;
pub(crate) const NUM_CTX_MVD: usize = 2;
pub(crate) const NUM_CTX_INTRA_DIR: usize = 2;
pub(crate) const NUM_CTX_INTRA_DIR_C: usize = 2;
pub(crate) const NUM_CTX_CBF: usize = 4;
pub(crate) const NUM_CTX_TU_SPLIT: usize = 1;
pub(crate) const NUM_CTX_CC_RUN: usize = 4;
pub(crate) const NUM_CTX_CC_LEVEL: usize = 4;
pub(crate) const NUM_CTX_CC_LAST: usize = 2;

const OFF_SPLIT_CU_FLAG: usize = 0;
const OFF_SKIP_FLAG: usize = OFF_SPLIT_CU_FLAG + NUM_CTX_SPLIT_CU_FLAG;
const OFF_SKIP_IDX: usize = OFF_SKIP_FLAG + NUM_CTX_SKIP_FLAG;
const OFF_DIRECT_FLAG: usize = OFF_SKIP_IDX + NUM_CTX_SKIP_IDX;
const OFF_PRED_MODE: usize = OFF_DIRECT_FLAG + NUM_CTX_DIRECT_FLAG;
const OFF_PART_SIZE: usize = OFF_PRED_MODE + NUM_CTX_PRED_MODE;
const OFF_INTER_DIR: usize = OFF_PART_SIZE + NUM_CTX_PART_SIZE;
const OFF_REF_IDX: usize = OFF_INTER_DIR + NUM_CTX_INTER_DIR;
const OFF_MVD: usize = OFF_REF_IDX + NUM_CTX_REF_IDX;
const OFF_INTRA_DIR: usize = OFF_MVD + NUM_CTX_MVD;
const OFF_INTRA_DIR_C: usize = OFF_INTRA_DIR + NUM_CTX_INTRA_DIR;
const OFF_CBF: usize = OFF_INTRA_DIR_C + NUM_CTX_INTRA_DIR_C;
const OFF_TU_SPLIT: usize = OFF_CBF + NUM_CTX_CBF;
const OFF_CC_RUN: usize = OFF_TU_SPLIT + NUM_CTX_TU_SPLIT;
const OFF_CC_LEVEL: usize = OFF_CC_RUN + NUM_CTX_CC_RUN;
const OFF_CC_LAST: usize = OFF_CC_LEVEL + NUM_CTX_CC_LEVEL;
pub(crate) const NUM_SBAC_CTX: usize = OFF_CC_LAST + NUM_CTX_CC_LAST;

/// Context model selector of one bin. The payload is the index inside the
/// element's context set and saturates at the set size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CtxId {
    SplitFlag(u8),
    SkipFlag(u8),
    SkipIdx(u8),
    DirectFlag,
    PredMode,
    PartSize(u8),
    InterDir(u8),
    Refi(u8),
    Mvd(u8),
    IntraDir(u8),
    IntraDirC(u8),
    Cbf(u8),
    TuSplit,
    Run(u8),
    Level(u8),
    Last(u8),
}

impl CtxId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        #[inline]
        fn at(off: usize, num: usize, i: u8) -> usize {
            off + (i as usize).min(num - 1)
        }
        match self {
            CtxId::SplitFlag(i) => at(OFF_SPLIT_CU_FLAG, NUM_CTX_SPLIT_CU_FLAG, i),
            CtxId::SkipFlag(i) => at(OFF_SKIP_FLAG, NUM_CTX_SKIP_FLAG, i),
            CtxId::SkipIdx(i) => at(OFF_SKIP_IDX, NUM_CTX_SKIP_IDX, i),
            CtxId::DirectFlag => OFF_DIRECT_FLAG,
            CtxId::PredMode => OFF_PRED_MODE,
            CtxId::PartSize(i) => at(OFF_PART_SIZE, NUM_CTX_PART_SIZE, i),
            CtxId::InterDir(i) => at(OFF_INTER_DIR, NUM_CTX_INTER_DIR, i),
            CtxId::Refi(i) => at(OFF_REF_IDX, NUM_CTX_REF_IDX, i),
            CtxId::Mvd(i) => at(OFF_MVD, NUM_CTX_MVD, i),
            CtxId::IntraDir(i) => at(OFF_INTRA_DIR, NUM_CTX_INTRA_DIR, i),
            CtxId::IntraDirC(i) => at(OFF_INTRA_DIR_C, NUM_CTX_INTRA_DIR_C, i),
            CtxId::Cbf(i) => at(OFF_CBF, NUM_CTX_CBF, i),
            CtxId::TuSplit => OFF_TU_SPLIT,
            CtxId::Run(i) => at(OFF_CC_RUN, NUM_CTX_CC_RUN, i),
            CtxId::Level(i) => at(OFF_CC_LEVEL, NUM_CTX_CC_LEVEL, i),
            CtxId::Last(i) => at(OFF_CC_LAST, NUM_CTX_CC_LAST, i),
        }
    }
}

/// Bit-cost estimation of binarized syntax.
///
/// `bits()` counts in 1/32768 bit. Cloning must capture the complete adaptive
/// state: the mode decision saves an estimator by cloning it before a trial
/// and restores it by assignment.
pub trait EntropyEstimator: Clone + Send {
    /// Back to the initial probabilities with a zero bit count.
    fn reset(&mut self);

    fn bits(&self) -> u64;

    fn encode_bin(&mut self, bin: u32, ctx: CtxId);

    /// `num_bins` equiprobable bins, most significant first.
    fn encode_bin_ep(&mut self, value: u32, num_bins: u32);

    /* unary code, the first bin on ctx(0), the rest on ctx(1..num_ctx) */
    fn write_unary_sym(&mut self, mut sym: u32, ctx: fn(u8) -> CtxId, num_ctx: u8) {
        let mut ctx_idx = 0;

        self.encode_bin(if sym != 0 { 1 } else { 0 }, ctx(0));

        if sym == 0 {
            return;
        }

        while sym != 0 {
            if ctx_idx < num_ctx - 1 {
                ctx_idx += 1;
            }
            sym -= 1;
            self.encode_bin(if sym != 0 { 1 } else { 0 }, ctx(ctx_idx));
        }
    }

    /* truncated unary code of sym < max_num, one context per bin */
    fn write_truncate_unary_sym(&mut self, sym: u32, ctx: fn(u8) -> CtxId, max_num: u32) {
        if max_num > 1 {
            for ctx_idx in 0..max_num - 1 {
                let symbol = if ctx_idx == sym { 0 } else { 1 };
                self.encode_bin(symbol, ctx(ctx_idx as u8));

                if symbol == 0 {
                    break;
                }
            }
        }
    }
}

/// Context-adaptive binary estimator with the probability update of the
/// arithmetic coder; counts fractional bits instead of writing them.
#[derive(Clone)]
pub struct SbacEstimator {
    models: [SBAC_CTX_MODEL; NUM_SBAC_CTX],
    frac_bits: u64,
}

impl Default for SbacEstimator {
    fn default() -> Self {
        SbacEstimator {
            models: [PROB_INIT; NUM_SBAC_CTX],
            frac_bits: 0,
        }
    }
}

impl SbacEstimator {
    pub fn new() -> Self {
        Default::default()
    }

    #[inline]
    fn update(model: &mut SBAC_CTX_MODEL, bin: u32) {
        let mut state = (*model) >> 1;
        let mut mps = (*model) & 1;

        if bin != mps as u32 {
            state = state + ((512 - state + 16) >> 5);
            if state > 256 {
                mps = 1 - mps;
                state = 512 - state;
            }
        } else {
            state = state - ((state + 16) >> 5);
        }
        *model = (state << 1) + mps;
    }
}

impl EntropyEstimator for SbacEstimator {
    fn reset(&mut self) {
        for m in self.models.iter_mut() {
            *m = PROB_INIT;
        }
        self.frac_bits = 0;
    }

    #[inline]
    fn bits(&self) -> u64 {
        self.frac_bits
    }

    #[inline]
    fn encode_bin(&mut self, bin: u32, ctx: CtxId) {
        let model = &mut self.models[ctx.index()];
        self.frac_bits += biari_no_bits(bin, *model) as u64;
        SbacEstimator::update(model, bin);
    }

    #[inline]
    fn encode_bin_ep(&mut self, _value: u32, num_bins: u32) {
        self.frac_bits += (num_bins as u64) << BIT_FRAC_SHIFT;
    }
}
