use crate::api::*;
use crate::def::*;

use log::*;

/// Integer-pel search strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeMethod {
    Full,
    Diamond,
    Hex,
    Tz,
    Umh,
}

impl Default for MeMethod {
    fn default() -> Self {
        MeMethod::Umh
    }
}

/// Which transform splits are tried for a residual.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TuSplitPolicy {
    /* non-split and quad split are both coded and compared */
    TryBoth,
    /* the split decided from the prediction error is the only one coded */
    OneDepth,
}

impl Default for TuSplitPolicy {
    fn default() -> Self {
        TuSplitPolicy::TryBoth
    }
}

/// Fast decisions of the mode search. Each one can be switched off on its own
/// without changing what the encoder is able to choose, only how much it tries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncoderHeuristics {
    // Force cbp=0 trials when the prediction SAD is below the per-qp table.
    pub zero_residual: bool,
    // Stop the mode loop after a residual-free skip when the neighborhood skips.
    pub early_skip: bool,
    // Try asymmetric partitions only when their symmetric sibling leads.
    pub amp_bypass: bool,
    // Drop AMP and short-distance intra when all neighbors are large and simple.
    pub complexity_mask: bool,
    // Leave the intra candidate loop on a rough-cost ratio.
    pub intra_ratio_exit: bool,
    // Abort the split branch early against the large-CU cost.
    pub split_guard: bool,
    // Do not split a residual-free skip CU in a skipping neighborhood.
    pub no_split_after_skip: bool,
}

impl Default for EncoderHeuristics {
    fn default() -> Self {
        EncoderHeuristics {
            zero_residual: true,
            early_skip: true,
            amp_bypass: true,
            complexity_mask: true,
            intra_ratio_exit: true,
            split_guard: true,
            no_split_after_skip: true,
        }
    }
}

impl EncoderHeuristics {
    pub fn none() -> Self {
        EncoderHeuristics {
            zero_residual: false,
            early_skip: false,
            amp_bypass: false,
            complexity_mask: false,
            intra_ratio_exit: false,
            split_guard: false,
            no_split_after_skip: false,
        }
    }
}

// Encoder settings which impact the mode decision.
#[derive(Clone, Copy, Debug)]
pub struct EncoderConfig {
    // Width of the frames in pixels.
    pub width: usize,
    // Height of the frames in pixels.
    pub height: usize,
    // Bit depth.
    pub bit_depth: usize,

    // The base quantizer to use.
    pub qp: u8,
    pub cb_qp_offset: i8,
    pub cr_qp_offset: i8,

    // smallest and largest CU, log2
    pub min_cu_log2: usize,
    pub max_cu_log2: usize,

    pub me_method: MeMethod,
    // integer-pel search range around the start point
    pub search_range: usize,
    // ME_LEV_IPEL, ME_LEV_HPEL or ME_LEV_QPEL
    pub me_level: u8,
    // SATD instead of SAD for fractional positions
    pub subpel_satd: bool,
    // read fractional positions from prefiltered planes of complete references
    pub use_prefiltered_subpel: bool,

    pub tu_split_policy: TuSplitPolicy,
    // skip/direct candidates promoted to full RDO
    pub skip_rdo_num: usize,
    pub weighted_skip: bool,
    pub enable_amp: bool,
    pub enable_sdip: bool,
    pub field_coding: bool,
    // chroma SSD weight in the RD cost
    pub chroma_weight: f64,

    // row workers, 1 encodes CTUs in raster order
    pub wpp_threads: usize,

    pub heuristics: EncoderHeuristics,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            width: 0,
            height: 0,
            bit_depth: 8,
            qp: 32,
            cb_qp_offset: 0,
            cr_qp_offset: 0,
            min_cu_log2: MIN_CU_LOG2,
            max_cu_log2: MAX_CU_LOG2,
            me_method: MeMethod::Umh,
            search_range: 32,
            me_level: ME_LEV_QPEL,
            subpel_satd: true,
            use_prefiltered_subpel: false,
            tu_split_policy: TuSplitPolicy::TryBoth,
            skip_rdo_num: 2,
            weighted_skip: true,
            enable_amp: true,
            enable_sdip: true,
            field_coding: false,
            chroma_weight: 1.0,
            wpp_threads: 1,
            heuristics: EncoderHeuristics::default(),
        }
    }
}

impl EncoderConfig {
    pub fn new(width: usize, height: usize) -> Self {
        EncoderConfig {
            width,
            height,
            ..Default::default()
        }
    }

    /// Checks the settings and clamps the ones that only limit effort.
    pub fn validate(&mut self) -> Result<(), EncError> {
        if self.width == 0 || self.height == 0 || self.width % 8 != 0 || self.height % 8 != 0 {
            return Err(EncError::InvalidDimensions(self.width, self.height));
        }
        if self.bit_depth < 8 || self.bit_depth > 10 {
            return Err(EncError::InvalidBitDepth(self.bit_depth));
        }
        if self.qp > MAX_QP {
            return Err(EncError::InvalidQp(self.qp));
        }
        if self.min_cu_log2 < MIN_CU_LOG2
            || self.max_cu_log2 > MAX_CU_LOG2
            || self.min_cu_log2 > self.max_cu_log2
        {
            return Err(EncError::InvalidCuRange(self.min_cu_log2, self.max_cu_log2));
        }

        let max_range = PIC_PAD_SIZE_L - MC_MARGIN as usize;
        if self.search_range == 0 || self.search_range > max_range {
            let range = self.search_range.max(1).min(max_range);
            warn!(
                "search range {} clamped to {}",
                self.search_range, range
            );
            self.search_range = range;
        }
        if self.me_level < ME_LEV_IPEL || self.me_level > ME_LEV_QPEL {
            let level = self.me_level.max(ME_LEV_IPEL).min(ME_LEV_QPEL);
            warn!("me level {} clamped to {}", self.me_level, level);
            self.me_level = level;
        }
        if self.skip_rdo_num == 0 || self.skip_rdo_num > MAX_CAND_NUM {
            let num = self.skip_rdo_num.max(1).min(MAX_CAND_NUM);
            warn!("skip rdo candidates {} clamped to {}", self.skip_rdo_num, num);
            self.skip_rdo_num = num;
        }
        if self.wpp_threads == 0 {
            self.wpp_threads = 1;
        }
        if !(self.chroma_weight >= 0.0) {
            warn!("chroma weight {} reset to 1.0", self.chroma_weight);
            self.chroma_weight = 1.0;
        }

        Ok(())
    }

    pub fn w_ctu(&self) -> usize {
        (self.width + MAX_CU_SIZE - 1) >> MAX_CU_LOG2
    }

    pub fn h_ctu(&self) -> usize {
        (self.height + MAX_CU_SIZE - 1) >> MAX_CU_LOG2
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn validate_rejects_unaligned_size() {
        let mut cfg = EncoderConfig::new(100, 64);
        assert_eq!(cfg.validate(), Err(EncError::InvalidDimensions(100, 64)));
        let mut cfg = EncoderConfig::new(0, 64);
        assert_eq!(cfg.validate(), Err(EncError::InvalidDimensions(0, 64)));
    }

    #[test]
    fn validate_rejects_bad_cu_range() {
        let mut cfg = EncoderConfig::new(64, 64);
        cfg.min_cu_log2 = 5;
        cfg.max_cu_log2 = 4;
        assert_eq!(cfg.validate(), Err(EncError::InvalidCuRange(5, 4)));
    }

    #[test]
    fn validate_clamps_effort_settings() {
        let mut cfg = EncoderConfig::new(64, 64);
        cfg.search_range = 500;
        cfg.skip_rdo_num = 0;
        cfg.wpp_threads = 0;
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.search_range, PIC_PAD_SIZE_L - MC_MARGIN as usize);
        assert_eq!(cfg.skip_rdo_num, 1);
        assert_eq!(cfg.wpp_threads, 1);
    }

    #[test]
    fn ctu_counts_round_up() {
        let cfg = EncoderConfig::new(136, 72);
        assert_eq!(cfg.w_ctu(), 3);
        assert_eq!(cfg.h_ctu(), 2);
    }
}
