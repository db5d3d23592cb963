//! Kernels exported for the criterion benches.

pub mod sad {
    use crate::def::pel;
    use crate::enc::sad::*;

    pub fn sad_16b(w: usize, h: usize, src1: &[pel], s1: usize, src2: &[pel], s2: usize) -> u32 {
        evce_sad_16b(w, h, src1, s1, src2, s2)
    }

    pub fn satd_16b(w: usize, h: usize, src1: &[pel], s1: usize, src2: &[pel], s2: usize) -> u32 {
        evce_satd_16b(w, h, src1, s1, src2, s2)
    }

    pub fn ssd_16b(w: usize, h: usize, src1: &[pel], s1: usize, src2: &[pel], s2: usize) -> u64 {
        evce_ssd_16b(w, h, src1, s1, src2, s2)
    }
}

pub mod mc {
    use crate::api::frame::Plane;
    use crate::def::pel;

    /// Luma interpolation at quarter-pel position (gmv_x, gmv_y).
    pub fn mc_l(plane: &Plane, gmv_x: i32, gmv_y: i32, pred: &mut [pel], w: usize, h: usize, bit_depth: usize) {
        crate::mc::evc_mc_l(plane, gmv_x, gmv_y, pred, w, h, bit_depth)
    }

    /// Chroma interpolation at eighth-pel position (gmv_x, gmv_y).
    pub fn mc_c(plane: &Plane, gmv_x: i32, gmv_y: i32, pred: &mut [pel], w: usize, h: usize, bit_depth: usize) {
        crate::mc::evc_mc_c(plane, gmv_x, gmv_y, pred, w, h, bit_depth)
    }
}
