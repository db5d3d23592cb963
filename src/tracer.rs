use super::def::*;

#[cfg(feature = "trace")]
use log::*;

////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(feature = "trace_me")]
pub(crate) fn TRACE_ME(x: usize, y: usize, w: usize, h: usize, lidx: usize, refi: i8, mvp: Mv, mv: Mv, cost: u32) {
    trace!(
        "me ({},{}) {}x{} L{} refi {} mvp {} mv {} cost {}",
        x, y, w, h, lidx, refi, mvp, mv, cost
    );
}

#[cfg(not(feature = "trace_me"))]
#[inline(always)]
pub(crate) fn TRACE_ME(x: usize, y: usize, w: usize, h: usize, lidx: usize, refi: i8, mvp: Mv, mv: Mv, cost: u32) {}

#[cfg(feature = "trace_cu")]
pub(crate) fn TRACE_CU(cu: &CuInfo, cost: f64) {
    trace!(
        "cu ({},{}) log2 {} {:?} cbp {:02x} skip {:?} mv {} cost {:.1}",
        cu.x, cu.y, cu.log2_size, cu.cu_type, cu.cbp, cu.skip_mode, cu.pu[0].mv[REFP_0], cost
    );
}

#[cfg(not(feature = "trace_cu"))]
#[inline(always)]
pub(crate) fn TRACE_CU(cu: &CuInfo, cost: f64) {}

#[cfg(feature = "trace_cu")]
pub(crate) fn TRACE_SPLIT(x: usize, y: usize, log2_size: usize, cost_large: f64, cost_split: f64) {
    trace!(
        "split ({},{}) log2 {} large {:.1} split {:.1}",
        x, y, log2_size, cost_large, cost_split
    );
}

#[cfg(not(feature = "trace_cu"))]
#[inline(always)]
pub(crate) fn TRACE_SPLIT(x: usize, y: usize, log2_size: usize, cost_large: f64, cost_split: f64) {}
