use super::def::*;

/// Intra sample synthesis.
///
/// `up[0]` is the top-left corner sample and `up[1..=2 * w]` the row above the
/// block (top-right included); `left[0..h]` is the column to its left. Samples
/// are already substituted when a neighbor is unavailable.
pub trait IntraPredictor: Send + Sync {
    fn predict(
        &self,
        mode: IntraPredDir,
        up: &[pel],
        left: &[pel],
        pred: &mut [pel],
        w: usize,
        h: usize,
    );
}

/// DC, horizontal, vertical and the two diagonal modes.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultIntra;

fn ipred_dc(up: &[pel], left: &[pel], pred: &mut [pel], w: usize, h: usize) {
    let sum: u32 = up[1..=w].iter().map(|&v| v as u32).sum::<u32>()
        + left[..h].iter().map(|&v| v as u32).sum::<u32>();
    let n = (w + h) as u32;
    let dc = ((sum + (n >> 1)) / n) as pel;
    for v in &mut pred[..w * h] {
        *v = dc;
    }
}

fn ipred_hor(left: &[pel], pred: &mut [pel], w: usize, h: usize) {
    for (y, row) in pred.chunks_mut(w).take(h).enumerate() {
        for v in row {
            *v = left[y];
        }
    }
}

fn ipred_vert(up: &[pel], pred: &mut [pel], w: usize, h: usize) {
    for row in pred.chunks_mut(w).take(h) {
        row.copy_from_slice(&up[1..=w]);
    }
}

/* down-right diagonal through the corner */
fn ipred_ul(up: &[pel], left: &[pel], pred: &mut [pel], w: usize, h: usize) {
    for (y, row) in pred.chunks_mut(w).take(h).enumerate() {
        for (x, v) in row.iter_mut().enumerate() {
            *v = if x > y {
                up[x - y]
            } else if x == y {
                up[0]
            } else {
                left[y - x - 1]
            };
        }
    }
}

/* down-left diagonal from the row above */
fn ipred_ur(up: &[pel], pred: &mut [pel], w: usize, h: usize) {
    for (y, row) in pred.chunks_mut(w).take(h).enumerate() {
        for (x, v) in row.iter_mut().enumerate() {
            *v = up[1 + (x + y + 1).min(2 * w - 1)];
        }
    }
}

impl IntraPredictor for DefaultIntra {
    fn predict(
        &self,
        mode: IntraPredDir,
        up: &[pel],
        left: &[pel],
        pred: &mut [pel],
        w: usize,
        h: usize,
    ) {
        match mode {
            IntraPredDir::IPD_DC => ipred_dc(up, left, pred, w, h),
            IntraPredDir::IPD_HOR => ipred_hor(left, pred, w, h),
            IntraPredDir::IPD_VER => ipred_vert(up, pred, w, h),
            IntraPredDir::IPD_UL => ipred_ul(up, left, pred, w, h),
            IntraPredDir::IPD_UR => ipred_ur(up, pred, w, h),
        }
    }
}

/* two most probable modes from the left and upper neighbors */
pub(crate) fn evc_get_mpm(ipm_l: Option<IntraPredDir>, ipm_u: Option<IntraPredDir>) -> [IntraPredDir; 2] {
    let l = ipm_l.unwrap_or(IntraPredDir::IPD_DC);
    let u = ipm_u.unwrap_or(IntraPredDir::IPD_DC);
    if l == u {
        if l == IntraPredDir::IPD_DC {
            [IntraPredDir::IPD_DC, IntraPredDir::IPD_VER]
        } else {
            [l, IntraPredDir::IPD_DC]
        }
    } else if (l as u8) < (u as u8) {
        [l, u]
    } else {
        [u, l]
    }
}
