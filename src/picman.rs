use crate::api::frame::*;
use crate::api::*;
use crate::def::*;
use crate::mc::*;

use parking_lot::{Condvar, Mutex};
use std::sync::{Arc, OnceLock};

/// Monotonic counter other workers can block on.
pub(crate) struct RowProgress {
    done: Mutex<usize>,
    cv: Condvar,
}

impl Default for RowProgress {
    fn default() -> Self {
        RowProgress {
            done: Mutex::new(0),
            cv: Condvar::new(),
        }
    }
}

impl RowProgress {
    pub(crate) fn get(&self) -> usize {
        *self.done.lock()
    }

    pub(crate) fn set_at_least(&self, n: usize) {
        let mut done = self.done.lock();
        if n > *done {
            *done = n;
            self.cv.notify_all();
        }
    }

    pub(crate) fn wait_for(&self, n: usize) {
        let mut done = self.done.lock();
        while *done < n {
            self.cv.wait(&mut done);
        }
    }
}

/// Reconstruction and maps of one CTU row.
#[derive(Clone)]
pub(crate) struct RowBand {
    /* rows padded horizontally, stride = width + 2 * pad */
    pub(crate) planes: [Vec<pel>; N_C],
    pub(crate) rows: [usize; N_C],
    pub(crate) map: Vec<MapUnit>,
}

/// Allowed integer top-left reference positions of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MvRange {
    pub(crate) min_x: i32,
    pub(crate) max_x: i32,
    pub(crate) min_y: i32,
    pub(crate) max_y: i32,
}

impl MvRange {
    pub(crate) fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    #[inline]
    pub(crate) fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.min_x && px <= self.max_x && py >= self.min_y && py <= self.max_y
    }

    /* a fractional mv is legal when its floor and ceil positions are */
    #[inline]
    pub(crate) fn is_legal(&self, x: i32, y: i32, mv: Mv) -> bool {
        let fx = x + ((mv.x as i32) >> 2);
        let fy = y + ((mv.y as i32) >> 2);
        let cx = x + ((mv.x as i32 + 3) >> 2);
        let cy = y + ((mv.y as i32 + 3) >> 2);
        self.contains(fx, fy) && self.contains(cx, cy)
    }

    pub(crate) fn intersect(&self, o: &MvRange) -> MvRange {
        MvRange {
            min_x: self.min_x.max(o.min_x),
            max_x: self.max_x.min(o.max_x),
            min_y: self.min_y.max(o.min_y),
            max_y: self.max_y.min(o.max_y),
        }
    }
}

/// Luma quarter-pel phases of a complete picture, filtered once.
pub(crate) struct SubpelPlanes {
    phases: Vec<Vec<pel>>,
    stride: usize,
    origin: usize,
}

impl SubpelPlanes {
    fn build<S: RowSource>(src: &S, width: usize, height: usize, bit_depth: usize) -> Self {
        let origin = PIC_PAD_SIZE_L - MC_MARGIN as usize;
        let stride = width + 2 * origin;
        let rows = height + 2 * origin;
        let mut phases = vec![vec![]; 16];
        let mut tile = vec![0 as pel; MAX_CU_DIM];

        for phase in 1..16 {
            let (fx, fy) = ((phase & 3) as i32, (phase >> 2) as i32);
            let mut plane = vec![0 as pel; stride * rows];
            for ty in (0..rows).step_by(MAX_CU_SIZE) {
                let th = (rows - ty).min(MAX_CU_SIZE);
                for tx in (0..stride).step_by(MAX_CU_SIZE) {
                    let tw = (stride - tx).min(MAX_CU_SIZE);
                    let px = tx as i32 - origin as i32;
                    let py = ty as i32 - origin as i32;
                    evc_mc_l(src, (px << 2) + fx, (py << 2) + fy, &mut tile, tw, th, bit_depth);
                    for y in 0..th {
                        let o = (ty + y) * stride + tx;
                        plane[o..o + tw].copy_from_slice(&tile[y * tw..y * tw + tw]);
                    }
                }
            }
            phases[phase] = plane;
        }

        SubpelPlanes {
            phases,
            stride,
            origin,
        }
    }

    fn pred(&self, gmv_x: i32, gmv_y: i32, pred: &mut [pel], w: usize, h: usize) {
        let phase = ((gmv_y & 3) << 2 | (gmv_x & 3)) as usize;
        let plane = &self.phases[phase];
        let x0 = ((gmv_x >> 2) + self.origin as i32) as usize;
        let y0 = ((gmv_y >> 2) + self.origin as i32) as usize;
        for (y, dst) in pred.chunks_mut(w).take(h).enumerate() {
            let o = (y0 + y) * self.stride + x0;
            dst.copy_from_slice(&plane[o..o + w]);
        }
    }
}

/// A reconstructed picture usable as a reference, published one CTU row at a time.
pub struct RefPic {
    pub poc: i32,
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) bit_depth: usize,
    /* POCs of this picture's own references, for collocated scaling */
    pub(crate) ref_poc: [Vec<i32>; REFP_NUM],
    pub(crate) w_unit: usize,
    bands: Vec<OnceLock<RowBand>>,
    progress: RowProgress,
    subpel: OnceLock<SubpelPlanes>,
}

impl RefPic {
    pub(crate) fn new(
        poc: i32,
        width: usize,
        height: usize,
        bit_depth: usize,
        ref_poc: [Vec<i32>; REFP_NUM],
    ) -> Self {
        let h_ctu = (height + MAX_CU_SIZE - 1) >> MAX_CU_LOG2;
        RefPic {
            poc,
            width,
            height,
            bit_depth,
            ref_poc,
            w_unit: (width + MIN_UNIT_SIZE - 1) >> MIN_UNIT_LOG2,
            bands: (0..h_ctu).map(|_| OnceLock::new()).collect(),
            progress: RowProgress::default(),
            subpel: OnceLock::new(),
        }
    }

    /// A complete reference built from a frame, with the given per 4x4 motion
    /// (raster order, `ceil(width/4) * ceil(height/4)` units) or none.
    pub fn from_frame(
        poc: i32,
        frame: &Frame,
        bit_depth: usize,
        map: Option<&[MapUnit]>,
        ref_poc: [Vec<i32>; REFP_NUM],
    ) -> Self {
        let pic = RefPic::new(poc, frame.width(), frame.height(), bit_depth, ref_poc);
        let w_unit = pic.w_unit;
        let h_unit = (pic.height + MIN_UNIT_SIZE - 1) >> MIN_UNIT_LOG2;
        for r in 0..pic.num_rows() {
            let mut band = pic.empty_band(r);
            for c in 0..N_C {
                let p = &frame.planes[c];
                let stride = pic.band_stride(c);
                let y0 = r * (MAX_CU_SIZE >> (c != 0) as usize);
                for y in 0..band.rows[c] {
                    let row = p.pel_row((y0 + y) as isize);
                    let pad = p.xpad - pic.pad(c);
                    band.planes[c][y * stride..(y + 1) * stride]
                        .copy_from_slice(&row[pad..pad + stride]);
                }
            }
            let uy0 = r * MAX_CU_UNITS;
            for uy in 0..band.map.len() / w_unit {
                for ux in 0..w_unit {
                    band.map[uy * w_unit + ux] = match map {
                        Some(m) if uy0 + uy < h_unit => m[(uy0 + uy) * w_unit + ux],
                        _ => MapUnit {
                            flags: MCU_CODED | MCU_INTRA,
                            ..Default::default()
                        },
                    };
                }
            }
            pic.publish_row(r, band);
        }
        pic
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub(crate) fn num_rows(&self) -> usize {
        self.bands.len()
    }

    pub fn is_complete(&self) -> bool {
        self.progress.get() >= self.bands.len()
    }

    #[inline]
    pub(crate) fn pad(&self, c: usize) -> usize {
        if c == Y_C {
            PIC_PAD_SIZE_L
        } else {
            PIC_PAD_SIZE_C
        }
    }

    #[inline]
    pub(crate) fn plane_width(&self, c: usize) -> usize {
        if c == Y_C {
            self.width
        } else {
            (self.width + 1) >> 1
        }
    }

    #[inline]
    pub(crate) fn plane_height(&self, c: usize) -> usize {
        if c == Y_C {
            self.height
        } else {
            (self.height + 1) >> 1
        }
    }

    #[inline]
    pub(crate) fn band_stride(&self, c: usize) -> usize {
        self.plane_width(c) + 2 * self.pad(c)
    }

    pub(crate) fn empty_band(&self, row: usize) -> RowBand {
        let rows_l = (self.height - row * MAX_CU_SIZE).min(MAX_CU_SIZE);
        let rows_c = (self.plane_height(U_C) - row * (MAX_CU_SIZE >> 1)).min(MAX_CU_SIZE >> 1);
        let rows = [rows_l, rows_c, rows_c];
        let units = ((rows_l + MIN_UNIT_SIZE - 1) >> MIN_UNIT_LOG2) * self.w_unit;
        RowBand {
            planes: [
                vec![0; rows[Y_C] * self.band_stride(Y_C)],
                vec![0; rows[U_C] * self.band_stride(U_C)],
                vec![0; rows[V_C] * self.band_stride(V_C)],
            ],
            rows,
            map: vec![MapUnit::default(); units],
        }
    }

    /// Replicates the first and last sample of every band row into the padding.
    pub(crate) fn pad_band(&self, band: &mut RowBand) {
        for c in 0..N_C {
            let (w, pad, stride) = (self.plane_width(c), self.pad(c), self.band_stride(c));
            for row in band.planes[c].chunks_mut(stride) {
                let l = row[pad];
                let r = row[pad + w - 1];
                row[..pad].iter_mut().for_each(|v| *v = l);
                row[pad + w..].iter_mut().for_each(|v| *v = r);
            }
        }
    }

    /// Publishes a finished CTU row. Rows become visible in order.
    pub(crate) fn publish_row(&self, row: usize, band: RowBand) {
        if row >= self.bands.len() {
            return;
        }
        let _ = self.bands[row].set(band);
        let mut n = self.progress.get();
        while n < self.bands.len() && self.bands[n].get().is_some() {
            n += 1;
        }
        self.progress.set_at_least(n);
    }

    /// Blocks until `rows` CTU rows are published and returns a view of them.
    pub(crate) fn wait_rows(&self, rows: usize, use_prefiltered: bool) -> RefView<'_> {
        let rows = rows.min(self.bands.len());
        self.progress.wait_for(rows);
        let bands: Vec<&RowBand> = self.bands[..rows].iter().filter_map(|b| b.get()).collect();
        let all_rows = bands.len() == self.bands.len();
        RefView {
            pic: self,
            bands,
            all_rows,
            use_prefiltered: use_prefiltered && all_rows,
        }
    }

    /// View of the whole picture once it is complete.
    pub fn view(&self) -> RefView<'_> {
        self.wait_rows(self.bands.len(), false)
    }
}

/// Published rows of a reference.
pub struct RefView<'a> {
    pub(crate) pic: &'a RefPic,
    bands: Vec<&'a RowBand>,
    /* the view holds every CTU row of the picture */
    pub(crate) all_rows: bool,
    use_prefiltered: bool,
}

pub(crate) struct RefPlane<'a, 'b> {
    view: &'b RefView<'a>,
    c: usize,
    band_log2: usize,
    last_row: isize,
    stride: usize,
}

impl<'a, 'b> RowSource for RefPlane<'a, 'b> {
    #[inline]
    fn pel_row(&self, y: isize) -> &[pel] {
        let y = clip(y, 0, self.last_row) as usize;
        let band = self.view.bands[y >> self.band_log2];
        let r = y & ((1 << self.band_log2) - 1);
        &band.planes[self.c][r * self.stride..(r + 1) * self.stride]
    }

    #[inline]
    fn origin(&self) -> isize {
        self.view.pic.pad(self.c) as isize
    }
}

impl<'a> RefView<'a> {
    pub(crate) fn poc(&self) -> i32 {
        self.pic.poc
    }

    /* luma rows readable through this view */
    pub(crate) fn avail_rows(&self) -> usize {
        (self.bands.len() * MAX_CU_SIZE).min(self.pic.height)
    }

    pub(crate) fn plane<'b>(&'b self, c: usize) -> RefPlane<'a, 'b> {
        let band_log2 = if c == Y_C {
            MAX_CU_LOG2
        } else {
            MAX_CU_LOG2 - 1
        };
        let avail = if c == Y_C {
            self.avail_rows()
        } else {
            (self.avail_rows() + 1) >> 1
        };
        RefPlane {
            view: self,
            c,
            band_log2,
            last_row: avail as isize - 1,
            stride: self.pic.band_stride(c),
        }
    }

    /// Motion stored for the 4x4 unit (ux, uy), if that row is published.
    pub(crate) fn map_unit(&self, ux: usize, uy: usize) -> Option<&MapUnit> {
        let band = self.bands.get(uy / MAX_CU_UNITS)?;
        band.map.get((uy % MAX_CU_UNITS) * self.pic.w_unit + ux)
    }

    /// Legal top-left positions for a w x h block.
    pub(crate) fn legal_range(&self, w: usize, h: usize) -> MvRange {
        let lo = -(PIC_PAD_SIZE_L as i32) + MC_MARGIN;
        let bottom = if self.all_rows {
            self.pic.height as i32 + PIC_PAD_SIZE_L as i32 - MC_MARGIN
        } else {
            self.avail_rows() as i32 - MC_MARGIN
        };
        MvRange {
            min_x: lo,
            max_x: self.pic.width as i32 + PIC_PAD_SIZE_L as i32 - MC_MARGIN - w as i32,
            min_y: lo,
            max_y: bottom - h as i32,
        }
    }

    /// Luma prediction at the absolute quarter-pel position.
    pub(crate) fn pred_l(&self, gmv_x: i32, gmv_y: i32, pred: &mut [pel], w: usize, h: usize) {
        if self.use_prefiltered && (gmv_x & 3 != 0 || gmv_y & 3 != 0) {
            let src = self.plane(Y_C);
            let planes = self.pic.subpel.get_or_init(|| {
                SubpelPlanes::build(&src, self.pic.width, self.pic.height, self.pic.bit_depth)
            });
            planes.pred(gmv_x, gmv_y, pred, w, h);
        } else {
            evc_mc_l(&self.plane(Y_C), gmv_x, gmv_y, pred, w, h, self.pic.bit_depth);
        }
    }

    /// Chroma prediction at the absolute 1/8-pel position.
    pub(crate) fn pred_c(&self, c: usize, gmv_x: i32, gmv_y: i32, pred: &mut [pel], w: usize, h: usize) {
        evc_mc_c(&self.plane(c), gmv_x, gmv_y, pred, w, h, self.pic.bit_depth);
    }
}

/// Reference lists of the picture being encoded.
#[derive(Clone, Default)]
pub struct RefLists {
    pub(crate) list: [Vec<Arc<RefPic>>; REFP_NUM],
}

impl RefLists {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(&mut self, lidx: usize, pic: Arc<RefPic>) -> Result<(), EncError> {
        if self.list[lidx].len() >= MAX_NUM_REF {
            return Err(EncError::TooManyReferences(lidx, self.list[lidx].len() + 1));
        }
        self.list[lidx].push(pic);
        Ok(())
    }

    pub fn num_refs(&self, lidx: usize) -> usize {
        self.list[lidx].len()
    }

    pub fn get(&self, lidx: usize, refi: usize) -> Option<&Arc<RefPic>> {
        self.list[lidx].get(refi)
    }

    pub(crate) fn pocs(&self) -> [Vec<i32>; REFP_NUM] {
        [
            self.list[REFP_0].iter().map(|p| p.poc).collect(),
            self.list[REFP_1].iter().map(|p| p.poc).collect(),
        ]
    }
}

/* POC distance, never zero */
#[inline]
pub(crate) fn evc_poc_dist(cur: i32, r: i32) -> i32 {
    let d = cur - r;
    if d == 0 {
        1
    } else {
        d
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaChaRng;
    use std::thread;

    pub(crate) fn random_frame(w: usize, h: usize, seed: u8) -> Frame {
        let mut ra = ChaChaRng::from_seed([seed; 32]);
        let mut f = Frame::new(w, h);
        for p in f.planes.iter_mut() {
            for y in 0..p.height {
                for v in p.row_mut(y) {
                    *v = ra.gen::<u8>() as pel;
                }
            }
        }
        f.pad();
        f
    }

    #[test]
    fn view_matches_source_frame() {
        let f = random_frame(96, 80, 3);
        let pic = RefPic::from_frame(0, &f, 8, None, Default::default());
        assert!(pic.is_complete());
        let v = pic.view();
        for y in [0isize, 63, 64, 79].iter() {
            assert_eq!(&v.plane(Y_C).row_at(0, *y)[..96], f.planes[Y_C].row(*y as usize));
        }
        assert_eq!(v.plane(U_C).row_at(-40, 100)[0], f.planes[U_C].row(39)[0]);
        assert!(v.map_unit(3, 19).map_or(false, |m| m.is_intra()));
        assert!(v.map_unit(3, 20).is_none());
    }

    #[test]
    fn legal_range_follows_published_rows() {
        let f = random_frame(64, 192, 4);
        let full = RefPic::from_frame(0, &f, 8, None, Default::default());
        let r = full.view().legal_range(16, 16);
        assert_eq!(r.min_x, -76);
        assert_eq!(r.max_x, 64 + 76 - 16);
        assert_eq!(r.max_y, 192 + 76 - 16);

        let partial = RefPic::new(0, 64, 192, 8, Default::default());
        partial.publish_row(0, full.empty_band(0));
        let r = partial.wait_rows(1, false).legal_range(16, 16);
        assert_eq!(r.max_y, 64 - 4 - 16);
        assert!(r.is_legal(0, 0, Mv::new(0, (r.max_y * 4) as i16)));
        assert!(!r.is_legal(0, 0, Mv::new(0, (r.max_y * 4 + 1) as i16)));
    }

    #[test]
    fn row_limited_view_of_finished_reference_is_clamped() {
        let f = random_frame(64, 192, 4);
        let full = RefPic::from_frame(0, &f, 8, None, Default::default());
        assert!(full.is_complete());
        let v = full.wait_rows(1, true);
        assert!(!v.all_rows);
        assert!(!v.use_prefiltered);
        assert_eq!(v.legal_range(16, 16).max_y, 64 - 4 - 16);
        assert!(full.wait_rows(3, false).all_rows);
    }

    #[test]
    fn waiting_for_rows_blocks_until_published() {
        let f = random_frame(64, 128, 5);
        let src = RefPic::from_frame(0, &f, 8, None, Default::default());
        let pic = Arc::new(RefPic::new(0, 64, 128, 8, Default::default()));
        let producer = {
            let pic = pic.clone();
            let bands: Vec<RowBand> = src.bands.iter().filter_map(|b| b.get().cloned()).collect();
            thread::spawn(move || {
                for (r, b) in bands.into_iter().enumerate().rev() {
                    pic.publish_row(r, b);
                }
            })
        };
        let v = pic.wait_rows(2, false);
        assert!(v.all_rows);
        assert_eq!(&v.plane(Y_C).row_at(0, 127)[..64], f.planes[Y_C].row(127));
        let _ = producer.join();
    }

    #[test]
    fn prefiltered_matches_on_the_fly() {
        let f = random_frame(64, 64, 6);
        let pic = RefPic::from_frame(0, &f, 8, None, Default::default());
        let direct = pic.wait_rows(1, false);
        let filtered = pic.wait_rows(1, true);
        let mut a = vec![0; 16 * 8];
        let mut b = vec![0; 16 * 8];
        for &(gx, gy) in &[(5, 9), (-70 * 4 + 3, 2), (100, -30 * 4 + 1), (4 * 50 + 2, 4 * 52 + 3)] {
            direct.pred_l(gx, gy, &mut a, 16, 8);
            filtered.pred_l(gx, gy, &mut b, 16, 8);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn poc_distance_is_never_zero() {
        assert_eq!(evc_poc_dist(4, 4), 1);
        assert_eq!(evc_poc_dist(4, 6), -2);
    }
}
