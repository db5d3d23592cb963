use super::mvp::UmhSeeds;
use super::sad::*;
use super::util::*;
use crate::api::MeMethod;
use crate::def::*;
use crate::picman::*;
use crate::tbl::*;
use crate::tracer::*;

/* TZ search */
const TZ_MAX_ROUNDS_NO_GAIN: usize = 3;
const RASTER_SEARCH_STEP: i32 = 5;
const RASTER_SEARCH_THD: i32 = 5;
const STAR_MAX_ROUNDS: usize = 8;

/* bound on pattern iterations, the cost decreases strictly on each */
const MAX_PATTERN_ITER: usize = 256;

/* UMH refines around this many of the cheapest starts */
const UMH_NUM_STARTS: usize = 3;

/// Outcome of one motion search. `cost` includes the motion vector bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MeResult {
    pub(crate) mv: Mv,
    pub(crate) cost: u32,
    pub(crate) dist: u32,
    /* positions costed */
    pub(crate) points: u32,
}

impl MeResult {
    pub(crate) const INVALID: MeResult = MeResult {
        mv: Mv::ZERO,
        cost: MAX_DISTORTION,
        dist: MAX_DISTORTION,
        points: 0,
    };

    pub(crate) fn is_valid(&self) -> bool {
        self.cost != MAX_DISTORTION
    }
}

/// Everything one search needs. `target` is `w * h` samples, either the
/// original block or `2 * org - pred` when refining one hypothesis of a pair,
/// in which case `shift` halves the distortion.
pub(crate) struct MeParams<'a, 'r> {
    pub(crate) target: &'a [i16],
    pub(crate) shift: u32,
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) w: usize,
    pub(crate) h: usize,
    pub(crate) refp: &'a RefView<'r>,
    pub(crate) mvp: Mv,
    /* further start vectors: neighbor, up-layer and collocated motion */
    pub(crate) cands: &'a [Mv],
    pub(crate) lambda_mv: u32,
    pub(crate) num_refp: usize,
    pub(crate) refi: i8,
    /* mv bits of the other hypothesis */
    pub(crate) extra_bits: u32,
    pub(crate) search_range: i32,
    pub(crate) me_level: u8,
    pub(crate) subpel_satd: bool,
    pub(crate) level: usize,
    pub(crate) seeds: UmhSeeds,
}

#[inline]
fn ceil_div4(v: i32) -> i32 {
    -((-v) >> 2)
}

pub(crate) struct MotionSearch<'p, 'a, 'r> {
    p: &'p MeParams<'a, 'r>,
    legal: MvRange,
    /* searched integer offsets */
    win: MvRange,
    /* integer offsets that keep |mvd| <= MAX_MVD */
    mvd_box: MvRange,
    pred: Vec<pel>,
    /* (cost, x, y) of every distinct integer start */
    starts: Vec<(u32, i32, i32)>,
    points: u32,
    best_x: i32,
    best_y: i32,
    best_cost: u32,
    best_dist: u32,
}

impl<'p, 'a, 'r> MotionSearch<'p, 'a, 'r> {
    pub(crate) fn new(p: &'p MeParams<'a, 'r>) -> Self {
        let legal = p.refp.legal_range(p.w, p.h);
        let mvd_box = MvRange {
            min_x: ceil_div4(p.mvp.x as i32 - MAX_MVD),
            max_x: (p.mvp.x as i32 + MAX_MVD) >> 2,
            min_y: ceil_div4(p.mvp.y as i32 - MAX_MVD),
            max_y: (p.mvp.y as i32 + MAX_MVD) >> 2,
        };
        let cx = (p.mvp.x as i32 + 2) >> 2;
        let cy = (p.mvp.y as i32 + 2) >> 2;
        let sr = p.search_range;
        let win = MvRange {
            min_x: cx - sr,
            max_x: cx + sr,
            min_y: cy - sr,
            max_y: cy + sr,
        }
        .intersect(&MvRange {
            min_x: legal.min_x - p.x,
            max_x: legal.max_x - p.x,
            min_y: legal.min_y - p.y,
            max_y: legal.max_y - p.y,
        })
        .intersect(&mvd_box);

        MotionSearch {
            p,
            legal,
            win,
            mvd_box,
            pred: vec![0; p.w * p.h],
            starts: Vec::with_capacity(MAX_CAND_NUM + 2),
            points: 0,
            best_x: 0,
            best_y: 0,
            best_cost: MAX_DISTORTION,
            best_dist: MAX_DISTORTION,
        }
    }

    #[inline]
    fn mv_cost(&self, mv: Mv) -> u32 {
        let p = self.p;
        let bits = get_mv_bits(
            mv.x as i32 - p.mvp.x as i32,
            mv.y as i32 - p.mvp.y as i32,
            p.num_refp,
            p.refi,
        ) + p.extra_bits;
        MV_COST(p.lambda_mv, bits)
    }

    fn mv_ok(&self, mv: Mv) -> bool {
        self.legal.is_legal(self.p.x, self.p.y, mv)
            && (mv.x as i32 - self.p.mvp.x as i32).abs() <= MAX_MVD
            && (mv.y as i32 - self.p.mvp.y as i32).abs() <= MAX_MVD
    }

    /* distortion and total cost of a quarter-pel mv, sad or satd */
    fn eval(&mut self, mv: Mv, satd: bool) -> (u32, u32) {
        if !self.mv_ok(mv) {
            return (MAX_DISTORTION, MAX_DISTORTION);
        }
        let p = self.p;
        let (w, h) = (p.w, p.h);
        self.points += 1;
        p.refp.pred_l(
            (p.x << 2) + mv.x as i32,
            (p.y << 2) + mv.y as i32,
            &mut self.pred,
            w,
            h,
        );
        let d = if satd {
            evce_satd_16b(w, h, p.target, w, &self.pred, w)
        } else {
            evce_sad_16b(w, h, p.target, w, &self.pred, w)
        } >> p.shift;
        (d, d.saturating_add(self.mv_cost(mv)))
    }

    /* cost of an integer offset at any legal position, kept when it is the best */
    fn cost_at(&mut self, mx: i32, my: i32) -> u32 {
        if !self.mvd_box.contains(mx, my) {
            return MAX_DISTORTION;
        }
        let (dist, cost) = self.eval(Mv::from_i32(mx << 2, my << 2), false);
        if cost < self.best_cost {
            self.best_cost = cost;
            self.best_dist = dist;
            self.best_x = mx;
            self.best_y = my;
        }
        cost
    }

    fn try_start(&mut self, mx: i32, my: i32) -> bool {
        let before = self.best_cost;
        self.cost_at(mx, my) < before
    }

    /* quarter-pel start vector rounded to integer, each position once */
    fn add_start(&mut self, mv: Mv) {
        let mx = (mv.x as i32 + 2) >> 2;
        let my = (mv.y as i32 + 2) >> 2;
        if self.starts.iter().any(|&(_, x, y)| (x, y) == (mx, my)) {
            return;
        }
        let cost = self.cost_at(mx, my);
        if cost != MAX_DISTORTION {
            self.starts.push((cost, mx, my));
        }
    }

    /* integer offset inside the search window */
    #[inline]
    fn try_point(&mut self, mx: i32, my: i32) -> bool {
        if !self.win.contains(mx, my) {
            return false;
        }
        self.try_start(mx, my)
    }

    /* descents follow the cost and may leave the window of the predictor,
     * scans stay inside it */
    fn pattern_iter(&mut self, pattern: &[[i16; 2]], scale: i32) {
        for _ in 0..MAX_PATTERN_ITER {
            let (cx, cy) = (self.best_x, self.best_y);
            let mut moved = false;
            for d in pattern.iter() {
                moved |= self.try_start(cx + d[0] as i32 * scale, cy + d[1] as i32 * scale);
            }
            if !moved {
                break;
            }
        }
    }

    fn square_refine(&mut self) {
        let (cx, cy) = (self.best_x, self.best_y);
        for d in evc_tbl_spiral9[1..].iter() {
            self.try_start(cx + d[0] as i32, cy + d[1] as i32);
        }
    }

    fn me_ipel_full(&mut self) {
        let win = self.win;
        for my in win.min_y..=win.max_y {
            for mx in win.min_x..=win.max_x {
                self.try_point(mx, my);
            }
        }
    }

    fn me_ipel_diamond(&mut self) {
        self.pattern_iter(&evc_tbl_diamond, 1);
    }

    fn me_ipel_hex(&mut self) {
        self.pattern_iter(&evc_tbl_hexagon, 1);
        self.square_refine();
    }

    /* one diamond of radius `step` around (cx, cy), 8 points from step 2 on */
    fn tz_diamond(&mut self, cx: i32, cy: i32, step: i32) -> bool {
        let mut found = false;
        found |= self.try_point(cx, cy - step);
        found |= self.try_point(cx - step, cy);
        found |= self.try_point(cx + step, cy);
        found |= self.try_point(cx, cy + step);
        if step > 1 {
            let h = step >> 1;
            found |= self.try_point(cx - h, cy - h);
            found |= self.try_point(cx + h, cy - h);
            found |= self.try_point(cx - h, cy + h);
            found |= self.try_point(cx + h, cy + h);
        }
        found
    }

    /* returns the step of the last improvement, 0 when none */
    fn tz_rounds(&mut self, cx: i32, cy: i32) -> i32 {
        let mut best_step = 0;
        let mut no_gain = 0;
        let mut step = 1;
        while step <= self.p.search_range.max(1) {
            if self.tz_diamond(cx, cy, step) {
                best_step = step;
                no_gain = 0;
            } else {
                no_gain += 1;
                if no_gain >= TZ_MAX_ROUNDS_NO_GAIN {
                    break;
                }
            }
            step <<= 1;
        }
        best_step
    }

    fn me_ipel_tz(&mut self) {
        let (cx, cy) = (self.best_x, self.best_y);
        let best_step = self.tz_rounds(cx, cy);

        if best_step == 1 {
            /* the two corners next to the winning axis point */
            let (dx, dy) = (self.best_x - cx, self.best_y - cy);
            if dx == 0 {
                self.try_point(cx - 1, cy + dy);
                self.try_point(cx + 1, cy + dy);
            } else {
                self.try_point(cx + dx, cy - 1);
                self.try_point(cx + dx, cy + 1);
            }
        }

        if best_step > RASTER_SEARCH_THD {
            let win = self.win;
            let mut my = win.min_y;
            while my <= win.max_y {
                let mut mx = win.min_x;
                while mx <= win.max_x {
                    self.try_point(mx, my);
                    mx += RASTER_SEARCH_STEP;
                }
                my += RASTER_SEARCH_STEP;
            }
        }

        for _ in 0..STAR_MAX_ROUNDS {
            let (sx, sy) = (self.best_x, self.best_y);
            self.tz_rounds(sx, sy);
            if (self.best_x, self.best_y) == (sx, sy) {
                break;
            }
        }
    }

    fn me_ipel_umh(&mut self) {
        let p = self.p;
        let level = p.level.min(NUM_CU_LEVEL - 1);
        let seed = p.seeds.neighbor.or(p.seeds.uplayer);
        let thresh = |beta: f64| -> u32 {
            match seed {
                Some(s) => (s as f64 * (1.0 + beta)).min(u32::MAX as f64 - 1.0) as u32,
                None => 0,
            }
        };
        let thresh_small = thresh(evc_tbl_umh_beta_small[level]);
        let thresh_large = thresh(evc_tbl_umh_beta_large[level]);

        /* small diamond around the cheapest starts */
        let mut starts = self.starts.clone();
        starts.sort_by_key(|s| s.0);
        for &(_, cx, cy) in starts.iter().take(UMH_NUM_STARTS) {
            for d in evc_tbl_diamond.iter() {
                self.try_start(cx + d[0] as i32, cy + d[1] as i32);
            }
        }
        if self.best_cost < thresh_small {
            self.pattern_iter(&evc_tbl_diamond, 1);
            return;
        }

        if self.best_cost >= thresh_large {
            /* unsymmetrical cross */
            let (cx, cy) = (self.best_x, self.best_y);
            let sr = p.search_range;
            let mut i = 2;
            while i <= sr {
                self.try_point(cx - i, cy);
                self.try_point(cx + i, cy);
                i += 2;
            }
            let mut i = 2;
            while i <= sr >> 1 {
                self.try_point(cx, cy - i);
                self.try_point(cx, cy + i);
                i += 2;
            }

            /* 5x5 spiral */
            let (cx, cy) = (self.best_x, self.best_y);
            for d in evc_tbl_spiral25.iter() {
                self.try_point(cx + d[0] as i32, cy + d[1] as i32);
            }

            if self.best_cost >= thresh_large {
                /* uneven multi-hexagon */
                let (cx, cy) = (self.best_x, self.best_y);
                for i in 1..=(sr >> 2) {
                    for d in evc_tbl_big_hexagon.iter() {
                        self.try_point(cx + d[0] as i32 * i, cy + d[1] as i32 * i);
                    }
                }
            }
        }

        /* extended hexagon then small diamond */
        self.pattern_iter(&evc_tbl_hexagon, 1);
        self.pattern_iter(&evc_tbl_diamond, 1);
    }

    /* fractional refinement around the integer winner */
    fn me_spel_pattern(&mut self) {
        let satd = self.p.subpel_satd;
        let mut best = Mv::from_i32(self.best_x << 2, self.best_y << 2);
        let (dist, cost) = self.eval(best, satd);
        self.best_dist = dist;
        self.best_cost = cost;

        let mut steps = [0i32; 2];
        if self.p.me_level >= ME_LEV_HPEL {
            steps[0] = 2;
        }
        if self.p.me_level >= ME_LEV_QPEL {
            steps[1] = 1;
        }

        for &step in steps.iter().filter(|&&s| s != 0) {
            let center = best;
            for d in evc_tbl_spel_pattern.iter() {
                let mv = Mv::from_i32(
                    center.x as i32 + d[0] as i32 * step,
                    center.y as i32 + d[1] as i32 * step,
                );
                let (dist, cost) = self.eval(mv, satd);
                if cost < self.best_cost {
                    self.best_cost = cost;
                    self.best_dist = dist;
                    best = mv;
                }
            }
        }

        self.best_x = best.x as i32;
        self.best_y = best.y as i32;
    }

    pub(crate) fn run(mut self, method: MeMethod) -> MeResult {
        let p = self.p;
        if self.legal.is_empty() || self.win.is_empty() {
            return MeResult::INVALID;
        }

        /* start from the predictor, zero motion and the candidates */
        self.add_start(p.mvp);
        self.add_start(Mv::ZERO);
        for &c in p.cands.iter() {
            self.add_start(c);
        }
        if self.best_cost == MAX_DISTORTION {
            /* no start is legal, enter from the nearest window corner */
            let sx = (p.mvp.x as i32 + 2) >> 2;
            let sy = (p.mvp.y as i32 + 2) >> 2;
            let wx = sx.max(self.win.min_x).min(self.win.max_x);
            let wy = sy.max(self.win.min_y).min(self.win.max_y);
            if !self.try_point(wx, wy) {
                return MeResult::INVALID;
            }
            self.starts.push((self.best_cost, wx, wy));
        }

        match method {
            MeMethod::Full => self.me_ipel_full(),
            MeMethod::Diamond => self.me_ipel_diamond(),
            MeMethod::Hex => self.me_ipel_hex(),
            MeMethod::Tz => self.me_ipel_tz(),
            MeMethod::Umh => self.me_ipel_umh(),
        }

        let mv = if p.me_level > ME_LEV_IPEL {
            self.me_spel_pattern();
            Mv::new(self.best_x as i16, self.best_y as i16)
        } else {
            Mv::from_i32(self.best_x << 2, self.best_y << 2)
        };

        TRACE_ME(
            p.x as usize,
            p.y as usize,
            p.w,
            p.h,
            0,
            p.refi,
            p.mvp,
            mv,
            self.best_cost,
        );

        MeResult {
            mv,
            cost: self.best_cost,
            dist: self.best_dist,
            points: self.points,
        }
    }
}

/// Integer search with `method`, then fractional refinement up to `me_level`.
pub(crate) fn motion_search(p: &MeParams<'_, '_>, method: MeMethod) -> MeResult {
    MotionSearch::new(p).run(method)
}

/// Refines a motion vector of a joint prediction: a 3x3 integer spiral, then
/// one 8 point fractional spiral at the finest step. `cost_of` returns
/// `MAX_DISTORTION` for unusable vectors.
pub(crate) fn joint_refine<F>(start: Mv, me_level: u8, mut cost_of: F) -> Option<(Mv, u32)>
where
    F: FnMut(Mv) -> u32,
{
    let mut best = start;
    let mut best_cost = cost_of(start);

    let center = start.round_ipel();
    for d in evc_tbl_spiral9.iter() {
        let mv = Mv::from_i32(
            center.x as i32 + ((d[0] as i32) << 2),
            center.y as i32 + ((d[1] as i32) << 2),
        );
        if mv == start {
            continue;
        }
        let cost = cost_of(mv);
        if cost < best_cost {
            best_cost = cost;
            best = mv;
        }
    }

    let step = if me_level >= ME_LEV_QPEL {
        1
    } else if me_level >= ME_LEV_HPEL {
        2
    } else {
        0
    };
    if step != 0 {
        let center = best;
        for d in evc_tbl_spel_pattern.iter() {
            let mv = Mv::from_i32(
                center.x as i32 + d[0] as i32 * step,
                center.y as i32 + d[1] as i32 * step,
            );
            let cost = cost_of(mv);
            if cost < best_cost {
                best_cost = cost;
                best = mv;
            }
        }
    }

    if best_cost == MAX_DISTORTION {
        None
    } else {
        Some((best, best_cost))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::frame::*;
    use crate::picman::test::random_frame;
    use interpolate_name::interpolate_test;

    /* the frame content moved left by `dx` samples */
    fn panned(src: &Frame, dx: usize) -> Frame {
        let mut f = Frame::new(src.width(), src.height());
        for c in 0..N_C {
            let d = if c == Y_C { dx } else { dx >> 1 };
            let w = src.planes[c].width;
            for y in 0..src.planes[c].height {
                for x in 0..w {
                    let v = src.planes[c].p((x + d).min(w - 1), y);
                    f.planes[c].row_mut(y)[x] = v;
                }
            }
        }
        f.pad();
        f
    }

    fn block(f: &Frame, x: usize, y: usize, w: usize, h: usize) -> Vec<i16> {
        let mut t = Vec::with_capacity(w * h);
        for j in 0..h {
            t.extend(f.planes[Y_C].row(y + j)[x..x + w].iter().map(|&v| v as i16));
        }
        t
    }

    fn params<'a, 'r>(target: &'a [i16], refp: &'a RefView<'r>, x: i32, y: i32, mvp: Mv, sr: i32) -> MeParams<'a, 'r> {
        MeParams {
            target,
            shift: 0,
            x,
            y,
            w: 16,
            h: 16,
            refp,
            mvp,
            cands: &[],
            lambda_mv: 65536 * 4,
            num_refp: 1,
            refi: 0,
            extra_bits: 0,
            search_range: sr,
            me_level: ME_LEV_QPEL,
            subpel_satd: true,
            level: 1,
            seeds: UmhSeeds::default(),
        }
    }

    #[test]
    fn full_search_finds_pan() {
        let r = random_frame(64, 64, 11);
        let org = panned(&r, 4);
        let pic = RefPic::from_frame(0, &r, 8, None, Default::default());
        let view = pic.view();
        let target = block(&org, 16, 16, 16, 16);
        let p = params(&target, &view, 16, 16, Mv::ZERO, 8);
        let res = motion_search(&p, MeMethod::Full);
        assert_eq!(res.mv, Mv::new(16, 0));
        assert_eq!(res.dist, 0);
    }

    #[interpolate_test(full, MeMethod::Full)]
    #[interpolate_test(diamond, MeMethod::Diamond)]
    #[interpolate_test(hex, MeMethod::Hex)]
    #[interpolate_test(tz, MeMethod::Tz)]
    #[interpolate_test(umh, MeMethod::Umh)]
    fn result_is_legal(method: MeMethod) {
        let r = random_frame(64, 64, 12);
        let org = random_frame(64, 64, 13);
        let pic = RefPic::from_frame(0, &r, 8, None, Default::default());
        let view = pic.view();
        let range = view.legal_range(16, 16);
        for &(x, y, mvp) in &[
            (0, 0, Mv::new(-400, -400)),
            (48, 48, Mv::new(400, 300)),
            (16, 32, Mv::new(-3, 7)),
        ] {
            let target = block(&org, x as usize, y as usize, 16, 16);
            let p = params(&target, &view, x, y, mvp, 32);
            let res = motion_search(&p, method);
            assert!(res.is_valid());
            assert!(range.is_legal(x, y, res.mv), "{} at ({},{})", res.mv, x, y);
            assert!((res.mv.x as i32 - mvp.x as i32).abs() <= MAX_MVD);
        }
    }

    #[interpolate_test(diamond, MeMethod::Diamond)]
    #[interpolate_test(tz, MeMethod::Tz)]
    #[interpolate_test(umh, MeMethod::Umh)]
    fn fast_search_is_not_worse_than_start(method: MeMethod) {
        let r = random_frame(64, 64, 14);
        let org = panned(&r, 2);
        let pic = RefPic::from_frame(0, &r, 8, None, Default::default());
        let view = pic.view();
        let target = block(&org, 24, 24, 16, 16);
        let mut p = params(&target, &view, 24, 24, Mv::ZERO, 16);
        p.me_level = ME_LEV_IPEL;
        let res = motion_search(&p, method);
        let mut ms = MotionSearch::new(&p);
        let (_, zero_cost) = ms.eval(Mv::ZERO, false);
        assert!(res.cost <= zero_cost);
    }

    #[test]
    fn partial_reference_limits_vertical_range() {
        let r = random_frame(64, 192, 15);
        let full = RefPic::from_frame(0, &r, 8, None, Default::default());
        let partial = RefPic::new(0, 64, 192, 8, Default::default());
        partial.publish_row(0, full.empty_band(0));
        let view = partial.wait_rows(1, false);
        let org = random_frame(64, 64, 16);
        let target = block(&org, 16, 32, 16, 16);
        let p = params(&target, &view, 16, 32, Mv::new(0, 40), 32);
        let res = motion_search(&p, MeMethod::Full);
        assert!(res.is_valid());
        assert!(32 + ((res.mv.y as i32 + 3) >> 2) + 16 <= 64 - MC_MARGIN);
    }

    #[test]
    fn candidate_outside_the_window_is_searched() {
        let r = random_frame(64, 64, 17);
        let org = panned(&r, 24);
        let pic = RefPic::from_frame(0, &r, 8, None, Default::default());
        let view = pic.view();
        let target = block(&org, 16, 16, 16, 16);

        /* the pan lies 24 samples away, the window reaches 4 */
        let mut p = params(&target, &view, 16, 16, Mv::ZERO, 4);
        p.me_level = ME_LEV_IPEL;
        let alone = motion_search(&p, MeMethod::Full);
        assert!(alone.dist > 0);

        let cands = [Mv::new(-8, 4), Mv::new(96, 0)];
        p.cands = &cands;
        let res = motion_search(&p, MeMethod::Full);
        assert_eq!(res.mv, Mv::new(96, 0));
        assert_eq!(res.dist, 0);
    }

    #[test]
    fn umh_walks_to_a_good_candidate() {
        let r = random_frame(64, 64, 18);
        let org = panned(&r, 20);
        let pic = RefPic::from_frame(0, &r, 8, None, Default::default());
        let view = pic.view();
        let target = block(&org, 16, 24, 16, 16);
        let cands = [Mv::new(76, 0)];
        let mut p = params(&target, &view, 16, 24, Mv::ZERO, 4);
        p.me_level = ME_LEV_IPEL;
        p.cands = &cands;
        let res = motion_search(&p, MeMethod::Umh);
        assert_eq!(res.mv, Mv::new(80, 0));
        assert_eq!(res.dist, 0);
    }

    /* a flat picture: every position has zero distortion and the start wins */
    fn flat_search(seeds: UmhSeeds) -> (MeResult, u32) {
        let mut f = Frame::new(64, 64);
        f.pad();
        let pic = RefPic::from_frame(0, &f, 8, None, Default::default());
        let view = pic.view();
        let target = vec![0i16; 16 * 16];
        let mut p = params(&target, &view, 24, 24, Mv::ZERO, 16);
        p.me_level = ME_LEV_IPEL;
        p.seeds = seeds;
        let res = motion_search(&p, MeMethod::Umh);
        let (_, start_cost) = MotionSearch::new(&p).eval(Mv::ZERO, false);
        let range = view.legal_range(16, 16);
        assert!(range.is_legal(24, 24, res.mv));
        (res, start_cost)
    }

    #[test]
    fn umh_small_threshold_exits_early() {
        let seeds = UmhSeeds {
            neighbor: Some(u32::MAX >> 2),
            uplayer: None,
        };
        let (early, start) = flat_search(seeds);
        let (full, _) = flat_search(UmhSeeds::default());
        assert!(early.cost <= start);
        assert!(full.cost <= start);
        assert_eq!(early.mv, Mv::ZERO);
        /* start, its diamond and one diamond descent */
        assert_eq!(early.points, 9);
        assert!(full.points > early.points + 64);
    }

    #[test]
    fn umh_large_threshold_runs_every_stage() {
        /* a seed below any reachable cost sends the search through the cross and hexagons */
        let seeds = UmhSeeds {
            neighbor: None,
            uplayer: Some(0),
        };
        let (res, start) = flat_search(seeds);
        let (unseeded, _) = flat_search(UmhSeeds::default());
        assert!(res.cost <= start);
        assert_eq!(res.mv, Mv::ZERO);
        assert_eq!(res.points, unseeded.points);
        assert!(res.points > 9 + 64);
    }

    #[test]
    fn joint_refine_moves_to_minimum() {
        let target = Mv::new(9, -3);
        let cost = |mv: Mv| ((mv.x as i32 - target.x as i32).abs() + (mv.y as i32 - target.y as i32).abs()) as u32;
        let (mv, c) = joint_refine(Mv::new(4, 0), ME_LEV_QPEL, cost).unwrap_or((Mv::ZERO, MAX_DISTORTION));
        /* integer step reaches (8,-4), the quarter step (9,-3) */
        assert_eq!(mv, target);
        assert_eq!(c, 0);
        assert!(joint_refine(Mv::ZERO, ME_LEV_QPEL, |_| MAX_DISTORTION).is_none());
    }
}
