use super::ctu::{CtuEncoder, CtuWindow};
use super::eco::*;
use super::mode::*;
use super::sad::*;
use super::sbac::*;
use super::EncCtx;
use crate::api::*;
use crate::def::*;
use crate::ipred::*;

/* luma modes of a partition promoted to residual RDO */
pub(crate) const INTRA_RDO_NUM: usize = 2;
/* rough cost ratio to the best mode above which a mode is not promoted */
const INTRA_EXIT_RATIO: f64 = 1.5;

/// Reference samples of a w x h block of plane `c` at (px, py), plane
/// coordinates. Missing samples take the last available one scanning from the
/// bottom of the left column up to the corner then right along the row above,
/// or mid grey when nothing is available.
pub(crate) fn intra_refs(
    win: &CtuWindow,
    c: usize,
    px: usize,
    py: usize,
    w: usize,
    h: usize,
    bit_depth: usize,
    up: &mut [pel],
    left: &mut [pel],
) {
    let (x, y) = (px as i32, py as i32);
    let read = |sx: i32, sy: i32| {
        if win.sample_avail(c, sx, sy) {
            Some(win.sample(c, sx, sy))
        } else {
            None
        }
    };

    /* scan order: left bottom to top, corner, above left to right */
    let mut line: Vec<Option<pel>> = Vec::with_capacity(h + 1 + 2 * w);
    for j in (0..h as i32).rev() {
        line.push(read(x - 1, y + j));
    }
    line.push(read(x - 1, y - 1));
    for i in 0..2 * w as i32 {
        line.push(read(x + i, y - 1));
    }

    let mut last = match line.iter().flatten().next() {
        Some(&v) => v,
        None => (1 << (bit_depth - 1)) as pel,
    };
    let vals: Vec<pel> = line
        .iter()
        .map(|s| {
            if let Some(v) = s {
                last = *v;
            }
            last
        })
        .collect();

    for j in 0..h {
        left[j] = vals[h - 1 - j];
    }
    up[..=2 * w].copy_from_slice(&vals[h..h + 1 + 2 * w]);
}

/* intra mode of the unit covering (px, py) */
fn neighbor_ipm(win: &CtuWindow, px: i32, py: i32) -> Option<IntraPredDir> {
    win.unit(px, py).filter(|u| u.is_intra()).map(|u| u.ipm)
}

#[inline]
fn lambda_bits(lambda: f64, bits: u64) -> f64 {
    lambda * bits as f64 / (1 << BIT_FRAC_SHIFT) as f64
}

/* chroma modes tried: luma mode first, then DC, HOR, VER */
fn chroma_candidates(ipm_l: IntraPredDir) -> Vec<IntraPredDir> {
    let mut v = vec![ipm_l];
    for &m in [IntraPredDir::IPD_DC, IntraPredDir::IPD_HOR, IntraPredDir::IPD_VER].iter() {
        if !v.contains(&m) {
            v.push(m);
        }
    }
    v
}

impl<E: EntropyEstimator> CtuEncoder<E> {
    /// Mode search of an intra CU type. Each partition picks its luma mode by
    /// rough SATD cost then residual RDO among the best few, its reconstruction
    /// feeding the next partition; chroma follows on the whole CU.
    pub(crate) fn analyze_intra(
        &mut self,
        ctx: &EncCtx<'_>,
        sctx: &CuSyntaxCtx,
        entry: &E,
        x: usize,
        y: usize,
        log2_size: usize,
        cu_type: CuType,
    ) -> f64 {
        let cfg = ctx.cfg;
        let fp = ctx.fp;
        let bd = fp.bit_depth;
        let level = log2_size - MIN_CU_LOG2;
        let size = 1 << log2_size;
        let geom = cu_type.part_geom(log2_size);
        let mut sctx = *sctx;

        let win = &mut self.win;
        let data = &mut self.temp[level];
        data.info = CuInfo {
            x: x as u16,
            y: y as u16,
            log2_size: log2_size as u8,
            cu_type,
            qp: fp.qp,
            ..Default::default()
        };
        data.nnz = [0; 6];

        let mut up = vec![0 as pel; 2 * MAX_CU_SIZE + 1];
        let mut left = vec![0 as pel; MAX_CU_SIZE];
        let mut buf = vec![0 as pel; MAX_CU_DIM];
        let mut coef = vec![0i16; MAX_CU_DIM];
        let mut reco = vec![0 as pel; MAX_CU_DIM];
        let mut best_coef = vec![0i16; MAX_CU_DIM];
        let mut best_reco = vec![0 as pel; MAX_CU_DIM];

        for k in 0..cu_type.num_parts() {
            let g = geom[k];
            let (gx, gy, w, h) = (g.x as usize, g.y as usize, g.w as usize, g.h as usize);
            let (px, py) = (x + gx, y + gy);
            let (lw, lh) = (g.w.trailing_zeros() as usize, g.h.trailing_zeros() as usize);

            let mpm = evc_get_mpm(
                neighbor_ipm(win, px as i32 - 1, py as i32),
                neighbor_ipm(win, px as i32, py as i32 - 1),
            );
            sctx.mpm[k] = mpm;
            intra_refs(win, Y_C, px, py, w, h, bd, &mut up, &mut left);
            let (org, s_org) = ctx.org_block(Y_C, px, py);

            let mut rough: Vec<(f64, IntraPredDir)> = IPD_ALL
                .iter()
                .map(|&m| {
                    ctx.ipred.predict(m, &up, &left, &mut buf, w, h);
                    let satd = evce_satd_16b(w, h, org, s_org, &buf, w);
                    let mut e = entry.clone();
                    evce_eco_intra_dir(&mut e, m, &mpm);
                    (satd as f64 + lambda_bits(fp.sqrt_lambda, e.bits() - entry.bits()), m)
                })
                .collect();
            sort_by_cost(&mut rough);
            let first = rough[0].0;
            let cands: Vec<IntraPredDir> = rough
                .iter()
                .take(INTRA_RDO_NUM)
                .filter(|(c, _)| !cfg.heuristics.intra_ratio_exit || *c <= first * INTRA_EXIT_RATIO)
                .map(|&(_, m)| m)
                .collect();

            let mut best = (MAX_COST, IntraPredDir::IPD_DC, 0u16);
            for &m in cands.iter() {
                ctx.ipred.predict(m, &up, &left, &mut buf, w, h);
                let nnz = code_tb(ctx, Y_C, px, py, &buf, w, lw, lh, true, false, &mut coef, &mut reco, w);
                let mut e = entry.clone();
                evce_eco_intra_dir(&mut e, m, &mpm);
                if nnz > 0 {
                    let (cw, ch) = ctx.tq.coef_dims(lw, lh);
                    evce_eco_run_length_cc(&mut e, &coef, cw, ch, nnz as usize, Y_C);
                }
                let dist = evce_ssd_16b(w, h, org, s_org, &reco, w);
                let cost = dist as f64 + lambda_bits(fp.lambda, e.bits() - entry.bits());
                if cost < best.0 {
                    best = (cost, m, nnz);
                    best_coef[..w * h].copy_from_slice(&coef[..w * h]);
                    best_reco[..w * h].copy_from_slice(&reco[..w * h]);
                }
            }

            let (_, ipm, nnz) = best;
            data.info.ipm[k] = ipm;
            data.nnz[k] = nnz;
            data.coef[Y_C][k * w * h..(k + 1) * w * h].copy_from_slice(&best_coef[..w * h]);
            for j in 0..h {
                let d = (gy + j) * size + gx;
                data.reco[Y_C][d..d + w].copy_from_slice(&best_reco[j * w..(j + 1) * w]);
            }
            data.luma_dims = ctx.tq.coef_dims(lw, lh);

            /* later partitions predict from this one */
            win.put_block(Y_C, px, py, w, h, &best_reco, w);
            win.set_units(
                px,
                py,
                w,
                h,
                MapUnit {
                    flags: MCU_CODED | MCU_INTRA,
                    cu_type,
                    ipm,
                    refi: [REFI_INVALID; REFP_NUM],
                    log2_size: log2_size as u8,
                    ..Default::default()
                },
            );
        }
        data.info.tu_split = TuSplit::TU_NO_SPLIT;

        /* chroma, one block per component */
        let log2_c = log2_size - 1;
        let s = size >> 1;
        let n = s * s;
        let (cx, cy) = (x >> 1, y >> 1);
        let mut refs: Vec<(Vec<pel>, Vec<pel>)> = Vec::with_capacity(2);
        for c in U_C..N_C {
            intra_refs(win, c, cx, cy, s, s, bd, &mut up, &mut left);
            refs.push((up[..=2 * s].to_vec(), left[..s].to_vec()));
        }
        let mut best_c = MAX_COST;
        let mut coef_c = [vec![0i16; n], vec![0i16; n]];
        let mut reco_c = [vec![0 as pel; n], vec![0 as pel; n]];
        for m in chroma_candidates(data.info.ipm[0]) {
            let mut e = entry.clone();
            evce_eco_intra_dir_c(&mut e, m, data.info.ipm[0]);
            let mut dist = 0u64;
            let mut nnz = [0u16; 2];
            for c in U_C..N_C {
                let i = c - U_C;
                ctx.ipred.predict(m, &refs[i].0, &refs[i].1, &mut buf, s, s);
                nnz[i] = code_tb(ctx, c, cx, cy, &buf, s, log2_c, log2_c, true, false, &mut coef_c[i], &mut reco_c[i], s);
                if nnz[i] > 0 {
                    let (cw, ch) = ctx.tq.coef_dims(log2_c, log2_c);
                    evce_eco_run_length_cc(&mut e, &coef_c[i], cw, ch, nnz[i] as usize, c);
                }
                let (org, s_org) = ctx.org_block(c, cx, cy);
                dist += evce_ssd_16b(s, s, org, s_org, &reco_c[i], s);
            }
            let cost = cfg.chroma_weight * dist as f64 + lambda_bits(fp.lambda, e.bits() - entry.bits());
            if cost < best_c {
                best_c = cost;
                data.info.ipm_c = m;
                for c in U_C..N_C {
                    let i = c - U_C;
                    data.coef[c][..n].copy_from_slice(&coef_c[i]);
                    data.reco[c][..n].copy_from_slice(&reco_c[i]);
                    data.nnz[3 + c] = nnz[i];
                }
            }
        }
        data.chroma_dims = ctx.tq.coef_dims(log2_c, log2_c);

        data.update_cbp();
        let cost = finish_cost(ctx, &sctx, entry, data);
        win.clear(x, y, size);
        self.keep_if_better(level);
        cost
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::enc::test_util::*;
    use crate::picman::test::random_frame;
    use crate::picman::RefPic;
    use pretty_assertions::assert_eq;

    fn window(w: usize, h: usize) -> CtuWindow {
        let pic = RefPic::new(0, w, h, 8, [vec![], vec![]]);
        let mut win = CtuWindow::new(w, h);
        win.load(0, 0, &pic.empty_band(0), &pic, [None, None, None]);
        win
    }

    #[test]
    fn refs_default_to_mid_grey() {
        let win = window(64, 64);
        let mut up = vec![0; 17];
        let mut left = vec![0; 8];
        intra_refs(&win, Y_C, 0, 0, 8, 8, 10, &mut up, &mut left);
        assert!(up.iter().chain(left.iter()).all(|&v| v == 512));
    }

    #[test]
    fn refs_substitute_from_the_left_column() {
        let mut win = window(64, 64);
        let col: Vec<pel> = (0..8).map(|v| 100 + v).collect();
        win.put_block(Y_C, 0, 8, 8, 8, &col.repeat(8), 8);
        win.set_units(
            0,
            8,
            8,
            8,
            MapUnit {
                flags: MCU_CODED | MCU_INTRA,
                ..Default::default()
            },
        );
        let mut up = vec![0; 17];
        let mut left = vec![0; 8];
        intra_refs(&win, Y_C, 8, 8, 8, 8, 8, &mut up, &mut left);
        /* left column is the last column of the coded block */
        assert!(left.iter().all(|&v| v == 107));
        /* corner and row above fall back to the topmost left sample */
        assert!(up.iter().all(|&v| v == 107));
    }

    #[test]
    fn chroma_candidates_start_with_luma() {
        assert_eq!(
            chroma_candidates(IntraPredDir::IPD_UL),
            vec![
                IntraPredDir::IPD_UL,
                IntraPredDir::IPD_DC,
                IntraPredDir::IPD_HOR,
                IntraPredDir::IPD_VER
            ]
        );
        assert_eq!(chroma_candidates(IntraPredDir::IPD_HOR).len(), 3);
    }

    #[test]
    fn flat_block_picks_a_residual_free_mode() {
        let mut org = Frame::new(64, 64);
        for p in org.planes.iter_mut() {
            for y in 0..p.height {
                p.row_mut(y).iter_mut().for_each(|v| *v = 128);
            }
            p.pad();
        }
        let fx = Fixture::new(EncoderConfig::new(64, 64), SliceType::ST_I, &org, &[], &[]);
        let ctx = fx.ctx(1);
        let mut enc = CtuEncoder::new(64, 64, &SbacEstimator::new());
        let pic = RefPic::new(0, 64, 64, 8, [vec![], vec![]]);
        enc.win.load(0, 0, &pic.empty_band(0), &pic, [None, None, None]);
        let e = SbacEstimator::new();
        let sctx = enc.syntax_ctx(&ctx, &enc.win.neighbors(0, 0, 16, 16));
        let cost = enc.analyze_intra(&ctx, &sctx, &e, 0, 0, 4, CuType::I2Nx2N);
        let best = &enc.best[1];
        assert_eq!(best.cost, cost);
        assert_eq!(best.info.cbp, 0);
        assert!(best.reco[Y_C].iter().all(|&v| v == 128));
        /* the trial leaves no coded units behind */
        assert!(enc.win.unit(0, 0).is_none());
    }

    #[test]
    fn sub_partitions_code_every_part() {
        let org = random_frame(64, 64, 61);
        let fx = Fixture::new(EncoderConfig::new(64, 64), SliceType::ST_I, &org, &[], &[]);
        let ctx = fx.ctx(1);
        let mut enc = CtuEncoder::new(64, 64, &SbacEstimator::new());
        let pic = RefPic::new(0, 64, 64, 8, [vec![], vec![]]);
        enc.win.load(0, 0, &pic.empty_band(0), &pic, [None, None, None]);
        let e = SbacEstimator::new();
        let sctx = enc.syntax_ctx(&ctx, &enc.win.neighbors(0, 0, 8, 8));
        let cost = enc.analyze_intra(&ctx, &sctx, &e, 0, 0, 3, CuType::INxN);
        assert!(cost < MAX_COST);
        let best = &enc.best[0];
        assert_eq!(best.info.cu_type, CuType::INxN);
        assert_eq!(best.luma_dims, (2, 2));
        /* random content leaves residual in every 4x4 */
        assert_eq!(best.info.cbp & CBP_LUMA, CBP_LUMA);
    }
}
