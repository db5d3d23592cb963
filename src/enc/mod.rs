pub(crate) mod ctu;
pub(crate) mod eco;
pub(crate) mod me;
pub(crate) mod mode;
pub(crate) mod mvp;
pub(crate) mod pinter;
pub(crate) mod pintra;
pub(crate) mod sad;
pub(crate) mod sbac;
pub(crate) mod skip;
pub(crate) mod tbl;
pub(crate) mod tq;
pub(crate) mod util;

pub use ctu::{CuNode, CuTree};

use super::api::frame::*;
use super::api::*;
use super::def::*;
use super::ipred::*;
use super::picman::*;
use super::tbl::*;

use ctu::{CtuEdge, CtuEncoder};
use sbac::*;
use tq::*;

use log::*;
use num_traits::FromPrimitive;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

/* lagrangian multiplier of the SSD/bits trade off */
fn evce_lambda(qp: u8, bit_depth: usize) -> f64 {
    0.57 * 2f64.powf((qp as f64 - 12.0) / 3.0) * 4f64.powi(bit_depth as i32 - 8)
}

/*****************************************************************************
 * frame parameters
 *****************************************************************************/
/// Everything about the current frame the mode decision reads, built once.
#[derive(Clone, Debug, Default)]
pub(crate) struct FrameParams {
    pub(crate) slice_type: SliceType,
    pub(crate) poc: i32,
    pub(crate) qp: u8,
    pub(crate) qp_c: [u8; 2],
    pub(crate) lambda: f64,
    pub(crate) sqrt_lambda: f64,
    pub(crate) lambda_mv: u32,
    pub(crate) num_refp: [usize; REFP_NUM],
    pub(crate) ref_poc: [[i32; MAX_NUM_REF]; REFP_NUM],
    /* POC distance to each reference, never zero */
    pub(crate) dist: [[i32; MAX_NUM_REF]; REFP_NUM],
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) bit_depth: usize,
    pub(crate) w_unit: usize,
    pub(crate) h_unit: usize,
    /* allowed CU types per level for this slice and configuration */
    pub(crate) valid_cu_type: [[bool; NUM_CU_TYPE]; NUM_CU_LEVEL],
}

impl FrameParams {
    pub(crate) fn new(cfg: &EncoderConfig, slice_type: SliceType, poc: i32, refs: &RefLists) -> Result<Self, EncError> {
        let lists = match slice_type {
            SliceType::ST_I => 0,
            SliceType::ST_P | SliceType::ST_F => 1,
            SliceType::ST_B => 2,
        };
        let mut num_refp = [0; REFP_NUM];
        let mut ref_poc = [[0; MAX_NUM_REF]; REFP_NUM];
        let mut dist = [[1; MAX_NUM_REF]; REFP_NUM];
        for lidx in 0..lists {
            let n = refs.num_refs(lidx);
            if n == 0 {
                return Err(EncError::MissingReference(slice_type, 1, lidx));
            }
            num_refp[lidx] = n;
            for (r, p) in refs.list[lidx].iter().enumerate() {
                if p.poc == poc {
                    return Err(EncError::ReferencePocCollision(p.poc));
                }
                ref_poc[lidx][r] = p.poc;
                dist[lidx][r] = evc_poc_dist(poc, p.poc);
            }
        }

        let qp = cfg.qp;
        let qp_c = [cfg.cb_qp_offset, cfg.cr_qp_offset]
            .map(|o| evc_tbl_qp_chroma[(qp as i32 + o as i32).max(0).min(MAX_QP as i32) as usize]);
        let lambda = evce_lambda(qp, cfg.bit_depth);
        let sqrt_lambda = lambda.sqrt();

        let mut valid_cu_type = evc_tbl_valid_cu_type;
        for level in valid_cu_type.iter_mut() {
            for t in 0..NUM_CU_TYPE {
                let cu_type = match CuType::from_usize(t) {
                    Some(c) => c,
                    None => continue,
                };
                let sdip = cu_type == CuType::I2Nxn || cu_type == CuType::Inx2N;
                if (slice_type.is_intra() && cu_type.is_inter())
                    || (!cfg.enable_amp && cu_type.is_amp())
                    || (!cfg.enable_sdip && sdip)
                {
                    level[t] = false;
                }
            }
        }

        Ok(FrameParams {
            slice_type,
            poc,
            qp,
            qp_c,
            lambda,
            sqrt_lambda,
            lambda_mv: (65536.0 * sqrt_lambda) as u32,
            num_refp,
            ref_poc,
            dist,
            width: cfg.width,
            height: cfg.height,
            bit_depth: cfg.bit_depth,
            w_unit: (cfg.width + MIN_UNIT_SIZE - 1) >> MIN_UNIT_LOG2,
            h_unit: (cfg.height + MIN_UNIT_SIZE - 1) >> MIN_UNIT_LOG2,
            valid_cu_type,
        })
    }
}

/* CTU rows of a reference a CTU row may read: its own rows plus the search reach */
pub(crate) fn ref_rows_needed(cfg: &EncoderConfig, row: usize) -> usize {
    let reach = cfg.search_range + 2 * MC_MARGIN as usize;
    row + 1 + ((reach + MAX_CU_SIZE - 1) >> MAX_CU_LOG2)
}

/// Read-only state shared by every CTU of a row.
pub(crate) struct EncCtx<'a> {
    pub(crate) cfg: &'a EncoderConfig,
    pub(crate) fp: &'a FrameParams,
    pub(crate) org: &'a Frame,
    pub(crate) refs: [Vec<RefView<'a>>; REFP_NUM],
    pub(crate) tq: &'a dyn TransformQuant,
    pub(crate) ipred: &'a dyn IntraPredictor,
}

impl<'a> EncCtx<'a> {
    /// Blocks until the reference rows CTU row `row` may read are published.
    pub(crate) fn new(
        cfg: &'a EncoderConfig,
        fp: &'a FrameParams,
        org: &'a Frame,
        refs: &'a RefLists,
        row: usize,
        tq: &'a dyn TransformQuant,
        ipred: &'a dyn IntraPredictor,
    ) -> Self {
        let rows = ref_rows_needed(cfg, row);
        let view = |lidx: usize| -> Vec<RefView<'a>> {
            refs.list[lidx]
                .iter()
                .take(fp.num_refp[lidx])
                .map(|p| p.wait_rows(rows, cfg.use_prefiltered_subpel))
                .collect()
        };
        EncCtx {
            cfg,
            fp,
            org,
            refs: [view(REFP_0), view(REFP_1)],
            tq,
            ipred,
        }
    }

    /// Original samples of plane `c` from (x, y) on, with the plane stride.
    #[inline]
    pub(crate) fn org_block(&self, c: usize, x: usize, y: usize) -> (&'a [pel], usize) {
        let p = &self.org.planes[c];
        (&p.data[y * p.stride + p.xpad + x..], p.stride)
    }
}

/*****************************************************************************
 * results
 *****************************************************************************/
/// Counts of the decided CUs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModeStats {
    /// Leaves per `CuType`, indexed by `CuType as usize`.
    pub cu_types: [usize; NUM_CU_TYPE],
    /// Skip CUs without residual.
    pub skip: usize,
    /// Skip family CUs coded with residual.
    pub direct: usize,
    /// Nodes that chose to split.
    pub splits: usize,
}

impl ModeStats {
    pub(crate) fn add(&mut self, cu: &CuInfo) {
        self.cu_types[cu.cu_type as usize] += 1;
        if cu.is_skip() {
            self.skip += 1;
        } else if cu.is_direct() {
            self.direct += 1;
        }
    }

    /// Adds the leaves and split nodes of a decided CTU.
    pub fn add_tree(&mut self, tree: &CuTree) {
        for n in tree.nodes() {
            if let Some(cu) = &n.leaf {
                self.add(cu);
            }
            if n.children.iter().any(|c| c.is_some()) {
                self.splits += 1;
            }
        }
    }

    pub fn merge(&mut self, o: &ModeStats) {
        for (a, b) in self.cu_types.iter_mut().zip(o.cu_types.iter()) {
            *a += b;
        }
        self.skip += o.skip;
        self.direct += o.direct;
        self.splits += o.splits;
    }

    pub fn num_cus(&self) -> usize {
        self.cu_types.iter().sum()
    }

    pub fn num_intra(&self) -> usize {
        self.cu_types[CuType::I2Nx2N as usize..].iter().sum()
    }
}

/// Decision of one CTU.
#[derive(Clone, Debug)]
pub struct CtuResult<E> {
    pub x: usize,
    pub y: usize,
    pub tree: CuTree,
    pub cost: f64,
    /// Entropy state after the CTU.
    pub state: E,
}

/// Decisions of a frame and its reconstruction.
pub struct FrameResult<E> {
    pub poc: i32,
    pub slice_type: SliceType,
    /// CTUs in raster order.
    pub ctus: Vec<CtuResult<E>>,
    pub cost: f64,
    pub stats: ModeStats,
    pub recon: Arc<RefPic>,
}

/*****************************************************************************
 * frame encoder
 *****************************************************************************/
/// Mode decision of whole frames over the configured services.
pub struct FrameEncoder<E: EntropyEstimator = SbacEstimator> {
    cfg: EncoderConfig,
    proto: E,
    tq: Box<dyn TransformQuant>,
    ipred: Box<dyn IntraPredictor>,
}

impl FrameEncoder<SbacEstimator> {
    pub fn new(cfg: EncoderConfig) -> Result<Self, EncError> {
        FrameEncoder::with_services(cfg, SbacEstimator::new(), Box::new(DefaultTq), Box::new(DefaultIntra))
    }
}

/* shared by the row workers of one frame */
struct FrameJob<'a> {
    cfg: &'a EncoderConfig,
    fp: &'a FrameParams,
    org: &'a Frame,
    refs: &'a RefLists,
    tq: &'a dyn TransformQuant,
    ipred: &'a dyn IntraPredictor,
    recon: &'a RefPic,
    cols: usize,
    edges: Vec<OnceLock<CtuEdge>>,
    progress: Vec<RowProgress>,
}

impl<'a> FrameJob<'a> {
    /* one CTU row; waits for the row above to stay two CTUs ahead */
    fn encode_row<E: EntropyEstimator>(&self, row: usize, proto: &E) -> (Vec<CtuResult<E>>, ModeStats) {
        let ctx = EncCtx::new(self.cfg, self.fp, self.org, self.refs, row, self.tq, self.ipred);
        let mut enc = CtuEncoder::new(self.cfg.width, self.cfg.height, proto);
        let mut band = self.recon.empty_band(row);
        let mut e = proto.clone();
        e.reset();

        let y0 = row << MAX_CU_LOG2;
        let mut stats = ModeStats::default();
        let mut ctus = Vec::with_capacity(self.cols);
        for col in 0..self.cols {
            let x0 = col << MAX_CU_LOG2;
            let mut above = [None, None, None];
            if row > 0 {
                self.progress[row - 1].wait_for((col + 2).min(self.cols));
                for (i, a) in above.iter_mut().enumerate() {
                    let c = col as isize + i as isize - 1;
                    if c >= 0 && (c as usize) < self.cols {
                        *a = self.edges[(row - 1) * self.cols + c as usize].get();
                    }
                }
            }
            enc.win.load(x0, y0, &band, self.recon, above);
            let cost = enc.compress_ctu(&ctx, &mut e);
            enc.win.store_into(&mut band, self.recon);
            let _ = self.edges[row * self.cols + col].set(enc.win.edge());
            self.progress[row].set_at_least(col + 1);
            stats.add_tree(&enc.tree);
            ctus.push(CtuResult {
                x: x0,
                y: y0,
                tree: enc.tree.clone(),
                cost,
                state: e.clone(),
            });
        }

        self.recon.pad_band(&mut band);
        self.recon.publish_row(row, band);
        debug!(
            "poc {} row {}: cost {:.1}, {} CUs ({} skip)",
            self.fp.poc,
            row,
            ctus.iter().map(|c| c.cost).sum::<f64>(),
            stats.num_cus(),
            stats.skip
        );
        (ctus, stats)
    }
}

impl<E: EntropyEstimator> FrameEncoder<E> {
    /// Encoder over a custom entropy estimator, transform and intra predictor.
    pub fn with_services(
        mut cfg: EncoderConfig,
        proto: E,
        tq: Box<dyn TransformQuant>,
        ipred: Box<dyn IntraPredictor>,
    ) -> Result<Self, EncError> {
        cfg.validate()?;
        Ok(FrameEncoder { cfg, proto, tq, ipred })
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.cfg
    }

    /// Empty reconstruction of the frame with POC `poc`. Later frames may
    /// reference it while its rows are still being encoded.
    pub fn create_recon(&self, poc: i32, refs: &RefLists) -> Arc<RefPic> {
        Arc::new(RefPic::new(poc, self.cfg.width, self.cfg.height, self.cfg.bit_depth, refs.pocs()))
    }

    pub fn encode_frame(
        &self,
        org: &Frame,
        slice_type: SliceType,
        poc: i32,
        refs: &RefLists,
    ) -> Result<FrameResult<E>, EncError> {
        let recon = self.create_recon(poc, refs);
        self.encode_frame_into(org, slice_type, refs, recon)
    }

    /// Encodes `org` publishing each finished CTU row into `recon`.
    pub fn encode_frame_into(
        &self,
        org: &Frame,
        slice_type: SliceType,
        refs: &RefLists,
        recon: Arc<RefPic>,
    ) -> Result<FrameResult<E>, EncError> {
        let cfg = &self.cfg;
        if org.width() != cfg.width || org.height() != cfg.height {
            return Err(EncError::FrameSizeMismatch(org.width(), org.height(), cfg.width, cfg.height));
        }
        if recon.width() != cfg.width || recon.height() != cfg.height {
            return Err(EncError::FrameSizeMismatch(recon.width(), recon.height(), cfg.width, cfg.height));
        }
        let fp = FrameParams::new(cfg, slice_type, recon.poc, refs)?;

        let rows = cfg.h_ctu();
        let cols = cfg.w_ctu();
        let job = FrameJob {
            cfg,
            fp: &fp,
            org,
            refs,
            tq: self.tq.as_ref(),
            ipred: self.ipred.as_ref(),
            recon: &recon,
            cols,
            edges: (0..rows * cols).map(|_| OnceLock::new()).collect(),
            progress: (0..rows).map(|_| RowProgress::default()).collect(),
        };

        let workers = cfg.wpp_threads.min(rows).max(1);
        let mut done: Vec<(usize, Vec<CtuResult<E>>, ModeStats)> = if workers == 1 {
            (0..rows)
                .map(|r| {
                    let (ctus, stats) = job.encode_row(r, &self.proto);
                    (r, ctus, stats)
                })
                .collect()
        } else {
            /* one pool thread per worker: a row job blocks on the row above */
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("avsrdo-row-{}", i))
                .build()
                .map_err(|e| EncError::ThreadPool(e.to_string()))?;
            let out = Mutex::new(Vec::with_capacity(rows));
            let protos: Vec<E> = (0..workers).map(|_| self.proto.clone()).collect();
            let job = &job;
            let out_ref = &out;
            pool.scope(move |s| {
                for (w, proto) in protos.into_iter().enumerate() {
                    s.spawn(move |_| {
                        for r in (w..rows).step_by(workers) {
                            let (ctus, stats) = job.encode_row(r, &proto);
                            out_ref.lock().push((r, ctus, stats));
                        }
                    });
                }
            });
            out.into_inner()
        };
        done.sort_by_key(|d| d.0);

        let mut stats = ModeStats::default();
        let mut ctus = Vec::with_capacity(rows * cols);
        for (_, row, s) in done {
            stats.merge(&s);
            ctus.extend(row);
        }
        let cost = ctus.iter().map(|c| c.cost).sum();
        debug!(
            "poc {} {}-slice: cost {:.1}, {} CUs, {} skip, {} direct, {} intra",
            fp.poc,
            slice_type,
            cost,
            stats.num_cus(),
            stats.skip,
            stats.direct,
            stats.num_intra()
        );

        Ok(FrameResult {
            poc: fp.poc,
            slice_type,
            ctus,
            cost,
            stats,
            recon,
        })
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::picman::test::random_frame;
    use pretty_assertions::assert_eq;

    fn leaves(r: &FrameResult<SbacEstimator>) -> Vec<CuInfo> {
        r.ctus.iter().flat_map(|c| c.tree.leaves().cloned().collect::<Vec<_>>()).collect()
    }

    #[test]
    fn lambda_follows_qp() {
        let mut cfg = EncoderConfig::new(64, 64);
        cfg.qp = 12;
        let fp = FrameParams::new(&cfg, SliceType::ST_I, 0, &RefLists::new()).unwrap();
        assert!((fp.lambda - 0.57).abs() < 1e-9);
        assert_eq!(fp.lambda_mv, (65536.0 * 0.57f64.sqrt()) as u32);
        cfg.qp = 15;
        let fp = FrameParams::new(&cfg, SliceType::ST_I, 0, &RefLists::new()).unwrap();
        assert!((fp.lambda - 1.14).abs() < 1e-9);
    }

    #[test]
    fn intra_slice_masks_inter_types() {
        let mut cfg = EncoderConfig::new(64, 64);
        cfg.enable_amp = false;
        let fp = FrameParams::new(&cfg, SliceType::ST_I, 0, &RefLists::new()).unwrap();
        for level in fp.valid_cu_type.iter() {
            assert!(!level[CuType::SKIP as usize]);
            assert!(!level[CuType::P2Nx2N as usize]);
        }
        assert!(fp.valid_cu_type[0][CuType::INxN as usize]);
        assert!(!fp.valid_cu_type[2][CuType::P2NxnU as usize]);
    }

    #[test]
    fn missing_references_are_reported() {
        let cfg = EncoderConfig::new(64, 64);
        assert_eq!(
            FrameParams::new(&cfg, SliceType::ST_P, 4, &RefLists::new()).err(),
            Some(EncError::MissingReference(SliceType::ST_P, 1, 0))
        );
        let f = random_frame(64, 64, 1);
        let mut refs = RefLists::new();
        refs.push(REFP_0, Arc::new(RefPic::from_frame(3, &f, 8, None, Default::default()))).unwrap();
        assert_eq!(
            FrameParams::new(&cfg, SliceType::ST_B, 4, &refs).err(),
            Some(EncError::MissingReference(SliceType::ST_B, 1, 1))
        );
        assert_eq!(
            FrameParams::new(&cfg, SliceType::ST_P, 3, &refs).err(),
            Some(EncError::ReferencePocCollision(3))
        );
        let fp = FrameParams::new(&cfg, SliceType::ST_P, 5, &refs).unwrap();
        assert_eq!(fp.dist[REFP_0][0], 2);
    }

    #[test]
    fn frame_size_must_match() {
        let enc = FrameEncoder::new(EncoderConfig::new(64, 64)).unwrap();
        let f = random_frame(128, 64, 2);
        assert_eq!(
            enc.encode_frame(&f, SliceType::ST_I, 0, &RefLists::new()).err(),
            Some(EncError::FrameSizeMismatch(128, 64, 64, 64))
        );
        assert!(FrameEncoder::new(EncoderConfig::new(60, 64)).is_err());
    }

    #[test]
    fn static_frame_is_skipped() {
        let org = random_frame(128, 64, 3);
        let mut cfg = EncoderConfig::new(128, 64);
        cfg.search_range = 8;
        let enc = FrameEncoder::new(cfg).unwrap();
        let intra = enc.encode_frame(&org, SliceType::ST_I, 0, &RefLists::new()).unwrap();
        assert!(intra.recon.is_complete());
        assert_eq!(intra.stats.num_intra(), intra.stats.num_cus());

        /* a reference identical to the original */
        let mut refs = RefLists::new();
        refs.push(REFP_0, Arc::new(RefPic::from_frame(0, &org, 8, None, Default::default()))).unwrap();
        let inter = enc.encode_frame(&org, SliceType::ST_P, 1, &refs).unwrap();
        assert_eq!(inter.ctus.len(), 2);
        for cu in leaves(&inter) {
            assert!(cu.is_skip());
            assert_eq!(cu.log2_size as usize, MAX_CU_LOG2);
            assert_eq!(cu.pu[0].mv[REFP_0], Mv::ZERO);
        }
        assert_eq!(inter.stats.skip, 2);
    }

    #[test]
    fn wavefront_matches_raster_order() {
        let org = random_frame(128, 128, 4);
        let refp = random_frame(128, 128, 5);
        let mut cfg = EncoderConfig::new(128, 128);
        cfg.search_range = 8;
        cfg.me_method = MeMethod::Diamond;
        cfg.min_cu_log2 = 4;
        let mut refs = RefLists::new();
        refs.push(REFP_0, Arc::new(RefPic::from_frame(0, &refp, 8, None, Default::default()))).unwrap();

        let seq = FrameEncoder::new(cfg).unwrap().encode_frame(&org, SliceType::ST_P, 1, &refs).unwrap();
        cfg.wpp_threads = 2;
        let par = FrameEncoder::new(cfg).unwrap().encode_frame(&org, SliceType::ST_P, 1, &refs).unwrap();

        assert_eq!(seq.cost, par.cost);
        assert_eq!(seq.stats, par.stats);
        assert_eq!(leaves(&seq), leaves(&par));
    }

    fn exhaustive(width: usize, height: usize) -> EncoderConfig {
        let mut cfg = EncoderConfig::new(width, height);
        cfg.search_range = 8;
        cfg.me_method = MeMethod::Diamond;
        cfg.heuristics = EncoderHeuristics::none();
        cfg
    }

    /* leaves tile the frame, nodes keep the cheaper alternative, motion stays legal */
    fn check_decisions(r: &FrameResult<SbacEstimator>, refs: &RefLists, width: usize, height: usize) {
        let area: usize = leaves(r).iter().map(|cu| cu.size() * cu.size()).sum();
        assert_eq!(area, width * height);

        let views: [Vec<RefView<'_>>; REFP_NUM] = [
            refs.list[REFP_0].iter().map(|p| p.view()).collect(),
            refs.list[REFP_1].iter().map(|p| p.view()).collect(),
        ];
        for ctu in r.ctus.iter() {
            for n in ctu.tree.nodes() {
                assert_eq!(n.cost, n.cost_large.min(n.cost_split));
            }
        }
        for cu in leaves(r).iter().filter(|cu| cu.cu_type.is_inter()) {
            for pu in cu.pu[..cu.num_parts()].iter() {
                let g = pu.geom;
                assert!(pinter::motion_is_legal(
                    &views,
                    (cu.x + g.x as u16) as i32,
                    (cu.y + g.y as u16) as i32,
                    g.w as usize,
                    g.h as usize,
                    pu.dir,
                    pu.refi,
                    pu.mv,
                ));
            }
        }
    }

    #[test]
    fn stats_count_the_final_tree() {
        let org = random_frame(128, 128, 7);
        let refp = random_frame(128, 128, 8);
        let mut refs = RefLists::new();
        refs.push(REFP_0, Arc::new(RefPic::from_frame(0, &refp, 8, None, Default::default()))).unwrap();
        let r = FrameEncoder::new(exhaustive(128, 128)).unwrap().encode_frame(&org, SliceType::ST_P, 1, &refs).unwrap();

        let split_nodes = r
            .ctus
            .iter()
            .flat_map(|c| c.tree.nodes().iter())
            .filter(|n| n.children.iter().any(|c| c.is_some()))
            .count();
        let all = leaves(&r);
        assert_eq!(r.stats.num_cus(), all.len());
        assert_eq!(r.stats.splits, split_nodes);
        assert_eq!(r.stats.skip, all.iter().filter(|cu| cu.is_skip()).count());
        assert_eq!(r.stats.num_intra(), all.iter().filter(|cu| cu.cu_type.is_intra()).count());
    }

    #[test]
    fn unpruned_search_keeps_consistent_decisions() {
        let org = random_frame(128, 64, 9);
        let mut refs = RefLists::new();
        refs.push(REFP_0, Arc::new(RefPic::from_frame(0, &random_frame(128, 64, 10), 8, None, Default::default())))
            .unwrap();
        let enc = FrameEncoder::new(exhaustive(128, 64)).unwrap();
        let p = enc.encode_frame(&org, SliceType::ST_P, 1, &refs).unwrap();
        check_decisions(&p, &refs, 128, 64);

        let org = random_frame(64, 64, 11);
        let mut refs = RefLists::new();
        refs.push(REFP_0, Arc::new(RefPic::from_frame(0, &random_frame(64, 64, 12), 8, None, Default::default())))
            .unwrap();
        refs.push(REFP_1, Arc::new(RefPic::from_frame(2, &random_frame(64, 64, 13), 8, None, Default::default())))
            .unwrap();
        let enc = FrameEncoder::new(exhaustive(64, 64)).unwrap();
        let b = enc.encode_frame(&org, SliceType::ST_B, 1, &refs).unwrap();
        assert_eq!(b.slice_type, SliceType::ST_B);
        check_decisions(&b, &refs, 64, 64);
    }

    #[test]
    fn recon_is_usable_as_a_reference() {
        let org = random_frame(64, 128, 6);
        let mut cfg = EncoderConfig::new(64, 128);
        cfg.search_range = 8;
        let enc = FrameEncoder::new(cfg).unwrap();
        let first = enc.encode_frame(&org, SliceType::ST_I, 0, &RefLists::new()).unwrap();
        let mut refs = RefLists::new();
        refs.push(REFP_0, first.recon.clone()).unwrap();
        let second = enc.encode_frame(&org, SliceType::ST_P, 1, &refs).unwrap();
        assert!(second.cost < first.cost);
        assert_eq!(second.recon.ref_poc[REFP_0], vec![0]);
    }
}
