use std::fmt;
use std::ops::{Add, Neg, Sub};

#[allow(non_camel_case_types)]
pub type pel = u16;

/*****************************************************************************
 * color components
 *****************************************************************************/
pub(crate) const Y_C: usize = 0; /* Y luma */
pub(crate) const U_C: usize = 1; /* Cb Chroma */
pub(crate) const V_C: usize = 2; /* Cr Chroma */
pub(crate) const N_C: usize = 3; /* number of color component */

pub(crate) const REFP_0: usize = 0;
pub(crate) const REFP_1: usize = 1;
pub(crate) const REFP_NUM: usize = 2;

/* maximum number of references per list */
pub(crate) const MAX_NUM_REF: usize = 4;
pub(crate) const REFI_INVALID: i8 = (-1);

#[inline]
pub(crate) fn REFI_IS_VALID(refi: i8) -> bool {
    refi >= 0
}

/*****************************************************************************
 * block geometry
 *****************************************************************************/
pub(crate) const MAX_CU_LOG2: usize = 6; /* 64x64 coding tree unit */
pub(crate) const MIN_CU_LOG2: usize = 3; /* 8x8 */
pub(crate) const MAX_CU_SIZE: usize = (1 << MAX_CU_LOG2);
pub(crate) const MIN_CU_SIZE: usize = (1 << MIN_CU_LOG2);
pub(crate) const MAX_CU_DIM: usize = (1 << (MAX_CU_LOG2 + MAX_CU_LOG2));
pub(crate) const NUM_CU_LEVEL: usize = MAX_CU_LOG2 - MIN_CU_LOG2 + 1;

/* maps are kept in 4x4 units */
pub(crate) const MIN_UNIT_LOG2: usize = 2;
pub(crate) const MIN_UNIT_SIZE: usize = (1 << MIN_UNIT_LOG2);
pub(crate) const MAX_CU_UNITS: usize = (MAX_CU_SIZE >> MIN_UNIT_LOG2);

pub(crate) const MAX_TR_LOG2: usize = 6;
pub(crate) const MAX_TR_DIM: usize = (1 << (MAX_TR_LOG2 + MAX_TR_LOG2));

/* stored horizontal padding of reconstructed pictures */
pub(crate) const PIC_PAD_SIZE_L: usize = 80;
pub(crate) const PIC_PAD_SIZE_C: usize = (PIC_PAD_SIZE_L >> 1);
/* samples an interpolation filter may read beyond a block edge */
pub(crate) const MC_MARGIN: i32 = 4;

/*****************************************************************************
 * motion
 *****************************************************************************/
pub(crate) const MAX_MVD: i32 = 16383;
pub(crate) const MV_SCALE_PREC: i32 = 14;
pub(crate) const MV_SCALE_MULTI: i32 = (1 << MV_SCALE_PREC);

pub(crate) const ME_LEV_IPEL: u8 = 1;
pub(crate) const ME_LEV_HPEL: u8 = 2;
pub(crate) const ME_LEV_QPEL: u8 = 3;

/* maximum entries of any candidate list */
pub(crate) const MAX_CAND_NUM: usize = 8;

pub(crate) const MAX_COST: f64 = 1.7e+308; /* maximum cost value */
pub(crate) const MAX_DISTORTION: u32 = std::u32::MAX;

/*****************************************************************************
 * transform and quantization
 *****************************************************************************/
pub(crate) const QUANT_SHIFT: i32 = 14;
pub(crate) const QUANT_IQUANT_SHIFT: i32 = 20;
pub(crate) const MAX_TX_DYNAMIC_RANGE: i32 = 15;
pub(crate) const MAX_QP: u8 = 51;

/* CABAC (START) */
pub(crate) type SBAC_CTX_MODEL = u16;
pub(crate) const PROB_INIT: SBAC_CTX_MODEL = 512; /* 1/2 of initialization with mps = 0 */
/* CABAC (END) */

/* fractional bits are counted in 1/32768 bit */
pub(crate) const BIT_FRAC_SHIFT: u32 = 15;

/// Quarter-pel motion vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Mv {
    pub x: i16,
    pub y: i16,
}

impl Mv {
    pub const ZERO: Mv = Mv { x: 0, y: 0 };

    pub const fn new(x: i16, y: i16) -> Self {
        Mv { x, y }
    }

    pub(crate) fn from_i32(x: i32, y: i32) -> Self {
        Mv {
            x: x.max(std::i16::MIN as i32).min(std::i16::MAX as i32) as i16,
            y: y.max(std::i16::MIN as i32).min(std::i16::MAX as i32) as i16,
        }
    }

    /* round to the nearest integer-pel position, keeping quarter-pel units */
    pub(crate) fn round_ipel(self) -> Self {
        Mv::from_i32(
            ((self.x as i32 + 2) >> 2) << 2,
            ((self.y as i32 + 2) >> 2) << 2,
        )
    }

    pub(crate) fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0
    }
}

impl Add for Mv {
    type Output = Mv;
    fn add(self, o: Mv) -> Mv {
        Mv::from_i32(self.x as i32 + o.x as i32, self.y as i32 + o.y as i32)
    }
}

impl Sub for Mv {
    type Output = Mv;
    fn sub(self, o: Mv) -> Mv {
        Mv::from_i32(self.x as i32 - o.x as i32, self.y as i32 - o.y as i32)
    }
}

impl Neg for Mv {
    type Output = Mv;
    fn neg(self) -> Mv {
        Mv::from_i32(-(self.x as i32), -(self.y as i32))
    }
}

impl fmt::Display for Mv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/*****************************************************************************
 * CU types
 *****************************************************************************/
#[allow(non_camel_case_types)]
#[derive(Debug, FromPrimitive, ToPrimitive, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CuType {
    SKIP = 0,
    P2Nx2N = 1,
    P2NxN = 2,
    PNx2N = 3,
    P2NxnU = 4,
    P2NxnD = 5,
    PnLx2N = 6,
    PnRx2N = 7,
    I2Nx2N = 8,
    INxN = 9,
    I2Nxn = 10,
    Inx2N = 11,
}

pub(crate) const NUM_CU_TYPE: usize = 12;

impl Default for CuType {
    fn default() -> Self {
        CuType::I2Nx2N
    }
}

/// Offset and size of one prediction unit inside its CU, in luma samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PuGeom {
    pub x: u8,
    pub y: u8,
    pub w: u8,
    pub h: u8,
}

impl PuGeom {
    const fn new(x: usize, y: usize, w: usize, h: usize) -> Self {
        PuGeom {
            x: x as u8,
            y: y as u8,
            w: w as u8,
            h: h as u8,
        }
    }
}

impl CuType {
    pub fn is_intra(self) -> bool {
        self as usize >= CuType::I2Nx2N as usize
    }

    pub fn is_inter(self) -> bool {
        !self.is_intra()
    }

    pub fn is_amp(self) -> bool {
        match self {
            CuType::P2NxnU | CuType::P2NxnD | CuType::PnLx2N | CuType::PnRx2N => true,
            _ => false,
        }
    }

    /* one transform block per prediction unit */
    pub(crate) fn has_pu_tu(self) -> bool {
        match self {
            CuType::INxN | CuType::I2Nxn | CuType::Inx2N => true,
            _ => false,
        }
    }

    pub fn num_parts(self) -> usize {
        match self {
            CuType::SKIP | CuType::P2Nx2N | CuType::I2Nx2N => 1,
            CuType::INxN | CuType::I2Nxn | CuType::Inx2N => 4,
            _ => 2,
        }
    }

    /* symmetric two-partition sibling of an asymmetric type */
    pub(crate) fn amp_sibling(self) -> Option<CuType> {
        match self {
            CuType::P2NxnU | CuType::P2NxnD => Some(CuType::P2NxN),
            CuType::PnLx2N | CuType::PnRx2N => Some(CuType::PNx2N),
            _ => None,
        }
    }

    pub fn part_geom(self, log2_size: usize) -> [PuGeom; 4] {
        let s = 1usize << log2_size;
        let h = s >> 1;
        let q = s >> 2;
        let z = PuGeom::default();
        match self {
            CuType::SKIP | CuType::P2Nx2N | CuType::I2Nx2N => [PuGeom::new(0, 0, s, s), z, z, z],
            CuType::P2NxN => [PuGeom::new(0, 0, s, h), PuGeom::new(0, h, s, h), z, z],
            CuType::PNx2N => [PuGeom::new(0, 0, h, s), PuGeom::new(h, 0, h, s), z, z],
            CuType::P2NxnU => [PuGeom::new(0, 0, s, q), PuGeom::new(0, q, s, s - q), z, z],
            CuType::P2NxnD => [PuGeom::new(0, 0, s, s - q), PuGeom::new(0, s - q, s, q), z, z],
            CuType::PnLx2N => [PuGeom::new(0, 0, q, s), PuGeom::new(q, 0, s - q, s), z, z],
            CuType::PnRx2N => [PuGeom::new(0, 0, s - q, s), PuGeom::new(s - q, 0, q, s), z, z],
            CuType::INxN => [
                PuGeom::new(0, 0, h, h),
                PuGeom::new(h, 0, h, h),
                PuGeom::new(0, h, h, h),
                PuGeom::new(h, h, h, h),
            ],
            CuType::I2Nxn => [
                PuGeom::new(0, 0, s, q),
                PuGeom::new(0, q, s, q),
                PuGeom::new(0, 2 * q, s, q),
                PuGeom::new(0, 3 * q, s, q),
            ],
            CuType::Inx2N => [
                PuGeom::new(0, 0, q, s),
                PuGeom::new(q, 0, q, s),
                PuGeom::new(2 * q, 0, q, s),
                PuGeom::new(3 * q, 0, q, s),
            ],
        }
    }
}

/*****************************************************************************
 * prediction direction
 *****************************************************************************/
#[allow(non_camel_case_types)]
#[derive(Debug, FromPrimitive, ToPrimitive, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredDir {
    /* list 0 only */
    PRED_FWD = 0,
    /* list 1 only */
    PRED_BWD = 1,
    /* list 0 searched, list 1 mirrored by distance */
    PRED_SYM = 2,
    /* list 0 and list 1 searched jointly */
    PRED_BID = 3,
    /* two list 0 references, second MV derived from the first */
    PRED_DUAL = 4,
}

impl Default for PredDir {
    fn default() -> Self {
        PredDir::PRED_FWD
    }
}

impl PredDir {
    pub(crate) fn uses_two(self) -> bool {
        match self {
            PredDir::PRED_FWD | PredDir::PRED_BWD => false,
            _ => true,
        }
    }
}

/*****************************************************************************
 * skip / direct submodes
 *****************************************************************************/
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipMode {
    SKIP_TEMPORAL,
    /* reference index of the second hypothesis */
    SKIP_WEIGHTED(u8),
    SKIP_BID,
    SKIP_BWD,
    SKIP_SYM,
    SKIP_FWD,
}

impl Default for SkipMode {
    fn default() -> Self {
        SkipMode::SKIP_TEMPORAL
    }
}

impl SkipMode {
    /* index signalled in the bitstream */
    pub(crate) fn code_index(self) -> usize {
        match self {
            SkipMode::SKIP_TEMPORAL => 0,
            SkipMode::SKIP_WEIGHTED(r) => r as usize,
            SkipMode::SKIP_BID => 1,
            SkipMode::SKIP_BWD => 2,
            SkipMode::SKIP_SYM => 3,
            SkipMode::SKIP_FWD => 4,
        }
    }
}

/*****************************************************************************
 * transform split
 *****************************************************************************/
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuSplit {
    TU_NO_SPLIT = 0,
    TU_QUAD_SPLIT = 1,
}

impl Default for TuSplit {
    fn default() -> Self {
        TuSplit::TU_NO_SPLIT
    }
}

/*****************************************************************************
 * intra prediction direction
 *****************************************************************************/
pub(crate) const IPD_CNT: usize = 5;

#[allow(non_camel_case_types)]
#[derive(Debug, FromPrimitive, ToPrimitive, Clone, Copy, PartialEq, Eq)]
pub enum IntraPredDir {
    IPD_DC = 0,
    IPD_HOR = 1, /* Horizontal */
    IPD_VER = 2, /* Vertical */
    IPD_UL = 3,
    IPD_UR = 4,
}

impl Default for IntraPredDir {
    fn default() -> Self {
        IntraPredDir::IPD_DC
    }
}

pub(crate) static IPD_ALL: [IntraPredDir; IPD_CNT] = [
    IntraPredDir::IPD_DC,
    IntraPredDir::IPD_HOR,
    IntraPredDir::IPD_VER,
    IntraPredDir::IPD_UL,
    IntraPredDir::IPD_UR,
];

/*****************************************************************************
 * per 4x4 unit map
 *****************************************************************************/
pub(crate) const MCU_CODED: u8 = 1 << 0;
pub(crate) const MCU_INTRA: u8 = 1 << 1;
pub(crate) const MCU_SKIP: u8 = 1 << 2;
pub(crate) const MCU_ZERO_RESI: u8 = 1 << 3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapUnit {
    pub flags: u8,
    pub cu_type: CuType,
    pub dir: PredDir,
    pub refi: [i8; REFP_NUM],
    pub mv: [Mv; REFP_NUM],
    pub ipm: IntraPredDir,
    pub log2_size: u8,
}

impl Default for MapUnit {
    fn default() -> Self {
        MapUnit {
            flags: 0,
            cu_type: CuType::I2Nx2N,
            dir: PredDir::PRED_FWD,
            refi: [REFI_INVALID; REFP_NUM],
            mv: [Mv::ZERO; REFP_NUM],
            ipm: IntraPredDir::IPD_DC,
            log2_size: 0,
        }
    }
}

impl MapUnit {
    #[inline]
    pub fn is_coded(&self) -> bool {
        self.flags & MCU_CODED != 0
    }
    #[inline]
    pub fn is_intra(&self) -> bool {
        self.flags & MCU_INTRA != 0
    }
    #[inline]
    pub fn is_skip(&self) -> bool {
        self.flags & MCU_SKIP != 0
    }
    #[inline]
    pub fn is_zero_resi(&self) -> bool {
        self.flags & MCU_ZERO_RESI != 0
    }
    /* usable as a motion neighbor */
    #[inline]
    pub(crate) fn is_inter(&self) -> bool {
        self.is_coded() && !self.is_intra()
    }
}

/// Motion of one prediction unit.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PuInfo {
    pub geom: PuGeom,
    pub dir: PredDir,
    pub refi: [i8; REFP_NUM],
    pub mv: [Mv; REFP_NUM],
    pub mvd: [Mv; REFP_NUM],
}

/// Decision of one coding unit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CuInfo {
    pub x: u16,
    pub y: u16,
    pub log2_size: u8,
    pub cu_type: CuType,
    pub pu: [PuInfo; 4],
    pub tu_split: TuSplit,
    /* bit i (0..3) luma transform block i, bit 4 Cb, bit 5 Cr */
    pub cbp: u8,
    pub qp: u8,
    pub skip_mode: Option<SkipMode>,
    pub ipm: [IntraPredDir; 4],
    pub ipm_c: IntraPredDir,
}

pub(crate) const CBP_CB: u8 = 1 << 4;
pub(crate) const CBP_CR: u8 = 1 << 5;
pub(crate) const CBP_LUMA: u8 = 0x0f;

impl CuInfo {
    pub fn size(&self) -> usize {
        1 << self.log2_size
    }

    pub fn num_parts(&self) -> usize {
        self.cu_type.num_parts()
    }

    /* skip without residual */
    pub fn is_skip(&self) -> bool {
        self.cu_type == CuType::SKIP && self.cbp == 0
    }

    /* skip-family candidate coded with residual */
    pub fn is_direct(&self) -> bool {
        self.cu_type == CuType::SKIP && self.cbp != 0
    }

    pub(crate) fn num_luma_tb(&self) -> usize {
        if self.cu_type.has_pu_tu() || self.tu_split == TuSplit::TU_QUAD_SPLIT {
            4
        } else {
            1
        }
    }
}
