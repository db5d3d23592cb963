pub mod config;
pub mod frame;

pub use config::*;
pub use frame::*;

pub use crate::def::{
    pel, CuInfo, CuType, IntraPredDir, MapUnit, Mv, PredDir, PuGeom, PuInfo, SkipMode, TuSplit,
};
pub use crate::enc::sbac::{CtxId, EntropyEstimator, SbacEstimator};
pub use crate::enc::tq::{DefaultTq, TransformQuant};
pub use crate::enc::{CtuResult, CuNode, CuTree, FrameEncoder, FrameResult, ModeStats};
pub use crate::ipred::{DefaultIntra, IntraPredictor};
pub use crate::picman::{RefLists, RefPic};

use std::fmt;
use thiserror::Error;

/*****************************************************************************
 * errors
 *****************************************************************************/
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncError {
    #[error("invalid picture size {0}x{1}: must be a non-zero multiple of 8")]
    InvalidDimensions(usize, usize),
    #[error("unsupported bit depth {0}")]
    InvalidBitDepth(usize),
    #[error("qp {0} out of range 0..=51")]
    InvalidQp(u8),
    #[error("invalid CU level range {0}..={1}")]
    InvalidCuRange(usize, usize),
    #[error("{0} slice needs at least {1} reference(s) in list {2}")]
    MissingReference(SliceType, usize, usize),
    #[error("too many references in list {0}: {1}")]
    TooManyReferences(usize, usize),
    #[error("frame size {0}x{1} does not match the configured {2}x{3}")]
    FrameSizeMismatch(usize, usize, usize, usize),
    #[error("reference POC {0} equals the current POC")]
    ReferencePocCollision(i32),
    #[error("cannot start the row workers: {0}")]
    ThreadPool(String),
}

/*****************************************************************************
 * slice type
 *****************************************************************************/
#[allow(non_camel_case_types)]
#[derive(Debug, FromPrimitive, ToPrimitive, Clone, Copy, PartialEq, Eq)]
pub enum SliceType {
    /* intra only */
    ST_I = 0,
    /* forward prediction from list 0 */
    ST_P = 1,
    /* forward prediction from list 0 with dual hypothesis */
    ST_F = 2,
    /* bi-directional prediction from list 0 and list 1 */
    ST_B = 3,
}

impl Default for SliceType {
    fn default() -> Self {
        SliceType::ST_I
    }
}

impl SliceType {
    pub fn is_intra(self) -> bool {
        self == SliceType::ST_I
    }

    pub fn is_b(self) -> bool {
        self == SliceType::ST_B
    }

    /* P and F slices predict from list 0 only */
    pub fn is_forward(self) -> bool {
        self == SliceType::ST_P || self == SliceType::ST_F
    }
}

impl fmt::Display for SliceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::SliceType::*;
        match self {
            ST_I => write!(f, "I"),
            ST_P => write!(f, "P"),
            ST_F => write!(f, "F"),
            ST_B => write!(f, "B"),
        }
    }
}
