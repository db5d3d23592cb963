use super::def::*;

/* reference index bits, truncated unary: [number of references][refi] */
#[rustfmt::skip]
pub(crate) static evc_tbl_refi_bits: [[u8; MAX_NUM_REF]; MAX_NUM_REF + 1] = [
    [ 0, 0, 0, 0 ],
    [ 0, 0, 0, 0 ],
    [ 1, 1, 0, 0 ],
    [ 1, 2, 2, 0 ],
    [ 1, 2, 3, 3 ],
];

/* fixed proxy bits of a skip/direct submode, by coded index */
#[rustfmt::skip]
pub(crate) static evc_tbl_skip_mode_bits: [u32; 5] = [ 1, 2, 3, 4, 4 ];

/* luma SAD under which a trial is coded without residual: [qp >> 3][log2 size - 3] */
#[rustfmt::skip]
pub(crate) static evc_tbl_zero_resi_thd: [[u32; NUM_CU_LEVEL]; 7] = [
    [  16,   64,  256,  1024 ],
    [  32,  128,  512,  2048 ],
    [  64,  256, 1024,  4096 ],
    [ 128,  512, 2048,  8192 ],
    [ 192,  768, 3072, 12288 ],
    [ 320, 1280, 5120, 20480 ],
    [ 512, 2048, 8192, 32768 ],
];

/* CU types allowed per level, before slice type and tool switches: [log2 size - 3][CuType] */
#[rustfmt::skip]
pub(crate) static evc_tbl_valid_cu_type: [[bool; NUM_CU_TYPE]; NUM_CU_LEVEL] = [
    /*  SKIP  2Nx2N 2NxN  Nx2N  2NxnU 2NxnD nLx2N nRx2N I2Nx2N INxN  I2Nxn Inx2N */
    [ true, true, true, true, false, false, false, false, true, true, false, false ], /*  8x8  */
    [ true, true, true, true, true,  true,  true,  true,  true, false, true,  true  ], /* 16x16 */
    [ true, true, true, true, true,  true,  true,  true,  true, false, true,  true  ], /* 32x32 */
    [ true, true, true, true, true,  true,  true,  true,  true, false, false, false ], /* 64x64 */
];

/* UMH early termination factors per level */
#[rustfmt::skip]
pub(crate) static evc_tbl_umh_beta_small: [f64; NUM_CU_LEVEL] = [ 0.04, 0.03, 0.02, 0.01 ];
#[rustfmt::skip]
pub(crate) static evc_tbl_umh_beta_large: [f64; NUM_CU_LEVEL] = [ 0.15, 0.12, 0.08, 0.06 ];

/* 16 point uneven hexagon, scaled per ring */
#[rustfmt::skip]
pub(crate) static evc_tbl_big_hexagon: [[i16; 2]; 16] = [
    [ 0,  4], [-2,  3], [-4,  2], [-4,  1], [-4,  0], [-4, -1], [-4, -2], [-2, -3],
    [ 0, -4], [ 2, -3], [ 4, -2], [ 4, -1], [ 4,  0], [ 4,  1], [ 4,  2], [ 2,  3],
];

#[rustfmt::skip]
pub(crate) static evc_tbl_hexagon: [[i16; 2]; 6] = [
    [-2, 0], [-1, -2], [1, -2], [2, 0], [1, 2], [-1, 2],
];

#[rustfmt::skip]
pub(crate) static evc_tbl_diamond: [[i16; 2]; 4] = [
    [0, -1], [-1, 0], [1, 0], [0, 1],
];

/* 3x3 spiral, center first */
#[rustfmt::skip]
pub(crate) static evc_tbl_spiral9: [[i16; 2]; 9] = [
    [ 0,  0], [ 0, -1], [-1,  0], [ 1,  0], [ 0,  1],
    [-1, -1], [ 1, -1], [-1,  1], [ 1,  1],
];

/* 5x5 spiral around a center, center excluded */
#[rustfmt::skip]
pub(crate) static evc_tbl_spiral25: [[i16; 2]; 24] = [
    [ 0, -1], [-1,  0], [ 1,  0], [ 0,  1],
    [-1, -1], [ 1, -1], [-1,  1], [ 1,  1],
    [ 0, -2], [-2,  0], [ 2,  0], [ 0,  2],
    [-1, -2], [ 1, -2], [-2, -1], [ 2, -1], [-2,  1], [ 2,  1], [-1,  2], [ 1,  2],
    [-2, -2], [ 2, -2], [-2,  2], [ 2,  2],
];

/* 8 fractional neighbors, ordered as the spiral */
#[rustfmt::skip]
pub(crate) static evc_tbl_spel_pattern: [[i16; 2]; 8] = [
    [ 0, -1], [-1,  0], [ 1,  0], [ 0,  1],
    [-1, -1], [ 1, -1], [-1,  1], [ 1,  1],
];

#[rustfmt::skip]
pub(crate) static evc_tbl_qp_chroma: [u8; 52] = [
     0,  1,  2,  3,  4,  5,  6,  7,  8,  9, 10, 11, 12, 13, 14, 15,
    16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 29, 30,
    31, 32, 32, 33, 34, 34, 35, 35, 36, 36, 37, 37, 38, 38, 38, 39,
    39, 39, 39, 39,
];

#[rustfmt::skip]
pub(crate) static evc_tbl_quant_scale: [i32; 6] = [ 26214, 23302, 20560, 18396, 16384, 14564 ];
#[rustfmt::skip]
pub(crate) static evc_tbl_dq_scale: [i32; 6] = [ 40, 45, 51, 57, 64, 72 ];
