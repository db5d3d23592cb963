use crate::def::*;
use crate::tbl::*;

lazy_static! {
    /* -log2(p) in 1/32768 bit for p = (i + 0.5) / 1024 */
    pub(crate) static ref entropy_bits: Box<[i32]> = {
        let mut bits = vec![0; 1024].into_boxed_slice();
        for i in 0..1024 {
            let p = (512.0 * (i as f64 + 0.5)) / 1024.0;
            bits[i] = (-32768.0 * (p.log10() / (2.0f64).log10() - 9.0)) as i32;
        }
        bits
    };

    /* exp-Golomb length of every mvd in -MV_BITS_BASE..MV_BITS_BASE */
    static ref evce_tbl_mv_bits_data: Box<[u8]> = {
        let mut bits = vec![0u8; 2 * MV_BITS_BASE + 1].into_boxed_slice();
        for i in 0..bits.len() {
            let mvd = i as i32 - MV_BITS_BASE as i32;
            bits[i] = get_exp_golomb_bits(mvd.abs() as u32) as u8;
        }
        bits
    };
}

const MV_BITS_BASE: usize = 2048;

pub(crate) fn biari_no_bits(symbol: u32, cm: SBAC_CTX_MODEL) -> i32 {
    let mps = cm & 1;
    let mut state = cm >> 1;
    let sym = if symbol != 0 { 1 } else { 0 };
    state = if sym != mps { state } else { 512 - state };

    entropy_bits[((state as usize) << 1).min(1023)]
}

#[inline]
pub(crate) fn get_exp_golomb_bits(abs_mvd: u32) -> u32 {
    let mut bits = 0;

    /* abs(mvd) */
    let mut nn = (abs_mvd + 1) >> 1;
    let mut len_i = 0;
    while len_i < 16 && nn != 0 {
        nn >>= 1;
        len_i += 1;
    }
    let len_c = (len_i << 1) + 1;

    bits += len_c;

    /* sign */
    if abs_mvd != 0 {
        bits += 1;
    }

    bits
}

#[inline]
fn mvd_bits(mvd: i32) -> u32 {
    if mvd > MV_BITS_BASE as i32 || mvd <= -(MV_BITS_BASE as i32) {
        get_exp_golomb_bits(mvd.abs() as u32)
    } else {
        evce_tbl_mv_bits_data[(MV_BITS_BASE as i32 + mvd) as usize] as u32
    }
}

pub(crate) fn get_mv_bits(mvd_x: i32, mvd_y: i32, num_refp: usize, refi: i8) -> u32 {
    let mut bits = mvd_bits(mvd_x) + mvd_bits(mvd_y);
    if REFI_IS_VALID(refi) {
        bits += evc_tbl_refi_bits[num_refp.min(MAX_NUM_REF)][(refi as usize).min(MAX_NUM_REF - 1)] as u32;
    }

    bits
}

#[inline]
pub(crate) fn MV_COST(lambda_mv: u32, mv_bits: u32) -> u32 {
    ((lambda_mv as u64 * mv_bits as u64 + (1 << 15)) >> 16) as u32
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn exp_golomb_lengths() {
        assert_eq!(get_exp_golomb_bits(0), 1);
        assert_eq!(get_exp_golomb_bits(1), 4);
        assert_eq!(get_exp_golomb_bits(2), 4);
        assert_eq!(get_exp_golomb_bits(3), 6);
        assert_eq!(get_exp_golomb_bits(5000), 2 * 12 + 1 + 1);
    }

    #[test]
    fn mv_bits_add_reference_cost() {
        assert_eq!(get_mv_bits(0, 0, 1, 0), 2);
        assert_eq!(get_mv_bits(0, 0, 4, 3), 2 + 3);
        assert_eq!(get_mv_bits(-1, 1, 2, 1), 4 + 4 + 1);
        assert_eq!(get_mv_bits(4000, 0, 1, 0), get_exp_golomb_bits(4000) + 1);
    }

    #[test]
    fn mv_cost_rounds() {
        assert_eq!(MV_COST(65536, 3), 3);
        assert_eq!(MV_COST(32768, 3), 2);
        assert_eq!(MV_COST(u32::MAX, 40), ((u32::MAX as u64 * 40 + 32768) >> 16) as u32);
    }

    #[test]
    fn equiprobable_bin_costs_one_bit() {
        let b0 = biari_no_bits(0, PROB_INIT);
        let b1 = biari_no_bits(1, PROB_INIT);
        assert_eq!(b0, b1);
        assert!((b0 - 32768).abs() < 64);
    }
}
