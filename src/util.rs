use super::def::*;

/* clipping within min and max */
#[inline]
pub(crate) fn EVC_CLIP3<T: PartialOrd>(min_x: T, max_x: T, value: T) -> T {
    if value < min_x {
        min_x
    } else if value > max_x {
        max_x
    } else {
        value
    }
}

#[inline]
fn scale_comp(v: i32, dist_dst: i32, ratio: i32) -> i32 {
    let p = v as i64 * dist_dst as i64 * ratio as i64;
    let s = if p < 0 {
        -((-p + (1 << (MV_SCALE_PREC - 1))) >> MV_SCALE_PREC)
    } else {
        (p + (1 << (MV_SCALE_PREC - 1))) >> MV_SCALE_PREC
    };
    s as i32
}

/* scale mv by dist_dst / dist_src in 14 bit fixed point */
pub(crate) fn evc_scale_mv(mv: Mv, dist_dst: i32, dist_src: i32) -> Mv {
    if dist_src == 0 || dist_dst == dist_src {
        return mv;
    }
    let ratio = MV_SCALE_MULTI / dist_src;
    Mv::from_i32(
        scale_comp(mv.x as i32, dist_dst, ratio),
        scale_comp(mv.y as i32, dist_dst, ratio),
    )
}

/* field pictures: vertical components carry a +-2 quarter-pel parity offset */
pub(crate) fn evc_scale_mv_field(
    mv: Mv,
    dist_dst: i32,
    dist_src: i32,
    delta_src: i32,
    delta_dst: i32,
) -> Mv {
    if dist_src == 0 {
        return mv;
    }
    let ratio = MV_SCALE_MULTI / dist_src;
    Mv::from_i32(
        scale_comp(mv.x as i32, dist_dst, ratio),
        scale_comp(mv.y as i32 + delta_src, dist_dst, ratio) - delta_dst,
    )
}

/* median of three mv components with the sign outlier rule */
pub(crate) fn evc_mvp_median(a: i32, b: i32, c: i32) -> i32 {
    let na = a < 0;
    let nb = b < 0;
    let nc = c < 0;

    if na != nb && na != nc {
        return (b + c) / 2;
    }
    if nb != na && nb != nc {
        return (a + c) / 2;
    }
    if nc != na && nc != nb {
        return (a + b) / 2;
    }

    let dab = (a - b).abs();
    let dbc = (b - c).abs();
    let dac = (a - c).abs();
    if dab <= dbc && dab <= dac {
        (a + b) / 2
    } else if dbc <= dac {
        (b + c) / 2
    } else {
        (a + c) / 2
    }
}

pub(crate) fn scan_tbl(size: i16) -> Box<[u16]> {
    let mut pos = 0;
    let num_line = size + size - 1;
    let mut scan = vec![0; (size * size) as usize].into_boxed_slice();
    /* starting point */
    scan[pos] = 0;
    pos += 1;

    /* loop */
    for l in 1..num_line {
        if l % 2 != 0 {
            /* decreasing loop */
            let mut x = std::cmp::min(l, size - 1);
            let mut y = std::cmp::max(0, l - (size - 1));

            while x >= 0 && y < size {
                scan[pos] = (y * size + x) as u16;
                pos += 1;
                x -= 1;
                y += 1;
            }
        } else
        /* increasing loop */
        {
            let mut y = std::cmp::min(l, size - 1);
            let mut x = std::cmp::max(0, l - (size - 1));
            while y >= 0 && x < size {
                scan[pos] = (y * size + x) as u16;
                pos += 1;
                x += 1;
                y -= 1;
            }
        }
    }

    scan
}

/* DCT-II basis scaled by 64 * sqrt(c), row k holds frequency k */
pub(crate) fn evc_init_multi_tbl(c: usize) -> Box<[i16]> {
    let mut tm = vec![0i16; c * c].into_boxed_slice();
    let s = (c as f64).sqrt() * 64.0;

    for k in 0..c {
        for n in 0..c {
            let a = std::f64::consts::PI * k as f64 * (2.0 * n as f64 + 1.0) / (2.0 * c as f64);
            let b = if k == 0 { 1.0 / c as f64 } else { 2.0 / c as f64 };
            let v = a.cos() * b.sqrt();
            tm[k * c + n] = (s * v + if v > 0.0 { 0.5 } else { -0.5 }) as i16;
        }
    }

    tm
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn median_sign_outlier() {
        /* one negative among non-negatives: average of the other two */
        assert_eq!(evc_mvp_median(-8, 4, 6), 5);
        assert_eq!(evc_mvp_median(4, -8, 6), 5);
        assert_eq!(evc_mvp_median(4, 6, -8), 5);
        /* zero counts as non-negative */
        assert_eq!(evc_mvp_median(0, -4, -6), -5);
    }

    #[test]
    fn median_closest_pair() {
        assert_eq!(evc_mvp_median(1, 10, 12), 11);
        assert_eq!(evc_mvp_median(10, 1, 12), 11);
        assert_eq!(evc_mvp_median(-1, -3, -20), -2);
        /* ties keep the first pair */
        assert_eq!(evc_mvp_median(0, 2, 4), 1);
    }

    #[test]
    fn scale_is_identity_for_equal_distance() {
        let mv = Mv::new(13, -7);
        assert_eq!(evc_scale_mv(mv, 3, 3), mv);
        assert_eq!(evc_scale_mv(mv, 2, 1), Mv::new(26, -14));
        assert_eq!(evc_scale_mv(Mv::new(16, -16), 1, 2), Mv::new(8, -8));
        assert_eq!(evc_scale_mv(Mv::new(16, 16), -1, 1), Mv::new(-16, -16));
    }

    #[test]
    fn field_scaling_applies_parity() {
        let mv = Mv::new(8, 8);
        assert_eq!(evc_scale_mv_field(mv, 1, 1, 2, 0), Mv::new(8, 10));
        assert_eq!(evc_scale_mv_field(mv, 1, 1, 0, 2), Mv::new(8, 6));
    }

    #[test]
    fn dct_basis_matches_integer_dct4() {
        let tm = evc_init_multi_tbl(4);
        assert_eq!(&tm[0..4], &[64, 64, 64, 64][..]);
        assert_eq!(&tm[4..8], &[84, 35, -35, -84][..]);
        assert_eq!(&tm[8..12], &[64, -64, -64, 64][..]);
    }

    #[test]
    fn zigzag_scan_4x4() {
        let s = scan_tbl(4);
        assert_eq!(&s[..6], &[0, 1, 4, 8, 5, 2][..]);
    }
}
