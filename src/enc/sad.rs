use crate::def::*;

/* SAD ***********************************************************************/
pub(crate) fn evce_sad_16b<A, B>(w: usize, h: usize, src1: &[A], s1: usize, src2: &[B], s2: usize) -> u32
where
    A: Copy + Into<i32>,
    B: Copy + Into<i32>,
{
    let mut sad = 0u32;
    for y in 0..h {
        let a = &src1[y * s1..y * s1 + w];
        let b = &src2[y * s2..y * s2 + w];
        for (&p, &q) in a.iter().zip(b.iter()) {
            sad += (p.into() - q.into()).abs() as u32;
        }
    }
    sad
}

/* SSD ***********************************************************************/
pub(crate) fn evce_ssd_16b(w: usize, h: usize, src1: &[pel], s1: usize, src2: &[pel], s2: usize) -> u64 {
    let mut ssd = 0u64;
    for y in 0..h {
        let a = &src1[y * s1..y * s1 + w];
        let b = &src2[y * s2..y * s2 + w];
        for (&p, &q) in a.iter().zip(b.iter()) {
            let d = p as i64 - q as i64;
            ssd += (d * d) as u64;
        }
    }
    ssd
}

/* SATD **********************************************************************/
fn evc_had_4x4(diff: &[i32; 16]) -> u32 {
    let mut m = [0i32; 16];
    let mut d = [0i32; 16];

    for j in 0..4 {
        let r = &diff[j * 4..j * 4 + 4];
        m[j * 4] = r[0] + r[3];
        m[j * 4 + 1] = r[1] + r[2];
        m[j * 4 + 2] = r[1] - r[2];
        m[j * 4 + 3] = r[0] - r[3];
        d[j * 4] = m[j * 4] + m[j * 4 + 1];
        d[j * 4 + 2] = m[j * 4] - m[j * 4 + 1];
        d[j * 4 + 1] = m[j * 4 + 2] + m[j * 4 + 3];
        d[j * 4 + 3] = m[j * 4 + 3] - m[j * 4 + 2];
    }
    for i in 0..4 {
        m[i] = d[i] + d[12 + i];
        m[4 + i] = d[4 + i] + d[8 + i];
        m[8 + i] = d[4 + i] - d[8 + i];
        m[12 + i] = d[i] - d[12 + i];
        d[i] = m[i] + m[4 + i];
        d[8 + i] = m[i] - m[4 + i];
        d[4 + i] = m[8 + i] + m[12 + i];
        d[12 + i] = m[12 + i] - m[8 + i];
    }

    let sum: u32 = d.iter().map(|v| v.abs() as u32).sum();
    (sum + 1) >> 1
}

fn evc_had_8x8(diff: &[i32; 64]) -> u32 {
    let mut m1 = [[0i32; 8]; 8];
    let mut m2 = [[0i32; 8]; 8];
    let mut m3 = [[0i32; 8]; 8];

    for j in 0..8 {
        let r = &diff[j * 8..j * 8 + 8];
        m2[j][0] = r[0] + r[4];
        m2[j][1] = r[1] + r[5];
        m2[j][2] = r[2] + r[6];
        m2[j][3] = r[3] + r[7];
        m2[j][4] = r[0] - r[4];
        m2[j][5] = r[1] - r[5];
        m2[j][6] = r[2] - r[6];
        m2[j][7] = r[3] - r[7];

        m1[j][0] = m2[j][0] + m2[j][2];
        m1[j][1] = m2[j][1] + m2[j][3];
        m1[j][2] = m2[j][0] - m2[j][2];
        m1[j][3] = m2[j][1] - m2[j][3];
        m1[j][4] = m2[j][4] + m2[j][6];
        m1[j][5] = m2[j][5] + m2[j][7];
        m1[j][6] = m2[j][4] - m2[j][6];
        m1[j][7] = m2[j][5] - m2[j][7];

        m2[j][0] = m1[j][0] + m1[j][1];
        m2[j][1] = m1[j][0] - m1[j][1];
        m2[j][2] = m1[j][2] + m1[j][3];
        m2[j][3] = m1[j][2] - m1[j][3];
        m2[j][4] = m1[j][4] + m1[j][5];
        m2[j][5] = m1[j][4] - m1[j][5];
        m2[j][6] = m1[j][6] + m1[j][7];
        m2[j][7] = m1[j][6] - m1[j][7];
    }

    for i in 0..8 {
        m3[0][i] = m2[0][i] + m2[4][i];
        m3[1][i] = m2[1][i] + m2[5][i];
        m3[2][i] = m2[2][i] + m2[6][i];
        m3[3][i] = m2[3][i] + m2[7][i];
        m3[4][i] = m2[0][i] - m2[4][i];
        m3[5][i] = m2[1][i] - m2[5][i];
        m3[6][i] = m2[2][i] - m2[6][i];
        m3[7][i] = m2[3][i] - m2[7][i];

        m1[0][i] = m3[0][i] + m3[2][i];
        m1[1][i] = m3[1][i] + m3[3][i];
        m1[2][i] = m3[0][i] - m3[2][i];
        m1[3][i] = m3[1][i] - m3[3][i];
        m1[4][i] = m3[4][i] + m3[6][i];
        m1[5][i] = m3[5][i] + m3[7][i];
        m1[6][i] = m3[4][i] - m3[6][i];
        m1[7][i] = m3[5][i] - m3[7][i];

        m2[0][i] = m1[0][i] + m1[1][i];
        m2[1][i] = m1[0][i] - m1[1][i];
        m2[2][i] = m1[2][i] + m1[3][i];
        m2[3][i] = m1[2][i] - m1[3][i];
        m2[4][i] = m1[4][i] + m1[5][i];
        m2[5][i] = m1[4][i] - m1[5][i];
        m2[6][i] = m1[6][i] + m1[7][i];
        m2[7][i] = m1[6][i] - m1[7][i];
    }

    let mut sum = 0u32;
    for row in m2.iter() {
        for v in row.iter() {
            sum += v.abs() as u32;
        }
    }
    (sum + 2) >> 2
}

pub(crate) fn evce_satd_16b<A, B>(w: usize, h: usize, src1: &[A], s1: usize, src2: &[B], s2: usize) -> u32
where
    A: Copy + Into<i32>,
    B: Copy + Into<i32>,
{
    let mut sum = 0u32;
    if w % 8 == 0 && h % 8 == 0 {
        let mut diff = [0i32; 64];
        for y in (0..h).step_by(8) {
            for x in (0..w).step_by(8) {
                for j in 0..8 {
                    for i in 0..8 {
                        diff[j * 8 + i] = src1[(y + j) * s1 + x + i].into() - src2[(y + j) * s2 + x + i].into();
                    }
                }
                sum += evc_had_8x8(&diff);
            }
        }
    } else if w % 4 == 0 && h % 4 == 0 {
        let mut diff = [0i32; 16];
        for y in (0..h).step_by(4) {
            for x in (0..w).step_by(4) {
                for j in 0..4 {
                    for i in 0..4 {
                        diff[j * 4 + i] = src1[(y + j) * s1 + x + i].into() - src2[(y + j) * s2 + x + i].into();
                    }
                }
                sum += evc_had_4x4(&diff);
            }
        }
    } else {
        sum = evce_sad_16b(w, h, src1, s1, src2, s2);
    }
    sum
}

/* DIFF **********************************************************************/
pub(crate) fn evce_diff_16b(w: usize, h: usize, src1: &[pel], s1: usize, src2: &[pel], s2: usize, diff: &mut [i16]) {
    for y in 0..h {
        for x in 0..w {
            diff[y * w + x] = src1[y * s1 + x] as i16 - src2[y * s2 + x] as i16;
        }
    }
}

/* target for refining one hypothesis of a pair: 2 * org - pred */
pub(crate) fn get_org_bi(org_bi: &mut [i16], org: &[pel], s_org: usize, pred: &[pel], w: usize, h: usize) {
    for y in 0..h {
        for x in 0..w {
            org_bi[y * w + x] = ((org[y * s_org + x] as i32) << 1) as i16 - pred[y * w + x] as i16;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sad_and_ssd() {
        let a: Vec<pel> = vec![1, 2, 3, 4, 5, 6];
        let b: Vec<pel> = vec![2, 2, 1, 4, 9, 6];
        assert_eq!(evce_sad_16b(3, 2, &a, 3, &b, 3), 1 + 2 + 4);
        assert_eq!(evce_ssd_16b(3, 2, &a, 3, &b, 3), 1 + 4 + 16);
        let t: Vec<i16> = vec![-1, 2, 3, 4, 5, 6];
        assert_eq!(evce_sad_16b(3, 2, &t, 3, &b, 3), 3 + 2 + 4);
    }

    #[test]
    fn satd_of_identical_blocks_is_zero() {
        let a: Vec<pel> = (0..256).map(|i| (i * 7 % 255) as pel).collect();
        assert_eq!(evce_satd_16b(16, 16, &a, 16, &a, 16), 0);
        assert_eq!(evce_satd_16b(12, 4, &a, 16, &a, 16), 0);
    }

    #[test]
    fn satd_of_dc_offset() {
        let a = vec![10 as pel; 64];
        let b = vec![12 as pel; 64];
        /* a flat difference of 2 concentrates in the dc term: 2 * 64 / 4 */
        assert_eq!(evce_satd_16b(8, 8, &a, 8, &b, 8), 32);
        /* 4x4: 2 * 16 / 2 per block */
        assert_eq!(evce_satd_16b(4, 4, &a, 4, &b, 4), 16);
    }

    #[test]
    fn org_bi_doubles_original() {
        let org: Vec<pel> = vec![10, 20, 30, 40];
        let pred: Vec<pel> = vec![5, 25, 30, 100];
        let mut t = vec![0i16; 4];
        get_org_bi(&mut t, &org, 2, &pred, 2, 2);
        assert_eq!(t, vec![15, 15, 30, -20]);
    }
}
