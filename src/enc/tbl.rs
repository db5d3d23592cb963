use crate::def::*;
use crate::util::*;

lazy_static! {
    /* zigzag scan of every w x h block, [log2_w - 1][log2_h - 1], as raster positions */
    pub(crate) static ref evc_scan_tbl: Vec<Vec<Box<[u16]>>> = {
        let mut tbl = Vec::with_capacity(MAX_TR_LOG2);
        for log2_w in 1..=MAX_TR_LOG2 {
            let mut row = Vec::with_capacity(MAX_TR_LOG2);
            for log2_h in 1..=MAX_TR_LOG2 {
                let size = 1usize << log2_w.max(log2_h);
                let w = 1usize << log2_w;
                let h = 1usize << log2_h;
                let sq = scan_tbl(size as i16);
                let scan: Vec<u16> = sq
                    .iter()
                    .map(|&p| (p as usize % size, p as usize / size))
                    .filter(|&(x, y)| x < w && y < h)
                    .map(|(x, y)| (y * w + x) as u16)
                    .collect();
                row.push(scan.into_boxed_slice());
            }
            tbl.push(row);
        }
        tbl
    };
}
