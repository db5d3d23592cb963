use crate::def::*;

use std::alloc::{alloc, dealloc, Layout};
use std::fmt;
use std::{mem, ptr};

#[repr(align(64))]
pub struct Align64;

// A 64 byte aligned piece of data.
// # Examples
// ```
// let mut x: Aligned<[i16; 64 * 64]> = Aligned::new([0; 64 * 64]);
// assert!(x.data.as_ptr() as usize % 16 == 0);
// ```
pub struct Aligned<T> {
    _alignment: [Align64; 0],
    pub data: T,
}

impl<T> Aligned<T> {
    pub const fn new(data: T) -> Self {
        Aligned {
            _alignment: [],
            data,
        }
    }
}

/// An analog to a Box<[T]> where the underlying slice is aligned.
/// Alignment is according to the architecture-specific SIMD constraints.
pub struct AlignedBoxedSlice<T> {
    ptr: std::ptr::NonNull<T>,
    len: usize,
}

impl<T> AlignedBoxedSlice<T> {
    // Data alignment in bytes.
    cfg_if::cfg_if! {
      if #[cfg(target_arch = "wasm32")] {
        // FIXME: wasm32 allocator fails for alignment larger than 3
        const DATA_ALIGNMENT_LOG2: usize = 3;
      } else {
        const DATA_ALIGNMENT_LOG2: usize = 5;
      }
    }

    unsafe fn layout(len: usize) -> Layout {
        Layout::from_size_align_unchecked(
            len.max(1) * mem::size_of::<T>().max(1),
            1 << Self::DATA_ALIGNMENT_LOG2,
        )
    }

    unsafe fn alloc(len: usize) -> std::ptr::NonNull<T> {
        let p = alloc(Self::layout(len)) as *mut T;
        match ptr::NonNull::new(p) {
            Some(p) => p,
            None => std::alloc::handle_alloc_error(Self::layout(len)),
        }
    }

    /// Creates a ['AlignedBoxedSlice'] with a slice of length ['len'] filled with
    /// ['val'].
    pub fn new(len: usize, val: T) -> Self
    where
        T: Clone,
    {
        let ptr = unsafe { Self::alloc(len) };
        for i in 0..len {
            unsafe { ptr::write(ptr.as_ptr().add(i), val.clone()) };
        }

        Self { ptr, len }
    }
}

impl<T: Clone> Clone for AlignedBoxedSlice<T> {
    fn clone(&self) -> Self {
        let ptr = unsafe { Self::alloc(self.len) };
        for (i, v) in self.iter().enumerate() {
            unsafe { ptr::write(ptr.as_ptr().add(i), v.clone()) };
        }

        Self { ptr, len: self.len }
    }
}

impl<T: fmt::Debug> fmt::Debug for AlignedBoxedSlice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T> std::ops::Deref for AlignedBoxedSlice<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        unsafe {
            let p = self.ptr.as_ptr();

            std::slice::from_raw_parts(p, self.len)
        }
    }
}

impl<T> std::ops::DerefMut for AlignedBoxedSlice<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        unsafe {
            let p = self.ptr.as_ptr();

            std::slice::from_raw_parts_mut(p, self.len)
        }
    }
}

impl<T> std::ops::Drop for AlignedBoxedSlice<T> {
    fn drop(&mut self) {
        unsafe {
            for a in self.iter_mut() {
                ptr::drop_in_place(a)
            }

            dealloc(self.ptr.as_ptr() as *mut u8, Self::layout(self.len));
        }
    }
}

unsafe impl<T> Send for AlignedBoxedSlice<T> where T: Send {}
unsafe impl<T> Sync for AlignedBoxedSlice<T> where T: Sync {}

#[inline(always)]
pub fn clip<T: PartialOrd>(v: T, min: T, max: T) -> T {
    if v < min {
        min
    } else if v > max {
        max
    } else {
        v
    }
}

/// Rows of samples addressable with negative coordinates.
pub(crate) trait RowSource {
    /// Row `y`, clamped to the rows the source holds, starting at x = -origin().
    fn pel_row(&self, y: isize) -> &[pel];
    fn origin(&self) -> isize;

    #[inline]
    fn row_at(&self, x: isize, y: isize) -> &[pel] {
        let r = self.pel_row(y);
        let o = (x + self.origin()).max(0) as usize;
        &r[o.min(r.len())..]
    }
}

/// One color component with stored horizontal padding. Vertical accesses
/// outside the picture are clamped to the first or last row.
#[derive(Clone, Debug)]
pub struct Plane {
    pub data: AlignedBoxedSlice<pel>,
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    pub xpad: usize,
}

impl Plane {
    pub fn new(width: usize, height: usize, xpad: usize) -> Self {
        let stride = width + 2 * xpad;
        Plane {
            data: AlignedBoxedSlice::new(stride * height.max(1), 0),
            width,
            height,
            stride,
            xpad,
        }
    }

    /// Row `y` without padding.
    #[inline]
    pub fn row(&self, y: usize) -> &[pel] {
        let o = y * self.stride + self.xpad;
        &self.data[o..o + self.width]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [pel] {
        let o = y * self.stride + self.xpad;
        &mut self.data[o..o + self.width]
    }

    #[inline]
    pub fn p(&self, x: usize, y: usize) -> pel {
        self.data[y * self.stride + self.xpad + x]
    }

    /// Fills the plane from a packed buffer.
    pub fn copy_from_raw(&mut self, src: &[pel], src_stride: usize) {
        for y in 0..self.height {
            let w = self.width;
            self.row_mut(y)
                .copy_from_slice(&src[y * src_stride..y * src_stride + w]);
        }
        self.pad();
    }

    /// Replicates the first and last sample of every row into the padding.
    pub fn pad(&mut self) {
        let (w, xpad, stride) = (self.width, self.xpad, self.stride);
        if w == 0 {
            return;
        }
        for row in self.data.chunks_mut(stride) {
            let l = row[xpad];
            let r = row[xpad + w - 1];
            for v in &mut row[..xpad] {
                *v = l;
            }
            for v in &mut row[xpad + w..] {
                *v = r;
            }
        }
    }
}

impl RowSource for Plane {
    #[inline]
    fn pel_row(&self, y: isize) -> &[pel] {
        let y = clip(y, 0, self.height as isize - 1) as usize;
        &self.data[y * self.stride..(y + 1) * self.stride]
    }

    #[inline]
    fn origin(&self) -> isize {
        self.xpad as isize
    }
}

/// A 4:2:0 picture.
#[derive(Clone, Debug)]
pub struct Frame {
    pub planes: [Plane; N_C],
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        Frame {
            planes: [
                Plane::new(width, height, PIC_PAD_SIZE_L),
                Plane::new((width + 1) >> 1, (height + 1) >> 1, PIC_PAD_SIZE_C),
                Plane::new((width + 1) >> 1, (height + 1) >> 1, PIC_PAD_SIZE_C),
            ],
        }
    }

    pub fn width(&self) -> usize {
        self.planes[Y_C].width
    }

    pub fn height(&self) -> usize {
        self.planes[Y_C].height
    }

    pub fn pad(&mut self) {
        for p in self.planes.iter_mut() {
            p.pad();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn is_aligned<T>(ptr: *const T, n: usize) -> bool {
        ((ptr as usize) & ((1 << n) - 1)) == 0
    }

    #[test]
    fn sanity_stack() {
        let a: Aligned<_> = Aligned::new([0u8; 3]);
        assert!(is_aligned(a.data.as_ptr(), 4));
    }

    #[test]
    fn sanity_heap() {
        let a: AlignedBoxedSlice<_> = AlignedBoxedSlice::new(3, 0u8);
        assert!(is_aligned(a.as_ptr(), 4));
        let b = a.clone();
        assert_eq!(&b[..], &[0u8, 0, 0][..]);
    }

    #[test]
    fn plane_pads_and_clamps() {
        let mut p = Plane::new(4, 2, 3);
        p.copy_from_raw(&[1, 2, 3, 4, 5, 6, 7, 8], 4);
        assert_eq!(p.row(1), &[5, 6, 7, 8][..]);
        assert_eq!(&p.pel_row(-5)[..3], &[1, 1, 1][..]);
        assert_eq!(p.pel_row(9)[3 + 4 + 2], 8);
        assert_eq!(p.row_at(-1, 1)[0], 5);
        assert_eq!(p.row_at(2, 0)[0], 3);
    }
}
