use crate::error::{PrepackError, Result};

/// One axis of an iteration domain: `start..end` visited in steps of `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimension {
    pub start: usize,
    pub end: usize,
    pub step: usize,
}

impl Dimension {
    /// # Panics
    /// Panics if `step` is zero.
    pub const fn new(start: usize, end: usize, step: usize) -> Self {
        assert!(step > 0, "window step must be non-zero");
        Dimension { start, end, step }
    }

    /// Number of steps taken along this axis.
    pub fn num_iterations(&self) -> usize {
        self.end.saturating_sub(self.start).div_ceil(self.step)
    }
}

/// A 3-D iteration domain over (N blocks, K blocks, batch).
///
/// Points are visited batch-major, then K, then N: the innermost axis is
/// [`Window::DIM_X`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    dims: [Dimension; 3],
}

impl Window {
    pub const DIM_X: usize = 0;
    pub const DIM_Y: usize = 1;
    pub const DIM_Z: usize = 2;

    pub fn new(x: Dimension, y: Dimension, z: Dimension) -> Self {
        Window { dims: [x, y, z] }
    }

    pub fn x(&self) -> Dimension {
        self.dims[Self::DIM_X]
    }

    pub fn y(&self) -> Dimension {
        self.dims[Self::DIM_Y]
    }

    pub fn z(&self) -> Dimension {
        self.dims[Self::DIM_Z]
    }

    /// # Panics
    /// Panics if `dim >= 3`.
    pub fn dimension(&self, dim: usize) -> Dimension {
        self.dims[dim]
    }

    /// Total number of points in the domain.
    pub fn num_iterations(&self) -> usize {
        self.dims.iter().map(Dimension::num_iterations).product()
    }

    /// Iterate the domain's points as `[x, y, z]`, innermost axis first.
    pub fn iter(&self) -> WindowIter {
        let next = if self.num_iterations() == 0 {
            None
        } else {
            Some([self.dims[0].start, self.dims[1].start, self.dims[2].start])
        };
        WindowIter { window: *self, next }
    }

    /// Carve the `id`-th of `total` slices along `dim`.
    ///
    /// Iterations are shared as evenly as possible; the first slices get one
    /// extra iteration when the count does not divide. Slices start on step
    /// boundaries so they stay valid sub-windows. A slice with no work has
    /// `start == end`.
    ///
    /// # Panics
    /// Panics if `total` is zero, `id >= total` or `dim >= 3`.
    pub fn split(&self, dim: usize, id: usize, total: usize) -> Window {
        assert!(id < total, "split id {id} out of range for {total} slices");
        let d = self.dims[dim];
        let iterations = d.num_iterations();
        let per_slice = iterations / total;
        let remainder = iterations % total;

        let first = id * per_slice + id.min(remainder);
        let count = per_slice + usize::from(id < remainder);

        let start = d.start + first * d.step;
        let end = (start + count * d.step).min(d.end).max(start);

        let mut out = *self;
        out.dims[dim] = Dimension::new(start, end, d.step);
        out
    }

    /// Check that `sub` was carved from this window: same steps, in bounds,
    /// starting on a step boundary and ending on one or at this window's end.
    pub fn validate_sub_window(&self, sub: &Window) -> Result<()> {
        let aligned = self.dims.iter().zip(&sub.dims).all(|(full, part)| {
            part.step == full.step
                && part.start >= full.start
                && part.start <= part.end
                && part.end <= full.end
                && (part.start - full.start) % full.step == 0
                && ((part.end - full.start) % full.step == 0 || part.end == full.end)
        });
        if aligned {
            Ok(())
        } else {
            Err(PrepackError::DomainMismatch {
                window: *sub,
                configured: *self,
            })
        }
    }
}

/// Iterator over the points of a [`Window`].
#[derive(Debug, Clone)]
pub struct WindowIter {
    window: Window,
    next: Option<[usize; 3]>,
}

impl Iterator for WindowIter {
    type Item = [usize; 3];

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        // Advance like an odometer, innermost axis first.
        let mut following = current;
        self.next = None;
        for (axis, d) in self.window.dims.iter().enumerate() {
            following[axis] += d.step;
            if following[axis] < d.end {
                self.next = Some(following);
                break;
            }
            following[axis] = d.start;
        }

        Some(current)
    }
}
