// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Axis-aligned rectangle algebra — containment, overlap, set operations and
// raster patch access on `ndarray` arrays.

use ndarray::{ArrayBase, ArrayView, Axis, Data, DataMut, Dimension, Slice};
use warpsynth_core::ColorKey;

/// An axis-aligned rectangle in raster coordinates (`y` grows downwards).
///
/// `height` and `width` are never negative for rectangles built from real
/// geometry. Every set operation keeps the `name` and `color` of its first
/// operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    pub top: f64,
    pub left: f64,
    pub height: f64,
    pub width: f64,
    /// Semantic tag (field name).
    pub name: Option<String>,
    /// Identifying tag colour.
    pub color: Option<ColorKey>,
}

impl Rectangle {
    // -- Construction ---------------------------------------------------------

    pub fn new(top: f64, left: f64, height: f64, width: f64) -> Self {
        debug_assert!(height >= 0.0 && width >= 0.0, "negative rectangle size");
        Self {
            top,
            left,
            height,
            width,
            name: None,
            color: None,
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn with_color(mut self, color: Option<ColorKey>) -> Self {
        self.color = color;
        self
    }

    /// Build from the top-left `(y0, x0)` and bottom-right `(y1, x1)` corners.
    pub fn from_corners(y0: f64, x0: f64, y1: f64, x1: f64) -> Self {
        Self::new(y0, x0, y1 - y0, x1 - x0)
    }

    /// Minimal rectangle enclosing every `(y, x)` point, or `None` for an
    /// empty point set.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut points = points.into_iter();
        let (y, x) = points.next()?;
        let (mut y0, mut x0, mut y1, mut x1) = (y, x, y, x);
        for (y, x) in points {
            y0 = y0.min(y);
            x0 = x0.min(x);
            y1 = y1.max(y);
            x1 = x1.max(x);
        }
        Some(Self::from_corners(y0, x0, y1, x1))
    }

    // -- Derived edges --------------------------------------------------------

    pub fn y0(&self) -> f64 {
        self.top
    }

    pub fn x0(&self) -> f64 {
        self.left
    }

    pub fn y1(&self) -> f64 {
        self.top + self.height
    }

    pub fn x1(&self) -> f64 {
        self.left + self.width
    }

    /// Top-left and bottom-right corners as `(y, x)` pairs.
    pub fn corners(&self) -> [(f64, f64); 2] {
        [(self.y0(), self.x0()), (self.y1(), self.x1())]
    }

    // -- Predicates -----------------------------------------------------------

    /// Closed-interval test for a `(y, x)` point.
    pub fn contains_point(&self, (y, x): (f64, f64)) -> bool {
        self.y0() <= y && y <= self.y1() && self.x0() <= x && x <= self.x1()
    }

    pub fn contains(&self, other: &Rectangle) -> bool {
        other.corners().into_iter().all(|point| self.contains_point(point))
    }

    /// Open-interval overlap on both axes; rectangles that only touch do not
    /// intersect.
    pub fn intersects(&self, other: &Rectangle) -> bool {
        fn overlaps(min1: f64, max1: f64, min2: f64, max2: f64) -> bool {
            max1 > min2 && max2 > min1
        }

        overlaps(self.x0(), self.x1(), other.x0(), other.x1())
            && overlaps(self.y0(), self.y1(), other.y0(), other.y1())
    }

    // -- Value transforms -----------------------------------------------------

    /// Move every edge inwards: the size shrinks by `2 * dy` and `2 * dx`.
    pub fn shrink(&self, dy: f64, dx: f64) -> Self {
        Self {
            top: self.top + dy,
            left: self.left + dx,
            height: self.height - 2.0 * dy,
            width: self.width - 2.0 * dx,
            name: self.name.clone(),
            color: self.color,
        }
    }

    pub fn scale(&self, factor_x: f64, factor_y: f64) -> Self {
        Self {
            top: self.top * factor_y,
            left: self.left * factor_x,
            height: self.height * factor_y,
            width: self.width * factor_x,
            name: self.name.clone(),
            color: self.color,
        }
    }

    /// Move each edge outwards by its own delta (negative deltas move it
    /// inwards). The only mutating operation.
    pub fn inplace_expand(&mut self, top: f64, right: f64, bottom: f64, left: f64) {
        self.top -= top;
        self.left -= left;
        self.height += top + bottom;
        self.width += left + right;
    }

    /// Intersection with `parent`, keeping this rectangle's tags.
    pub fn constrain(&self, parent: &Rectangle) -> Self {
        Self::intersect(self, parent)
    }

    // -- Set operations -------------------------------------------------------

    pub fn intersect(a: &Rectangle, b: &Rectangle) -> Self {
        Self::from_corners(
            a.y0().max(b.y0()),
            a.x0().max(b.x0()),
            a.y1().min(b.y1()),
            a.x1().min(b.x1()),
        )
        .with_name(a.name.clone())
        .with_color(a.color)
    }

    pub fn union(a: &Rectangle, b: &Rectangle) -> Self {
        Self::from_corners(
            a.y0().min(b.y0()),
            a.x0().min(b.x0()),
            a.y1().max(b.y1()),
            a.x1().max(b.x1()),
        )
        .with_name(a.name.clone())
        .with_color(a.color)
    }

    /// Union of all rectangles, tagged like the first; `None` when empty.
    pub fn union_all<'a, I>(rects: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Rectangle>,
    {
        let mut rects = rects.into_iter();
        let first = rects.next()?.clone();
        Some(rects.fold(first, |acc, rect| Self::union(&acc, rect)))
    }

    // -- Raster access --------------------------------------------------------

    /// Integer-truncated row and column ranges, clamped to a `rows x cols`
    /// raster.
    fn index_ranges(&self, rows: usize, cols: usize) -> (Slice, Slice) {
        fn clamp(value: f64, upper: usize) -> isize {
            (value.trunc() as isize).clamp(0, upper as isize)
        }

        let y0 = clamp(self.y0(), rows);
        let y1 = clamp(self.y1(), rows).max(y0);
        let x0 = clamp(self.x0(), cols);
        let x1 = clamp(self.x1(), cols).max(x0);
        (Slice::from(y0..y1), Slice::from(x0..x1))
    }

    /// View of the sub-array covered by this rectangle. The first two axes of
    /// `raster` are rows and columns; trailing axes are kept whole.
    pub fn take_patch<'a, S, D>(&self, raster: &'a ArrayBase<S, D>) -> ArrayView<'a, S::Elem, D>
    where
        S: Data,
        D: Dimension,
    {
        let shape = raster.shape();
        let (rows, cols) = self.index_ranges(shape[0], shape[1]);
        raster
            .slice_axis(Axis(0), rows)
            .slice_axis_move(Axis(1), cols)
    }

    /// Overwrite the sub-array covered by this rectangle with `patch`.
    ///
    /// `patch` must have (or broadcast to) the shape [`Rectangle::take_patch`]
    /// would return.
    pub fn put_patch<S, S2, D, E>(&self, raster: &mut ArrayBase<S, D>, patch: &ArrayBase<S2, E>)
    where
        S: DataMut,
        S::Elem: Clone,
        S2: Data<Elem = S::Elem>,
        D: Dimension,
        E: Dimension,
    {
        let (rows, cols) = {
            let shape = raster.shape();
            self.index_ranges(shape[0], shape[1])
        };
        raster
            .slice_axis_mut(Axis(0), rows)
            .slice_axis_move(Axis(1), cols)
            .assign(patch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    fn rect(top: f64, left: f64, height: f64, width: f64) -> Rectangle {
        Rectangle::new(top, left, height, width)
    }

    #[test]
    fn intersects_is_symmetric() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(5.0, 5.0, 10.0, 10.0);
        let c = rect(10.0, 0.0, 5.0, 5.0);
        assert!(a.intersects(&b) && b.intersects(&a));
        // Touching edges are not an overlap.
        assert!(!a.intersects(&c) && !c.intersects(&a));
    }

    #[test]
    fn union_contains_both_operands() {
        let a = rect(2.0, 3.0, 4.0, 5.0);
        let b = rect(10.0, -1.0, 1.0, 1.0);
        let u = Rectangle::union(&a, &b);
        assert!(a.contains(&a));
        assert!(u.contains(&a) && u.contains(&b));
        assert_eq!(u, Rectangle::from_corners(2.0, -1.0, 11.0, 8.0));
    }

    #[test]
    fn intersect_with_self_is_identity() {
        let a = rect(2.0, 3.0, 4.0, 5.0)
            .with_name(Some("total".into()))
            .with_color(Some(ColorKey(0x00ff00)));
        assert_eq!(Rectangle::intersect(&a, &a), a);
    }

    #[test]
    fn shrink_then_expand_restores() {
        let a = rect(10.0, 20.0, 30.0, 40.0);
        let mut b = a.shrink(3.0, 5.0);
        assert_eq!(b, rect(13.0, 25.0, 24.0, 30.0));
        b.inplace_expand(3.0, 5.0, 3.0, 5.0);
        assert_eq!(b, a);
    }

    #[test]
    fn constrain_keeps_own_tags() {
        let child = rect(0.0, 0.0, 10.0, 10.0).with_name(Some("date".into()));
        let parent = rect(5.0, 5.0, 20.0, 20.0).with_name(Some("container".into()));
        let clipped = child.constrain(&parent);
        assert_eq!(clipped.name.as_deref(), Some("date"));
        assert_eq!(clipped, rect(5.0, 5.0, 5.0, 5.0).with_name(Some("date".into())));
    }

    #[test]
    fn from_points_and_union_all() {
        assert!(Rectangle::from_points(std::iter::empty()).is_none());
        let r = Rectangle::from_points([(4.0, 1.0), (2.0, 7.0), (3.0, 3.0)]).expect("points");
        assert_eq!(r, Rectangle::from_corners(2.0, 1.0, 4.0, 7.0));

        let all = [rect(0.0, 0.0, 1.0, 1.0), rect(5.0, 5.0, 1.0, 1.0)];
        assert_eq!(
            Rectangle::union_all(&all),
            Some(Rectangle::from_corners(0.0, 0.0, 6.0, 6.0))
        );
        assert!(Rectangle::union_all(&[]).is_none());
    }

    #[test]
    fn scale_multiplies_axes_independently() {
        let r = rect(0.1, 0.2, 0.3, 0.4).scale(100.0, 10.0);
        assert!((r.top - 1.0).abs() < 1e-12);
        assert!((r.left - 20.0).abs() < 1e-12);
        assert!((r.height - 3.0).abs() < 1e-12);
        assert!((r.width - 40.0).abs() < 1e-12);
    }

    #[test]
    fn patches_truncate_and_clamp() {
        let mut mask = Array2::from_elem((6, 8), false);
        let r = rect(1.7, 2.2, 2.9, 3.9); // rows 1..4, cols 2..6
        r.put_patch(&mut mask, &Array2::from_elem((3, 4), true));
        assert_eq!(mask.iter().filter(|v| **v).count(), 12);
        assert!(r.take_patch(&mask).iter().all(|v| *v));

        let outside = rect(-3.0, 6.0, 100.0, 100.0);
        assert_eq!(outside.take_patch(&mask).dim(), (6, 2));

        let image = Array3::<u8>::zeros((6, 8, 3));
        assert_eq!(r.take_patch(&image).dim(), (3, 4, 3));
    }
}
