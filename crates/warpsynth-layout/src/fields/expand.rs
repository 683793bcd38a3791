// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Field growth — expands under-sized anchor boxes inside their container
// until they meet a sibling, the container border or an occluded pixel.

use ndarray::Array2;
use tracing::{debug, instrument};

use crate::rect::Rectangle;

/// One edge movement, as `(top, right, bottom, left)` deltas.
type Step = (f64, f64, f64, f64);

const GROW_LEFT: Step = (0.0, 0.0, 0.0, 1.0);
const GROW_RIGHT: Step = (0.0, 1.0, 0.0, 0.0);
const GROW_TOP: Step = (1.0, 0.0, 0.0, 0.0);
const GROW_BOTTOM: Step = (0.0, 0.0, 1.0, 0.0);

/// Mutable growth state: the container, the occlusion mask and one grow box
/// per child, addressed by index.
struct Growth<'a> {
    parent: &'a Rectangle,
    occlusion: &'a Array2<bool>,
    boxes: Vec<Rectangle>,
}

impl Growth<'_> {
    /// A candidate for box `index` is valid when it stays inside the parent,
    /// overlaps no other grow box and covers no occluded pixel.
    fn is_valid(&self, index: usize, candidate: &Rectangle) -> bool {
        if !self.parent.contains(candidate) {
            return false;
        }
        let collides = self
            .boxes
            .iter()
            .enumerate()
            .any(|(other, rect)| other != index && candidate.intersects(rect));
        if collides {
            return false;
        }
        !candidate.take_patch(self.occlusion).iter().any(|&occluded| occluded)
    }

    /// Try one edge movement; commit it only when the result is valid.
    fn try_step(&mut self, index: usize, (top, right, bottom, left): Step) -> bool {
        let mut candidate = self.boxes[index].clone();
        candidate.inplace_expand(top, right, bottom, left);
        if self.is_valid(index, &candidate) {
            self.boxes[index] = candidate;
            true
        } else {
            false
        }
    }

    /// Apply `steps` to every box, in box order, until nothing moves.
    fn grow_to_fixed_point(&mut self, steps: [Step; 2]) -> usize {
        let mut rounds = 0;
        let mut changed = true;
        while changed {
            changed = false;
            rounds += 1;
            for index in 0..self.boxes.len() {
                for step in steps {
                    changed |= self.try_step(index, step);
                }
            }
        }
        rounds
    }
}

/// Grow the `children` anchor boxes inside `parent`.
///
/// Children that do not intersect the parent are dropped; the rest are
/// clipped to it. A lone child in an unoccluded parent takes the whole
/// parent. Otherwise each child is shrunk by a margin derived from the
/// smallest sibling, grown horizontally (left, then right) to a fixed point,
/// then vertically (top, then bottom) to a fixed point, and finally merged
/// with its anchor box.
///
/// `occlusion` is a `rows x cols` mask of pixels no field may cover.
#[instrument(skip_all, fields(children = children.len()))]
pub fn expand_children(
    parent: &Rectangle,
    children: &[Rectangle],
    occlusion: &Array2<bool>,
) -> Vec<Rectangle> {
    let anchors: Vec<Rectangle> = children
        .iter()
        .filter(|child| parent.intersects(child))
        .map(|child| child.constrain(parent))
        .collect();

    if anchors.is_empty() {
        return Vec::new();
    }

    if anchors.len() == 1 && !parent.take_patch(occlusion).iter().any(|&occluded| occluded) {
        let whole = Rectangle::new(parent.top, parent.left, parent.height, parent.width)
            .with_name(anchors[0].name.clone())
            .with_color(anchors[0].color);
        return vec![whole];
    }

    let min_height = anchors.iter().map(|a| a.height).fold(f64::INFINITY, f64::min);
    let min_width = anchors.iter().map(|a| a.width).fold(f64::INFINITY, f64::min);
    let shrink_y = ((min_height / 2.0).floor() - 1.0).max(0.0);
    let shrink_x = ((min_width / 2.0).floor() - 1.0).max(0.0);

    let mut growth = Growth {
        parent,
        occlusion,
        boxes: anchors.iter().map(|a| a.shrink(shrink_y, shrink_x)).collect(),
    };

    let horizontal_rounds = growth.grow_to_fixed_point([GROW_LEFT, GROW_RIGHT]);
    let vertical_rounds = growth.grow_to_fixed_point([GROW_TOP, GROW_BOTTOM]);
    debug!(
        shrink_y,
        shrink_x, horizontal_rounds, vertical_rounds, "Field growth converged"
    );

    anchors
        .iter()
        .zip(&growth.boxes)
        .map(|(anchor, grown)| Rectangle::union(anchor, grown))
        .collect()
}
