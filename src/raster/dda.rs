//! Digital differential analyzer over integer endpoints.

use kurbo::{Point, Rect};

/// Samples the digital line from `start` up to, but not including, `end`.
///
/// Produces `max(|dx|, |dy|)` points; the major axis advances by one pixel
/// per sample and the minor axis is rounded to the nearest pixel. Samples
/// are computed on demand, so [`LineDda::sample`] gives random access to
/// the walk including its end point at index `steps`.
#[derive(Debug, Clone)]
pub struct LineDda {
    start: (i32, i32),
    dx: i64,
    dy: i64,
    steps: i64,
    step: i64,
}

impl LineDda {
    pub fn new(start: (i32, i32), end: (i32, i32)) -> Self {
        let dx = end.0 as i64 - start.0 as i64;
        let dy = end.1 as i64 - start.1 as i64;
        Self {
            start,
            dx,
            dy,
            steps: dx.abs().max(dy.abs()),
            step: 0,
        }
    }

    /// Number of samples the walk produces.
    pub fn steps(&self) -> usize {
        self.steps as usize
    }

    /// Sample `i` of the walk; `i == steps` is the end point.
    pub fn sample(&self, i: usize) -> (i32, i32) {
        if self.steps == 0 {
            return self.start;
        }
        let i = (i as i64).min(self.steps) as i128;
        let steps = self.steps as i128;
        let x = self.start.0 as i128 + div_round(self.dx as i128 * i, steps);
        let y = self.start.1 as i128 + div_round(self.dy as i128 * i, steps);
        (x as i32, y as i32)
    }
}

impl Iterator for LineDda {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.step >= self.steps {
            return None;
        }
        let sample = self.sample(self.step as usize);
        self.step += 1;
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.steps - self.step).max(0) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for LineDda {}

/// Range `lo..=hi` of sample indices of a `steps`-sample walk from `from` to
/// `to` that may land inside `clip`, or `None` when the walk misses it.
///
/// The window is widened by a sample on each side to cover minor-axis
/// rounding.
pub fn visible_steps(from: Point, to: Point, steps: usize, clip: Rect) -> Option<(usize, usize)> {
    let clip = clip.inflate(1.0, 1.0);
    let d = to - from;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    for (p, q) in [
        (-d.x, from.x - clip.x0),
        (d.x, clip.x1 - from.x),
        (-d.y, from.y - clip.y0),
        (d.y, clip.y1 - from.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let n = steps as f64;
    let lo = ((t0 * n).floor() - 1.0).max(0.0) as usize;
    let hi = ((t1 * n).ceil() + 1.0).min(n) as usize;
    (lo <= hi).then_some((lo, hi))
}

/// Rounds `num / den` half away from zero; `den` must be positive.
fn div_round(num: i128, den: i128) -> i128 {
    if num >= 0 {
        (num + den / 2) / den
    } else {
        -((-num + den / 2) / den)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_walk_excludes_the_end_point() {
        let points: Vec<_> = LineDda::new((0, 0), (4, 0)).collect();
        assert_eq!(points, vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
    }

    #[test]
    fn diagonal_walk_steps_both_axes() {
        let points: Vec<_> = LineDda::new((0, 0), (-3, 3)).collect();
        assert_eq!(points, vec![(0, 0), (-1, 1), (-2, 2)]);
    }

    #[test]
    fn shallow_walk_rounds_the_minor_axis() {
        let points: Vec<_> = LineDda::new((0, 0), (4, 1)).collect();
        assert_eq!(points, vec![(0, 0), (1, 0), (2, 1), (3, 1)]);
    }

    #[test]
    fn zero_length_walk_is_empty() {
        let dda = LineDda::new((5, 5), (5, 5));
        assert_eq!(dda.steps(), 0);
        assert_eq!(dda.sample(0), (5, 5));
        assert_eq!(dda.count(), 0);
    }

    #[test]
    fn samples_reach_the_end_point() {
        let dda = LineDda::new((0, 0), (4, 1));
        assert_eq!(dda.sample(4), (4, 1));
        assert_eq!(dda.sample(2), (2, 1));
    }

    #[test]
    fn full_range_walks_do_not_overflow() {
        let dda = LineDda::new((i32::MIN, 0), (i32::MAX, 3));
        assert_eq!(dda.steps(), u32::MAX as usize);
        assert_eq!(dda.sample(dda.steps()), (i32::MAX, 3));
        assert_eq!(dda.sample(dda.steps() / 2), (-1, 1));
    }

    #[test]
    fn window_covers_only_the_visible_part() {
        let clip = Rect::new(0.0, 0.0, 64.0, 64.0);
        let from = Point::new(-1024.0, 5.0);
        let to = Point::new(1024.0, 5.0);
        let (lo, hi) = visible_steps(from, to, 2048, clip).expect("crosses the clip");
        assert_eq!((lo, hi), (1022, 1090));

        let above = visible_steps(Point::new(0.0, -50.0), Point::new(60.0, -50.0), 60, clip);
        assert_eq!(above, None);
    }

    #[test]
    fn window_of_a_contained_walk_is_everything() {
        let clip = Rect::new(0.0, 0.0, 64.0, 64.0);
        let window = visible_steps(Point::new(2.0, 2.0), Point::new(12.0, 7.0), 10, clip);
        assert_eq!(window, Some((0, 10)));
    }
}
