//! Clipping route shapes to the ridden section.

use crate::domain::LatLon;

/// Index of the shape point nearest to `target`.
fn nearest(shape: &[LatLon], target: &LatLon) -> Option<usize> {
    shape
        .iter()
        .enumerate()
        .map(|(idx, p)| (idx, p.distance_m(target)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(idx, _)| idx)
}

/// The part of `shape` between the points nearest to `board` and `alight`.
///
/// The two nearest points are found independently. When the alighting point
/// comes first along the shape the section is reversed so it still runs from
/// board to alight. A missing or degenerate shape gives the straight segment.
///
/// ```
/// use bus_planner::domain::LatLon;
/// use bus_planner::itinerary::clip_shape;
///
/// let shape: Vec<LatLon> = (0..5).map(|i| LatLon::new(45.0 + i as f64 * 0.01, 0.7)).collect();
/// let clipped = clip_shape(Some(&shape), LatLon::new(45.011, 0.7), LatLon::new(45.029, 0.7));
/// assert_eq!(clipped, shape[1..=3]);
///
/// let straight = clip_shape(None, shape[0], shape[4]);
/// assert_eq!(straight, [shape[0], shape[4]]);
/// ```
pub fn clip_shape(shape: Option<&[LatLon]>, board: LatLon, alight: LatLon) -> Vec<LatLon> {
    let straight = || vec![board, alight];

    let Some(shape) = shape.filter(|s| s.len() >= 2) else {
        return straight();
    };
    let (Some(from), Some(to)) = (nearest(shape, &board), nearest(shape, &alight)) else {
        return straight();
    };

    match from.cmp(&to) {
        std::cmp::Ordering::Less => shape[from..=to].to_vec(),
        std::cmp::Ordering::Greater => shape[to..=from].iter().rev().copied().collect(),
        std::cmp::Ordering::Equal => straight(),
    }
}

/// Total length of a polyline in metres.
pub fn polyline_length_m(points: &[LatLon]) -> f64 {
    points.windows(2).map(|w| w[0].distance_m(&w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> Vec<LatLon> {
        (0..6)
            .map(|i| LatLon::new(45.18 + i as f64 * 0.001, 0.72))
            .collect()
    }

    #[test]
    fn forward_section() {
        let shape = line();
        let clipped = clip_shape(Some(&shape), shape[1], shape[4]);
        assert_eq!(clipped, shape[1..=4]);
    }

    #[test]
    fn reversed_when_alight_first() {
        let shape = line();
        let clipped = clip_shape(Some(&shape), shape[4], shape[1]);
        assert_eq!(clipped, [shape[4], shape[3], shape[2], shape[1]]);
    }

    #[test]
    fn degenerate_shapes_are_straight() {
        let shape = line();
        let a = LatLon::new(45.0, 0.7);
        let b = LatLon::new(45.1, 0.7);

        assert_eq!(clip_shape(None, a, b), [a, b]);
        assert_eq!(clip_shape(Some(&shape[..1]), a, b), [a, b]);
        // Both ends snap to the same point
        assert_eq!(clip_shape(Some(&shape), shape[2], shape[2]), [shape[2], shape[2]]);
    }

    #[test]
    fn length_sums_segments() {
        let shape = line();
        let total = polyline_length_m(&shape);
        assert!((total - shape[0].distance_m(&shape[5])).abs() < 0.01);
        assert_eq!(polyline_length_m(&shape[..1]), 0.0);
    }
}
