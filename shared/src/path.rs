use std::fmt::Write as _;

use crate::county::Ring;

/// SVG path data for one ring, or `None` when it has no finite points.
pub fn ring_path(ring: &Ring) -> Option<String> {
    let mut d = String::new();
    for (idx, c) in ring.valid_points().enumerate() {
        let command = if idx == 0 { 'M' } else { 'L' };
        if idx > 0 {
            d.push(' ');
        }
        let _ = write!(d, "{command} {},{}", c.x, c.y);
    }
    if d.is_empty() {
        return None;
    }
    d.push_str(" Z");
    Some(d)
}

/// Concatenated path data for every drawable ring of a boundary.
pub fn boundary_path(rings: &[Ring]) -> String {
    rings
        .iter()
        .filter_map(ring_path)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::{boundary_path, ring_path};
    use crate::county::{Coordinate, Ring};

    fn ring(points: &[(f64, f64)]) -> Ring {
        Ring(points.iter().map(|&(x, y)| Coordinate::new(x, y)).collect())
    }

    #[test]
    fn ring_moves_then_lines_then_closes() {
        let d = ring_path(&ring(&[(1.0, 2.0), (3.5, 4.0), (5.0, -6.25)])).expect("drawable ring");
        assert_eq!(d, "M 1,2 L 3.5,4 L 5,-6.25 Z");
    }

    #[test]
    fn invalid_points_are_dropped_individually() {
        let d = ring_path(&ring(&[
            (f64::NAN, 0.0),
            (1.0, 1.0),
            (2.0, f64::INFINITY),
            (3.0, 3.0),
        ]))
        .expect("drawable ring");
        assert_eq!(d, "M 1,1 L 3,3 Z");
        assert!(!d.contains("NaN") && !d.contains("inf"));
    }

    #[test]
    fn ring_without_valid_points_contributes_nothing() {
        assert_eq!(ring_path(&ring(&[(f64::NAN, f64::NAN)])), None);
        assert_eq!(ring_path(&Ring::default()), None);

        let d = boundary_path(&[
            ring(&[(f64::NAN, 1.0)]),
            ring(&[(0.0, 0.0), (1.0, 0.0)]),
            Ring::default(),
            ring(&[(5.0, 5.0), (6.0, 5.0)]),
        ]);
        assert_eq!(d, "M 0,0 L 1,0 Z M 5,5 L 6,5 Z");
    }

    #[test]
    fn boundary_without_rings_is_empty() {
        assert_eq!(boundary_path(&[]), "");
    }
}
