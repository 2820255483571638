//! Point-in-polygon and edge-distance queries for zone outlines.

use glam::Vec2;

/// Even-odd containment test. Degenerate outlines (fewer than three points)
/// contain nothing.
pub fn inside_polygon(outline: &[Vec2], point: Vec2) -> bool {
    if outline.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = outline.len() - 1;
    for i in 0..outline.len() {
        let a = outline[i];
        let b = outline[j];
        if (a.y > point.y) != (b.y > point.y) {
            let x = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if point.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Distance from a point to the nearest polygon edge. Returns 0 for
/// degenerate outlines.
pub fn distance_to_edge(outline: &[Vec2], point: Vec2) -> f32 {
    if outline.len() < 2 {
        return 0.0;
    }
    let mut best = f32::MAX;
    let mut j = outline.len() - 1;
    for i in 0..outline.len() {
        best = best.min(point_segment_distance(point, outline[j], outline[i]));
        j = i;
    }
    best
}

fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).length()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(half: f32) -> Vec<Vec2> {
        vec![
            Vec2::new(-half, -half),
            Vec2::new(half, -half),
            Vec2::new(half, half),
            Vec2::new(-half, half),
        ]
    }

    #[test]
    fn inside_polygon_center_and_outside() {
        let sq = square(100.0);
        assert!(inside_polygon(&sq, Vec2::ZERO));
        assert!(inside_polygon(&sq, Vec2::new(99.0, -99.0)));
        assert!(!inside_polygon(&sq, Vec2::new(101.0, 0.0)));
        assert!(!inside_polygon(&sq, Vec2::new(0.0, -101.0)));
    }

    #[test]
    fn inside_polygon_concave_notch() {
        // A "C" shape open on the right: points in the notch are outside.
        let outline = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 0.0),
            Vec2::new(100.0, 25.0),
            Vec2::new(25.0, 25.0),
            Vec2::new(25.0, 75.0),
            Vec2::new(100.0, 75.0),
            Vec2::new(100.0, 100.0),
            Vec2::new(0.0, 100.0),
        ];
        assert!(inside_polygon(&outline, Vec2::new(10.0, 50.0)));
        assert!(!inside_polygon(&outline, Vec2::new(60.0, 50.0)));
    }

    #[test]
    fn inside_polygon_degenerate_is_empty() {
        assert!(!inside_polygon(&[], Vec2::ZERO));
        assert!(!inside_polygon(
            &[Vec2::ZERO, Vec2::new(1.0, 1.0)],
            Vec2::ZERO
        ));
    }

    #[test]
    fn distance_to_edge_inside_square() {
        let sq = square(100.0);
        assert!((distance_to_edge(&sq, Vec2::ZERO) - 100.0).abs() < 1e-4);
        assert!((distance_to_edge(&sq, Vec2::new(90.0, 0.0)) - 10.0).abs() < 1e-4);
    }

    #[test]
    fn distance_to_edge_nearest_of_all_segments() {
        let sq = square(100.0);
        // Near a corner the nearest edge point is the corner itself.
        let d = distance_to_edge(&sq, Vec2::new(150.0, 150.0));
        assert!((d - (50.0f32 * 50.0 + 50.0 * 50.0).sqrt()).abs() < 1e-3);
    }
}
