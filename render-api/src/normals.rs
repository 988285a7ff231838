//! Per-vertex normals from topology: each face normal is accumulated into its three
//! corners weighted by the corner angle, then normalized.

use glam::Vec3;

/// Angle-weighted vertex normals. Vertices touched only by degenerate triangles
/// (or by none) get a zero normal. Cells must be in range (see `MeshSource::validate`).
pub fn compute_normals(cells: &[[u32; 3]], positions: &[[f32; 3]]) -> Vec<[f32; 3]> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    let at = |i: u32| Vec3::from(positions[i as usize]);
    for cell in cells {
        let [a, b, c] = cell.map(at);
        let face = (b - a).cross(c - a);
        if face.length() <= f32::EPSILON {
            continue;
        }
        let face = face.normalize();
        for corner in 0..3 {
            let p = at(cell[corner]);
            let e0 = at(cell[(corner + 1) % 3]) - p;
            let e1 = at(cell[(corner + 2) % 3]) - p;
            if e0.length() * e1.length() <= f32::EPSILON {
                continue;
            }
            normals[cell[corner] as usize] += face * e0.angle_between(e1);
        }
    }
    normals.into_iter().map(|n| n.normalize_or_zero().to_array()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: [f32; 3], b: [f32; 3]) {
        for k in 0..3 {
            assert!((a[k] - b[k]).abs() < 1e-5, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn flat_quad_points_up() {
        // Counter-clockwise seen from +Y.
        let positions = [[-1.0, 0.0, -1.0], [1.0, 0.0, -1.0], [-1.0, 0.0, 1.0], [1.0, 0.0, 1.0]];
        let cells = [[3, 1, 0], [0, 2, 3]];
        let normals = compute_normals(&cells, &positions);
        assert_eq!(normals.len(), 4);
        for n in normals {
            assert_close(n, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn corner_of_cube_is_diagonal() {
        // Three faces meeting at the origin, each contributing a right angle.
        let positions = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        let cells = [[0, 2, 1], [0, 3, 2], [0, 1, 3]];
        let normals = compute_normals(&cells, &positions);
        let d = -1.0 / 3f32.sqrt();
        assert_close(normals[0], [d, d, d]);
    }

    #[test]
    fn degenerate_triangle_leaves_zero_normal() {
        let positions = [[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        let normals = compute_normals(&[[0, 1, 2]], &positions);
        assert_eq!(normals, vec![[0.0; 3]; 3]);
    }
}
