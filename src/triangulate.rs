use tracing::warn;

use crate::{
    classify::CaseMask,
    config::MissingCrossingPolicy,
    error::{MarchingCubesError, Result},
    interp::EdgeCrossings,
    mesh::SurfaceMesh,
    tables::{CaseTable, MAX_TRIANGLES_PER_CASE},
    types::{CubeIndex, Point},
};

/// Triangles a single cube added to the mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CubeTriangles {
    pub emitted: usize,
    pub skipped: usize,
}

/// Resolves the case table's edge triples for `mask` into points and appends
/// them to `mesh`.
///
/// A triple that names an edge without a crossing either fails with
/// [`MarchingCubesError::MissingCrossing`] or is dropped, depending on `policy`.
/// Under `Abort` nothing from this cube is appended.
pub fn triangulate_cube<T>(
    table: &T,
    cube: CubeIndex,
    mask: CaseMask,
    crossings: &EdgeCrossings,
    policy: MissingCrossingPolicy,
    mesh: &mut SurfaceMesh,
) -> Result<CubeTriangles>
where
    T: CaseTable + ?Sized,
{
    let count = table.triangle_count(mask);
    let mut resolved: [Option<[Point; 3]>; MAX_TRIANGLES_PER_CASE] = [None; MAX_TRIANGLES_PER_CASE];
    let mut out = CubeTriangles::default();

    for (i, slot) in resolved.iter_mut().enumerate().take(count) {
        let edges = table.triangle(mask, i);
        match resolve(crossings, edges) {
            Ok(points) => *slot = Some(points),
            Err(edge) => match policy {
                MissingCrossingPolicy::Abort => {
                    return Err(MarchingCubesError::MissingCrossing {
                        cube,
                        mask: mask.0,
                        edge,
                    });
                }
                MissingCrossingPolicy::SkipTriangle => {
                    warn!(?cube, %mask, edge, "dropping triangle with missing edge crossing");
                    out.skipped += 1;
                }
            },
        }
    }

    for points in resolved.into_iter().flatten() {
        mesh.push_triangle(points)?;
        out.emitted += 1;
    }

    Ok(out)
}

/// Looks up the three crossing points of a triangle, or the first edge that has none.
#[inline]
fn resolve(crossings: &EdgeCrossings, [a, b, c]: [usize; 3]) -> core::result::Result<[Point; 3], usize> {
    let point = |edge: usize| crossings.get(edge).copied().flatten().ok_or(edge);
    Ok([point(a)?, point(b)?, point(c)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::StandardCaseTable;

    fn all_edges() -> EdgeCrossings {
        core::array::from_fn(|e| Some(Point::new(e as f32, 0.0, 0.0)))
    }

    #[test]
    fn trivial_case_emits_nothing() {
        let mut mesh = SurfaceMesh::new_empty();
        let out = triangulate_cube(
            &StandardCaseTable,
            [0, 0, 0],
            CaseMask::EMPTY,
            &all_edges(),
            MissingCrossingPolicy::Abort,
            &mut mesh,
        )
        .unwrap();
        assert_eq!(out, CubeTriangles::default());
        assert!(mesh.is_empty());
    }

    #[test]
    fn single_corner_case_emits_one_triangle() {
        // corner 0 inside touches edges 0, 3 and 8
        let mut crossings: EdgeCrossings = [None; 12];
        crossings[0] = Some(Point::new(0.5, 0.0, 0.0));
        crossings[3] = Some(Point::new(0.0, 0.5, 0.0));
        crossings[8] = Some(Point::new(0.0, 0.0, 0.5));

        let mut mesh = SurfaceMesh::new_empty();
        let out = triangulate_cube(
            &StandardCaseTable,
            [0, 0, 0],
            CaseMask(0b0000_0001),
            &crossings,
            MissingCrossingPolicy::Abort,
            &mut mesh,
        )
        .unwrap();

        assert_eq!(out.emitted, 1);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        // the normal points away from the inside corner at the origin
        let n = mesh.tri_normal(0);
        assert!(n.x > 0.0 && n.y > 0.0 && n.z > 0.0, "normal {n:?}");
    }

    #[test]
    fn missing_crossing_aborts_without_partial_output() {
        let mut crossings = all_edges();
        crossings[8] = None;

        let mut mesh = SurfaceMesh::new_empty();
        let err = triangulate_cube(
            &StandardCaseTable,
            [2, 3, 4],
            CaseMask(0b0000_0001),
            &crossings,
            MissingCrossingPolicy::Abort,
            &mut mesh,
        )
        .unwrap_err();

        assert_eq!(
            err,
            MarchingCubesError::MissingCrossing {
                cube: [2, 3, 4],
                mask: 1,
                edge: 8
            }
        );
        assert!(mesh.is_empty());
    }

    #[test]
    fn missing_crossing_can_skip_just_that_triangle() {
        // case 0b0100_0001 is two separate corners: 0 (edges 0, 3, 8) and 6 (edges 5, 6, 10)
        let mut crossings = all_edges();
        crossings[8] = None;

        let mut mesh = SurfaceMesh::new_empty();
        let out = triangulate_cube(
            &StandardCaseTable,
            [0, 0, 0],
            CaseMask(0b0100_0001),
            &crossings,
            MissingCrossingPolicy::SkipTriangle,
            &mut mesh,
        )
        .unwrap();

        assert_eq!(out, CubeTriangles { emitted: 1, skipped: 1 });
        assert_eq!(mesh.triangle_count(), 1);
    }
}
