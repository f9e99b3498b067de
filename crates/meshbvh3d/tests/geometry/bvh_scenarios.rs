use approx::assert_relative_eq;
use meshbvh3d::bounding_volume::Aabb;
use meshbvh3d::na::{Point3, Vector3};
use meshbvh3d::partitioning::{Bvh, BvhBuildError};
use meshbvh3d::query::Ray;

fn unit_cube_at(x: f32) -> Aabb {
    Aabb::new(Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0))
}

fn quad() -> ([Point3<f32>; 4], [u32; 6]) {
    (
        [
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 1.0, 0.0),
        ],
        [0, 1, 2, 0, 2, 3],
    )
}

#[test]
fn ray_through_the_middle_cube() {
    let bvh = Bvh::from_aabbs(&[unit_cube_at(0.0), unit_cube_at(10.0), unit_cube_at(20.0)]);
    bvh.assert_well_formed();

    let ray = Ray::new(Point3::new(10.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
    let mut hits = vec![];
    bvh.for_each_ray_aabb_collision(&ray, |hit| hits.push(hit));

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].primitive_id, 1);
    assert_relative_eq!(hits[0].distance, 5.0);
    assert_relative_eq!(hits[0].position, Point3::new(10.0, 0.0, 0.0));
    assert_eq!(bvh.ray_aabb_collisions(&ray), hits);
}

#[test]
fn ray_through_a_quad() {
    let (vertices, indices) = quad();
    let bvh = Bvh::from_indexed_triangles(&vertices, &indices).unwrap();
    bvh.assert_well_formed();
    assert_eq!(bvh.max_depth(), 1);

    let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
    let hit = bvh
        .closest_ray_indexed_triangle_collision(&vertices, &indices, &ray)
        .unwrap();
    assert_relative_eq!(hit.distance, 5.0);
    assert!(hit.primitive_id == 0 || hit.primitive_id == 3);
    assert_relative_eq!(hit.position, Point3::origin());

    // The id of the second triangle is the position of its first vertex index.
    let upper_left = Ray::new(Point3::new(-0.5, 0.5, 5.0), Vector3::new(0.0, 0.0, -1.0));
    let hit = bvh
        .closest_ray_indexed_triangle_collision(&vertices, &indices, &upper_left)
        .unwrap();
    assert_eq!(hit.primitive_id, 3);
    assert_eq!(
        &indices[hit.primitive_id as usize..hit.primitive_id as usize + 3],
        &[0, 2, 3]
    );
    let mut prim_ids: Vec<u32> = bvh.prims().iter().map(|prim| prim.id).collect();
    prim_ids.sort_unstable();
    assert_eq!(prim_ids, [0, 3]);

    // Hits both faces.
    let below = Ray::new(Point3::new(0.5, -0.2, -2.0), Vector3::new(0.0, 0.0, 4.0));
    let hit = bvh
        .closest_ray_indexed_triangle_collision(&vertices, &indices, &below)
        .unwrap();
    assert_relative_eq!(hit.distance, 0.5);
    assert_eq!(hit.primitive_id, 0);

    let away = Ray::new(Point3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, 1.0));
    assert_eq!(
        bvh.closest_ray_indexed_triangle_collision(&vertices, &indices, &away),
        None
    );

    let beside = Ray::new(Point3::new(3.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
    assert_eq!(
        bvh.closest_ray_indexed_triangle_collision(&vertices, &indices, &beside),
        None
    );
}

#[test]
fn closest_of_stacked_quads() {
    // Three parallel quads at z = 0, 1, 2.
    let mut vertices = vec![];
    let mut indices = vec![];
    for z in [2.0, 0.0, 1.0] {
        let (quad_vertices, quad_indices) = quad();
        let base = vertices.len() as u32;
        vertices.extend(quad_vertices.iter().map(|pt| *pt + Vector3::z() * z));
        indices.extend(quad_indices.iter().map(|i| base + i));
    }

    let bvh = Bvh::from_indexed_triangles(&vertices, &indices).unwrap();
    let ray = Ray::new(Point3::new(-0.5, 0.25, 10.0), Vector3::new(0.0, 0.0, -2.0));
    let hit = bvh
        .closest_ray_indexed_triangle_collision(&vertices, &indices, &ray)
        .unwrap();
    assert_relative_eq!(hit.distance, 4.0);
    assert_relative_eq!(hit.position, Point3::new(-0.5, 0.25, 2.0));
    assert_eq!(hit.primitive_id, 3);

    let mut all_hits = vec![];
    bvh.for_each_ray_indexed_triangle_collision(&vertices, &indices, &ray, |hit| {
        all_hits.push(hit)
    });
    all_hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    let ids: Vec<_> = all_hits.iter().map(|hit| hit.primitive_id).collect();
    assert_eq!(ids, [3, 15, 9]);

    // Starting between two quads.
    let inside = Ray::new(Point3::new(-0.5, 0.25, 0.5), Vector3::new(0.0, 0.0, 1.0));
    let hit = bvh
        .closest_ray_indexed_triangle_collision(&vertices, &indices, &inside)
        .unwrap();
    assert_relative_eq!(hit.distance, 0.5);
    assert_eq!(hit.primitive_id, 15);
}

#[test]
fn empty_mesh() {
    let indices: [u32; 0] = [];
    let bvh = Bvh::from_indexed_triangles(&[], &indices).unwrap();
    assert!(bvh.is_empty());
    assert_eq!(bvh.max_depth(), 0);
    assert_eq!(bvh.bounds(), None);

    let ray = Ray::new(Point3::origin(), Vector3::x());
    assert_eq!(bvh.closest_ray_indexed_triangle_collision(&[], &indices, &ray), None);
    assert!(bvh.ray_aabb_collisions(&ray).is_empty());
}

#[test]
fn single_triangle() {
    let vertices = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    let bvh = Bvh::from_indexed_triangles(&vertices, &[0u16, 1, 2]).unwrap();
    assert!(!bvh.is_empty());
    assert_eq!(bvh.max_depth(), 0);
    assert_eq!(
        bvh.bounds(),
        Some(Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 0.0)))
    );
}

#[test]
fn coincident_triangles_keep_a_shallow_tree() {
    let vertices = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    let indices: Vec<u32> = (0..3000).map(|i| i % 3).collect();
    let bvh = Bvh::from_indexed_triangles(&vertices, &indices).unwrap();
    bvh.assert_well_formed();
    assert_eq!(bvh.prim_count(), 1000);
    assert!(bvh.max_depth() <= 10);

    let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Vector3::new(0.0, 0.0, -1.0));
    let hit = bvh
        .closest_ray_indexed_triangle_collision(&vertices, &indices, &ray)
        .unwrap();
    assert_relative_eq!(hit.distance, 1.0);
    assert!(hit.primitive_id < 3000);
    assert_eq!(hit.primitive_id % 3, 0);

    let mut count = 0;
    bvh.for_each_ray_indexed_triangle_collision(&vertices, &indices, &ray, |_| count += 1);
    assert_eq!(count, 1000);
}

#[test]
fn invalid_buffers_are_rejected() {
    let (vertices, indices) = quad();

    let err = Bvh::from_indexed_triangles(&vertices, &indices[..5]).unwrap_err();
    assert_eq!(err, BvhBuildError::IndexCountNotMultipleOfThree { len: 5 });

    let err = Bvh::from_indexed_triangles(&vertices[..3], &indices).unwrap_err();
    assert_eq!(
        err,
        BvhBuildError::IndexOutOfBounds {
            position: 5,
            index: 3,
            vertex_count: 3
        }
    );
    assert!(err.is_invalid_argument());
    assert!(!err.to_string().is_empty());
}

#[test]
fn overlapping_aabbs() {
    let cubes = [unit_cube_at(0.0), unit_cube_at(10.0), unit_cube_at(20.0)];
    let bvh = Bvh::from_aabbs(&cubes);

    let query = Aabb::new(Point3::new(0.5, 0.5, 0.5), Point3::new(10.0, 2.0, 2.0));
    let mut found: Vec<u32> = bvh.intersect_aabb(&query).collect();
    found.sort_unstable();
    assert_eq!(found, [0, 1]);

    let far = Aabb::new(Point3::new(50.0, 0.0, 0.0), Point3::new(51.0, 1.0, 1.0));
    let mut count = 0;
    bvh.for_each_aabb_overlap(&far, |_| count += 1);
    assert_eq!(count, 0);
}
