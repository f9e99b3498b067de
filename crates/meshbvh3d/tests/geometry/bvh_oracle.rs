use meshbvh3d::na::{Point3, Vector3};
use meshbvh3d::partitioning::{Bvh, BvhBuildOptions, BvhCollision};
use meshbvh3d::query::{ray_triangle_intersection, Ray};

const NUM_TRIANGLES: usize = 500;
const NUM_RAYS: usize = 1000;

fn rand_in(rng: &mut oorandom::Rand32, min: f32, max: f32) -> f32 {
    min + rng.rand_float() * (max - min)
}

fn rand_point(rng: &mut oorandom::Rand32, extent: f32) -> Point3<f32> {
    Point3::new(
        rand_in(rng, -extent, extent),
        rand_in(rng, -extent, extent),
        rand_in(rng, -extent, extent),
    )
}

/// A soup of small random triangles, as a vertex buffer with three vertices per triangle
/// and the matching index buffer.
fn random_mesh(seed: u64) -> (Vec<Point3<f32>>, Vec<u32>) {
    let mut rng = oorandom::Rand32::new(seed);
    let mut vertices = vec![];

    for _ in 0..NUM_TRIANGLES {
        let center = rand_point(&mut rng, 10.0);
        for _ in 0..3 {
            vertices.push(center + rand_point(&mut rng, 1.0).coords);
        }
    }

    // Shuffle the vertices so the index buffer is not the identity.
    let mut indices: Vec<u32> = (0..vertices.len() as u32).collect();
    for i in (1..vertices.len()).rev() {
        let j = rng.rand_range(0..(i as u32 + 1)) as usize;
        vertices.swap(i, j);
        indices.swap(i, j);
    }
    let mut inverse = vec![0; indices.len()];
    for (new_pos, old_pos) in indices.iter().enumerate() {
        inverse[*old_pos as usize] = new_pos as u32;
    }

    (vertices, inverse)
}

fn random_rays(seed: u64) -> Vec<Ray> {
    let mut rng = oorandom::Rand32::new(seed);
    (0..NUM_RAYS)
        .map(|_| {
            let origin = rand_point(&mut rng, 15.0);
            let target = rand_point(&mut rng, 10.0);
            Ray::new(origin, target - origin)
        })
        .collect()
}

fn brute_force_hits(vertices: &[Point3<f32>], indices: &[u32], ray: &Ray) -> Vec<BvhCollision> {
    indices
        .chunks_exact(3)
        .enumerate()
        .filter_map(|(i, tri)| {
            let distance = ray_triangle_intersection(
                &vertices[tri[0] as usize],
                &vertices[tri[1] as usize],
                &vertices[tri[2] as usize],
                ray,
            )?;
            Some(BvhCollision {
                primitive_id: 3 * i as u32,
                distance,
                position: ray.point_at(distance),
            })
        })
        .collect()
}

fn closest(hits: &[BvhCollision]) -> Option<BvhCollision> {
    hits.iter()
        .copied()
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Checks `actual` against the closest of the brute-force `hits`.
///
/// The identifiers must match, unless the brute-force scan hits both triangles at exactly
/// the same distance.
fn assert_same_closest_hit(ray: &Ray, actual: Option<BvhCollision>, hits: &[BvhCollision]) {
    match (actual, closest(hits)) {
        (None, None) => {}
        (Some(actual), Some(expected)) => {
            let tolerance = 1.0e-4 * expected.distance.max(1.0);
            assert!(
                (actual.distance - expected.distance).abs() <= tolerance,
                "Ray {ray:?}: distance {} instead of {}",
                actual.distance,
                expected.distance
            );

            if actual.primitive_id != expected.primitive_id {
                let tie = hits.iter().any(|hit| {
                    hit.primitive_id == actual.primitive_id && hit.distance == expected.distance
                });
                assert!(
                    tie,
                    "Ray {ray:?}: triangle {} instead of {}",
                    actual.primitive_id, expected.primitive_id
                );
            }
        }
        (actual, expected) => panic!("Ray {ray:?}: hit {actual:?} instead of {expected:?}"),
    }
}

#[test]
fn closest_hit_matches_brute_force() {
    let (vertices, indices) = random_mesh(42);
    let rays = random_rays(1234);
    let bvh = Bvh::from_indexed_triangles(&vertices, &indices).unwrap();
    bvh.assert_well_formed();

    let mut num_hits = 0;

    for ray in &rays {
        let actual = bvh.closest_ray_indexed_triangle_collision(&vertices, &indices, ray);
        let hits = brute_force_hits(&vertices, &indices, ray);
        num_hits += !hits.is_empty() as usize;
        assert_same_closest_hit(ray, actual, &hits);
    }

    // Make sure the battery actually exercises hits and misses.
    assert!(num_hits > NUM_RAYS / 10);
    assert!(num_hits < NUM_RAYS);
}

#[test]
fn closest_hit_matches_brute_force_with_large_leaves() {
    let (vertices, indices) = random_mesh(7);
    let rays = random_rays(77);
    let options = BvhBuildOptions {
        max_leaf_size: 8,
        max_depth: 64,
    };
    let mut bvh = Bvh::new();
    bvh.build_from_indexed_triangles_with_options(&options, &vertices, &indices)
        .unwrap();
    bvh.assert_well_formed();

    for ray in &rays {
        let actual = bvh.closest_ray_indexed_triangle_collision(&vertices, &indices, ray);
        let hits = brute_force_hits(&vertices, &indices, ray);
        assert_same_closest_hit(ray, actual, &hits);
    }
}

#[test]
fn u16_and_u32_indices_agree() {
    let (vertices, indices) = random_mesh(42);
    let indices16: Vec<u16> = indices.iter().map(|i| *i as u16).collect();
    let rays = random_rays(5);

    let bvh32 = Bvh::from_indexed_triangles(&vertices, &indices).unwrap();
    let bvh16 = Bvh::from_indexed_triangles(&vertices, &indices16).unwrap();
    assert_eq!(bvh32.nodes(), bvh16.nodes());

    for ray in &rays {
        assert_eq!(
            bvh32.closest_ray_indexed_triangle_collision(&vertices, &indices, ray),
            bvh16.closest_ray_indexed_triangle_collision(&vertices, &indices16, ray)
        );
    }
}

#[test]
fn triangle_soup_matches_indexed_mesh() {
    let (vertices, indices) = random_mesh(3);
    let soup: Vec<_> = indices.iter().map(|i| vertices[*i as usize]).collect();
    let rays = random_rays(33);

    let indexed = Bvh::from_indexed_triangles(&vertices, &indices).unwrap();
    let soup_bvh = Bvh::from_triangles(&soup).unwrap();
    soup_bvh.assert_well_formed();

    for ray in &rays {
        assert_eq!(
            indexed.closest_ray_indexed_triangle_collision(&vertices, &indices, ray),
            soup_bvh.closest_ray_triangle_collision(&soup, ray)
        );
    }
}

#[test]
fn all_hits_match_brute_force() {
    let (vertices, indices) = random_mesh(11);
    let soup: Vec<_> = indices.iter().map(|i| vertices[*i as usize]).collect();
    let rays = random_rays(111);
    let bvh = Bvh::from_indexed_triangles(&vertices, &indices).unwrap();
    let soup_bvh = Bvh::from_triangles(&soup).unwrap();

    for ray in &rays {
        let mut expected: Vec<u32> = brute_force_hits(&vertices, &indices, ray)
            .iter()
            .map(|hit| hit.primitive_id)
            .collect();
        let mut actual = vec![];
        bvh.for_each_ray_indexed_triangle_collision(&vertices, &indices, ray, |hit| {
            assert_eq!(hit.position, ray.point_at(hit.distance));
            actual.push(hit.primitive_id)
        });
        let mut actual_soup = vec![];
        soup_bvh.for_each_ray_triangle_collision(&soup, ray, |hit| {
            actual_soup.push(hit.primitive_id)
        });

        expected.sort_unstable();
        actual.sort_unstable();
        actual_soup.sort_unstable();
        assert_eq!(actual, expected, "Ray {ray:?}");
        assert_eq!(actual_soup, expected, "Ray {ray:?}");
    }
}

#[test]
fn rebuild_is_idempotent() {
    let (vertices, indices) = random_mesh(99);
    let rays = random_rays(999);
    let mut bvh = Bvh::from_indexed_triangles(&vertices, &indices).unwrap();

    let snapshot = |bvh: &Bvh| {
        let hits: Vec<_> = rays
            .iter()
            .map(|ray| {
                bvh.closest_ray_indexed_triangle_collision(&vertices, &indices, ray)
                    .map(|hit| hit.primitive_id)
            })
            .collect();
        (bvh.is_empty(), bvh.bounds(), bvh.max_depth(), hits)
    };

    let first = snapshot(&bvh);
    for _ in 0..3 {
        bvh.build_from_indexed_triangles(&vertices, &indices).unwrap();
        assert_eq!(snapshot(&bvh), first);
    }

    let bounds = first.1.unwrap();
    assert!(vertices.iter().all(|pt| bounds.contains_local_point(pt)));
    assert!(first.2 <= 64);

    // Vectors of all-zero direction never hit anything.
    let degenerate = Ray::new(Point3::origin(), Vector3::zeros());
    assert_eq!(
        bvh.closest_ray_indexed_triangle_collision(&vertices, &indices, &degenerate),
        None
    );
}
