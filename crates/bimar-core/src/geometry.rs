//! Triangle geometry, material groups and bounding boxes.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec3;

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a geometry, used to cache GPU buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(u64);

impl GeometryId {
    fn next() -> Self {
        Self(NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A contiguous index range drawn with one material of the owning mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryGroup {
    /// First index (not triangle) of the range.
    pub start: u32,
    /// Number of indices in the range.
    pub count: u32,
    /// Index into the mesh's material list.
    pub material_index: usize,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Creates a box from its corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Creates a box from a center and a full size.
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half_size = size * 0.5;
        Self {
            min: center - half_size,
            max: center + half_size,
        }
    }

    /// Smallest box containing all points, `None` for an empty set.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        let (min, max) = points
            .iter()
            .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p)));
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Slab test. Returns the entry distance, or the exit distance when the
    /// origin is inside the box.
    pub fn ray_intersection(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<f32> {
        let inv_dir = ray_dir.recip();

        let t1 = (self.min - ray_origin) * inv_dir;
        let t2 = (self.max - ray_origin) * inv_dir;

        let tmin = t1.min(t2).max_element();
        let tmax = t1.max(t2).min_element();

        if tmax < 0.0 || tmin > tmax {
            return None;
        }

        Some(if tmin < 0.0 { tmax } else { tmin })
    }
}

/// Möller–Trumbore ray/triangle intersection, two-sided.
pub fn ray_intersect_triangle(
    ray_origin: Vec3,
    ray_dir: Vec3,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
) -> Option<f32> {
    let eps = 1e-7;
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray_dir.cross(edge2);
    let a = edge1.dot(h);
    if a.abs() < eps {
        return None;
    }
    let f = 1.0 / a;
    let s = ray_origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = f * ray_dir.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = f * edge2.dot(q);
    if t > eps {
        Some(t)
    } else {
        None
    }
}

/// An indexed triangle mesh.
#[derive(Debug, Clone)]
pub struct Geometry {
    id: GeometryId,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    indices: Vec<u32>,
    groups: Vec<GeometryGroup>,
    bounds: Option<Aabb>,
}

impl Geometry {
    /// Creates a geometry with explicit normals and material groups.
    ///
    /// When `groups` is empty the whole index range uses material 0.
    pub fn new(
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        indices: Vec<u32>,
        groups: Vec<GeometryGroup>,
    ) -> Self {
        debug_assert_eq!(positions.len(), normals.len());
        let bounds = Aabb::from_points(&positions);
        let groups = if groups.is_empty() && !indices.is_empty() {
            vec![GeometryGroup {
                start: 0,
                count: indices.len() as u32,
                material_index: 0,
            }]
        } else {
            groups
        };
        Self {
            id: GeometryId::next(),
            positions,
            normals,
            indices,
            groups,
            bounds,
        }
    }

    /// Creates a geometry from positions and triangle indices, computing
    /// area-weighted vertex normals.
    pub fn from_triangles(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let mut normals = vec![Vec3::ZERO; positions.len()];
        for tri in indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if a >= positions.len() || b >= positions.len() || c >= positions.len() {
                continue;
            }
            let n = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
            normals[a] += n;
            normals[b] += n;
            normals[c] += n;
        }
        for n in &mut normals {
            *n = n.normalize_or_zero();
        }
        Self::new(positions, normals, indices, Vec::new())
    }

    /// Axis-aligned box centered on the origin with flat-shaded faces.
    pub fn cuboid(size: Vec3) -> Self {
        let h = size * 0.5;
        let faces: [(Vec3, Vec3); 6] = [
            (Vec3::X, Vec3::Y),
            (Vec3::NEG_X, Vec3::Y),
            (Vec3::Y, Vec3::Z),
            (Vec3::NEG_Y, Vec3::Z),
            (Vec3::Z, Vec3::Y),
            (Vec3::NEG_Z, Vec3::Y),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, up) in faces {
            // right x up == normal keeps counter-clockwise winding outward
            let right = up.cross(normal);
            let base = positions.len() as u32;
            let center = normal * h;
            let u = up * h;
            let r = right * h;
            positions.extend([center - r - u, center + r - u, center + r + u, center - r + u]);
            normals.extend([normal; 4]);
            indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(positions, normals, indices, Vec::new())
    }

    pub fn id(&self) -> GeometryId {
        self.id
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn groups(&self) -> &[GeometryGroup] {
        &self.groups
    }

    /// Local-space bounds, `None` for a geometry without vertices.
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Nearest intersection distance along a local-space ray.
    pub fn ray_intersection(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<f32> {
        self.bounds?.ray_intersection(ray_origin, ray_dir)?;

        let mut nearest: Option<f32> = None;
        for tri in self.indices.chunks_exact(3) {
            let (Some(&v0), Some(&v1), Some(&v2)) = (
                self.positions.get(tri[0] as usize),
                self.positions.get(tri[1] as usize),
                self.positions.get(tri[2] as usize),
            ) else {
                continue;
            };
            if let Some(t) = ray_intersect_triangle(ray_origin, ray_dir, v0, v1, v2) {
                nearest = Some(nearest.map_or(t, |best| best.min(t)));
            }
        }
        nearest
    }
}
