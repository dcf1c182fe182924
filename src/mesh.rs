//! Indexed triangle meshes and a [`Bvh`] bound to one.
//!
//! [`MeshBvh`] answers picking queries (which triangle does a ray hit first) and inside tests
//! for closed meshes.

use nalgebra::{Point3, Vector3};

use crate::aabb::Aabb;
use crate::bounding_hierarchy::BHValue;
use crate::bvh::{BuildOptions, Bvh, Hit};
use crate::error::{BvhError, Result};
use crate::ray::Ray;
use crate::shapes::Triangle;

/// Directions of the two rays cast by [`MeshBvh::is_inside`]. Skewed, so that they are
/// unlikely to run along edges of axis aligned geometry.
const INSIDE_TEST_DIRECTIONS: [[f64; 3]; 2] = [[1.2, 1.1, 0.1], [0.2, -1.1, 0.1]];

/// A triangle mesh given as a vertex list and a list of vertex index triples.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TriangleMesh<T: BHValue> {
    vertices: Vec<Point3<T>>,
    triangles: Vec<[u32; 3]>,
}

impl<T: BHValue> TriangleMesh<T> {
    /// Creates a mesh, checking that every triangle references existing vertices.
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::error::BvhError;
    /// use linear_bvh::mesh::TriangleMesh;
    /// use nalgebra::Point3;
    ///
    /// let vertices = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(0.0, 1.0, 0.0),
    /// ];
    /// assert!(TriangleMesh::new(vertices.clone(), vec![[0, 1, 2]]).is_ok());
    /// assert_eq!(
    ///     TriangleMesh::new(vertices, vec![[0, 1, 3]]),
    ///     Err(BvhError::VertexOutOfRange { triangle: 0, vertex: 3, len: 3 })
    /// );
    /// ```
    pub fn new(vertices: Vec<Point3<T>>, triangles: Vec<[u32; 3]>) -> Result<Self> {
        for (triangle, indices) in triangles.iter().enumerate() {
            if let Some(&vertex) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
                return Err(BvhError::VertexOutOfRange {
                    triangle,
                    vertex,
                    len: vertices.len(),
                });
            }
        }
        Ok(TriangleMesh {
            vertices,
            triangles,
        })
    }

    /// The vertices.
    pub fn vertices(&self) -> &[Point3<T>] {
        &self.vertices
    }

    /// The vertex index triples, one per triangle.
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Number of triangles.
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// Returns true if the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// The corners of triangle `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn corners(&self, index: usize) -> [&Point3<T>; 3] {
        self.triangles[index].map(|vertex| &self.vertices[vertex as usize])
    }

    /// Triangle `index` as a standalone [`Triangle`].
    pub fn triangle(&self, index: usize) -> Triangle<T> {
        let [a, b, c] = self.corners(index);
        Triangle::new(*a, *b, *c)
    }

    /// The box around triangle `index`.
    pub fn triangle_aabb(&self, index: usize) -> Aabb<T, 3> {
        let [a, b, c] = self.corners(index);
        Aabb::empty().grow(a).grow(b).grow(c)
    }

    /// The box around every vertex.
    pub fn bounding_box(&self) -> Aabb<T, 3> {
        self.vertices
            .iter()
            .fold(Aabb::empty(), |aabb, vertex| aabb.grow(vertex))
    }
}

/// A [`Bvh`] over the triangles of a [`TriangleMesh`], owning the mesh.
#[derive(Debug, Clone)]
pub struct MeshBvh<T: BHValue> {
    mesh: TriangleMesh<T>,
    bvh: Bvh<T, 3>,
}

impl<T: BHValue> MeshBvh<T> {
    /// Builds the hierarchy over the triangles of `mesh` with the default [`BuildOptions`].
    pub fn new(mesh: TriangleMesh<T>) -> Self {
        MeshBvh::with_options(mesh, &BuildOptions::default())
    }

    /// Builds the hierarchy over the triangles of `mesh`.
    pub fn with_options(mesh: TriangleMesh<T>, options: &BuildOptions) -> Self {
        let bvh = Bvh::build_from_fn(mesh.len(), |i| mesh.triangle_aabb(i), options);
        MeshBvh { mesh, bvh }
    }

    /// The mesh.
    pub fn mesh(&self) -> &TriangleMesh<T> {
        &self.mesh
    }

    /// The hierarchy over the mesh's triangles.
    pub fn bvh(&self) -> &Bvh<T, 3> {
        &self.bvh
    }

    fn triangle_hit(&self, ray: &Ray<T, 3>, index: usize) -> Option<T> {
        let [a, b, c] = self.mesh.corners(index);
        ray.intersects_triangle(a, b, c).hit()
    }

    /// Returns the triangle `ray` hits first, and the distance to it.
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::mesh::{MeshBvh, TriangleMesh};
    /// use linear_bvh::ray::Ray;
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let vertices = vec![
    ///     Point3::new(0.0_f64, 0.0, 1.0),
    ///     Point3::new(1.0, 0.0, 1.0),
    ///     Point3::new(0.0, 1.0, 1.0),
    ///     Point3::new(0.0, 0.0, 3.0),
    ///     Point3::new(1.0, 0.0, 3.0),
    ///     Point3::new(0.0, 1.0, 3.0),
    /// ];
    /// let mesh = TriangleMesh::new(vertices, vec![[3, 4, 5], [0, 1, 2]]).unwrap();
    /// let mesh_bvh = MeshBvh::new(mesh);
    ///
    /// let ray = Ray::new(Point3::new(0.25, 0.25, 0.0), Vector3::new(0.0, 0.0, 1.0));
    /// let hit = mesh_bvh.intersect(&ray).unwrap();
    /// assert_eq!(hit.primitive_index, 1);
    /// assert!((hit.distance - 1.0).abs() < 1e-9);
    /// ```
    pub fn intersect(&self, ray: &Ray<T, 3>) -> Option<Hit<T>> {
        self.bvh.intersect_with(ray, |index| self.triangle_hit(ray, index))
    }

    /// Number of triangles `ray` crosses in front of its origin.
    pub fn count_crossings(&self, ray: &Ray<T, 3>) -> usize {
        self.bvh
            .count_hits_with(ray, |index| self.triangle_hit(ray, index))
    }

    /// Returns true if `point` lies inside the mesh, which must be closed.
    ///
    /// Two rays in different directions are cast from `point`. The point is inside if both
    /// cross the surface an odd number of times.
    pub fn is_inside(&self, point: &Point3<T>) -> bool {
        if self.mesh.is_empty() || !self.bvh.root_aabb().contains(point) {
            return false;
        }
        INSIDE_TEST_DIRECTIONS.iter().all(|direction| {
            let direction = Vector3::from_iterator(
                direction
                    .iter()
                    .map(|&x| T::from_f64(x).unwrap_or_else(T::zero)),
            );
            self.count_crossings(&Ray::new(*point, direction)) % 2 == 1
        })
    }
}
