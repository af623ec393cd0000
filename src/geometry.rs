//! Node positions and derivatives of the sphere shell septum.
//!
//! The shell is a unit-diameter sphere segment swept about the y axis from the bottom
//! pole (z < 0) to the top pole (z > 0). Each wall side carries an outer surface, an
//! inner surface and a septum row of nodes sweeping across between the two inner
//! surface columns.

use crate::hermite::{interpolate_cubic_hermite, interpolate_cubic_hermite_derivative};
use crate::layout::{NodeLayout, NodeSite, Pole, Surface, WallSide};
use crate::options::MeshOptions;
use crate::region::ValueLabel;

use nalgebra::Vector3;
use std::f64::consts::{FRAC_PI_4, PI};

/// Clamped, strongly typed inputs of the geometry and template builders
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeParameters {
    pub elements_count_up: usize,
    pub elements_count_across: usize,
    /// `[left, right]`
    pub wall_thickness: [f64; 2],
    pub apex_scale_factor_identifier_offset: u32,
    pub use_cross_derivatives: bool,
}

/// Largest apex identifier offset that keeps both apex scale factor identifiers in `u32`
pub const MAX_APEX_SCALE_FACTOR_IDENTIFIER_OFFSET: u32 = u32::MAX - 2;

impl From<&MeshOptions> for ShapeParameters {
    fn from(options: &MeshOptions) -> Self {
        let options = options.clone().checked();
        Self {
            elements_count_up: options.elements_count_up as usize,
            elements_count_across: options.elements_count_across as usize,
            wall_thickness: [options.wall_thickness_left, options.wall_thickness_right],
            apex_scale_factor_identifier_offset: u32::try_from(
                options.apex_scale_factor_identifier_offset,
            )
            .map_or(MAX_APEX_SCALE_FACTOR_IDENTIFIER_OFFSET, |offset| {
                offset.min(MAX_APEX_SCALE_FACTOR_IDENTIFIER_OFFSET)
            }),
            use_cross_derivatives: options.use_cross_derivatives,
        }
    }
}

impl Default for ShapeParameters {
    fn default() -> Self {
        Self::from(&MeshOptions::default())
    }
}

impl ShapeParameters {
    pub fn layout(&self) -> NodeLayout {
        NodeLayout::new(self.elements_count_up, self.elements_count_across)
    }
}

/// Dimensions derived once from the [ShapeParameters]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeConstants {
    /// Thickness of the septum (equal to the left wall thickness)
    pub septum_thickness: f64,
    /// Radius of the inner surface about the y axis
    pub radius_x: f64,
    /// Half the septum thickness
    pub radius_y: f64,
    /// Sideways shift of the thinner wall's outer surface
    pub side_bulge: f64,
    pub radians_per_element_up: f64,
}

impl ShapeConstants {
    pub fn new(shape: &ShapeParameters) -> Self {
        let [left, right] = shape.wall_thickness;
        let septum_thickness = left;
        let radius_y = 0.5 * septum_thickness;
        let radius_x = 0.5 - left.max(right);
        Self {
            septum_thickness,
            radius_x,
            radius_y,
            side_bulge: 8.0 * radius_y * radius_x / shape.elements_count_across as f64,
            radians_per_element_up: PI / shape.elements_count_up as f64,
        }
    }
}

/// Position, first derivatives and (optionally) zero cross derivatives of one node
#[derive(Clone, Debug, PartialEq)]
pub struct NodeParameters {
    pub id: usize,
    pub side: WallSide,
    pub site: NodeSite,
    pub position: Vector3<f64>,
    pub ds1: Vector3<f64>,
    pub ds2: Vector3<f64>,
    pub ds3: Vector3<f64>,
    pub cross_derivatives: bool,
}

impl NodeParameters {
    /// Every defined nodal parameter in Hermite basis order
    pub fn parameters(&self) -> impl Iterator<Item = (ValueLabel, Vector3<f64>)> + '_ {
        ValueLabel::HERMITE_ORDER
            .iter()
            .filter_map(move |&label| match label {
                ValueLabel::Value => Some((label, self.position)),
                ValueLabel::Ds1 => Some((label, self.ds1)),
                ValueLabel::Ds2 => Some((label, self.ds2)),
                ValueLabel::Ds3 => Some((label, self.ds3)),
                _ if self.cross_derivatives => Some((label, Vector3::zeros())),
                _ => None,
            })
    }
}

/// Compute every node of the mesh, ordered by identifier
pub fn synthesize_nodes(shape: &ShapeParameters) -> Vec<NodeParameters> {
    let layout = shape.layout();
    let constants = ShapeConstants::new(shape);

    let mut nodes = Vec::with_capacity(layout.node_count());
    for side in WallSide::BOTH {
        let wall = SideGeometry::new(shape, &constants, side);
        for site in layout.sites() {
            let [position, ds1, ds2, ds3] = wall.node(site);
            nodes.push(NodeParameters {
                id: layout.node_id(side, site),
                side,
                site,
                position: Vector3::from(position),
                ds1: Vector3::from(ds1),
                ds2: Vector3::from(ds2),
                ds3: Vector3::from(ds3),
                cross_derivatives: shape.use_cross_derivatives,
            });
        }
    }
    nodes
}

type Vec3 = [f64; 3];

/// Interpolation end points of the septum sweep across one row
struct SeptumSweep {
    v1: Vec3,
    d1: Vec3,
    v2: Vec3,
    d2: Vec3,
    /// d/dξ2 at the inner surface (end 1) and at the septum mid-line (end 2)
    up1: Vec3,
    up2: Vec3,
}

/// Per-side geometry: everything needed to place the nodes of one wall side
struct SideGeometry {
    /// -1 left, +1 right
    sign: f64,
    wall_thickness: f64,
    septum_thickness: f64,
    radius_x: f64,
    radius_y: f64,
    /// y of the outer surface nodes
    outer_y: f64,
    /// y of the inner surface nodes
    inner_y: f64,
    /// The inner surface through-wall derivative is radial rather than rotated 45°
    squashed: bool,
    radians_per_element_up: f64,
    up: usize,
    across: usize,
}

impl SideGeometry {
    fn new(shape: &ShapeParameters, constants: &ShapeConstants, side: WallSide) -> Self {
        let [left, right] = shape.wall_thickness;
        let sign = side.sign();
        let bulge = constants.side_bulge;

        let outer_offset = if left > right {
            -bulge
        } else if left < right {
            bulge
        } else {
            0.0
        };
        let squashed = match side {
            WallSide::Left => left < right,
            WallSide::Right => left > right,
        };

        Self {
            sign,
            wall_thickness: shape.wall_thickness[side.index()],
            septum_thickness: constants.septum_thickness,
            radius_x: constants.radius_x,
            radius_y: constants.radius_y,
            outer_y: -sign * constants.radius_y + outer_offset,
            inner_y: -sign * (constants.radius_y + bulge),
            squashed,
            radians_per_element_up: constants.radians_per_element_up,
            up: shape.elements_count_up,
            across: shape.elements_count_across,
        }
    }

    /// `[position, d/dξ1, d/dξ2, d/dξ3]` at `site`
    fn node(&self, site: NodeSite) -> [Vec3; 4] {
        match site {
            NodeSite::Apex(pole, Surface::Outer) => self.outer_apex(pole),
            NodeSite::Apex(pole, Surface::Inner) => self.inner_apex(pole),
            NodeSite::Row { row, column } => self.row_node(row, column),
        }
    }

    fn outer_apex(&self, pole: Pole) -> [Vec3; 4] {
        let r = self.radius_x + self.wall_thickness;
        let z = match pole {
            Pole::Bottom => -1.0,
            Pole::Top => 1.0,
        };
        [
            [0.0, self.outer_y, z * r],
            [0.0, -z * self.septum_thickness, 0.0],
            [r * self.radians_per_element_up, 0.0, 0.0],
            [0.0, 0.0, z * self.wall_thickness],
        ]
    }

    fn inner_apex(&self, pole: Pole) -> [Vec3; 4] {
        let (s45, c45) = FRAC_PI_4.sin_cos();
        let r = self.radius_x;
        let t = self.wall_thickness;
        let m1 = 2.0 * r / self.across as f64;
        let z = match pole {
            Pole::Bottom => -1.0,
            Pole::Top => 1.0,
        };
        let ds3 = if self.squashed {
            [0.0, 0.0, z * t]
        } else {
            [0.0, self.sign * t * c45, z * t * s45]
        };
        [
            [0.0, self.inner_y, z * r],
            [0.0, -z * m1 * s45, self.sign * m1 * c45],
            [r * self.radians_per_element_up, 0.0, 0.0],
            ds3,
        ]
    }

    fn row_node(&self, row: usize, column: usize) -> [Vec3; 4] {
        let (su, cu) = (row as f64 * self.radians_per_element_up).sin_cos();
        let last = self.across + 2;
        match column {
            0 => self.outer_wall(-1.0, su, cu),
            1 => self.inner_wall(-1.0, su, cu),
            c if c == last => self.outer_wall(1.0, su, cu),
            c if c == last - 1 => self.inner_wall(1.0, su, cu),
            c => self.septum(row, c, su, cu),
        }
    }

    /// Outer surface column; `flip` is -1 on the near (column 0) side
    fn outer_wall(&self, flip: f64, su: f64, cu: f64) -> [Vec3; 4] {
        let r = self.radius_x + self.wall_thickness;
        let t = self.wall_thickness;
        let m2 = r * self.radians_per_element_up;
        [
            [flip * r * su, self.outer_y, -r * cu],
            [0.0, flip * self.septum_thickness, 0.0],
            [flip * m2 * cu, 0.0, m2 * su],
            [flip * t * su, 0.0, -t * cu],
        ]
    }

    /// Inner surface column; `flip` is -1 on the near (column 1) side
    fn inner_wall(&self, flip: f64, su: f64, cu: f64) -> [Vec3; 4] {
        let (s45, c45) = FRAC_PI_4.sin_cos();
        let r = self.radius_x;
        let t = self.wall_thickness;
        let m1 = 2.0 * r / self.across as f64;
        let m2 = r * self.radians_per_element_up;
        let ds3 = if self.squashed {
            [flip * su * t, 0.0, -cu * t]
        } else {
            [flip * su * t * s45, self.sign * t * c45, -cu * t * s45]
        };
        [
            [flip * su * r, self.inner_y, -cu * r],
            [
                -self.sign * su * m1 * c45,
                flip * m1 * s45,
                flip * self.sign * cu * m1 * c45,
            ],
            [flip * m2 * cu, 0.0, m2 * su],
            ds3,
        ]
    }

    /// Sweep from the near inner surface node to the septum mid-line of this row
    fn septum_sweep(&self, row: usize, su: f64, cu: f64) -> SeptumSweep {
        let r = self.radius_x;
        let [_, near_ds1, near_ds2, _] = self.inner_wall(-1.0, su, cu);

        let magnitude = (near_ds1[0] * near_ds1[0] + near_ds1[2] * near_ds1[2]).sqrt();
        let rescale = if magnitude > 0.0 {
            -self.sign / magnitude * r * su
        } else {
            0.0
        };
        let xi2 = row as f64 / self.up as f64;

        SeptumSweep {
            v1: [-su * r, -self.sign * self.radius_y, -cu * r],
            d1: [rescale * near_ds1[0], 0.0, rescale * near_ds1[2]],
            v2: [0.0, -self.sign * self.radius_y, 2.0 * (xi2 - 0.5) * r],
            d2: [r * su, 0.0, 0.0],
            up1: near_ds2,
            up2: [0.0, 0.0, 2.0 * self.radius_x / self.up as f64],
        }
    }

    /// Interior septum column `2..=across`, mirrored about x = 0 past the mid-line
    fn septum(&self, row: usize, column: usize, su: f64, cu: f64) -> [Vec3; 4] {
        let sweep = self.septum_sweep(row, su, cu);
        let across = self.across as f64;

        let steps = column - 1;
        let mirrored = steps * 2 > self.across;
        let xi = 2.0 * steps as f64 / across;
        let xi = if mirrored { 2.0 - xi } else { xi };

        let v = interpolate_cubic_hermite(&sweep.v1, &sweep.d1, &sweep.v2, &sweep.d2, xi);
        let d = interpolate_cubic_hermite_derivative(&sweep.v1, &sweep.d1, &sweep.v2, &sweep.d2, xi);
        let up = interpolate_cubic_hermite(&sweep.up1, &[0.0; 3], &sweep.up2, &[0.0; 3], xi);

        let flip = if mirrored { -1.0 } else { 1.0 };
        [
            [flip * v[0], v[1], v[2]],
            [2.0 * d[0] / across, 0.0, flip * 2.0 * d[2] / across],
            [flip * up[0], 0.0, up[2]],
            [0.0, -self.septum_thickness, 0.0],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &Vector3<f64>, expected: [f64; 3]) {
        for i in 0..3 {
            assert!(
                (actual[i] - expected[i]).abs() < 1e-11,
                "{:?} != {:?}",
                actual,
                expected
            );
        }
    }

    fn node(nodes: &[NodeParameters], id: usize) -> &NodeParameters {
        let node = &nodes[id - 1];
        assert_eq!(node.id, id);
        node
    }

    #[test]
    fn shape_parameters_are_clamped() {
        let options = MeshOptions {
            elements_count_up: 1,
            elements_count_across: -3,
            wall_thickness_left: 0.7,
            wall_thickness_right: -0.1,
            apex_scale_factor_identifier_offset: -5,
            use_cross_derivatives: true,
        };
        let shape = ShapeParameters::from(&options);

        assert_eq!(shape.elements_count_up, 2);
        assert_eq!(shape.elements_count_across, 2);
        assert_eq!(shape.wall_thickness, [0.5, 0.0]);
        assert_eq!(shape.apex_scale_factor_identifier_offset, 0);
    }

    #[test]
    fn huge_apex_offset_saturates() {
        for offset in [u32::MAX as i64 - 1, 5_000_000_000, i64::MAX] {
            let options = MeshOptions {
                apex_scale_factor_identifier_offset: offset,
                ..Default::default()
            };
            assert_eq!(
                ShapeParameters::from(&options).apex_scale_factor_identifier_offset,
                MAX_APEX_SCALE_FACTOR_IDENTIFIER_OFFSET
            );
        }
    }

    #[test]
    fn constants() {
        let shape = ShapeParameters {
            elements_count_across: 3,
            elements_count_up: 3,
            wall_thickness: [0.3, 0.1],
            ..Default::default()
        };
        let constants = ShapeConstants::new(&shape);

        assert!((constants.septum_thickness - 0.3).abs() < 1e-15);
        assert!((constants.radius_y - 0.15).abs() < 1e-15);
        assert!((constants.radius_x - 0.2).abs() < 1e-15);
        assert!((constants.side_bulge - 0.08).abs() < 1e-15);
        assert!((constants.radians_per_element_up - PI / 3.0).abs() < 1e-15);
    }

    #[test]
    fn one_node_per_identifier() {
        for (up, across) in [(2, 2), (4, 2), (3, 5)] {
            let shape = ShapeParameters {
                elements_count_up: up,
                elements_count_across: across,
                ..Default::default()
            };
            let nodes = synthesize_nodes(&shape);
            assert_eq!(nodes.len(), shape.layout().node_count());
            for (i, node) in nodes.iter().enumerate() {
                assert_eq!(node.id, i + 1);
            }
        }
    }

    #[test]
    fn default_shape_reference_nodes() {
        let nodes = synthesize_nodes(&ShapeParameters::default());
        let c = FRAC_PI_4.cos() * 0.25;

        let bottom_outer = node(&nodes, 1);
        assert_close(&bottom_outer.position, [0.0, 0.125, -0.5]);
        assert_close(&bottom_outer.ds1, [0.0, 0.25, 0.0]);
        assert_close(&bottom_outer.ds2, [PI / 8.0, 0.0, 0.0]);
        assert_close(&bottom_outer.ds3, [0.0, 0.0, -0.25]);

        let bottom_inner = node(&nodes, 2);
        assert_close(&bottom_inner.position, [0.0, 0.25, -0.25]);
        assert_close(&bottom_inner.ds1, [0.0, c, -c]);
        assert_close(&bottom_inner.ds2, [PI / 16.0, 0.0, 0.0]);
        assert_close(&bottom_inner.ds3, [0.0, -c, -c]);

        assert_close(&node(&nodes, 3).position, [-0.353553390593274, 0.125, -0.353553390593274]);

        let inner = node(&nodes, 4);
        assert_close(&inner.position, [-0.176776695296637, 0.25, -0.176776695296637]);
        assert_close(&inner.ds1, [0.125, -c, 0.125]);

        let septum = node(&nodes, 5);
        assert_close(&septum.position, [0.0, 0.125, -0.125]);
        assert_close(&septum.ds1, [0.176776695296637, 0.0, 0.0]);
        assert_close(&septum.ds2, [0.0, 0.0, 0.125]);
        assert_close(&septum.ds3, [0.0, -0.25, 0.0]);

        assert_close(&node(&nodes, 19).position, [0.0, 0.125, 0.5]);
        assert_close(&node(&nodes, 20).position, [0.0, -0.125, -0.5]);
    }

    #[test]
    fn asymmetric_walls_bulge_and_squash() {
        let shape = ShapeParameters {
            elements_count_up: 3,
            elements_count_across: 3,
            wall_thickness: [0.3, 0.1],
            ..Default::default()
        };
        let nodes = synthesize_nodes(&shape);

        let bottom_outer = node(&nodes, 1);
        assert_close(&bottom_outer.position, [0.0, 0.07, -0.5]);
        assert_close(&bottom_outer.ds1, [0.0, 0.3, 0.0]);
        assert_close(&bottom_outer.ds2, [PI / 6.0, 0.0, 0.0]);
        assert_close(&bottom_outer.ds3, [0.0, 0.0, -0.3]);

        let bottom_inner = node(&nodes, 2);
        assert_close(&bottom_inner.position, [0.0, 0.23, -0.2]);
        assert_close(&bottom_inner.ds1, [0.0, 0.094280904158206, -0.094280904158206]);
        assert_close(&bottom_inner.ds3, [0.0, -0.212132034355964, -0.212132034355964]);

        let septum = node(&nodes, 5);
        assert_close(&septum.position, [-0.05945392179, 0.15, -0.068893638984]);
        assert_close(&septum.ds1, [0.120626738451, 0.0, 0.010384620657]);
        assert_close(&septum.ds2, [-0.027149566142, 0.0, 0.14578986006]);

        // thinner right wall: outer surface pulled in, inner surface through-wall derivative radial
        assert_close(&node(&nodes, 24).position, [0.259807621135, -0.23, -0.15]);
        let right_bottom_inner = node(&nodes, 18);
        assert_close(&right_bottom_inner.ds3, [0.0, 0.0, -0.1]);
    }

    #[test]
    fn equal_walls_mirror_in_y() {
        let shape = ShapeParameters {
            elements_count_up: 5,
            elements_count_across: 4,
            wall_thickness: [0.2, 0.2],
            ..Default::default()
        };
        let nodes = synthesize_nodes(&shape);
        let stride = shape.layout().side_stride();

        for left in &nodes[..stride] {
            let right = &nodes[left.id - 1 + stride];
            assert!((left.position.x - right.position.x).abs() < 1e-14);
            assert!((left.position.y + right.position.y).abs() < 1e-14);
            assert!((left.position.z - right.position.z).abs() < 1e-14);
        }
    }

    #[test]
    fn septum_rows_are_symmetric_about_the_mid_plane() {
        let shape = ShapeParameters {
            elements_count_up: 4,
            elements_count_across: 4,
            ..Default::default()
        };
        let layout = shape.layout();
        let nodes = synthesize_nodes(&shape);

        for row in 1..4 {
            for column in 0..=6 {
                let a = &nodes[layout.row_node(WallSide::Left, row, column) - 1];
                let b = &nodes[layout.row_node(WallSide::Left, row, 6 - column) - 1];
                assert!((a.position.x + b.position.x).abs() < 1e-14);
                assert!((a.position.z - b.position.z).abs() < 1e-14);
            }
        }
    }

    #[test]
    fn thickest_wall_collapses_inner_radius() {
        let shape = ShapeParameters {
            wall_thickness: [0.5, 0.25],
            ..Default::default()
        };
        let nodes = synthesize_nodes(&shape);
        for node in &nodes {
            assert!(node.position.iter().all(|v| v.is_finite()));
            assert!(node.ds1.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn cross_derivatives_are_zero() {
        let shape = ShapeParameters {
            use_cross_derivatives: true,
            ..Default::default()
        };
        let nodes = synthesize_nodes(&shape);
        let parameters: Vec<_> = nodes[4].parameters().collect();

        assert_eq!(parameters.len(), 8);
        for (label, value) in parameters {
            if label.is_cross_derivative() {
                assert_eq!(value, Vector3::zeros());
            }
        }

        let without = synthesize_nodes(&ShapeParameters::default());
        assert_eq!(without[4].parameters().count(), 4);
    }
}
