/// Element connectivity of the septum mesh
pub mod connectivity;

pub use connectivity::{element_plans, ElementPlan};

use crate::geometry::{synthesize_nodes, ShapeParameters};
use crate::options::MeshOptions;
use crate::region::{NodeTemplate, Region, RegionError};
use crate::template::{EftKind, TemplateError, TemplateSet};

use std::fmt;
use tracing::{debug, info, info_span, warn};

/// Name of the coordinate field the generator defines
pub const COORDINATE_FIELD_NAME: &str = "coordinates";
pub const COORDINATE_COMPONENT_NAMES: [&str; 3] = ["x", "y", "z"];

/// A mesh type a host can list, configure and run against a [Region]
pub trait MeshType {
    fn name(&self) -> &'static str;

    /// Option names in the order a host should present them
    fn ordered_option_names(&self) -> &'static [&'static str];

    fn default_options(&self) -> MeshOptions;

    /// Clamp `options` in place. Returns true if anything changed.
    fn check_options(&self, options: &mut MeshOptions) -> bool {
        options.check()
    }

    fn generate_mesh(
        &self,
        region: &mut dyn Region,
        options: &MeshOptions,
    ) -> Result<MeshSummary, GenerationError>;
}

/// Tricubic Hermite mesh of a spherical shell split into two chambers by a septum
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SphereShellSeptum;

impl SphereShellSeptum {
    pub const NAME: &'static str = "3D Sphere Shell Septum 1";
}

impl MeshType for SphereShellSeptum {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn ordered_option_names(&self) -> &'static [&'static str] {
        &crate::options::ORDERED_OPTION_NAMES
    }

    fn default_options(&self) -> MeshOptions {
        MeshOptions::default()
    }

    fn generate_mesh(
        &self,
        region: &mut dyn Region,
        options: &MeshOptions,
    ) -> Result<MeshSummary, GenerationError> {
        generate_mesh(region, options)
    }
}

/// What a successful generation created
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshSummary {
    pub node_count: usize,
    pub element_count: usize,
    /// Elements created per [EftKind], indexed by [EftKind::index]
    pub elements_by_kind: [usize; 7],
}

/// Build the sphere shell septum mesh in an empty `region`.
///
/// All nodes and elements are created inside a single change, so the region's observers
/// see either the complete mesh or (on error) nothing. When called inside a change the
/// caller already began, an error aborts only the change opened here.
pub fn generate_mesh(
    region: &mut dyn Region,
    options: &MeshOptions,
) -> Result<MeshSummary, GenerationError> {
    if !region.is_empty() {
        return Err(GenerationError::RegionNotEmpty);
    }

    let shape = ShapeParameters::from(options);
    let _span = info_span!(
        "generate_mesh",
        up = shape.elements_count_up,
        across = shape.elements_count_across
    )
    .entered();

    let templates = TemplateSet::new(&shape)?;

    region.begin_change();
    match populate(region, &shape, &templates).and_then(|summary| {
        region.end_change()?;
        Ok(summary)
    }) {
        Ok(summary) => {
            info!(
                nodes = summary.node_count,
                elements = summary.element_count,
                "generated sphere shell septum mesh"
            );
            Ok(summary)
        }
        Err(err) => {
            region.abort_change();
            warn!(error = %err, "aborted mesh generation");
            Err(err.into())
        }
    }
}

fn populate(
    region: &mut dyn Region,
    shape: &ShapeParameters,
    templates: &TemplateSet,
) -> Result<MeshSummary, RegionError> {
    region.define_coordinate_field(COORDINATE_FIELD_NAME, COORDINATE_COMPONENT_NAMES)?;

    let node_template = if shape.use_cross_derivatives {
        NodeTemplate::with_cross_derivatives()
    } else {
        NodeTemplate::first_derivatives()
    };

    let nodes = synthesize_nodes(shape);
    for node in &nodes {
        region.create_node(node.id, &node_template)?;
        for (label, value) in node.parameters() {
            region.set_node_parameter(node.id, label, value)?;
        }
    }
    debug!(count = nodes.len(), "created nodes");

    let plans = element_plans(&shape.layout());
    let mut elements_by_kind = [0; 7];
    for plan in &plans {
        region.create_element(plan.id, templates.get(plan.kind))?;
        region.set_element_nodes(plan.id, plan.nodes)?;
        let scale_factors = plan.kind.scale_factor_values();
        if !scale_factors.is_empty() {
            region.set_scale_factors(plan.id, scale_factors)?;
        }
        elements_by_kind[plan.kind.index()] += 1;
    }
    debug!(count = plans.len(), "created elements");

    Ok(MeshSummary {
        node_count: nodes.len(),
        element_count: plans.len(),
        elements_by_kind,
    })
}

impl MeshSummary {
    pub fn elements_of_kind(&self, kind: EftKind) -> usize {
        self.elements_by_kind[kind.index()]
    }
}

#[derive(Debug)]
pub enum GenerationError {
    /// Generation only runs against a region with no coordinate field, nodes or elements
    RegionNotEmpty,
    Template(TemplateError),
    Region(RegionError),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::RegionNotEmpty => write!(f, "Region already holds a mesh; Cannot generate!"),
            Self::Template(err) => write!(f, "Template construction failed: {}", err),
            Self::Region(err) => write!(f, "Region rejected the mesh: {}", err),
        }
    }
}

impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RegionNotEmpty => None,
            Self::Template(err) => Some(err),
            Self::Region(err) => Some(err),
        }
    }
}

impl From<TemplateError> for GenerationError {
    fn from(err: TemplateError) -> Self {
        Self::Template(err)
    }
}

impl From<RegionError> for GenerationError {
    fn from(err: RegionError) -> Self {
        Self::Region(err)
    }
}
