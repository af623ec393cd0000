/// Face continuity checks over a built [memory::MemoryRegion]
pub mod continuity;
/// Element records: connectivity, template and scale factor values
pub mod element;
/// In-memory, all-or-nothing implementation of [Region]
pub mod memory;
/// Node records and node templates
pub mod node;

pub use node::NodeTemplate;

use crate::template::ElementFieldTemplate;

use nalgebra::Vector3;
use std::fmt;
use std::sync::Arc;

/// Nodal parameter labels of a tricubic Hermite coordinate field
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueLabel {
    Value,
    Ds1,
    Ds2,
    D2Ds1Ds2,
    Ds3,
    D2Ds1Ds3,
    D2Ds2Ds3,
    D3Ds1Ds2Ds3,
}

impl ValueLabel {
    /// Labels in the order of the 8 per-node functions of the tricubic Hermite basis.
    ///
    /// Bit `d` of a label's position is set when it differentiates along direction `d + 1`.
    pub const HERMITE_ORDER: [ValueLabel; 8] = [
        ValueLabel::Value,
        ValueLabel::Ds1,
        ValueLabel::Ds2,
        ValueLabel::D2Ds1Ds2,
        ValueLabel::Ds3,
        ValueLabel::D2Ds1Ds3,
        ValueLabel::D2Ds2Ds3,
        ValueLabel::D3Ds1Ds2Ds3,
    ];

    /// Position of this label in [ValueLabel::HERMITE_ORDER]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_cross_derivative(self) -> bool {
        matches!(
            self,
            Self::D2Ds1Ds2 | Self::D2Ds1Ds3 | Self::D2Ds2Ds3 | Self::D3Ds1Ds2Ds3
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Value => "VALUE",
            Self::Ds1 => "D_DS1",
            Self::Ds2 => "D_DS2",
            Self::D2Ds1Ds2 => "D2_DS1DS2",
            Self::Ds3 => "D_DS3",
            Self::D2Ds1Ds3 => "D2_DS1DS3",
            Self::D2Ds2Ds3 => "D2_DS2DS3",
            Self::D3Ds1Ds2Ds3 => "D3_DS1DS2DS3",
        }
    }
}

impl fmt::Display for ValueLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A named 3-component rectangular cartesian coordinate field
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoordinateField {
    pub name: String,
    pub components: [String; 3],
}

/// The finite element engine operations needed to build a mesh.
///
/// A `Region` is the builder context threaded through mesh generation. Implementations
/// must buffer everything between the outermost [Region::begin_change] and
/// [Region::end_change] so observers never see a partially built mesh, and must discard
/// the buffered changes on [Region::abort_change].
pub trait Region {
    /// True if the region holds no coordinate field, nodes or elements
    fn is_empty(&self) -> bool;

    fn begin_change(&mut self);

    /// Commit buffered changes once the outermost change ends
    fn end_change(&mut self) -> Result<(), RegionError>;

    /// Discard the changes made since the matching [Region::begin_change] and end that change
    fn abort_change(&mut self);

    fn define_coordinate_field(
        &mut self,
        name: &str,
        components: [&str; 3],
    ) -> Result<(), RegionError>;

    /// Create a node with a positive identifier, defining the parameters listed by `template`
    fn create_node(&mut self, id: usize, template: &NodeTemplate) -> Result<(), RegionError>;

    fn set_node_parameter(
        &mut self,
        id: usize,
        label: ValueLabel,
        value: Vector3<f64>,
    ) -> Result<(), RegionError>;

    fn create_element(
        &mut self,
        id: usize,
        template: &Arc<ElementFieldTemplate>,
    ) -> Result<(), RegionError>;

    /// Assign the 8 corner nodes in local order (ξ1, ξ2, ξ3) = 000, 100, 010, 110, 001, 101, 011, 111
    fn set_element_nodes(&mut self, id: usize, node_ids: [usize; 8]) -> Result<(), RegionError>;

    /// Assign every local scale factor of an element at once
    fn set_scale_factors(&mut self, id: usize, values: &[f64]) -> Result<(), RegionError>;

    /// Assign a single local scale factor (zero based index)
    fn set_scale_factor(&mut self, id: usize, index: usize, value: f64)
        -> Result<(), RegionError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegionError {
    InvalidIdentifier(usize),
    NotChanging,
    CoordinateFieldAlreadyDefined,
    NoCoordinateField,
    DuplicateNode(usize),
    NodeDoesntExist(usize),
    ParameterNotDefined { node: usize, label: ValueLabel },
    DuplicateElement(usize),
    ElementDoesntExist(usize),
    ElementNodesUnset(usize),
    ElementNodeDoesntExist { element: usize, node: usize },
    ScaleFactorCount { element: usize, expected: usize, found: usize },
    ScaleFactorIndex { element: usize, index: usize, count: usize },
    ScaleFactorUnset { element: usize, index: usize },
    XiOutOfRange { element: usize, xi: [f64; 3] },
}

impl fmt::Display for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidIdentifier(id) => write!(f, "Identifier {} is not positive; Cannot create object!", id),
            Self::NotChanging => write!(f, "No change is in progress; Cannot end change!"),
            Self::CoordinateFieldAlreadyDefined => write!(f, "A coordinate field is already defined; Cannot define another!"),
            Self::NoCoordinateField => write!(f, "No coordinate field is defined; Cannot create nodes or elements!"),
            Self::DuplicateNode(id) => write!(f, "Node {} already exists; Cannot create it again!", id),
            Self::NodeDoesntExist(id) => write!(f, "Node {} does not exist!", id),
            Self::ParameterNotDefined { node, label } => write!(f, "Node {} does not define {}!", node, label),
            Self::DuplicateElement(id) => write!(f, "Element {} already exists; Cannot create it again!", id),
            Self::ElementDoesntExist(id) => write!(f, "Element {} does not exist!", id),
            Self::ElementNodesUnset(id) => write!(f, "Element {} has no nodes assigned!", id),
            Self::ElementNodeDoesntExist { element, node } => write!(f, "Element {} references node {} which does not exist!", element, node),
            Self::ScaleFactorCount { element, expected, found } => write!(f, "Element {} expects {} scale factors; {} were supplied!", element, expected, found),
            Self::ScaleFactorIndex { element, index, count } => write!(f, "Scale factor index {} is out of range for element {} ({} scale factors)!", index, element, count),
            Self::ScaleFactorUnset { element, index } => write!(f, "Scale factor {} of element {} was never set!", index, element),
            Self::XiOutOfRange { element, xi } => write!(f, "Element {} cannot be evaluated outside the unit cube (xi = {:?})!", element, xi),
        }
    }
}

impl std::error::Error for RegionError {}
