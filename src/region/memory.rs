use super::element::Element;
use super::node::{Node, NodeTemplate};
use super::{CoordinateField, Region, RegionError, ValueLabel};
use crate::hermite::{cubic_hermite_basis, cubic_hermite_basis_d1};
use crate::template::{basis_weight, ElementFieldTemplate, FUNCTIONS_PER_NODE, NODES_PER_ELEMENT};

#[cfg(feature = "json_export")]
use json::{object, JsonValue};
use nalgebra::{Matrix3, Vector3};
use std::collections::BTreeMap;
#[cfg(feature = "json_export")]
use std::fs::File;
#[cfg(feature = "json_export")]
use std::io::BufWriter;
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
struct Contents {
    coordinates: Option<CoordinateField>,
    nodes: BTreeMap<usize, Node>,
    elements: BTreeMap<usize, Element>,
}

impl Contents {
    fn coordinates(&self) -> Result<&CoordinateField, RegionError> {
        self.coordinates
            .as_ref()
            .ok_or(RegionError::NoCoordinateField)
    }

    fn node_mut(&mut self, id: usize) -> Result<&mut Node, RegionError> {
        self.nodes
            .get_mut(&id)
            .ok_or(RegionError::NodeDoesntExist(id))
    }

    fn element_mut(&mut self, id: usize) -> Result<&mut Element, RegionError> {
        self.elements
            .get_mut(&id)
            .ok_or(RegionError::ElementDoesntExist(id))
    }

    /// Every element has nodes and scale factors assigned, and every parameter its
    /// template references exists
    fn validate(&self) -> Result<(), RegionError> {
        for element in self.elements.values() {
            let nodes = element.nodes()?;
            for index in 0..element.template.number_of_scale_factors() {
                element.scale_factor(index)?;
            }
            for local_node in 0..NODES_PER_ELEMENT {
                for function in 0..FUNCTIONS_PER_NODE {
                    for term in element.template.function(local_node, function) {
                        let id = nodes[term.local_node];
                        self.nodes
                            .get(&id)
                            .ok_or(RegionError::ElementNodeDoesntExist {
                                element: element.id,
                                node: id,
                            })?
                            .parameter(term.label)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// An in-memory [Region].
///
/// Changes made between the outermost [Region::begin_change] and [Region::end_change]
/// are staged on a copy of the committed contents; they become visible through the
/// read accessors only once the outermost change ends and the staged contents validate.
/// Aborting a nested change restores the staged contents it started from.
#[derive(Clone, Debug, Default)]
pub struct MemoryRegion {
    committed: Contents,
    staged: Option<Contents>,
    /// Staged contents at the start of each nested change
    checkpoints: Vec<Contents>,
    change_depth: usize,
    commits: usize,
}

impl MemoryRegion {
    pub fn new() -> Self {
        Self::default()
    }

    fn contents_mut(&mut self) -> &mut Contents {
        match self.staged.as_mut() {
            Some(staged) => staged,
            None => &mut self.committed,
        }
    }

    /// True while a change is in progress
    pub fn is_changing(&self) -> bool {
        self.change_depth > 0
    }

    /// Number of successfully committed changes
    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn coordinate_field(&self) -> Option<&CoordinateField> {
        self.committed.coordinates.as_ref()
    }

    pub fn node(&self, id: usize) -> Option<&Node> {
        self.committed.nodes.get(&id)
    }

    /// Committed nodes in identifier order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.committed.nodes.values()
    }

    pub fn number_of_nodes(&self) -> usize {
        self.committed.nodes.len()
    }

    pub fn element(&self, id: usize) -> Option<&Element> {
        self.committed.elements.get(&id)
    }

    /// Committed elements in identifier order
    pub fn elements(&self) -> impl Iterator<Item = &Element> + '_ {
        self.committed.elements.values()
    }

    pub fn number_of_elements(&self) -> usize {
        self.committed.elements.len()
    }

    /// Interpolate the coordinate field of `element_id` at `xi` in the unit cube
    pub fn evaluate(&self, element_id: usize, xi: [f64; 3]) -> Result<Vector3<f64>, RegionError> {
        let element = self.checked_element(element_id, xi)?;
        let basis = [
            cubic_hermite_basis(xi[0]),
            cubic_hermite_basis(xi[1]),
            cubic_hermite_basis(xi[2]),
        ];
        self.interpolate(element, &basis)
    }

    /// dx/dξ of `element_id` at `xi`: column `d` holds the derivative w.r.t. ξ(d+1)
    pub fn evaluate_jacobian(
        &self,
        element_id: usize,
        xi: [f64; 3],
    ) -> Result<Matrix3<f64>, RegionError> {
        let element = self.checked_element(element_id, xi)?;
        let values = xi.map(cubic_hermite_basis);
        let derivatives = xi.map(cubic_hermite_basis_d1);

        let mut columns = [Vector3::zeros(); 3];
        for (d, column) in columns.iter_mut().enumerate() {
            let mut basis = values;
            basis[d] = derivatives[d];
            *column = self.interpolate(element, &basis)?;
        }
        Ok(Matrix3::from_columns(&columns))
    }

    fn checked_element(&self, element_id: usize, xi: [f64; 3]) -> Result<&Element, RegionError> {
        let element = self
            .element(element_id)
            .ok_or(RegionError::ElementDoesntExist(element_id))?;
        if xi.iter().any(|x| !(0.0..=1.0).contains(x)) {
            return Err(RegionError::XiOutOfRange {
                element: element_id,
                xi,
            });
        }
        Ok(element)
    }

    fn interpolate(
        &self,
        element: &Element,
        basis: &[[f64; 4]; 3],
    ) -> Result<Vector3<f64>, RegionError> {
        let nodes = element.nodes()?;
        let mut x = Vector3::zeros();

        for local_node in 0..NODES_PER_ELEMENT {
            for function in 0..FUNCTIONS_PER_NODE {
                let terms = element.template.function(local_node, function);
                if terms.is_empty() {
                    continue;
                }
                let weight = basis_weight(basis, local_node, function);
                for term in terms {
                    let id = nodes[term.local_node];
                    let node = self
                        .node(id)
                        .ok_or(RegionError::ElementNodeDoesntExist {
                            element: element.id,
                            node: id,
                        })?;
                    x += node.parameter(term.label)? * (weight * element.scaling(&term.scaling)?);
                }
            }
        }

        Ok(x)
    }

    /// Produce a Json Object that describes the committed contents
    #[cfg(feature = "json_export")]
    pub fn to_json(&self) -> JsonValue {
        let coordinates = match self.coordinate_field() {
            Some(field) => object! {
                "name": field.name.clone(),
                "components": field.components.to_vec(),
            },
            None => JsonValue::Null,
        };
        let nodes: Vec<JsonValue> = self.nodes().map(|n| n.to_json()).collect();
        let elements: Vec<JsonValue> = self.elements().map(|e| e.to_json()).collect();

        let mut templates = JsonValue::new_object();
        for element in self.elements() {
            let kind = element.template.kind().name();
            if !templates.has_key(kind) {
                templates[kind] = element.template.to_json();
            }
        }

        object! {
            "coordinates": coordinates,
            "templates": templates,
            "nodes": nodes,
            "elements": elements,
        }
    }

    /// Export the committed contents to a JSON file at `path`
    #[cfg(feature = "json_export")]
    pub fn export_to_json(&self, path: impl AsRef<str>) -> std::io::Result<()> {
        let mut file = BufWriter::new(File::create(path.as_ref())?);
        self.to_json().write_pretty(&mut file, 4)
    }
}

impl Region for MemoryRegion {
    fn is_empty(&self) -> bool {
        self.committed.coordinates.is_none()
            && self.committed.nodes.is_empty()
            && self.committed.elements.is_empty()
    }

    fn begin_change(&mut self) {
        match self.staged.as_ref() {
            Some(staged) => self.checkpoints.push(staged.clone()),
            None => self.staged = Some(self.committed.clone()),
        }
        self.change_depth += 1;
    }

    fn end_change(&mut self) -> Result<(), RegionError> {
        if self.change_depth == 0 {
            return Err(RegionError::NotChanging);
        }
        self.change_depth -= 1;
        if self.change_depth > 0 {
            self.checkpoints.pop();
            return Ok(());
        }

        match self.staged.take() {
            Some(staged) => {
                staged.validate()?;
                self.committed = staged;
                self.commits += 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn abort_change(&mut self) {
        if self.change_depth == 0 {
            return;
        }
        self.change_depth -= 1;
        self.staged = if self.change_depth == 0 {
            None
        } else {
            self.checkpoints.pop()
        };
    }

    fn define_coordinate_field(
        &mut self,
        name: &str,
        components: [&str; 3],
    ) -> Result<(), RegionError> {
        let contents = self.contents_mut();
        if contents.coordinates.is_some() {
            return Err(RegionError::CoordinateFieldAlreadyDefined);
        }
        contents.coordinates = Some(CoordinateField {
            name: name.to_string(),
            components: components.map(str::to_string),
        });
        Ok(())
    }

    fn create_node(&mut self, id: usize, template: &NodeTemplate) -> Result<(), RegionError> {
        if id == 0 {
            return Err(RegionError::InvalidIdentifier(id));
        }
        let contents = self.contents_mut();
        contents.coordinates()?;
        if contents.nodes.contains_key(&id) {
            return Err(RegionError::DuplicateNode(id));
        }
        contents.nodes.insert(id, Node::new(id, template));
        Ok(())
    }

    fn set_node_parameter(
        &mut self,
        id: usize,
        label: ValueLabel,
        value: Vector3<f64>,
    ) -> Result<(), RegionError> {
        self.contents_mut().node_mut(id)?.set_parameter(label, value)
    }

    fn create_element(
        &mut self,
        id: usize,
        template: &Arc<ElementFieldTemplate>,
    ) -> Result<(), RegionError> {
        if id == 0 {
            return Err(RegionError::InvalidIdentifier(id));
        }
        let contents = self.contents_mut();
        contents.coordinates()?;
        if contents.elements.contains_key(&id) {
            return Err(RegionError::DuplicateElement(id));
        }
        contents.elements.insert(id, Element::new(id, template));
        Ok(())
    }

    fn set_element_nodes(&mut self, id: usize, node_ids: [usize; 8]) -> Result<(), RegionError> {
        let contents = self.contents_mut();
        if let Some(&missing) = node_ids.iter().find(|&&n| !contents.nodes.contains_key(&n)) {
            return Err(RegionError::ElementNodeDoesntExist {
                element: id,
                node: missing,
            });
        }
        contents.element_mut(id)?.set_nodes(node_ids);
        Ok(())
    }

    fn set_scale_factors(&mut self, id: usize, values: &[f64]) -> Result<(), RegionError> {
        self.contents_mut().element_mut(id)?.set_scale_factors(values)
    }

    fn set_scale_factor(
        &mut self,
        id: usize,
        index: usize,
        value: f64,
    ) -> Result<(), RegionError> {
        self.contents_mut()
            .element_mut(id)?
            .set_scale_factor(index, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::EftKind;

    /// A unit cube with corner positions at the local node coordinates and unit first derivatives
    fn unit_cube(region: &mut MemoryRegion) {
        let template = Arc::new(ElementFieldTemplate::build(EftKind::Regular, false, 0));
        region
            .define_coordinate_field("coordinates", ["x", "y", "z"])
            .unwrap();
        for n in 0..8 {
            let id = n + 1;
            region
                .create_node(id, &NodeTemplate::first_derivatives())
                .unwrap();
            let corner = Vector3::new((n & 1) as f64, ((n >> 1) & 1) as f64, ((n >> 2) & 1) as f64);
            region.set_node_parameter(id, ValueLabel::Value, corner).unwrap();
            region.set_node_parameter(id, ValueLabel::Ds1, Vector3::x()).unwrap();
            region.set_node_parameter(id, ValueLabel::Ds2, Vector3::y()).unwrap();
            region.set_node_parameter(id, ValueLabel::Ds3, Vector3::z()).unwrap();
        }
        region.create_element(1, &template).unwrap();
        region
            .set_element_nodes(1, [1, 2, 3, 4, 5, 6, 7, 8])
            .unwrap();
    }

    #[test]
    fn staged_changes_are_invisible_until_committed() {
        let mut region = MemoryRegion::new();
        region.begin_change();
        unit_cube(&mut region);

        assert!(region.is_empty());
        assert_eq!(region.number_of_nodes(), 0);

        region.end_change().unwrap();
        assert!(!region.is_empty());
        assert_eq!(region.number_of_nodes(), 8);
        assert_eq!(region.number_of_elements(), 1);
        assert_eq!(region.commits(), 1);
    }

    #[test]
    fn nested_changes_commit_once() {
        let mut region = MemoryRegion::new();
        region.begin_change();
        region.begin_change();
        unit_cube(&mut region);
        region.end_change().unwrap();

        assert!(region.is_changing());
        assert!(region.is_empty());

        region.end_change().unwrap();
        assert_eq!(region.commits(), 1);
        assert_eq!(region.end_change(), Err(RegionError::NotChanging));
    }

    #[test]
    fn abort_discards_everything() {
        let mut region = MemoryRegion::new();
        region.begin_change();
        unit_cube(&mut region);
        region.abort_change();

        assert!(region.is_empty());
        assert!(!region.is_changing());
        assert_eq!(region.commits(), 0);
    }

    #[test]
    fn nested_abort_keeps_enclosing_change() {
        let mut region = MemoryRegion::new();
        region.begin_change();
        unit_cube(&mut region);

        region.begin_change();
        region
            .create_node(9, &NodeTemplate::first_derivatives())
            .unwrap();
        region.abort_change();

        assert!(region.is_changing());
        region.end_change().unwrap();
        assert_eq!(region.number_of_nodes(), 8);
        assert!(region.node(9).is_none());
        assert_eq!(region.commits(), 1);

        // nothing to abort
        region.abort_change();
        assert_eq!(region.number_of_nodes(), 8);
    }

    #[test]
    fn invalid_contents_are_not_committed() {
        let mut region = MemoryRegion::new();
        region.begin_change();
        unit_cube(&mut region);
        let template = Arc::new(ElementFieldTemplate::build(EftKind::Outer, false, 0));
        region.create_element(2, &template).unwrap();
        region
            .set_element_nodes(2, [1, 2, 3, 4, 5, 6, 7, 8])
            .unwrap();

        assert_eq!(
            region.end_change(),
            Err(RegionError::ScaleFactorUnset {
                element: 2,
                index: 0
            })
        );
        assert!(region.is_empty());
        assert!(!region.is_changing());
    }

    #[test]
    fn creation_errors() {
        let mut region = MemoryRegion::new();
        assert_eq!(
            region.create_node(1, &NodeTemplate::first_derivatives()),
            Err(RegionError::NoCoordinateField)
        );

        unit_cube(&mut region);
        assert_eq!(
            region.create_node(0, &NodeTemplate::first_derivatives()),
            Err(RegionError::InvalidIdentifier(0))
        );
        assert_eq!(
            region.create_node(3, &NodeTemplate::first_derivatives()),
            Err(RegionError::DuplicateNode(3))
        );
        assert_eq!(
            region.set_element_nodes(1, [1, 2, 3, 4, 5, 6, 7, 99]),
            Err(RegionError::ElementNodeDoesntExist {
                element: 1,
                node: 99
            })
        );
        assert_eq!(
            region.set_node_parameter(1, ValueLabel::D2Ds1Ds2, Vector3::zeros()),
            Err(RegionError::ParameterNotDefined {
                node: 1,
                label: ValueLabel::D2Ds1Ds2
            })
        );
    }

    #[test]
    fn unit_cube_interpolates_identity() {
        let mut region = MemoryRegion::new();
        region.begin_change();
        unit_cube(&mut region);
        region.end_change().unwrap();

        for xi in [[0.0, 0.0, 0.0], [0.25, 0.5, 0.75], [1.0, 0.3, 0.9]] {
            let x = region.evaluate(1, xi).unwrap();
            let jacobian = region.evaluate_jacobian(1, xi).unwrap();
            for i in 0..3 {
                assert!((x[i] - xi[i]).abs() < 1e-14);
            }
            assert!((jacobian - Matrix3::identity()).norm() < 1e-13);
        }

        assert!(matches!(
            region.evaluate(1, [0.5, 1.5, 0.5]),
            Err(RegionError::XiOutOfRange { element: 1, .. })
        ));
        assert_eq!(
            region.evaluate(4, [0.5; 3]),
            Err(RegionError::ElementDoesntExist(4))
        );
    }

    #[cfg(feature = "json_export")]
    #[test]
    fn json_lists_nodes_and_elements() {
        let mut region = MemoryRegion::new();
        unit_cube(&mut region);

        let exported = region.to_json();
        assert_eq!(exported["coordinates"]["name"], "coordinates");
        assert_eq!(exported["nodes"].len(), 8);
        assert_eq!(exported["elements"][0]["template"], "regular");
        assert_eq!(exported["nodes"][7]["parameters"]["VALUE"][2], 1.0);
        assert!(exported["templates"].has_key("regular"));
    }
}
