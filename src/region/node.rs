use super::{RegionError, ValueLabel};

#[cfg(feature = "json_export")]
use json::{object, JsonValue};
use nalgebra::Vector3;
use smallvec::SmallVec;

/// The set of nodal parameters a new node defines
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeTemplate {
    labels: SmallVec<[ValueLabel; 8]>,
}

impl NodeTemplate {
    /// Value and the three first derivatives
    pub fn first_derivatives() -> Self {
        Self {
            labels: SmallVec::from_slice(&[
                ValueLabel::Value,
                ValueLabel::Ds1,
                ValueLabel::Ds2,
                ValueLabel::Ds3,
            ]),
        }
    }

    /// Value, the three first derivatives and all four cross derivatives
    pub fn with_cross_derivatives() -> Self {
        Self {
            labels: SmallVec::from_slice(&ValueLabel::HERMITE_ORDER),
        }
    }

    pub fn labels(&self) -> &[ValueLabel] {
        &self.labels
    }

    pub fn defines(&self, label: ValueLabel) -> bool {
        self.labels.contains(&label)
    }
}

/// A node of the coordinate field: one vector per defined [ValueLabel]
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: usize,
    parameters: [Option<Vector3<f64>>; 8],
}

impl Node {
    /// Create a node with every parameter of `template` initialized to zero
    pub fn new(id: usize, template: &NodeTemplate) -> Self {
        let mut parameters = [None; 8];
        for label in template.labels() {
            parameters[label.index()] = Some(Vector3::zeros());
        }
        Self { id, parameters }
    }

    pub fn parameter(&self, label: ValueLabel) -> Result<&Vector3<f64>, RegionError> {
        self.parameters[label.index()]
            .as_ref()
            .ok_or(RegionError::ParameterNotDefined {
                node: self.id,
                label,
            })
    }

    pub fn set_parameter(
        &mut self,
        label: ValueLabel,
        value: Vector3<f64>,
    ) -> Result<(), RegionError> {
        match &mut self.parameters[label.index()] {
            Some(parameter) => {
                *parameter = value;
                Ok(())
            }
            None => Err(RegionError::ParameterNotDefined {
                node: self.id,
                label,
            }),
        }
    }

    /// Iterate over the defined parameters in Hermite basis order
    pub fn parameters(&self) -> impl Iterator<Item = (ValueLabel, &Vector3<f64>)> + '_ {
        ValueLabel::HERMITE_ORDER
            .iter()
            .filter_map(|label| self.parameters[label.index()].as_ref().map(|p| (*label, p)))
    }

    /// Produce a Json Object that describes this Node
    #[cfg(feature = "json_export")]
    pub fn to_json(&self) -> JsonValue {
        let mut parameters = JsonValue::new_object();
        for (label, value) in self.parameters() {
            parameters[label.name()] = JsonValue::from(vec![value.x, value.y, value.z]);
        }

        object! {
            "id": self.id,
            "parameters": parameters,
        }
    }
}
