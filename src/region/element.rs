use super::RegionError;
use crate::template::{ElementFieldTemplate, NODES_PER_ELEMENT};

#[cfg(feature = "json_export")]
use json::{object, JsonValue};
use smallvec::{smallvec, SmallVec};
use std::sync::Arc;

/// A hexahedral element of the coordinate field
#[derive(Clone, Debug)]
pub struct Element {
    pub id: usize,
    pub template: Arc<ElementFieldTemplate>,
    nodes: Option<[usize; NODES_PER_ELEMENT]>,
    scale_factors: SmallVec<[Option<f64>; 9]>,
}

impl Element {
    pub fn new(id: usize, template: &Arc<ElementFieldTemplate>) -> Self {
        Self {
            id,
            template: Arc::clone(template),
            nodes: None,
            scale_factors: smallvec![None; template.number_of_scale_factors()],
        }
    }

    /// Global node identifiers in local node order, once assigned
    pub fn nodes(&self) -> Result<&[usize; NODES_PER_ELEMENT], RegionError> {
        self.nodes
            .as_ref()
            .ok_or(RegionError::ElementNodesUnset(self.id))
    }

    pub fn set_nodes(&mut self, node_ids: [usize; NODES_PER_ELEMENT]) {
        self.nodes = Some(node_ids);
    }

    pub fn set_scale_factors(&mut self, values: &[f64]) -> Result<(), RegionError> {
        if values.len() != self.scale_factors.len() {
            return Err(RegionError::ScaleFactorCount {
                element: self.id,
                expected: self.scale_factors.len(),
                found: values.len(),
            });
        }
        for (sf, value) in self.scale_factors.iter_mut().zip(values) {
            *sf = Some(*value);
        }
        Ok(())
    }

    pub fn set_scale_factor(&mut self, index: usize, value: f64) -> Result<(), RegionError> {
        let count = self.scale_factors.len();
        match self.scale_factors.get_mut(index) {
            Some(sf) => {
                *sf = Some(value);
                Ok(())
            }
            None => Err(RegionError::ScaleFactorIndex {
                element: self.id,
                index,
                count,
            }),
        }
    }

    pub fn scale_factor(&self, index: usize) -> Result<f64, RegionError> {
        match self.scale_factors.get(index) {
            Some(Some(value)) => Ok(*value),
            Some(None) => Err(RegionError::ScaleFactorUnset {
                element: self.id,
                index,
            }),
            None => Err(RegionError::ScaleFactorIndex {
                element: self.id,
                index,
                count: self.scale_factors.len(),
            }),
        }
    }

    /// Product of the listed local scale factors
    pub fn scaling(&self, indices: &[usize]) -> Result<f64, RegionError> {
        let mut product = 1.0;
        for &index in indices {
            product *= self.scale_factor(index)?;
        }
        Ok(product)
    }

    /// Produce a Json Object that describes this Element
    #[cfg(feature = "json_export")]
    pub fn to_json(&self) -> JsonValue {
        let nodes = self.nodes.map_or(JsonValue::Null, |n| JsonValue::from(n.to_vec()));
        let scale_factors: Vec<JsonValue> = self
            .scale_factors
            .iter()
            .map(|sf| sf.map_or(JsonValue::Null, JsonValue::from))
            .collect();

        object! {
            "id": self.id,
            "template": self.template.kind().name(),
            "nodes": nodes,
            "scale_factors": scale_factors,
        }
    }
}
