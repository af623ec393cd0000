mod tables;

use crate::geometry::ShapeParameters;
use crate::region::ValueLabel;
use tables::ApexHalf;

#[cfg(feature = "json_export")]
use json::{object, JsonValue};
use smallvec::{smallvec, SmallVec};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub const NODES_PER_ELEMENT: usize = 8;
pub const FUNCTIONS_PER_NODE: usize = 8;
/// Number of basis functions in a tricubic Hermite element
pub const NUMBER_OF_FUNCTIONS: usize = NODES_PER_ELEMENT * FUNCTIONS_PER_NODE;

/// The seven element field template variants used by the septum mesh
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EftKind {
    /// Standard tricubic Hermite interpolation
    Regular,
    /// Outer-wall column: d/dξ1 at local nodes 0..4 blends `D_DS1` and `D_DS3`
    Outer,
    /// [EftKind::Outer] at the pole between the two outer columns
    OuterApex0,
    /// Bottom pole element on the left outer column
    OuterApex1,
    /// Top pole element on the right outer column
    OuterApex2,
    /// Left inner-wall column: d/dξ3 at local nodes 0, 2, 4, 6 blends `D_DS1` and `D_DS3`
    Inner1,
    /// Right inner-wall column: d/dξ3 at local nodes 1, 3, 5, 7 blends `-D_DS1` and `-D_DS3`
    Inner2,
}

impl EftKind {
    pub const ALL: [EftKind; 7] = [
        EftKind::Regular,
        EftKind::Outer,
        EftKind::OuterApex0,
        EftKind::OuterApex1,
        EftKind::OuterApex2,
        EftKind::Inner1,
        EftKind::Inner2,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Outer => "outer",
            Self::OuterApex0 => "outer apex 0",
            Self::OuterApex1 => "outer apex 1",
            Self::OuterApex2 => "outer apex 2",
            Self::Inner1 => "inner 1",
            Self::Inner2 => "inner 2",
        }
    }

    /// Scale factor values every element of this kind receives, in template order
    pub fn scale_factor_values(self) -> &'static [f64] {
        match self {
            Self::Regular => &[],
            Self::Outer | Self::OuterApex0 => &tables::OUTER_SCALE_FACTORS,
            Self::OuterApex1 => &tables::APEX1_SCALE_FACTORS,
            Self::OuterApex2 => &tables::APEX2_SCALE_FACTORS,
            Self::Inner1 => &tables::INNER1_SCALE_FACTORS,
            Self::Inner2 => &tables::INNER2_SCALE_FACTORS,
        }
    }
}

impl fmt::Display for EftKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleFactorType {
    /// One value shared by the whole element
    GlobalGeneral,
    /// A value attached to one local node of the element
    NodeGeneral,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScaleFactor {
    pub kind: ScaleFactorType,
    pub identifier: u32,
    /// Local node the factor belongs to (node-general factors only)
    pub local_node: Option<usize>,
}

/// One contribution to an element basis function: a nodal parameter times the product of
/// the listed local scale factors
#[derive(Clone, Debug, PartialEq)]
pub struct Term {
    pub local_node: usize,
    pub label: ValueLabel,
    pub scaling: SmallVec<[usize; 2]>,
}

/// Maps each of the 64 element basis functions to a sum of scaled nodal parameters.
///
/// A function with no terms contributes nothing to the interpolated field.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementFieldTemplate {
    kind: EftKind,
    scale_factors: SmallVec<[ScaleFactor; 9]>,
    functions: Vec<SmallVec<[Term; 2]>>,
}

impl ElementFieldTemplate {
    /// Standard tricubic Hermite template: function `k` of node `n` is the nodal parameter
    /// `HERMITE_ORDER[k]` of local node `n`
    fn tricubic_hermite(kind: EftKind) -> Self {
        let functions = (0..NUMBER_OF_FUNCTIONS)
            .map(|f| {
                smallvec![Term {
                    local_node: f / FUNCTIONS_PER_NODE,
                    label: ValueLabel::HERMITE_ORDER[f % FUNCTIONS_PER_NODE],
                    scaling: SmallVec::new(),
                }]
            })
            .collect();

        Self {
            kind,
            scale_factors: SmallVec::new(),
            functions,
        }
    }

    /// Build the template for `kind`.
    ///
    /// Without cross derivatives every cross-derivative function is suppressed; with them,
    /// only the cross-derivative functions at nodes whose first derivatives are remapped.
    /// Node-general scale factors at a pole get `apex_offset` added to their identifier.
    pub fn build(kind: EftKind, use_cross_derivatives: bool, apex_offset: u32) -> Self {
        let table = tables::table(kind);
        let mut eft = Self::tricubic_hermite(kind);

        if table.global_minus_one {
            eft.scale_factors.push(ScaleFactor {
                kind: ScaleFactorType::GlobalGeneral,
                identifier: 1,
                local_node: None,
            });
        }
        let first_node_factor = eft.scale_factors.len();

        if let Some(map) = table.map {
            for (pair, &node) in map.nodes.iter().enumerate() {
                for slot in 0..2 {
                    let at_apex = match table.apex {
                        Some(ApexHalf::First) => pair * 2 + slot < 4,
                        Some(ApexHalf::Second) => pair * 2 + slot >= 4,
                        None => false,
                    };
                    let offset = if at_apex { apex_offset } else { 0 };
                    eft.scale_factors.push(ScaleFactor {
                        kind: ScaleFactorType::NodeGeneral,
                        identifier: offset.saturating_add(slot as u32 + 1),
                        local_node: Some(node),
                    });
                }

                let ds1_factor = first_node_factor + 2 * pair;
                let scaling = |factor: usize| -> SmallVec<[usize; 2]> {
                    if map.negated {
                        smallvec![0, factor]
                    } else {
                        smallvec![factor]
                    }
                };
                eft.set_terms(
                    node,
                    map.function,
                    smallvec![
                        Term {
                            local_node: node,
                            label: ValueLabel::Ds1,
                            scaling: scaling(ds1_factor),
                        },
                        Term {
                            local_node: node,
                            label: ValueLabel::Ds3,
                            scaling: scaling(ds1_factor + 1),
                        },
                    ],
                );
            }
        }

        for &node in table.negate_ds1 {
            eft.functions[node * FUNCTIONS_PER_NODE + 1][0].scaling = smallvec![0];
        }
        for &node in table.negate_ds2 {
            eft.functions[node * FUNCTIONS_PER_NODE + 2][0].scaling = smallvec![0];
        }

        let suppressed: SmallVec<[usize; 8]> = match (use_cross_derivatives, table.map) {
            (true, Some(map)) => SmallVec::from_slice(&map.nodes),
            (true, None) => SmallVec::new(),
            (false, _) => (0..NODES_PER_ELEMENT).collect(),
        };
        for node in suppressed {
            for label in ValueLabel::HERMITE_ORDER {
                if label.is_cross_derivative() {
                    eft.set_terms(node, label.index(), SmallVec::new());
                }
            }
        }

        eft
    }

    fn set_terms(&mut self, node: usize, function: usize, terms: SmallVec<[Term; 2]>) {
        self.functions[node * FUNCTIONS_PER_NODE + function] = terms;
    }

    pub fn kind(&self) -> EftKind {
        self.kind
    }

    pub fn scale_factors(&self) -> &[ScaleFactor] {
        &self.scale_factors
    }

    pub fn number_of_scale_factors(&self) -> usize {
        self.scale_factors.len()
    }

    /// Terms of per-node function `function` at local node `node`
    pub fn function(&self, node: usize, function: usize) -> &[Term] {
        assert!(
            node < NODES_PER_ELEMENT && function < FUNCTIONS_PER_NODE,
            "Function ({}, {}) is outside the tricubic Hermite basis!",
            node,
            function
        );
        &self.functions[node * FUNCTIONS_PER_NODE + function]
    }

    /// Number of basis functions with at least one term
    pub fn number_of_active_functions(&self) -> usize {
        self.functions.iter().filter(|terms| !terms.is_empty()).count()
    }

    /// Check that every term references a valid local node and valid scale factors, that
    /// node-general factors are only applied at their own node, and that the scale factor
    /// declarations agree with [EftKind::scale_factor_values]
    pub fn validate(&self) -> Result<(), TemplateError> {
        let expected = self.kind.scale_factor_values().len();
        if expected != self.scale_factors.len() {
            return Err(TemplateError::ScaleFactorCount {
                kind: self.kind,
                declared: self.scale_factors.len(),
                values: expected,
            });
        }

        for (function, terms) in self.functions.iter().enumerate() {
            for term in terms {
                if term.local_node >= NODES_PER_ELEMENT {
                    return Err(TemplateError::LocalNodeOutOfRange {
                        kind: self.kind,
                        function,
                        local_node: term.local_node,
                    });
                }
                for &index in &term.scaling {
                    let factor = self.scale_factors.get(index).ok_or(
                        TemplateError::ScaleFactorOutOfRange {
                            kind: self.kind,
                            function,
                            index,
                        },
                    )?;
                    if factor.kind == ScaleFactorType::NodeGeneral
                        && factor.local_node != Some(term.local_node)
                    {
                        return Err(TemplateError::ScaleFactorNodeMismatch {
                            kind: self.kind,
                            function,
                            index,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Produce a Json Object that describes this template
    #[cfg(feature = "json_export")]
    pub fn to_json(&self) -> JsonValue {
        let scale_factors: Vec<JsonValue> = self
            .scale_factors
            .iter()
            .map(|sf| {
                let kind = match sf.kind {
                    ScaleFactorType::GlobalGeneral => "global",
                    ScaleFactorType::NodeGeneral => "node",
                };
                let local_node = sf.local_node.map_or(JsonValue::Null, JsonValue::from);
                object! {
                    "type": kind,
                    "identifier": sf.identifier,
                    "local_node": local_node,
                }
            })
            .collect();

        let functions: Vec<JsonValue> = self
            .functions
            .iter()
            .map(|terms| {
                JsonValue::from(
                    terms
                        .iter()
                        .map(|term| {
                            object! {
                                "local_node": term.local_node,
                                "label": term.label.name(),
                                "scaling": term.scaling.to_vec(),
                            }
                        })
                        .collect::<Vec<_>>(),
                )
            })
            .collect();

        object! {
            "kind": self.kind.name(),
            "scale_factors": scale_factors,
            "functions": functions,
        }
    }
}

/// Weight of per-node function `function` at local node `node`, given the 1D cubic Hermite
/// basis values in each direction.
///
/// Bit `d` of `node` selects the element end in direction `d`; bit `d` of `function`
/// selects the value or derivative basis in that direction.
pub fn basis_weight(basis: &[[f64; 4]; 3], node: usize, function: usize) -> f64 {
    (0..3)
        .map(|d| {
            let end = (node >> d) & 1;
            let derivative = (function >> d) & 1;
            basis[d][2 * end + derivative]
        })
        .product()
}

/// One validated, shared template per [EftKind]
#[derive(Clone, Debug)]
pub struct TemplateSet {
    templates: [Arc<ElementFieldTemplate>; 7],
}

impl TemplateSet {
    pub fn new(shape: &ShapeParameters) -> Result<Self, TemplateError> {
        let build = |kind: EftKind| -> Result<Arc<ElementFieldTemplate>, TemplateError> {
            let eft = ElementFieldTemplate::build(
                kind,
                shape.use_cross_derivatives,
                shape.apex_scale_factor_identifier_offset,
            );
            eft.validate()?;
            debug!(
                kind = kind.name(),
                scale_factors = eft.number_of_scale_factors(),
                active_functions = eft.number_of_active_functions(),
                "built element field template"
            );
            Ok(Arc::new(eft))
        };

        Ok(Self {
            templates: [
                build(EftKind::Regular)?,
                build(EftKind::Outer)?,
                build(EftKind::OuterApex0)?,
                build(EftKind::OuterApex1)?,
                build(EftKind::OuterApex2)?,
                build(EftKind::Inner1)?,
                build(EftKind::Inner2)?,
            ],
        })
    }

    pub fn get(&self, kind: EftKind) -> &Arc<ElementFieldTemplate> {
        &self.templates[kind.index()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    ScaleFactorCount {
        kind: EftKind,
        declared: usize,
        values: usize,
    },
    LocalNodeOutOfRange {
        kind: EftKind,
        function: usize,
        local_node: usize,
    },
    ScaleFactorOutOfRange {
        kind: EftKind,
        function: usize,
        index: usize,
    },
    ScaleFactorNodeMismatch {
        kind: EftKind,
        function: usize,
        index: usize,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ScaleFactorCount { kind, declared, values } => write!(
                f,
                "The {} template declares {} scale factors but {} values are assigned; Invalid template!",
                kind, declared, values
            ),
            Self::LocalNodeOutOfRange { kind, function, local_node } => write!(
                f,
                "Function {} of the {} template references local node {}; Invalid template!",
                function, kind, local_node
            ),
            Self::ScaleFactorOutOfRange { kind, function, index } => write!(
                f,
                "Function {} of the {} template references missing scale factor {}; Invalid template!",
                function, kind, index
            ),
            Self::ScaleFactorNodeMismatch { kind, function, index } => write!(
                f,
                "Function {} of the {} template applies node scale factor {} at another node; Invalid template!",
                function, kind, index
            ),
        }
    }
}

impl std::error::Error for TemplateError {}
