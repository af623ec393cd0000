use super::EftKind;

use std::f64::consts::FRAC_1_SQRT_2 as C;

/// Half of the node-general scale factors that sit at a pole and take the apex identifier offset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum ApexHalf {
    /// Scale factors 0..4 (local nodes 0..4)
    First,
    /// Scale factors 4..8
    Second,
}

/// Replace the default term of one function at four local nodes with two scaled terms
/// (`D_DS1`, `D_DS3`), each scaled by the next node-general factor in sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct DerivativeMap {
    /// Per-node function index (1 = d/dξ1, 4 = d/dξ3)
    pub function: usize,
    pub nodes: [usize; 4],
    /// Additionally scale both terms by the global -1 factor
    pub negated: bool,
}

/// Declarative description of one [EftKind]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct TemplateTable {
    /// Scale factor 0 is a global factor holding -1
    pub global_minus_one: bool,
    pub apex: Option<ApexHalf>,
    pub map: Option<DerivativeMap>,
    /// Local nodes whose d/dξ1 term is scaled by the global -1 factor
    pub negate_ds1: &'static [usize],
    /// Local nodes whose d/dξ2 term is scaled by the global -1 factor
    pub negate_ds2: &'static [usize],
}

const OUTER_NODES: [usize; 4] = [0, 1, 2, 3];

pub(super) const fn table(kind: EftKind) -> TemplateTable {
    match kind {
        EftKind::Regular => TemplateTable {
            global_minus_one: false,
            apex: None,
            map: None,
            negate_ds1: &[],
            negate_ds2: &[],
        },
        EftKind::Outer | EftKind::OuterApex0 => TemplateTable {
            global_minus_one: false,
            apex: match kind {
                EftKind::OuterApex0 => Some(ApexHalf::First),
                _ => None,
            },
            map: Some(DerivativeMap {
                function: 1,
                nodes: OUTER_NODES,
                negated: false,
            }),
            negate_ds1: &[],
            negate_ds2: &[],
        },
        EftKind::OuterApex1 => TemplateTable {
            global_minus_one: true,
            apex: Some(ApexHalf::First),
            map: Some(DerivativeMap {
                function: 1,
                nodes: OUTER_NODES,
                negated: false,
            }),
            negate_ds1: &[4, 5],
            negate_ds2: &[0, 1, 4, 5],
        },
        EftKind::OuterApex2 => TemplateTable {
            global_minus_one: true,
            apex: Some(ApexHalf::Second),
            map: Some(DerivativeMap {
                function: 1,
                nodes: OUTER_NODES,
                negated: false,
            }),
            negate_ds1: &[6, 7],
            negate_ds2: &[2, 3, 6, 7],
        },
        EftKind::Inner1 => TemplateTable {
            global_minus_one: true,
            apex: None,
            map: Some(DerivativeMap {
                function: 4,
                nodes: [0, 2, 4, 6],
                negated: false,
            }),
            negate_ds1: &[4, 6],
            negate_ds2: &[],
        },
        EftKind::Inner2 => TemplateTable {
            global_minus_one: true,
            apex: None,
            map: Some(DerivativeMap {
                function: 4,
                nodes: [1, 3, 5, 7],
                negated: true,
            }),
            negate_ds1: &[5, 7],
            negate_ds2: &[],
        },
    }
}

/// Per-element scale factor values, in template scale factor order
pub(super) const OUTER_SCALE_FACTORS: [f64; 8] = [C, C, C, -C, C, C, C, -C];
pub(super) const APEX1_SCALE_FACTORS: [f64; 9] = [-1.0, -C, C, -C, -C, C, C, C, -C];
pub(super) const APEX2_SCALE_FACTORS: [f64; 9] = [-1.0, C, C, C, -C, -C, C, -C, -C];
pub(super) const INNER1_SCALE_FACTORS: [f64; 9] = [-1.0, C, C, C, C, C, -C, C, -C];
pub(super) const INNER2_SCALE_FACTORS: [f64; 9] = [-1.0, C, -C, C, -C, C, C, C, C];
