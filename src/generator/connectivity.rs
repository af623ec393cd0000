use crate::layout::{NodeLayout, NodeSite, Pole, Surface, WallSide};
use crate::template::EftKind;

/// One element to create: identifier, template kind and its 8 nodes in local order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElementPlan {
    pub id: usize,
    pub kind: EftKind,
    pub nodes: [usize; 8],
}

/// Connectivity of every element, in identifier order.
///
/// Elements run from the bottom pole to the top pole. Each pole holds one element per
/// outer column pair (left and right); each interior row holds, from left to right, an
/// outer, an inner-1, `across - 2` regular, an inner-2 and a second outer element.
pub fn element_plans(layout: &NodeLayout) -> Vec<ElementPlan> {
    use WallSide::{Left as L, Right as R};

    let up = layout.up;
    let across = layout.across;
    let r = |side, row, column| layout.row_node(side, row, column);
    let apex = |side, pole, surface| layout.node_id(side, NodeSite::Apex(pole, surface));

    let mut plans = Vec::with_capacity(layout.element_count());
    let mut push = |kind, nodes| {
        let id = plans.len() + 1;
        plans.push(ElementPlan { id, kind, nodes })
    };

    let (bottom_inner, bottom_outer) = (
        |side| apex(side, Pole::Bottom, Surface::Inner),
        |side| apex(side, Pole::Bottom, Surface::Outer),
    );
    push(
        EftKind::OuterApex1,
        [
            bottom_inner(L),
            bottom_inner(R),
            r(L, 1, 1),
            r(R, 1, 1),
            bottom_outer(L),
            bottom_outer(R),
            r(L, 1, 0),
            r(R, 1, 0),
        ],
    );
    push(
        EftKind::OuterApex0,
        [
            bottom_inner(R),
            bottom_inner(L),
            r(R, 1, across + 1),
            r(L, 1, across + 1),
            bottom_outer(R),
            bottom_outer(L),
            r(R, 1, across + 2),
            r(L, 1, across + 2),
        ],
    );

    for n in 1..up - 1 {
        push(
            EftKind::Outer,
            [
                r(L, n, 1),
                r(R, n, 1),
                r(L, n + 1, 1),
                r(R, n + 1, 1),
                r(L, n, 0),
                r(R, n, 0),
                r(L, n + 1, 0),
                r(R, n + 1, 0),
            ],
        );

        for c in 1..=across {
            let kind = if c == 1 {
                EftKind::Inner1
            } else if c == across {
                EftKind::Inner2
            } else {
                EftKind::Regular
            };
            push(
                kind,
                [
                    r(L, n, c),
                    r(L, n, c + 1),
                    r(L, n + 1, c),
                    r(L, n + 1, c + 1),
                    r(R, n, c),
                    r(R, n, c + 1),
                    r(R, n + 1, c),
                    r(R, n + 1, c + 1),
                ],
            );
        }

        push(
            EftKind::Outer,
            [
                r(R, n, across + 1),
                r(L, n, across + 1),
                r(R, n + 1, across + 1),
                r(L, n + 1, across + 1),
                r(R, n, across + 2),
                r(L, n, across + 2),
                r(R, n + 1, across + 2),
                r(L, n + 1, across + 2),
            ],
        );
    }

    let (top_inner, top_outer) = (
        |side| apex(side, Pole::Top, Surface::Inner),
        |side| apex(side, Pole::Top, Surface::Outer),
    );
    let last = up - 1;
    push(
        EftKind::OuterApex0,
        [
            r(L, last, 1),
            r(R, last, 1),
            top_inner(L),
            top_inner(R),
            r(L, last, 0),
            r(R, last, 0),
            top_outer(L),
            top_outer(R),
        ],
    );
    push(
        EftKind::OuterApex2,
        [
            r(R, last, across + 1),
            r(L, last, across + 1),
            top_inner(R),
            top_inner(L),
            r(R, last, across + 2),
            r(L, last, across + 2),
            top_outer(R),
            top_outer(L),
        ],
    );

    plans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_mesh_has_only_pole_elements() {
        let plans = element_plans(&NodeLayout::new(2, 2));
        let kinds: Vec<EftKind> = plans.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EftKind::OuterApex1,
                EftKind::OuterApex0,
                EftKind::OuterApex0,
                EftKind::OuterApex2
            ]
        );
    }

    #[test]
    fn kinds_by_row() {
        let layout = NodeLayout::new(4, 3);
        let plans = element_plans(&layout);
        assert_eq!(plans.len(), layout.element_count());

        let row: Vec<EftKind> = plans[2..7].iter().map(|p| p.kind).collect();
        assert_eq!(
            row,
            vec![
                EftKind::Outer,
                EftKind::Inner1,
                EftKind::Regular,
                EftKind::Inner2,
                EftKind::Outer
            ]
        );
        for (i, plan) in plans.iter().enumerate() {
            assert_eq!(plan.id, i + 1);
        }
    }

    #[test]
    fn default_connectivity() {
        let plans = element_plans(&NodeLayout::new(4, 2));
        assert_eq!(plans.len(), 12);
        assert_eq!(plans[0].nodes, [2, 21, 4, 23, 1, 20, 3, 22]);
        assert_eq!(plans[1].nodes, [21, 2, 25, 6, 20, 1, 26, 7]);
        assert_eq!(plans[2].nodes, [4, 23, 9, 28, 3, 22, 8, 27]);
        assert_eq!(plans[3].nodes, [4, 5, 9, 10, 23, 24, 28, 29]);
        assert_eq!(plans[11].nodes, [35, 16, 37, 18, 36, 17, 38, 19]);
    }

    #[test]
    fn every_node_is_used() {
        for (up, across) in [(3, 2), (3, 4), (5, 3)] {
            let layout = NodeLayout::new(up, across);
            assert!(unused_nodes(&layout).is_empty(), "{} x {}", up, across);
        }
    }

    #[test]
    fn single_row_leaves_septum_nodes_unused() {
        // with no interior rows, row 1 septum columns 2..=across belong to no element
        for across in [2, 4] {
            let layout = &NodeLayout::new(2, across);
            let expected: Vec<usize> = [WallSide::Left, WallSide::Right]
                .into_iter()
                .flat_map(|side| (2..=across).map(move |c| layout.row_node(side, 1, c)))
                .collect();
            assert_eq!(unused_nodes(layout), expected);
        }
        assert_eq!(unused_nodes(&NodeLayout::new(2, 2)), vec![5, 14]);
    }

    fn unused_nodes(layout: &NodeLayout) -> Vec<usize> {
        let mut used = vec![false; layout.node_count() + 1];
        for plan in element_plans(layout) {
            for n in plan.nodes {
                used[n] = true;
            }
        }
        (1..used.len()).filter(|&n| !used[n]).collect()
    }
}
