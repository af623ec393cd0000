//! Flat node addressing for the septum mesh.
//!
//! Each wall side owns a contiguous block of node identifiers:
//!
//! ```text
//!   side block (length = side_stride):
//!     [bottom outer apex, bottom inner apex,
//!      row 1:       columns 0 ..= across + 2,
//!      ...
//!      row up - 1:  columns 0 ..= across + 2,
//!      top inner apex, top outer apex]
//! ```
//!
//! Columns `0` and `across + 2` lie on the outer wall surface, columns `1` and
//! `across + 1` on the inner wall surface, and columns `2 ..= across` across the septum.
//! Identifiers start at 1 and the left side block precedes the right side block.

use std::fmt;

/// Which of the two walls joined by the septum a node belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WallSide {
    Left,
    Right,
}

impl WallSide {
    pub const BOTH: [WallSide; 2] = [WallSide::Left, WallSide::Right];

    /// Index into per-side arrays such as the wall thicknesses
    pub const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }

    /// -1 for the left side, +1 for the right side
    pub const fn sign(self) -> f64 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

/// The two poles of the sphere segment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pole {
    Bottom,
    Top,
}

/// Wall surface on which an apex node lies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Surface {
    Outer,
    Inner,
}

/// A node's place in the mesh topology, independent of its wall side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeSite {
    Apex(Pole, Surface),
    /// `row` in `1..up`, `column` in `0..=across + 2`
    Row { row: usize, column: usize },
}

impl fmt::Display for NodeSite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Apex(pole, surface) => write!(f, "{:?} {:?} apex", pole, surface),
            Self::Row { row, column } => write!(f, "row {} column {}", row, column),
        }
    }
}

/// Identifier arithmetic for a mesh with `up` elements up the sphere and `across`
/// elements across the septum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeLayout {
    pub up: usize,
    pub across: usize,
}

impl NodeLayout {
    pub const fn new(up: usize, across: usize) -> Self {
        Self { up, across }
    }

    /// Nodes in one row of one side
    pub const fn row_stride(&self) -> usize {
        self.across + 3
    }

    /// Nodes on one side (also the identifier offset between matching left and right nodes)
    pub const fn side_stride(&self) -> usize {
        (self.up - 1) * self.row_stride() + 4
    }

    pub const fn node_count(&self) -> usize {
        2 * self.side_stride()
    }

    /// 2 elements at each pole plus `across + 2` elements in each of the `up - 2` interior rows
    pub const fn element_count(&self) -> usize {
        4 + (self.up - 2) * (self.across + 2)
    }

    /// Map a node's side and site to its identifier.
    ///
    /// Panics if `site` lies outside this layout.
    pub fn node_id(&self, side: WallSide, site: NodeSite) -> usize {
        let base = side.index() * self.side_stride();
        let offset = match site {
            NodeSite::Apex(Pole::Bottom, Surface::Outer) => 1,
            NodeSite::Apex(Pole::Bottom, Surface::Inner) => 2,
            NodeSite::Apex(Pole::Top, Surface::Inner) => self.side_stride() - 1,
            NodeSite::Apex(Pole::Top, Surface::Outer) => self.side_stride(),
            NodeSite::Row { row, column } => {
                assert!(
                    row >= 1 && row < self.up,
                    "Row {} is outside [1, {}); cannot compute node identifier!",
                    row,
                    self.up
                );
                assert!(
                    column < self.row_stride(),
                    "Column {} is outside [0, {}); cannot compute node identifier!",
                    column,
                    self.row_stride()
                );
                3 + (row - 1) * self.row_stride() + column
            }
        };
        base + offset
    }

    /// Shorthand for a node in a regular row
    pub fn row_node(&self, side: WallSide, row: usize, column: usize) -> usize {
        self.node_id(side, NodeSite::Row { row, column })
    }

    /// All sites of one side in identifier order
    pub fn sites(&self) -> impl Iterator<Item = NodeSite> + '_ {
        let rows = (1..self.up).flat_map(move |row| {
            (0..self.row_stride()).map(move |column| NodeSite::Row { row, column })
        });

        [
            NodeSite::Apex(Pole::Bottom, Surface::Outer),
            NodeSite::Apex(Pole::Bottom, Surface::Inner),
        ]
        .into_iter()
        .chain(rows)
        .chain([
            NodeSite::Apex(Pole::Top, Surface::Inner),
            NodeSite::Apex(Pole::Top, Surface::Outer),
        ])
    }
}
