//! Tricubic Hermite mesh of a spherical shell divided into two chambers by a septum.
//!
//! ```
//! use sphere_shell_septum::{generate_mesh, MemoryRegion, MeshOptions};
//!
//! let mut region = MemoryRegion::new();
//! let summary = generate_mesh(&mut region, &MeshOptions::default()).unwrap();
//!
//! assert_eq!(summary.node_count, 38);
//! assert_eq!(summary.element_count, 12);
//! ```

/// Mesh assembly: element connectivity and the generation driver
pub mod generator;
/// Geometry of the shell: node positions and derivatives
pub mod geometry;
/// 1D cubic Hermite basis and interpolation
pub mod hermite;
/// Node identifier layout
pub mod layout;
/// Host-facing mesh options
pub mod options;
/// The finite element region a mesh is built into
pub mod region;
/// Element field templates coupling element basis functions to nodal parameters
pub mod template;

pub use generator::{generate_mesh, GenerationError, MeshSummary, MeshType, SphereShellSeptum};
pub use options::{MeshOptions, OptionError, OptionValue};
pub use region::{memory::MemoryRegion, Region, RegionError, ValueLabel};
pub use template::EftKind;
