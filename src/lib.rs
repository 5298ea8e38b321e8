//! Residual, Jacobian, and mass matrix assembly for systems of
//! geometrically exact beam elements.
//!
//! Physics lives behind the [`Kernels`] trait; this crate owns state
//! numbering, sparse storage, analysis-mode dispatch, and the boundary
//! overrides applied after the kernels run.

pub mod assembly;
pub mod body;
pub mod conditions;
pub mod context;
pub mod error;
pub mod indices;
pub mod jacobian;
pub mod kernels;
pub mod mass;
pub mod planar;
pub mod residual;
pub mod settings;
pub mod sparse;
pub mod system;

pub use assembly::{default_force_scaling, Assembly, Element, ElementProperties};
pub use conditions::{DistributedLoads, PointMass, PrescribedConditions};
pub use context::{
    AssemblyContext, BodyMotion, ContextBuilder, InitialConditions, NewmarkHistory, PointHistory,
};
pub use error::{AssemblyError, Result};
pub use indices::{system_indices, Formulation, SystemIndices};
pub use kernels::{Analysis, KernelArgs, Kernels, MassArgs};
pub use settings::AnalysisSettings;
pub use sparse::SparseJacobian;
pub use system::{DynamicSystem, ExpandedSystem, StaticSystem, System, SystemCore};
