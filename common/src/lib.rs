//! Shared declaration model for Stackyard: units, their outputs, and the
//! explicit dependency edges between them.

pub mod graph;

pub use graph::{
    CycleError, DependencyGraph, GraphBuilder, GraphError, OutputRef, Unit, UnitHandle, UnitId,
    UnitSpec,
};
