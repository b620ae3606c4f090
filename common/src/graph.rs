//! Declaration dependency graph for independently deployable units.
//!
//! Each unit is declared in full (identifier, outputs, consumed inputs)
//! before it is added to a [`GraphBuilder`]. Adding a unit returns a
//! [`UnitHandle`]; dependents obtain [`OutputRef`]s from that handle and
//! must also declare an explicit edge with [`GraphBuilder::depends_on`].
//! Edges are never inferred from data flow, so consuming an output without
//! declaring the edge is rejected when the graph is built.
//!
//! [`GraphBuilder::build`] validates the declaration and returns an
//! immutable [`DependencyGraph`]. A cycle is reported as a [`CycleError`]
//! naming the units on it, before any consumer sees the graph. The graph
//! holds no scheduling logic; [`DependencyGraph::materialisation_order`] is
//! a constraint an external provisioning engine may follow, not a runner.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;

/// Identifier of a declared unit.
///
/// # Examples
///
/// ```
/// use stackyard_common::UnitId;
///
/// let id = UnitId::new("DataBucketStack");
/// assert_eq!(id.as_str(), "DataBucketStack");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    /// Creates an identifier from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A typed reference to one output of one unit.
///
/// Only [`UnitHandle::output`] creates these, so a reference always names
/// an output its producer declared.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct OutputRef {
    unit: UnitId,
    output: String,
}

impl OutputRef {
    /// The producing unit.
    #[must_use]
    pub const fn unit(&self) -> &UnitId {
        &self.unit
    }

    /// The output name on the producing unit.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.unit, self.output)
    }
}

/// Full declaration of a unit, assembled before it joins a graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitSpec {
    id: UnitId,
    outputs: BTreeSet<String>,
    inputs: Vec<OutputRef>,
}

impl UnitSpec {
    /// Starts a declaration with no outputs and no inputs.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: UnitId::new(id),
            outputs: BTreeSet::new(),
            inputs: Vec::new(),
        }
    }

    /// Declares an output this unit produces.
    #[must_use]
    pub fn with_output(mut self, name: impl Into<String>) -> Self {
        self.outputs.insert(name.into());
        self
    }

    /// Declares an output of another unit that this unit consumes.
    #[must_use]
    pub fn with_input(mut self, input: OutputRef) -> Self {
        if !self.inputs.contains(&input) {
            self.inputs.push(input);
        }
        self
    }
}

/// A unit as recorded in the graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unit {
    id: UnitId,
    outputs: BTreeSet<String>,
    inputs: Vec<OutputRef>,
}

impl Unit {
    /// The unit identifier.
    #[must_use]
    pub const fn id(&self) -> &UnitId {
        &self.id
    }

    /// Names of the outputs this unit produces.
    #[must_use]
    pub const fn outputs(&self) -> &BTreeSet<String> {
        &self.outputs
    }

    /// Outputs of other units this unit consumes, in declaration order.
    #[must_use]
    pub fn inputs(&self) -> &[OutputRef] {
        &self.inputs
    }
}

/// Returned by [`GraphBuilder::add_unit`]; the only way to reference a
/// unit's outputs or declare edges to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitHandle {
    id: UnitId,
    outputs: BTreeSet<String>,
}

impl UnitHandle {
    /// The identifier of the referenced unit.
    #[must_use]
    pub const fn id(&self) -> &UnitId {
        &self.id
    }

    /// References the named output of this unit.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownOutput`] if the unit declared no output
    /// called `name`.
    pub fn output(&self, name: &str) -> Result<OutputRef, GraphError> {
        if !self.outputs.contains(name) {
            return Err(GraphError::UnknownOutput {
                unit: self.id.clone(),
                output: name.to_owned(),
            });
        }
        Ok(OutputRef {
            unit: self.id.clone(),
            output: name.to_owned(),
        })
    }
}

/// A dependency cycle, listed in edge order.
///
/// Each member depends on the next; the last depends on the first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleError {
    members: Vec<UnitId>,
}

impl CycleError {
    /// Units on the cycle, in edge order.
    #[must_use]
    pub fn members(&self) -> &[UnitId] {
        &self.members
    }
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dependency cycle detected: ")?;
        for member in &self.members {
            write!(f, "{member} -> ")?;
        }
        self.members
            .first()
            .map_or(Ok(()), |first| write!(f, "{first}"))
    }
}

impl std::error::Error for CycleError {}

/// Errors raised while declaring or validating a graph.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Two units share an identifier.
    #[error("unit {id} is declared more than once")]
    DuplicateUnit {
        /// The repeated identifier.
        id: UnitId,
    },

    /// A handle or input refers to a unit this graph does not contain.
    #[error("unknown unit {id}")]
    UnknownUnit {
        /// The missing identifier.
        id: UnitId,
    },

    /// An output name the producing unit did not declare.
    #[error("unit {unit} has no output named {output}")]
    UnknownOutput {
        /// The producing unit.
        unit: UnitId,
        /// The requested output name.
        output: String,
    },

    /// A unit consumes an output without an explicit edge to its producer.
    #[error("unit {dependent} consumes {input} without declaring a dependency on {prerequisite}")]
    UndeclaredDependency {
        /// The consuming unit.
        dependent: UnitId,
        /// The producer it failed to depend on.
        prerequisite: UnitId,
        /// The consumed output.
        input: OutputRef,
    },

    /// The edges form a cycle.
    #[error(transparent)]
    Cycle(#[from] CycleError),
}

/// Collects unit declarations and explicit edges.
///
/// # Examples
///
/// ```
/// use stackyard_common::{GraphBuilder, UnitSpec};
///
/// let mut builder = GraphBuilder::new();
/// let bucket = builder.add_unit(UnitSpec::new("Bucket").with_output("bucket"))?;
/// let upload = builder.add_unit(UnitSpec::new("Upload").with_input(bucket.output("bucket")?))?;
/// builder.depends_on(&upload, &bucket)?;
///
/// let graph = builder.build()?;
/// let order: Vec<_> = graph.materialisation_order().map(|unit| unit.id().as_str()).collect();
/// assert_eq!(order, ["Bucket", "Upload"]);
/// # Ok::<(), stackyard_common::GraphError>(())
/// ```
#[derive(Debug, Default)]
pub struct GraphBuilder {
    units: Vec<Unit>,
    index: HashMap<UnitId, usize>,
    prerequisites: Vec<Vec<usize>>,
}

impl GraphBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fully declared unit and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateUnit`] if the identifier is taken, or
    /// [`GraphError::UnknownUnit`] / [`GraphError::UnknownOutput`] if an
    /// input refers to something not yet declared.
    pub fn add_unit(&mut self, spec: UnitSpec) -> Result<UnitHandle, GraphError> {
        if self.index.contains_key(&spec.id) {
            return Err(GraphError::DuplicateUnit { id: spec.id });
        }
        for input in &spec.inputs {
            let producer = self.unit_by_id(&input.unit)?;
            if !producer.outputs.contains(&input.output) {
                return Err(GraphError::UnknownOutput {
                    unit: input.unit.clone(),
                    output: input.output.clone(),
                });
            }
        }

        log::debug!("declared unit {}", spec.id);
        let handle = UnitHandle {
            id: spec.id.clone(),
            outputs: spec.outputs.clone(),
        };
        self.index.insert(spec.id.clone(), self.units.len());
        self.units.push(Unit {
            id: spec.id,
            outputs: spec.outputs,
            inputs: spec.inputs,
        });
        self.prerequisites.push(Vec::new());
        Ok(handle)
    }

    /// Records that `dependent` must be materialised after `prerequisite`.
    ///
    /// Repeating an edge has no further effect.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownUnit`] if either handle belongs to
    /// another graph.
    pub fn depends_on(
        &mut self,
        dependent: &UnitHandle,
        prerequisite: &UnitHandle,
    ) -> Result<(), GraphError> {
        let from = self.position(&dependent.id)?;
        let to = self.position(&prerequisite.id)?;
        let edges = self
            .prerequisites
            .get_mut(from)
            .ok_or_else(|| GraphError::UnknownUnit {
                id: dependent.id.clone(),
            })?;
        if !edges.contains(&to) {
            log::debug!("edge {} -> {}", dependent.id, prerequisite.id);
            edges.push(to);
        }
        Ok(())
    }

    /// Validates the declaration and freezes it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UndeclaredDependency`] if a unit consumes an
    /// output of a unit it does not depend on, or [`GraphError::Cycle`] if
    /// the edges are cyclic.
    pub fn build(self) -> Result<DependencyGraph, GraphError> {
        self.check_declared_dependencies()?;
        if let Some(cycle) = find_cycle(&self.prerequisites) {
            let members = cycle
                .into_iter()
                .filter_map(|idx| self.units.get(idx).map(|unit| unit.id.clone()))
                .collect();
            return Err(CycleError { members }.into());
        }
        let order = topological_order(&self.prerequisites);
        Ok(DependencyGraph {
            units: self.units,
            index: self.index,
            prerequisites: self.prerequisites,
            order,
        })
    }

    fn check_declared_dependencies(&self) -> Result<(), GraphError> {
        for (unit, edges) in self.units.iter().zip(&self.prerequisites) {
            for input in &unit.inputs {
                let producer = self.position(&input.unit)?;
                if !edges.contains(&producer) {
                    return Err(GraphError::UndeclaredDependency {
                        dependent: unit.id.clone(),
                        prerequisite: input.unit.clone(),
                        input: input.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn position(&self, id: &UnitId) -> Result<usize, GraphError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownUnit { id: id.clone() })
    }

    fn unit_by_id(&self, id: &UnitId) -> Result<&Unit, GraphError> {
        let idx = self.position(id)?;
        self.units
            .get(idx)
            .ok_or_else(|| GraphError::UnknownUnit { id: id.clone() })
    }
}

/// A validated, acyclic, read-only declaration graph.
#[derive(Debug)]
pub struct DependencyGraph {
    units: Vec<Unit>,
    index: HashMap<UnitId, usize>,
    prerequisites: Vec<Vec<usize>>,
    order: Vec<usize>,
}

impl DependencyGraph {
    /// Number of units in the graph.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns true when no units were declared.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units in declaration order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    /// Looks up a unit by identifier.
    #[must_use]
    pub fn unit(&self, id: &UnitId) -> Option<&Unit> {
        self.index.get(id).and_then(|&idx| self.units.get(idx))
    }

    /// Units `id` explicitly depends on, in the order the edges were added.
    pub fn prerequisites(&self, id: &UnitId) -> impl Iterator<Item = &UnitId> {
        self.index
            .get(id)
            .and_then(|&idx| self.prerequisites.get(idx))
            .into_iter()
            .flatten()
            .filter_map(|&idx| self.units.get(idx).map(Unit::id))
    }

    /// Units that explicitly depend on `id`, in declaration order.
    pub fn dependents<'a>(&'a self, id: &UnitId) -> impl Iterator<Item = &'a UnitId> {
        let target = self.index.get(id).copied();
        self.units
            .iter()
            .zip(&self.prerequisites)
            .filter(move |(_, edges)| target.is_some_and(|t| edges.contains(&t)))
            .map(|(unit, _)| unit.id())
    }

    /// All edges as `(dependent, prerequisite)` pairs.
    pub fn edges(&self) -> impl Iterator<Item = (&UnitId, &UnitId)> {
        self.units
            .iter()
            .zip(&self.prerequisites)
            .flat_map(move |(unit, edges)| {
                edges
                    .iter()
                    .filter_map(move |&idx| self.units.get(idx).map(|p| (unit.id(), p.id())))
            })
    }

    /// Units ordered so that every prerequisite precedes its dependents.
    ///
    /// Among units whose prerequisites are all placed, the one declared
    /// first comes first, so the order is stable across runs.
    pub fn materialisation_order(&self) -> impl Iterator<Item = &Unit> {
        self.order.iter().filter_map(|&idx| self.units.get(idx))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    InProgress,
    Done,
}

/// Depth-first search for a cycle, returning its members in edge order.
fn find_cycle(prerequisites: &[Vec<usize>]) -> Option<Vec<usize>> {
    let mut state = vec![Visit::Unvisited; prerequisites.len()];
    let mut path = Vec::new();
    (0..prerequisites.len())
        .find_map(|start| visit(start, prerequisites, &mut state, &mut path))
}

fn visit(
    node: usize,
    prerequisites: &[Vec<usize>],
    state: &mut [Visit],
    path: &mut Vec<usize>,
) -> Option<Vec<usize>> {
    match state.get(node).copied() {
        Some(Visit::Done) | None => return None,
        Some(Visit::InProgress) => {
            let start = path.iter().position(|&n| n == node)?;
            return path.get(start..).map(<[usize]>::to_vec);
        }
        Some(Visit::Unvisited) => {}
    }
    set_state(state, node, Visit::InProgress);
    path.push(node);
    for &next in prerequisites.get(node).into_iter().flatten() {
        if let Some(cycle) = visit(next, prerequisites, state, path) {
            return Some(cycle);
        }
    }
    path.pop();
    set_state(state, node, Visit::Done);
    None
}

fn set_state(state: &mut [Visit], node: usize, value: Visit) {
    if let Some(slot) = state.get_mut(node) {
        *slot = value;
    }
}

/// Kahn's algorithm, always releasing the earliest-declared ready unit.
fn topological_order(prerequisites: &[Vec<usize>]) -> Vec<usize> {
    let mut remaining: Vec<usize> = prerequisites.iter().map(Vec::len).collect();
    let mut ready: BTreeSet<usize> = remaining
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count == 0)
        .map(|(idx, _)| idx)
        .collect();
    let mut order = Vec::with_capacity(prerequisites.len());

    while let Some(next) = ready.pop_first() {
        order.push(next);
        for (dependent, edges) in prerequisites.iter().enumerate() {
            if !edges.contains(&next) {
                continue;
            }
            if let Some(count) = remaining.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    ready.insert(dependent);
                }
            }
        }
    }
    order
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
