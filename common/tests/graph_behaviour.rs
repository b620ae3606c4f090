//! Behaviour-driven coverage for the declaration dependency graph.

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use stackyard_common::{DependencyGraph, GraphBuilder, GraphError, UnitHandle, UnitSpec};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
struct GraphWorld {
    builder: RefCell<GraphBuilder>,
    handles: RefCell<HashMap<String, UnitHandle>>,
    result: RefCell<Option<Result<DependencyGraph, GraphError>>>,
}

impl GraphWorld {
    fn add(&self, spec: UnitSpec, name: &str) {
        let handle = self
            .builder
            .borrow_mut()
            .add_unit(spec)
            .expect("unit declaration should succeed");
        self.handles.borrow_mut().insert(name.to_owned(), handle);
    }

    fn handle(&self, name: &str) -> UnitHandle {
        self.handles
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("unit {name} was not declared"))
    }
}

#[fixture]
fn world() -> GraphWorld {
    GraphWorld::default()
}

/// Splits a comma-separated list of unit names.
fn parse_names(names: &str) -> Vec<String> {
    names
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[given("a unit called {name} with no outputs")]
fn given_plain_unit(world: &GraphWorld, name: String) {
    world.add(UnitSpec::new(name.as_str()), &name);
}

#[given("a unit called {name} producing {output}")]
fn given_producing_unit(world: &GraphWorld, name: String, output: String) {
    world.add(UnitSpec::new(name.as_str()).with_output(output), &name);
}

#[given("a unit called {name} consuming {output} of {producer}")]
fn given_consuming_unit(world: &GraphWorld, name: String, output: String, producer: String) {
    let input = world
        .handle(&producer)
        .output(&output)
        .expect("producer declares output");
    world.add(UnitSpec::new(name.as_str()).with_input(input), &name);
}

#[given("{dependent} depends on {prerequisite}")]
fn given_edge(world: &GraphWorld, dependent: String, prerequisite: String) {
    let dependent = world.handle(&dependent);
    let prerequisite = world.handle(&prerequisite);
    world
        .builder
        .borrow_mut()
        .depends_on(&dependent, &prerequisite)
        .expect("edge between declared units");
}

#[when("the graph is built")]
fn when_built(world: &GraphWorld) {
    let builder = world.builder.take();
    world.result.replace(Some(builder.build()));
}

#[then("the materialisation order is {order}")]
fn then_order(world: &GraphWorld, order: String) {
    let result = world.result.borrow();
    let graph = match result.as_ref().expect("graph built") {
        Ok(graph) => graph,
        Err(err) => panic!("expected a valid graph, got {err}"),
    };
    let actual: Vec<String> = graph
        .materialisation_order()
        .map(|unit| unit.id().to_string())
        .collect();
    assert_eq!(actual, parse_names(&order));
}

#[then("the build fails with a cycle through {members}")]
fn then_cycle(world: &GraphWorld, members: String) {
    let result = world.result.borrow();
    match result.as_ref().expect("graph built") {
        Err(GraphError::Cycle(cycle)) => {
            let actual: BTreeSet<String> =
                cycle.members().iter().map(ToString::to_string).collect();
            let expected: BTreeSet<String> = parse_names(&members).into_iter().collect();
            assert_eq!(actual, expected);
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
}

#[then("the build fails because {dependent} does not declare a dependency on {prerequisite}")]
fn then_undeclared(world: &GraphWorld, dependent: String, prerequisite: String) {
    let result = world.result.borrow();
    match result.as_ref().expect("graph built") {
        Err(GraphError::UndeclaredDependency {
            dependent: actual_dependent,
            prerequisite: actual_prerequisite,
            ..
        }) => {
            assert_eq!(actual_dependent.as_str(), dependent);
            assert_eq!(actual_prerequisite.as_str(), prerequisite);
        }
        other => panic!("expected an undeclared dependency, got {other:?}"),
    }
}

#[scenario(
    path = "tests/features/dependency_graph.feature",
    name = "Prerequisites come first in the materialisation order"
)]
fn scenario_order(world: GraphWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/dependency_graph.feature",
    name = "A three-unit cycle is rejected"
)]
fn scenario_cycle(world: GraphWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/dependency_graph.feature",
    name = "Consuming an output without an edge is rejected"
)]
fn scenario_undeclared(world: GraphWorld) {
    let _ = world;
}
