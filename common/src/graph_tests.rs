//! Unit tests for the declaration dependency graph.

use super::*;
use rstest::rstest;

fn ids<'a>(units: impl Iterator<Item = &'a Unit>) -> Vec<&'a str> {
    units.map(|unit| unit.id().as_str()).collect()
}

fn chain(builder: &mut GraphBuilder, names: &[&str]) -> Vec<UnitHandle> {
    names
        .iter()
        .map(|name| builder.add_unit(UnitSpec::new(*name)).expect("add unit"))
        .collect()
}

#[rstest]
fn empty_graph_builds() {
    let graph = GraphBuilder::new().build().expect("empty graph");
    assert!(graph.is_empty());
    assert_eq!(graph.len(), 0);
    assert_eq!(graph.materialisation_order().count(), 0);
}

#[rstest]
fn duplicate_unit_is_rejected() {
    let mut builder = GraphBuilder::new();
    builder.add_unit(UnitSpec::new("A")).expect("first");
    let err = builder.add_unit(UnitSpec::new("A")).expect_err("duplicate");
    assert_eq!(
        err,
        GraphError::DuplicateUnit {
            id: UnitId::new("A")
        }
    );
}

#[rstest]
fn unknown_output_is_rejected_at_the_handle() {
    let mut builder = GraphBuilder::new();
    let bucket = builder
        .add_unit(UnitSpec::new("Bucket").with_output("bucket"))
        .expect("bucket");
    let err = bucket.output("role").expect_err("no such output");
    assert!(matches!(err, GraphError::UnknownOutput { .. }));
    assert_eq!(err.to_string(), "unit Bucket has no output named role");
}

#[rstest]
fn handle_from_another_graph_is_unknown() {
    let mut other = GraphBuilder::new();
    let foreign = other.add_unit(UnitSpec::new("Foreign")).expect("foreign");

    let mut builder = GraphBuilder::new();
    let local = builder.add_unit(UnitSpec::new("Local")).expect("local");
    let err = builder.depends_on(&local, &foreign).expect_err("foreign handle");
    assert_eq!(
        err,
        GraphError::UnknownUnit {
            id: UnitId::new("Foreign")
        }
    );
}

#[rstest]
fn input_without_edge_is_an_undeclared_dependency() {
    let mut builder = GraphBuilder::new();
    let bucket = builder
        .add_unit(UnitSpec::new("Bucket").with_output("bucket"))
        .expect("bucket");
    builder
        .add_unit(UnitSpec::new("Upload").with_input(bucket.output("bucket").expect("output")))
        .expect("upload");

    let err = builder.build().expect_err("missing edge");
    match err {
        GraphError::UndeclaredDependency {
            dependent,
            prerequisite,
            input,
        } => {
            assert_eq!(dependent.as_str(), "Upload");
            assert_eq!(prerequisite.as_str(), "Bucket");
            assert_eq!(input.to_string(), "Bucket.bucket");
        }
        other => panic!("expected UndeclaredDependency, got {other:?}"),
    }
}

#[rstest]
fn three_unit_cycle_names_every_member() {
    let mut builder = GraphBuilder::new();
    let handles = chain(&mut builder, &["A", "B", "C"]);
    let [a, b, c] = handles.as_slice() else {
        panic!("expected three handles");
    };
    builder.depends_on(a, b).expect("A -> B");
    builder.depends_on(b, c).expect("B -> C");
    builder.depends_on(c, a).expect("C -> A");

    let cycle = match builder.build().expect_err("cycle") {
        GraphError::Cycle(cycle) => cycle,
        other => panic!("expected a cycle error, got {other:?}"),
    };
    let members: BTreeSet<&str> = cycle.members().iter().map(UnitId::as_str).collect();
    assert_eq!(members, BTreeSet::from(["A", "B", "C"]));
    assert_eq!(cycle.to_string(), "dependency cycle detected: A -> B -> C -> A");
}

#[rstest]
fn self_edge_is_a_one_member_cycle() {
    let mut builder = GraphBuilder::new();
    let a = builder.add_unit(UnitSpec::new("A")).expect("A");
    builder.depends_on(&a, &a).expect("self edge");

    let err = builder.build().expect_err("cycle");
    assert_eq!(
        err,
        GraphError::Cycle(CycleError {
            members: vec![UnitId::new("A")]
        })
    );
}

#[rstest]
fn cycle_report_excludes_units_leading_into_it() {
    let mut builder = GraphBuilder::new();
    let handles = chain(&mut builder, &["Entry", "X", "Y"]);
    let [entry, x, y] = handles.as_slice() else {
        panic!("expected three handles");
    };
    builder.depends_on(entry, x).expect("Entry -> X");
    builder.depends_on(x, y).expect("X -> Y");
    builder.depends_on(y, x).expect("Y -> X");

    let Err(GraphError::Cycle(cycle)) = builder.build() else {
        panic!("expected a cycle");
    };
    assert_eq!(cycle.members(), [UnitId::new("X"), UnitId::new("Y")]);
}

#[rstest]
fn order_places_prerequisites_first_and_keeps_declaration_order() {
    let mut builder = GraphBuilder::new();
    let handles = chain(&mut builder, &["Pipeline", "Bucket", "Setup", "Upload", "Web"]);
    let [pipeline, bucket, setup, upload, _web] = handles.as_slice() else {
        panic!("expected five handles");
    };
    builder.depends_on(pipeline, upload).expect("edge");
    builder.depends_on(pipeline, setup).expect("edge");
    builder.depends_on(upload, bucket).expect("edge");
    builder.depends_on(setup, bucket).expect("edge");

    let graph = builder.build().expect("acyclic");
    assert_eq!(
        ids(graph.materialisation_order()),
        ["Bucket", "Setup", "Upload", "Pipeline", "Web"]
    );
}

#[rstest]
fn duplicate_edges_are_recorded_once() {
    let mut builder = GraphBuilder::new();
    let handles = chain(&mut builder, &["A", "B"]);
    let [a, b] = handles.as_slice() else {
        panic!("expected two handles");
    };
    builder.depends_on(a, b).expect("edge");
    builder.depends_on(a, b).expect("repeat edge");

    let graph = builder.build().expect("acyclic");
    assert_eq!(graph.edges().count(), 1);
    let prerequisites: Vec<_> = graph.prerequisites(a.id()).collect();
    assert_eq!(prerequisites, [b.id()]);
    let dependents: Vec<_> = graph.dependents(b.id()).collect();
    assert_eq!(dependents, [a.id()]);
}

#[rstest]
fn lookups_for_unknown_ids_are_empty() {
    let graph = GraphBuilder::new().build().expect("empty");
    let missing = UnitId::new("Missing");
    assert!(graph.unit(&missing).is_none());
    assert_eq!(graph.prerequisites(&missing).count(), 0);
    assert_eq!(graph.dependents(&missing).count(), 0);
}
