use std::cell::RefCell;
use std::rc::Rc;

use connection_core::connection::ConnectionData;
use connection_core::dataset::{Dataset, DimensionHierarchy, DrillDownRequest, StaticDataset};
use connection_core::element::{DimensionSpec, Element, ElementError, ElementEvent, ElementSpec};
use connection_core::pool::{ConnectionPool, PoolConfig};
use connection_core::types::{Cut, CutValue};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn spec(field: &str) -> ElementSpec {
    ElementSpec::new("el-1")
        .with_visualisation("vis-9")
        .with_measure("count")
        .with_aggregation("sum")
        .with_dimension(DimensionSpec::new(field))
}

fn bound(dataset: Rc<StaticDataset>, spec: ElementSpec) -> (ConnectionPool, Element) {
    let shared: Rc<dyn Dataset> = dataset;
    let mut pool = ConnectionPool::new(shared, PoolConfig::v0());
    let element = Element::new(spec, &mut pool).unwrap();
    (pool, element)
}

fn load(element: &Element, labels: Vec<Value>, observations: Vec<Value>, total: f64) {
    element.dimensions()[0].complete_load(ConnectionData::new(labels));
    element.observation_connections()[0].complete_load(ConnectionData::new(observations).with_total(total));
}

fn record_events(element: &Element) -> Rc<RefCell<Vec<ElementEvent>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    element.subscribe(move |event| {
        if !matches!(event, ElementEvent::Ready { .. }) {
            sink.borrow_mut().push(event.clone());
        }
    });
    seen
}

#[test]
fn construction_requests_dimension_and_observations_per_spec() {
    let dataset = Rc::new(StaticDataset::new("ds"));
    let spec = spec("age").with_dimension(DimensionSpec::new("region").with_bucket(4));
    let (pool, element) = bound(dataset, spec);

    let keys: Vec<&str> = pool.fingerprints().map(|f| f.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "dimensions:age",
            "dimensions:region",
            "observations:age:count:sum",
            "observations:region:count:sum:4",
        ]
    );
    assert_eq!(element.dimensions().len(), 2);
    assert_eq!(element.observation_connections().len(), 2);
    assert_eq!(element.field_id(), "age");
}

#[test]
fn specs_without_field_ids_are_skipped() {
    let dataset = Rc::new(StaticDataset::new("ds"));
    let raw = r#"{
        "id": "el-2",
        "measure": {"id": "count"},
        "aggregation": "sum",
        "dimensions": [{"field": {}}, {"field": {"id": "age"}, "bucket": 10}]
    }"#;
    let spec = ElementSpec::from_json(raw).unwrap();
    let (_pool, element) = bound(dataset, spec);

    assert_eq!(element.dimensions().len(), 1);
    assert_eq!(
        element.observation_connections()[0].id().as_str(),
        "observations:age:count:sum:10"
    );
}

#[test]
fn flat_dimension_click_toggles_cut() {
    let dataset = Rc::new(StaticDataset::new("ds"));
    let (_pool, element) = bound(Rc::clone(&dataset), spec("region"));
    load(
        &element,
        vec![],
        vec![json!({"id": "north", "total": 4}), json!({"id": "south", "total": 6})],
        10.0,
    );
    let seen = record_events(&element);

    assert!(element.feature_click(1).unwrap());
    dataset.add_cut("region", "south");
    assert!(element.feature_click(1).unwrap());

    assert_eq!(
        *seen.borrow(),
        vec![
            ElementEvent::AddCut(Cut::single("region", "south")),
            ElementEvent::RemoveCut(vec!["region".to_string()]),
        ]
    );
}

#[test]
fn hierarchical_click_drills_down_on_parent_reference() {
    let dataset = Rc::new(StaticDataset::new("ds").with_hierarchy(
        "area",
        DimensionHierarchy {
            level_field: "level".into(),
        },
    ));
    let (_pool, element) = bound(Rc::clone(&dataset), spec("area"));
    load(
        &element,
        vec![],
        vec![
            json!({"id": "area-42", "level": 1, "total": 3}),
            json!({"id": "unknown", "level": 1, "total": 1}),
        ],
        4.0,
    );
    let seen = record_events(&element);

    assert!(element.feature_click(0).unwrap());
    assert!(element.feature_click(1).unwrap());

    assert_eq!(
        dataset.drill_downs(),
        vec![DrillDownRequest {
            dimension: "area".into(),
            level: json!(1),
            parent_id: "42".into(),
        }]
    );
    assert!(seen.borrow().is_empty(), "hierarchical clicks never cut");
}

#[test]
fn non_interactive_click_is_ignored() {
    let dataset = Rc::new(StaticDataset::new("ds"));
    let (_pool, element) = bound(dataset, spec("region").non_interactive());
    load(&element, vec![], vec![json!({"id": "north"})], 1.0);
    let seen = record_events(&element);

    assert!(!element.feature_click(0).unwrap());
    assert!(seen.borrow().is_empty());
}

#[test]
fn click_outside_observations_is_an_error() {
    let dataset = Rc::new(StaticDataset::new("ds"));
    let (_pool, element) = bound(dataset, spec("region"));

    match element.feature_click(3) {
        Err(ElementError::ObservationMissing(3)) => {}
        other => panic!("expected missing observation, got {other:?}"),
    }
}

#[test]
fn proxies_read_through_to_first_connections() {
    let dataset = Rc::new(StaticDataset::new("census"));
    let (_pool, element) = bound(dataset, spec("region"));
    load(
        &element,
        vec![json!({"id": "n", "label": "North"}), json!({"id": 7, "label": "Seven"})],
        vec![json!({"id": "n", "total": 4}), json!({"id": "7", "total": 6})],
        10.0,
    );

    assert_eq!(element.labels().len(), 2);
    assert_eq!(element.observations().len(), 2);
    assert_eq!(element.total(), Some(10.0));
    assert_eq!(element.observation(1), Some(json!({"id": "7", "total": 6})));
    assert_eq!(element.label(&json!({"id": "n"})), json!({"id": "n", "label": "North"}));
    assert_eq!(element.label(&json!({"id": "7"})), json!({"id": 7, "label": "Seven"}));
    assert_eq!(
        element.label(&json!({"id": "x", "total": 2})),
        json!({"id": "x", "total": 2, "label": ""})
    );
    assert_eq!(
        element.url().as_deref(),
        Some("/api/datasets/census/visualisations/vis-9/elements/el-1")
    );
}

#[test]
fn cut_queries_delegate_to_dataset() {
    let dataset = Rc::new(
        StaticDataset::new("ds").with_values("region", vec![json!("north"), json!("south")]),
    );
    let (_pool, element) = bound(Rc::clone(&dataset), spec("region"));

    assert!(!element.is_cut());
    assert_eq!(element.cut(), None);

    dataset.add_cut("region", "south");

    assert!(element.is_cut());
    assert_eq!(element.cut(), Some(CutValue::from("south")));
    assert!(element.has_cut_id(&json!("south")));
    assert!(!element.has_cut_id(&json!("north")));
    assert!(element.has_cut_value(1));
    assert!(!element.has_cut_value(0));
}

#[test]
fn measure_label_and_url_are_optional() {
    let dataset = Rc::new(StaticDataset::new("ds"));
    let raw = r#"{
        "id": "el-3",
        "measure": {"id": "count"},
        "measure_label": "People",
        "aggregation": "sum",
        "dimensions": [{"field": {"id": "age"}}]
    }"#;
    let (_pool, element) = bound(dataset, ElementSpec::from_json(raw).unwrap());

    assert_eq!(element.measure_label(), Some("People"));
    assert_eq!(element.url(), None);
    assert!(element.spec().interactive);
}
