use std::sync::Arc;

use multi_model_core::contract::{DataSource, Filterer, MockTransformer};
use multi_model_core::memory::{FieldFilter, FieldSelector, MemorySource};
use multi_model_core::view::{MultipleModelView, Response};
use multi_model_core::{AggregateError, AggregationConfig, SourceSpec};
use serde_json::json;

fn library() -> Vec<SourceSpec> {
    let plays: Arc<dyn DataSource> = Arc::new(
        MemorySource::from_json(
            "Play",
            json!([
                {"title": "Hamlet", "rank": 2, "published": true},
                {"title": "Cardenio", "rank": 9, "published": false},
            ]),
        )
        .unwrap(),
    );
    let poems: Arc<dyn DataSource> = Arc::new(
        MemorySource::from_json(
            "Poem",
            json!([{"title": "Sonnet 18", "rank": 1, "published": true}]),
        )
        .unwrap(),
    );
    vec![
        SourceSpec::new(plays, Arc::new(FieldSelector::new(["title", "rank"]))),
        SourceSpec::with_options(poems, Arc::new(FieldSelector::new(["title", "rank"])), "verse"),
    ]
}

/// A view whose settings are fixed at construction.
struct LibraryView {
    specs: Option<Vec<SourceSpec>>,
    config: AggregationConfig,
    default_filter: Option<Arc<dyn Filterer>>,
}

impl LibraryView {
    fn new() -> Self {
        Self {
            specs: Some(library()),
            config: AggregationConfig::default(),
            default_filter: None,
        }
    }
}

impl MultipleModelView for LibraryView {
    fn query_list(&self) -> Option<Vec<SourceSpec>> {
        self.specs.clone()
    }

    fn aggregation_config(&self) -> AggregationConfig {
        self.config.clone()
    }

    fn default_filter(&self) -> Option<Arc<dyn Filterer>> {
        self.default_filter.clone()
    }

    fn view_name(&self) -> &str {
        "LibraryView"
    }
}

#[test]
fn test_respond_returns_grouped_body_with_status_200() {
    let response = LibraryView::new().respond();

    assert_eq!(
        response,
        Response {
            status: 200,
            body: json!([
                {"play": [{"title": "Hamlet", "rank": 2}, {"title": "Cardenio", "rank": 9}]},
                {"verse": [{"title": "Sonnet 18", "rank": 1}]},
            ]),
        }
    );
    assert!(response.is_success());
}

#[test]
fn test_respond_flattens_sorts_and_applies_default_filter() {
    let mut view = LibraryView::new();
    view.config = AggregationConfig {
        flatten: true,
        sort_key: Some("rank".into()),
        include_type_label: true,
    };
    view.default_filter = Some(Arc::new(FieldFilter::equals("published", json!(true))));

    let response = view.respond();

    assert_eq!(response.status, 200);
    assert_eq!(
        response.body,
        json!([
            {"title": "Sonnet 18", "rank": 1, "type": "verse"},
            {"title": "Hamlet", "rank": 2, "type": "play"},
        ])
    );
}

#[test]
fn test_missing_query_list_names_the_view() {
    let view = LibraryView {
        specs: None,
        ..LibraryView::new()
    };

    let err = view.get_query_list().unwrap_err();
    assert!(matches!(err, AggregateError::Configuration(_)));
    assert!(err.to_string().contains("LibraryView"), "{err}");

    let response = view.respond();
    assert_eq!(response.status, 500);
    assert!(!response.is_success());
    let detail = response.body["detail"].as_str().expect("detail message");
    assert!(detail.contains("LibraryView"), "{detail}");
}

#[test]
fn test_sort_failure_maps_to_error_response() {
    let mut view = LibraryView::new();
    view.config = AggregationConfig {
        flatten: true,
        sort_key: Some("published".into()),
        include_type_label: true,
    };

    // Projection drops `published`, so the first record lacks the sort field.
    let response = view.respond();
    assert_eq!(response.status, 500);
    assert!(response.body["detail"]
        .as_str()
        .unwrap()
        .contains("published"));
}

#[test]
fn test_collaborator_failure_maps_to_error_response() {
    let mut broken = MockTransformer::new();
    broken
        .expect_transform()
        .returning(|_| Err("database unavailable".into()));

    let plays: Arc<dyn DataSource> = Arc::new(MemorySource::new("Play", Vec::new()));
    let view = LibraryView {
        specs: Some(vec![SourceSpec::new(plays, Arc::new(broken))]),
        ..LibraryView::new()
    };

    let response = view.respond();
    assert_eq!(
        response,
        Response {
            status: 500,
            body: json!({"detail": "database unavailable"}),
        }
    );
}

struct DefaultsView;

impl MultipleModelView for DefaultsView {
    fn query_list(&self) -> Option<Vec<SourceSpec>> {
        Some(Vec::new())
    }
}

#[test]
fn test_default_settings_serve_an_empty_list() {
    let view = DefaultsView;
    assert_eq!(view.view_name(), "MultipleModelView");
    assert_eq!(view.aggregation_config(), AggregationConfig::default());
    assert!(view.default_filter().is_none());
    assert_eq!(view.respond(), Response::ok(json!([])));
}
