//! Tests for declarations loading and request gating.

use std::io::Write;
use std::sync::Arc;

use facility_access::{AccessLevel, Caller, Role, RoleAssignment, TenantId};
use facility_gate::{
    DeclarationError, Declarations, EndpointRegistry, GateConfig, GateError, RequestGate,
};
use facility_grid::{FieldCatalogue, MAX_OFFSET, SqlParam};
use serde_json::{Value, json};
use tempfile::NamedTempFile;

// ============================================================================
// Helper Functions
// ============================================================================

fn declarations_json() -> Value {
    json!({
        "enum_sources": {
            "resident.status": [[0, "Active"], [1, "On leave"], [2, "Discharged"]]
        },
        "entities": {
            "resident": [
                {"name": "name", "type": "text", "sortable": true, "filterable": true, "storage_ref": "r.name"},
                {"name": "age", "type": "number", "sortable": true, "filterable": true, "storage_ref": "r.age"},
                {"name": "status", "type": "enum", "filterable": true, "storage_ref": "r.status",
                 "enum_source": "resident.status"}
            ],
            "invoice": [
                {"name": "total", "type": "number", "sortable": true, "filterable": true, "storage_ref": "i.total"},
                {"name": "issued", "type": "date", "sortable": true, "filterable": true, "storage_ref": "i.issued_on"}
            ]
        },
        "endpoints": {
            "residents": {
                "entity": "resident",
                "grant": {"capability": "resident", "level": "view"}
            },
            "invoices": {
                "entity": "invoice",
                "grant": {"capability": "billing", "level": "view"},
                "operation_grants": {"void": {"capability": "billing", "level": "delete"}},
                "operation_permissions": {"export": ["invoices.export"]}
            }
        },
        "roles": [
            {"name": "nurse", "grants": [{"capability": "resident", "level": "edit"}]},
            {"name": "billing-viewer", "grants": [{"capability": "billing", "level": "view"}]},
            {"name": "billing-editor", "grants": [{"capability": "billing", "level": "edit"}],
             "permissions": ["invoices.export"]}
        ],
        "assignments": [
            {"user": "u-nurse", "role": "nurse", "tenant": "north"},
            {"user": "u-billing", "role": "billing-viewer"},
            {"user": "u-billing", "role": "billing-editor"}
        ]
    })
}

fn write_declarations(value: &Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    write!(file, "{}", value).expect("write declarations");
    file
}

fn load_gate() -> (RequestGate, Declarations) {
    let file = write_declarations(&declarations_json());
    let declarations = Declarations::load(file.path()).expect("declarations load");
    let registry = EndpointRegistry::build(&declarations).expect("registry builds");
    (RequestGate::new(Arc::new(registry)), declarations)
}

fn caller(roles: Vec<Role>) -> Caller {
    roles.into_iter().fold(Caller::new("u-test"), |caller, role| {
        caller.with_assignment(RoleAssignment::global(role))
    })
}

// ============================================================================
// Declarations loading
// ============================================================================

#[test]
fn test_load_from_file() {
    let (gate, _) = load_gate();
    assert_eq!(gate.registry().len(), 2);
    assert!(gate.registry().catalogue("invoice").is_some());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Declarations::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, DeclarationError::Io { .. }));
}

#[test]
fn test_bad_storage_ref_fails_startup() {
    let mut value = declarations_json();
    value["entities"]["resident"][0]["storage_ref"] = json!("r.name; DROP TABLE r");
    let file = write_declarations(&value);

    let declarations = Declarations::load(file.path()).unwrap();
    let err = EndpointRegistry::build(&declarations).unwrap_err();
    assert!(matches!(err, DeclarationError::Catalogue { ref entity, .. } if entity == "resident"));
}

#[test]
fn test_unknown_enum_source_fails_startup() {
    let mut value = declarations_json();
    value["entities"]["resident"][2]["enum_source"] = json!("resident.mood");
    let declarations = Declarations::from_json(&value.to_string()).unwrap();

    assert!(matches!(
        EndpointRegistry::build(&declarations),
        Err(DeclarationError::Catalogue { .. })
    ));
}

// ============================================================================
// Authorization before compilation
// ============================================================================

#[test]
fn test_allowed_request_compiles() {
    let (gate, _) = load_gate();
    let nurse = caller(vec![Role::new("nurse").with_grant("resident", AccessLevel::Edit)]);

    let plan = gate
        .handle(
            "residents",
            "list",
            &nurse,
            &json!({"filter": {"name": {"c": 1, "v": ["jo"]}}, "sort": {"name": "asc"}}),
        )
        .unwrap();

    assert_eq!(plan.where_clause().unwrap(), "(r.name LIKE :p1_like)");
    assert_eq!(
        plan.predicates[0].param("p1_like"),
        Some(&SqlParam::String("%jo%".to_string()))
    );
    assert_eq!(plan.order_by_clause().unwrap(), "r.name ASC");
}

/// A denied caller gets Forbidden even when the parameters are malformed.
#[test]
fn test_denial_precedes_parameter_validation() {
    let (gate, _) = load_gate();
    let outsider = caller(vec![Role::new("kitchen").with_grant("menu", AccessLevel::Delete)]);

    let err = gate
        .handle("residents", "list", &outsider, &json!({"filter": "garbage"}))
        .unwrap_err();
    assert_eq!(err, GateError::Forbidden);
}

#[test]
fn test_malformed_params_for_authorized_caller() {
    let (gate, _) = load_gate();
    let nurse = caller(vec![Role::new("nurse").with_grant("resident", AccessLevel::View)]);

    let err = gate
        .handle("residents", "list", &nurse, &json!({"filter": {"name": {"c": 0, "v": "x"}}}))
        .unwrap_err();
    assert!(matches!(err, GateError::InvalidRequest(_)));
    assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
}

#[test]
fn test_operation_rule_raises_requirement() {
    let (gate, _) = load_gate();
    let editor = caller(vec![Role::new("editor").with_grant("billing", AccessLevel::Edit)]);

    assert!(gate.handle("invoices", "list", &editor, &json!({})).is_ok());
    assert_eq!(
        gate.handle("invoices", "void", &editor, &json!({})),
        Err(GateError::Forbidden)
    );
}

#[test]
fn test_permission_check_runs_after_grant_check() {
    let (gate, _) = load_gate();
    let viewer = caller(vec![Role::new("viewer").with_grant("billing", AccessLevel::View)]);
    let exporter = caller(vec![
        Role::new("exporter")
            .with_grant("billing", AccessLevel::View)
            .with_permission("invoices.export"),
    ]);

    assert_eq!(
        gate.handle("invoices", "export", &viewer, &json!({})),
        Err(GateError::Forbidden)
    );
    assert!(gate.handle("invoices", "export", &exporter, &json!({})).is_ok());
}

#[test]
fn test_config_cap_and_default() {
    let (_, declarations) = load_gate();
    let config = GateConfig {
        default_per_page: 25,
        max_per_page: Some(40),
        ..GateConfig::default()
    };
    let gate = RequestGate::from_config(
        Arc::new(EndpointRegistry::build(&declarations).unwrap()),
        &config,
    );
    let nurse = caller(vec![Role::new("nurse").with_grant("resident", AccessLevel::View)]);

    let plan = gate.handle("residents", "list", &nurse, &json!({"page": 2})).unwrap();
    assert_eq!((plan.offset, plan.limit), (25, 25));

    let plan = gate
        .handle("residents", "list", &nurse, &json!({"page": 2, "per_page": 1000}))
        .unwrap();
    assert_eq!((plan.offset, plan.limit), (40, 40));
}

#[test]
fn test_capped_huge_page_stays_on_requested_page() {
    let (gate, _) = load_gate();
    let gate = gate.with_max_per_page(Some(50));
    let nurse = caller(vec![Role::new("nurse").with_grant("resident", AccessLevel::View)]);

    let plan = gate
        .handle("residents", "list", &nurse, &json!({"page": i64::MAX, "per_page": 500}))
        .unwrap();

    assert_eq!(plan.page, i64::MAX as u64);
    assert_eq!(plan.limit, 50);
    assert_eq!(plan.offset, MAX_OFFSET);
}

// ============================================================================
// Concurrent readers
// ============================================================================

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_shared_state_is_send_and_sync() {
    assert_send_sync::<FieldCatalogue>();
    assert_send_sync::<EndpointRegistry>();
    assert_send_sync::<RequestGate>();
}

/// One gate serves many threads and every thread sees the same plan.
#[test]
fn test_gate_shared_across_threads() {
    let (gate, _) = load_gate();
    let gate = Arc::new(gate);
    let params = json!({"filter": {"age": {"c": 4, "v": [80]}}, "sort": {"name": "asc"}});
    let nurse = caller(vec![Role::new("nurse").with_grant("resident", AccessLevel::View)]);
    let expected = gate.handle("residents", "list", &nurse, &params).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let gate = Arc::clone(&gate);
            let nurse = nurse.clone();
            let params = params.clone();
            std::thread::spawn(move || gate.handle("residents", "list", &nurse, &params))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), expected);
    }
}

// ============================================================================
// Role store
// ============================================================================

#[tokio::test]
async fn test_handle_for_user_aggregates_roles() {
    let (gate, declarations) = load_gate();
    let store = declarations.role_store().unwrap();

    let plan = gate
        .handle_for_user(
            &store,
            "u-billing",
            None,
            "invoices",
            "export",
            &json!({"filter": {"total": {"c": 5, "v": [100, 500]}}}),
        )
        .await
        .unwrap();
    assert_eq!(
        plan.where_clause().unwrap(),
        "((i.total >= :p1_from AND i.total <= :p2_to))"
    );
}

#[tokio::test]
async fn test_handle_for_user_respects_tenant() {
    let (gate, declarations) = load_gate();
    let store = declarations.role_store().unwrap();

    let north = gate
        .handle_for_user(&store, "u-nurse", Some(TenantId::new("north")), "residents", "list", &json!({}))
        .await;
    assert!(north.is_ok());

    let south = gate
        .handle_for_user(&store, "u-nurse", Some(TenantId::new("south")), "residents", "list", &json!({}))
        .await;
    assert_eq!(south, Err(GateError::Forbidden));

    let unknown = gate
        .handle_for_user(&store, "u-nobody", None, "residents", "list", &json!({}))
        .await;
    assert_eq!(unknown, Err(GateError::Forbidden));
}
