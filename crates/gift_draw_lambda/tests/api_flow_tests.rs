use gift_draw_lambda::handlers::api::{handle_api_event, ApiGatewayResponse, HandlerConfig};
use gift_draw_lambda::runtime::contract::{
    CreateDrawResponse, ErrorResponse, ReasonCode, RevealEntryResponse, ViewEntryResponse,
};
use gift_draw_lambda::runtime::orchestrator::DrawSettings;
use gift_draw_lambda::runtime::store::MemoryEntryStore;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};

fn config() -> HandlerConfig {
    HandlerConfig {
        draw: DrawSettings {
            entry_path_prefix: "/entries/".to_string(),
            ..DrawSettings::default()
        },
        event_time: "2026-12-01T10:00:00+00:00".to_string(),
    }
}

fn create_event(body: Value) -> Value {
    json!({
        "httpMethod": "POST",
        "path": "/draws",
        "isBase64Encoded": false,
        "body": body.to_string(),
    })
}

fn view_event(entry_id: &str) -> Value {
    json!({
        "httpMethod": "GET",
        "path": format!("/entries/{entry_id}"),
        "pathParameters": {"entryId": entry_id},
        "body": null,
    })
}

fn reveal_event(entry_id: &str) -> Value {
    json!({
        "httpMethod": "POST",
        "path": format!("/entries/{entry_id}/reveal"),
        "pathParameters": {"entryId": entry_id},
        "body": null,
    })
}

fn entry_id(path: &str) -> &str {
    path.strip_prefix("/entries/")
        .expect("handle should use the configured prefix")
}

fn reason_of(response: &ApiGatewayResponse) -> ReasonCode {
    serde_json::from_str::<ErrorResponse>(&response.body)
        .expect("error body should parse")
        .reason
}

fn create_draw(store: &MemoryEntryStore, body: Value, seed: u64) -> ApiGatewayResponse {
    handle_api_event(
        create_event(body),
        &config(),
        store,
        &mut StdRng::seed_from_u64(seed),
    )
}

#[test]
fn three_participants_create_view_and_reveal_once() {
    let store = MemoryEntryStore::new();
    let response = create_draw(&store, json!({"names": ["A", "B", "C"]}), 17);
    assert_eq!(response.status_code, 200);

    let created: CreateDrawResponse =
        serde_json::from_str(&response.body).expect("create body should parse");
    assert_eq!(created.entries.len(), 3);

    let mut rng = StdRng::seed_from_u64(0);
    let mut drawn_names = Vec::new();
    for handle in &created.entries {
        let id = entry_id(&handle.path);

        let view = handle_api_event(view_event(id), &config(), &store, &mut rng);
        assert_eq!(view.status_code, 200);
        let view: ViewEntryResponse =
            serde_json::from_str(&view.body).expect("view body should parse");
        assert_eq!(view.viewer, handle.name);
        assert!(!view.seen);

        let reveal = handle_api_event(reveal_event(id), &config(), &store, &mut rng);
        assert_eq!(reveal.status_code, 200);
        let reveal: RevealEntryResponse =
            serde_json::from_str(&reveal.body).expect("reveal body should parse");
        assert_ne!(reveal.drawn_name, handle.name);
        assert!(["A", "B", "C"].contains(&reveal.drawn_name.as_str()));
        drawn_names.push(reveal.drawn_name);

        let again = handle_api_event(reveal_event(id), &config(), &store, &mut rng);
        assert_eq!(again.status_code, 400);
        assert_eq!(reason_of(&again), ReasonCode::AlreadyDrawn);

        let seen = handle_api_event(view_event(id), &config(), &store, &mut rng);
        let seen: ViewEntryResponse =
            serde_json::from_str(&seen.body).expect("view body should parse");
        assert!(seen.seen);
    }

    drawn_names.sort();
    assert_eq!(drawn_names, vec!["A", "B", "C"]);
}

#[test]
fn single_group_draw_is_too_many_attempts() {
    let store = MemoryEntryStore::new();
    let response = create_draw(
        &store,
        json!({"names": ["A", "B"], "groups": ["x", "x"]}),
        3,
    );

    assert_eq!(response.status_code, 422);
    assert_eq!(reason_of(&response), ReasonCode::TooManyAttempts);
    assert!(store.is_empty());
}

#[test]
fn numeric_group_labels_keep_groups_apart() {
    let store = MemoryEntryStore::new();
    let response = create_draw(
        &store,
        json!({"names": ["A", "B", "C", "D"], "groups": [1, 1, 2, 2]}),
        11,
    );
    assert_eq!(response.status_code, 200);

    let created: CreateDrawResponse =
        serde_json::from_str(&response.body).expect("create body should parse");
    let group_of = |name: &str| if name == "A" || name == "B" { 1 } else { 2 };
    for handle in &created.entries {
        let entry = store
            .entry(entry_id(&handle.path))
            .expect("entry should exist");
        assert_ne!(
            group_of(&entry.intended_viewer),
            group_of(&entry.drawn_name)
        );
    }
}

#[test]
fn duplicate_names_are_invalid_input() {
    let store = MemoryEntryStore::new();
    let response = create_draw(&store, json!({"names": ["A", "A"]}), 3);

    assert_eq!(response.status_code, 400);
    assert_eq!(reason_of(&response), ReasonCode::InvalidInput);
    assert!(store.is_empty());
}

#[test]
fn mismatched_groups_are_invalid_input() {
    let store = MemoryEntryStore::new();
    let response = create_draw(
        &store,
        json!({"names": ["A", "B", "C"], "groups": ["x"]}),
        3,
    );

    assert_eq!(response.status_code, 400);
    assert_eq!(reason_of(&response), ReasonCode::InvalidInput);
}

#[test]
fn concurrent_reveals_through_the_api_have_one_winner() {
    let store = MemoryEntryStore::new();
    let response = create_draw(&store, json!({"names": ["A", "B"]}), 5);
    let created: CreateDrawResponse =
        serde_json::from_str(&response.body).expect("create body should parse");
    let id = entry_id(&created.entries[0].path).to_string();

    let statuses: Vec<u16> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..16u64)
            .map(|seed| {
                let store = &store;
                let id = id.as_str();
                scope.spawn(move || {
                    handle_api_event(
                        reveal_event(id),
                        &config(),
                        store,
                        &mut StdRng::seed_from_u64(seed),
                    )
                    .status_code
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("reveal thread panicked"))
            .collect()
    });

    assert_eq!(statuses.iter().filter(|status| **status == 200).count(), 1);
    assert_eq!(statuses.iter().filter(|status| **status == 400).count(), 15);
}

#[test]
fn unknown_route_and_method_are_reported() {
    let store = MemoryEntryStore::new();
    let mut rng = StdRng::seed_from_u64(0);

    let missing = handle_api_event(
        json!({"httpMethod": "GET", "path": "/health", "body": null}),
        &config(),
        &store,
        &mut rng,
    );
    assert_eq!(missing.status_code, 404);
    assert_eq!(reason_of(&missing), ReasonCode::RouteNotFound);

    let wrong_method = handle_api_event(
        json!({"httpMethod": "DELETE", "path": "/draws", "body": null}),
        &config(),
        &store,
        &mut rng,
    );
    assert_eq!(wrong_method.status_code, 405);
}
