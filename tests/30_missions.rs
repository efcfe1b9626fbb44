mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{memory_app, seeded_store, send, test_app, token, FailingMissionStore};
use freelance_api_rust::database::{MissionStore, StoreOperation};
use freelance_api_rust::services::CascadeStep;
use freelance_api_rust::types::MissionId;

#[tokio::test]
async fn owner_deletes_mission_with_dependents() {
    let store = seeded_store().await;
    let (app, _) = memory_app(&store);

    let (status, body) = send(&app, Method::DELETE, "/api/missions/abc123", Some(&token("client-42-user")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], true);

    let id = MissionId::new("abc123");
    assert_eq!(
        store.operations().await,
        vec![
            StoreOperation::DeletePayments(id.clone()),
            StoreOperation::DeleteContract(id.clone()),
            StoreOperation::DeleteMission(id.clone()),
        ]
    );
    assert!(store.find_mission(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn other_client_cannot_delete() {
    let store = seeded_store().await;
    let (app, _) = memory_app(&store);

    let (status, body) = send(&app, Method::DELETE, "/api/missions/abc123", Some(&token("client-99-user")), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    assert!(store.operations().await.is_empty());
    assert_eq!(store.payment_count(&MissionId::new("abc123")).await, 2);
}

#[tokio::test]
async fn deleting_a_missing_mission_is_not_found() {
    let (app, _) = memory_app(&seeded_store().await);

    let (status, body) = send(&app, Method::DELETE, "/api/missions/nope", Some(&token("client-42-user")), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn missing_beats_forbidden() {
    let (app, _) = memory_app(&seeded_store().await);

    // Support may reach the path but never mutates; absence is reported first
    let (status, _) = send(&app, Method::DELETE, "/api/missions/nope", Some(&token("support-1")), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/api/missions/abc123", Some(&token("support-1")), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_deletes_any_mission() {
    let store = seeded_store().await;
    let (app, _) = memory_app(&store);

    let (status, _) = send(&app, Method::DELETE, "/api/missions/m-99", Some(&token("admin-1")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        store.operations().await,
        vec![StoreOperation::DeleteMission(MissionId::new("m-99"))]
    );
}

#[tokio::test]
async fn failed_step_is_reported_and_mission_kept() {
    let store = seeded_store().await;
    let missions = Arc::new(FailingMissionStore {
        inner: store.clone(),
        fail_at: CascadeStep::Contract,
    });
    let (app, _) = test_app(Arc::new(store.clone()), missions);

    let (status, body) = send(&app, Method::DELETE, "/api/missions/abc123", Some(&token("client-42-user")), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "CASCADE_STEP_FAILURE");
    assert_eq!(body["step"], "contract");

    let id = MissionId::new("abc123");
    assert!(store.find_mission(&id).await.unwrap().is_some());
    assert!(store.has_contract(&id).await);
    assert_eq!(store.payment_count(&id).await, 0);

    // Retrying against a healthy store finishes the job
    let (healthy, _) = memory_app(&store);
    let (status, _) = send(&healthy, Method::DELETE, "/api/missions/abc123", Some(&token("client-42-user")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(store.find_mission(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn client_creates_for_itself() {
    let store = seeded_store().await;
    let (app, _) = memory_app(&store);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/missions",
        Some(&token("client-42-user")),
        Some(json!({
            "dailyRate": "450",
            "timeframe": 45,
            "description": "Mobile app"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["clientId"], "client-42");
    assert_eq!(body["data"]["status"], "OPEN");
}

#[tokio::test]
async fn client_cannot_create_for_another_client() {
    let store = seeded_store().await;
    let (app, _) = memory_app(&store);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/missions",
        Some(&token("client-42-user")),
        Some(json!({
            "clientId": "client-99",
            "dailyRate": "450",
            "timeframe": 45,
            "description": "Mobile app"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    assert!(store.operations().await.is_empty());
}

#[tokio::test]
async fn admin_must_name_the_client() {
    let (app, _) = memory_app(&seeded_store().await);
    let admin = token("admin-1");
    let mission = json!({ "dailyRate": "600", "timeframe": 10, "description": "Audit" });

    let (status, _) = send(&app, Method::POST, "/api/missions", Some(&admin), Some(mission.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut named = mission;
    named["clientId"] = json!("client-99");
    let (status, body) = send(&app, Method::POST, "/api/missions", Some(&admin), Some(named)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["clientId"], "client-99");
}

#[tokio::test]
async fn freelancer_cannot_create() {
    let (app, _) = memory_app(&seeded_store().await);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/missions",
        Some(&token("freelancer-1")),
        Some(json!({ "dailyRate": "450", "timeframe": 45, "description": "Mobile app" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invalid_mission_fields_are_rejected() {
    let (app, _) = memory_app(&seeded_store().await);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/missions",
        Some(&token("client-42-user")),
        Some(json!({ "dailyRate": "0", "timeframe": 0, "description": " " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["timeframe"].is_string());
}

#[tokio::test]
async fn owner_updates_mission() {
    let store = seeded_store().await;
    let (app, _) = memory_app(&store);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/missions/abc123",
        Some(&token("client-42-user")),
        Some(json!({ "status": "COMPLETED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "COMPLETED");
}

#[tokio::test]
async fn other_client_cannot_update() {
    let store = seeded_store().await;
    let (app, _) = memory_app(&store);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/missions/abc123",
        Some(&token("client-99-user")),
        Some(json!({ "description": "hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(store.operations().await.is_empty());
}

#[tokio::test]
async fn empty_update_is_a_bad_request() {
    let (app, _) = memory_app(&seeded_store().await);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/missions/abc123",
        Some(&token("client-42-user")),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reading_a_missing_mission_is_not_found() {
    let (app, _) = memory_app(&seeded_store().await);

    let (status, _) = send(&app, Method::GET, "/api/missions/ghost", Some(&token("client-42-user")), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
