use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::applications::router::{approve_handler, get_handler};
use crate::workflows::applications::{Actor, ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};
use crate::workflows::applications::InMemoryApplicationStore;
use crate::workflows::ledger::InMemoryLedger;
use crate::workflows::marketplace::JobId;

fn request(method: &str, uri: &str, actor: Option<&Actor>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder
            .header(ACTOR_ROLE_HEADER, actor.role.label())
            .header(ACTOR_ID_HEADER, actor.id.as_str());
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn submit_route_creates_applications() {
    let (service, _, _) = build_service();
    let router = application_router_with_service(service);

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/applications",
            Some(&dana()),
            Some(json!({ "job_id": "job-1" })),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], json!("pending"));
    assert_eq!(payload["compatibility_score"], json!(67));
    assert_eq!(payload["ai_applied"], json!(false));
}

#[tokio::test]
async fn missing_actor_headers_are_unauthorized() {
    let (service, _, _) = build_service();
    let router = application_router_with_service(service);

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/applications",
            None,
            Some(json!({ "job_id": "job-1" })),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_submission_conflicts() {
    let (service, _, _) = build_service();
    service
        .submit(&dana(), &JobId::new("job-1"), false)
        .expect("first submission");
    let router = application_router_with_service(service);

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/applications",
            Some(&dana()),
            Some(json!({ "job_id": "job-1", "ai_applied": true })),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn transition_routes_map_lifecycle_errors() {
    let (service, _, _) = build_service();
    let record = service
        .submit(&dana(), &JobId::new("job-1"), false)
        .expect("submission");
    let base = format!("/api/v1/applications/{}", record.id);

    let early_proof = application_router_with_service(service.clone())
        .oneshot(request(
            "POST",
            &format!("{base}/proof"),
            Some(&acme()),
            Some(serde_json::to_value(pdf_proof()).unwrap()),
        ))
        .await
        .expect("route executes");
    assert_eq!(early_proof.status(), StatusCode::CONFLICT);

    let outsider = application_router_with_service(service.clone())
        .oneshot(request("POST", &format!("{base}/approve"), Some(&globex()), None))
        .await
        .expect("route executes");
    assert_eq!(outsider.status(), StatusCode::FORBIDDEN);

    let approved = application_router_with_service(service.clone())
        .oneshot(request("POST", &format!("{base}/approve"), Some(&acme()), None))
        .await
        .expect("route executes");
    assert_eq!(approved.status(), StatusCode::OK);

    let wrong_type = application_router_with_service(service.clone())
        .oneshot(request(
            "POST",
            &format!("{base}/proof"),
            Some(&acme()),
            Some(json!({
                "name": "photo.png",
                "storage_key": "proofs/photo.png",
                "media_type": "image/png"
            })),
        ))
        .await
        .expect("route executes");
    assert_eq!(wrong_type.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let uploaded = application_router_with_service(service.clone())
        .oneshot(request(
            "POST",
            &format!("{base}/proof"),
            Some(&acme()),
            Some(serde_json::to_value(pdf_proof()).unwrap()),
        ))
        .await
        .expect("route executes");
    assert_eq!(uploaded.status(), StatusCode::OK);

    let no_attestation = application_router_with_service(service.clone())
        .oneshot(request(
            "POST",
            &format!("{base}/verify"),
            Some(&dana()),
            Some(json!({})),
        ))
        .await
        .expect("route executes");
    assert_eq!(no_attestation.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let verified = application_router_with_service(service)
        .oneshot(request(
            "POST",
            &format!("{base}/verify"),
            Some(&dana()),
            Some(json!({ "attestation": "0xsigned" })),
        ))
        .await
        .expect("route executes");
    assert_eq!(verified.status(), StatusCode::OK);
    let payload = read_json_body(verified).await;
    assert_eq!(payload["status"], json!("verified"));
    assert_eq!(
        payload["company_action"]["proof_document"]["media_type"],
        json!("application/pdf")
    );
}

#[tokio::test]
async fn list_and_stats_routes_apply_filters() {
    let (service, _, _) = build_service();
    service
        .submit(&dana(), &JobId::new("job-1"), false)
        .expect("dana applies");
    let omar_record = service
        .submit(&omar(), &JobId::new("job-2"), false)
        .expect("omar applies");
    service
        .reject(&omar_record.id, &globex())
        .expect("globex rejects");

    let listed = application_router_with_service(service.clone())
        .oneshot(request(
            "GET",
            "/api/v1/applications?company_id=globex&sort=company_name",
            None,
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(listed.status(), StatusCode::OK);
    let payload = read_json_body(listed).await;
    let entries = payload.as_array().expect("array payload");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["status"], json!("rejected"));

    let stats = application_router_with_service(service)
        .oneshot(request("GET", "/api/v1/applications/stats", None, None))
        .await
        .expect("route executes");
    assert_eq!(stats.status(), StatusCode::OK);
    let payload = read_json_body(stats).await;
    assert_eq!(payload["total"], json!(2));
    assert_eq!(payload["pending"], json!(1));
    assert_eq!(payload["rejected"], json!(1));
}

#[tokio::test]
async fn recommendations_route_parses_preferences() {
    let (service, _, _) = build_service();
    let router = application_router_with_service(service.clone());

    let response = router
        .oneshot(request(
            "GET",
            "/api/v1/candidates/dana@example.com/recommendations?minimum_score=20&locations=remote",
            None,
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let picks = payload.as_array().expect("array payload");
    assert_eq!(picks.len(), 1);
    assert_eq!(picks[0]["job"]["id"], json!("job-1"));
    assert_eq!(picks[0]["score"], json!(67));

    let bad = application_router_with_service(service)
        .oneshot(request(
            "GET",
            "/api/v1/candidates/dana@example.com/recommendations?locations=moon",
            None,
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(bad.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn compatibility_route_scores_and_validates() {
    let (service, _, _) = build_service();

    let scored = application_router_with_service(service.clone())
        .oneshot(request(
            "POST",
            "/api/v1/compatibility",
            None,
            Some(json!({
                "job_skills": ["React", "TypeScript", "JavaScript"],
                "candidate_skills": ["react", "node"]
            })),
        ))
        .await
        .expect("route executes");
    assert_eq!(scored.status(), StatusCode::OK);
    assert_eq!(read_json_body(scored).await["score"], json!(33));

    let empty = application_router_with_service(service)
        .oneshot(request(
            "POST",
            "/api/v1/compatibility",
            None,
            Some(json!({ "job_skills": [], "candidate_skills": ["rust"] })),
        ))
        .await
        .expect("route executes");
    assert_eq!(empty.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_handler_reports_missing_records() {
    let (service, _, _) = build_service();

    let response = get_handler::<InMemoryApplicationStore, InMemoryLedger>(
        State(service),
        Path("app-999999".to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ledger_outage_maps_to_bad_gateway() {
    let (service, _, ledger) = build_service();
    let record = service
        .submit(&dana(), &JobId::new("job-1"), false)
        .expect("submission");
    ledger.set_offline(true);

    let response = approve_handler::<InMemoryApplicationStore, InMemoryLedger>(
        State(service),
        Path(record.id.to_string()),
        acme(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
