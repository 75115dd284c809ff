use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use cohort_data_services::app::{DataServices, Policies};
use cohort_data_services::auth::{generate_token, Claims};

fn open_router() -> Router {
    DataServices::in_memory().with_policies(Policies::allow_all()).router()
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> Result<(StatusCode, Option<Value>)> {
    send_with(router, method, uri, body, None).await
}

async fn send_with(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    authorization: Option<&str>,
) -> Result<(StatusCode, Option<Value>)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() { None } else { Some(serde_json::from_slice(&bytes)?) };
    Ok((status, json))
}

#[tokio::test]
async fn create_read_delete_then_missing() -> Result<()> {
    let router = open_router();

    let (status, created) = send(
        &router,
        Method::POST,
        "/api/participant-demographic",
        Some(json!({ "ParticipantId": 1, "NhsNumber": 9000000009i64, "GivenName": "Ada" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created.unwrap_or_default()["ParticipantId"], 1);

    let (status, body) = send(&router, Method::GET, "/api/participant-demographic/1", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap_or_default()["GivenName"], "Ada");

    let (status, body) = send(&router, Method::DELETE, "/api/participant-demographic/1", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Some(json!({ "success": true })));

    let (status, body) = send(&router, Method::GET, "/api/participant-demographic/1", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.unwrap_or_default()["code"], "NOT_FOUND");

    let (status, _) = send(&router, Method::DELETE, "/api/participant-demographic/1", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn empty_store_is_no_content() -> Result<()> {
    let router = open_router();

    let (status, body) = send(&router, Method::GET, "/api/nems-subscription", None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, None);

    let (status, _) = send(&router, Method::GET, "/api/nems-subscription?NhsNumber=1&single=true", None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn single_mode_rejects_ambiguous_matches() -> Result<()> {
    let router = open_router();

    let (status, stored) = send(
        &router,
        Method::POST,
        "/api/exception-management",
        Some(json!([
            { "NhsNumber": "9000000009", "RuleId": 1 },
            { "NhsNumber": "9000000009", "RuleId": 2 },
        ])),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = stored
        .unwrap_or_default()
        .as_array()
        .map(|rows| rows.iter().filter_map(|r| r["ExceptionId"].as_i64()).collect())
        .unwrap_or_default();
    assert_eq!(ids, vec![1, 2]);

    let (status, body) =
        send(&router, Method::GET, "/api/exception-management?NhsNumber=9000000009&single=true", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.unwrap_or_default()["error"], true);

    let (status, body) = send(&router, Method::GET, "/api/exception-management?RuleId=2&single=true", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap_or_default()["ExceptionId"], 2);

    let (status, body) = send(&router, Method::GET, "/api/exception-management?limit=1", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap_or_default().as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn bulk_insert_is_all_or_nothing() -> Result<()> {
    let router = open_router();

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/participant-demographic",
        Some(json!([
            { "ParticipantId": 10, "NhsNumber": 1 },
            { "ParticipantId": 10, "NhsNumber": 2 },
        ])),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&router, Method::GET, "/api/participant-demographic", None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn standard_policies_gate_each_verb() -> Result<()> {
    let router = DataServices::in_memory().router();

    let (status, _) = send(&router, Method::DELETE, "/api/exception-management/1", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Denied before the missing key is noticed
    let (status, _) = send(&router, Method::DELETE, "/api/exception-management", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let record = json!({ "ParticipantId": 5, "NhsNumber": 9000000005i64 });
    let (status, body) = send(&router, Method::POST, "/api/participant-demographic", Some(record.clone())).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.unwrap_or_default()["message"], "Action was either Unauthorized or not enabled");

    let token = generate_token(&Claims::new("router-test", vec!["writer".to_string()]))?;
    let authorization = format!("Bearer {}", token);
    let (status, _) = send_with(
        &router,
        Method::POST,
        "/api/participant-demographic",
        Some(record),
        Some(&authorization),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &router,
        Method::GET,
        "/api/participant-demographic?query=x%20%3D%3E%20x.ParticipantId%20%3D%3D%205",
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap_or_default().as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn put_uses_path_key() -> Result<()> {
    let router = open_router();

    send(
        &router,
        Method::POST,
        "/api/participant-demographic",
        Some(json!({ "ParticipantId": 3, "NhsNumber": 9000000003i64 })),
    )
    .await?;

    let (status, body) = send(
        &router,
        Method::PUT,
        "/api/participant-demographic/3",
        Some(json!({ "NhsNumber": 9000000003i64, "PostCode": "LS1 4AP" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap_or_default();
    assert_eq!(body["ParticipantId"], 3);
    assert_eq!(body["PostCode"], "LS1 4AP");

    let (status, _) = send(
        &router,
        Method::PUT,
        "/api/participant-demographic/42",
        Some(json!({ "NhsNumber": 1 })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&router, Method::PUT, "/api/participant-demographic", Some(json!({}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn malformed_input_is_bad_request() -> Result<()> {
    let router = open_router();

    let (status, _) = send(&router, Method::GET, "/api/participant-demographic/abc", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&router, Method::GET, "/api/participant-demographic?NhsNumber=notanumber", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&router, Method::GET, "/api/participant-demographic?limit=-1", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&router, Method::POST, "/api/participant-demographic", Some(json!("text"))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&router, Method::POST, "/api/participant-demographic", Some(json!([]))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}
