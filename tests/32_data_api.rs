mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

const UNAUTHORIZED_MESSAGE: &str = "Action was either Unauthorized or not enabled";

#[tokio::test]
async fn exception_lifecycle_over_http() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let url = server.url("/api/exception-management");

    let res = client
        .post(&url)
        .json(&json!({ "NhsNumber": "9000000001", "RuleId": 36, "FileName": "batch-1.parquet" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let created = res.json::<Value>().await?;
    let id = created["ExceptionId"].as_i64().unwrap_or_default();
    assert!(id > 0, "generated key missing: {}", created);

    let res = client.get(format!("{}/{}", url, id)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["RuleId"], 36);

    let res = client
        .put(format!("{}/{}", url, id))
        .json(&json!({ "NhsNumber": "9000000001", "RuleId": 36, "DateResolved": "2025-06-01" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["DateResolved"], "2025-06-01");

    // Exceptions are never deleted through the API
    let res = client.delete(format!("{}/{}", url, id)).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], true);
    assert_eq!(body["message"], UNAUTHORIZED_MESSAGE);

    let res = client.get(format!("{}/{}", url, id)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn predicate_query_over_http() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let url = server.url("/api/exception-management");

    for rule in [101, 102] {
        let res = client
            .post(&url)
            .json(&json!({ "NhsNumber": "9000000077", "RuleId": rule }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = client
        .get(&url)
        .query(&[("query", r#"x => x.NhsNumber == "9000000077" && x.RuleId > 100"#)])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let rows = res.json::<Value>().await?;
    assert_eq!(rows.as_array().map(Vec::len), Some(2));

    let res = client
        .get(&url)
        .query(&[("NhsNumber", "9000000077"), ("single", "true")])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(&url)
        .query(&[("query", r#"x => x.NhsNumber == "0000000000""#)])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(&url)
        .query(&[("query", "x => System.IO.File.Delete(x.FileName)")])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn participant_writes_need_writer_role() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let url = server.url("/api/participant-demographic");
    let record = json!({ "ParticipantId": 7001, "NhsNumber": 9000007001i64, "FamilyName": "Okafor" });

    let res = client.post(&url).json(&record).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(&url)
        .header("Authorization", common::bearer(&["reader"])?)
        .json(&record)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let writer = common::bearer(&["writer"])?;
    let res = client.post(&url).header("Authorization", &writer).json(&record).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    // Reads are open
    let res = client.get(format!("{}/7001", url)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["FamilyName"], "Okafor");

    let res = client.delete(format!("{}/7001", url)).header("Authorization", &writer).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?, json!({ "success": true }));

    let res = client.get(format!("{}/7001", url)).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn unsupported_verb_is_405() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .patch(server.url("/api/nems-subscription"))
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    Ok(())
}
