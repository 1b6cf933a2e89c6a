use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use stocktrail_auth::JwtClaims;
use stocktrail_core::UserId;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = stocktrail_api::app::build_app(jwt_secret.to_string()).await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, user_id: UserId, username: &str) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user_id,
        username: username.to_string(),
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

/// Register an account via the open endpoint and mint a token for it.
async fn register(
    client: &reqwest::Client,
    base_url: &str,
    jwt_secret: &str,
    username: &str,
) -> (UserId, String) {
    let res = client
        .post(format!("{}/users", base_url))
        .json(&json!({ "username": username }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: serde_json::Value = res.json().await.unwrap();
    let user_id: UserId = body["id"].as_str().unwrap().parse().unwrap();
    let token = mint_jwt(jwt_secret, user_id, username);
    (user_id, token)
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let client = reqwest::Client::new();
    for path in ["/whoami", "/items", "/logs", "/categories", "/users"] {
        let res = client
            .get(format!("{}{}", srv.base_url, path))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "path {path}");
    }
}

#[tokio::test]
async fn account_creation_is_open_and_whoami_reflects_the_token() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let (user_id, token) = register(&client, &srv.base_url, jwt_secret, "alice").await;

    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user_id"].as_str().unwrap(), user_id.to_string());
    assert_eq!(body["username"].as_str().unwrap(), "alice");
}

#[tokio::test]
async fn inventory_lifecycle_produces_a_complete_audit_trail() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let (user_id, token) = register(&client, &srv.base_url, jwt_secret, "alice").await;

    // Create.
    let res = client
        .post(format!("{}/items", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Widget A", "quantity": 20, "price": "9.99" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let item: serde_json::Value = res.json().await.unwrap();
    let item_id = item["id"].as_str().unwrap().to_string();
    assert_eq!(item["price"].as_str().unwrap(), "9.99");
    assert_eq!(item["managed_by_username"].as_str().unwrap(), "alice");
    assert_eq!(item["quantity"].as_i64().unwrap(), 20);

    // Sale: 20 -> 15.
    let res = client
        .patch(format!("{}/items/{}", srv.base_url, item_id))
        .bearer_auth(&token)
        .json(&json!({ "quantity": 15 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Details-only update.
    let res = client
        .patch(format!("{}/items/{}", srv.base_url, item_id))
        .bearer_auth(&token)
        .json(&json!({ "description": "blue variant" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // The item_id filter narrows the trail to this item.
    let res = client
        .get(format!(
            "{}/logs?item_id={}&ordering=timestamp",
            srv.base_url, item_id
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let logs: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(logs.len(), 3);
    assert_eq!(logs[0]["action"], "CREATE");
    assert_eq!(logs[0]["quantity_changed"].as_i64().unwrap(), 20);
    assert_eq!(logs[1]["action"], "SALE");
    assert_eq!(logs[1]["quantity_changed"].as_i64().unwrap(), -5);
    assert_eq!(logs[2]["action"], "UPDATE");
    assert_eq!(logs[2]["quantity_changed"].as_i64().unwrap(), 0);

    // Delete, then verify the trail survives with nulled item references.
    let res = client
        .delete(format!("{}/items/{}", srv.base_url, item_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/items/{}", srv.base_url, item_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(format!("{}/logs?ordering=timestamp", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let logs: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(logs.len(), 4);
    assert_eq!(logs[3]["action"], "DELETE");
    assert_eq!(logs[3]["quantity_changed"].as_i64().unwrap(), -15);
    assert!(logs[3]["item"].is_null());
    assert_eq!(logs[3]["item_name"], "Widget A");
    for log in &logs {
        assert!(log["item"].is_null());
        assert_eq!(log["user"].as_str().unwrap(), user_id.to_string());
        assert_eq!(log["user_username"].as_str().unwrap(), "alice");
    }

    // Individual records stay addressable.
    let log_id = logs[0]["id"].as_str().unwrap();
    let res = client
        .get(format!("{}/logs/{}", srv.base_url, log_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn low_stock_filters_strictly_below_threshold() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let (_, token) = register(&client, &srv.base_url, jwt_secret, "alice").await;

    for (name, qty) in [("A", 5), ("B", 10), ("C", 15)] {
        let res = client
            .post(format!("{}/items", srv.base_url))
            .bearer_auth(&token)
            .json(&json!({ "name": name, "quantity": qty, "price": "1.00" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = client
        .get(format!("{}/items/low_stock?threshold=10", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let items: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "A");

    let res = client
        .get(format!("{}/items/low_stock?threshold=soon", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Threshold must be an integer");
}

#[tokio::test]
async fn non_owner_writes_are_forbidden_but_reads_stay_open() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let (_, alice_token) = register(&client, &srv.base_url, jwt_secret, "alice").await;
    let (_, bob_token) = register(&client, &srv.base_url, jwt_secret, "bob").await;

    let res = client
        .post(format!("{}/items", srv.base_url))
        .bearer_auth(&alice_token)
        .json(&json!({ "name": "Widget", "quantity": 5, "price": "2.50" }))
        .send()
        .await
        .unwrap();
    let item: serde_json::Value = res.json().await.unwrap();
    let item_id = item["id"].as_str().unwrap();

    // Bob can read it.
    let res = client
        .get(format!("{}/items/{}", srv.base_url, item_id))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // ...but not modify or delete it, and no record is written.
    let res = client
        .patch(format!("{}/items/{}", srv.base_url, item_id))
        .bearer_auth(&bob_token)
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .delete(format!("{}/items/{}", srv.base_url, item_id))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(format!("{}/logs", srv.base_url))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    let logs: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["action"], "CREATE");
}

#[tokio::test]
async fn tokens_for_unregistered_users_cannot_create_items() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    // Valid signature, but the subject was never registered.
    let token = mint_jwt(jwt_secret, UserId::new(), "ghost");

    let res = client
        .post(format!("{}/items", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Widget", "price": "1.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}
