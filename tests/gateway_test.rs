// ============================================================================
// Gateway End-to-End Tests
// ============================================================================
//
// Each test spins up real users/orders services plus a gateway on ephemeral
// ports and exercises the public surface:
// - registration, duplicate conflict, id sequencing
// - login, token issuing, rejection shapes
// - protected routes and token failure modes
// - order creation with owner injection
// - the user details fan-out
//
// ============================================================================


use serde_json::{json, Value};
use test_utils::{spawn_stack, TestStack, TEST_SECRET};

use storefront::auth::AuthManager;

fn create_client() -> reqwest::Client {
    reqwest::Client::builder().build().unwrap()
}

async fn register(
    client: &reqwest::Client,
    stack: &TestStack,
    email: &str,
    name: &str,
) -> reqwest::Response {
    client
        .post(format!("http://{}/users/register", stack.gateway))
        .json(&json!({ "email": email, "password": "secret123", "name": name }))
        .send()
        .await
        .unwrap()
}

async fn login(
    client: &reqwest::Client,
    stack: &TestStack,
    email: &str,
    password: &str,
) -> reqwest::Response {
    client
        .post(format!("http://{}/users/login", stack.gateway))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .unwrap()
}

async fn login_token(client: &reqwest::Client, stack: &TestStack, email: &str) -> String {
    let response = login(client, stack, email, "secret123").await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_register_assigns_sequential_ids_and_hides_password() {
    let stack = spawn_stack().await;
    let client = create_client();

    let first = register(&client, &stack, "alice@example.com", "Alice").await;
    assert_eq!(first.status(), reqwest::StatusCode::CREATED);
    let first: Value = first.json().await.unwrap();

    let second = register(&client, &stack, "bob@example.com", "Bob").await;
    assert_eq!(second.status(), reqwest::StatusCode::CREATED);
    let second: Value = second.json().await.unwrap();

    assert_eq!(first["id"], 1);
    assert_eq!(first["email"], "alice@example.com");
    assert_eq!(first["name"], "Alice");
    assert_eq!(second["id"], 2);

    // Neither the password nor its hash may appear in responses
    assert!(first.get("password").is_none());
    assert!(first.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_is_conflict() {
    let stack = spawn_stack().await;
    let client = create_client();

    let first = register(&client, &stack, "alice@example.com", "Alice").await;
    assert_eq!(first.status(), reqwest::StatusCode::CREATED);

    let duplicate = register(&client, &stack, "alice@example.com", "Alice Again").await;
    assert_eq!(duplicate.status(), reqwest::StatusCode::CONFLICT);

    let body: Value = duplicate.json().await.unwrap();
    assert_eq!(body["error"], "Email already registered");

    // The original account still works
    let token = login_token(&client, &stack, "alice@example.com").await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn test_register_validation_error_is_relayed() {
    let stack = spawn_stack().await;
    let client = create_client();

    let response = client
        .post(format!("http://{}/users/register", stack.gateway))
        .json(&json!({ "email": "alice@example.com" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Email, password and name are required");
}

#[tokio::test]
async fn test_login_and_me_roundtrip() {
    let stack = spawn_stack().await;
    let client = create_client();

    register(&client, &stack, "alice@example.com", "Alice").await;
    let token = login_token(&client, &stack, "alice@example.com").await;

    let response = client
        .get(format!("http://{}/users/me", stack.gateway))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Access granted");
    assert_eq!(body["user"]["id"], 1);
    assert_eq!(body["user"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_login_rejections_have_identical_shape() {
    let stack = spawn_stack().await;
    let client = create_client();

    register(&client, &stack, "alice@example.com", "Alice").await;

    // Wrong password for a known account
    let wrong_password = login(&client, &stack, "alice@example.com", "nope").await;
    assert_eq!(wrong_password.status(), reqwest::StatusCode::UNAUTHORIZED);
    let wrong_password: Value = wrong_password.json().await.unwrap();

    // Account that does not exist at all
    let unknown_email = login(&client, &stack, "nobody@example.com", "nope").await;
    assert_eq!(unknown_email.status(), reqwest::StatusCode::UNAUTHORIZED);
    let unknown_email: Value = unknown_email.json().await.unwrap();

    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let stack = spawn_stack().await;
    let client = create_client();

    for path in ["/users", "/users/me", "/users/1", "/users/1/details", "/orders"] {
        let response = client
            .get(format!("http://{}{}", stack.gateway, path))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED, "{}", path);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "No token provided", "{}", path);
    }
}

#[tokio::test]
async fn test_bad_tokens_are_rejected() {
    let stack = spawn_stack().await;
    let client = create_client();

    register(&client, &stack, "alice@example.com", "Alice").await;
    let token = login_token(&client, &stack, "alice@example.com").await;

    // Tampered signature
    let tampered = format!("{}x", token);
    // Expired but otherwise valid, signed with the gateway's own secret
    let expired = AuthManager::new(TEST_SECRET, -10)
        .issue(1, "alice@example.com")
        .unwrap();
    // Valid shape, wrong signing key
    let foreign = AuthManager::new("other-secret", 3600)
        .issue(1, "alice@example.com")
        .unwrap();

    for bad in [tampered, expired, foreign] {
        let response = client
            .get(format!("http://{}/users/me", stack.gateway))
            .bearer_auth(&bad)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Invalid or expired token");
    }
}

#[tokio::test]
async fn test_list_and_get_users_through_gateway() {
    let stack = spawn_stack().await;
    let client = create_client();

    register(&client, &stack, "alice@example.com", "Alice").await;
    register(&client, &stack, "bob@example.com", "Bob").await;
    let token = login_token(&client, &stack, "alice@example.com").await;

    let response = client
        .get(format!("http://{}/users", stack.gateway))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let users: Value = response.json().await.unwrap();
    assert_eq!(users.as_array().unwrap().len(), 2);

    let response = client
        .get(format!("http://{}/users/2", stack.gateway))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["email"], "bob@example.com");

    // Unknown ids come back as the backend's own 404
    let response = client
        .get(format!("http://{}/users/999", stack.gateway))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn test_create_order_overrides_user_id_from_token() {
    let stack = spawn_stack().await;
    let client = create_client();

    register(&client, &stack, "alice@example.com", "Alice").await;
    let token = login_token(&client, &stack, "alice@example.com").await;

    // The body claims another user; the token wins
    let response = client
        .post(format!("http://{}/orders", stack.gateway))
        .bearer_auth(&token)
        .json(&json!({ "userId": 999, "item": "keyboard", "quantity": 2 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let order: Value = response.json().await.unwrap();
    assert_eq!(order["id"], 1);
    assert_eq!(order["userId"], 1);
    assert_eq!(order["item"], "keyboard");
    assert_eq!(order["quantity"], 2);
}

#[tokio::test]
async fn test_list_orders_with_user_filter() {
    let stack = spawn_stack().await;
    let client = create_client();

    register(&client, &stack, "alice@example.com", "Alice").await;
    register(&client, &stack, "bob@example.com", "Bob").await;
    let alice_token = login_token(&client, &stack, "alice@example.com").await;
    let bob_token = login_token(&client, &stack, "bob@example.com").await;

    for (token, item) in [
        (&alice_token, "keyboard"),
        (&bob_token, "mouse"),
        (&alice_token, "monitor"),
    ] {
        let response = client
            .post(format!("http://{}/orders", stack.gateway))
            .bearer_auth(token)
            .json(&json!({ "item": item }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    }

    let response = client
        .get(format!("http://{}/orders?userId=1", stack.gateway))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let orders: Value = response.json().await.unwrap();
    let orders = orders.as_array().unwrap();

    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|order| order["userId"] == 1));
}

#[tokio::test]
async fn test_user_details_joins_only_owned_orders() {
    let stack = spawn_stack().await;
    let client = create_client();

    register(&client, &stack, "alice@example.com", "Alice").await;
    register(&client, &stack, "bob@example.com", "Bob").await;
    let alice_token = login_token(&client, &stack, "alice@example.com").await;
    let bob_token = login_token(&client, &stack, "bob@example.com").await;

    for (token, item) in [
        (&alice_token, "keyboard"),
        (&bob_token, "mouse"),
        (&alice_token, "monitor"),
    ] {
        client
            .post(format!("http://{}/orders", stack.gateway))
            .bearer_auth(token)
            .json(&json!({ "item": item }))
            .send()
            .await
            .unwrap();
    }

    let response = client
        .get(format!("http://{}/users/1/details", stack.gateway))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();

    assert_eq!(body["user"]["id"], 1);
    assert_eq!(body["user"]["email"], "alice@example.com");

    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|order| order["userId"] == 1));
}

#[tokio::test]
async fn test_user_details_unknown_user_is_not_found() {
    let stack = spawn_stack().await;
    let client = create_client();

    register(&client, &stack, "alice@example.com", "Alice").await;
    let token = login_token(&client, &stack, "alice@example.com").await;

    // Orders exist, but the user does not
    client
        .post(format!("http://{}/orders", stack.gateway))
        .bearer_auth(&token)
        .json(&json!({ "item": "keyboard" }))
        .send()
        .await
        .unwrap();

    let response = client
        .get(format!("http://{}/users/999/details", stack.gateway))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn test_health_reports_closed_circuits() {
    let stack = spawn_stack().await;
    let client = create_client();

    let response = client
        .get(format!("http://{}/health", stack.gateway))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "API Gateway is running");
    assert_eq!(body["circuits"]["users"], "closed");
    assert_eq!(body["circuits"]["orders"], "closed");
}
