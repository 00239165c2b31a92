/// Integration tests for authentication, accounts and role guards
///
/// Run with: cargo test -p sellos-api --test auth_api_tests

mod common;

use axum::http::{Method, StatusCode};
use chrono::Duration;
use common::{TestContext, JWT_SECRET, PASSWORD};
use sellos_shared::auth::jwt::{create_token, Claims};
use sellos_shared::models::identity::{IdentityVariant, Role};
use sellos_shared::store::IdentityStore;
use serde_json::json;

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get("/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_register_verify_login_flow() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .post(
            "/api/customers/register",
            None,
            json!({ "name": "Alice", "email": "alice@x.com", "password": "alice-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let sent = ctx.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0]
        .link
        .as_deref()
        .unwrap()
        .starts_with("http://shop.test/verify-email?token="));

    // Correct password, but the email is not verified yet
    let (status, body) = ctx
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "alice@x.com", "password": "alice-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["needs_verification"], true);

    let token = ctx.mailer.last_token_for("alice@x.com").unwrap();
    let (status, _) = ctx
        .post("/api/auth/verify-email", None, json!({ "token": token }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "alice@x.com", "password": "alice-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["role"], "customer");
    assert_eq!(body["user"]["email"], "alice@x.com");
    assert!(body["token"].as_str().unwrap().len() > 20);

    // Token is usable on customer routes
    let session = body["token"].as_str().unwrap().to_string();
    let (status, body) = ctx.get("/api/orders/mine", Some(&session)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    // Verification token is single use
    let (status, _) = ctx
        .post("/api/auth/verify-email", None, json!({ "token": token }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_registration_rolled_back_when_mail_fails() {
    let ctx = TestContext::new();
    let body = json!({ "name": "Bob", "email": "bob@x.com", "password": "bob-password" });

    ctx.mailer.set_failing(true);
    let (status, _) = ctx.post("/api/customers/register", None, body.clone()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(ctx
        .store
        .find_identity_by_email(IdentityVariant::Customer, "bob@x.com")
        .await
        .unwrap()
        .is_none());

    ctx.mailer.set_failing(false);
    let (status, _) = ctx.post("/api/customers/register", None, body).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let ctx = TestContext::new();
    let body = json!({ "name": "Bob", "email": "bob@x.com", "password": "bob-password" });

    ctx.post("/api/customers/register", None, body.clone()).await;
    let (status, body) = ctx.post("/api/customers/register", None, body).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_register_validation() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .post(
            "/api/customers/register",
            None,
            json!({ "name": "Bob", "email": "not-an-email", "password": "short" }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password"]);
    assert!(ctx.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_login_failures_share_one_message() {
    let ctx = TestContext::new();
    ctx.employee("e@sellos-g.com").await;

    let (wrong_status, wrong) = ctx
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "e@sellos-g.com", "password": "not-it-at-all" }),
        )
        .await;
    let (unknown_status, unknown) = ctx
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "ghost@sellos-g.com", "password": "not-it-at-all" }),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong["message"], unknown["message"]);
    assert!(wrong.get("needs_verification").is_none());
}

#[tokio::test]
async fn test_staff_login_returns_role() {
    let ctx = TestContext::new();
    ctx.admin().await;

    let (status, body) = ctx
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "admin@sellos-g.com", "password": PASSWORD }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "administrator");
}

#[tokio::test]
async fn test_missing_and_malformed_tokens() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get("/api/orders/mine", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token provided");

    let (status, _) = ctx.get("/api/orders/mine", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_session_token_rejected() {
    let ctx = TestContext::new();
    let (customer, _) = ctx.customer("c@x.com").await;

    let claims = Claims::with_expiration(customer.id, Role::Customer, Duration::hours(-25));
    let expired = create_token(&claims, JWT_SECRET).unwrap();

    let (status, _) = ctx.get("/api/orders/mine", Some(&expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_rejected() {
    let ctx = TestContext::new();
    let (customer, _) = ctx.customer("c@x.com").await;

    let claims = Claims::new(customer.id, Role::Customer);
    let forged = create_token(&claims, "another-secret-that-is-32-bytes-long").unwrap();

    let (status, _) = ctx.get("/api/orders/mine", Some(&forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_deleted_identity_is_not_found() {
    let ctx = TestContext::new();
    let (customer, token) = ctx.customer("c@x.com").await;
    ctx.store
        .delete_identity(IdentityVariant::Customer, customer.id)
        .await
        .unwrap();

    let (status, _) = ctx.get("/api/orders/mine", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_role_guards() {
    let ctx = TestContext::new();
    let (_, admin) = ctx.admin().await;
    let (_, employee) = ctx.employee("e@sellos-g.com").await;
    let (_, customer) = ctx.customer("c@x.com").await;

    let cases = [
        ("/api/orders", &customer, StatusCode::FORBIDDEN),
        ("/api/orders", &employee, StatusCode::FORBIDDEN),
        ("/api/orders", &admin, StatusCode::OK),
        ("/api/orders/assigned", &customer, StatusCode::FORBIDDEN),
        ("/api/orders/assigned", &employee, StatusCode::OK),
        ("/api/orders/assigned", &admin, StatusCode::OK),
        ("/api/orders/mine", &admin, StatusCode::FORBIDDEN),
        ("/api/orders/mine", &customer, StatusCode::OK),
        ("/api/employees", &employee, StatusCode::FORBIDDEN),
        ("/api/customers", &customer, StatusCode::FORBIDDEN),
        ("/api/customers", &admin, StatusCode::OK),
        ("/api/notifications", &employee, StatusCode::FORBIDDEN),
    ];

    for (uri, token, expected) in cases {
        let (status, _) = ctx.get(uri, Some(token)).await;
        assert_eq!(status, expected, "GET {}", uri);
    }
}

#[tokio::test]
async fn test_password_reset_flow() {
    let ctx = TestContext::new();
    ctx.employee("e@sellos-g.com").await;

    let (status, body) = ctx
        .post("/api/auth/request-reset", None, json!({ "email": "e@sellos-g.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let generic = body["message"].clone();

    let token = ctx.mailer.last_token_for("e@sellos-g.com").unwrap();
    let uri = format!("/api/auth/reset/{}", token);

    let (status, _) = ctx
        .post(&uri, None, json!({ "new_password": "a-new-password" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "e@sellos-g.com", "password": "a-new-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // A used reset token cannot be replayed
    let (status, _) = ctx
        .post(&uri, None, json!({ "new_password": "yet-another-password" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown emails get the same answer and no mail
    let before = ctx.mailer.sent().len();
    let (status, body) = ctx
        .post("/api/auth/request-reset", None, json!({ "email": "ghost@x.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], generic);
    assert_eq!(ctx.mailer.sent().len(), before);
}

#[tokio::test]
async fn test_change_password() {
    let ctx = TestContext::new();
    let (_, token) = ctx.customer("c@x.com").await;

    let (status, _) = ctx
        .call(
            Method::PATCH,
            "/api/auth/password",
            None,
            Some(json!({ "current_password": PASSWORD, "new_password": "another-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .patch(
            "/api/auth/password",
            Some(&token),
            json!({ "current_password": "wrong-password", "new_password": "another-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .patch(
            "/api/auth/password",
            Some(&token),
            json!({ "current_password": PASSWORD, "new_password": "another-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "c@x.com", "password": "another-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_customer_administration() {
    let ctx = TestContext::new();
    let (_, admin) = ctx.admin().await;
    let (customer, _) = ctx.customer("c@x.com").await;
    let uri = format!("/api/customers/{}", customer.id);

    let (status, body) = ctx.get("/api/customers", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert!(body[0].get("password_hash").is_none());

    let (status, body) = ctx
        .put(&uri, Some(&admin), json!({ "phone": "555-0101", "password": "fresh-password" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phone"], "555-0101");

    let (status, _) = ctx
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "c@x.com", "password": "fresh-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.delete(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ctx.delete(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_employee_administration() {
    let ctx = TestContext::new();
    let (admin_identity, admin) = ctx.admin().await;

    let (status, body) = ctx
        .post(
            "/api/employees",
            Some(&admin),
            json!({
                "name": "Marta",
                "last_name": "Ruiz",
                "email": "marta@sellos-g.com",
                "password": "marta-password"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["role"], "employee");
    let id = body["id"].as_str().unwrap().to_string();

    // Administrators are not employees
    let (_, list) = ctx.get("/api/employees", Some(&admin)).await;
    let ids: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![id.as_str()]);

    let (status, _) = ctx
        .put(
            &format!("/api/employees/{}", admin_identity.id),
            Some(&admin),
            json!({ "name": "Nope" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx
        .put(&format!("/api/employees/{}", id), Some(&admin), json!({ "phone": "555" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phone"], "555");

    let (status, _) = ctx
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "marta@sellos-g.com", "password": "marta-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.delete(&format!("/api/employees/{}", id), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = ctx.get("/api/employees", Some(&admin)).await;
    assert_eq!(list, json!([]));
}
