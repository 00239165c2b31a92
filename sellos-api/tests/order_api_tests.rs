/// Integration tests for the order, catalogue and notification endpoints
///
/// Run with: cargo test -p sellos-api --test order_api_tests

mod common;

use axum::http::StatusCode;
use common::{money, TestContext};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

struct Shop {
    ctx: TestContext,
    admin: String,
    employee_id: Uuid,
    employee: String,
    other_employee: String,
    customer_id: Uuid,
    customer: String,
    other_customer: String,
    p1: Uuid,
    p2: Uuid,
}

async fn shop() -> Shop {
    let ctx = TestContext::new();
    let (_, admin) = ctx.admin().await;
    let (employee_identity, employee) = ctx.employee("e1@sellos-g.com").await;
    let (_, other_employee) = ctx.employee("e2@sellos-g.com").await;
    let (customer_identity, customer) = ctx.customer("c1@x.com").await;
    let (_, other_customer) = ctx.customer("c2@x.com").await;

    let p1 = ctx
        .product("Sello redondo", Decimal::new(1500, 2), Some(Decimal::from(10)))
        .await;
    let p2 = ctx.product("Tampón", Decimal::new(450, 2), None).await;

    Shop {
        admin,
        employee_id: employee_identity.id,
        employee,
        other_employee,
        customer_id: customer_identity.id,
        customer,
        other_customer,
        p1: p1.id,
        p2: p2.id,
        ctx,
    }
}

impl Shop {
    async fn create_order(&self, lines: Value) -> (StatusCode, Value) {
        self.ctx
            .post(
                "/api/orders",
                Some(&self.admin),
                json!({
                    "customer_id": self.customer_id,
                    "assigned_staff_id": self.employee_id,
                    "line_items": lines,
                    "staff_note": "Logo en tinta azul",
                    "delivery_date": "2026-11-02"
                }),
            )
            .await
    }
}

#[tokio::test]
async fn test_order_priced_at_effective_price() {
    let shop = shop().await;

    let (status, order) = shop
        .create_order(json!([{ "product_id": shop.p1, "quantity": 3 }]))
        .await;

    assert_eq!(status, StatusCode::CREATED, "{}", order);
    assert_eq!(money(&order["total"]), Decimal::from(30));
    assert_eq!(order["status"], "pending");
    assert_eq!(order["delivery_date"], "2026-11-02");

    let lines = order["line_items"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(money(&lines[0]["unit_price"]), Decimal::from(10));
    assert_eq!(money(&lines[0]["subtotal"]), Decimal::from(30));
    assert_eq!(order["customer"]["email"], "c1@x.com");
}

#[tokio::test]
async fn test_order_total_is_sum_of_lines() {
    let shop = shop().await;

    let (status, order) = shop
        .create_order(json!([
            { "product_id": shop.p1, "quantity": 2 },
            { "product_id": shop.p2, "quantity": 3 }
        ]))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(money(&order["total"]), Decimal::new(3350, 2));
}

#[tokio::test]
async fn test_unknown_product_persists_nothing() {
    let shop = shop().await;
    let missing = Uuid::new_v4();

    let (status, body) = shop
        .create_order(json!([
            { "product_id": shop.p1, "quantity": 1 },
            { "product_id": missing, "quantity": 1 }
        ]))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], format!("Product {} not found", missing));

    let (_, all) = shop.ctx.get("/api/orders", Some(&shop.admin)).await;
    assert_eq!(all, json!([]));
    let (_, unread) = shop.ctx.get("/api/notifications/unread", Some(&shop.admin)).await;
    assert_eq!(unread, json!([]));
}

#[tokio::test]
async fn test_create_rejects_bad_input() {
    let shop = shop().await;

    let (status, _) = shop.create_order(json!([])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = shop
        .create_order(json!([{ "product_id": shop.p1, "quantity": 0 }]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = shop
        .ctx
        .post(
            "/api/orders",
            Some(&shop.admin),
            json!({
                "customer_id": Uuid::new_v4(),
                "line_items": [{ "product_id": shop.p1, "quantity": 1 }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Customer not found");
}

#[tokio::test]
async fn test_price_change_does_not_touch_existing_orders() {
    let shop = shop().await;
    let (_, order) = shop
        .create_order(json!([{ "product_id": shop.p1, "quantity": 3 }]))
        .await;

    let (status, _) = shop
        .ctx
        .put(
            &format!("/api/products/{}", shop.p1),
            Some(&shop.employee),
            json!({ "current_price": null }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, fetched) = shop
        .ctx
        .get(&format!("/api/orders/{}", order["id"].as_str().unwrap()), Some(&shop.admin))
        .await;
    assert_eq!(money(&fetched["total"]), Decimal::from(30));
}

#[tokio::test]
async fn test_full_update_reprices_lines() {
    let shop = shop().await;
    let (_, order) = shop
        .create_order(json!([{ "product_id": shop.p1, "quantity": 3 }]))
        .await;
    let uri = format!("/api/orders/{}", order["id"].as_str().unwrap());

    let (status, updated) = shop
        .ctx
        .put(
            &uri,
            Some(&shop.admin),
            json!({
                "line_items": [{ "product_id": shop.p2, "quantity": 4 }],
                "status": "in_progress",
                "assigned_staff_id": null
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(money(&updated["total"]), Decimal::from(18));
    assert_eq!(updated["status"], "in_progress");
    assert!(updated["assigned_staff_id"].is_null());
    assert_eq!(updated["staff_note"], "Logo en tinta azul");

    // Empty line list keeps the current lines
    let (status, kept) = shop
        .ctx
        .put(&uri, Some(&shop.admin), json!({ "line_items": [], "staff_note": "Urgente" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(money(&kept["total"]), Decimal::from(18));
    assert_eq!(kept["staff_note"], "Urgente");

    let (status, cleared) = shop
        .ctx
        .put(&uri, Some(&shop.admin), json!({ "staff_note": null }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["staff_note"].is_null());
    assert_eq!(money(&cleared["total"]), Decimal::from(18));

    let (status, _) = shop
        .ctx
        .put(&uri, Some(&shop.admin), json!({ "status": "shipped" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = shop
        .ctx
        .put(
            &format!("/api/orders/{}", Uuid::new_v4()),
            Some(&shop.admin),
            json!({ "staff_note": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_update_requires_assignee() {
    let shop = shop().await;
    let (_, order) = shop
        .create_order(json!([{ "product_id": shop.p1, "quantity": 1 }]))
        .await;
    let uri = format!("/api/orders/{}/status", order["id"].as_str().unwrap());

    let (status, _) = shop
        .ctx
        .patch(&uri, Some(&shop.other_employee), json!({ "status": "completed" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = shop
        .ctx
        .patch(&uri, Some(&shop.admin), json!({ "status": "completed" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = shop
        .ctx
        .patch(&uri, Some(&shop.customer), json!({ "status": "completed" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, unchanged) = shop
        .ctx
        .get(&format!("/api/orders/{}", order["id"].as_str().unwrap()), Some(&shop.admin))
        .await;
    assert_eq!(unchanged["status"], "pending");

    let (status, body) = shop
        .ctx
        .patch(&uri, Some(&shop.employee), json!({ "status": "completed" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");

    // No transition graph: completed can go back to pending
    let (status, body) = shop
        .ctx
        .patch(&uri, Some(&shop.employee), json!({ "status": "pending" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");

    let (status, _) = shop
        .ctx
        .patch(&uri, Some(&shop.employee), json!({ "status": "lost" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = format!("/api/orders/{}/status", Uuid::new_v4());
    let (status, _) = shop
        .ctx
        .patch(&missing, Some(&shop.employee), json!({ "status": "completed" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_scoped_listings_and_detail() {
    let shop = shop().await;
    let (_, order) = shop
        .create_order(json!([{ "product_id": shop.p1, "quantity": 1 }]))
        .await;
    let detail = format!("/api/orders/{}", order["id"].as_str().unwrap());

    let (_, mine) = shop.ctx.get("/api/orders/mine", Some(&shop.customer)).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (_, theirs) = shop.ctx.get("/api/orders/mine", Some(&shop.other_customer)).await;
    assert_eq!(theirs, json!([]));

    let (_, assigned) = shop.ctx.get("/api/orders/assigned", Some(&shop.employee)).await;
    assert_eq!(assigned.as_array().unwrap().len(), 1);

    let (_, not_assigned) = shop
        .ctx
        .get("/api/orders/assigned", Some(&shop.other_employee))
        .await;
    assert_eq!(not_assigned, json!([]));

    let (status, _) = shop.ctx.get(&detail, Some(&shop.customer)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = shop.ctx.get(&detail, Some(&shop.employee)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = shop.ctx.get(&detail, Some(&shop.other_customer)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = shop.ctx.get(&detail, Some(&shop.other_employee)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_listing_is_newest_first() {
    let shop = shop().await;
    let (_, first) = shop
        .create_order(json!([{ "product_id": shop.p1, "quantity": 1 }]))
        .await;
    let (_, second) = shop
        .create_order(json!([{ "product_id": shop.p2, "quantity": 1 }]))
        .await;

    let (_, all) = shop.ctx.get("/api/orders", Some(&shop.admin)).await;
    let ids: Vec<&Value> = all.as_array().unwrap().iter().map(|o| &o["id"]).collect();
    assert_eq!(ids, vec![&second["id"], &first["id"]]);
}

#[tokio::test]
async fn test_delete_order() {
    let shop = shop().await;
    let (_, order) = shop
        .create_order(json!([{ "product_id": shop.p1, "quantity": 1 }]))
        .await;
    let uri = format!("/api/orders/{}", order["id"].as_str().unwrap());

    let (status, _) = shop.ctx.delete(&uri, Some(&shop.employee)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = shop.ctx.delete(&uri, Some(&shop.admin)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = shop.ctx.delete(&uri, Some(&shop.admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_creation_notifies_admins() {
    let shop = shop().await;
    let (_, order) = shop
        .create_order(json!([{ "product_id": shop.p1, "quantity": 1 }]))
        .await;

    let (status, unread) = shop.ctx.get("/api/notifications/unread", Some(&shop.admin)).await;
    assert_eq!(status, StatusCode::OK);
    let unread = unread.as_array().unwrap().clone();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0]["order_id"], order["id"]);
    assert_eq!(unread[0]["read"], false);

    let id = unread[0]["id"].as_str().unwrap();
    let (status, read) = shop
        .ctx
        .patch(&format!("/api/notifications/{}/read", id), Some(&shop.admin), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["read"], true);

    shop.create_order(json!([{ "product_id": shop.p2, "quantity": 1 }])).await;
    let (status, body) = shop
        .ctx
        .patch("/api/notifications/read-all", Some(&shop.admin), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);

    let (_, unread) = shop.ctx.get("/api/notifications/unread", Some(&shop.admin)).await;
    assert_eq!(unread, json!([]));
    let (_, all) = shop.ctx.get("/api/notifications", Some(&shop.admin)).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (status, _) = shop
        .ctx
        .delete(&format!("/api/notifications/{}", id), Some(&shop.admin))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_catalogue_reads_are_public() {
    let shop = shop().await;

    let (status, list) = shop.ctx.get("/api/products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);

    let (status, found) = shop.ctx.get("/api/products/search/SELLO", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["name"], "Sello redondo");

    let (status, _) = shop
        .ctx
        .get(&format!("/api/products/{}", Uuid::new_v4()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalogue_writes_need_staff() {
    let shop = shop().await;
    let product = json!({ "name": "Sello fechador", "base_price": "22.00" });

    let (status, _) = shop.ctx.post("/api/products", None, product.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = shop
        .ctx
        .post("/api/products", Some(&shop.customer), product.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = shop
        .ctx
        .post("/api/products", Some(&shop.employee), product)
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["available"], true);

    let (status, _) = shop
        .ctx
        .post(
            "/api/products",
            Some(&shop.admin),
            json!({ "name": "Gratis", "base_price": "-1" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let uri = format!("/api/products/{}", created["id"].as_str().unwrap());
    let (status, _) = shop.ctx.delete(&uri, Some(&shop.admin)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_catalogue_rejects_prices_beyond_column() {
    let shop = shop().await;

    let (status, body) = shop
        .ctx
        .post(
            "/api/products",
            Some(&shop.admin),
            json!({ "name": "Sello de oro", "base_price": "10000000000" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "base_price");

    let (status, _) = shop
        .ctx
        .put(
            &format!("/api/products/{}", shop.p1),
            Some(&shop.admin),
            json!({ "current_price": "99999999999.00" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = shop
        .ctx
        .post(
            "/api/products",
            Some(&shop.admin),
            json!({ "name": "Prensa", "base_price": "9999999999.99" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_order_quantity_out_of_range_is_bad_request() {
    let shop = shop().await;

    let (status, _) = shop
        .create_order(json!([{ "product_id": shop.p1, "quantity": 2_000_000_000 }]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, all) = shop.ctx.get("/api/orders", Some(&shop.admin)).await;
    assert_eq!(all, json!([]));
}
