//! End-to-end tests over the HTTP router with an in-memory database.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use moto_core::{Organization, Role};
use moto_db::{Database, DbConfig};
use moto_server::{build_router, AppState, ServerConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "admin@motos.test";
const SELLER_EMAIL: &str = "ventas@motos.test";
const OTHER_ADMIN_EMAIL: &str = "admin@norte.test";
const PASSWORD: &str = "moto-secret-1";

struct TestApp {
    router: Router,
    db: Database,
    org: Organization,
}

async fn setup() -> TestApp {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let org = db
        .organizations()
        .create("Motos del Sur", "motos-del-sur")
        .await
        .unwrap();
    db.users()
        .create(&org.id, ADMIN_EMAIL, "Ana Admin", Role::Admin, PASSWORD)
        .await
        .unwrap();
    db.users()
        .create(&org.id, SELLER_EMAIL, "Sergio Ventas", Role::Seller, PASSWORD)
        .await
        .unwrap();

    let state = AppState::new(db.clone(), ServerConfig::default());
    TestApp {
        router: build_router(state),
        db,
        org,
    }
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn json(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.send(method, uri, token, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .json(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// A second organization with its own admin; returns that admin's token.
    async fn other_organization(&self) -> String {
        let org = self
            .db
            .organizations()
            .create("Motos del Norte", "motos-del-norte")
            .await
            .unwrap();
        self.db
            .users()
            .create(&org.id, OTHER_ADMIN_EMAIL, "Nora Norte", Role::Admin, PASSWORD)
            .await
            .unwrap();
        self.login(OTHER_ADMIN_EMAIL).await
    }

    async fn new_client(&self, token: &str, first_name: &str) -> String {
        let (status, client) = self
            .json(
                "POST",
                "/api/clients",
                Some(token),
                Some(json!({ "firstName": first_name, "lastName": "Gómez" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{client}");
        client["id"].as_str().unwrap().to_string()
    }

    async fn color_names(&self, token: &str) -> Vec<String> {
        let (status, colors) = self.json("GET", "/api/colors", Some(token), None).await;
        assert_eq!(status, StatusCode::OK, "{colors}");
        colors
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap().to_string())
            .collect()
    }

    /// Brand, model and one in-stock unit priced at 1,000,000 cents.
    async fn stock_unit(&self, token: &str) -> String {
        let (status, brand) = self
            .json("POST", "/api/brands", Some(token), Some(json!({ "name": "Honda" })))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{brand}");
        let brand_id = brand["brandId"].as_str().unwrap().to_string();

        let (status, model) = self
            .json(
                "POST",
                &format!("/api/brands/{brand_id}/models"),
                Some(token),
                Some(json!({ "name": "CB 190R", "year": 2024 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{model}");

        let (status, moto) = self
            .json(
                "POST",
                "/api/motorcycles",
                Some(token),
                Some(json!({
                    "brandId": brand_id,
                    "modelId": model["modelId"],
                    "year": 2024,
                    "chassisNumber": "9C2KD0810RR000001",
                    "retailPriceCents": 1_000_000,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{moto}");
        moto["id"].as_str().unwrap().to_string()
    }
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_health_reports_database() {
    let app = setup().await;
    let (status, body) = app.json("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_login_and_me() {
    let app = setup().await;
    let token = app.login(ADMIN_EMAIL).await;

    let (status, me) = app.json("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], ADMIN_EMAIL);
    assert_eq!(me["organizationId"], app.org.id.as_str());
    assert!(me.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let app = setup().await;
    let (status, body) = app
        .json(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": ADMIN_EMAIL, "password": "not-the-password" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let app = setup().await;

    let (status, _) = app.json("GET", "/api/clients", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.json("GET", "/api/clients", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_seller_cannot_configure() {
    let app = setup().await;
    let token = app.login(SELLER_EMAIL).await;

    let (status, body) = app
        .json(
            "POST",
            "/api/colors",
            Some(&token),
            Some(json!({ "name": "Rojo", "hex": "#CC0000" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    // Reading configuration is fine.
    let (status, _) = app.json("GET", "/api/colors", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Clients
// =============================================================================

#[tokio::test]
async fn test_client_crud() {
    let app = setup().await;
    let token = app.login(SELLER_EMAIL).await;

    let (status, client) = app
        .json(
            "POST",
            "/api/clients",
            Some(&token),
            Some(json!({
                "firstName": "Juan",
                "lastName": "Pérez",
                "documentType": "dni",
                "documentNumber": "30.123.456",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{client}");
    assert_eq!(client["documentNumber"], "30123456");
    let id = client["id"].as_str().unwrap().to_string();

    let (status, page) = app
        .json("GET", "/api/clients?search=juan&perPage=10", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], id.as_str());

    let (status, updated) = app
        .json(
            "PUT",
            &format!("/api/clients/{id}"),
            Some(&token),
            Some(json!({
                "firstName": "Juan Carlos",
                "lastName": "Pérez",
                "expectedVersion": client["version"],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["firstName"], "Juan Carlos");

    // Same stale version again.
    let (status, body) = app
        .json(
            "PUT",
            &format!("/api/clients/{id}"),
            Some(&token),
            Some(json!({
                "firstName": "Juan",
                "lastName": "Pérez",
                "expectedVersion": client["version"],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, _) = app
        .json("DELETE", &format!("/api/clients/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .json("GET", &format!("/api/clients/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_client_validation_error() {
    let app = setup().await;
    let token = app.login(SELLER_EMAIL).await;

    let (status, body) = app
        .json(
            "POST",
            "/api/clients",
            Some(&token),
            Some(json!({ "firstName": "", "lastName": "Pérez" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_bad_sort_key_is_rejected() {
    let app = setup().await;
    let token = app.login(SELLER_EMAIL).await;

    let (status, _) = app
        .json("GET", "/api/clients?sort=password", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Ordering
// =============================================================================

#[tokio::test]
async fn test_reorder_colors() {
    let app = setup().await;
    let token = app.login(ADMIN_EMAIL).await;

    let mut ids = Vec::new();
    for (name, hex) in [("Rojo", "#CC0000"), ("Negro", "#000000"), ("Blanco", "#FFFFFF")] {
        let (status, color) = app
            .json(
                "POST",
                "/api/colors",
                Some(&token),
                Some(json!({ "name": name, "hex": hex })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{color}");
        ids.push(color["id"].as_str().unwrap().to_string());
    }

    // Drag "Blanco" to the top.
    let (status, colors) = app
        .json(
            "PUT",
            "/api/colors/order",
            Some(&token),
            Some(json!({ "id": ids[2], "toIndex": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{colors}");
    let names: Vec<&str> = colors
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Blanco", "Rojo", "Negro"]);

    // A full list missing one id is stale.
    let (status, _) = app
        .json(
            "PUT",
            "/api/colors/order",
            Some(&token),
            Some(json!({ "ids": [ids[0], ids[1]] })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// =============================================================================
// Inventory
// =============================================================================

#[tokio::test]
async fn test_motorcycle_reserve_and_sell() {
    let app = setup().await;
    let token = app.login(ADMIN_EMAIL).await;
    let moto_id = app.stock_unit(&token).await;

    let (_, client) = app
        .json(
            "POST",
            "/api/clients",
            Some(&token),
            Some(json!({ "firstName": "Lucía", "lastName": "Gómez" })),
        )
        .await;
    let client_id = client["id"].as_str().unwrap().to_string();

    let (status, reservation) = app
        .json(
            "POST",
            &format!("/api/motorcycles/{moto_id}/reserve"),
            Some(&token),
            Some(json!({ "clientId": client_id, "amountCents": 50_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{reservation}");

    let (_, summary) = app
        .json("GET", "/api/motorcycles/summary", Some(&token), None)
        .await;
    assert!(summary
        .as_array()
        .unwrap()
        .iter()
        .any(|s| s["state"] == "reserved" && s["count"] == 1));

    let (status, sale) = app
        .json(
            "POST",
            &format!("/api/motorcycles/{moto_id}/sell"),
            Some(&token),
            Some(json!({ "clientId": client_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{sale}");
    assert_eq!(sale["totalCents"], 1_000_000);

    // Sold is terminal for the state endpoint.
    let (status, body) = app
        .json(
            "POST",
            &format!("/api/motorcycles/{moto_id}/state"),
            Some(&token),
            Some(json!({ "state": "in_stock" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    assert_eq!(body["code"], "BUSINESS_RULE");
}

// =============================================================================
// Financing & Quotes
// =============================================================================

#[tokio::test]
async fn test_financing_schedule() {
    let app = setup().await;
    let token = app.login(SELLER_EMAIL).await;

    let (status, body) = app
        .json(
            "POST",
            "/api/financing/schedule",
            Some(&token),
            Some(json!({ "principal": 100_000, "annualRate": 1200, "installments": 12 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["schedule"]["installmentAmount"], 8_885);
    assert_eq!(body["schedule"]["rows"].as_array().unwrap().len(), 12);
    assert_eq!(body["schedule"]["rows"][11]["balance"], 0);
}

#[tokio::test]
async fn test_financing_rejects_too_many_installments() {
    let app = setup().await;
    let token = app.login(SELLER_EMAIL).await;

    let (status, _) = app
        .json(
            "POST",
            "/api/financing/schedule",
            Some(&token),
            Some(json!({ "principal": 100_000, "annualRate": 1200, "installments": 1000 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quote_json_and_html() {
    let app = setup().await;
    let token = app.login(ADMIN_EMAIL).await;
    let moto_id = app.stock_unit(&token).await;

    let request = json!({
        "motorcycleId": moto_id,
        "downPaymentCents": 200_000,
        "financing": { "installments": 12, "annualRateBps": 4500 },
    });

    let (status, quote) = app
        .json("POST", "/api/quotes", Some(&token), Some(request.clone()))
        .await;
    assert_eq!(status, StatusCode::OK, "{quote}");
    assert_eq!(quote["description"], "Honda CB 190R 2024");
    assert_eq!(quote["total"], 1_000_000);
    assert_eq!(quote["financedAmount"], 800_000);
    assert_eq!(quote["financing"]["schedule"]["rows"].as_array().unwrap().len(), 12);

    let (status, bytes) = app
        .send("POST", "/api/quotes/html", Some(&token), Some(request))
        .await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(bytes).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("Motos del Sur"));
    assert!(html.contains("Honda CB 190R 2024"));
}

#[tokio::test]
async fn test_quote_for_unknown_motorcycle() {
    let app = setup().await;
    let token = app.login(SELLER_EMAIL).await;

    let (status, _) = app
        .json(
            "POST",
            "/api/quotes",
            Some(&token),
            Some(json!({ "motorcycleId": "00000000-0000-4000-8000-000000000000" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_financing_rejects_principal_over_cap() {
    let app = setup().await;
    let token = app.login(SELLER_EMAIL).await;

    let (status, body) = app
        .json(
            "POST",
            "/api/financing/schedule",
            Some(&token),
            Some(json!({
                "principal": i64::MAX / 2,
                "annualRate": moto_core::MAX_RATE_BPS,
                "installments": 120,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = app
        .json(
            "POST",
            "/api/financing/schedule",
            Some(&token),
            Some(json!({
                "principal": moto_core::MAX_PRICE_CENTS,
                "annualRate": moto_core::MAX_RATE_BPS,
                "installments": 120,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["schedule"]["rows"][119]["balance"], 0);
}

// =============================================================================
// Organization Isolation
// =============================================================================

#[tokio::test]
async fn test_organizations_cannot_touch_each_other() {
    let app = setup().await;
    let token = app.login(ADMIN_EMAIL).await;
    let moto_id = app.stock_unit(&token).await;
    let client_id = app.new_client(&token, "Lucía").await;

    let mut color_ids = Vec::new();
    for (name, hex) in [("Rojo", "#CC0000"), ("Negro", "#000000")] {
        let (status, color) = app
            .json(
                "POST",
                "/api/colors",
                Some(&token),
                Some(json!({ "name": name, "hex": hex })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{color}");
        color_ids.push(color["id"].as_str().unwrap().to_string());
    }

    let other = app.other_organization().await;
    let other_client = app.new_client(&other, "Bruno").await;

    // Inventory of the first organization is invisible to the second.
    let (status, _) = app
        .json("GET", &format!("/api/motorcycles/{moto_id}"), Some(&other), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .json(
            "POST",
            &format!("/api/motorcycles/{moto_id}/reserve"),
            Some(&other),
            Some(json!({ "clientId": other_client, "amountCents": 10_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .json(
            "POST",
            &format!("/api/motorcycles/{moto_id}/sell"),
            Some(&other),
            Some(json!({ "clientId": other_client })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .json(
            "POST",
            &format!("/api/motorcycles/{moto_id}/state"),
            Some(&other),
            Some(json!({ "state": "paused" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .json(
            "POST",
            "/api/quotes",
            Some(&other),
            Some(json!({ "motorcycleId": moto_id })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, moto) = app
        .json("GET", &format!("/api/motorcycles/{moto_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moto["state"], "in_stock");
    assert_eq!(moto["clientId"], Value::Null);

    // Reservations and sales are scoped too.
    let (status, reservation) = app
        .json(
            "POST",
            &format!("/api/motorcycles/{moto_id}/reserve"),
            Some(&token),
            Some(json!({ "clientId": client_id, "amountCents": 50_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{reservation}");
    let reservation_id = reservation["id"].as_str().unwrap();

    let (status, _) = app
        .json("GET", &format!("/api/reservations/{reservation_id}"), Some(&other), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .json(
            "POST",
            &format!("/api/reservations/{reservation_id}/cancel"),
            Some(&other),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, sale) = app
        .json(
            "POST",
            &format!("/api/motorcycles/{moto_id}/sell"),
            Some(&token),
            Some(json!({ "clientId": client_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{sale}");
    let sale_id = sale["id"].as_str().unwrap();

    let (status, _) = app
        .json("GET", &format!("/api/sales/{sale_id}"), Some(&other), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .json("GET", &format!("/api/clients/{client_id}/sales"), Some(&other), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, sales) = app.json("GET", "/api/sales", Some(&other), None).await;
    assert_eq!(sales["total"], 0);

    let (status, history) = app
        .json("GET", &format!("/api/clients/{client_id}/sales"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["id"], sale_id);

    // Reordering with foreign ids is stale and changes nothing.
    let (status, _) = app
        .json(
            "POST",
            "/api/colors",
            Some(&other),
            Some(json!({ "name": "Azul", "hex": "#0000CC" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .json(
            "PUT",
            "/api/colors/order",
            Some(&other),
            Some(json!({ "ids": [color_ids[1], color_ids[0]] })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .json(
            "PUT",
            "/api/colors/order",
            Some(&other),
            Some(json!({ "id": color_ids[1], "toIndex": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    assert_eq!(app.color_names(&token).await, ["Rojo", "Negro"]);
    assert_eq!(app.color_names(&other).await, ["Azul"]);
}
