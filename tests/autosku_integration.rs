use commerce_autosku::config::AppConfig;
use commerce_autosku::{build_app, build_context, load_seed_data, MemoryStore};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

const ADMIN_PERMISSION: &str = "administer commerce_product_variation_type SKU";
const SETTINGS_PATH: &str = "/admin/commerce/config/product-variation-types/default/auto-sku";

// Test client wrapper for making API calls
struct TestClient {
    client: Client,
    base_url: String,
}

impl TestClient {
    fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn post(&self, path: &str, json: Value) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(&format!("{}{}", self.base_url, path))
            .json(&json)
            .send()
            .await
    }

    async fn put(&self, path: &str, json: Value) -> reqwest::Result<reqwest::Response> {
        self.client
            .put(&format!("{}{}", self.base_url, path))
            .json(&json)
            .send()
            .await
    }

    async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(&format!("{}{}", self.base_url, path))
            .send()
            .await
    }

    async fn delete(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .delete(&format!("{}{}", self.base_url, path))
            .send()
            .await
    }

    async fn get_as_admin(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(&format!("{}{}", self.base_url, path))
            .header("X-User-Id", "1")
            .header("X-User-Name", "admin")
            .header("X-User-Permissions", ADMIN_PERMISSION)
            .send()
            .await
    }

    async fn post_as_admin(&self, path: &str, json: Value) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(&format!("{}{}", self.base_url, path))
            .header("X-User-Id", "1")
            .header("X-User-Name", "admin")
            .header("X-User-Permissions", ADMIN_PERMISSION)
            .json(&json)
            .send()
            .await
    }

    async fn configure(&self, mode: &str, pattern: &str) {
        let response = self
            .post_as_admin(
                SETTINGS_PATH,
                json!({"mode": mode, "plugin": "token", "configuration": {"pattern": pattern}}),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

/// Serves the app over the in-memory store on an ephemeral port.
async fn spawn_server() -> TestClient {
    let store = Arc::new(MemoryStore::new());
    load_seed_data(store.as_ref()).await.unwrap();
    let app = build_app(build_context(store, &AppConfig::default()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestClient::new(format!("http://{}", address))
}

#[tokio::test]
async fn test_health_and_metadata() {
    let client = spawn_server().await;

    let response = client.get("/health").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let generators: Value = client.get("/generators").await.unwrap().json().await.unwrap();
    assert_eq!(generators["items"], json!([{"id": "token", "label": "Token"}]));

    let permissions: Value = client.get("/permissions").await.unwrap().json().await.unwrap();
    assert_eq!(permissions["total"], json!(1));
    assert_eq!(permissions["items"][0]["name"], json!(ADMIN_PERMISSION));
    assert_eq!(
        permissions["items"][0]["title"],
        json!("Product variation type: Administer automatic SKU")
    );

    let tasks: Value = client.get("/local-tasks").await.unwrap().json().await.unwrap();
    assert_eq!(
        tasks["items"][0]["id"],
        json!("commerce_product_variation_type.auto_sku_tab")
    );
    assert_eq!(tasks["items"][0]["weight"], json!(100));
}

#[tokio::test]
async fn test_settings_form_requires_permission() {
    let client = spawn_server().await;

    let anonymous = client.get(SETTINGS_PATH).await.unwrap();
    assert_eq!(anonymous.status(), StatusCode::FORBIDDEN);

    let submit = client
        .post(SETTINGS_PATH, json!({"mode": "enabled", "plugin": "token"}))
        .await
        .unwrap();
    assert_eq!(submit.status(), StatusCode::FORBIDDEN);

    let admin = client.get_as_admin(SETTINGS_PATH).await.unwrap();
    assert_eq!(admin.status(), StatusCode::OK);
    let form: Value = admin.json().await.unwrap();
    assert_eq!(form["form_id"], json!("commerce_autosku_settings_form"));
    assert_eq!(form["mode"]["default_value"], json!("disabled"));
}

#[tokio::test]
async fn test_reserved_system_id_is_not_privileged() {
    let client = spawn_server().await;

    let response = client
        .client
        .post(&format!("{}{}", client.base_url, SETTINGS_PATH))
        .header("X-User-Id", "system")
        .json(&json!({"mode": "enabled", "plugin": "token"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let form: Value = client.get_as_admin(SETTINGS_PATH).await.unwrap().json().await.unwrap();
    assert_eq!(form["mode"]["default_value"], json!("disabled"));
}

#[tokio::test]
async fn test_settings_form_unknown_bundle() {
    let client = spawn_server().await;
    let response = client
        .get_as_admin("/admin/commerce/config/product-variation-types/missing/auto-sku")
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_settings_are_rejected() {
    let client = spawn_server().await;

    let response = client
        .post_as_admin(
            SETTINGS_PATH,
            json!({"mode": "enabled", "plugin": "token", "configuration": {"pattern": "NO-TOKENS"}}),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["field_errors"]["configuration.pattern"],
        json!("At least one token from available tokens list required")
    );

    // Nothing was stored
    let form: Value = client.get_as_admin(SETTINGS_PATH).await.unwrap().json().await.unwrap();
    assert_eq!(form["mode"]["default_value"], json!("disabled"));
}

#[tokio::test]
async fn test_disabled_mode_requires_manual_sku() {
    let client = spawn_server().await;

    let missing = client
        .post("/variations", json!({"bundle": "default", "title": "Shirt"}))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let manual = client
        .post(
            "/variations",
            json!({"bundle": "default", "title": "Shirt", "sku": "SHIRT-1"}),
        )
        .await
        .unwrap();
    assert_eq!(manual.status(), StatusCode::CREATED);

    let duplicate = client
        .post(
            "/variations",
            json!({"bundle": "default", "title": "Other", "sku": "SHIRT-1"}),
        )
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_generated_skus_are_unique() {
    let client = spawn_server().await;
    client
        .configure("enabled", "[commerce_product_variation:product:title]")
        .await;

    let mut skus = Vec::new();
    for size in ["S", "M", "L"] {
        let response = client
            .post(
                "/variations",
                json!({
                    "bundle": "default",
                    "title": format!("Blue Shirt {}", size),
                    "product": {"id": 1, "title": "Blue Shirt"}
                }),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let variation: Value = response.json().await.unwrap();
        skus.push(variation["sku"].as_str().unwrap().to_string());
    }

    assert_eq!(skus, vec!["Blue Shirt", "Blue Shirt_0", "Blue Shirt_1"]);
}

#[tokio::test]
async fn test_markup_only_sku_falls_back_to_bundle_label() {
    let client = spawn_server().await;
    client
        .configure("enabled", "<b>[commerce_product_variation:product:title]</b>")
        .await;

    let response = client
        .post("/variations", json!({"bundle": "default", "title": "Shirt"}))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let variation: Value = response.json().await.unwrap();
    assert_eq!(variation["sku"], json!("Default"));
}

#[tokio::test]
async fn test_empty_pattern_uses_bundle_label_and_id() {
    let client = spawn_server().await;

    let created: Value = client
        .post(
            "/variations",
            json!({"bundle": "default", "title": "Shirt", "sku": "TEMP"}),
        )
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_i64().unwrap();

    client.configure("enabled", "").await;

    let response = client
        .put(
            &format!("/variations/{}", id),
            json!({"bundle": "default", "title": "Shirt", "sku": "TEMP"}),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["sku"], json!(format!("Default {}", id)));
}

#[tokio::test]
async fn test_optional_mode_keeps_entered_sku() {
    let client = spawn_server().await;
    client
        .configure("optional", "[commerce_product_variation:title]-[site:name]")
        .await;

    let manual: Value = client
        .post(
            "/variations",
            json!({"bundle": "default", "title": "Mug", "sku": "MUG-RED"}),
        )
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(manual["sku"], json!("MUG-RED"));

    let generated: Value = client
        .post("/variations", json!({"bundle": "default", "title": "Mug"}))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(generated["sku"], json!("Mug-Commerce"));
}

#[tokio::test]
async fn test_evaluated_pattern_through_api() {
    let client = spawn_server().await;
    let response = client
        .post_as_admin(
            SETTINGS_PATH,
            json!({
                "mode": "enabled",
                "plugin": "token",
                "configuration": {
                    "pattern": "{{ upper([commerce_product_variation:attribute_color]) }}-[user:name]",
                    "evaluate": true
                }
            }),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let created: Value = client
        .client
        .post(&format!("{}/variations", client.base_url))
        .header("X-User-Id", "5")
        .header("X-User-Name", "editor")
        .json(&json!({"bundle": "default", "title": "Cap", "attributes": {"color": "red"}}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(created["sku"], json!("RED-editor"));
}

#[tokio::test]
async fn test_variation_lifecycle() {
    let client = spawn_server().await;

    let created: Value = client
        .post(
            "/variations",
            json!({"bundle": "default", "title": "Sock", "sku": "SOCK"}),
        )
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let path = format!("/variations/{}", created["id"]);

    let fetched: Value = client.get(&path).await.unwrap().json().await.unwrap();
    assert_eq!(fetched["sku"], json!("SOCK"));

    assert_eq!(client.delete(&path).await.unwrap().status(), StatusCode::NO_CONTENT);
    assert_eq!(client.get(&path).await.unwrap().status(), StatusCode::NOT_FOUND);

    // Writes always target product variations, whatever the body claims
    let response = client
        .post(
            "/variations",
            json!({"entity_type": "commerce_product", "bundle": "default", "title": "Hat", "sku": "HAT-1"}),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let hat: Value = response.json().await.unwrap();
    assert_eq!(hat["entity_type"], json!("commerce_product_variation"));
    let hat_path = format!("/variations/{}", hat["id"]);

    let renamed = client
        .put(
            &hat_path,
            json!({"entity_type": "commerce_product_variation_type", "bundle": "default", "title": "Cap", "sku": "HAT-1"}),
        )
        .await
        .unwrap();
    assert_eq!(renamed.status(), StatusCode::OK);

    let fetched: Value = client.get(&hat_path).await.unwrap().json().await.unwrap();
    assert_eq!(fetched["title"], json!("Cap"));
    assert_eq!(fetched["entity_type"], json!("commerce_product_variation"));

    let unknown_bundle = client
        .post("/variations", json!({"bundle": "nope", "title": "Sock", "sku": "X"}))
        .await
        .unwrap();
    assert_eq!(unknown_bundle.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_variation_types() {
    let client = spawn_server().await;

    let response = client
        .post("/variation-types", json!({"id": "apparel", "label": "Apparel"}))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let types: Value = client.get("/variation-types").await.unwrap().json().await.unwrap();
    assert_eq!(types["total"], json!(2));

    let apparel: Value = client
        .get("/variation-types/apparel")
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(apparel["label"], json!("Apparel"));

    assert_eq!(
        client.get("/variation-types/none").await.unwrap().status(),
        StatusCode::NOT_FOUND
    );
}
