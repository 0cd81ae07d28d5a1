use std::time::Duration;

use boutique_server::{AppState, construct_app_state, infra::get_config_settings, start_server};
use camino::Utf8PathBuf;
use serde_json::{Value, json};
use sqlx::postgres::PgConnectOptions;
use tempfile::TempDir;
use uuid::Uuid;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

pub struct TestServer {
    pub app_state: AppState,
    pub client: httpc_test::Client,
    pub gateway: MockServer,
    // Held so the cart files outlive the server.
    _carts_directory: TempDir,
}

/// Starts the full service against the test database, a fresh cart directory and a mock
/// payment gateway, and waits until it answers.
pub async fn start_test_server(connect_options: PgConnectOptions) -> TestServer {
    let gateway = MockServer::start().await;
    let carts_directory = tempfile::tempdir().expect("Temp dir should be created.");

    let mut settings = get_config_settings().expect("Could not read application configuration.");
    settings.database.database_name = connect_options
        .get_database()
        .expect("Expected database name.")
        .into();
    settings.payments.base_url = gateway.uri();
    settings.application.carts_directory =
        Utf8PathBuf::try_from(carts_directory.path().to_path_buf())
            .expect("Temp dir should be utf8.");

    let app_state = construct_app_state(settings)
        .await
        .expect("Expected AppState to be created.");
    tokio::task::spawn(start_server(app_state.clone()));

    let url = format!("http://{}", app_state.settings.application.address());
    let client = httpc_test::new_client(url).expect("Expected client to be created.");
    wait_until_ready(&client).await;

    TestServer {
        app_state,
        client,
        gateway,
        _carts_directory: carts_directory,
    }
}

async fn wait_until_ready(client: &httpc_test::Client) {
    for _ in 0..50 {
        if client.do_get("/healthcheck").await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("Server did not start in time.");
}

pub fn item(product_id: i64, price: &str, size: &str) -> Value {
    json!({
        "product_id": product_id,
        "name": "Linen Shirt",
        "price": price,
        "image": "/images/linen-shirt.jpg",
        "size": size,
        "color": "White",
    })
}

pub fn shipping() -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.com",
        "phone": "5550100100",
        "address": "12 Analytical Way",
        "city": "London",
        "state": "LN",
        "zip_code": "10001",
    })
}

pub fn card() -> Value {
    json!({
        "card_number": "4111111111111111",
        "card_name": "Ada Lovelace",
        "exp_date": "12/30",
        "cvv": "123",
    })
}

/// Mounts gateway responses for one order `order_Gw1` paid by `pay_Gw1` with `status`.
pub async fn mount_gateway(gateway: &MockServer, payment_status: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "order_Gw1",
            "entity": "order",
            "amount": 0,
            "currency": "INR",
            "status": "created",
        })))
        .mount(gateway)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/payments/pay_Gw1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pay_Gw1",
            "entity": "payment",
            "order_id": "order_Gw1",
            "amount": 0,
            "currency": "INR",
            "status": payment_status,
        })))
        .mount(gateway)
        .await;
}

pub fn new_id() -> Uuid {
    Uuid::now_v7()
}
