use axum::http::StatusCode;
use boutique_server::domain::{
    addresses::{AddressBook, ShippingAddress},
    cart::UserId,
};
use serde_json::{Value, json};
use serial_test::serial;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use uuid::Uuid;

use crate::test_utils::{card, item, mount_gateway, new_id, shipping, start_test_server};

struct Shopper {
    cart_id: Uuid,
    checkout_id: Uuid,
    user_id: Uuid,
}

/// A signed-in shopper with one line in the cart, at the payment step.
async fn at_payment_step(client: &httpc_test::Client) -> Shopper {
    let shopper = Shopper {
        cart_id: new_id(),
        checkout_id: new_id(),
        user_id: new_id(),
    };
    let cart_id = shopper.cart_id;
    let checkout_id = shopper.checkout_id;

    client
        .do_post(&format!("/carts/{cart_id}/items"), item(11, "25.00", "M"))
        .await
        .expect("Add should succeed.");
    client
        .do_post(
            &format!("/carts/{cart_id}/owner"),
            json!({"user_id": shopper.user_id}),
        )
        .await
        .expect("Owner should be attached.");

    let res = client
        .do_post(
            "/checkouts",
            json!({"checkout_id": checkout_id, "cart_id": cart_id}),
        )
        .await
        .expect("Checkout should start.");
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .do_post(&format!("/checkouts/{checkout_id}/shipping"), shipping())
        .await
        .expect("Shipping should be submitted.");
    let accepted = res.json_body().expect("Response should be json.");
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(accepted["checkout"]["step"], "payment");

    shopper
}

async fn get_json(client: &httpc_test::Client, url: &str) -> Value {
    client
        .do_get(url)
        .await
        .expect("Request should complete.")
        .json_body()
        .expect("Response should be json.")
}

#[sqlx::test]
#[serial]
async fn paying_places_the_order_and_clears_the_cart_only_after_the_callback(
    _pool_options: PgPoolOptions,
    connect_options: PgConnectOptions,
) {
    let server = start_test_server(connect_options).await;
    mount_gateway(&server.gateway, "captured").await;
    let client = &server.client;
    let shopper = at_payment_step(client).await;
    let checkout_id = shopper.checkout_id;

    let res = client
        .do_post(&format!("/checkouts/{checkout_id}/payment"), card())
        .await
        .expect("Payment should begin.");
    let opened = res.json_body().expect("Response should be json.");
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(opened["checkout"]["processing"], true);
    assert_eq!(opened["handoff"]["order_id"], "order_Gw1");
    // 50.00 + 5.99 shipping + 3.50 tax
    assert_eq!(opened["handoff"]["amount"], 5949);

    let cart = get_json(client, &format!("/carts/{}", shopper.cart_id)).await;
    assert_eq!(cart["item_count"], 2, "Cart must survive until payment succeeds.");

    let res = client
        .do_post(
            &format!("/checkouts/{checkout_id}/payment/callback"),
            json!({
                "outcome": "success",
                "attempt_id": opened["attempt_id"],
                "gateway_order_id": "order_Gw1",
                "gateway_payment_id": "pay_Gw1",
            }),
        )
        .await
        .expect("Callback should complete.");
    let checkout = res.json_body().expect("Response should be json.");

    let cart = get_json(client, &format!("/carts/{}", shopper.cart_id)).await;
    let orders = get_json(client, &format!("/users/{}/orders", shopper.user_id)).await;

    server.app_state.pool.close().await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(checkout["step"], "confirmation");
    assert_eq!(checkout["processing"], false);
    assert_eq!(checkout["order_id"], opened["handoff"]["receipt"]);
    assert_eq!(cart["item_count"], 0);
    assert_eq!(orders[0]["payment_status"], "completed");
    assert_eq!(orders[0]["total_amount"], "59.49");
    assert_eq!(orders[0]["lines"].as_array().map(Vec::len), Some(1));
}

#[sqlx::test]
#[serial]
async fn second_submission_while_processing_is_a_conflict(
    _pool_options: PgPoolOptions,
    connect_options: PgConnectOptions,
) {
    let server = start_test_server(connect_options).await;
    mount_gateway(&server.gateway, "captured").await;
    let client = &server.client;
    let shopper = at_payment_step(client).await;
    let checkout_id = shopper.checkout_id;

    let first = client
        .do_post(&format!("/checkouts/{checkout_id}/payment"), card())
        .await
        .expect("Payment should begin.");
    let second = client
        .do_post(&format!("/checkouts/{checkout_id}/payment"), card())
        .await
        .expect("Request should complete.");
    let back = client
        .do_post(&format!("/checkouts/{checkout_id}/back"), json!({}))
        .await
        .expect("Request should complete.");
    let orders = get_json(client, &format!("/users/{}/orders", shopper.user_id)).await;

    server.app_state.pool.close().await;

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(back.status(), StatusCode::CONFLICT);
    assert_eq!(orders.as_array().map(Vec::len), Some(1));
    assert_eq!(orders[0]["payment_status"], "pending");
}

#[sqlx::test]
#[serial]
async fn dismissing_the_gateway_allows_a_retry_and_keeps_the_cart(
    _pool_options: PgPoolOptions,
    connect_options: PgConnectOptions,
) {
    let server = start_test_server(connect_options).await;
    mount_gateway(&server.gateway, "captured").await;
    let client = &server.client;
    let shopper = at_payment_step(client).await;
    let checkout_id = shopper.checkout_id;

    let opened = client
        .do_post(&format!("/checkouts/{checkout_id}/payment"), card())
        .await
        .expect("Payment should begin.")
        .json_body()
        .expect("Response should be json.");
    let res = client
        .do_post(
            &format!("/checkouts/{checkout_id}/payment/callback"),
            json!({"outcome": "dismissed", "attempt_id": opened["attempt_id"]}),
        )
        .await
        .expect("Callback should complete.");
    let checkout = res.json_body().expect("Response should be json.");
    let retry = client
        .do_post(&format!("/checkouts/{checkout_id}/payment"), card())
        .await
        .expect("Request should complete.");
    let cart = get_json(client, &format!("/carts/{}", shopper.cart_id)).await;

    server.app_state.pool.close().await;

    assert_eq!(checkout["step"], "payment");
    assert_eq!(checkout["processing"], false);
    assert_eq!(retry.status(), StatusCode::OK);
    assert_eq!(cart["item_count"], 2);
}

#[sqlx::test]
#[serial]
async fn unpaid_gateway_payment_keeps_checkout_at_payment(
    _pool_options: PgPoolOptions,
    connect_options: PgConnectOptions,
) {
    let server = start_test_server(connect_options).await;
    mount_gateway(&server.gateway, "failed").await;
    let client = &server.client;
    let shopper = at_payment_step(client).await;
    let checkout_id = shopper.checkout_id;

    let opened = client
        .do_post(&format!("/checkouts/{checkout_id}/payment"), card())
        .await
        .expect("Payment should begin.")
        .json_body()
        .expect("Response should be json.");
    let res = client
        .do_post(
            &format!("/checkouts/{checkout_id}/payment/callback"),
            json!({
                "outcome": "success",
                "attempt_id": opened["attempt_id"],
                "gateway_order_id": "order_Gw1",
                "gateway_payment_id": "pay_Gw1",
            }),
        )
        .await
        .expect("Callback should complete.");
    let checkout = get_json(client, &format!("/checkouts/{checkout_id}")).await;
    let cart = get_json(client, &format!("/carts/{}", shopper.cart_id)).await;

    server.app_state.pool.close().await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(checkout["step"], "payment");
    assert_eq!(checkout["processing"], false);
    assert_eq!(checkout["last_payment_error"], "The payment could not be confirmed.");
    assert_eq!(cart["item_count"], 2);
}

#[sqlx::test]
#[serial]
async fn invalid_forms_report_each_field(
    _pool_options: PgPoolOptions,
    connect_options: PgConnectOptions,
) {
    let server = start_test_server(connect_options).await;
    let client = &server.client;
    let cart_id = new_id();
    let checkout_id = new_id();
    client
        .do_post(&format!("/carts/{cart_id}/items"), item(4, "10.00", "S"))
        .await
        .expect("Add should succeed.");
    client
        .do_post(
            "/checkouts",
            json!({"checkout_id": checkout_id, "cart_id": cart_id}),
        )
        .await
        .expect("Checkout should start.");

    let mut form = shipping();
    form["first_name"] = json!("");
    form["zip_code"] = json!("12");
    let res = client
        .do_post(&format!("/checkouts/{checkout_id}/shipping"), form)
        .await
        .expect("Request should complete.");
    let error = res.json_body().expect("Error should be json.");

    server.app_state.pool.close().await;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["fields"]["first_name"][0], "First name is required");
    assert_eq!(error["fields"]["zip_code"][0], "Valid ZIP code is required");
}

#[sqlx::test]
#[serial]
async fn guests_cannot_pay_without_a_saved_address(
    _pool_options: PgPoolOptions,
    connect_options: PgConnectOptions,
) {
    let server = start_test_server(connect_options).await;
    mount_gateway(&server.gateway, "captured").await;
    let client = &server.client;
    let cart_id = new_id();
    let checkout_id = new_id();
    client
        .do_post(&format!("/carts/{cart_id}/items"), item(4, "10.00", "S"))
        .await
        .expect("Add should succeed.");
    client
        .do_post(
            "/checkouts",
            json!({"checkout_id": checkout_id, "cart_id": cart_id}),
        )
        .await
        .expect("Checkout should start.");
    client
        .do_post(&format!("/checkouts/{checkout_id}/shipping"), shipping())
        .await
        .expect("Shipping should be submitted.");

    let res = client
        .do_post(&format!("/checkouts/{checkout_id}/payment"), card())
        .await
        .expect("Request should complete.");
    let checkout = get_json(client, &format!("/checkouts/{checkout_id}")).await;

    server.app_state.pool.close().await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(checkout["processing"], false);
    assert_eq!(checkout["step"], "payment");
}

#[sqlx::test]
#[serial]
async fn empty_cart_cannot_start_checkout(
    _pool_options: PgPoolOptions,
    connect_options: PgConnectOptions,
) {
    let server = start_test_server(connect_options).await;

    let res = server
        .client
        .do_post(
            "/checkouts",
            json!({"checkout_id": new_id(), "cart_id": new_id()}),
        )
        .await
        .expect("Request should complete.");
    let error = res.json_body().expect("Error should be json.");

    server.app_state.pool.close().await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error["message"], "Your cart is empty.");
}

#[sqlx::test]
#[serial]
async fn order_references_the_address_entered_at_checkout(
    _pool_options: PgPoolOptions,
    connect_options: PgConnectOptions,
) {
    let server = start_test_server(connect_options).await;
    mount_gateway(&server.gateway, "captured").await;
    let client = &server.client;
    let (cart_id, checkout_id, user_id) = (new_id(), new_id(), new_id());
    let home = server
        .app_state
        .addresses
        .save(
            UserId::try_from(user_id).expect("Id should be a v7 uuid."),
            &ShippingAddress {
                street: "1 Main Street".to_owned(),
                city: "Portland".to_owned(),
                state: "OR".to_owned(),
                zip_code: "97201".to_owned(),
            },
        )
        .await
        .expect("Default address should be saved.");

    client
        .do_post(&format!("/carts/{cart_id}/items"), item(11, "25.00", "M"))
        .await
        .expect("Add should succeed.");
    client
        .do_post(&format!("/carts/{cart_id}/owner"), json!({"user_id": user_id}))
        .await
        .expect("Owner should be attached.");
    client
        .do_post("/checkouts", json!({"checkout_id": checkout_id, "cart_id": cart_id}))
        .await
        .expect("Checkout should start.");
    let accepted = client
        .do_post(&format!("/checkouts/{checkout_id}/shipping"), shipping())
        .await
        .expect("Shipping should be submitted.")
        .json_body()
        .expect("Response should be json.");
    let res = client
        .do_post(&format!("/checkouts/{checkout_id}/payment"), card())
        .await
        .expect("Payment should begin.");
    let orders = get_json(client, &format!("/users/{user_id}/orders")).await;
    let addresses = get_json(client, &format!("/users/{user_id}/addresses")).await;

    server.app_state.pool.close().await;

    let entered = &accepted["checkout"]["address_id"];
    assert_eq!(res.status(), StatusCode::OK);
    assert_ne!(entered, &json!(home.address_id));
    assert_eq!(&orders[0]["address_id"], entered);
    assert_eq!(addresses[0]["address_id"], json!(home.address_id));
    assert_eq!(addresses[1]["street"], "12 Analytical Way");
}
