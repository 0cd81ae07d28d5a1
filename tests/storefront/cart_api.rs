use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::test_utils::{item, new_id, start_test_server};

#[sqlx::test]
#[serial]
async fn cart_lines_merge_by_variant_and_totals_follow(
    _pool_options: PgPoolOptions,
    connect_options: PgConnectOptions,
) {
    let server = start_test_server(connect_options).await;
    let client = &server.client;
    let cart_id = new_id();

    client
        .do_post(&format!("/carts/{cart_id}/items"), item(7, "30.00", "M"))
        .await
        .expect("Add should succeed.");
    client
        .do_post(&format!("/carts/{cart_id}/items"), item(7, "30.00", "M"))
        .await
        .expect("Add should succeed.");
    let res = client
        .do_post(&format!("/carts/{cart_id}/items"), item(7, "30.00", "L"))
        .await
        .expect("Add should succeed.");
    let cart = res.json_body().expect("Cart should be json.");

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(cart["lines"].as_array().map(Vec::len), Some(2));
    assert_eq!(cart["item_count"], 3);
    assert_eq!(cart["summary"]["subtotal"], "90.00");
    assert_eq!(cart["summary"]["shipping"], "5.99");
    assert_eq!(cart["summary"]["tax"], "6.30");
    assert_eq!(cart["summary"]["total"], "102.29");

    let res = client
        .do_post(
            &format!("/carts/{cart_id}/items/quantity"),
            json!({"product_id": 7, "size": "M", "color": "White", "change": -5}),
        )
        .await
        .expect("Quantity update should succeed.");
    let cart = res.json_body().expect("Cart should be json.");

    assert_eq!(cart["item_count"], 2);

    let res = client
        .do_post(
            &format!("/carts/{cart_id}/items/remove"),
            json!({"product_id": 7, "size": "L", "color": "White"}),
        )
        .await
        .expect("Remove should succeed.");
    let cart = res.json_body().expect("Cart should be json.");

    server.app_state.pool.close().await;

    assert_eq!(cart["lines"].as_array().map(Vec::len), Some(1));
    assert_eq!(cart["item_count"], 1);
}

#[sqlx::test]
#[serial]
async fn promo_code_discounts_and_unknown_codes_are_refused(
    _pool_options: PgPoolOptions,
    connect_options: PgConnectOptions,
) {
    let server = start_test_server(connect_options).await;
    let client = &server.client;
    let cart_id = new_id();
    client
        .do_post(&format!("/carts/{cart_id}/items"), item(3, "50.00", "S"))
        .await
        .expect("Add should succeed.");

    let refused = client
        .do_post(&format!("/carts/{cart_id}/promo"), json!({"code": "SAVE50"}))
        .await
        .expect("Request should complete.");
    let accepted = client
        .do_post(&format!("/carts/{cart_id}/promo"), json!({"code": "welcome10"}))
        .await
        .expect("Request should complete.");
    let cart = accepted.json_body().expect("Cart should be json.");

    server.app_state.pool.close().await;

    assert_eq!(refused.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        refused.json_body().expect("Error should be json.")["message"],
        "Please enter a valid promo code"
    );
    assert_eq!(accepted.status(), StatusCode::OK);
    assert_eq!(cart["promo_code"], "WELCOME10");
    assert_eq!(cart["summary"]["discount"], "5.00");
    assert_eq!(cart["summary"]["total"], "54.49");
}

#[sqlx::test]
#[serial]
async fn updating_a_line_that_is_not_in_the_cart_is_a_bad_request(
    _pool_options: PgPoolOptions,
    connect_options: PgConnectOptions,
) {
    let server = start_test_server(connect_options).await;

    let res = server
        .client
        .do_post(
            &format!("/carts/{}/items/quantity", new_id()),
            json!({"product_id": 1, "size": "M", "color": "Red", "quantity": 2}),
        )
        .await
        .expect("Request should complete.");

    server.app_state.pool.close().await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
