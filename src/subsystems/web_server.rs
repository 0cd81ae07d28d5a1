use std::net::SocketAddr;

use async_trait::async_trait;
use axum::{
    Json,
    extract::State,
    routing::{get, post},
};
use futures::FutureExt;
use tokio::select;
use tokio_graceful_shutdown::{IntoSubsystem, SubsystemHandle};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{
    AppState,
    domain::{addresses, cart, checkout, orders},
    infra::ClientError,
};

pub struct WebServer {
    state: AppState,
}

impl WebServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl IntoSubsystem<anyhow::Error> for WebServer {
    async fn run(self, subsys: SubsystemHandle) -> Result<(), anyhow::Error> {
        let address = self.state.settings.application.address();
        let socket_addr: SocketAddr = address.parse()
            .inspect_err(|e| error!("Could not parse server address {address}.\nCheck application host and port in configuration settings.\nFailed with {e}"))?;

        let router = axum::Router::new()
            .route("/healthcheck", get(health_check_endpoint))
            .route("/carts/{cart_id}", get(cart::cart_view_endpoint))
            .route("/carts/{cart_id}/items", post(cart::add_item_endpoint))
            .route("/carts/{cart_id}/items/remove", post(cart::remove_item_endpoint))
            .route(
                "/carts/{cart_id}/items/quantity",
                post(cart::update_quantity_endpoint),
            )
            .route("/carts/{cart_id}/promo", post(cart::apply_promo_endpoint))
            .route("/carts/{cart_id}/owner", post(cart::attach_owner_endpoint))
            .route("/checkouts", post(checkout::start_checkout_endpoint))
            .route(
                "/checkouts/{checkout_id}",
                get(checkout::checkout_view_endpoint),
            )
            .route(
                "/checkouts/{checkout_id}/shipping",
                post(checkout::submit_shipping_endpoint),
            )
            .route(
                "/checkouts/{checkout_id}/payment",
                post(checkout::begin_payment_endpoint),
            )
            .route(
                "/checkouts/{checkout_id}/payment/callback",
                post(checkout::payment_callback_endpoint),
            )
            .route(
                "/checkouts/{checkout_id}/back",
                post(checkout::go_back_endpoint),
            )
            .route(
                "/users/{user_id}/addresses",
                get(addresses::list_addresses_endpoint),
            )
            .route(
                "/users/{user_id}/addresses/{address_id}/default",
                post(addresses::set_default_address_endpoint),
            )
            .route(
                "/users/{user_id}/orders",
                get(orders::user_orders_endpoint),
            )
            .route("/orders/{order_id}", get(orders::order_endpoint))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state);

        let listener = tokio::net::TcpListener::bind(socket_addr)
            .await
            .inspect_err(|e| {
                error!("Could not bind socket address {socket_addr}. Failed with {e}")
            })?;

        info!("Web server starting on http://{socket_addr}");
        select!(
            result = axum::serve(listener, router.into_make_service()).into_future().map(|result| result.map_err(anyhow::Error::new)) => {
                error!("Web server completed with {result:?}");
            }
            _ = subsys.on_shutdown_requested() => {
                info!("Web server shutdown");
            }
        );
        Ok(())
    }
}

pub async fn health_check_endpoint(
    State(_app_state): State<AppState>,
) -> Result<Json<String>, ClientError> {
    Ok(Json("Ok".to_owned()))
}

