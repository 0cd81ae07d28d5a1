mod cart_api;
mod checkout_flow;
mod health_check;
mod test_utils;
