//! Promotions is a microservice responsible for coupon discounts and
//! role based authorization of the platform.
//! This crate is for running the service from `promotions_lib`. See `promotions_lib` for details.

extern crate env_logger;
extern crate promotions_lib;

fn main() {
    // Prepare logger
    env_logger::init();

    let config = promotions_lib::config::Config::new().expect("Can't load app config!");

    promotions_lib::start_server(config, &None, || ());
}
