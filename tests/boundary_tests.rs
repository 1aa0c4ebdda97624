mod common;

use common::{harness, harness_with};
use std::time::Duration;
use tapcheckout::application::terminal::Command;
use tapcheckout::config::CheckoutConfig;
use tapcheckout::domain::amount::Amount;
use tapcheckout::domain::outcome::PaymentMethod;
use tapcheckout::error::{CheckoutError, PaymentError};

async fn add_apples(h: &mut common::Harness, count: usize) {
    for _ in 0..count {
        h.terminal
            .dispatch(Command::AddItem("Apple".into()))
            .await
            .unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn test_total_at_limit_passes() {
    let mut h = harness();
    // 200 x 50 = 10000, exactly the default ceiling
    add_apples(&mut h, 200).await;
    assert_eq!(h.terminal.session().cart().total(), Amount::new(10_000));

    h.terminal
        .dispatch(Command::Checkout(PaymentMethod::Card))
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_total_above_limit_fails() {
    let mut h = harness();
    add_apples(&mut h, 300).await;

    let result = h
        .terminal
        .dispatch(Command::Checkout(PaymentMethod::Card))
        .await;
    match result {
        Err(CheckoutError::Rejected(PaymentError::LimitExceeded { amount, max })) => {
            assert_eq!(amount, Amount::new(15_000));
            assert_eq!(max, Amount::new(10_000));
        }
        other => panic!("expected LimitExceeded, got {:?}", other),
    }
    assert_eq!(h.terminal.session().cart().quantity("Apple"), 300);
}

#[tokio::test(start_paused = true)]
async fn test_limit_disabled_by_flag() {
    let mut config = CheckoutConfig::default();
    config.flags.amount_limit = false;
    let mut h = harness_with(config);
    add_apples(&mut h, 300).await;

    h.terminal
        .dispatch(Command::Checkout(PaymentMethod::Upi))
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_session_just_inside_timeout() {
    let mut config = CheckoutConfig::default();
    config.session_timeout_ms = 1000;
    let mut h = harness_with(config);
    add_apples(&mut h, 1).await;
    h.terminal.run_for(Duration::from_millis(990)).await;

    h.terminal
        .dispatch(Command::Checkout(PaymentMethod::Tap))
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_session_timeout_disabled_by_flag() {
    let mut config = CheckoutConfig::default();
    config.session_timeout_ms = 1000;
    config.flags.session_timeout = false;
    let mut h = harness_with(config);
    add_apples(&mut h, 1).await;
    h.terminal.run_for(Duration::from_secs(3600)).await;

    h.terminal
        .dispatch(Command::Checkout(PaymentMethod::Tap))
        .await
        .unwrap();
    assert!(!h.terminal.session().is_expired());
}

#[tokio::test(start_paused = true)]
async fn test_expired_stays_expired_until_acknowledged() {
    let mut config = CheckoutConfig::default();
    config.session_timeout_ms = 1000;
    let mut h = harness_with(config);
    add_apples(&mut h, 1).await;
    h.terminal.run_for(Duration::from_millis(1010)).await;

    for _ in 0..2 {
        let result = h
            .terminal
            .dispatch(Command::Checkout(PaymentMethod::Card))
            .await;
        assert!(matches!(
            result,
            Err(CheckoutError::Rejected(PaymentError::SessionExpired))
        ));
    }
    // The cart is only cleared on acknowledgement
    assert_eq!(h.terminal.session().cart().quantity("Apple"), 1);
}
