mod common;

use chrono::{Duration, Utc};
use common::TestApp;

#[tokio::test]
async fn active_code_is_valid_and_reports_discount() {
    let app = TestApp::spawn().await;
    app.seed_promo("WELCOME10", 10.0, true, None, 0, None).await;

    let result = app.promo_codes.validate("WELCOME10").await.unwrap();
    assert!(result.is_valid);
    assert_eq!(result.discount_percentage, 10.0);
    assert!(result.message.contains("10"));
}

#[tokio::test]
async fn lookup_is_case_insensitive() {
    let app = TestApp::spawn().await;
    app.seed_promo("WELCOME10", 10.0, true, None, 0, None).await;

    let result = app.promo_codes.validate("  welcome10 ").await.unwrap();
    assert!(result.is_valid);
    assert_eq!(result.code, "WELCOME10");
}

#[tokio::test]
async fn unknown_code_is_invalid_not_an_error() {
    let app = TestApp::spawn().await;

    let result = app.promo_codes.validate("NOPE").await.unwrap();
    assert!(!result.is_valid);
    assert_eq!(result.discount_percentage, 0.0);
    assert_eq!(result.message, "Invalid promo code");
}

#[tokio::test]
async fn expired_code_reports_expiry() {
    let app = TestApp::spawn().await;
    app.seed_promo(
        "SUMMER20",
        20.0,
        true,
        None,
        0,
        Some(Utc::now() - Duration::days(1)),
    )
    .await;

    let result = app.promo_codes.validate("SUMMER20").await.unwrap();
    assert!(!result.is_valid);
    assert_eq!(result.message, "This promo code has expired");
    // The code is known, so its discount is still reported
    assert_eq!(result.discount_percentage, 20.0);
}

#[tokio::test]
async fn inactive_reason_wins_over_expiry_and_limit() {
    let app = TestApp::spawn().await;
    app.seed_promo(
        "OLDCODE",
        15.0,
        false,
        Some(1),
        5,
        Some(Utc::now() - Duration::days(30)),
    )
    .await;

    let result = app.promo_codes.validate("OLDCODE").await.unwrap();
    assert!(!result.is_valid);
    assert_eq!(result.message, "This promo code is no longer active");
    assert_eq!(result.discount_percentage, 15.0);
}

#[tokio::test]
async fn usage_limit_reached_reports_limit() {
    let app = TestApp::spawn().await;
    app.seed_promo("LIMITED", 25.0, true, Some(100), 100, None)
        .await;

    let result = app.promo_codes.validate("LIMITED").await.unwrap();
    assert!(!result.is_valid);
    assert_eq!(result.message, "This promo code has reached its usage limit");
    assert_eq!(result.discount_percentage, 25.0);
}

#[tokio::test]
async fn code_under_usage_limit_is_still_valid() {
    let app = TestApp::spawn().await;
    app.seed_promo("LIMITED", 25.0, true, Some(100), 99, None)
        .await;

    let result = app.promo_codes.validate("LIMITED").await.unwrap();
    assert!(result.is_valid);
    assert_eq!(result.discount_percentage, 25.0);
}

#[tokio::test]
async fn validation_does_not_consume_a_use() {
    let app = TestApp::spawn().await;
    app.seed_promo("LIMITED", 25.0, true, Some(1), 0, None).await;

    app.promo_codes.validate("LIMITED").await.unwrap();
    let again = app.promo_codes.validate("LIMITED").await.unwrap();
    assert!(again.is_valid);
}
