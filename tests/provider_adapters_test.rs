//! Recharge adapters against mocked provider APIs.

use pay4me_backend::payments::PaymentHttpClient;
use pay4me_backend::recharge::provider::RechargeProvider;
use pay4me_backend::recharge::providers::{
    FlutterwaveConfig, FlutterwaveRecharge, HustleSimConfig, HustleSimRecharge,
    PaystackBillsConfig, PaystackBillsRecharge, ReloadlyConfig, ReloadlyRecharge, TopupMamaConfig,
    TopupMamaRecharge, VtPassConfig, VtPassRecharge,
};
use pay4me_backend::recharge::types::{FailureReason, Network, RechargeRequest};
use rust_decimal::Decimal;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http() -> PaymentHttpClient {
    PaymentHttpClient::new(Duration::from_secs(2), 0).unwrap()
}

fn mtn_airtime() -> RechargeRequest {
    RechargeRequest::airtime(Network::Mtn, "08031234567", Decimal::from(200))
}

#[tokio::test]
async fn hustlesim_airtime_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/airtime"))
        .and(header("Authorization", "Token hs_key"))
        .and(body_partial_json(json!({
            "network": "mtn",
            "phone": "08031234567",
            "request_id": "REF-HS-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Status": "successful",
            "ident": "HS-778"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = HustleSimRecharge::new(
        HustleSimConfig {
            api_key: Some("hs_key".to_string()),
            base_url: server.uri(),
        },
        http(),
    );

    let outcome = adapter.deliver(&mtn_airtime(), "REF-HS-1").await;
    assert!(outcome.succeeded);
    assert_eq!(outcome.provider_name, "hustlesim");
    assert_eq!(outcome.external_transaction_id, "HS-778");
}

#[tokio::test]
async fn hustlesim_rejection_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/airtime"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "failed",
            "message": "insufficient wallet balance"
        })))
        .mount(&server)
        .await;

    let adapter = HustleSimRecharge::new(
        HustleSimConfig {
            api_key: Some("hs_key".to_string()),
            base_url: server.uri(),
        },
        http(),
    );

    let outcome = adapter.deliver(&mtn_airtime(), "REF-HS-2").await;
    assert!(!outcome.succeeded);
    assert_eq!(
        outcome.failure_reason,
        Some(FailureReason::UpstreamError(
            "insufficient wallet balance".to_string()
        ))
    );
}

#[tokio::test]
async fn hustlesim_non_json_body_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/airtime"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let adapter = HustleSimRecharge::new(
        HustleSimConfig {
            api_key: Some("hs_key".to_string()),
            base_url: server.uri(),
        },
        http(),
    );

    let outcome = adapter.deliver(&mtn_airtime(), "REF-HS-4").await;
    assert!(!outcome.succeeded);
    assert_eq!(
        outcome.failure_reason.as_ref().map(|r| r.category()),
        Some("upstream_error")
    );
}

#[tokio::test]
async fn topupmama_airtime_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/topup"))
        .and(header("Authorization", "Bearer tm_key"))
        .and(body_partial_json(json!({
            "network": "mtn",
            "phone": "08031234567",
            "amount": 200
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "reference": "TM-5521"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = TopupMamaRecharge::new(
        TopupMamaConfig {
            api_key: Some("tm_key".to_string()),
            base_url: server.uri(),
        },
        http(),
    );

    let outcome = adapter.deliver(&mtn_airtime(), "REF-TM-1").await;
    assert!(outcome.succeeded);
    assert_eq!(outcome.provider_name, "topupmama");
    assert_eq!(outcome.external_transaction_id, "TM-5521");
}

#[tokio::test]
async fn topupmama_rejection_and_data_short_circuit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/topup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "invalid msisdn"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = TopupMamaRecharge::new(
        TopupMamaConfig {
            api_key: Some("tm_key".to_string()),
            base_url: server.uri(),
        },
        http(),
    );

    let outcome = adapter.deliver(&mtn_airtime(), "REF-TM-2").await;
    assert_eq!(
        outcome.failure_reason,
        Some(FailureReason::UpstreamError("invalid msisdn".to_string()))
    );

    // data never reaches the server: the mock expects exactly one call
    let request = RechargeRequest::data(Network::Mtn, "08031234567", Decimal::from(600), "1GB");
    let outcome = adapter.deliver(&request, "REF-TM-3").await;
    assert_eq!(
        outcome.failure_reason.as_ref().map(|r| r.category()),
        Some("network_unsupported")
    );
}

#[test]
fn topupmama_without_key_is_unconfigured() {
    let adapter = TopupMamaRecharge::new(TopupMamaConfig::default(), http());
    assert!(!adapter.is_configured());
}

#[tokio::test]
async fn reloadly_topup_sends_international_number() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/topups"))
        .and(header("Authorization", "Bearer rl_token"))
        .and(header("Accept", "application/com.reloadly.topups-v1+json"))
        .and(body_partial_json(json!({
            "operatorId": 341,
            "useLocalAmount": true,
            "customIdentifier": "REF-RL-1",
            "recipientPhone": {"countryCode": "NG", "number": "+2348031234567"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactionId": 4602,
            "operatorTransactionId": "OP-99"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = ReloadlyRecharge::new(
        ReloadlyConfig {
            access_token: Some("rl_token".to_string()),
            base_url: server.uri(),
        },
        http(),
    );

    let outcome = adapter.deliver(&mtn_airtime(), "REF-RL-1").await;
    assert!(outcome.succeeded);
    assert_eq!(outcome.external_transaction_id, "4602");
    assert_eq!(outcome.confirmation_code, "OP-99");
}

#[tokio::test]
async fn reloadly_server_error_is_a_failure_not_a_panic() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/topups"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let adapter = ReloadlyRecharge::new(
        ReloadlyConfig {
            access_token: Some("rl_token".to_string()),
            base_url: server.uri(),
        },
        http(),
    );

    let outcome = adapter.deliver(&mtn_airtime(), "REF-RL-2").await;
    assert!(!outcome.succeeded);
    assert_eq!(
        outcome.failure_reason.as_ref().map(|r| r.category()),
        Some("upstream_error")
    );
}

#[tokio::test]
async fn vtpass_data_uses_variation_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pay"))
        .and(header("api-key", "vt_api"))
        .and(header("secret-key", "vt_secret"))
        .and(body_partial_json(json!({
            "serviceID": "mtn-data",
            "variation_code": "mtn-2gb-600",
            "request_id": "REF-VT-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "000",
            "requestId": "REF-VT-1",
            "content": {"transactions": {"status": "delivered", "transactionId": "17000"}},
            "purchased_code": "PIN-4455"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = VtPassRecharge::new(
        VtPassConfig {
            api_key: Some("vt_api".to_string()),
            secret_key: Some("vt_secret".to_string()),
            base_url: server.uri(),
        },
        http(),
    );

    let request = RechargeRequest::data(Network::Mtn, "08031234567", Decimal::from(600), "2GB");
    let outcome = adapter.deliver(&request, "REF-VT-1").await;
    assert!(outcome.succeeded);
    assert_eq!(outcome.external_transaction_id, "17000");
    assert_eq!(outcome.confirmation_code, "PIN-4455");
}

#[tokio::test]
async fn vtpass_failed_transaction_is_not_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pay"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "000",
            "content": {"transactions": {"status": "failed"}}
        })))
        .mount(&server)
        .await;

    let adapter = VtPassRecharge::new(
        VtPassConfig {
            api_key: Some("vt_api".to_string()),
            secret_key: Some("vt_secret".to_string()),
            base_url: server.uri(),
        },
        http(),
    );

    let outcome = adapter.deliver(&mtn_airtime(), "REF-VT-2").await;
    assert!(!outcome.succeeded);
}

#[tokio::test]
async fn flutterwave_airtime_bill() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/bills"))
        .and(header("Authorization", "Bearer FLWSECK-1"))
        .and(body_partial_json(json!({
            "country": "NG",
            "customer": "08031234567",
            "type": "AIRTIME",
            "recurrence": "ONCE",
            "reference": "REF-FW-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "Bill payment successful",
            "data": {"flw_ref": "BPUSSD-1", "reference": "REF-FW-1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = FlutterwaveRecharge::new(
        FlutterwaveConfig {
            secret_key: Some("FLWSECK-1".to_string()),
            base_url: server.uri(),
        },
        http(),
    );

    let outcome = adapter.deliver(&mtn_airtime(), "REF-FW-1").await;
    assert!(outcome.succeeded);
    assert_eq!(outcome.external_transaction_id, "BPUSSD-1");
}

#[tokio::test]
async fn flutterwave_does_not_sell_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let adapter = FlutterwaveRecharge::new(
        FlutterwaveConfig {
            secret_key: Some("FLWSECK-1".to_string()),
            base_url: server.uri(),
        },
        http(),
    );

    let request = RechargeRequest::data(Network::Mtn, "08031234567", Decimal::from(600), "2GB");
    let outcome = adapter.deliver(&request, "REF-FW-2").await;
    assert_eq!(
        outcome.failure_reason.as_ref().map(|r| r.category()),
        Some("network_unsupported")
    );
}

#[tokio::test]
async fn paystack_bill_amount_is_in_kobo() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bill"))
        .and(header("Authorization", "Bearer sk_live_abc"))
        .and(body_partial_json(json!({
            "type": "mtn-airtime",
            "amount": 20000,
            "reference": "REF-PS-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Bill paid",
            "data": {"reference": "PSB-1", "status": "success", "verification_reference": "VR-1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = PaystackBillsRecharge::new(
        PaystackBillsConfig {
            secret_key: Some("sk_live_abc".to_string()),
            base_url: server.uri(),
        },
        http(),
    );

    let outcome = adapter.deliver(&mtn_airtime(), "REF-PS-1").await;
    assert!(outcome.succeeded);
    assert_eq!(outcome.external_transaction_id, "PSB-1");
    assert_eq!(outcome.confirmation_code, "VR-1");
}

#[test]
fn paystack_test_key_leaves_adapter_unconfigured() {
    let adapter = PaystackBillsRecharge::new(
        PaystackBillsConfig {
            secret_key: Some("sk_test_abc".to_string()),
            ..PaystackBillsConfig::default()
        },
        http(),
    );
    assert!(!adapter.is_configured());
}

#[tokio::test]
async fn slow_provider_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/airtime"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "success"}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let adapter = HustleSimRecharge::new(
        HustleSimConfig {
            api_key: Some("hs_key".to_string()),
            base_url: server.uri(),
        },
        PaymentHttpClient::new(Duration::from_millis(100), 0).unwrap(),
    );

    let outcome = adapter.deliver(&mtn_airtime(), "REF-HS-3").await;
    assert!(!outcome.succeeded);
    assert_eq!(
        outcome.failure_reason.as_ref().map(|r| r.category()),
        Some("timeout")
    );
}
