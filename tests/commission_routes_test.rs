mod common;

use actix_web::{http::header, test};
use serde_json::json;
use serial_test::serial;

use common::{bearer_token, TestApp};

#[actix_rt::test]
#[serial]
async fn test_settle_without_auth_is_rejected() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/commissions/settle")
        .set_json(&json!({
            "order_id": "ord-1",
            "delivery_fee": 10.0
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
#[serial]
async fn test_settle_splits_fee_between_platform_and_driver() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/commissions/settle")
        .insert_header((header::AUTHORIZATION, bearer_token("user")))
        .set_json(&json!({
            "order_id": "ord-2",
            "delivery_fee": 10.0,
            "driver_id": "drv-a",
            "commission_percent": 20.0
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["platform_amount"].as_f64().unwrap(), 2.0);
    assert_eq!(body["driver_amount"].as_f64().unwrap(), 8.0);
    assert_eq!(body["status"], "pending");
}

#[actix_rt::test]
#[serial]
async fn test_settle_defaults_to_twenty_percent() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/commissions/settle")
        .insert_header((header::AUTHORIZATION, bearer_token("user")))
        .set_json(&json!({
            "order_id": "ord-3",
            "delivery_fee": 15.0
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["commission_percent"].as_f64().unwrap(), 20.0);
    assert_eq!(body["platform_amount"].as_f64().unwrap(), 3.0);
}

#[actix_rt::test]
#[serial]
async fn test_repeated_settle_with_identical_arguments_is_idempotent() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/commissions/settle")
            .insert_header((header::AUTHORIZATION, bearer_token("user")))
            .set_json(&json!({
                "order_id": "ord-idem",
                "delivery_fee": 10.0,
                "driver_id": "drv-a",
                "commission_percent": 20.0
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }

    let records = test_app.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    let record = records.get("ord-idem").unwrap();
    assert_eq!(record.driver_id.as_deref(), Some("drv-a"));
    assert_eq!(record.delivery_fee, "10".parse().unwrap());
    assert_eq!(record.platform_amount, "2.00".parse().unwrap());
    assert_eq!(record.driver_amount, "8.00".parse().unwrap());
    assert_eq!(record.status.as_str(), "pending");
}

#[actix_rt::test]
#[serial]
async fn test_resettlement_updates_driver_without_duplicating() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    for driver in ["drv-a", "drv-b"] {
        let req = test::TestRequest::post()
            .uri("/api/commissions/settle")
            .insert_header((header::AUTHORIZATION, bearer_token("user")))
            .set_json(&json!({
                "order_id": "ord-4",
                "delivery_fee": 10.0,
                "driver_id": driver,
                "commission_percent": 20.0
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }

    let records = test_app.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    let record = records.get("ord-4").unwrap();
    assert_eq!(record.driver_id.as_deref(), Some("drv-b"));
    assert_eq!(record.platform_amount, "2.00".parse().unwrap());
    assert_eq!(record.driver_amount, "8.00".parse().unwrap());
}

#[actix_rt::test]
#[serial]
async fn test_settle_rejects_out_of_range_percent() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/commissions/settle")
        .insert_header((header::AUTHORIZATION, bearer_token("user")))
        .set_json(&json!({
            "order_id": "ord-5",
            "delivery_fee": 10.0,
            "commission_percent": 120.0
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["field"], "commission_percent");
}

#[actix_rt::test]
#[serial]
async fn test_mark_paid_requires_admin_role() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::put()
        .uri("/api/commissions/ord-6/pay")
        .insert_header((header::AUTHORIZATION, bearer_token("user")))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_rt::test]
#[serial]
async fn test_paid_commission_is_terminal() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let settle = test::TestRequest::post()
        .uri("/api/commissions/settle")
        .insert_header((header::AUTHORIZATION, bearer_token("user")))
        .set_json(&json!({
            "order_id": "ord-7",
            "delivery_fee": 10.0,
            "driver_id": "drv-a"
        }))
        .to_request();
    assert_eq!(test::call_service(&app, settle).await.status(), 200);

    // pay, then pay again: the repeat is an idempotent no-op
    for _ in 0..2 {
        let pay = test::TestRequest::put()
            .uri("/api/commissions/ord-7/pay")
            .insert_header((header::AUTHORIZATION, bearer_token("admin")))
            .to_request();
        let resp = test::call_service(&app, pay).await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "paid");
    }

    // crossing to the other terminal state is a conflict
    let cancel = test::TestRequest::put()
        .uri("/api/commissions/ord-7/cancel")
        .insert_header((header::AUTHORIZATION, bearer_token("admin")))
        .to_request();
    assert_eq!(test::call_service(&app, cancel).await.status(), 409);

    // and so is settling again
    let resettle = test::TestRequest::post()
        .uri("/api/commissions/settle")
        .insert_header((header::AUTHORIZATION, bearer_token("user")))
        .set_json(&json!({
            "order_id": "ord-7",
            "delivery_fee": 12.0
        }))
        .to_request();
    assert_eq!(test::call_service(&app, resettle).await.status(), 409);

    // the record is untouched by the rejected calls
    let records = test_app.records.lock().unwrap();
    let record = records.get("ord-7").unwrap();
    assert_eq!(record.delivery_fee, "10".parse().unwrap());
    assert_eq!(record.status.as_str(), "paid");
}

#[actix_rt::test]
#[serial]
async fn test_get_unknown_commission_returns_not_found() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/commissions/no-such-order")
        .insert_header((header::AUTHORIZATION, bearer_token("user")))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
#[serial]
async fn test_cancel_unknown_commission_returns_not_found() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::put()
        .uri("/api/commissions/no-such-order/cancel")
        .insert_header((header::AUTHORIZATION, bearer_token("admin")))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}
