use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{test, App};
use chrono::{Duration, TimeZone, Utc};
use crowdfund_server::clock::{Clock, ManualClock};
use crowdfund_server::storage::MemoryStorage;
use crowdfund_server::{
    CampaignBody, CampaignStats, CampaignStore, CreateCampaignBody, DonateBody, LogAction,
    LogEntryBody, RestartBody,
};

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    ))
}

async fn store(clock: &Arc<ManualClock>) -> Arc<CampaignStore> {
    let store = CampaignStore::init(Box::new(MemoryStorage::new()), clock.clone())
        .await
        .unwrap();
    Arc::new(store)
}

fn body(title: &str, lifetime_seconds: i64) -> CreateCampaignBody {
    CreateCampaignBody {
        title: title.into(),
        description: "The Green Bean Brigade".into(),
        goal: 250.0,
        image: None,
        lifetime_seconds,
    }
}

#[actix_web::test]
async fn create_campaign() {
    let clock = clock();
    let store = store(&clock).await;
    let app = test::init_service(
        App::new()
            .app_data(Data::from(Arc::clone(&store)))
            .configure(crowdfund_server::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/campaigns")
        .set_json(&body("Bean Fund", 90))
        .to_request();
    let campaign: CampaignBody = test::call_and_read_body_json(&app, req).await;

    assert_eq!(campaign.title, "Bean Fund".to_string());
    assert!(!campaign.is_fixed);
    assert_eq!(campaign.seconds_left, Some(90));
    assert_eq!(campaign.expires_at, Some(clock.now() + Duration::seconds(90)));
    assert_eq!(campaign.progress_percent, 0.0);
    assert!(campaign.persistence_warning.is_none());
}

#[actix_web::test]
async fn list_puts_fixed_campaigns_first() {
    let clock = clock();
    let store = store(&clock).await;
    let app = test::init_service(
        App::new()
            .app_data(Data::from(Arc::clone(&store)))
            .configure(crowdfund_server::configure),
    )
    .await;

    for title in &["A", "B"] {
        let req = test::TestRequest::post()
            .uri("/campaigns")
            .set_json(&body(title, 60))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = test::TestRequest::get().uri("/campaigns").to_request();
    let campaigns: Vec<CampaignBody> = test::call_and_read_body_json(&app, req).await;

    let fixed_count = crowdfund_server::seed::fixed_campaigns().len();
    assert!(campaigns[..fixed_count].iter().all(|c| c.is_fixed));
    let titles: Vec<_> = campaigns[fixed_count..]
        .iter()
        .map(|c| c.title.as_str())
        .collect();
    assert_eq!(titles, vec!["A", "B"]);
}

#[actix_web::test]
async fn invalid_campaign_is_rejected() {
    let clock = clock();
    let store = store(&clock).await;
    let app = test::init_service(
        App::new()
            .app_data(Data::from(Arc::clone(&store)))
            .configure(crowdfund_server::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/campaigns")
        .set_json(&CreateCampaignBody {
            title: "".into(),
            ..body("x", -3)
        })
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let error: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(error["error_code"], "E4001004");
    assert_eq!(error["error_meta"]["violations"][0]["type"], "TITLE-IS-BLANK");
    assert!(store.get_log().await.is_empty());
}

#[actix_web::test]
async fn malformed_json_uses_error_format() {
    let clock = clock();
    let store = store(&clock).await;
    let app = test::init_service(
        App::new()
            .app_data(Data::from(Arc::clone(&store)))
            .configure(crowdfund_server::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/campaigns")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"title\": 5}")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let error: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(error["error_code"], "E4001000");
}

#[actix_web::test]
async fn unknown_campaign_is_not_found() {
    let clock = clock();
    let store = store(&clock).await;
    let app = test::init_service(
        App::new()
            .app_data(Data::from(Arc::clone(&store)))
            .configure(crowdfund_server::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/campaigns/CPN-00000000-0000-0000-0000-000000000001")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn donations_update_progress_and_fixed_campaigns_refuse() {
    let clock = clock();
    let store = store(&clock).await;
    let app = test::init_service(
        App::new()
            .app_data(Data::from(Arc::clone(&store)))
            .configure(crowdfund_server::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/campaigns")
        .set_json(&body("Bean Fund", 60))
        .to_request();
    let campaign: CampaignBody = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri(&format!("/campaigns/{}/donations", campaign.id))
        .set_json(&DonateBody { amount: 62.5 })
        .to_request();
    let campaign: CampaignBody = test::call_and_read_body_json(&app, req).await;

    assert_eq!(campaign.raised_amount, 62.5);
    assert_eq!(campaign.backers, 1);
    assert_eq!(campaign.progress_percent, 25.0);

    let fixed = &crowdfund_server::seed::fixed_campaigns()[0];
    let req = test::TestRequest::post()
        .uri(&format!("/campaigns/{}/donations", fixed.id))
        .set_json(&DonateBody { amount: 1.0 })
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn restart_and_expiry_show_in_activity() {
    let clock = clock();
    let store = store(&clock).await;
    let app = test::init_service(
        App::new()
            .app_data(Data::from(Arc::clone(&store)))
            .configure(crowdfund_server::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/campaigns")
        .set_json(&body("Short", 1))
        .to_request();
    let short: CampaignBody = test::call_and_read_body_json(&app, req).await;

    clock.advance(Duration::seconds(1));
    store.expire_due().await.unwrap();

    let req = test::TestRequest::post()
        .uri("/campaigns")
        .set_json(&body("Long", 600))
        .to_request();
    let long: CampaignBody = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/campaigns/restart")
        .to_request();
    let restart: RestartBody = test::call_and_read_body_json(&app, req).await;
    assert_eq!(restart.removed_campaign_ids, vec![long.id]);

    let req = test::TestRequest::get()
        .uri("/activity?order=newest")
        .to_request();
    let log: Vec<LogEntryBody> = test::call_and_read_body_json(&app, req).await;

    let actions: Vec<_> = log.iter().map(|entry| entry.action).collect();
    assert_eq!(
        actions,
        vec![
            LogAction::Restart,
            LogAction::Created,
            LogAction::Removed,
            LogAction::Created,
        ]
    );
    assert_eq!(log[2].campaign.as_ref().map(|c| c.id), Some(short.id));

    let req = test::TestRequest::get().uri("/activity").to_request();
    let log: Vec<LogEntryBody> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(log[0].action, LogAction::Created);
}

#[actix_web::test]
async fn overlong_lifetime_is_rejected() {
    let clock = clock();
    let store = store(&clock).await;
    let app = test::init_service(
        App::new()
            .app_data(Data::from(Arc::clone(&store)))
            .configure(crowdfund_server::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/campaigns")
        .set_json(&body("Forever", 10_000_000_000_000))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let error: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(
        error["error_meta"]["violations"][0]["type"],
        "LIFETIME-IS-TOO-LONG"
    );
    assert!(store.get_log().await.is_empty());
}

#[actix_web::test]
async fn stats_total_every_active_campaign() {
    let clock = clock();
    let store = store(&clock).await;
    let app = test::init_service(
        App::new()
            .app_data(Data::from(Arc::clone(&store)))
            .configure(crowdfund_server::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/campaigns")
        .set_json(&body("Bean Fund", 60))
        .to_request();
    let campaign: CampaignBody = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri(&format!("/campaigns/{}/donations", campaign.id))
        .set_json(&DonateBody { amount: 40.0 })
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/stats").to_request();
    let stats: CampaignStats = test::call_and_read_body_json(&app, req).await;

    assert_eq!(
        stats,
        CampaignStats {
            total_campaigns: 4,
            total_goal: 23250.0,
            total_raised: 40.0,
            total_backers: 1,
        }
    );
}
