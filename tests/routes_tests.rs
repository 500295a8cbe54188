// HTTP route tests for the match engine

use actix_web::{http::StatusCode, test, web, App};
use chrono::NaiveDate;
use match_engine::config::Settings;
use match_engine::models::{Diet, Gender, MaritalStatus, Profile, SmokingStatus};
use match_engine::routes::{self, AppState};
use match_engine::services::{AttributeStore, InMemoryStore};
use serde_json::{json, Value};
use std::sync::Arc;

fn complete_profile(id: &str, gender: Gender, wants: Gender) -> Profile {
    let mut profile = Profile::new(id);
    profile.first_name = format!("User {}", id);
    profile.date_of_birth = NaiveDate::from_ymd_opt(1991, 3, 10);
    profile.gender = gender;
    profile.photo = Some("photo.jpg".to_string());
    profile.profile_description = Some("About me".to_string());
    profile.city = Some("Tel Aviv".to_string());
    profile.height = Some(172);
    profile.children = Some("No".to_string());
    profile.more_children = Some("Yes".to_string());
    profile.diet = Diet::Vegetarian;
    profile.smoking_status = SmokingStatus::No;
    profile.marital_status = MaritalStatus::Single;
    profile.match_description = Some("Someone kind".to_string());
    profile.gender_to_match = vec![wants];
    profile.min_age_to_match = Some(21);
    profile.max_age_to_match = Some(70);
    profile.active_languages = vec!["en".to_string()];
    profile
}

fn seeded_store() -> Arc<InMemoryStore> {
    let mut requester = complete_profile("requester", Gender::Male, Gender::Female);
    requester.is_active = true;
    let mut match_a = complete_profile("match_a", Gender::Female, Gender::Male);
    match_a.is_active = true;
    let inactive = complete_profile("inactive", Gender::Female, Gender::Male);
    let mut incomplete = complete_profile("incomplete", Gender::Female, Gender::Male);
    incomplete.city = None;

    Arc::new(InMemoryStore::with_profiles(vec![requester, match_a, inactive, incomplete]))
}

macro_rules! init_app {
    ($store:expr) => {{
        let store = $store;
        let state = AppState::new(store.clone(), store, &Settings::default()).unwrap();
        test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
                .configure(routes::configure_routes),
        )
        .await
    }};
}

#[actix_web::test]
async fn test_health() {
    let app = init_app!(seeded_store());

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_find_matches() {
    let store = seeded_store();
    let app = init_app!(store.clone());

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/find")
        .set_json(json!({"userId": "requester", "languageCode": "en"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["number_of_matches"], 1);
    assert_eq!(body["matches"][0]["userId"], "match_a");
    assert_eq!(body["matches"][0]["rank"], 5);
    assert_eq!(store.get_profile("requester").await.unwrap().number_of_matches, 1);
}

#[actix_web::test]
async fn test_find_matches_unknown_user() {
    let app = init_app!(seeded_store());

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/find")
        .set_json(json!({"userId": "nobody"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_find_matches_rejects_bad_requests() {
    let app = init_app!(seeded_store());

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/find")
        .set_json(json!({"userId": ""}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/find")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_json");
}

#[actix_web::test]
async fn test_update_profile_reports_step() {
    let store = seeded_store();
    let app = init_app!(store.clone());

    let req = test::TestRequest::patch()
        .uri("/api/v1/profiles/newcomer")
        .set_json(json!({"date_of_birth": "1995-02-01", "gender": "other"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["step"], 1);
    assert_eq!(body["total_steps"], 10);
    assert_eq!(body["errors"][0]["message"], "A profile picture is required.");
    assert_eq!(body["isActive"], false);
    assert_eq!(store.get_profile("newcomer").await.unwrap().gender, Gender::Other);
}

#[actix_web::test]
async fn test_update_profile_rejects_bad_fields() {
    let app = init_app!(seeded_store());

    for edit in [json!({"shoe_size": 44}), json!({"height": "tall"}), json!({"min_max_age_to_match": 3})] {
        let req = test::TestRequest::patch()
            .uri("/api/v1/profiles/requester")
            .set_json(edit)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}

#[actix_web::test]
async fn test_update_deactivates_incomplete_profile() {
    let store = seeded_store();
    let app = init_app!(store.clone());

    let req = test::TestRequest::patch()
        .uri("/api/v1/profiles/match_a")
        .set_json(json!({"photo": null}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["isActive"], false);
    assert!(!store.get_profile("match_a").await.unwrap().is_active);
}

#[actix_web::test]
async fn test_activate_and_deactivate() {
    let store = seeded_store();
    let app = init_app!(store.clone());

    let req = test::TestRequest::post()
        .uri("/api/v1/profiles/inactive/activate")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["isActive"], true);
    assert_eq!(body["step"], 10);
    assert!(store.get_profile("inactive").await.unwrap().is_active);

    let req = test::TestRequest::post()
        .uri("/api/v1/profiles/inactive/deactivate")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["isActive"], false);
    assert!(!store.get_profile("inactive").await.unwrap().is_active);
}

#[actix_web::test]
async fn test_activate_incomplete_profile() {
    let store = seeded_store();
    let app = init_app!(store.clone());

    let req = test::TestRequest::post()
        .uri("/api/v1/profiles/incomplete/activate")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["isActive"], false);
    assert_eq!(body["step"], 2);
    assert_eq!(body["errors"][0]["message"], "Please write where you live.");
    assert!(!store.get_profile("incomplete").await.unwrap().is_active);
}

#[actix_web::test]
async fn test_activation_step_navigation() {
    let store = seeded_store();
    let app = init_app!(store.clone());
    let uri = "/api/v1/profiles/incomplete/activation-step";

    let req = test::TestRequest::post().uri(uri).set_json(json!({"step": 8})).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["activationStep"], 2);
    assert_eq!(body["step"], 2);

    let req = test::TestRequest::post().uri(uri).set_json(json!({"back": true})).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["activationStep"], 1);
    assert_eq!(store.get_profile("incomplete").await.unwrap().activation_step, 1);
}

#[actix_web::test]
async fn test_inactive_requester_finds_nothing() {
    let app = init_app!(seeded_store());

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/find")
        .set_json(json!({"userId": "inactive"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["number_of_matches"], 0);
    assert_eq!(body["total_candidates"], 0);
}

#[actix_web::test]
async fn test_blocks() {
    let store = seeded_store();
    let app = init_app!(store.clone());
    let pair = json!({"blockerId": "requester", "blockedId": "match_a"});

    let req = test::TestRequest::post().uri("/api/v1/blocks").set_json(&pair).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["changed"], true);

    let req = test::TestRequest::post().uri("/api/v1/blocks").set_json(&pair).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["changed"], false);

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/find")
        .set_json(json!({"userId": "requester"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["number_of_matches"], 0);

    let req = test::TestRequest::delete().uri("/api/v1/blocks").set_json(&pair).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["changed"], true);
}

#[actix_web::test]
async fn test_self_block_rejected() {
    let app = init_app!(seeded_store());

    let req = test::TestRequest::post()
        .uri("/api/v1/blocks")
        .set_json(json!({"blockerId": "requester", "blockedId": "requester"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}
