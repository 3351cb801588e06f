use super::*;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{extract::State, http::StatusCode, http::Uri, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::api::DEFAULT_REQUEST_TIMEOUT;

#[derive(Clone, Default)]
struct CountsBackend {
    routes: Arc<HashMap<String, (u16, Value)>>,
    hits: Arc<Mutex<Vec<String>>>,
}

async fn answer(
    State(backend): State<CountsBackend>,
    uri: Uri,
) -> (StatusCode, Json<Value>) {
    backend
        .hits
        .lock()
        .expect("hits lock")
        .push(uri.path().to_string());
    match backend.routes.get(uri.path()) {
        Some((status, body)) => (
            StatusCode::from_u16(*status).expect("status"),
            Json(body.clone()),
        ),
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "not found"}))),
    }
}

async fn spawn_counts_server(routes: &[(&str, u16, Value)]) -> (ApiClient, CountsBackend) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let backend = CountsBackend {
        routes: Arc::new(
            routes
                .iter()
                .map(|(path, status, body)| (path.to_string(), (*status, body.clone())))
                .collect(),
        ),
        hits: Arc::default(),
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new().fallback(answer).with_state(backend.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    let api = ApiClient::new(&format!("http://{addr}"), "token", DEFAULT_REQUEST_TIMEOUT)
        .expect("api client");
    (api, backend)
}

fn card(positive_is_good: bool, change: i64) -> StatCard {
    StatCard {
        title: "card",
        value: 10,
        change,
        positive_is_good,
    }
}

#[test]
fn trend_follows_sign_of_change() {
    assert_eq!(card(true, 4).trend(), Trend::Increase);
    assert_eq!(card(true, -1).trend(), Trend::Decrease);
    assert_eq!(card(true, 0).trend(), Trend::Flat);
}

#[test]
fn pending_and_rejected_counts_are_good_when_falling() {
    let stats = DashboardStats {
        total_ads_live: 50,
        ads_live_change: 5,
        total_ads_pending: 7,
        ads_pending_change: -3,
        total_active_users: 120,
        active_users_change: -2,
        total_deactivated_users: 4,
        deactivated_users_change: 1,
        total_ads_rejected: 9,
        ads_rejected_change: 0,
    };

    let cards = stat_cards(&stats);
    let verdicts: Vec<_> = cards
        .iter()
        .map(|card| (card.title, card.value, card.is_favourable()))
        .collect();

    assert_eq!(
        verdicts,
        vec![
            ("Total Ads Live", 50, Some(true)),
            ("Total Ads waiting for approval", 7, Some(true)),
            ("Total Active Users", 120, Some(false)),
            ("Total Users Deactivated", 4, Some(false)),
            ("Total Ads Rejected", 9, None),
        ]
    );
}

#[tokio::test]
async fn stats_combine_count_endpoints() {
    let (api, backend) = spawn_counts_server(&[
        (
            "/api/mod/listings/counts",
            200,
            json!({"active": 31, "pending": 6, "rejected": 2, "pendingChange": -4}),
        ),
        (
            "/api/mod/users/counts",
            200,
            json!({"active": 88, "inactive": 3, "activeChange": 12}),
        ),
        ("/api/mod/interests/counts", 200, json!({"pending": 5})),
    ])
    .await;

    let stats = fetch_dashboard_stats(&api).await.expect("stats");

    assert_eq!(stats.total_ads_live, 31);
    assert_eq!(stats.total_ads_pending, 6);
    assert_eq!(stats.ads_pending_change, -4);
    assert_eq!(stats.total_active_users, 88);
    assert_eq!(stats.active_users_change, 12);
    assert_eq!(stats.total_deactivated_users, 3);
    assert_eq!(stats.total_ads_rejected, 2);
    assert!(!backend
        .hits
        .lock()
        .expect("hits lock")
        .contains(&"/api/mod/stats".to_string()));
}

#[tokio::test]
async fn stats_fall_back_to_aggregate_endpoint() {
    let (api, backend) = spawn_counts_server(&[
        ("/api/mod/listings/counts", 200, json!({"active": 1})),
        ("/api/mod/users/counts", 500, json!({"message": "boom"})),
        (
            "/api/mod/stats",
            200,
            json!({"totalAdsLive": 14, "totalAdsPending": 2, "adsRejectedChange": -1}),
        ),
    ])
    .await;

    let stats = fetch_dashboard_stats(&api).await.expect("fallback stats");

    assert_eq!(stats.total_ads_live, 14);
    assert_eq!(stats.total_ads_pending, 2);
    assert_eq!(stats.ads_rejected_change, -1);
    assert_eq!(stats.total_active_users, 0);
    assert!(backend
        .hits
        .lock()
        .expect("hits lock")
        .contains(&"/api/mod/stats".to_string()));
}

#[tokio::test]
async fn stats_error_when_every_source_fails() {
    let (api, _) = spawn_counts_server(&[(
        "/api/mod/stats",
        503,
        json!({"message": "maintenance"}),
    )])
    .await;

    let err = fetch_dashboard_stats(&api).await.expect_err("no stats");

    assert_eq!(
        err,
        FetchError::ServerError {
            status: 503,
            message: "maintenance".into()
        }
    );
}
