//! The HTTP API end to end, over loopback.

use std::sync::Arc;

use reqwest::StatusCode;
use tokio::net::TcpListener;
use watchout_protocols::{AddPlayerResponse, AverageResponse, HeartRateReport, PeerInfo, RegisterRequest};
use watchout_registry::{build_router, AppContext};

async fn serve() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(Arc::new(AppContext::default()));
    tokio::spawn(async move { axum::serve(listener, app).await });
    format!("http://{addr}")
}

fn register(id: u32) -> RegisterRequest {
    RegisterRequest {
        id,
        address: "127.0.0.1".into(),
        port: 50_000 + id as u16,
    }
}

#[tokio::test]
async fn registration_and_conflict() {
    let base = serve().await;
    let http = reqwest::Client::new();

    let first: AddPlayerResponse = http
        .post(format!("{base}/players/add"))
        .json(&register(1))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(first.players.is_empty());

    let second: AddPlayerResponse = http
        .post(format!("{base}/players/add"))
        .json(&register(2))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second.players.len(), 1);
    assert_eq!(second.players[0].id, 1);

    let conflict = http
        .post(format!("{base}/players/add"))
        .json(&register(1))
        .send()
        .await
        .unwrap();
    assert_eq!(conflict.status(), StatusCode::CONFLICT);

    let players: Vec<PeerInfo> = http
        .get(format!("{base}/players/get-all"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<u32> = players.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert!(players.iter().all(|p| p.position.is_on_perimeter()));
}

#[tokio::test]
async fn heart_rate_statistics() {
    let base = serve().await;
    let http = reqwest::Client::new();

    let empty = http
        .get(format!("{base}/players/heart-rate/average/between-time?t1=0&t2=10"))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    for (timestamp, averages) in [(100, vec![60.0, 80.0]), (200, vec![90.0])] {
        let status = http
            .post(format!("{base}/players/heart-rate"))
            .json(&HeartRateReport { id: 4, timestamp, averages })
            .send()
            .await
            .unwrap()
            .status();
        assert!(status.is_success());
    }

    let last: AverageResponse = http
        .get(format!("{base}/players/heart-rate/average/last-n?n=2&player=4"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(last.average, 85.0);

    let too_many = http
        .get(format!("{base}/players/heart-rate/average/last-n?n=9&player=4"))
        .send()
        .await
        .unwrap();
    assert_eq!(too_many.status(), StatusCode::BAD_REQUEST);

    let unknown = http
        .get(format!("{base}/players/heart-rate/average/last-n?n=1&player=5"))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let between: AverageResponse = http
        .get(format!("{base}/players/heart-rate/average/between-time?t1=150&t2=50"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(between.average, 70.0);

    let outside = http
        .get(format!("{base}/players/heart-rate/average/between-time?t1=300&t2=400"))
        .send()
        .await
        .unwrap();
    assert_eq!(outside.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_and_broadcast() {
    let base = serve().await;
    let http = reqwest::Client::new();

    let health = http.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(health.text().await.unwrap(), "OK");

    let reply: serde_json::Value = http
        .post(format!("{base}/broadcast"))
        .json(&serde_json::json!({ "message": "hello" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reply["delivered"], 0);
}
