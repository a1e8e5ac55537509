mod support;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use support::{connect, join, next_matching, next_of_type, send_json, unique_name};
use tokio_tungstenite::tungstenite::{Message, protocol::frame::coding::CloseCode};

#[tokio::test]
async fn when_client_joins_then_it_gets_its_identity_before_a_snapshot_containing_itself() {
    let mut ws = connect().await;
    let name = unique_name();

    send_json(&mut ws, json!({"type": "join", "name": name, "x": 0, "y": 0})).await;

    let me = next_of_type(&mut ws, "your_player").await;
    assert_eq!(me["name"], name.as_str());
    assert_eq!(me["x"], 0.0);
    let id = me["id"].as_str().expect("id").to_string();
    assert!(id.starts_with("player_"));

    // Identity and snapshot are queued together, so no broadcast can land between them.
    let snapshot = next_matching(&mut ws, |_| true).await;
    assert_eq!(snapshot["type"], "world_state");
    let players = snapshot["players"].as_array().expect("players");
    assert!(players.iter().any(|p| p["id"] == id.as_str()));
}

#[tokio::test]
async fn when_second_client_joins_then_first_sees_player_joined_and_then_player_left() {
    let mut first = connect().await;
    join(&mut first, &unique_name(), 0.0, 0.0).await;

    let mut second = connect().await;
    let aria = unique_name();
    let aria_id = join(&mut second, &aria, 0.0, 0.0).await;

    let joined = next_matching(&mut first, |v| {
        v["type"] == "player_joined" && v["id"] == aria_id.as_str()
    })
    .await;
    assert_eq!(
        joined,
        json!({"type": "player_joined", "id": aria_id, "name": aria, "x": 0.0, "y": 0.0})
    );

    second.close(None).await.expect("close");
    drop(second);

    let left = next_matching(&mut first, |v| {
        v["type"] == "player_left" && v["id"] == aria_id.as_str()
    })
    .await;
    assert_eq!(left, json!({"type": "player_left", "id": aria_id}));
}

#[tokio::test]
async fn when_player_moves_then_others_see_player_moved() {
    let mut watcher = connect().await;
    join(&mut watcher, &unique_name(), 0.0, 0.0).await;
    let mut mover = connect().await;
    let mover_id = join(&mut mover, &unique_name(), 0.0, 0.0).await;

    send_json(&mut mover, json!({"type": "move", "x": 20, "y": 10})).await;

    let moved = next_matching(&mut watcher, |v| {
        v["type"] == "player_moved" && v["id"] == mover_id.as_str()
    })
    .await;
    assert_eq!(moved["x"], 20.0);
    assert_eq!(moved["y"], 10.0);
}

#[tokio::test]
async fn when_players_are_too_far_apart_then_interaction_fails_for_requester() {
    let mut near = connect().await;
    join(&mut near, &unique_name(), 5000.0, 5000.0).await;
    let mut far = connect().await;
    let far_id = join(&mut far, &unique_name(), 5200.0, 5000.0).await;

    send_json(
        &mut near,
        json!({"type": "player_interact", "to_player_id": far_id, "interaction_type": "trade"}),
    )
    .await;

    let reply = next_of_type(&mut near, "interaction_result").await;
    assert_eq!(reply["result"]["success"], false);
    assert_eq!(reply["result"]["error"], "players too far apart");
}

#[tokio::test]
async fn when_polling_world_state_then_joined_player_is_listed() {
    let base_url = support::ensure_server();
    let mut ws = connect().await;
    let id = join(&mut ws, &unique_name(), 1.0, 2.0).await;

    let body: Value = reqwest::get(format!("{base_url}/world/state"))
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("json body");

    assert_eq!(body["type"], "world_state");
    let players = body["players"].as_array().expect("players");
    assert!(players.iter().any(|p| p["id"] == id.as_str()));
}

#[tokio::test]
async fn when_polling_status_then_server_reports_online() {
    let base_url = support::ensure_server();
    let mut ws = connect().await;
    join(&mut ws, &unique_name(), 0.0, 0.0).await;

    let res = reqwest::get(format!("{base_url}/status"))
        .await
        .expect("request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    let body: Value = res.json().await.expect("json body");
    assert_eq!(body["status"], "online");
    assert!(body["players"].as_u64().unwrap_or(0) >= 1);
    assert!(body["connections"].as_u64().unwrap_or(0) >= 1);
}

#[tokio::test]
async fn when_client_sends_binary_then_connection_is_closed_as_unsupported() {
    let mut ws = connect().await;

    ws.send(Message::binary(vec![1u8, 2, 3])).await.expect("send");

    let code = loop {
        match ws.next().await {
            Some(Ok(Message::Close(frame))) => break frame.map(|f| f.code),
            Some(Ok(_)) => continue,
            other => panic!("expected close frame, got {other:?}"),
        }
    };
    assert_eq!(code, Some(CloseCode::Unsupported));
}
