mod common;

use petsim::server::handle_connection;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

async fn exchange(lines: &[&str], max_line_bytes: usize) -> Vec<Value> {
    let (service, _clock) = common::memory_service(common::noon());
    let (client, server) = tokio::io::duplex(64 * 1024);
    let task = tokio::spawn(handle_connection(service, server, max_line_bytes));

    let (read_half, mut write_half) = tokio::io::split(client);
    for line in lines {
        write_half.write_all(line.as_bytes()).await.unwrap();
        write_half.write_all(b"\n").await.unwrap();
    }
    write_half.shutdown().await.unwrap();

    let mut responses = Vec::new();
    let mut reader = BufReader::new(read_half).lines();
    while let Some(line) = reader.next_line().await.unwrap() {
        responses.push(serde_json::from_str(&line).expect("response is json"));
    }
    task.await.unwrap().unwrap();
    responses
}

#[tokio::test]
async fn adopt_feed_and_get_over_the_wire() {
    let responses = exchange(
        &[
            r#"{"op":"adopt","user":"alice","type":"fox"}"#,
            r#"{"op":"feed","user":"alice"}"#,
            r#"{"op":"get","user":"alice"}"#,
        ],
        4096,
    )
    .await;

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["status"], "ok");
    assert_eq!(responses[0]["created"], true);
    assert_eq!(responses[0]["pet"]["type"], "fox");

    assert_eq!(responses[1]["message"], "Pet fed successfully");
    assert_eq!(responses[1]["pet"]["hunger"], 65);
    assert_eq!(responses[1]["pet"]["eyes"], "normal");
    assert_eq!(responses[1]["effects"]["unlocked"][0], "firstMeal");
    assert_eq!(responses[1]["state"]["counters"]["feedCount"], 1);

    assert_eq!(responses[2]["pet"]["achievements"][0], "firstMeal");
}

#[tokio::test]
async fn error_statuses_map_to_protocol() {
    let responses = exchange(
        &[
            r#"{"op":"feed","user":"ghost"}"#,
            r#"{"op":"adopt","user":"alice","type":"dragon"}"#,
            "this is not json",
            r#"{"op":"adopt","user":"alice"}"#,
            r#"{"op":"change_type","user":"alice"}"#,
            r#"{"op":"change_type","user":"alice","type":"dragon"}"#,
            r#"{"op":"sleep","user":"alice"}"#,
            r#"{"op":"play","user":"alice"}"#,
        ],
        4096,
    )
    .await;

    let statuses: Vec<&str> = responses.iter().map(|r| r["status"].as_str().unwrap()).collect();
    assert_eq!(
        statuses,
        vec!["not_found", "bad_request", "bad_request", "ok", "bad_request", "bad_request", "ok", "refused"]
    );
    assert_eq!(responses[0]["message"], "Pet not found");
    assert_eq!(responses[4]["message"], "Pet type is required");
    assert_eq!(responses[7]["pet"]["isSleeping"], true);
}

#[tokio::test]
async fn leaderboard_stats_and_health() {
    let responses = exchange(
        &[
            r#"{"op":"adopt","user":"alice"}"#,
            r#"{"op":"adopt","user":"bob","type":"dog"}"#,
            r#"{"op":"clean","user":"bob"}"#,
            r#"{"op":"leaderboard","limit":5}"#,
            r#"{"op":"stats"}"#,
            r#"{"op":"user_stats","user":"bob"}"#,
            r#"{"op":"health"}"#,
        ],
        4096,
    )
    .await;

    let board = responses[3]["leaderboard"].as_array().unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0]["userId"], "bob");
    assert_eq!(board[0]["happiness"], 80);

    assert_eq!(responses[4]["stats"]["totalPets"], 2);
    assert_eq!(responses[4]["stats"]["mostPopularType"], "cat");
    assert_eq!(responses[5]["user_stats"]["totalInteractions"], 1);
    assert!(responses[6]["metrics"]["actions"]["clean"]["applied"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn oversized_line_closes_connection() {
    let long = format!(r#"{{"op":"get","user":"{}"}}"#, "a".repeat(500));
    let responses = exchange(&[long.as_str(), r#"{"op":"health"}"#], 128).await;
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["status"], "bad_request");
    assert_eq!(responses[0]["message"], "Request line too long");
}
