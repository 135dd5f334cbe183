use crate::interface_adapters::handlers::{
    leaderboard, list_rooms, single_player_leaderboard, submit_score,
};
use crate::interface_adapters::net::ws_handler;
use crate::interface_adapters::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/rooms", get(list_rooms))
        .route("/api/single-player/score", post(submit_score))
        .route(
            "/api/single-player/leaderboard",
            get(single_player_leaderboard),
        )
        .route("/api/leaderboard", get(leaderboard))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::room::Capacity;
    use crate::domain::{GameMode, RoomSettings, Visibility};
    use crate::frameworks::server::build_state;
    use crate::use_cases::MatchSettings;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    fn build_test_state() -> AppState {
        build_state(MatchSettings {
            slow_duration: Duration::from_secs(5),
            gravity_tick: None,
        })
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("expected response body");
        serde_json::from_slice(&body).expect("expected json body")
    }

    fn post_score(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/single-player/score")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("expected request to build")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .expect("expected request to build")
    }

    #[tokio::test]
    async fn when_score_is_valid_then_returns_201_with_stored_record() {
        let app = app(build_test_state());

        let response = app
            .oneshot(post_score(
                r#"{"player_name":"Ann","score":500,"lines":12,"level":2,"date":"2024-05-01"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let payload = json_body(response).await;
        assert_eq!(payload["message"], "Score saved successfully");
        assert_eq!(payload["score"]["player_name"], "Ann");
        assert_eq!(payload["score"]["score"], 500);
        assert_eq!(payload["score"]["date"], "2024-05-01");
    }

    #[tokio::test]
    async fn when_player_name_is_missing_then_returns_400_and_error_message() {
        let app = app(build_test_state());

        let response = app.oneshot(post_score(r#"{"score":10}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload = json_body(response).await;
        assert_eq!(payload["error"], "player_name is required");
    }

    #[tokio::test]
    async fn when_score_is_negative_or_missing_then_returns_400() {
        let state = build_test_state();

        let negative = app(state.clone())
            .oneshot(post_score(r#"{"player_name":"Ann","score":-5}"#))
            .await
            .unwrap();
        let missing = app(state)
            .oneshot(post_score(r#"{"player_name":"Ann"}"#))
            .await
            .unwrap();

        assert_eq!(negative.status(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        let payload = json_body(negative).await;
        assert_eq!(payload["error"], "score must be a non-negative integer");
    }

    #[tokio::test]
    async fn when_score_body_is_malformed_then_returns_400_with_message() {
        let state = build_test_state();

        let wrong_type = app(state.clone())
            .oneshot(post_score(r#"{"player_name":"Ann","score":"lots"}"#))
            .await
            .unwrap();
        let not_json = app(state)
            .oneshot(post_score("{not json"))
            .await
            .unwrap();

        assert_eq!(wrong_type.status(), StatusCode::BAD_REQUEST);
        assert_eq!(not_json.status(), StatusCode::BAD_REQUEST);
        let payload = json_body(wrong_type).await;
        assert!(
            payload["error"]
                .as_str()
                .is_some_and(|message| message.starts_with("invalid score submission"))
        );
    }

    #[tokio::test]
    async fn when_scores_exist_then_leaderboard_ranks_and_limits_them() {
        let state = build_test_state();
        for body in [
            r#"{"player_name":"Bob","score":200}"#,
            r#"{"player_name":"Ann","score":500}"#,
            r#"{"player_name":"Cid","score":50}"#,
        ] {
            let response = app(state.clone()).oneshot(post_score(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app(state)
            .oneshot(get("/api/single-player/leaderboard?period=weekly&limit=2"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        assert_eq!(payload["period"], "weekly");
        assert_eq!(payload["total_scores"], 3);
        let entries = payload["leaderboard"].as_array().expect("array");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["rank"], 1);
        assert_eq!(entries[0]["player_name"], "Ann");
        assert_eq!(entries[1]["player_name"], "Bob");
    }

    #[tokio::test]
    async fn when_mode_is_multiplayer_then_standings_are_returned() {
        let state = build_test_state();
        state.orchestrator.register_player(1, "Ann".to_string());

        let response = app(state)
            .oneshot(get("/api/leaderboard?mode=multiplayer"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        assert_eq!(payload["mode"], "multiplayer");
        assert_eq!(payload["total_players"], 1);
        assert_eq!(payload["leaderboard"][0]["player_id"], "1");
        assert_eq!(payload["leaderboard"][0]["win_rate"], 0.0);
    }

    #[tokio::test]
    async fn when_mode_is_omitted_then_standings_are_returned() {
        let response = app(build_test_state())
            .oneshot(get("/api/leaderboard"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        assert_eq!(payload["mode"], "multiplayer");
        assert_eq!(payload["total_players"], 0);
    }

    #[tokio::test]
    async fn when_mode_is_single_player_then_score_board_is_returned() {
        let response = app(build_test_state())
            .oneshot(get("/api/leaderboard?mode=single-player"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        assert_eq!(payload["period"], "all");
        assert_eq!(payload["total_scores"], 0);
    }

    #[tokio::test]
    async fn when_rooms_are_listed_then_private_rooms_are_hidden() {
        let state = build_test_state();
        state.orchestrator.register_player(1, "Ann".to_string());
        for (id, visibility) in [("PUB001", Visibility::Public), ("PRV001", Visibility::Private)] {
            state.orchestrator.create_room(
                1,
                id.to_string(),
                RoomSettings {
                    name: "Arena".to_string(),
                    capacity: Capacity::try_from(2).expect("valid capacity"),
                    visibility,
                    mode: GameMode::Battle,
                },
            );
        }

        let response = app(state).oneshot(get("/api/rooms")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        let rooms = payload.as_array().expect("array");
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0]["id"], "PUB001");
        assert_eq!(rooms[0]["status"], "waiting");
        assert_eq!(rooms[0]["capacity"], 2);
    }

    #[tokio::test]
    async fn when_score_route_is_called_with_get_then_returns_405() {
        let response = app(build_test_state())
            .oneshot(get("/api/single-player/score"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
