use axum::{Json, Router, http::StatusCode, routing::post};
use log::{error, info};
use crate::data::{MatchingInput, MatchingOutput};
use crate::solver;

async fn solve_handler(Json(input): Json<MatchingInput>) -> Result<Json<MatchingOutput>, (StatusCode, String)> {
    // trials are CPU-bound; keep them off the async workers
    let result = tokio::task::spawn_blocking(move || solver::solve(&input))
        .await
        .map_err(|e| {
            error!("Matching task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("matching task failed: {e}"))
        })?;

    match result {
        Ok(output) => Ok(Json(output)),
        Err(e) => Err((StatusCode::BAD_REQUEST, e.to_string())),
    }
}

pub fn router() -> Router {
    Router::new().route("/v1/match/solve", post(solve_handler))
}

pub async fn run_server(bind: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;

    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, router()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn post_json(body: Value) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method("POST")
            .uri("/v1/match/solve")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn solves_a_small_request() {
        let (status, body) = post_json(json!({
            "mentees": [
                { "name": "X", "program": "MS", "preferences": ["A", "", ""] },
                { "name": "Y", "program": "MS ", "preferences": ["B"] },
                { "name": "Z", "program": "MS", "preferences": [null, "", ""] }
            ],
            "mentors": [
                { "name": "A", "program": "MS", "capacity": 1 },
                { "name": "B", "program": "MS", "capacity": 1 }
            ],
            "config": { "ranks": [11, 0, 5, 2], "trials": 50, "seed": 7 }
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        let output: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(output["score"], 0);
        assert_eq!(output["trials"], 50);
        assert_eq!(output["matches"].as_array().unwrap().len(), 2);
        assert_eq!(output["unmatched"], json!([{ "name": "Z", "program": "MS" }]));
        assert_eq!(output["summary"][0], json!({ "label": "First Choice", "rank": 0, "count": 2 }));
        assert!(output.get("bestTrial").is_some());
    }

    #[tokio::test]
    async fn rejects_bad_rank_list() {
        let (status, body) = post_json(json!({
            "mentees": [],
            "mentors": [],
            "config": { "ranks": [0, 1, 2] }
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(String::from_utf8(body).unwrap().contains("`ranks`"));
    }

    #[tokio::test]
    async fn rejects_mentor_listed_twice_in_one_program() {
        let (status, body) = post_json(json!({
            "mentees": [{ "name": "X", "program": "MS", "preferences": ["Turing"] }],
            "mentors": [
                { "name": "Turing", "program": "MS", "capacity": 1 },
                { "name": "Turing", "program": "MS", "capacity": 3 }
            ],
            "config": { "trials": 5 }
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = String::from_utf8(body).unwrap();
        assert!(message.contains("invalid mentor `Turing`"));
    }

    #[tokio::test]
    async fn rejects_unknown_program() {
        let (status, _) = post_json(json!({
            "mentees": [{ "name": "X", "program": "MBA" }],
            "mentors": []
        }))
        .await;

        assert!(status.is_client_error());
    }
}
