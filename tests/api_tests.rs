use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use showtrack_api::api::{create_router, AppState};

fn create_test_server() -> TestServer {
    let state = AppState::in_memory();
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

async fn create_user(server: &TestServer, username: &str) -> (i64, i64) {
    let response = server
        .post("/users")
        .json(&json!({ "username": username }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let user: Value = response.json();
    (
        user["user_id"].as_i64().unwrap(),
        user["watchlist_id"].as_i64().unwrap(),
    )
}

async fn add_show(server: &TestServer, kind: &str, name: &str, genres: &[&str], released: &str) -> i64 {
    let response = server
        .post("/admin/shows")
        .json(&json!({
            "kind": kind,
            "name": name,
            "description": format!("About {}", name),
            "genres": genres,
            "release_date": released
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let show: Value = response.json();
    show["show_id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server();
    let request_id = "6f1c1d1e-7a44-4a39-9c1a-2a4a4b0c9d11";

    let response = server
        .get("/health")
        .add_header(
            axum::http::HeaderName::from_static("x-request-id"),
            axum::http::HeaderValue::from_static(request_id),
        )
        .await;

    assert_eq!(response.header("x-request-id"), request_id);
}

#[tokio::test]
async fn test_create_and_list_shows() {
    let server = create_test_server();

    add_show(&server, "series", "The Expanse", &["Sci-Fi", "Drama"], "2015-12-14").await;
    add_show(&server, "movie", "Arrival", &["Sci-Fi"], "2016-11-11").await;

    let response = server.get("/shows").await;
    response.assert_status_ok();
    let shows: Vec<Value> = response.json();
    assert_eq!(shows.len(), 2);
    // movies are listed before series
    assert_eq!(shows[0]["name"], "Arrival");
    assert_eq!(shows[0]["kind"], "movie");
    assert_eq!(shows[1]["kind"], "series");
    assert_eq!(shows[1]["genres"], json!(["Sci-Fi", "Drama"]));

    let response = server.get("/shows/new").await;
    let newest: Vec<Value> = response.json();
    assert_eq!(newest[0]["name"], "Arrival");
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let server = create_test_server();
    create_user(&server, "dana").await;

    let response = server
        .post("/users")
        .json(&json!({ "username": "dana" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_change_status_flow() {
    let server = create_test_server();
    let (user_id, watchlist_id) = create_user(&server, "dana").await;
    let show_id = add_show(&server, "movie", "Heat", &["Crime"], "1995-12-15").await;
    let path = format!("/watchlists/{}/shows/{}", watchlist_id, show_id);

    let response = server.put(&path).json(&json!({ "status": "Watching" })).await;
    response.assert_status_ok();
    let change: Value = response.json();
    assert_eq!(change["status"], "Watching");
    assert_eq!(change["created"], true);

    let response = server.put(&path).json(&json!({ "status": "Completed" })).await;
    let change: Value = response.json();
    assert_eq!(change["status"], "Completed");
    assert_eq!(change["created"], false);

    let response = server.get(&format!("/users/{}/list", user_id)).await;
    response.assert_status_ok();
    let list: Value = response.json();
    let completed = list["shows_by_status"]["Completed"].as_array().unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0]["name"], "Heat");
    assert!(list["shows_by_status"].get("Watching").is_none());
}

#[tokio::test]
async fn test_change_status_rejects_unknown_status() {
    let server = create_test_server();
    let (_, watchlist_id) = create_user(&server, "dana").await;
    let show_id = add_show(&server, "movie", "Heat", &["Crime"], "1995-12-15").await;

    let response = server
        .put(&format!("/watchlists/{}/shows/{}", watchlist_id, show_id))
        .json(&json!({ "status": "Paused" }))
        .await;

    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_change_status_unknown_watchlist() {
    let server = create_test_server();
    let show_id = add_show(&server, "movie", "Heat", &["Crime"], "1995-12-15").await;

    let response = server
        .put(&format!("/watchlists/404/shows/{}", show_id))
        .json(&json!({ "status": "Planned" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_review_and_show_page() {
    let server = create_test_server();
    let (user_id, _) = create_user(&server, "dana").await;
    let alien = add_show(&server, "movie", "Alien", &["Horror", "Sci-Fi"], "1979-05-25").await;
    add_show(&server, "movie", "Aliens", &["Action", "Horror", "Sci-Fi"], "1986-07-18").await;
    add_show(&server, "series", "Friends", &["Comedy"], "1994-09-22").await;

    let response = server
        .put(&format!("/users/{}/shows/{}/review", user_id, alien))
        .json(&json!({ "rating": 5, "review": "Perfect" }))
        .await;
    response.assert_status_ok();
    let review: Value = response.json();
    assert_eq!(review["rating"], 5);

    let response = server.get(&format!("/users/{}/shows/{}", user_id, alien)).await;
    response.assert_status_ok();
    let page: Value = response.json();
    assert_eq!(page["show"]["name"], "Alien");
    assert_eq!(page["genre_list"], "Horror, Sci-Fi");
    assert_eq!(page["review_count"], 1);
    assert_eq!(page["user_review"]["review"], "Perfect");
    assert_eq!(page["score_distribution"]["5"], 1);
    assert_eq!(page["score_distribution"]["1"], 0);
    assert_eq!(page["status_distribution"]["Planned"], 0);
    // the viewed show shares all of its genres with itself
    let similar: Vec<&str> = page["similar_shows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|show| show["name"].as_str().unwrap())
        .collect();
    assert_eq!(similar, vec!["Alien", "Aliens"]);
}

#[tokio::test]
async fn test_review_rating_out_of_range() {
    let server = create_test_server();
    let (user_id, _) = create_user(&server, "dana").await;
    let show_id = add_show(&server, "movie", "Heat", &["Crime"], "1995-12-15").await;

    let response = server
        .put(&format!("/users/{}/shows/{}/review", user_id, show_id))
        .json(&json!({ "rating": 7, "review": "" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_home_page_lists() {
    let server = create_test_server();
    let (user_id, _) = create_user(&server, "dana").await;
    let x = add_show(&server, "movie", "X", &["Horror"], "2022-03-18").await;
    let y = add_show(&server, "movie", "Y", &["Comedy"], "2021-01-01").await;
    add_show(&server, "series", "Chucky", &["Horror"], "2021-10-12").await;
    add_show(&server, "series", "Ted Lasso", &["Comedy"], "2020-08-14").await;

    for (show_id, rating) in [(x, 5), (y, 3)] {
        server
            .put(&format!("/users/{}/shows/{}/review", user_id, show_id))
            .json(&json!({ "rating": rating }))
            .await
            .assert_status_ok();
    }

    let response = server.get(&format!("/users/{}/home", user_id)).await;
    response.assert_status_ok();
    let home: Value = response.json();

    assert_eq!(home["new_releases"].as_array().unwrap().len(), 4);
    assert_eq!(home["new_releases"][0]["name"], "X");

    let trending = home["trending"].as_array().unwrap();
    assert_eq!(trending.len(), 1);
    assert_eq!(trending[0]["name"], "X");

    let recommended = home["recommended"].as_array().unwrap();
    assert_eq!(recommended.len(), 1);
    assert_eq!(recommended[0]["name"], "Chucky");
}

#[tokio::test]
async fn test_home_for_unknown_user() {
    let server = create_test_server();
    let response = server.get("/users/12/home").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search() {
    let server = create_test_server();
    let (user_id, _) = create_user(&server, "dana").await;
    add_show(&server, "series", "Dark", &["Mystery"], "2017-12-01").await;
    add_show(&server, "movie", "The Dark Knight", &["Action"], "2008-07-18").await;

    let response = server
        .get(&format!("/users/{}/search", user_id))
        .add_query_param("q", "dark")
        .await;
    response.assert_status_ok();
    let page: Value = response.json();
    assert_eq!(page["show"]["name"], "The Dark Knight");

    let response = server
        .get(&format!("/users/{}/search", user_id))
        .add_query_param("q", "nothing like this")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let error: Value = response.json();
    assert_eq!(error["error"], "No search result, please check again");
}

#[tokio::test]
async fn test_import_skips_malformed_records() {
    let server = create_test_server();

    let response = server
        .post("/admin/shows/import")
        .json(&json!([
            {
                "kind": "movie",
                "name": "Heat",
                "genre": "['Crime', 'Thriller']",
                "release_date": "1995-12-15"
            },
            {
                "kind": "series",
                "name": "Broken",
                "genre": "Crime; Drama",
                "release_date": "2001-01-01"
            }
        ]))
        .await;
    response.assert_status_ok();
    let report: Value = response.json();
    assert_eq!(report["imported"].as_array().unwrap().len(), 1);
    assert_eq!(report["skipped"][0]["name"], "Broken");

    let shows: Vec<Value> = server.get("/shows").await.json();
    assert_eq!(shows.len(), 1);
    assert_eq!(shows[0]["genres"], json!(["Crime", "Thriller"]));
}
