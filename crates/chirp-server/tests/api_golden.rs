// SPDX-License-Identifier: MIT
//! End-to-end contract tests over a real listener: raw HTTP in, JSON out,
//! asserting the exact envelopes and messages clients depend on.

use chirp_server::{build_router, ApiConfig, AppState};
use chirp_store::MemoryStore;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

struct TestApp {
    addr: SocketAddr,
    // Held so uploaded media outlives the requests that wrote it.
    _media: TempDir,
}

async fn spawn_app() -> TestApp {
    let media = tempfile::tempdir().expect("tempdir");
    let api = ApiConfig {
        media_root: media.path().to_path_buf(),
        ..ApiConfig::default()
    };
    let state = AppState::new(Arc::new(MemoryStore::new()), api);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    TestApp {
        addr,
        _media: media,
    }
}

async fn send_raw(
    addr: SocketAddr,
    method: &str,
    path: &str,
    token: Option<&str>,
    content_type: Option<&str>,
    body: &[u8],
) -> (u16, String, Value) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut head = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    if let Some(token) = token {
        head.push_str(&format!("Authorization: Bearer {token}\r\n"));
    }
    if let Some(ct) = content_type {
        head.push_str(&format!("Content-Type: {ct}\r\n"));
    }
    head.push_str(&format!("Content-Length: {}\r\n\r\n", body.len()));

    stream.write_all(head.as_bytes()).await.expect("write head");
    stream.write_all(body).await.expect("write body");
    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("read response");
    let response = String::from_utf8(response).expect("utf8 response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status");
    let parsed = serde_json::from_str(body).unwrap_or(Value::Null);
    (status, head.to_string(), parsed)
}

async fn post_json(addr: SocketAddr, path: &str, token: Option<&str>, body: &Value) -> (u16, Value) {
    let bytes = serde_json::to_vec(body).expect("encode body");
    let (status, _, json) = send_raw(addr, "POST", path, token, Some("application/json"), &bytes).await;
    (status, json)
}

async fn put_json(addr: SocketAddr, path: &str, token: Option<&str>, body: &Value) -> (u16, Value) {
    let bytes = serde_json::to_vec(body).expect("encode body");
    let (status, _, json) = send_raw(addr, "PUT", path, token, Some("application/json"), &bytes).await;
    (status, json)
}

async fn get(addr: SocketAddr, path: &str, token: Option<&str>) -> (u16, Value) {
    let (status, _, json) = send_raw(addr, "GET", path, token, None, b"").await;
    (status, json)
}

async fn post_empty(addr: SocketAddr, path: &str, token: Option<&str>) -> (u16, Value) {
    let (status, _, json) = send_raw(addr, "POST", path, token, None, b"").await;
    (status, json)
}

async fn delete(addr: SocketAddr, path: &str, token: Option<&str>) -> (u16, Value) {
    let (status, _, json) = send_raw(addr, "DELETE", path, token, None, b"").await;
    (status, json)
}

const BOUNDARY: &str = "----chirp-test-boundary";

fn multipart_text(body: &mut Vec<u8>, name: &str, value: &str) {
    body.extend_from_slice(
        format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
            .as_bytes(),
    );
}

fn multipart_file(body: &mut Vec<u8>, name: &str, file_name: &str, mime: &str, bytes: &[u8]) {
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
}

fn multipart_close(body: &mut Vec<u8>) {
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
}

async fn post_multipart(
    addr: SocketAddr,
    path: &str,
    token: Option<&str>,
    body: Vec<u8>,
) -> (u16, Value) {
    let ct = format!("multipart/form-data; boundary={BOUNDARY}");
    let (status, _, json) = send_raw(addr, "POST", path, token, Some(&ct), &body).await;
    (status, json)
}

async fn register(addr: SocketAddr, name: &str, email: &str) -> u16 {
    let (status, _) = post_json(
        addr,
        "/api/auth/register",
        None,
        &json!({
            "fullName": format!("{name} Example"),
            "userName": name,
            "email": email,
            "password": "hunter2-but-longer",
        }),
    )
    .await;
    status
}

async fn login(addr: SocketAddr, login: &str) -> (String, String) {
    let (status, body) = post_json(
        addr,
        "/api/auth/login",
        None,
        &json!({"emailOruserName": login, "password": "hunter2-but-longer"}),
    )
    .await;
    assert_eq!(status, 200, "login failed: {body}");
    let token = body["result"]["token"].as_str().expect("token").to_string();
    let id = body["result"]["user"]["_id"]
        .as_str()
        .expect("user id")
        .to_string();
    (token, id)
}

#[tokio::test]
async fn golden_register_login_tweet_flow() {
    let app = spawn_app().await;
    let addr = app.addr;

    assert_eq!(register(addr, "alice", "alice@example.com").await, 201);
    assert_eq!(register(addr, "bob", "bob@example.com").await, 201);

    // Duplicate email is a conflict reported as Bad Request.
    let (status, body) = post_json(
        addr,
        "/api/auth/register",
        None,
        &json!({
            "fullName": "Alice Again",
            "userName": "alice2",
            "email": "alice@example.com",
            "password": "hunter2-but-longer",
        }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "User with this email already registered");

    // Unknown user and wrong password collapse to the same 401.
    let (status, body) = post_json(
        addr,
        "/api/auth/login",
        None,
        &json!({"emailOruserName": "alice", "password": "wrong"}),
    )
    .await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "Invalid Credentials");

    let (alice_token, alice_id) = login(addr, "alice").await;
    let (bob_token, _bob_id) = login(addr, "bob@example.com").await;

    let mut form = Vec::new();
    multipart_text(&mut form, "content", "first chirp");
    multipart_close(&mut form);
    let (status, body) = post_multipart(addr, "/api/tweet", Some(&alice_token), form).await;
    assert_eq!(status, 201, "create tweet: {body}");
    assert_eq!(body["message"], "Tweet created successfully");
    assert_eq!(body["tweet"]["content"], "first chirp");
    assert_eq!(body["tweet"]["tweetedBy"]["userName"], "alice");
    assert_eq!(body["tweet"]["isReply"], false);
    assert!(body["tweet"]["image"].is_null());
    let tweet_id = body["tweet"]["_id"].as_str().expect("tweet id").to_string();

    let (status, body) = post_empty(
        addr,
        &format!("/api/tweet/{tweet_id}/like"),
        Some(&bob_token),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Tweet liked successfully");
    assert_eq!(body["tweet"]["likes"].as_array().map(Vec::len), Some(1));

    let (status, body) = post_empty(
        addr,
        &format!("/api/tweet/{tweet_id}/like"),
        Some(&bob_token),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "You have already liked this tweet");

    let (status, body) = post_empty(
        addr,
        &format!("/api/tweet/{tweet_id}/dislike"),
        Some(&bob_token),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["tweet"]["likes"].as_array().map(Vec::len), Some(0));

    let (status, body) = post_empty(
        addr,
        &format!("/api/tweet/{tweet_id}/dislike"),
        Some(&bob_token),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "You have not liked this tweet to dislike");

    let (status, body) = post_empty(
        addr,
        &format!("/api/tweet/{tweet_id}/retweet"),
        Some(&bob_token),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Tweet retweeted successfully");
    let (status, body) = post_empty(
        addr,
        &format!("/api/tweet/{tweet_id}/retweet"),
        Some(&bob_token),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "You have already retweeted this tweet");

    // Listing shows the populated owner, newest first.
    let (status, body) = get(addr, "/api/tweet", Some(&bob_token)).await;
    assert_eq!(status, 200);
    let tweets = body["tweets"].as_array().expect("tweets array");
    assert_eq!(tweets.len(), 1);
    assert_eq!(tweets[0]["tweetedBy"]["_id"], Value::String(alice_id.clone()));
    assert!(tweets[0]["tweetedBy"].get("passwordHash").is_none());

    let (status, body) = get(addr, &format!("/api/user/{alice_id}/tweets"), Some(&bob_token)).await;
    assert_eq!(status, 200);
    assert_eq!(body["tweets"].as_array().map(Vec::len), Some(1));

    let (status, body) = get(addr, "/api/tweet/nope", Some(&bob_token)).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Tweet not found");
}

#[tokio::test]
async fn missing_or_garbage_token_gets_the_single_401() {
    let app = spawn_app().await;
    let addr = app.addr;

    let (status, body) = get(addr, "/api/tweet", None).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "User not logged in");

    let (status, body) = get(addr, "/api/tweet", Some("not-a-jwt")).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "User not logged in");

    let (status, body) = post_empty(addr, "/api/tweet/abc/like", None).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "User not logged in");

    // Health stays open.
    let (status, body) = get(addr, "/healthz", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn mandatory_field_checks_on_register_and_login() {
    let app = spawn_app().await;
    let addr = app.addr;

    let (status, body) = post_json(
        addr,
        "/api/auth/register",
        None,
        &json!({"fullName": "No Email", "userName": "noemail", "password": "hunter2-but-longer"}),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "One or more mandatory fields are empty");

    let (status, body) = post_json(
        addr,
        "/api/auth/login",
        None,
        &json!({"emailOruserName": "someone"}),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "One or more mandatory fields are empty");
}

#[tokio::test]
async fn reply_lifecycle_and_delete_permissions() {
    let app = spawn_app().await;
    let addr = app.addr;
    assert_eq!(register(addr, "alice", "alice@example.com").await, 201);
    assert_eq!(register(addr, "bob", "bob@example.com").await, 201);
    let (alice_token, _) = login(addr, "alice").await;
    let (bob_token, _) = login(addr, "bob").await;

    let mut form = Vec::new();
    multipart_text(&mut form, "content", "parent tweet");
    multipart_close(&mut form);
    let (_, body) = post_multipart(addr, "/api/tweet", Some(&alice_token), form).await;
    let parent_id = body["tweet"]["_id"].as_str().expect("id").to_string();

    let (status, body) = post_json(
        addr,
        &format!("/api/tweet/{parent_id}/reply"),
        Some(&bob_token),
        &json!({"content": ""}),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Content is required for a reply");

    let (status, body) = post_json(
        addr,
        &format!("/api/tweet/{parent_id}/reply"),
        Some(&bob_token),
        &json!({"content": "bob replies"}),
    )
    .await;
    assert_eq!(status, 201, "reply: {body}");
    assert_eq!(body["message"], "Reply created successfully");
    let replies = body["tweet"]["replies"].as_array().expect("replies");
    assert_eq!(replies.len(), 1);
    let reply_id = replies[0].as_str().expect("reply id").to_string();

    // The reply is its own record, flagged as a reply.
    let (status, body) = get(addr, &format!("/api/tweet/{reply_id}"), Some(&alice_token)).await;
    assert_eq!(status, 200);
    assert_eq!(body["tweet"]["isReply"], true);
    assert_eq!(body["tweet"]["content"], "bob replies");

    // Only the reply's author may delete it.
    let (status, body) = delete(
        addr,
        &format!("/api/tweet/{parent_id}?replyId={reply_id}"),
        Some(&alice_token),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "Unauthorized action");

    let (status, body) = delete(
        addr,
        &format!("/api/tweet/{parent_id}?replyId={reply_id}"),
        Some(&bob_token),
    )
    .await;
    assert_eq!(status, 200, "delete reply: {body}");
    assert_eq!(body["message"], "Reply deleted successfully.");
    assert_eq!(
        body["parentTweet"]["replies"].as_array().map(Vec::len),
        Some(0)
    );

    // Deleting a parent does not cascade; only its author may do it.
    let (status, body) = delete(addr, &format!("/api/tweet/{parent_id}"), Some(&bob_token)).await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "Unauthorized action");
    let (status, body) = delete(addr, &format!("/api/tweet/{parent_id}"), Some(&alice_token)).await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Tweet deleted successfully.");
    let (status, _) = get(addr, &format!("/api/tweet/{parent_id}"), Some(&alice_token)).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn follow_graph_round_trip_and_conflicts() {
    let app = spawn_app().await;
    let addr = app.addr;
    assert_eq!(register(addr, "alice", "alice@example.com").await, 201);
    assert_eq!(register(addr, "bob", "bob@example.com").await, 201);
    let (alice_token, alice_id) = login(addr, "alice").await;
    let (bob_token, bob_id) = login(addr, "bob").await;

    let (status, body) = post_empty(
        addr,
        &format!("/api/user/{alice_id}/follow"),
        Some(&bob_token),
    )
    .await;
    assert_eq!(status, 200, "follow: {body}");
    assert_eq!(body["success"], true);

    let (status, body) = post_empty(
        addr,
        &format!("/api/user/{alice_id}/follow"),
        Some(&bob_token),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "You are already following this user");

    let (status, body) = post_empty(
        addr,
        &format!("/api/user/{bob_id}/follow"),
        Some(&bob_token),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "You cannot follow yourself");

    // Both sides of the edge are visible on the profiles.
    let (status, body) = get(addr, &format!("/api/user/{alice_id}"), Some(&alice_token)).await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["followers"], json!([bob_id.clone()]));
    let (_, body) = get(addr, &format!("/api/user/{bob_id}"), Some(&alice_token)).await;
    assert_eq!(body["result"]["following"], json!([alice_id.clone()]));

    let (status, body) = post_empty(
        addr,
        &format!("/api/user/{alice_id}/unfollow"),
        Some(&bob_token),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    let (status, body) = post_empty(
        addr,
        &format!("/api/user/{alice_id}/unfollow"),
        Some(&bob_token),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "You are already not following this user");

    let (_, body) = get(addr, &format!("/api/user/{alice_id}"), Some(&alice_token)).await;
    assert_eq!(body["result"]["followers"], json!([]));
}

#[tokio::test]
async fn profile_update_rules() {
    let app = spawn_app().await;
    let addr = app.addr;
    assert_eq!(register(addr, "alice", "alice@example.com").await, 201);
    assert_eq!(register(addr, "bob", "bob@example.com").await, 201);
    let (alice_token, alice_id) = login(addr, "alice").await;
    let (_, bob_id) = login(addr, "bob").await;

    // Profile reads use `id`, not `_id`.
    let (status, body) = get(addr, &format!("/api/user/{alice_id}"), Some(&alice_token)).await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["id"], Value::String(alice_id.clone()));
    assert!(body["result"].get("_id").is_none());

    let (status, body) = put_json(
        addr,
        &format!("/api/user/{bob_id}"),
        Some(&alice_token),
        &json!({"location": "elsewhere"}),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "You can only update your own profile");

    let (status, body) = put_json(
        addr,
        &format!("/api/user/{alice_id}"),
        Some(&alice_token),
        &json!({"email": "new@example.com"}),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Field 'email' is not allowed to be updated");

    let (status, body) = put_json(
        addr,
        &format!("/api/user/{alice_id}"),
        Some(&alice_token),
        &json!({}),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "At least one field is required to update");

    let (status, body) = put_json(
        addr,
        &format!("/api/user/{alice_id}"),
        Some(&alice_token),
        &json!({"fullName": "Alice Rewritten", "location": "Harbor", "dateOfBirth": "1990-04-02"}),
    )
    .await;
    assert_eq!(status, 200, "update: {body}");
    assert_eq!(body["result"]["fullName"], "Alice Rewritten");
    assert_eq!(body["result"]["location"], "Harbor");
    assert_eq!(body["result"]["dateOfBirth"], "1990-04-02");
}

#[tokio::test]
async fn media_upload_and_profile_pic_redirect() {
    let app = spawn_app().await;
    let addr = app.addr;
    assert_eq!(register(addr, "alice", "alice@example.com").await, 201);
    let (alice_token, alice_id) = login(addr, "alice").await;

    // The avatar redirect sits behind the auth gate like every user route.
    let (status, body) = get(addr, &format!("/api/user/{alice_id}/profilePic"), None).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "User not logged in");

    // Registration always assigns a default avatar, so the redirect fires
    // before any upload too.
    let (status, head, _) = send_raw(
        addr,
        "GET",
        &format!("/api/user/{alice_id}/profilePic"),
        Some(&alice_token),
        None,
        b"",
    )
    .await;
    assert_eq!(status, 302);
    assert!(head.to_ascii_lowercase().contains("location:"));

    let mut form = Vec::new();
    multipart_close(&mut form);
    let (status, body) = post_multipart(
        addr,
        &format!("/api/user/{alice_id}/uploadProfilePic"),
        Some(&alice_token),
        form,
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Please upload a valid image file (JPEG/PNG)");

    let mut form = Vec::new();
    multipart_file(&mut form, "profilePic", "me.gif", "image/gif", b"gif-bytes");
    multipart_close(&mut form);
    let (status, body) = post_multipart(
        addr,
        &format!("/api/user/{alice_id}/uploadProfilePic"),
        Some(&alice_token),
        form,
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(
        body["error"],
        "File upload only supports the following filetypes - jpeg|jpg|png"
    );

    let mut form = Vec::new();
    multipart_file(&mut form, "profilePic", "me.png", "image/png", b"png-bytes");
    multipart_close(&mut form);
    let (status, body) = post_multipart(
        addr,
        &format!("/api/user/{alice_id}/uploadProfilePic"),
        Some(&alice_token),
        form,
    )
    .await;
    assert_eq!(status, 200, "upload: {body}");
    assert_eq!(body["result"], "Profile picture uploaded successfully");
    let img = body["user"]["profileImg"].as_str().expect("profileImg");
    assert!(img.contains("/images/profilePic-"), "unexpected url: {img}");

    let (status, head, _) = send_raw(
        addr,
        "GET",
        &format!("/api/user/{alice_id}/profilePic"),
        Some(&alice_token),
        None,
        b"",
    )
    .await;
    assert_eq!(status, 302);
    assert!(
        head.to_ascii_lowercase().contains("location:") && head.contains("/images/profilePic-"),
        "redirect must point at the uploaded file: {head}"
    );

    // Tweets carry an absolute image URL when one was attached.
    let mut form = Vec::new();
    multipart_text(&mut form, "content", "with picture");
    multipart_file(&mut form, "image", "snap.jpg", "image/jpeg", b"jpg-bytes");
    multipart_close(&mut form);
    let (status, body) = post_multipart(addr, "/api/tweet", Some(&alice_token), form).await;
    assert_eq!(status, 201, "tweet with image: {body}");
    let img = body["tweet"]["image"].as_str().expect("image url");
    assert!(img.contains("/images/tweets/tweet-"), "unexpected url: {img}");

    // An unknown form field rejects the whole request.
    let mut form = Vec::new();
    multipart_text(&mut form, "content", "x");
    multipart_text(&mut form, "extra", "y");
    multipart_close(&mut form);
    let (status, body) = post_multipart(addr, "/api/tweet", Some(&alice_token), form).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Field 'extra' is not allowed in this request");
}

#[tokio::test]
async fn request_id_is_minted_or_echoed() {
    let app = spawn_app().await;
    let addr = app.addr;

    let (_, head, _) = send_raw(addr, "GET", "/healthz", None, None, b"").await;
    assert!(
        head.to_ascii_lowercase().contains("x-request-id:"),
        "missing x-request-id in: {head}"
    );

    let mut stream = tokio::net::TcpStream::connect(addr).await.expect("connect");
    let req = format!(
        "GET /healthz HTTP/1.1\r\nHost: {addr}\r\nx-request-id: caller-chose-this\r\nConnection: close\r\n\r\n"
    );
    stream.write_all(req.as_bytes()).await.expect("write");
    let mut response = String::new();
    stream.read_to_string(&mut response).await.expect("read");
    assert!(response.contains("caller-chose-this"));
}
