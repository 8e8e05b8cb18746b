//! End-to-end HTTP flows against a temporary SQLite database.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use uuid::Uuid;

use grupa_shared::{ChangeAction, EntityKind, ServerMessage};

use super::test_support::{TestServer, JOIN_CODE, MAX_UPLOAD_BYTES};

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

/// Ana creates a workspace and Bo joins it. Returns (server, ana, bo, workspace id).
async fn shared_workspace() -> (TestServer, String, String, String) {
    let server = TestServer::start().await;
    let (ana, _) = server.sign_in("ana@example.com", "Ana").await;
    let (bo, _) = server.sign_in("bo@example.com", "Bo").await;

    let (status, workspace) = server
        .send(
            Method::POST,
            "/api/workspaces",
            Some(&ana),
            Some(json!({ "name": "Kitchen crew" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let workspace_id = id_of(&workspace);

    let (status, _) = server
        .send(
            Method::POST,
            &format!("/api/workspaces/{}/join", workspace_id),
            Some(&bo),
            Some(json!({ "joinCode": JOIN_CODE })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    (server, ana, bo, workspace_id)
}

async fn general_channel(server: &TestServer, token: &str, workspace_id: &str) -> String {
    let (status, channels) = server
        .send(
            Method::GET,
            &format!("/api/workspaces/{}/channels", workspace_id),
            Some(token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let channels = channels.as_array().unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0]["name"], "general");
    id_of(&channels[0])
}

#[tokio::test]
async fn health_check_responds() {
    let server = TestServer::start().await;
    let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
    let response = tower::ServiceExt::oneshot(server.router.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let server = TestServer::start().await;

    let (status, body) = server.send(Method::GET, "/api/workspaces", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (status, _) = server
        .send(Method::GET, "/api/workspaces", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = server.send(Method::GET, "/api/users/me", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn sign_in_and_sign_out() {
    let server = TestServer::start().await;

    let (status, _) = server
        .send(
            Method::POST,
            "/api/auth/code",
            None,
            Some(json!({ "email": "ana@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = server
        .send(
            Method::POST,
            "/api/auth/verify",
            None,
            Some(json!({ "email": "ana@example.com", "code": "0000" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, session) = server
        .send(
            Method::POST,
            "/api/auth/verify",
            None,
            Some(json!({ "email": "ana@example.com", "code": "7777", "name": "Ana" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = session["token"].as_str().unwrap().to_string();
    assert_eq!(session["user"]["name"], "Ana");

    let (_, me) = server.send(Method::GET, "/api/users/me", Some(&token), None).await;
    assert_eq!(me["email"], "ana@example.com");

    let (status, _) = server
        .send(Method::POST, "/api/auth/sign-out", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, me) = server.send(Method::GET, "/api/users/me", Some(&token), None).await;
    assert_eq!(me, Value::Null);
}

#[tokio::test]
async fn joining_and_administering_a_workspace() {
    let (server, ana, bo, workspace_id) = shared_workspace().await;

    let (status, found) = server
        .send(Method::GET, &format!("/api/join-codes/{}", JOIN_CODE), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["name"], "Kitchen crew");

    let (_, members) = server
        .send(
            Method::GET,
            &format!("/api/workspaces/{}/members", workspace_id),
            Some(&bo),
            None,
        )
        .await;
    assert_eq!(members.as_array().unwrap().len(), 2);

    let (status, _) = server
        .send(
            Method::POST,
            &format!("/api/workspaces/{}/join", workspace_id),
            Some(&bo),
            Some(json!({ "joinCode": JOIN_CODE })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = server
        .send(
            Method::PATCH,
            &format!("/api/workspaces/{}", workspace_id),
            Some(&bo),
            Some(json!({ "name": "Taken over" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, renamed) = server
        .send(
            Method::PATCH,
            &format!("/api/workspaces/{}", workspace_id),
            Some(&ana),
            Some(json!({ "name": "Front of house" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Front of house");

    let (status, _) = server
        .send(
            Method::DELETE,
            &format!("/api/workspaces/{}", workspace_id),
            Some(&ana),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, gone) = server
        .send(
            Method::GET,
            &format!("/api/workspaces/{}", workspace_id),
            Some(&ana),
            None,
        )
        .await;
    assert_eq!(gone, Value::Null);
}

#[tokio::test]
async fn channel_names_are_unique_per_workspace() {
    let (server, ana, _, workspace_id) = shared_workspace().await;
    let uri = format!("/api/workspaces/{}/channels", workspace_id);

    let (status, channel) = server
        .send(Method::POST, &uri, Some(&ana), Some(json!({ "name": "Orders Desk" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(channel["name"], "orders-desk");

    let (status, _) = server
        .send(Method::POST, &uri, Some(&ana), Some(json!({ "name": "orders desk" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn messages_threads_and_reactions() {
    let (server, ana, bo, workspace_id) = shared_workspace().await;
    let channel_id = general_channel(&server, &ana, &workspace_id).await;

    let (status, message) = server
        .send(
            Method::POST,
            "/api/messages",
            Some(&ana),
            Some(json!({
                "workspaceId": workspace_id,
                "body": "Prep starts at nine",
                "channelId": channel_id,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let message_id = id_of(&message);

    let (status, _) = server
        .send(
            Method::POST,
            "/api/messages",
            Some(&bo),
            Some(json!({
                "workspaceId": workspace_id,
                "body": "On it",
                "channelId": channel_id,
                "parentMessageId": message_id,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, page) = server
        .send(
            Method::GET,
            &format!("/api/messages?channelId={}", channel_id),
            Some(&bo),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let items = page["page"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["threadCount"], 1);
    assert_eq!(page["isDone"], true);

    let reactions = format!("/api/messages/{}/reactions", message_id);
    let (_, toggled) = server
        .send(Method::POST, &reactions, Some(&bo), Some(json!({ "value": "👍" })))
        .await;
    assert_eq!(toggled["added"], true);
    let (_, view) = server
        .send(Method::GET, &format!("/api/messages/{}", message_id), Some(&ana), None)
        .await;
    assert_eq!(view["reactions"][0]["count"], 1);
    let (_, toggled) = server
        .send(Method::POST, &reactions, Some(&bo), Some(json!({ "value": "👍" })))
        .await;
    assert_eq!(toggled["added"], false);

    let (status, _) = server
        .send(
            Method::PATCH,
            &format!("/api/messages/{}", message_id),
            Some(&bo),
            Some(json!({ "body": "Prep starts at ten" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server
        .send(Method::DELETE, &format!("/api/messages/{}", message_id), Some(&ana), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, page) = server
        .send(
            Method::GET,
            &format!("/api/messages?channelId={}", channel_id),
            Some(&ana),
            None,
        )
        .await;
    assert!(page["page"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn listing_messages_needs_a_scope_and_membership() {
    let (server, ana, _, workspace_id) = shared_workspace().await;
    let channel_id = general_channel(&server, &ana, &workspace_id).await;
    let (outsider, _) = server.sign_in("cy@example.com", "Cy").await;

    let (status, _) = server
        .send(Method::GET, "/api/messages", Some(&ana), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .send(
            Method::GET,
            &format!("/api/messages?channelId={}", channel_id),
            Some(&outsider),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn direct_conversation_is_created_once() {
    let (server, ana, bo, workspace_id) = shared_workspace().await;
    let (_, bo_member) = server
        .send(
            Method::GET,
            &format!("/api/workspaces/{}/members/current", workspace_id),
            Some(&bo),
            None,
        )
        .await;
    let uri = format!("/api/workspaces/{}/conversations", workspace_id);
    let body = json!({ "memberId": id_of(&bo_member) });

    let (status, first) = server
        .send(Method::POST, &uri, Some(&ana), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, second) = server.send(Method::POST, &uri, Some(&ana), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["id"], second["id"]);
}

#[tokio::test]
async fn mutations_notify_workspace_subscribers() {
    let (server, ana, _, workspace_id) = shared_workspace().await;
    let (_, ana_id) = server.sign_in("ana@example.com", "Ana").await;

    let (tx, mut rx) = mpsc::channel(8);
    let conn = Uuid::new_v4();
    server.state.connections.register(conn, ana_id, tx);
    server
        .state
        .connections
        .subscribe_workspace(conn, Uuid::parse_str(&workspace_id).unwrap().into())
        .unwrap();

    let (_, channel) = server
        .send(
            Method::POST,
            &format!("/api/workspaces/{}/channels", workspace_id),
            Some(&ana),
            Some(json!({ "name": "deliveries" })),
        )
        .await;

    match rx.try_recv().unwrap() {
        ServerMessage::Changed {
            entity, id, action, ..
        } => {
            assert_eq!(entity, EntityKind::Channel);
            assert_eq!(action, ChangeAction::Created);
            assert_eq!(id.to_string(), id_of(&channel));
        }
        other => panic!("unexpected message: {:?}", other),
    }
}

#[tokio::test]
async fn pickup_order_lifecycle() {
    let server = TestServer::start().await;
    let (owner, _) = server.sign_in("shop@example.com", "Shop").await;
    let (stranger, _) = server.sign_in("guest@example.com", "Guest").await;

    let (status, _) = server
        .send(
            Method::POST,
            "/api/orders",
            Some(&owner),
            Some(json!({ "timeInMinutes": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, order) = server
        .send(
            Method::POST,
            "/api/orders",
            Some(&owner),
            Some(json!({ "timeInMinutes": 15, "name": "Table 4" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = id_of(&order);
    let code = order["code"].as_str().unwrap().to_string();
    assert_eq!(order["isReady"], false);

    let (status, found) = server
        .send(Method::GET, &format!("/api/orders/by-code/{}", code), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], order["id"]);

    let (status, _) = server
        .send(
            Method::POST,
            &format!("/api/orders/{}/delivered", order_id),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = server
        .send(
            Method::POST,
            &format!("/api/orders/{}/ready", order_id),
            Some(&stranger),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, ready) = server
        .send(
            Method::POST,
            &format!("/api/orders/{}/ready", order_id),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ready["isReady"], true);

    let (status, _) = server
        .send(
            Method::POST,
            &format!("/api/orders/{}/sound-off", order_id),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server
        .send(
            Method::POST,
            &format!("/api/orders/{}/close", order_id),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, found) = server
        .send(Method::GET, &format!("/api/orders/by-code/{}", code), None, None)
        .await;
    assert_eq!(found, Value::Null);
}

#[tokio::test]
async fn images_upload_and_download() {
    let server = TestServer::start().await;
    let (token, _) = server.sign_in("ana@example.com", "Ana").await;
    let bytes = vec![0x89, b'P', b'N', b'G', 1, 2, 3];

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/uploads")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "image/png")
        .body(Body::from(bytes.clone()))
        .unwrap();
    let (status, uploaded) = server.call(request).await;
    assert_eq!(status, StatusCode::CREATED);
    let url = uploaded["url"].as_str().unwrap().to_string();

    let request = Request::builder().uri(&url).body(Body::empty()).unwrap();
    let response = tower::ServiceExt::oneshot(server.router.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(response.headers()[header::CONTENT_DISPOSITION], "inline");
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(body.as_ref(), bytes.as_slice());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/uploads")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "image/png")
        .body(Body::from(vec![0u8; MAX_UPLOAD_BYTES + 1]))
        .unwrap();
    let (status, _) = server.call(request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    let (status, _) = server
        .send(
            Method::GET,
            &format!("/api/uploads/{}", Uuid::new_v4()),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

async fn upload_png(server: &TestServer, token: &str) -> String {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/uploads")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "image/png")
        .body(Body::from(vec![0x89, b'P', b'N', b'G']))
        .unwrap();
    let (status, uploaded) = server.call(request).await;
    assert_eq!(status, StatusCode::CREATED);
    uploaded["storageId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn html_uploads_are_rejected() {
    let server = TestServer::start().await;
    let (token, _) = server.sign_in("ana@example.com", "Ana").await;

    for content_type in ["text/html", "image/svg+xml"] {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/uploads")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from("<script>alert(document.cookie)</script>"))
            .unwrap();
        let (status, _) = server.call(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{content_type}");
    }
}

#[tokio::test]
async fn an_image_attached_twice_survives_one_deletion() {
    let (server, ana, bo, workspace_id) = shared_workspace().await;
    let channel_id = general_channel(&server, &ana, &workspace_id).await;
    let storage_id = upload_png(&server, &ana).await;

    let mut message_ids = Vec::new();
    for token in [&ana, &bo] {
        let (status, message) = server
            .send(
                Method::POST,
                "/api/messages",
                Some(token),
                Some(json!({
                    "workspaceId": workspace_id,
                    "body": "Today's special",
                    "channelId": channel_id,
                    "image": storage_id,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        message_ids.push(id_of(&message));
    }

    let (status, _) = server
        .send(
            Method::DELETE,
            &format!("/api/messages/{}", message_ids[1]),
            Some(&bo),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let download = format!("/api/uploads/{}", storage_id);
    let request = Request::builder().uri(&download).body(Body::empty()).unwrap();
    let response = tower::ServiceExt::oneshot(server.router.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _) = server
        .send(
            Method::DELETE,
            &format!("/api/messages/{}", message_ids[0]),
            Some(&ana),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = server.send(Method::GET, &download, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn repeated_wrong_codes_burn_the_sign_in_code() {
    let server = TestServer::start().await;

    let (status, _) = server
        .send(
            Method::POST,
            "/api/auth/code",
            None,
            Some(json!({ "email": "ana@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    for guess in ["0000", "0001", "0002", "0003", "0004"] {
        let (status, _) = server
            .send(
                Method::POST,
                "/api/auth/verify",
                None,
                Some(json!({ "email": "ana@example.com", "code": guess })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{guess}");
    }

    let (status, _) = server
        .send(
            Method::POST,
            "/api/auth/verify",
            None,
            Some(json!({ "email": "ana@example.com", "code": "7777" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A fresh code starts a fresh allowance.
    server
        .send(
            Method::POST,
            "/api/auth/code",
            None,
            Some(json!({ "email": "ana@example.com" })),
        )
        .await;
    let (status, _) = server
        .send(
            Method::POST,
            "/api/auth/verify",
            None,
            Some(json!({ "email": "ana@example.com", "code": "7777" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn message_pages_follow_the_cursor_to_the_end() {
    let (server, ana, _, workspace_id) = shared_workspace().await;
    let channel_id = general_channel(&server, &ana, &workspace_id).await;

    let bodies: Vec<String> = (0..5).map(|i| format!("note {}", i)).collect();
    for body in &bodies {
        let (status, _) = server
            .send(
                Method::POST,
                "/api/messages",
                Some(&ana),
                Some(json!({
                    "workspaceId": workspace_id,
                    "body": body,
                    "channelId": channel_id,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0;
    loop {
        let mut uri = format!("/api/messages?channelId={}&numItems=2", channel_id);
        if let Some(cursor) = &cursor {
            uri.push_str(&format!("&cursor={}", cursor));
        }
        let (status, page) = server.send(Method::GET, &uri, Some(&ana), None).await;
        assert_eq!(status, StatusCode::OK);
        pages += 1;

        let items = page["page"].as_array().unwrap();
        assert!(items.len() <= 2);
        seen.extend(items.iter().map(|m| m["body"].as_str().unwrap().to_string()));

        if page["isDone"] == true {
            assert_eq!(items.len(), 1);
            break;
        }
        assert_eq!(items.len(), 2);
        cursor = Some(page["continueCursor"].as_str().unwrap().to_string());
        assert!(pages < 5, "pagination never finished");
    }

    assert_eq!(pages, 3);
    let newest_first: Vec<String> = bodies.iter().rev().cloned().collect();
    assert_eq!(seen, newest_first);

    let (status, _) = server
        .send(
            Method::GET,
            &format!("/api/messages?channelId={}&cursor=not-a-cursor", channel_id),
            Some(&ana),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn concurrent_orders_never_share_an_active_code() {
    let server = TestServer::start().await;
    let (owner, _) = server.sign_in("shop@example.com", "Shop").await;
    let create = || {
        server.send(
            Method::POST,
            "/api/orders",
            Some(&owner),
            Some(json!({ "timeInMinutes": 10 })),
        )
    };

    // Every draw yields the same code, so only one of the two can hold it.
    let ((first, a), (second, b)) = tokio::join!(create(), create());
    let mut statuses = [first, second];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);

    let created = if first == StatusCode::CREATED { a } else { b };
    let (_, listed) = server.send(Method::GET, "/api/orders", Some(&owner), None).await;
    let active: Vec<&Value> = listed
        .as_array()
        .unwrap()
        .iter()
        .filter(|o| o["isActive"] == true)
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["code"], created["code"]);

    let (status, _) = server
        .send(
            Method::POST,
            &format!("/api/orders/{}/close", id_of(&created)),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, reopened) = create().await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reopened["code"], created["code"]);
}
