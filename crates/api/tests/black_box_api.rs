use bookshelf_api::config::AppConfig;
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(true).await
    }

    async fn spawn_with(auth_required: bool) -> Self {
        let config = AppConfig {
            jwt_secret: JWT_SECRET.to_string(),
            bcrypt_cost: 4,
            auth_required,
            ..AppConfig::default()
        };

        // Same router as prod (in-memory stores), bound to an ephemeral port.
        let app = bookshelf_api::app::build_app(&config)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            bookshelf_api::app::serve(listener, app, std::future::pending())
                .await
                .unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> Value {
        let res = self
            .client
            .post(self.url("/users"))
            .json(&json!({ "name": name, "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        res.json().await.unwrap()
    }

    async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/users/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    /// Register + login; returns (user_id, token).
    async fn signed_in(&self, email: &str) -> (i64, String) {
        self.register("Lee Mujin", email, "admin123").await;
        let res = self.login(email, "admin123").await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        (
            body["user_id"].as_i64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
        )
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(user_id: i64, issued_at: chrono::DateTime<Utc>, ttl: ChronoDuration) -> String {
    let claims = json!({
        "user_id": user_id,
        "iat": issued_at.timestamp(),
        "exp": (issued_at + ttl).timestamp(),
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

// ─────────────────────────────────────────────────────────────────────────────
// Authentication
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    for path in ["/users", "/users/1", "/books", "/books/1"] {
        let res = srv.client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["message"], "need authorization token");
    }

    let res = srv
        .client
        .post(srv.url("/books"))
        .json(&json!({ "title": "aaa" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_tokens_are_rejected() {
    let srv = TestServer::spawn().await;

    let expired = mint_jwt(1, Utc::now() - ChronoDuration::hours(48), ChronoDuration::hours(24));
    for token in ["InvalidToken", "Bearer InvalidToken", &format!("Bearer {expired}")] {
        let res = srv
            .client
            .get(srv.url("/books"))
            .header("Authorization", token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{token}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["message"], "invalid authorization token");
    }
}

#[tokio::test]
async fn token_accepted_raw_bearer_or_query() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.signed_in("alice@example.com").await;

    let res = srv
        .client
        .get(srv.url("/books"))
        .header("Authorization", token.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv
        .client
        .get(srv.url("/books"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv
        .client
        .get(srv.url(&format!("/books?token={token}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn disabled_auth_opens_every_route() {
    let srv = TestServer::spawn_with(false).await;
    let created = srv.register("Alice", "alice@example.com", "admin123").await;
    let id = created["user"]["id"].as_i64().unwrap();

    let res = srv.client.get(srv.url("/users")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv
        .client
        .get(srv.url(&format!("/users/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_then_login_issues_token() {
    let srv = TestServer::spawn().await;

    let created = srv
        .register("Lee Mujin", "Morilla_LMJ@gmail.com", "28122000")
        .await;
    assert_eq!(
        created["message"],
        "success create new user, please login to get token"
    );
    assert_eq!(created["user"]["id"], 1);
    assert_eq!(created["user"]["email"], "morilla_lmj@gmail.com");
    assert!(created["user"].get("password").is_none());
    assert!(created["user"].get("password_hash").is_none());

    let res = srv.login("morilla_lmj@gmail.com", "28122000").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Success Login");
    assert_eq!(body["user_id"], 1);

    let token = body["token"].as_str().unwrap();
    let mut validation = jsonwebtoken::Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    let decoded = jsonwebtoken::decode::<Value>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &validation,
    )
    .unwrap();
    assert_eq!(decoded.claims["user_id"], 1);
    let ttl = decoded.claims["exp"].as_i64().unwrap() - decoded.claims["iat"].as_i64().unwrap();
    assert_eq!(ttl, 24 * 3600);
}

#[tokio::test]
async fn login_rejects_wrong_credentials() {
    let srv = TestServer::spawn().await;
    srv.register("Alice", "alice@example.com", "admin123").await;

    for (email, password) in [
        ("alice@example.com", "wrong"),
        ("nobody@example.com", "admin123"),
        ("not-an-email", "admin123"),
    ] {
        let res = srv.login(email, password).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["message"], "email or password does not match");
    }
}

#[tokio::test]
async fn register_rejects_bad_input() {
    let srv = TestServer::spawn().await;
    srv.register("Alice", "alice@example.com", "admin123").await;

    // Duplicate email.
    let res = srv
        .client
        .post(srv.url("/users"))
        .json(&json!({ "name": "Other", "email": "alice@example.com", "password": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "bad request");
    assert!(body["error"].as_str().unwrap().contains("email"));

    // Missing password.
    let res = srv
        .client
        .post(srv.url("/users"))
        .json(&json!({ "name": "Bob", "email": "bob@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Malformed JSON.
    let res = srv
        .client
        .post(srv.url("/users"))
        .header("Content-Type", "application/json")
        .body(r#"{ "name": Lee, "email": x }"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Error when parsing data");
}

#[tokio::test]
async fn users_only_access_their_own_record() {
    let srv = TestServer::spawn().await;
    let (alice_id, alice_token) = srv.signed_in("alice@example.com").await;
    let (bob_id, _) = srv.signed_in("bob@example.com").await;

    let res = srv
        .client
        .get(srv.url(&format!("/users/{alice_id}")))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "success get user");
    assert_eq!(body["user"]["email"], "alice@example.com");

    for req in [
        srv.client.get(srv.url(&format!("/users/{bob_id}"))),
        srv.client
            .put(srv.url(&format!("/users/{bob_id}")))
            .json(&json!({ "name": "hijack" })),
        srv.client.delete(srv.url(&format!("/users/{bob_id}"))),
    ] {
        let res = req.bearer_auth(&alice_token).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["message"], "You do not have access to this data");
    }

    // Listing is open to any authenticated user.
    let res = srv
        .client
        .get(srv.url("/users"))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "success get all users");
    assert_eq!(body["users"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn invalid_user_id_is_bad_request() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.signed_in("alice@example.com").await;

    let res = srv
        .client
        .get(srv.url("/users/abc"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid Id");
}

#[tokio::test]
async fn update_user_merges_fields_and_rehashes_password() {
    let srv = TestServer::spawn().await;
    let (id, token) = srv.signed_in("alice@example.com").await;

    let res = srv
        .client
        .put(srv.url(&format!("/users/{id}")))
        .bearer_auth(&token)
        .json(&json!({ "name": "Alice Updated", "password": "vocal20" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Success Update data");
    assert_eq!(body["user"]["name"], "Alice Updated");
    assert_eq!(body["user"]["email"], "alice@example.com");

    assert_eq!(
        srv.login("alice@example.com", "admin123").await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        srv.login("alice@example.com", "vocal20").await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn update_user_cannot_take_another_email() {
    let srv = TestServer::spawn().await;
    let (id, token) = srv.signed_in("alice@example.com").await;
    srv.register("Bob", "bob@example.com", "admin123").await;

    let res = srv
        .client
        .put(srv.url(&format!("/users/{id}")))
        .bearer_auth(&token)
        .json(&json!({ "email": "bob@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Failed to update user");
}

#[tokio::test]
async fn deleted_user_is_gone() {
    let srv = TestServer::spawn().await;
    let (id, token) = srv.signed_in("alice@example.com").await;

    let res = srv
        .client
        .delete(srv.url(&format!("/users/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "success delete data");

    // The token outlives the record.
    let res = srv
        .client
        .get(srv.url(&format!("/users/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "user not found");

    let res = srv
        .client
        .delete(srv.url(&format!("/users/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "User Not Found");

    assert_eq!(
        srv.login("alice@example.com", "admin123").await.status(),
        StatusCode::UNAUTHORIZED
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Books
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn book_lifecycle_create_update_delete() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.signed_in("alice@example.com").await;

    // Create
    let res = srv
        .client
        .post(srv.url("/books"))
        .bearer_auth(&token)
        .json(&json!({ "title": "aaa", "author": "vvvv", "publisher": "nnnn" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "success create new book");
    let id = body["book"]["id"].as_i64().unwrap();

    // Get
    let res = srv
        .client
        .get(srv.url(&format!("/books/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "success get book");
    assert_eq!(body["book"]["title"], "aaa");

    // Partial update keeps untouched fields.
    let res = srv
        .client
        .put(srv.url(&format!("/books/{id}")))
        .bearer_auth(&token)
        .json(&json!({ "publisher": "Gramedia" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Success Update data");
    assert_eq!(body["book"]["title"], "aaa");
    assert_eq!(body["book"]["author"], "vvvv");
    assert_eq!(body["book"]["publisher"], "Gramedia");

    // List
    let res = srv
        .client
        .get(srv.url("/books"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "success get all books");
    assert_eq!(body["books"].as_array().unwrap().len(), 1);

    // Delete
    let res = srv
        .client
        .delete(srv.url(&format!("/books/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv
        .client
        .get(srv.url(&format!("/books/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "book not found");

    let res = srv
        .client
        .put(srv.url(&format!("/books/{id}")))
        .bearer_auth(&token)
        .json(&json!({ "title": "ghost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "book Not Found");
}

#[tokio::test]
async fn book_input_errors() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.signed_in("alice@example.com").await;

    let res = srv
        .client
        .get(srv.url("/books/xyz"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "invalid id");

    let res = srv
        .client
        .delete(srv.url("/books/0"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid Id");

    let res = srv
        .client
        .post(srv.url("/books"))
        .bearer_auth(&token)
        .header("Content-Type", "application/json")
        .body(r#"{ "title": aaa, "author": vvvv }"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Error when parsing data");

    let res = srv
        .client
        .post(srv.url("/books"))
        .bearer_auth(&token)
        .json(&json!({ "author": "no title" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "bad request");
}

#[tokio::test]
async fn trailing_slash_is_ignored() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.signed_in("alice@example.com").await;

    let res = srv
        .client
        .get(srv.url("/books/"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn header_token_is_not_blocked_by_query_string() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.signed_in("alice@example.com").await;

    let res = srv
        .client
        .get(srv.url("/books?token=a&token=b"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Without a header, the first query token is used.
    let res = srv
        .client
        .get(srv.url(&format!("/books?token={token}&token=other")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ─────────────────────────────────────────────────────────────────────────────
// Error bodies
// ─────────────────────────────────────────────────────────────────────────────

async fn json_body(res: reqwest::Response) -> Value {
    let content_type = res
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("application/json"), "{content_type}");
    res.json().await.unwrap()
}

#[tokio::test]
async fn undecodable_path_id_is_json_bad_request() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.signed_in("alice@example.com").await;

    let res = srv
        .client
        .get(srv.url("/books/%FF"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["message"], "invalid id");

    let res = srv
        .client
        .delete(srv.url("/users/%FF"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["message"], "Invalid Id");
}

#[tokio::test]
async fn unknown_routes_and_methods_answer_json() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/nowhere")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(res).await["message"], "Not Found");

    let res = srv.client.get(srv.url("/users/login")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json_body(res).await["message"], "Method Not Allowed");
}

// ─────────────────────────────────────────────────────────────────────────────
// Check order on owner routes
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ownership_is_checked_before_lookup() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.signed_in("alice@example.com").await;

    let res = srv
        .client
        .get(srv.url("/users/999"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "You do not have access to this data");
}

#[tokio::test]
async fn lookup_is_checked_before_body_parse() {
    let srv = TestServer::spawn().await;
    let (id, token) = srv.signed_in("alice@example.com").await;

    let res = srv
        .client
        .delete(srv.url(&format!("/users/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv
        .client
        .put(srv.url(&format!("/users/{id}")))
        .bearer_auth(&token)
        .header("Content-Type", "application/json")
        .body(r#"{ "name": "#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "User Not Found");
}

#[tokio::test]
async fn update_user_with_malformed_json() {
    let srv = TestServer::spawn().await;
    let (id, token) = srv.signed_in("alice@example.com").await;

    let res = srv
        .client
        .put(srv.url(&format!("/users/{id}")))
        .bearer_auth(&token)
        .header("Content-Type", "application/json")
        .body(r#"{ "name": Alice }"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Error when parsing data");
}

#[tokio::test]
async fn missing_and_invalid_book_updates() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.signed_in("alice@example.com").await;

    let res = srv
        .client
        .delete(srv.url("/books/42"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "book Not Found");

    let res = srv
        .client
        .post(srv.url("/books"))
        .bearer_auth(&token)
        .json(&json!({ "title": "aaa" }))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    let id = body["book"]["id"].as_i64().unwrap();

    let res = srv
        .client
        .put(srv.url(&format!("/books/{id}")))
        .bearer_auth(&token)
        .json(&json!({ "title": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Failed to update book");
}
