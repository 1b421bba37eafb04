use std::net::TcpListener;
use std::sync::Arc;

use postboard::auth::SystemClock;
use postboard::configuration::{
    ApplicationSettings, AuthSettings, DatabaseSettings, FeedSettings, JwtSettings, Settings,
};
use postboard::startup::{build_services, run};
use postboard::store::InMemoryStore;
use serde_json::{json, Value};

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

fn test_settings() -> Settings {
    Settings {
        database: DatabaseSettings {
            username: "postgres".to_string(),
            password: "password".to_string(),
            port: 5432,
            host: "localhost".to_string(),
            database_name: "postboard".to_string(),
        },
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        jwt: JwtSettings {
            access_secret: "integration-access-secret".to_string(),
            refresh_secret: "integration-refresh-secret".to_string(),
            access_token_expiry: 1800,
            refresh_token_expiry: None,
            issuer: "postboard-test".to_string(),
        },
        auth: AuthSettings { bcrypt_cost: 4 },
        feed: FeedSettings {
            per_page: 2,
            event_capacity: 16,
        },
    }
}

fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let store = Arc::new(InMemoryStore::new());
    let (auth, feed) = build_services(&test_settings(), store, Arc::new(SystemClock));
    let server = run(listener, auth, feed)
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    /// Sign up and log in, returning the access token
    async fn access_token(&self, name: &str, email: &str) -> String {
        let response = self
            .client
            .put(&format!("{}/auth/signup", &self.address))
            .json(&json!({"name": name, "email": email, "password": "secret1"}))
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(201, response.status().as_u16());

        let body: Value = self
            .client
            .post(&format!("{}/auth/login", &self.address))
            .json(&json!({"email": email, "password": "secret1"}))
            .send()
            .await
            .expect("Failed to execute request.")
            .json()
            .await
            .expect("Failed to parse response");
        body["token"].as_str().expect("missing token").to_string()
    }

    async fn create_post(&self, token: &str, title: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/feed/post", &self.address))
            .bearer_auth(token)
            .json(&json!({
                "title": title,
                "content": "Some content",
                "imageUrl": "images\\duck.png"
            }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .get(&format!("{}{}", &self.address, path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

async fn post_id(response: reqwest::Response) -> String {
    let body: Value = response.json().await.expect("Failed to parse response");
    body["post"]["id"].as_str().expect("missing post id").to_string()
}

#[tokio::test]
async fn feed_requires_access_token() {
    let app = spawn_app();

    let response = app
        .client
        .get(&format!("{}/feed/posts", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn create_post_returns_201_with_creator() {
    let app = spawn_app();
    let token = app.access_token("Ann", "ann@x.com").await;

    let response = app.create_post(&token, "First post").await;

    assert_eq!(201, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["post"]["title"], "First post");
    assert_eq!(body["post"]["imageUrl"], "images/duck.png");
    assert_eq!(body["creator"]["name"], "Ann");
    assert_eq!(body["creator"]["id"], body["post"]["creatorId"]);
}

#[tokio::test]
async fn invalid_post_is_422() {
    let app = spawn_app();
    let token = app.access_token("Ann", "ann@x.com").await;

    let response = app
        .client
        .post(&format!("{}/feed/post", &app.address))
        .bearer_auth(&token)
        .json(&json!({"title": "abc", "content": "Some content"}))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(422, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    let fields: Vec<&str> = body["data"]
        .as_array()
        .expect("missing data")
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["title", "imageUrl"]);
}

#[tokio::test]
async fn posts_are_paginated() {
    let app = spawn_app();
    let token = app.access_token("Ann", "ann@x.com").await;
    for title in ["Post one", "Post two", "Post three"] {
        assert_eq!(201, app.create_post(&token, title).await.status().as_u16());
    }

    let first: Value = app.get(&token, "/feed/posts?page=1").await.json().await.unwrap();
    let second: Value = app.get(&token, "/feed/posts?page=2").await.json().await.unwrap();

    assert_eq!(first["totalItems"], 3);
    assert_eq!(first["posts"].as_array().unwrap().len(), 2);
    assert_eq!(second["posts"].as_array().unwrap().len(), 1);

    let bad = app.get(&token, "/feed/posts?page=abc").await;
    assert_eq!(400, bad.status().as_u16());
}

#[tokio::test]
async fn get_post_includes_creator_name() {
    let app = spawn_app();
    let token = app.access_token("Ann", "ann@x.com").await;
    let id = post_id(app.create_post(&token, "First post").await).await;

    let response = app.get(&token, &format!("/feed/post/{}", id)).await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Post fetched");
    assert_eq!(body["creator"], "Ann");
}

#[tokio::test]
async fn only_creator_may_update_or_delete() {
    let app = spawn_app();
    let ann = app.access_token("Ann", "ann@x.com").await;
    let bob = app.access_token("Bob", "bob@x.com").await;
    let id = post_id(app.create_post(&ann, "First post").await).await;
    let update = json!({"title": "Hijacked", "content": "Some content", "imageUrl": "x.png"});

    let response = app
        .client
        .put(&format!("{}/feed/post/{}", &app.address, id))
        .bearer_auth(&bob)
        .json(&update)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(403, response.status().as_u16());

    let response = app
        .client
        .delete(&format!("{}/feed/post/{}", &app.address, id))
        .bearer_auth(&bob)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(403, response.status().as_u16());

    let response = app
        .client
        .put(&format!("{}/feed/post/{}", &app.address, id))
        .bearer_auth(&ann)
        .json(&update)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["post"]["title"], "Hijacked");
}

#[tokio::test]
async fn deleted_post_is_gone() {
    let app = spawn_app();
    let token = app.access_token("Ann", "ann@x.com").await;
    let id = post_id(app.create_post(&token, "First post").await).await;

    let response = app
        .client
        .delete(&format!("{}/feed/post/{}", &app.address, id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Post deleted successfully.");

    let response = app.get(&token, &format!("/feed/post/{}", id)).await;
    assert_eq!(404, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Could not find post!");
}
