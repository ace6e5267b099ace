//! Smoke test against a running instance. Signs up a throwaway account,
//! logs in, and walks the public and authenticated list endpoints.
//!
//! ```sh
//! cargo run -p tester
//! ```

use serde_json::json;

#[tokio::main]
async fn main() {
    let base = std::env::var("ROADSIDE_URL").unwrap_or_else(|_| "http://localhost:4000".into());
    let client = reqwest::Client::new();

    let health = client.get(format!("{base}/health")).send().await.unwrap();
    println!("health: {}", health.status());

    let email = format!("smoke-{}@example.com", std::process::id());
    let signup = client
        .post(format!("{base}/api/auth/signup"))
        .json(&json!({
            "name": "Smoke Tester",
            "email": email,
            "password": "smoke-test-pass",
            "phone": "0770000000",
        }))
        .send()
        .await
        .unwrap();
    println!("signup: {}", signup.status());

    let login: serde_json::Value = client
        .post(format!("{base}/api/auth/login"))
        .json(&json!({ "email": email, "password": "smoke-test-pass" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = login["token"].as_str().unwrap().to_string();
    println!("login: token acquired");

    let inventory = client
        .get(format!("{base}/api/inventory"))
        .send()
        .await
        .unwrap();
    println!("inventory list: {}", inventory.status());

    let emergencies = client
        .get(format!("{base}/api/emergency"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    println!("emergency list: {}", emergencies.status());

    let registrations = client
        .get(format!("{base}/api/vehicle-registration"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    println!("registration list: {}", registrations.status());
}
