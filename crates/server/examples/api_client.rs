//! Examples for using the People Server API
//!
//! Start the server first (`cargo run -p people-server`), then run this
//! example against it.

use reqwest::Client;
use serde_json::json;

const SERVER_URL: &str = "http://localhost:3000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = Client::new();

    // Example 1: Save a person from JSON
    println!("1. Save Person (JSON):");
    let resp = client
        .post(format!("{SERVER_URL}/savePerson"))
        .json(&json!({
            "firstName": "ada",
            "lastName": "lovelace",
            "address": "12 St James's Square, London",
            "age": 36
        }))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 2: Save a person from a form, the way /addPerson submits
    println!("2. Save Person (form):");
    let resp = client
        .post(format!("{SERVER_URL}/savePerson"))
        .form(&[("firstName", "alan"), ("lastName", "turing"), ("age", "41")])
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 3: A value that does not cast
    println!("3. Invalid Age:");
    let resp = client
        .post(format!("{SERVER_URL}/savePerson"))
        .json(&json!({"firstName": "bad", "age": "not-a-number"}))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 4: List everyone
    println!("4. Get All People:");
    let resp = client
        .get(format!("{SERVER_URL}/getAllPeople"))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);

    Ok(())
}
