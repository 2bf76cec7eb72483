//! Basic example: fetch the todos endpoint.
//!
//! This example shows how to:
//! - Build an `Api` from the `HOST`, `PORT`, `USER` and `PW` environment variables
//! - Probe the server before calling endpoints
//! - Inspect the raw response returned by an endpoint method
//!
//! Run with: `HOST=api.example.com USER=alice PW=secret cargo run --example basic_call`

use digestcall::{Api, Error};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Todo {
    id: u64,
    title: String,
    #[serde(default)]
    completed: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("digestcall=debug,basic_call=info")
        .init();

    let api = Api::from_env()?;
    println!("Using {}{}", api.client().base_url(), api.client().base_path());

    api.check_connection().await?;

    let response = api.todos().await?;
    println!("Status code: {}", response.status);
    println!("Request latency: {:?}", response.latency);

    // A non-200 status is not an error; it has already been logged
    if response.is_success() {
        let todos: Vec<Todo> = response.json()?;
        for todo in &todos {
            let mark = if todo.completed { "x" } else { " " };
            println!("[{}] {} {}", mark, todo.id, todo.title);
        }
    }

    Ok(())
}
