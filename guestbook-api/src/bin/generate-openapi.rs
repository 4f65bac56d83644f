//! OpenAPI Specification Generator Binary
//!
//! Writes the guestbook OpenAPI document as JSON to stdout.
//!
//! Usage:
//!   cargo run -p guestbook-api --bin generate-openapi > openapi.json

use guestbook_api::ApiDoc;

fn main() {
    match ApiDoc::to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize OpenAPI spec: {}", e);
            std::process::exit(1);
        }
    }
}
