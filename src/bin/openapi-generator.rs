//! Print the referee's OpenAPI document to stdout.

use contact_referee::services::documentation::ApiDoc;
use utoipa::OpenApi;

fn main() {
    let doc = ApiDoc::openapi();
    println!("{}", doc.to_pretty_json().expect("OpenAPI document serializes"));
}
