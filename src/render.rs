//! Render payloads.
//!
//! Handlers never produce HTML themselves. A page is described by the template
//! that should draw it and the context handed to that template; the pair is
//! serialized as JSON and left to whatever renderer sits in front of us.

use actix_web::{HttpResponse, http::StatusCode, http::header};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct Rendered {
    pub template: &'static str,
    pub context: Value,
}

impl Rendered {
    pub fn new(template: &'static str, context: Value) -> Self {
        Self { template, context }
    }

    pub fn body(&self) -> String {
        serde_json::json!({
            "template": self.template,
            "context": self.context,
        })
        .to_string()
    }

    pub fn respond(&self, status: StatusCode) -> HttpResponse {
        body_response(status, self.body())
    }

    pub fn ok(&self) -> HttpResponse {
        self.respond(StatusCode::OK)
    }
}

/// Wraps an already rendered body, used when replaying cached pages.
pub fn body_response(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("application/json")
        .body(body)
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, location))
        .finish()
}
