//! Shared helpers for the integration tests: an in-memory `Transport` that
//! serves canned responses by URL and records every request.

#![allow(dead_code)]

use comic_poster::config::Settings;
use comic_poster::http::{HttpResponse, Transport};
use comic_poster::{PosterError, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

pub const COMIC_URL: &str = "http://comics.test";
pub const PLATFORM_URL: &str = "http://platform.test/method";
pub const UPLOAD_URL: &str = "http://u";
pub const GROUP_ID: u64 = 4242;

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Query(Vec<(String, String)>),
    Form(Vec<(String, String)>),
    File {
        field: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: &'static str,
    pub url: String,
    pub body: Body,
}

impl Recorded {
    pub fn param(&self, key: &str) -> Option<&str> {
        let pairs = match &self.body {
            Body::Query(p) | Body::Form(p) => p,
            Body::File { .. } => return None,
        };
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

enum Canned {
    Reply(u16, Vec<u8>),
    Unreachable,
}

#[derive(Default)]
pub struct FakeTransport {
    routes: HashMap<String, Canned>,
    requests: RefCell<Vec<Recorded>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&mut self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> &mut Self {
        self.routes
            .insert(url.to_string(), Canned::Reply(status, body.into()));
        self
    }

    pub fn json(&mut self, url: &str, body: serde_json::Value) -> &mut Self {
        self.reply(url, 200, body.to_string())
    }

    /// Connection-level failure for `url`.
    pub fn unreachable(&mut self, url: &str) -> &mut Self {
        self.routes.insert(url.to_string(), Canned::Unreachable);
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.borrow().clone()
    }

    pub fn last_to(&self, url: &str) -> Option<Recorded> {
        self.requests
            .borrow()
            .iter()
            .rev()
            .find(|r| r.url == url)
            .cloned()
    }

    fn respond(&self, method: &'static str, url: &str, body: Body) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(Recorded {
            method,
            url: url.to_string(),
            body,
        });
        match self.routes.get(url) {
            Some(Canned::Reply(status, body)) => Ok(HttpResponse::new(url, *status, body.clone())),
            Some(Canned::Unreachable) => Err(PosterError::remote(url, "connection refused")),
            None => Ok(HttpResponse::new(url, 404, "no route")),
        }
    }
}

fn owned(pairs: &[(&str, String)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

impl Transport for FakeTransport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse> {
        self.respond("GET", url, Body::Query(owned(query)))
    }

    fn post_form(&self, url: &str, form: &[(&str, String)]) -> Result<HttpResponse> {
        self.respond("POST", url, Body::Form(owned(form)))
    }

    fn post_file(
        &self,
        url: &str,
        field: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<HttpResponse> {
        self.respond(
            "POST",
            url,
            Body::File {
                field: field.to_string(),
                file_name: file_name.to_string(),
                bytes,
            },
        )
    }
}

pub fn comic_json(num: u64, img: &str, title: &str, alt: &str) -> serde_json::Value {
    serde_json::json!({ "num": num, "img": img, "title": title, "alt": alt, "safe_title": title })
}

pub fn method(name: &str) -> String {
    format!("{PLATFORM_URL}/{name}")
}

pub fn settings(scratch_base: &Path) -> Settings {
    let mut settings = Settings::new(GROUP_ID, "secret-token");
    settings.comic_url = COMIC_URL.to_string();
    settings.platform_url = PLATFORM_URL.to_string();
    settings.scratch_dir = scratch_base.join("images");
    settings
}

/// Every endpoint of a successful run. Comics 1..=`latest` share one image.
pub fn happy_transport(latest: u64) -> FakeTransport {
    let mut t = FakeTransport::new();
    t.json(
        &format!("{COMIC_URL}/info.0.json"),
        comic_json(latest, "http://x/latest.png", "Latest", "newest"),
    );
    for id in 1..=latest {
        t.json(
            &format!("{COMIC_URL}/{id}/info.0.json"),
            comic_json(id, "http://x/y.png", "Foo", "Bar"),
        );
    }
    t.reply("http://x/y.png", 200, b"PNGDATA".to_vec())
        .json(
            &method("photos.getWallUploadServer"),
            serde_json::json!({ "response": { "upload_url": UPLOAD_URL } }),
        )
        .json(
            UPLOAD_URL,
            serde_json::json!({ "server": 1, "photo": "abc", "hash": "h" }),
        )
        .json(
            &method("photos.saveWallPhoto"),
            serde_json::json!({ "response": [{ "owner_id": 10, "id": 20 }] }),
        )
        .json(
            &method("wall.post"),
            serde_json::json!({ "response": { "post_id": 77 } }),
        );
    t
}
