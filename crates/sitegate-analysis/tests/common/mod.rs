//! Shared fixtures: a minimal HTTP/1.1 server and site trees on disk.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;
use std::thread;

use reqwest::Url;

/// One canned response.
#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    pub headers: Vec<(&'static str, &'static str)>,
    /// Answer HEAD with 405 to exercise the GET fallback.
    pub reject_head: bool,
}

impl Route {
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: body.into(),
            headers: Vec::new(),
            reject_head: false,
        }
    }

    pub fn xml(body: impl Into<String>) -> Self {
        Self {
            content_type: "application/xml",
            ..Self::html(body)
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            ..Self::html("")
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }

    pub fn head_rejected(mut self) -> Self {
        self.reject_head = true;
        self
    }
}

/// Serve `routes` on an ephemeral localhost port until the test process
/// exits. Unknown paths answer 404. Returns the base URL.
pub fn serve(routes: Vec<(&'static str, Route)>) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    let routes: HashMap<&'static str, Route> = routes.into_iter().collect();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            loop {
                let mut header = String::new();
                match reader.read_line(&mut header) {
                    Ok(0) | Err(_) => break,
                    Ok(_) if header == "\r\n" || header == "\n" => break,
                    Ok(_) => {}
                }
            }
            let mut parts = request_line.split_whitespace();
            let method = parts.next().unwrap_or_default();
            let path = parts.next().unwrap_or("/").split('?').next().unwrap_or("/");

            let route = routes.get(path).cloned().unwrap_or_else(|| Route::status(404));
            let (status, body) = if method == "HEAD" && route.reject_head {
                (405, String::new())
            } else {
                (route.status, route.body.clone())
            };
            let mut response = format!(
                "HTTP/1.1 {status} Test\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
                route.content_type,
                body.len()
            );
            for (name, value) in &route.headers {
                response.push_str(&format!("{name}: {value}\r\n"));
            }
            response.push_str("\r\n");
            if method != "HEAD" {
                response.push_str(&body);
            }
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });

    Url::parse(&format!("http://{addr}/")).expect("server url")
}

/// Write `files` (relative path, contents) under `root`.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create dirs");
        }
        std::fs::write(path, contents).expect("write fixture");
    }
}

/// A well-formed page around `body`.
pub fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><title>{title}</title></head>\n<body>\n{body}\n</body>\n</html>\n"
    )
}
