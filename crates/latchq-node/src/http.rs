//! Read-only pick preview endpoint.
//!
//! Lets a UI preview what an indexed pick would resolve without running
//! the full node invocation. One GET route, query-parameter driven, JSON
//! out, no state mutation anywhere. The pick logic is the same code path
//! the node operation uses, so previews cannot drift from results.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;

use serde_json::{Value, json};
use thiserror::Error;

use latchq_pick::{EntryKind, OutOfRange, PickError, SortPolicy};

use crate::ops::{NodeError, PickRequest, pick};

#[derive(Debug, Clone)]
pub struct PreviewServerConfig {
    pub bind: SocketAddr,
}

#[derive(Debug, Error)]
pub enum PreviewServeError {
    #[error("bind failed: {0}")]
    Bind(std::io::Error),
    #[error("accept failed: {0}")]
    Accept(std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HttpResponse {
    status: u16,
    body: Value,
}

#[derive(Debug, Clone, PartialEq)]
enum Route {
    Healthz,
    Index,
    PickPreview(Box<PickQuery>),
}

#[derive(Debug, Clone, PartialEq)]
struct PickQuery {
    root_dir: PathBuf,
    kind: EntryKind,
    index: i64,
    sort: SortPolicy,
    on_out_of_range: OutOfRange,
    include: Option<String>,
    exclude: Option<String>,
    extensions: Option<String>,
    max_list_items: usize,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
enum RouteError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// Serve the preview API until the listener fails.
pub fn serve_preview_api(config: PreviewServerConfig) -> Result<(), PreviewServeError> {
    serve_with_limit(config, None)
}

fn serve_with_limit(
    config: PreviewServerConfig,
    max_requests: Option<usize>,
) -> Result<(), PreviewServeError> {
    let listener = TcpListener::bind(config.bind).map_err(PreviewServeError::Bind)?;
    let mut served = 0usize;

    for stream in listener.incoming() {
        if let Some(limit) = max_requests
            && served >= limit
        {
            break;
        }

        match stream {
            Ok(mut stream) => {
                if let Err(err) = handle_connection(&mut stream) {
                    let _ = write_json_response(
                        &mut stream,
                        HttpResponse {
                            status: 500,
                            body: json!({ "ok": false, "error": format!("internal server error: {err}") }),
                        },
                    );
                }
                served += 1;
            }
            Err(err) => return Err(PreviewServeError::Accept(err)),
        }
    }

    Ok(())
}

fn handle_connection(stream: &mut TcpStream) -> Result<(), String> {
    let (method, target) = read_request_line(stream).map_err(|e| e.to_string())?;

    if method != "GET" {
        return write_json_response(
            stream,
            HttpResponse {
                status: 405,
                body: json!({ "ok": false, "error": "method not allowed; use GET" }),
            },
        )
        .map_err(|e| e.to_string());
    }

    let response = match parse_route_target(&target) {
        Ok(route) => execute_route(route),
        Err(RouteError::BadRequest(msg)) => HttpResponse {
            status: 400,
            body: json!({ "ok": false, "error": msg }),
        },
        Err(RouteError::NotFound(msg)) => HttpResponse {
            status: 404,
            body: json!({ "ok": false, "error": msg }),
        },
    };
    write_json_response(stream, response).map_err(|e| e.to_string())
}

fn read_request_line(stream: &mut TcpStream) -> Result<(String, String), RouteError> {
    let mut buf = [0u8; 8192];
    let n = stream
        .read(&mut buf)
        .map_err(|e| RouteError::BadRequest(format!("failed to read request: {e}")))?;
    if n == 0 {
        return Err(RouteError::BadRequest("empty request".to_string()));
    }
    let req = String::from_utf8_lossy(&buf[..n]);
    let line = req
        .lines()
        .next()
        .ok_or_else(|| RouteError::BadRequest("missing request line".to_string()))?;
    let mut parts = line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| RouteError::BadRequest("missing method".to_string()))?;
    let target = parts
        .next()
        .ok_or_else(|| RouteError::BadRequest("missing target".to_string()))?;
    Ok((method.to_string(), target.to_string()))
}

fn parse_route_target(target: &str) -> Result<Route, RouteError> {
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target, ""),
    };
    let params = parse_query_params(query);

    match path {
        "/" => Ok(Route::Index),
        "/healthz" => Ok(Route::Healthz),
        "/pick-preview" | "/pick_preview" => {
            Ok(Route::PickPreview(Box::new(parse_pick_query(&params)?)))
        }
        _ => Err(RouteError::NotFound(format!("unknown route: {path}"))),
    }
}

fn parse_pick_query(params: &BTreeMap<String, String>) -> Result<PickQuery, RouteError> {
    let root_dir = params
        .get("root_dir")
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            RouteError::BadRequest(
                "missing root_dir (use /pick-preview?root_dir=<path>)".to_string(),
            )
        })?;

    let kind = match params.get("kind").map(String::as_str) {
        None | Some("files") => EntryKind::Files,
        Some("dirs") => EntryKind::Dirs,
        Some(other) => {
            return Err(RouteError::BadRequest(format!(
                "unknown kind '{other}' (use dirs or files)"
            )));
        }
    };

    let index = match params.get("index") {
        None => 0,
        Some(raw) => raw
            .parse()
            .map_err(|_| RouteError::BadRequest(format!("index is not an integer: '{raw}'")))?,
    };

    let sort = match params.get("sort").map(String::as_str) {
        None | Some("natural") => SortPolicy::Natural,
        Some("name") => SortPolicy::Name,
        Some("name_desc") => SortPolicy::NameDesc,
        Some("mtime") => SortPolicy::Mtime,
        Some("mtime_desc") => SortPolicy::MtimeDesc,
        Some(other) => {
            return Err(RouteError::BadRequest(format!("unknown sort '{other}'")));
        }
    };

    let on_out_of_range = match params.get("on_out_of_range").map(String::as_str) {
        None | Some("wrap") => OutOfRange::Wrap,
        Some("clamp") => OutOfRange::Clamp,
        Some("error") => OutOfRange::Error,
        Some(other) => {
            return Err(RouteError::BadRequest(format!(
                "unknown on_out_of_range '{other}'"
            )));
        }
    };

    let max_list_items = match params.get("max_list_items") {
        None => 20,
        Some(raw) => raw.parse().map_err(|_| {
            RouteError::BadRequest(format!("max_list_items is not a count: '{raw}'"))
        })?,
    };

    Ok(PickQuery {
        root_dir: PathBuf::from(root_dir),
        kind,
        index,
        sort,
        on_out_of_range,
        include: params.get("include").cloned().filter(|v| !v.is_empty()),
        exclude: params.get("exclude").cloned().filter(|v| !v.is_empty()),
        extensions: params.get("extensions").cloned().filter(|v| !v.is_empty()),
        max_list_items,
    })
}

fn parse_query_params(query: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (k, v) = match pair.split_once('=') {
            Some((k, v)) => (k, v),
            None => (pair, ""),
        };
        let key = percent_decode(k);
        if key.is_empty() {
            continue;
        }
        out.insert(key, percent_decode(v));
    }
    out
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                if let (Some(h), Some(l)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                    out.push((h * 16 + l) as char);
                    i += 3;
                } else {
                    out.push('%');
                    i += 1;
                }
            }
            ch => {
                out.push(ch as char);
                i += 1;
            }
        }
    }
    out
}

fn hex_val(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        _ => None,
    }
}

fn execute_route(route: Route) -> HttpResponse {
    match route {
        Route::Healthz => HttpResponse {
            status: 200,
            body: json!({ "ok": true }),
        },
        Route::Index => HttpResponse {
            status: 200,
            body: json!({
                "service": "latchq.preview.v1",
                "routes": [
                    "/healthz",
                    "/pick-preview?root_dir=<path>&kind=dirs|files&index=<n>&sort=...&on_out_of_range=...&include=...&exclude=...&extensions=...&max_list_items=<n>"
                ]
            }),
        },
        Route::PickPreview(query) => run_pick_preview(*query),
    }
}

fn run_pick_preview(query: PickQuery) -> HttpResponse {
    let request = PickRequest {
        root_dir: query.root_dir,
        index: query.index,
        sort: query.sort,
        on_out_of_range: query.on_out_of_range,
        include: query.include,
        exclude: query.exclude,
        extensions: query.extensions,
        max_list_items: query.max_list_items,
    };
    match pick(query.kind, &request) {
        Ok(output) => HttpResponse {
            status: 200,
            body: json!({
                "ok": true,
                "picked": {
                    "path": output.pick.path.display().to_string(),
                    "name": output.pick.name,
                    "stem": output.pick.stem,
                    "index": output.pick.index,
                    "total": output.pick.total,
                },
                "lines": output.lines,
            }),
        },
        Err(err) => pick_error_response(err),
    }
}

fn pick_error_response(err: NodeError) -> HttpResponse {
    let status = match &err {
        NodeError::Pick(PickError::InvalidRoot(_)) => 404,
        NodeError::Pick(PickError::Io { .. }) | NodeError::Store(_) => 500,
        NodeError::Pick(_) => 400,
    };
    HttpResponse {
        status,
        body: json!({ "ok": false, "error": err.to_string() }),
    }
}

fn write_json_response(stream: &mut TcpStream, response: HttpResponse) -> std::io::Result<()> {
    let body = serde_json::to_vec_pretty(&response.body)?;
    let status_text = reason_phrase(response.status);
    let header = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nAccess-Control-Allow-Origin: *\r\nAccess-Control-Allow-Methods: GET\r\nConnection: close\r\n\r\n",
        response.status,
        status_text,
        body.len()
    );
    stream.write_all(header.as_bytes())?;
    stream.write_all(&body)?;
    stream.flush()
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
