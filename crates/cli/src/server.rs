//! Thread-per-connection TCP server.
//!
//! One blocking `TcpListener::accept` loop; each accepted connection is
//! handed to its own thread, which reads newline-delimited JSON requests,
//! dispatches them against a shared `Engine`, and writes back a
//! newline-delimited JSON response. A connection that sends malformed
//! JSON gets an error response on that line and the loop continues —
//! only a closed socket ends the connection's thread.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use lattice_engine::Engine;
use tracing::{info, warn};

use crate::protocol::{Request, Response};

/// Bind `port` and serve forever, dispatching every connection against
/// `engine`. Never returns unless the listener itself fails to bind.
pub fn serve(port: u16, engine: Arc<Engine>) -> std::io::Result<()> {
    let listener = TcpListener::bind(("127.0.0.1", port))?;
    info!(port, "lattice-cli listening");

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "failed to accept connection");
                continue;
            }
        };
        let engine = Arc::clone(&engine);
        thread::spawn(move || handle_connection(stream, engine));
    }
    Ok(())
}

fn handle_connection(stream: TcpStream, engine: Arc<Engine>) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let mut writer = match stream.try_clone() {
        Ok(w) => w,
        Err(e) => {
            warn!(peer, error = %e, "failed to clone connection for writing");
            return;
        }
    };
    let reader = BufReader::new(stream);

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(peer, error = %e, "connection read error");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = dispatch(&line, &engine);
        let mut payload = match serde_json::to_string(&response) {
            Ok(s) => s,
            Err(e) => format!(r#"{{"status":"error","message":"{}"}}"#, e),
        };
        payload.push('\n');
        if writer.write_all(payload.as_bytes()).is_err() {
            break;
        }
    }
}

fn dispatch(line: &str, engine: &Engine) -> Response {
    let request: Request = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => return Response::error(format!("invalid request: {}", e)),
    };

    match request {
        Request::Set { key, value } => match engine.set(&key, &value) {
            Ok(()) => Response::ok(),
            Err(e) => Response::error(e.to_string()),
        },
        Request::Get { key } => Response::get_ok(engine.get(&key)),
        Request::Delete { key } => match engine.delete(&key) {
            Ok(true) => Response::ok(),
            Ok(false) => Response::error("key not present"),
            Err(e) => Response::error(e.to_string()),
        },
        Request::BulkSet { items } => match engine.bulk_set(&items) {
            Ok(()) => Response::ok(),
            Err(e) => Response::error(e.to_string()),
        },
        Request::SearchText { query } => {
            let mut resp = Response::ok();
            let keys: Vec<String> = engine.search_text(&query).into_iter().collect();
            resp.results = Some(serde_json::to_value(keys).expect("keys serialize"));
            resp
        }
        Request::SearchSimilar { query, top_k } => match engine.search_similar(&query, top_k) {
            Ok(hits) => {
                let mut resp = Response::ok();
                resp.results = Some(serde_json::to_value(hits).expect("hits serialize"));
                resp
            }
            Err(e) => Response::error(e.to_string()),
        },
        Request::GetAllKeys => {
            let mut resp = Response::ok();
            resp.keys = Some(engine.get_all_keys().into_iter().collect());
            resp
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_engine::EngineConfig;
    use tempfile::TempDir;

    fn engine() -> (TempDir, Engine) {
        let dir = TempDir::new().unwrap();
        let engine = Engine::open(dir.path(), EngineConfig::default()).unwrap();
        (dir, engine)
    }

    #[test]
    fn set_then_get_round_trips_through_dispatch() {
        let (_dir, engine) = engine();
        let set = dispatch(r#"{"command":"set","key":"a","value":"1"}"#, &engine);
        assert_eq!(set.status, "ok");

        let get = dispatch(r#"{"command":"get","key":"a"}"#, &engine);
        assert_eq!(get.value, Some(Some("1".to_string())));
    }

    #[test]
    fn get_of_an_absent_key_is_ok_with_a_null_value() {
        let (_dir, engine) = engine();
        let get = dispatch(r#"{"command":"get","key":"missing"}"#, &engine);
        assert_eq!(get.status, "ok");
        assert_eq!(get.value, Some(None));
    }

    #[test]
    fn delete_of_an_absent_key_is_an_error_response() {
        let (_dir, engine) = engine();
        let resp = dispatch(r#"{"command":"delete","key":"missing"}"#, &engine);
        assert_eq!(resp.status, "error");
    }

    #[test]
    fn delete_of_a_present_key_is_ok() {
        let (_dir, engine) = engine();
        dispatch(r#"{"command":"set","key":"a","value":"1"}"#, &engine);
        let resp = dispatch(r#"{"command":"delete","key":"a"}"#, &engine);
        assert_eq!(resp.status, "ok");
    }

    #[test]
    fn unknown_command_is_rejected_as_an_error_response() {
        let (_dir, engine) = engine();
        let resp = dispatch(r#"{"command":"frobnicate"}"#, &engine);
        assert_eq!(resp.status, "error");
        assert!(resp.message.is_some());
    }

    #[test]
    fn get_all_keys_reflects_prior_writes() {
        let (_dir, engine) = engine();
        dispatch(r#"{"command":"set","key":"a","value":"1"}"#, &engine);
        dispatch(r#"{"command":"set","key":"b","value":"2"}"#, &engine);
        let resp = dispatch(r#"{"command":"get_all_keys"}"#, &engine);
        let mut keys = resp.keys.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }
}
