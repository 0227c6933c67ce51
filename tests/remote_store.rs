//! Purpose: Exercise `RemoteStore` over real TCP against a canned HTTP responder.
//! Exports: None (integration test module).
//! Role: Validate request paths/bodies and error propagation across the wire.
//! Invariants: Loopback only; each responder serves a fixed number of requests.
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use rowshell::api::{ErrorKind, ReadOption, RemoteClient, RowRange, RowStore};
use rowshell::shell::Interpreter;
use serde_json::{Value, json};
use time::UtcOffset;

#[derive(Debug)]
struct Captured {
    request_line: String,
    authorization: Option<String>,
    body: String,
}

struct Responder {
    base_url: String,
    captured: mpsc::Receiver<Captured>,
    handle: JoinHandle<()>,
}

impl Responder {
    fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let base_url = format!("http://{}", listener.local_addr().expect("addr"));
        let (tx, captured) = mpsc::channel();
        let handle = thread::spawn(move || {
            for (status, body) in responses {
                let (stream, _) = listener.accept().expect("accept");
                let mut reader = BufReader::new(stream.try_clone().expect("clone"));
                tx.send(read_request(&mut reader)).expect("send");
                let mut stream = stream;
                write!(
                    stream,
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                )
                .expect("respond");
            }
        });
        Self {
            base_url,
            captured,
            handle,
        }
    }

    fn next(&self) -> Captured {
        self.captured.recv().expect("captured request")
    }

    fn finish(self) {
        self.handle.join().expect("responder thread");
    }
}

fn read_request(reader: &mut impl BufRead) -> Captured {
    let mut request_line = String::new();
    reader.read_line(&mut request_line).expect("request line");
    let mut content_length = 0usize;
    let mut authorization = None;
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).expect("header");
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            let value = value.trim().to_string();
            match name.to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.parse().expect("length"),
                "authorization" => authorization = Some(value),
                _ => {}
            }
        }
    }
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).expect("body");
    Captured {
        request_line: request_line.trim_end().to_string(),
        authorization,
        body: String::from_utf8(body).expect("utf8 body"),
    }
}

fn rows_body() -> String {
    json!({
        "table": "users",
        "rows": [{"key": "a", "columns": [
            {"family": "d", "qualifier": "d:row", "value": [97, 49], "version": "2018-01-01T00:00:00Z"}
        ]}]
    })
    .to_string()
}

#[test]
fn list_tables_sends_token_and_parses_names() {
    let responder = Responder::start(vec![(200, json!({"tables": ["a", "b"]}).to_string())]);
    let store = RemoteClient::new(responder.base_url.as_str())
        .expect("client")
        .with_token("secret")
        .instance("p", "i");

    let tables = store.list_tables().expect("tables");
    assert_eq!(tables, vec!["a".to_string(), "b".to_string()]);

    let request = responder.next();
    assert_eq!(request.request_line, "GET /v1/projects/p/instances/i/tables HTTP/1.1");
    assert_eq!(request.authorization.as_deref(), Some("Bearer secret"));
    responder.finish();
}

#[test]
fn get_rows_posts_query_and_converts_rows() {
    let responder = Responder::start(vec![(200, rows_body())]);
    let store = RemoteClient::new(responder.base_url.as_str())
        .expect("client")
        .instance("p", "i")
        .with_offset(UtcOffset::UTC);

    let result = store
        .get_rows("users", &RowRange::prefix("a"), &[ReadOption::LatestVersions(1)])
        .expect("rows");
    assert_eq!(result.table, "users");
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].columns[0].value, b"a1".to_vec());

    let request = responder.next();
    assert_eq!(
        request.request_line,
        "POST /v1/projects/p/instances/i/tables/users/rows:read HTTP/1.1"
    );
    let body: Value = serde_json::from_str(&request.body).expect("json body");
    assert_eq!(
        body,
        json!({"range": {"kind": "prefix", "prefix": "a"}, "latest_versions": 1})
    );
    responder.finish();
}

#[test]
fn remote_errors_keep_their_kind() {
    let responder = Responder::start(vec![
        (
            404,
            json!({"error": {"kind": "NotFound", "message": "table \"nope\" not found"}})
                .to_string(),
        ),
        (503, "unavailable".to_string()),
    ]);
    let store = RemoteClient::new(responder.base_url.as_str())
        .expect("client")
        .instance("p", "i");

    let err = store.get_row("nope", "1").expect_err("not found");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = store.list_tables().expect_err("unavailable");
    assert_eq!(err.kind(), ErrorKind::Internal);
    responder.finish();
}

#[test]
fn interpreter_renders_remote_rows() {
    let responder = Responder::start(vec![(200, rows_body())]);
    let store = RemoteClient::new(responder.base_url.as_str())
        .expect("client")
        .instance("p", "i")
        .with_offset(UtcOffset::UTC);

    let mut interpreter = Interpreter::new(store, Vec::new(), Vec::new());
    interpreter.execute("lookup users a");
    let (_, out, err) = interpreter.into_parts();
    assert_eq!(
        String::from_utf8(out).expect("utf8"),
        "----------------------------------------\na\n  d:row                                    @ 2018/01/01-00:00:00.000000\n    \"a1\"\n"
    );
    assert!(err.is_empty());

    let request = responder.next();
    assert_eq!(
        request.request_line,
        "GET /v1/projects/p/instances/i/tables/users/rows/a HTTP/1.1"
    );
    responder.finish();
}

#[test]
fn unreachable_endpoint_is_io_error() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let store = RemoteClient::new(format!("http://{addr}"))
        .expect("client")
        .instance("p", "i");
    let err = store.list_tables().expect_err("refused");
    assert_eq!(err.kind(), ErrorKind::Io);
}
