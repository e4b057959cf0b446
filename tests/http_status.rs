//! `HttpSource` against a canned local HTTP server: status and body mapping.

use acs_rs::api::{Client, ClientConfig};
use acs_rs::error::{FetchFailure, QueryError};
use acs_rs::models::{Geography, ResolvedColumnPlan, VariableSpec};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

const UNKNOWN_VARIABLE: &str = "error: unknown variable 'B99999_001E'";

/// Canned reply for a vintage: status, content type, body.
fn reply_for(year: &str) -> (u16, &'static str, String) {
    match year {
        "2020" => (401, "text/plain", "Invalid Key".into()),
        "2021" => (403, "text/plain", "Forbidden".into()),
        "2022" => (400, "text/plain", format!("{UNKNOWN_VARIABLE}\n")),
        "2019" => (500, "text/plain", String::new()),
        "2023" => (200, "text/html", "<html><body>Service Unavailable</body></html>".into()),
        _ => (
            200,
            "application/json",
            r#"[["NAME","B01003_001E","B19013_001E","state","county"],
                ["Wayne County, Michigan","1770000","-666666666","26","163"]]"#
                .into(),
        ),
    }
}

/// Serve canned replies keyed on the vintage in the path. Returns the base URL
/// and the request targets seen so far.
fn serve() -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local listener");
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
            }
            let target = request_line.split_whitespace().nth(1).unwrap_or_default().to_string();
            let year = target.split('/').nth(2).unwrap_or_default().to_string();
            log.lock().unwrap().push(target);

            let (code, content_type, body) = reply_for(&year);
            let response = format!(
                "HTTP/1.1 {code} Canned\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    (format!("http://{addr}/data"), seen)
}

fn plan() -> ResolvedColumnPlan {
    ResolvedColumnPlan::from_specs([
        VariableSpec::raw("B01003_001E"),
        VariableSpec::raw("B19013_001E"),
    ])
}

fn client(base_url: String) -> Client {
    Client::new(ClientConfig {
        base_url,
        max_in_flight: 1,
        ..ClientConfig::default()
    })
}

fn fetch_error(year: i32) -> QueryError {
    let (base, _) = serve();
    client(base)
        .fetch_years(&plan(), &[year], &Geography::AllCounties, "test-key")
        .unwrap_err()
}

#[test]
fn rejected_keys_map_to_unauthorized() {
    for (year, code) in [(2020, 401), (2021, 403)] {
        assert_eq!(
            fetch_error(year),
            QueryError::Fetch {
                year,
                codes: "B01003_001E..B19013_001E".into(),
                cause: FetchFailure::Unauthorized(code),
            }
        );
    }
}

#[test]
fn other_statuses_keep_the_provider_explanation() {
    let err = fetch_error(2022);
    assert_eq!(
        err,
        QueryError::Fetch {
            year: 2022,
            codes: "B01003_001E..B19013_001E".into(),
            cause: FetchFailure::Status {
                code: 400,
                detail: UNKNOWN_VARIABLE.into(),
            },
        }
    );
    let msg = err.to_string();
    assert!(msg.contains("year 2022"), "{msg}");
    assert!(msg.contains("B01003_001E..B19013_001E"), "{msg}");
    assert!(msg.contains("HTTP 400"), "{msg}");
    assert!(msg.contains("B99999_001E"), "{msg}");
}

#[test]
fn server_error_without_body() {
    match fetch_error(2019) {
        QueryError::Fetch {
            year: 2019,
            cause: FetchFailure::Status { code: 500, detail },
            ..
        } => assert_eq!(detail, "empty response body"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn non_json_body_is_malformed() {
    match fetch_error(2023) {
        QueryError::Fetch {
            year: 2023,
            cause: FetchFailure::Malformed(_),
            ..
        } => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn successful_body_is_decoded() {
    let (base, seen) = serve();
    let fetched = client(base)
        .fetch_years(&plan(), &[2024], &Geography::AllCounties, "test-key")
        .unwrap();
    let rows = &fetched[0].batches[0];
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].county.fips, "163");
    assert_eq!(rows[0].county.name, "Wayne");
    assert_eq!(
        rows[0].values,
        vec![
            ("B01003_001E".to_string(), Some("1770000".to_string())),
            ("B19013_001E".to_string(), None),
        ]
    );

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].starts_with("/data/2024/acs/acs5?get=NAME,B01003_001E,B19013_001E&"));
    assert!(seen[0].ends_with("&key=test-key"));
}
