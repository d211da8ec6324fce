//! Blocking HTTP stub standing in for Valet, plus canned response bodies.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

use valet_rs::Interpreter;

/// Serves fixed bodies by request path on 127.0.0.1 and records every request target.
/// Unknown paths answer 404.
pub struct Stub {
    pub base_url: String,
    hits: Arc<Mutex<Vec<String>>>,
}

impl Stub {
    /// `routes`: (path below the base URL, status, body), e.g. ("/lists/series/json", 200, ..).
    pub fn start(routes: &[(&str, u16, &str)]) -> Stub {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: HashMap<String, (u16, String)> = routes
            .iter()
            .map(|(p, s, b)| (format!("/valet{p}"), (*s, b.to_string())))
            .collect();
        let hits = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&hits);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let Ok(read_half) = stream.try_clone() else { continue };
                let mut reader = BufReader::new(read_half);
                let mut request_line = String::new();
                if reader.read_line(&mut request_line).is_err() {
                    continue;
                }
                // Drain headers; GET requests carry no body.
                loop {
                    let mut line = String::new();
                    match reader.read_line(&mut line) {
                        Ok(0) | Err(_) => break,
                        Ok(_) if line.trim().is_empty() => break,
                        Ok(_) => {}
                    }
                }
                let target = request_line
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("/")
                    .to_string();
                seen.lock().unwrap().push(target.clone());

                let path = target.split('?').next().unwrap_or("");
                let (status, body) = routes
                    .get(path)
                    .cloned()
                    .unwrap_or((404, r#"{"message":"not found"}"#.to_string()));
                let reason = match status {
                    200 => "OK",
                    404 => "Not Found",
                    _ => "Error",
                };
                let resp = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(resp.as_bytes());
                let _ = stream.flush();
            }
        });

        Stub {
            base_url: format!("http://{addr}/valet"),
            hits,
        }
    }

    /// Request targets (path + query) in arrival order.
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    pub fn hit_count(&self) -> usize {
        self.hits.lock().unwrap().len()
    }

    /// Interpreter wired to this stub, bypassing any proxy from the environment.
    pub fn interpreter(&self) -> Interpreter {
        let http = reqwest::blocking::Client::builder()
            .no_proxy()
            .build()
            .unwrap();
        Interpreter::new()
            .with_http_client(http)
            .with_base_url(&self.base_url)
    }
}

/// Stub serving every fixture below at its real Valet path.
pub fn valet_stub() -> Stub {
    Stub::start(&[
        ("/lists/series/json", 200, SERIES_LIST_JSON),
        ("/lists/groups/json", 200, GROUPS_LIST_JSON),
        ("/series/FXUSDCAD/json", 200, SERIES_DETAIL_JSON),
        ("/series/FXUSDCAD/xml", 200, SERIES_DETAIL_XML),
        ("/series/FXUSDCAD/csv", 200, SERIES_DETAIL_CSV),
        ("/groups/FX_RATES_DAILY/csv", 200, GROUP_DETAIL_CSV),
        ("/groups/FX_RATES_DAILY/json", 200, GROUP_DETAIL_JSON),
        ("/observations/FXUSDCAD/json", 200, SERIES_OBS_JSON),
        ("/observations/FXUSDCAD/csv", 200, SERIES_OBS_CSV),
        ("/observations/FXUSDCAD,FXEURCAD/json", 200, MULTI_OBS_JSON),
        ("/observations/group/FX_RATES_DAILY/json", 200, GROUP_OBS_JSON),
        ("/observations/group/FX_RATES_DAILY/csv", 200, GROUP_OBS_CSV),
        ("/fx_rss/FXUSDCAD", 200, FX_RSS),
        ("/fx_rss/FXUSDCAD,FXEURCAD", 200, FX_RSS),
        ("/series/BROKEN/json", 200, "{\"seriesDetails\": "),
        ("/series/FLAKY/json", 500, "internal error"),
        ("/series/MAINTENANCE/csv", 200, MAINTENANCE_HTML),
        ("/series/MAINTENANCE/xml", 200, ERROR_XML),
        ("/groups/EMPTY_GROUP/csv", 200, EMPTY_GROUP_CSV),
    ])
}

pub const SERIES_LIST_JSON: &str = r#"{
  "terms": {"url": "https://www.bankofcanada.ca/terms/"},
  "series": {
    "FXUSDCAD": {
      "label": "USD/CAD",
      "description": "US dollar to Canadian dollar daily exchange rate",
      "link": "https://www.bankofcanada.ca/valet/series/FXUSDCAD"
    },
    "FXEURCAD": {
      "label": "EUR/CAD",
      "description": "European euro to Canadian dollar daily exchange rate",
      "link": "https://www.bankofcanada.ca/valet/series/FXEURCAD"
    }
  }
}"#;

pub const GROUPS_LIST_JSON: &str = r#"{
  "terms": {"url": "https://www.bankofcanada.ca/terms/"},
  "groups": {
    "FX_RATES_DAILY": {
      "label": "Daily exchange rates",
      "description": "Daily average exchange rates - published once each business day by 16:30 ET."
    },
    "FX_RATES_MONTHLY": {
      "label": "Monthly exchange rates",
      "description": "Monthly average exchange rates",
      "link": "https://www.bankofcanada.ca/valet/groups/FX_RATES_MONTHLY"
    }
  }
}"#;

pub const SERIES_DETAIL_JSON: &str = r#"{
  "terms": {"url": "https://www.bankofcanada.ca/terms/"},
  "seriesDetails": {
    "name": "FXUSDCAD",
    "label": "USD/CAD",
    "description": "US dollar to Canadian dollar daily exchange rate",
    "dimension": {"key": "d", "name": "date"}
  }
}"#;

pub const SERIES_DETAIL_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<seriesDetails>
  <terms><url>https://www.bankofcanada.ca/terms/</url></terms>
  <series id="FXUSDCAD">
    <label>USD/CAD</label>
    <description>US dollar to Canadian dollar daily exchange rate</description>
    <dimension key="d">date</dimension>
  </series>
</seriesDetails>"#;

pub const SERIES_DETAIL_CSV: &str = "\"TERMS AND CONDITIONS\"
\"https://www.bankofcanada.ca/terms/\"

\"SERIES\"
id,label,description
FXUSDCAD,USD/CAD,US dollar to Canadian dollar daily exchange rate
";

/// What a maintenance page looks like when served with status 200.
pub const MAINTENANCE_HTML: &str = "<html><body>Service unavailable</body></html>\n";

pub const ERROR_XML: &str = "<error><message>oops</message></error>";

pub const EMPTY_GROUP_CSV: &str = "\"GROUP DETAILS\"
name,label,description
";

pub const GROUP_DETAIL_CSV: &str = "\"TERMS AND CONDITIONS\"
\"https://www.bankofcanada.ca/terms/\"

\"GROUP DETAILS\"
name,label,description
FX_RATES_DAILY,Daily exchange rates,\"Daily average exchange rates - published once each business day by 16:30 ET.\"

\"GROUP SERIES\"
name,label,link
FXAUDCAD,AUD/CAD,https://www.bankofcanada.ca/valet/series/FXAUDCAD
FXEURCAD,EUR/CAD,https://www.bankofcanada.ca/valet/series/FXEURCAD
FXUSDCAD,USD/CAD,https://www.bankofcanada.ca/valet/series/FXUSDCAD
";

pub const GROUP_DETAIL_JSON: &str = r#"{
  "terms": {"url": "https://www.bankofcanada.ca/terms/"},
  "groupDetails": {
    "name": "FX_RATES_DAILY",
    "label": "Daily exchange rates",
    "description": "Daily average exchange rates",
    "groupSeries": {
      "FXAUDCAD": {"label": "AUD/CAD", "link": "https://www.bankofcanada.ca/valet/series/FXAUDCAD"},
      "FXUSDCAD": {"label": "USD/CAD", "link": "https://www.bankofcanada.ca/valet/series/FXUSDCAD"}
    }
  }
}"#;

pub const SERIES_OBS_JSON: &str = r#"{
  "terms": {"url": "https://www.bankofcanada.ca/terms/"},
  "seriesDetail": {
    "FXUSDCAD": {
      "label": "USD/CAD",
      "description": "US dollar to Canadian dollar daily exchange rate",
      "dimension": {"key": "d", "name": "date"}
    }
  },
  "observations": [
    {"d": "2024-01-02", "FXUSDCAD": {"v": "1.3316"}},
    {"d": "2024-01-03", "FXUSDCAD": {"v": "1.3342"}}
  ]
}"#;

pub const SERIES_OBS_CSV: &str = "\"TERMS AND CONDITIONS\"
\"https://www.bankofcanada.ca/terms/\"

\"SERIES\"
id,label,description
FXUSDCAD,USD/CAD,US dollar to Canadian dollar daily exchange rate

\"OBSERVATIONS\"
date,FXUSDCAD
2024-01-02,1.3316
2024-01-03,1.3342
2024-01-04,
";

pub const MULTI_OBS_JSON: &str = r#"{
  "seriesDetail": {
    "FXUSDCAD": {"label": "USD/CAD", "description": "US dollar"},
    "FXEURCAD": {"label": "EUR/CAD", "description": "Euro"}
  },
  "observations": [
    {"d": "2024-01-02", "FXUSDCAD": {"v": "1.3316"}, "FXEURCAD": {"v": "1.4587"}},
    {"d": "2024-01-03", "FXUSDCAD": {"v": "1.3342"}}
  ]
}"#;

pub const GROUP_OBS_JSON: &str = r#"{
  "groupDetail": {"name": "FX_RATES_DAILY", "label": "Daily exchange rates", "description": "Daily"},
  "seriesDetail": {
    "FXAUDCAD": {"label": "AUD/CAD", "description": "Australian dollar", "dimension": {"key": "d", "name": "date"}},
    "FXUSDCAD": {"label": "USD/CAD", "description": "US dollar", "dimension": {"key": "d", "name": "date"}}
  },
  "observations": [
    {"d": "2024-01-02", "FXAUDCAD": {"v": "0.8958"}, "FXUSDCAD": {"v": "1.3316"}}
  ]
}"#;

pub const GROUP_OBS_CSV: &str = "\"TERMS AND CONDITIONS\"
\"https://www.bankofcanada.ca/terms/\"

\"GROUP DETAIL\"
name,label,description
FX_RATES_DAILY,Daily exchange rates,Daily

\"SERIES\"
id,label,description
FXAUDCAD,AUD/CAD,Australian dollar
FXUSDCAD,USD/CAD,US dollar

\"OBSERVATIONS\"
date,FXAUDCAD,FXUSDCAD
2024-01-02,0.8958,1.3316
2024-01-03,0.8987,1.3342
";

pub const FX_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/">
  <channel rdf:about="https://www.bankofcanada.ca/valet/fx_rss/FXUSDCAD">
    <title>Bank of Canada exchange rates: USD/CAD</title>
  </channel>
  <item rdf:about="https://www.bankofcanada.ca/rates/exchange/daily-exchange-rates/2024-01-02">
    <title>CA: 1.3316 CAD = 1 USD 2024-01-02 Bank of Canada daily exchange rates</title>
  </item>
</rdf:RDF>"#;
