use crate::error::{ProcessingError, Result};
use crate::utils::constants::USER_AGENT;
use reqwest::StatusCode;
use tracing::{info, warn};

/// Single best-effort fetch of the station list page.
pub struct LocationFetcher {
    client: reqwest::blocking::Client,
}

impl LocationFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProcessingError::NetworkFetch {
                url: String::new(),
                message: format!("could not build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }

    pub fn fetch_html(&self, url: &str) -> Result<String> {
        let fetch_error = |message: String| ProcessingError::NetworkFetch {
            url: url.to_string(),
            message,
        };

        info!(url, "fetching station list");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(fetch_error(format!(
                "site refused automated access ({})",
                status
            )));
        }
        if !status.is_success() {
            return Err(fetch_error(format!("unexpected status {}", status)));
        }

        response.text().map_err(|e| fetch_error(e.to_string()))
    }

    /// Fetch the page and return its table rows as newline-joined cell text.
    pub fn fetch_rows(&self, url: &str) -> Result<Vec<String>> {
        let html = self.fetch_html(url)?;
        let rows = extract_table_rows(&html);
        if rows.is_empty() {
            warn!(url, "station list page contained no table rows");
            return Err(ProcessingError::NetworkFetch {
                url: url.to_string(),
                message: "page contained no table rows".to_string(),
            });
        }
        info!(url, rows = rows.len(), "extracted station list rows");
        Ok(rows)
    }
}

/// Scan `<tr>` blocks for `<td>` cells. Header rows built from `<th>` only
/// are skipped. Cell text has tags stripped, entities decoded and whitespace
/// collapsed.
pub fn extract_table_rows(html: &str) -> Vec<String> {
    // ASCII lowercasing keeps byte offsets aligned with `html`.
    let lower = html.to_ascii_lowercase();
    let mut rows = Vec::new();
    let mut cursor = 0;

    while let Some(start) = find_tag(&lower, "tr", cursor) {
        let body_start = match lower[start..].find('>') {
            Some(offset) => start + offset + 1,
            None => break,
        };
        let end = lower[body_start..]
            .find("</tr")
            .map(|offset| body_start + offset)
            .or_else(|| find_tag(&lower, "tr", body_start))
            .unwrap_or(lower.len());

        let cells = extract_cells(&html[body_start..end], &lower[body_start..end]);
        if !cells.is_empty() {
            rows.push(cells.join("\n"));
        }
        cursor = end;
    }

    rows
}

fn extract_cells(html: &str, lower: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cursor = 0;

    while let Some(start) = find_tag(lower, "td", cursor) {
        let body_start = match lower[start..].find('>') {
            Some(offset) => start + offset + 1,
            None => break,
        };
        let end = lower[body_start..]
            .find("</td")
            .map(|offset| body_start + offset)
            .or_else(|| find_tag(lower, "td", body_start))
            .unwrap_or(lower.len());

        cells.push(clean_cell(&html[body_start..end]));
        cursor = end;
    }

    cells
}

/// Position of the next `<name>` or `<name ...>` opening tag at or after `from`.
fn find_tag(lower: &str, name: &str, from: usize) -> Option<usize> {
    let pattern = format!("<{}", name);
    let mut cursor = from;

    while let Some(offset) = lower[cursor..].find(&pattern) {
        let position = cursor + offset;
        let next = lower[position + pattern.len()..].chars().next();
        if matches!(next, Some('>') | Some(' ') | Some('\t') | Some('\n') | Some('\r')) {
            return Some(position);
        }
        cursor = position + pattern.len();
    }

    None
}

fn clean_cell(fragment: &str) -> String {
    let mut text = String::with_capacity(fragment.len());
    let mut in_tag = false;

    for c in fragment.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    decode_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode the common named entities and any decimal (`&#8217;`) or hex
/// (`&#x27;`) character reference. Unrecognised sequences stay literal.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| entity_char(&tail[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn entity_char(name: &str) -> Option<char> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return match char::from_u32(code)? {
            '\u{00A0}' => Some(' '),
            c => Some(c),
        };
    }

    match name {
        "nbsp" => Some(' '),
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "rsquo" | "lsquo" => Some('\u{2019}'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    const PAGE: &str = r#"
<html><body>
<TABLE class="stations">
  <tr><th>Station</th><th>Country</th><th>Location</th><th>Type</th></tr>
  <tr>
    <td><a href="/filton">Filton</a></td>
    <td>England</td>
    <td>51.521,-2.576</td>
    <TD class="type">Automatic</TD>
  </tr>
  <tr><td>Lerwick&nbsp;(S)</td><td>Scotland</td><td>60.139,-1.183</td><td>Automatic</td></tr>
  <tr><td>Kew &amp; Richmond</td><td>England</td><td>51.481,-0.295</td><td>Manual</td>
</TABLE>
</body></html>
"#;

    #[test]
    fn test_extract_table_rows() {
        let rows = extract_table_rows(PAGE);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], "Filton\nEngland\n51.521,-2.576\nAutomatic");
        assert_eq!(rows[1], "Lerwick (S)\nScotland\n60.139,-1.183\nAutomatic");
        assert_eq!(rows[2], "Kew & Richmond\nEngland\n51.481,-0.295\nManual");
    }

    #[test]
    fn test_find_tag_skips_longer_names() {
        let lower = "<track><tr class=\"x\">";
        assert_eq!(find_tag(lower, "tr", 0), Some(7));
        assert_eq!(find_tag("<thead>", "th", 0), None);
    }

    #[test]
    fn test_clean_cell() {
        assert_eq!(clean_cell("  <b>Valley</b>\n  "), "Valley");
        assert_eq!(clean_cell("St&#39;Athan"), "St'Athan");
    }

    #[test]
    fn test_numeric_entities_decoded() {
        assert_eq!(clean_cell("O&#8217;Brien&#x27;s"), "O\u{2019}Brien's");
        assert_eq!(clean_cell("Ynys&#xF4;n&#160;Mon"), "Ynys\u{f4}n Mon");
    }

    #[test]
    fn test_unknown_entities_stay_literal() {
        assert_eq!(decode_entities("A & B &bogus; &#xZZ; &amp;"), "A & B &bogus; &#xZZ; &");
        assert_eq!(decode_entities("&#1114112;"), "&#1114112;");
        assert_eq!(decode_entities("trailing &"), "trailing &");
    }

    /// One-shot HTTP server on an ephemeral port; returns its base URL.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buffer = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buffer) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buffer[..n]),
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        });

        format!("http://{}/stations", address)
    }

    #[test]
    fn test_unreachable_host_is_a_fetch_error() {
        let fetcher = LocationFetcher::new().unwrap();
        let result = fetcher.fetch_rows("http://127.0.0.1:1/stations");
        assert!(matches!(result, Err(ProcessingError::NetworkFetch { .. })));
    }

    #[test]
    fn test_refused_access_is_a_fetch_error() {
        let url = serve_once("403 Forbidden", "blocked");
        let fetcher = LocationFetcher::new().unwrap();

        match fetcher.fetch_html(&url) {
            Err(ProcessingError::NetworkFetch { url: failed, message }) => {
                assert_eq!(failed, url);
                assert!(message.contains("refused"), "{}", message);
            }
            other => panic!("expected a fetch error, got {:?}", other),
        }
    }

    #[test]
    fn test_page_without_rows_is_a_fetch_error() {
        let url = serve_once("200 OK", "<html><body><p>Maintenance</p></body></html>");
        let fetcher = LocationFetcher::new().unwrap();
        let result = fetcher.fetch_rows(&url);
        assert!(matches!(result, Err(ProcessingError::NetworkFetch { .. })));
    }

    #[test]
    fn test_fetch_rows_from_served_page() {
        let url = serve_once("200 OK", PAGE);
        let rows = LocationFetcher::new().unwrap().fetch_rows(&url).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], "Filton\nEngland\n51.521,-2.576\nAutomatic");
    }
}
