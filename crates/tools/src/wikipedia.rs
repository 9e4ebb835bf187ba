//! Wikipedia tool — looks topics up through the MediaWiki action API.
//!
//! A lookup runs a full-text search for the query, then fetches the plain
//! text introduction of each of the top results.

use async_trait::async_trait;
use mathwise_config::WikipediaConfig;
use mathwise_core::error::ToolError;
use mathwise_core::tool::Tool;
use std::time::Duration;

pub const NAME: &str = "Wikipedia";

/// Returned when the search has no hits.
pub const NO_RESULT: &str = "No good Wikipedia Search Result was found";

/// Longest query forwarded to the search API.
const MAX_QUERY_CHARS: usize = 300;

pub struct WikipediaTool {
    client: reqwest::Client,
    config: WikipediaConfig,
}

impl WikipediaTool {
    pub fn new(config: WikipediaConfig) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("mathwise/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| upstream(format!("HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    async fn get_json(&self, params: &[(&str, &str)]) -> Result<serde_json::Value, ToolError> {
        let response = self
            .client
            .get(&self.config.api_url)
            .query(&[("format", "json"), ("utf8", "1")])
            .query(params)
            .send()
            .await
            .map_err(|e| upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(upstream(format!("Wikipedia returned HTTP {}", status.as_u16())));
        }

        response.json().await.map_err(|e| upstream(format!("malformed response: {e}")))
    }

    async fn search(&self, query: &str) -> Result<Vec<String>, ToolError> {
        let limit = self.config.top_k.to_string();
        let body = self
            .get_json(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
            ])
            .await?;
        Ok(parse_search_titles(&body))
    }

    async fn summary(&self, title: &str) -> Result<Option<String>, ToolError> {
        let body = self
            .get_json(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
            ])
            .await?;
        Ok(parse_extract(&body))
    }
}

fn upstream(reason: String) -> ToolError {
    ToolError::Upstream {
        tool_name: NAME.into(),
        reason,
    }
}

#[async_trait]
impl Tool for WikipediaTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "A tool for searching the Internet to find various information on the topics mentioned"
    }

    async fn invoke(&self, query: &str) -> Result<String, ToolError> {
        let query: String = query.trim().chars().take(MAX_QUERY_CHARS).collect();
        if query.is_empty() {
            return Err(ToolError::InvalidInput {
                tool_name: NAME.into(),
                reason: "empty search query".into(),
            });
        }

        let titles = self.search(&query).await?;
        tracing::debug!(query = %query, hits = titles.len(), "Wikipedia search");

        let mut pages = Vec::with_capacity(titles.len());
        for title in titles {
            if let Some(extract) = self.summary(&title).await? {
                pages.push((title, extract));
            }
        }

        Ok(format_pages(&pages, self.config.max_chars))
    }
}

/// Titles from a `list=search` response, in rank order.
pub fn parse_search_titles(body: &serde_json::Value) -> Vec<String> {
    body["query"]["search"]
        .as_array()
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| hit["title"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// The first non-empty extract from a `prop=extracts` response.
pub fn parse_extract(body: &serde_json::Value) -> Option<String> {
    body["query"]["pages"]
        .as_object()?
        .values()
        .filter_map(|page| page["extract"].as_str())
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(String::from)
}

/// `Page: ...` / `Summary: ...` blocks separated by blank lines, cut to
/// `max_chars` characters.
pub fn format_pages(pages: &[(String, String)], max_chars: usize) -> String {
    if pages.is_empty() {
        return NO_RESULT.to_string();
    }
    let joined = pages
        .iter()
        .map(|(title, summary)| format!("Page: {title}\nSummary: {summary}"))
        .collect::<Vec<_>>()
        .join("\n\n");
    joined.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_search_titles_in_order() {
        let body = serde_json::json!({
            "query": {"search": [
                {"title": "Eigenvalues and eigenvectors", "pageid": 1},
                {"title": "Characteristic polynomial", "pageid": 2}
            ]}
        });
        assert_eq!(
            parse_search_titles(&body),
            vec!["Eigenvalues and eigenvectors", "Characteristic polynomial"]
        );
    }

    #[test]
    fn missing_search_block_is_empty() {
        assert!(parse_search_titles(&serde_json::json!({"batchcomplete": ""})).is_empty());
    }

    #[test]
    fn parses_extract() {
        let body = serde_json::json!({
            "query": {"pages": {"12345": {
                "title": "Quadratic formula",
                "extract": "  In elementary algebra, the quadratic formula is...  "
            }}}
        });
        assert_eq!(
            parse_extract(&body).as_deref(),
            Some("In elementary algebra, the quadratic formula is...")
        );
    }

    #[test]
    fn missing_page_has_no_extract() {
        let body = serde_json::json!({"query": {"pages": {"-1": {"missing": ""}}}});
        assert!(parse_extract(&body).is_none());
    }

    #[test]
    fn formats_pages_with_blank_line_between() {
        let pages = vec![
            ("A".to_string(), "first".to_string()),
            ("B".to_string(), "second".to_string()),
        ];
        assert_eq!(
            format_pages(&pages, 4000),
            "Page: A\nSummary: first\n\nPage: B\nSummary: second"
        );
    }

    #[test]
    fn formatting_respects_char_limit() {
        let pages = vec![("Pi".to_string(), "π".repeat(100))];
        let out = format_pages(&pages, 20);
        assert_eq!(out.chars().count(), 20);
    }

    #[test]
    fn no_pages_gives_fixed_message() {
        assert_eq!(format_pages(&[], 4000), NO_RESULT);
    }

    #[tokio::test]
    async fn empty_query_rejected_before_network() {
        let tool = WikipediaTool::new(WikipediaConfig::default()).unwrap();
        let err = tool.invoke("   ").await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_upstream_error() {
        let config = WikipediaConfig {
            api_url: "http://127.0.0.1:9/w/api.php".into(),
            timeout_secs: 2,
            ..WikipediaConfig::default()
        };
        let tool = WikipediaTool::new(config).unwrap();
        let err = tool.invoke("Fourier transform").await.unwrap_err();
        assert!(matches!(err, ToolError::Upstream { .. }));
    }

    // --- Search and extracts against a local MediaWiki stand-in ---

    use axum::Router;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use std::collections::HashMap;

    async fn fake_mediawiki(Query(params): Query<HashMap<String, String>>) -> Response {
        let param = |key: &str| params.get(key).map(String::as_str).unwrap_or_default();
        let body = match (param("list"), param("prop")) {
            ("search", _) if param("srsearch") == "nothing here" => {
                serde_json::json!({"query": {"search": []}})
            }
            ("search", _) => {
                let limit: usize = param("srlimit").parse().unwrap_or(10);
                let hits: Vec<_> = ["Derivative", "Chain rule", "Product rule"]
                    .iter()
                    .take(limit)
                    .map(|title| serde_json::json!({"title": title}))
                    .collect();
                serde_json::json!({"query": {"search": hits}})
            }
            (_, "extracts") => {
                let title = param("titles");
                let extract = if title == "Chain rule" {
                    String::new()
                } else {
                    format!("{title} is a calculus topic.")
                };
                serde_json::json!({"query": {"pages": {"1": {"title": title, "extract": extract}}}})
            }
            _ => return StatusCode::BAD_REQUEST.into_response(),
        };
        body.to_string().into_response()
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/w/api.php")
    }

    async fn tool_for(router: Router, top_k: usize, max_chars: usize) -> WikipediaTool {
        let config = WikipediaConfig {
            api_url: serve(router).await,
            top_k,
            max_chars,
            ..WikipediaConfig::default()
        };
        WikipediaTool::new(config).unwrap()
    }

    #[tokio::test]
    async fn lookup_formats_top_pages() {
        let tool = tool_for(Router::new().route("/w/api.php", get(fake_mediawiki)), 3, 4000).await;

        let output = tool.invoke("derivative rules").await.unwrap();
        assert_eq!(
            output,
            "Page: Derivative\nSummary: Derivative is a calculus topic.\n\n\
             Page: Product rule\nSummary: Product rule is a calculus topic."
        );
    }

    #[tokio::test]
    async fn lookup_respects_top_k_and_max_chars() {
        let tool = tool_for(Router::new().route("/w/api.php", get(fake_mediawiki)), 1, 20).await;

        let output = tool.invoke("derivative").await.unwrap();
        assert_eq!(output, "Page: Derivative\nSum");
    }

    #[tokio::test]
    async fn lookup_without_hits_says_so() {
        let tool = tool_for(Router::new().route("/w/api.php", get(fake_mediawiki)), 3, 4000).await;
        assert_eq!(tool.invoke("nothing here").await.unwrap(), NO_RESULT);
    }

    #[tokio::test]
    async fn http_error_is_upstream_failure() {
        let router = Router::new().route(
            "/w/api.php",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let tool = tool_for(router, 3, 4000).await;

        match tool.invoke("derivative").await.unwrap_err() {
            ToolError::Upstream { reason, .. } => assert!(reason.contains("503")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_upstream_failure() {
        let router = Router::new().route("/w/api.php", get(|| async { "<html>oops</html>" }));
        let tool = tool_for(router, 3, 4000).await;

        assert!(matches!(
            tool.invoke("derivative").await.unwrap_err(),
            ToolError::Upstream { .. }
        ));
    }
}
