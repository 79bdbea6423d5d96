//! Web access tools: search, page fetching and link extraction.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};

use super::Tool;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; LocalAgent/0.1)";
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_SEARCH_RESULTS: u64 = 10;
const MAX_RAW_HTML: usize = 8000;
const SUMMARY_PREVIEW: usize = 500;
const MAX_LINKS: usize = 100;

fn http_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .build()?)
}

async fn get_html(url: &str) -> anyhow::Result<String> {
    let response = http_client()?.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(anyhow::anyhow!("HTTP error: {}", status));
    }
    Ok(response.text().await?)
}

fn required_str<'a>(args: &'a Value, key: &str) -> anyhow::Result<&'a str> {
    args[key]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' argument", key))
}

/// Search the web through DuckDuckGo's HTML endpoint.
pub struct WebSearch;

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web using DuckDuckGo when the user explicitly asks to search OR when you need very recent/current information you don't have. Returns titles, URLs, and snippets."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum results to return (default 5, max 10)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let query = required_str(&args, "query")?;
        // Small models often send numbers as strings.
        let max_results = args["max_results"]
            .as_u64()
            .or_else(|| args["max_results"].as_str().and_then(|s| s.trim().parse().ok()))
            .unwrap_or(5)
            .clamp(1, MAX_SEARCH_RESULTS) as usize;

        let url = format!(
            "https://html.duckduckgo.com/html/?q={}",
            urlencoding::encode(query)
        );
        let html = get_html(&url).await?;
        let results = extract_ddg_results(&html, max_results);

        if results.is_empty() {
            Ok(json!({ "message": format!("No results found for: {}", query) }))
        } else {
            Ok(Value::Array(results))
        }
    }
}

/// Pull `{title, url, snippet}` entries out of a DuckDuckGo result page.
fn extract_ddg_results(html: &str, limit: usize) -> Vec<Value> {
    let mut results = Vec::new();

    for chunk in html.split("class=\"result__body\"").skip(1) {
        if results.len() >= limit {
            break;
        }

        let field = |class: &str| {
            chunk
                .split(class)
                .nth(1)
                .and_then(|s| s.split('>').nth(1))
                .and_then(|s| s.split('<').next())
                .map(|s| html_decode(s.trim()))
                .unwrap_or_default()
        };

        let title = field("class=\"result__a\"");
        if title.is_empty() {
            continue;
        }

        results.push(json!({
            "title": title,
            "url": field("class=\"result__url\""),
            "snippet": field("class=\"result__snippet\""),
        }));
    }

    results
}

/// Basic HTML entity decoding.
fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
}

/// Fetch a page and extract its content.
pub struct FetchPage;

#[async_trait]
impl Tool for FetchPage {
    fn name(&self) -> &str {
        "fetch_page"
    }

    fn description(&self) -> &str {
        "Fetch a web page and extract its text content. Best for articles, documentation, and static pages."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL to fetch"
                },
                "extract_mode": {
                    "type": "string",
                    "description": "How to extract: 'text' (default), 'html', or 'summary'"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let url = required_str(&args, "url")?;
        let mode = args["extract_mode"].as_str().unwrap_or("text");

        let html = get_html(url).await?;

        let content = match mode {
            "html" => html.chars().take(MAX_RAW_HTML).collect(),
            "summary" => summarize_page(url, &html),
            "text" => extract_text_from_html(&html),
            other => {
                return Err(anyhow::anyhow!(
                    "Unknown extract_mode '{}', expected text, html or summary",
                    other
                ))
            }
        };

        Ok(Value::String(content))
    }
}

fn summarize_page(url: &str, html: &str) -> String {
    let title = extract_title(html).unwrap_or_else(|| "No title".to_string());
    let description = extract_meta_description(html).unwrap_or_default();
    let preview: String = extract_text_from_html(html)
        .chars()
        .take(SUMMARY_PREVIEW)
        .collect();

    serde_json::to_string_pretty(&json!({
        "url": url,
        "title": title,
        "description": description,
        "preview": preview,
    }))
    .unwrap_or_default()
}

fn extract_title(html: &str) -> Option<String> {
    static TITLE: OnceLock<Regex> = OnceLock::new();
    let re = TITLE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));
    re.captures(html)
        .map(|c| html_decode(c[1].trim()))
        .filter(|t| !t.is_empty())
}

fn extract_meta_description(html: &str) -> Option<String> {
    static META: OnceLock<Regex> = OnceLock::new();
    let re = META.get_or_init(|| {
        Regex::new(r#"(?is)<meta\s+[^>]*name=["']description["'][^>]*content=["']([^"']*)["']"#)
            .expect("valid regex")
    });
    re.captures(html).map(|c| html_decode(c[1].trim()))
}

/// Strip an element (and its contents) from the document.
fn strip_element(mut text: String, tag: &str) -> String {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let mut from = 0;

    while let Some(pos) = text[from..].find(&open) {
        let start = from + pos;
        // `<head` must not match `<header`.
        let next = text[start + open.len()..].chars().next();
        if !matches!(next, Some(c) if c == '>' || c.is_whitespace()) {
            from = start + open.len();
            continue;
        }
        match text[start..].find(&close) {
            Some(end) => text.replace_range(start..start + end + close.len(), ""),
            None => break,
        }
    }
    text
}

/// Extract readable text from HTML.
fn extract_text_from_html(html: &str) -> String {
    let text = ["head", "script", "style", "nav", "footer", "header", "aside"]
        .iter()
        .fold(html.to_string(), |acc, tag| strip_element(acc, tag));

    let mut result = String::new();
    let mut in_tag = false;

    for c in text.chars() {
        if c == '<' {
            in_tag = true;
        } else if c == '>' {
            in_tag = false;
            result.push(' ');
        } else if !in_tag {
            result.push(c);
        }
    }

    html_decode(&result)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// List the links on a page.
pub struct ExtractLinks;

#[async_trait]
impl Tool for ExtractLinks {
    fn name(&self) -> &str {
        "extract_links"
    }

    fn description(&self) -> &str {
        "Extract all links from a web page. Useful for finding specific pages, navigation, or discovering content on a site."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL to extract links from"
                },
                "filter_pattern": {
                    "type": "string",
                    "description": "Optional keyword to filter links"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let url = required_str(&args, "url")?;
        let filter = args["filter_pattern"].as_str().unwrap_or("");

        let base = url::Url::parse(url)?;
        let html = get_html(url).await?;
        let links = extract_links_from_html(&base, &html, filter);

        Ok(json!({
            "url": url,
            "total": links.len(),
            "links": links,
        }))
    }
}

/// Absolute `{text, url}` pairs for each anchor, deduplicated by URL.
fn extract_links_from_html(base: &url::Url, html: &str, filter: &str) -> Vec<Value> {
    static ANCHOR: OnceLock<Regex> = OnceLock::new();
    let re = ANCHOR.get_or_init(|| {
        Regex::new(r#"(?is)<a\s+[^>]*href=["']([^"'#]+)[^"']*["'][^>]*>(.*?)</a>"#)
            .expect("valid regex")
    });

    let filter = filter.to_lowercase();
    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();

    for caps in re.captures_iter(html) {
        let Ok(resolved) = base.join(caps[1].trim()) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }

        let href = resolved.to_string();
        let text = extract_text_from_html(&caps[2]);

        if !filter.is_empty()
            && !href.to_lowercase().contains(&filter)
            && !text.to_lowercase().contains(&filter)
        {
            continue;
        }

        if seen.insert(href.clone()) {
            links.push(json!({ "text": text, "url": href }));
        }
        if links.len() >= MAX_LINKS {
            break;
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    const DDG_PAGE: &str = r#"
        <div class="result__body">
          <a class="result__a" href="x">Rust &amp; Cargo</a>
          <a class="result__snippet" href="x">The Rust build tool</a>
          <a class="result__url" href="x"> doc.rust-lang.org/cargo </a>
        </div>
        <div class="result__body">
          <a class="result__a" href="y">Second</a>
          <a class="result__snippet" href="y">Another</a>
          <a class="result__url" href="y">example.com</a>
        </div>
    "#;

    #[test]
    fn ddg_results_are_structured() {
        let results = extract_ddg_results(DDG_PAGE, 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["title"], "Rust & Cargo");
        assert_eq!(results[0]["url"], "doc.rust-lang.org/cargo");
        assert_eq!(results[0]["snippet"], "The Rust build tool");
    }

    #[test]
    fn ddg_results_respect_limit() {
        assert_eq!(extract_ddg_results(DDG_PAGE, 1).len(), 1);
    }

    #[test]
    fn text_extraction_drops_scripts_and_chrome() {
        let html = "<html><head><style>p{}</style></head><body><nav>Menu</nav>\
                    <p>Hello&nbsp;<b>world</b></p><script>alert(1)</script></body></html>";
        assert_eq!(extract_text_from_html(html), "Hello world");
    }

    #[test]
    fn summary_reads_title_and_meta() {
        let html = r#"<html><head><title> Docs </title>
            <meta name="description" content="All about it"></head>
            <body><p>Body text</p></body></html>"#;
        let summary: Value = serde_json::from_str(&summarize_page("https://x.test", html)).unwrap();
        assert_eq!(summary["title"], "Docs");
        assert_eq!(summary["description"], "All about it");
        assert_eq!(summary["preview"], "Body text");
    }

    #[test]
    fn links_are_resolved_filtered_and_deduplicated() {
        let base = url::Url::parse("https://example.com/docs/").unwrap();
        let html = r#"
            <a href="intro.html">Intro</a>
            <a href="/blog/post">Blog <em>post</em></a>
            <a href="intro.html#top">Intro again</a>
            <a href="mailto:me@example.com">Mail</a>
        "#;

        let all = extract_links_from_html(&base, html, "");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0]["url"], "https://example.com/docs/intro.html");
        assert_eq!(all[1]["text"], "Blog post");

        let filtered = extract_links_from_html(&base, html, "BLOG");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0]["url"], "https://example.com/blog/post");
    }

    #[tokio::test]
    async fn missing_query_is_an_error() {
        let err = WebSearch.execute(json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing 'query' argument");
    }
}
