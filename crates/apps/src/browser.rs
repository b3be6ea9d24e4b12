//! A text-based browser app.
//!
//! Pages are fetched over plain HTTP, reduced to text, and clickable links
//! are annotated with `<N>` markers the model can reference in a click
//! action. Fetching sits behind the [`PageFetcher`] seam; the production
//! implementation is a reqwest client with an explicit request timeout.

use ami_core::{ActionEnvelope, ActionSchema, App, AppError, AppOutput};
use async_trait::async_trait;
use parking_lot::Mutex;
use regex::Regex;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.0.0 Safari/537.36";

/// Seam for retrieving a page body.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, AppError>;
}

/// Fetches pages with a shared reqwest client.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Resource(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Execution(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AppError::Execution(format!(
                "request to {} failed with status {}",
                url,
                response.status()
            )));
        }
        response
            .text()
            .await
            .map_err(|e| AppError::Execution(e.to_string()))
    }
}

/// One annotated clickable element.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Link {
    href: String,
    text: String,
}

#[derive(Debug, Default)]
struct PageState {
    url: Option<Url>,
    links: Vec<Link>,
}

/// Reduces HTML to annotated text.
struct Renderer {
    noise: Regex,
    anchor: Regex,
    line_break: Regex,
    tag: Regex,
}

impl Renderer {
    fn new() -> Result<Self, AppError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| AppError::Resource(e.to_string()))
        };
        Ok(Self {
            noise: compile(r"(?is)<script\b.*?</script>|<style\b.*?</style>|<!--.*?-->")?,
            anchor: compile(r#"(?is)<a\b[^>]*href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a>"#)?,
            line_break: compile(r"(?i)<br\s*/?>|</(p|div|li|tr|h[1-6])>")?,
            // Letter-initial only, so the inserted <N> markers survive.
            tag: compile(r"</?[a-zA-Z][^>]*>")?,
        })
    }

    /// Annotate clickable elements with `<N>` markers and strip the rest of
    /// the markup. Returns the rendered text plus the link table.
    fn render(&self, html: &str) -> (String, Vec<Link>) {
        let cleaned = self.noise.replace_all(html, "");

        let mut links = Vec::new();
        let annotated = self.anchor.replace_all(&cleaned, |caps: &regex::Captures| {
            let href = caps[1].to_string();
            let inner = self.tag.replace_all(&caps[2], "");
            let text = decode_entities(inner.trim());
            let text = if text.is_empty() {
                "[no text]".to_string()
            } else {
                text
            };
            links.push(Link {
                href,
                text: text.clone(),
            });
            format!("{} <{}>", text, links.len())
        });

        let broken = self.line_break.replace_all(&annotated, "\n");
        let stripped = self.tag.replace_all(&broken, "");
        let text = decode_entities(&stripped);

        let mut lines = Vec::new();
        let mut blank = false;
        for line in text.lines() {
            let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
            if line.is_empty() {
                if !blank && !lines.is_empty() {
                    lines.push(String::new());
                }
                blank = true;
            } else {
                lines.push(line);
                blank = false;
            }
        }
        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }

        (lines.join("\n"), links)
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BrowserAction {
    Navigate { url: String },
    Click { element: usize },
}

pub struct BrowserApp {
    fetcher: Arc<dyn PageFetcher>,
    renderer: Renderer,
    state: Mutex<PageState>,
}

impl BrowserApp {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Result<Self, AppError> {
        Ok(Self {
            fetcher,
            renderer: Renderer::new()?,
            state: Mutex::new(PageState::default()),
        })
    }

    async fn open(&self, url: Url) -> Result<AppOutput, AppError> {
        info!("Navigating to URL: {}", url);
        let html = self.fetcher.fetch(url.as_str()).await?;
        let (text, links) = self.renderer.render(&html);
        debug!("Rendered {} clickable elements", links.len());

        let mut state = self.state.lock();
        state.url = Some(url);
        state.links = links;

        Ok(AppOutput::text(text))
    }
}

#[async_trait]
impl App for BrowserApp {
    fn name(&self) -> &str {
        "browser"
    }

    fn description(&self) -> &str {
        "A text-based browser that allows you to navigate websites and click elements. \
         Elements that can be clicked are annotated with numbers in <N> format."
    }

    fn usage_prompt(&self) -> String {
        let current_url = self
            .state
            .lock()
            .url
            .as_ref()
            .map(|url| url.to_string())
            .unwrap_or_else(|| "No page loaded".to_string());
        format!(
            "This is the Browser app. You can navigate to URLs and click on elements.\n\
             \n\
             Current URL: {}\n\
             \n\
             Available actions:\n\
             1. Navigate to a URL:\n\
             {{\n\
                 \"type\": \"navigate\",\n\
                 \"url\": \"https://example.com\"\n\
             }}\n\
             \n\
             2. Click an element (using the number shown in <N>):\n\
             {{\n\
                 \"type\": \"click\",\n\
                 \"element\": 1\n\
             }}\n\
             \n\
             The page content will show clickable elements marked with <N> where N is the \
             element number. For example, \"Click here<1>\" means you can click this element \
             using element number 1.",
            current_url
        )
    }

    fn action_schemas(&self) -> Vec<ActionSchema> {
        vec![
            ActionSchema::new(
                "navigate",
                "Navigate to a URL",
                json!({
                    "type": "object",
                    "properties": {
                        "url": {"type": "string", "description": "URL to navigate to"},
                    },
                    "required": ["url"],
                }),
            ),
            ActionSchema::new(
                "click",
                "Click an element on the current page",
                json!({
                    "type": "object",
                    "properties": {
                        "element": {
                            "type": "integer",
                            "minimum": 1,
                            "description": "Element number to click (as shown in <N>)",
                        },
                    },
                    "required": ["element"],
                }),
            ),
        ]
    }

    async fn handle_action(&self, action: ActionEnvelope) -> Result<AppOutput, AppError> {
        let action: BrowserAction = action
            .decode()
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;

        match action {
            BrowserAction::Navigate { url } => {
                let url = Url::parse(&url)
                    .map_err(|e| AppError::InvalidInput(format!("invalid URL '{}': {}", url, e)))?;
                self.open(url).await
            }
            BrowserAction::Click { element } => {
                let target = {
                    let state = self.state.lock();
                    let base = state.url.clone().ok_or_else(|| {
                        AppError::InvalidInput("no page loaded; navigate somewhere first".into())
                    })?;
                    let link = element
                        .checked_sub(1)
                        .and_then(|i| state.links.get(i))
                        .ok_or_else(|| {
                            AppError::InvalidInput(format!(
                                "no element <{}> on the current page",
                                element
                            ))
                        })?;
                    base.join(&link.href).map_err(|e| {
                        AppError::InvalidInput(format!("unresolvable link '{}': {}", link.href, e))
                    })?
                };
                self.open(target).await
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockFetcher {
        pages: HashMap<String, String>,
        fetched: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        fn with_pages(pages: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                pages: pages
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
                fetched: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PageFetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<String, AppError> {
            self.fetched.lock().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| AppError::Execution(format!("no page for {}", url)))
        }
    }

    fn navigate(url: &str) -> ActionEnvelope {
        ActionEnvelope::new("navigate", json!({"url": url}))
    }

    fn click(element: usize) -> ActionEnvelope {
        ActionEnvelope::new("click", json!({"element": element}))
    }

    #[tokio::test]
    async fn test_navigate_annotates_links() {
        let fetcher = MockFetcher::with_pages(&[(
            "https://example.com/",
            "<html><body><h1>Welcome</h1>\
             <a href=\"/docs\">Read the docs</a> and <a href=\"/about\"><b>About us</b></a>\
             </body></html>",
        )]);
        let app = BrowserApp::new(fetcher).unwrap();

        let output = app.handle_action(navigate("https://example.com/")).await.unwrap();

        assert!(output.text.contains("Welcome"));
        assert!(output.text.contains("Read the docs <1>"));
        assert!(output.text.contains("About us <2>"));
    }

    #[tokio::test]
    async fn test_click_resolves_relative_href() {
        let fetcher = MockFetcher::with_pages(&[
            (
                "https://example.com/",
                "<a href=\"/docs\">Docs</a>",
            ),
            ("https://example.com/docs", "<p>The documentation.</p>"),
        ]);
        let app = BrowserApp::new(fetcher.clone()).unwrap();

        app.handle_action(navigate("https://example.com/")).await.unwrap();
        let output = app.handle_action(click(1)).await.unwrap();

        assert!(output.text.contains("The documentation."));
        assert_eq!(
            *fetcher.fetched.lock(),
            vec!["https://example.com/", "https://example.com/docs"]
        );
    }

    #[tokio::test]
    async fn test_click_without_page_is_invalid() {
        let fetcher = MockFetcher::with_pages(&[]);
        let app = BrowserApp::new(fetcher).unwrap();

        let err = app.handle_action(click(1)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_click_out_of_range_is_invalid() {
        let fetcher = MockFetcher::with_pages(&[(
            "https://example.com/",
            "<a href=\"/one\">One</a>",
        )]);
        let app = BrowserApp::new(fetcher).unwrap();

        app.handle_action(navigate("https://example.com/")).await.unwrap();
        for element in [0, 2] {
            let err = app.handle_action(click(element)).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)));
        }
    }

    #[tokio::test]
    async fn test_scripts_and_styles_stripped() {
        let fetcher = MockFetcher::with_pages(&[(
            "https://example.com/",
            "<script>alert('x')</script><style>body{}</style>\
             <p>Visible &amp; clean</p><!-- hidden -->",
        )]);
        let app = BrowserApp::new(fetcher).unwrap();

        let output = app.handle_action(navigate("https://example.com/")).await.unwrap();

        assert_eq!(output.text, "Visible & clean");
    }

    #[tokio::test]
    async fn test_anchor_without_text_gets_placeholder() {
        let fetcher = MockFetcher::with_pages(&[(
            "https://example.com/",
            "<a href=\"/img\"><img src=\"x.png\"></a>",
        )]);
        let app = BrowserApp::new(fetcher).unwrap();

        let output = app.handle_action(navigate("https://example.com/")).await.unwrap();
        assert!(output.text.contains("[no text] <1>"));
    }

    #[tokio::test]
    async fn test_usage_prompt_tracks_current_url() {
        let fetcher = MockFetcher::with_pages(&[("https://example.com/", "<p>hi</p>")]);
        let app = BrowserApp::new(fetcher).unwrap();

        assert!(app.usage_prompt().contains("No page loaded"));
        app.handle_action(navigate("https://example.com/")).await.unwrap();
        assert!(app.usage_prompt().contains("https://example.com/"));
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let fetcher = MockFetcher::with_pages(&[]);
        let app = BrowserApp::new(fetcher).unwrap();

        let err = app.handle_action(navigate("not a url")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
