//! HTTP-backed collaborators

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{
    Completion, Encyclopedia, NewsProvider, ProviderError, Region, VideoFinder, WeatherProvider,
    WeatherReport,
};

const USER_AGENT: &str = "Mozilla/5.0";

/// Shared client for every provider in this module
pub fn client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_default()
}

/// OpenWeatherMap current conditions, located through ip-api when no
/// location is configured
#[derive(Clone)]
pub struct OpenWeather {
    client: Client,
    api_key: Option<String>,
}

impl OpenWeather {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    async fn locate(&self) -> Result<String, ProviderError> {
        let info: Value = self
            .client
            .get("http://ip-api.com/json/")
            .send()
            .await?
            .json()
            .await?;
        Ok(info
            .get("city")
            .and_then(Value::as_str)
            .unwrap_or("your location")
            .to_string())
    }
}

#[async_trait]
impl WeatherProvider for OpenWeather {
    async fn fetch(&self, location: Option<&str>) -> Result<WeatherReport, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured("WEATHER_API_KEY"))?;

        let city = match location {
            Some(city) => city.to_string(),
            None => self.locate().await?,
        };
        debug!(%city, "fetching weather");

        let data: Value = self
            .client
            .get("http://api.openweathermap.org/data/2.5/weather")
            .query(&[("q", city.as_str()), ("appid", api_key), ("units", "metric")])
            .send()
            .await?
            .json()
            .await?;

        // `cod` comes back as a number on success and a string on errors
        let ok = match data.get("cod") {
            Some(Value::Number(n)) => n.as_i64() == Some(200),
            Some(Value::String(s)) => s == "200",
            _ => false,
        };
        if !ok {
            let message = data
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(ProviderError::Rejected(message.to_string()));
        }

        let temp_c = data
            .pointer("/main/temp")
            .and_then(Value::as_f64)
            .ok_or_else(|| ProviderError::Malformed("missing main.temp".into()))?;
        let description = data
            .pointer("/weather/0/description")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::Malformed("missing weather description".into()))?;

        Ok(WeatherReport {
            city,
            temp_c,
            description: description.to_string(),
        })
    }
}

/// Headlines: Google News RSS for India (no key needed), NewsAPI top
/// headlines for the global feed
#[derive(Clone)]
pub struct NewsApi {
    client: Client,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct HeadlinesResponse {
    status: String,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Deserialize)]
struct Article {
    title: Option<String>,
}

const INDIA_FEED: &str = "https://news.google.com/rss?hl=en-IN&gl=IN&ceid=IN:en";

impl NewsApi {
    const LIMIT: usize = 5;

    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    async fn india(&self) -> Result<Vec<String>, ProviderError> {
        let response = self.client.get(INDIA_FEED).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Rejected(response.status().to_string()));
        }
        let titles = rss_titles(&response.text().await?);
        if titles.is_empty() {
            return Err(ProviderError::Malformed("feed has no items".into()));
        }
        Ok(numbered(titles))
    }

    async fn global(&self) -> Result<Vec<String>, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured("NEWS_API_KEY"))?;

        let resp: HeadlinesResponse = self
            .client
            .get("https://newsapi.org/v2/top-headlines")
            .query(&[("country", "us"), ("apiKey", api_key)])
            .send()
            .await?
            .json()
            .await?;

        if resp.status != "ok" {
            return Err(ProviderError::Rejected(format!("status {}", resp.status)));
        }

        Ok(numbered(
            resp.articles
                .into_iter()
                .map(|a| a.title.unwrap_or_else(|| "No title".to_string())),
        ))
    }
}

fn numbered(titles: impl IntoIterator<Item = String>) -> Vec<String> {
    titles
        .into_iter()
        .take(NewsApi::LIMIT)
        .enumerate()
        .map(|(i, title)| format!("{}. {}", i + 1, title))
        .collect()
}

/// Item titles of an RSS document, in feed order
fn rss_titles(feed: &str) -> Vec<String> {
    let Ok(re) = Regex::new(r"(?s)<item>.*?<title>(?:<!\[CDATA\[)?(.*?)(?:\]\]>)?</title>") else {
        return Vec::new();
    };
    re.captures_iter(feed)
        .map(|c| unescape_xml(c[1].trim()))
        .filter(|t| !t.is_empty())
        .collect()
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[async_trait]
impl NewsProvider for NewsApi {
    async fn headlines(&self, region: Region) -> Result<Vec<String>, ProviderError> {
        debug!(?region, "fetching headlines");
        match region {
            Region::India => self.india().await,
            Region::Global => self.global().await,
        }
    }
}

/// OpenRouter chat completion
#[derive(Clone)]
pub struct OpenRouter {
    client: Client,
    api_key: Option<String>,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

impl OpenRouter {
    const URL: &'static str = "https://openrouter.ai/api/v1/chat/completions";
    const SYSTEM_PROMPT: &'static str = "You are SKAI, a professional AI assistant. Always respond in a formal, polite, and concise manner, avoiding casual or conversational phrases.";

    pub fn new(client: Client, api_key: Option<String>, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl Completion for OpenRouter {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured("OPENROUTER_API_KEY"))?;

        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: Self::SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(Self::URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let reply: ChatResponse = response.json().await?;
        reply
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| ProviderError::Malformed("no choices in completion".into()))
    }
}

/// Wikipedia page summaries
#[derive(Clone)]
pub struct Wikipedia {
    client: Client,
}

#[derive(Deserialize)]
struct PageSummary {
    extract: Option<String>,
}

impl Wikipedia {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Encyclopedia for Wikipedia {
    async fn summary(&self, topic: &str) -> Result<String, ProviderError> {
        let mut url = Url::parse("https://en.wikipedia.org/api/rest_v1/page/summary/")
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Malformed("wikipedia base url".into()))?
            .pop_if_empty()
            .push(topic);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Rejected(response.status().to_string()));
        }
        let page: PageSummary = response.json().await?;
        page.extract
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ProviderError::Rejected(format!("no article for {topic}")))
    }
}

/// First YouTube search result, scraped from the results page
#[derive(Clone)]
pub struct YouTube {
    client: Client,
}

impl YouTube {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Extract the first video id from a results page
fn first_video_id(page: &str) -> Option<String> {
    let re = Regex::new(r"watch\?v=(\S{11})").ok()?;
    re.captures(page).map(|c| c[1].to_string())
}

#[async_trait]
impl VideoFinder for YouTube {
    async fn first_video(&self, query: &str) -> Result<Option<String>, ProviderError> {
        let page = self
            .client
            .get("https://www.youtube.com/results")
            .query(&[("search_query", query)])
            .send()
            .await?
            .text()
            .await?;
        Ok(first_video_id(&page).map(|id| format!("https://www.youtube.com/watch?v={id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_video_id() {
        let page = r#"{"url":"/watch?v=dQw4w9WgXcQ&pp=x"} /watch?v=aaaaaaaaaaa"#;
        assert_eq!(first_video_id(page).as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(first_video_id("no results here"), None);
    }

    #[tokio::test]
    async fn test_unconfigured_providers_fail_fast() {
        let http = client(Duration::from_secs(1));

        let weather = OpenWeather::new(http.clone(), None);
        assert!(matches!(
            weather.fetch(Some("Pune")).await,
            Err(ProviderError::NotConfigured("WEATHER_API_KEY"))
        ));

        let news = NewsApi::new(http.clone(), None);
        assert!(matches!(
            news.headlines(Region::Global).await,
            Err(ProviderError::NotConfigured(_))
        ));

        let completion = OpenRouter::new(http, None, "model".into());
        assert!(matches!(
            completion.complete("hi").await,
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_headlines_response_decoding() {
        let json = r#"{"status":"ok","articles":[{"title":"One"},{"title":null}]}"#;
        let resp: HeadlinesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.status, "ok");
        assert_eq!(resp.articles.len(), 2);
        assert!(resp.articles[1].title.is_none());
    }

    #[test]
    fn test_rss_titles() {
        let feed = r#"<rss><channel><title>Top stories</title>
            <item><title>Monsoon arrives early - The Hindu</title><link>a</link></item>
            <item><title><![CDATA[Markets & more]]></title></item>
            <item><title>Tom &amp; Jerry &quot;return&quot;</title></item>
        </channel></rss>"#;
        assert_eq!(
            rss_titles(feed),
            vec![
                "Monsoon arrives early - The Hindu",
                "Markets & more",
                "Tom & Jerry \"return\"",
            ]
        );
        assert!(rss_titles("<rss></rss>").is_empty());
    }

    #[test]
    fn test_numbered_caps_at_five() {
        let titles = (1..=7).map(|i| format!("story {i}"));
        let headlines = numbered(titles);
        assert_eq!(headlines.len(), 5);
        assert_eq!(headlines[0], "1. story 1");
        assert_eq!(headlines[4], "5. story 5");
    }
}
