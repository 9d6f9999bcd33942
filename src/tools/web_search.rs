//! Web search tool backed by the DuckDuckGo Instant Answer API.

use super::{Tool, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const SEARCH_URL: &str = "https://api.duckduckgo.com/";

/// How many related topics to include when there is no direct answer.
const MAX_RELATED_TOPICS: usize = 5;

pub struct WebSearchTool {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchInput {
    query: String,
}

#[derive(Debug, Deserialize, Default)]
struct SearchResponse {
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "Answer", default)]
    answer: String,
    #[serde(rename = "Definition", default)]
    definition: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize, Default)]
struct RelatedTopic {
    #[serde(rename = "Text", default)]
    text: String,
}

impl WebSearchTool {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    fn summarize(response: &SearchResponse, query: &str) -> String {
        let mut sections = Vec::new();
        if !response.answer.is_empty() {
            sections.push(response.answer.clone());
        }
        if !response.abstract_text.is_empty() {
            sections.push(response.abstract_text.clone());
        }
        if !response.definition.is_empty() {
            sections.push(response.definition.clone());
        }
        if sections.is_empty() {
            sections.extend(
                response
                    .related_topics
                    .iter()
                    .filter(|t| !t.text.is_empty())
                    .take(MAX_RELATED_TOPICS)
                    .map(|t| format!("- {}", t.text)),
            );
        }

        if sections.is_empty() {
            format!("No results found for: {query}")
        } else {
            sections.join("\n")
        }
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> String {
        "Search the internet with DuckDuckGo. Use for questions that need up-to-date information, current events, facts, or anything else requiring the web. Queries like 'what is', 'current' or 'latest' almost always need this tool.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["query"],
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            }
        })
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: SearchInput = match serde_json::from_value(input) {
            Ok(input) => input,
            Err(e) => return ToolOutput::error(format!("Invalid input: {e}")),
        };

        let result = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("q", input.query.as_str()),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await;

        let response = match result {
            Ok(r) => r,
            Err(e) => return ToolOutput::error(format!("Search request failed: {e}")),
        };

        if !response.status().is_success() {
            return ToolOutput::error(format!("Search returned HTTP {}", response.status()));
        }

        match response.json::<SearchResponse>().await {
            Ok(parsed) => ToolOutput::success(Self::summarize(&parsed, &input.query)),
            Err(e) => ToolOutput::error(format!("Failed to parse search response: {e}")),
        }
    }
}
