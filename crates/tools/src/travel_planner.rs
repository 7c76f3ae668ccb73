//! Travel Planner
//!
//! Turns a task description such as "规划去成都的3天旅行" into a streamed
//! day-by-day itinerary. Destination and duration are extracted by the
//! backend first (JSON mode) and by regular expressions when the backend
//! cannot tell.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use futures_util::future::join;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;

use goal_cascade_core::{CoreError, CoreResult, TaskContext, Tool, ToolCredentials};
use goal_cascade_llm::{LlmProvider, LlmRequestOptions, Message};

use crate::backend::{backend_from_credentials, llm_error};
use crate::registry::TRAVEL_PLANNER;

const PARSE_TEMPERATURE: f32 = 0.1;
const ITINERARY_TEMPERATURE: f32 = 0.2;
const ITINERARY_TOP_P: f32 = 0.9;
const ITINERARY_MAX_TOKENS: u32 = 4096;
const STREAM_BUFFER: usize = 64;

const ITINERARY_SYSTEM_PROMPT: &str = r#"You are a professional travel planner with broad knowledge of destinations worldwide.
Create detailed, practical itineraries.

Requirements:
1. A concrete schedule of activities for every day
2. Sights, restaurants and lodging suggestions
3. Transport options, best visiting times and a budget estimate
4. A comfortable pace, not overly packed
5. Clear "Day 1:", "Day 2:" headings
6. Respect local culture and practical conditions

Answer in the language of the request."#;

/// Destination and duration extracted from a task description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TravelRequest {
    pub destination: Option<String>,
    pub days: Option<u32>,
}

impl TravelRequest {
    /// Both fields, when present.
    pub fn resolved(&self) -> Option<(&str, u32)> {
        match (&self.destination, self.days) {
            (Some(destination), Some(days)) => Some((destination.as_str(), days)),
            _ => None,
        }
    }

    /// Fill missing fields from `other`.
    pub fn or(self, other: TravelRequest) -> TravelRequest {
        TravelRequest {
            destination: self.destination.or(other.destination),
            days: self.days.or(other.days),
        }
    }
}

/// Raw backend answer. `days` may come back as a number or a string.
#[derive(Debug, Deserialize)]
struct ParsedAnswer {
    #[serde(default)]
    destination: Option<Value>,
    #[serde(default)]
    days: Option<Value>,
}

impl From<ParsedAnswer> for TravelRequest {
    fn from(answer: ParsedAnswer) -> Self {
        let destination = answer
            .destination
            .as_ref()
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|d| !d.is_empty() && !d.eq_ignore_ascii_case("null"))
            .map(str::to_string);

        let days = match answer.days {
            Some(Value::Number(n)) => n.as_u64().and_then(|d| u32::try_from(d).ok()),
            Some(Value::String(s)) => parse_days(&s),
            _ => None,
        }
        .filter(|d| *d > 0);

        TravelRequest { destination, days }
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!(pattern, error = %e, "invalid travel request pattern");
            None
        }
    }
}

/// Day-count patterns, tried in order.
fn day_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(\d+)\s*天",
            r"(?i)(\d+)\s*-?\s*days?\b",
            r"(十[一二三四五六七八九]?|[一二两三四五六七八九])\s*[天日]",
            r"(\d+)\s*日",
        ]
        .iter()
        .filter_map(|p| compile(p))
        .collect()
    })
}

/// Destination patterns, tried in order.
fn destination_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?:去|到|前往|安排一下|游览)(\p{Han}{2,5}?)(?:国庆|旅行|旅游|游玩|行程|玩|游|的|\d|[一二两三四五六七八九十])",
            r"\b(?:to|in|visit|visiting|explore)\s+([A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z]+)*)",
        ]
        .iter()
        .filter_map(|p| compile(p))
        .collect()
    })
}

fn chinese_numeral(s: &str) -> Option<u32> {
    let digit = |c: char| -> Option<u32> {
        Some(match c {
            '一' => 1,
            '二' | '两' => 2,
            '三' => 3,
            '四' => 4,
            '五' => 5,
            '六' => 6,
            '七' => 7,
            '八' => 8,
            '九' => 9,
            _ => return None,
        })
    };

    let mut chars = s.chars();
    match (chars.next()?, chars.next(), chars.next()) {
        ('十', None, None) => Some(10),
        ('十', Some(unit), None) => digit(unit).map(|u| 10 + u),
        (c, None, None) => digit(c),
        _ => None,
    }
}

fn parse_days(s: &str) -> Option<u32> {
    let s = s.trim();
    s.parse::<u32>().ok().or_else(|| chinese_numeral(s))
}

/// Regex-based extraction used when the backend cannot parse the request.
pub fn parse_travel_request(description: &str) -> TravelRequest {
    let days = day_patterns()
        .iter()
        .filter_map(|re| re.captures(description))
        .filter_map(|caps| caps.get(1).and_then(|m| parse_days(m.as_str())))
        .find(|d| *d > 0);

    let destination = destination_patterns()
        .iter()
        .filter_map(|re| re.captures(description))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
        .find(|d| !d.is_empty());

    TravelRequest { destination, days }
}

/// Prompt asking the backend for `{"destination", "days"}`.
pub fn parse_prompt(description: &str) -> String {
    format!(
        r#"Extract the travel planning details from the task description below.

Task description: "{}"

Return a JSON object:
{{
    "destination": "destination city name",
    "days": number of days (integer)
}}

Use null for anything that cannot be determined."#,
        description
    )
}

/// User prompt for the itinerary, including any dependency results.
pub fn itinerary_prompt(destination: &str, days: u32, context: &TaskContext) -> String {
    let mut prompt = format!(
        r#"Create a detailed {days}-day travel itinerary for {destination}.

Include:
- Concrete sights and activities for each day
- Restaurant and food recommendations
- Lodging suggestions
- Transport tips
- Budget estimate
- Local cultural insights

Give every day a clear "Day N:" heading."#
    );

    let references: Vec<(&str, &str)> = context.dependency_results().collect();
    if !references.is_empty() {
        prompt.push_str("\n\nReference material from earlier steps:\n");
        for (task_id, result) in references {
            prompt.push_str(&format!("\n[{}]\n{}\n", task_id, result));
        }
    }

    prompt
}

/// Itinerary planner backed by a streaming generative backend.
pub struct TravelPlanner {
    llm: Arc<dyn LlmProvider>,
}

impl TravelPlanner {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    pub fn from_credentials(credentials: &ToolCredentials) -> CoreResult<Self> {
        Ok(Self::new(backend_from_credentials(credentials)?))
    }

    /// Ask the backend to extract destination and days. Failures yield an
    /// empty request so the regex fallback can take over.
    async fn parse_with_llm(&self, description: &str) -> TravelRequest {
        let response = match self
            .llm
            .send_message(
                vec![Message::user(parse_prompt(description))],
                None,
                LlmRequestOptions::json(PARSE_TEMPERATURE),
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "travel request parsing via backend failed");
                return TravelRequest::default();
            }
        };

        let text = response.content.unwrap_or_default();
        match serde_json::from_str::<ParsedAnswer>(text.trim()) {
            Ok(answer) => {
                let request = TravelRequest::from(answer);
                tracing::debug!(?request, "backend parsed travel request");
                request
            }
            Err(e) => {
                tracing::warn!(error = %e, "backend returned unparseable travel request");
                TravelRequest::default()
            }
        }
    }

    /// Stream the itinerary and return the accumulated text.
    async fn generate_itinerary(
        &self,
        destination: &str,
        days: u32,
        context: &TaskContext,
    ) -> CoreResult<String> {
        let (tx, mut rx) = mpsc::channel::<String>(STREAM_BUFFER);
        let options = LlmRequestOptions::text(ITINERARY_TEMPERATURE)
            .with_top_p(ITINERARY_TOP_P)
            .with_max_tokens(ITINERARY_MAX_TOKENS);

        let producer = self.llm.stream_message(
            vec![Message::user(itinerary_prompt(destination, days, context))],
            Some(ITINERARY_SYSTEM_PROMPT.to_string()),
            tx,
            options,
        );
        let consumer = async move {
            let mut text = String::new();
            while let Some(chunk) = rx.recv().await {
                text.push_str(&chunk);
            }
            text
        };

        let (response, streamed) = join(producer, consumer).await;
        let response = response.map_err(llm_error)?;

        if !streamed.trim().is_empty() {
            Ok(streamed)
        } else {
            response.text().map_err(llm_error)
        }
    }
}

#[async_trait]
impl Tool for TravelPlanner {
    fn name(&self) -> &str {
        TRAVEL_PLANNER
    }

    async fn execute(&self, description: &str, context: &TaskContext) -> CoreResult<String> {
        tracing::info!(description, "travel planner executing");

        let mut request = self.parse_with_llm(description).await;
        if request.resolved().is_none() {
            tracing::debug!("falling back to pattern-based travel request parsing");
            request = request.or(parse_travel_request(description));
        }

        let (destination, days) = request.resolved().ok_or_else(|| {
            CoreError::validation(format!(
                "could not determine destination and number of days from task '{}'",
                description
            ))
        })?;

        let itinerary = self.generate_itinerary(destination, days, context).await?;
        tracing::info!(destination, days, chars = itinerary.len(), "itinerary generated");
        Ok(itinerary)
    }
}
