//! Encouragement shown after every answer.
//!
//! A provider turns a [`FeedbackRequest`] into a [`Feedback`] and is not
//! allowed to fail: the remote provider swallows its own errors and answers
//! from the local message pool instead.

use std::sync::Mutex;
use std::time::Duration;

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Probability that the local provider attaches a tip
const TIP_PROBABILITY: f64 = 0.6;

const CORRECT_MESSAGES: &[(&str, &str)] = &[
    ("Well done! You got it!", "🌟"),
    ("Incredible! You're a times-table genius!", "🚀"),
    ("Great work! Keep it up!", "👏"),
    ("Exactly! You're lightning fast!", "⚡"),
    ("Fantastic! Maths has no secrets for you!", "🎈"),
    ("Super! A perfect answer!", "🏆"),
];

const INCORRECT_MESSAGES: &[(&str, &str)] = &[
    ("Don't worry, mistakes are how we learn!", "💪"),
    ("Almost! Think about it a little more.", "🧠"),
    ("No problem, the next one will go better!", "🌈"),
    ("Chin up! Even great mathematicians make mistakes.", "⚓"),
    ("Oops! Take a good look at the grid for help.", "🔍"),
];

const TIPS: &[&str] = &[
    "Multiplying by 5 is like halving the number and adding a zero!",
    "Any number multiplied by 1 stays the same!",
    "In the 9 times table, the digits of the answer always add up to 9!",
    "Numbers multiplied by 0 always become... ZERO!",
    "The 2 times table is like counting by skipping a number: 2, 4, 6, 8...",
    "Multiplying by 10 is easy: just put a 0 on the end!",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub message: String,
    pub emoji: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
}

/// What the player answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Given(String),
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRequest {
    pub a: u32,
    pub b: u32,
    pub is_correct: bool,
    pub answer: Answer,
}

impl FeedbackRequest {
    pub fn product(&self) -> u32 {
        self.a * self.b
    }
}

pub trait FeedbackProvider: Send + Sync {
    fn feedback(&self, request: &FeedbackRequest) -> Feedback;
}

/// Picks from a fixed message pool; optionally pauses to feel "thoughtful"
pub struct LocalFeedback {
    rng: Mutex<StdRng>,
    delay: Duration,
}

impl LocalFeedback {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            delay: Duration::ZERO,
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn compose(&self, request: &FeedbackRequest, rng: &mut impl Rng) -> Feedback {
        let pool = if request.is_correct {
            CORRECT_MESSAGES
        } else {
            INCORRECT_MESSAGES
        };
        let (message, emoji) = pool.choose(rng).copied().unwrap_or(pool[0]);
        let tip = if rng.gen_bool(TIP_PROBABILITY) {
            TIPS.choose(rng).map(|t| t.to_string())
        } else {
            None
        };

        let message = match &request.answer {
            Answer::Given(input) if !request.is_correct => format!(
                "{input} is not right. Remember that {} × {} is {}. {message}",
                request.a,
                request.b,
                request.product()
            ),
            _ => message.to_string(),
        };

        Feedback {
            message,
            emoji: emoji.to_string(),
            tip,
        }
    }
}

impl Default for LocalFeedback {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackProvider for LocalFeedback {
    fn feedback(&self, request: &FeedbackRequest) -> Feedback {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        match self.rng.lock() {
            Ok(mut rng) => self.compose(request, &mut *rng),
            Err(_) => self.compose(request, &mut rand::thread_rng()),
        }
    }
}

#[derive(Error, Debug)]
pub enum FeedbackError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response had no text candidate")]
    EmptyResponse,

    #[error("response field `{0}` is empty")]
    MissingField(&'static str),
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

/// Asks Gemini for a personalised message, falling back to [`LocalFeedback`]
pub struct GeminiFeedback {
    config: GeminiConfig,
    client: Client,
    fallback: LocalFeedback,
}

impl GeminiFeedback {
    pub fn new(config: GeminiConfig) -> Result<Self, FeedbackError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            config,
            client,
            fallback: LocalFeedback::new(),
        })
    }

    fn build_prompt(request: &FeedbackRequest) -> String {
        let outcome = match (&request.answer, request.is_correct) {
            (Answer::TimedOut, _) => "ran out of time before answering".to_string(),
            (Answer::Given(input), true) => format!("answered {input}, which is correct"),
            (Answer::Given(input), false) => format!(
                "answered {input}, which is wrong (the right answer is {})",
                request.product()
            ),
        };
        format!(
            "You are a cheerful maths tutor for a child learning the times tables. \
             The child was asked {} × {} and {outcome}. \
             Reply with a short encouraging message of at most two sentences, \
             one emoji, and optionally a short tip that helps remember this multiplication.",
            request.a, request.b
        )
    }

    fn request_body(request: &FeedbackRequest) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Self::build_prompt(request),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: json!({
                    "type": "OBJECT",
                    "properties": {
                        "message": { "type": "STRING" },
                        "emoji": { "type": "STRING" },
                        "tip": { "type": "STRING" }
                    },
                    "required": ["message", "emoji"]
                }),
            },
        }
    }

    fn parse_response(body: &str) -> Result<Feedback, FeedbackError> {
        let response: GenerateResponse = serde_json::from_str(body)?;
        let text = response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim())
            .filter(|t| !t.is_empty())
            .ok_or(FeedbackError::EmptyResponse)?;

        let mut feedback: Feedback = serde_json::from_str(text)?;
        if feedback.message.trim().is_empty() {
            return Err(FeedbackError::MissingField("message"));
        }
        if feedback.emoji.trim().is_empty() {
            return Err(FeedbackError::MissingField("emoji"));
        }
        feedback.tip = feedback.tip.filter(|t| !t.trim().is_empty());
        Ok(feedback)
    }

    pub fn request(&self, request: &FeedbackRequest) -> Result<Feedback, FeedbackError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.config.base_url, self.config.model, self.config.api_key
        );
        debug!(
            "requesting feedback from {}",
            url.replace(&self.config.api_key, "***")
        );

        let response = self
            .client
            .post(&url)
            .json(&Self::request_body(request))
            .send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(FeedbackError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Self::parse_response(&body)
    }
}

impl FeedbackProvider for GeminiFeedback {
    fn feedback(&self, request: &FeedbackRequest) -> Feedback {
        match self.request(request) {
            Ok(feedback) => feedback,
            Err(e) => {
                warn!("remote feedback failed, using local message: {e}");
                self.fallback.feedback(request)
            }
        }
    }
}
