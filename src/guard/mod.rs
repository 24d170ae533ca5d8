// 输入安全检查模块

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::config::GuardSettings;
use crate::error::{Result, RouteFlowError};
use crate::llm::{ChatRequest, DynChatModel, StructuredSchema};
use crate::message::Message;

/// Safety categories, `S1` to `S17`. Only `Safe` lets a turn through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentCategory {
    ViolentCrimes,
    NonViolentCrimes,
    SexualCrimes,
    ChildExploitation,
    Defamation,
    SpecializedAdvice,
    Privacy,
    IntellectualProperty,
    IndiscriminateWeapons,
    Hate,
    SelfHarm,
    SexualContent,
    Elections,
    CodeInterpreterAbuse,
    PromptInjection,
    Jailbreak,
    Safe,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 17] = [
        ContentCategory::ViolentCrimes,
        ContentCategory::NonViolentCrimes,
        ContentCategory::SexualCrimes,
        ContentCategory::ChildExploitation,
        ContentCategory::Defamation,
        ContentCategory::SpecializedAdvice,
        ContentCategory::Privacy,
        ContentCategory::IntellectualProperty,
        ContentCategory::IndiscriminateWeapons,
        ContentCategory::Hate,
        ContentCategory::SelfHarm,
        ContentCategory::SexualContent,
        ContentCategory::Elections,
        ContentCategory::CodeInterpreterAbuse,
        ContentCategory::PromptInjection,
        ContentCategory::Jailbreak,
        ContentCategory::Safe,
    ];

    pub fn code(&self) -> String {
        let position = Self::ALL
            .iter()
            .position(|c| c == self)
            .unwrap_or_default();
        format!("S{}", position + 1)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContentCategory::ViolentCrimes => "Violent Crimes",
            ContentCategory::NonViolentCrimes => "Non-Violent Crimes",
            ContentCategory::SexualCrimes => "Sexual Crimes",
            ContentCategory::ChildExploitation => "Child Exploitation",
            ContentCategory::Defamation => "Defamation",
            ContentCategory::SpecializedAdvice => "Specialized Advice",
            ContentCategory::Privacy => "Privacy",
            ContentCategory::IntellectualProperty => "Intellectual Property",
            ContentCategory::IndiscriminateWeapons => "Indiscriminate Weapons",
            ContentCategory::Hate => "Hate",
            ContentCategory::SelfHarm => "Self-Harm",
            ContentCategory::SexualContent => "Sexual Content",
            ContentCategory::Elections => "Elections",
            ContentCategory::CodeInterpreterAbuse => "Code Interpreter Abuse",
            ContentCategory::PromptInjection => "Prompt Injection",
            ContentCategory::Jailbreak => "Jailbreak",
            ContentCategory::Safe => "Safe",
        }
    }

    /// Accepts the label (`"Hate"`) or the code (`"S10"`), nothing looser.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label() == value || c.code() == value)
    }

    pub fn is_safe(&self) -> bool {
        *self == ContentCategory::Safe
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SafetyAssessment {
    pub category: ContentCategory,
    pub rationale: String,
}

impl SafetyAssessment {
    pub fn is_safe(&self) -> bool {
        self.category.is_safe()
    }
}

/// Renders `ROLE: content` blocks separated by blank lines.
pub fn format_conversation(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role().to_uppercase(), m.content()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn default_safety_prompt() -> String {
    let mut prompt = String::from(
        "You are a content safety analyst. Classify the last message of the conversation \
         into exactly one of these categories:\n",
    );
    for category in ContentCategory::ALL {
        prompt.push_str(&format!("{}\n", category));
    }
    prompt
}

fn assessment_schema() -> StructuredSchema {
    let labels: Vec<&str> = ContentCategory::ALL.iter().map(|c| c.label()).collect();
    StructuredSchema::new(
        "CategoryClassification",
        json!({
            "type": "object",
            "properties": {
                "category": {
                    "type": "string",
                    "enum": labels,
                    "description": "The most appropriate safety category for the given content",
                },
                "rationale": {
                    "type": "string",
                    "description": "Brief explanation for why this category was selected",
                },
            },
            "required": ["category", "rationale"],
            "additionalProperties": false,
        }),
    )
}

pub fn parse_assessment(value: &Value) -> Result<SafetyAssessment> {
    let raw = value["category"].as_str().ok_or_else(|| {
        RouteFlowError::ClassifierContract("safety output has no string `category`".to_string())
    })?;
    let category = ContentCategory::parse(raw).ok_or_else(|| {
        RouteFlowError::ClassifierContract(format!("unknown safety category `{raw}`"))
    })?;
    Ok(SafetyAssessment {
        category,
        rationale: value["rationale"].as_str().unwrap_or_default().to_string(),
    })
}

pub const REFUSAL_MESSAGE: &str =
    "I'm sorry, I can't help with that request because it was flagged by our content safety policy.";

pub struct SafetyGuard {
    model: DynChatModel,
    system_prompt: String,
    ignore_old_messages: bool,
}

impl SafetyGuard {
    pub fn new(model: DynChatModel) -> Self {
        Self {
            model,
            system_prompt: default_safety_prompt(),
            ignore_old_messages: false,
        }
    }

    pub fn from_settings(model: DynChatModel, settings: &GuardSettings) -> Self {
        let mut guard = Self::new(model).ignore_old_messages(settings.ignore_old_messages);
        if let Some(prompt) = &settings.system_prompt {
            guard.system_prompt = prompt.clone();
        }
        guard
    }

    /// Only the last message is shown to the classifier when set.
    pub fn ignore_old_messages(mut self, ignore: bool) -> Self {
        self.ignore_old_messages = ignore;
        self
    }

    #[instrument(skip_all, fields(messages = messages.len()))]
    pub async fn assess(&self, messages: &[Message]) -> Result<SafetyAssessment> {
        let window = if self.ignore_old_messages {
            &messages[messages.len().saturating_sub(1)..]
        } else {
            messages
        };
        let user_prompt = format!(
            "Provide your safety assessment in the specified JSON format for ONLY THE LAST \
             message in the following conversation:\n\n# CONVERSATION\n\n\n{}\n",
            format_conversation(window)
        );
        let request = ChatRequest::new(vec![
            Message::system(self.system_prompt.clone()),
            Message::user(user_prompt),
        ]);
        let output = self
            .model
            .invoke_structured(request, &assessment_schema())
            .await?;
        let assessment = parse_assessment(&output)?;
        if !assessment.is_safe() {
            info!(category = %assessment.category, "input flagged by safety guard");
        }
        Ok(assessment)
    }
}
