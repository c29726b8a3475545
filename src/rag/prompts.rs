// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prompt templates for the conversational retrieval chain

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::llm::ChatMessage;

pub const CONDENSE_QUESTION_TEMPLATE: &str = "Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question.

Chat History:
{chat_history}
Follow Up Input: {question}
Standalone question:";

pub const QA_INITIAL_TEMPLATE: &str = "Context information is below.
---------------------
{context}
---------------------
Given the context information and no prior knowledge, answer the question: {question}";

pub const QA_REFINE_TEMPLATE: &str = "The original question is as follows: {question}
We have provided an existing answer: {existing_answer}
We have the opportunity to refine the existing answer
(only if needed) with some more context below.
------------
{context}
------------
Given the new context, refine the original answer to better answer the question.
If the context isn't useful, return the original answer.";

/// Audience the answer should be written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplanationLevel {
    #[serde(rename = "Five Year Old")]
    FiveYearOld,
    #[serde(rename = "High Schooler")]
    HighSchooler,
    #[serde(rename = "College Student")]
    CollegeStudent,
    #[serde(rename = "Expert")]
    Expert,
}

impl ExplanationLevel {
    pub const ALL: [ExplanationLevel; 4] = [
        ExplanationLevel::FiveYearOld,
        ExplanationLevel::HighSchooler,
        ExplanationLevel::CollegeStudent,
        ExplanationLevel::Expert,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ExplanationLevel::FiveYearOld => "Five Year Old",
            ExplanationLevel::HighSchooler => "High Schooler",
            ExplanationLevel::CollegeStudent => "College Student",
            ExplanationLevel::Expert => "Expert",
        }
    }

    /// System instruction describing the audience
    pub fn instruction(&self) -> &'static str {
        match self {
            ExplanationLevel::FiveYearOld => {
                "Explain the answer as you would to a five year old: short sentences, everyday words and a simple comparison where it helps."
            }
            ExplanationLevel::HighSchooler => {
                "Explain the answer for a high school student: clear language, and define any technical term you use."
            }
            ExplanationLevel::CollegeStudent => {
                "Explain the answer for a college student: precise terminology and enough detail to follow the reasoning."
            }
            ExplanationLevel::Expert => {
                "Answer for a domain expert: be concise and technical, and skip introductory explanations."
            }
        }
    }
}

impl fmt::Display for ExplanationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExplanationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|level| level.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                format!(
                    "unknown explanation level '{}', expected one of: {}",
                    wanted,
                    Self::ALL.map(|l| l.label()).join(", ")
                )
            })
    }
}

/// Replace `{name}` placeholders in a single pass; substituted values are
/// never scanned again and unknown placeholders are kept verbatim.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        if let Some(close) = after.find('}') {
            let name = &after[..close];
            if let Some((_, value)) = values.iter().find(|(n, _)| *n == name) {
                out.push_str(value);
                rest = &after[close + 1..];
                continue;
            }
        }
        out.push('{');
        rest = after;
    }
    out.push_str(rest);
    out
}

/// `Human: ...` / `Assistant: ...` transcript used by the condense prompt
pub fn format_chat_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|message| {
            let speaker = match message.role {
                crate::llm::Role::User => "Human",
                crate::llm::Role::Assistant => "Assistant",
                crate::llm::Role::System => "System",
            };
            format!("{}: {}", speaker, message.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn condense_question_prompt(history: &[ChatMessage], question: &str) -> Vec<ChatMessage> {
    let history = format_chat_history(history);
    vec![ChatMessage::user(render(
        CONDENSE_QUESTION_TEMPLATE,
        &[("chat_history", &history), ("question", question)],
    ))]
}

pub fn qa_initial_prompt(
    context: &str,
    question: &str,
    level: Option<ExplanationLevel>,
) -> Vec<ChatMessage> {
    with_level(
        level,
        render(QA_INITIAL_TEMPLATE, &[("context", context), ("question", question)]),
    )
}

pub fn qa_refine_prompt(
    context: &str,
    question: &str,
    existing_answer: &str,
    level: Option<ExplanationLevel>,
) -> Vec<ChatMessage> {
    with_level(
        level,
        render(
            QA_REFINE_TEMPLATE,
            &[
                ("question", question),
                ("context", context),
                ("existing_answer", existing_answer),
            ],
        ),
    )
}

fn with_level(level: Option<ExplanationLevel>, prompt: String) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(level) = level {
        messages.push(ChatMessage::system(level.instruction()));
    }
    messages.push(ChatMessage::user(prompt));
    messages
}
