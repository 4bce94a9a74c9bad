// src/context.rs - Rolling conversational context merged into every
// outbound model request: detected user name, a bounded ring of recent
// questions, and the last generated routine.
use crate::models::chat::ChatMessage;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::VecDeque;

/// Questions kept in memory; oldest evicted beyond this.
pub const PAST_QUESTION_CAP: usize = 20;
/// Questions actually quoted back in the context message.
const CONTEXT_QUESTION_WINDOW: usize = 5;

const CONTEXT_HEADER: &str = "Conversation context:";

lazy_static! {
    // Checked in order; the first pattern that matches wins.
    static ref NAME_PATTERNS: [Regex; 3] = [
        Regex::new(r"(?i)my name is\s+([a-zA-Z'-]{2,50})").expect("name pattern must compile"),
        Regex::new(r"(?i)\bi'm\s+([a-zA-Z'-]{2,50})").expect("name pattern must compile"),
        Regex::new(r"(?i)\bi am\s+([a-zA-Z'-]{2,50})").expect("name pattern must compile"),
    ];
}

#[derive(Debug, Clone)]
pub struct RecordedQuestion {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ConversationContext {
    user_name: Option<String>,
    past_questions: VecDeque<RecordedQuestion>,
    generated_routine: Option<String>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_question(&mut self, text: impl Into<String>) {
        self.past_questions.push_back(RecordedQuestion {
            text: text.into(),
            timestamp: Utc::now(),
        });
        while self.past_questions.len() > PAST_QUESTION_CAP {
            self.past_questions.pop_front();
        }
    }

    /// Scan a user message for a self-introduction. The captured name is
    /// stored and returned; patterns after the first match are not tried.
    pub fn detect_name(&mut self, text: &str) -> Option<String> {
        for pattern in NAME_PATTERNS.iter() {
            if let Some(caps) = pattern.captures(text) {
                let name = caps[1].to_string();
                self.user_name = Some(name.clone());
                return Some(name);
            }
        }
        None
    }

    pub fn set_generated_routine(&mut self, routine: impl Into<String>) {
        self.generated_routine = Some(routine.into());
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn generated_routine(&self) -> Option<&str> {
        self.generated_routine.as_deref()
    }

    pub fn question_count(&self) -> usize {
        self.past_questions.len()
    }

    pub fn questions(&self) -> impl Iterator<Item = &RecordedQuestion> {
        self.past_questions.iter()
    }

    fn is_empty(&self) -> bool {
        self.user_name.is_none()
            && self.past_questions.is_empty()
            && self.generated_routine.is_none()
    }

    /// One system message summarizing the session so far, or `None` when
    /// there is nothing to summarize. Injected after the fixed instruction
    /// and before the new user turn.
    pub fn to_context_message(&self) -> Option<ChatMessage> {
        if self.is_empty() {
            return None;
        }

        let mut content = String::from(CONTEXT_HEADER);
        if let Some(routine) = &self.generated_routine {
            content.push_str("\nLatest generated routine: ");
            content.push_str(routine);
        }
        if let Some(name) = &self.user_name {
            content.push_str("\nUser's name: ");
            content.push_str(name);
        }
        if !self.past_questions.is_empty() {
            let skip = self
                .past_questions
                .len()
                .saturating_sub(CONTEXT_QUESTION_WINDOW);
            let recent: Vec<&str> = self
                .past_questions
                .iter()
                .skip(skip)
                .map(|q| q.text.as_str())
                .collect();
            content.push_str("\nRecent user questions: ");
            content.push_str(&recent.join(" || "));
        }

        Some(ChatMessage::system(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_my_name_is() {
        let mut ctx = ConversationContext::new();
        assert_eq!(ctx.detect_name("my name is Asha"), Some("Asha".to_string()));
        assert_eq!(ctx.user_name(), Some("Asha"));
    }

    #[test]
    fn detects_contracted_introduction() {
        let mut ctx = ConversationContext::new();
        assert_eq!(
            ctx.detect_name("Hi, I'm Lee-Anne"),
            Some("Lee-Anne".to_string())
        );
    }

    #[test]
    fn plain_greeting_has_no_name() {
        let mut ctx = ConversationContext::new();
        assert_eq!(ctx.detect_name("hello there"), None);
        assert_eq!(ctx.user_name(), None);
    }

    #[test]
    fn first_matching_pattern_wins() {
        let mut ctx = ConversationContext::new();
        assert_eq!(
            ctx.detect_name("my name is Asha but I'm Lee"),
            Some("Asha".to_string())
        );
    }

    #[test]
    fn question_ring_keeps_the_newest_twenty() {
        let mut ctx = ConversationContext::new();
        for i in 0..25 {
            ctx.record_question(format!("q{}", i));
        }
        assert_eq!(ctx.question_count(), PAST_QUESTION_CAP);
        let texts: Vec<&str> = ctx.questions().map(|q| q.text.as_str()).collect();
        assert_eq!(texts.first(), Some(&"q5"));
        assert_eq!(texts.last(), Some(&"q24"));
    }

    #[test]
    fn empty_context_yields_no_message() {
        let ctx = ConversationContext::new();
        assert!(ctx.to_context_message().is_none());
    }

    #[test]
    fn context_message_orders_routine_name_questions() {
        let mut ctx = ConversationContext::new();
        for i in 0..7 {
            ctx.record_question(format!("q{}", i));
        }
        ctx.detect_name("my name is Asha");
        ctx.set_generated_routine("cleanse, moisturize");

        let message = ctx.to_context_message().unwrap();
        let content = &message.content;
        assert!(content.starts_with("Conversation context:"));

        let routine_at = content.find("Latest generated routine:").unwrap();
        let name_at = content.find("User's name: Asha").unwrap();
        let questions_at = content.find("Recent user questions:").unwrap();
        assert!(routine_at < name_at && name_at < questions_at);

        // Only the last five questions, oldest first, joined by " || ".
        assert!(content.contains("q2 || q3 || q4 || q5 || q6"));
        assert!(!content.contains("q1 ||"));
    }

    #[test]
    fn routine_is_overwritten_not_appended() {
        let mut ctx = ConversationContext::new();
        ctx.set_generated_routine("first");
        ctx.set_generated_routine("second");
        assert_eq!(ctx.generated_routine(), Some("second"));
    }
}
