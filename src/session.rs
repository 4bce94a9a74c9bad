// src/session.rs - Single-session controller owning all mutable state:
// selection set, conversation context, chat history, and the persisted UI
// direction. HTTP handlers translate requests into commands and exchanges;
// nothing in here knows about axum.
use crate::catalog::{Product, ProductCatalog};
use crate::context::ConversationContext;
use crate::models::chat::ChatMessage;
use crate::selection::SelectionSet;
use crate::storage::PrefsStore;
use serde_json::Value;
use std::sync::Arc;

pub const DIRECTION_KEY: &str = "dirOverride";

/// Fixed instruction seeding every outbound request (legacy chat models).
const SYSTEM_INSTRUCTION: &str = "You are Glow Advisor, a friendly beauty-routine assistant \
for the Glow product catalog. Build personalized skincare, haircare, makeup, and fragrance \
routines from the products the user has selected, and answer follow-up questions about those \
routines and related beauty topics. Politely decline questions unrelated to beauty or \
personal care. Keep answers concise and practical.";

/// Variant for web-search-capable models: same persona, asks for citations.
const SYSTEM_INSTRUCTION_WEB_SEARCH: &str = "You are Glow Advisor, a friendly beauty-routine \
assistant for the Glow product catalog. Build personalized skincare, haircare, makeup, and \
fragrance routines from the products the user has selected, and answer follow-up questions \
about those routines and related beauty topics. When you mention a product or brand you \
found through web search, include a link to it. Politely decline questions unrelated to \
beauty or personal care. Keep answers concise and practical.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ltr" => Some(Direction::Ltr),
            "rtl" => Some(Direction::Rtl),
            _ => None,
        }
    }
}

/// Discrete UI commands consumed by the controller (the state-mutating,
/// non-network ones; chat exchanges go through `prepare_*`).
#[derive(Debug, Clone)]
pub enum Command {
    SelectProduct(i64),
    ClearSelection,
    SetDirection(Direction),
}

#[derive(Debug)]
pub enum CommandOutcome {
    Selection { selected: Vec<Product> },
    Direction(Direction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeKind {
    Chat,
    Routine,
}

/// A prepared outbound request plus what to append to history once the
/// relay call succeeds. Built under the state lock, sent outside it. The
/// token marks this exchange's place in the sequence: a newer prepare
/// supersedes it and its late reply is discarded.
#[derive(Debug)]
pub struct OutboundExchange {
    pub kind: ExchangeKind,
    pub user_text: String,
    pub messages: Vec<ChatMessage>,
    token: u64,
}

pub struct SessionController {
    catalog: Arc<ProductCatalog>,
    prefs: PrefsStore,
    selection: SelectionSet,
    context: ConversationContext,
    // Grows for the whole session lifetime; there is deliberately no
    // eviction here, unlike the bounded question ring in the context.
    history: Vec<ChatMessage>,
    direction: Direction,
    instruction: &'static str,
    exchange_seq: u64,
}

impl SessionController {
    pub fn new(catalog: Arc<ProductCatalog>, prefs: PrefsStore, web_search: bool) -> Self {
        let instruction = if web_search {
            SYSTEM_INSTRUCTION_WEB_SEARCH
        } else {
            SYSTEM_INSTRUCTION
        };
        Self {
            catalog,
            prefs,
            selection: SelectionSet::new(),
            context: ConversationContext::new(),
            history: vec![ChatMessage::system(instruction)],
            direction: Direction::default(),
            instruction,
            exchange_seq: 0,
        }
    }

    fn begin_exchange(&mut self) -> u64 {
        self.exchange_seq += 1;
        self.exchange_seq
    }

    /// Rehydrate persisted state: selection ids first (resolved against the
    /// loaded catalog), then the direction override.
    pub fn restore(&mut self) {
        self.selection.restore(&self.prefs, &self.catalog);
        if !self.selection.is_empty() {
            tracing::info!("restored {} selected product(s)", self.selection.len());
        }

        if let Some(Value::String(raw)) = self.prefs.get(DIRECTION_KEY) {
            if let Some(direction) = Direction::parse(&raw) {
                self.direction = direction;
            }
        }
    }

    pub fn dispatch(&mut self, command: Command) -> CommandOutcome {
        match command {
            Command::SelectProduct(id) => {
                self.selection.toggle(id, &self.catalog);
                self.selection.persist(&self.prefs);
                CommandOutcome::Selection {
                    selected: self.selected_products(),
                }
            }
            Command::ClearSelection => {
                self.selection.clear();
                self.selection.persist(&self.prefs);
                CommandOutcome::Selection {
                    selected: self.selected_products(),
                }
            }
            Command::SetDirection(direction) => {
                self.direction = direction;
                self.prefs
                    .set(DIRECTION_KEY, &Value::from(direction.as_str()));
                CommandOutcome::Direction(direction)
            }
        }
    }

    pub fn selected_products(&self) -> Vec<Product> {
        self.selection
            .products(&self.catalog)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Transcript including the seeded instruction message.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Mutate the context for a new user message and assemble the outbound
    /// list: fixed instruction, then the context message when there is any
    /// accumulated context, then the new user turn. The question itself is
    /// recorded after assembly so the context block quotes earlier turns,
    /// not the one being sent.
    pub fn prepare_message(&mut self, text: &str) -> OutboundExchange {
        let text = text.trim().to_string();
        self.context.detect_name(&text);

        let mut messages = vec![ChatMessage::system(self.instruction)];
        if let Some(context_message) = self.context.to_context_message() {
            messages.push(context_message);
        }
        messages.push(ChatMessage::user(text.clone()));

        self.context.record_question(text.clone());

        OutboundExchange {
            kind: ExchangeKind::Chat,
            user_text: text,
            messages,
            token: self.begin_exchange(),
        }
    }

    /// Build a routine-generation request from the current selection.
    /// Returns `None` when nothing is selected.
    pub fn prepare_routine(&mut self) -> Option<OutboundExchange> {
        let selected = self.selection.products(&self.catalog);
        if selected.is_empty() {
            return None;
        }

        let mut request =
            String::from("Create a personalized routine using these selected products:\n");
        for product in &selected {
            request.push_str(&format!(
                "- {} by {} ({}): {}\n",
                product.name, product.brand, product.category, product.description
            ));
        }
        request.push_str(
            "Describe the order to use them in, morning vs evening, and any tips for combining them.",
        );

        let mut messages = vec![ChatMessage::system(self.instruction)];
        if let Some(context_message) = self.context.to_context_message() {
            messages.push(context_message);
        }
        messages.push(ChatMessage::user(request.clone()));

        Some(OutboundExchange {
            kind: ExchangeKind::Routine,
            user_text: request,
            messages,
            token: self.begin_exchange(),
        })
    }

    /// Record a successful round trip: both turns go into the history, and
    /// a routine reply overwrites the stored routine. A reply belonging to
    /// an exchange that was superseded while it was in flight is discarded;
    /// returns whether the exchange was applied.
    pub fn complete_exchange(&mut self, exchange: &OutboundExchange, reply: &str) -> bool {
        if exchange.token != self.exchange_seq {
            tracing::debug!("discarding reply for superseded exchange");
            return false;
        }

        self.history.push(ChatMessage::user(&exchange.user_text));
        self.history.push(ChatMessage::assistant(reply));
        if exchange.kind == ExchangeKind::Routine {
            self.context.set_generated_routine(reply);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::sample_catalog;
    use crate::models::chat::Role;
    use crate::selection::STORAGE_KEY;
    use serde_json::json;

    fn controller(dir: &tempfile::TempDir) -> SessionController {
        let catalog = Arc::new(sample_catalog());
        let prefs = PrefsStore::new(dir.path());
        SessionController::new(catalog, prefs, false)
    }

    #[test]
    fn first_message_has_no_context_block() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = controller(&dir);

        let exchange = session.prepare_message("what cleanser should I use?");
        let roles: Vec<Role> = exchange.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User]);
    }

    #[test]
    fn later_messages_carry_earlier_questions() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = controller(&dir);

        let first = session.prepare_message("what about sunscreen?");
        session.complete_exchange(&first, "Use SPF 30 daily.");

        let second = session.prepare_message("and at night?");
        assert_eq!(second.messages.len(), 3);
        let context = &second.messages[1];
        assert_eq!(context.role, Role::System);
        assert!(context.content.contains("what about sunscreen?"));
        // The turn being sent is not quoted back at itself.
        assert!(!context.content.contains("and at night?"));
    }

    #[test]
    fn introduction_personalizes_the_same_request() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = controller(&dir);

        let exchange = session.prepare_message("Hi, I'm Asha");
        assert_eq!(exchange.messages.len(), 3);
        assert!(exchange.messages[1].content.contains("User's name: Asha"));
    }

    #[test]
    fn routine_requires_a_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = controller(&dir);
        assert!(session.prepare_routine().is_none());
    }

    #[test]
    fn routine_reply_feeds_back_into_context() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = controller(&dir);

        session.dispatch(Command::SelectProduct(1));
        session.dispatch(Command::SelectProduct(2));

        let exchange = session.prepare_routine().unwrap();
        assert!(exchange.user_text.contains("Hydra Boost Cleanser"));
        assert!(exchange.user_text.contains("Velvet Day Cream"));

        session.complete_exchange(&exchange, "Cleanse, then moisturize.");
        assert_eq!(
            session.context().generated_routine(),
            Some("Cleanse, then moisturize.")
        );

        let follow_up = session.prepare_message("how often?");
        assert!(follow_up.messages[1]
            .content
            .contains("Latest generated routine: Cleanse, then moisturize."));
    }

    #[test]
    fn history_records_both_turns_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = controller(&dir);

        let exchange = session.prepare_message("hello");
        assert_eq!(session.history().len(), 1); // instruction only
        session.complete_exchange(&exchange, "hi!");

        let history = session.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[1].role, Role::User);
        assert_eq!(history[1].content, "hello");
        assert_eq!(history[2].role, Role::Assistant);
        assert_eq!(history[2].content, "hi!");
    }

    #[test]
    fn selection_commands_persist_and_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = controller(&dir);

        let outcome = session.dispatch(Command::SelectProduct(3));
        match outcome {
            CommandOutcome::Selection { selected } => {
                assert_eq!(selected.len(), 1);
                assert_eq!(selected[0].name, "Citrus Foam Wash");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let prefs = PrefsStore::new(dir.path());
        assert_eq!(prefs.get(STORAGE_KEY), Some(json!([3])));

        session.dispatch(Command::ClearSelection);
        assert_eq!(prefs.get(STORAGE_KEY), Some(json!([])));
        assert!(session.selected_products().is_empty());
    }

    #[test]
    fn direction_round_trips_through_storage() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = controller(&dir);
        session.dispatch(Command::SetDirection(Direction::Rtl));

        let mut fresh = controller(&dir);
        fresh.restore();
        assert_eq!(fresh.direction(), Direction::Rtl);
    }

    #[test]
    fn restore_rehydrates_selection_from_storage() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut session = controller(&dir);
            session.dispatch(Command::SelectProduct(2));
            session.dispatch(Command::SelectProduct(999)); // unknown: no-op
        }

        let mut fresh = controller(&dir);
        fresh.restore();
        let names: Vec<String> = fresh
            .selected_products()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Velvet Day Cream".to_string()]);
    }

    #[test]
    fn stale_exchange_is_superseded_by_a_newer_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = controller(&dir);

        let first = session.prepare_message("first question");
        let second = session.prepare_message("second question");

        assert!(!session.complete_exchange(&first, "late reply"));
        assert_eq!(session.history().len(), 1); // instruction only

        assert!(session.complete_exchange(&second, "fresh reply"));
        assert_eq!(session.history().len(), 3);
        assert_eq!(session.history()[1].content, "second question");
    }

    #[test]
    fn web_search_instruction_is_selected_by_flag() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(sample_catalog());
        let prefs = PrefsStore::new(dir.path());
        let session = SessionController::new(catalog, prefs, true);
        assert!(session.history()[0].content.contains("web search"));
    }
}
