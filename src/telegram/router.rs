//! Pure routing decisions for inbound text.
//!
//! Factored out of the handlers so the branch logic is testable without a
//! live bot: `classify` maps message text onto the fixed command/menu
//! tables, `decide_relay` picks what happens to free text.

use crate::telegram::menu;

/// What a message's text turned out to be.
#[derive(Debug, PartialEq, Eq)]
pub enum Inbound<'a> {
    /// Leading "/" and a known command
    Start,
    Help,
    /// Leading "/" but not in the command table
    UnknownCommand,
    /// Exact match against the fixed menu label set
    Menu(MenuAction),
    /// Everything else
    Free(&'a str),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MenuAction {
    Support,
    Vacancies,
    MyChats,
    Order,
    Catalog,
}

/// Classify message text. Commands are matched on the first word so that
/// "/start@botname" and "/start foo" still dispatch.
pub fn classify(text: &str) -> Inbound<'_> {
    if let Some(rest) = text.strip_prefix('/') {
        let word = rest.split_whitespace().next().unwrap_or("");
        let name = word.split('@').next().unwrap_or("");
        return match name {
            "start" => Inbound::Start,
            "help" => Inbound::Help,
            _ => Inbound::UnknownCommand,
        };
    }

    match text {
        menu::LABEL_SUPPORT => Inbound::Menu(MenuAction::Support),
        menu::LABEL_VACANCIES => Inbound::Menu(MenuAction::Vacancies),
        menu::LABEL_MY_CHATS => Inbound::Menu(MenuAction::MyChats),
        menu::LABEL_ORDER => Inbound::Menu(MenuAction::Order),
        menu::LABEL_CATALOG => Inbound::Menu(MenuAction::Catalog),
        other => Inbound::Free(other),
    }
}

/// What to do with free text from a customer chat.
#[derive(Debug, PartialEq, Eq)]
pub enum RelayDecision {
    /// A topic was selected earlier in this chat: open a ticket with it
    NewTicket { topic: String },
    /// No pending topic, but an open ticket exists: append as continuation
    Append { ticket_id: i64 },
    /// Nothing to attach to: show the menu again
    Reprompt,
}

/// Pending-topic state wins over an open ticket; with neither, re-prompt.
pub fn decide_relay(pending_topic: Option<String>, open_ticket_id: Option<i64>) -> RelayDecision {
    if let Some(topic) = pending_topic {
        return RelayDecision::NewTicket { topic };
    }
    if let Some(ticket_id) = open_ticket_id {
        return RelayDecision::Append { ticket_id };
    }
    RelayDecision::Reprompt
}
