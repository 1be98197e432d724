//! Recovering a conversation from a transcript body.
//!
//! Parsing is two passes: [`split_on_markers`] turns the body into
//! alternating text/marker tokens, then [`assign_roles`] walks the tokens
//! with a two-state machine.
//!
//! Rules:
//! - Text before the first delimiter is a user turn, unless it is blank and
//!   immediately followed by the system delimiter, in which case the
//!   transcript opens with a system preamble.
//! - Each delimiter switches the current role; the text after it becomes a
//!   message for that role when it is not blank.
//! - Blank turns are dropped but still switch the role.
//! - Stored content is untrimmed; only the blank check trims.

use tracing::{debug, warn};

use crate::core::front_matter::extract_settings_with;
use crate::core::message::{Message, Role};
use crate::core::settings::Settings;
use crate::core::tokenizer::{split_on_markers, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingFirst,
    InRole(Role),
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Assign roles to a token stream. `roles[i]` is the role owning marker `i`.
pub fn assign_roles(tokens: &[Token<'_>], roles: &[Role]) -> Vec<Message> {
    let mut messages = Vec::new();
    let mut state = State::AwaitingFirst;
    let mut tokens = tokens.iter().peekable();

    while let Some(token) = tokens.next() {
        match (state, *token) {
            (State::AwaitingFirst, Token::Text(text)) => {
                let opens_with_system = is_blank(text)
                    && matches!(
                        tokens.peek(),
                        Some(Token::Marker(index)) if roles.get(*index) == Some(&Role::System)
                    );

                if opens_with_system {
                    state = State::InRole(Role::System);
                } else {
                    if !is_blank(text) {
                        messages.push(Message::user(text));
                    }
                    state = State::InRole(Role::User);
                }
            }
            (_, Token::Marker(index)) => {
                let Some(&role) = roles.get(index) else {
                    continue;
                };
                state = State::InRole(role);

                if let Some(Token::Text(text)) = tokens.peek() {
                    if !is_blank(text) {
                        messages.push(Message::new(role, *text));
                    }
                }
            }
            // Text after a delimiter was already taken as its lookahead.
            (State::InRole(_), Token::Text(_)) => {}
        }
    }

    messages
}

/// Parse a transcript body (front matter already removed) into messages.
pub fn parse_transcript(body: &str, settings: &Settings) -> Vec<Message> {
    let conflicts = settings.delimiter_conflicts();
    if !conflicts.is_empty() {
        warn!(
            ?conflicts,
            "Role delimiters overlap; transcript roles may be assigned unpredictably"
        );
    }

    let delimiters = settings.delimiters();
    let markers: Vec<&str> = delimiters.iter().map(|(_, literal)| literal.as_str()).collect();
    let roles: Vec<Role> = delimiters.iter().map(|(role, _)| *role).collect();

    let tokens = split_on_markers(body, &markers);
    let messages = assign_roles(&tokens, &roles);
    debug!(
        tokens = tokens.len(),
        messages = messages.len(),
        "Parsed transcript"
    );
    messages
}

/// A fully parsed document: its settings plus its conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub settings: Settings,
    pub messages: Vec<Message>,
}

impl Document {
    /// Parse raw document text with built-in defaults.
    pub fn parse(text: &str) -> Self {
        Self::parse_with(text, Settings::default())
    }

    /// Parse raw document text, merging front matter over `base`.
    pub fn parse_with(text: &str, base: Settings) -> Self {
        let (settings, body) = extract_settings_with(text, base);
        let messages = parse_transcript(&body, &settings);
        Self { settings, messages }
    }
}
