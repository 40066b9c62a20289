//! Action specifications attached to automation rules.

use super::ActionParseError;
use crate::vocabulary::domain::NotificationChannel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of work an action asks the caller to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Set a field of the entity (`field`, `value`).
    SetField,
    /// Send a notification (`channel`, optional `template`).
    Notify,
    /// Create a follow-up task (`title`).
    CreateTask,
    /// Move the entity to another status (`to`).
    TransitionStatus,
    /// Call an external endpoint (`url`).
    Webhook,
}

impl ActionKind {
    /// Every action kind.
    pub const ALL: [Self; 5] = [
        Self::SetField,
        Self::Notify,
        Self::CreateTask,
        Self::TransitionStatus,
        Self::Webhook,
    ];

    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SetField => "set_field",
            Self::Notify => "notify",
            Self::CreateTask => "create_task",
            Self::TransitionStatus => "transition_status",
            Self::Webhook => "webhook",
        }
    }

    /// Returns the parameters an action of this kind must carry.
    #[must_use]
    pub const fn required_params(self) -> &'static [&'static str] {
        match self {
            Self::SetField => &["field", "value"],
            Self::Notify => &["channel"],
            Self::CreateTask => &["title"],
            Self::TransitionStatus => &["to"],
            Self::Webhook => &["url"],
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ActionKind {
    type Error = ActionParseError;

    /// Accepts `snake_case` and `camelCase` spellings.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let folded: String = value
            .trim()
            .chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().replace('_', "") == folded)
            .ok_or_else(|| ActionParseError::UnknownKind(value.to_owned()))
    }
}

/// One action of a rule: a kind plus parameter templates.
///
/// Parameter values may contain `{{ ... }}` placeholders resolved against
/// the event when the rule fires. Deserialises from either the object form
/// `{"kind": "notify", "params": {...}}` or the compact notation accepted by
/// [`ActionSpec::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ActionSpecRepr")]
pub struct ActionSpec {
    /// Action kind.
    pub kind: ActionKind,
    /// Parameter templates keyed by name.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ActionSpecRepr {
    Compact(String),
    Full {
        kind: ActionKind,
        #[serde(default)]
        params: BTreeMap<String, String>,
    },
}

impl TryFrom<ActionSpecRepr> for ActionSpec {
    type Error = ActionParseError;

    fn try_from(value: ActionSpecRepr) -> Result<Self, Self::Error> {
        match value {
            ActionSpecRepr::Compact(text) => Self::parse(&text),
            ActionSpecRepr::Full { kind, params } => Ok(Self { kind, params }),
        }
    }
}

impl ActionSpec {
    /// Creates an action with the given parameters.
    #[must_use]
    pub fn new<K, V>(kind: ActionKind, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            kind,
            params: params
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Parses the compact notation `kind(key=value, key2="quoted, value")`.
    ///
    /// The kind may be written `snake_case` or `camelCase`; empty parentheses
    /// may be omitted.
    ///
    /// # Errors
    ///
    /// Returns [`ActionParseError`] when the input is empty, names an unknown
    /// kind, is malformed, or repeats a parameter.
    pub fn parse(input: &str) -> Result<Self, ActionParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ActionParseError::Empty);
        }

        let (name, arguments) = match trimmed.split_once('(') {
            None => (trimmed, ""),
            Some((name, rest)) => {
                let inner = rest.strip_suffix(')').ok_or_else(|| ActionParseError::Malformed {
                    input: trimmed.to_owned(),
                    reason: "missing closing ')'".to_owned(),
                })?;
                (name.trim(), inner)
            }
        };
        let kind = ActionKind::try_from(name)?;

        let mut params = BTreeMap::new();
        for token in split_arguments(arguments, trimmed)? {
            let (key, value) = token
                .split_once('=')
                .ok_or_else(|| ActionParseError::Malformed {
                    input: trimmed.to_owned(),
                    reason: format!("expected key=value, got '{token}'"),
                })?;
            let normalized_key = key.trim().to_ascii_lowercase();
            if normalized_key.is_empty() || !is_valid_identifier(&normalized_key) {
                return Err(ActionParseError::Malformed {
                    input: trimmed.to_owned(),
                    reason: format!("invalid parameter name '{}'", key.trim()),
                });
            }
            if params
                .insert(normalized_key.clone(), unquote(value.trim()))
                .is_some()
            {
                return Err(ActionParseError::DuplicateParameter(normalized_key));
            }
        }

        Ok(Self { kind, params })
    }

    /// Returns a parameter template by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Checks that required parameters are present and well-formed.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        for required in self.kind.required_params() {
            let present = self
                .param(required)
                .is_some_and(|value| !value.trim().is_empty());
            if !present {
                return Err(format!("{} action needs parameter '{required}'", self.kind));
            }
        }

        let is_template = |value: &str| value.contains("{{") || value.contains("{%");
        match self.kind {
            ActionKind::Notify => {
                let channel = self.param("channel").unwrap_or_default();
                let known = [
                    NotificationChannel::Email,
                    NotificationChannel::Sms,
                    NotificationChannel::Push,
                    NotificationChannel::InApp,
                ]
                .iter()
                .any(|candidate| candidate.as_str() == channel);
                if !known && !is_template(channel) {
                    return Err(format!("unknown notification channel '{channel}'"));
                }
            }
            ActionKind::Webhook => {
                let url = self.param("url").unwrap_or_default();
                if !(url.starts_with("https://") || url.starts_with("http://") || is_template(url))
                {
                    return Err(format!("webhook url '{url}' must be http(s)"));
                }
            }
            ActionKind::SetField | ActionKind::CreateTask | ActionKind::TransitionStatus => {}
        }

        let environment = minijinja::Environment::new();
        for (name, template) in &self.params {
            environment
                .template_from_str(template)
                .map_err(|err| format!("parameter '{name}' is not a valid template: {err}"))?;
        }
        Ok(())
    }
}

impl fmt::Display for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind)?;
        for (index, (key, value)) in self.params.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value:?}")?;
        }
        f.write_str(")")
    }
}

fn split_arguments(arguments: &str, input: &str) -> Result<Vec<String>, ActionParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes: Option<char> = None;
    let mut escaped = false;

    for character in arguments.chars() {
        if let Some(quote_char) = in_quotes {
            current.push(character);
            if escaped {
                escaped = false;
            } else if character == '\\' {
                escaped = true;
            } else if character == quote_char {
                in_quotes = None;
            }
            continue;
        }

        match character {
            '"' | '\'' => {
                in_quotes = Some(character);
                current.push(character);
            }
            ',' => tokens.push(std::mem::take(&mut current)),
            _ => current.push(character),
        }
    }

    if in_quotes.is_some() {
        return Err(ActionParseError::Malformed {
            input: input.to_owned(),
            reason: "unterminated quoted value".to_owned(),
        });
    }
    tokens.push(current);

    let tokens: Vec<String> = tokens
        .into_iter()
        .map(|token| token.trim().to_owned())
        .collect();
    if tokens.len() == 1 && tokens.first().is_some_and(String::is_empty) {
        return Ok(Vec::new());
    }
    if tokens.iter().any(String::is_empty) {
        return Err(ActionParseError::Malformed {
            input: input.to_owned(),
            reason: "empty parameter".to_owned(),
        });
    }
    Ok(tokens)
}

fn unquote(value: &str) -> String {
    let Some(quote) = value.chars().next().filter(|c| matches!(c, '"' | '\'')) else {
        return value.to_owned();
    };
    let Some(body) = value
        .strip_prefix(quote)
        .and_then(|rest| rest.strip_suffix(quote))
    else {
        return value.to_owned();
    };
    let mut unquoted = String::with_capacity(body.len());
    let mut escaped = false;
    for character in body.chars() {
        if escaped {
            unquoted.push(character);
            escaped = false;
        } else if character == '\\' {
            escaped = true;
        } else {
            unquoted.push(character);
        }
    }
    unquoted
}

fn is_valid_identifier(value: &str) -> bool {
    value
        .chars()
        .all(|character| character.is_ascii_alphanumeric() || matches!(character, '-' | '_'))
}
