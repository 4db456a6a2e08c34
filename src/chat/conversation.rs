use crate::relay::protocol::{Message, MessageContent, Role};

/// Visible conversation: plain-text messages in order, plus an optional
/// system prompt sent ahead of them.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    system_prompt: Option<String>,
    initial_prompt: Option<String>,
}

impl Conversation {
    pub fn new(system_prompt: Option<String>) -> Self {
        let system_prompt = system_prompt.filter(|prompt| !prompt.trim().is_empty());
        Self {
            messages: Vec::new(),
            initial_prompt: system_prompt.clone(),
            system_prompt,
        }
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(Message::assistant(text));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Clear all messages and restore the initial system prompt
    pub fn reset(&mut self) {
        self.messages.clear();
        self.system_prompt = self.initial_prompt.clone();
    }

    /// History as sent to the relay: system prompt first, then the
    /// normalized messages.
    pub fn to_request(&self) -> Vec<Message> {
        let mut request = Vec::with_capacity(self.messages.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            request.push(Message::system(prompt.clone()));
        }
        request.extend(self.normalized());
        request
    }

    pub fn normalized(&self) -> Vec<Message> {
        normalize(&self.messages)
    }

    /// `(role, text)` pairs for display
    pub fn transcript(&self) -> impl Iterator<Item = (Role, &str)> {
        self.messages
            .iter()
            .filter_map(|message| message.text().map(|text| (message.role, text)))
    }
}

/// Merge consecutive same-role text messages so roles alternate.
/// Merged texts are joined with a newline; block content is never merged.
pub fn normalize(messages: &[Message]) -> Vec<Message> {
    let mut normalized: Vec<Message> = Vec::with_capacity(messages.len());

    for message in messages {
        if let Some(last) = normalized.last_mut() {
            if last.role == message.role {
                if let (MessageContent::Text(previous), MessageContent::Text(next)) =
                    (&mut last.content, &message.content)
                {
                    previous.push('\n');
                    previous.push_str(next);
                    continue;
                }
            }
        }
        normalized.push(message.clone());
    }

    normalized
}
