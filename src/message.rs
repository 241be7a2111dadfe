use serde::{Deserialize, Serialize};

/// One entry in a run's conversation history.
///
/// Messages carry the transcript a worker invocation sees: the caller's
/// prompt, prior worker replies, and tool results appended between
/// invocations. Each message has a role and text content.
///
/// # Examples
///
/// ```
/// use baton::message::Message;
///
/// let user_msg = Message::user("fly to ny from winnipeg");
/// let reply = Message::assistant("Looking up flights now.");
///
/// assert!(user_msg.has_role(Message::USER));
/// assert!(!reply.has_role(Message::USER));
/// ```
///
/// Messages serialize for embedding in payloads and events:
/// ```
/// use baton::message::Message;
///
/// let msg = Message::user("test");
/// let json = serde_json::to_string(&msg).unwrap();
/// let parsed: Message = serde_json::from_str(&json).unwrap();
/// assert_eq!(msg, parsed);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender (e.g., "user", "assistant", "tool").
    ///
    /// Use the constants on [`Message`] for standardized values.
    pub role: String,
    /// The text content of the message.
    pub content: String,
}

impl Message {
    /// Caller input message role.
    pub const USER: &'static str = "user";
    /// Worker response message role.
    pub const ASSISTANT: &'static str = "assistant";
    /// System instruction message role.
    pub const SYSTEM: &'static str = "system";
    /// Tool result message role, appended by the engine between invocations.
    pub const TOOL: &'static str = "tool";

    /// Creates a new message with the specified role and content.
    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    /// Creates a user message with the specified content.
    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::new(Self::USER, content)
    }

    /// Creates an assistant message with the specified content.
    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self::new(Self::ASSISTANT, content)
    }

    /// Creates a system message with the specified content.
    #[must_use]
    pub fn system(content: &str) -> Self {
        Self::new(Self::SYSTEM, content)
    }

    /// Creates a tool-result message with the specified content.
    #[must_use]
    pub fn tool(content: &str) -> Self {
        Self::new(Self::TOOL, content)
    }

    /// Returns true if this message has the specified role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}
