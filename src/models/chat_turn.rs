use serde::{Deserialize, Serialize};

/// One exchange in a session. Status turns appended after a calendar action
/// have an empty `user` side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub user: String,
    pub bot: String,
}

impl ChatTurn {
    pub fn new(user: impl Into<String>, bot: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            bot: bot.into(),
        }
    }

    pub fn status(bot: impl Into<String>) -> Self {
        Self::new(String::new(), bot)
    }
}

/// Renders turns as `User: …\nBot: …` lines joined by newlines.
pub fn render_transcript(turns: &[ChatTurn]) -> String {
    turns
        .iter()
        .map(|t| format!("User: {}\nBot: {}", t.user, t.bot))
        .collect::<Vec<_>>()
        .join("\n")
}
