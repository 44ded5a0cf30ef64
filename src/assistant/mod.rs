pub mod prompt;
pub mod responder;
pub mod session;

pub use responder::{AnswerSource, Reply, Responder};
pub use session::{ConversationTurn, Role, Session};
