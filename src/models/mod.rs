pub mod candidate;
pub mod candidate_table;
pub mod chat_turn;
pub mod intent;
