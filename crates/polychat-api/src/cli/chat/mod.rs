//! Interactive `polychat chat` session.
//!
//! Each line the user enters is one dispatch round across every provider,
//! gated by the free-tier counter. Entry point: `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
