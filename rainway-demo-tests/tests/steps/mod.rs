mod chat_steps;
mod peer_steps;
mod session_steps;
mod stream_steps;
