//! UI components of the demo

mod chat_box;
mod peer_connect_form;
mod peer_widget;
mod session_bar;
mod status_badge;
mod stream_view;
pub use chat_box::ChatBox;
pub use peer_connect_form::PeerConnectForm;
pub use peer_widget::{PeerView, PeerWidget, WidgetAction};
pub use session_bar::SessionBar;
pub use status_badge::{BadgeTone, StatusBadge};
pub use stream_view::StreamView;
