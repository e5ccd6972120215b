use rainway_demo_core::{SessionState, WidgetState};
use yew::prelude::*;

/// Colour family of a badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    Idle,
    Busy,
    Ready,
    Live,
    Warning,
}

impl BadgeTone {
    pub fn for_session(state: SessionState) -> Self {
        match state {
            SessionState::Disconnected => BadgeTone::Idle,
            SessionState::Connecting => BadgeTone::Busy,
            SessionState::Connected => BadgeTone::Ready,
        }
    }

    pub fn for_widget(state: WidgetState) -> Self {
        match state {
            WidgetState::Disconnected => BadgeTone::Idle,
            WidgetState::ConnectingToHost | WidgetState::ConnectedNoStream => BadgeTone::Busy,
            WidgetState::ConnectedCantStream => BadgeTone::Warning,
            WidgetState::ConnectedReadyToStream => BadgeTone::Ready,
            WidgetState::Streaming => BadgeTone::Live,
        }
    }

    fn class(&self) -> &'static str {
        match self {
            BadgeTone::Idle => "idle",
            BadgeTone::Busy => "busy",
            BadgeTone::Ready => "ready",
            BadgeTone::Live => "live",
            BadgeTone::Warning => "warning",
        }
    }
}

#[derive(Properties, PartialEq)]
pub struct StatusBadgeProps {
    pub label: AttrValue,
    pub tone: BadgeTone,
}

#[function_component(StatusBadge)]
pub fn status_badge(props: &StatusBadgeProps) -> Html {
    html! {
        <span class={classes!("rainway-badge", props.tone.class())}>
            {&props.label}
        </span>
    }
}
