use rainway_demo_sdk::infrastructure::web::WebStream;
use rainway_demo_sdk::infrastructure::StreamHandle;
use web_sys::HtmlElement;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct StreamViewProps {
    pub stream: WebStream,
}

/// Hosts the video element the SDK renders a stream into
#[function_component(StreamView)]
pub fn stream_view(props: &StreamViewProps) -> Html {
    let host = use_node_ref();

    {
        let host = host.clone();
        use_effect_with(props.stream.clone(), move |stream| {
            let container = stream.container();
            match (host.cast::<HtmlElement>(), &container) {
                (Some(host), Some(container)) => {
                    if let Err(e) = host.append_child(container) {
                        tracing::warn!("⚠️  Failed to attach stream view: {:?}", e);
                    }
                }
                (_, None) => tracing::warn!("⚠️  Stream {} has no video element", stream.id()),
                _ => {}
            }

            move || {
                if let Some(container) = container {
                    container.remove();
                }
            }
        });
    }

    html! {
        <div class="rainway-stream" ref={host}></div>
    }
}
