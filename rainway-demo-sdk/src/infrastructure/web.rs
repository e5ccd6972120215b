//! Binding to the Rainway web SDK loaded as the global `rainway` bundle.

use crate::application::{ConnectionRequest, EventHandlers};
use crate::error::{Result, SdkError};
use crate::infrastructure::{Connector, PeerHandle, Runtime, RuntimeOptions, StreamHandle};
use async_trait::async_trait;
use js_sys::{Array, BigInt, Object, Promise, Reflect, Uint8Array};
use rainway_demo_core::{
    DataChannelMode, InputLevel, LogLevel, PeerId, StreamAnnouncement, StreamId,
};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlElement;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = rainway, js_name = RainwayRuntime)]
    #[derive(Debug, Clone)]
    pub type JsRuntime;

    #[wasm_bindgen(static_method_of = JsRuntime, js_namespace = rainway, js_class = "RainwayRuntime", catch)]
    fn initialize(config: &Object) -> std::result::Result<Promise, JsValue>;

    #[wasm_bindgen(method, js_name = connectToGateway)]
    fn connect_to_gateway(this: &JsRuntime) -> Promise;

    #[wasm_bindgen(method, js_name = disconnectFromGateway)]
    fn disconnect_from_gateway(this: &JsRuntime);

    #[wasm_bindgen(method)]
    fn connect(this: &JsRuntime, peer_id: BigInt) -> Promise;

    #[wasm_bindgen(method, getter, js_name = peerId)]
    fn peer_id(this: &JsRuntime) -> BigInt;

    #[wasm_bindgen(method, js_name = cancelConnectionAttempt)]
    fn cancel_connection_attempt(this: &JsRuntime, peer_id: BigInt);

    #[wasm_bindgen(js_namespace = rainway, js_name = RainwayPeer)]
    #[derive(Debug, Clone)]
    pub type JsPeer;

    #[wasm_bindgen(method, getter, js_name = peerId)]
    fn peer_id(this: &JsPeer) -> BigInt;

    #[wasm_bindgen(method, catch)]
    fn send(this: &JsPeer, channel: &str, data: &Uint8Array)
        -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = createDataChannel)]
    fn create_data_channel(this: &JsPeer, options: &Object) -> Promise;

    #[wasm_bindgen(method, js_name = listStreams)]
    fn list_streams(this: &JsPeer) -> Promise;

    #[wasm_bindgen(method, js_name = requestStream)]
    fn request_stream(this: &JsPeer, input: u32) -> Promise;

    #[wasm_bindgen(method, getter, js_name = readyToStream)]
    fn ready_to_stream(this: &JsPeer) -> Promise;

    #[wasm_bindgen(method)]
    fn disconnect(this: &JsPeer);

    #[wasm_bindgen(js_namespace = rainway, js_name = RainwayStream)]
    #[derive(Debug, Clone)]
    pub type JsStream;

    #[wasm_bindgen(method, getter)]
    fn container(this: &JsStream) -> Option<HtmlElement>;

    #[wasm_bindgen(method, catch, js_name = requestFullscreen)]
    fn request_fullscreen(this: &JsStream) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(method)]
    fn pause(this: &JsStream);

    #[wasm_bindgen(method)]
    fn play(this: &JsStream);

    #[wasm_bindgen(method, js_name = enableVideoStatsOverlay)]
    fn enable_video_stats_overlay(this: &JsStream);

    #[wasm_bindgen(method, js_name = disableVideoStatsOverlay)]
    fn disable_video_stats_overlay(this: &JsStream);

    #[wasm_bindgen(method, js_name = enableGestures)]
    fn enable_gestures(this: &JsStream);

    #[wasm_bindgen(method, js_name = disableGestures)]
    fn disable_gestures(this: &JsStream);

    #[wasm_bindgen(method)]
    fn leave(this: &JsStream);

    #[wasm_bindgen(js_namespace = rainway, js_name = RainwayStreamAnnouncement)]
    #[derive(Debug, Clone)]
    type JsAnnouncement;

    #[wasm_bindgen(method, getter, js_name = streamId)]
    fn stream_id(this: &JsAnnouncement) -> String;

    #[wasm_bindgen(method, getter)]
    fn name(this: &JsAnnouncement) -> Option<String>;

    #[wasm_bindgen(method)]
    fn join(this: &JsAnnouncement, input: u32) -> Promise;

    #[wasm_bindgen(js_namespace = rainway, js_name = RainwayConnectionRequest)]
    #[derive(Debug, Clone)]
    type JsConnectionRequest;

    #[wasm_bindgen(method, getter, js_name = peerId)]
    fn peer_id(this: &JsConnectionRequest) -> BigInt;

    #[wasm_bindgen(method)]
    fn accept(this: &JsConnectionRequest);

    #[wasm_bindgen(method)]
    fn reject(this: &JsConnectionRequest);
}

/// Every SDK callback is registered with the same arity; JS fills the rest with `undefined`
type Callback = Closure<dyn Fn(JsValue, JsValue, JsValue)>;

fn callback(f: impl Fn(JsValue, JsValue, JsValue) + 'static) -> Callback {
    Closure::wrap(Box::new(f) as Box<dyn Fn(JsValue, JsValue, JsValue)>)
}

/// JS objects the SDK hands out more than once, keyed by our ids
///
/// Entries live only while the demo holds them: streams until they are
/// detached or stopped, announcements until their peer goes away.
#[derive(Debug, Default)]
struct Registry {
    streams: RefCell<Vec<(StreamId, JsStream)>>,
    announcements: RefCell<Vec<(PeerId, StreamId, JsAnnouncement)>>,
}

impl Registry {
    /// Stable id of a JS stream object
    fn stream(self: &Rc<Self>, stream: JsStream) -> WebStream {
        let mut streams = self.streams.borrow_mut();
        let id = match streams.iter().find(|(_, s)| Object::is(s, &stream)) {
            Some((id, _)) => *id,
            None => {
                let id = StreamId::new();
                streams.push((id, stream.clone()));
                id
            }
        };
        WebStream {
            id,
            inner: stream,
            registry: Rc::clone(self),
        }
    }

    fn forget_stream(&self, id: StreamId) {
        self.streams.borrow_mut().retain(|(s, _)| *s != id);
    }

    fn announcement(&self, peer_id: PeerId, js: JsAnnouncement) -> StreamAnnouncement {
        let id = uuid::Uuid::parse_str(&js.stream_id())
            .map(StreamId::from_uuid)
            .unwrap_or_else(|_| StreamId::new());
        let announcement = StreamAnnouncement::new(id, js.name());

        let mut known = self.announcements.borrow_mut();
        if !known.iter().any(|(_, s, _)| *s == id) {
            known.push((peer_id, id, js));
        }
        announcement
    }

    fn js_announcement(&self, id: StreamId) -> Option<JsAnnouncement> {
        self.announcements
            .borrow()
            .iter()
            .find(|(_, s, _)| *s == id)
            .map(|(_, _, js)| js.clone())
    }

    fn forget_peer(&self, peer_id: PeerId) {
        self.announcements
            .borrow_mut()
            .retain(|(owner, _, _)| *owner != peer_id);
    }
}

/// Connector for the JS SDK
#[derive(Debug, Clone, Copy, Default)]
pub struct WebConnector;

impl WebConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl Connector for WebConnector {
    type Runtime = WebRuntime;

    async fn initialize(
        &self,
        options: RuntimeOptions,
        handlers: EventHandlers<WebPeer, WebStream>,
    ) -> Result<WebRuntime> {
        let registry = Rc::new(Registry::default());
        let config = Object::new();

        set(&config, "apiKey", &options.api_key.as_str().into())?;
        set(&config, "externalId", &options.external_id.as_str().into())?;
        set(
            &config,
            "minimumLogLevel",
            &log_level_code(options.minimum_log_level).into(),
        )?;

        let callbacks = register_callbacks(&config, handlers, &registry)?;

        let promise = JsRuntime::initialize(&config)
            .map_err(|e| SdkError::Initialization(js_error(e)))?;
        let runtime = JsFuture::from(promise)
            .await
            .map_err(|e| SdkError::Initialization(js_error(e)))?;

        tracing::debug!("Rainway runtime initialized for '{}'", options.external_id);

        Ok(WebRuntime {
            inner: runtime.unchecked_into(),
            registry,
            _callbacks: callbacks,
        })
    }
}

fn register_callbacks(
    config: &Object,
    handlers: EventHandlers<WebPeer, WebStream>,
    registry: &Rc<Registry>,
) -> Result<Vec<Callback>> {
    let EventHandlers {
        on_connection_lost,
        on_connection_request,
        on_peer_message,
        on_peer_error,
        on_peer_connect,
        on_peer_disconnect,
        on_stream_announcement,
        on_stream_stop,
        log_sink,
    } = handlers;

    let mut callbacks = Vec::new();

    callbacks.push((
        "onRuntimeConnectionLost",
        callback(move |error, _, _| on_connection_lost(js_error(error))),
    ));

    callbacks.push((
        "onConnectionRequest",
        callback(move |request, _, _| {
            let request: JsConnectionRequest = request.unchecked_into();
            let Some(peer_id) = peer_id_from(&request.peer_id()) else {
                tracing::warn!("Rejecting connection request with an unreadable peer id");
                request.reject();
                return;
            };
            on_connection_request(ConnectionRequest::new(peer_id, move |accept| {
                if accept {
                    request.accept();
                } else {
                    request.reject();
                }
            }));
        }),
    ));

    callbacks.push((
        "onPeerMessage",
        callback(move |peer, channel, data| {
            let peer: JsPeer = peer.unchecked_into();
            if let Some(peer_id) = peer_id_from(&peer.peer_id()) {
                let channel = channel.as_string().unwrap_or_default();
                on_peer_message(peer_id, channel, Uint8Array::new(&data).to_vec());
            }
        }),
    ));

    callbacks.push((
        "onPeerError",
        callback(move |peer, error, _| {
            let peer: JsPeer = peer.unchecked_into();
            if let Some(peer_id) = peer_id_from(&peer.peer_id()) {
                on_peer_error(peer_id, js_error(error));
            }
        }),
    ));

    {
        let registry = Rc::clone(registry);
        callbacks.push((
            "onPeerConnect",
            callback(move |peer, _, _| {
                if let Some(peer) = WebPeer::wrap(peer.unchecked_into(), Rc::clone(&registry)) {
                    on_peer_connect(peer);
                }
            }),
        ));
    }

    {
        let registry = Rc::clone(registry);
        callbacks.push((
            "onPeerDisconnect",
            callback(move |peer, _, _| {
                let peer: JsPeer = peer.unchecked_into();
                if let Some(peer_id) = peer_id_from(&peer.peer_id()) {
                    registry.forget_peer(peer_id);
                    on_peer_disconnect(peer_id);
                }
            }),
        ));
    }

    {
        let registry = Rc::clone(registry);
        callbacks.push((
            "onStreamAnnouncement",
            callback(move |peer, announcement, _| {
                let peer: JsPeer = peer.unchecked_into();
                if let Some(peer_id) = peer_id_from(&peer.peer_id()) {
                    let announcement =
                        registry.announcement(peer_id, announcement.unchecked_into());
                    on_stream_announcement(peer_id, announcement);
                }
            }),
        ));
    }

    {
        let registry = Rc::clone(registry);
        callbacks.push((
            "onStreamStop",
            callback(move |stream, _, _| {
                let stream = registry.stream(stream.unchecked_into());
                registry.forget_stream(stream.id);
                on_stream_stop(stream);
            }),
        ));
    }

    callbacks.push((
        "logSink",
        callback(move |level, message, _| {
            let level = level
                .as_f64()
                .map(|code| log_level_from_code(code as u32))
                .unwrap_or(LogLevel::Information);
            log_sink(level, message.as_string().unwrap_or_default());
        }),
    ));

    let mut kept = Vec::with_capacity(callbacks.len());
    for (name, closure) in callbacks {
        set(config, name, closure.as_ref())?;
        kept.push(closure);
    }
    Ok(kept)
}

/// Runtime backed by the JS SDK; keeps the registered callbacks alive
pub struct WebRuntime {
    inner: JsRuntime,
    registry: Rc<Registry>,
    _callbacks: Vec<Callback>,
}

impl std::fmt::Debug for WebRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebRuntime")
            .field("peer_id", &peer_id_from(&self.inner.peer_id()))
            .field("callbacks", &self._callbacks.len())
            .finish()
    }
}

#[async_trait(?Send)]
impl Runtime for WebRuntime {
    type Peer = WebPeer;

    async fn connect_to_gateway(&self) -> Result<()> {
        JsFuture::from(self.inner.connect_to_gateway())
            .await
            .map(|_| ())
            .map_err(|e| SdkError::Gateway(js_error(e)))
    }

    fn disconnect_from_gateway(&self) {
        self.inner.disconnect_from_gateway();
    }

    async fn connect(&self, peer_id: PeerId) -> Result<WebPeer> {
        let peer = JsFuture::from(self.inner.connect(BigInt::from(peer_id.as_u64())))
            .await
            .map_err(|e| SdkError::PeerConnection(js_error(e)))?;

        WebPeer::wrap(peer.unchecked_into(), Rc::clone(&self.registry)).ok_or_else(|| {
            SdkError::PeerConnection(format!("Peer {} returned an unreadable id", peer_id))
        })
    }

    fn peer_id(&self) -> PeerId {
        peer_id_from(&self.inner.peer_id()).unwrap_or_else(|| {
            tracing::warn!("Runtime reported an unreadable peer id");
            PeerId::new(0)
        })
    }

    fn cancel_connection_attempt(&self, peer_id: PeerId) {
        self.inner
            .cancel_connection_attempt(BigInt::from(peer_id.as_u64()));
    }
}

#[derive(Debug, Clone)]
pub struct WebPeer {
    peer_id: PeerId,
    inner: JsPeer,
    registry: Rc<Registry>,
}

impl WebPeer {
    fn wrap(inner: JsPeer, registry: Rc<Registry>) -> Option<Self> {
        let peer_id = peer_id_from(&inner.peer_id())?;
        Some(Self {
            peer_id,
            inner,
            registry,
        })
    }

    async fn await_stream(&self, promise: Promise) -> Result<WebStream> {
        let stream = JsFuture::from(promise)
            .await
            .map_err(|e| SdkError::Stream(js_error(e)))?;
        Ok(self.registry.stream(stream.unchecked_into()))
    }
}

#[async_trait(?Send)]
impl PeerHandle for WebPeer {
    type Stream = WebStream;

    fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    fn send(&self, channel: &str, data: &[u8]) -> Result<()> {
        self.inner
            .send(channel, &Uint8Array::from(data))
            .map_err(|e| SdkError::SendFailed(js_error(e)))
    }

    async fn create_data_channel(&self, label: &str, mode: DataChannelMode) -> Result<()> {
        let options = Object::new();
        set(&options, "label", &label.into())?;
        set(&options, "mode", &mode.to_string().into())?;

        JsFuture::from(self.inner.create_data_channel(&options))
            .await
            .map(|_| ())
            .map_err(|e| SdkError::DataChannel(js_error(e)))
    }

    async fn list_streams(&self) -> Result<Vec<StreamAnnouncement>> {
        let list = JsFuture::from(self.inner.list_streams())
            .await
            .map_err(|e| SdkError::Stream(js_error(e)))?;

        Ok(Array::from(&list)
            .iter()
            .map(|js| self.registry.announcement(self.peer_id, js.unchecked_into()))
            .collect())
    }

    async fn request_stream(&self, input: InputLevel) -> Result<WebStream> {
        self.await_stream(self.inner.request_stream(input.bits()))
            .await
    }

    async fn join_stream(
        &self,
        announcement: &StreamAnnouncement,
        input: InputLevel,
    ) -> Result<WebStream> {
        let js = self
            .registry
            .js_announcement(announcement.stream_id)
            .ok_or_else(|| {
                SdkError::Stream(format!("Unknown stream {}", announcement.stream_id))
            })?;
        self.await_stream(js.join(input.bits())).await
    }

    async fn ready_to_stream(&self) -> Result<()> {
        JsFuture::from(self.inner.ready_to_stream())
            .await
            .map(|_| ())
            .map_err(|e| SdkError::Stream(js_error(e)))
    }

    fn disconnect(&self) {
        self.registry.forget_peer(self.peer_id);
        self.inner.disconnect();
    }
}

#[derive(Debug, Clone)]
pub struct WebStream {
    id: StreamId,
    inner: JsStream,
    registry: Rc<Registry>,
}

impl PartialEq for WebStream {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl WebStream {
    /// Element the SDK renders the stream into, if it still has one
    pub fn container(&self) -> Option<HtmlElement> {
        self.inner.container()
    }
}

impl StreamHandle for WebStream {
    fn id(&self) -> StreamId {
        self.id
    }

    fn request_fullscreen(&self) -> Result<()> {
        self.inner
            .request_fullscreen()
            .map_err(|e| SdkError::Stream(js_error(e)))
    }

    fn pause(&self) {
        self.inner.pause();
    }

    fn play(&self) {
        self.inner.play();
    }

    fn set_stats_overlay(&self, enabled: bool) {
        if enabled {
            self.inner.enable_video_stats_overlay();
        } else {
            self.inner.disable_video_stats_overlay();
        }
    }

    fn set_gestures(&self, enabled: bool) {
        if enabled {
            self.inner.enable_gestures();
        } else {
            self.inner.disable_gestures();
        }
    }

    fn detach(&self) {
        self.registry.forget_stream(self.id);
        if let Some(container) = self.inner.container() {
            container.remove();
        }
    }

    fn leave(&self) {
        self.registry.forget_stream(self.id);
        self.inner.leave();
    }
}

fn set(target: &Object, key: &str, value: &JsValue) -> Result<()> {
    Reflect::set(target, &key.into(), value)
        .map(|_| ())
        .map_err(|e| SdkError::Initialization(js_error(e)))
}

fn peer_id_from(value: &BigInt) -> Option<PeerId> {
    let text: String = value.to_string(10).ok()?.into();
    text.parse().ok()
}

/// `"<name>: <message>"` for JS errors, the plain text otherwise
fn js_error(value: JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        let name: String = error.name().into();
        let message: String = error.message().into();
        return format!("{}: {}", name, message);
    }
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}

fn log_level_code(level: LogLevel) -> u32 {
    match level {
        LogLevel::Trace => 0,
        LogLevel::Debug => 1,
        LogLevel::Information => 2,
        LogLevel::Warning => 3,
        LogLevel::Error => 4,
    }
}

fn log_level_from_code(code: u32) -> LogLevel {
    match code {
        0 => LogLevel::Trace,
        1 => LogLevel::Debug,
        2 => LogLevel::Information,
        3 => LogLevel::Warning,
        _ => LogLevel::Error,
    }
}
