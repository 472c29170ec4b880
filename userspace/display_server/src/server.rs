//! Client connections: each client gets an event channel and a thread that
//! answers its requests one at a time.

use crate::backend::DisplayBackend;
use crate::channel::{ClientId, EventChannel, next_client_id};
use crate::error::Result;
use crate::manager::WindowManager;
use crate::rect::Rectangle;
use display_api_types::graphics::ScreenMode;
use display_api_types::window::{MAX_MODES, ModeList, Request, ResponseData, WindowEvent, WindowResponse, WindowResult};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

/// Requests a client may have in flight before `call` blocks.
const REQUEST_QUEUE_DEPTH: usize = 16;

/// Server-side state of one connection.
#[derive(Debug)]
pub struct ClientSession {
    client: ClientId,
    channel: EventChannel,
}

impl ClientSession {
    pub fn connect() -> (Self, Receiver<WindowEvent>) {
        let client = next_client_id();
        let (channel, events) = EventChannel::new(client);
        (Self { client, channel }, events)
    }

    pub fn client(&self) -> ClientId {
        self.client
    }

    pub fn channel(&self) -> &EventChannel {
        &self.channel
    }
}

/// Run one request against the manager. Never fails: errors become result codes.
pub fn dispatch<B: DisplayBackend>(
    manager: &WindowManager<B>,
    session: &ClientSession,
    request: Request,
) -> WindowResponse {
    let kind = request.message_type();
    match handle(manager, session, request) {
        Ok(response) => response,
        Err(err) => {
            log::warn!("client {}: {kind:?} rejected: {err}", session.client);
            WindowResponse::error(err.into())
        }
    }
}

fn handle<B: DisplayBackend>(
    manager: &WindowManager<B>,
    session: &ClientSession,
    request: Request,
) -> Result<WindowResponse> {
    let done = |window| move |()| WindowResponse::window(window);
    match request {
        Request::CreateWindow {
            x,
            y,
            width,
            height,
            style,
            title_bar_height,
            title,
        } => {
            let rect = Rectangle::new(x, y, width, height);
            let id = manager.create_window(session.client, rect, style, title_bar_height, &title)?;
            manager.attach(id, &session.channel)?;
            Ok(WindowResponse::window(id))
        }
        Request::SetActive { window } => manager.set_active(window).map(done(window)),
        Request::DestroyWindow { window } => manager.destroy_window(window).map(done(window)),
        Request::Move {
            window,
            x,
            y,
            finished,
        } => manager.move_window(window, x, y, finished).map(done(window)),
        Request::Resize {
            window,
            x,
            y,
            width,
            height,
            finished,
        } => manager
            .resize_window(window, Rectangle::new(x, y, width, height), finished)
            .map(done(window)),
        Request::Update {
            window,
            x,
            y,
            width,
            height,
        } => manager
            .update(window, Rectangle::new(x, y, width, height))
            .map(done(window)),
        Request::SetMode { width, height, bpp } => manager
            .set_mode(width, height, bpp)
            .map(|mode| WindowResponse::with_data(ResponseData::Mode(mode))),
        Request::AddListener(kind) => {
            manager.add_listener(&session.channel, kind);
            Ok(WindowResponse::OK)
        }
        Request::RemoveListener(kind) => {
            manager.remove_listener(session.channel.id(), kind);
            Ok(WindowResponse::OK)
        }
        Request::GetMode => Ok(WindowResponse::with_data(ResponseData::Mode(manager.mode()))),
        Request::GetModes { max } => Ok(WindowResponse::with_data(mode_list(manager.modes(), max))),
    }
}

fn mode_list(all: Vec<ScreenMode>, max: u32) -> ResponseData {
    if max == 0 {
        return ResponseData::Modes {
            count: all.len() as u32,
            modes: ModeList::new(),
        };
    }
    let modes: ModeList = all.into_iter().take(max as usize).take(MAX_MODES).collect();
    ResponseData::Modes {
        count: modes.len() as u32,
        modes,
    }
}

/// Answer requests until the client hangs up, then tear down what it owned.
pub fn serve<B: DisplayBackend>(
    manager: &WindowManager<B>,
    session: ClientSession,
    requests: Receiver<Request>,
    responses: SyncSender<WindowResponse>,
) {
    log::debug!("client {} connected", session.client);
    for request in requests.iter() {
        let response = dispatch(manager, &session, request);
        if responses.send(response).is_err() {
            break;
        }
    }
    manager.close_events(session.channel.id());
    manager.disconnect(session.client);
}

/// Client end of a connection made with `connect`.
pub struct ClientHandle {
    client: ClientId,
    requests: SyncSender<Request>,
    responses: Receiver<WindowResponse>,
    events: Receiver<WindowEvent>,
}

impl ClientHandle {
    pub fn client(&self) -> ClientId {
        self.client
    }

    pub fn events(&self) -> &Receiver<WindowEvent> {
        &self.events
    }

    /// Send a request and wait for its response. A dead server reads as an
    /// invalid message.
    pub fn call(&self, request: Request) -> WindowResponse {
        if self.requests.send(request).is_err() {
            return WindowResponse::error(WindowResult::ErrorInvalidMessage);
        }
        self.responses
            .recv()
            .unwrap_or(WindowResponse::error(WindowResult::ErrorInvalidMessage))
    }
}

/// Open a connection served by its own thread. Dropping the handle closes it.
pub fn connect<B>(manager: Arc<WindowManager<B>>) -> std::io::Result<(ClientHandle, JoinHandle<()>)>
where
    B: DisplayBackend + 'static,
{
    let (session, events) = ClientSession::connect();
    let client = session.client;
    let (request_tx, request_rx) = mpsc::sync_channel(REQUEST_QUEUE_DEPTH);
    let (response_tx, response_rx) = mpsc::sync_channel(REQUEST_QUEUE_DEPTH);
    let thread = thread::Builder::new()
        .name(format!("client-{client}"))
        .spawn(move || serve(&manager, session, request_rx, response_tx))?;
    let handle = ClientHandle {
        client,
        requests: request_tx,
        responses: response_rx,
        events,
    };
    Ok((handle, thread))
}
