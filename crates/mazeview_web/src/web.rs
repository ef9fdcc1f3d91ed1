use std::cell::RefCell;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::rc::{Rc, Weak};
use std::time::Duration;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, CloseEvent, Document, Element, HtmlButtonElement,
    HtmlCanvasElement, HtmlInputElement, KeyboardEvent, MessageEvent, WebSocket,
};

use mazeview::prelude::*;
use mazeview::control::{SPEED_MAX, SPEED_MIN, SPEED_STEP};
use url::Url;

const CANVAS_ID: &str = "game";
const STATUS_ID: &str = "status";
const SCORE_ID: &str = "score";

thread_local! {
    // Keeps the host alive for the lifetime of the page.
    static HOST: RefCell<Option<Rc<RefCell<Host>>>> = const { RefCell::new(None) };
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

// ═══════════════════════════════════════════════════════════════════════════
// Host slot: how callbacks find their way back to the host
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Clone, Default)]
struct HostSlot(Rc<RefCell<Weak<RefCell<Host>>>>);

impl HostSlot {
    fn bind(&self, host: &Rc<RefCell<Host>>) {
        *self.0.borrow_mut() = Rc::downgrade(host);
    }

    fn with(&self, f: impl FnOnce(&mut Host)) {
        let weak = self.0.borrow().clone();
        let Some(host) = weak.upgrade() else {
            return;
        };
        // Browser callbacks never nest, so a failed borrow means teardown.
        if let Ok(mut host) = host.try_borrow_mut() {
            f(&mut host);
        };
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Canvas surface
// ═══════════════════════════════════════════════════════════════════════════

struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
}

impl CanvasSurface {
    fn from_canvas(canvas: &HtmlCanvasElement) -> Result<Self, SurfaceError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|_| SurfaceError::Unavailable("canvas: get_context threw".to_string()))?
            .ok_or_else(|| SurfaceError::Unavailable("canvas: missing 2d context".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| SurfaceError::Unavailable("canvas: context is not 2d".to_string()))?;
        Ok(Self {
            ctx,
            width: canvas.width() as f64,
            height: canvas.height() as f64,
        })
    }
}

fn draw_err(e: JsValue) -> SurfaceError {
    SurfaceError::Draw(format!("{:?}", e))
}

#[allow(deprecated)]
impl Surface for CanvasSurface {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba) -> Result<(), SurfaceError> {
        self.ctx.set_fill_style(&JsValue::from_str(&color.css()));
        self.ctx.fill_rect(x, y, w, h);
        Ok(())
    }

    fn stroke_rect(
        &mut self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        color: Rgba,
        line_width: f64,
    ) -> Result<(), SurfaceError> {
        self.ctx.set_stroke_style(&JsValue::from_str(&color.css()));
        self.ctx.set_line_width(line_width);
        self.ctx.stroke_rect(x, y, w, h);
        Ok(())
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, r: f64, color: Rgba) -> Result<(), SurfaceError> {
        self.ctx.set_fill_style(&JsValue::from_str(&color.css()));
        self.ctx.begin_path();
        self.ctx.arc(cx, cy, r, 0.0, PI * 2.0).map_err(draw_err)?;
        self.ctx.fill();
        Ok(())
    }

    fn line(
        &mut self,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        color: Rgba,
        line_width: f64,
    ) -> Result<(), SurfaceError> {
        self.ctx.set_stroke_style(&JsValue::from_str(&color.css()));
        self.ctx.set_line_width(line_width);
        self.ctx.begin_path();
        self.ctx.move_to(x0, y0);
        self.ctx.line_to(x1, y1);
        self.ctx.stroke();
        Ok(())
    }

    fn text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        font: Font,
        align: TextAlign,
        color: Rgba,
    ) -> Result<(), SurfaceError> {
        self.ctx.set_font(&font.css());
        self.ctx.set_text_align(match align {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
        });
        self.ctx.set_fill_style(&JsValue::from_str(&color.css()));
        self.ctx.fill_text(text, x, y).map_err(draw_err)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// WebSocket transport
// ═══════════════════════════════════════════════════════════════════════════

struct Socket {
    ws: WebSocket,
    _on_open: Closure<dyn FnMut(web_sys::Event)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_error: Closure<dyn FnMut(web_sys::Event)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
}

impl Socket {
    fn detach(&self) {
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onerror(None);
        self.ws.set_onclose(None);
    }
}

struct WebTransport {
    slot: HostSlot,
    sockets: HashMap<ConnectionId, Socket>,
}

impl WebTransport {
    fn new(slot: HostSlot) -> Self {
        Self {
            slot,
            sockets: HashMap::new(),
        }
    }
}

impl Transport for WebTransport {
    fn open(&mut self, id: ConnectionId, url: &Url) -> Result<(), TransportError> {
        // Sockets that closed on their own are done with.
        self.sockets
            .retain(|_, s| s.ws.ready_state() != WebSocket::CLOSED);

        let ws = WebSocket::new(url.as_str()).map_err(|e| TransportError::Open(format!("{:?}", e)))?;

        let slot = self.slot.clone();
        let on_open = Closure::wrap(Box::new(move |_e: web_sys::Event| {
            slot.with(|h| h.on_socket(id, SocketEvent::Opened));
        }) as Box<dyn FnMut(web_sys::Event)>);

        let slot = self.slot.clone();
        let on_message = Closure::wrap(Box::new(move |e: MessageEvent| {
            // Only text frames carry protocol messages.
            if let Some(text) = e.data().as_string() {
                slot.with(|h| h.on_socket(id, SocketEvent::Message(text)));
            }
        }) as Box<dyn FnMut(MessageEvent)>);

        let slot = self.slot.clone();
        let on_error = Closure::wrap(Box::new(move |_e: web_sys::Event| {
            slot.with(|h| h.on_socket(id, SocketEvent::Error("websocket error".to_string())));
        }) as Box<dyn FnMut(web_sys::Event)>);

        let slot = self.slot.clone();
        let on_close = Closure::wrap(Box::new(move |e: CloseEvent| {
            let event = SocketEvent::Closed {
                code: Some(e.code()),
                reason: e.reason(),
            };
            slot.with(|h| h.on_socket(id, event));
        }) as Box<dyn FnMut(CloseEvent)>);

        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        self.sockets.insert(
            id,
            Socket {
                ws,
                _on_open: on_open,
                _on_message: on_message,
                _on_error: on_error,
                _on_close: on_close,
            },
        );
        Ok(())
    }

    fn send_text(&mut self, id: ConnectionId, text: &str) -> Result<(), TransportError> {
        let socket = self.sockets.get(&id).ok_or(TransportError::NotOpen)?;
        socket
            .ws
            .send_with_str(text)
            .map_err(|e| TransportError::Send(format!("{:?}", e)))
    }

    fn close(&mut self, id: ConnectionId) {
        if let Some(socket) = self.sockets.remove(&id) {
            socket.detach();
            let _ = socket.ws.close();
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// setTimeout scheduler
// ═══════════════════════════════════════════════════════════════════════════

struct TimeoutScheduler {
    slot: HostSlot,
}

impl Scheduler for TimeoutScheduler {
    fn schedule(&mut self, delay: Duration, task: Task) {
        let Some(window) = web_sys::window() else {
            web_sys::console::error_1(&"no window; dropping timer".into());
            return;
        };
        let slot = self.slot.clone();
        let cb = Closure::once_into_js(move || slot.with(|h| h.on_timer(task)));
        let ms = delay.as_millis().min(i32::MAX as u128) as i32;
        if window
            .set_timeout_with_callback_and_timeout_and_arguments_0(cb.unchecked_ref::<js_sys::Function>(), ms)
            .is_err()
        {
            web_sys::console::error_1(&"setTimeout failed".into());
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Control panel
// ═══════════════════════════════════════════════════════════════════════════

struct Panel {
    status: Option<Element>,
    score: Option<Element>,
    control: HtmlButtonElement,
    grid: HtmlButtonElement,
    slider: HtmlInputElement,
    speed: Element,
}

impl Panel {
    fn build(document: &Document) -> Result<Self, JsValue> {
        let body = document.body().ok_or("document has no body")?;

        let panel = document.create_element("div")?;
        panel.set_class_name("control-panel");

        let control = document
            .create_element("button")?
            .dyn_into::<HtmlButtonElement>()?;
        panel.append_child(&control)?;

        let label = document.create_element("label")?;
        label.set_text_content(Some("Game Speed: "));
        let slider = document
            .create_element("input")?
            .dyn_into::<HtmlInputElement>()?;
        slider.set_type("range");
        slider.set_min(&SPEED_MIN.to_string());
        slider.set_max(&SPEED_MAX.to_string());
        slider.set_step(&SPEED_STEP.to_string());
        let speed = document.create_element("span")?;
        label.append_child(&slider)?;
        label.append_child(&speed)?;
        panel.append_child(&label)?;

        let grid = document
            .create_element("button")?
            .dyn_into::<HtmlButtonElement>()?;
        panel.append_child(&grid)?;
        body.append_child(&panel)?;

        let help = document.create_element("div")?;
        help.set_class_name("help-text");
        help.set_text_content(Some(HELP_TEXT));
        body.append_child(&help)?;

        Ok(Self {
            status: document.get_element_by_id(STATUS_ID),
            score: document.get_element_by_id(SCORE_ID),
            control,
            grid,
            slider,
            speed,
        })
    }

    fn refresh<T: Transport>(&self, client: &MazeClient<T>) {
        let controls = client.controls();
        if let Some(status) = &self.status {
            status.set_text_content(Some(client.status().status()));
        }
        if let Some(score) = &self.score {
            score.set_text_content(Some(client.status().score()));
        }
        self.control
            .set_text_content(Some(controls.control_button_label()));
        self.grid.set_text_content(Some(controls.grid_button_label()));
        self.speed.set_text_content(Some(&controls.speed_label()));
        let value = format!("{:.1}", controls.speed());
        if self.slider.value() != value {
            self.slider.set_value(&value);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Host
// ═══════════════════════════════════════════════════════════════════════════

struct Host {
    client: MazeClient<WebTransport>,
    surface: CanvasSurface,
    sched: TimeoutScheduler,
    panel: Panel,
}

impl Host {
    fn on_socket(&mut self, id: ConnectionId, event: SocketEvent) {
        self.client
            .handle_socket_event(id, event, &mut self.sched);
        self.panel.refresh(&self.client);
    }

    fn on_timer(&mut self, task: Task) {
        self.client
            .run_task(task, &mut self.surface, &mut self.sched);
        if task == Task::Reconnect {
            self.panel.refresh(&self.client);
        }
    }

    fn on_key(&mut self, event: &KeyboardEvent) {
        let disposition = self.client.handle_key(Key::from_code(&event.code()));
        if disposition.suppress_default() {
            event.prevent_default();
        }
    }
}

fn listen(
    target: &web_sys::EventTarget,
    kind: &str,
    handler: impl FnMut(web_sys::Event) + 'static,
) -> Result<(), JsValue> {
    let cb = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web_sys::Event)>);
    target.add_event_listener_with_callback(kind, cb.as_ref().unchecked_ref())?;
    // Listeners live as long as the page.
    cb.forget();
    Ok(())
}

fn wire(document: &Document, slot: &HostSlot, panel: &Panel) -> Result<(), JsValue> {
    let s = slot.clone();
    listen(document, "keydown", move |e: web_sys::Event| {
        if let Ok(e) = e.dyn_into::<KeyboardEvent>() {
            s.with(|h| h.on_key(&e));
        }
    })?;

    let s = slot.clone();
    listen(&panel.control, "click", move |_e: web_sys::Event| {
        s.with(|h| {
            h.client.toggle_control_mode();
            h.panel.refresh(&h.client);
        });
    })?;

    let s = slot.clone();
    listen(&panel.grid, "click", move |_e: web_sys::Event| {
        s.with(|h| {
            h.client.toggle_grid();
            h.panel.refresh(&h.client);
        });
    })?;

    let s = slot.clone();
    let slider = panel.slider.clone();
    listen(&panel.slider, "input", move |_e: web_sys::Event| {
        let Ok(value) = slider.value().parse::<f64>() else {
            return;
        };
        s.with(|h| {
            h.client.set_speed(value);
            h.panel.refresh(&h.client);
        });
    })?;

    Ok(())
}

/// Build the client against the page's `#game` canvas and start both loops.
pub fn start() -> Result<(), JsValue> {
    let result = boot();
    if let Err(e) = &result {
        web_sys::console::error_2(&"mazeview failed to start:".into(), e);
    }
    result
}

fn boot() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;

    let canvas = document
        .get_element_by_id(CANVAS_ID)
        .ok_or("canvas element not found")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| "#game is not a canvas")?;
    let surface = CanvasSurface::from_canvas(&canvas).map_err(js_err)?;

    let config = ClientConfig {
        server_url: window.location().href()?,
        ..ClientConfig::default()
    };

    let slot = HostSlot::default();
    let client = MazeClient::new(config, WebTransport::new(slot.clone())).map_err(js_err)?;
    let panel = Panel::build(&document)?;
    wire(&document, &slot, &panel)?;

    let host = Rc::new(RefCell::new(Host {
        client,
        surface,
        sched: TimeoutScheduler { slot: slot.clone() },
        panel,
    }));
    slot.bind(&host);

    {
        let mut guard = host.borrow_mut();
        let h = &mut *guard;
        h.client.start(&h.surface, &mut h.sched).map_err(js_err)?;
        h.panel.refresh(&h.client);
    }

    HOST.with(|cell| *cell.borrow_mut() = Some(host));
    Ok(())
}
