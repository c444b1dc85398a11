//! WebAssembly entry point and DOM bindings.

use crate::{ElementIds, TargetWindow, WebOptions};
use kurbo::{Point, Size};
use signpad_core::{
    BoxFuture, Control, DEFAULT_QUALITY, EventResult, FormRequest, FormSource, HostBindings,
    HostTarget, ImageField, ImageFormat, Listener, PointerEvent, SaveOutcome, SignPadError,
    SignPadResult, SignatureEventType, SignaturePad, SurfaceElement, Transport, TransportResponse,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, Event, EventTarget, FormData, HtmlCanvasElement,
    HtmlFormElement, HtmlInputElement, ImageData, Request, RequestInit, Response, UrlSearchParams,
    Window,
};

fn js_error_message(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn to_js_error(error: SignPadError) -> JsValue {
    js_sys::Error::new(&error.to_string()).into()
}

// --- Host bindings -----------------------------------------------------------

struct CanvasSurface {
    canvas: HtmlCanvasElement,
}

impl SurfaceElement for CanvasSurface {
    fn has_2d_context(&self) -> bool {
        matches!(self.canvas.get_context("2d"), Ok(Some(_)))
    }

    fn css_size(&self) -> Size {
        let width = self.canvas.offset_width() as f64;
        let height = self.canvas.offset_height() as f64;
        Size::new(width, height)
    }

    fn device_pixel_ratio(&self) -> f64 {
        web_sys::window()
            .map(|w| w.device_pixel_ratio())
            .unwrap_or(1.0)
    }
}

struct HiddenField(HtmlInputElement);

impl ImageField for HiddenField {
    fn set_value(&self, value: &str) {
        self.0.set_value(value);
    }
}

struct SignatureForm(HtmlFormElement);

impl FormSource for SignatureForm {
    fn fields(&self) -> Vec<(String, String)> {
        let Ok(data) = FormData::new_with_form(&self.0) else {
            return Vec::new();
        };
        let Ok(Some(entries)) = js_sys::try_iter(&data) else {
            return Vec::new();
        };

        // File inputs have no string value and are not submitted.
        entries
            .flatten()
            .filter_map(|entry| {
                let pair = entry.dyn_into::<js_sys::Array>().ok()?;
                Some((pair.get(0).as_string()?, pair.get(1).as_string()?))
            })
            .collect()
    }
}

struct Button(Element);

impl Control for Button {
    fn set_disabled(&self, disabled: bool) {
        if let Err(e) = self.0.toggle_attribute_with_force("disabled", disabled) {
            log::warn!("could not toggle {}: {}", self.0.id(), js_error_message(&e));
        }
    }
}

/// Posts the form with `fetch`.
struct FetchTransport;

impl Transport for FetchTransport {
    fn post_form(&self, request: FormRequest) -> BoxFuture<'_, SignPadResult<TransportResponse>> {
        Box::pin(async move {
            let js = |e: JsValue| SignPadError::Transport(js_error_message(&e));

            let window = web_sys::window().ok_or(SignPadError::ClientUnavailable)?;
            let params = UrlSearchParams::new().map_err(js)?;
            for (name, value) in &request.fields {
                params.append(name, value);
            }

            let init = RequestInit::new();
            init.set_method("POST");
            init.set_body(&params.into());
            let fetch_request = Request::new_with_str_and_init(&request.url, &init).map_err(js)?;

            let response: Response = JsFuture::from(window.fetch_with_request(&fetch_request))
                .await
                .map_err(js)?
                .dyn_into()
                .map_err(js)?;
            let status = response.status();
            let body = JsFuture::from(response.text().map_err(js)?)
                .await
                .map_err(js)?;

            log::debug!("POST {} -> {}", request.url, status);
            Ok(TransportResponse {
                status,
                body: body.as_string().unwrap_or_default(),
            })
        })
    }
}

// --- Listener ----------------------------------------------------------------

/// A script listener: a function, or an object with `onSignaturePadEvent`.
struct JsListener {
    this: JsValue,
    function: js_sys::Function,
}

impl JsListener {
    fn from_js(value: &JsValue) -> SignPadResult<Self> {
        if value.is_object() {
            let method = js_sys::Reflect::get(value, &JsValue::from_str("onSignaturePadEvent"))
                .unwrap_or(JsValue::UNDEFINED);
            if let Ok(function) = method.dyn_into::<js_sys::Function>() {
                return Ok(Self {
                    this: value.clone(),
                    function,
                });
            }
        }
        match value.dyn_ref::<js_sys::Function>() {
            Some(function) => Ok(Self {
                this: JsValue::NULL,
                function: function.clone(),
            }),
            None => Err(SignPadError::InvalidListener),
        }
    }

    fn call(
        &self,
        window: Option<&Window>,
        event_type: SignatureEventType,
        result: &EventResult,
    ) {
        let payload = match serde_wasm_bindgen::to_value(result) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("could not convert signature event: {e}");
                return;
            }
        };
        if let Some(target) = window.and_then(|w| resolve_target(w, &result.target)) {
            let _ = js_sys::Reflect::set(&payload, &JsValue::from_str("target"), &target);
        }
        let event_type = JsValue::from_str(event_type.as_str());
        if let Err(e) = self.function.call2(&self.this, &event_type, &payload) {
            log::error!("signature listener threw: {}", js_error_message(&e));
        }
    }
}

fn resolve_target(window: &Window, target: &HostTarget) -> Option<JsValue> {
    match target.name() {
        "parent" => window.parent().ok().flatten().map(Into::into),
        _ => Some(window.clone().into()),
    }
}

type EventQueue = Rc<RefCell<VecDeque<(SignatureEventType, EventResult)>>>;

// --- Widget ------------------------------------------------------------------

/// Keeps a DOM listener registered for as long as it lives.
struct DomHandler {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl DomHandler {
    fn attach(
        target: &EventTarget,
        kind: &'static str,
        f: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let closure = Closure::wrap(Box::new(f) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            kind,
            closure,
        })
    }
}

impl Drop for DomHandler {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

/// State shared between the JS-facing object and its DOM handlers.
struct Shared {
    pad: RefCell<SignaturePad>,
    canvas: RefCell<Option<HtmlCanvasElement>>,
    events: EventQueue,
    listener: RefCell<Option<Rc<JsListener>>>,
}

impl Shared {
    /// Run `f` on the pad, repaint, then deliver queued events.
    ///
    /// Listeners run after the pad borrow is released so they may call back
    /// into the widget.
    fn with_pad<R>(&self, f: impl FnOnce(&mut SignaturePad) -> R) -> R {
        let out = f(&mut *self.pad.borrow_mut());
        self.present();
        self.flush_events();
        out
    }

    fn present(&self) {
        let canvas = self.canvas.borrow();
        let Some(canvas) = canvas.as_ref() else {
            return;
        };
        let pad = self.pad.borrow();
        let Some(surface) = pad.surface() else {
            return;
        };

        let raster = surface.raster();
        if canvas.width() != raster.width() || canvas.height() != raster.height() {
            canvas.set_width(raster.width());
            canvas.set_height(raster.height());
        }
        let Some(context) = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
        else {
            return;
        };
        let image = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(raster.pixels()),
            raster.width(),
            raster.height(),
        );
        match image {
            Ok(image) => {
                if let Err(e) = context.put_image_data(&image, 0.0, 0.0) {
                    log::warn!("could not paint signature: {}", js_error_message(&e));
                }
            }
            Err(e) => log::warn!("could not build image data: {}", js_error_message(&e)),
        }
    }

    fn flush_events(&self) {
        let window = web_sys::window();
        loop {
            let Some((event_type, result)) = self.events.borrow_mut().pop_front() else {
                break;
            };
            let listener = self.listener.borrow().clone();
            if let Some(listener) = listener {
                listener.call(window.as_ref(), event_type, &result);
            }
        }
    }
}

fn pointer_event(kind: &str, event: &web_sys::PointerEvent) -> Option<PointerEvent> {
    if !event.is_primary() {
        return None;
    }
    let pointer_id = event.pointer_id();
    let position = Point::new(event.offset_x() as f64, event.offset_y() as f64);
    let time_ms = event.time_stamp();
    match kind {
        "pointerdown" if event.button() == 0 => Some(PointerEvent::Down {
            pointer_id,
            position,
            time_ms,
        }),
        "pointermove" => Some(PointerEvent::Move {
            pointer_id,
            position,
            time_ms,
        }),
        "pointerup" => Some(PointerEvent::Up {
            pointer_id,
            position,
            time_ms,
        }),
        "pointercancel" => Some(PointerEvent::Cancel { pointer_id }),
        _ => None,
    }
}

fn element_by_id<T: JsCast>(document: &Document, id: &str) -> Option<T> {
    document.get_element_by_id(id)?.dyn_into::<T>().ok()
}

/// Signature pad bound to a `<canvas>` on the current page.
#[wasm_bindgen]
pub struct WebSignaturePad {
    shared: Rc<Shared>,
    handlers: Vec<DomHandler>,
}

#[wasm_bindgen]
impl WebSignaturePad {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebSignaturePad {
        Self {
            shared: Rc::new(Shared {
                pad: RefCell::new(SignaturePad::default()),
                canvas: RefCell::new(None),
                events: Rc::new(RefCell::new(VecDeque::new())),
                listener: RefCell::new(None),
            }),
            handlers: Vec::new(),
        }
    }

    /// Bind to the canvas with id `canvas_id`.
    ///
    /// `listener` is a function `(eventType, result)` or an object with an
    /// `onSignaturePadEvent` method; anything else is ignored. `options` is
    /// an optional plain object (see `WebOptions`).
    pub fn prepare(
        &mut self,
        canvas_id: &str,
        listener: JsValue,
        options: JsValue,
    ) -> Result<(), JsValue> {
        let options: WebOptions = if options.is_undefined() || options.is_null() {
            WebOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options)
                .map_err(|e| to_js_error(SignPadError::Config(e.to_string())))?
        };

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas: HtmlCanvasElement = element_by_id(&document, canvas_id).ok_or_else(|| {
            let reason = format!("no <canvas> with id {canvas_id:?}");
            to_js_error(SignPadError::InvalidSurface(reason))
        })?;

        let listener = if listener.is_undefined() || listener.is_null() {
            None
        } else {
            match JsListener::from_js(&listener) {
                Ok(listener) => Some(Rc::new(listener)),
                Err(e) => {
                    log::warn!("{e}; signature events will not be delivered");
                    None
                }
            }
        };

        let host = bind_host(&document, &options.elements, options.target);
        let events = self.shared.events.clone();
        let queue = Listener::callback(move |t, r| events.borrow_mut().push_back((t, r.clone())));

        let surface = Rc::new(CanvasSurface {
            canvas: canvas.clone(),
        });
        let mut pad = SignaturePad::new(options.config);
        pad.initialize(surface, host, Some(queue))
            .map_err(to_js_error)?;

        self.handlers.clear();
        self.shared.events.borrow_mut().clear();
        *self.shared.pad.borrow_mut() = pad;
        *self.shared.canvas.borrow_mut() = Some(canvas.clone());
        *self.shared.listener.borrow_mut() = listener;
        self.shared.present();

        self.attach_handlers(&window, &document, &canvas, &options.elements)?;
        log::info!("signature pad ready on #{canvas_id}");
        Ok(())
    }

    /// Post the signature. Resolves once the listener has been told the outcome.
    pub fn save(
        &self,
        context_path: String,
        request_id_key: String,
        preview_url: String,
        stored_url_prefix: String,
    ) -> js_sys::Promise {
        let shared = self.shared.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            let prepared = shared.with_pad(|pad| {
                pad.prepare_save(
                    &context_path,
                    &request_id_key,
                    &preview_url,
                    &stored_url_prefix,
                )
            });
            let outcome = match prepared {
                Ok(pending) => pending.send().await,
                Err(e) => SaveOutcome::from(e),
            };
            shared.with_pad(|pad| pad.complete_save(outcome));
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn clear(&self) {
        self.shared.with_pad(SignaturePad::clear);
    }

    #[wasm_bindgen(js_name = isSignatureEmpty)]
    pub fn is_signature_empty(&self) -> bool {
        self.shared.pad.borrow().is_signature_empty()
    }

    /// `data:` URL of the signature, or `null` before `prepare`.
    #[wasm_bindgen(js_name = getSignatureDataUrl)]
    pub fn signature_data_url(
        &self,
        mime_type: Option<String>,
        quality: Option<f32>,
    ) -> Option<String> {
        let format = mime_type
            .as_deref()
            .map(ImageFormat::from_mime_type)
            .unwrap_or_default();
        let quality = quality.unwrap_or(DEFAULT_QUALITY);
        self.shared.pad.borrow().signature_data_url(format, quality)
    }
}

impl Default for WebSignaturePad {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSignaturePad {
    fn attach_handlers(
        &mut self,
        window: &Window,
        document: &Document,
        canvas: &HtmlCanvasElement,
        ids: &ElementIds,
    ) -> Result<(), JsValue> {
        for kind in ["pointerdown", "pointermove", "pointerup", "pointercancel"] {
            let shared = self.shared.clone();
            let target = canvas.clone();
            self.handlers.push(DomHandler::attach(canvas, kind, move |event: Event| {
                let Some(event) = event.dyn_ref::<web_sys::PointerEvent>() else {
                    return;
                };
                let Some(pointer) = pointer_event(kind, event) else {
                    return;
                };
                match pointer {
                    PointerEvent::Down { pointer_id, .. } => {
                        let _ = target.set_pointer_capture(pointer_id);
                        event.prevent_default();
                    }
                    PointerEvent::Up { pointer_id, .. } | PointerEvent::Cancel { pointer_id } => {
                        let _ = target.release_pointer_capture(pointer_id);
                    }
                    PointerEvent::Move { .. } => {}
                }
                shared.with_pad(|pad| pad.handle_pointer(pointer));
            })?);
        }

        let shared = self.shared.clone();
        self.handlers.push(DomHandler::attach(window, "resize", move |_| {
            shared.with_pad(SignaturePad::resize);
        })?);

        if let Some(clear) = document.get_element_by_id(&ids.clear_button) {
            let shared = self.shared.clone();
            self.handlers.push(DomHandler::attach(&clear, "click", move |event: Event| {
                event.prevent_default();
                shared.with_pad(SignaturePad::clear);
            })?);
        }
        Ok(())
    }
}

fn bind_host(document: &Document, ids: &ElementIds, target: TargetWindow) -> HostBindings {
    let mut host = HostBindings::new(HostTarget::new(target.as_str()))
        .with_transport(Rc::new(FetchTransport));

    match element_by_id::<HtmlInputElement>(document, &ids.image_field) {
        Some(field) => host = host.with_image_field(Rc::new(HiddenField(field))),
        None => log::warn!("no #{} input; saving will fail", ids.image_field),
    }
    match element_by_id::<HtmlFormElement>(document, &ids.form) {
        Some(form) => host = host.with_form(Rc::new(SignatureForm(form))),
        None => log::warn!("no #{} form; saving will fail", ids.form),
    }
    if let Some(save) = document.get_element_by_id(&ids.save_button) {
        host = host.with_save_control(Rc::new(Button(save)));
    }
    if let Some(clear) = document.get_element_by_id(&ids.clear_button) {
        host = host.with_clear_control(Rc::new(Button(clear)));
    }
    host
}

/// Initialize logging when the module loads.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"SignPad: logger already initialized".into());
    }
    log::info!("SignPad loaded");
}
