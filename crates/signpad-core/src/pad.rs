//! The signature pad widget.

use crate::config::SignPadConfig;
use crate::error::{SignPadError, SignPadResult};
use crate::event::{EventData, SignatureEventType};
use crate::format::{ImageFormat, to_data_url};
use crate::host::{HostBindings, SurfaceElement};
use crate::input::{PointerEvent, StrokeAction, StrokeTracker};
use crate::listener::Listener;
use crate::session::{PadState, SavedSignature, SignatureSession};
use crate::surface::SignatureSurface;
use crate::transport::{FormRequest, Transport};
use std::rc::Rc;

/// Captures a signature, tracks whether it is saved, and persists it.
///
/// A pad starts uninitialized: it has no surface, reports itself empty and
/// cannot export or save. [`SignaturePad::initialize`] binds it to a drawing
/// surface, the host page and an optional listener. Every state change is
/// reflected on the host controls first and then reported to the listener.
pub struct SignaturePad {
    config: SignPadConfig,
    element: Option<Rc<dyn SurfaceElement>>,
    surface: Option<SignatureSurface>,
    tracker: StrokeTracker,
    session: SignatureSession,
    host: HostBindings,
    listener: Option<Listener>,
}

impl SignaturePad {
    /// Create an uninitialized pad.
    pub fn new(config: SignPadConfig) -> Self {
        Self {
            config,
            element: None,
            surface: None,
            tracker: StrokeTracker::new(),
            session: SignatureSession::new(),
            host: HostBindings::default(),
            listener: None,
        }
    }

    /// Bind the pad to a drawing surface, host page and listener.
    ///
    /// The surface is sized to the element at its device pixel ratio and
    /// starts empty. No event is emitted. Re-initializing discards the
    /// previous surface and session.
    pub fn initialize(
        &mut self,
        element: Rc<dyn SurfaceElement>,
        host: HostBindings,
        listener: Option<Listener>,
    ) -> SignPadResult<()> {
        if !element.has_2d_context() {
            return Err(SignPadError::InvalidSurface(
                "no 2d drawing context".to_string(),
            ));
        }
        let size = element.css_size();
        let usable = |v: f64| v.is_finite() && v >= 0.0;
        if !(usable(size.width) && usable(size.height)) {
            let reason = format!("unusable size {size:?}");
            return Err(SignPadError::InvalidSurface(reason));
        }

        let style = self.config.options.resolve()?;
        let surface = SignatureSurface::new(style, size, element.device_pixel_ratio())?;
        self.surface = Some(surface);
        self.element = Some(element);
        self.tracker.reset();
        self.session = SignatureSession::new();
        if listener.is_none() {
            log::debug!("signature pad initialized without a listener");
        }
        self.host = host;
        self.listener = listener;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.surface.is_some()
    }

    pub fn config(&self) -> &SignPadConfig {
        &self.config
    }

    pub fn session(&self) -> &SignatureSession {
        &self.session
    }

    pub fn state(&self) -> PadState {
        self.session.state()
    }

    pub fn surface(&self) -> Option<&SignatureSurface> {
        self.surface.as_ref()
    }

    /// Feed a pointer event. Returns true if it completed a stroke.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };

        let committed = match self.tracker.handle(event) {
            Some(StrokeAction::Begin { position, time_ms }) => {
                surface.begin_stroke(position, time_ms);
                false
            }
            Some(StrokeAction::Extend { position, time_ms }) => {
                surface.extend_stroke(position, time_ms);
                false
            }
            Some(StrokeAction::End { position, time_ms }) => {
                surface.extend_stroke(position, time_ms);
                surface.end_stroke()
            }
            Some(StrokeAction::Finish) => surface.end_stroke(),
            None => false,
        };

        if committed {
            self.on_stroke_end();
        }
        committed
    }

    /// A stroke was committed: stash the image and report `DRAW`.
    fn on_stroke_end(&mut self) {
        let Some(surface) = self.surface.as_ref() else {
            return;
        };

        let image = match surface.encode(self.config.export_format, 1.0) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("could not encode signature after stroke: {e}");
                None
            }
        };
        if let (Some(field), Some(bytes)) = (&self.host.image_field, &image) {
            field.set_value(&to_data_url(self.config.export_format, bytes));
        }

        self.session.mark_stroke(image);
        self.notify(EventData::draw());
    }

    /// Erase the signature and report `CLEAR`. Does nothing before initialization.
    pub fn clear(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        surface.clear();
        self.tracker.reset();
        self.session.mark_cleared();
        self.notify(EventData::clear());
    }

    /// Re-read the element size and pixel ratio.
    ///
    /// The surface is cleared as a side effect; no event is emitted and the
    /// session flags are left as they were. A size the surface cannot hold is
    /// logged and ignored, keeping the current surface.
    pub fn resize(&mut self) {
        let (Some(element), Some(surface)) = (&self.element, self.surface.as_mut()) else {
            return;
        };
        let (size, ratio) = (element.css_size(), element.device_pixel_ratio());
        if let Err(e) = surface.resize(size, ratio) {
            log::warn!("signature surface not resized: {e}");
            return;
        }
        self.tracker.reset();
        log::debug!(
            "signature surface resized to {:?} at {}x",
            surface.css_size(),
            surface.ratio()
        );
    }

    /// True iff nothing was drawn since the last clear, resize or initialization.
    pub fn is_signature_empty(&self) -> bool {
        self.surface.as_ref().is_none_or(SignatureSurface::is_empty)
    }

    /// Current raster as a `data:` URL, or `None` before initialization.
    pub fn signature_data_url(&self, format: ImageFormat, quality: f32) -> Option<String> {
        let surface = self.surface.as_ref()?;
        match surface.to_data_url(format, quality) {
            Ok(url) => Some(url),
            Err(e) => {
                log::error!("could not export signature: {e}");
                None
            }
        }
    }

    /// Persist the signature.
    ///
    /// Makes exactly one request. The result is only reported through the
    /// listener: `SAVE` on success, a `DRAW` event carrying `error` otherwise.
    pub async fn save(
        &mut self,
        endpoint_base: &str,
        request_id_key: &str,
        preview_image_url: &str,
        stored_image_url_prefix: &str,
    ) {
        let outcome = match self.prepare_save(
            endpoint_base,
            request_id_key,
            preview_image_url,
            stored_image_url_prefix,
        ) {
            Ok(pending) => pending.send().await,
            Err(e) => SaveOutcome::Failed(e),
        };
        self.complete_save(outcome);
    }

    /// First half of [`SignaturePad::save`]: capture the image and build the request.
    ///
    /// Hosts that share the pad behind a `RefCell` call this, release the
    /// borrow while [`PendingSave::send`] runs, and then call
    /// [`SignaturePad::complete_save`], so the surface stays usable during the
    /// request.
    pub fn prepare_save(
        &mut self,
        endpoint_base: &str,
        request_id_key: &str,
        preview_image_url: &str,
        stored_image_url_prefix: &str,
    ) -> SignPadResult<PendingSave> {
        let surface = self.surface.as_ref().ok_or(SignPadError::SurfaceMissing)?;
        let field = self
            .host
            .image_field
            .clone()
            .ok_or(SignPadError::MissingElement("Signature image"))?;
        let form = self
            .host
            .form
            .clone()
            .ok_or(SignPadError::MissingElement("Signature form"))?;
        let transport = self
            .host
            .transport
            .clone()
            .ok_or(SignPadError::ClientUnavailable)?;

        let bytes = surface.encode(ImageFormat::Png, 1.0)?;
        let data_url = to_data_url(ImageFormat::Png, &bytes);
        field.set_value(&data_url);
        self.session.set_image_data(bytes);

        let mut fields = form.fields();
        let slot = fields
            .iter_mut()
            .find(|(name, _)| *name == self.config.image_field);
        match slot {
            Some((_, value)) => *value = data_url,
            None => fields.push((self.config.image_field.clone(), data_url)),
        }

        Ok(PendingSave {
            request: FormRequest {
                url: self.config.endpoint_url(endpoint_base),
                fields,
            },
            transport,
            request_id_key: request_id_key.to_string(),
            preview_image_url: preview_image_url.to_string(),
            stored_image_url_prefix: stored_image_url_prefix.to_string(),
        })
    }

    /// Second half of [`SignaturePad::save`]: apply the outcome and notify.
    pub fn complete_save(&mut self, outcome: SaveOutcome) {
        match outcome {
            SaveOutcome::Saved {
                saved_id,
                request_id_key,
                preview_image_url,
                stored_image_url_prefix,
            } => {
                self.session.mark_saved(&SavedSignature {
                    saved_id: saved_id.clone(),
                    request_id_key: request_id_key.clone(),
                    preview_image_url: preview_image_url.clone(),
                    stored_image_url: format!("{stored_image_url_prefix}{saved_id}"),
                });
                log::info!("signature saved as {saved_id}");
                self.notify(EventData {
                    is_save: true,
                    is_dirty: false,
                    saved_id: Some(saved_id),
                    request_id_key: Some(request_id_key),
                    preview_image_url: Some(preview_image_url),
                    stored_image_url: Some(stored_image_url_prefix),
                    error: None,
                });
            }
            SaveOutcome::Failed(error) => {
                log::error!("Error saving signature: {error}");
                self.session.mark_save_failed();
                self.notify(EventData::error(error.to_string()));
            }
        }
    }

    fn notify(&self, data: EventData) {
        self.host.update_controls(data.is_save, data.is_dirty);

        let event_type = SignatureEventType::classify(data.is_save, data.is_dirty);
        let state = self.session.state();
        log::debug!("signature event {event_type}, state {state:?}");

        let Some(listener) = &self.listener else {
            return;
        };
        let result = data.into_result(self.host.target.clone());
        if !listener.notify(event_type, &result) {
            log::debug!("signature listener dropped; {event_type} not delivered");
        }
    }
}

impl Default for SignaturePad {
    fn default() -> Self {
        Self::new(SignPadConfig::default())
    }
}

/// A captured save request, ready to be sent.
pub struct PendingSave {
    request: FormRequest,
    transport: Rc<dyn Transport>,
    request_id_key: String,
    preview_image_url: String,
    stored_image_url_prefix: String,
}

impl PendingSave {
    pub fn request(&self) -> &FormRequest {
        &self.request
    }

    /// Send the request once and interpret the response.
    pub async fn send(self) -> SaveOutcome {
        let result = match self.transport.post_form(self.request).await {
            Ok(response) => response.signature_id(),
            Err(e) => Err(e),
        };
        match result {
            Ok(saved_id) => SaveOutcome::Saved {
                saved_id,
                request_id_key: self.request_id_key,
                preview_image_url: self.preview_image_url,
                stored_image_url_prefix: self.stored_image_url_prefix,
            },
            Err(e) => SaveOutcome::Failed(e),
        }
    }
}

/// Result of a save attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved {
        saved_id: String,
        request_id_key: String,
        preview_image_url: String,
        stored_image_url_prefix: String,
    },
    Failed(SignPadError),
}

impl From<SignPadError> for SaveOutcome {
    fn from(error: SignPadError) -> Self {
        SaveOutcome::Failed(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventResult, HostTarget};
    use crate::host::{Control, FormSource, ImageField};
    use crate::transport::{BoxFuture, TransportResponse};
    use kurbo::{Point, Size};
    use std::cell::{Cell, RefCell};

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

        fn dummy_raw_waker() -> RawWaker {
            fn no_op(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                dummy_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
            RawWaker::new(std::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);

        loop {
            match f.as_mut().poll(&mut cx) {
                Poll::Ready(result) => return result,
                Poll::Pending => {}
            }
        }
    }

    struct FakeCanvas {
        has_context: bool,
        size: Cell<Size>,
        ratio: Cell<f64>,
    }

    impl FakeCanvas {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                has_context: true,
                size: Cell::new(Size::new(200.0, 100.0)),
                ratio: Cell::new(1.0),
            })
        }
    }

    impl SurfaceElement for FakeCanvas {
        fn has_2d_context(&self) -> bool {
            self.has_context
        }

        fn css_size(&self) -> Size {
            self.size.get()
        }

        fn device_pixel_ratio(&self) -> f64 {
            self.ratio.get()
        }
    }

    #[derive(Default)]
    struct Field(RefCell<String>);

    impl ImageField for Field {
        fn set_value(&self, value: &str) {
            *self.0.borrow_mut() = value.to_string();
        }
    }

    struct Form(Vec<(String, String)>);

    impl FormSource for Form {
        fn fields(&self) -> Vec<(String, String)> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct Button(Cell<Option<bool>>);

    impl Control for Button {
        fn set_disabled(&self, disabled: bool) {
            self.0.set(Some(disabled));
        }
    }

    /// Answers every request with a canned response and records it.
    struct StubTransport {
        reply: SignPadResult<TransportResponse>,
        requests: RefCell<Vec<FormRequest>>,
    }

    impl StubTransport {
        fn ok(body: &str) -> Rc<Self> {
            Self::reply(Ok(TransportResponse {
                status: 200,
                body: body.to_string(),
            }))
        }

        fn reply(reply: SignPadResult<TransportResponse>) -> Rc<Self> {
            Rc::new(Self {
                reply,
                requests: RefCell::new(Vec::new()),
            })
        }
    }

    impl Transport for StubTransport {
        fn post_form(
            &self,
            request: FormRequest,
        ) -> BoxFuture<'_, SignPadResult<TransportResponse>> {
            self.requests.borrow_mut().push(request);
            let reply = self.reply.clone();
            Box::pin(async move { reply })
        }
    }

    type Events = Rc<RefCell<Vec<(SignatureEventType, EventResult)>>>;

    fn recording_listener(events: &Events) -> Listener {
        let sink = events.clone();
        Listener::callback(move |t, r| sink.borrow_mut().push((t, r.clone())))
    }

    struct Harness {
        pad: SignaturePad,
        canvas: Rc<FakeCanvas>,
        field: Rc<Field>,
        save_button: Rc<Button>,
        clear_button: Rc<Button>,
        transport: Rc<StubTransport>,
        events: Events,
    }

    fn harness(transport: Rc<StubTransport>) -> Harness {
        let canvas = FakeCanvas::new();
        let field = Rc::new(Field::default());
        let save_button = Rc::new(Button::default());
        let clear_button = Rc::new(Button::default());
        let events: Events = Rc::new(RefCell::new(Vec::new()));

        let host = HostBindings::new(HostTarget::new("parent"))
            .with_image_field(field.clone())
            .with_form(Rc::new(Form(vec![
                ("signatureImage".to_string(), String::new()),
                ("signatureRequestId".to_string(), "req-1".to_string()),
                ("saveToDB".to_string(), "true".to_string()),
            ])))
            .with_save_control(save_button.clone())
            .with_clear_control(clear_button.clone())
            .with_transport(transport.clone());

        let mut pad = SignaturePad::default();
        let listener = recording_listener(&events);
        pad.initialize(canvas.clone(), host, Some(listener))
            .unwrap();

        Harness {
            pad,
            canvas,
            field,
            save_button,
            clear_button,
            transport,
            events,
        }
    }

    fn draw_stroke(pad: &mut SignaturePad) -> bool {
        let (pointer_id, position) = (1, Point::new(20.0, 20.0));
        pad.handle_pointer(PointerEvent::Down {
            pointer_id,
            position,
            time_ms: 0.0,
        });
        pad.handle_pointer(PointerEvent::Move {
            pointer_id,
            position: Point::new(60.0, 40.0),
            time_ms: 20.0,
        });
        pad.handle_pointer(PointerEvent::Up {
            pointer_id,
            position: Point::new(120.0, 50.0),
            time_ms: 40.0,
        })
    }

    fn save(pad: &mut SignaturePad) {
        block_on(pad.save(
            "http://emr.test/oscar/",
            "req-1",
            "/preview.png",
            "/image?digitalSignatureId=",
        ));
    }

    #[test]
    fn test_initial_state() {
        let h = harness(StubTransport::ok("{}"));
        assert!(h.pad.is_signature_empty());
        assert_eq!(h.pad.state(), PadState::Empty);
        assert!(h.events.borrow().is_empty());
        assert_eq!(h.save_button.0.get(), None);
    }

    #[test]
    fn test_stroke_marks_dirty() {
        let mut h = harness(StubTransport::ok("{}"));
        assert!(draw_stroke(&mut h.pad));

        assert!(!h.pad.is_signature_empty());
        assert_eq!(h.pad.state(), PadState::Dirty);
        let events = h.events.borrow();
        assert_eq!(events.len(), 1);
        let (event_type, result) = &events[0];
        assert_eq!(*event_type, SignatureEventType::Draw);
        assert!(!result.is_save);
        assert!(result.is_dirty);
        assert_eq!(result.target.name(), "parent");

        assert!(h.field.0.borrow().starts_with("data:image/png;base64,"));
        assert!(h.pad.session().image_data().is_some());
        assert_eq!(h.save_button.0.get(), Some(false));
        assert_eq!(h.clear_button.0.get(), Some(false));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut h = harness(StubTransport::ok("{}"));
        draw_stroke(&mut h.pad);
        h.pad.clear();
        h.pad.clear();

        assert!(h.pad.is_signature_empty());
        assert!(!h.pad.session().is_dirty());
        assert!(!h.pad.session().is_saved());
        let types: Vec<_> = h.events.borrow().iter().map(|(t, _)| *t).collect();
        use SignatureEventType::*;
        assert_eq!(types, vec![Draw, Clear, Clear]);
        assert_eq!(h.save_button.0.get(), Some(true));
        assert_eq!(h.clear_button.0.get(), Some(true));
    }

    #[test]
    fn test_save_success() {
        let mut h = harness(StubTransport::ok(r#"{"signatureId":"abc123"}"#));
        draw_stroke(&mut h.pad);
        save(&mut h.pad);

        assert_eq!(h.pad.state(), PadState::Saved);
        assert!(!h.pad.session().is_dirty());
        assert_eq!(h.pad.session().saved_id(), Some("abc123"));

        let events = h.events.borrow();
        assert_eq!(events.len(), 2);
        let (event_type, result) = &events[1];
        assert_eq!(*event_type, SignatureEventType::Save);
        assert!(result.is_save);
        assert!(!result.is_dirty);
        assert_eq!(result.request_id_key.as_deref(), Some("req-1"));
        assert_eq!(result.preview_image_url.as_deref(), Some("/preview.png"));
        let stored_image_url = result.stored_image_url.as_deref().unwrap();
        assert!(stored_image_url.ends_with("abc123"));
        assert_eq!(result.error, None);

        // Save disabled, clear still enabled.
        assert_eq!(h.save_button.0.get(), Some(true));
        assert_eq!(h.clear_button.0.get(), Some(false));
    }

    #[test]
    fn test_save_posts_form_once() {
        let mut h = harness(StubTransport::ok(r#"{"signatureId":"abc123"}"#));
        draw_stroke(&mut h.pad);
        save(&mut h.pad);

        let requests = h.transport.requests.borrow();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.url, "http://emr.test/oscar/digitalSignature.do");
        assert_eq!(request.field("signatureRequestId"), Some("req-1"));
        let image = request.field("signatureImage").unwrap();
        assert!(image.starts_with("data:image/png;base64,"));
        let images = request.fields.iter().filter(|(k, _)| k == "signatureImage");
        assert_eq!(images.count(), 1);
    }

    #[test]
    fn test_save_network_failure() {
        let refused = SignPadError::Transport("connection refused".to_string());
        let mut h = harness(StubTransport::reply(Err(refused)));
        draw_stroke(&mut h.pad);
        save(&mut h.pad);

        assert!(h.pad.session().is_dirty());
        assert!(!h.pad.session().is_saved());
        assert_eq!(h.pad.session().saved_id(), None);
        let events = h.events.borrow();
        let (event_type, result) = events.last().unwrap();
        assert_eq!(*event_type, SignatureEventType::Draw);
        assert_eq!(result.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_save_malformed_body() {
        let mut h = harness(StubTransport::ok(r#"{"status":"ok"}"#));
        draw_stroke(&mut h.pad);
        save(&mut h.pad);

        assert_eq!(h.pad.state(), PadState::Dirty);
        let events = h.events.borrow();
        let (event_type, result) = events.last().unwrap();
        assert_eq!(*event_type, SignatureEventType::Draw);
        assert_eq!(
            result.error.as_deref(),
            Some("Invalid server response format")
        );
    }

    #[test]
    fn test_save_http_error() {
        let mut h = harness(StubTransport::reply(Ok(TransportResponse {
            status: 503,
            body: String::new(),
        })));
        draw_stroke(&mut h.pad);
        save(&mut h.pad);

        let events = h.events.borrow();
        let (_, result) = events.last().unwrap();
        assert_eq!(
            result.error.as_deref(),
            Some("Server responded with status: 503")
        );
    }

    #[test]
    fn test_failed_save_after_success_clears_saved_id() {
        let mut h = harness(StubTransport::ok(r#"{"signatureId":"abc123"}"#));
        draw_stroke(&mut h.pad);
        save(&mut h.pad);
        h.pad.complete_save(SaveOutcome::Failed(SignPadError::InvalidResponse));
        assert_eq!(h.pad.state(), PadState::Dirty);
        assert_eq!(h.pad.session().saved_id(), None);
    }

    #[test]
    fn test_save_without_bindings_reports_error() {
        let mut pad = SignaturePad::default();
        let events: Events = Rc::new(RefCell::new(Vec::new()));
        let listener = recording_listener(&events);
        pad.initialize(FakeCanvas::new(), HostBindings::default(), Some(listener))
            .unwrap();
        draw_stroke(&mut pad);
        save(&mut pad);

        let events = events.borrow();
        let (_, result) = events.last().unwrap();
        assert_eq!(
            result.error.as_deref(),
            Some("Signature image element not found")
        );
        assert_eq!(pad.state(), PadState::Dirty);
    }

    #[test]
    fn test_save_without_transport_reports_error() {
        let field: Rc<dyn ImageField> = Rc::new(Field::default());
        let form: Rc<dyn FormSource> = Rc::new(Form(Vec::new()));
        let host = HostBindings::default()
            .with_image_field(field)
            .with_form(form);
        let mut pad = SignaturePad::default();
        pad.initialize(FakeCanvas::new(), host, None).unwrap();
        let err = pad.prepare_save("/oscar", "req", "", "").err();
        assert_eq!(err, Some(SignPadError::ClientUnavailable));
    }

    #[test]
    fn test_uninitialized_pad() {
        let mut pad = SignaturePad::default();
        assert!(pad.is_signature_empty());
        assert_eq!(pad.signature_data_url(ImageFormat::Png, 0.92), None);
        assert!(!draw_stroke(&mut pad));
        pad.clear();

        let err = pad.prepare_save("/oscar", "req", "", "").err();
        assert_eq!(err, Some(SignPadError::SurfaceMissing));
        save(&mut pad);
        assert_eq!(pad.state(), PadState::Dirty);
    }

    #[test]
    fn test_invalid_surface_rejected() {
        let canvas = Rc::new(FakeCanvas {
            has_context: false,
            size: Cell::new(Size::new(10.0, 10.0)),
            ratio: Cell::new(1.0),
        });
        let mut pad = SignaturePad::default();
        let err = pad.initialize(canvas, HostBindings::default(), None);
        assert!(matches!(err, Err(SignPadError::InvalidSurface(_))));
        assert!(!pad.is_initialized());
    }

    #[test]
    fn test_oversized_surface_rejected() {
        let canvas = FakeCanvas::new();
        canvas.size.set(Size::new(1e10, 1e10));
        let mut pad = SignaturePad::default();
        let err = pad.initialize(canvas.clone(), HostBindings::default(), None);
        assert!(matches!(err, Err(SignPadError::InvalidSurface(_))));
        assert!(!pad.is_initialized());

        canvas.size.set(Size::new(200.0, 100.0));
        canvas.ratio.set(1e6);
        let err = pad.initialize(canvas, HostBindings::default(), None);
        assert!(matches!(err, Err(SignPadError::InvalidSurface(_))));
    }

    #[test]
    fn test_resize_clears_content() {
        let mut h = harness(StubTransport::ok("{}"));
        draw_stroke(&mut h.pad);
        assert!(!h.pad.is_signature_empty());

        h.canvas.ratio.set(2.0);
        h.pad.resize();
        assert!(h.pad.is_signature_empty());
        assert_eq!(h.pad.surface().unwrap().raster().width(), 400);
        assert_eq!(h.events.borrow().len(), 1);
    }

    #[test]
    fn test_oversized_resize_keeps_surface() {
        let mut h = harness(StubTransport::ok("{}"));
        draw_stroke(&mut h.pad);

        h.canvas.size.set(Size::new(1e10, 1e10));
        h.pad.resize();
        assert!(!h.pad.is_signature_empty());
        let surface = h.pad.surface().unwrap();
        assert_eq!(surface.css_size(), Size::new(200.0, 100.0));
        assert_eq!(surface.raster().width(), 200);

        h.canvas.size.set(Size::new(100.0, 50.0));
        h.pad.resize();
        assert!(h.pad.is_signature_empty());
        assert_eq!(h.pad.surface().unwrap().raster().width(), 100);
    }

    #[test]
    fn test_data_url_after_stroke() {
        let mut h = harness(StubTransport::ok("{}"));
        draw_stroke(&mut h.pad);
        let png = h.pad.signature_data_url(ImageFormat::Png, 0.92).unwrap();
        assert!(png.starts_with("data:image/png;base64,"));
        let jpeg_format = ImageFormat::from_mime_type("image/jpeg");
        let jpeg = h.pad.signature_data_url(jpeg_format, 0.8).unwrap();
        assert!(jpeg.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_stroke_after_save_is_dirty_again() {
        let mut h = harness(StubTransport::ok(r#"{"signatureId":"abc123"}"#));
        draw_stroke(&mut h.pad);
        save(&mut h.pad);
        draw_stroke(&mut h.pad);
        assert_eq!(h.pad.state(), PadState::Dirty);
        assert_eq!(h.pad.session().saved_id(), None);
    }

    #[test]
    fn test_split_save_allows_drawing_in_flight() {
        let mut h = harness(StubTransport::ok(r#"{"signatureId":"abc123"}"#));
        draw_stroke(&mut h.pad);
        let pending = h.pad.prepare_save("/oscar", "req-1", "", "/img/").unwrap();

        // The pad is free while the request is out.
        draw_stroke(&mut h.pad);
        let outcome = block_on(pending.send());
        h.pad.complete_save(outcome);

        assert_eq!(h.pad.state(), PadState::Saved);
        assert_eq!(h.pad.session().stored_image_url(), Some("/img/abc123"));
    }

    #[test]
    fn test_missing_listener_still_updates_controls() {
        let button = Rc::new(Button::default());
        let mut pad = SignaturePad::default();
        pad.initialize(
            FakeCanvas::new(),
            HostBindings::default().with_save_control(button.clone()),
            None,
        )
        .unwrap();
        draw_stroke(&mut pad);
        assert_eq!(button.0.get(), Some(false));
    }

    #[test]
    fn test_listener_sees_updated_controls() {
        let save_button = Rc::new(Button::default());
        let clear_button = Rc::new(Button::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let listener = {
            let save_button = save_button.clone();
            let clear_button = clear_button.clone();
            let seen = seen.clone();
            Listener::callback(move |t, _| {
                let controls = (save_button.0.get(), clear_button.0.get());
                seen.borrow_mut().push((t, controls));
            })
        };
        let host = HostBindings::new(HostTarget::new("parent"))
            .with_image_field(Rc::new(Field::default()))
            .with_form(Rc::new(Form(Vec::new())))
            .with_save_control(save_button)
            .with_clear_control(clear_button)
            .with_transport(StubTransport::ok(r#"{"signatureId":"abc123"}"#));
        let mut pad = SignaturePad::default();
        pad.initialize(FakeCanvas::new(), host, Some(listener))
            .unwrap();

        draw_stroke(&mut pad);
        save(&mut pad);
        pad.clear();

        // (save disabled, clear disabled) as observed inside the callback
        use SignatureEventType::*;
        assert_eq!(
            *seen.borrow(),
            vec![
                (Draw, (Some(false), Some(false))),
                (Save, (Some(true), Some(false))),
                (Clear, (Some(true), Some(true))),
            ]
        );
    }
}
