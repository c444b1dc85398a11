//! Host page bindings, resolved once when the pad is initialized.

use crate::event::HostTarget;
use crate::transport::Transport;
use kurbo::Size;
use std::fmt;
use std::rc::Rc;

/// The element the pad draws on.
pub trait SurfaceElement {
    /// Whether a 2D drawing context is available.
    fn has_2d_context(&self) -> bool;
    /// Layout size in CSS pixels.
    fn css_size(&self) -> Size;
    /// Device pixel ratio of the display.
    fn device_pixel_ratio(&self) -> f64;
}

/// Hidden field that carries the encoded image.
pub trait ImageField {
    fn set_value(&self, value: &str);
}

/// Form whose fields are submitted with the signature.
pub trait FormSource {
    /// Current field name/value pairs, in document order.
    fn fields(&self) -> Vec<(String, String)>;
}

/// A button the pad enables or disables.
pub trait Control {
    fn set_disabled(&self, disabled: bool);
}

/// Everything the pad needs from its environment.
///
/// Optional controls degrade silently when absent. A missing image field,
/// form or transport makes `save` report an error event.
#[derive(Clone, Default)]
pub struct HostBindings {
    pub target: HostTarget,
    pub image_field: Option<Rc<dyn ImageField>>,
    pub form: Option<Rc<dyn FormSource>>,
    pub save_control: Option<Rc<dyn Control>>,
    pub clear_control: Option<Rc<dyn Control>>,
    pub transport: Option<Rc<dyn Transport>>,
}

impl HostBindings {
    pub fn new(target: HostTarget) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    pub fn with_image_field(mut self, field: Rc<dyn ImageField>) -> Self {
        self.image_field = Some(field);
        self
    }

    pub fn with_form(mut self, form: Rc<dyn FormSource>) -> Self {
        self.form = Some(form);
        self
    }

    pub fn with_save_control(mut self, control: Rc<dyn Control>) -> Self {
        self.save_control = Some(control);
        self
    }

    pub fn with_clear_control(mut self, control: Rc<dyn Control>) -> Self {
        self.clear_control = Some(control);
        self
    }

    pub fn with_transport(mut self, transport: Rc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Reflect pad state on the save and clear controls.
    pub(crate) fn update_controls(&self, is_save: bool, is_dirty: bool) {
        if let Some(save) = &self.save_control {
            save.set_disabled(!is_dirty);
        }
        if let Some(clear) = &self.clear_control {
            clear.set_disabled(!(is_dirty || is_save));
        }
    }
}

impl fmt::Debug for HostBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostBindings")
            .field("target", &self.target)
            .field("image_field", &self.image_field.is_some())
            .field("form", &self.form.is_some())
            .field("save_control", &self.save_control.is_some())
            .field("clear_control", &self.clear_control.is_some())
            .field("transport", &self.transport.is_some())
            .finish()
    }
}
