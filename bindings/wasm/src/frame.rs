use std::rc::Rc;

use embedlink_transport::{FrameHost, MessageTarget, Result, TransportError};
use web_sys::HtmlIFrameElement;

use crate::window::WebTarget;

/// An `<iframe>` element.
pub struct IframeHost {
    element: HtmlIFrameElement,
}

impl IframeHost {
    pub fn new(element: HtmlIFrameElement) -> Self {
        Self { element }
    }
}

impl FrameHost for IframeHost {
    fn set_src(&self, url: &str) -> Result<()> {
        if !self.element.is_connected() {
            return Err(TransportError::FrameDetached);
        }
        self.element.set_src(url);
        Ok(())
    }

    fn content_window(&self) -> Result<Rc<dyn MessageTarget>> {
        if !self.element.is_connected() {
            return Err(TransportError::FrameDetached);
        }
        let window = self
            .element
            .content_window()
            .ok_or(TransportError::ContentWindowUnavailable)?;
        Ok(Rc::new(WebTarget::new(window)))
    }
}
