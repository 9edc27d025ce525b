pub mod webdriver;

use crate::{capabilities::Capabilities, error::FlowError, locator::Selector};
use std::time::Duration;

pub use webdriver::{WebDriverProvider, WebDriverSession};

/// Android key code for ENTER.
pub const KEYCODE_ENTER: u32 = 66;

/// Opaque element handle returned by the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef(pub String);

/// Opens remote automation sessions.
pub trait SessionProvider {
    type Session: Session;

    fn start(&self, caps: &Capabilities) -> Result<Self::Session, FlowError>;
}

/// One live automation session on one device.
pub trait Session {
    fn id(&self) -> &str;
    fn find_element(&self, selector: &Selector) -> Result<ElementRef, FlowError>;
    fn is_displayed(&self, element: &ElementRef) -> Result<bool, FlowError>;
    fn click(&self, element: &ElementRef) -> Result<(), FlowError>;
    fn set_value(&self, element: &ElementRef, text: &str) -> Result<(), FlowError>;
    fn press_keycode(&self, keycode: u32) -> Result<(), FlowError>;
    fn pause(&self, duration: Duration);
    fn end(&self) -> Result<(), FlowError>;
}
