#![allow(dead_code)]

use install_sweep::{
    capabilities::Capabilities,
    config::Config,
    error::FlowError,
    locator::{
        action_button_strategies, app_entry_strategies, search_box_strategies,
        text_input_selector, Selector,
    },
    session::{ElementRef, Session, SessionProvider},
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Start(String),
    Find(Selector),
    Displayed(String),
    Click(String),
    SetValue(String, String),
    Key(u32),
    Pause(Duration),
    End(String),
}

pub type Log = Rc<RefCell<Vec<Call>>>;

/// Elements present on the fake device: selector -> (element id, visible).
#[derive(Debug, Clone, Default)]
pub struct Screen {
    elements: Vec<(Selector, String, Option<bool>)>,
}

impl Screen {
    pub fn with(mut self, selector: Selector, id: &str, visible: bool) -> Self {
        self.elements.push((selector, id.to_string(), Some(visible)));
        self
    }

    /// Element found, but the visibility query errors.
    pub fn with_broken(mut self, selector: Selector, id: &str) -> Self {
        self.elements.push((selector, id.to_string(), None));
        self
    }

    pub fn without(mut self, selector: &Selector) -> Self {
        self.elements.retain(|(s, _, _)| s != selector);
        self
    }

    /// Everything the install flow needs for `app`, found by the first strategy of each set.
    pub fn happy(app: &str) -> Self {
        Screen::default()
            .with(search_box_strategies()[0].selector.clone(), "search", true)
            .with(text_input_selector(), "input", true)
            .with(app_entry_strategies(app)[0].selector.clone(), "entry", true)
            .with(action_button_strategies()[0].selector.clone(), "install", true)
    }
}

pub struct FakeProvider {
    pub log: Log,
    pub screen: Screen,
    pub start_errors: HashMap<String, FlowError>,
    pub end_error: Option<FlowError>,
    pub find_errors: Vec<(Selector, FlowError)>,
    pub panic_on_click: bool,
    pub open_delay: Duration,
}

impl FakeProvider {
    pub fn new(screen: Screen) -> Self {
        Self {
            log: Rc::new(RefCell::new(Vec::new())),
            screen,
            start_errors: HashMap::new(),
            end_error: None,
            find_errors: Vec::new(),
            panic_on_click: false,
            open_delay: Duration::from_millis(2),
        }
    }

    pub fn fail_start(mut self, device: &str, err: FlowError) -> Self {
        self.start_errors.insert(device.to_string(), err);
        self
    }

    /// Looking up `selector` returns `err` instead of consulting the screen.
    pub fn fail_find(mut self, selector: Selector, err: FlowError) -> Self {
        self.find_errors.push((selector, err));
        self
    }

    pub fn panic_on_click(mut self) -> Self {
        self.panic_on_click = true;
        self
    }

    pub fn fail_end(mut self, err: FlowError) -> Self {
        self.end_error = Some(err);
        self
    }
}

impl SessionProvider for FakeProvider {
    type Session = FakeSession;

    fn start(&self, caps: &Capabilities) -> Result<FakeSession, FlowError> {
        self.log.borrow_mut().push(Call::Start(caps.device_name.clone()));
        if let Some(err) = self.start_errors.get(&caps.device_name) {
            return Err(err.clone());
        }
        std::thread::sleep(self.open_delay);
        Ok(FakeSession {
            id: format!("sess-{}", caps.device_name.replace(' ', "-")),
            log: self.log.clone(),
            screen: self.screen.clone(),
            end_error: self.end_error.clone(),
            find_errors: self.find_errors.clone(),
            panic_on_click: self.panic_on_click,
        })
    }
}

pub struct FakeSession {
    id: String,
    log: Log,
    screen: Screen,
    end_error: Option<FlowError>,
    find_errors: Vec<(Selector, FlowError)>,
    panic_on_click: bool,
}

impl Session for FakeSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn find_element(&self, selector: &Selector) -> Result<ElementRef, FlowError> {
        self.log.borrow_mut().push(Call::Find(selector.clone()));
        if let Some((_, err)) = self.find_errors.iter().find(|(s, _)| s == selector) {
            return Err(err.clone());
        }
        self.screen
            .elements
            .iter()
            .find(|(s, _, _)| s == selector)
            .map(|(_, id, _)| ElementRef(id.clone()))
            .ok_or_else(|| FlowError::remote("no such element"))
    }

    fn is_displayed(&self, element: &ElementRef) -> Result<bool, FlowError> {
        self.log.borrow_mut().push(Call::Displayed(element.0.clone()));
        self.screen
            .elements
            .iter()
            .find(|(_, id, _)| *id == element.0)
            .and_then(|(_, _, visible)| *visible)
            .ok_or_else(|| FlowError::remote("stale element reference"))
    }

    fn click(&self, element: &ElementRef) -> Result<(), FlowError> {
        if self.panic_on_click {
            panic!("click on {} blew up", element.0);
        }
        self.log.borrow_mut().push(Call::Click(element.0.clone()));
        Ok(())
    }

    fn set_value(&self, element: &ElementRef, text: &str) -> Result<(), FlowError> {
        self.log
            .borrow_mut()
            .push(Call::SetValue(element.0.clone(), text.to_string()));
        Ok(())
    }

    fn press_keycode(&self, keycode: u32) -> Result<(), FlowError> {
        self.log.borrow_mut().push(Call::Key(keycode));
        Ok(())
    }

    fn pause(&self, duration: Duration) {
        self.log.borrow_mut().push(Call::Pause(duration));
    }

    fn end(&self) -> Result<(), FlowError> {
        self.log.borrow_mut().push(Call::End(self.id.clone()));
        match &self.end_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Defaults with every pause zeroed.
pub fn quick_config() -> Config {
    let mut cfg = Config::default();
    cfg.timing.warmup_seconds = 0;
    cfg.timing.results_seconds = 0;
    cfg.timing.detail_seconds = 0;
    cfg.timing.install_observe_seconds = 0;
    cfg.timing.between_devices_seconds = 0;
    cfg
}

pub fn count(log: &Log, call: &Call) -> usize {
    log.borrow().iter().filter(|c| *c == call).count()
}

pub fn ends(log: &Log) -> usize {
    log.borrow()
        .iter()
        .filter(|c| matches!(c, Call::End(_)))
        .count()
}
