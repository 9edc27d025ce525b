use crate::session::{ElementRef, Session};
use std::fmt;
use tracing::debug;

/// Selector expression understood by the remote automation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Id(String),
    AccessibilityId(String),
    XPath(String),
    ClassName(String),
    UiAutomator(String),
}

impl Selector {
    /// W3C `using` value.
    pub fn strategy(&self) -> &'static str {
        match self {
            Selector::Id(_) => "id",
            Selector::AccessibilityId(_) => "accessibility id",
            Selector::XPath(_) => "xpath",
            Selector::ClassName(_) => "class name",
            Selector::UiAutomator(_) => "-android uiautomator",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Selector::Id(v)
            | Selector::AccessibilityId(v)
            | Selector::XPath(v)
            | Selector::ClassName(v)
            | Selector::UiAutomator(v) => v,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy(), self.value())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorStrategy {
    pub label: String,
    pub selector: Selector,
}

impl LocatorStrategy {
    pub fn new(label: impl Into<String>, selector: Selector) -> Self {
        Self {
            label: label.into(),
            selector,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub label: String,
    pub index: usize,
    pub element: ElementRef,
}

/// Tries each candidate in order and returns the first one that resolves to a
/// visible element. Lookup or visibility errors skip the candidate. Nothing
/// after the first visible match is touched.
pub fn resolve_first_visible<S: Session + ?Sized>(
    session: &S,
    candidates: &[LocatorStrategy],
) -> Option<Resolved> {
    for (index, c) in candidates.iter().enumerate() {
        let element = match session.find_element(&c.selector) {
            Ok(el) => el,
            Err(err) => {
                debug!("locator {} ({}) missed: {}", c.label, c.selector, err);
                continue;
            }
        };
        match session.is_displayed(&element) {
            Ok(true) => {
                debug!("locator {} ({}) matched", c.label, c.selector);
                return Some(Resolved {
                    label: c.label.clone(),
                    index,
                    element,
                });
            }
            Ok(false) => debug!("locator {} matched a hidden element", c.label),
            Err(err) => debug!("locator {} visibility check failed: {}", c.label, err),
        }
    }
    None
}

pub fn search_box_strategies() -> Vec<LocatorStrategy> {
    vec![
        LocatorStrategy::new(
            "search bar id",
            Selector::Id("com.android.vending:id/search_bar_hint".into()),
        ),
        LocatorStrategy::new(
            "search hint text",
            Selector::UiAutomator(r#"new UiSelector().textContains("Search apps")"#.into()),
        ),
        LocatorStrategy::new(
            "search accessibility id",
            Selector::AccessibilityId("Search Google Play".into()),
        ),
        LocatorStrategy::new(
            "search xpath",
            Selector::XPath("//*[contains(@text,'Search') or contains(@content-desc,'Search')]".into()),
        ),
    ]
}

/// Generic editable field the query is typed into once search is open.
pub fn text_input_selector() -> Selector {
    Selector::ClassName("android.widget.EditText".into())
}

pub fn app_entry_strategies(app_name: &str) -> Vec<LocatorStrategy> {
    let ui = uiautomator_literal(app_name);
    let xp = xpath_literal(app_name);
    vec![
        LocatorStrategy::new(
            "exact text",
            Selector::UiAutomator(format!("new UiSelector().text({ui})")),
        ),
        LocatorStrategy::new(
            "content description",
            Selector::XPath(format!("//*[contains(@content-desc,{xp})]")),
        ),
        LocatorStrategy::new(
            "text contains",
            Selector::XPath(format!("//*[contains(@text,{xp})]")),
        ),
    ]
}

/// Install first; Open or Update when the app is already present.
pub fn action_button_strategies() -> Vec<LocatorStrategy> {
    ["Install", "Open", "Update"]
        .into_iter()
        .map(|label| {
            LocatorStrategy::new(
                label.to_ascii_lowercase(),
                Selector::UiAutomator(format!(
                    "new UiSelector().className(\"android.widget.Button\").text(\"{label}\")"
                )),
            )
        })
        .collect()
}

fn uiautomator_literal(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// XPath 1.0 has no escapes; mixed quotes need `concat()`.
fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        return format!("'{s}'");
    }
    if !s.contains('"') {
        return format!("\"{s}\"");
    }
    let parts: Vec<String> = s.split('\'').map(|p| format!("'{p}'")).collect();
    format!("concat({})", parts.join(", \"'\", "))
}
