use crate::{
    capabilities::Capabilities,
    config::Config,
    credentials::Credentials,
    device::DeviceProfile,
    error::{ErrorKind, FlowError, UiTarget},
    locator::{
        action_button_strategies, app_entry_strategies, resolve_first_visible,
        search_box_strategies, text_input_selector,
    },
    report::RunResult,
    session::{Session, SessionProvider, KEYCODE_ENTER},
    util::now_build_stamp,
};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Anything that can run the install flow for one device.
pub trait RunDevice {
    /// Never fails: every problem ends up in the returned result.
    fn run(&self, device: &str) -> RunResult;
}

/// Runs the search-and-install flow on one device at a time.
pub struct DeviceFlowRunner<'a, P: SessionProvider> {
    cfg: &'a Config,
    provider: P,
    credentials: Result<Credentials, FlowError>,
    stamp: String,
}

impl<'a, P: SessionProvider> DeviceFlowRunner<'a, P> {
    pub fn new(cfg: &'a Config, provider: P, credentials: Result<Credentials, FlowError>) -> Self {
        Self {
            cfg,
            provider,
            credentials,
            stamp: now_build_stamp(),
        }
    }

    pub fn capabilities(&self, device: &str) -> Result<Capabilities, FlowError> {
        let creds = self.credentials.as_ref().map_err(Clone::clone)?;
        let profile = DeviceProfile::resolve(device, &self.cfg.session.platform_version_default);
        Ok(Capabilities::build(self.cfg, creds, &profile, &self.stamp))
    }

    fn execute(&self, device: &str, session_id: &mut Option<String>) -> Result<(), FlowError> {
        let creds = self.credentials.as_ref().map_err(Clone::clone)?;

        let profile = DeviceProfile::resolve(device, &self.cfg.session.platform_version_default);
        if !profile.known {
            warn!(
                "{device}: not in device table, assuming Android {}",
                profile.platform_version
            );
        } else if !profile.reliable {
            warn!("{device}: marked unreliable on the provider");
        }

        let caps = Capabilities::build(self.cfg, creds, &profile, &self.stamp);
        debug!(caps = ?caps.redacted(), "capabilities");

        let session = self.provider.start(&caps)?;
        *session_id = Some(session.id().to_string());

        // Released on drop, so a panicking interaction still frees the device.
        let _release = Release {
            session: &session,
            device,
        };
        self.interact(device, &session)
    }

    fn interact<S: Session>(&self, device: &str, session: &S) -> Result<(), FlowError> {
        let timing = &self.cfg.timing;
        let app = self.cfg.target.app_name.as_str();

        info!("{device}: waiting {}s for store home", timing.warmup_seconds);
        session.pause(secs(timing.warmup_seconds));

        let strategies = search_box_strategies();
        let search = resolve_first_visible(session, &strategies).ok_or_else(|| {
            FlowError::not_found(
                UiTarget::SearchBox,
                format!("no visible match among {} strategies", strategies.len()),
            )
        })?;
        info!("{device}: search box found via {}", search.label);
        session.click(&search.element)?;

        let input = session
            .find_element(&text_input_selector())
            .map_err(text_input_missing)?;
        if !session.is_displayed(&input).map_err(text_input_missing)? {
            return Err(FlowError::not_found(UiTarget::TextInput, "not visible"));
        }
        let query = self.cfg.search_query();
        session.set_value(&input, query)?;
        session.press_keycode(KEYCODE_ENTER)?;
        info!("{device}: searched for {query:?}");
        session.pause(secs(timing.results_seconds));

        let entry = resolve_first_visible(session, &app_entry_strategies(app)).ok_or_else(|| {
            FlowError::not_found(UiTarget::AppEntry, format!("{app} not found in results"))
        })?;
        info!("{device}: {app} found via {}", entry.label);
        session.click(&entry.element)?;
        session.pause(secs(timing.detail_seconds));

        let action = resolve_first_visible(session, &action_button_strategies()).ok_or_else(|| {
            FlowError::not_found(UiTarget::ActionButton, "no actionable button found")
        })?;
        session.click(&action.element)?;
        info!("{device}: pressed {}", action.label);

        session.pause(secs(timing.install_observe_seconds));
        Ok(())
    }
}

impl<P: SessionProvider> RunDevice for DeviceFlowRunner<'_, P> {
    fn run(&self, device: &str) -> RunResult {
        let started = Instant::now();
        info!("{device}: starting");

        let mut session_id = None;
        let outcome = self.execute(device, &mut session_id);
        let elapsed = started.elapsed().as_secs_f64();

        match outcome {
            Ok(()) => {
                info!("{device}: passed in {elapsed:.1}s");
                RunResult::passed(device, elapsed, session_id)
            }
            Err(err) => {
                warn!("{device}: failed in {elapsed:.1}s: {err}");
                RunResult::failed(device, elapsed, &err, session_id)
            }
        }
    }
}

/// Ends the session exactly once when dropped. Release failures are logged only.
struct Release<'s, S: Session> {
    session: &'s S,
    device: &'s str,
}

impl<S: Session> Drop for Release<'_, S> {
    fn drop(&mut self) {
        let (device, id) = (self.device, self.session.id());
        match self.session.end() {
            Ok(()) => debug!("{device}: session {id} released"),
            Err(err) => warn!("{device}: session {id} release failed: {err}"),
        }
    }
}

/// A remote "no such element" means the field is missing; anything else
/// (hub gone, auth, capacity) keeps its own kind.
fn text_input_missing(err: FlowError) -> FlowError {
    match err.kind {
        ErrorKind::Remote => FlowError::not_found(UiTarget::TextInput, err.detail),
        _ => err,
    }
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}
