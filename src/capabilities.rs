use crate::{config::Config, credentials::Credentials, device::DeviceProfile, util::slug};
use serde::Serialize;

/// Store application driven on every device. Not configurable per run.
pub const APP_PACKAGE: &str = "com.android.vending";
pub const APP_ACTIVITY: &str = "com.google.android.finsky.activities.MainActivity";
pub const AUTOMATION_NAME: &str = "UiAutomator2";
pub const PLATFORM_NAME: &str = "Android";

/// W3C capability set sent in `alwaysMatch` when opening a session.
#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    #[serde(rename = "platformName")]
    pub platform_name: String,
    #[serde(rename = "appium:automationName")]
    pub automation_name: String,
    #[serde(rename = "appium:appPackage")]
    pub app_package: String,
    #[serde(rename = "appium:appActivity")]
    pub app_activity: String,
    #[serde(rename = "appium:deviceName")]
    pub device_name: String,
    #[serde(rename = "appium:platformVersion")]
    pub platform_version: String,
    #[serde(rename = "appium:newCommandTimeout")]
    pub new_command_timeout: u64,
    #[serde(rename = "appium:noReset")]
    pub no_reset: bool,
    #[serde(rename = "bstack:options")]
    pub provider: ProviderOptions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOptions {
    pub user_name: String,
    pub access_key: String,
    pub device_name: String,
    pub os_version: String,
    pub project_name: String,
    pub build_name: String,
    pub session_name: String,
    pub build_tag: String,
    pub tags: Vec<String>,
    pub idle_timeout: u64,
}

impl Capabilities {
    /// `stamp` is the build timestamp shared by all sessions of one batch.
    pub fn build(
        cfg: &Config,
        creds: &Credentials,
        profile: &DeviceProfile,
        stamp: &str,
    ) -> Capabilities {
        let device_tag = slug(&profile.name);
        Capabilities {
            platform_name: PLATFORM_NAME.into(),
            automation_name: AUTOMATION_NAME.into(),
            app_package: APP_PACKAGE.into(),
            app_activity: APP_ACTIVITY.into(),
            device_name: profile.name.clone(),
            platform_version: profile.platform_version.clone(),
            new_command_timeout: cfg.session.command_timeout_seconds,
            no_reset: true,
            provider: ProviderOptions {
                user_name: creds.username.clone(),
                access_key: creds.access_key.clone(),
                device_name: profile.name.clone(),
                os_version: profile.platform_version.clone(),
                project_name: cfg.target.project_name.clone(),
                build_name: format!("{} install {}", cfg.target.app_name, stamp),
                session_name: format!("{} on {} ({stamp})", cfg.target.app_name, profile.name),
                build_tag: device_tag.clone(),
                tags: vec![device_tag, slug(&cfg.target.app_name), "install-flow".into()],
                idle_timeout: cfg.session.idle_timeout_seconds,
            },
        }
    }

    /// Copy safe to print or log.
    pub fn redacted(&self) -> Capabilities {
        let mut c = self.clone();
        c.provider.access_key = "<redacted>".into();
        c
    }
}
