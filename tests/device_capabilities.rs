use install_sweep::{
    capabilities::{Capabilities, APP_ACTIVITY, APP_PACKAGE},
    config::Config,
    credentials::Credentials,
    device::DeviceProfile,
};

#[test]
fn known_device_with_or_without_vendor() {
    let full = DeviceProfile::resolve("Google Pixel 7", "12.0");
    let short = DeviceProfile::resolve("pixel 7", "12.0");
    assert_eq!(full.platform_version, "13.0");
    assert_eq!(short.platform_version, "13.0");
    assert!(full.known && full.reliable);
    assert_eq!(short.name, "pixel 7");

    let galaxy = DeviceProfile::resolve("Galaxy S22", "9.0");
    assert_eq!(galaxy.platform_version, "12.0");
}

#[test]
fn unknown_device_uses_default_and_is_unreliable() {
    let p = DeviceProfile::resolve("Nokia 3310", "10.0");
    assert_eq!(p.platform_version, "10.0");
    assert!(!p.known);
    assert!(!p.reliable);
}

#[test]
fn capability_descriptor_fields() {
    let mut cfg = Config::default();
    cfg.target.app_name = "Spotify".into();
    let creds = Credentials::new("alice", "s3cret");
    let profile = DeviceProfile::resolve("Samsung Galaxy S23", "12.0");
    let caps = Capabilities::build(&cfg, &creds, &profile, "2026-10-19 09:30");

    let v = serde_json::to_value(&caps).unwrap();
    assert_eq!(v["platformName"], "Android");
    assert_eq!(v["appium:automationName"], "UiAutomator2");
    assert_eq!(v["appium:appPackage"], APP_PACKAGE);
    assert_eq!(v["appium:appActivity"], APP_ACTIVITY);
    assert_eq!(v["appium:deviceName"], "Samsung Galaxy S23");
    assert_eq!(v["appium:platformVersion"], "13.0");

    let opts = &v["bstack:options"];
    assert_eq!(opts["userName"], "alice");
    assert_eq!(opts["accessKey"], "s3cret");
    assert_eq!(opts["osVersion"], "13.0");
    assert_eq!(opts["buildName"], "Spotify install 2026-10-19 09:30");
    assert_eq!(opts["buildTag"], "samsung-galaxy-s23");
    assert_eq!(opts["tags"][0], "samsung-galaxy-s23");
    assert!(opts["sessionName"].as_str().unwrap().contains("Samsung Galaxy S23"));
}

#[test]
fn redacted_hides_access_key() {
    let cfg = Config::default();
    let profile = DeviceProfile::resolve("OnePlus 9", "12.0");
    let caps = Capabilities::build(&cfg, &Credentials::new("alice", "s3cret"), &profile, "x");
    let printed = serde_json::to_string(&caps.redacted()).unwrap();
    assert!(!printed.contains("s3cret"));
    assert!(printed.contains("alice"));
}

#[test]
fn credentials_report_missing_vars() {
    let cfg = Config::default();
    let err = Credentials::from_lookup(&cfg, |k| {
        (k == "BROWSERSTACK_USERNAME").then(|| "alice".to_string())
    })
    .unwrap_err();
    assert!(err.detail.contains("BROWSERSTACK_ACCESS_KEY"));
    assert!(!err.detail.contains("BROWSERSTACK_USERNAME"));

    let blank = Credentials::from_lookup(&cfg, |_| Some("  ".to_string())).unwrap_err();
    assert!(blank.detail.contains("BROWSERSTACK_USERNAME and BROWSERSTACK_ACCESS_KEY"));

    let ok = Credentials::from_lookup(&cfg, |_| Some("v".to_string())).unwrap();
    assert!(format!("{ok:?}").contains("<redacted>"));
}
