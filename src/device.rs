use serde::Serialize;

/// Static profile for a device name known to the cloud provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceProfile {
    pub name: String,
    pub platform_version: String,
    pub reliable: bool,
    pub known: bool,
}

// (name, android version, reliable)
const PROFILES: &[(&str, &str, bool)] = &[
    ("Samsung Galaxy S24", "14.0", true),
    ("Samsung Galaxy S23", "13.0", true),
    ("Samsung Galaxy S22", "12.0", true),
    ("Samsung Galaxy S21", "11.0", true),
    ("Samsung Galaxy A52", "11.0", false),
    ("Samsung Galaxy Tab S8", "12.0", false),
    ("Google Pixel 8", "14.0", true),
    ("Google Pixel 7", "13.0", true),
    ("Google Pixel 6", "12.0", true),
    ("Google Pixel 5", "11.0", false),
    ("OnePlus 9", "11.0", true),
    ("Xiaomi Redmi Note 11", "11.0", false),
    ("Motorola Moto G71 5G", "11.0", false),
];

const VENDOR_PREFIXES: &[&str] = &["samsung ", "google "];

impl DeviceProfile {
    /// Looks `name` up in the profile table. Vendor prefixes are optional, so
    /// "Pixel 7" and "Google Pixel 7" resolve to the same entry. Unknown names
    /// get `default_version` and are marked unreliable.
    pub fn resolve(name: &str, default_version: &str) -> DeviceProfile {
        let wanted = strip_vendor(name.trim());
        let hit = PROFILES
            .iter()
            .find(|(n, _, _)| strip_vendor(n).eq_ignore_ascii_case(&wanted));

        match hit {
            Some((_, version, reliable)) => DeviceProfile {
                name: name.trim().to_string(),
                platform_version: version.to_string(),
                reliable: *reliable,
                known: true,
            },
            None => DeviceProfile {
                name: name.trim().to_string(),
                platform_version: default_version.to_string(),
                reliable: false,
                known: false,
            },
        }
    }
}

fn strip_vendor(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    for prefix in VENDOR_PREFIXES {
        if let Some(rest) = lower.strip_prefix(prefix) {
            return rest.to_string();
        }
    }
    lower
}
