use std::collections::HashMap;
use std::fmt;

/// Who may check tickets in and who may edit the event.
///
/// Station keys come from `CHECKIN_STATION_KEYS` as `station=key` pairs,
/// e.g. `north-gate=s3cret,vip-door=0th3r`. With no keys configured the
/// check-in endpoint is open to anyone who can reach it.
#[derive(Clone, Default)]
pub struct AccessConfig {
    admin_token: Option<String>,
    /// Key -> station name
    stations: HashMap<String, String>,
}

impl AccessConfig {
    pub fn new(admin_token: Option<String>, station_keys: &str) -> Self {
        Self {
            admin_token: admin_token.filter(|t| !t.trim().is_empty()),
            stations: parse_station_keys(station_keys),
        }
    }

    pub fn check_in_is_open(&self) -> bool {
        self.stations.is_empty()
    }

    /// Station name for a presented key.
    pub fn station_for(&self, key: &str) -> Option<&str> {
        self.stations.get(key).map(String::as_str)
    }

    pub fn admin_enabled(&self) -> bool {
        self.admin_token.is_some()
    }

    pub fn is_admin(&self, token: &str) -> bool {
        self.admin_token.as_deref() == Some(token)
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }
}

// Keys stay out of logs
impl fmt::Debug for AccessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessConfig")
            .field("admin_enabled", &self.admin_enabled())
            .field("stations", &self.stations.values().collect::<Vec<_>>())
            .finish()
    }
}

fn parse_station_keys(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                return None;
            }
            match entry.split_once('=') {
                Some((station, key)) if !station.trim().is_empty() && !key.trim().is_empty() => {
                    Some((key.trim().to_string(), station.trim().to_string()))
                }
                _ => {
                    tracing::warn!("Access: ignoring malformed station entry (expected station=key)");
                    None
                }
            }
        })
        .collect()
}
