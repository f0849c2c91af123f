//! Profile records as stored in `launcher_profiles.json`.
//!
//! Formatting example of one entry under `profiles`:
//!
//! ```json
//! "mjrianz5n6o0ntue4gvzfu9zi7i8lg4y": {
//!   "created": "2019-12-12T03:11:18.000Z",
//!   "gameDir": "/home/user/.minecraft/trollauncher/mjrianz5n6o0ntue4gvzfu9zi7i8lg4y",
//!   "icon": "TNT",
//!   "javaDir": "/usr/lib/jvm/java-8-openjdk-amd64/bin/java",
//!   "lastUsed": "2019-12-12T03:11:18.000Z",
//!   "lastVersionId": "1.14.4-forge-28.1.106",
//!   "name": "Adakite 58",
//!   "type": "custom"
//! }
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Profile type that marks a profile as user-created (and possibly ours).
pub const CUSTOM_PROFILE_TYPE: &str = "custom";

// JSON keys used by the launcher
pub const KEY_NAME: &str = "name";
pub const KEY_TYPE: &str = "type";
pub const KEY_ICON: &str = "icon";
pub const KEY_VERSION: &str = "lastVersionId";
pub const KEY_GAME_DIR: &str = "gameDir";
pub const KEY_JAVA_DIR: &str = "javaDir";
pub const KEY_CREATED: &str = "created";
pub const KEY_LAST_USED: &str = "lastUsed";

/// One launcher profile.
///
/// Only `id` is required. When used as an update, `None` fields leave the
/// stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileRecord {
    pub id: String,
    pub name: Option<String>,
    pub profile_type: Option<String>,
    pub icon: Option<String>,
    /// Version id the launcher starts, e.g. `1.14.4-forge-28.1.106`
    pub version: Option<String>,
    pub game_path: Option<PathBuf>,
    pub java_path: Option<PathBuf>,
    pub created_time: Option<DateTime<Utc>>,
    pub last_used_time: Option<DateTime<Utc>>,
}

impl ProfileRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Read the known fields of a profile object. Fields that are missing or
    /// aren't strings come back as `None`.
    pub fn from_json(id: &str, value: &Value) -> Self {
        let string = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        let time = |key: &str| value.get(key).and_then(Value::as_str).and_then(parse_time);
        Self {
            id: id.to_string(),
            name: string(KEY_NAME),
            profile_type: string(KEY_TYPE),
            icon: string(KEY_ICON),
            version: string(KEY_VERSION),
            game_path: string(KEY_GAME_DIR).map(PathBuf::from),
            java_path: string(KEY_JAVA_DIR).map(PathBuf::from),
            created_time: time(KEY_CREATED),
            last_used_time: time(KEY_LAST_USED),
        }
    }

    /// Copy every set field onto `object`, leaving other keys untouched.
    pub fn merge_into(&self, object: &mut Map<String, Value>) {
        let mut set = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                object.insert(key.to_string(), Value::String(value));
            }
        };
        set(KEY_NAME, self.name.clone());
        set(KEY_TYPE, self.profile_type.clone());
        set(KEY_ICON, self.icon.clone());
        set(KEY_VERSION, self.version.clone());
        set(KEY_GAME_DIR, self.game_path.as_ref().map(|p| p.display().to_string()));
        set(KEY_JAVA_DIR, self.java_path.as_ref().map(|p| p.display().to_string()));
        set(KEY_CREATED, self.created_time.map(format_time));
        set(KEY_LAST_USED, self.last_used_time.map(format_time));
    }

    pub fn is_custom(&self) -> bool {
        self.profile_type.as_deref() == Some(CUSTOM_PROFILE_TYPE)
    }
}

/// `2019-12-12T03:11:18.000Z`
pub fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a launcher timestamp. Accepts any RFC 3339 time, with or without
/// fractional seconds.
pub fn parse_time(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|time| time.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_time_format() {
        let time = Utc.with_ymd_and_hms(2019, 12, 12, 3, 11, 18).unwrap();
        assert_eq!(format_time(time), "2019-12-12T03:11:18.000Z");
        assert_eq!(parse_time("2019-12-12T03:11:18.000Z"), Some(time));
        assert_eq!(parse_time("2019-12-12T03:11:18Z"), Some(time));
        assert_eq!(parse_time("1970-01-01T00:00:00.000Z").map(|t| t.timestamp()), Some(0));
        assert_eq!(parse_time("yesterday"), None);
    }

    #[test]
    fn test_from_json() {
        let value = json!({
            "name": "Adakite 58",
            "type": "custom",
            "icon": "TNT",
            "lastVersionId": "1.14.4-forge-28.1.106",
            "gameDir": "/mc/trollauncher/abc",
            "created": "2019-12-12T03:11:18.000Z",
            "lastUsed": 12345,
            "javaArgs": "-Xmx4G"
        });
        let record = ProfileRecord::from_json("abc", &value);
        assert_eq!(record.id, "abc");
        assert_eq!(record.name.as_deref(), Some("Adakite 58"));
        assert!(record.is_custom());
        assert_eq!(record.version.as_deref(), Some("1.14.4-forge-28.1.106"));
        assert_eq!(record.game_path, Some(PathBuf::from("/mc/trollauncher/abc")));
        assert_eq!(record.java_path, None);
        assert!(record.created_time.is_some());
        // Non-string values are ignored
        assert_eq!(record.last_used_time, None);
    }

    #[test]
    fn test_merge_keeps_unknown_fields() {
        let mut object = json!({"name": "Old", "icon": "TNT", "javaArgs": "-Xmx4G"})
            .as_object()
            .cloned()
            .unwrap();
        let mut update = ProfileRecord::new("abc");
        update.name = Some("New".to_string());
        update.merge_into(&mut object);
        assert_eq!(object["name"], "New");
        assert_eq!(object["icon"], "TNT");
        assert_eq!(object["javaArgs"], "-Xmx4G");
        assert!(!object.contains_key("lastVersionId"));
    }
}
