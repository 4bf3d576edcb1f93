//! Backup schedule settings and remote backup listing.
//!
//! The backend stores the daily backup time in UTC; the console displays it
//! at a fixed offset. Only hour and minute are modeled, so conversion wraps
//! modulo 24 hours.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

const MINUTES_PER_DAY: i32 = 24 * 60;

fn time_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[0-9]{2}:[0-9]{2}$").ok())
        .as_ref()
}

/// A wall-clock time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BackupTime {
    hour: u8,
    minute: u8,
}

impl BackupTime {
    /// Creates a time, rejecting out-of-range values.
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        if hour >= 24 || minute >= 60 {
            return Err(CoreError::validation(
                "time",
                "Время должно быть в формате ЧЧ:ММ",
            ));
        }
        Ok(Self { hour, minute })
    }

    /// Parses `"HH:MM"`. An empty string means no schedule.
    ///
    /// # Examples
    ///
    /// ```
    /// use quizdesk_core::BackupTime;
    ///
    /// let utc = BackupTime::parse("21:30").unwrap().unwrap();
    /// assert_eq!(utc.to_local(3).to_string(), "00:30");
    /// assert!(BackupTime::parse("").unwrap().is_none());
    /// ```
    pub fn parse(text: &str) -> Result<Option<Self>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let invalid = || CoreError::validation("time", "Время должно быть в формате ЧЧ:ММ");
        if !time_pattern().is_some_and(|re| re.is_match(text)) {
            return Err(invalid());
        }
        let (h, m) = text.split_once(':').ok_or_else(invalid)?;
        let hour = h.parse::<u8>().map_err(|_| invalid())?;
        let minute = m.parse::<u8>().map_err(|_| invalid())?;
        Self::new(hour, minute).map(Some)
    }

    /// Hour, 0..24.
    #[must_use]
    pub const fn hour(self) -> u8 {
        self.hour
    }

    /// Minute, 0..60.
    #[must_use]
    pub const fn minute(self) -> u8 {
        self.minute
    }

    fn minutes(self) -> i32 {
        i32::from(self.hour) * 60 + i32::from(self.minute)
    }

    fn from_minutes(total: i32) -> Self {
        let wrapped = total.rem_euclid(MINUTES_PER_DAY);
        // rem_euclid keeps both parts in range
        Self {
            hour: u8::try_from(wrapped / 60).unwrap_or(0),
            minute: u8::try_from(wrapped % 60).unwrap_or(0),
        }
    }

    /// Shifts a UTC time to the display offset.
    #[must_use]
    pub fn to_local(self, offset_hours: i32) -> Self {
        Self::from_minutes(self.minutes() + offset_hours * 60)
    }

    /// Shifts a displayed time back to UTC.
    #[must_use]
    pub fn to_utc(self, offset_hours: i32) -> Self {
        Self::from_minutes(self.minutes() - offset_hours * 60)
    }
}

impl fmt::Display for BackupTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Backup schedule as stored by the backend (time in UTC).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSettings {
    /// `"HH:MM"` in UTC, or empty for no schedule.
    #[serde(default)]
    pub time: String,
    /// Telegram chat receiving backup archives.
    #[serde(default)]
    pub chat_id: String,
    /// Remote storage OAuth token.
    #[serde(default)]
    pub yadisk_token: String,
}

/// The settings form with time shown at the display offset.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BackupSettingsForm {
    /// `"HH:MM"` at the display offset, or empty.
    pub local_time: String,
    /// Telegram chat id.
    pub chat_id: String,
    /// Remote storage token.
    pub yadisk_token: String,
}

impl fmt::Debug for BackupSettingsForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupSettingsForm")
            .field("local_time", &self.local_time)
            .field("chat_id", &self.chat_id)
            .field("yadisk_token", &"<redacted>")
            .finish()
    }
}

impl BackupSettingsForm {
    /// Fills the form from stored settings.
    pub fn from_settings(settings: &BackupSettings, offset_hours: i32) -> Result<Self> {
        let local_time = BackupTime::parse(&settings.time)?
            .map(|t| t.to_local(offset_hours).to_string())
            .unwrap_or_default();
        Ok(Self {
            local_time,
            chat_id: settings.chat_id.clone(),
            yadisk_token: settings.yadisk_token.clone(),
        })
    }

    /// Validates the form and converts the time back to UTC.
    pub fn to_settings(&self, offset_hours: i32) -> Result<BackupSettings> {
        let chat_id = self.chat_id.trim();
        if chat_id.is_empty() {
            return Err(CoreError::validation("chat_id", "Укажите ID чата"));
        }
        let time = BackupTime::parse(&self.local_time)?
            .map(|t| t.to_utc(offset_hours).to_string())
            .unwrap_or_default();
        Ok(BackupSettings {
            time,
            chat_id: chat_id.to_string(),
            yadisk_token: self.yadisk_token.trim().to_string(),
        })
    }
}

/// An archive stored on the remote disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBackup {
    /// File name.
    pub name: String,
    /// Remote path passed back for restore.
    pub path: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Last modification timestamp.
    #[serde(default)]
    pub modified: Option<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created: Option<String>,
}

/// Body of the restore-from-remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRestoreRequest {
    /// Remote archive path.
    pub path: String,
}

/// Human-readable byte size, e.g. `1.5 MB`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
