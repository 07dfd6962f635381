//! Frame-accurate timecode for playout lists
//!
//! A [`TimeCode`] is a frame count within one broadcast day at a given
//! [`FrameRate`]. The same type is used for points in time (on-air times,
//! server clock) and for durations (event duration, SOM, latency).
//!
//! # Day Wrap
//!
//! All arithmetic wraps at midnight: adding 2 seconds to `23:59:59:00`
//! yields `00:00:01:00`. Ordering and equality compare real time within the
//! day, so `00:00:01:00` sorts before `23:59:59:00`. Callers that need to
//! reason about intervals crossing midnight use [`crate::interval::is_between`].
//!
//! # Drop-Frame
//!
//! 29.97 and 59.94 drop-frame rates skip frame *labels* (not frames) at the
//! start of each minute except every tenth minute. The frame count stored in
//! a `TimeCode` is always the real number of frames since midnight; labels
//! are produced by [`TimeCode::to_hmsf`] and parsed by [`TimeCode::from_hmsf`].
//!
//! # Examples
//!
//! ```rust
//! use bac_common::timecode::{FrameRate, TimeCode};
//!
//! let now = TimeCode::from_hmsf(10, 0, 0, 0, FrameRate::Fps25).unwrap();
//! let latency = TimeCode::from_millis(10_000, FrameRate::Fps25);
//! let break_time = now + latency;
//! assert_eq!(break_time.to_string(), "10:00:10:00");
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

// ============================================================================
// Frame Rates
// ============================================================================

/// Seconds in one broadcast day
const SECONDS_PER_DAY: i64 = 86_400;

/// Minutes in one broadcast day, and how many of them keep all frame labels
const MINUTES_PER_DAY: i64 = 1_440;
const TENTH_MINUTES_PER_DAY: i64 = 144;

/// Supported video frame rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameRate {
    /// 23.976 fps (24000/1001), non-drop
    #[serde(rename = "23.976")]
    Fps23_976,
    /// 24 fps
    #[serde(rename = "24")]
    Fps24,
    /// 25 fps (PAL)
    #[serde(rename = "25")]
    Fps25,
    /// 29.97 fps drop-frame (NTSC)
    #[serde(rename = "29.97df")]
    Fps29_97Df,
    /// 29.97 fps non-drop
    #[serde(rename = "29.97")]
    Fps29_97,
    /// 30 fps
    #[serde(rename = "30")]
    Fps30,
    /// 50 fps
    #[serde(rename = "50")]
    Fps50,
    /// 59.94 fps drop-frame
    #[serde(rename = "59.94df")]
    Fps59_94Df,
    /// 60 fps
    #[serde(rename = "60")]
    Fps60,
}

impl FrameRate {
    /// Frame labels per second (the `FF` field wraps at this value)
    pub fn nominal_fps(self) -> i64 {
        match self {
            FrameRate::Fps23_976 | FrameRate::Fps24 => 24,
            FrameRate::Fps25 => 25,
            FrameRate::Fps29_97Df | FrameRate::Fps29_97 | FrameRate::Fps30 => 30,
            FrameRate::Fps50 => 50,
            FrameRate::Fps59_94Df | FrameRate::Fps60 => 60,
        }
    }

    /// Exact frame rate as `(numerator, denominator)` frames per second
    pub fn rational(self) -> (i64, i64) {
        match self {
            FrameRate::Fps23_976 => (24_000, 1_001),
            FrameRate::Fps24 => (24, 1),
            FrameRate::Fps25 => (25, 1),
            FrameRate::Fps29_97Df | FrameRate::Fps29_97 => (30_000, 1_001),
            FrameRate::Fps30 => (30, 1),
            FrameRate::Fps50 => (50, 1),
            FrameRate::Fps59_94Df => (60_000, 1_001),
            FrameRate::Fps60 => (60, 1),
        }
    }

    /// Whether frame labels are dropped at minute boundaries
    pub fn is_drop_frame(self) -> bool {
        self.dropped_per_minute() > 0
    }

    fn dropped_per_minute(self) -> i64 {
        match self {
            FrameRate::Fps29_97Df => 2,
            FrameRate::Fps59_94Df => 4,
            _ => 0,
        }
    }

    /// Number of frames between two midnights
    ///
    /// ```rust
    /// use bac_common::timecode::FrameRate;
    ///
    /// assert_eq!(FrameRate::Fps25.frames_per_day(), 2_160_000);
    /// assert_eq!(FrameRate::Fps29_97Df.frames_per_day(), 2_589_408);
    /// ```
    pub fn frames_per_day(self) -> i64 {
        let labels = self.nominal_fps() * SECONDS_PER_DAY;
        labels - self.dropped_per_minute() * (MINUTES_PER_DAY - TENTH_MINUTES_PER_DAY)
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        FrameRate::Fps25
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FrameRate::Fps23_976 => "23.976",
            FrameRate::Fps24 => "24",
            FrameRate::Fps25 => "25",
            FrameRate::Fps29_97Df => "29.97df",
            FrameRate::Fps29_97 => "29.97",
            FrameRate::Fps30 => "30",
            FrameRate::Fps50 => "50",
            FrameRate::Fps59_94Df => "59.94df",
            FrameRate::Fps60 => "60",
        };
        write!(f, "{}", label)
    }
}

impl std::str::FromStr for FrameRate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "23.976" => Ok(FrameRate::Fps23_976),
            "24" => Ok(FrameRate::Fps24),
            "25" => Ok(FrameRate::Fps25),
            "29.97df" | "df" => Ok(FrameRate::Fps29_97Df),
            "29.97" => Ok(FrameRate::Fps29_97),
            "30" => Ok(FrameRate::Fps30),
            "50" => Ok(FrameRate::Fps50),
            "59.94df" => Ok(FrameRate::Fps59_94Df),
            "60" => Ok(FrameRate::Fps60),
            other => Err(Error::InvalidInput(format!("Unknown frame rate: {}", other))),
        }
    }
}

// ============================================================================
// TimeCode
// ============================================================================

/// Frame-accurate point in time or duration within one broadcast day
#[derive(Debug, Clone, Copy)]
pub struct TimeCode {
    frames: i64,
    rate: FrameRate,
}

impl TimeCode {
    /// Build from a frame count, wrapping into the broadcast day
    pub fn from_frames(frames: i64, rate: FrameRate) -> Self {
        Self {
            frames: frames.rem_euclid(rate.frames_per_day()),
            rate,
        }
    }

    /// Midnight, or a zero-length duration
    pub fn zero(rate: FrameRate) -> Self {
        Self { frames: 0, rate }
    }

    /// Build from milliseconds, truncating to the containing frame
    ///
    /// ```rust
    /// use bac_common::timecode::{FrameRate, TimeCode};
    ///
    /// assert_eq!(TimeCode::from_millis(1_000, FrameRate::Fps25).frames(), 25);
    /// assert_eq!(TimeCode::from_millis(1_039, FrameRate::Fps25).frames(), 25);
    /// assert_eq!(TimeCode::from_millis(1_040, FrameRate::Fps25).frames(), 26);
    /// ```
    pub fn from_millis(millis: i64, rate: FrameRate) -> Self {
        let (num, den) = rate.rational();
        let frames = (millis as i128 * num as i128).div_euclid(1_000 * den as i128);
        Self::from_frames(frames as i64, rate)
    }

    /// Build from whole seconds
    pub fn from_seconds(seconds: i64, rate: FrameRate) -> Self {
        Self::from_millis(seconds * 1_000, rate)
    }

    /// Build from an `HH:MM:SS:FF` label
    ///
    /// Drop-frame rates reject the labels that do not exist (frames 0 and 1
    /// of every minute not divisible by ten at 29.97).
    pub fn from_hmsf(hours: u32, minutes: u32, seconds: u32, frames: u32, rate: FrameRate) -> Result<Self> {
        let nominal = rate.nominal_fps();
        let dropped = rate.dropped_per_minute();

        if hours >= 24 || minutes >= 60 || seconds >= 60 || frames as i64 >= nominal {
            return Err(Error::InvalidTimeCode(format!(
                "{:02}:{:02}:{:02}:{:02} out of range at {} fps",
                hours, minutes, seconds, frames, rate
            )));
        }
        if dropped > 0 && seconds == 0 && minutes % 10 != 0 && (frames as i64) < dropped {
            return Err(Error::InvalidTimeCode(format!(
                "{:02}:{:02}:{:02};{:02} is a dropped label",
                hours, minutes, seconds, frames
            )));
        }

        let (h, m, s, f) = (hours as i64, minutes as i64, seconds as i64, frames as i64);
        let total_minutes = h * 60 + m;
        let labels = (h * 3_600 + m * 60 + s) * nominal + f;
        let count = labels - dropped * (total_minutes - total_minutes / 10);
        Ok(Self::from_frames(count, rate))
    }

    /// Parse `HH:MM:SS:FF` (or `HH:MM:SS;FF`) at the given rate
    pub fn parse_with_rate(s: &str, rate: FrameRate) -> Result<Self> {
        let fields: Vec<&str> = s.trim().split([':', ';', '.']).collect();
        if fields.len() != 4 {
            return Err(Error::InvalidTimeCode(format!("Expected HH:MM:SS:FF, got {:?}", s)));
        }
        let mut parsed = [0u32; 4];
        for (slot, field) in parsed.iter_mut().zip(&fields) {
            *slot = field
                .parse()
                .map_err(|_| Error::InvalidTimeCode(format!("Non-numeric field in {:?}", s)))?;
        }
        Self::from_hmsf(parsed[0], parsed[1], parsed[2], parsed[3], rate)
    }

    /// Frames since midnight
    pub fn frames(&self) -> i64 {
        self.frames
    }

    pub fn rate(&self) -> FrameRate {
        self.rate
    }

    pub fn is_zero(&self) -> bool {
        self.frames == 0
    }

    /// Real elapsed milliseconds since midnight (truncating)
    pub fn to_millis(&self) -> i64 {
        let (num, den) = self.rate.rational();
        (self.frames as i128 * 1_000 * den as i128 / num as i128) as i64
    }

    /// Same instant expressed at another frame rate (nearest frame)
    pub fn at_rate(&self, rate: FrameRate) -> Self {
        if rate == self.rate {
            return *self;
        }
        let (num_from, den_from) = self.rate.rational();
        let (num_to, den_to) = rate.rational();
        let scaled = self.frames as i128 * den_from as i128 * num_to as i128;
        let divisor = num_from as i128 * den_to as i128;
        let frames = (scaled + divisor / 2) / divisor;
        Self::from_frames(frames as i64, rate)
    }

    /// Split into the `(HH, MM, SS, FF)` label
    pub fn to_hmsf(&self) -> (u32, u32, u32, u32) {
        let nominal = self.rate.nominal_fps();
        let dropped = self.rate.dropped_per_minute();
        let mut labels = self.frames;

        if dropped > 0 {
            let per_ten_minutes = nominal * 600 - dropped * 9;
            let per_minute = nominal * 60 - dropped;
            let tens = labels / per_ten_minutes;
            let rest = labels % per_ten_minutes;
            labels += dropped * 9 * tens;
            if rest > dropped {
                labels += dropped * ((rest - dropped) / per_minute);
            }
        }

        let f = labels % nominal;
        let total_seconds = labels / nominal;
        (
            (total_seconds / 3_600) as u32,
            ((total_seconds / 60) % 60) as u32,
            (total_seconds % 60) as u32,
            f as u32,
        )
    }

    /// Compare exact real time against `other`, independent of frame rate
    fn real_time_cmp(&self, other: &Self) -> Ordering {
        let (num_a, den_a) = self.rate.rational();
        let (num_b, den_b) = other.rate.rational();
        let lhs = self.frames as i128 * den_a as i128 * num_b as i128;
        let rhs = other.frames as i128 * den_b as i128 * num_a as i128;
        lhs.cmp(&rhs)
    }
}

impl PartialEq for TimeCode {
    fn eq(&self, other: &Self) -> bool {
        self.real_time_cmp(other) == Ordering::Equal
    }
}

impl Eq for TimeCode {}

impl PartialOrd for TimeCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeCode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.real_time_cmp(other)
    }
}

impl Add for TimeCode {
    type Output = TimeCode;

    /// Frame-accurate addition in the left operand's rate, wrapping at midnight
    fn add(self, rhs: TimeCode) -> TimeCode {
        let rhs = rhs.at_rate(self.rate);
        TimeCode::from_frames(self.frames + rhs.frames, self.rate)
    }
}

impl Sub for TimeCode {
    type Output = TimeCode;

    /// Frame-accurate subtraction in the left operand's rate, wrapping at midnight
    fn sub(self, rhs: TimeCode) -> TimeCode {
        let rhs = rhs.at_rate(self.rate);
        TimeCode::from_frames(self.frames - rhs.frames, self.rate)
    }
}

impl fmt::Display for TimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s, fr) = self.to_hmsf();
        let sep = if self.rate.is_drop_frame() { ';' } else { ':' };
        write!(f, "{:02}:{:02}:{:02}{}{:02}", h, m, s, sep, fr)
    }
}

// ============================================================================
// Tests Module
// ============================================================================

#[cfg(test)]
#[path = "timecode_tests.rs"]
mod tests;
