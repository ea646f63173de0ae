//! Media Overlay Module
//!
//! This module defines the value types used to express audio/text
//! synchronization: the narration timestamp, an unbounded clock offset
//! ordered by its millisecond equivalent, and the narration phrase, which
//! binds a text anchor to an audio clip range. Phrases are produced by the
//! synchronization-document walker of the parsing layer and consumed as
//! plain data by players and exporters.

use std::{
    fmt::{self, Display, Formatter},
    ops::{Add, Sub},
    sync::Arc,
};

use crate::content::{LocalByteContent, LocalTextContent};

const MILLIS_PER_HOUR: u64 = 3_600_000;
const MILLIS_PER_MINUTE: u64 = 60_000;
const MILLIS_PER_SECOND: u64 = 1_000;

/// A clock offset inside an audio resource
///
/// Narration timestamps express the begin and end offsets of audio clips in
/// synchronization documents. The hour component is unbounded, so audio
/// running longer than 24 hours stays representable; the minute, second and
/// millisecond components conventionally stay below 60/60/1000 but are not
/// enforced, since comparison and arithmetic operate on the equivalent
/// millisecond count.
#[derive(Debug, Clone, Copy)]
pub struct NarrationTimestamp {
    /// The hour component, unbounded
    pub hour: u32,

    /// The minute component
    pub minute: u32,

    /// The second component
    pub second: u32,

    /// The millisecond component
    pub millisecond: u32,
}

impl NarrationTimestamp {
    /// Creates a timestamp from its clock components.
    pub fn new(hour: u32, minute: u32, second: u32, millisecond: u32) -> Self {
        Self {
            hour,
            minute,
            second,
            millisecond,
        }
    }

    /// Creates a normalized timestamp from a total millisecond count.
    pub fn from_milliseconds(milliseconds: u64) -> Self {
        Self {
            hour: (milliseconds / MILLIS_PER_HOUR) as u32,
            minute: (milliseconds / MILLIS_PER_MINUTE % 60) as u32,
            second: (milliseconds / MILLIS_PER_SECOND % 60) as u32,
            millisecond: (milliseconds % MILLIS_PER_SECOND) as u32,
        }
    }

    /// Returns the equivalent total millisecond count.
    pub fn total_milliseconds(&self) -> u64 {
        self.hour as u64 * MILLIS_PER_HOUR
            + self.minute as u64 * MILLIS_PER_MINUTE
            + self.second as u64 * MILLIS_PER_SECOND
            + self.millisecond as u64
    }
}

impl PartialEq for NarrationTimestamp {
    fn eq(&self, other: &Self) -> bool {
        self.total_milliseconds() == other.total_milliseconds()
    }
}

impl Eq for NarrationTimestamp {}

impl Ord for NarrationTimestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.total_milliseconds().cmp(&other.total_milliseconds())
    }
}

impl PartialOrd for NarrationTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for NarrationTimestamp {
    type Output = NarrationTimestamp;

    fn add(self, rhs: Self) -> Self::Output {
        Self::from_milliseconds(self.total_milliseconds() + rhs.total_milliseconds())
    }
}

impl Sub for NarrationTimestamp {
    type Output = NarrationTimestamp;

    /// Returns the normalized difference, saturating at zero.
    fn sub(self, rhs: Self) -> Self::Output {
        Self::from_milliseconds(
            self.total_milliseconds()
                .saturating_sub(rhs.total_milliseconds()),
        )
    }
}

impl Display for NarrationTimestamp {
    /// Formats the timestamp as `H:MM:SS`, appending `.mmm` only when the
    /// millisecond component is non-zero.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}:{:02}", self.hour, self.minute, self.second)?;
        if self.millisecond != 0 {
            write!(f, ".{:03}", self.millisecond)?;
        }

        Ok(())
    }
}

/// The audio clip range narrated over one phrase
#[derive(Clone)]
pub struct NarrationClip {
    /// The audio resource the clip is cut from
    pub content: Arc<LocalByteContent>,

    /// The clip begin offset
    pub begin: NarrationTimestamp,

    /// The clip end offset
    pub end: NarrationTimestamp,
}

impl NarrationClip {
    /// Returns the clip length as a timestamp.
    pub fn duration(&self) -> NarrationTimestamp {
        self.end - self.begin
    }
}

/// One text-anchor-to-audio-range pairing
///
/// A phrase points at a text content document, optionally narrowed to an
/// anchor inside it, and optionally carries the audio clip that narrates
/// it. Phrases without audio appear in overlays that pair silence or
/// unrecorded passages.
#[derive(Clone)]
pub struct NarrationPhrase {
    /// The text document this phrase belongs to
    pub text: Arc<LocalTextContent>,

    /// The fragment inside the text document, when the phrase is narrower
    /// than the whole document
    pub anchor: Option<String>,

    /// The audio clip narrating this phrase
    pub audio: Option<NarrationClip>,
}
