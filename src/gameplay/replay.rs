//! `.osr` replay header reader.
//!
//! Only the score header is decoded; the LZMA-compressed input frames are
//! kept as opaque bytes.

use chrono::{DateTime, Utc};
use log::debug;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

const STRING_ABSENT: u8 = 0x00;
const STRING_PRESENT: u8 = 0x0b;
const TICKS_PER_SECOND: i64 = 10_000_000;
const TICKS_TO_UNIX_EPOCH_SECONDS: i64 = 62_135_596_800;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("I/O error reading replay: {0}")]
    Io(#[from] io::Error),

    #[error("Replay ended unexpectedly while reading {0}")]
    Truncated(&'static str),

    #[error("Invalid string marker 0x{marker:02x} for {field}")]
    BadStringMarker { field: &'static str, marker: u8 },

    #[error("String length overflow for {0}")]
    StringLength(&'static str),

    #[error("Invalid UTF-8 in {0}")]
    Utf8(&'static str),

    #[error("Negative replay data length: {0}")]
    NegativeLength(i32),

    #[error("Malformed life graph entry '{0}'")]
    LifeGraph(String),
}

#[allow(dead_code)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HitStatistics {
    pub count_300: u16,
    pub count_100: u16,
    pub count_50: u16,
    pub count_geki: u16,
    pub count_katu: u16,
    pub count_miss: u16,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LifePoint {
    pub time_ms: u32,
    pub health: f32,
}

#[allow(dead_code)]
#[derive(Clone, Debug, PartialEq)]
pub struct Score {
    pub ruleset: u8,
    pub version: i32,
    pub beatmap_hash: Option<String>,
    pub player: Option<String>,
    pub replay_hash: Option<String>,
    pub statistics: HitStatistics,
    pub total_score: i32,
    pub max_combo: u16,
    pub perfect: bool,
    pub mods: i32,
    pub life_graph: Vec<LifePoint>,
    pub timestamp: Option<DateTime<Utc>>,
    pub compressed_frames: Vec<u8>,
    pub online_id: Option<i64>,
}

impl Score {
    /// Length of the play, taken from the last life graph sample.
    pub fn duration(&self) -> Duration {
        let last = self.life_graph.iter().map(|p| p.time_ms).max().unwrap_or(0);
        Duration::from_millis(u64::from(last))
    }
}

pub fn read_replay_file(path: &Path) -> Result<Score, ReplayError> {
    let bytes = fs::read(path)?;
    let score = decode(&bytes)?;
    debug!("Read replay '{}' ({} bytes of frames).", path.display(), score.compressed_frames.len());
    Ok(score)
}

pub fn decode(bytes: &[u8]) -> Result<Score, ReplayError> {
    let mut r = Reader { data: bytes };

    let ruleset = r.u8("ruleset")?;
    let version = r.i32("version")?;
    let beatmap_hash = r.string("beatmap hash")?;
    let player = r.string("player name")?;
    let replay_hash = r.string("replay hash")?;
    let statistics = HitStatistics {
        count_300: r.u16("300 count")?,
        count_100: r.u16("100 count")?,
        count_50: r.u16("50 count")?,
        count_geki: r.u16("geki count")?,
        count_katu: r.u16("katu count")?,
        count_miss: r.u16("miss count")?,
    };
    let total_score = r.i32("total score")?;
    let max_combo = r.u16("max combo")?;
    let perfect = r.u8("perfect flag")? != 0;
    let mods = r.i32("mods")?;
    let life_graph = parse_life_graph(r.string("life graph")?.as_deref().unwrap_or(""))?;
    let timestamp = ticks_to_datetime(r.i64("timestamp")?);

    let frames_len = r.i32("replay data length")?;
    if frames_len < 0 {
        return Err(ReplayError::NegativeLength(frames_len));
    }
    let compressed_frames = r.take(frames_len as usize, "replay data")?.to_vec();

    // Old replays end here.
    let online_id = if r.data.len() >= 8 { Some(r.i64("online id")?) } else { None };

    Ok(Score {
        ruleset,
        version,
        beatmap_hash,
        player,
        replay_hash,
        statistics,
        total_score,
        max_combo,
        perfect,
        mods,
        life_graph,
        timestamp,
        compressed_frames,
        online_id,
    })
}

fn ticks_to_datetime(ticks: i64) -> Option<DateTime<Utc>> {
    if ticks <= 0 {
        return None;
    }
    let secs = ticks / TICKS_PER_SECOND - TICKS_TO_UNIX_EPOCH_SECONDS;
    let nanos = (ticks % TICKS_PER_SECOND) * 100;
    DateTime::<Utc>::from_timestamp(secs, nanos as u32)
}

fn parse_life_graph(raw: &str) -> Result<Vec<LifePoint>, ReplayError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (time, health) = entry
                .split_once('|')
                .or_else(|| entry.split_once('/'))
                .ok_or_else(|| ReplayError::LifeGraph(entry.to_string()))?;
            let time_ms = time.trim().parse::<u32>().map_err(|_| ReplayError::LifeGraph(entry.to_string()))?;
            let health = health.trim().parse::<f32>().map_err(|_| ReplayError::LifeGraph(entry.to_string()))?;
            Ok(LifePoint { time_ms, health })
        })
        .collect()
}

struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], ReplayError> {
        if self.data.len() < n {
            return Err(ReplayError::Truncated(field));
        }
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        Ok(head)
    }

    fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], ReplayError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, field)?);
        Ok(out)
    }

    fn u8(&mut self, field: &'static str) -> Result<u8, ReplayError> {
        Ok(self.array::<1>(field)?[0])
    }

    fn u16(&mut self, field: &'static str) -> Result<u16, ReplayError> {
        Ok(u16::from_le_bytes(self.array(field)?))
    }

    fn i32(&mut self, field: &'static str) -> Result<i32, ReplayError> {
        Ok(i32::from_le_bytes(self.array(field)?))
    }

    fn i64(&mut self, field: &'static str) -> Result<i64, ReplayError> {
        Ok(i64::from_le_bytes(self.array(field)?))
    }

    fn uleb128(&mut self, field: &'static str) -> Result<usize, ReplayError> {
        let mut value: usize = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.u8(field)?;
            if shift >= usize::BITS {
                return Err(ReplayError::StringLength(field));
            }
            value |= usize::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    fn string(&mut self, field: &'static str) -> Result<Option<String>, ReplayError> {
        match self.u8(field)? {
            STRING_ABSENT => Ok(None),
            STRING_PRESENT => {
                let len = self.uleb128(field)?;
                let bytes = self.take(len, field)?;
                let s = std::str::from_utf8(bytes).map_err(|_| ReplayError::Utf8(field))?;
                Ok(Some(s.to_string()))
            }
            marker => Err(ReplayError::BadStringMarker { field, marker }),
        }
    }
}
