//! Scripted in-memory engine for pipeline tests.

#![allow(dead_code)]

use std::collections::VecDeque;

use sid2wav::{EngineError, EngineOp, RenderChunk, RomSet, SidEngine, TuneInfo};

/// Canned outcome of one render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A chunk of `n` samples
    Data(usize),
    /// No samples this call
    Empty,
    /// End of stream
    Exhausted,
}

/// Engine call as seen by the test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Configure { sample_rate: u32, stereo: bool },
    SetSystemRoms(RomSet),
    LoadTune(usize),
    SelectSong(u32),
    Render(u32),
}

/// Engine double that replays a script and records every call.
pub struct ScriptedEngine {
    pub calls: Vec<Call>,
    steps: VecDeque<Step>,
    fallback: Step,
    chunk: Vec<i16>,
    sample_rate: u32,
    channels: u16,
    next_sample: i16,
    pub fail_configure: Option<String>,
    pub fail_roms: Option<String>,
    pub fail_load: Option<String>,
    pub songs: u32,
}

impl ScriptedEngine {
    /// Engine that always returns `step` once the script is used up.
    pub fn new(steps: Vec<Step>, fallback: Step) -> Self {
        Self {
            calls: Vec::new(),
            steps: steps.into(),
            fallback,
            chunk: Vec::new(),
            sample_rate: 44_100,
            channels: 2,
            next_sample: 0,
            fail_configure: None,
            fail_roms: None,
            fail_load: None,
            songs: 1,
        }
    }

    /// Engine that never ends and always fills `cycles` frames per call.
    pub fn endless() -> Self {
        Self::new(Vec::new(), Step::Data(usize::MAX))
    }

    pub fn rom_calls(&self) -> Vec<&RomSet> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::SetSystemRoms(roms) => Some(roms),
                _ => None,
            })
            .collect()
    }

    pub fn render_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::Render(_)))
            .count()
    }
}

impl SidEngine for ScriptedEngine {
    fn configure(&mut self, sample_rate: u32, stereo: bool) -> Result<(), EngineError> {
        self.calls.push(Call::Configure {
            sample_rate,
            stereo,
        });
        if let Some(message) = &self.fail_configure {
            return Err(EngineError::new(EngineOp::Configure, message.clone()));
        }
        self.sample_rate = sample_rate;
        self.channels = if stereo { 2 } else { 1 };
        Ok(())
    }

    fn set_system_roms(&mut self, roms: &RomSet) -> Result<(), EngineError> {
        self.calls.push(Call::SetSystemRoms(roms.clone()));
        match &self.fail_roms {
            Some(message) => Err(EngineError::new(EngineOp::SetSystemRoms, message.clone())),
            None => Ok(()),
        }
    }

    fn load_tune(&mut self, data: &[u8]) -> Result<(), EngineError> {
        self.calls.push(Call::LoadTune(data.len()));
        match &self.fail_load {
            Some(message) => Err(EngineError::new(EngineOp::LoadTune, message.clone())),
            None => Ok(()),
        }
    }

    fn select_song(&mut self, song: u32) -> Result<u32, EngineError> {
        self.calls.push(Call::SelectSong(song));
        if song > self.songs {
            Err(EngineError::new(EngineOp::SelectSong, "song out of range"))
        } else {
            Ok(song)
        }
    }

    fn render(&mut self, cycles: u32) -> RenderChunk<'_> {
        self.calls.push(Call::Render(cycles));
        let step = self.steps.pop_front().unwrap_or(self.fallback);
        match step {
            Step::Data(len) => {
                // usize::MAX stands for "as many frames as cycles"
                let len = if len == usize::MAX {
                    cycles as usize * usize::from(self.channels)
                } else {
                    len
                };
                self.chunk.clear();
                for _ in 0..len {
                    self.chunk.push(self.next_sample);
                    self.next_sample = self.next_sample.wrapping_add(1);
                }
                RenderChunk::Data(&self.chunk)
            }
            Step::Empty => RenderChunk::Empty,
            Step::Exhausted => RenderChunk::Exhausted,
        }
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn tune_info(&self) -> Option<TuneInfo> {
        Some(TuneInfo {
            songs: self.songs,
            start_song: 1,
            current_song: 1,
            format: "PlaySID one-file format (PSID)".into(),
            info_strings: vec!["Scripted".into(), "Test".into(), "2024".into()],
            ..TuneInfo::default()
        })
    }
}
