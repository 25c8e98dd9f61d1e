use crate::control_loop::{ControlLoopResult, LoopState};
use crate::error_code::ErrorCode;
use crate::registers::{RegisterBank, RegisterSnapshot};
use heapless::Vec;
use serde::{Deserialize, Serialize};

const TELEMETRY_BUFFER_SIZE: usize = 32;

/// Observable outcome of one tick plus the register state it left behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickRecord {
    pub result: ControlLoopResult,
    pub code_value: u32,
    pub message: String,
    pub state: LoopState,
    pub registers: RegisterSnapshot,
}

impl TickRecord {
    pub fn capture(result: ControlLoopResult, state: LoopState, bank: &RegisterBank) -> Self {
        Self {
            result,
            code_value: result.code.value(),
            message: result.code.message().to_string(),
            state,
            registers: bank.snapshot(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// One-line summary, e.g. `tick=2 temp=25C thrust=3000N -> 0: No Error`.
    pub fn compact(&self) -> String {
        let temp = self
            .result
            .temperature_c
            .map_or_else(|| "-".to_string(), |t| format!("{t}C"));
        let thrust = self
            .result
            .commanded_thrust_n
            .map_or_else(|| "-".to_string(), |n| format!("{n}N"));
        format!(
            "tick={} temp={} thrust={} -> {}",
            self.result.tick, temp, thrust, self.result.code
        )
    }
}

/// Bounded history of recent ticks; the oldest record is evicted when full.
#[derive(Debug, Default)]
pub struct TelemetryLog {
    records: Vec<TickRecord, TELEMETRY_BUFFER_SIZE>,
    total_recorded: u64,
}

impl TelemetryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: TickRecord) {
        if self.records.is_full() {
            self.records.remove(0);
        }
        if let Err(dropped) = self.records.push(record) {
            tracing::warn!("Telemetry buffer full; dropped tick {}", dropped.result.tick);
            return;
        }
        self.total_recorded += 1;
    }

    pub fn records(&self) -> &[TickRecord] {
        &self.records
    }

    pub fn latest(&self) -> Option<&TickRecord> {
        self.records.last()
    }

    pub fn total_recorded(&self) -> u64 {
        self.total_recorded
    }

    pub fn count_with(&self, code: ErrorCode) -> usize {
        self.records.iter().filter(|r| r.result.code == code).count()
    }

    /// Newline-delimited JSON of the retained records.
    pub fn to_json_lines(&self) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&record.to_json()?);
            out.push('\n');
        }
        Ok(out)
    }
}
