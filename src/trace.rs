//! Output traces recorded while driving a network.

use serde::{Deserialize, Serialize};

/// Network outputs at one simulation step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: u64,
    pub outputs: Vec<f64>,
}

impl Sample {
    /// Format as a one-line summary
    pub fn summary(&self) -> String {
        let outputs: Vec<String> = self.outputs.iter().map(|o| format!("{:+.4}", o)).collect();
        format!("T:{:6} | Out: [{}]", self.time, outputs.join(", "))
    }
}

/// Sequence of output samples
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OutputTrace {
    pub samples: Vec<Sample>,
}

impl OutputTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outputs of step `time`
    pub fn record(&mut self, time: u64, outputs: Vec<f64>) {
        self.samples.push(Sample { time, outputs });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Values of output `index` over time; samples without that output are skipped
    pub fn series(&self, index: usize) -> Vec<(u64, f64)> {
        self.samples
            .iter()
            .filter_map(|s| s.outputs.get(index).map(|&v| (s.time, v)))
            .collect()
    }

    /// Save trace to JSON file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)
    }

    /// Load trace from JSON file
    pub fn load(path: &str) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
