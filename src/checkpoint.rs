//! Checkpoint system for saving and restoring a running network.

use crate::neural::Ctrnn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

const MAGIC: &[u8; 4] = b"CTRN";

/// Network state at a given simulation step
#[derive(Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Version for compatibility checking
    pub version: u32,
    /// Steps taken so far
    pub time: u64,
    /// Network including configuration, parameters and dynamical state
    pub network: Ctrnn,
}

impl Checkpoint {
    /// Current checkpoint version
    pub const VERSION: u32 = 2;

    pub fn new(time: u64, network: Ctrnn) -> Self {
        Self {
            version: Self::VERSION,
            time,
            network,
        }
    }

    /// Save checkpoint to binary file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(MAGIC)?;
        let encoded = bincode::serialize(self)?;
        writer.write_all(&encoded)?;
        writer.flush()?;

        Ok(())
    }

    /// Load checkpoint from binary file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(CheckpointError::InvalidFormat("Invalid magic bytes".to_string()));
        }

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        let checkpoint: Checkpoint = bincode::deserialize(&buffer)?;

        if checkpoint.version != Self::VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: Self::VERSION,
                found: checkpoint.version,
            });
        }

        Ok(checkpoint)
    }

    /// Get approximate size in bytes
    pub fn size_bytes(&self) -> usize {
        bincode::serialized_size(self).unwrap_or(0) as usize
    }
}

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Periodic checkpoint writer
pub struct CheckpointManager {
    /// Base directory for checkpoints
    pub base_dir: String,
    /// Interval between checkpoints (0 disables)
    pub interval: u64,
    /// Maximum checkpoints to keep
    pub max_checkpoints: usize,
    last_checkpoint: u64,
}

impl CheckpointManager {
    pub fn new(base_dir: String, interval: u64, max_checkpoints: usize) -> Self {
        if let Err(e) = std::fs::create_dir_all(&base_dir) {
            log::warn!("Could not create checkpoint directory {}: {}", base_dir, e);
        }

        Self {
            base_dir,
            interval,
            max_checkpoints,
            last_checkpoint: 0,
        }
    }

    /// Check if a checkpoint should be saved
    pub fn should_save(&self, time: u64) -> bool {
        self.interval > 0 && time > 0 && time % self.interval == 0 && time != self.last_checkpoint
    }

    pub fn checkpoint_path(&self, time: u64) -> String {
        format!("{}/checkpoint_{:08}.bin", self.base_dir, time)
    }

    /// Save checkpoint and prune old ones
    pub fn save(&mut self, checkpoint: &Checkpoint) -> Result<String, CheckpointError> {
        let path = self.checkpoint_path(checkpoint.time);
        checkpoint.save(&path)?;
        self.last_checkpoint = checkpoint.time;

        self.cleanup()?;

        Ok(path)
    }

    fn cleanup(&self) -> Result<(), CheckpointError> {
        let mut checkpoints: Vec<_> = std::fs::read_dir(&self.base_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                name.starts_with("checkpoint_") && name != "checkpoint_final.bin"
            })
            .collect();

        if checkpoints.len() > self.max_checkpoints {
            // Zero-padded names sort by time
            checkpoints.sort_by_key(|e| e.file_name());

            let to_remove = checkpoints.len() - self.max_checkpoints;
            for entry in checkpoints.into_iter().take(to_remove) {
                std::fs::remove_file(entry.path())?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::CtrnnConfiguration;

    fn running_network() -> Ctrnn {
        let mut net = Ctrnn::new();
        net.set_configuration(CtrnnConfiguration::with_seed(2, 3, 21));
        net.initialise(0.1).unwrap();
        for _ in 0..25 {
            net.step(&[0.3, -0.7]).unwrap();
        }
        net
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let checkpoint = Checkpoint::new(25, running_network());
        let temp_path = std::env::temp_dir().join("ctrnn_test_checkpoint.bin");

        checkpoint.save(&temp_path).unwrap();
        let loaded = Checkpoint::load(&temp_path).unwrap();

        assert_eq!(loaded.time, 25);
        assert_eq!(loaded.network.outputs(), checkpoint.network.outputs());
        assert_eq!(loaded.network.hidden_nodes(), checkpoint.network.hidden_nodes());
        assert_eq!(loaded.network.configuration(), checkpoint.network.configuration());

        std::fs::remove_file(&temp_path).ok();
    }

    #[test]
    fn test_restored_network_continues_identically() {
        let mut original = running_network();
        let bytes = bincode::serialize(&Checkpoint::new(25, original.clone())).unwrap();
        let mut restored = bincode::deserialize::<Checkpoint>(&bytes).unwrap().network;

        for _ in 0..10 {
            let a = original.step(&[1.0, 0.0]).unwrap();
            let b = restored.step(&[1.0, 0.0]).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_rejects_bad_magic() {
        let temp_path = std::env::temp_dir().join("ctrnn_test_bad_magic.bin");
        std::fs::write(&temp_path, b"NOPE1234").unwrap();

        assert!(matches!(
            Checkpoint::load(&temp_path),
            Err(CheckpointError::InvalidFormat(_))
        ));

        std::fs::remove_file(&temp_path).ok();
    }

    #[test]
    fn test_manager_schedule() {
        let dir = std::env::temp_dir().join("ctrnn_test_manager_schedule");
        let manager = CheckpointManager::new(dir.to_string_lossy().to_string(), 50, 3);
        assert!(!manager.should_save(0));
        assert!(!manager.should_save(49));
        assert!(manager.should_save(100));

        let disabled = CheckpointManager::new(dir.to_string_lossy().to_string(), 0, 3);
        assert!(!disabled.should_save(100));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_manager_keeps_newest_checkpoints() {
        let dir = std::env::temp_dir().join("ctrnn_test_manager_rotation");
        std::fs::remove_dir_all(&dir).ok();
        let mut manager = CheckpointManager::new(dir.to_string_lossy().to_string(), 10, 2);

        let net = running_network();
        Checkpoint::new(0, net.clone())
            .save(dir.join("checkpoint_final.bin"))
            .unwrap();
        for time in [10, 20, 30, 40] {
            assert!(manager.should_save(time));
            manager.save(&Checkpoint::new(time, net.clone())).unwrap();
            assert!(!manager.should_save(time));
        }

        let mut names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "checkpoint_00000030.bin",
                "checkpoint_00000040.bin",
                "checkpoint_final.bin",
            ]
        );
        assert_eq!(Checkpoint::load(dir.join("checkpoint_00000040.bin")).unwrap().time, 40);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_checkpoint_size() {
        let checkpoint = Checkpoint::new(25, running_network());
        let size = checkpoint.size_bytes();
        assert!(size > 0);
        assert!(size < 100_000);
    }
}
