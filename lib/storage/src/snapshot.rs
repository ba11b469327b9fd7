// Graph snapshots: gzip-compressed JSON documents on disk
use anyhow::{anyhow, Result};
use chessgraph_core::{GraphData, PlayerGraph};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const SNAPSHOT_EXTENSION: &str = "snapshot";

/// Snapshot description for listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDescription {
    pub name: String,
    pub creation_time: Option<String>,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// What a snapshot file holds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Usually the root username the graph was built from.
    pub label: String,
    pub created_at: u64,
    pub graph: GraphData,
}

impl GraphSnapshot {
    pub fn into_graph(self) -> PlayerGraph {
        PlayerGraph::from_data(self.graph)
    }
}

pub struct GraphSnapshotManager {
    snapshot_dir: PathBuf,
}

impl GraphSnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_dir: P) -> Result<Self> {
        let snapshot_dir = snapshot_dir.as_ref().to_path_buf();
        fs::create_dir_all(&snapshot_dir)?;
        Ok(Self { snapshot_dir })
    }

    pub fn snapshot_dir(&self) -> &Path {
        &self.snapshot_dir
    }

    /// Generate a snapshot filename with a millisecond timestamp, not yet
    /// used in the snapshot directory
    fn generate_snapshot_name(&self, label: &str) -> String {
        let now: DateTime<Utc> = Utc::now();
        let label: String = label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let stem = format!("{}-{}", label, now.format("%Y-%m-%d-%H-%M-%S-%3f"));

        let mut name = format!("{}.{}", stem, SNAPSHOT_EXTENSION);
        let mut suffix = 1;
        while self.snapshot_dir.join(&name).exists() {
            name = format!("{}-{}.{}", stem, suffix, SNAPSHOT_EXTENSION);
            suffix += 1;
        }
        name
    }

    fn describe(path: &Path) -> Result<SnapshotDescription> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("Invalid snapshot path {:?}", path))?
            .to_string();
        let metadata = fs::metadata(path)?;
        let file_data = fs::read(path)?;
        let checksum = format!("{:x}", Sha256::digest(&file_data));

        let creation_time = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .and_then(|d| DateTime::from_timestamp(d.as_secs() as i64, 0))
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string());

        Ok(SnapshotDescription {
            name,
            creation_time,
            size: metadata.len(),
            checksum: Some(checksum),
        })
    }

    /// Save a graph under `label`
    pub fn save(&self, label: &str, graph: &PlayerGraph) -> Result<SnapshotDescription> {
        let snapshot = GraphSnapshot {
            label: label.to_string(),
            created_at: SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            graph: graph.to_data(),
        };

        let snapshot_path = self.snapshot_dir.join(self.generate_snapshot_name(label));
        let temp_path = snapshot_path.with_extension("tmp");

        let json_data = serde_json::to_vec(&snapshot)?;
        let file = File::create(&temp_path)?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        encoder.write_all(&json_data)?;
        encoder.finish()?.flush()?;
        fs::rename(&temp_path, &snapshot_path)?;

        Self::describe(&snapshot_path)
    }

    /// List snapshots, newest first
    pub fn list(&self) -> Result<Vec<SnapshotDescription>> {
        if !self.snapshot_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.snapshot_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some(SNAPSHOT_EXTENSION) {
                let modified = fs::metadata(&path)?.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                entries.push((modified, Self::describe(&path)?));
            }
        }

        entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.name.cmp(&a.1.name)));
        Ok(entries.into_iter().map(|(_, description)| description).collect())
    }

    /// Load a snapshot by file name
    pub fn load(&self, snapshot_name: &str) -> Result<GraphSnapshot> {
        let snapshot_path = self.snapshot_dir.join(snapshot_name);
        if !snapshot_path.exists() {
            return Err(anyhow!("Snapshot '{}' not found", snapshot_name));
        }
        Self::load_from_path(&snapshot_path)
    }

    /// Load the most recent snapshot, if any
    pub fn load_latest(&self) -> Result<Option<(String, GraphSnapshot)>> {
        match self.list()?.into_iter().next() {
            Some(latest) => {
                let snapshot = self.load(&latest.name)?;
                Ok(Some((latest.name, snapshot)))
            }
            None => Ok(None),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<GraphSnapshot> {
        let file = File::open(path)?;
        let mut decoder = GzDecoder::new(BufReader::new(file));
        let mut json_data = Vec::new();
        decoder.read_to_end(&mut json_data)?;

        let snapshot: GraphSnapshot = serde_json::from_slice(&json_data)?;
        Ok(snapshot)
    }

    /// Delete a snapshot
    pub fn delete(&self, snapshot_name: &str) -> Result<bool> {
        let snapshot_path = self.snapshot_dir.join(snapshot_name);
        if snapshot_path.exists() {
            fs::remove_file(&snapshot_path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chessgraph_core::{GameEdge, PlayerNode};

    fn sample_graph() -> PlayerGraph {
        let mut graph = PlayerGraph::new();
        graph.add_edge(
            Some(PlayerNode::new(1, "alice", 1900)),
            Some(PlayerNode::new(2, "bob", 1700)),
            vec![GameEdge { pgn: "1. e4 e5".to_string(), ..Default::default() }],
        );
        graph
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = GraphSnapshotManager::new(temp_dir.path()).unwrap();

        let description = manager.save("alice", &sample_graph()).unwrap();
        assert!(description.name.starts_with("alice-"));
        assert!(description.name.ends_with(".snapshot"));
        assert_eq!(description.checksum.as_ref().map(|c| c.len()), Some(64));

        let snapshot = manager.load(&description.name).unwrap();
        assert_eq!(snapshot.label, "alice");
        let graph = snapshot.into_graph();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge("alice", "bob").unwrap().games[0].pgn, "1. e4 e5");
    }

    #[test]
    fn test_list_latest_and_delete() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = GraphSnapshotManager::new(temp_dir.path()).unwrap();
        assert!(manager.load_latest().unwrap().is_none());

        let saved = manager.save("some/odd name", &sample_graph()).unwrap();
        assert!(!saved.name.contains('/'));

        let listed = manager.list().unwrap();
        assert_eq!(listed.len(), 1);

        let (name, latest) = manager.load_latest().unwrap().unwrap();
        assert_eq!(name, saved.name);
        assert_eq!(latest.label, "some/odd name");

        assert!(manager.delete(&name).unwrap());
        assert!(!manager.delete(&name).unwrap());
        assert!(manager.load(&name).is_err());
    }

    #[test]
    fn test_saves_in_quick_succession_get_distinct_names() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = GraphSnapshotManager::new(temp_dir.path()).unwrap();
        let graph = sample_graph();

        let names: Vec<String> = (0..5)
            .map(|_| manager.save("alice", &graph).unwrap().name)
            .collect();
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();

        assert_eq!(unique.len(), 5);
        assert_eq!(manager.list().unwrap().len(), 5);
        for name in &names {
            assert_eq!(manager.load(name).unwrap().label, "alice");
        }
    }
}
