use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::paths;

/// One row of a directory listing as sent by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    /// Absent or null for directories.
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DirectoryListing {
    pub path: String,
    #[serde(default)]
    pub entries: Vec<DirectoryEntry>,
    #[serde(default)]
    pub drives: Option<Vec<String>>,
}

impl DirectoryListing {
    /// Rewrite every path with forward slashes, once, at the boundary.
    pub fn normalized(mut self) -> Self {
        self.path = paths::normalize(&self.path);
        for entry in &mut self.entries {
            entry.path = paths::normalize(&entry.path);
        }
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriveList {
    pub drives: Vec<String>,
}

/// Filesystem change pushed by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeEvent {
    pub path: String,
}

/// Error body the backend attaches to failed requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct WriteRequest<'a> {
    pub path: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RenameRequest<'a> {
    pub old_path: &'a str,
    pub new_path: &'a str,
}

#[derive(Debug, Serialize)]
pub struct PathRequest<'a> {
    pub path: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProcessInfo {
    #[serde(default)]
    pub pid: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cpu_percent: Option<f64>,
    #[serde(default)]
    pub memory_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DiskInfo {
    pub device: String,
    pub mountpoint: String,
    #[serde(default)]
    pub fstype: Option<String>,
    pub used: u64,
    pub total: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TemperatureReading {
    pub label: String,
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub critical: Option<f64>,
}

/// `GET /system/metrics` payload. Only the three headline percentages are
/// mandatory; everything else is rendered when present.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetricsSnapshot {
    pub cpu_percent: f64,
    pub ram_percent: f64,
    pub disk_percent: f64,
    #[serde(default)]
    pub cpu_count: Option<u32>,
    #[serde(default)]
    pub cpu_freq_current: Option<f64>,
    #[serde(default)]
    pub ram_used: Option<u64>,
    #[serde(default)]
    pub ram_total: Option<u64>,
    #[serde(default)]
    pub disk_used: Option<u64>,
    #[serde(default)]
    pub disk_total: Option<u64>,
    #[serde(default)]
    pub uptime_seconds: Option<u64>,
    #[serde(default)]
    pub processes_count: Option<u64>,
    #[serde(default)]
    pub processes: Vec<ProcessInfo>,
    #[serde(default)]
    pub all_disks: Vec<DiskInfo>,
    #[serde(default)]
    pub net_sent: Option<u64>,
    #[serde(default)]
    pub net_recv: Option<u64>,
    #[serde(default)]
    pub temperatures: BTreeMap<String, Vec<TemperatureReading>>,
    #[serde(default)]
    pub load_avg: Option<Vec<f64>>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
}

impl MetricsSnapshot {
    /// Explicit count when the backend sends one, else the length of the process table.
    pub fn process_count(&self) -> Option<u64> {
        self.processes_count.or_else(|| {
            if self.processes.is_empty() {
                None
            } else {
                Some(self.processes.len() as u64)
            }
        })
    }
}

/// Message on the terminal channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommandOutput {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub exit: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct RunCommand<'a> {
    pub command: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_tolerates_missing_sizes_and_drives() {
        let raw = r#"{"path":"C:\\data","entries":[
            {"name":"sub","path":"C:\\data\\sub","is_dir":true,"size":null},
            {"name":"f.txt","path":"C:\\data\\f.txt","is_dir":false,"size":12}
        ]}"#;
        let listing: DirectoryListing = serde_json::from_str(raw).unwrap();
        let listing = listing.normalized();
        assert_eq!(listing.path, "C:/data");
        assert_eq!(listing.entries[0].size, None);
        assert_eq!(listing.entries[1].path, "C:/data/f.txt");
        assert_eq!(listing.drives, None);
    }

    #[test]
    fn listing_without_path_is_rejected() {
        let raw = r#"{"entries":[]}"#;
        assert!(serde_json::from_str::<DirectoryListing>(raw).is_err());
    }

    #[test]
    fn metrics_accept_minimal_and_full_payloads() {
        let minimal = r#"{"cpu_percent":1.0,"ram_percent":2.0,"disk_percent":3.0}"#;
        let snap: MetricsSnapshot = serde_json::from_str(minimal).unwrap();
        assert_eq!(snap.process_count(), None);
        assert!(snap.temperatures.is_empty());

        let full = r#"{
            "cpu_percent": 12.5, "ram_percent": 40.0, "disk_percent": 70.1,
            "cpu_count": 8, "cpu_freq_current": 2400.0,
            "ram_used": 1024, "ram_total": 4096, "disk_used": 10, "disk_total": 20,
            "uptime_seconds": 90061,
            "processes": [{"pid": 1, "name": "init", "cpu_percent": 0.5, "memory_percent": null}],
            "all_disks": [{"device": "/dev/sda1", "mountpoint": "/", "fstype": "ext4",
                           "used": 5, "total": 10, "free": 5, "percent": 50.0}],
            "net_sent": 100, "net_recv": 200,
            "temperatures": {"coretemp": [{"label": "Core 0", "current": 41.0, "high": null, "critical": null}]},
            "load_avg": [0.1, 0.2, 0.3],
            "hostname": "box", "os": "Linux"
        }"#;
        let snap: MetricsSnapshot = serde_json::from_str(full).unwrap();
        assert_eq!(snap.process_count(), Some(1));
        assert_eq!(snap.processes[0].memory_percent, None);
        assert_eq!(snap.all_disks[0].fstype.as_deref(), Some("ext4"));
        assert_eq!(snap.temperatures["coretemp"][0].current, Some(41.0));
    }

    #[test]
    fn metrics_missing_headline_field_is_rejected() {
        let raw = r#"{"cpu_percent":1.0,"ram_percent":2.0}"#;
        assert!(serde_json::from_str::<MetricsSnapshot>(raw).is_err());
    }

    #[test]
    fn explicit_process_count_wins() {
        let raw = r#"{"cpu_percent":1,"ram_percent":2,"disk_percent":3,"processes_count":321}"#;
        let snap: MetricsSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snap.process_count(), Some(321));
    }

    #[test]
    fn command_output_fields_are_optional() {
        let out: CommandOutput = serde_json::from_str(r#"{"output":"hi"}"#).unwrap();
        assert_eq!(out.exit, None);
        let done: CommandOutput = serde_json::from_str(r#"{"exit":0}"#).unwrap();
        assert_eq!(done.output, None);
        assert_eq!(done.exit, Some(0));
    }
}
