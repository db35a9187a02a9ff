//! Memory sampling used to report the pipeline's footprint.

use sysinfo::{Pid, ProcessesToUpdate, System};

/// Measures the current memory footprint in bytes.
pub trait MemoryProbe: Send + Sync {
    fn measure(&self) -> u64;
}

/// Resident memory of the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessMemory;

impl MemoryProbe for ProcessMemory {
    fn measure(&self) -> u64 {
        let pid = Pid::from_u32(std::process::id());

        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        match system.process(pid) {
            Some(process) => process.memory(),
            None => {
                log::warn!("Can't find process {} to sample memory.", pid);
                0
            }
        }
    }
}

/// Signed difference between two samples, in bytes.
pub fn delta(before: u64, after: u64) -> i64 {
    after as i64 - before as i64
}

pub fn as_megabytes(bytes: i64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
