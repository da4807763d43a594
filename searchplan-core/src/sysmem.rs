//! Host memory probing for sliced searches.

use crate::error::{PlanError, PlanResult};

const MEMINFO: &str = "/proc/meminfo";

/// Total physical memory in bytes.
pub fn total_system_memory() -> PlanResult<u64> {
    let content = std::fs::read_to_string(MEMINFO)
        .map_err(|e| PlanError::SystemMemory(format!("cannot read {}: {}", MEMINFO, e)))?;
    parse_mem_total(&content)
        .ok_or_else(|| PlanError::SystemMemory(format!("no MemTotal entry in {}", MEMINFO)))
}

/// Extract `MemTotal` (reported in KiB) as bytes.
pub fn parse_mem_total(meminfo: &str) -> Option<u64> {
    meminfo.lines().find_map(|line| {
        let rest = line.strip_prefix("MemTotal:")?;
        let mut fields = rest.split_whitespace();
        let value: u64 = fields.next()?.parse().ok()?;
        match fields.next() {
            Some("kB") | None => Some(value * 1024),
            Some(_) => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mem_total() {
        let meminfo = "MemTotal:       16318480 kB\nMemFree:         1204044 kB\n";
        assert_eq!(parse_mem_total(meminfo), Some(16318480 * 1024));
    }

    #[test]
    fn test_parse_mem_total_missing() {
        assert_eq!(parse_mem_total("MemFree: 12 kB\n"), None);
        assert_eq!(parse_mem_total("MemTotal: lots kB\n"), None);
    }
}
