// Linux-specific readers: /proc/diskstats, /sys/block, /proc/cpuinfo, /proc/stat.

use crate::models::{CpuTicks, DiskCounters};

/// /proc/diskstats reports sectors of 512 bytes regardless of the device's block size.
const SECTOR_SIZE: u64 = 512;

/// Parse /proc/diskstats content, keeping devices accepted by `is_physical`.
///
/// Format: `major minor name rd_ios rd_merges rd_sectors rd_ticks wr_ios wr_merges wr_sectors ...`
pub(crate) fn parse_diskstats(
    content: &str,
    is_physical: impl Fn(&str) -> bool,
) -> Result<Vec<DiskCounters>, String> {
    let mut devices = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&name) = parts.get(2) else {
            if parts.is_empty() {
                continue;
            }
            return Err(format!("line {}: missing device name", lineno + 1));
        };
        if !is_physical(name) {
            continue;
        }
        if parts.len() < 10 {
            return Err(format!(
                "line {}: expected at least 10 fields for {name}, got {}",
                lineno + 1,
                parts.len()
            ));
        }
        let sectors = |idx: usize| {
            parts[idx]
                .parse::<u64>()
                .map_err(|e| format!("line {}: field {}: {}", lineno + 1, idx + 1, e))
        };
        devices.push(DiskCounters {
            device: name.to_string(),
            read_bytes: sectors(5)?.saturating_mul(SECTOR_SIZE),
            write_bytes: sectors(9)?.saturating_mul(SECTOR_SIZE),
        });
    }
    Ok(devices)
}

/// Sysfs spells the `/` of names like `cciss/c0d0` as `!`.
pub(crate) fn sysfs_block_name(name: &str) -> String {
    name.replace('/', "!")
}

/// A whole physical disk has a `device` link under /sys/block; partitions are
/// not listed there and virtual devices (loop, ram, dm-*) have no backing device.
#[cfg(target_os = "linux")]
pub(super) fn is_physical_block_device(name: &str) -> bool {
    std::path::Path::new("/sys/block")
        .join(sysfs_block_name(name))
        .join("device")
        .exists()
}

#[cfg(target_os = "linux")]
pub(super) fn read_disk_counters_linux() -> std::io::Result<Vec<DiskCounters>> {
    let content = std::fs::read_to_string("/proc/diskstats")?;
    parse_diskstats(&content, is_physical_block_device)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// Parse the aggregate `cpu` line of /proc/stat.
///
/// Format: `cpu user nice system idle iowait irq softirq steal guest guest_nice`.
/// Guest time is already part of user time and is not added again. Kernels
/// before 2.6 report only the first four columns.
pub(crate) fn parse_proc_stat(content: &str) -> Result<CpuTicks, String> {
    let line = content
        .lines()
        .find(|line| line.split_whitespace().next() == Some("cpu"))
        .ok_or("no aggregate cpu line")?;
    let ticks = line
        .split_whitespace()
        .skip(1)
        .take(8)
        .map(|field| {
            field
                .parse::<u64>()
                .map_err(|e| format!("cpu field '{field}': {e}"))
        })
        .collect::<Result<Vec<u64>, String>>()?;
    if ticks.len() < 4 {
        return Err(format!("expected at least 4 cpu fields, got {}", ticks.len()));
    }
    let idle = ticks[3].saturating_add(ticks.get(4).copied().unwrap_or(0));
    let busy = ticks
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != 3 && *idx != 4)
        .fold(0u64, |sum, (_, v)| sum.saturating_add(*v));
    Ok(CpuTicks { busy, idle })
}

#[cfg(target_os = "linux")]
pub(super) fn read_cpu_ticks_linux() -> std::io::Result<CpuTicks> {
    let content = std::fs::read_to_string("/proc/stat")?;
    parse_proc_stat(&content).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// Count "processor" entries in /proc/cpuinfo content.
pub(crate) fn count_processors(cpuinfo: &str) -> usize {
    cpuinfo
        .lines()
        .filter(|line| {
            line.get(..9)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("processor"))
        })
        .count()
}

/// Number of CPU cores from /proc/cpuinfo (Linux).
pub(super) fn read_core_count_linux() -> Option<usize> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/cpuinfo").ok()?;
        let cores = count_processors(&content);
        if cores > 0 {
            return Some(cores);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISKSTATS: &str = "   8       0 sda 12345 6789 1000 50000 5432 2100 500 25000 0 30000 75000 0 0 0 0
   8       1 sda1 10000 5000 800 40000 4000 1800 400 20000 0 25000 60000 0 0 0 0
   7       0 loop0 10 0 20 0 0 0 0 0 0 0 0 0 0 0 0
 259       0 nvme0n1 50000 0 2000 100000 30000 0 1500 80000 2 120000 180000 0 0 0 0";

    #[test]
    fn parses_sectors_into_bytes_for_physical_devices() {
        let devices =
            parse_diskstats(DISKSTATS, |name| name == "sda" || name == "nvme0n1").unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].device, "sda");
        assert_eq!(devices[0].read_bytes, 1000 * 512);
        assert_eq!(devices[0].write_bytes, 500 * 512);
        assert_eq!(devices[1].device, "nvme0n1");
        assert_eq!(devices[1].read_bytes, 2000 * 512);
        assert_eq!(devices[1].write_bytes, 1500 * 512);
    }

    #[test]
    fn rejects_truncated_lines() {
        let err = parse_diskstats("8 0 sda 1 2 3", |_| true).unwrap_err();
        assert!(err.contains("line 1"));
        assert!(err.contains("sda"));
    }

    #[test]
    fn short_lines_of_filtered_devices_are_skipped() {
        // pre-2.6.25 partition lines carry only 4 counters
        let content = "   8       0 sda 12345 6789 1000 50000 5432 2100 500 25000 0 30000 75000
   8       1 sda1 10000 800 4000 400";
        let devices = parse_diskstats(content, |name| name == "sda").unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].read_bytes, 1000 * 512);
    }

    #[test]
    fn sysfs_names_replace_slashes() {
        assert_eq!(sysfs_block_name("cciss/c0d0"), "cciss!c0d0");
        assert_eq!(sysfs_block_name("sda"), "sda");
    }

    #[test]
    fn parses_aggregate_cpu_ticks() {
        let stat = "cpu  100 20 30 400 50 6 7 8 90 10
cpu0 50 10 15 200 25 3 3 4 45 5
intr 12345";
        let ticks = parse_proc_stat(stat).unwrap();
        assert_eq!(ticks.idle, 450);
        assert_eq!(ticks.busy, 100 + 20 + 30 + 6 + 7 + 8);
    }

    #[test]
    fn parses_old_four_column_cpu_line() {
        let ticks = parse_proc_stat("cpu 10 0 5 85\n").unwrap();
        assert_eq!(ticks, CpuTicks { busy: 15, idle: 85 });
    }

    #[test]
    fn rejects_missing_or_bad_cpu_line() {
        assert!(parse_proc_stat("cpu0 1 2 3 4").is_err());
        assert!(parse_proc_stat("cpu 1 2 x 4").is_err());
        assert!(parse_proc_stat("cpu 1 2").is_err());
    }

    #[test]
    fn rejects_non_numeric_counters() {
        let bad = "8 0 sda 1 2 x 4 5 6 7 8";
        assert!(parse_diskstats(bad, |_| true).is_err());
        // filtered devices are never parsed
        assert!(parse_diskstats(bad, |_| false).unwrap().is_empty());
    }

    #[test]
    fn counts_processor_lines() {
        let cpuinfo = "processor\t: 0\nmodel name\t: x\n\nprocessor\t: 1\nmodel name\t: x\n\nProcessor\t: 2\n";
        assert_eq!(count_processors(cpuinfo), 3);
        assert_eq!(count_processors(""), 0);
    }
}
