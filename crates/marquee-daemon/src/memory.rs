use tracing::debug;

/// Reports available system memory in KiB, or `None` when it can't tell.
pub trait MemoryProbe {
    fn available_kib(&self) -> Option<u64>;
}

/// Reads `MemAvailable` from `/proc/meminfo`.
pub struct ProcMeminfo;

impl MemoryProbe for ProcMeminfo {
    fn available_kib(&self) -> Option<u64> {
        match std::fs::read_to_string("/proc/meminfo") {
            Ok(content) => parse_meminfo(&content),
            Err(e) => {
                debug!("meminfo unavailable: {}", e);
                None
            }
        }
    }
}

pub fn parse_meminfo(content: &str) -> Option<u64> {
    content.lines().find_map(|line| {
        let rest = line.strip_prefix("MemAvailable:")?;
        rest.split_whitespace().next()?.parse().ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO: &str = "\
MemTotal:         443104 kB
MemFree:           18432 kB
MemAvailable:     201876 kB
Buffers:           22312 kB
Cached:           171108 kB
";

    #[test]
    fn test_parse_meminfo() {
        assert_eq!(parse_meminfo(MEMINFO), Some(201876));
    }

    #[test]
    fn test_parse_meminfo_without_field() {
        assert_eq!(parse_meminfo("MemTotal: 1 kB\nMemFree: 1 kB\n"), None);
        assert_eq!(parse_meminfo("MemAvailable: lots\n"), None);
        assert_eq!(parse_meminfo(""), None);
    }
}
