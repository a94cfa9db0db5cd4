// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Unix Platform Implementation
//!
//! POSIX implementation covering Linux and macOS.
//!
//! Memory figures come from `/proc/meminfo` on Linux; on other Unix targets
//! (macOS, BSD) `sysconf`-based figures are used as the closest equivalent
//! since `/proc` is not guaranteed to exist there.

use super::{Platform, PlatformError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub struct UnixPlatform;

impl UnixPlatform {
    pub fn new() -> Self {
        Self
    }

    #[cfg(target_os = "linux")]
    fn read_meminfo() -> Result<(u64, u64), PlatformError> {
        let contents = std::fs::read_to_string("/proc/meminfo")?;
        let mut total_kb = None;
        let mut available_kb = None;

        for line in contents.lines() {
            if let Some(rest) = line.strip_prefix("MemTotal:") {
                total_kb = parse_kb_field(rest);
            } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
                available_kb = parse_kb_field(rest);
            }
        }

        match (total_kb, available_kb) {
            (Some(total), Some(available)) => Ok((total * 1024, available * 1024)),
            _ => Err(PlatformError::Other("MemTotal/MemAvailable not found in /proc/meminfo".to_string())),
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn read_meminfo() -> Result<(u64, u64), PlatformError> {
        let total = Self::sysconf_total_memory()?;
        // Without /proc, "available" is approximated as total memory; callers
        // treat this as a conservative (i.e. pessimistic for pressure checks)
        // signal on non-Linux Unix targets.
        Ok((total, total))
    }

    #[cfg(not(target_os = "linux"))]
    fn sysconf_total_memory() -> Result<u64, PlatformError> {
        let pages = unsafe { libc::sysconf(libc::_SC_PHYS_PAGES) };
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGE_SIZE) };
        if pages < 0 || page_size < 0 {
            return Err(PlatformError::Other("sysconf reported a negative value".to_string()));
        }
        Ok(pages as u64 * page_size as u64)
    }
}

#[cfg(target_os = "linux")]
fn parse_kb_field(rest: &str) -> Option<u64> {
    rest.trim().trim_end_matches(" kB").trim().parse::<u64>().ok()
}

#[cfg(target_os = "linux")]
fn read_vm_rss() -> Result<u64, PlatformError> {
    let contents = std::fs::read_to_string("/proc/self/status")?;
    for line in contents.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            if let Some(kb) = parse_kb_field(rest) {
                return Ok(kb * 1024);
            }
        }
    }
    Err(PlatformError::Other("VmRSS not found in /proc/self/status".to_string()))
}

#[cfg(all(unix, not(target_os = "linux")))]
fn read_rusage_maxrss() -> Result<u64, PlatformError> {
    // `ru_maxrss` is kilobytes on Linux but bytes on macOS/BSD; since this
    // path only compiles for non-Linux Unix targets, treat it as bytes.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return Err(PlatformError::Other("getrusage failed".to_string()));
    }
    Ok(usage.ru_maxrss as u64)
}

impl Default for UnixPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Platform for UnixPlatform {
    fn page_size(&self) -> usize {
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size > 0 {
            size as usize
        } else {
            4096
        }
    }

    fn cpu_count(&self) -> usize {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    }

    fn total_memory(&self) -> Result<u64, PlatformError> {
        Self::read_meminfo().map(|(total, _)| total)
    }

    fn available_memory(&self) -> Result<u64, PlatformError> {
        Self::read_meminfo().map(|(_, available)| available)
    }

    #[cfg(target_os = "linux")]
    fn process_resident_memory(&self) -> Result<u64, PlatformError> {
        read_vm_rss()
    }

    #[cfg(all(unix, not(target_os = "linux")))]
    fn process_resident_memory(&self) -> Result<u64, PlatformError> {
        read_rusage_maxrss()
    }

    fn line_separator(&self) -> &'static str {
        "\n"
    }

    fn path_separator(&self) -> char {
        ':'
    }

    fn platform_name(&self) -> &'static str {
        if cfg!(target_os = "macos") {
            "macos"
        } else {
            "linux"
        }
    }

    fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }

    fn is_elevated(&self) -> bool {
        unsafe { libc::geteuid() == 0 }
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> Result<(), PlatformError> {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(mode);
        std::fs::set_permissions(path, perms)?;
        Ok(())
    }

    fn is_executable(&self, path: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path).map(|m| m.permissions().mode() & 0o111 != 0).unwrap_or(false)
    }

    async fn sync_file(&self, file: &tokio::fs::File) -> Result<(), PlatformError> {
        file.sync_all().await?;
        Ok(())
    }
}
