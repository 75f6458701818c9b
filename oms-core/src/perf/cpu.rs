//! CPU affinity and scheduling for the dispatch worker
//!
//! The order manager pins its dispatch thread to one of the
//! configured cores so the venue rings and the order index stay
//! cache-resident. Everything here is best-effort: a refused pin or
//! scheduling policy downgrades to normal scheduling and the engine
//! stays correct.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

/// Pin the calling thread to `core`
///
/// Fails when the core is not present on this host or the OS refuses
/// the affinity change.
pub fn pin_to_core(core: usize) -> Result<()> {
    let present = core_affinity::get_core_ids().unwrap_or_default();
    let target = present
        .into_iter()
        .find(|id| id.id == core)
        .with_context(|| format!("CPU core {core} not present on this host"))?;

    if !core_affinity::set_for_current(target) {
        anyhow::bail!("OS refused to pin this thread to core {core}");
    }

    debug!(core, "thread pinned");
    Ok(())
}

/// Pin the calling thread to the first available core of `cores`
///
/// Returns the core that took the pin, or `None` when every attempt
/// failed and the thread keeps running unpinned.
pub fn pin_to_any(cores: &[usize]) -> Option<usize> {
    for &core in cores {
        match pin_to_core(core) {
            Ok(()) => {
                info!(core, "dispatch worker pinned");
                return Some(core);
            }
            Err(err) => debug!(core, %err, "pin attempt failed"),
        }
    }

    if !cores.is_empty() {
        warn!(?cores, "no configured core accepted the pin, dispatch runs unpinned");
    }
    None
}

/// Move the calling thread onto SCHED_FIFO (Linux only)
///
/// `priority` is clamped into the policy's valid range. Needs
/// CAP_SYS_NICE or root; a refusal leaves the default policy in
/// place.
#[cfg(target_os = "linux")]
pub fn set_realtime_priority(priority: i32) -> Result<()> {
    use libc::{
        sched_get_priority_max, sched_get_priority_min, sched_param, sched_setscheduler,
        SCHED_FIFO,
    };

    unsafe {
        let floor = sched_get_priority_min(SCHED_FIFO);
        let ceiling = sched_get_priority_max(SCHED_FIFO);
        let applied = priority.max(floor).min(ceiling);

        let param = sched_param {
            sched_priority: applied,
        };
        if sched_setscheduler(0, SCHED_FIFO, &param) != 0 {
            anyhow::bail!(
                "SCHED_FIFO:{applied} refused, keeping default policy (needs CAP_SYS_NICE)"
            );
        }

        if applied != priority {
            warn!(requested = priority, applied, "realtime priority clamped");
        }
        info!(priority = applied, "thread scheduled SCHED_FIFO");
        Ok(())
    }
}

/// Real-time scheduling is Linux-only; elsewhere the default policy
/// stays in place
#[cfg(not(target_os = "linux"))]
pub fn set_realtime_priority(_priority: i32) -> Result<()> {
    debug!("realtime scheduling unavailable on this platform");
    Ok(())
}

/// Number of CPU cores usable by this process
pub fn num_cores() -> usize {
    std::thread::available_parallelism()
        .map(|cores| cores.get())
        .unwrap_or(1)
}
