//! Real-time scheduling helpers (Linux SCHED_FIFO / mlockall).

#[cfg(target_os = "linux")]
pub fn setup_rt_once(rt: bool, prio: Option<i32>) {
    use libc::{
        MCL_CURRENT, SCHED_FIFO, mlockall, sched_get_priority_max, sched_get_priority_min,
        sched_param, sched_setscheduler,
    };
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !rt {
        return;
    }
    RT_ONCE.get_or_init(|| {
        // Lock resident pages first; the control loop allocates nothing per
        // cycle, so current pages cover the hot path.
        let rc = unsafe { mlockall(MCL_CURRENT) };
        if rc != 0 {
            tracing::warn!(
                error = %std::io::Error::last_os_error(),
                "mlockall failed; continuing without memory locking"
            );
        }

        let min = unsafe { sched_get_priority_min(SCHED_FIFO) };
        let max = unsafe { sched_get_priority_max(SCHED_FIFO) };
        let priority = prio.unwrap_or_else(|| min.max(1)).clamp(min, max);
        let param = sched_param {
            sched_priority: priority,
        };
        let rc = unsafe { sched_setscheduler(0, SCHED_FIFO, &param) };
        if rc != 0 {
            tracing::warn!(
                error = %std::io::Error::last_os_error(),
                priority,
                "SCHED_FIFO unavailable; running with default scheduling"
            );
        } else {
            tracing::info!(priority, "SCHED_FIFO enabled");
        }
    });
}

#[cfg(not(target_os = "linux"))]
pub fn setup_rt_once(rt: bool, _prio: Option<i32>) {
    if rt {
        tracing::warn!("--rt is only supported on Linux; ignoring");
    }
}
