//! Task names, attribute keys, and the string helpers that build action keys.

/// Resource and cluster task names.
pub mod task {
    pub const START: &str = "start";
    pub const STOP: &str = "stop";
    pub const STOPPED: &str = "stopped";
    pub const PROMOTE: &str = "promote";
    pub const DEMOTE: &str = "demote";
    /// Status check. With interval 0 this is a probe.
    pub const MONITOR: &str = "monitor";
    pub const RELOAD_AGENT: &str = "reload-agent";
    pub const FENCE: &str = "stonith";
    pub const SHUTDOWN: &str = "do_shutdown";
    pub const REPROBE: &str = "probe_again";
}

/// Resource agent classes.
pub mod class {
    /// Fencing devices.
    pub const STONITH: &str = "stonith";
}

/// Resource meta-attribute keys.
pub mod meta {
    pub const ALLOW_UNHEALTHY_NODES: &str = "allow-unhealthy-nodes";
    pub const INTERLEAVE: &str = "interleave";
    pub const GLOBALLY_UNIQUE: &str = "globally-unique";
    pub const REQUIRES: &str = "requires";
    pub const PROVIDES: &str = "provides";
}

/// Action meta keys consumed by the transition engine.
pub mod action_meta {
    pub const STONITH_ACTION: &str = "stonith_action";
    pub const NO_WAIT: &str = "op_no_wait";
    pub const TARGET_RC: &str = "op_target_rc";
}

/// Node attribute keys.
pub mod node_attr {
    /// Prefix shared by every node health attribute.
    pub const HEALTH_PREFIX: &str = "#health";
    /// Legacy "all resources probed" marker.
    pub const PROBE_COMPLETE: &str = "probe_complete";
}

/// Agent exit code for "not running".
pub const RC_NOT_RUNNING: i32 = 7;
/// Agent exit code for "running promoted".
pub const RC_RUNNING_PROMOTED: i32 = 8;

/// Interpret a boolean option value. Anything unrecognized is false.
pub fn is_true(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "on" | "yes" | "y" | "1"
    )
}

/// Interpret an optional boolean option value.
pub fn is_true_opt(value: Option<&str>) -> bool {
    value.is_some_and(is_true)
}

/// Build an action key: `<resource>_<task>_<interval_ms>`.
pub fn op_key(rsc: &str, task: &str, interval_ms: u32) -> String {
    format!("{rsc}_{task}_{interval_ms}")
}

/// Key suffix matching any resource's action for `task` at interval 0.
pub fn op_key_suffix(task: &str) -> String {
    format!("_{task}_0")
}
