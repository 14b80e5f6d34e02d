use std::fmt::Write;

/// Format server uptime as `"{d}d {h}h {m}m"`, dropping leading zero units.
pub fn format_uptime(total_secs: u64) -> String {
    let mut out = String::with_capacity(12);
    write_uptime(&mut out, total_secs);
    out
}

pub fn write_uptime(buf: &mut String, total_secs: u64) {
    buf.clear();
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3600;
    let minutes = (total_secs % 3600) / 60;
    let _ = if days > 0 {
        write!(buf, "{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        write!(buf, "{hours}h {minutes}m")
    } else {
        write!(buf, "{minutes}m")
    };
}
