//! Text formatting helpers for replies (HTML parse mode).

/// Format a user mention for display in messages.
///
/// `@username` when the user has one, otherwise an inline `tg://` link.
pub fn format_user_mention(user_id: u64, username: Option<&str>) -> String {
    match username.filter(|u| !u.is_empty()) {
        Some(u) => format!("@{}", html_escape(u)),
        None => format!("<a href=\"tg://user?id={}\">User</a>", user_id),
    }
}

/// Format seconds as `1d 2h 3m 4s`, skipping zero components.
pub fn format_time(seconds: u64) -> String {
    let (minutes, secs) = (seconds / 60, seconds % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    let (days, hours) = (hours / 24, hours % 24);

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{}s", secs));
    }

    parts.join(" ")
}

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
