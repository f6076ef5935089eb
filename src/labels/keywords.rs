//! Keyword tables used for ground-truth labeling and static features.

/// Text containing any of these is benign no matter when it happened.
pub const ALWAYS_BENIGN: &[&str] = &[
    "aminer: new event type",
    "user_acct",
    "cron",
    "clamav",
    "freshclam",
    "systemd",
];

/// Attack type -> keywords an alert must contain to be attributed to it.
pub const ATTACK_RELEVANCE: &[(&str, &[&str])] = &[
    ("network_scans", &["scan", "nmap"]),
    ("service_scans", &["scan", "port"]),
    ("wpscan", &["wp-", "wordpress", "wp-includes"]),
    ("dirb", &["dirb", "/admin", "/uploads"]),
    ("webshell", &["php", "shell", "upload"]),
    ("cracking", &["login", "auth", "ssh"]),
    ("reverse_shell", &["reverse", "connect"]),
    ("privilege_escalation", &["sudo", "uid=0"]),
    ("dnsteal", &["dns", "exfil"]),
    ("service_stop", &["stop", "shutdown"]),
];

/// Relevance keywords for an attack type; unknown types match nothing.
pub fn relevance_keywords(attack: &str) -> &'static [&'static str] {
    ATTACK_RELEVANCE
        .iter()
        .find(|(name, _)| *name == attack)
        .map(|(_, kw)| *kw)
        .unwrap_or(&[])
}

/// Case-insensitive substring test. Keywords are expected in lowercase.
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let text = text.to_lowercase();
    keywords.iter().any(|k| text.contains(k))
}
