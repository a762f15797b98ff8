/// Group digits in threes: 12000000 → "12,000,000"
pub fn fmt_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format a kilobyte count the way diagnostics print it: "12,000,000 kB"
pub fn fmt_kb(kb: u64) -> String {
    format!("{} kB", fmt_thousands(kb))
}

/// Format a kilobyte count into a rough human-readable size: "7.6 GB"
pub fn fmt_kb_approx(kb: u64) -> String {
    const TB: f64 = 1_073_741_824.0;
    const GB: f64 = 1_048_576.0;
    const MB: f64 = 1_024.0;
    let k = kb as f64;
    if k >= TB      { format!("{:.1} TB", k / TB) }
    else if k >= GB { format!("{:.1} GB", k / GB) }
    else if k >= MB { format!("{:.1} MB", k / MB) }
    else            { format!("{:.0} KB", k) }
}
