/// One data row of `df -k <dir>` output.
///
/// `df` prints filesystem, 1K-blocks, used, available, use%, mount point.
/// When the filesystem name is long (NFS exports, LVM mapper paths) `df`
/// wraps it onto a line of its own and the numbers land on the next line,
/// so a row may carry anywhere from three to "six plus" tokens. Every field
/// here is therefore located counting from the END of the row. Do not switch
/// this to counting from the start: the leading column is the one that moves.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskUsageRecord {
    /// Absent on a continuation row whose name was wrapped onto the line above.
    pub filesystem:   Option<String>,
    pub total_kb:     Option<u64>,
    pub used_kb:      Option<u64>,
    pub available_kb: u64,
    pub use_pct:      String,
    pub mount:        String,
}

impl DiskUsageRecord {
    /// Parse one row. Returns None for rows with fewer than three tokens and
    /// for rows whose third-from-last token is not a plain decimal number
    /// (typically the wrapped filesystem-name line itself).
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Option<Self> {
        let n = tokens.len();
        let avail_idx = n.checked_sub(3)?;
        let available_kb = parse_kb(tokens.get(avail_idx)?.as_ref())?;

        let filesystem = n.checked_sub(5)
            .filter(|&lead| lead > 0)
            .map(|lead| {
                tokens[..lead].iter().map(|t| t.as_ref()).collect::<Vec<&str>>().join(" ")
            });

        Some(DiskUsageRecord {
            filesystem,
            total_kb:  from_end(tokens, 5).and_then(parse_kb),
            used_kb:   from_end(tokens, 4).and_then(parse_kb),
            available_kb,
            use_pct:   from_end(tokens, 2).unwrap_or_default().to_string(),
            mount:     from_end(tokens, 1).unwrap_or_default().to_string(),
        })
    }
}

/// Token `back` places from the end of the row (1 = last).
fn from_end<S: AsRef<str>>(tokens: &[S], back: usize) -> Option<&str> {
    tokens.get(tokens.len().checked_sub(back)?).map(|t| t.as_ref())
}

/// Accept only non-empty runs of ASCII digits: no sign, no decimal point,
/// no unit suffix.
fn parse_kb(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) { return None; }
    s.parse().ok()
}
