const MAX_BASE_CHARS: usize = 100;
const FALLBACK_BASE: &str = "upload";

/// Builds the destination name for an accepted upload.
///
/// The client name is lower-cased, whitespace runs become a single hyphen and the
/// last `.` segment is dropped. Characters outside alphanumerics, `-`, `_` and `.`
/// are replaced with `_`, leading dots are removed and the base is capped at
/// 100 characters. The extension always comes from the upload policy, never from the
/// client name.
pub fn derive_file_name(original_name: &str, extension: &str, suffix: &str) -> String {
    let lowered = original_name.to_lowercase();
    let hyphenated = collapse_whitespace(&lowered);

    let stem = match hyphenated.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => hyphenated.as_str(),
    };

    let safe: String = stem
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_BASE_CHARS)
        .collect();

    let base = match safe.trim_start_matches('.') {
        "" => FALLBACK_BASE,
        base => base,
    };

    format!("{}-{}.{}", base, suffix, extension)
}

/// Replaces each whitespace run with one hyphen. Runs at either end are kept as hyphens.
fn collapse_whitespace(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push('-');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Suffix for the `attempt`-th try at claiming a name within the same clock tick.
pub fn unique_suffix(millis: u64, attempt: u32) -> String {
    if attempt == 0 {
        millis.to_string()
    } else {
        format!("{}-{}", millis, attempt)
    }
}
