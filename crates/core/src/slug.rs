//! Label → field-name derivation.

/// Derives the storage name of a custom field from its human label.
///
/// The label is trimmed and lowercased, every maximal run of characters
/// outside `[a-z0-9]` becomes a single `_`, and leading/trailing `_` are
/// stripped. Blank input yields `""`, which callers treat as "no field yet".
///
/// Distinct labels can collapse to the same name (`"Notes!"` and `"Notes?"`);
/// the registry rejects such collisions.
#[must_use]
pub fn derive_name(label: &str) -> String {
    let lowered = label.trim().to_lowercase();
    let mut name = String::with_capacity(lowered.len());
    let mut in_separator_run = false;

    for ch in lowered.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            // Leading runs are dropped; trailing runs never get flushed.
            if in_separator_run && !name.is_empty() {
                name.push('_');
            }
            in_separator_run = false;
            name.push(ch);
        } else {
            in_separator_run = true;
        }
    }

    name
}
