// SPDX-License-Identifier: MIT

/// Marker inserted between the head and tail slices of a truncated log.
const MARKER: &[u8] = b"\n\n[truncated]\n\n";

/// Truncate `input` to fit within `limit` bytes, keeping the first 20% and
/// the last 80% of the budget and splicing [`MARKER`] between them.
///
/// Logs that already fit are returned unchanged. The 20/80 split matches
/// the control plane's own truncation so a worker-truncated log looks the
/// same regardless of which side truncated it.
pub fn truncate_log(input: &[u8], limit: usize) -> Vec<u8> {
    if input.len() <= limit {
        return input.to_vec();
    }

    let head_len = (limit as f64 * 0.2).floor() as usize;
    let tail_len = (limit as f64 * 0.8).floor() as usize;

    let mut out = Vec::with_capacity(head_len + MARKER.len() + tail_len);
    out.extend_from_slice(&input[..head_len.min(input.len())]);
    out.extend_from_slice(MARKER);
    let tail_start = input.len().saturating_sub(tail_len);
    out.extend_from_slice(&input[tail_start..]);
    out
}

#[cfg(test)]
#[path = "truncate_tests.rs"]
mod tests;
