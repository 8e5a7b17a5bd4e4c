/// Cut `text` to `max_width` chars, marking the cut with an ellipsis.
/// Uses `chars().count()` so multi-byte UTF-8 strings are measured in
/// characters, not bytes.
pub(crate) fn truncate(text: &str, max_width: usize) -> String {
    if text.chars().count() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max_width - 1).collect();
    out.push('…');
    out
}

/// First row of a `height`-row window over `len` rows that keeps `anchor`
/// visible, centred where possible.
pub(crate) fn window_start(len: usize, height: usize, anchor: Option<usize>) -> usize {
    if len <= height {
        return 0;
    }
    let Some(anchor) = anchor else {
        return 0;
    };
    if anchor < height / 2 {
        0
    } else if anchor > len.saturating_sub(height / 2) {
        len.saturating_sub(height)
    } else {
        (anchor.saturating_sub(height / 2)).min(len - height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("héllo", 5), "héllo");
        assert_eq!(truncate("héllo wörld", 6), "héllo…");
        assert_eq!(truncate("abc", 0), "");
    }

    #[test]
    fn window_keeps_anchor_visible() {
        assert_eq!(window_start(5, 10, Some(4)), 0);
        assert_eq!(window_start(100, 10, None), 0);
        assert_eq!(window_start(100, 10, Some(3)), 0);
        assert_eq!(window_start(100, 10, Some(50)), 45);
        assert_eq!(window_start(100, 10, Some(99)), 90);
        for anchor in 0..100 {
            let start = window_start(100, 10, Some(anchor));
            assert!(start <= anchor && anchor < start + 10);
        }
    }
}
