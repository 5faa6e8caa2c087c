/// Splits a reply into utterances for the speech queue: one per sentence,
/// with sentences longer than `max_len` bytes broken at the last space.
pub fn split_utterances(text: &str, max_len: usize) -> Vec<String> {
    let mut utterances = Vec::new();

    for sentence in sentences(text) {
        let mut remaining = sentence;
        while remaining.len() > max_len {
            let mut window = (max_len + 1).min(remaining.len());
            while !remaining.is_char_boundary(window) {
                window -= 1;
            }
            let split_at = match remaining[..window].rfind(' ') {
                Some(i) if i > 0 => i,
                _ => {
                    let mut cut = max_len;
                    while cut > 0 && !remaining.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    cut
                }
            };
            if split_at == 0 {
                break;
            }
            utterances.push(remaining[..split_at].trim().to_string());
            remaining = remaining[split_at..].trim_start();
        }
        if !remaining.trim().is_empty() {
            utterances.push(remaining.trim().to_string());
        }
    }

    utterances.retain(|u| !u.is_empty());
    utterances
}

fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '!' | '?' | '\n') {
            let end = i + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                out.push(sentence);
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}
