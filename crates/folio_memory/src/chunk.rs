//! Text chunking for embedding.

/// Split text into chunks of at most `max_chars` characters.
///
/// Paragraphs (separated by blank lines) are packed greedily. A paragraph
/// longer than the budget is split on sentence ends, and a sentence longer
/// than the budget on character boundaries. Whitespace-only input yields no
/// chunks.
///
/// # Examples
///
/// ```
/// use folio_memory::chunk_text;
///
/// let text = "First paragraph.\n\nSecond paragraph.\n\nThird.";
/// assert_eq!(chunk_text(text, 1000).len(), 1);
/// assert_eq!(chunk_text(text, 20).len(), 3);
/// assert!(chunk_text("   \n\n ", 20).is_empty());
/// ```
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut pieces = Vec::new();
    for paragraph in paragraphs(text) {
        if char_len(&paragraph) <= max_chars {
            pieces.push(paragraph);
            continue;
        }
        for sentence in sentences(&paragraph) {
            if char_len(&sentence) <= max_chars {
                pieces.push(sentence);
            } else {
                pieces.extend(hard_split(&sentence, max_chars));
            }
        }
    }
    pack(pieces, max_chars)
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                out.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current.join("\n"));
    }
    out
}

fn sentences(paragraph: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = paragraph.chars().peekable();
    while let Some(c) = chars.next() {
        current.push(c);
        let ends = matches!(c, '.' | '!' | '?' | '。' | '！' | '？');
        let at_boundary = chars.peek().is_none_or(|next| next.is_whitespace());
        if ends && at_boundary {
            let sentence = current.trim();
            if !sentence.is_empty() {
                out.push(sentence.to_string());
            }
            current.clear();
        }
    }
    let rest = current.trim();
    if !rest.is_empty() {
        out.push(rest.to_string());
    }
    out
}

fn hard_split(sentence: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = sentence.chars().collect();
    chars
        .chunks(max_chars)
        .map(|window| window.iter().collect::<String>())
        .filter(|piece| !piece.trim().is_empty())
        .collect()
}

fn pack(pieces: Vec<String>, max_chars: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut current = String::new();
    for piece in pieces {
        let joined = char_len(&current) + char_len(&piece) + 2;
        if !current.is_empty() && joined > max_chars {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(&piece);
    }
    if !current.trim().is_empty() {
        out.push(current);
    }
    out
}
