// Text preparation for cards: tag stripping, truncation and line wrapping.

/// Appended whenever a description is cut short.
pub const ELLIPSIS: &str = "...";

/// Points to millimetres
const PT_TO_MM: f32 = 0.352_778;

/// Tags that separate words when removed
const BLOCK_TAGS: &[&str] = &[
    "p", "br", "div", "li", "ul", "ol", "tr", "td", "th", "h1", "h2", "h3", "h4", "h5", "h6",
    "script", "style",
];

/// Removes markup from a host-supplied description, dropping `<script>` and
/// `<style>` bodies, decoding the common entities and collapsing whitespace.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tag_rest = &rest[start..];
        let Some(end) = tag_rest.find('>') else {
            // Unterminated tag: drop the remainder
            rest = "";
            break;
        };
        let tag = tag_rest[1..end].trim().to_ascii_lowercase();
        rest = &tag_rest[end + 1..];

        for block in ["script", "style"] {
            if tag.starts_with(block) {
                let closing = format!("</{}", block);
                rest = match rest.to_ascii_lowercase().find(&closing) {
                    Some(pos) => {
                        let after = &rest[pos..];
                        after.find('>').map_or("", |gt| &after[gt + 1..])
                    }
                    None => "",
                };
            }
        }
        let name: String = tag
            .trim_start_matches('/')
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect();
        if BLOCK_TAGS.contains(&name.as_str()) {
            out.push(' ');
        }
    }
    out.push_str(rest);

    let decoded = out
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Shortens `text` to at most `budget` characters plus [`ELLIPSIS`].
///
/// Preference order: the last sentence end (`.`, `!`, `?`) in the second half
/// of the budget, kept as is; the last clause break (`,`, `;`, `:`) there;
/// the last word break anywhere within the budget; finally a hard cut.
pub fn truncate(text: &str, budget: usize) -> String {
    let text = text.trim();
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= budget {
        return text.to_string();
    }

    let floor = budget / 2;
    // A cut at `i` keeps chars[..i]; chars[i] always exists here.
    let ends_with = |i: usize, marks: &[char]| {
        i > 0 && marks.contains(&chars[i - 1]) && chars[i].is_whitespace()
    };

    if let Some(i) = (floor.max(1)..=budget).rev().find(|&i| ends_with(i, &['.', '!', '?'])) {
        return chars[..i].iter().collect();
    }
    if let Some(i) = (floor.max(1)..=budget).rev().find(|&i| ends_with(i, &[',', ';', ':'])) {
        let kept: String = chars[..i - 1].iter().collect();
        return format!("{}{}", kept.trim_end(), ELLIPSIS);
    }
    if let Some(i) = (1..=budget).rev().find(|&i| chars[i].is_whitespace()) {
        let kept: String = chars[..i].iter().collect();
        let kept = kept.trim_end().trim_end_matches([',', ';', ':']);
        if !kept.is_empty() {
            return format!("{}{}", kept, ELLIPSIS);
        }
    }

    let kept: String = chars[..budget].iter().collect();
    format!("{}{}", kept, ELLIPSIS)
}

/// Estimated rendered width of `text` in Helvetica, in millimetres.
///
/// The built-in PDF fonts carry no metrics we can query, so glyphs are
/// bucketed by their typical advance width.
pub fn text_width_mm(text: &str, font_size_pt: f32, bold: bool) -> f32 {
    let em: f32 = text
        .chars()
        .map(|c| match c {
            'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 0.28,
            ' ' | 'f' | 't' | 'r' | 'I' | '(' | ')' | '-' | '/' => 0.33,
            'm' | 'w' | 'M' | 'W' | '@' => 0.85,
            c if c.is_ascii_digit() => 0.556,
            c if c.is_uppercase() => 0.68,
            _ => 0.53,
        })
        .sum();
    let weight = if bold { 1.06 } else { 1.0 };
    em * weight * font_size_pt * PT_TO_MM
}

/// Greedy word wrap into lines no wider than `width_mm`. Words that do not fit
/// on a line of their own are split.
pub fn wrap(text: &str, width_mm: f32, font_size_pt: f32, bold: bool) -> Vec<String> {
    let fits = |s: &str| text_width_mm(s, font_size_pt, bold) <= width_mm;
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", line, word)
        };
        if fits(&candidate) {
            line = candidate;
            continue;
        }
        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if fits(word) {
            line = word.to_string();
            continue;
        }
        for c in word.chars() {
            line.push(c);
            if !fits(&line) {
                line.pop();
                lines.push(std::mem::take(&mut line));
                line.push(c);
            }
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Keeps at most `max` lines, marking the last kept line with [`ELLIPSIS`].
pub fn clamp_lines(mut lines: Vec<String>, max: usize) -> Vec<String> {
    if lines.len() > max && max > 0 {
        lines.truncate(max);
        if let Some(last) = lines.last_mut() {
            last.push_str(ELLIPSIS);
        }
    }
    lines
}
