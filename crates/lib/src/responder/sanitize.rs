//! Output cleanup for generated text.

use crate::config::ReasoningDelimiters;

/// Remove every `open ... close` section (markers included, across line breaks) and trim the result.
///
/// An open marker without a matching close marker removes everything after it.
/// When either marker is empty nothing is stripped; the text is only trimmed.
pub fn strip_reasoning(raw: &str, delimiters: &ReasoningDelimiters) -> String {
    let open = delimiters.open.as_str();
    let close = delimiters.close.as_str();
    if open.is_empty() || close.is_empty() {
        return raw.trim().to_string();
    }
    let mut visible = String::with_capacity(raw.len());
    let mut remaining = raw;
    while let Some(start) = remaining.find(open) {
        visible.push_str(&remaining[..start]);
        let after_open = &remaining[start + open.len()..];
        match after_open.find(close) {
            Some(end) => remaining = &after_open[end + close.len()..],
            None => {
                remaining = "";
                break;
            }
        }
    }
    visible.push_str(remaining);
    visible.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn think() -> ReasoningDelimiters {
        ReasoningDelimiters::default()
    }

    #[test]
    fn strips_single_block() {
        assert_eq!(
            strip_reasoning("<think>...</think>台北今天晴天", &think()),
            "台北今天晴天"
        );
    }

    #[test]
    fn strips_multiline_and_multiple_blocks() {
        let raw = "\n<think>\nfirst\nthought\n</think>\n\nAnswer part one. <think>more\n</think>Part two.\n  ";
        let out = strip_reasoning(raw, &think());
        assert_eq!(out, "Answer part one. Part two.");
        assert!(!out.contains("<think>"));
        assert!(!out.contains("</think>"));
        assert!(!out.contains("thought"));
    }

    #[test]
    fn unclosed_block_drops_the_rest() {
        assert_eq!(
            strip_reasoning("visible <think>never finished", &think()),
            "visible"
        );
    }

    #[test]
    fn text_without_markers_is_only_trimmed() {
        assert_eq!(strip_reasoning("  plain answer \n", &think()), "plain answer");
    }

    #[test]
    fn reasoning_only_yields_empty() {
        assert_eq!(strip_reasoning("<think>all hidden</think>", &think()), "");
    }

    #[test]
    fn custom_delimiters() {
        let d = ReasoningDelimiters {
            open: "[[r]]".to_string(),
            close: "[[/r]]".to_string(),
        };
        assert_eq!(
            strip_reasoning("[[r]]hmm[[/r]] ok <think>kept</think>", &d),
            "ok <think>kept</think>"
        );
    }

    #[test]
    fn empty_delimiter_disables_stripping() {
        let d = ReasoningDelimiters {
            open: String::new(),
            close: "</think>".to_string(),
        };
        assert_eq!(strip_reasoning(" a</think> ", &d), "a</think>");
    }
}
