//! Fragment formatting for the target timeline format.

use stripcut_processing_core::edits::EditBlock;

/// Renders generated blocks as lines of a timeline document.
pub trait FragmentFormat {
    /// One edit-list line.
    fn edit(&self, block: &EditBlock) -> String;

    /// One automation line. `position` is already in timeline units.
    fn keyframe(&self, position: i64, value: f64) -> String;

    /// Format name.
    fn name(&self) -> &str;
}

/// Cinelerra XML (`<EDIT>` and `<AUTO>` elements).
#[derive(Debug, Clone, Copy, Default)]
pub struct CinelerraFormat;

impl FragmentFormat for CinelerraFormat {
    fn edit(&self, block: &EditBlock) -> String {
        match block {
            EditBlock::Filler { length } => format!(
                "<EDIT STARTSOURCE=0 CHANNEL=0 LENGTH={length} HARD_LEFT=0 HARD_RIGHT=0 COLOR=0 GROUP_ID=0></EDIT>"
            ),
            EditBlock::Content {
                source,
                start_source,
                length,
                audio_channel,
                title,
            } => format!(
                "<EDIT STARTSOURCE={start_source} CHANNEL={audio_channel} LENGTH={length} HARD_LEFT=0 HARD_RIGHT=0 COLOR=0 GROUP_ID=0 USER_TITLE=\"{}\"><FILE SRC=\"{}\"></FILE></EDIT>",
                escape_attr(title),
                escape_attr(source),
            ),
        }
    }

    fn keyframe(&self, position: i64, value: f64) -> String {
        format!(
            "<AUTO POSITION={position} VALUE={value} VALUE1=0 CONTROL_IN_VALUE=0 CONTROL_OUT_VALUE=0 TANGENT_MODE=0></AUTO>"
        )
    }

    fn name(&self) -> &str {
        "cinelerra"
    }
}

/// Escape a string for use inside a double-quoted XML attribute.
pub fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
