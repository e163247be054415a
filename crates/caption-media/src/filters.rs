//! FFmpeg filter parameter helpers.
//!
//! Colon separates options inside a filter and `[`/`]` delimit link labels,
//! so anything user- or filesystem-derived must pass through here before it
//! is embedded in a filter graph.

use caption_models::{ColorMode, Decoration, StyleSpec};

/// Escape a filesystem path for use as a single-quoted filter option value.
///
/// Path separators are normalized to forward slashes and every colon is
/// escaped, so drive-letter paths such as `C:\fonts\a.ttf` survive. A single
/// quote closes the quoted value, emits an escaped quote and reopens it.
pub fn escape_filter_path(path: &str) -> String {
    path.replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "'\\''")
}

/// Strip link-label metacharacters from caption text.
pub fn sanitize_caption(text: &str) -> String {
    text.chars().filter(|c| *c != '[' && *c != ']').collect()
}

/// Escape text expansion sequences so caption text renders literally.
///
/// Drawtext treats a backslash as escaping the next character and `%` as the
/// start of a `%{...}` sequence, so backslashes are doubled before each `%`
/// gets its own backslash.
pub fn escape_expansion(text: &str) -> String {
    text.replace('\\', "\\\\").replace('%', "\\%")
}

/// Build the font color clause for a style.
pub fn color_clause(spec: &StyleSpec) -> String {
    match spec.color {
        ColorMode::Solid(color) => format!("fontcolor={}", color),
        ColorMode::Expression(expr) => format!("fontcolor_expr='{}'", expr.replace(':', "\\:")),
    }
}

/// Build the decoration clause for a style, if any.
pub fn decoration_clause(spec: &StyleSpec) -> Option<String> {
    match spec.decoration {
        Decoration::None => None,
        Decoration::Shadow { x, y, color } => {
            Some(format!("shadowx={}:shadowy={}:shadowcolor={}", x, y, color))
        }
        Decoration::Border { width, color } => {
            Some(format!("borderw={}:bordercolor={}", width, color))
        }
    }
}

/// Visibility predicate: true for `start <= t < end`.
pub fn enable_window(start: f64, end: f64) -> String {
    format!("enable='gte(t,{})*lt(t,{})'", start, end)
}
