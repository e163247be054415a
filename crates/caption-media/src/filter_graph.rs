//! Drawtext filter graph construction.
//!
//! One `drawtext` stage per overlay, chained in index order:
//!
//! ```text
//! [0:v]drawtext=...[v0];[v0]drawtext=...[v1];...;[vN-2]drawtext=...[vN-1]
//! ```
//!
//! Caption text never appears in the expression itself. Each caption is
//! wrapped and written to its own workspace file which the stage references
//! through `textfile=`, so only escaped paths reach the graph.

use std::path::{Path, PathBuf};

use caption_models::{CaptionStyle, Overlay, StyleSpec};
use tracing::debug;

use crate::error::{MediaError, MediaResult};
use crate::filters::{
    color_clause, decoration_clause, enable_window, escape_expansion, escape_filter_path,
    sanitize_caption,
};
use crate::workspace::{ArtifactKind, TempWorkspace};
use crate::wrap::{wrap_text, WRAP_WIDTH};

/// Stream specifier of the source video.
pub const BASE_VIDEO_LABEL: &str = "0:v";

/// Extra spacing between wrapped caption lines, in pixels.
pub const LINE_SPACING: u32 = 20;

/// A built filter graph plus the caption files it references.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGraph {
    expression: String,
    output_label: String,
    stage_count: usize,
    caption_files: Vec<PathBuf>,
}

impl FilterGraph {
    /// Graph with no stages; the source video is mapped unchanged.
    pub fn passthrough() -> Self {
        Self {
            expression: String::new(),
            output_label: BASE_VIDEO_LABEL.to_string(),
            stage_count: 0,
            caption_files: Vec::new(),
        }
    }

    /// Full `-filter_complex` expression. Empty for a passthrough graph.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Label of the final video stream, without brackets.
    pub fn output_label(&self) -> &str {
        &self.output_label
    }

    /// Argument for `-map` selecting the final video stream.
    pub fn video_map(&self) -> String {
        if self.is_passthrough() {
            self.output_label.clone()
        } else {
            format!("[{}]", self.output_label)
        }
    }

    pub fn stage_count(&self) -> usize {
        self.stage_count
    }

    pub fn is_passthrough(&self) -> bool {
        self.stage_count == 0
    }

    /// Caption files written while building, one per stage.
    pub fn caption_files(&self) -> &[PathBuf] {
        &self.caption_files
    }
}

/// Builds chained drawtext graphs for a caption style.
#[derive(Debug, Clone)]
pub struct FilterGraphBuilder {
    font_path: PathBuf,
    wrap_width: usize,
    line_spacing: u32,
}

impl FilterGraphBuilder {
    /// Create a builder drawing with the font at `font_path`.
    pub fn new(font_path: impl Into<PathBuf>) -> Self {
        Self {
            font_path: font_path.into(),
            wrap_width: WRAP_WIDTH,
            line_spacing: LINE_SPACING,
        }
    }

    /// Override the caption column width.
    pub fn with_wrap_width(mut self, width: usize) -> Self {
        self.wrap_width = width.max(1);
        self
    }

    pub fn with_line_spacing(mut self, spacing: u32) -> Self {
        self.line_spacing = spacing;
        self
    }

    pub fn font_path(&self) -> &Path {
        &self.font_path
    }

    /// Build the graph for `overlays`, writing one caption file per overlay
    /// into `workspace`.
    ///
    /// All overlays are checked before any file is written. An empty overlay
    /// list yields [`FilterGraph::passthrough`].
    pub async fn build(
        &self,
        overlays: &[Overlay],
        style: CaptionStyle,
        workspace: &mut TempWorkspace,
    ) -> MediaResult<FilterGraph> {
        if overlays.is_empty() {
            return Ok(FilterGraph::passthrough());
        }

        for (index, overlay) in overlays.iter().enumerate() {
            if !overlay.has_valid_window() {
                return Err(MediaError::invalid_graph(format!(
                    "overlay {} has invalid window [{}, {})",
                    index, overlay.start, overlay.end
                )));
            }
        }

        let spec = style.spec();
        let mut stages = Vec::with_capacity(overlays.len());
        let mut caption_files = Vec::with_capacity(overlays.len());
        let mut input_label = BASE_VIDEO_LABEL.to_string();

        for (index, overlay) in overlays.iter().enumerate() {
            let output_label = format!("v{}", index);

            let wrapped = wrap_text(&sanitize_caption(&overlay.text), self.wrap_width);
            let caption_file = workspace.allocate(ArtifactKind::Caption(index));
            tokio::fs::write(&caption_file, escape_expansion(&wrapped)).await?;

            stages.push(self.drawtext_stage(
                &input_label,
                &output_label,
                &caption_file,
                overlay,
                spec,
            ));
            caption_files.push(caption_file);
            input_label = output_label;
        }

        debug!(
            stages = stages.len(),
            style = %style,
            "Built drawtext filter graph"
        );

        Ok(FilterGraph {
            expression: stages.join(";"),
            output_label: input_label,
            stage_count: stages.len(),
            caption_files,
        })
    }

    /// Render a single drawtext stage.
    pub fn drawtext_stage(
        &self,
        input_label: &str,
        output_label: &str,
        caption_file: &Path,
        overlay: &Overlay,
        spec: &StyleSpec,
    ) -> String {
        let mut options = vec![
            format!(
                "fontfile='{}'",
                escape_filter_path(&self.font_path.to_string_lossy())
            ),
            format!(
                "textfile='{}'",
                escape_filter_path(&caption_file.to_string_lossy())
            ),
            format!("fontsize={}", spec.font_size),
            format!("kerning={}", spec.kerning),
            format!("line_spacing={}", self.line_spacing),
            format!("x={}", spec.x),
            format!("y={}", spec.y),
            color_clause(spec),
        ];
        options.extend(decoration_clause(spec));
        options.push(enable_window(overlay.start, overlay.end));

        format!(
            "[{}]drawtext={}[{}]",
            input_label,
            options.join(":"),
            output_label
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caption_models::RunId;
    use tempfile::TempDir;

    async fn workspace(root: &TempDir) -> TempWorkspace {
        TempWorkspace::create(root.path(), &RunId::new()).await.unwrap()
    }

    fn overlays(n: usize) -> Vec<Overlay> {
        (0..n)
            .map(|i| Overlay::new(format!("caption {i}"), i as f64, i as f64 + 1.5))
            .collect()
    }

    /// Extract the `[in]` and `[out]` labels of a stage.
    fn labels(stage: &str) -> (&str, &str) {
        let input = &stage[1..stage.find(']').unwrap()];
        let output = &stage[stage.rfind('[').unwrap() + 1..stage.len() - 1];
        (input, output)
    }

    #[tokio::test]
    async fn test_stages_chain_in_order() {
        let root = TempDir::new().unwrap();
        let mut ws = workspace(&root).await;
        let builder = FilterGraphBuilder::new("/fonts/roboto.woff");

        let graph = builder
            .build(&overlays(4), CaptionStyle::FreezeResponse, &mut ws)
            .await
            .unwrap();

        let stages: Vec<&str> = graph.expression().split(';').collect();
        assert_eq!(stages.len(), 4);
        assert_eq!(graph.stage_count(), 4);
        assert_eq!(labels(stages[0]), ("0:v", "v0"));
        for i in 1..stages.len() {
            let (input, output) = labels(stages[i]);
            assert_eq!(input, labels(stages[i - 1]).1);
            assert_eq!(output, format!("v{i}"));
        }
        assert_eq!(graph.output_label(), "v3");
        assert_eq!(graph.video_map(), "[v3]");
        ws.release().await;
    }

    #[tokio::test]
    async fn test_caption_files_hold_wrapped_clean_text() {
        let root = TempDir::new().unwrap();
        let mut ws = workspace(&root).await;
        let builder = FilterGraphBuilder::new("/fonts/roboto.woff");
        let input = vec![Overlay::new("[a] b c d e f g h i j k l m n o p [q]", 0.0, 2.0)];

        let graph = builder
            .build(&input, CaptionStyle::LowerThirdFact, &mut ws)
            .await
            .unwrap();

        assert_eq!(graph.caption_files().len(), 1);
        let written = tokio::fs::read_to_string(&graph.caption_files()[0]).await.unwrap();
        assert_eq!(written, "a b c d e f g h i j k l m\nn o p q");
        assert_eq!(ws.tracked(), graph.caption_files());
        ws.release().await;
    }

    #[tokio::test]
    async fn test_caption_files_escape_expansion_characters() {
        let root = TempDir::new().unwrap();
        let mut ws = workspace(&root).await;
        let builder = FilterGraphBuilder::new("/fonts/roboto.woff");
        let input = vec![Overlay::new(r"100% real C:\dir", 0.0, 2.0)];

        let graph = builder
            .build(&input, CaptionStyle::LowerThirdFact, &mut ws)
            .await
            .unwrap();

        let written = tokio::fs::read_to_string(&graph.caption_files()[0]).await.unwrap();
        assert_eq!(written, r"100\% real C:\\dir");
        assert!(!written.contains("%%"));
        ws.release().await;
    }

    #[tokio::test]
    async fn test_brackets_never_reach_expression() {
        let root = TempDir::new().unwrap();
        let mut ws = workspace(&root).await;
        let builder = FilterGraphBuilder::new("/fonts/roboto.woff");
        let input = vec![
            Overlay::new("[v9]drawtext=evil[out]", 0.0, 1.0),
            Overlay::new("]]][[[", 1.0, 2.0),
        ];

        let graph = builder
            .build(&input, CaptionStyle::QuietCenterReveal, &mut ws)
            .await
            .unwrap();

        for stage in graph.expression().split(';') {
            // Only the leading input label and trailing output label may use brackets
            let inner = &stage[stage.find(']').unwrap() + 1..stage.rfind('[').unwrap()];
            assert!(!inner.contains('[') && !inner.contains(']'), "{stage}");
        }
        assert!(!graph.expression().contains("evil"));
        for file in graph.caption_files() {
            let text = tokio::fs::read_to_string(file).await.unwrap();
            assert!(!text.contains('[') && !text.contains(']'));
        }
        ws.release().await;
    }

    #[test]
    fn test_colon_paths_are_escaped_in_stage() {
        let builder = FilterGraphBuilder::new(r"C:\Windows\Fonts\roboto.woff");
        let overlay = Overlay::new("hi", 0.0, 1.0);
        let stage = builder.drawtext_stage(
            "0:v",
            "v0",
            Path::new("D:/tmp/caption-run/caption_0.txt"),
            &overlay,
            CaptionStyle::MemoryEcho.spec(),
        );

        assert!(stage.contains(r"fontfile='C\:/Windows/Fonts/roboto.woff'"));
        assert!(stage.contains(r"textfile='D\:/tmp/caption-run/caption_0.txt'"));
        assert!(!stage.contains("C:/"));
        assert!(!stage.contains("D:/"));
        assert!(!stage.contains(r"Windows\Fonts"));
    }

    #[test]
    fn test_quoted_font_path_stays_inside_option() {
        let builder = FilterGraphBuilder::new("/home/o'neil/fonts/roboto.woff");
        let overlay = Overlay::new("hi", 0.0, 1.0);
        let stage = builder.drawtext_stage(
            "0:v",
            "v0",
            Path::new("/tmp/caption_0.txt"),
            &overlay,
            CaptionStyle::MemoryEcho.spec(),
        );

        assert!(stage.contains(r"fontfile='/home/o'\''neil/fonts/roboto.woff':textfile="));
    }

    #[test]
    fn test_stage_parameters_follow_style() {
        let builder = FilterGraphBuilder::new("/fonts/roboto.woff");
        let overlay = Overlay::new("hi", 1.25, 3.0);
        let stage = builder.drawtext_stage(
            "v0",
            "v1",
            Path::new("/tmp/caption_1.txt"),
            &overlay,
            CaptionStyle::RealizationSnap.spec(),
        );

        assert_eq!(
            stage,
            "[v0]drawtext=fontfile='/fonts/roboto.woff':textfile='/tmp/caption_1.txt':\
             fontsize=40:kerning=3:line_spacing=20:x=(w-text_w)/2:y=(h-text_h)/2:\
             fontcolor=white:borderw=4:bordercolor=black@0.9:\
             enable='gte(t,1.25)*lt(t,3)'[v1]"
        );
    }

    #[tokio::test]
    async fn test_empty_overlays_is_passthrough() {
        let root = TempDir::new().unwrap();
        let mut ws = workspace(&root).await;
        let builder = FilterGraphBuilder::new("/fonts/roboto.woff");

        let graph = builder
            .build(&[], CaptionStyle::SubmissionSink, &mut ws)
            .await
            .unwrap();

        assert!(graph.is_passthrough());
        assert!(graph.expression().is_empty());
        assert_eq!(graph.video_map(), "0:v");
        assert!(ws.tracked().is_empty());
        ws.release().await;
    }

    #[tokio::test]
    async fn test_invalid_window_writes_nothing() {
        let root = TempDir::new().unwrap();
        let mut ws = workspace(&root).await;
        let builder = FilterGraphBuilder::new("/fonts/roboto.woff");
        let input = vec![Overlay::new("ok", 0.0, 1.0), Overlay::new("bad", 2.0, 2.0)];

        let err = builder
            .build(&input, CaptionStyle::SubmissionSink, &mut ws)
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::InvalidGraph(_)));
        assert!(ws.tracked().is_empty());
        ws.release().await;
    }
}
