use std::path::PathBuf;

use adforge_lib::{AspectRatio, GenerationMode, SlideField, TextField};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "adforge")]
#[command(
    version,
    about = "AdForge - Generate, edit and export AI-assisted ad creatives",
    long_about = "AdForge\n\nFlow:\n- generate: write ad copy or a carousel plan and the background images from a project context.\n- edit/style/slides/audio/view: change the active creative or carousel (kept between runs).\n- export: rasterize the active creative or carousel slides to PNG.\n- history: save, list and restore snapshots.\n- key: manage the AI service API key.\n\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional config file (TOML) for API models, generation counts, export timing and storage; CLI flags override config"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value = "json", help = "Output format")]
    pub format: OutputFormat,

    #[arg(long, global = true, value_name = "PATH", help = "Write the output payload to a file")]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate single creatives or a carousel from a project context
    Generate {
        #[arg(long, help = "Project context or ad strategy")]
        context: Option<String>,

        #[arg(long, value_name = "PATH", help = "Read the project context from a text file")]
        context_file: Option<PathBuf>,

        #[arg(
            long,
            value_name = "PATH",
            help = "Transcribe an audio file and append it to the context"
        )]
        audio: Option<PathBuf>,

        #[arg(
            long,
            value_name = "PATH",
            help = "Extract the text of a document and append it to the context"
        )]
        document: Option<PathBuf>,

        #[arg(long, default_value = "", help = "Visual style guide shared by every image prompt")]
        style_guide: String,

        #[arg(long, value_enum, default_value = "single")]
        mode: ModeArg,

        #[arg(long, value_name = "PATH", help = "Subject photo to recreate inside each scene")]
        expert_image: Option<PathBuf>,

        #[arg(long, default_value_t = 3, help = "Number of single-creative variations")]
        variations: usize,

        #[arg(long, default_value_t = 8, help = "Number of carousel slides")]
        slides: usize,
    },

    /// Show the current workspace
    Show,

    /// Select one of the generated variations as the editing target
    Select { creative_id: String },

    /// Edit text of the active creative or carousel
    Edit {
        #[command(subcommand)]
        action: EditAction,
    },

    /// Change visual style settings
    Style {
        #[command(subcommand)]
        action: StyleAction,
    },

    /// Reorder, add or regenerate carousel slides
    Slides {
        #[command(subcommand)]
        action: SlideAction,
    },

    /// Attach or remove narration audio on the active creative
    Audio {
        #[command(subcommand)]
        action: AudioAction,
    },

    /// Set the aspect ratio and preview zoom of the single-creative canvas
    View {
        #[arg(long, value_parser = parse_aspect_ratio, help = "1:1, 4:5 or 9:16")]
        aspect_ratio: Option<AspectRatio>,

        #[arg(long, help = "Preview zoom factor (> 0)")]
        zoom: Option<f32>,
    },

    /// Discard the generated variations and the active selection (history is kept)
    Reset {
        #[arg(long, help = "Apply without asking for confirmation")]
        yes: bool,
    },

    /// Rasterize to PNG files
    Export {
        #[command(subcommand)]
        target: ExportTarget,

        #[arg(
            long,
            global = true,
            value_name = "DIR",
            help = "Output directory (defaults to export.output_dir)"
        )]
        output_dir: Option<PathBuf>,

        #[arg(
            long,
            global = true,
            help = "Pixel ratio of the output (defaults to export.pixel_ratio)"
        )]
        pixel_ratio: Option<f32>,
    },

    /// Saved snapshots
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Manage the AI service API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Ask for alternative hooks or captions
    Assist {
        #[arg(value_enum)]
        task: AssistTask,

        #[arg(long, help = "Context to use instead of the workspace project context")]
        context: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum EditAction {
    /// Replace a text field of the active single creative
    Field {
        #[arg(value_enum)]
        field: FieldArg,
        value: String,
    },
    /// Replace the title or subtitle of a carousel slide
    Slide {
        slide_id: String,
        #[arg(value_enum)]
        field: FieldArg,
        value: String,
    },
    /// Replace the carousel caption
    Caption { text: String },
    /// Apply bold, italic or a color to a character range
    Inline {
        #[arg(value_enum)]
        field: FieldArg,

        #[arg(long, help = "Carousel slide id; omit for the single creative")]
        slide: Option<String>,

        #[arg(long, help = "First character (0-based)")]
        start: usize,

        #[arg(long, help = "End character (exclusive)")]
        end: usize,

        #[arg(long, value_enum)]
        command: InlineArg,

        #[arg(long, help = "Hex color for fore-color")]
        value: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum StyleAction {
    /// Merge settings (JSON object, camelCase keys) into one slide or the single creative
    Apply {
        #[arg(long, help = "Carousel slide id; omit for the single creative")]
        slide: Option<String>,

        #[arg(long, value_name = "JSON")]
        json: String,
    },
    /// Apply a global style subset to every slide
    Global {
        #[arg(long, value_name = "JSON")]
        json: String,

        #[arg(long, help = "Apply without asking for confirmation")]
        yes: bool,
    },
    /// Apply a named layout preset
    Preset {
        name: String,

        #[arg(long, help = "Apply without asking for confirmation")]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum SlideAction {
    /// Move the slide at position FROM to position TO (1-based)
    Reorder { from: usize, to: usize },
    /// Append a placeholder slide
    Add,
    /// Generate a new background image for a slide
    Regenerate {
        slide_id: String,

        #[arg(long, help = "Image prompt (defaults to the slide's current prompt)")]
        prompt: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AudioAction {
    /// Narrate "{title}. {subtitle}" and attach the audio
    Attach,
    /// Remove the attached audio
    Remove,
}

#[derive(Subcommand)]
pub enum ExportTarget {
    /// The active single creative at the selected aspect ratio
    Active,
    /// Every carousel slide, in order
    All,
    /// One carousel slide
    Slide { slide_id: String },
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List saved snapshots, most recent first
    List,
    /// Save the active creative or carousel
    Save,
    /// Restore a snapshot as the editing target
    Select { id: String },
    /// Delete every snapshot
    Clear {
        #[arg(long, help = "Apply without asking for confirmation")]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum KeyAction {
    /// Store an API key for this session, and durably with --remember
    Set {
        key: String,

        #[arg(long)]
        remember: bool,
    },
    /// Forget every stored key
    Clear,
    /// Report where the current key comes from
    Status,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ModeArg {
    Single,
    Carousel,
}

impl From<ModeArg> for GenerationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Single => GenerationMode::Single,
            ModeArg::Carousel => GenerationMode::Carousel,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FieldArg {
    Title,
    Subtitle,
    Body,
}

impl From<FieldArg> for TextField {
    fn from(field: FieldArg) -> Self {
        match field {
            FieldArg::Title => TextField::Title,
            FieldArg::Subtitle => TextField::Subtitle,
            FieldArg::Body => TextField::Body,
        }
    }
}

impl FieldArg {
    /// Slides carry no body text.
    pub fn slide_field(self) -> Option<SlideField> {
        match self {
            FieldArg::Title => Some(SlideField::Title),
            FieldArg::Subtitle => Some(SlideField::Subtitle),
            FieldArg::Body => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum InlineArg {
    Bold,
    Italic,
    ForeColor,
}

impl InlineArg {
    pub fn name(self) -> &'static str {
        match self {
            InlineArg::Bold => "bold",
            InlineArg::Italic => "italic",
            InlineArg::ForeColor => "foreColor",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum AssistTask {
    Hooks,
    Captions,
}

fn parse_aspect_ratio(raw: &str) -> Result<AspectRatio, String> {
    raw.parse::<AspectRatio>().map_err(|e| e.to_string())
}

pub fn parse() -> Cli {
    Cli::parse()
}
