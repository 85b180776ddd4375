mod cli;
mod commands;
mod formatting;
mod settings;

use std::process::ExitCode;

use adforge_lib::{AdforgeOutput, ForgeError};
use cli::Commands;
use commands::{
    run_assist, run_audio, run_edit, run_export, run_generate, run_history, run_key, run_reset,
    run_select, run_show, run_slides, run_style, run_view, App,
};

#[tokio::main]
async fn main() -> ExitCode {
    run().await
}

async fn run() -> ExitCode {
    let raw_args: Vec<String> = std::env::args().collect();
    let args = cli::parse();
    settings::init_tracing(args.verbose);

    let result = match App::open(args.config.as_deref(), args.verbose) {
        Ok(app) => dispatch(&app, &raw_args, args.command).await,
        Err(err) => Err(err),
    };
    formatting::finish(result, args.format, args.output)
}

async fn dispatch(
    app: &App,
    raw_args: &[String],
    command: Commands,
) -> Result<AdforgeOutput, ForgeError> {
    match command {
        Commands::Generate {
            context,
            context_file,
            audio,
            document,
            style_guide,
            mode,
            expert_image,
            variations,
            slides,
        } => {
            run_generate(
                app,
                raw_args,
                commands::GenerateArgs {
                    context,
                    context_file,
                    audio,
                    document,
                    style_guide,
                    mode: mode.into(),
                    expert_image,
                    variations,
                    slides,
                },
            )
            .await
        }
        Commands::Show => run_show(app),
        Commands::Select { creative_id } => run_select(app, &creative_id),
        Commands::Edit { action } => run_edit(app, action),
        Commands::Style { action } => run_style(app, action),
        Commands::Slides { action } => run_slides(app, action).await,
        Commands::Audio { action } => run_audio(app, action).await,
        Commands::View { aspect_ratio, zoom } => run_view(app, aspect_ratio, zoom),
        Commands::Reset { yes } => run_reset(app, yes),
        Commands::Export {
            target,
            output_dir,
            pixel_ratio,
        } => run_export(app, target, output_dir, pixel_ratio).await,
        Commands::History { action } => run_history(app, action),
        Commands::Key { action } => run_key(app, action),
        Commands::Assist { task, context } => run_assist(app, task, context).await,
    }
}
