use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;

use bimar::{AssetSource, FileSource, InteractionLoop, Options, ScriptedSession, XrFrame};

/// Marker-anchored BIM viewer.
#[derive(Debug, Parser)]
#[command(name = "bimar-viewer", version, about)]
struct Cli {
    /// JSON options file; defaults apply to every field it omits.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory asset URLs are resolved against.
    #[arg(long, default_value = ".")]
    assets: PathBuf,

    /// Replay marker tracking from a JSON script.
    #[arg(long)]
    tracking_script: Option<PathBuf>,

    /// Render one frame without a window and save it to this PNG or JPEG file.
    #[arg(long)]
    screenshot: Option<PathBuf>,
}

fn run(cli: Cli) -> bimar::Result<()> {
    let options = match &cli.config {
        Some(path) => Options::load(path)?,
        None => Options::default(),
    };
    let source: Rc<dyn AssetSource> = Rc::new(FileSource::new(&cli.assets));
    let session = cli
        .tracking_script
        .as_ref()
        .map(ScriptedSession::load)
        .transpose()?;

    let Some(path) = cli.screenshot else {
        return bimar::run(&options, source, session);
    };

    let mut viewer = InteractionLoop::new(&options, source);
    if let Some(session) = &session {
        viewer.begin_session(session);
    }
    let frame = session
        .as_ref()
        .and_then(|session| session.frame(0))
        .map(|frame| frame as &dyn XrFrame);
    let [width, height] = options.window_size;
    bimar::render_to_file(&mut viewer, &path, width, height, frame)?;
    log::info!("screenshot saved to {}", path.display());
    Ok(())
}

fn main() -> ExitCode {
    bimar::init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("bimar-viewer: {err}");
            ExitCode::FAILURE
        }
    }
}
