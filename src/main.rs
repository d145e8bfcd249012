use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use log::{error, info};
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
};

use mathsnap::annotate::{AnnotationSurface, ImageKind, SessionCallbacks, SurfaceEvent};
use mathsnap::capture::{load_photo, EncodedImage};
use mathsnap::clipboard::{StdoutSink, SystemClipboard, TextSink};
use mathsnap::config::Config;
use mathsnap::loader::{spawn_load, ImageSource};
use mathsnap::paint_window::PaintWindow;
use mathsnap::pipeline::{deliver, spawn_recognize, transcribe, Transcription};
use mathsnap::recognize::{CaptureMode, OpenAiRecognizer, Recognizer};

const POLL_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Parser, Debug)]
#[command(version, about = "Turn a photo of math into LaTeX on the clipboard", long_about = None)]
struct Args {
    /// Photo to transcribe
    image: PathBuf,

    /// Low-resolution copy shown while the full photo is still decoding
    #[arg(long)]
    preview: Option<PathBuf>,

    /// `paint` to circle the math first, `direct` to send the whole photo
    #[arg(long, value_enum, default_value_t = ModeArg::Paint)]
    mode: ModeArg,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured model
    #[arg(long)]
    model: Option<String>,

    /// Print the LaTeX instead of copying it to the clipboard
    #[arg(long)]
    print_only: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Direct,
    Paint,
}

impl From<ModeArg> for CaptureMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Direct => CaptureMode::Direct,
            ModeArg::Paint => CaptureMode::Paint,
        }
    }
}

enum Outcome {
    Confirmed(EncodedImage),
    Canceled,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    let mode = CaptureMode::from(args.mode);
    info!("starting mathsnap ({:?} mode, model {})", mode, config.model);

    let recognizer: Arc<dyn Recognizer> = Arc::new(OpenAiRecognizer::new(&config)?);
    let sink: Box<dyn TextSink> = if args.print_only {
        Box::new(StdoutSink)
    } else {
        Box::new(SystemClipboard::new()?)
    };

    match mode {
        CaptureMode::Direct => run_direct(&args, &config, recognizer, sink),
        CaptureMode::Paint => run_paint(&args, &config, recognizer, sink),
    }
}

fn run_direct(
    args: &Args,
    config: &Config,
    recognizer: Arc<dyn Recognizer>,
    mut sink: Box<dyn TextSink>,
) -> Result<()> {
    let image = load_photo(&args.image, config.snapshot_format, config.jpeg_quality)?;
    let out = transcribe(recognizer.as_ref(), sink.as_mut(), &image, CaptureMode::Direct)?;
    report(&out);
    Ok(())
}

#[allow(deprecated)]
fn run_paint(
    args: &Args,
    config: &Config,
    recognizer: Arc<dyn Recognizer>,
    mut sink: Box<dyn TextSink>,
) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let (image_tx, image_rx) = mpsc::channel::<SurfaceEvent>();
    let (outcome_tx, outcome_rx) = mpsc::channel::<Outcome>();
    let (latex_tx, latex_rx) = mpsc::channel::<Result<String>>();
    let mut paint: Option<PaintWindow> = None;
    let mut result: Result<()> = Ok(());

    event_loop.run(|event, elwt| match event {
        Event::Resumed => {
            if paint.is_some() {
                return;
            }
            let (confirm_tx, cancel_tx) = (outcome_tx.clone(), outcome_tx.clone());
            let callbacks = SessionCallbacks::new(
                move |img| {
                    let _ = confirm_tx.send(Outcome::Confirmed(img));
                },
                move || {
                    let _ = cancel_tx.send(Outcome::Canceled);
                },
            );
            let created = AnnotationSurface::new(
                config.window_width,
                config.window_height,
                config.surface_options(),
                callbacks,
            )
            .and_then(|surface| PaintWindow::new(elwt, surface));
            match created {
                Ok(pw) => {
                    let session = pw.annotation.session();
                    if let Some(preview) = &args.preview {
                        spawn_load(
                            ImageSource::Path(preview.clone()),
                            ImageKind::Preview,
                            session,
                            image_tx.clone(),
                        );
                    }
                    spawn_load(
                        ImageSource::Path(args.image.clone()),
                        ImageKind::Full,
                        session,
                        image_tx.clone(),
                    );
                    paint = Some(pw);
                }
                Err(e) => {
                    result = Err(e);
                    elwt.exit();
                }
            }
        }
        Event::AboutToWait => {
            if let Some(pw) = &mut paint {
                while let Ok(ev) = image_rx.try_recv() {
                    pw.dispatch(ev);
                }
            }
            while let Ok(outcome) = outcome_rx.try_recv() {
                match outcome {
                    Outcome::Confirmed(img) => {
                        info!(
                            "sending {}x{} crop for recognition",
                            img.width, img.height
                        );
                        if let Some(pw) = &paint {
                            pw.window.set_visible(false);
                        }
                        spawn_recognize(
                            recognizer.clone(),
                            img,
                            CaptureMode::Paint,
                            latex_tx.clone(),
                        );
                    }
                    Outcome::Canceled => elwt.exit(),
                }
            }
            if let Ok(res) = latex_rx.try_recv() {
                result = res
                    .and_then(|latex| deliver(sink.as_mut(), &latex))
                    .map(|out| report(&out));
                if let Err(e) = &result {
                    error!("recognition failed: {e:#}");
                }
                elwt.exit();
            }
            elwt.set_control_flow(ControlFlow::WaitUntil(Instant::now() + POLL_INTERVAL));
        }
        Event::WindowEvent {
            event: WindowEvent::RedrawRequested,
            window_id,
        } => {
            if let Some(pw) = &mut paint {
                if pw.window.id() == window_id {
                    pw.redraw();
                }
            }
        }
        Event::WindowEvent { event, window_id } => {
            if let Some(pw) = &mut paint {
                if pw.window.id() == window_id {
                    pw.handle_event(&event);
                }
            }
        }
        _ => {}
    })
    .map_err(|e| anyhow!("event loop: {e}"))?;
    result
}

fn report(out: &Transcription) {
    match out {
        Transcription::Latex(latex) => info!("LaTeX ready: {latex}"),
        Transcription::NoMath => eprintln!("No math found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_defaults_to_paint() {
        let args = Args::try_parse_from(["mathsnap", "photo.jpg"]).unwrap();
        assert_eq!(CaptureMode::from(args.mode), CaptureMode::Paint);
        assert!(!args.print_only);
    }

    #[test]
    fn test_mode_flag_selects_direct() {
        let args =
            Args::try_parse_from(["mathsnap", "photo.jpg", "--mode", "direct", "--print-only"])
                .unwrap();
        assert_eq!(CaptureMode::from(args.mode), CaptureMode::Direct);
        assert!(args.print_only);
        assert!(Args::try_parse_from(["mathsnap", "photo.jpg", "--mode", "crop"]).is_err());
    }
}
