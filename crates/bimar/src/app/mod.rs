//! Application window and event loop management.

mod input;

use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use winit::event_loop::EventLoop;
use winit::window::Window;

use bimar_assets::AssetSource;
use bimar_core::{Options, XrFrame};
use bimar_render::RenderEngine;

use crate::error::{BimarError, Result};
use crate::interaction::InteractionLoop;
use crate::xr::ScriptedSession;

/// The viewer application state.
pub struct App {
    window: Option<Arc<Window>>,
    engine: Option<RenderEngine>,
    viewer: InteractionLoop,
    session: Option<ScriptedSession>,
    window_size: [u32; 2],
    started: Instant,
    frame_index: usize,
    close_requested: bool,
    error: Option<BimarError>,
}

impl App {
    /// Creates the application. With a session, the viewer starts immersive and
    /// replays the session's tracking frames.
    pub fn new(
        options: &Options,
        source: Rc<dyn AssetSource>,
        session: Option<ScriptedSession>,
    ) -> Self {
        let mut viewer = InteractionLoop::new(options, source);
        if let Some(session) = &session {
            viewer.begin_session(session);
        }
        Self {
            window: None,
            engine: None,
            viewer,
            session,
            window_size: options.window_size,
            started: Instant::now(),
            frame_index: 0,
            close_requested: false,
            error: None,
        }
    }

    /// Runs one frame of the interaction loop and schedules the next.
    fn redraw(&mut self) {
        let Some(engine) = &mut self.engine else {
            return;
        };
        let time_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let frame = self
            .session
            .as_ref()
            .and_then(|session| session.frame(self.frame_index))
            .map(|frame| frame as &dyn XrFrame);
        self.frame_index += 1;

        if let Err(err) = self.viewer.frame(time_ms, frame, engine) {
            log::error!("frame failed: {err}");
            self.error = Some(err);
            self.close_requested = true;
            return;
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    /// Error that ended the event loop, if any.
    pub fn take_error(&mut self) -> Option<BimarError> {
        self.error.take()
    }
}

/// Opens a window and runs the viewer until it is closed.
///
/// A fatal frame error (malformed tracking data, lost GPU) closes the window
/// and is returned.
pub fn run(
    options: &Options,
    source: Rc<dyn AssetSource>,
    session: Option<ScriptedSession>,
) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(options, source, session);

    event_loop.run_app(&mut app)?;
    app.viewer.shutdown();
    match app.take_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
