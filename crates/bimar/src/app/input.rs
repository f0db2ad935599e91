use std::sync::Arc;

use pollster::FutureExt;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use bimar_core::{InputEvent, PointerButton, Vec2};
use bimar_render::{RenderEngine, SceneRenderer};

use super::App;

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

impl App {
    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> crate::Result<()> {
        let [width, height] = self.window_size;
        let window_attributes = Window::default_attributes()
            .with_title("bimar")
            .with_inner_size(LogicalSize::new(width, height));
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let mut engine = RenderEngine::new_windowed(window.clone()).block_on()?;
        engine.set_background(self.viewer.background());
        let (width, height) = engine.dimensions();
        self.viewer.resize(width, height, &mut engine);
        log::info!("window created: {width}x{height}");

        window.request_redraw();
        self.window = Some(window);
        self.engine = Some(engine);
        Ok(())
    }

    fn push_input(&mut self, event: WindowEvent) {
        let input = &mut self.viewer.input;
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                input.push(InputEvent::PointerMoved {
                    position: Vec2::new(position.x as f32, position.y as f32),
                });
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(button) = pointer_button(button) {
                    input.push(InputEvent::PointerButton {
                        button,
                        pressed: state == ElementState::Pressed,
                    });
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                input.push(InputEvent::Wheel { delta });
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.repeat {
                    return;
                }
                if let PhysicalKey::Code(code) = event.physical_key {
                    let pressed = event.state == ElementState::Pressed;
                    if pressed && code == KeyCode::Escape {
                        self.close_requested = true;
                    }
                    input.push(InputEvent::Key {
                        code: format!("{code:?}"),
                        pressed,
                    });
                }
            }
            WindowEvent::Touch(touch) => {
                let position = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                input.push(match touch.phase {
                    TouchPhase::Started => InputEvent::TouchStart {
                        id: touch.id,
                        position,
                    },
                    TouchPhase::Moved => InputEvent::TouchMove {
                        id: touch.id,
                        position,
                    },
                    TouchPhase::Ended | TouchPhase::Cancelled => {
                        InputEvent::TouchEnd { id: touch.id }
                    }
                });
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.create_window(event_loop) {
            log::error!("failed to start the viewer: {err}");
            self.error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.close_requested = true;
            }
            WindowEvent::Resized(size) => {
                if let Some(engine) = &mut self.engine {
                    self.viewer.resize(size.width, size.height, engine);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            other => self.push_input(other),
        }

        if self.close_requested {
            event_loop.exit();
        }
    }
}
