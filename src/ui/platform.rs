use imgui::{BackendFlags, Context, Io, Key};
use std::time::Instant;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, ModifiersState, PhysicalKey},
    window::Window,
};

/// Pixels per wheel "line" for touchpads reporting pixel deltas.
const PIXELS_PER_LINE: f32 = 20.0;

/// Feeds winit window events into the ImGui IO state.
pub struct ImguiWinitPlatform {
    scale_factor: f64,
    last_frame: Instant,
}

impl ImguiWinitPlatform {
    pub fn new(imgui_ctx: &mut Context, window: &Window) -> Self {
        let io = imgui_ctx.io_mut();
        io.backend_flags.insert(BackendFlags::HAS_MOUSE_CURSORS);
        io.backend_flags.insert(BackendFlags::HAS_SET_MOUSE_POS);

        let scale_factor = window.scale_factor();
        io.display_framebuffer_scale = [scale_factor as f32, scale_factor as f32];
        let size = window.inner_size().to_logical::<f32>(scale_factor);
        io.display_size = [size.width, size.height];

        Self {
            scale_factor,
            last_frame: Instant::now(),
        }
    }

    pub fn process_event(&mut self, imgui_ctx: &mut Context, event: &WindowEvent) {
        let io = imgui_ctx.io_mut();
        match event {
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = *scale_factor;
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                update_key_modifiers(io, modifiers.state());
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let pressed = event.state == ElementState::Pressed;
                if let PhysicalKey::Code(code) = event.physical_key {
                    if let Some(key) = to_imgui_key(code) {
                        io.add_key_event(key, pressed);
                    }
                }
                if pressed {
                    if let Some(text) = &event.text {
                        text.chars()
                            .filter(|ch| !ch.is_control())
                            .for_each(|ch| io.add_input_character(ch));
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                io.add_mouse_pos_event(self.to_logical(*position));
            }
            WindowEvent::CursorLeft { .. } => {
                io.add_mouse_pos_event([f32::MAX, f32::MAX]);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                io.add_mouse_wheel_event(wheel_delta(*delta));
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(button) = to_imgui_button(*button) {
                    io.add_mouse_button_event(button, *state == ElementState::Pressed);
                }
            }
            WindowEvent::Focused(false) => {
                // Keys released while unfocused never arrive.
                update_key_modifiers(io, ModifiersState::empty());
            }
            _ => {}
        }
    }

    /// Updates display size and delta time ahead of `Context::new_frame`.
    pub fn prepare_frame(&mut self, imgui_ctx: &mut Context, window: &Window) {
        let now = Instant::now();
        let io = imgui_ctx.io_mut();
        io.update_delta_time(now - self.last_frame);
        self.last_frame = now;

        let size = window.inner_size().to_logical::<f32>(self.scale_factor);
        io.display_size = [size.width, size.height];
        io.display_framebuffer_scale = [self.scale_factor as f32, self.scale_factor as f32];
    }

    fn to_logical(&self, position: PhysicalPosition<f64>) -> [f32; 2] {
        let position = position.to_logical::<f32>(self.scale_factor);
        [position.x, position.y]
    }
}

fn update_key_modifiers(io: &mut Io, state: ModifiersState) {
    io.add_key_event(Key::ModCtrl, state.control_key());
    io.add_key_event(Key::ModShift, state.shift_key());
    io.add_key_event(Key::ModAlt, state.alt_key());
    io.add_key_event(Key::ModSuper, state.super_key());
}

fn to_imgui_button(button: MouseButton) -> Option<imgui::MouseButton> {
    match button {
        MouseButton::Left => Some(imgui::MouseButton::Left),
        MouseButton::Right => Some(imgui::MouseButton::Right),
        MouseButton::Middle => Some(imgui::MouseButton::Middle),
        MouseButton::Back => Some(imgui::MouseButton::Extra1),
        MouseButton::Forward => Some(imgui::MouseButton::Extra2),
        MouseButton::Other(_) => None,
    }
}

/// Wheel movement in lines, as ImGui expects.
pub fn wheel_delta(delta: MouseScrollDelta) -> [f32; 2] {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => [x, y],
        MouseScrollDelta::PixelDelta(position) => [
            position.x as f32 / PIXELS_PER_LINE,
            position.y as f32 / PIXELS_PER_LINE,
        ],
    }
}

fn to_imgui_key(code: KeyCode) -> Option<Key> {
    Some(match code {
        KeyCode::Tab => Key::Tab,
        KeyCode::ArrowLeft => Key::LeftArrow,
        KeyCode::ArrowRight => Key::RightArrow,
        KeyCode::ArrowUp => Key::UpArrow,
        KeyCode::ArrowDown => Key::DownArrow,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Insert => Key::Insert,
        KeyCode::Delete => Key::Delete,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Space => Key::Space,
        KeyCode::Enter => Key::Enter,
        KeyCode::NumpadEnter => Key::KeypadEnter,
        KeyCode::Escape => Key::Escape,
        KeyCode::Quote => Key::Apostrophe,
        KeyCode::Comma => Key::Comma,
        KeyCode::Minus => Key::Minus,
        KeyCode::Period => Key::Period,
        KeyCode::Slash => Key::Slash,
        KeyCode::Semicolon => Key::Semicolon,
        KeyCode::Equal => Key::Equal,
        KeyCode::BracketLeft => Key::LeftBracket,
        KeyCode::Backslash => Key::Backslash,
        KeyCode::BracketRight => Key::RightBracket,
        KeyCode::Backquote => Key::GraveAccent,
        KeyCode::CapsLock => Key::CapsLock,
        KeyCode::ScrollLock => Key::ScrollLock,
        KeyCode::NumLock => Key::NumLock,
        KeyCode::PrintScreen => Key::PrintScreen,
        KeyCode::Pause => Key::Pause,
        KeyCode::ControlLeft => Key::LeftCtrl,
        KeyCode::ShiftLeft => Key::LeftShift,
        KeyCode::AltLeft => Key::LeftAlt,
        KeyCode::SuperLeft => Key::LeftSuper,
        KeyCode::ControlRight => Key::RightCtrl,
        KeyCode::ShiftRight => Key::RightShift,
        KeyCode::AltRight => Key::RightAlt,
        KeyCode::SuperRight => Key::RightSuper,
        KeyCode::ContextMenu => Key::Menu,
        KeyCode::Numpad0 => Key::Keypad0,
        KeyCode::Numpad1 => Key::Keypad1,
        KeyCode::Numpad2 => Key::Keypad2,
        KeyCode::Numpad3 => Key::Keypad3,
        KeyCode::Numpad4 => Key::Keypad4,
        KeyCode::Numpad5 => Key::Keypad5,
        KeyCode::Numpad6 => Key::Keypad6,
        KeyCode::Numpad7 => Key::Keypad7,
        KeyCode::Numpad8 => Key::Keypad8,
        KeyCode::Numpad9 => Key::Keypad9,
        KeyCode::NumpadDecimal => Key::KeypadDecimal,
        KeyCode::NumpadSubtract => Key::KeypadSubtract,
        KeyCode::Digit0 => Key::Alpha0,
        KeyCode::Digit1 => Key::Alpha1,
        KeyCode::Digit2 => Key::Alpha2,
        KeyCode::Digit3 => Key::Alpha3,
        KeyCode::Digit4 => Key::Alpha4,
        KeyCode::Digit5 => Key::Alpha5,
        KeyCode::Digit6 => Key::Alpha6,
        KeyCode::Digit7 => Key::Alpha7,
        KeyCode::Digit8 => Key::Alpha8,
        KeyCode::Digit9 => Key::Alpha9,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyC => Key::C,
        KeyCode::KeyV => Key::V,
        KeyCode::KeyX => Key::X,
        KeyCode::KeyY => Key::Y,
        KeyCode::KeyZ => Key::Z,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editing_keys_are_mapped() {
        assert_eq!(to_imgui_key(KeyCode::Backspace), Some(Key::Backspace));
        assert_eq!(to_imgui_key(KeyCode::Enter), Some(Key::Enter));
        assert_eq!(to_imgui_key(KeyCode::Digit5), Some(Key::Alpha5));
        assert_eq!(to_imgui_key(KeyCode::NumpadDecimal), Some(Key::KeypadDecimal));
        assert_eq!(to_imgui_key(KeyCode::F24), None);
    }

    #[test]
    fn pixel_wheel_deltas_become_lines() {
        let delta = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -40.0));
        assert_eq!(wheel_delta(delta), [0.0, -2.0]);
        assert_eq!(wheel_delta(MouseScrollDelta::LineDelta(0.0, 1.0)), [0.0, 1.0]);
    }

    #[test]
    fn extra_buttons_map_to_extra_slots() {
        assert_eq!(to_imgui_button(MouseButton::Back), Some(imgui::MouseButton::Extra1));
        assert_eq!(to_imgui_button(MouseButton::Other(7)), None);
    }
}
