use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use super::orbit_controls::PointerInput;

/// Pixels of trackpad scroll that count as one wheel step
const PIXELS_PER_STEP: f32 = 50.0;

/// Translates winit input into [`PointerInput`] for the orbit controls.
///
/// Left drag rotates, Shift + left drag pans, the wheel dollies.
#[derive(Debug, Default)]
pub struct CameraController {
    is_shift_held: bool,
    is_mouse_pressed: bool,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks button and modifier state; wheel events produce a dolly
    pub fn process_window_event(&mut self, event: &WindowEvent) -> Option<PointerInput> {
        match event {
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.is_mouse_pressed = *state == ElementState::Pressed;
                None
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                        *scroll as f32 / PIXELS_PER_STEP
                    }
                };
                Some(PointerInput::Dolly { steps })
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.process_keyed_event(event);
                None
            }
            WindowEvent::Focused(false) => {
                self.is_mouse_pressed = false;
                self.is_shift_held = false;
                None
            }
            _ => None,
        }
    }

    /// Raw mouse motion becomes a rotate or pan while the button is held
    pub fn process_device_event(&mut self, event: &DeviceEvent) -> Option<PointerInput> {
        match event {
            DeviceEvent::MouseMotion { delta } if self.is_mouse_pressed => {
                let (dx, dy) = (delta.0 as f32, delta.1 as f32);
                if self.is_shift_held {
                    Some(PointerInput::Pan { dx, dy })
                } else {
                    Some(PointerInput::Rotate { dx, dy })
                }
            }
            _ => None,
        }
    }

    fn process_keyed_event(&mut self, event: &KeyEvent) {
        if let PhysicalKey::Code(KeyCode::ShiftLeft | KeyCode::ShiftRight) = event.physical_key {
            self.is_shift_held = event.state == ElementState::Pressed;
        }
    }

    /// Returns true if currently panning
    pub fn is_panning(&self) -> bool {
        self.is_mouse_pressed && self.is_shift_held
    }

    /// Returns true if currently rotating
    pub fn is_rotating(&self) -> bool {
        self.is_mouse_pressed && !self.is_shift_held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_ignored_without_button() {
        let mut controller = CameraController::new();
        let motion = DeviceEvent::MouseMotion { delta: (4.0, 2.0) };
        assert_eq!(controller.process_device_event(&motion), None);
        assert!(!controller.is_rotating());
    }

    #[test]
    fn test_wheel_lines_map_to_dolly_steps() {
        let mut controller = CameraController::new();
        let wheel = WindowEvent::MouseWheel {
            // SAFETY: the id is only compared, never handed to the platform
            device_id: unsafe { winit::event::DeviceId::dummy() },
            delta: MouseScrollDelta::LineDelta(0.0, 2.0),
            phase: winit::event::TouchPhase::Moved,
        };
        assert_eq!(
            controller.process_window_event(&wheel),
            Some(PointerInput::Dolly { steps: 2.0 })
        );
    }
}
