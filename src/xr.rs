//! Immersive (AR) session entry point
//!
//! The overlay shows one button for entering an AR session. Whether that is
//! possible depends on the platform runtime, so the button is backed by an
//! [`ImmersiveEntry`] implementation chosen at startup.

use log::warn;

use crate::error::{SceneError, SceneResult};

/// Something that can start an immersive AR session
pub trait ImmersiveEntry {
    fn is_supported(&self) -> bool;

    /// Text shown on the entry button
    fn label(&self) -> &str;

    fn request_session(&mut self) -> SceneResult<()>;
}

/// Entry point for platforms without an AR runtime
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedImmersiveEntry;

impl UnsupportedImmersiveEntry {
    pub const LABEL: &'static str = "AR NOT SUPPORTED";
}

impl ImmersiveEntry for UnsupportedImmersiveEntry {
    fn is_supported(&self) -> bool {
        false
    }

    fn label(&self) -> &str {
        Self::LABEL
    }

    fn request_session(&mut self) -> SceneResult<()> {
        warn!("Immersive AR session requested, but no AR runtime is available");
        Err(SceneError::ImmersiveUnavailable(
            "no AR runtime on this platform".to_string(),
        ))
    }
}

/// Draws the entry button centred at the bottom of the window.
///
/// Returns true when the button was clicked this frame.
pub fn render_entry_button(ui: &imgui::Ui, entry: &dyn ImmersiveEntry) -> bool {
    let [width, height] = ui.io().display_size;
    let button_size = [160.0, 34.0];

    let mut clicked = false;
    ui.window("Immersive Entry")
        .position(
            [(width - button_size[0]) * 0.5, height - button_size[1] - 28.0],
            imgui::Condition::Always,
        )
        .no_decoration()
        .always_auto_resize(true)
        .bg_alpha(0.0)
        .build(|| {
            let _disabled = (!entry.is_supported()).then(|| {
                ui.push_style_color(imgui::StyleColor::Text, [1.0, 1.0, 1.0, 0.6])
            });
            clicked = ui.button_with_size(entry.label(), button_size);
        });
    clicked
}
