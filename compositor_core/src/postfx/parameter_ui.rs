/// Immediate-mode parameter UI seam
///
/// Effects describe their tunables through this trait; the editor implements
/// it on top of its GUI toolkit. Every widget returns true when the user
/// changed the value this frame.

use glam::Vec3;

pub trait ParameterUi {
    /// Collapsible section; returns true while open
    fn collapsing_header(&mut self, label: &str, default_open: bool) -> bool;

    fn checkbox(&mut self, label: &str, value: &mut bool) -> bool;

    fn slider_f32(&mut self, label: &str, value: &mut f32, min: f32, max: f32, format: &str) -> bool;

    fn slider_u32(&mut self, label: &str, value: &mut u32, min: u32, max: u32) -> bool;

    /// Drop-down over `items`; `current` is an index into it
    fn combo(&mut self, label: &str, current: &mut usize, items: &[&str]) -> bool;

    fn color_edit3(&mut self, label: &str, color: &mut Vec3) -> bool;

    fn text(&mut self, text: &str);

    fn text_colored(&mut self, color: [f32; 4], text: &str);

    /// Tooltip for the previous widget when hovered
    fn tooltip(&mut self, text: &str);

    fn separator(&mut self);

    fn indent(&mut self);

    fn unindent(&mut self);

    fn push_id(&mut self, id: &str);

    fn pop_id(&mut self);
}

#[cfg(any(test, feature = "mock-device"))]
pub use recording::{RecordingUi, UiEdit};

#[cfg(any(test, feature = "mock-device"))]
mod recording {
    use super::ParameterUi;
    use glam::Vec3;
    use rustc_hash::FxHashMap;

    /// Scripted value applied to the widget with a matching id path
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum UiEdit {
        Bool(bool),
        Float(f32),
        UInt(u32),
        Index(usize),
        Color(Vec3),
    }

    /// `ParameterUi` that records every widget and applies scripted edits
    ///
    /// Widgets are addressed by their id path, e.g. `"Bloom/Threshold"`
    /// when drawn inside `push_id("Bloom")`.
    #[derive(Debug, Default)]
    pub struct RecordingUi {
        id_stack: Vec<String>,
        edits: FxHashMap<String, UiEdit>,
        widgets: Vec<String>,
        texts: Vec<String>,
        indent: i32,
        /// Collapsing headers report closed when false
        pub headers_open: bool,
    }

    impl RecordingUi {
        pub fn new() -> Self {
            Self { headers_open: true, ..Default::default() }
        }

        /// Queue an edit for the widget at `path`
        pub fn edit(&mut self, path: &str, edit: UiEdit) {
            self.edits.insert(path.to_string(), edit);
        }

        /// Id paths of every widget drawn, in order
        pub fn widgets(&self) -> &[String] {
            &self.widgets
        }

        /// Every text line drawn, in order
        pub fn texts(&self) -> &[String] {
            &self.texts
        }

        /// Current indentation depth (0 when pushes and pops balance)
        pub fn indent_depth(&self) -> i32 {
            self.indent
        }

        /// Current id stack depth
        pub fn id_depth(&self) -> usize {
            self.id_stack.len()
        }

        fn path(&self, label: &str) -> String {
            let mut path = self.id_stack.join("/");
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(label);
            path
        }

        fn take(&mut self, label: &str) -> Option<UiEdit> {
            let path = self.path(label);
            self.widgets.push(path.clone());
            self.edits.remove(&path)
        }
    }

    impl ParameterUi for RecordingUi {
        fn collapsing_header(&mut self, label: &str, _default_open: bool) -> bool {
            self.widgets.push(self.path(label));
            self.headers_open
        }

        fn checkbox(&mut self, label: &str, value: &mut bool) -> bool {
            match self.take(label) {
                Some(UiEdit::Bool(v)) => {
                    *value = v;
                    true
                }
                _ => false,
            }
        }

        fn slider_f32(&mut self, label: &str, value: &mut f32, min: f32, max: f32, _format: &str) -> bool {
            match self.take(label) {
                Some(UiEdit::Float(v)) => {
                    *value = v.clamp(min, max);
                    true
                }
                _ => false,
            }
        }

        fn slider_u32(&mut self, label: &str, value: &mut u32, min: u32, max: u32) -> bool {
            match self.take(label) {
                Some(UiEdit::UInt(v)) => {
                    *value = v.clamp(min, max);
                    true
                }
                _ => false,
            }
        }

        fn combo(&mut self, label: &str, current: &mut usize, items: &[&str]) -> bool {
            match self.take(label) {
                Some(UiEdit::Index(i)) if i < items.len() => {
                    *current = i;
                    true
                }
                _ => false,
            }
        }

        fn color_edit3(&mut self, label: &str, color: &mut Vec3) -> bool {
            match self.take(label) {
                Some(UiEdit::Color(c)) => {
                    *color = c;
                    true
                }
                _ => false,
            }
        }

        fn text(&mut self, text: &str) {
            self.texts.push(text.to_string());
        }

        fn text_colored(&mut self, _color: [f32; 4], text: &str) {
            self.texts.push(text.to_string());
        }

        fn tooltip(&mut self, _text: &str) {}

        fn separator(&mut self) {}

        fn indent(&mut self) {
            self.indent += 1;
        }

        fn unindent(&mut self) {
            self.indent -= 1;
        }

        fn push_id(&mut self, id: &str) {
            self.id_stack.push(id.to_string());
        }

        fn pop_id(&mut self) {
            self.id_stack.pop();
        }
    }
}
