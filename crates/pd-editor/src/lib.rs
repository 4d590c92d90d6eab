pub mod input;
pub mod overlay;
pub mod page;
pub mod shortcuts;
pub mod tools;
pub mod workbook;

pub use input::{InputEvent, InputModifiers, KeyState, PointerButton};
pub use overlay::{HandleDrag, HandleHit, HandleRole, TransformOverlay};
pub use page::Page;
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use tools::{SceneMutation, Tool, ToolContext, ToolKind};
pub use workbook::Workbook;
