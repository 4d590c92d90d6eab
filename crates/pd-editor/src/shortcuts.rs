//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. The map lives
//! here so every shell shares the same bindings.
//!
//! - single letters pick tools
//! - Delete removes the selection, ⌘Delete clears the page
//! - ⌘= / ⌘- grow and shrink the selection, ⌘0 resets the view
//! - Escape abandons the gesture in progress

use crate::input::KeyState;
use crate::tools::ToolKind;

/// Factor applied by one "bigger" / "smaller" step.
pub const SCALE_STEP: f64 = 1.1;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShortcutAction {
    // ── Tool switching ──
    Tool(ToolKind),

    // ── Edit ──
    AddText,
    DeleteSelected,
    /// Remove every item on the page (⌘Delete).
    ClearAll,
    ScaleSelected(f64),

    // ── View ──
    ResetView,

    // ── Gesture ──
    Cancel,
}

/// Resolves key events into shortcut actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘,
/// on other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"l"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(key: &str, keys: KeyState) -> Option<ShortcutAction> {
        if keys.cmd() {
            return match key {
                "=" | "+" => Some(ShortcutAction::ScaleSelected(SCALE_STEP)),
                "-" => Some(ShortcutAction::ScaleSelected(1.0 / SCALE_STEP)),
                "0" => Some(ShortcutAction::ResetView),
                "Delete" | "Backspace" => Some(ShortcutAction::ClearAll),
                _ => None,
            };
        }

        // Alt/Shift + letter stays free for text entry in the shell.
        if keys.alt || keys.shift {
            return None;
        }

        match key {
            "v" | "V" => Some(ShortcutAction::Tool(ToolKind::Select)),
            "l" | "L" => Some(ShortcutAction::Tool(ToolKind::Line)),
            "p" | "P" => Some(ShortcutAction::Tool(ToolKind::Pen)),
            "e" | "E" => Some(ShortcutAction::Tool(ToolKind::Eraser)),
            "a" | "A" => Some(ShortcutAction::Tool(ToolKind::Arc)),
            "t" | "T" => Some(ShortcutAction::AddText),
            "Delete" | "Backspace" => Some(ShortcutAction::DeleteSelected),
            "Escape" => Some(ShortcutAction::Cancel),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CMD: KeyState = KeyState {
        meta: true,
        ..KeyState::NONE
    };
    const CTRL: KeyState = KeyState {
        ctrl: true,
        ..KeyState::NONE
    };

    #[test]
    fn resolve_tool_shortcuts() {
        assert_eq!(
            ShortcutMap::resolve("v", KeyState::NONE),
            Some(ShortcutAction::Tool(ToolKind::Select))
        );
        assert_eq!(
            ShortcutMap::resolve("l", KeyState::NONE),
            Some(ShortcutAction::Tool(ToolKind::Line))
        );
        assert_eq!(
            ShortcutMap::resolve("P", KeyState::NONE),
            Some(ShortcutAction::Tool(ToolKind::Pen))
        );
        assert_eq!(
            ShortcutMap::resolve("e", KeyState::NONE),
            Some(ShortcutAction::Tool(ToolKind::Eraser))
        );
        assert_eq!(
            ShortcutMap::resolve("a", KeyState::NONE),
            Some(ShortcutAction::Tool(ToolKind::Arc))
        );
    }

    #[test]
    fn resolve_delete() {
        assert_eq!(
            ShortcutMap::resolve("Delete", KeyState::NONE),
            Some(ShortcutAction::DeleteSelected)
        );
        assert_eq!(
            ShortcutMap::resolve("Backspace", KeyState::NONE),
            Some(ShortcutAction::DeleteSelected)
        );
    }

    #[test]
    fn resolve_cmd_delete_clears_all() {
        assert_eq!(ShortcutMap::resolve("Delete", CMD), Some(ShortcutAction::ClearAll));
        assert_eq!(ShortcutMap::resolve("Backspace", CTRL), Some(ShortcutAction::ClearAll));
    }

    #[test]
    fn resolve_scale_and_view() {
        assert_eq!(
            ShortcutMap::resolve("=", CMD),
            Some(ShortcutAction::ScaleSelected(SCALE_STEP))
        );
        assert_eq!(
            ShortcutMap::resolve("-", CTRL),
            Some(ShortcutAction::ScaleSelected(1.0 / SCALE_STEP))
        );
        assert_eq!(ShortcutMap::resolve("0", CMD), Some(ShortcutAction::ResetView));
    }

    #[test]
    fn resolve_modifier_precedence() {
        // Plain "0" is not bound; ⌘0 is.
        assert_eq!(ShortcutMap::resolve("0", KeyState::NONE), None);
        // ⌘L is not a tool switch.
        assert_eq!(ShortcutMap::resolve("l", CMD), None);
        let shift = KeyState {
            shift: true,
            ..KeyState::NONE
        };
        assert_eq!(ShortcutMap::resolve("t", shift), None);
    }

    #[test]
    fn resolve_text_and_escape() {
        assert_eq!(ShortcutMap::resolve("t", KeyState::NONE), Some(ShortcutAction::AddText));
        assert_eq!(ShortcutMap::resolve("Escape", KeyState::NONE), Some(ShortcutAction::Cancel));
        assert_eq!(ShortcutMap::resolve("q", KeyState::NONE), None);
    }
}
