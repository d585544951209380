//! Operator console: discrete commands that drive status transitions.

use std::collections::VecDeque;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use tracing::debug;

use crate::Result;

/// A discrete command from the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Advance to the next status (start grasping, start/stop teleop).
    Confirm,
    /// The episode succeeded; persist it.
    Save,
    /// The episode failed; reset without persisting.
    Discard,
    /// Stop the session immediately.
    Quit,
}

/// Source of operator commands, polled once per loop iteration.
///
/// `poll` must never block; `None` means no command arrived since the
/// last poll.
pub trait OperatorConsole {
    /// Returns the next pending command, if any.
    ///
    /// # Errors
    ///
    /// Fails only on console I/O errors.
    fn poll(&mut self) -> Result<Option<OperatorCommand>>;
}

/// A console fed from an in-memory queue, for tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct QueuedConsole {
    queue: VecDeque<OperatorCommand>,
}

impl QueuedConsole {
    /// Creates a console that will yield `commands` in order.
    #[must_use]
    pub fn new(commands: impl IntoIterator<Item = OperatorCommand>) -> Self {
        Self {
            queue: commands.into_iter().collect(),
        }
    }

    /// Appends a command to the queue.
    pub fn push(&mut self, command: OperatorCommand) {
        self.queue.push_back(command);
    }
}

impl OperatorConsole for QueuedConsole {
    fn poll(&mut self) -> Result<Option<OperatorCommand>> {
        Ok(self.queue.pop_front())
    }
}

/// A console reading the terminal keyboard without blocking.
///
/// Bindings: space confirms, `s` saves, `f` discards, Esc quits. All
/// other keys are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyboardConsole;

impl KeyboardConsole {
    /// Creates a keyboard console.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn translate(key: KeyEvent) -> Option<OperatorCommand> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        match key.code {
            KeyCode::Char(' ') => Some(OperatorCommand::Confirm),
            KeyCode::Char('s') => Some(OperatorCommand::Save),
            KeyCode::Char('f') => Some(OperatorCommand::Discard),
            KeyCode::Esc => Some(OperatorCommand::Quit),
            _ => None,
        }
    }
}

impl OperatorConsole for KeyboardConsole {
    fn poll(&mut self) -> Result<Option<OperatorCommand>> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if let Some(command) = Self::translate(key) {
                    debug!(?command, "operator command");
                    return Ok(Some(command));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[test]
    fn queued_console_yields_in_order() {
        let mut console = QueuedConsole::new([OperatorCommand::Confirm, OperatorCommand::Save]);
        assert_eq!(console.poll().unwrap(), Some(OperatorCommand::Confirm));
        assert_eq!(console.poll().unwrap(), Some(OperatorCommand::Save));
        assert_eq!(console.poll().unwrap(), None);
    }

    #[test]
    fn key_bindings() {
        let press = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert_eq!(
            KeyboardConsole::translate(press(KeyCode::Char(' '))),
            Some(OperatorCommand::Confirm)
        );
        assert_eq!(
            KeyboardConsole::translate(press(KeyCode::Char('s'))),
            Some(OperatorCommand::Save)
        );
        assert_eq!(
            KeyboardConsole::translate(press(KeyCode::Char('f'))),
            Some(OperatorCommand::Discard)
        );
        assert_eq!(
            KeyboardConsole::translate(press(KeyCode::Esc)),
            Some(OperatorCommand::Quit)
        );
        assert_eq!(KeyboardConsole::translate(press(KeyCode::Char('x'))), None);
    }

    #[test]
    fn key_release_is_ignored() {
        let mut release = KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(KeyboardConsole::translate(release), None);
    }
}
