//! Terminal keyboard and mouse input.

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

/// Name of a key as used in `[keybindings]`, `None` for keys with no name.
pub fn key_name(event: &KeyEvent) -> Option<String> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    let name = match event.code {
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) if event.modifiers.contains(KeyModifiers::CONTROL) => {
            format!("Ctrl+{}", c.to_ascii_lowercase())
        }
        KeyCode::Char(c) => c.to_string(),
        _ => return None,
    };
    Some(name)
}

/// Name of a mouse event as used in `[keybindings]`. Clicks count on press.
pub fn mouse_name(event: &MouseEvent) -> Option<&'static str> {
    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => Some("MouseLeft"),
        MouseEventKind::Down(MouseButton::Right) => Some("MouseRight"),
        MouseEventKind::ScrollUp => Some("ScrollUp"),
        MouseEventKind::ScrollDown => Some("ScrollDown"),
        _ => None,
    }
}

/// Binding name for a terminal event. Mouse events only count when `mouse`
/// is set.
pub fn event_name(event: &Event, mouse: bool) -> Option<String> {
    match event {
        Event::Key(key) => key_name(key),
        Event::Mouse(m) if mouse => mouse_name(m).map(str::to_string),
        _ => None,
    }
}

/// Read terminal events until the receiving side hangs up.
///
/// Runs on its own thread; crossterm reads block.
pub fn read_keys(sender: std::sync::mpsc::Sender<String>, mouse: bool) {
    loop {
        match crossterm::event::read() {
            Ok(event) => {
                if let Some(name) = event_name(&event, mouse) {
                    if sender.send(name).is_err() {
                        break;
                    }
                }
            }
            Err(e) => {
                tracing::error!("Failed to read terminal input: {}", e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(key_name(&press(KeyCode::Up)), Some("Up".to_string()));
        assert_eq!(key_name(&press(KeyCode::Enter)), Some("Enter".to_string()));
        assert_eq!(key_name(&press(KeyCode::Char(' '))), Some("Space".to_string()));
        assert_eq!(key_name(&press(KeyCode::Char('j'))), Some("j".to_string()));
        assert_eq!(key_name(&press(KeyCode::F(5))), None);
    }

    #[test]
    fn test_ctrl_chord() {
        let key = KeyEvent::new(KeyCode::Char('C'), KeyModifiers::CONTROL);
        assert_eq!(key_name(&key), Some("Ctrl+c".to_string()));
    }

    fn mouse(kind: MouseEventKind) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column: 10,
            row: 4,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn test_mouse_events_need_opt_in() {
        let click = mouse(MouseEventKind::Down(MouseButton::Left));
        assert_eq!(event_name(&click, false), None);
        assert_eq!(event_name(&click, true), Some("MouseLeft".to_string()));
        assert_eq!(
            event_name(&mouse(MouseEventKind::ScrollDown), true),
            Some("ScrollDown".to_string())
        );
        assert_eq!(
            event_name(&mouse(MouseEventKind::Down(MouseButton::Right)), true),
            Some("MouseRight".to_string())
        );
        // Releases and drags have no binding
        assert_eq!(event_name(&mouse(MouseEventKind::Up(MouseButton::Left)), true), None);
        assert_eq!(event_name(&mouse(MouseEventKind::Moved), true), None);
        // Keys are read either way
        let key = Event::Key(press(KeyCode::Enter));
        assert_eq!(event_name(&key, false), Some("Enter".to_string()));
    }

    #[test]
    fn test_release_is_ignored() {
        let mut key = press(KeyCode::Down);
        key.kind = KeyEventKind::Release;
        assert_eq!(key_name(&key), None);
    }
}
