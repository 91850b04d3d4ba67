use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub enum TuiEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Quit,
}

pub struct EventHandler {
    tx: mpsc::UnboundedSender<TuiEvent>,
}

impl EventHandler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TuiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn start(self) {
        // Poll the terminal on a blocking thread; the render loop never waits on input
        tokio::task::spawn_blocking(move || loop {
            if !event::poll(std::time::Duration::from_millis(50)).unwrap_or(false) {
                if self.tx.is_closed() {
                    break;
                }
                continue;
            }

            let sent = match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                    // Check for Ctrl+C to quit
                    if key.modifiers.contains(KeyModifiers::CONTROL)
                        && key.code == KeyCode::Char('c')
                    {
                        self.tx.send(TuiEvent::Quit)
                    } else {
                        self.tx.send(TuiEvent::Key(key))
                    }
                }
                Ok(Event::Mouse(mouse)) => self.tx.send(TuiEvent::Mouse(mouse)),
                Ok(Event::Resize(width, height)) => self.tx.send(TuiEvent::Resize(width, height)),
                _ => Ok(()),
            };
            if sent.is_err() {
                break;
            }
        });
    }
}
