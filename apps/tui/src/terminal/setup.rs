use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossterm::{
    cursor, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{stdout, Stdout, Write};
use tracing::{debug, warn};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Enters raw mode and the alternate screen, undoing each completed step if
/// a later one fails
pub fn setup_terminal() -> Result<Tui> {
    let (width, height) = crossterm::terminal::size().unwrap_or((80, 24));
    debug!("Setting up {width}x{height} terminal");

    enable_raw_mode().map_err(|e| eyre!("Failed to enable raw mode: {e}"))?;

    let mut stdout = stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        cleanup_terminal_state(true, false);
        return Err(eyre!("Failed to enter alternate screen: {e}"));
    }

    let mut terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
        Ok(terminal) => terminal,
        Err(e) => {
            cleanup_terminal_state(true, true);
            return Err(eyre!("Failed to create terminal: {e}"));
        }
    };

    // Not fatal: the first draw repaints everything anyway
    if let Err(e) = terminal.clear() {
        warn!("Failed to clear terminal: {e}");
    }
    if let Err(e) = execute!(std::io::stdout(), cursor::Hide) {
        warn!("Failed to hide cursor: {e}");
    }

    install_panic_hook();
    Ok(terminal)
}

/// Restores the terminal before the color-eyre panic report is printed
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        cleanup_terminal_state(true, true);
        previous(info);
    }));
}

/// Restores whichever parts of the terminal state were changed
pub fn cleanup_terminal_state(raw_mode: bool, alternate_screen: bool) {
    let mut stdout_handle = stdout();

    if let Err(e) = execute!(stdout_handle, cursor::Show) {
        warn!("Failed to show cursor: {e}");
    }

    if alternate_screen {
        if let Err(e) = execute!(stdout_handle, LeaveAlternateScreen) {
            warn!("Failed to leave alternate screen: {e}");
        }
    }

    if raw_mode {
        if let Err(e) = disable_raw_mode() {
            warn!("Failed to disable raw mode: {e}");
        }
    }

    let _ = execute!(stdout_handle, cursor::MoveToNextLine(1));
    let _ = stdout_handle.flush();
    debug!("Terminal restored");
}
