use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use crate::core::state::SessionContext;
use crate::devices::CaptureSession;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{DialogOverlay, MessageList, Sidebar, StatusBar, TitleBar};

const SIDEBAR_WIDTH: u16 = 30;

pub fn draw_ui(frame: &mut Frame, ctx: &SessionContext, tui: &mut TuiState) {
    use Constraint::{Length, Min};
    let now = Instant::now();

    let [sidebar_area, main_area] =
        Layout::horizontal([Length(SIDEBAR_WIDTH), Min(0)]).areas(frame.area());
    let composer_height = tui.composer.calculate_height(main_area.width);
    let [title_area, messages_area, status_area, composer_area] =
        Layout::vertical([Length(1), Min(0), Length(1), Length(composer_height)]).areas(main_area);

    Sidebar::new(&mut tui.sidebar, &tui.view.sidebar).render(frame, sidebar_area);

    let mut title_bar = TitleBar {
        title: ctx
            .store
            .active()
            .map(|c| c.title.clone())
            .unwrap_or_default(),
        server: tui.server.clone(),
        composing: tui.view.composing,
    };
    title_bar.render(frame, title_area);

    tui.messages.sync(tui.view.revision);
    MessageList::new(&mut tui.messages, &tui.view.messages, tui.view.composing, now)
        .render(frame, messages_area);

    let mut status = StatusBar {
        attachment: ctx.staging.current(),
        toast: tui.view.current_toast(now),
    };
    status.render(frame, status_area);

    tui.composer.focused = !tui.sidebar.focused && ctx.dialogs.current().is_none();
    tui.composer.render(frame, composer_area);

    if let Some(kind) = ctx.dialogs.current() {
        let session: Option<&CaptureSession> = kind.device().map(|d| ctx.devices.get(d));
        let area = frame.area();
        DialogOverlay::new(&mut tui.dialog, kind, session).render(frame, area);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::controller;
    use crate::core::dialog::DialogKind;
    use crate::core::storage::MemoryStore;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn started() -> (SessionContext, TuiState) {
        let mut ctx = SessionContext::new(Arc::new(MemoryStore::default()), ".");
        let mut tui = TuiState::new("http://localhost:5000", 4000, 5);
        controller::start(&mut ctx, &mut tui.view);
        (ctx, tui)
    }

    #[test]
    fn test_draw_ui() {
        let (ctx, mut tui) = started();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw_ui(f, &ctx, &mut tui)).unwrap();

        let text = screen(&terminal);
        assert!(text.contains("Conversations"));
        assert!(text.contains("New Conversation"));
        assert!(text.contains("Welcome to Confab!"));
        assert!(text.contains("0/4000"));
    }

    #[test]
    fn test_draw_ui_with_dialog() {
        let (mut ctx, mut tui) = started();
        ctx.dialogs.open(DialogKind::ConfirmDeleteAll, &mut ctx.devices);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw_ui(f, &ctx, &mut tui)).unwrap();

        assert!(screen(&terminal).contains("Clear All Conversations"));
        assert!(!tui.composer.focused);
    }

    #[test]
    fn test_draw_ui_tiny_terminal() {
        let (ctx, mut tui) = started();
        let mut terminal = Terminal::new(TestBackend::new(10, 4)).unwrap();
        terminal.draw(|f| draw_ui(f, &ctx, &mut tui)).unwrap();
    }
}
