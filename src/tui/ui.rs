use crate::app::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{StackRow, TabStrip, TitleBar, ViewStack};

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::Span;

const HELP: &str = "1-9 tab  Enter push  m modal  o on top  Backspace back  r reset  c clear  k recreate host  q quit";

/// Current tab's stack as display rows, bottom-to-top.
pub fn stack_rows(app: &App) -> Vec<StackRow> {
    let Some(tab) = app.navigator.current_tab() else {
        return Vec::new();
    };
    app.stack_titles(tab)
        .into_iter()
        .map(|(tag, title)| StackRow {
            title,
            modal: tag.modal,
            detachable: tag.detachable,
            visibility: app.host().and_then(|host| host.visibility(tag.id)),
        })
        .collect()
}

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState) {
    use Constraint::{Length, Min, Percentage};
    let layout = Layout::vertical([Length(1), Length(3), Min(0), Length(1)]);
    let [title_area, tabs_area, main_area, help_area] = layout.areas(frame.area());
    let [stack_area, log_area] =
        Layout::horizontal([Percentage(50), Percentage(50)]).areas(main_area);

    let tab_title = app
        .navigator
        .current_tab()
        .map_or("-", |tab| app.tab_title(tab))
        .to_string();

    TitleBar::new(
        tab_title.clone(),
        app.navigator.current_stack_size(),
        app.status_message.clone(),
        app.navigator.pending_commands(),
    )
    .render(frame, title_area);

    let titles = app.config.tabs.iter().map(|t| t.title.clone()).collect();
    TabStrip::new(titles, app.selected_tab()).render(frame, tabs_area);

    ViewStack::new(tab_title, stack_rows(app)).render(frame, stack_area);
    tui.event_log.render(frame, log_area);

    frame.render_widget(
        Span::styled(HELP, Style::default().fg(Color::DarkGray)),
        help_area,
    );
}
