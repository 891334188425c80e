use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::app::{option_label, App, AppState, SetupField};
use crate::session::{Selection, SessionController};
use crate::store::KeyValueStore;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;
const LOW_TIME_SECS: u32 = 5;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn green_bold() -> Style {
    bold().fg(Color::Green)
}

fn red_bold() -> Style {
    bold().fg(Color::Red)
}

pub fn draw<S: KeyValueStore>(f: &mut Frame, app: &App<S>) {
    let area = f.area();
    match app.state {
        AppState::Home => render_home(f, area),
        AppState::Setup => render_setup(f, area, app),
        AppState::Loading => render_loading(f, area),
        AppState::Quiz => match app.session.as_ref() {
            Some(session) => render_quiz(f, area, session, app.last_selection, app.notice.as_deref()),
            None => render_loading(f, area),
        },
        AppState::Results => render_results(f, area, app),
        AppState::HighScores => render_high_scores(f, area, app),
        AppState::HowToPlay => render_how_to_play(f, area),
    }
}

fn render_home(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled("QuizWhiz", bold().fg(Color::Magenta))),
        Line::from(Span::styled("Test your knowledge against the clock", dim())),
        Line::from(""),
        Line::from("[s] Start a new quiz"),
        Line::from("[h] High scores"),
        Line::from("[?] How to play"),
        Line::from("[q] Quit"),
    ];
    let height = lines.len() as u16;
    let widget = Paragraph::new(lines).alignment(Alignment::Center);
    f.render_widget(widget, centered_rows(area, height));
}

fn render_loading(f: &mut Frame, area: Rect) {
    let widget = Paragraph::new(Span::styled("Loading your quiz...", dim()))
        .alignment(Alignment::Center);
    f.render_widget(widget, centered_rows(area, 1));
}

fn render_setup<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let selected = app.current_setup_field();
    let rows: Vec<Line> = SetupField::ALL
        .iter()
        .flat_map(|field| {
            let value = match field {
                SetupField::Category => app.settings.category_name().to_string(),
                SetupField::Difficulty => app.settings.difficulty.to_string(),
                SetupField::Amount => format!("{} Questions", app.settings.amount),
                SetupField::Time => format!("{} seconds", app.settings.time_per_question),
            };
            let (marker, style) = if *field == selected {
                ("> ", bold().fg(Color::Cyan))
            } else {
                ("  ", Style::default())
            };
            [
                Line::from(vec![
                    Span::styled(marker, style),
                    Span::styled(field.label(), style),
                ]),
                Line::from(Span::styled(format!("    < {value} >"), style)),
                Line::from(""),
            ]
        })
        .collect();

    let settings = Paragraph::new(rows).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Quiz Settings"),
    );
    f.render_widget(settings, chunks[0]);

    render_notice(f, chunks[1], app.notice.as_deref());

    let help = Paragraph::new(Span::styled(
        "↑/↓ choose • ←/→ change • Enter start quiz • Esc back",
        dim(),
    ))
    .alignment(Alignment::Center);
    f.render_widget(help, chunks[2]);
}

fn render_quiz(
    f: &mut Frame,
    area: Rect,
    session: &SessionController,
    last_selection: Option<Selection>,
    notice: Option<&str>,
) {
    let Some(question) = session.current_question() else {
        return;
    };
    let state = session.state();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // score and timer
            Constraint::Length(1), // progress caption
            Constraint::Length(1), // progress gauge
            Constraint::Length(1),
            Constraint::Min(6),    // question and options
            Constraint::Length(5), // feedback
            Constraint::Length(1), // notice
        ])
        .split(area);

    let timer_style = if state.time_left <= LOW_TIME_SECS {
        red_bold()
    } else {
        bold()
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(format!("Score: {}", state.score), bold()),
        Span::raw("    "),
        Span::styled(format!("{}s", state.time_left), timer_style),
    ]))
    .alignment(Alignment::Right);
    f.render_widget(header, chunks[0]);

    let total = state.questions.len();
    let caption = Paragraph::new(Line::from(vec![
        Span::raw(format!("Question {} of {}", state.current_index + 1, total)),
        Span::styled(
            format!("    {} • {}", question.difficulty, question.category),
            dim(),
        ),
    ]));
    f.render_widget(caption, chunks[1]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Magenta))
        .ratio((state.current_index + 1) as f64 / total as f64)
        .label("");
    f.render_widget(gauge, chunks[2]);

    let chosen = session.current_answer();
    let mut body = vec![
        Line::from(Span::styled(question.prompt.clone(), bold())),
        Line::from(""),
    ];
    for (idx, option) in question.options.iter().enumerate() {
        let label = option_label(idx).map_or_else(|| "   ".to_string(), |c| format!("[{c}]"));
        let style = if state.feedback_visible && idx == question.correct_index {
            green_bold()
        } else if state.feedback_visible && chosen == Some(idx) {
            red_bold()
        } else if state.answered {
            dim()
        } else {
            Style::default()
        };
        body.push(Line::from(vec![
            Span::styled(format!("{label} "), bold()),
            Span::styled(option.clone(), style),
        ]));
    }
    let body = Paragraph::new(body)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    f.render_widget(body, chunks[4]);

    if state.feedback_visible {
        let verdict = match last_selection {
            Some(Selection::Correct { points }) => {
                Span::styled(format!("Correct! +{points} points"), green_bold())
            }
            _ if state.time_left == 0 && chosen.is_none() => Span::styled("Time's up!", red_bold()),
            _ => Span::styled("Incorrect!", red_bold()),
        };
        let next = if session.is_last_question() {
            "Enter: View Results"
        } else {
            "Enter: Next Question"
        };

        let mut lines = vec![Line::from(verdict)];
        if let Some(explanation) = &question.explanation {
            lines.push(Line::from(Span::styled(
                explanation.clone(),
                dim().add_modifier(Modifier::ITALIC),
            )));
        }
        lines.push(Line::from(Span::styled(next, bold().fg(Color::Cyan))));

        let feedback = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(feedback, chunks[5]);
    } else {
        let hint = Paragraph::new(Span::styled("Press A-D or 1-4 to answer • Esc quit", dim()))
            .alignment(Alignment::Center);
        f.render_widget(hint, chunks[5]);
    }

    render_notice(f, chunks[6], notice);
}

fn render_results<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let Some(result) = app.result.as_ref() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(8),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    let percentage = result.percentage();
    let grade_style = match percentage {
        80.. => green_bold(),
        60..=79 => bold().fg(Color::Yellow),
        _ => red_bold(),
    };
    let summary = Paragraph::new(vec![
        Line::from(Span::styled(result.message(), grade_style)),
        Line::from(""),
        Line::from(vec![
            Span::raw("Accuracy  "),
            Span::styled(format!("{percentage}%"), grade_style),
        ]),
        Line::from(vec![
            Span::raw("Correct   "),
            Span::styled(
                format!("{}/{}", result.correct_count(), result.total_questions),
                bold(),
            ),
        ]),
        Line::from(vec![
            Span::raw("Score     "),
            Span::styled(result.score.to_string(), bold().fg(Color::Magenta)),
        ]),
        Line::from(vec![
            Span::raw("Level     "),
            Span::styled(result.settings.difficulty.to_string(), bold()),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL).title("Quiz Complete"))
    .alignment(Alignment::Center);
    f.render_widget(summary, chunks[0]);

    let keys = Paragraph::new(Span::styled(
        "(r)etry • (n)ew quiz • (s)hare • (v) review answers • (h)igh scores • esc home",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center);
    f.render_widget(keys, chunks[1]);

    if app.show_review {
        let mut lines = Vec::new();
        for entry in result.review().into_iter().skip(app.review_scroll) {
            let (mark, style) = if entry.is_correct {
                ("✓", green_bold())
            } else {
                ("✗", red_bold())
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{mark} "), style),
                Span::styled(format!("Question {} ", entry.number), bold()),
                Span::styled(format!("({})", entry.difficulty), dim()),
            ]));
            lines.push(Line::from(entry.prompt));
            lines.push(Line::from(vec![
                Span::raw("  Your answer: "),
                Span::styled(
                    entry.your_answer.unwrap_or_else(|| "No answer".to_string()),
                    style,
                ),
            ]));
            if !entry.is_correct {
                lines.push(Line::from(vec![
                    Span::raw("  Correct answer: "),
                    Span::styled(entry.correct_answer, green_bold()),
                ]));
            }
            if let Some(explanation) = entry.explanation {
                lines.push(Line::from(Span::styled(
                    format!("  {explanation}"),
                    dim().add_modifier(Modifier::ITALIC),
                )));
            }
            lines.push(Line::from(""));
        }
        let review = Paragraph::new(Text::from(lines))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Answer Review (↑/↓ scroll)"),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(review, chunks[2]);
    }

    render_notice(f, chunks[3], app.notice.as_deref());
}

fn render_high_scores<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let block = Block::default().borders(Borders::ALL).title("Leaderboard");

    if app.high_scores.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from("Complete a quiz to see your scores here!"),
        ])
        .alignment(Alignment::Center)
        .block(block);
        f.render_widget(empty, chunks[0]);
    } else {
        let header = Row::new(vec!["#", "Score", "%", "Qs", "Category", "Difficulty", "Date"])
            .style(bold().fg(Color::Cyan));
        let rows = app.high_scores.iter().enumerate().map(|(i, s)| {
            let rank_style = match i {
                0 => bold().fg(Color::Yellow),
                1 => bold().fg(Color::Gray),
                2 => bold().fg(Color::Rgb(205, 127, 50)),
                _ => Style::default(),
            };
            Row::new(vec![
                Cell::from((i + 1).to_string()).style(rank_style),
                Cell::from(format!("{} pts", s.score)),
                Cell::from(format!("{}%", s.percentage)),
                Cell::from(s.total_questions.to_string()),
                Cell::from(fit(&s.category, 22)),
                Cell::from(s.difficulty.clone()),
                Cell::from(s.formatted_date()),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(3),
                Constraint::Length(9),
                Constraint::Length(5),
                Constraint::Length(4),
                Constraint::Length(23),
                Constraint::Length(10),
                Constraint::Min(18),
            ],
        )
        .header(header)
        .block(block);
        f.render_widget(table, chunks[0]);
    }

    let help = Paragraph::new(Span::styled("(c)lear all • (s)tart quiz • esc back", dim()))
        .alignment(Alignment::Center);
    f.render_widget(help, chunks[1]);
}

fn render_how_to_play(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled("How to Play", bold().fg(Color::Magenta))),
        Line::from(""),
        Line::from("1. Pick a category, difficulty, number of questions and time limit."),
        Line::from("2. Each question has a countdown. Answer with A-D or 1-4."),
        Line::from("3. A correct answer scores 10 points plus one point per second left."),
        Line::from("4. Wrong answers and timeouts score nothing, there is no penalty."),
        Line::from("5. Review your answers at the end and chase the leaderboard."),
        Line::from(""),
        Line::from(Span::styled("Press any key to go back", dim())),
    ];
    let height = lines.len() as u16;
    let widget = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(widget, centered_rows(area, height));
}

fn render_notice(f: &mut Frame, area: Rect, notice: Option<&str>) {
    if let Some(notice) = notice {
        let widget = Paragraph::new(Span::styled(notice.to_string(), bold().fg(Color::Yellow)))
            .alignment(Alignment::Center);
        f.render_widget(widget, area);
    }
}

fn centered_rows(area: Rect, height: u16) -> Rect {
    let height = height.min(area.height);
    Rect {
        y: area.y + (area.height - height) / 2,
        height,
        ..area
    }
}

/// Truncates to `max` display columns, marking the cut with an ellipsis.
pub fn fit(text: &str, max: usize) -> String {
    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max {
        return text.to_string();
    }

    let mut width = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if width + w + 1 > max {
            break;
        }
        width += w;
        out.push(c);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shuffle::Shuffler;
    use crate::source::QuestionSource;
    use crate::store::MemoryStore;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};

    fn screen_text<S: KeyValueStore>(app: &App<S>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn press<S: KeyValueStore>(app: &mut App<S>, code: KeyCode) {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn app() -> App<MemoryStore> {
        App::new(
            MemoryStore::new(),
            QuestionSource::offline(Shuffler::seeded(4)),
        )
    }

    #[test]
    fn fit_truncates_wide_text() {
        assert_eq!(fit("History", 10), "History");
        assert_eq!(fit("Entertainment: Books", 10), "Entertain…");
        assert_eq!(fit("abc", 3), "abc");
    }

    #[test]
    fn home_screen_lists_actions() {
        let text = screen_text(&app());
        assert!(text.contains("QuizWhiz"));
        assert!(text.contains("High scores"));
    }

    #[test]
    fn setup_screen_shows_settings() {
        let mut app = app();
        press(&mut app, KeyCode::Char('s'));
        let text = screen_text(&app);
        assert!(text.contains("Quiz Settings"));
        assert!(text.contains("General Knowledge"));
        assert!(text.contains("15 seconds"));
    }

    #[test]
    fn quiz_screen_shows_question_and_feedback() {
        let mut app = app();
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Enter);
        app.load_quiz();

        let text = screen_text(&app);
        assert!(text.contains("Question 1 of"));
        assert!(text.contains("15s"));

        let correct = app.session.as_ref().unwrap().current_question().unwrap().correct_index;
        press(&mut app, KeyCode::Char(char::from(b'1' + correct as u8)));
        let text = screen_text(&app);
        assert!(text.contains("Correct! +25 points"));
        assert!(text.contains("Enter: Next Question"));
    }

    #[test]
    fn timeout_shows_times_up() {
        let mut app = app();
        app.settings.time_per_question = 10;
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Enter);
        app.load_quiz();
        for _ in 0..10 {
            app.on_tick();
        }
        assert!(screen_text(&app).contains("Time's up!"));
    }

    #[test]
    fn results_and_review_render() {
        let mut app = app();
        app.settings.amount = 1;
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Enter);
        app.load_quiz();
        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Enter);

        let text = screen_text(&app);
        assert!(text.contains("Quiz Complete"));
        press(&mut app, KeyCode::Char('v'));
        let text = screen_text(&app);
        assert!(text.contains("Answer Review"));
        assert!(text.contains("Your answer"));
    }

    #[test]
    fn only_keyed_options_get_a_label() {
        use crate::question::{Difficulty, Question, QuizSettings};

        let question = Question {
            id: "wide".into(),
            category: "General Knowledge".into(),
            difficulty: Difficulty::Easy,
            prompt: "Pick one".into(),
            options: (0..12).map(|i| format!("choice {i}")).collect(),
            correct_index: 0,
            explanation: None,
        };
        let mut app = app();
        app.session = Some(SessionController::new(QuizSettings::default(), vec![question]).unwrap());
        app.state = AppState::Quiz;

        let text = screen_text(&app);
        assert!(text.contains("[I] choice 8"));
        assert!(text.contains("choice 11"));
        assert!(!text.contains("[J]"));
    }

    #[test]
    fn empty_leaderboard_message() {
        let mut app = app();
        press(&mut app, KeyCode::Char('h'));
        assert!(screen_text(&app).contains("Complete a quiz to see your scores here!"));
    }
}
