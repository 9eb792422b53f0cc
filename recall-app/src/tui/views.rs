use crate::cli::commands::describe_interval;
use crate::tui::theme::*;
use recall_core::{preview, Card, Stats};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

pub enum RightPane<'a> {
    Idle,
    Card {
        card: &'a Card,
        reveal: bool,
        position: usize,
        total: usize,
    },
    Empty(&'a str),
}

pub fn draw_ui(f: &mut Frame, area: Rect, cards: &[Card], sel: usize, stats: &Stats, right: RightPane, status: &str) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(2)])
        .split(area);
    draw_stats(f, rows[0], stats);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);
    draw_cards(f, body[0], cards, sel);
    draw_right(f, body[1], right);

    let mut spans = vec![
        Span::raw(" ↑/k ↓/j select  "),
        Span::raw(" Enter study  "),
        Span::raw(" space reveal  "),
        Span::raw(" 1/3/5 rate  "),
        Span::raw(" s skip  "),
        Span::raw(" r reset, y confirm  "),
        Span::raw(" q quit "),
    ];
    if !status.is_empty() {
        spans.push(Span::raw(format!("  {status}")).style(hint_style()));
    }
    let foot = Paragraph::new(Line::from(spans))
        .style(footer_style())
        .block(Block::default().borders(Borders::TOP));
    f.render_widget(foot, rows[2]);
}

fn draw_stats(f: &mut Frame, area: Rect, stats: &Stats) {
    let line = Line::from(vec![
        Span::raw(" Total ").style(title_style()),
        Span::raw(stats.total.to_string()),
        Span::raw("   Due ").style(title_style()),
        Span::raw(stats.due.to_string()),
        Span::raw("   Mastered ").style(title_style()),
        Span::raw(stats.mastered.to_string()),
        Span::raw("   "),
        Span::raw(format!("hard {}", stats.by_difficulty.hard)).style(difficulty_style(recall_core::Difficulty::Hard)),
        Span::raw(" · "),
        Span::raw(format!("medium {}", stats.by_difficulty.medium)).style(difficulty_style(recall_core::Difficulty::Medium)),
        Span::raw(" · "),
        Span::raw(format!("easy {}", stats.by_difficulty.easy)).style(difficulty_style(recall_core::Difficulty::Easy)),
    ]);
    let p = Paragraph::new(line).block(Block::default().title("Recall").borders(Borders::ALL));
    f.render_widget(p, area);
}

fn draw_cards(f: &mut Frame, area: Rect, cards: &[Card], sel: usize) {
    let items: Vec<_> = cards
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let marker = Span::raw(format!("{:<7}", c.difficulty.as_str())).style(difficulty_style(c.difficulty));
            let text = if i == sel {
                Span::raw(c.question.clone()).style(selected_style())
            } else {
                Span::raw(c.question.clone())
            };
            ListItem::new(Line::from(vec![marker, text]))
        })
        .collect();

    let mut state = ListState::default();
    if !cards.is_empty() {
        state.select(Some(sel));
    }
    let list = List::new(items).block(Block::default().title("Cards").borders(Borders::ALL));
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_right(f: &mut Frame, area: Rect, pane: RightPane) {
    match pane {
        RightPane::Idle => {
            let p = Paragraph::new("Press Enter to study the cards that are due.")
                .wrap(Wrap { trim: true })
                .block(Block::default().title("Study").borders(Borders::ALL));
            f.render_widget(p, area);
        }
        RightPane::Empty(msg) => {
            let p = Paragraph::new(msg)
                .wrap(Wrap { trim: true })
                .block(Block::default().title("Study").borders(Borders::ALL));
            f.render_widget(p, area);
        }
        RightPane::Card {
            card,
            reveal,
            position,
            total,
        } => {
            let mut text = vec![
                Line::from(vec![
                    Span::raw("Q: ").style(title_style()),
                    Span::raw(&card.question),
                ]),
                Line::from(""),
            ];
            if reveal {
                text.push(Line::from(vec![
                    Span::raw("A: ").style(title_style()),
                    Span::raw(&card.answer),
                ]));
                text.push(Line::from(""));
                let options: Vec<Span> = preview(card)
                    .iter()
                    .map(|(q, days)| {
                        Span::raw(format!("[{}] {} {}   ", q.value(), q.label(), describe_interval(*days)))
                            .style(hint_style())
                    })
                    .collect();
                text.push(Line::from(options));
            } else {
                text.push(Line::from(Span::raw("space to reveal").style(hint_style())));
            }
            let p = Paragraph::new(text)
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .title(format!("Study {position}/{total}"))
                        .borders(Borders::ALL),
                );
            f.render_widget(p, area);
        }
    }
}
