use crate::cli::commands::{drain_remote, RemoteFeed};
use crate::tui::{
    inputs::{map_event, Action},
    views::{self, RightPane},
};
use crossterm::{
    event::{self},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use recall_core::{CardId, Quality, Session, StudyQueue};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{stdout, Stdout};
use std::sync::Arc;
use tokio::runtime::Runtime;

pub struct TuiApp {
    session: Session,
    remote: Option<RemoteFeed>,
    rt: Arc<Runtime>,
    sel: usize,
    queue: StudyQueue,
    reveal: bool,
    in_review: bool,
    pending_reset: Option<CardId>,
    status: String,
}

impl TuiApp {
    pub fn new(session: Session, remote: Option<RemoteFeed>, rt: Arc<Runtime>) -> Self {
        Self {
            session,
            remote,
            rt,
            sel: 0,
            queue: StudyQueue::default(),
            reveal: false,
            in_review: false,
            pending_reset: None,
            status: String::new(),
        }
    }

    fn start_review(&mut self) {
        self.queue = self.session.study_queue(chrono::Utc::now());
        self.reveal = false;
        self.in_review = true;
        self.skip_stale();
    }

    /// Drops queue heads that were deleted or rescheduled by a remote update.
    fn skip_stale(&mut self) {
        let now = chrono::Utc::now();
        while let Some(id) = self.queue.peek() {
            match self.session.get(id) {
                Some(c) if c.is_due(now) => break,
                _ => {
                    self.queue.next();
                }
            }
        }
    }

    fn advance(&mut self) {
        self.queue.next();
        self.reveal = false;
        self.skip_stale();
        if self.queue.is_empty() {
            self.in_review = false;
            self.status = "session complete".to_string();
        }
    }

    fn rate_current(&mut self, quality: Quality) {
        let Some(id) = self.queue.peek() else { return };
        match self.rt.block_on(self.session.rate(id, quality, chrono::Utc::now())) {
            Ok(card) => self.status = format!("next review in {} day(s)", card.interval),
            Err(e) => self.status = e.to_string(),
        }
        if self.session.has_unsaved_changes() {
            self.status = "not saved, will retry".to_string();
        }
        self.advance();
    }

    /// Arms a reset of the selected card; it only runs on `Confirm`.
    fn request_reset(&mut self) {
        let Some(card) = self.session.cards().get(self.sel) else { return };
        self.pending_reset = Some(card.id);
        self.status = format!("reset progress for \"{}\"? y to confirm", card.question);
    }

    fn confirm_reset(&mut self) {
        let Some(id) = self.pending_reset.take() else { return };
        match self.rt.block_on(self.session.reset(id, chrono::Utc::now())) {
            Ok(card) => self.status = format!("reset \"{}\"", card.question),
            Err(e) => self.status = e.to_string(),
        }
    }

    /// Applies one input action. Returns false when the app should quit.
    fn handle(&mut self, action: Action) -> bool {
        if self.pending_reset.is_some() && !matches!(action, Action::Confirm | Action::None) {
            self.pending_reset = None;
            self.status = "reset cancelled".to_string();
            return true;
        }
        let n = self.session.cards().len();
        match action {
            Action::Quit => return false,
            Action::Up => self.sel = self.sel.saturating_sub(1),
            Action::Down => {
                if self.sel + 1 < n {
                    self.sel += 1;
                }
            }
            Action::Enter => {
                if !self.in_review {
                    self.status.clear();
                    self.start_review();
                }
            }
            Action::ToggleReveal => {
                if self.in_review {
                    self.reveal = !self.reveal;
                }
            }
            Action::Skip => {
                if self.in_review {
                    self.advance();
                }
            }
            Action::Rate(q) => {
                if self.in_review && self.reveal {
                    self.rate_current(q);
                }
            }
            Action::ResetSelected => {
                if !self.in_review {
                    self.request_reset();
                }
            }
            Action::Confirm => self.confirm_reset(),
            Action::Cancel | Action::None => {}
        }
        true
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = self.mainloop(&mut terminal);

        disable_raw_mode().ok();
        let mut out: Stdout = std::io::stdout();
        execute!(out, LeaveAlternateScreen).ok();
        terminal.show_cursor().ok();

        self.rt.block_on(self.session.flush());
        res
    }

    fn mainloop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
        loop {
            drain_remote(&mut self.session, &mut self.remote);
            let n = self.session.cards().len();
            self.sel = self.sel.min(n.saturating_sub(1));
            if self.in_review {
                self.skip_stale();
                if self.queue.is_empty() {
                    self.in_review = false;
                }
            }

            let stats = self.session.stats(chrono::Utc::now());
            terminal.draw(|f| {
                let right = if self.in_review {
                    match self.queue.peek().and_then(|id| self.session.get(id)) {
                        Some(card) => RightPane::Card {
                            card,
                            reveal: self.reveal,
                            position: self.queue.position(),
                            total: self.queue.total(),
                        },
                        None => RightPane::Empty("No cards due."),
                    }
                } else if stats.due == 0 {
                    RightPane::Empty("No cards due. Come back later.")
                } else {
                    RightPane::Idle
                };
                views::draw_ui(f, f.size(), self.session.cards(), self.sel, &stats, right, &self.status);
            })?;

            if event::poll(std::time::Duration::from_millis(100))? && !self.handle(map_event(event::read()?)) {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use recall_core::{repo::memory::MemoryRepo, Card};

    fn app_with(cards: Vec<Card>) -> (TuiApp, Arc<MemoryRepo>) {
        let rt = Arc::new(Runtime::new().unwrap());
        let repo = Arc::new(MemoryRepo::with_cards(cards));
        let session = rt.block_on(Session::open(repo.clone())).unwrap();
        (TuiApp::new(session, None, rt), repo)
    }

    fn practised(now: chrono::DateTime<Utc>) -> Card {
        let mut card = Card::new("q", "a", now);
        card.repetitions = 4;
        card.interval = 12;
        card
    }

    #[test]
    fn reset_waits_for_confirmation() {
        let (mut app, repo) = app_with(vec![practised(Utc::now())]);

        assert!(app.handle(Action::ResetSelected));
        assert_eq!(app.session.cards()[0].repetitions, 4);
        assert_eq!(repo.save_count(), 0);
        assert!(app.status.contains("y to confirm"));

        assert!(app.handle(Action::Confirm));
        assert_eq!(app.session.cards()[0].repetitions, 0);
        assert_eq!(app.session.cards()[0].interval, 0);
        assert_eq!(repo.save_count(), 1);
        assert!(app.pending_reset.is_none());
    }

    #[test]
    fn any_other_key_cancels_a_pending_reset() {
        let (mut app, repo) = app_with(vec![practised(Utc::now())]);

        app.handle(Action::ResetSelected);
        assert!(app.handle(Action::Quit));
        assert_eq!(app.status, "reset cancelled");

        app.handle(Action::Confirm);
        assert_eq!(app.session.cards()[0].repetitions, 4);
        assert_eq!(repo.save_count(), 0);

        app.handle(Action::ResetSelected);
        app.handle(Action::Cancel);
        app.handle(Action::Confirm);
        assert_eq!(app.session.cards()[0].repetitions, 4);
        assert!(!app.handle(Action::Quit));
    }
}
