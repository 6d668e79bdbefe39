use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tracing::debug;

use crate::action::{Action, Field};
use crate::event::Event;
use crate::session::{FetchTicket, PaginationController, SessionState, Status};
use crate::types::{Credential, Issue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Search, // owner/repo form
    Issues, // accumulated result list
}

pub struct App {
    pub screen: Screen,
    pub repo_input: String,
    pub token_input: String,
    pub focus: Field,
    pub issue_index: usize,
    pub notice: Option<String>,
    pub tick: usize,
    pub should_quit: bool,
    submit_on_init: bool,
    controller: PaginationController,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl App {
    pub fn new(
        controller: PaginationController,
        action_tx: mpsc::UnboundedSender<Action>,
        repo: Option<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            screen: Screen::Search,
            submit_on_init: repo.is_some(),
            repo_input: repo.unwrap_or_default(),
            token_input: token.unwrap_or_default(),
            focus: Field::default(),
            issue_index: 0,
            notice: None,
            tick: 0,
            should_quit: false,
            controller,
            action_tx,
        }
    }

    pub fn session(&self) -> &SessionState {
        self.controller.state()
    }

    pub fn loading(&self) -> bool {
        self.session().status == Status::Loading
    }

    pub fn selected_issue(&self) -> Option<&Issue> {
        self.session().issues.get(self.issue_index)
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Init if self.submit_on_init => Action::Submit,
            Event::Tick => Action::Tick,
            Event::Key(key) => self.handle_key(key),
            _ => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        match self.screen {
            Screen::Search => match key.code {
                KeyCode::Esc => Action::Quit,
                KeyCode::Enter => Action::Submit,
                KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                    Action::SwitchField
                }
                KeyCode::Backspace => Action::Backspace,
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    Action::Input(c)
                }
                _ => Action::None,
            },
            Screen::Issues => match key.code {
                KeyCode::Char('q') | KeyCode::Esc | KeyCode::Backspace => Action::Back,
                KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
                KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
                KeyCode::Char('g') | KeyCode::Home => Action::GoToTop,
                KeyCode::Char('G') | KeyCode::End => Action::GoToBottom,
                KeyCode::Char('m') | KeyCode::Char('n') => Action::LoadMore,
                KeyCode::Enter | KeyCode::Char('o') => Action::OpenIssue,
                KeyCode::Char('a') => Action::OpenAuthor,
                KeyCode::Char('y') => Action::YankUrl,
                _ => Action::None,
            },
        }
    }

    pub fn update(&mut self, action: Action) {
        if self.notice.is_some() && !matches!(action, Action::Tick | Action::None) {
            self.notice = None;
        }

        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::Back => {
                if self.controller.reset() {
                    self.screen = Screen::Search;
                    self.issue_index = 0;
                }
            }
            Action::ScrollUp => {
                self.issue_index = self.issue_index.saturating_sub(1);
            }
            Action::ScrollDown => {
                let len = self.session().issues.len();
                if len > 0 && self.issue_index < len - 1 {
                    self.issue_index += 1;
                }
            }
            Action::GoToTop => {
                self.issue_index = 0;
            }
            Action::GoToBottom => {
                self.issue_index = self.session().issues.len().saturating_sub(1);
            }

            Action::Input(c) => self.focused_input().push(c),
            Action::Backspace => {
                self.focused_input().pop();
            }
            Action::SwitchField => {
                self.focus = match self.focus {
                    Field::Repository => Field::Token,
                    Field::Token => Field::Repository,
                };
            }
            Action::Submit => {
                let credential = (!self.token_input.is_empty())
                    .then(|| Credential::new(self.token_input.clone()));
                if let Some(ticket) = self.controller.begin_search(&self.repo_input, credential) {
                    self.spawn_fetch(ticket);
                }
            }

            Action::LoadMore => {
                if let Some(ticket) = self.controller.begin_next_page() {
                    self.spawn_fetch(ticket);
                }
            }
            Action::PageLoaded {
                generation,
                outcome,
            } => {
                if self.controller.complete(generation, outcome) {
                    match self.session().status {
                        Status::Ready if self.screen == Screen::Search => {
                            self.screen = Screen::Issues;
                            self.issue_index = 0;
                        }
                        Status::Error => {
                            self.screen = Screen::Search;
                            self.issue_index = 0;
                        }
                        _ => {}
                    }
                }
            }

            Action::OpenIssue => {
                if let Some(url) = self.selected_issue().map(|i| i.url.clone()) {
                    self.open_url(&url);
                }
            }
            Action::OpenAuthor => {
                if let Some(url) = self.selected_issue().map(|i| i.author.url.clone()) {
                    self.open_url(&url);
                }
            }
            Action::YankUrl => {
                if let Some(url) = self.selected_issue().map(|i| i.url.clone()) {
                    self.notice = Some(match copy_to_clipboard(&url) {
                        Ok(()) => format!("Copied {}", url),
                        Err(e) => format!("Clipboard unavailable: {}", e),
                    });
                }
            }

            Action::Tick => {
                self.tick = self.tick.wrapping_add(1);
            }
            Action::None => {}
        }
    }

    fn focused_input(&mut self) -> &mut String {
        match self.focus {
            Field::Repository => &mut self.repo_input,
            Field::Token => &mut self.token_input,
        }
    }

    fn open_url(&mut self, url: &str) {
        if let Err(e) = open::that(url) {
            self.notice = Some(format!("Could not open browser: {}", e));
        }
    }

    fn spawn_fetch(&self, ticket: FetchTicket) {
        let tx = self.action_tx.clone();
        let fetcher = self.controller.fetcher();
        debug!(generation = ticket.generation, kind = ?ticket.kind, "spawning page fetch");
        tokio::spawn(async move {
            let outcome = ticket.run(fetcher.as_ref()).await;
            tx.send(Action::PageLoaded {
                generation: ticket.generation,
                outcome,
            })
            .ok();
        });
    }
}

fn copy_to_clipboard(text: &str) -> Result<(), arboard::Error> {
    arboard::Clipboard::new()?.set_text(text.to_string())
}
